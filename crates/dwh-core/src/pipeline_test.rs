use super::*;
use crate::catalog::{
    ACCIDENT_STAGING, ACCIDENT_TABLE, CITY_STAGING, CITY_TABLE, COVID_STAGING, COVID_TABLE,
    TIME_TABLE,
};
use crate::copy::ObjectLocation;
use crate::error::CoreError;
use crate::statement::StatementKind;
use crate::table_name::TableName;
use secrecy::SecretString;

const ARN: &str = "arn:aws:iam::123456789012:role/dwhRole";

fn pipeline() -> Pipeline {
    let copies = [
        (ACCIDENT_STAGING, "s3://bucket/accidents.csv"),
        (CITY_STAGING, "s3://bucket/cities.csv"),
        (COVID_STAGING, "s3://bucket/covid.csv"),
    ]
    .into_iter()
    .map(|(table, location)| CopySpec {
        table: TableName::new(table),
        location: ObjectLocation::new(location),
        credential: Some(SecretString::new(ARN.to_string())),
        region: "us-west-2".to_string(),
    })
    .collect();

    Pipeline::new(
        Catalog::star_schema(),
        copies,
        Transform::star_schema("United States"),
    )
}

fn position(statements: &[Statement], kind: StatementKind, table: &str) -> usize {
    statements
        .iter()
        .position(|s| s.kind() == kind && s.table() == &TableName::new(table))
        .unwrap()
}

#[test]
fn test_provision_drops_everything_before_creating() {
    let statements = pipeline().provision_statements(Dialect::Redshift).unwrap();
    assert_eq!(statements.len(), 14);

    let kinds: Vec<StatementKind> = statements.iter().map(|s| s.kind()).collect();
    assert!(kinds[..7].iter().all(|k| *k == StatementKind::Drop));
    assert!(kinds[7..].iter().all(|k| *k == StatementKind::Create));
}

#[test]
fn test_provision_respects_foreign_keys() {
    let statements = pipeline().provision_statements(Dialect::DuckDb).unwrap();

    let drop_fact = position(&statements, StatementKind::Drop, ACCIDENT_TABLE);
    let create_fact = position(&statements, StatementKind::Create, ACCIDENT_TABLE);
    for dim in [TIME_TABLE, COVID_TABLE, CITY_TABLE] {
        assert!(drop_fact < position(&statements, StatementKind::Drop, dim));
        assert!(position(&statements, StatementKind::Create, dim) < create_fact);
    }
}

#[test]
fn test_load_copies_before_inserts() {
    let statements = pipeline().load_statements(Dialect::Redshift).unwrap();
    assert_eq!(statements.len(), 7);

    let kinds: Vec<StatementKind> = statements.iter().map(|s| s.kind()).collect();
    assert!(kinds[..3].iter().all(|k| *k == StatementKind::Copy));
    assert!(kinds[3..].iter().all(|k| *k == StatementKind::Insert));
}

#[test]
fn test_load_inserts_dimensions_before_fact() {
    let statements = pipeline().load_statements(Dialect::DuckDb).unwrap();

    let fact = position(&statements, StatementKind::Insert, ACCIDENT_TABLE);
    assert_eq!(fact, statements.len() - 1);
    for dim in [TIME_TABLE, COVID_TABLE, CITY_TABLE] {
        assert!(position(&statements, StatementKind::Insert, dim) < fact);
    }
}

#[test]
fn test_load_plan_redacts_role() {
    let statements = pipeline().load_statements(Dialect::Redshift).unwrap();
    for stmt in statements.iter().filter(|s| s.kind() == StatementKind::Copy) {
        assert!(stmt.contains_secret());
        assert!(!stmt.to_string().contains(ARN));
        assert!(stmt.expose().contains(ARN));
    }
}

#[test]
fn test_dag_includes_transform_sources() {
    let dag = pipeline().dag().unwrap();
    let time_deps = dag.dependencies(TIME_TABLE);
    assert_eq!(time_deps, vec![TableName::new(ACCIDENT_STAGING)]);

    let fact_deps = dag.dependencies(ACCIDENT_TABLE);
    assert_eq!(fact_deps.len(), 4);
    assert!(fact_deps.contains(&TableName::new(ACCIDENT_STAGING)));
}

#[test]
fn test_transform_cycle_is_rejected() {
    // A transform feeding the staging table from the fact closes a cycle
    let mut transforms = Transform::star_schema("United States");
    transforms.push(Transform {
        target: TableName::new(ACCIDENT_STAGING),
        source: TableName::new(ACCIDENT_TABLE),
        select: "SELECT * FROM accident_table".to_string(),
    });
    let pipeline = Pipeline::new(Catalog::star_schema(), Vec::new(), transforms);

    assert!(matches!(
        pipeline.load_statements(Dialect::DuckDb).unwrap_err(),
        CoreError::CircularDependency { .. }
    ));
}

#[test]
fn test_provision_follows_catalog_order() {
    let pipeline = pipeline();
    let catalog = pipeline.catalog();
    let expected: Vec<(StatementKind, TableName)> = catalog
        .drop_order()
        .unwrap()
        .into_iter()
        .map(|t| (StatementKind::Drop, t.name.clone()))
        .chain(
            catalog
                .create_order()
                .unwrap()
                .into_iter()
                .map(|t| (StatementKind::Create, t.name.clone())),
        )
        .collect();

    let actual: Vec<(StatementKind, TableName)> = pipeline
        .provision_statements(Dialect::Redshift)
        .unwrap()
        .iter()
        .map(|s| (s.kind(), s.table().clone()))
        .collect();
    assert_eq!(actual, expected);
}

#[test]
fn test_transform_from_unknown_table_is_rejected() {
    let transforms = vec![Transform {
        target: TableName::new(CITY_TABLE),
        source: TableName::new("city_landing"),
        select: "SELECT * FROM city_landing".to_string(),
    }];
    let pipeline = Pipeline::new(Catalog::star_schema(), Vec::new(), transforms);

    match pipeline.dag().unwrap_err() {
        CoreError::UnknownTable { name, referenced_by } => {
            assert_eq!(name, "city_landing");
            assert_eq!(referenced_by, "transform into city_table");
        }
        other => panic!("unexpected error: {other}"),
    }
}
