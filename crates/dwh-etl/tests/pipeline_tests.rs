//! End-to-end provisioning and load against an in-memory DuckDB warehouse

use chrono::{Datelike, NaiveDateTime, Weekday};
use dwh_core::catalog::{
    ACCIDENT_STAGING, ACCIDENT_TABLE, CITY_STAGING, CITY_TABLE, COVID_STAGING, COVID_TABLE,
    TIME_TABLE,
};
use dwh_core::{CommitMode, Pipeline, StatementKind, WarehouseConfig};
use dwh_db::{DuckDbBackend, Warehouse};
use dwh_etl::{create_tables, run_etl, EtlError};

const ACCIDENTS: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/accidents.csv");
const CITIES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/cities.csv");
const COVID: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/covid.csv");
const CITIES_SAME_NAME: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/fixtures/cities_same_name.csv"
);
const COVID_REVISED: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/fixtures/covid_revised.csv"
);

fn config(cities: &str, covid: &str, atomic: bool) -> WarehouseConfig {
    let ini = format!(
        "[S3]\n\
         ACCIDENT_DATA='{ACCIDENTS}'\n\
         CITY_DATA='{cities}'\n\
         COVID_DATA='{covid}'\n\
         \n\
         [PIPELINE]\n\
         BACKEND=duckdb\n\
         ATOMIC={atomic}\n"
    );
    WarehouseConfig::from_ini_str(&ini).unwrap()
}

/// Non-header line count of a fixture file
fn data_lines(path: &str) -> usize {
    let content = std::fs::read_to_string(path).unwrap();
    content.lines().skip(1).filter(|l| !l.trim().is_empty()).count()
}

async fn count(db: &DuckDbBackend, table: &str) -> usize {
    db.query_count(&format!("SELECT * FROM {table}"))
        .await
        .unwrap()
}

async fn duplicate_keys(db: &DuckDbBackend, table: &str, key: &str) -> usize {
    db.query_count(&format!(
        "SELECT {key} FROM {table} GROUP BY {key} HAVING COUNT(*) > 1"
    ))
    .await
    .unwrap()
}

async fn provision_and_load(db: &DuckDbBackend, config: &WarehouseConfig) -> Pipeline {
    let pipeline = Pipeline::from_config(config);
    let mode = config.pipeline.commit_mode;
    create_tables(db, &pipeline, mode, |_| {}).await.unwrap();
    run_etl(db, &pipeline, mode, |_| {}).await.unwrap();
    pipeline
}

#[tokio::test]
async fn test_staging_tables_match_catalog_and_sources() {
    let db = DuckDbBackend::in_memory().unwrap();
    let pipeline = provision_and_load(&db, &config(CITIES, COVID, false)).await;

    for table in pipeline.catalog().staging_tables() {
        let columns = db.column_names(&table.name).await.unwrap();
        assert_eq!(columns, table.column_names(), "columns of {}", table.name);
    }

    assert!(count(&db, ACCIDENT_STAGING).await >= data_lines(ACCIDENTS));
    assert!(count(&db, CITY_STAGING).await >= data_lines(CITIES));
    assert!(count(&db, COVID_STAGING).await >= data_lines(COVID));
}

#[tokio::test]
async fn test_every_catalog_table_is_created() {
    let db = DuckDbBackend::in_memory().unwrap();
    let pipeline = Pipeline::from_config(&config(CITIES, COVID, false));

    let summary = create_tables(&db, &pipeline, CommitMode::PerStatement, |_| {})
        .await
        .unwrap();

    let tables = pipeline.catalog().tables().len();
    assert_eq!(summary.total(), tables * 2);
    for table in pipeline.catalog().tables() {
        assert!(db.relation_exists(&table.name).await.unwrap());
    }
}

#[tokio::test]
async fn test_time_dimension_has_unique_keys() {
    let db = DuckDbBackend::in_memory().unwrap();
    provision_and_load(&db, &config(CITIES, COVID, false)).await;

    // Two collisions share 2020-03-14 17:30:00
    assert_eq!(count(&db, TIME_TABLE).await, 5);
    assert_eq!(duplicate_keys(&db, TIME_TABLE, "start_time_key").await, 0);
}

#[tokio::test]
async fn test_weekend_flag_follows_calendar() {
    let db = DuckDbBackend::in_memory().unwrap();
    provision_and_load(&db, &config(CITIES, COVID, false)).await;

    for stamp in [
        "2020-03-13 08:15:00",
        "2020-03-13 22:45:00",
        "2020-03-14 17:30:00",
        "2020-03-15 09:00:00",
        "2020-03-15 11:20:00",
    ] {
        let parsed = NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S").unwrap();
        let expected = matches!(parsed.weekday(), Weekday::Sat | Weekday::Sun);

        let weekend = db
            .query_one(&format!(
                "SELECT CAST(weekend AS VARCHAR) FROM {TIME_TABLE} \
                 WHERE start_time_key = TIMESTAMP '{stamp}'"
            ))
            .await
            .unwrap();
        assert_eq!(weekend, Some(expected.to_string()), "weekend flag of {stamp}");
    }
}

#[tokio::test]
async fn test_covid_dimension_keeps_only_aggregate_country() {
    let db = DuckDbBackend::in_memory().unwrap();
    provision_and_load(&db, &config(CITIES, COVID, false)).await;

    assert_eq!(data_lines(COVID), 10);
    assert_eq!(count(&db, COVID_TABLE).await, 3);
    let cases = db
        .query_one(&format!(
            "SELECT CAST(total_cases AS VARCHAR) FROM {COVID_TABLE} \
             WHERE date_key = TIMESTAMP '2020-03-15 00:00:00'"
        ))
        .await
        .unwrap();
    assert_eq!(cases.as_deref(), Some("3499"));
}

#[tokio::test]
async fn test_fact_rows_reference_dimensions() {
    let db = DuckDbBackend::in_memory().unwrap();
    provision_and_load(&db, &config(CITIES, COVID, false)).await;

    assert_eq!(count(&db, CITY_TABLE).await, 3);
    assert_eq!(count(&db, ACCIDENT_TABLE).await, 6);

    let orphans = db
        .query_count(&format!(
            "SELECT a.accident_id FROM {ACCIDENT_TABLE} a \
             LEFT JOIN {COVID_TABLE} c ON a.date_key = c.date_key \
             WHERE c.date_key IS NULL"
        ))
        .await
        .unwrap();
    assert_eq!(orphans, 0);

    let date_key = db
        .query_one(&format!(
            "SELECT CAST(date_key AS VARCHAR) FROM {ACCIDENT_TABLE} WHERE accident_id = 'A-5'"
        ))
        .await
        .unwrap();
    assert_eq!(date_key.as_deref(), Some("2020-03-13 00:00:00"));
}

#[tokio::test]
async fn test_reload_without_reprovisioning() {
    let db = DuckDbBackend::in_memory().unwrap();
    let config = config(CITIES, COVID, false);
    let pipeline = provision_and_load(&db, &config).await;

    let summary = run_etl(&db, &pipeline, CommitMode::PerStatement, |_| {})
        .await
        .unwrap();

    // Staging accumulates, the star schema does not
    assert_eq!(count(&db, ACCIDENT_STAGING).await, 2 * data_lines(ACCIDENTS));
    assert_eq!(summary.rows(StatementKind::Insert), 0);
    assert_eq!(count(&db, TIME_TABLE).await, 5);
    assert_eq!(count(&db, COVID_TABLE).await, 3);
    assert_eq!(count(&db, CITY_TABLE).await, 3);
    assert_eq!(count(&db, ACCIDENT_TABLE).await, 6);
}

#[tokio::test]
async fn test_reprovisioning_empties_every_table() {
    let db = DuckDbBackend::in_memory().unwrap();
    let config = config(CITIES, COVID, false);
    let pipeline = provision_and_load(&db, &config).await;

    create_tables(&db, &pipeline, CommitMode::PerStatement, |_| {})
        .await
        .unwrap();

    for table in pipeline.catalog().tables() {
        assert_eq!(count(&db, &table.name).await, 0, "rows in {}", table.name);
    }
}

#[tokio::test]
async fn test_missing_source_stops_per_statement_load() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("covid.csv");
    let config = config(CITIES, &missing.display().to_string(), false);

    let db = DuckDbBackend::in_memory().unwrap();
    let pipeline = Pipeline::from_config(&config);
    create_tables(&db, &pipeline, CommitMode::PerStatement, |_| {})
        .await
        .unwrap();

    let mut loaded = Vec::new();
    let err = run_etl(&db, &pipeline, CommitMode::PerStatement, |r| {
        loaded.push(r.table.to_string())
    })
    .await
    .unwrap_err();

    match err {
        EtlError::BulkLoad { table, .. } => assert_eq!(table, COVID_STAGING),
        other => panic!("unexpected error: {other}"),
    }
    // COPYs that finished before the failure stay committed
    for table in &loaded {
        assert!(count(&db, table).await > 0, "rows in {table}");
    }
    assert_eq!(count(&db, TIME_TABLE).await, 0);
}

#[tokio::test]
async fn test_missing_source_rolls_back_atomic_load() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("covid.csv");
    let config = config(CITIES, &missing.display().to_string(), true);
    assert_eq!(config.pipeline.commit_mode, CommitMode::Atomic);

    let db = DuckDbBackend::in_memory().unwrap();
    let pipeline = Pipeline::from_config(&config);
    create_tables(&db, &pipeline, CommitMode::Atomic, |_| {})
        .await
        .unwrap();

    let err = run_etl(&db, &pipeline, CommitMode::Atomic, |_| {})
        .await
        .unwrap_err();

    assert!(matches!(err, EtlError::BulkLoad { .. }));
    for table in pipeline.catalog().tables() {
        assert_eq!(count(&db, &table.name).await, 0, "rows in {}", table.name);
    }
}

#[tokio::test]
async fn test_city_name_in_two_states_keeps_one_row() {
    let db = DuckDbBackend::in_memory().unwrap();
    provision_and_load(&db, &config(CITIES_SAME_NAME, COVID, false)).await;

    assert_eq!(count(&db, CITY_TABLE).await, 4);
    assert_eq!(duplicate_keys(&db, CITY_TABLE, "city_key").await, 0);

    let state = db
        .query_one(&format!(
            "SELECT state FROM {CITY_TABLE} WHERE city_key = 'Portland'"
        ))
        .await
        .unwrap();
    assert_eq!(state.as_deref(), Some("Oregon"));
    assert_eq!(count(&db, ACCIDENT_TABLE).await, 6);
}

#[tokio::test]
async fn test_revised_day_keeps_one_row() {
    let db = DuckDbBackend::in_memory().unwrap();
    provision_and_load(&db, &config(CITIES, COVID_REVISED, false)).await;

    assert_eq!(count(&db, COVID_TABLE).await, 3);
    assert_eq!(duplicate_keys(&db, COVID_TABLE, "date_key").await, 0);

    let cases = db
        .query_one(&format!(
            "SELECT CAST(total_cases AS VARCHAR) FROM {COVID_TABLE} \
             WHERE date_key = TIMESTAMP '2020-03-13 00:00:00'"
        ))
        .await
        .unwrap();
    assert_eq!(cases.as_deref(), Some("2247"));
}
