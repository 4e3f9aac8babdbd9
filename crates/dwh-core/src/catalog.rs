//! Star-schema catalog: typed table definitions and their DDL

use crate::dag::TableDag;
use crate::dialect::Dialect;
use crate::error::CoreResult;
use crate::sql_utils::quote_ident;
use crate::statement::{Statement, StatementKind};
use crate::table_name::TableName;
use serde::Serialize;
use std::fmt;

pub const ACCIDENT_STAGING: &str = "accident_staging_table";
pub const CITY_STAGING: &str = "city_staging_table";
pub const COVID_STAGING: &str = "covid_staging_table";
pub const TIME_TABLE: &str = "time_table";
pub const CITY_TABLE: &str = "city_table";
pub const COVID_TABLE: &str = "covid_table";
pub const ACCIDENT_TABLE: &str = "accident_table";

/// Column data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnType {
    /// `VARCHAR` with an optional length
    Varchar(Option<u32>),
    /// Largest variable-length string the engine allows
    VarcharMax,
    Int,
    Real,
    Numeric { precision: u8, scale: u8 },
    Timestamp,
    Boolean,
}

impl ColumnType {
    /// Render the type for a dialect
    pub fn render(self, dialect: Dialect) -> String {
        match self {
            ColumnType::Varchar(None) => "VARCHAR".to_string(),
            ColumnType::Varchar(Some(len)) => format!("VARCHAR({})", len),
            ColumnType::VarcharMax => match dialect {
                Dialect::Redshift => "VARCHAR(MAX)".to_string(),
                Dialect::DuckDb => "VARCHAR".to_string(),
            },
            ColumnType::Int => "INT".to_string(),
            ColumnType::Real => "REAL".to_string(),
            ColumnType::Numeric { precision, scale } => format!("NUMERIC({},{})", precision, scale),
            ColumnType::Timestamp => "TIMESTAMP".to_string(),
            ColumnType::Boolean => "BOOLEAN".to_string(),
        }
    }
}

/// Physical placement hint for a column. Affects performance only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LayoutHint {
    SortKey,
    DistKey,
}

/// Foreign key target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKey {
    pub table: TableName,
    pub column: String,
}

/// A single column definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    pub data_type: ColumnType,
    pub primary_key: bool,
    pub not_null: bool,
    pub references: Option<ForeignKey>,
    pub layout: Option<LayoutHint>,
}

impl Column {
    pub fn new(name: &str, data_type: ColumnType) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            primary_key: false,
            not_null: false,
            references: None,
            layout: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Mark as a non-null foreign key into `table.column`
    pub fn references(mut self, table: &str, column: &str) -> Self {
        self.not_null = true;
        self.references = Some(ForeignKey {
            table: TableName::new(table),
            column: column.to_string(),
        });
        self
    }

    pub fn sort_key(mut self) -> Self {
        self.layout = Some(LayoutHint::SortKey);
        self
    }

    pub fn dist_key(mut self) -> Self {
        self.layout = Some(LayoutHint::DistKey);
        self
    }

    fn render(&self, dialect: Dialect) -> String {
        let mut sql = format!(
            "{} {}",
            quote_ident(&self.name),
            self.data_type.render(dialect)
        );
        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        if self.not_null {
            sql.push_str(" NOT NULL");
        }
        if dialect.supports_layout_hints() {
            match self.layout {
                Some(LayoutHint::SortKey) => sql.push_str(" SORTKEY"),
                Some(LayoutHint::DistKey) => sql.push_str(" DISTKEY"),
                None => {}
            }
        }
        sql
    }
}

/// Role of a table in the star schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    /// Unvalidated landing zone for one bulk-loaded source file
    Staging,
    /// Deduplicated reference table keyed by a natural key
    Dimension,
    /// One row per observed event, referencing dimensions
    Fact,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKind::Staging => write!(f, "staging"),
            TableKind::Dimension => write!(f, "dimension"),
            TableKind::Fact => write!(f, "fact"),
        }
    }
}

/// Row distribution across warehouse nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum DistStyle {
    /// Engine default; no clause rendered
    #[default]
    Auto,
    /// Full copy on every node
    All,
    /// Hash on the column marked [`LayoutHint::DistKey`]
    Key,
}

/// A table definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDef {
    pub name: TableName,
    pub kind: TableKind,
    pub columns: Vec<Column>,
    pub dist_style: DistStyle,
}

impl TableDef {
    pub fn new(name: &str, kind: TableKind) -> Self {
        Self {
            name: TableName::new(name),
            kind,
            columns: Vec::new(),
            dist_style: DistStyle::default(),
        }
    }

    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Append plain columns with no constraints
    pub fn columns(mut self, columns: &[(&str, ColumnType)]) -> Self {
        self.columns
            .extend(columns.iter().map(|(name, ty)| Column::new(name, *ty)));
        self
    }

    pub fn dist_style(mut self, style: DistStyle) -> Self {
        self.dist_style = style;
        self
    }

    /// Column names in declaration order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Tables this table references by foreign key, in column order, deduplicated
    pub fn dependencies(&self) -> Vec<TableName> {
        let mut deps: Vec<TableName> = Vec::new();
        for fk in self.columns.iter().filter_map(|c| c.references.as_ref()) {
            if !deps.contains(&fk.table) {
                deps.push(fk.table.clone());
            }
        }
        deps
    }

    /// `DROP TABLE IF EXISTS`, cascading for referenced tables where supported
    pub fn drop_statement(&self, dialect: Dialect) -> Statement {
        let mut sql = format!("DROP TABLE IF EXISTS {}", quote_ident(&self.name));
        if self.kind != TableKind::Staging && dialect.supports_drop_cascade() {
            sql.push_str(" CASCADE");
        }
        Statement::new(StatementKind::Drop, self.name.clone(), sql)
    }

    /// `CREATE TABLE IF NOT EXISTS` with the full column list
    pub fn create_statement(&self, dialect: Dialect) -> Statement {
        let mut lines: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("    {}", c.render(dialect)))
            .collect();
        for column in &self.columns {
            if let Some(fk) = &column.references {
                lines.push(format!(
                    "    FOREIGN KEY ({}) REFERENCES {} ({})",
                    quote_ident(&column.name),
                    quote_ident(&fk.table),
                    quote_ident(&fk.column)
                ));
            }
        }

        let mut sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n)",
            quote_ident(&self.name),
            lines.join(",\n")
        );
        if dialect.supports_layout_hints() {
            match self.dist_style {
                DistStyle::Auto => {}
                DistStyle::All => sql.push_str(" DISTSTYLE ALL"),
                DistStyle::Key => sql.push_str(" DISTSTYLE KEY"),
            }
        }
        Statement::new(StatementKind::Create, self.name.clone(), sql)
    }
}

/// The full set of warehouse tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Catalog {
    tables: Vec<TableDef>,
}

impl Catalog {
    pub fn new(tables: Vec<TableDef>) -> Self {
        Self { tables }
    }

    /// Accident star schema: three staging tables, three dimensions, one fact
    pub fn star_schema() -> Self {
        Self::new(vec![
            accident_staging(),
            city_staging(),
            covid_staging(),
            time_dimension(),
            covid_dimension(),
            city_dimension(),
            accident_fact(),
        ])
    }

    pub fn tables(&self) -> &[TableDef] {
        &self.tables
    }

    pub fn get(&self, name: &str) -> Option<&TableDef> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn staging_tables(&self) -> impl Iterator<Item = &TableDef> {
        self.tables.iter().filter(|t| t.kind == TableKind::Staging)
    }

    /// Dependency DAG built from foreign keys
    pub fn dag(&self) -> CoreResult<TableDag> {
        let deps: Vec<(TableName, Vec<TableName>)> = self
            .tables
            .iter()
            .map(|t| (t.name.clone(), t.dependencies()))
            .collect();
        TableDag::build(&deps)
    }

    /// Tables in creation order (referenced tables first)
    pub fn create_order(&self) -> CoreResult<Vec<&TableDef>> {
        self.ordered(self.dag()?.topological_order()?)
    }

    /// Tables in drop order (referencing tables first)
    pub fn drop_order(&self) -> CoreResult<Vec<&TableDef>> {
        self.ordered(self.dag()?.reverse_topological_order()?)
    }

    fn ordered(&self, names: Vec<TableName>) -> CoreResult<Vec<&TableDef>> {
        // Every DAG node comes from this catalog
        Ok(names.iter().filter_map(|n| self.get(n)).collect())
    }
}

fn accident_staging() -> TableDef {
    use ColumnType::*;
    let coordinate = Numeric {
        precision: 9,
        scale: 6,
    };
    TableDef::new(ACCIDENT_STAGING, TableKind::Staging).columns(&[
        ("id", Varchar(None)),
        ("source", Varchar(None)),
        ("tmc", Real),
        ("severity", Int),
        ("start_time", Timestamp),
        ("end_time", Timestamp),
        ("start_lat", coordinate),
        ("start_lng", coordinate),
        ("end_lat", coordinate),
        ("end_lng", coordinate),
        ("distance", Real),
        ("description", VarcharMax),
        ("number", Real),
        ("street", Varchar(None)),
        ("side", Varchar(Some(1))),
        ("city", Varchar(None)),
        ("county", Varchar(None)),
        ("state", Varchar(Some(5))),
        ("zipcode", Varchar(None)),
        ("country", Varchar(None)),
        ("timezone", Varchar(None)),
        ("airport_code", Varchar(None)),
        ("weather_time", Timestamp),
        ("temprature", Real),
        ("wind_chill", Real),
        ("humidity", Real),
        ("pressure", Real),
        ("visibility", Real),
        ("wind_direction", Varchar(None)),
        ("wind_speed", Real),
        ("percipiration", Real),
        ("weather_condition", Varchar(None)),
        ("amenity", Boolean),
        ("bump", Boolean),
        ("crossing", Boolean),
        ("give_way", Boolean),
        ("junction", Boolean),
        ("no_exit", Boolean),
        ("railway", Boolean),
        ("roundabout", Boolean),
        ("station", Boolean),
        ("stop", Boolean),
        ("traffic_calming", Boolean),
        ("traffic_signal", Boolean),
        ("turning_loop", Boolean),
        ("sunrise_sunset", Varchar(None)),
        ("civil_twilight", Varchar(None)),
        ("nautical_twilight", Varchar(None)),
        ("astronomical_twilight", Varchar(None)),
    ])
}

fn city_staging() -> TableDef {
    use ColumnType::*;
    TableDef::new(CITY_STAGING, TableKind::Staging).columns(&[
        ("count", Int),
        ("city", Varchar(None)),
        ("number_of_veterans", Int),
        ("male_population", Int),
        ("foreign_born", Int),
        ("average_household_size", Real),
        ("median_age", Real),
        ("state", Varchar(None)),
        ("race", Varchar(None)),
        ("total_population", Int),
        ("state_code", Varchar(None)),
        ("female_population", Int),
    ])
}

fn covid_staging() -> TableDef {
    use ColumnType::*;
    TableDef::new(COVID_STAGING, TableKind::Staging).columns(&[
        ("country_name", Varchar(None)),
        ("day", Timestamp),
        ("stringency_index", Real),
        ("total_vaccinations", Real),
        ("total_deaths", Real),
        ("total_cases", Real),
        ("daily_cases", Real),
        ("biweekly_cases", Real),
    ])
}

fn time_dimension() -> TableDef {
    use ColumnType::*;
    TableDef::new(TIME_TABLE, TableKind::Dimension)
        .column(Column::new("start_time_key", Timestamp).primary_key())
        .column(Column::new("start_time", Timestamp).sort_key())
        .columns(&[
            ("hour", Int),
            ("day", Int),
            ("week", Int),
            ("month", Int),
            ("year", Int),
            ("weekend", Boolean),
        ])
        .dist_style(DistStyle::All)
}

fn covid_dimension() -> TableDef {
    use ColumnType::*;
    TableDef::new(COVID_TABLE, TableKind::Dimension)
        .column(Column::new("date_key", Timestamp).primary_key())
        .column(Column::new("total_cases", Int).sort_key())
        .columns(&[
            ("total_deaths", Int),
            ("daily_cases", Int),
            ("biweekly_cases", Int),
            ("total_vaccinations", Int),
        ])
        .dist_style(DistStyle::All)
}

fn city_dimension() -> TableDef {
    use ColumnType::*;
    TableDef::new(CITY_TABLE, TableKind::Dimension)
        .column(Column::new("city_key", Varchar(None)).primary_key())
        .column(Column::new("total_population", Int).sort_key())
        .columns(&[
            ("average_household_size", Real),
            ("median_age", Int),
            ("male_population", Int),
            ("female_population", Int),
            ("state", Varchar(None)),
        ])
        .dist_style(DistStyle::All)
}

fn accident_fact() -> TableDef {
    use ColumnType::*;
    TableDef::new(ACCIDENT_TABLE, TableKind::Fact)
        .column(Column::new("accident_id", Varchar(None)).primary_key())
        .column(Column::new("severity", Int))
        .column(
            Column::new("start_time_key", Timestamp).references(TIME_TABLE, "start_time_key"),
        )
        .column(Column::new("end_time", Timestamp))
        .column(Column::new("date_key", Timestamp).references(COVID_TABLE, "date_key"))
        .column(Column::new("description", VarcharMax))
        .column(
            Column::new("city_key", Varchar(None))
                .references(CITY_TABLE, "city_key")
                .dist_key(),
        )
        .columns(&[
            ("temprature", Real),
            ("wind_chill", Real),
            ("humidity", Real),
            ("pressure", Real),
            ("visibility", Real),
            ("wind_speed", Real),
            ("weather_condition", Varchar(None)),
            ("sunrise_sunset", Varchar(None)),
        ])
        .dist_style(DistStyle::Key)
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
