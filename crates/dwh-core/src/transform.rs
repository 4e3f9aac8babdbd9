//! Staging → dimension/fact transforms (`INSERT … SELECT`)
//!
//! Each transform reads one staging table and writes one target table.
//! Dimensions get exactly one row per natural key even when staging holds
//! conflicting rows for it. Every SELECT skips natural keys already present in its target, so a
//! repeated load against accumulated staging rows adds no duplicate keys.

use crate::catalog::{
    Catalog, ACCIDENT_STAGING, ACCIDENT_TABLE, CITY_STAGING, CITY_TABLE, COVID_STAGING,
    COVID_TABLE, TIME_TABLE,
};
use crate::error::{CoreError, CoreResult};
use crate::sql_utils::{quote_ident, quote_literal};
use crate::statement::{Statement, StatementKind};
use crate::table_name::TableName;

/// `EXTRACT(dow …)` values for Saturday and Sunday.
///
/// Redshift and DuckDB both number weekdays 0 = Sunday … 6 = Saturday, so
/// this is the ISO 8601 weekend expressed in the engines' shared numbering.
pub const WEEKEND_DOW: [u8; 2] = [6, 0];

/// One `INSERT … SELECT` into a dimension or fact table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transform {
    pub target: TableName,
    pub source: TableName,
    /// SELECT producing rows in the target's column order
    pub select: String,
}

impl Transform {
    /// Transforms for the accident star schema.
    ///
    /// `country` is the entity name of the aggregate-country rows in the
    /// pandemic dataset; only those rows feed the date dimension.
    pub fn star_schema(country: &str) -> Vec<Self> {
        vec![
            time_dimension(),
            covid_dimension(country),
            city_dimension(),
            accident_fact(),
        ]
    }

    /// Render the INSERT with the target's full column list
    pub fn statement(&self, catalog: &Catalog) -> CoreResult<Statement> {
        let target = catalog
            .get(&self.target)
            .ok_or_else(|| CoreError::UnknownTable {
                name: self.target.to_string(),
                referenced_by: format!("transform from {}", self.source),
            })?;
        let columns: Vec<String> = target
            .column_names()
            .into_iter()
            .map(quote_ident)
            .collect();
        let sql = format!(
            "INSERT INTO {} ({})\n{}",
            quote_ident(&self.target),
            columns.join(", "),
            self.select
        );
        Ok(Statement::new(StatementKind::Insert, self.target.clone(), sql))
    }
}

fn weekend_case(column: &str) -> String {
    format!(
        "CASE WHEN EXTRACT(dow FROM {col}) IN ({sat}, {sun}) THEN TRUE ELSE FALSE END",
        col = column,
        sat = WEEKEND_DOW[0],
        sun = WEEKEND_DOW[1]
    )
}

fn time_dimension() -> Transform {
    let select = format!(
        "SELECT DISTINCT s.start_time,
       s.start_time,
       EXTRACT(hour FROM s.start_time),
       EXTRACT(day FROM s.start_time),
       EXTRACT(week FROM s.start_time),
       EXTRACT(month FROM s.start_time),
       EXTRACT(year FROM s.start_time),
       {weekend}
FROM {staging} s
WHERE s.start_time IS NOT NULL
  AND NOT EXISTS (SELECT 1 FROM {target} t WHERE t.start_time_key = s.start_time)",
        weekend = weekend_case("s.start_time"),
        staging = ACCIDENT_STAGING,
        target = TIME_TABLE,
    );
    Transform {
        target: TableName::new(TIME_TABLE),
        source: TableName::new(ACCIDENT_STAGING),
        select,
    }
}

/// Keep one row per `key`, the first under `order`
fn first_per_key(key: &str, order: &str) -> String {
    format!("ROW_NUMBER() OVER (PARTITION BY {key} ORDER BY {order}) AS key_rank")
}

fn covid_dimension(country: &str) -> Transform {
    // A revised feed can repeat a day; the highest running total is the latest
    let select = format!(
        "SELECT r.day,
       CAST(r.total_cases AS INT),
       CAST(r.total_deaths AS INT),
       CAST(r.daily_cases AS INT),
       CAST(r.biweekly_cases AS INT),
       CAST(r.total_vaccinations AS INT)
FROM (SELECT s.day,
             s.total_cases,
             s.total_deaths,
             s.daily_cases,
             s.biweekly_cases,
             s.total_vaccinations,
             {rank}
      FROM {staging} s
      WHERE s.country_name = {country}
        AND s.day IS NOT NULL) r
WHERE r.key_rank = 1
  AND NOT EXISTS (SELECT 1 FROM {target} c WHERE c.date_key = r.day)",
        rank = first_per_key(
            "s.day",
            "s.total_cases DESC NULLS LAST, s.total_deaths DESC NULLS LAST"
        ),
        staging = COVID_STAGING,
        country = quote_literal(country),
        target = COVID_TABLE,
    );
    Transform {
        target: TableName::new(COVID_TABLE),
        source: TableName::new(COVID_STAGING),
        select,
    }
}

fn city_dimension() -> Transform {
    // City names repeat across states; the most populous one keeps the key
    let select = format!(
        "SELECT r.city,
       r.total_population,
       r.average_household_size,
       CAST(r.median_age AS INT),
       r.male_population,
       r.female_population,
       r.state
FROM (SELECT s.city,
             s.total_population,
             s.average_household_size,
             s.median_age,
             s.male_population,
             s.female_population,
             s.state,
             {rank}
      FROM {staging} s
      WHERE s.city IS NOT NULL) r
WHERE r.key_rank = 1
  AND NOT EXISTS (SELECT 1 FROM {target} c WHERE c.city_key = r.city)",
        rank = first_per_key(
            "s.city",
            "s.total_population DESC NULLS LAST, s.state"
        ),
        staging = CITY_STAGING,
        target = CITY_TABLE,
    );
    Transform {
        target: TableName::new(CITY_TABLE),
        source: TableName::new(CITY_STAGING),
        select,
    }
}

fn accident_fact() -> Transform {
    let select = format!(
        "SELECT s.id,
       s.severity,
       s.start_time,
       s.end_time,
       DATE_TRUNC('day', s.start_time),
       s.description,
       s.city,
       s.temprature,
       s.wind_chill,
       s.humidity,
       s.pressure,
       s.visibility,
       s.wind_speed,
       s.weather_condition,
       s.sunrise_sunset
FROM {staging} s
WHERE NOT EXISTS (SELECT 1 FROM {target} a WHERE a.accident_id = s.id)",
        staging = ACCIDENT_STAGING,
        target = ACCIDENT_TABLE,
    );
    Transform {
        target: TableName::new(ACCIDENT_TABLE),
        source: TableName::new(ACCIDENT_STAGING),
        select,
    }
}

#[cfg(test)]
#[path = "transform_test.rs"]
mod tests;
