//! Plan command implementation
//!
//! Renders a driver's statements for the configured backend without
//! connecting to it. Credentials are always redacted.

use anyhow::{Context, Result};
use dwh_core::{Dialect, Pipeline, Statement};

use super::common::load_pipeline;
use crate::cli::{GlobalArgs, PlanArgs, PlanDriver, PlanOutput};

/// Execute the plan command
pub async fn execute(args: &PlanArgs, global: &GlobalArgs) -> Result<()> {
    let (config, pipeline) = load_pipeline(global)?;
    let dialect = config.pipeline.backend.dialect();

    let statements = plan_statements(&pipeline, args.driver, dialect)?;
    match args.output {
        PlanOutput::Text => print!("{}", render_text(&statements)),
        PlanOutput::Json => println!("{}", render_json(&statements)?),
    }
    Ok(())
}

fn plan_statements(
    pipeline: &Pipeline,
    driver: PlanDriver,
    dialect: Dialect,
) -> Result<Vec<Statement>> {
    let statements = match driver {
        PlanDriver::Provision => pipeline.provision_statements(dialect),
        PlanDriver::Load => pipeline.load_statements(dialect),
    };
    statements.context("Failed to build statement plan")
}

/// One `-- KIND table` header and redacted SQL per statement
fn render_text(statements: &[Statement]) -> String {
    let mut out = String::new();
    for statement in statements {
        out.push_str(&format!(
            "-- {} {}\n{};\n\n",
            statement.kind(),
            statement.table(),
            statement
        ));
    }
    out
}

fn render_json(statements: &[Statement]) -> Result<String> {
    let planned: Vec<_> = statements.iter().map(Statement::planned).collect();
    serde_json::to_string_pretty(&planned).context("Failed to serialize plan")
}

#[cfg(test)]
#[path = "plan_test.rs"]
mod tests;
