//! Ordered statement plans for the provisioning and load drivers

use crate::catalog::Catalog;
use crate::config::WarehouseConfig;
use crate::copy::CopySpec;
use crate::dag::TableDag;
use crate::dialect::Dialect;
use crate::error::{CoreError, CoreResult};
use crate::statement::Statement;
use crate::transform::Transform;

/// Catalog, bulk loads and transforms for one warehouse
#[derive(Debug)]
pub struct Pipeline {
    catalog: Catalog,
    copies: Vec<CopySpec>,
    transforms: Vec<Transform>,
}

impl Pipeline {
    pub fn new(catalog: Catalog, copies: Vec<CopySpec>, transforms: Vec<Transform>) -> Self {
        Self {
            catalog,
            copies,
            transforms,
        }
    }

    /// The accident star schema wired to the configured sources
    pub fn from_config(config: &WarehouseConfig) -> Self {
        Self::new(
            Catalog::star_schema(),
            CopySpec::from_config(config),
            Transform::star_schema(&config.pipeline.country),
        )
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn copies(&self) -> &[CopySpec] {
        &self.copies
    }

    pub fn transforms(&self) -> &[Transform] {
        &self.transforms
    }

    /// The catalog's foreign-key DAG plus transform source edges
    pub fn dag(&self) -> CoreResult<TableDag> {
        let mut dag = self.catalog.dag()?;
        for transform in &self.transforms {
            for name in [&transform.target, &transform.source] {
                if !dag.contains(name) {
                    return Err(CoreError::UnknownTable {
                        name: name.to_string(),
                        referenced_by: format!("transform into {}", transform.target),
                    });
                }
            }
            dag.add_dependency(&transform.target, &transform.source);
        }
        dag.validate()?;
        Ok(dag)
    }

    /// DROP every table (dependents first), then CREATE every table
    /// (dependencies first)
    pub fn provision_statements(&self, dialect: Dialect) -> CoreResult<Vec<Statement>> {
        let drops = self.catalog.drop_order()?;
        let creates = self.catalog.create_order()?;

        let mut statements = Vec::with_capacity(drops.len() + creates.len());
        statements.extend(drops.iter().map(|table| table.drop_statement(dialect)));
        statements.extend(creates.iter().map(|table| table.create_statement(dialect)));
        Ok(statements)
    }

    /// COPY every staging table, then run every transform with its
    /// dependencies first
    pub fn load_statements(&self, dialect: Dialect) -> CoreResult<Vec<Statement>> {
        let dag = self.dag()?;
        let order = dag.topological_order()?;
        let mut statements = Vec::new();

        for name in &order {
            for copy in self.copies.iter().filter(|c| &c.table == name) {
                statements.push(copy.statement(dialect)?);
            }
        }
        for name in &order {
            for transform in self.transforms.iter().filter(|t| &t.target == name) {
                statements.push(transform.statement(&self.catalog)?);
            }
        }

        Ok(statements)
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
