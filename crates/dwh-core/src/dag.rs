//! Table dependency DAG and topological sorting

use crate::error::{CoreError, CoreResult};
use crate::table_name::TableName;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet};

/// A directed acyclic graph of table dependencies
#[derive(Debug)]
pub struct TableDag {
    /// The underlying graph
    graph: DiGraph<TableName, ()>,

    /// Map from table name to node index
    node_map: HashMap<TableName, NodeIndex>,
}

impl TableDag {
    /// Create a new empty DAG
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Add a table to the DAG
    pub fn add_table(&mut self, name: &TableName) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(name) {
            idx
        } else {
            let idx = self.graph.add_node(name.clone());
            self.node_map.insert(name.clone(), idx);
            idx
        }
    }

    /// Add a dependency edge (`from` depends on `to`)
    pub fn add_dependency(&mut self, from: &TableName, to: &TableName) {
        let from_idx = self.add_table(from);
        let to_idx = self.add_table(to);
        // Edge goes from dependency to dependent so the sort yields dependencies first
        self.graph.update_edge(to_idx, from_idx, ());
    }

    /// Build the DAG from (table, dependencies) pairs.
    ///
    /// Nodes are added in the given order. A dependency on a table that is
    /// not itself listed is an error.
    pub fn build(dependencies: &[(TableName, Vec<TableName>)]) -> CoreResult<Self> {
        let mut dag = Self::new();

        for (table, _) in dependencies {
            dag.add_table(table);
        }

        for (table, deps) in dependencies {
            for dep in deps {
                if !dag.contains(dep) {
                    return Err(CoreError::UnknownTable {
                        name: dep.to_string(),
                        referenced_by: table.to_string(),
                    });
                }
                dag.add_dependency(table, dep);
            }
        }

        dag.validate()?;

        Ok(dag)
    }

    /// Validate the DAG has no cycles
    pub fn validate(&self) -> CoreResult<()> {
        self.topological_order().map(|_| ())
    }

    /// Find a cycle path starting from a node for error reporting
    fn find_cycle_path(&self, start: NodeIndex) -> String {
        let mut path: Vec<String> = vec![self.graph[start].to_string()];
        let mut current = start;
        let mut visited = HashSet::new();
        visited.insert(current);

        while let Some(edge) = self.graph.edges(current).next() {
            let target = edge.target();
            path.push(self.graph[target].to_string());

            if target == start || visited.contains(&target) {
                break;
            }

            visited.insert(target);
            current = target;
        }

        path.join(" -> ")
    }

    /// Tables in topological order (dependencies first)
    pub fn topological_order(&self) -> CoreResult<Vec<TableName>> {
        match toposort(&self.graph, None) {
            Ok(indices) => Ok(indices
                .into_iter()
                .map(|idx| self.graph[idx].clone())
                .collect()),
            Err(cycle) => {
                let cycle_str = self.find_cycle_path(cycle.node_id());
                Err(CoreError::CircularDependency { cycle: cycle_str })
            }
        }
    }

    /// Tables in reverse topological order (dependents first)
    pub fn reverse_topological_order(&self) -> CoreResult<Vec<TableName>> {
        let mut order = self.topological_order()?;
        order.reverse();
        Ok(order)
    }

    /// Direct dependencies of a table
    pub fn dependencies(&self, table: &str) -> Vec<TableName> {
        if let Some(&idx) = self.node_map.get(table) {
            self.graph
                .edges_directed(idx, petgraph::Direction::Incoming)
                .map(|e| self.graph[e.source()].clone())
                .collect()
        } else {
            Vec::new()
        }
    }

    /// Check if a table exists in the DAG
    pub fn contains(&self, table: &str) -> bool {
        self.node_map.contains_key(table)
    }
}

impl Default for TableDag {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "dag_test.rs"]
mod tests;
