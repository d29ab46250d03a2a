use crate::route::{DataNode, GeneratedKeyContext, RouteUnit};

/// Outcome of routing one statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RouteContext {
    pub units: Vec<RouteUnit>,
    pub generated_key: Option<GeneratedKeyContext>,
    /// For INSERT, the data node each VALUES row routes to.
    pub insert_row_nodes: Vec<DataNode>,
}

impl RouteContext {
    pub fn is_single_routing(&self) -> bool {
        self.units.len() == 1
    }

    /// Distinct actual data sources, in unit order.
    pub fn actual_data_source_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for unit in &self.units {
            if !names.contains(&unit.actual_data_source()) {
                names.push(unit.actual_data_source());
            }
        }
        names
    }

    /// Whether VALUES row `row_index` belongs in `unit`.
    pub fn row_belongs_to(&self, row_index: usize, unit: &RouteUnit) -> bool {
        match self.insert_row_nodes.get(row_index) {
            Some(node) => {
                node.data_source == unit.data_source.logic_name
                    && unit.tables.iter().any(|t| t.actual_name.eq_ignore_ascii_case(&node.table))
            }
            None => true,
        }
    }
}
