/// Tables sharded identically, so that joins among them stay on one node.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingTableRule {
    pub tables: Vec<String>,
}

impl BindingTableRule {
    /// Parses `"t_order, t_order_item"`.
    pub fn parse(group: &str) -> Self {
        Self {
            tables: group.split(',').map(str::trim).filter(|t| !t.is_empty()).map(String::from).collect(),
        }
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.tables.iter().any(|t| t.eq_ignore_ascii_case(table))
    }
}
