use tracing::debug;

use crate::{
    config::{ConfigError, ShardingRuleConfiguration},
    route::{BindingTableRule, DataNode, ReadwriteSplittingGroup, TableRule},
};

/// Validated sharding configuration used by routing and rewriting.
#[derive(Debug)]
pub struct ShardingRule {
    data_source_names: Vec<String>,
    table_rules: Vec<TableRule>,
    binding_groups: Vec<BindingTableRule>,
    broadcast_tables: Vec<String>,
    default_data_source: Option<String>,
    readwrite_groups: Vec<ReadwriteSplittingGroup>,
}

impl ShardingRule {
    pub fn new(config: &ShardingRuleConfiguration) -> Result<Self, ConfigError> {
        let data_source_names = config.data_sources.clone();

        let mut table_rules = Vec::with_capacity(config.tables.len());
        for table in &config.tables {
            table_rules.push(TableRule::new(
                table,
                &data_source_names,
                config.default_database_strategy.as_ref(),
                config.default_table_strategy.as_ref(),
            )?);
        }

        if let Some(default) = &config.default_data_source {
            if !data_source_names.contains(default) {
                return Err(ConfigError::UnknownDataSource { table: String::new(), data_source: default.clone() });
            }
        }

        let mut readwrite_groups = Vec::new();
        for group in &config.readwrite_splitting {
            if !data_source_names.contains(&group.name) {
                return Err(ConfigError::UnknownDataSource {
                    table: String::new(),
                    data_source: group.name.clone(),
                });
            }
            readwrite_groups.push(ReadwriteSplittingGroup::new(group));
        }

        let mut rule = Self {
            data_source_names,
            table_rules,
            binding_groups: Vec::new(),
            broadcast_tables: config.broadcast_tables.clone(),
            default_data_source: config.default_data_source.clone(),
            readwrite_groups,
        };
        for group in &config.binding_tables {
            let binding = BindingTableRule::parse(group);
            rule.validate_binding_group(&binding)?;
            rule.binding_groups.push(binding);
        }

        debug!(
            tables = rule.table_rules.len(),
            binding_groups = rule.binding_groups.len(),
            broadcast_tables = rule.broadcast_tables.len(),
            "sharding rule loaded"
        );
        Ok(rule)
    }

    /// Binding tables must spread over the same data sources with the same
    /// number of actual tables in each.
    fn validate_binding_group(&self, binding: &BindingTableRule) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidBindingGroup { tables: binding.tables.clone(), message };
        let mut layout: Option<Vec<(String, usize)>> = None;
        for table in &binding.tables {
            let rule = self
                .find_table_rule(table)
                .ok_or_else(|| invalid(format!("'{table}' has no table rule")))?;
            let shape: Vec<(String, usize)> = rule
                .data_source_names()
                .into_iter()
                .map(|ds| {
                    let count = rule.actual_tables_in(&ds).len();
                    (ds, count)
                })
                .collect();
            match &layout {
                None => layout = Some(shape),
                Some(expected) if *expected != shape => {
                    return Err(invalid(format!("'{table}' is distributed differently")));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    pub fn data_source_names(&self) -> &[String] {
        &self.data_source_names
    }

    pub fn table_rules(&self) -> &[TableRule] {
        &self.table_rules
    }

    pub fn find_table_rule(&self, logic_table: &str) -> Option<&TableRule> {
        self.table_rules.iter().find(|r| r.logic_table.eq_ignore_ascii_case(logic_table))
    }

    pub fn is_sharding_table(&self, table: &str) -> bool {
        self.find_table_rule(table).is_some()
    }

    pub fn is_broadcast_table(&self, table: &str) -> bool {
        self.broadcast_tables.iter().any(|t| t.eq_ignore_ascii_case(table))
    }

    pub fn is_all_broadcast_tables(&self, tables: &[String]) -> bool {
        !tables.is_empty() && tables.iter().all(|t| self.is_broadcast_table(t))
    }

    pub fn find_binding_group(&self, table: &str) -> Option<&BindingTableRule> {
        self.binding_groups.iter().find(|g| g.has_table(table))
    }

    /// True when every table is sharded and all belong to one binding group.
    pub fn is_all_binding_tables(&self, tables: &[String]) -> bool {
        let Some(first) = tables.first() else { return false };
        let Some(group) = self.find_binding_group(first) else { return false };
        tables.iter().all(|t| group.has_table(t))
    }

    pub fn is_binding_pair(&self, a: &str, b: &str) -> bool {
        a.eq_ignore_ascii_case(b) || self.find_binding_group(a).is_some_and(|g| g.has_table(b))
    }

    /// Actual table of `other_logic` paired with `actual` of `logic` on
    /// `data_source`, by position inside the data source.
    pub fn binding_actual_table(&self, data_source: &str, logic: &str, other_logic: &str, actual: &str) -> Option<String> {
        let index = self.find_table_rule(logic)?.actual_table_index(data_source, actual)?;
        self.find_table_rule(other_logic)?.actual_tables_in(data_source).get(index).cloned()
    }

    pub fn is_sharding_column(&self, column: &str, table: &str) -> bool {
        self.find_table_rule(table).is_some_and(|r| r.is_sharding_column(column))
    }

    pub fn sharding_table_names(&self, tables: &[String]) -> Vec<String> {
        tables.iter().filter(|t| self.is_sharding_table(t)).cloned().collect()
    }

    /// Data source for tables outside every sharding rule: the configured
    /// default, else the only data source.
    pub fn single_data_source(&self) -> Option<&str> {
        match (&self.default_data_source, self.data_source_names.as_slice()) {
            (Some(default), _) => Some(default),
            (None, [only]) => Some(only),
            _ => None,
        }
    }

    /// Data sources holding `table`: its actual nodes, every data source for
    /// a broadcast table, the single data source otherwise.
    pub fn data_sources_of(&self, table: &str) -> Vec<String> {
        if let Some(rule) = self.find_table_rule(table) {
            rule.data_source_names()
        } else if self.is_broadcast_table(table) {
            self.data_source_names.clone()
        } else {
            self.single_data_source().map(String::from).into_iter().collect()
        }
    }

    pub fn data_nodes_of(&self, table: &str) -> Vec<DataNode> {
        match self.find_table_rule(table) {
            Some(rule) => rule.actual_data_nodes.clone(),
            None => self.data_sources_of(table).into_iter().map(|ds| DataNode::new(ds, table)).collect(),
        }
    }

    pub fn readwrite_group(&self, data_source: &str) -> Option<&ReadwriteSplittingGroup> {
        self.readwrite_groups.iter().find(|g| g.name == data_source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{_fixtures::sharding_rule_config, config::ShardingRuleConfiguration};

    #[test]
    fn expands_actual_data_nodes() {
        let rule = ShardingRule::new(&sharding_rule_config()).unwrap();
        let order = rule.find_table_rule("T_ORDER").unwrap();
        assert_eq!(order.actual_data_nodes.len(), 4);
        assert_eq!(order.data_source_names(), vec!["ds_0", "ds_1"]);
        assert_eq!(order.actual_tables_in("ds_1"), vec!["t_order_0", "t_order_1"]);
    }

    #[test]
    fn binding_tables_pair_by_position() {
        let rule = ShardingRule::new(&sharding_rule_config()).unwrap();
        assert!(rule.is_all_binding_tables(&["t_order".into(), "t_order_item".into()]));
        assert!(!rule.is_all_binding_tables(&["t_order".into(), "t_user".into()]));
        assert_eq!(
            rule.binding_actual_table("ds_0", "t_order", "t_order_item", "t_order_1"),
            Some("t_order_item_1".to_string())
        );
    }

    #[test]
    fn unsharded_tables_use_default_data_source() {
        let rule = ShardingRule::new(&sharding_rule_config()).unwrap();
        assert_eq!(rule.single_data_source(), Some("ds_0"));
        assert_eq!(rule.data_sources_of("t_single"), vec!["ds_0"]);
        assert_eq!(rule.data_sources_of("t_config"), vec!["ds_0", "ds_1"]);
    }

    #[test]
    fn rejects_unknown_data_source() {
        let mut config = sharding_rule_config();
        config.tables[0].actual_data_nodes = Some("ds_${0..2}.t_order".into());
        assert!(matches!(ShardingRule::new(&config), Err(ConfigError::UnknownDataSource { .. })));
    }

    #[test]
    fn rejects_inconsistent_binding_group() {
        let mut config: ShardingRuleConfiguration = sharding_rule_config();
        config.binding_tables = vec!["t_order, t_user".into()];
        assert!(matches!(ShardingRule::new(&config), Err(ConfigError::InvalidBindingGroup { .. })));
    }
}
