use crate::route::{
    DataNode, RouteMapper, RouteUnit, RoutingError, ShardingConditionValue, ShardingConditions, ShardingRule,
    TableRule,
};

/// Routes one logical table (plus its binding siblings) through its
/// database and table strategies.
pub struct StandardRouting<'a> {
    rule: &'a ShardingRule,
    logic_table: &'a str,
    table_names: &'a [String],
}

impl<'a> StandardRouting<'a> {
    pub fn new(rule: &'a ShardingRule, logic_table: &'a str, table_names: &'a [String]) -> Self {
        Self { rule, logic_table, table_names }
    }

    pub fn route(&self, conditions: &ShardingConditions) -> Result<Vec<RouteUnit>, RoutingError> {
        let Some(table_rule) = self.rule.find_table_rule(self.logic_table) else {
            return self.route_unsharded();
        };
        let nodes = self.route_data_nodes(table_rule, conditions)?;
        Ok(nodes.iter().map(|node| self.unit_for(node)).collect())
    }

    /// One node per VALUES row; the units are the distinct nodes.
    pub fn route_insert(&self, conditions: &ShardingConditions) -> Result<(Vec<RouteUnit>, Vec<DataNode>), RoutingError> {
        let Some(table_rule) = self.rule.find_table_rule(self.logic_table) else {
            return Ok((self.route_unsharded()?, Vec::new()));
        };
        let mut row_nodes = Vec::with_capacity(conditions.conditions.len());
        for condition in &conditions.conditions {
            let values: Vec<&ShardingConditionValue> = condition.values.iter().collect();
            let nodes = self.route_by_values(table_rule, &values)?;
            match nodes.as_slice() {
                [node] => row_nodes.push(node.clone()),
                _ => {
                    return Err(RoutingError::InsertRoutesToMultipleNodes { table: self.logic_table.to_string() });
                }
            }
        }
        let mut distinct: Vec<DataNode> = Vec::new();
        for node in &row_nodes {
            if !distinct.contains(node) {
                distinct.push(node.clone());
            }
        }
        distinct.sort_by_key(|n| table_rule.node_position(n));
        Ok((distinct.iter().map(|node| self.unit_for(node)).collect(), row_nodes))
    }

    fn route_unsharded(&self) -> Result<Vec<RouteUnit>, RoutingError> {
        let data_source = if self.rule.is_broadcast_table(self.logic_table) {
            self.rule.data_source_names().first().map(String::as_str)
        } else {
            self.rule.single_data_source()
        };
        let data_source =
            data_source.ok_or_else(|| RoutingError::NoDefaultDataSource { table: self.logic_table.to_string() })?;
        let mappers = self
            .table_names
            .iter()
            .filter(|t| !self.rule.is_sharding_table(t))
            .map(|t| RouteMapper::new(t.as_str(), t.as_str()))
            .collect();
        Ok(vec![RouteUnit::new(data_source, mappers)])
    }

    /// Union of the nodes each condition reaches, in declaration order.
    fn route_data_nodes(&self, table_rule: &TableRule, conditions: &ShardingConditions) -> Result<Vec<DataNode>, RoutingError> {
        if conditions.is_empty() {
            return self.route_by_values(table_rule, &[]);
        }
        let mut nodes: Vec<DataNode> = Vec::new();
        for condition in &conditions.conditions {
            let values: Vec<&ShardingConditionValue> = condition
                .values
                .iter()
                .filter(|v| self.rule.is_binding_pair(self.logic_table, &v.table))
                .collect();
            for node in self.route_by_values(table_rule, &values)? {
                if !nodes.contains(&node) {
                    nodes.push(node);
                }
            }
        }
        nodes.sort_by_key(|n| table_rule.node_position(n));
        Ok(nodes)
    }

    fn route_by_values(&self, table_rule: &TableRule, values: &[&ShardingConditionValue]) -> Result<Vec<DataNode>, RoutingError> {
        let all_data_sources = table_rule.data_source_names();
        let data_sources = match &table_rule.database_strategy {
            Some(strategy) => strategy.do_sharding(self.logic_table, &all_data_sources, values)?,
            None => all_data_sources,
        };
        let mut nodes = Vec::new();
        for data_source in data_sources {
            let all_tables = table_rule.actual_tables_in(&data_source);
            let tables = match &table_rule.table_strategy {
                Some(strategy) => strategy.do_sharding(self.logic_table, &all_tables, values)?,
                None => all_tables,
            };
            nodes.extend(tables.into_iter().map(|t| DataNode::new(data_source.clone(), t)));
        }
        Ok(nodes)
    }

    fn unit_for(&self, node: &DataNode) -> RouteUnit {
        let mut mappers = vec![RouteMapper::new(self.logic_table, node.table.as_str())];
        for other in self.table_names {
            if other.eq_ignore_ascii_case(self.logic_table) || !self.rule.is_binding_pair(self.logic_table, other) {
                continue;
            }
            let actual = self
                .rule
                .binding_actual_table(&node.data_source, self.logic_table, other, &node.table)
                .unwrap_or_else(|| other.clone());
            mappers.push(RouteMapper::new(other.as_str(), actual));
        }
        RouteUnit::new(&node.data_source, mappers)
    }
}
