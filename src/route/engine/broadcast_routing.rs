use crate::route::{RouteMapper, RouteUnit, ShardingRule};

/// One unit per data source.
pub fn database_broadcast(rule: &ShardingRule) -> Vec<RouteUnit> {
    rule.data_source_names().iter().map(|ds| RouteUnit::new(ds, Vec::new())).collect()
}

/// One unit per data source; instances are not modelled apart from data
/// sources.
pub fn instance_broadcast(rule: &ShardingRule) -> Vec<RouteUnit> {
    database_broadcast(rule)
}

/// One unit per actual data node of every listed table.
pub fn table_broadcast(rule: &ShardingRule, table_names: &[String]) -> Vec<RouteUnit> {
    table_names
        .iter()
        .flat_map(|table| {
            rule.data_nodes_of(table)
                .into_iter()
                .map(move |node| RouteUnit::new(&node.data_source, vec![RouteMapper::new(table.as_str(), node.table)]))
        })
        .collect()
}
