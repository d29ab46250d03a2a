use crate::route::{RouteMapper, RouteUnit, RoutingError, ShardingRule};

/// A single unit on the first data source holding every listed table.
pub fn unicast(rule: &ShardingRule, table_names: &[String]) -> Result<Vec<RouteUnit>, RoutingError> {
    let mut candidates: Vec<&String> = rule.data_source_names().iter().collect();
    for table in table_names {
        let holders = rule.data_sources_of(table);
        candidates.retain(|ds| holders.contains(*ds));
    }
    let data_source =
        candidates.first().ok_or_else(|| RoutingError::NoCommonDataSource { tables: table_names.to_vec() })?;

    let mappers = table_names
        .iter()
        .map(|table| {
            let actual = rule
                .find_table_rule(table)
                .and_then(|r| r.actual_tables_in(data_source).into_iter().next())
                .unwrap_or_else(|| table.clone());
            RouteMapper::new(table.as_str(), actual)
        })
        .collect();
    Ok(vec![RouteUnit::new(data_source, mappers)])
}
