use tracing::debug;

use crate::route::{RouteMapper, RouteUnit, RoutingError, ShardingConditions, ShardingRule, StandardRouting};

/// Routes each non-binding sharded table on its own and joins the results
/// as a Cartesian product inside every data source they share.
pub struct ComplexRouting<'a> {
    rule: &'a ShardingRule,
    table_names: &'a [String],
    max_units: usize,
}

impl<'a> ComplexRouting<'a> {
    pub fn new(rule: &'a ShardingRule, table_names: &'a [String], max_units: usize) -> Self {
        Self { rule, table_names, max_units }
    }

    pub fn route(&self, conditions: &ShardingConditions) -> Result<Vec<RouteUnit>, RoutingError> {
        let mut routed: Vec<Vec<RouteUnit>> = Vec::new();
        let mut covered: Vec<&String> = Vec::new();
        for table in self.rule.sharding_table_names(self.table_names).iter() {
            if covered.iter().any(|c| c.eq_ignore_ascii_case(table)) {
                continue;
            }
            routed.push(StandardRouting::new(self.rule, table, self.table_names).route(conditions)?);
            covered.extend(self.table_names.iter().filter(|t| self.rule.is_binding_pair(table, t)));
        }
        match routed.len() {
            0 => Ok(Vec::new()),
            1 => Ok(routed.remove(0)),
            _ => self.cartesian(routed),
        }
    }

    fn cartesian(&self, routed: Vec<Vec<RouteUnit>>) -> Result<Vec<RouteUnit>, RoutingError> {
        let common: Vec<&String> = self
            .rule
            .data_source_names()
            .iter()
            .filter(|ds| routed.iter().all(|units| units.iter().any(|u| u.logic_data_source() == ds.as_str())))
            .collect();
        if common.is_empty() {
            return Err(RoutingError::NoCommonDataSource { tables: self.table_names.to_vec() });
        }

        let total: usize = common
            .iter()
            .map(|ds| units_in(&routed, ds).iter().map(Vec::len).fold(1usize, usize::saturating_mul))
            .fold(0usize, usize::saturating_add);
        if total > self.max_units {
            return Err(RoutingError::RoutingExplosion {
                tables: self.table_names.to_vec(),
                units: total,
                limit: self.max_units,
            });
        }

        let mut result = Vec::with_capacity(total);
        for ds in common {
            let mut combinations: Vec<Vec<RouteMapper>> = vec![Vec::new()];
            for group in units_in(&routed, ds) {
                combinations = combinations
                    .iter()
                    .flat_map(|prefix| {
                        group.iter().map(move |unit| {
                            let mut mappers = prefix.clone();
                            mappers.extend(unit.tables.iter().cloned());
                            mappers
                        })
                    })
                    .collect();
            }
            result.extend(combinations.into_iter().map(|mappers| RouteUnit::new(ds, mappers)));
        }
        debug!(units = result.len(), "cartesian route");
        Ok(result)
    }
}

/// The units of every routed table that land on `data_source`.
fn units_in<'u>(routed: &'u [Vec<RouteUnit>], data_source: &str) -> Vec<Vec<&'u RouteUnit>> {
    routed
        .iter()
        .map(|units| units.iter().filter(|u| u.logic_data_source() == data_source).collect())
        .collect()
}
