use crate::{
    config::ConfigurationProps,
    route::{
        ComplexRouting, RouteUnit, RoutingError, ShardingConditions, ShardingRule, StandardRouting,
        database_broadcast, instance_broadcast, table_broadcast, unicast,
    },
};

/// How a statement is spread over data sources and tables.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutingEngine {
    /// One sharded table, or several bound to each other.
    Standard { logic_table: String, table_names: Vec<String> },
    /// Several sharded tables that are not bound.
    Complex { table_names: Vec<String> },
    DatabaseBroadcast,
    TableBroadcast { table_names: Vec<String> },
    InstanceBroadcast,
    Unicast { table_names: Vec<String> },
    /// Nothing to execute on any data source.
    Ignore,
}

impl RoutingEngine {
    pub fn name(&self) -> &'static str {
        match self {
            RoutingEngine::Standard { .. } => "standard",
            RoutingEngine::Complex { .. } => "complex",
            RoutingEngine::DatabaseBroadcast => "database-broadcast",
            RoutingEngine::TableBroadcast { .. } => "table-broadcast",
            RoutingEngine::InstanceBroadcast => "instance-broadcast",
            RoutingEngine::Unicast { .. } => "unicast",
            RoutingEngine::Ignore => "ignore",
        }
    }

    pub fn route(
        &self,
        rule: &ShardingRule,
        conditions: &ShardingConditions,
        props: &ConfigurationProps,
    ) -> Result<Vec<RouteUnit>, RoutingError> {
        match self {
            RoutingEngine::Standard { logic_table, table_names } => {
                StandardRouting::new(rule, logic_table, table_names).route(conditions)
            }
            RoutingEngine::Complex { table_names } => {
                ComplexRouting::new(rule, table_names, props.max_cartesian_route_units).route(conditions)
            }
            RoutingEngine::DatabaseBroadcast => Ok(database_broadcast(rule)),
            RoutingEngine::TableBroadcast { table_names } => Ok(table_broadcast(rule, table_names)),
            RoutingEngine::InstanceBroadcast => Ok(instance_broadcast(rule)),
            RoutingEngine::Unicast { table_names } => unicast(rule, table_names),
            RoutingEngine::Ignore => Ok(Vec::new()),
        }
    }
}
