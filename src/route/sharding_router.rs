use tracing::debug;

use crate::{
    binder::SqlStatementContext,
    config::ConfigurationProps,
    metadata::SchemaMetaData,
    route::{
        ConnectionSession, GeneratedKeyContext, ReadwriteSplittingOverlay, RouteContext, RoutingEngine,
        RoutingEngineFactory, RoutingError, ShardingConditionEngine, ShardingRule, StandardRouting,
    },
    statement::SqlValue,
};

/// Turns a bound statement into route units.
pub struct ShardingRouter<'a> {
    rule: &'a ShardingRule,
    schema: &'a dyn SchemaMetaData,
    props: &'a ConfigurationProps,
}

impl<'a> ShardingRouter<'a> {
    pub fn new(rule: &'a ShardingRule, schema: &'a dyn SchemaMetaData, props: &'a ConfigurationProps) -> Self {
        Self { rule, schema, props }
    }

    pub fn route(
        &self,
        context: &SqlStatementContext,
        params: &[SqlValue],
        session: &ConnectionSession,
    ) -> Result<RouteContext, RoutingError> {
        let generated_key = context.as_insert().and_then(|insert| GeneratedKeyContext::create(insert, self.rule, params));
        let conditions = ShardingConditionEngine::new(self.rule, self.schema).create(context, params, generated_key.as_ref())?;
        let engine = RoutingEngineFactory::new_instance(self.rule, self.schema, context, &conditions)?;

        let (mut units, insert_row_nodes) = match (&engine, context.as_insert()) {
            (RoutingEngine::Standard { logic_table, table_names }, Some(_)) => {
                StandardRouting::new(self.rule, logic_table, table_names).route_insert(&conditions)?
            }
            _ => (engine.route(self.rule, &conditions, self.props)?, Vec::new()),
        };
        debug!(engine = engine.name(), units = units.len(), "routed");

        ReadwriteSplittingOverlay::apply(self.rule, &mut units, context.is_write(), session);
        Ok(RouteContext { units, generated_key, insert_row_nodes })
    }
}
