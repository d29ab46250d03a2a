use crate::{
    binder::SqlStatementContext,
    metadata::SchemaMetaData,
    route::{RoutingEngine, RoutingError, ShardingConditions, ShardingRule},
    statement::{DalStatement, SqlStatement},
};

/// Chooses the routing engine for a bound statement.
pub struct RoutingEngineFactory;

impl RoutingEngineFactory {
    pub fn new_instance(
        rule: &ShardingRule,
        schema: &dyn SchemaMetaData,
        context: &SqlStatementContext,
        conditions: &ShardingConditions,
    ) -> Result<RoutingEngine, RoutingError> {
        let table_names = context.tables().table_names().to_vec();
        if let SqlStatementContext::Common(common) = context {
            match &common.statement {
                SqlStatement::Dal(DalStatement::Use { .. }) => return Ok(RoutingEngine::Ignore),
                SqlStatement::Dal(DalStatement::ShowDatabases | DalStatement::ShowTables) => {
                    return Ok(RoutingEngine::InstanceBroadcast);
                }
                SqlStatement::Dal(_) => return Ok(RoutingEngine::Unicast { table_names }),
                SqlStatement::Tcl(_) => return Ok(RoutingEngine::DatabaseBroadcast),
                SqlStatement::Ddl(ddl) => return Ok(Self::ddl_engine(rule, ddl.kind.is_routine(), table_names)),
                SqlStatement::Dcl(_) => {
                    let sharding = rule.sharding_table_names(&table_names);
                    return Ok(if sharding.len() == 1 {
                        RoutingEngine::TableBroadcast { table_names: sharding }
                    } else {
                        RoutingEngine::InstanceBroadcast
                    });
                }
                _ => {}
            }
        }
        Self::dml_engine(rule, schema, context, conditions, table_names)
    }

    fn ddl_engine(rule: &ShardingRule, is_routine: bool, table_names: Vec<String>) -> RoutingEngine {
        if is_routine || table_names.is_empty() || rule.is_all_broadcast_tables(&table_names) {
            return RoutingEngine::DatabaseBroadcast;
        }
        let sharding = rule.sharding_table_names(&table_names);
        if sharding.is_empty() {
            let logic_table = table_names[0].clone();
            RoutingEngine::Standard { logic_table, table_names }
        } else {
            RoutingEngine::TableBroadcast { table_names: sharding }
        }
    }

    fn dml_engine(
        rule: &ShardingRule,
        schema: &dyn SchemaMetaData,
        context: &SqlStatementContext,
        conditions: &ShardingConditions,
        table_names: Vec<String>,
    ) -> Result<RoutingEngine, RoutingError> {
        if let Some(unknown) = table_names
            .iter()
            .find(|t| !rule.is_sharding_table(t) && !rule.is_broadcast_table(t) && !schema.contains_table(t))
        {
            return Err(RoutingError::RuleNotFound { table: unknown.clone() });
        }
        if table_names.is_empty() || rule.is_all_broadcast_tables(&table_names) {
            return Ok(if context.is_query() {
                RoutingEngine::Unicast { table_names }
            } else {
                RoutingEngine::DatabaseBroadcast
            });
        }
        if conditions.always_false && context.as_insert().is_none() {
            return Ok(RoutingEngine::Unicast { table_names });
        }

        let sharding = rule.sharding_table_names(&table_names);
        if sharding.is_empty() {
            let logic_table = table_names
                .iter()
                .find(|t| !rule.is_broadcast_table(t))
                .unwrap_or(&table_names[0])
                .clone();
            return Ok(RoutingEngine::Standard { logic_table, table_names });
        }
        if sharding.len() == 1 || rule.is_all_binding_tables(&sharding) {
            let logic_table = sharding
                .iter()
                .find(|t| conditions.mentions_table(t))
                .unwrap_or(&sharding[0])
                .clone();
            return Ok(RoutingEngine::Standard { logic_table, table_names });
        }
        Ok(RoutingEngine::Complex { table_names })
    }
}
