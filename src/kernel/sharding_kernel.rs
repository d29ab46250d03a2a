use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    binder::{QueryHeader, StatementBinder},
    config::{ConfigurationProps, ShardingConfig},
    executor::ExecutionUnit,
    kernel::{ExecutionContext, ShardingError},
    merge::{IteratorStreamMergedResult, MergedResult, QueryResult, ResultMergerEngine},
    metadata::SchemaMetaData,
    rewrite::{EncryptRule, Encryptor, SqlRewriteContext, SqlRewriteEngine},
    route::{ConnectionSession, ShardingRouter, ShardingRule},
    statement::{SqlStatement, SqlValue},
};

/// Merged rows of a query with the columns the caller sees.
pub struct MergedQueryResult {
    pub headers: Vec<QueryHeader>,
    pub column_count: usize,
    pub result: Box<dyn MergedResult>,
}

/// Binds, routes and rewrites logical statements, and merges what the shards return.
pub struct ShardingKernel {
    rule: Arc<ShardingRule>,
    schema: Arc<dyn SchemaMetaData>,
    encrypt: EncryptRule,
    props: ConfigurationProps,
}

impl ShardingKernel {
    pub fn new(
        rule: Arc<ShardingRule>,
        schema: Arc<dyn SchemaMetaData>,
        encrypt: EncryptRule,
        props: ConfigurationProps,
    ) -> Self {
        Self { rule, schema, encrypt, props }
    }

    pub fn from_config(config: &ShardingConfig, schema: Arc<dyn SchemaMetaData>) -> Result<Self, ShardingError> {
        let rule = ShardingRule::new(&config.rule)?;
        Ok(Self::new(Arc::new(rule), schema, EncryptRule::new(config.encrypt.clone()), config.props.clone()))
    }

    /// Registers the implementation behind an encryptor name used in the configuration.
    pub fn with_encryptor(mut self, name: &str, encryptor: Arc<dyn Encryptor>) -> Self {
        self.encrypt.register(name, encryptor);
        self
    }

    pub fn props(&self) -> &ConfigurationProps {
        &self.props
    }

    pub fn rule(&self) -> &ShardingRule {
        &self.rule
    }

    /// Everything the data sources must run for `statement`, parsed from `sql`.
    pub fn prepare(
        &self,
        sql: &str,
        statement: &SqlStatement,
        params: &[SqlValue],
        session: &mut ConnectionSession,
    ) -> Result<ExecutionContext, ShardingError> {
        let schema = self.schema.as_ref();
        let statement_context = StatementBinder::new(schema).bind(statement, params)?;
        let route = ShardingRouter::new(&self.rule, schema, &self.props).route(&statement_context, params, session)?;
        session.observe(statement);

        let rewrite = SqlRewriteContext::new(sql, &statement_context, &route, params, &self.rule, &self.encrypt, schema)?;
        let mut units = Vec::with_capacity(route.units.len());
        for unit in &route.units {
            let result = SqlRewriteEngine::rewrite(&rewrite, unit, &route)?;
            units.push(ExecutionUnit::new(unit.actual_data_source(), &result.sql, result.parameters));
        }
        debug!(units = units.len(), "execution units prepared");

        if self.props.sql_show {
            info!("Logic SQL: {sql}");
            for unit in &units {
                info!("Actual SQL: {unit}");
            }
        }
        Ok(ExecutionContext { sql: sql.to_string(), statement_context, route, units })
    }

    /// One logical result out of the shard results of `context`, given in unit order.
    pub fn merge(
        &self,
        context: &ExecutionContext,
        results: Vec<Box<dyn QueryResult>>,
    ) -> Result<MergedQueryResult, ShardingError> {
        match context.statement_context.as_select() {
            Some(select) => Ok(MergedQueryResult {
                headers: select.query_headers(self.schema.as_ref()),
                column_count: select.projections.visible_column_count(),
                result: ResultMergerEngine::merge_query(results, select)?,
            }),
            None => Ok(MergedQueryResult {
                headers: Vec::new(),
                column_count: results.first().map(|r| r.column_count()).unwrap_or(0),
                result: Box::new(IteratorStreamMergedResult::new(results)),
            }),
        }
    }

    /// Affected rows of a write over all of its units.
    pub fn merge_update(&self, counts: &[u64]) -> u64 {
        ResultMergerEngine::merge_update_counts(counts)
    }
}
