use std::sync::Arc;

use tracing::debug;

use crate::{
    executor::{ShardExecutionEngine, ShardExecutor},
    kernel::{MergedQueryResult, ShardingError, ShardingKernel},
    route::ConnectionSession,
    statement::{SqlStatement, SqlValue},
};

/// Outcome of a write across its data sources.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateResult {
    pub affected_rows: u64,
    /// Keys allocated for an INSERT that omitted its key column.
    pub generated_keys: Vec<SqlValue>,
}

/// A kernel wired to the data sources through a shard executor.
pub struct ShardingRuntime {
    kernel: ShardingKernel,
    engine: ShardExecutionEngine,
}

impl ShardingRuntime {
    pub fn new(kernel: ShardingKernel, executor: Arc<dyn ShardExecutor>) -> Result<Self, ShardingError> {
        let engine = ShardExecutionEngine::new(executor, kernel.props())?;
        Ok(Self { kernel, engine })
    }

    pub fn kernel(&self) -> &ShardingKernel {
        &self.kernel
    }

    /// Runs a query on every unit it routes to and merges the shard streams.
    /// Dropping the returned result stops the shards that are still producing.
    pub fn execute_query(
        &self,
        sql: &str,
        statement: &SqlStatement,
        params: &[SqlValue],
        session: &mut ConnectionSession,
    ) -> Result<MergedQueryResult, ShardingError> {
        let mut context = self.kernel.prepare(sql, statement, params, session)?;
        let units = std::mem::take(&mut context.units);
        let results = self.engine.execute_query(units);
        self.kernel.merge(&context, results)
    }

    pub fn execute_update(
        &self,
        sql: &str,
        statement: &SqlStatement,
        params: &[SqlValue],
        session: &mut ConnectionSession,
    ) -> Result<UpdateResult, ShardingError> {
        let mut context = self.kernel.prepare(sql, statement, params, session)?;
        let generated_keys = context.generated_keys();
        let counts = self.engine.execute_update(std::mem::take(&mut context.units))?;
        let affected_rows = self.kernel.merge_update(&counts);
        debug!(affected_rows, units = counts.len(), "update merged");
        Ok(UpdateResult { affected_rows, generated_keys })
    }
}
