use crate::{executor::ExecutionUnit, statement::SqlValue};

/// Rows a data source produced for one query, read lazily.
pub struct ShardRows {
    pub column_count: usize,
    pub rows: Box<dyn Iterator<Item = Result<Vec<SqlValue>, String>> + Send>,
}

impl ShardRows {
    pub fn from_rows(column_count: usize, rows: Vec<Vec<SqlValue>>) -> Self {
        Self { column_count, rows: Box::new(rows.into_iter().map(Ok)) }
    }
}

/// Connection to the physical databases. Calls block; the execution engine
/// runs them on blocking worker threads.
pub trait ShardExecutor: Send + Sync {
    fn query(&self, unit: &ExecutionUnit) -> Result<ShardRows, String>;

    /// Affected row count of a write.
    fn update(&self, unit: &ExecutionUnit) -> Result<u64, String>;
}
