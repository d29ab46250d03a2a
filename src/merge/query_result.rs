use crate::{merge::MergeError, statement::SqlValue};

/// Cursor over the rows one shard returned. Columns are 1-based.
pub trait QueryResult: Send {
    /// Moves to the next row, `false` once exhausted.
    fn next(&mut self) -> Result<bool, MergeError>;

    fn value(&self, column_index: usize) -> Result<SqlValue, MergeError>;

    fn column_count(&self) -> usize;
}

/// Every column of the row `result` is positioned on.
pub fn current_row(result: &dyn QueryResult) -> Result<Vec<SqlValue>, MergeError> {
    (1..=result.column_count()).map(|index| result.value(index)).collect()
}

/// Rows held in memory, used for shard results that were buffered and for
/// rows regrouped by the merger.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MemoryQueryResult {
    column_count: usize,
    rows: Vec<Vec<SqlValue>>,
    /// Row the cursor is on, `None` before the first `next()`.
    position: Option<usize>,
}

impl MemoryQueryResult {
    pub fn new(column_count: usize, rows: Vec<Vec<SqlValue>>) -> Self {
        Self { column_count, rows, position: None }
    }

    /// Rows of integers, handy for building shard results by hand.
    pub fn from_ints(rows: &[&[i64]]) -> Self {
        let column_count = rows.first().map_or(0, |row| row.len());
        let rows = rows.iter().map(|row| row.iter().map(|v| SqlValue::Int(*v)).collect()).collect();
        Self::new(column_count, rows)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl QueryResult for MemoryQueryResult {
    fn next(&mut self) -> Result<bool, MergeError> {
        let next = self.position.map_or(0, |p| p + 1).min(self.rows.len());
        self.position = Some(next);
        Ok(next < self.rows.len())
    }

    fn value(&self, column_index: usize) -> Result<SqlValue, MergeError> {
        if column_index == 0 || column_index > self.column_count {
            return Err(MergeError::ColumnIndexOutOfRange { index: column_index, column_count: self.column_count });
        }
        let row = self.position.and_then(|p| self.rows.get(p)).ok_or(MergeError::NoCurrentRow)?;
        Ok(row.get(column_index - 1).cloned().unwrap_or_default())
    }

    fn column_count(&self) -> usize {
        self.column_count
    }
}
