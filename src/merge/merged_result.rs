use crate::{merge::MergeError, statement::SqlValue};

/// The single logical result stream built from every shard result.
pub trait MergedResult: Send {
    fn next(&mut self) -> Result<bool, MergeError>;

    /// Value of the 1-based `column_index` of the current row.
    fn value(&self, column_index: usize) -> Result<SqlValue, MergeError>;
}

/// Drains `result`, reading the first `column_count` columns of each row.
pub fn collect_rows(result: &mut dyn MergedResult, column_count: usize) -> Result<Vec<Vec<SqlValue>>, MergeError> {
    let mut rows = Vec::new();
    while result.next()? {
        rows.push((1..=column_count).map(|i| result.value(i)).collect::<Result<_, _>>()?);
    }
    Ok(rows)
}
