use std::fmt::Display;

#[derive(Debug, Clone, PartialEq)]
pub enum MergeError {
    /// A shard stream failed while it was being read.
    ShardRead { data_source: String, message: String },
    ColumnIndexOutOfRange { index: usize, column_count: usize },
    /// A column was read before the first `next()` or after the last row.
    NoCurrentRow,
    Aggregation { column: String, message: String },
}

impl Display for MergeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergeError::ShardRead { data_source, message } => {
                write!(f, "Reading results of data source '{data_source}' failed: {message}")
            }
            MergeError::ColumnIndexOutOfRange { index, column_count } => {
                write!(f, "Column index {index} is out of range, result has {column_count} columns")
            }
            MergeError::NoCurrentRow => write!(f, "Result is not positioned on a row"),
            MergeError::Aggregation { column, message } => {
                write!(f, "Cannot aggregate column '{column}': {message}")
            }
        }
    }
}

impl std::error::Error for MergeError {}
