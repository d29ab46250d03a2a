use std::fmt::Display;

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionError {
    /// The worker runtime could not be started.
    Runtime { message: String },
    /// A statement failed on its data source.
    Shard { data_source: String, message: String },
}

impl Display for ExecutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionError::Runtime { message } => write!(f, "Cannot start shard workers: {message}"),
            ExecutionError::Shard { data_source, message } => {
                write!(f, "Execution on data source '{data_source}' failed: {message}")
            }
        }
    }
}

impl std::error::Error for ExecutionError {}
