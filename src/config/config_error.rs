use std::fmt::Display;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Io { path: String, message: String },
    Parse(String),
    InvalidInlineExpression { expression: String, message: String },
    UnknownDataSource { table: String, data_source: String },
    InvalidBindingGroup { tables: Vec<String>, message: String },
    InvalidAlgorithm { table: String, message: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, message } => write!(f, "cannot read configuration '{path}': {message}"),
            ConfigError::Parse(message) => write!(f, "invalid configuration: {message}"),
            ConfigError::InvalidInlineExpression { expression, message } => {
                write!(f, "invalid inline expression '{expression}': {message}")
            }
            ConfigError::UnknownDataSource { table, data_source } => {
                write!(f, "table '{table}' refers to unknown data source '{data_source}'")
            }
            ConfigError::InvalidBindingGroup { tables, message } => {
                write!(f, "invalid binding tables [{}]: {message}", tables.join(", "))
            }
            ConfigError::InvalidAlgorithm { table, message } => {
                write!(f, "invalid sharding algorithm for '{table}': {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
