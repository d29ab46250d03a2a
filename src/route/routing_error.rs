use std::fmt::Display;

#[derive(Debug, Clone, PartialEq)]
pub enum RoutingError {
    /// A table is neither sharded, broadcast nor known to the schema.
    RuleNotFound { table: String },
    RoutingExplosion { tables: Vec<String>, units: usize, limit: usize },
    NoCommonDataSource { tables: Vec<String> },
    InvalidShardingValue { table: String, column: String, value: String },
    NoShardingTarget { table: String, column: String, value: String },
    InsertRoutesToMultipleNodes { table: String },
    ParameterOutOfRange { index: usize },
    NoDefaultDataSource { table: String },
}

impl Display for RoutingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoutingError::RuleNotFound { table } => write!(f, "no sharding rule or metadata for table '{table}'"),
            RoutingError::RoutingExplosion { tables, units, limit } => write!(
                f,
                "routing [{}] produces {units} units, more than the allowed {limit}",
                tables.join(", ")
            ),
            RoutingError::NoCommonDataSource { tables } => {
                write!(f, "tables [{}] share no data source", tables.join(", "))
            }
            RoutingError::InvalidShardingValue { table, column, value } => {
                write!(f, "value {value} of '{table}.{column}' cannot be sharded")
            }
            RoutingError::NoShardingTarget { table, column, value } => {
                write!(f, "no actual target of '{table}' matches {column} = {value}")
            }
            RoutingError::InsertRoutesToMultipleNodes { table } => {
                write!(f, "an INSERT row of '{table}' routes to more than one data node")
            }
            RoutingError::ParameterOutOfRange { index } => write!(f, "parameter {index} is not bound"),
            RoutingError::NoDefaultDataSource { table } => {
                write!(f, "table '{table}' is not sharded and no default data source is configured")
            }
        }
    }
}

impl std::error::Error for RoutingError {}
