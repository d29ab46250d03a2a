use std::fmt::Display;

use crate::{
    binder::BindingError, config::ConfigError, executor::ExecutionError, merge::MergeError, rewrite::RewriteError,
    route::RoutingError,
};

/// Any failure between receiving a statement and handing back its result.
#[derive(Debug, Clone, PartialEq)]
pub enum ShardingError {
    Config(ConfigError),
    Binding(BindingError),
    Routing(RoutingError),
    Rewrite(RewriteError),
    Execution(ExecutionError),
    Merge(MergeError),
}

impl Display for ShardingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShardingError::Config(e) => write!(f, "Configuration error: {e}"),
            ShardingError::Binding(e) => write!(f, "Binding error: {e}"),
            ShardingError::Routing(e) => write!(f, "Routing error: {e}"),
            ShardingError::Rewrite(e) => write!(f, "Rewrite error: {e}"),
            ShardingError::Execution(e) => write!(f, "Execution error: {e}"),
            ShardingError::Merge(e) => write!(f, "Merge error: {e}"),
        }
    }
}

impl std::error::Error for ShardingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ShardingError::Config(e) => Some(e),
            ShardingError::Binding(e) => Some(e),
            ShardingError::Routing(e) => Some(e),
            ShardingError::Rewrite(e) => Some(e),
            ShardingError::Execution(e) => Some(e),
            ShardingError::Merge(e) => Some(e),
        }
    }
}

impl From<ConfigError> for ShardingError {
    fn from(e: ConfigError) -> Self {
        ShardingError::Config(e)
    }
}

impl From<BindingError> for ShardingError {
    fn from(e: BindingError) -> Self {
        ShardingError::Binding(e)
    }
}

impl From<RoutingError> for ShardingError {
    fn from(e: RoutingError) -> Self {
        ShardingError::Routing(e)
    }
}

impl From<RewriteError> for ShardingError {
    fn from(e: RewriteError) -> Self {
        ShardingError::Rewrite(e)
    }
}

impl From<ExecutionError> for ShardingError {
    fn from(e: ExecutionError) -> Self {
        ShardingError::Execution(e)
    }
}

impl From<MergeError> for ShardingError {
    fn from(e: MergeError) -> Self {
        ShardingError::Merge(e)
    }
}
