pub mod statement;

pub mod metadata;

pub mod config;

pub mod binder;

pub mod route;

pub mod rewrite;

pub mod merge;

pub mod executor;

pub mod kernel;
pub use kernel::{MergedQueryResult, ShardingError, ShardingKernel, ShardingRuntime, UpdateResult};

#[cfg(test)]
mod _fixtures;
