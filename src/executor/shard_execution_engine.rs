use std::sync::Arc;

use tokio::{
    runtime::{Builder, Runtime},
    sync::{Semaphore, mpsc},
    task::JoinSet,
};
use tracing::debug;

use crate::{
    config::ConfigurationProps,
    executor::{ExecutionError, ExecutionUnit, ShardExecutor, ShardMessage, StreamQueryResult},
    merge::QueryResult,
    statement::SqlValue,
};

/// How shard connections are held while a query is merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// One connection per unit, rows stream to the merger as they arrive.
    MemoryStrictly,
    /// More units than connections: each worker buffers its rows and gives
    /// its connection back before handing them over.
    ConnectionStrictly,
}

impl ConnectionMode {
    pub fn choose(unit_count: usize, max_connections: usize) -> ConnectionMode {
        if unit_count <= max_connections { ConnectionMode::MemoryStrictly } else { ConnectionMode::ConnectionStrictly }
    }
}

/// Runs execution units in parallel on blocking workers, at most
/// `max_connections_size_per_query` at a time.
pub struct ShardExecutionEngine {
    runtime: Runtime,
    executor: Arc<dyn ShardExecutor>,
    max_connections: usize,
    buffer_rows: usize,
}

impl ShardExecutionEngine {
    pub fn new(executor: Arc<dyn ShardExecutor>, props: &ConfigurationProps) -> Result<Self, ExecutionError> {
        let max_connections = props.max_connections_size_per_query.max(1);
        let runtime = Builder::new_multi_thread()
            .worker_threads(2)
            .max_blocking_threads(max_connections)
            .thread_name("shard-worker")
            .build()
            .map_err(|e| ExecutionError::Runtime { message: e.to_string() })?;
        Ok(Self { runtime, executor, max_connections, buffer_rows: props.stream_buffer_rows.max(1) })
    }

    /// Starts every query and returns one streamed result per unit, in unit order.
    pub fn execute_query(&self, units: Vec<ExecutionUnit>) -> Vec<Box<dyn QueryResult>> {
        let mode = ConnectionMode::choose(units.len(), self.max_connections);
        debug!(units = units.len(), ?mode, "executing shard queries");
        let semaphore = Arc::new(Semaphore::new(self.max_connections));
        let mut results: Vec<Box<dyn QueryResult>> = Vec::with_capacity(units.len());
        for unit in units {
            let (sender, receiver) = mpsc::channel(self.buffer_rows);
            results.push(Box::new(StreamQueryResult::new(&unit.data_source, receiver)));
            let executor = Arc::clone(&self.executor);
            let semaphore = Arc::clone(&semaphore);
            self.runtime.spawn(async move {
                let Ok(permit) = semaphore.acquire_owned().await else { return };
                if sender.is_closed() {
                    return;
                }
                let worker_sender = sender.clone();
                let worker = tokio::task::spawn_blocking(move || run_query(executor.as_ref(), &unit, &worker_sender, mode));
                let buffered = worker.await;
                drop(permit);
                // the connection is released before buffered rows are handed over
                match buffered {
                    Ok(Some(rows)) => {
                        for row in rows {
                            let message = row.map_or_else(ShardMessage::Error, ShardMessage::Row);
                            let failed = matches!(message, ShardMessage::Error(_));
                            if sender.send(message).await.is_err() || failed {
                                return;
                            }
                        }
                    }
                    Ok(None) => {}
                    Err(join_error) => {
                        let _ = sender.send(ShardMessage::Error(join_error.to_string())).await;
                    }
                }
            });
        }
        results
    }

    /// Runs every write and returns the affected rows per unit, in unit order.
    /// The first failing unit fails the whole statement.
    pub fn execute_update(&self, units: Vec<ExecutionUnit>) -> Result<Vec<u64>, ExecutionError> {
        debug!(units = units.len(), "executing shard updates");
        let semaphore = Arc::new(Semaphore::new(self.max_connections));
        let executor = Arc::clone(&self.executor);
        self.runtime.block_on(async move {
            let mut tasks = JoinSet::new();
            for (position, unit) in units.into_iter().enumerate() {
                let executor = Arc::clone(&executor);
                let semaphore = Arc::clone(&semaphore);
                tasks.spawn(async move {
                    let _permit = semaphore.acquire_owned().await;
                    let data_source = unit.data_source.clone();
                    let outcome = tokio::task::spawn_blocking(move || executor.update(&unit))
                        .await
                        .map_err(|e| e.to_string())
                        .and_then(|updated| updated);
                    (position, outcome.map_err(|message| ExecutionError::Shard { data_source, message }))
                });
            }
            let mut counts = vec![0; tasks.len()];
            while let Some(joined) = tasks.join_next().await {
                let (position, outcome) =
                    joined.map_err(|e| ExecutionError::Shard { data_source: String::new(), message: e.to_string() })?;
                counts[position] = outcome?;
            }
            Ok(counts)
        })
    }
}

/// Streams the rows of `unit` in [`ConnectionMode::MemoryStrictly`]; in
/// [`ConnectionMode::ConnectionStrictly`] reads them all and returns them
/// for the caller to send once the connection is given back.
fn run_query(
    executor: &dyn ShardExecutor,
    unit: &ExecutionUnit,
    sender: &mpsc::Sender<ShardMessage>,
    mode: ConnectionMode,
) -> Option<Vec<Result<Vec<SqlValue>, String>>> {
    let shard_rows = match executor.query(unit) {
        Ok(rows) => rows,
        Err(message) => {
            let _ = sender.blocking_send(ShardMessage::Error(message));
            return None;
        }
    };
    if sender.blocking_send(ShardMessage::Columns(shard_rows.column_count)).is_err() {
        return None;
    }
    match mode {
        ConnectionMode::MemoryStrictly => {
            for row in shard_rows.rows {
                let message = row.map_or_else(ShardMessage::Error, ShardMessage::Row);
                let failed = matches!(message, ShardMessage::Error(_));
                // a closed channel means the merged result was dropped
                if sender.blocking_send(message).is_err() || failed {
                    break;
                }
            }
            None
        }
        ConnectionMode::ConnectionStrictly => Some(shard_rows.rows.collect()),
    }
}
