use tokio::sync::mpsc::Receiver;

use crate::{
    merge::{MergeError, QueryResult},
    statement::SqlValue,
};

/// What a shard worker sends to the merger.
#[derive(Debug, Clone, PartialEq)]
pub enum ShardMessage {
    Columns(usize),
    Row(Vec<SqlValue>),
    Error(String),
}

/// Shard result fed by a worker over a bounded channel. Reading blocks until
/// the worker produced the next row; dropping it stops the worker.
pub struct StreamQueryResult {
    data_source: String,
    receiver: Receiver<ShardMessage>,
    column_count: usize,
    current: Option<Vec<SqlValue>>,
}

impl StreamQueryResult {
    pub fn new(data_source: &str, receiver: Receiver<ShardMessage>) -> Self {
        Self { data_source: data_source.to_string(), receiver, column_count: 0, current: None }
    }

    pub fn data_source(&self) -> &str {
        &self.data_source
    }
}

impl QueryResult for StreamQueryResult {
    fn next(&mut self) -> Result<bool, MergeError> {
        loop {
            match self.receiver.blocking_recv() {
                Some(ShardMessage::Columns(count)) => self.column_count = count,
                Some(ShardMessage::Row(row)) => {
                    self.current = Some(row);
                    return Ok(true);
                }
                Some(ShardMessage::Error(message)) => {
                    self.current = None;
                    return Err(MergeError::ShardRead { data_source: self.data_source.clone(), message });
                }
                None => {
                    self.current = None;
                    return Ok(false);
                }
            }
        }
    }

    fn value(&self, column_index: usize) -> Result<SqlValue, MergeError> {
        let row = self.current.as_ref().ok_or(MergeError::NoCurrentRow)?;
        if column_index == 0 || column_index > row.len() {
            return Err(MergeError::ColumnIndexOutOfRange { index: column_index, column_count: row.len() });
        }
        Ok(row[column_index - 1].clone())
    }

    fn column_count(&self) -> usize {
        self.current.as_ref().map_or(self.column_count, Vec::len).max(self.column_count)
    }
}
