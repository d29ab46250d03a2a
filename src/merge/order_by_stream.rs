use std::{cmp::Ordering, collections::BinaryHeap, sync::Arc};

use crate::{
    merge::{MergeError, MergedResult, QueryResult, SortKey, compare_keys},
    statement::SqlValue,
};

/// A shard result with the sort key values of its current row.
pub struct OrderByValue {
    result: Box<dyn QueryResult>,
    /// Position of the shard in route unit order, breaks ties.
    shard: usize,
    keys: Arc<[SortKey]>,
    values: Vec<SqlValue>,
}

impl OrderByValue {
    pub fn new(result: Box<dyn QueryResult>, shard: usize, keys: Arc<[SortKey]>) -> Self {
        Self { result, shard, keys, values: Vec::new() }
    }

    /// Advances the underlying result and caches the new key values.
    pub fn next(&mut self) -> Result<bool, MergeError> {
        if !self.result.next()? {
            self.values.clear();
            return Ok(false);
        }
        self.values = self.keys.iter().map(|key| self.result.value(key.index)).collect::<Result<_, _>>()?;
        Ok(true)
    }

    pub fn result(&self) -> &dyn QueryResult {
        self.result.as_ref()
    }

    fn rank(&self, other: &Self) -> Ordering {
        compare_keys(&self.values, &other.values, &self.keys).then(self.shard.cmp(&other.shard))
    }
}

impl PartialEq for OrderByValue {
    fn eq(&self, other: &Self) -> bool {
        self.rank(other).is_eq()
    }
}

impl Eq for OrderByValue {}

impl PartialOrd for OrderByValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderByValue {
    // BinaryHeap pops the largest, the smallest row must come out first.
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank(other).reverse()
    }
}

/// Sorted shard streams merged by repeatedly taking the smallest current row.
/// Only one row per shard is buffered.
pub struct OrderByStreamMergedResult {
    queue: BinaryHeap<OrderByValue>,
    first_next: bool,
}

impl OrderByStreamMergedResult {
    pub fn new(results: Vec<Box<dyn QueryResult>>, keys: Vec<SortKey>) -> Result<Self, MergeError> {
        let keys: Arc<[SortKey]> = keys.into();
        let mut queue = BinaryHeap::with_capacity(results.len());
        for (shard, result) in results.into_iter().enumerate() {
            let mut value = OrderByValue::new(result, shard, Arc::clone(&keys));
            if value.next()? {
                queue.push(value);
            }
        }
        Ok(Self { queue, first_next: true })
    }

    /// Result holding the current row.
    pub fn current(&self) -> Option<&dyn QueryResult> {
        self.queue.peek().map(OrderByValue::result)
    }
}

impl MergedResult for OrderByStreamMergedResult {
    fn next(&mut self) -> Result<bool, MergeError> {
        if self.first_next {
            self.first_next = false;
            return Ok(!self.queue.is_empty());
        }
        let Some(mut smallest) = self.queue.pop() else {
            return Ok(false);
        };
        if smallest.next()? {
            self.queue.push(smallest);
        }
        Ok(!self.queue.is_empty())
    }

    fn value(&self, column_index: usize) -> Result<SqlValue, MergeError> {
        if self.first_next {
            return Err(MergeError::NoCurrentRow);
        }
        self.current().ok_or(MergeError::NoCurrentRow)?.value(column_index)
    }
}
