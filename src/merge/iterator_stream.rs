use crate::{
    merge::{MergeError, MergedResult, QueryResult},
    statement::SqlValue,
};

/// Shard results one after another, in route unit order.
pub struct IteratorStreamMergedResult {
    results: Vec<Box<dyn QueryResult>>,
    current: usize,
}

impl IteratorStreamMergedResult {
    pub fn new(results: Vec<Box<dyn QueryResult>>) -> Self {
        Self { results, current: 0 }
    }
}

impl MergedResult for IteratorStreamMergedResult {
    fn next(&mut self) -> Result<bool, MergeError> {
        while let Some(result) = self.results.get_mut(self.current) {
            if result.next()? {
                return Ok(true);
            }
            self.current += 1;
        }
        Ok(false)
    }

    fn value(&self, column_index: usize) -> Result<SqlValue, MergeError> {
        self.results.get(self.current).ok_or(MergeError::NoCurrentRow)?.value(column_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::{MemoryQueryResult, collect_rows};

    #[test]
    fn concatenates_shards_in_order_and_skips_empty_ones() {
        let results: Vec<Box<dyn QueryResult>> = vec![
            Box::new(MemoryQueryResult::from_ints(&[&[1], &[2]])),
            Box::new(MemoryQueryResult::new(1, vec![])),
            Box::new(MemoryQueryResult::from_ints(&[&[3]])),
        ];
        let mut merged = IteratorStreamMergedResult::new(results);
        let rows = collect_rows(&mut merged, 1).unwrap();
        assert_eq!(rows, vec![vec![SqlValue::Int(1)], vec![SqlValue::Int(2)], vec![SqlValue::Int(3)]]);
        assert_eq!(merged.value(1), Err(MergeError::NoCurrentRow));
    }
}
