use tracing::debug;

use crate::{
    binder::{PaginationContext, PaginationKind},
    merge::{MergeError, MergedResult},
    statement::SqlValue,
};

/// Discards the first `offset` rows of the merged stream.
pub struct OffsetMergedResult {
    inner: Box<dyn MergedResult>,
    offset: u64,
    skipped: bool,
}

impl OffsetMergedResult {
    pub fn new(inner: Box<dyn MergedResult>, offset: u64) -> Self {
        Self { inner, offset, skipped: offset == 0 }
    }
}

impl MergedResult for OffsetMergedResult {
    fn next(&mut self) -> Result<bool, MergeError> {
        if !self.skipped {
            self.skipped = true;
            for _ in 0..self.offset {
                if !self.inner.next()? {
                    return Ok(false);
                }
            }
        }
        self.inner.next()
    }

    fn value(&self, column_index: usize) -> Result<SqlValue, MergeError> {
        self.inner.value(column_index)
    }
}

/// Ends the merged stream after `row_count` rows without pulling more.
pub struct RowCountMergedResult {
    inner: Box<dyn MergedResult>,
    row_count: u64,
    returned: u64,
}

impl RowCountMergedResult {
    pub fn new(inner: Box<dyn MergedResult>, row_count: u64) -> Self {
        Self { inner, row_count, returned: 0 }
    }
}

impl MergedResult for RowCountMergedResult {
    fn next(&mut self) -> Result<bool, MergeError> {
        if self.returned >= self.row_count {
            return Ok(false);
        }
        let has_next = self.inner.next()?;
        if has_next {
            self.returned += 1;
        }
        Ok(has_next)
    }

    fn value(&self, column_index: usize) -> Result<SqlValue, MergeError> {
        self.inner.value(column_index)
    }
}

/// ROWNUM style bounds, applied as the equivalent offset and row count.
pub struct RowNumberMergedResult {
    inner: RowCountMergedResult,
}

impl RowNumberMergedResult {
    pub fn new(inner: Box<dyn MergedResult>, pagination: &PaginationContext) -> Self {
        let skipped: Box<dyn MergedResult> = Box::new(OffsetMergedResult::new(inner, pagination.skip_rows()));
        let row_count = pagination.fetch_rows().unwrap_or(u64::MAX);
        Self { inner: RowCountMergedResult::new(skipped, row_count) }
    }
}

impl MergedResult for RowNumberMergedResult {
    fn next(&mut self) -> Result<bool, MergeError> {
        self.inner.next()
    }

    fn value(&self, column_index: usize) -> Result<SqlValue, MergeError> {
        self.inner.value(column_index)
    }
}

/// Wraps `merged` with the decorators the statement's pagination asks for.
pub fn decorate_pagination(merged: Box<dyn MergedResult>, pagination: &PaginationContext) -> Box<dyn MergedResult> {
    match pagination.kind {
        None => merged,
        Some(PaginationKind::RowNumber) => {
            debug!(offset = pagination.skip_rows(), row_count = ?pagination.fetch_rows(), "row number pagination");
            Box::new(RowNumberMergedResult::new(merged, pagination))
        }
        Some(PaginationKind::Limit) => {
            debug!(offset = pagination.skip_rows(), row_count = ?pagination.fetch_rows(), "limit pagination");
            let mut result = merged;
            if pagination.skip_rows() > 0 {
                result = Box::new(OffsetMergedResult::new(result, pagination.skip_rows()));
            }
            if let Some(row_count) = pagination.fetch_rows() {
                result = Box::new(RowCountMergedResult::new(result, row_count));
            }
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        merge::{MemoryQueryResult, OrderByStreamMergedResult, QueryResult, SortKey, collect_rows},
        statement::{LimitSegment, NullsOrder, OrderDirection, PaginationSegment, PaginationValueSegment, RowNumberBound, RowNumberSegment},
    };

    /// Four shards holding two rows each, keys 0..8 spread round robin.
    fn four_shards() -> Box<dyn MergedResult> {
        let results: Vec<Box<dyn QueryResult>> = (0..4)
            .map(|shard| {
                Box::new(MemoryQueryResult::from_ints(&[&[shard], &[shard + 4]])) as Box<dyn QueryResult>
            })
            .collect();
        let keys = vec![SortKey { index: 1, direction: OrderDirection::Asc, nulls: NullsOrder::First }];
        Box::new(OrderByStreamMergedResult::new(results, keys).unwrap())
    }

    fn literal(value: u64) -> PaginationValueSegment {
        PaginationValueSegment::Literal { start: 0, stop: 0, value }
    }

    fn limit(offset: Option<u64>, row_count: Option<u64>) -> PaginationContext {
        let segment = PaginationSegment::Limit(LimitSegment {
            start: 0,
            stop: 0,
            offset: offset.map(literal),
            row_count: row_count.map(literal),
        });
        PaginationContext::new(Some(&segment), &[]).unwrap()
    }

    fn keys(pagination: &PaginationContext) -> Vec<i64> {
        let mut merged = decorate_pagination(four_shards(), pagination);
        collect_rows(merged.as_mut(), 1).unwrap().iter().map(|row| row[0].as_i64().unwrap()).collect()
    }

    #[test]
    fn limit_zero_yields_nothing() {
        assert!(keys(&limit(None, Some(0))).is_empty());
    }

    #[test]
    fn offset_past_the_end_yields_nothing() {
        assert!(keys(&limit(Some(8), None)).is_empty());
        assert!(keys(&limit(Some(12), Some(3))).is_empty());
    }

    #[test]
    fn limit_with_offset_takes_the_global_window() {
        assert_eq!(keys(&limit(Some(2), Some(2))), vec![2, 3]);
        assert_eq!(keys(&limit(Some(6), Some(5))), vec![6, 7]);
        assert_eq!(keys(&limit(None, None)).len(), 8);
    }

    #[test]
    fn row_number_bounds_behave_like_offset_and_limit() {
        let segment = PaginationSegment::RowNumber(RowNumberSegment {
            offset: Some(RowNumberBound { value: literal(2), inclusive: false }),
            row_count: Some(RowNumberBound { value: literal(4), inclusive: true }),
        });
        let pagination = PaginationContext::new(Some(&segment), &[]).unwrap();
        assert_eq!(keys(&pagination), vec![2, 3]);
    }
}
