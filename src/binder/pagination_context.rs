use crate::{
    binder::BindingError,
    statement::{PaginationSegment, PaginationValueSegment, SqlValue},
};

/// Row count sent to every shard when rows are merged in memory.
pub const MAX_ROW_COUNT: u64 = i32::MAX as u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationKind {
    /// `LIMIT offset, row_count`
    Limit,
    /// `ROWNUM > offset AND ROWNUM <= row_count` style bounds
    RowNumber,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PaginationContext {
    pub kind: Option<PaginationKind>,
    pub offset_segment: Option<PaginationValueSegment>,
    pub row_count_segment: Option<PaginationValueSegment>,
    offset_inclusive: bool,
    row_count_inclusive: bool,
    /// Value written in the offset position.
    pub actual_offset: u64,
    /// Value written in the row count position.
    pub actual_row_count: Option<u64>,
}

impl PaginationContext {
    pub fn new(segment: Option<&PaginationSegment>, params: &[SqlValue]) -> Result<Self, BindingError> {
        let Some(segment) = segment else {
            return Ok(Self::default());
        };
        let (kind, offset, row_count, offset_inclusive, row_count_inclusive) = match segment {
            PaginationSegment::Limit(limit) => {
                (PaginationKind::Limit, limit.offset.clone(), limit.row_count.clone(), false, true)
            }
            PaginationSegment::RowNumber(bounds) => (
                PaginationKind::RowNumber,
                bounds.offset.as_ref().map(|b| b.value.clone()),
                bounds.row_count.as_ref().map(|b| b.value.clone()),
                bounds.offset.as_ref().is_some_and(|b| b.inclusive),
                bounds.row_count.as_ref().is_none_or(|b| b.inclusive),
            ),
        };
        let actual_offset = match &offset {
            Some(value) => Self::resolve(value, params)?,
            None => 0,
        };
        let actual_row_count = match &row_count {
            Some(value) => Some(Self::resolve(value, params)?),
            None => None,
        };
        Ok(Self {
            kind: Some(kind),
            offset_segment: offset,
            row_count_segment: row_count,
            offset_inclusive,
            row_count_inclusive,
            actual_offset,
            actual_row_count,
        })
    }

    fn resolve(segment: &PaginationValueSegment, params: &[SqlValue]) -> Result<u64, BindingError> {
        match segment {
            PaginationValueSegment::Literal { value, .. } => Ok(*value),
            PaginationValueSegment::Parameter { index, .. } => params
                .get(*index)
                .and_then(SqlValue::as_i64)
                .and_then(|v| u64::try_from(v).ok())
                .ok_or(BindingError::PaginationParameter { index: *index }),
        }
    }

    pub fn has_pagination(&self) -> bool {
        self.kind.is_some()
    }

    /// Rows of the merged stream to discard.
    pub fn skip_rows(&self) -> u64 {
        match self.kind {
            Some(PaginationKind::RowNumber) if self.offset_inclusive => self.actual_offset.saturating_sub(1),
            _ => self.actual_offset,
        }
    }

    /// Rows of the merged stream to return after skipping, unbounded when `None`.
    pub fn fetch_rows(&self) -> Option<u64> {
        match self.kind {
            Some(PaginationKind::RowNumber) => {
                let last = self.actual_row_count.map(|bound| {
                    if self.row_count_inclusive { bound } else { bound.saturating_sub(1) }
                })?;
                Some(last.saturating_sub(self.skip_rows()))
            }
            _ => self.actual_row_count,
        }
    }

    /// Offset each shard gets when several shards are queried.
    pub fn revised_offset(&self) -> u64 {
        0
    }

    /// Row count each shard gets when several shards are queried.
    pub fn revised_row_count(&self, merged_in_memory: bool) -> Option<u64> {
        let row_count = self.actual_row_count?;
        if merged_in_memory {
            return Some(MAX_ROW_COUNT);
        }
        match self.kind {
            Some(PaginationKind::Limit) => Some(self.actual_offset.saturating_add(row_count)),
            _ => Some(row_count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::{LimitSegment, RowNumberBound, RowNumberSegment};

    fn literal(value: u64) -> PaginationValueSegment {
        PaginationValueSegment::Literal { start: 0, stop: 0, value }
    }

    #[test]
    fn limit_with_offset_is_revised_to_prefix() {
        let segment = PaginationSegment::Limit(LimitSegment { start: 0, stop: 10, offset: Some(literal(2)), row_count: Some(literal(2)) });
        let context = PaginationContext::new(Some(&segment), &[]).expect("literal pagination");
        assert_eq!(context.skip_rows(), 2);
        assert_eq!(context.fetch_rows(), Some(2));
        assert_eq!(context.revised_offset(), 0);
        assert_eq!(context.revised_row_count(false), Some(4));
        assert_eq!(context.revised_row_count(true), Some(MAX_ROW_COUNT));
    }

    #[test]
    fn parameters_are_resolved() {
        let segment = PaginationSegment::Limit(LimitSegment {
            start: 0,
            stop: 10,
            offset: Some(PaginationValueSegment::Parameter { start: 0, stop: 0, index: 1 }),
            row_count: Some(PaginationValueSegment::Parameter { start: 0, stop: 0, index: 2 }),
        });
        let params = vec![SqlValue::Int(9), SqlValue::Int(5), SqlValue::Int(10)];
        let context = PaginationContext::new(Some(&segment), &params).expect("parameter pagination");
        assert_eq!((context.actual_offset, context.actual_row_count), (5, Some(10)));

        let negative = vec![SqlValue::Int(9), SqlValue::Int(-1), SqlValue::Int(10)];
        assert_eq!(
            PaginationContext::new(Some(&segment), &negative),
            Err(BindingError::PaginationParameter { index: 1 })
        );
    }

    #[test]
    fn row_number_bounds_become_offset_and_count() {
        // ROWNUM > 2 AND ROWNUM <= 4
        let exclusive = PaginationSegment::RowNumber(RowNumberSegment {
            offset: Some(RowNumberBound { value: literal(2), inclusive: false }),
            row_count: Some(RowNumberBound { value: literal(4), inclusive: true }),
        });
        let context = PaginationContext::new(Some(&exclusive), &[]).expect("row number");
        assert_eq!((context.skip_rows(), context.fetch_rows()), (2, Some(2)));
        assert_eq!(context.revised_row_count(false), Some(4));

        // ROWNUM >= 3 AND ROWNUM < 5
        let inclusive = PaginationSegment::RowNumber(RowNumberSegment {
            offset: Some(RowNumberBound { value: literal(3), inclusive: true }),
            row_count: Some(RowNumberBound { value: literal(5), inclusive: false }),
        });
        let context = PaginationContext::new(Some(&inclusive), &[]).expect("row number");
        assert_eq!((context.skip_rows(), context.fetch_rows()), (2, Some(2)));
    }

    #[test]
    fn absent_pagination() {
        let context = PaginationContext::new(None, &[]).expect("no pagination");
        assert!(!context.has_pagination());
        assert_eq!(context.fetch_rows(), None);
    }
}
