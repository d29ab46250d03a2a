use crate::{
    merge::{
        AggregationColumn, MergeError, MergedResult, OrderByStreamMergedResult, QueryResult, SortKey, compare_keys,
        current_row,
    },
    statement::SqlValue,
};

/// Groups rows of shard streams already sorted on the group key, emitting
/// one aggregated row per group without buffering more than that group.
pub struct GroupByStreamMergedResult {
    stream: OrderByStreamMergedResult,
    group_keys: Vec<SortKey>,
    aggregations: Vec<AggregationColumn>,
    /// The stream is on the first row of the next group.
    has_pending: bool,
    row: Option<Vec<SqlValue>>,
}

impl GroupByStreamMergedResult {
    pub fn new(
        results: Vec<Box<dyn QueryResult>>,
        group_keys: Vec<SortKey>,
        aggregations: Vec<AggregationColumn>,
    ) -> Result<Self, MergeError> {
        let mut stream = OrderByStreamMergedResult::new(results, group_keys.clone())?;
        let has_pending = stream.next()?;
        Ok(Self { stream, group_keys, aggregations, has_pending, row: None })
    }

    fn group_values(&self) -> Result<Vec<SqlValue>, MergeError> {
        self.group_keys.iter().map(|key| self.stream.value(key.index)).collect()
    }
}

impl MergedResult for GroupByStreamMergedResult {
    fn next(&mut self) -> Result<bool, MergeError> {
        if !self.has_pending {
            self.row = None;
            return Ok(false);
        }
        let group = self.group_values()?;
        let mut row = current_row(self.stream.current().ok_or(MergeError::NoCurrentRow)?)?;
        let mut units: Vec<_> = self.aggregations.iter().map(AggregationColumn::unit).collect();
        loop {
            for (column, unit) in self.aggregations.iter().zip(units.iter_mut()) {
                let values = column.inputs.iter().map(|i| self.stream.value(*i)).collect::<Result<Vec<_>, _>>()?;
                unit.merge(&values)
                    .map_err(|message| MergeError::Aggregation { column: column.label.clone(), message })?;
            }
            self.has_pending = self.stream.next()?;
            if !self.has_pending || compare_keys(&self.group_values()?, &group, &self.group_keys).is_ne() {
                break;
            }
        }
        for (column, unit) in self.aggregations.iter().zip(&units) {
            if let Some(slot) = column.index.checked_sub(1).and_then(|i| row.get_mut(i)) {
                *slot = unit.result();
            }
        }
        self.row = Some(row);
        Ok(true)
    }

    fn value(&self, column_index: usize) -> Result<SqlValue, MergeError> {
        let row = self.row.as_ref().ok_or(MergeError::NoCurrentRow)?;
        row.get(column_index.wrapping_sub(1))
            .cloned()
            .ok_or(MergeError::ColumnIndexOutOfRange { index: column_index, column_count: row.len() })
    }
}
