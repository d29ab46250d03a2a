use indexmap::IndexMap;

use crate::{
    merge::{AggregationColumn, AggregationUnit, MergeError, MergedResult, QueryResult, SortKey, compare_keys, current_row},
    statement::SqlValue,
};

/// Rows grouped in memory when shard streams are not sorted on the group
/// key, or when aggregations and DISTINCT collapse rows across shards.
pub struct GroupByMemoryMergedResult {
    rows: Vec<Vec<SqlValue>>,
    position: Option<usize>,
}

/// How the memory merger groups and orders rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MemoryGrouping {
    /// 1-based columns forming the group key; empty collapses everything
    /// into one group.
    pub group_columns: Vec<usize>,
    pub aggregations: Vec<AggregationColumn>,
    pub order_keys: Vec<SortKey>,
}

impl GroupByMemoryMergedResult {
    pub fn new(results: Vec<Box<dyn QueryResult>>, grouping: &MemoryGrouping) -> Result<Self, MergeError> {
        let mut groups: IndexMap<Vec<SqlValue>, (Vec<SqlValue>, Vec<Box<dyn AggregationUnit>>)> = IndexMap::new();
        for mut result in results {
            while result.next()? {
                let key = grouping.group_columns.iter().map(|i| result.value(*i)).collect::<Result<Vec<_>, _>>()?;
                let (_, units) = match groups.entry(key) {
                    indexmap::map::Entry::Occupied(entry) => entry.into_mut(),
                    indexmap::map::Entry::Vacant(entry) => {
                        let units = grouping.aggregations.iter().map(AggregationColumn::unit).collect();
                        entry.insert((current_row(result.as_ref())?, units))
                    }
                };
                for (column, unit) in grouping.aggregations.iter().zip(units.iter_mut()) {
                    let values = column.inputs.iter().map(|i| result.value(*i)).collect::<Result<Vec<_>, _>>()?;
                    unit.merge(&values)
                        .map_err(|message| MergeError::Aggregation { column: column.label.clone(), message })?;
                }
            }
        }

        let mut rows: Vec<Vec<SqlValue>> = groups
            .into_values()
            .map(|(mut row, units)| {
                for (column, unit) in grouping.aggregations.iter().zip(&units) {
                    if let Some(slot) = column.index.checked_sub(1).and_then(|i| row.get_mut(i)) {
                        *slot = unit.result();
                    }
                }
                row
            })
            .collect();
        if !grouping.order_keys.is_empty() {
            rows.sort_by(|a, b| {
                compare_keys(&key_values(a, &grouping.order_keys), &key_values(b, &grouping.order_keys), &grouping.order_keys)
            });
        }
        Ok(Self { rows, position: None })
    }
}

fn key_values(row: &[SqlValue], keys: &[SortKey]) -> Vec<SqlValue> {
    keys.iter().map(|k| k.index.checked_sub(1).and_then(|i| row.get(i)).cloned().unwrap_or_default()).collect()
}

impl MergedResult for GroupByMemoryMergedResult {
    fn next(&mut self) -> Result<bool, MergeError> {
        let next = self.position.map_or(0, |p| p + 1).min(self.rows.len());
        self.position = Some(next);
        Ok(next < self.rows.len())
    }

    fn value(&self, column_index: usize) -> Result<SqlValue, MergeError> {
        let row = self.position.and_then(|p| self.rows.get(p)).ok_or(MergeError::NoCurrentRow)?;
        row.get(column_index.wrapping_sub(1))
            .cloned()
            .ok_or(MergeError::ColumnIndexOutOfRange { index: column_index, column_count: row.len() })
    }
}
