use tracing::debug;

use crate::{
    binder::SelectStatementContext,
    merge::{
        AggregationColumn, GroupByMemoryMergedResult, GroupByStreamMergedResult, IteratorStreamMergedResult,
        MemoryGrouping, MergeError, MergedResult, OrderByStreamMergedResult, QueryResult, SortKey,
        decorate_pagination,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergerKind {
    Iterator,
    OrderByStream,
    GroupByStream,
    GroupByMemory,
}

impl MergerKind {
    pub fn choose(select: &SelectStatementContext, result_count: usize) -> MergerKind {
        if result_count <= 1 {
            MergerKind::Iterator
        } else if select.needs_grouping() {
            if select.needs_memory_merge() { MergerKind::GroupByMemory } else { MergerKind::GroupByStream }
        } else if !select.order_by.is_empty() {
            MergerKind::OrderByStream
        } else {
            MergerKind::Iterator
        }
    }
}

pub struct ResultMergerEngine;

impl ResultMergerEngine {
    /// One logical result from the shard results of a query, in route unit order.
    pub fn merge_query(
        results: Vec<Box<dyn QueryResult>>,
        select: &SelectStatementContext,
    ) -> Result<Box<dyn MergedResult>, MergeError> {
        let kind = MergerKind::choose(select, results.len());
        debug!(merger = ?kind, shards = results.len(), "result merger chosen");
        let merged: Box<dyn MergedResult> = match kind {
            // a lone shard already applied the statement as written
            MergerKind::Iterator if results.len() <= 1 => {
                return Ok(Box::new(IteratorStreamMergedResult::new(results)));
            }
            MergerKind::Iterator => Box::new(IteratorStreamMergedResult::new(results)),
            MergerKind::OrderByStream => {
                Box::new(OrderByStreamMergedResult::new(results, SortKey::from_items(&select.order_by.items))?)
            }
            MergerKind::GroupByStream => Box::new(GroupByStreamMergedResult::new(
                results,
                SortKey::from_items(&select.group_by.items),
                AggregationColumn::from_projections(&select.projections),
            )?),
            MergerKind::GroupByMemory => {
                Box::new(GroupByMemoryMergedResult::new(results, &Self::memory_grouping(select))?)
            }
        };
        Ok(decorate_pagination(merged, &select.pagination))
    }

    fn memory_grouping(select: &SelectStatementContext) -> MemoryGrouping {
        let group_columns = if !select.group_by.is_empty() {
            select.group_by.items.iter().map(|item| item.index).filter(|index| *index > 0).collect()
        } else if select.projections.contains_aggregation() {
            Vec::new()
        } else {
            (1..=select.projections.visible_column_count()).collect()
        };
        MemoryGrouping {
            group_columns,
            aggregations: AggregationColumn::from_projections(&select.projections),
            order_keys: SortKey::from_items(&select.order_by.items),
        }
    }

    /// Affected rows of a write, summed over every unit.
    pub fn merge_update_counts(counts: &[u64]) -> u64 {
        counts.iter().sum()
    }
}
