use std::cmp::Ordering;

use crate::{
    binder::OrderByItem,
    statement::{NullsOrder, OrderDirection, SqlValue},
};

/// Output column a merged stream is sorted or grouped on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    /// 1-based column index.
    pub index: usize,
    pub direction: OrderDirection,
    pub nulls: NullsOrder,
}

impl SortKey {
    pub fn from_items(items: &[OrderByItem]) -> Vec<SortKey> {
        items
            .iter()
            .filter(|item| item.index > 0)
            .map(|item| SortKey { index: item.index, direction: item.direction(), nulls: item.nulls() })
            .collect()
    }
}

/// NULL placement follows `key.nulls` regardless of direction.
pub fn compare_values(a: &SqlValue, b: &SqlValue, key: &SortKey) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => match key.nulls {
            NullsOrder::First => Ordering::Less,
            NullsOrder::Last => Ordering::Greater,
        },
        (false, true) => match key.nulls {
            NullsOrder::First => Ordering::Greater,
            NullsOrder::Last => Ordering::Less,
        },
        (false, false) => {
            let ordering = a.compare(b);
            match key.direction {
                OrderDirection::Asc => ordering,
                OrderDirection::Desc => ordering.reverse(),
            }
        }
    }
}

/// `a` and `b` hold the values of `keys`, in the same order.
pub fn compare_keys(a: &[SqlValue], b: &[SqlValue], keys: &[SortKey]) -> Ordering {
    a.iter()
        .zip(b)
        .zip(keys)
        .map(|((a, b), key)| compare_values(a, b, key))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(direction: OrderDirection) -> SortKey {
        SortKey { index: 1, direction, nulls: NullsOrder::default_for(direction) }
    }

    #[test]
    fn nulls_are_smallest_by_default() {
        let asc = key(OrderDirection::Asc);
        let desc = key(OrderDirection::Desc);
        assert_eq!(compare_values(&SqlValue::Null, &SqlValue::Int(1), &asc), Ordering::Less);
        assert_eq!(compare_values(&SqlValue::Null, &SqlValue::Int(1), &desc), Ordering::Greater);
        assert_eq!(compare_values(&SqlValue::Null, &SqlValue::Null, &desc), Ordering::Equal);
    }

    #[test]
    fn explicit_nulls_order_wins() {
        let asc_last = SortKey { index: 1, direction: OrderDirection::Asc, nulls: NullsOrder::Last };
        assert_eq!(compare_values(&SqlValue::Null, &SqlValue::Int(1), &asc_last), Ordering::Greater);
    }

    #[test]
    fn numbers_compare_across_kinds_and_directions() {
        let asc = key(OrderDirection::Asc);
        assert_eq!(compare_values(&SqlValue::Int(2), &SqlValue::float(1.5), &asc), Ordering::Greater);
        assert_eq!(compare_values(&SqlValue::Int(2), &SqlValue::float(1.5), &key(OrderDirection::Desc)), Ordering::Less);
    }

    #[test]
    fn later_keys_break_ties() {
        let keys = [key(OrderDirection::Asc), SortKey { index: 2, ..key(OrderDirection::Desc) }];
        let a = [SqlValue::Int(1), SqlValue::text("b")];
        let b = [SqlValue::Int(1), SqlValue::text("a")];
        assert_eq!(compare_keys(&a, &b, &keys), Ordering::Less);
    }
}
