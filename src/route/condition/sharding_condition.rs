use std::{cmp::Ordering, ops::Bound};

use crate::statement::SqlValue;

/// Interval of sharding values; `Unbounded` on a side that the predicate
/// leaves open.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueRange {
    pub lower: Bound<SqlValue>,
    pub upper: Bound<SqlValue>,
}

impl ValueRange {
    pub fn new(lower: Bound<SqlValue>, upper: Bound<SqlValue>) -> Self {
        Self { lower, upper }
    }

    pub fn closed(low: SqlValue, high: SqlValue) -> Self {
        Self::new(Bound::Included(low), Bound::Included(high))
    }

    pub fn contains(&self, value: &SqlValue) -> bool {
        let above = match &self.lower {
            Bound::Included(low) => value.compare(low) != Ordering::Less,
            Bound::Excluded(low) => value.compare(low) == Ordering::Greater,
            Bound::Unbounded => true,
        };
        let below = match &self.upper {
            Bound::Included(high) => value.compare(high) != Ordering::Greater,
            Bound::Excluded(high) => value.compare(high) == Ordering::Less,
            Bound::Unbounded => true,
        };
        above && below
    }

    pub fn is_empty(&self) -> bool {
        match (&self.lower, &self.upper) {
            (Bound::Included(low), Bound::Included(high)) => low.compare(high) == Ordering::Greater,
            (Bound::Included(low) | Bound::Excluded(low), Bound::Included(high) | Bound::Excluded(high)) => {
                low.compare(high) != Ordering::Less
            }
            _ => false,
        }
    }

    /// Integer endpoints of the range as an inclusive pair, when both sides
    /// are bounded integers.
    pub fn integer_bounds(&self) -> Option<(i64, i64)> {
        let low = match &self.lower {
            Bound::Included(v) => v.as_i64()?,
            Bound::Excluded(v) => v.as_i64()?.checked_add(1)?,
            Bound::Unbounded => return None,
        };
        let high = match &self.upper {
            Bound::Included(v) => v.as_i64()?,
            Bound::Excluded(v) => v.as_i64()?.checked_sub(1)?,
            Bound::Unbounded => return None,
        };
        Some((low, high))
    }

    fn intersect(&self, other: &ValueRange) -> ValueRange {
        ValueRange::new(
            tighter(&self.lower, &other.lower, Ordering::Greater),
            tighter(&self.upper, &other.upper, Ordering::Less),
        )
    }
}

/// Picks the bound that is further in `direction` (`Greater` for lower bounds).
fn tighter(a: &Bound<SqlValue>, b: &Bound<SqlValue>, direction: Ordering) -> Bound<SqlValue> {
    let value = |bound: &Bound<SqlValue>| match bound {
        Bound::Included(v) | Bound::Excluded(v) => Some(v.clone()),
        Bound::Unbounded => None,
    };
    match (value(a), value(b)) {
        (None, _) => b.clone(),
        (_, None) => a.clone(),
        (Some(x), Some(y)) => match x.compare(&y) {
            Ordering::Equal if matches!(a, Bound::Excluded(_)) => a.clone(),
            Ordering::Equal => b.clone(),
            ordering if ordering == direction => a.clone(),
            _ => b.clone(),
        },
    }
}

/// Values a predicate allows for one sharding column.
#[derive(Debug, Clone, PartialEq)]
pub enum ShardingValues {
    List(Vec<SqlValue>),
    Range(ValueRange),
}

impl ShardingValues {
    pub fn intersect(&self, other: &ShardingValues) -> ShardingValues {
        match (self, other) {
            (ShardingValues::List(a), ShardingValues::List(b)) => ShardingValues::List(
                a.iter()
                    .filter(|x| b.iter().any(|y| x.compare(y) == Ordering::Equal))
                    .cloned()
                    .collect(),
            ),
            (ShardingValues::List(list), ShardingValues::Range(range))
            | (ShardingValues::Range(range), ShardingValues::List(list)) => {
                ShardingValues::List(list.iter().filter(|v| range.contains(v)).cloned().collect())
            }
            (ShardingValues::Range(a), ShardingValues::Range(b)) => ShardingValues::Range(a.intersect(b)),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ShardingValues::List(values) => values.is_empty(),
            ShardingValues::Range(range) => range.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShardingConditionValue {
    pub table: String,
    pub column: String,
    pub values: ShardingValues,
}

impl ShardingConditionValue {
    pub fn new(table: impl Into<String>, column: impl Into<String>, values: ShardingValues) -> Self {
        Self { table: table.into(), column: column.into(), values }
    }
}

/// One AND group of sharding values; conditions of a statement are OR-ed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShardingCondition {
    pub values: Vec<ShardingConditionValue>,
    /// VALUES row this condition was built from, for INSERT.
    pub row_index: Option<usize>,
}

impl ShardingCondition {
    pub fn values_for_table<'a>(&'a self, tables: &'a [String]) -> impl Iterator<Item = &'a ShardingConditionValue> {
        self.values.iter().filter(|v| tables.iter().any(|t| t.eq_ignore_ascii_case(&v.table)))
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShardingConditions {
    pub conditions: Vec<ShardingCondition>,
    /// Every branch of the WHERE clause contradicts itself.
    pub always_false: bool,
}

impl ShardingConditions {
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn mentions_table(&self, table: &str) -> bool {
        self.conditions
            .iter()
            .flat_map(|c| c.values.iter())
            .any(|v| v.table.eq_ignore_ascii_case(table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(v: i64) -> SqlValue {
        SqlValue::Int(v)
    }

    #[test]
    fn list_intersection_keeps_common_values() {
        let a = ShardingValues::List(vec![int(1), int(2), int(3)]);
        let b = ShardingValues::List(vec![int(3), int(4)]);
        assert_eq!(a.intersect(&b), ShardingValues::List(vec![int(3)]));
        assert!(ShardingValues::List(vec![int(1)]).intersect(&b).is_empty());
    }

    #[test]
    fn range_intersection_tightens_bounds() {
        let a = ShardingValues::Range(ValueRange::new(Bound::Excluded(int(1)), Bound::Unbounded));
        let b = ShardingValues::Range(ValueRange::closed(int(1), int(10)));
        let ShardingValues::Range(range) = a.intersect(&b) else { panic!("expected range") };
        assert_eq!(range.lower, Bound::Excluded(int(1)));
        assert_eq!(range.upper, Bound::Included(int(10)));
        assert_eq!(range.integer_bounds(), Some((2, 10)));
    }

    #[test]
    fn contradictory_ranges_are_empty() {
        let low = ShardingValues::Range(ValueRange::new(Bound::Excluded(int(5)), Bound::Unbounded));
        let high = ShardingValues::Range(ValueRange::new(Bound::Unbounded, Bound::Included(int(5))));
        assert!(low.intersect(&high).is_empty());
    }

    #[test]
    fn list_filtered_by_range() {
        let list = ShardingValues::List(vec![int(1), int(7), int(12)]);
        let range = ShardingValues::Range(ValueRange::closed(int(5), int(10)));
        assert_eq!(list.intersect(&range), ShardingValues::List(vec![int(7)]));
    }
}
