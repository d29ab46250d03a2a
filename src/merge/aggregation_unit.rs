use indexmap::IndexSet;

use crate::{
    binder::{AggregationProjection, ExpressionProjection, Projection, ProjectionsContext},
    statement::{AggregationType, SqlValue},
};

/// Per-group state of one aggregation column while shard rows are merged.
///
/// The merger:
///   1) reads the shard values the unit needs (one column, or the COUNT and
///      SUM helper columns for AVG)
///   2) calls `merge(&values)` for every shard row of the group
///   3) writes `result()` into the merged row
pub trait AggregationUnit: Send {
    fn merge(&mut self, values: &[SqlValue]) -> Result<(), String>;

    fn result(&self) -> SqlValue;
}

/// Running numeric total, integer until a float shows up.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum Total {
    #[default]
    Empty,
    Int(i128),
    Float(f64),
}

impl Total {
    fn add(&mut self, value: &SqlValue) -> Result<(), String> {
        *self = match (*self, value) {
            (total, SqlValue::Null) => total,
            (Total::Empty, SqlValue::Int(v)) => Total::Int(i128::from(*v)),
            (Total::Int(acc), SqlValue::Int(v)) => Total::Int(acc + i128::from(*v)),
            (Total::Float(acc), SqlValue::Int(v)) => Total::Float(acc + *v as f64),
            (Total::Empty, SqlValue::Float(v)) => Total::Float(v.0),
            (Total::Int(acc), SqlValue::Float(v)) => Total::Float(acc as f64 + v.0),
            (Total::Float(acc), SqlValue::Float(v)) => Total::Float(acc + v.0),
            (total, SqlValue::Text(text)) => match text.trim().parse::<f64>() {
                Ok(v) => {
                    let mut total = total;
                    total.add(&SqlValue::float(v))?;
                    total
                }
                Err(_) => return Err(format!("'{text}' is not numeric")),
            },
            (_, other) => return Err(format!("{other} is not numeric")),
        };
        Ok(())
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Total::Empty => None,
            Total::Int(v) => Some(*v as f64),
            Total::Float(v) => Some(*v),
        }
    }

    fn value(&self) -> SqlValue {
        match self {
            Total::Empty => SqlValue::Null,
            Total::Int(v) => i64::try_from(*v).map(SqlValue::Int).unwrap_or_else(|_| SqlValue::float(*v as f64)),
            Total::Float(v) => SqlValue::float(*v),
        }
    }
}

/// MAX / MIN.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparableAggregationUnit {
    max: bool,
    value: Option<SqlValue>,
}

impl AggregationUnit for ComparableAggregationUnit {
    fn merge(&mut self, values: &[SqlValue]) -> Result<(), String> {
        let Some(value) = values.first().filter(|v| !v.is_null()) else { return Ok(()) };
        let replace = match &self.value {
            None => true,
            Some(current) => {
                let ordering = value.compare(current);
                if self.max { ordering.is_gt() } else { ordering.is_lt() }
            }
        };
        if replace {
            self.value = Some(value.clone());
        }
        Ok(())
    }

    fn result(&self) -> SqlValue {
        self.value.clone().unwrap_or_default()
    }
}

/// COUNT / SUM, both add up what the shards returned.
#[derive(Debug, Clone, PartialEq)]
pub struct AccumulationAggregationUnit {
    count: bool,
    total: Total,
}

impl AggregationUnit for AccumulationAggregationUnit {
    fn merge(&mut self, values: &[SqlValue]) -> Result<(), String> {
        let [value] = values else { return Err(format!("expected one value, got {}", values.len())) };
        self.total.add(value)
    }

    fn result(&self) -> SqlValue {
        match (self.count, self.total) {
            (true, Total::Empty) => SqlValue::Int(0),
            _ => self.total.value(),
        }
    }
}

/// AVG recomputed as SUM(sum) / SUM(count) of the helper columns. A third
/// input is the shard value to fall back on when no row was averaged.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AverageAggregationUnit {
    count: Total,
    sum: Total,
    fallback: Option<SqlValue>,
}

impl AggregationUnit for AverageAggregationUnit {
    fn merge(&mut self, values: &[SqlValue]) -> Result<(), String> {
        let (count, sum) = match values {
            [count, sum] => (count, sum),
            [count, sum, shard_value] => {
                if self.fallback.is_none() && !shard_value.is_null() {
                    self.fallback = Some(shard_value.clone());
                }
                (count, sum)
            }
            _ => return Err(format!("expected COUNT and SUM, got {} values", values.len())),
        };
        self.count.add(count)?;
        self.sum.add(sum)
    }

    fn result(&self) -> SqlValue {
        match (self.count.as_f64(), self.sum.as_f64()) {
            (Some(count), Some(sum)) if count != 0.0 => SqlValue::float(sum / count),
            _ => self.fallback.clone().unwrap_or_default(),
        }
    }
}

/// Aggregation over the values shards return in place of `COUNT(DISTINCT x)`
/// and alike. A value seen on several shards counts once.
#[derive(Debug, Clone, PartialEq)]
pub struct DistinctAggregationUnit {
    kind: AggregationType,
    values: IndexSet<SqlValue>,
    total: Total,
}

impl DistinctAggregationUnit {
    pub fn new(kind: AggregationType) -> Self {
        Self { kind, values: IndexSet::new(), total: Total::Empty }
    }
}

impl AggregationUnit for DistinctAggregationUnit {
    fn merge(&mut self, values: &[SqlValue]) -> Result<(), String> {
        let [value] = values else { return Err(format!("expected one value, got {}", values.len())) };
        if value.is_null() || self.values.contains(value) {
            return Ok(());
        }
        if matches!(self.kind, AggregationType::Sum | AggregationType::Avg) {
            self.total.add(value)?;
        }
        self.values.insert(value.clone());
        Ok(())
    }

    fn result(&self) -> SqlValue {
        match self.kind {
            AggregationType::Count => SqlValue::Int(i64::try_from(self.values.len()).unwrap_or(i64::MAX)),
            AggregationType::Sum => self.total.value(),
            AggregationType::Avg => match self.total.as_f64() {
                Some(sum) if !self.values.is_empty() => SqlValue::float(sum / self.values.len() as f64),
                _ => SqlValue::Null,
            },
            AggregationType::Max => self.values.iter().max_by(|a, b| a.compare(b)).cloned().unwrap_or_default(),
            AggregationType::Min => self.values.iter().min_by(|a, b| a.compare(b)).cloned().unwrap_or_default(),
        }
    }
}

pub fn create_aggregation_unit(kind: AggregationType) -> Box<dyn AggregationUnit> {
    match kind {
        AggregationType::Max => Box::new(ComparableAggregationUnit { max: true, value: None }),
        AggregationType::Min => Box::new(ComparableAggregationUnit { max: false, value: None }),
        AggregationType::Count => Box::new(AccumulationAggregationUnit { count: true, total: Total::Empty }),
        AggregationType::Sum => Box::new(AccumulationAggregationUnit { count: false, total: Total::Empty }),
        AggregationType::Avg => Box::new(AverageAggregationUnit::default()),
    }
}

/// Where an aggregation lives in the merged row and which shard columns feed it.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationColumn {
    pub label: String,
    pub kind: AggregationType,
    /// 1-based index of the aggregation itself.
    pub index: usize,
    /// Columns read from each shard row, `[count, sum]` for AVG.
    pub inputs: Vec<usize>,
    /// Shards return the distinct values rather than their aggregate.
    pub distinct: bool,
}

impl AggregationColumn {
    /// Aggregations of `projections`, including expressions that coalesce a
    /// single AVG. An AVG whose helper columns are missing is left out.
    pub fn from_projections(projections: &ProjectionsContext) -> Vec<AggregationColumn> {
        projections
            .projections
            .iter()
            .filter_map(|projection| match projection {
                Projection::Aggregation(aggregation) => Self::from_aggregation(aggregation),
                Projection::AggregationDistinct(aggregation) => Some(AggregationColumn {
                    label: Self::label(aggregation),
                    kind: aggregation.kind,
                    index: aggregation.index,
                    inputs: vec![aggregation.index],
                    distinct: true,
                }),
                Projection::Expression(expression) if expression.coalesced_average => {
                    Self::from_coalesced_average(expression)
                }
                _ => None,
            })
            .collect()
    }

    fn label(aggregation: &AggregationProjection) -> String {
        aggregation.alias.clone().unwrap_or_else(|| aggregation.expression())
    }

    fn from_aggregation(aggregation: &AggregationProjection) -> Option<AggregationColumn> {
        let inputs = match aggregation.kind {
            AggregationType::Avg => {
                let count = aggregation.derived.iter().find(|d| d.kind == AggregationType::Count)?;
                let sum = aggregation.derived.iter().find(|d| d.kind == AggregationType::Sum)?;
                vec![count.index, sum.index]
            }
            _ => vec![aggregation.index],
        };
        Some(AggregationColumn {
            label: Self::label(aggregation),
            kind: aggregation.kind,
            index: aggregation.index,
            inputs,
            distinct: false,
        })
    }

    /// `IFNULL(AVG(x), 0)`: the merged average, or what the shards
    /// answered when nothing was averaged.
    fn from_coalesced_average(expression: &ExpressionProjection) -> Option<AggregationColumn> {
        let [count, sum] = expression.derived.as_slice() else { return None };
        Some(AggregationColumn {
            label: expression.alias.clone().unwrap_or_else(|| expression.text.clone()),
            kind: AggregationType::Avg,
            index: expression.index,
            inputs: vec![count.index, sum.index, expression.index],
            distinct: false,
        })
    }

    pub fn unit(&self) -> Box<dyn AggregationUnit> {
        if self.distinct { Box::new(DistinctAggregationUnit::new(self.kind)) } else { create_aggregation_unit(self.kind) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merged(kind: AggregationType, rows: &[&[SqlValue]]) -> SqlValue {
        let mut unit = create_aggregation_unit(kind);
        for row in rows {
            unit.merge(row).unwrap();
        }
        unit.result()
    }

    #[test]
    fn count_and_sum_add_up_shard_values() {
        assert_eq!(merged(AggregationType::Count, &[&[SqlValue::Int(2)], &[SqlValue::Int(3)]]), SqlValue::Int(5));
        assert_eq!(merged(AggregationType::Count, &[]), SqlValue::Int(0));
        assert_eq!(
            merged(AggregationType::Sum, &[&[SqlValue::Int(2)], &[SqlValue::float(0.5)], &[SqlValue::Null]]),
            SqlValue::float(2.5)
        );
        assert_eq!(merged(AggregationType::Sum, &[&[SqlValue::Null]]), SqlValue::Null);
    }

    #[test]
    fn max_and_min_ignore_nulls() {
        let rows: &[&[SqlValue]] = &[&[SqlValue::Int(4)], &[SqlValue::Null], &[SqlValue::Int(9)], &[SqlValue::Int(1)]];
        assert_eq!(merged(AggregationType::Max, rows), SqlValue::Int(9));
        assert_eq!(merged(AggregationType::Min, rows), SqlValue::Int(1));
        assert_eq!(merged(AggregationType::Max, &[&[SqlValue::Null]]), SqlValue::Null);
    }

    #[test]
    fn average_is_recomputed_from_counts_and_sums() {
        // shard 0 holds 10, 20; shard 1 holds 60
        let rows: &[&[SqlValue]] = &[&[SqlValue::Int(2), SqlValue::Int(30)], &[SqlValue::Int(1), SqlValue::Int(60)]];
        assert_eq!(merged(AggregationType::Avg, rows), SqlValue::float(30.0));
        assert_eq!(merged(AggregationType::Avg, &[&[SqlValue::Int(0), SqlValue::Null]]), SqlValue::Null);
    }

    #[test]
    fn average_falls_back_to_the_shard_value() {
        let rows: &[&[SqlValue]] = &[
            &[SqlValue::Int(0), SqlValue::Null, SqlValue::Int(0)],
            &[SqlValue::Int(0), SqlValue::Null, SqlValue::Int(0)],
        ];
        assert_eq!(merged(AggregationType::Avg, rows), SqlValue::Int(0));
        let rows: &[&[SqlValue]] = &[
            &[SqlValue::Int(2), SqlValue::Int(30), SqlValue::float(15.0)],
            &[SqlValue::Int(0), SqlValue::Null, SqlValue::Int(0)],
        ];
        assert_eq!(merged(AggregationType::Avg, rows), SqlValue::float(15.0));
    }

    #[test]
    fn distinct_values_seen_on_several_shards_count_once() {
        let distinct = |kind| {
            let mut unit = DistinctAggregationUnit::new(kind);
            for value in [1, 2, 2, 3] {
                unit.merge(&[SqlValue::Int(value)]).unwrap();
            }
            unit.merge(&[SqlValue::Null]).unwrap();
            unit.result()
        };
        assert_eq!(distinct(AggregationType::Count), SqlValue::Int(3));
        assert_eq!(distinct(AggregationType::Sum), SqlValue::Int(6));
        assert_eq!(distinct(AggregationType::Avg), SqlValue::float(2.0));
        assert_eq!(distinct(AggregationType::Max), SqlValue::Int(3));
        assert_eq!(DistinctAggregationUnit::new(AggregationType::Count).result(), SqlValue::Int(0));
        assert_eq!(DistinctAggregationUnit::new(AggregationType::Sum).result(), SqlValue::Null);
        assert!(DistinctAggregationUnit::new(AggregationType::Sum).merge(&[SqlValue::text("x")]).is_err());
    }

    #[test]
    fn non_numeric_values_are_rejected() {
        let mut unit = create_aggregation_unit(AggregationType::Sum);
        assert!(unit.merge(&[SqlValue::Bool(true)]).is_err());
        assert!(unit.merge(&[SqlValue::text("oops")]).is_err());
        assert!(unit.merge(&[SqlValue::text("1.5")]).is_ok());
    }
}
