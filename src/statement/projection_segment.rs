use std::fmt::Display;

use crate::statement::{ColumnSegment, Expression, OwnerSegment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregationType {
    Count,
    Sum,
    Avg,
    Max,
    Min,
}

impl AggregationType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "COUNT" => Some(AggregationType::Count),
            "SUM" => Some(AggregationType::Sum),
            "AVG" => Some(AggregationType::Avg),
            "MAX" => Some(AggregationType::Max),
            "MIN" => Some(AggregationType::Min),
            _ => None,
        }
    }
}

impl Display for AggregationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            AggregationType::Count => "COUNT",
            AggregationType::Sum => "SUM",
            AggregationType::Avg => "AVG",
            AggregationType::Max => "MAX",
            AggregationType::Min => "MIN",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionSegment {
    /// `*` or `owner.*`
    Shorthand { start: usize, stop: usize, owner: Option<OwnerSegment> },
    Column { column: ColumnSegment, alias: Option<String> },
    Expression { start: usize, stop: usize, text: String, expr: Expression, alias: Option<String> },
    /// `inner_expression` keeps the parentheses, `(score)` for `SUM(score)`.
    Aggregation { start: usize, stop: usize, kind: AggregationType, inner_expression: String, alias: Option<String> },
    /// `COUNT(DISTINCT user_id)`: inner `(DISTINCT user_id)`, distinct `user_id`.
    AggregationDistinct {
        start: usize,
        stop: usize,
        kind: AggregationType,
        inner_expression: String,
        distinct_expression: String,
        alias: Option<String>,
    },
}

impl ProjectionSegment {
    pub fn stop(&self) -> usize {
        match self {
            ProjectionSegment::Column { column, .. } => column.stop,
            ProjectionSegment::Shorthand { stop, .. }
            | ProjectionSegment::Expression { stop, .. }
            | ProjectionSegment::Aggregation { stop, .. }
            | ProjectionSegment::AggregationDistinct { stop, .. } => *stop,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProjectionsSegment {
    pub start: usize,
    pub stop: usize,
    pub distinct_row: bool,
    pub items: Vec<ProjectionSegment>,
}

impl ProjectionsSegment {
    /// Builds the segment, spanning from the first to the last item.
    pub fn new(start: usize, items: Vec<ProjectionSegment>) -> Self {
        let stop = items.iter().map(ProjectionSegment::stop).max().unwrap_or(start);
        Self { start, stop, distinct_row: false, items }
    }

    pub fn distinct(mut self) -> Self {
        self.distinct_row = true;
        self
    }
}
