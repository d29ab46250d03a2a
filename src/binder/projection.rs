use crate::statement::AggregationType;

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnProjection {
    pub owner: Option<String>,
    pub name: String,
    pub alias: Option<String>,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionProjection {
    pub text: String,
    pub alias: Option<String>,
    pub index: usize,
    /// COUNT/SUM pairs standing in for AVG calls nested in the expression.
    pub derived: Vec<AggregationProjection>,
    /// `IFNULL(AVG(x), fallback)` and alike: the merged average is the
    /// value unless there is none.
    pub coalesced_average: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShorthandProjection {
    pub owner: Option<String>,
    /// Concrete columns `*` stands for, each with its own index.
    pub columns: Vec<ColumnProjection>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregationProjection {
    pub kind: AggregationType,
    /// Argument text including parentheses, `(score)`.
    pub inner_expression: String,
    pub alias: Option<String>,
    pub index: usize,
    pub distinct_expression: Option<String>,
    /// For AVG: the COUNT then SUM it is recomputed from.
    pub derived: Vec<AggregationProjection>,
}

impl AggregationProjection {
    pub fn new(kind: AggregationType, inner_expression: &str) -> Self {
        Self {
            kind,
            inner_expression: inner_expression.to_string(),
            alias: None,
            index: 0,
            distinct_expression: None,
            derived: Vec::new(),
        }
    }

    pub fn expression(&self) -> String {
        format!("{}{}", self.kind, self.inner_expression)
    }

    /// Fresh COUNT and SUM over the same argument, not yet indexed.
    pub(crate) fn average_children(&self) -> Vec<AggregationProjection> {
        [AggregationType::Count, AggregationType::Sum]
            .into_iter()
            .map(|kind| AggregationProjection {
                kind,
                inner_expression: self.inner_expression.clone(),
                alias: None,
                index: 0,
                distinct_expression: self.distinct_expression.clone(),
                derived: Vec::new(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedKind {
    OrderBy,
    GroupBy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DerivedProjection {
    pub expression: String,
    pub alias: String,
    pub kind: DerivedKind,
    pub index: usize,
}

/// One selected output item.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Column(ColumnProjection),
    Expression(ExpressionProjection),
    Shorthand(ShorthandProjection),
    Aggregation(AggregationProjection),
    AggregationDistinct(AggregationProjection),
    Derived(DerivedProjection),
}

impl Projection {
    pub fn expression(&self) -> String {
        match self {
            Projection::Column(column) => match &column.owner {
                Some(owner) => format!("{owner}.{}", column.name),
                None => column.name.clone(),
            },
            Projection::Expression(expression) => expression.text.clone(),
            Projection::Shorthand(shorthand) => match &shorthand.owner {
                Some(owner) => format!("{owner}.*"),
                None => "*".to_string(),
            },
            Projection::Aggregation(aggregation) | Projection::AggregationDistinct(aggregation) => {
                aggregation.expression()
            }
            Projection::Derived(derived) => derived.expression.clone(),
        }
    }

    pub fn alias(&self) -> Option<&str> {
        match self {
            Projection::Column(column) => column.alias.as_deref(),
            Projection::Expression(expression) => expression.alias.as_deref(),
            Projection::Shorthand(_) => None,
            Projection::Aggregation(aggregation) | Projection::AggregationDistinct(aggregation) => {
                aggregation.alias.as_deref()
            }
            Projection::Derived(derived) => Some(&derived.alias),
        }
    }

    /// Name the client sees for this column.
    pub fn column_label(&self) -> String {
        match (self.alias(), self) {
            (Some(alias), _) => alias.to_string(),
            (None, Projection::Column(column)) => column.name.clone(),
            (None, other) => other.expression(),
        }
    }

    /// 1-based output position; `None` for a shorthand, whose columns carry their own.
    pub fn index(&self) -> Option<usize> {
        match self {
            Projection::Column(column) => Some(column.index),
            Projection::Expression(expression) => Some(expression.index),
            Projection::Shorthand(_) => None,
            Projection::Aggregation(aggregation) | Projection::AggregationDistinct(aggregation) => {
                Some(aggregation.index)
            }
            Projection::Derived(derived) => Some(derived.index),
        }
    }

    /// Synthesized AVG children hanging off this projection.
    pub fn derived_aggregations(&self) -> &[AggregationProjection] {
        match self {
            Projection::Aggregation(aggregation) | Projection::AggregationDistinct(aggregation) => &aggregation.derived,
            Projection::Expression(expression) => &expression.derived,
            _ => &[],
        }
    }
}
