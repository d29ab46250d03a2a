use crate::statement::{ColumnSegment, SelectStatement, SimpleTableSegment, SqlValue};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinaryOperator {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    Other(String),
}

impl BinaryOperator {
    /// Operator seen from the other side, `5 < id` becomes `id > 5`.
    pub fn flipped(&self) -> BinaryOperator {
        match self {
            BinaryOperator::Lt => BinaryOperator::Gt,
            BinaryOperator::LtEq => BinaryOperator::GtEq,
            BinaryOperator::Gt => BinaryOperator::Lt,
            BinaryOperator::GtEq => BinaryOperator::LtEq,
            other => other.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Column(ColumnSegment),
    Literal { start: usize, stop: usize, value: SqlValue },
    /// `?` placeholder, `index` is its 0-based position in the parameter list.
    Parameter { start: usize, stop: usize, index: usize },
    Binary { start: usize, stop: usize, left: Box<Expression>, operator: BinaryOperator, right: Box<Expression> },
    In { start: usize, stop: usize, left: Box<Expression>, list: Vec<Expression>, not: bool },
    Between { start: usize, stop: usize, left: Box<Expression>, low: Box<Expression>, high: Box<Expression>, not: bool },
    /// Function call, `text` is the original call text such as `AVG(score)`.
    Function { start: usize, stop: usize, name: String, args: Vec<Expression>, text: String },
    Subquery { start: usize, stop: usize, select: Box<SelectStatement> },
}

impl Expression {
    pub fn binary(left: Expression, operator: BinaryOperator, right: Expression) -> Self {
        let start = left.start();
        let stop = right.stop();
        Expression::Binary { start, stop, left: Box::new(left), operator, right: Box::new(right) }
    }

    pub fn start(&self) -> usize {
        match self {
            Expression::Column(column) => column.start,
            Expression::Literal { start, .. }
            | Expression::Parameter { start, .. }
            | Expression::Binary { start, .. }
            | Expression::In { start, .. }
            | Expression::Between { start, .. }
            | Expression::Function { start, .. }
            | Expression::Subquery { start, .. } => *start,
        }
    }

    pub fn stop(&self) -> usize {
        match self {
            Expression::Column(column) => column.stop,
            Expression::Literal { stop, .. }
            | Expression::Parameter { stop, .. }
            | Expression::Binary { stop, .. }
            | Expression::In { stop, .. }
            | Expression::Between { stop, .. }
            | Expression::Function { stop, .. }
            | Expression::Subquery { stop, .. } => *stop,
        }
    }

    /// Column references of this expression, not descending into subqueries.
    pub fn columns(&self) -> Vec<&ColumnSegment> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a ColumnSegment>) {
        match self {
            Expression::Column(column) => out.push(column),
            Expression::Binary { left, right, .. } => {
                left.collect_columns(out);
                right.collect_columns(out);
            }
            Expression::In { left, list, .. } => {
                left.collect_columns(out);
                list.iter().for_each(|e| e.collect_columns(out));
            }
            Expression::Between { left, low, high, .. } => {
                left.collect_columns(out);
                low.collect_columns(out);
                high.collect_columns(out);
            }
            Expression::Function { args, .. } => args.iter().for_each(|e| e.collect_columns(out)),
            Expression::Literal { .. } | Expression::Parameter { .. } | Expression::Subquery { .. } => {}
        }
    }

    /// Function calls named `name` (case-insensitive), left to right, outermost first.
    pub fn find_functions(&self, name: &str) -> Vec<&Expression> {
        let mut out = Vec::new();
        self.collect_functions(name, &mut out);
        out
    }

    fn collect_functions<'a>(&'a self, name: &str, out: &mut Vec<&'a Expression>) {
        match self {
            Expression::Function { name: fn_name, args, .. } => {
                if fn_name.eq_ignore_ascii_case(name) {
                    out.push(self);
                }
                args.iter().for_each(|e| e.collect_functions(name, out));
            }
            Expression::Binary { left, right, .. } => {
                left.collect_functions(name, out);
                right.collect_functions(name, out);
            }
            Expression::In { left, list, .. } => {
                left.collect_functions(name, out);
                list.iter().for_each(|e| e.collect_functions(name, out));
            }
            Expression::Between { left, low, high, .. } => {
                left.collect_functions(name, out);
                low.collect_functions(name, out);
                high.collect_functions(name, out);
            }
            _ => {}
        }
    }

    /// Simple tables referenced by subqueries nested in this expression.
    pub fn subquery_tables(&self) -> Vec<&SimpleTableSegment> {
        match self {
            Expression::Subquery { select, .. } => select.all_simple_tables(),
            Expression::Binary { left, right, .. } => {
                let mut out = left.subquery_tables();
                out.extend(right.subquery_tables());
                out
            }
            Expression::In { left, list, .. } => {
                let mut out = left.subquery_tables();
                list.iter().for_each(|e| out.extend(e.subquery_tables()));
                out
            }
            Expression::Between { left, low, high, .. } => {
                let mut out = left.subquery_tables();
                out.extend(low.subquery_tables());
                out.extend(high.subquery_tables());
                out
            }
            Expression::Function { args, .. } => args.iter().flat_map(|e| e.subquery_tables()).collect(),
            _ => Vec::new(),
        }
    }

    /// Number of `?` placeholders in this expression.
    pub fn parameter_count(&self) -> usize {
        match self {
            Expression::Parameter { .. } => 1,
            Expression::Binary { left, right, .. } => left.parameter_count() + right.parameter_count(),
            Expression::In { left, list, .. } => {
                left.parameter_count() + list.iter().map(Expression::parameter_count).sum::<usize>()
            }
            Expression::Between { left, low, high, .. } => {
                left.parameter_count() + low.parameter_count() + high.parameter_count()
            }
            Expression::Function { args, .. } => args.iter().map(Expression::parameter_count).sum(),
            _ => 0,
        }
    }
}
