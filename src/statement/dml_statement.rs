use crate::statement::{ColumnSegment, Expression, SimpleTableSegment, TableSegment, WhereSegment};

/// `(col_a, col_b)`; `start` is the `(` and `stop` the `)`.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertColumnsSegment {
    pub start: usize,
    pub stop: usize,
    pub columns: Vec<ColumnSegment>,
}

/// One `(v1, v2)` group of a VALUES clause, parentheses included.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertValuesSegment {
    pub start: usize,
    pub stop: usize,
    pub values: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub table: SimpleTableSegment,
    pub columns: Option<InsertColumnsSegment>,
    pub values: Vec<InsertValuesSegment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetAssignment {
    pub column: ColumnSegment,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    pub table: TableSegment,
    pub assignments: Vec<SetAssignment>,
    pub where_clause: Option<WhereSegment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    pub table: TableSegment,
    pub where_clause: Option<WhereSegment>,
}
