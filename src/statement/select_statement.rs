use crate::statement::{
    GroupBySegment, HavingSegment, OrderBySegment, PaginationSegment, ProjectionsSegment, SimpleTableSegment,
    TableSegment, WhereSegment,
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectStatement {
    pub projections: ProjectionsSegment,
    pub from: Option<TableSegment>,
    pub where_clause: Option<WhereSegment>,
    pub group_by: Option<GroupBySegment>,
    pub having: Option<HavingSegment>,
    pub order_by: Option<OrderBySegment>,
    pub pagination: Option<PaginationSegment>,
}

impl SelectStatement {
    pub fn new(projections: ProjectionsSegment) -> Self {
        Self { projections, ..Default::default() }
    }

    pub fn from(mut self, table: TableSegment) -> Self {
        self.from = Some(table);
        self
    }

    pub fn where_clause(mut self, segment: WhereSegment) -> Self {
        self.where_clause = Some(segment);
        self
    }

    pub fn group_by(mut self, segment: GroupBySegment) -> Self {
        self.group_by = Some(segment);
        self
    }

    pub fn having(mut self, segment: HavingSegment) -> Self {
        self.having = Some(segment);
        self
    }

    pub fn order_by(mut self, segment: OrderBySegment) -> Self {
        self.order_by = Some(segment);
        self
    }

    pub fn pagination(mut self, segment: PaginationSegment) -> Self {
        self.pagination = Some(segment);
        self
    }

    /// All simple tables of the statement: FROM items, derived tables and
    /// subqueries in WHERE, in the order they appear.
    pub fn all_simple_tables(&self) -> Vec<&SimpleTableSegment> {
        let mut out = Vec::new();
        if let Some(from) = &self.from {
            out.extend(from.all_simple_tables());
        }
        if let Some(segment) = &self.where_clause {
            out.extend(segment.expr.subquery_tables());
        }
        out
    }

    /// Derived tables (`FROM (SELECT ...) alias`) directly in this FROM clause.
    pub fn subqueries(&self) -> Vec<&SelectStatement> {
        self.from
            .iter()
            .flat_map(|from| from.scope_tables())
            .filter_map(|table| match table {
                TableSegment::Subquery(subquery) => Some(subquery.select.as_ref()),
                _ => None,
            })
            .collect()
    }
}
