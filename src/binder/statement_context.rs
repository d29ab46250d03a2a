use crate::{
    binder::{GroupByContext, OrderByContext, PaginationContext, Projection, ProjectionsContext, TablesContext},
    metadata::SchemaMetaData,
    statement::{ColumnSegment, Expression, InsertStatement, SelectStatement, SqlStatement, SqlValue},
};

/// Output column description handed to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryHeader {
    pub index: usize,
    pub label: String,
    /// Logical table the column comes from, when it is a plain column.
    pub table: Option<String>,
}

#[derive(Debug)]
pub struct SelectStatementContext {
    pub statement: SelectStatement,
    pub tables: TablesContext,
    pub projections: ProjectionsContext,
    pub group_by: GroupByContext,
    pub order_by: OrderByContext,
    pub pagination: PaginationContext,
    /// Bound derived tables of the FROM clause.
    pub subqueries: Vec<SelectStatementContext>,
}

impl SelectStatementContext {
    pub fn is_same_group_by_and_order_by(&self) -> bool {
        !self.group_by.is_empty()
            && self.group_by.items.len() == self.order_by.items.len()
            && self
                .group_by
                .items
                .iter()
                .zip(&self.order_by.items)
                .all(|(g, o)| g.index == o.index && g.direction() == o.direction())
    }

    /// Rows must be grouped across shards.
    pub fn needs_grouping(&self) -> bool {
        !self.group_by.is_empty() || self.projections.contains_aggregation() || self.projections.distinct_row
    }

    /// Grouping cannot be done on sorted streams and needs every row in memory.
    /// Distinct aggregations always collect their values in memory.
    pub fn needs_memory_merge(&self) -> bool {
        self.needs_grouping()
            && (!self.is_same_group_by_and_order_by() || self.projections.contains_distinct_aggregation())
    }

    /// WHERE clauses with the scope their columns resolve in, outer first.
    pub fn where_scopes(&self) -> Vec<(&Expression, &TablesContext)> {
        let mut out = Vec::new();
        if let Some(segment) = &self.statement.where_clause {
            out.push((&segment.expr, &self.tables));
        }
        for subquery in &self.subqueries {
            out.extend(subquery.where_scopes());
        }
        out
    }

    pub fn query_headers(&self, schema: &dyn SchemaMetaData) -> Vec<QueryHeader> {
        let visible = self.projections.visible_projections();
        let mut headers = Vec::with_capacity(visible.len());
        for projection in visible {
            let table = match &projection {
                Projection::Column(column) => match &column.owner {
                    Some(owner) => self.tables.find_table_name_by_owner(owner),
                    None => {
                        let segment = ColumnSegment::new(0, 0, &column.name);
                        self.tables.find_table_names_by_column(&[&segment], schema).remove(&column.name)
                    }
                },
                _ => None,
            };
            headers.push(QueryHeader {
                index: projection.index().unwrap_or(0),
                label: projection.column_label(),
                table,
            });
        }
        headers
    }
}

/// One `(...)` group of an INSERT with the parameters it consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertValueContext {
    pub start: usize,
    pub stop: usize,
    pub values: Vec<Expression>,
    /// Position of this group's first parameter in the statement's list.
    pub parameters_offset: usize,
    pub parameter_count: usize,
}

impl InsertValueContext {
    /// Literal or bound parameter value at `column_index`.
    pub fn value(&self, column_index: usize, params: &[SqlValue]) -> Option<SqlValue> {
        match self.values.get(column_index)? {
            Expression::Literal { value, .. } => Some(value.clone()),
            Expression::Parameter { index, .. } => params.get(*index).cloned(),
            _ => None,
        }
    }

    pub fn parameters<'p>(&self, params: &'p [SqlValue]) -> &'p [SqlValue] {
        let end = (self.parameters_offset + self.parameter_count).min(params.len());
        let start = self.parameters_offset.min(end);
        &params[start..end]
    }
}

#[derive(Debug)]
pub struct InsertStatementContext {
    pub statement: InsertStatement,
    pub tables: TablesContext,
    /// Explicit column list, or the table's catalog columns when omitted.
    pub column_names: Vec<String>,
    pub values: Vec<InsertValueContext>,
}

impl InsertStatementContext {
    pub fn table_name(&self) -> &str {
        &self.statement.table.name
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.column_names.iter().position(|c| c.eq_ignore_ascii_case(column))
    }

    /// Parameters after the last VALUES group (e.g. ON DUPLICATE KEY UPDATE).
    pub fn trailing_parameters_offset(&self) -> usize {
        self.values.last().map(|v| v.parameters_offset + v.parameter_count).unwrap_or(0)
    }
}

/// Everything other than SELECT and INSERT.
#[derive(Debug)]
pub struct CommonStatementContext {
    pub statement: SqlStatement,
    pub tables: TablesContext,
}

impl CommonStatementContext {
    pub fn where_clause(&self) -> Option<&Expression> {
        match &self.statement {
            SqlStatement::Update(update) => update.where_clause.as_ref().map(|w| &w.expr),
            SqlStatement::Delete(delete) => delete.where_clause.as_ref().map(|w| &w.expr),
            _ => None,
        }
    }
}

/// A statement bound to its tables and output columns.
#[derive(Debug)]
pub enum SqlStatementContext {
    Select(Box<SelectStatementContext>),
    Insert(InsertStatementContext),
    Common(CommonStatementContext),
}

impl SqlStatementContext {
    pub fn tables(&self) -> &TablesContext {
        match self {
            SqlStatementContext::Select(select) => &select.tables,
            SqlStatementContext::Insert(insert) => &insert.tables,
            SqlStatementContext::Common(common) => &common.tables,
        }
    }

    pub fn is_query(&self) -> bool {
        matches!(self, SqlStatementContext::Select(_))
    }

    pub fn is_write(&self) -> bool {
        match self {
            SqlStatementContext::Select(_) => false,
            SqlStatementContext::Insert(_) => true,
            SqlStatementContext::Common(common) => common.statement.is_write(),
        }
    }

    pub fn where_scopes(&self) -> Vec<(&Expression, &TablesContext)> {
        match self {
            SqlStatementContext::Select(select) => select.where_scopes(),
            SqlStatementContext::Insert(_) => Vec::new(),
            SqlStatementContext::Common(common) => {
                common.where_clause().map(|expr| (expr, &common.tables)).into_iter().collect()
            }
        }
    }

    pub fn as_select(&self) -> Option<&SelectStatementContext> {
        match self {
            SqlStatementContext::Select(select) => Some(select),
            _ => None,
        }
    }

    pub fn as_insert(&self) -> Option<&InsertStatementContext> {
        match self {
            SqlStatementContext::Insert(insert) => Some(insert),
            _ => None,
        }
    }
}
