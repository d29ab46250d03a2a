use tracing::warn;

use crate::{
    binder::{
        BindingError, CommonStatementContext, GroupByContext, InsertStatementContext, InsertValueContext, OrderByContext,
        OrderByItem, PaginationContext, Projection, ProjectionsContext, ProjectionsContextEngine, ScopeTable,
        SelectStatementContext, SqlStatementContext, TablesContext,
    },
    metadata::SchemaMetaData,
    statement::{
        ColumnSegment, Expression, InsertStatement, OrderByItemSegment, ProjectionSegment, SelectStatement, SqlStatement,
        SqlValue, TableSegment,
    },
};

/// Binds parsed statements against the catalog.
pub struct StatementBinder<'a> {
    schema: &'a dyn SchemaMetaData,
}

impl<'a> StatementBinder<'a> {
    pub fn new(schema: &'a dyn SchemaMetaData) -> Self {
        Self { schema }
    }

    pub fn bind(&self, statement: &SqlStatement, params: &[SqlValue]) -> Result<SqlStatementContext, BindingError> {
        match statement {
            SqlStatement::Select(select) => Ok(SqlStatementContext::Select(Box::new(self.bind_select(select, params)?))),
            SqlStatement::Insert(insert) => Ok(SqlStatementContext::Insert(self.bind_insert(insert)?)),
            other => Ok(SqlStatementContext::Common(self.bind_common(other)?)),
        }
    }

    pub fn bind_select(&self, select: &SelectStatement, params: &[SqlValue]) -> Result<SelectStatementContext, BindingError> {
        let mut scope = Vec::new();
        let mut subqueries = Vec::new();
        for table in select.from.iter().flat_map(TableSegment::scope_tables) {
            match table {
                TableSegment::Simple(simple) => scope.push(ScopeTable::Simple(simple.clone())),
                TableSegment::Subquery(subquery) => {
                    let context = self.bind_select(&subquery.select, params)?;
                    let columns = context.projections.visible_projections().iter().map(Projection::column_label).collect();
                    scope.push(ScopeTable::Derived { alias: subquery.alias.clone(), columns });
                    subqueries.push(context);
                }
                TableSegment::Join(_) => {}
            }
        }
        let all_tables = select.all_simple_tables().into_iter().cloned().collect();
        let tables = TablesContext::new(scope, all_tables)?;

        let group_by = GroupByContext::new(select.group_by.as_ref());
        let order_by = OrderByContext::new(select.order_by.as_ref(), &group_by);
        let projections =
            ProjectionsContextEngine::new(self.schema).create(&select.projections, &tables, &group_by, &order_by)?;
        let group_by = GroupByContext {
            items: Self::bind_items(group_by.items, &projections, &tables)?,
            stop: group_by.stop,
        };
        let order_by = OrderByContext {
            items: Self::bind_items(order_by.items, &projections, &tables)?,
            generated: order_by.generated,
        };
        let pagination = PaginationContext::new(select.pagination.as_ref(), params)?;

        self.report_unresolved_columns(Self::select_columns(select), &tables);

        Ok(SelectStatementContext { statement: select.clone(), tables, projections, group_by, order_by, pagination, subqueries })
    }

    fn bind_items(
        items: Vec<OrderByItem>,
        projections: &ProjectionsContext,
        tables: &TablesContext,
    ) -> Result<Vec<OrderByItem>, BindingError> {
        let mut bound = Vec::with_capacity(items.len());
        for mut item in items {
            match projections.find_item_index(&item.segment, tables)? {
                Some(index) => item.index = index,
                None => warn!(item = %item.segment.text(), "sort item matches no output column"),
            }
            bound.push(item);
        }
        Ok(bound)
    }

    fn bind_insert(&self, insert: &InsertStatement) -> Result<InsertStatementContext, BindingError> {
        let tables = TablesContext::from_simple_tables(vec![insert.table.clone()])?;
        let column_names = match &insert.columns {
            Some(segment) => segment.columns.iter().map(|c| c.name.clone()).collect(),
            None => self
                .schema
                .table_meta(&insert.table.name)
                .map(|t| t.columns.values().map(|c| c.name.clone()).collect())
                .unwrap_or_default(),
        };

        let mut offset = 0;
        let mut values = Vec::with_capacity(insert.values.len());
        for group in &insert.values {
            let parameter_count = group.values.iter().map(Expression::parameter_count).sum();
            values.push(InsertValueContext {
                start: group.start,
                stop: group.stop,
                values: group.values.clone(),
                parameters_offset: offset,
                parameter_count,
            });
            offset += parameter_count;
        }

        Ok(InsertStatementContext { statement: insert.clone(), tables, column_names, values })
    }

    fn bind_common(&self, statement: &SqlStatement) -> Result<CommonStatementContext, BindingError> {
        let target = match statement {
            SqlStatement::Update(update) => Some(&update.table),
            SqlStatement::Delete(delete) => Some(&delete.table),
            _ => None,
        };
        let all_tables: Vec<_> = statement.all_simple_tables().into_iter().cloned().collect();
        let tables = match target {
            Some(table) => {
                let scope = table
                    .scope_tables()
                    .into_iter()
                    .filter_map(|t| match t {
                        TableSegment::Simple(simple) => Some(ScopeTable::Simple(simple.clone())),
                        _ => None,
                    })
                    .collect();
                TablesContext::new(scope, all_tables)?
            }
            None => TablesContext::from_simple_tables(all_tables)?,
        };
        Ok(CommonStatementContext { statement: statement.clone(), tables })
    }

    fn select_columns(select: &SelectStatement) -> Vec<ColumnSegment> {
        let mut columns = Vec::new();
        for item in &select.projections.items {
            match item {
                ProjectionSegment::Column { column, .. } => columns.push(column.clone()),
                ProjectionSegment::Expression { expr, .. } => columns.extend(expr.columns().into_iter().cloned()),
                _ => {}
            }
        }
        if let Some(segment) = &select.where_clause {
            columns.extend(segment.expr.columns().into_iter().cloned());
        }
        let items = select.group_by.iter().flat_map(|g| g.items.iter()).chain(select.order_by.iter().flat_map(|o| o.items.iter()));
        for item in items {
            if let OrderByItemSegment::Column { column, .. } = item {
                columns.push(column.clone());
            }
        }
        columns
    }

    fn report_unresolved_columns(&self, columns: Vec<ColumnSegment>, tables: &TablesContext) {
        if tables.is_empty() || columns.is_empty() {
            return;
        }
        let refs: Vec<&ColumnSegment> = columns.iter().collect();
        let resolved = tables.find_table_names_by_column(&refs, self.schema);
        for column in refs.iter().filter(|c| !resolved.contains_key(&c.expression())) {
            warn!(column = %column.expression(), "column does not resolve to any table");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        _fixtures::{order_schema, SqlBuilder},
        binder::PaginationKind,
        statement::{AggregationType, OrderDirection},
    };

    #[test]
    fn binds_group_by_with_generated_order_by() {
        let sql = "SELECT user_id, COUNT(*) FROM t_order GROUP BY user_id";
        let b = SqlBuilder::new(sql);
        let select = SelectStatement::new(b.projections(vec![b.column_item("user_id"), b.aggregation(AggregationType::Count, "COUNT(*)")]))
            .from(b.table("t_order"))
            .group_by(b.group_by(vec![b.order_item_nth("user_id", 1, OrderDirection::Asc)]));

        let schema = order_schema();
        let context = StatementBinder::new(&schema).bind_select(&select, &[]).expect("bound");
        assert!(context.order_by.generated);
        assert_eq!(context.group_by.items[0].index, 1);
        assert!(context.is_same_group_by_and_order_by());
        assert!(!context.needs_memory_merge());
        assert_eq!(context.tables.table_names(), &["t_order".to_string()]);
    }

    #[test]
    fn different_group_and_order_need_memory_merge() {
        let sql = "SELECT user_id, status FROM t_order GROUP BY user_id ORDER BY status";
        let b = SqlBuilder::new(sql);
        let select = SelectStatement::new(b.projections(vec![b.column_item("user_id"), b.column_item("status")]))
            .from(b.table("t_order"))
            .group_by(b.group_by(vec![b.order_item_nth("user_id", 1, OrderDirection::Asc)]))
            .order_by(b.order_by(vec![b.order_item_nth("status", 1, OrderDirection::Asc)]));

        let schema = order_schema();
        let context = StatementBinder::new(&schema).bind_select(&select, &[]).expect("bound");
        assert_eq!(context.order_by.items[0].index, 2);
        assert!(context.needs_memory_merge());
    }

    #[test]
    fn derived_table_exposes_its_labels() {
        let inner_sql = "SELECT order_id, user_id AS uid FROM t_order";
        let b = SqlBuilder::new(inner_sql);
        let inner = SelectStatement::new(b.projections(vec![b.column_item("order_id"), b.aliased_column("user_id", "uid")]))
            .from(b.table("t_order"));
        let select = SelectStatement::new(crate::statement::ProjectionsSegment::new(
            7,
            vec![ProjectionSegment::Shorthand { start: 7, stop: 7, owner: None }],
        ))
        .from(TableSegment::Subquery(crate::statement::SubqueryTableSegment {
            start: 14,
            stop: 60,
            select: Box::new(inner),
            alias: Some("t".into()),
        }));

        let schema = order_schema();
        let context = StatementBinder::new(&schema).bind_select(&select, &[]).expect("bound");
        let labels: Vec<String> = context.projections.expand_projections().iter().map(Projection::column_label).collect();
        assert_eq!(labels, vec!["order_id", "uid"]);
        assert_eq!(context.tables.table_names(), &["t_order".to_string()]);
        assert_eq!(context.subqueries.len(), 1);
    }

    #[test]
    fn insert_groups_track_their_parameters() {
        let sql = "INSERT INTO t_order (user_id, status) VALUES (?, ?), (?, 'PAID')";
        let b = SqlBuilder::new(sql);
        let insert = b.insert("t_order", &["user_id", "status"], vec![vec![b.param(0), b.param(1)], vec![b.param(2), b.text_literal("'PAID'")]]);
        let schema = order_schema();
        let context = StatementBinder::new(&schema).bind(&SqlStatement::Insert(insert), &[]).expect("bound");
        let insert = context.as_insert().expect("insert context");

        assert_eq!(insert.column_names, vec!["user_id", "status"]);
        assert_eq!((insert.values[0].parameters_offset, insert.values[0].parameter_count), (0, 2));
        assert_eq!((insert.values[1].parameters_offset, insert.values[1].parameter_count), (2, 1));
        let params = vec![SqlValue::Int(1), SqlValue::text("NEW"), SqlValue::Int(2)];
        assert_eq!(insert.values[1].value(1, &params), Some(SqlValue::text("PAID")));
        assert_eq!(insert.values[1].parameters(&params), &[SqlValue::Int(2)]);
    }

    #[test]
    fn limit_parameters_are_bound() {
        let sql = "SELECT order_id FROM t_order LIMIT ?, ?";
        let b = SqlBuilder::new(sql);
        let select = SelectStatement::new(b.projections(vec![b.column_item("order_id")]))
            .from(b.table("t_order"))
            .pagination(b.limit_params(0, 1));
        let schema = order_schema();
        let params = vec![SqlValue::Int(3), SqlValue::Int(4)];
        let context = StatementBinder::new(&schema).bind_select(&select, &params).expect("bound");
        assert_eq!(context.pagination.kind, Some(PaginationKind::Limit));
        assert_eq!(context.pagination.revised_row_count(false), Some(7));
    }
}
