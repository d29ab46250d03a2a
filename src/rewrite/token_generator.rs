use std::collections::HashSet;

use crate::{
    binder::{InsertStatementContext, Projection, SelectStatementContext, SqlStatementContext},
    metadata::SchemaMetaData,
    rewrite::{
        EncryptRule, InsertValueText, ParameterBuilder, RewriteError, SqlToken, TokenKind,
        generated_key_is_parameter,
    },
    route::{RouteContext, ShardingRule},
    statement::{
        BinaryOperator, ColumnSegment, Expression, OrderByItemSegment, PaginationSegment, PaginationValueSegment,
        ProjectionSegment, QuoteCharacter, SelectStatement, SqlStatement, SqlValue, TableSegment,
    },
};

/// Derives the rewrite tokens of a routed statement. Parameter-bound values
/// that must change are replaced in the [`ParameterBuilder`] instead.
pub struct SqlTokenGenerator<'a> {
    rule: &'a ShardingRule,
    encrypt: &'a EncryptRule,
    schema: &'a dyn SchemaMetaData,
}

impl<'a> SqlTokenGenerator<'a> {
    pub fn new(rule: &'a ShardingRule, encrypt: &'a EncryptRule, schema: &'a dyn SchemaMetaData) -> Self {
        Self { rule, encrypt, schema }
    }

    pub fn generate(
        &self,
        sql: &str,
        context: &SqlStatementContext,
        route: &RouteContext,
        params: &[SqlValue],
        builder: &mut ParameterBuilder,
    ) -> Result<Vec<SqlToken>, RewriteError> {
        let mut tokens = self.table_tokens(context);
        tokens.extend(self.column_owner_tokens(context));
        match context {
            SqlStatementContext::Select(select) => {
                tokens.extend(self.select_tokens(sql, select, route, builder));
            }
            SqlStatementContext::Insert(insert) => tokens.extend(self.insert_tokens(sql, insert, route)?),
            SqlStatementContext::Common(_) => {}
        }
        tokens.extend(self.encrypt_tokens(context, params, builder)?);
        Ok(tokens)
    }

    fn table_tokens(&self, context: &SqlStatementContext) -> Vec<SqlToken> {
        let mut seen = HashSet::new();
        let mut tokens = Vec::new();
        for table in context.tables().simple_tables() {
            if !self.rule.is_sharding_table(&table.name) || !seen.insert(table.start) {
                continue;
            }
            if let Some(owner) = &table.owner {
                tokens.push(SqlToken::replace(owner.start, table.start, TokenKind::Remove));
            }
            tokens.push(SqlToken::replace(
                table.start,
                table.stop + 1,
                TokenKind::Table { logic_table: table.name.clone(), quote: table.quote },
            ));
        }
        tokens
    }

    /// `t_order.user_id` becomes `t_order_1.user_id`; aliases stay.
    fn column_owner_tokens(&self, context: &SqlStatementContext) -> Vec<SqlToken> {
        let tables = context.tables().simple_tables();
        let mut seen = HashSet::new();
        let mut tokens = Vec::new();
        for column in statement_columns(context) {
            let Some(owner) = &column.owner else { continue };
            let unaliased = tables.iter().any(|t| {
                t.name.eq_ignore_ascii_case(&owner.name)
                    && t.alias.as_ref().is_none_or(|alias| alias.eq_ignore_ascii_case(&t.name))
            });
            if unaliased && self.rule.is_sharding_table(&owner.name) && seen.insert(owner.start) {
                tokens.push(SqlToken::replace(
                    owner.start,
                    owner.stop + 1,
                    TokenKind::ColumnOwner { logic_table: owner.name.clone(), quote: QuoteCharacter::None },
                ));
            }
        }
        tokens
    }

    fn select_tokens(
        &self,
        sql: &str,
        select: &SelectStatementContext,
        route: &RouteContext,
        builder: &mut ParameterBuilder,
    ) -> Vec<SqlToken> {
        let mut tokens = Vec::new();
        let distinct_values = !route.is_single_routing() && select.projections.contains_distinct_aggregation();
        let mut derived = select.projections.derived_items();
        if distinct_values {
            read_distinct_values_for_averages(select, &mut derived);
        }
        if !derived.is_empty() {
            tokens.push(SqlToken::insert(select.projections.stop + 1, TokenKind::Projections { items: derived }));
        }
        if route.is_single_routing() {
            return tokens;
        }
        if distinct_values {
            tokens.extend(distinct_aggregation_tokens(sql, select));
        }

        if select.order_by.generated {
            let anchor = select.statement.having.as_ref().map(|h| h.stop).or(select.group_by.stop);
            if let Some(stop) = anchor {
                let items = select
                    .order_by
                    .items
                    .iter()
                    .map(|item| format!("{} {}", item.segment.text(), item.direction().as_sql()))
                    .collect();
                tokens.push(SqlToken::insert(stop + 1, TokenKind::OrderBy { items }));
            }
        }

        let pagination = &select.pagination;
        if pagination.has_pagination() {
            let mut revise = |segment: &PaginationValueSegment, revised: u64, kind: TokenKind| match segment {
                PaginationValueSegment::Literal { start, stop, .. } => {
                    tokens.push(SqlToken::replace(*start, stop + 1, kind));
                }
                PaginationValueSegment::Parameter { index, .. } => {
                    builder.replace(*index, SqlValue::Int(i64::try_from(revised).unwrap_or(i64::MAX)));
                }
            };
            if let Some(offset) = &pagination.offset_segment {
                let revised = pagination.revised_offset();
                revise(offset, revised, TokenKind::Offset { revised });
            }
            if let (Some(row_count), Some(revised)) =
                (&pagination.row_count_segment, pagination.revised_row_count(select.needs_memory_merge()))
            {
                revise(row_count, revised, TokenKind::RowCount { revised });
            }
        }
        tokens
    }

    fn insert_tokens(
        &self,
        sql: &str,
        insert: &InsertStatementContext,
        route: &RouteContext,
    ) -> Result<Vec<SqlToken>, RewriteError> {
        let mut tokens = Vec::new();
        if !self.rule.is_sharding_table(insert.table_name()) || insert.values.is_empty() {
            return Ok(tokens);
        }
        let generated = route.generated_key.as_ref().filter(|k| k.generated);
        if let (Some(key), Some(columns)) = (generated, &insert.statement.columns) {
            tokens.push(SqlToken::insert(
                columns.stop,
                TokenKind::GeneratedKeyInsertColumn { column: key.column_name.clone() },
            ));
        }

        let mut rows = Vec::with_capacity(insert.values.len());
        for (row_index, row) in insert.values.iter().enumerate() {
            let text = sql.get(row.start..=row.stop).ok_or(RewriteError::TokenOutOfBounds {
                start: row.start,
                end: row.stop + 1,
                length: sql.len(),
            })?;
            let text = match generated.and_then(|k| k.values.get(row_index)) {
                Some(value) => {
                    let key = if generated_key_is_parameter(row) { "?".to_string() } else { value.to_sql_literal() };
                    let body = text.strip_suffix(')').unwrap_or(text);
                    format!("{body}, {key})")
                }
                None => text.to_string(),
            };
            rows.push(InsertValueText { row_index, text });
        }
        let (Some(first), Some(last)) = (insert.values.first(), insert.values.last()) else { return Ok(tokens) };
        tokens.push(SqlToken::replace(first.start, last.stop + 1, TokenKind::InsertValues { rows }));
        Ok(tokens)
    }

    /// WHERE predicates over encrypted columns compare the cipher column
    /// with encrypted values.
    fn encrypt_tokens(
        &self,
        context: &SqlStatementContext,
        params: &[SqlValue],
        builder: &mut ParameterBuilder,
    ) -> Result<Vec<SqlToken>, RewriteError> {
        let mut tokens = Vec::new();
        if self.encrypt.is_empty() {
            return Ok(tokens);
        }
        for (expr, tables) in context.where_scopes() {
            for (column, values) in encrypt_predicates(expr) {
                let owners = tables.find_table_names_by_column(&[column], self.schema);
                let Some(table) = owners.get(&column.expression()) else { continue };
                let Some(config) = self.encrypt.find_column(table, &column.name) else { continue };

                let name_start = (column.stop + 1).saturating_sub(column.name.len());
                tokens.push(SqlToken::replace(
                    name_start,
                    column.stop + 1,
                    TokenKind::EncryptColumn { cipher_column: config.cipher_column.clone() },
                ));
                for value in values {
                    match value {
                        Expression::Literal { start, stop, value } => {
                            let literal = self.encrypt.encrypt(config, value)?.to_sql_literal();
                            tokens.push(SqlToken::replace(*start, stop + 1, TokenKind::EncryptValue { literal }));
                        }
                        Expression::Parameter { index, .. } => {
                            if let Some(plain) = params.get(*index) {
                                builder.replace(*index, self.encrypt.encrypt(config, plain)?);
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
        Ok(tokens)
    }
}

/// Shards answer distinct aggregations with the distinct values themselves.
/// Without GROUP BY or other aggregations a `SELECT DISTINCT` is enough;
/// otherwise the distinct expressions join the GROUP BY.
fn distinct_aggregation_tokens(sql: &str, select: &SelectStatementContext) -> Vec<SqlToken> {
    let mut tokens = Vec::new();
    let mut expressions: Vec<String> = Vec::new();
    for item in &select.statement.projections.items {
        let ProjectionSegment::AggregationDistinct { start, stop, distinct_expression, alias, .. } = item else {
            continue;
        };
        tokens.push(SqlToken::replace(
            *start,
            stop + 1,
            TokenKind::AggregationDistinct { expression: distinct_expression.clone(), alias: alias.clone() },
        ));
        if !expressions.iter().any(|e| e.eq_ignore_ascii_case(distinct_expression)) {
            expressions.push(distinct_expression.clone());
        }
    }

    let other_aggregations = select.projections.projections.iter().any(|p| match p {
        Projection::Aggregation(_) => true,
        Projection::Expression(expression) => !expression.derived.is_empty(),
        _ => false,
    });
    let statement = &select.statement;
    if let Some(group_by) = &statement.group_by {
        let items = TokenKind::GroupByItems { items: expressions, new_clause: false };
        tokens.push(SqlToken::insert(group_by.stop + 1, items));
    } else if other_aggregations {
        // the new clause goes in front of HAVING, ORDER BY or LIMIT
        let next_clause = [
            statement.having.as_ref().map(|h| h.start),
            statement.order_by.as_ref().map(|o| o.start),
            match &statement.pagination {
                Some(PaginationSegment::Limit(limit)) => Some(limit.start),
                _ => None,
            },
        ]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(sql.len());
        let head = sql.get(..next_clause).unwrap_or(sql);
        let position = head.trim_end_matches(|c: char| c.is_whitespace() || c == ';').len();
        tokens.push(SqlToken::insert(position, TokenKind::GroupByItems { items: expressions, new_clause: true }));
    } else if !select.projections.distinct_row {
        // ahead of the replacement starting at the same offset
        tokens.insert(0, SqlToken::insert(select.projections.start, TokenKind::Distinct));
    }
    tokens
}

/// The COUNT and SUM helpers of `AVG(DISTINCT x)` carry `x` as well.
fn read_distinct_values_for_averages(select: &SelectStatementContext, derived: &mut [(String, String)]) {
    let children = select
        .projections
        .projections
        .iter()
        .filter(|p| matches!(p, Projection::AggregationDistinct(_)))
        .flat_map(Projection::derived_aggregations);
    for child in children {
        let (Some(alias), Some(expression)) = (&child.alias, &child.distinct_expression) else { continue };
        if let Some(item) = derived.iter_mut().find(|(_, a)| a == alias) {
            item.0 = expression.clone();
        }
    }
}

/// `column = value`, `column <> value` and `column IN (...)` predicates.
fn encrypt_predicates(expr: &Expression) -> Vec<(&ColumnSegment, Vec<&Expression>)> {
    match expr {
        Expression::Binary { left, operator: BinaryOperator::And | BinaryOperator::Or, right, .. } => {
            let mut out = encrypt_predicates(left);
            out.extend(encrypt_predicates(right));
            out
        }
        Expression::Binary { left, operator: BinaryOperator::Eq | BinaryOperator::NotEq, right, .. } => {
            match (left.as_ref(), right.as_ref()) {
                (Expression::Column(column), value) | (value, Expression::Column(column)) => vec![(column, vec![value])],
                _ => Vec::new(),
            }
        }
        Expression::In { left, list, .. } => match left.as_ref() {
            Expression::Column(column) => vec![(column, list.iter().collect())],
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn statement_columns(context: &SqlStatementContext) -> Vec<&ColumnSegment> {
    let mut out = Vec::new();
    match context {
        SqlStatementContext::Select(select) => select_columns(&select.statement, &mut out),
        SqlStatementContext::Insert(_) => {}
        SqlStatementContext::Common(common) => match &common.statement {
            SqlStatement::Update(update) => {
                out.extend(update.assignments.iter().map(|a| &a.column));
                out.extend(update.assignments.iter().flat_map(|a| a.value.columns()));
                table_columns(&update.table, &mut out);
                if let Some(segment) = &update.where_clause {
                    expression_columns(&segment.expr, &mut out);
                }
            }
            SqlStatement::Delete(delete) => {
                table_columns(&delete.table, &mut out);
                if let Some(segment) = &delete.where_clause {
                    expression_columns(&segment.expr, &mut out);
                }
            }
            _ => {}
        },
    }
    out
}

fn select_columns<'s>(select: &'s SelectStatement, out: &mut Vec<&'s ColumnSegment>) {
    for item in &select.projections.items {
        match item {
            ProjectionSegment::Column { column, .. } => out.push(column),
            ProjectionSegment::Expression { expr, .. } => expression_columns(expr, out),
            _ => {}
        }
    }
    if let Some(from) = &select.from {
        table_columns(from, out);
    }
    if let Some(segment) = &select.where_clause {
        expression_columns(&segment.expr, out);
    }
    let items = select.group_by.iter().flat_map(|g| &g.items).chain(select.order_by.iter().flat_map(|o| &o.items));
    for item in items {
        if let OrderByItemSegment::Column { column, .. } = item {
            out.push(column);
        }
    }
    if let Some(segment) = &select.having {
        expression_columns(&segment.expr, out);
    }
}

fn table_columns<'s>(table: &'s TableSegment, out: &mut Vec<&'s ColumnSegment>) {
    match table {
        TableSegment::Simple(_) => {}
        TableSegment::Subquery(subquery) => select_columns(&subquery.select, out),
        TableSegment::Join(join) => {
            table_columns(&join.left, out);
            table_columns(&join.right, out);
            if let Some(condition) = &join.condition {
                expression_columns(condition, out);
            }
        }
    }
}

/// Columns of `expr`, including those of nested subqueries.
fn expression_columns<'s>(expr: &'s Expression, out: &mut Vec<&'s ColumnSegment>) {
    out.extend(expr.columns());
    subquery_columns(expr, out);
}

fn subquery_columns<'s>(expr: &'s Expression, out: &mut Vec<&'s ColumnSegment>) {
    match expr {
        Expression::Subquery { select, .. } => select_columns(select, out),
        Expression::Binary { left, right, .. } => {
            subquery_columns(left, out);
            subquery_columns(right, out);
        }
        Expression::In { list, .. } => list.iter().for_each(|e| subquery_columns(e, out)),
        _ => {}
    }
}
