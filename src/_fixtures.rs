use std::sync::{Arc, Mutex};

use serde_json::json;

use crate::{
    config::ShardingRuleConfiguration,
    executor::{ExecutionUnit, ShardExecutor, ShardRows},
    metadata::{ColumnMetaData, ShardingSchema, TableMetaData},
    route::ShardingRule,
    statement::{
        AggregationType, BinaryOperator, ColumnSegment, Expression, GroupBySegment, InsertColumnsSegment,
        InsertStatement, InsertValuesSegment, LimitSegment, OrderBySegment, OrderByItemSegment, OrderDirection,
        OwnerSegment, PaginationSegment, PaginationValueSegment, ProjectionSegment, ProjectionsSegment,
        SimpleTableSegment, SqlValue, TableSegment, WhereSegment,
    },
};

fn table(name: &str, columns: &[(&str, &str)]) -> TableMetaData {
    columns.iter().enumerate().fold(TableMetaData::new(name), |table, (i, (column, data_type))| {
        let column = ColumnMetaData::new(column, data_type);
        table.with_column(if i == 0 { column.primary_key() } else { column })
    })
}

pub fn order_schema() -> ShardingSchema {
    ShardingSchema::new()
        .with_table(table(
            "t_order",
            &[("order_id", "BIGINT"), ("user_id", "INT"), ("status", "VARCHAR"), ("amount", "DECIMAL")],
        ))
        .with_table(table(
            "t_order_item",
            &[("item_id", "BIGINT"), ("order_id", "BIGINT"), ("user_id", "INT"), ("price", "DECIMAL")],
        ))
        .with_table(table("t_user", &[("user_id", "INT"), ("name", "VARCHAR"), ("pwd", "VARCHAR")]))
        .with_table(table("t_product", &[("product_id", "BIGINT"), ("name", "VARCHAR")]))
        .with_table(table("t_config", &[("id", "INT"), ("config_key", "VARCHAR"), ("config_value", "VARCHAR")]))
        .with_table(table("t_single", &[("id", "INT"), ("note", "VARCHAR")]))
}

/// Two data sources; `t_order`/`t_order_item` bound and split by `user_id`
/// then `order_id`, `t_user` by database only, `t_product` by table only,
/// `t_config` broadcast, `t_single` on the default data source.
pub fn sharding_rule_config() -> ShardingRuleConfiguration {
    serde_json::from_value(json!({
        "data_sources": ["ds_0", "ds_1"],
        "tables": [
            {
                "logic_table": "t_order",
                "actual_data_nodes": "ds_${0..1}.t_order_${0..1}",
                "database_strategy": { "sharding_column": "user_id", "algorithm": { "type": "MOD", "sharding_count": 2 } },
                "table_strategy": {
                    "sharding_column": "order_id",
                    "algorithm": { "type": "INLINE", "algorithm_expression": "t_order_${order_id % 2}" }
                },
                "key_generate": { "column": "order_id", "generator": { "type": "INCREMENT", "start": 1 } }
            },
            {
                "logic_table": "t_order_item",
                "actual_data_nodes": "ds_${0..1}.t_order_item_${0..1}",
                "database_strategy": { "sharding_column": "user_id", "algorithm": { "type": "MOD", "sharding_count": 2 } },
                "table_strategy": { "sharding_column": "order_id", "algorithm": { "type": "MOD", "sharding_count": 2 } },
                "key_generate": { "column": "item_id", "generator": { "type": "SNOWFLAKE", "worker_id": 1 } }
            },
            {
                "logic_table": "t_user",
                "actual_data_nodes": "ds_${0..1}.t_user",
                "database_strategy": { "sharding_column": "user_id", "algorithm": { "type": "HASH_MOD", "sharding_count": 2 } }
            },
            {
                "logic_table": "t_product",
                "actual_data_nodes": "ds_${0..1}.t_product_${0..1}",
                "table_strategy": { "sharding_column": "product_id", "algorithm": { "type": "MOD", "sharding_count": 2 } }
            }
        ],
        "binding_tables": ["t_order, t_order_item"],
        "broadcast_tables": ["t_config"],
        "default_data_source": "ds_0"
    }))
    .expect("valid fixture configuration")
}

pub fn sharding_rule() -> ShardingRule {
    ShardingRule::new(&sharding_rule_config()).expect("valid fixture rule")
}

fn is_identifier(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Builds statement segments whose offsets point into `sql`, the way the
/// parser would hand them over.
pub struct SqlBuilder {
    sql: String,
}

impl SqlBuilder {
    pub fn new(sql: &str) -> Self {
        Self { sql: sql.to_string() }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Byte offset of the `nth` (0-based) standalone occurrence of `word`
    /// at or after `from`.
    fn find_word_from(&self, word: &str, nth: usize, from: usize) -> usize {
        self.sql[from..]
            .match_indices(word)
            .map(|(i, _)| i + from)
            .filter(|&i| {
                let before = self.sql[..i].chars().next_back();
                let after = self.sql[i + word.len()..].chars().next();
                let starts_inner = word.chars().next().is_some_and(is_identifier);
                let ends_inner = word.chars().next_back().is_some_and(is_identifier);
                !(starts_inner && before.is_some_and(is_identifier)) && !(ends_inner && after.is_some_and(is_identifier))
            })
            .nth(nth)
            .unwrap_or_else(|| panic!("'{word}' #{nth} not found in {}", self.sql))
    }

    fn find_word(&self, word: &str, nth: usize) -> usize {
        self.find_word_from(word, nth, 0)
    }

    fn keyword(&self, keyword: &str) -> usize {
        self.find_word(keyword, 0)
    }

    fn keyword_opt(&self, keyword: &str) -> Option<usize> {
        self.sql.find(keyword)
    }

    pub fn projections(&self, items: Vec<ProjectionSegment>) -> ProjectionsSegment {
        let mut start = self.keyword("SELECT") + "SELECT ".len();
        let distinct = self.sql[start..].starts_with("DISTINCT ");
        if distinct {
            start += "DISTINCT ".len();
        }
        let mut segment = ProjectionsSegment::new(start, items);
        if let Some(from) = self.sql[start..].find(" FROM").map(|i| i + start) {
            segment.stop = from - 1;
        }
        if distinct { segment.distinct() } else { segment }
    }

    pub fn shorthand(&self) -> ProjectionSegment {
        let start = self.find_word("*", 0);
        ProjectionSegment::Shorthand { start, stop: start, owner: None }
    }

    pub fn column(&self, name: &str, nth: usize) -> ColumnSegment {
        let start = self.find_word(name, nth);
        ColumnSegment::new(start, start + name.len() - 1, name)
    }

    pub fn qualified_column(&self, owner: &str, name: &str) -> ColumnSegment {
        let text = format!("{owner}.{name}");
        let start = self.find_word(&text, 0);
        ColumnSegment::new(start, start + text.len() - 1, name)
            .with_owner(OwnerSegment::new(start, start + owner.len() - 1, owner))
    }

    pub fn col(&self, name: &str, nth: usize) -> Expression {
        Expression::Column(self.column(name, nth))
    }

    pub fn qualified_col(&self, owner: &str, name: &str) -> Expression {
        Expression::Column(self.qualified_column(owner, name))
    }

    pub fn column_item(&self, name: &str) -> ProjectionSegment {
        ProjectionSegment::Column { column: self.column(name, 0), alias: None }
    }

    pub fn aliased_column(&self, name: &str, alias: &str) -> ProjectionSegment {
        ProjectionSegment::Column { column: self.column(name, 0), alias: Some(alias.to_string()) }
    }

    /// `text` is the whole call, e.g. `COUNT(*)`.
    pub fn aggregation(&self, kind: AggregationType, text: &str) -> ProjectionSegment {
        let start = self.find_word(text, 0);
        let open = text.find('(').unwrap_or(text.len());
        ProjectionSegment::Aggregation {
            start,
            stop: start + text.len() - 1,
            kind,
            inner_expression: text[open..].to_string(),
            alias: None,
        }
    }

    pub fn aliased_aggregation(&self, kind: AggregationType, text: &str, alias: &str) -> ProjectionSegment {
        match self.aggregation(kind, text) {
            ProjectionSegment::Aggregation { start, stop, kind, inner_expression, .. } => {
                ProjectionSegment::Aggregation { start, stop, kind, inner_expression, alias: Some(alias.to_string()) }
            }
            other => other,
        }
    }

    /// `COUNT(DISTINCT user_id)` with `distinct` = `user_id`.
    pub fn distinct_aggregation(&self, kind: AggregationType, text: &str, distinct: &str) -> ProjectionSegment {
        let start = self.find_word(text, 0);
        let open = text.find('(').unwrap_or(text.len());
        ProjectionSegment::AggregationDistinct {
            start,
            stop: start + text.len() - 1,
            kind,
            inner_expression: text[open..].to_string(),
            distinct_expression: distinct.to_string(),
            alias: None,
        }
    }

    /// Function call `text`, e.g. `AVG(amount)`, over already built `args`.
    pub fn function(&self, text: &str, args: Vec<Expression>) -> Expression {
        let start = self.find_word(text, 0);
        let name = text.split('(').next().unwrap_or(text).trim().to_string();
        Expression::Function { start, stop: start + text.len() - 1, name, args, text: text.to_string() }
    }

    pub fn expression_item(&self, expr: Expression) -> ProjectionSegment {
        let (start, stop) = (expr.start(), expr.stop());
        ProjectionSegment::Expression { start, stop, text: self.sql[start..=stop].to_string(), expr, alias: None }
    }

    pub fn simple_table(&self, name: &str) -> SimpleTableSegment {
        let start = self.find_word(name, 0);
        SimpleTableSegment::new(start, start + name.len() - 1, name)
    }

    pub fn table(&self, name: &str) -> TableSegment {
        TableSegment::Simple(self.simple_table(name))
    }

    pub fn aliased_table(&self, name: &str, alias: &str) -> TableSegment {
        TableSegment::Simple(self.simple_table(name).with_alias(alias))
    }

    /// `owner.name` in the text, the owner kept as a separate segment.
    pub fn owned_table(&self, owner: &str, name: &str) -> TableSegment {
        let text = format!("{owner}.{name}");
        let owner_start = self.find_word(&text, 0);
        let start = owner_start + owner.len() + 1;
        TableSegment::Simple(
            SimpleTableSegment::new(start, start + name.len() - 1, name)
                .with_owner(OwnerSegment::new(owner_start, owner_start + owner.len() - 1, owner)),
        )
    }

    pub fn order_item_nth(&self, name: &str, nth: usize, direction: OrderDirection) -> OrderByItemSegment {
        OrderByItemSegment::column(self.column(name, nth), direction)
    }

    pub fn group_by(&self, items: Vec<OrderByItemSegment>) -> GroupBySegment {
        let start = self.keyword("GROUP BY");
        let stop = items.iter().map(item_stop).max().unwrap_or(start + "GROUP BY".len() - 1);
        GroupBySegment { start, stop, items }
    }

    pub fn order_by(&self, items: Vec<OrderByItemSegment>) -> OrderBySegment {
        let start = self.keyword("ORDER BY");
        let stop = items.iter().map(item_stop).max().unwrap_or(start + "ORDER BY".len() - 1);
        OrderBySegment { start, stop, items }
    }

    /// The `nth` (0-based) `?`, bound to parameter `nth`.
    pub fn param(&self, nth: usize) -> Expression {
        let start = self
            .sql
            .match_indices('?')
            .nth(nth)
            .map(|(i, _)| i)
            .unwrap_or_else(|| panic!("placeholder #{nth} not found in {}", self.sql));
        Expression::Parameter { start, stop: start, index: nth }
    }

    pub fn int(&self, text: &str, nth: usize) -> Expression {
        let start = self.find_word(text, nth);
        let value = text.parse::<i64>().unwrap_or_else(|_| panic!("'{text}' is not an integer"));
        Expression::Literal { start, stop: start + text.len() - 1, value: SqlValue::Int(value) }
    }

    /// `quoted` includes its quotes, `'PAID'`.
    pub fn text_literal(&self, quoted: &str) -> Expression {
        let start = self.sql.find(quoted).unwrap_or_else(|| panic!("{quoted} not found in {}", self.sql));
        let value = quoted.trim_matches('\'').replace("''", "'");
        Expression::Literal { start, stop: start + quoted.len() - 1, value: SqlValue::Text(value) }
    }

    pub fn cmp(&self, left: Expression, operator: BinaryOperator, right: Expression) -> Expression {
        Expression::binary(left, operator, right)
    }

    pub fn eq(&self, left: Expression, right: Expression) -> Expression {
        Expression::binary(left, BinaryOperator::Eq, right)
    }

    pub fn and(&self, left: Expression, right: Expression) -> Expression {
        Expression::binary(left, BinaryOperator::And, right)
    }

    pub fn or(&self, left: Expression, right: Expression) -> Expression {
        Expression::binary(left, BinaryOperator::Or, right)
    }

    pub fn in_list(&self, left: Expression, list: Vec<Expression>) -> Expression {
        let last = list.last().map(Expression::stop).unwrap_or_else(|| left.stop());
        let stop = self.sql[last..].find(')').map(|i| i + last).unwrap_or(last);
        Expression::In { start: left.start(), stop, left: Box::new(left), list, not: false }
    }

    pub fn between(&self, left: Expression, low: Expression, high: Expression) -> Expression {
        Expression::Between {
            start: left.start(),
            stop: high.stop(),
            left: Box::new(left),
            low: Box::new(low),
            high: Box::new(high),
            not: false,
        }
    }

    pub fn where_clause(&self, expr: Expression) -> WhereSegment {
        WhereSegment { start: self.keyword("WHERE"), stop: expr.stop(), expr }
    }

    /// `LIMIT ?, ?` with the offset bound to `offset` and the row count to
    /// `row_count`.
    pub fn limit_params(&self, offset: usize, row_count: usize) -> PaginationSegment {
        let parameter = |nth: usize| match self.param(nth) {
            Expression::Parameter { start, stop, index } => PaginationValueSegment::Parameter { start, stop, index },
            _ => unreachable!(),
        };
        let offset = parameter(offset);
        let row_count = parameter(row_count);
        PaginationSegment::Limit(LimitSegment {
            start: self.keyword("LIMIT"),
            stop: offset.stop().max(row_count.stop()),
            offset: Some(offset),
            row_count: Some(row_count),
        })
    }

    /// Literal `LIMIT [offset,] row_count` (or `LIMIT row_count OFFSET offset`).
    pub fn limit(&self, offset: Option<u64>, row_count: u64) -> PaginationSegment {
        let start = self.keyword("LIMIT");
        let literal = |value: u64| {
            let text = value.to_string();
            let at = self.find_word_from(&text, 0, start);
            PaginationValueSegment::Literal { start: at, stop: at + text.len() - 1, value }
        };
        let row_count_segment = literal(row_count);
        let offset_segment = offset.map(|o| match self.keyword_opt("OFFSET") {
            Some(keyword) => {
                let text = o.to_string();
                let at = self.find_word_from(&text, 0, keyword);
                PaginationValueSegment::Literal { start: at, stop: at + text.len() - 1, value: o }
            }
            None => literal(o),
        });
        let stop = offset_segment.as_ref().map(|o| o.stop()).unwrap_or(0).max(row_count_segment.stop());
        PaginationSegment::Limit(LimitSegment { start, stop, offset: offset_segment, row_count: Some(row_count_segment) })
    }

    /// INSERT with an explicit column list (omitted when `columns` is empty)
    /// and one VALUES group per row.
    pub fn insert(&self, table: &str, columns: &[&str], rows: Vec<Vec<Expression>>) -> InsertStatement {
        let table = self.simple_table(table);
        let columns = (!columns.is_empty()).then(|| {
            let open = self.sql[table.stop..].find('(').map(|i| i + table.stop).unwrap_or(table.stop);
            let close = self.sql[open..].find(')').map(|i| i + open).unwrap_or(open);
            let segments = columns
                .iter()
                .map(|c| {
                    let start = self.find_word_from(c, 0, open);
                    ColumnSegment::new(start, start + c.len() - 1, c)
                })
                .collect();
            InsertColumnsSegment { start: open, stop: close, columns: segments }
        });

        let mut cursor = self.keyword("VALUES");
        let mut values = Vec::with_capacity(rows.len());
        for row in rows {
            let start = self.sql[cursor..].find('(').map(|i| i + cursor).unwrap_or(cursor);
            let stop = matching_paren(&self.sql, start);
            values.push(InsertValuesSegment { start, stop, values: row });
            cursor = stop + 1;
        }
        InsertStatement { table, columns, values }
    }
}

fn item_stop(item: &OrderByItemSegment) -> usize {
    match item {
        OrderByItemSegment::Column { column, .. } => column.stop,
        OrderByItemSegment::Index { stop, .. } | OrderByItemSegment::Expression { stop, .. } => *stop,
    }
}

fn matching_paren(sql: &str, open: usize) -> usize {
    let mut depth = 0usize;
    let mut in_quote = false;
    for (i, c) in sql[open..].char_indices() {
        match c {
            '\'' => in_quote = !in_quote,
            '(' if !in_quote => depth += 1,
            ')' if !in_quote => {
                depth -= 1;
                if depth == 0 {
                    return open + i;
                }
            }
            _ => {}
        }
    }
    sql.len() - 1
}

/// Shard executor answering from canned rows and recording what it ran.
#[derive(Clone)]
pub struct RecordingShardExecutor {
    tables: Vec<(String, String, usize, Vec<Vec<SqlValue>>)>,
    failing: Vec<String>,
    update_count: u64,
    executed: Arc<Mutex<Vec<ExecutionUnit>>>,
}

impl RecordingShardExecutor {
    pub fn new() -> Self {
        Self { tables: Vec::new(), failing: Vec::new(), update_count: 1, executed: Arc::default() }
    }

    /// Rows returned by queries on `data_source` that mention `table`.
    pub fn with_rows(mut self, data_source: &str, table: &str, column_count: usize, rows: Vec<Vec<SqlValue>>) -> Self {
        self.tables.push((data_source.to_string(), table.to_string(), column_count, rows));
        self
    }

    pub fn failing(mut self, data_source: &str) -> Self {
        self.failing.push(data_source.to_string());
        self
    }

    pub fn with_update_count(mut self, count: u64) -> Self {
        self.update_count = count;
        self
    }

    pub fn executed(&self) -> Vec<ExecutionUnit> {
        self.executed.lock().unwrap().clone()
    }

    fn record(&self, unit: &ExecutionUnit) -> Result<(), String> {
        self.executed.lock().unwrap().push(unit.clone());
        if self.failing.contains(&unit.data_source) {
            return Err(format!("data source {} is down", unit.data_source));
        }
        Ok(())
    }
}

impl ShardExecutor for RecordingShardExecutor {
    fn query(&self, unit: &ExecutionUnit) -> Result<ShardRows, String> {
        self.record(unit)?;
        let mentions = |table: &str| unit.sql.split(|c: char| !is_identifier(c)).any(|word| word == table);
        Ok(self
            .tables
            .iter()
            .find(|(data_source, table, _, _)| *data_source == unit.data_source && mentions(table))
            .map(|(_, _, columns, rows)| ShardRows::from_rows(*columns, rows.clone()))
            .unwrap_or_else(|| ShardRows::from_rows(0, Vec::new())))
    }

    fn update(&self, unit: &ExecutionUnit) -> Result<u64, String> {
        self.record(unit)?;
        Ok(self.update_count)
    }
}
