use tracing::debug;

use crate::{
    binder::SqlStatementContext,
    metadata::SchemaMetaData,
    rewrite::{EncryptRule, ParameterBuilder, RewriteError, SqlToken, SqlTokenGenerator},
    route::{RouteContext, RouteUnit, ShardingRule},
    statement::SqlValue,
};

/// Logical SQL with everything needed to produce per-unit SQL.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlRewriteContext {
    pub sql: String,
    pub tokens: Vec<SqlToken>,
    pub parameter_builder: ParameterBuilder,
}

impl SqlRewriteContext {
    pub fn new(
        sql: &str,
        context: &SqlStatementContext,
        route: &RouteContext,
        params: &[SqlValue],
        rule: &ShardingRule,
        encrypt: &EncryptRule,
        schema: &dyn SchemaMetaData,
    ) -> Result<Self, RewriteError> {
        let mut parameter_builder = match context {
            SqlStatementContext::Insert(insert) => {
                ParameterBuilder::grouped(insert, params, route.generated_key.as_ref())
            }
            _ => ParameterBuilder::standard(params),
        };
        let mut tokens = SqlTokenGenerator::new(rule, encrypt, schema).generate(
            sql,
            context,
            route,
            params,
            &mut parameter_builder,
        )?;
        // ties keep generation order
        tokens.sort_by_key(|token| token.start);
        validate(sql, &tokens)?;
        debug!(tokens = tokens.len(), "sql tokens generated");
        Ok(Self { sql: sql.to_string(), tokens, parameter_builder })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlRewriteResult {
    pub sql: String,
    pub parameters: Vec<SqlValue>,
}

pub struct SqlRewriteEngine;

impl SqlRewriteEngine {
    /// SQL and parameters `unit` executes.
    pub fn rewrite(
        context: &SqlRewriteContext,
        unit: &RouteUnit,
        route: &RouteContext,
    ) -> Result<SqlRewriteResult, RewriteError> {
        Ok(SqlRewriteResult {
            sql: Self::apply_tokens(&context.sql, &context.tokens, unit, route)?,
            parameters: context.parameter_builder.parameters_for(unit, route),
        })
    }

    /// Splices `tokens` into `sql`. Tokens must be sorted by start.
    pub fn apply_tokens(
        sql: &str,
        tokens: &[SqlToken],
        unit: &RouteUnit,
        route: &RouteContext,
    ) -> Result<String, RewriteError> {
        validate(sql, tokens)?;
        let mut out = String::with_capacity(sql.len() + tokens.len() * 8);
        let mut cursor = 0;
        for token in tokens {
            out.push_str(&sql[cursor..token.start]);
            out.push_str(&token.text(unit, route));
            cursor = token.end;
        }
        out.push_str(&sql[cursor..]);
        Ok(out)
    }
}

fn validate(sql: &str, tokens: &[SqlToken]) -> Result<(), RewriteError> {
    let mut previous: Option<&SqlToken> = None;
    for token in tokens {
        if token.start > token.end
            || token.end > sql.len()
            || !sql.is_char_boundary(token.start)
            || !sql.is_char_boundary(token.end)
        {
            return Err(RewriteError::TokenOutOfBounds { start: token.start, end: token.end, length: sql.len() });
        }
        if let Some(prev) = previous
            && token.start < prev.end
        {
            return Err(RewriteError::OverlappingTokens {
                first: (prev.start, prev.end),
                second: (token.start, token.end),
            });
        }
        previous = Some(token);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        _fixtures::{SqlBuilder, order_schema, sharding_rule},
        binder::StatementBinder,
        config::{ConfigurationProps, EncryptColumnConfiguration},
        rewrite::{Encryptor, TokenKind},
        route::{ConnectionSession, RouteMapper, ShardingRouter},
        statement::{AggregationType, OrderDirection, SelectStatement, SqlStatement},
    };

    #[derive(Debug)]
    struct Reverse;

    impl Encryptor for Reverse {
        fn encrypt(&self, plain: &SqlValue) -> Result<SqlValue, String> {
            match plain {
                SqlValue::Text(text) => Ok(SqlValue::Text(text.chars().rev().collect())),
                other => Err(format!("cannot encrypt {other:?}")),
            }
        }
    }

    fn rewrite_with(
        b: &SqlBuilder,
        statement: SqlStatement,
        params: &[SqlValue],
        encrypt: &EncryptRule,
    ) -> Vec<(String, SqlRewriteResult)> {
        let schema = order_schema();
        let rule = sharding_rule();
        let props = ConfigurationProps::default();
        let context = StatementBinder::new(&schema).bind(&statement, params).expect("bound");
        let route = ShardingRouter::new(&rule, &schema, &props)
            .route(&context, params, &ConnectionSession::new())
            .expect("routed");
        let rewrite = SqlRewriteContext::new(b.sql(), &context, &route, params, &rule, encrypt, &schema)
            .expect("rewrite context");
        route
            .units
            .iter()
            .map(|unit| (unit.to_string(), SqlRewriteEngine::rewrite(&rewrite, unit, &route).expect("rewritten")))
            .collect()
    }

    fn rewrite(b: &SqlBuilder, statement: SqlStatement, params: &[SqlValue]) -> Vec<(String, SqlRewriteResult)> {
        rewrite_with(b, statement, params, &EncryptRule::default())
    }

    #[test]
    fn unsharded_table_is_left_untouched() {
        let b = SqlBuilder::new("SELECT * FROM t_single WHERE id = 1");
        let select = SelectStatement::new(b.projections(vec![b.shorthand()]))
            .from(b.table("t_single"))
            .where_clause(b.where_clause(b.eq(b.col("id", 0), b.int("1", 0))));
        let results = rewrite(&b, SqlStatement::Select(select), &[]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].1.sql, b.sql());
    }

    #[test]
    fn table_names_become_actual_tables() {
        let b = SqlBuilder::new("SELECT * FROM t_order WHERE user_id = ? AND order_id = ?");
        let filter = b.and(b.eq(b.col("user_id", 0), b.param(0)), b.eq(b.col("order_id", 0), b.param(1)));
        let select = SelectStatement::new(b.projections(vec![b.shorthand()]))
            .from(b.table("t_order"))
            .where_clause(b.where_clause(filter));
        let params = [SqlValue::Int(3), SqlValue::Int(10)];
        let results = rewrite(&b, SqlStatement::Select(select), &params);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, "ds_1[t_order_0]");
        assert_eq!(results[0].1.sql, "SELECT * FROM t_order_0 WHERE user_id = ? AND order_id = ?");
        assert_eq!(results[0].1.parameters, params.to_vec());
    }

    #[test]
    fn schema_qualifier_is_dropped() {
        let b = SqlBuilder::new("SELECT * FROM logic_db.t_order WHERE user_id = 2 AND order_id = 3");
        let filter = b.and(b.eq(b.col("user_id", 0), b.int("2", 0)), b.eq(b.col("order_id", 0), b.int("3", 0)));
        let select = SelectStatement::new(b.projections(vec![b.shorthand()]))
            .from(b.owned_table("logic_db", "t_order"))
            .where_clause(b.where_clause(filter));
        let results = rewrite(&b, SqlStatement::Select(select), &[]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].1.sql, "SELECT * FROM t_order_1 WHERE user_id = 2 AND order_id = 3");
    }

    #[test]
    fn literal_pagination_is_widened_on_every_shard() {
        let b = SqlBuilder::new("SELECT order_id, user_id FROM t_order ORDER BY order_id LIMIT 2, 3");
        let select = SelectStatement::new(b.projections(vec![b.column_item("order_id"), b.column_item("user_id")]))
            .from(b.table("t_order"))
            .order_by(b.order_by(vec![b.order_item_nth("order_id", 1, OrderDirection::Asc)]))
            .pagination(b.limit(Some(2), 3));
        let results = rewrite(&b, SqlStatement::Select(select), &[]);
        assert_eq!(results.len(), 4);
        assert_eq!(results[0].1.sql, "SELECT order_id, user_id FROM t_order_0 ORDER BY order_id LIMIT 0, 5");
        assert_eq!(results[3].1.sql, "SELECT order_id, user_id FROM t_order_1 ORDER BY order_id LIMIT 0, 5");
    }

    #[test]
    fn parameter_pagination_is_revised_in_parameters() {
        let b = SqlBuilder::new("SELECT order_id FROM t_order ORDER BY order_id LIMIT ?, ?");
        let select = SelectStatement::new(b.projections(vec![b.column_item("order_id")]))
            .from(b.table("t_order"))
            .order_by(b.order_by(vec![b.order_item_nth("order_id", 1, OrderDirection::Asc)]))
            .pagination(b.limit_params(0, 1));
        let results = rewrite(&b, SqlStatement::Select(select), &[SqlValue::Int(5), SqlValue::Int(10)]);
        assert_eq!(results.len(), 4);
        for (_, result) in &results {
            assert!(result.sql.ends_with("LIMIT ?, ?"));
            assert_eq!(result.parameters, vec![SqlValue::Int(0), SqlValue::Int(15)]);
        }
    }

    #[test]
    fn average_and_group_by_get_derived_columns_and_ordering() {
        let b = SqlBuilder::new("SELECT user_id, AVG(amount) FROM t_order GROUP BY user_id");
        let select = SelectStatement::new(
            b.projections(vec![b.column_item("user_id"), b.aggregation(AggregationType::Avg, "AVG(amount)")]),
        )
        .from(b.table("t_order"))
        .group_by(b.group_by(vec![b.order_item_nth("user_id", 1, OrderDirection::Asc)]));
        let results = rewrite(&b, SqlStatement::Select(select), &[]);
        assert_eq!(results.len(), 4);
        assert_eq!(
            results[0].1.sql,
            "SELECT user_id, AVG(amount), COUNT(amount) AS AVG_DERIVED_COUNT_0, SUM(amount) AS AVG_DERIVED_SUM_0 \
             FROM t_order_0 GROUP BY user_id ORDER BY user_id ASC"
        );
    }

    #[test]
    fn distinct_aggregations_read_distinct_values_from_every_shard() {
        let b = SqlBuilder::new("SELECT COUNT(DISTINCT user_id) FROM t_order");
        let select = SelectStatement::new(b.projections(vec![b.distinct_aggregation(
            AggregationType::Count,
            "COUNT(DISTINCT user_id)",
            "user_id",
        )]))
        .from(b.table("t_order"));
        let results = rewrite(&b, SqlStatement::Select(select), &[]);
        assert_eq!(results.len(), 4);
        assert_eq!(results[0].1.sql, "SELECT DISTINCT user_id FROM t_order_0");

        let b = SqlBuilder::new("SELECT AVG(DISTINCT amount) FROM t_order");
        let select = SelectStatement::new(b.projections(vec![b.distinct_aggregation(
            AggregationType::Avg,
            "AVG(DISTINCT amount)",
            "amount",
        )]))
        .from(b.table("t_order"));
        let results = rewrite(&b, SqlStatement::Select(select), &[]);
        assert_eq!(
            results[0].1.sql,
            "SELECT DISTINCT amount, amount AS AVG_DERIVED_COUNT_0, amount AS AVG_DERIVED_SUM_0 FROM t_order_0"
        );
    }

    #[test]
    fn distinct_aggregation_next_to_others_joins_the_group_by() {
        let b = SqlBuilder::new("SELECT COUNT(*), COUNT(DISTINCT user_id) FROM t_order");
        let select = SelectStatement::new(b.projections(vec![
            b.aggregation(AggregationType::Count, "COUNT(*)"),
            b.distinct_aggregation(AggregationType::Count, "COUNT(DISTINCT user_id)", "user_id"),
        ]))
        .from(b.table("t_order"));
        let results = rewrite(&b, SqlStatement::Select(select), &[]);
        assert_eq!(results[0].1.sql, "SELECT COUNT(*), user_id FROM t_order_0 GROUP BY user_id");

        let b = SqlBuilder::new("SELECT user_id, COUNT(DISTINCT status) FROM t_order GROUP BY user_id");
        let select = SelectStatement::new(b.projections(vec![
            b.column_item("user_id"),
            b.distinct_aggregation(AggregationType::Count, "COUNT(DISTINCT status)", "status"),
        ]))
        .from(b.table("t_order"))
        .group_by(b.group_by(vec![b.order_item_nth("user_id", 1, OrderDirection::Asc)]));
        let results = rewrite(&b, SqlStatement::Select(select), &[]);
        assert_eq!(
            results[0].1.sql,
            "SELECT user_id, status FROM t_order_0 GROUP BY user_id, status ORDER BY user_id ASC"
        );
    }

    #[test]
    fn distinct_aggregation_on_one_shard_is_left_as_written() {
        let b = SqlBuilder::new("SELECT COUNT(DISTINCT status) FROM t_order WHERE user_id = 2 AND order_id = 3");
        let filter = b.and(b.eq(b.col("user_id", 0), b.int("2", 0)), b.eq(b.col("order_id", 0), b.int("3", 0)));
        let select = SelectStatement::new(b.projections(vec![b.distinct_aggregation(
            AggregationType::Count,
            "COUNT(DISTINCT status)",
            "status",
        )]))
        .from(b.table("t_order"))
        .where_clause(b.where_clause(filter));
        let results = rewrite(&b, SqlStatement::Select(select), &[]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].1.sql, "SELECT COUNT(DISTINCT status) FROM t_order_1 WHERE user_id = 2 AND order_id = 3");
    }

    #[test]
    fn insert_rows_are_split_with_generated_keys() {
        let b = SqlBuilder::new("INSERT INTO t_order (user_id, status) VALUES (?, ?), (?, ?)");
        let insert = b.insert("t_order", &["user_id", "status"], vec![vec![b.param(0), b.param(1)], vec![b.param(2), b.param(3)]]);
        let params = [SqlValue::Int(1), SqlValue::text("A"), SqlValue::Int(2), SqlValue::text("B")];
        let results = rewrite(&b, SqlStatement::Insert(insert), &params);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "ds_0[t_order_0]");
        assert_eq!(results[0].1.sql, "INSERT INTO t_order_0 (user_id, status, order_id) VALUES (?, ?, ?)");
        assert_eq!(results[0].1.parameters, vec![SqlValue::Int(2), SqlValue::text("B"), SqlValue::Int(2)]);
        assert_eq!(results[1].0, "ds_1[t_order_1]");
        assert_eq!(results[1].1.sql, "INSERT INTO t_order_1 (user_id, status, order_id) VALUES (?, ?, ?)");
        assert_eq!(results[1].1.parameters, vec![SqlValue::Int(1), SqlValue::text("A"), SqlValue::Int(1)]);
    }

    #[test]
    fn literal_insert_gets_literal_generated_key() {
        let b = SqlBuilder::new("INSERT INTO t_order (user_id, status) VALUES (1, 'A')");
        let insert = b.insert("t_order", &["user_id", "status"], vec![vec![b.int("1", 0), b.text_literal("'A'")]]);
        let results = rewrite(&b, SqlStatement::Insert(insert), &[]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].1.sql, "INSERT INTO t_order_1 (user_id, status, order_id) VALUES (1, 'A', 1)");
        assert!(results[0].1.parameters.is_empty());
    }

    #[test]
    fn encrypted_columns_compare_cipher_values() {
        let encrypt = EncryptRule::new(vec![EncryptColumnConfiguration {
            table: "t_user".into(),
            column: "pwd".into(),
            cipher_column: "pwd_cipher".into(),
            encryptor: "reverse".into(),
        }])
        .with_encryptor("reverse", Arc::new(Reverse));

        let b = SqlBuilder::new("SELECT * FROM t_user WHERE pwd = 'secret' OR pwd = ?");
        let filter = b.or(b.eq(b.col("pwd", 0), b.text_literal("'secret'")), b.eq(b.col("pwd", 1), b.param(0)));
        let select = SelectStatement::new(b.projections(vec![b.shorthand()]))
            .from(b.table("t_user"))
            .where_clause(b.where_clause(filter));
        let results = rewrite_with(&b, SqlStatement::Select(select), &[SqlValue::text("abc")], &encrypt);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].1.sql, "SELECT * FROM t_user WHERE pwd_cipher = 'terces' OR pwd_cipher = ?");
        assert_eq!(results[0].1.parameters, vec![SqlValue::text("cba")]);
    }

    #[test]
    fn overlapping_tokens_are_rejected() {
        let unit = RouteUnit::new("ds_0", vec![RouteMapper::new("t_order", "t_order_0")]);
        let tokens = vec![
            SqlToken::replace(0, 5, TokenKind::Remove),
            SqlToken::replace(3, 6, TokenKind::Remove),
        ];
        let err = SqlRewriteEngine::apply_tokens("abcdefgh", &tokens, &unit, &RouteContext::default()).unwrap_err();
        assert_eq!(err, RewriteError::OverlappingTokens { first: (0, 5), second: (3, 6) });

        let beyond = vec![SqlToken::insert(20, TokenKind::Remove)];
        let err = SqlRewriteEngine::apply_tokens("abc", &beyond, &unit, &RouteContext::default()).unwrap_err();
        assert_eq!(err, RewriteError::TokenOutOfBounds { start: 20, end: 20, length: 3 });
    }

    #[test]
    fn insertions_at_one_position_keep_their_order() {
        let unit = RouteUnit::new("ds_0", vec![]);
        let tokens = vec![
            SqlToken::insert(3, TokenKind::EncryptValue { literal: "X".into() }),
            SqlToken::insert(3, TokenKind::EncryptValue { literal: "Y".into() }),
        ];
        let sql = SqlRewriteEngine::apply_tokens("abcdef", &tokens, &unit, &RouteContext::default()).expect("applied");
        assert_eq!(sql, "abcXYdef");
    }

    #[test]
    fn no_tokens_leaves_sql_as_written() {
        let sql = "SELECT o.order_id, i.item_id FROM t_order o JOIN t_order_item i ON o.order_id = i.order_id";
        let units = [
            RouteUnit::new("ds_0", vec![]),
            RouteUnit::new("ds_1", vec![RouteMapper::new("t_order", "t_order_1")]),
            RouteUnit::new(
                "ds_0",
                vec![RouteMapper::new("t_order", "t_order_0"), RouteMapper::new("t_order_item", "t_order_item_0")],
            ),
        ];
        for unit in &units {
            let rewritten = SqlRewriteEngine::apply_tokens(sql, &[], unit, &RouteContext::default()).expect("applied");
            assert_eq!(rewritten, sql, "{unit}");
        }
    }
}
