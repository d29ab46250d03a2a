use std::ops::Bound;

use indexmap::IndexMap;
use tracing::debug;

use crate::{
    binder::{InsertStatementContext, SqlStatementContext, TablesContext},
    metadata::SchemaMetaData,
    route::{
        GeneratedKeyContext, RoutingError, ShardingCondition, ShardingConditionValue, ShardingConditions,
        ShardingRule, ShardingValues, ValueRange,
    },
    statement::{BinaryOperator, ColumnSegment, Expression, SqlValue},
};

/// Extracts sharding values from WHERE clauses and INSERT rows.
pub struct ShardingConditionEngine<'a> {
    rule: &'a ShardingRule,
    schema: &'a dyn SchemaMetaData,
}

enum Branch {
    Values(Vec<ShardingConditionValue>),
    AlwaysFalse,
}

impl<'a> ShardingConditionEngine<'a> {
    pub fn new(rule: &'a ShardingRule, schema: &'a dyn SchemaMetaData) -> Self {
        Self { rule, schema }
    }

    pub fn create(
        &self,
        context: &SqlStatementContext,
        params: &[SqlValue],
        generated_key: Option<&GeneratedKeyContext>,
    ) -> Result<ShardingConditions, RoutingError> {
        let conditions = match context {
            SqlStatementContext::Insert(insert) => self.create_for_insert(insert, params, generated_key)?,
            _ => self.create_for_where(context, params)?,
        };
        debug!(
            conditions = conditions.conditions.len(),
            always_false = conditions.always_false,
            "sharding conditions built"
        );
        Ok(conditions)
    }

    fn create_for_insert(
        &self,
        insert: &InsertStatementContext,
        params: &[SqlValue],
        generated_key: Option<&GeneratedKeyContext>,
    ) -> Result<ShardingConditions, RoutingError> {
        let table = insert.table_name();
        let mut conditions = Vec::with_capacity(insert.values.len());
        for (row_index, row) in insert.values.iter().enumerate() {
            let mut values = Vec::new();
            for (column_index, column) in insert.column_names.iter().enumerate() {
                if !self.rule.is_sharding_column(column, table) {
                    continue;
                }
                if let Some(Expression::Parameter { index, .. }) = row.values.get(column_index) {
                    if *index >= params.len() {
                        return Err(RoutingError::ParameterOutOfRange { index: *index });
                    }
                }
                if let Some(value) = row.value(column_index, params) {
                    values.push(ShardingConditionValue::new(table, column.as_str(), ShardingValues::List(vec![value])));
                }
            }
            if let Some(key) = generated_key.filter(|k| k.generated) {
                if self.rule.is_sharding_column(&key.column_name, table) {
                    if let Some(value) = key.values.get(row_index) {
                        values.push(ShardingConditionValue::new(
                            table,
                            key.column_name.as_str(),
                            ShardingValues::List(vec![value.clone()]),
                        ));
                    }
                }
            }
            conditions.push(ShardingCondition { values, row_index: Some(row_index) });
        }
        Ok(ShardingConditions { conditions, always_false: false })
    }

    fn create_for_where(
        &self,
        context: &SqlStatementContext,
        params: &[SqlValue],
    ) -> Result<ShardingConditions, RoutingError> {
        let mut conditions = Vec::new();
        let mut branches_seen = 0usize;
        let mut false_branches = 0usize;
        for (expr, tables) in context.where_scopes() {
            let mut scope_conditions = Vec::new();
            let mut unrestricted = false;
            for branch in split(expr, &BinaryOperator::Or) {
                branches_seen += 1;
                match self.create_branch(branch, tables, params)? {
                    Branch::AlwaysFalse => false_branches += 1,
                    Branch::Values(values) if values.is_empty() => unrestricted = true,
                    Branch::Values(values) => scope_conditions.push(ShardingCondition { values, row_index: None }),
                }
            }
            // One branch without sharding values leaves the whole scope unrestricted.
            if !unrestricted {
                conditions.extend(scope_conditions);
            }
        }
        let always_false = branches_seen > 0 && false_branches == branches_seen;
        Ok(ShardingConditions { conditions, always_false })
    }

    fn create_branch(
        &self,
        branch: &Expression,
        tables: &TablesContext,
        params: &[SqlValue],
    ) -> Result<Branch, RoutingError> {
        let predicates = split(branch, &BinaryOperator::And);
        let columns: Vec<&ColumnSegment> = predicates.iter().flat_map(|p| p.columns()).collect();
        let owners = tables.find_table_names_by_column(&columns, self.schema);

        let mut merged: IndexMap<(String, String), ShardingValues> = IndexMap::new();
        for predicate in predicates {
            let Some((column, values)) = extract(predicate, params)? else { continue };
            let Some(table) = owners.get(&column.expression()) else { continue };
            if !self.rule.is_sharding_column(&column.name, table) {
                continue;
            }
            let key = (table.clone(), column.name.to_lowercase());
            let combined = match merged.get(&key) {
                Some(existing) => existing.intersect(&values),
                None => values,
            };
            if combined.is_empty() {
                return Ok(Branch::AlwaysFalse);
            }
            merged.insert(key, combined);
        }
        Ok(Branch::Values(
            merged
                .into_iter()
                .map(|((table, column), values)| ShardingConditionValue::new(table, column, values))
                .collect(),
        ))
    }
}

/// Flattens nested `operator` chains: `a OR (b OR c)` gives `[a, b, c]`.
fn split<'e>(expr: &'e Expression, operator: &BinaryOperator) -> Vec<&'e Expression> {
    match expr {
        Expression::Binary { left, operator: op, right, .. } if op == operator => {
            let mut parts = split(left, operator);
            parts.extend(split(right, operator));
            parts
        }
        other => vec![other],
    }
}

fn operand_value(expr: &Expression, params: &[SqlValue]) -> Result<Option<SqlValue>, RoutingError> {
    match expr {
        Expression::Literal { value, .. } => Ok(Some(value.clone())),
        Expression::Parameter { index, .. } => {
            params.get(*index).cloned().map(Some).ok_or(RoutingError::ParameterOutOfRange { index: *index })
        }
        _ => Ok(None),
    }
}

/// Column and values of one sharding predicate; `None` for predicates
/// that cannot narrow the route.
fn extract<'e>(
    predicate: &'e Expression,
    params: &[SqlValue],
) -> Result<Option<(&'e ColumnSegment, ShardingValues)>, RoutingError> {
    let non_null = |v: Option<SqlValue>| v.filter(|v| !v.is_null());
    match predicate {
        Expression::Binary { left, operator, right, .. } => {
            let (column, value_expr, operator) = match (left.as_ref(), right.as_ref()) {
                (Expression::Column(column), value) => (column, value, operator.clone()),
                (value, Expression::Column(column)) => (column, value, operator.flipped()),
                _ => return Ok(None),
            };
            let Some(value) = non_null(operand_value(value_expr, params)?) else { return Ok(None) };
            let values = match operator {
                BinaryOperator::Eq => ShardingValues::List(vec![value]),
                BinaryOperator::Lt => ShardingValues::Range(ValueRange::new(Bound::Unbounded, Bound::Excluded(value))),
                BinaryOperator::LtEq => ShardingValues::Range(ValueRange::new(Bound::Unbounded, Bound::Included(value))),
                BinaryOperator::Gt => ShardingValues::Range(ValueRange::new(Bound::Excluded(value), Bound::Unbounded)),
                BinaryOperator::GtEq => ShardingValues::Range(ValueRange::new(Bound::Included(value), Bound::Unbounded)),
                _ => return Ok(None),
            };
            Ok(Some((column, values)))
        }
        Expression::In { left, list, not: false, .. } => {
            let Expression::Column(column) = left.as_ref() else { return Ok(None) };
            let mut values = Vec::with_capacity(list.len());
            for item in list {
                match operand_value(item, params)? {
                    Some(value) if !value.is_null() => values.push(value),
                    Some(_) => {}
                    None => return Ok(None),
                }
            }
            Ok(Some((column, ShardingValues::List(values))))
        }
        Expression::Between { left, low, high, not: false, .. } => {
            let Expression::Column(column) = left.as_ref() else { return Ok(None) };
            let (Some(low), Some(high)) = (non_null(operand_value(low, params)?), non_null(operand_value(high, params)?))
            else {
                return Ok(None);
            };
            Ok(Some((column, ShardingValues::Range(ValueRange::closed(low, high)))))
        }
        _ => Ok(None),
    }
}
