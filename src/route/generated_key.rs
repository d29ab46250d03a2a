use tracing::debug;

use crate::{
    binder::InsertStatementContext,
    route::ShardingRule,
    statement::{Expression, SqlValue},
};

/// Key column of an INSERT and the value each row carries for it.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedKeyContext {
    pub column_name: String,
    /// The statement omitted the column and the values were allocated here.
    pub generated: bool,
    /// Parameter holding each row's key when the row binds it with `?`.
    pub parameter_indexes: Vec<Option<usize>>,
    pub values: Vec<SqlValue>,
}

impl GeneratedKeyContext {
    /// `None` when the table has no key generator, or when the INSERT has no
    /// explicit column list and the catalog does not know the key column.
    pub fn create(insert: &InsertStatementContext, rule: &ShardingRule, params: &[SqlValue]) -> Option<Self> {
        let table_rule = rule.find_table_rule(insert.table_name())?;
        let key = table_rule.key_generate.as_ref()?;

        if let Some(column_index) = insert.column_index(&key.column) {
            let values = insert.values.iter().map(|row| row.value(column_index, params).unwrap_or_default()).collect();
            let parameter_indexes = insert
                .values
                .iter()
                .map(|row| match row.values.get(column_index) {
                    Some(Expression::Parameter { index, .. }) => Some(*index),
                    _ => None,
                })
                .collect();
            return Some(Self { column_name: key.column.clone(), generated: false, parameter_indexes, values });
        }
        insert.statement.columns.as_ref()?;

        let values = key.generator.generate_keys(insert.values.len());
        debug!(table = insert.table_name(), column = key.column.as_str(), keys = values.len(), "generated keys");
        Some(Self {
            column_name: key.column.clone(),
            generated: true,
            parameter_indexes: vec![None; values.len()],
            values,
        })
    }
}
