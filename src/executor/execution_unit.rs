use std::fmt::Display;

use crate::statement::SqlValue;

/// One rewritten statement bound to the data source it runs on.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionUnit {
    pub data_source: String,
    pub sql: String,
    pub parameters: Vec<SqlValue>,
}

impl ExecutionUnit {
    pub fn new(data_source: &str, sql: &str, parameters: Vec<SqlValue>) -> Self {
        Self { data_source: data_source.to_string(), sql: sql.to_string(), parameters }
    }
}

impl Display for ExecutionUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ::: {}", self.data_source, self.sql)?;
        if !self.parameters.is_empty() {
            let parameters: Vec<String> = self.parameters.iter().map(SqlValue::to_sql_literal).collect();
            write!(f, " ::: [{}]", parameters.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_lists_parameters_when_present() {
        let unit = ExecutionUnit::new("ds_0", "SELECT * FROM t_order_0 WHERE user_id = ?", vec![SqlValue::Int(2)]);
        assert_eq!(unit.to_string(), "ds_0 ::: SELECT * FROM t_order_0 WHERE user_id = ? ::: [2]");
        let bare = ExecutionUnit::new("ds_1", "SELECT 1", vec![]);
        assert_eq!(bare.to_string(), "ds_1 ::: SELECT 1");
    }
}
