use indexmap::IndexMap;
use serde::Deserialize;

use crate::metadata::{SchemaMetaData, TableMetaData};

/// In-memory catalog of logical tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Vec<TableMetaData>")]
pub struct ShardingSchema {
    tables: IndexMap<String, TableMetaData>,
}

impl From<Vec<TableMetaData>> for ShardingSchema {
    fn from(tables: Vec<TableMetaData>) -> Self {
        tables.into_iter().fold(ShardingSchema::new(), ShardingSchema::with_table)
    }
}

impl ShardingSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: TableMetaData) -> Self {
        self.tables.insert(table.name.to_ascii_lowercase(), table);
        self
    }
}

impl SchemaMetaData for ShardingSchema {
    fn table_meta(&self, table: &str) -> Option<&TableMetaData> {
        self.tables.get(&table.to_ascii_lowercase())
    }

    fn table_names(&self) -> Vec<String> {
        self.tables.values().map(|t| t.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ColumnMetaData;

    #[test]
    fn lookups_ignore_case() {
        let schema = ShardingSchema::new().with_table(
            TableMetaData::new("t_order")
                .with_column(ColumnMetaData::new("order_id", "BIGINT").primary_key())
                .with_column(ColumnMetaData::new("User_Id", "INT")),
        );
        assert!(schema.contains_table("T_ORDER"));
        assert!(schema.contains_column("t_order", "user_id"));
        assert!(!schema.contains_column("t_order", "status"));
        assert_eq!(schema.table_meta("t_order").map(|t| t.primary_key_columns()), Some(vec!["order_id"]));
    }

    #[test]
    fn hidden_columns_are_not_visible() {
        let schema = ShardingSchema::new().with_table(
            TableMetaData::new("t_user")
                .with_column(ColumnMetaData::new("user_id", "INT"))
                .with_column(ColumnMetaData::new("pwd_cipher", "VARCHAR").hidden()),
        );
        assert_eq!(schema.visible_column_names("t_user"), vec!["user_id".to_string()]);
    }

    #[test]
    fn deserializes_from_json_list() {
        let json = r#"[{"name":"t_order","columns":[
            {"name":"order_id","data_type":"BIGINT","primary_key":true},
            {"name":"status","data_type":"VARCHAR","visible":false}]}]"#;
        let schema: ShardingSchema = serde_json::from_str(json).expect("valid schema json");
        assert_eq!(schema.table_names(), vec!["t_order".to_string()]);
        assert!(schema.visible_column_names("t_order") == vec!["order_id".to_string()]);
    }
}
