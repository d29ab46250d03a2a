pub mod column_meta_data;
pub use column_meta_data::*;

pub mod table_meta_data;
pub use table_meta_data::*;

pub mod sharding_schema;
pub use sharding_schema::*;

/// Read-only view over the physical catalog.
pub trait SchemaMetaData: Send + Sync {
    /// Metadata of a logical table, looked up case-insensitively.
    fn table_meta(&self, table: &str) -> Option<&TableMetaData>;

    fn table_names(&self) -> Vec<String>;

    fn contains_table(&self, table: &str) -> bool {
        self.table_meta(table).is_some()
    }

    fn contains_column(&self, table: &str, column: &str) -> bool {
        self.table_meta(table).is_some_and(|t| t.contains_column(column))
    }

    fn visible_column_names(&self, table: &str) -> Vec<String> {
        self.table_meta(table).map(|t| t.visible_column_names()).unwrap_or_default()
    }
}
