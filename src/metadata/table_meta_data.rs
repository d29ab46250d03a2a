use indexmap::IndexMap;
use serde::Deserialize;

use crate::metadata::ColumnMetaData;

/// Columns of one logical table, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawTableMetaData")]
pub struct TableMetaData {
    pub name: String,
    /// Keyed by lower-cased column name.
    pub columns: IndexMap<String, ColumnMetaData>,
}

#[derive(Deserialize)]
struct RawTableMetaData {
    name: String,
    columns: Vec<ColumnMetaData>,
}

impl From<RawTableMetaData> for TableMetaData {
    fn from(raw: RawTableMetaData) -> Self {
        raw.columns.into_iter().fold(TableMetaData::new(&raw.name), TableMetaData::with_column)
    }
}

impl TableMetaData {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), columns: IndexMap::new() }
    }

    pub fn with_column(mut self, column: ColumnMetaData) -> Self {
        self.columns.insert(column.name.to_ascii_lowercase(), column);
        self
    }

    pub fn column(&self, name: &str) -> Option<&ColumnMetaData> {
        self.columns.get(&name.to_ascii_lowercase())
    }

    pub fn contains_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn visible_column_names(&self) -> Vec<String> {
        self.columns.values().filter(|c| c.visible).map(|c| c.name.clone()).collect()
    }

    pub fn primary_key_columns(&self) -> Vec<&str> {
        self.columns.values().filter(|c| c.primary_key).map(|c| c.name.as_str()).collect()
    }
}
