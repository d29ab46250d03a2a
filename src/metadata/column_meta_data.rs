use serde::Deserialize;

/// One column of a physical table as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ColumnMetaData {
    pub name: String,
    pub data_type: String,
    /// Hidden columns are left out of `*` expansion.
    #[serde(default = "visible_by_default")]
    pub visible: bool,
    #[serde(default)]
    pub primary_key: bool,
}

fn visible_by_default() -> bool {
    true
}

impl ColumnMetaData {
    pub fn new(name: &str, data_type: &str) -> Self {
        Self {
            name: name.to_string(),
            data_type: data_type.to_string(),
            visible: true,
            primary_key: false,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}
