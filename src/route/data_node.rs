use std::fmt::Display;

/// One physical table: `data_source.table`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataNode {
    pub data_source: String,
    pub table: String,
}

impl DataNode {
    pub fn new(data_source: impl Into<String>, table: impl Into<String>) -> Self {
        Self { data_source: data_source.into(), table: table.into() }
    }

    /// Parses `ds.table`; text without a dot is not a data node.
    pub fn parse(text: &str) -> Option<Self> {
        let (data_source, table) = text.trim().split_once('.')?;
        if data_source.is_empty() || table.is_empty() {
            return None;
        }
        Some(Self::new(data_source, table))
    }
}

impl Display for DataNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.data_source, self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_qualified_names() {
        assert_eq!(DataNode::parse("ds_0.t_order_1"), Some(DataNode::new("ds_0", "t_order_1")));
        assert_eq!(DataNode::parse("t_order"), None);
        assert_eq!(DataNode::parse(".t"), None);
    }
}
