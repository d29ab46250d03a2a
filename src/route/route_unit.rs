use std::fmt::Display;

/// Logic name paired with the actual name chosen for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteMapper {
    pub logic_name: String,
    pub actual_name: String,
}

impl RouteMapper {
    pub fn new(logic_name: impl Into<String>, actual_name: impl Into<String>) -> Self {
        Self { logic_name: logic_name.into(), actual_name: actual_name.into() }
    }
}

/// One data source plus the actual tables the shard SQL will touch there.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteUnit {
    pub data_source: RouteMapper,
    pub tables: Vec<RouteMapper>,
}

impl RouteUnit {
    /// Unit whose actual data source is the logic one until read/write
    /// splitting picks a replica.
    pub fn new(data_source: &str, tables: Vec<RouteMapper>) -> Self {
        Self { data_source: RouteMapper::new(data_source, data_source), tables }
    }

    pub fn logic_data_source(&self) -> &str {
        &self.data_source.logic_name
    }

    pub fn actual_data_source(&self) -> &str {
        &self.data_source.actual_name
    }

    pub fn actual_table(&self, logic_table: &str) -> Option<&str> {
        self.tables
            .iter()
            .find(|m| m.logic_name.eq_ignore_ascii_case(logic_table))
            .map(|m| m.actual_name.as_str())
    }

    pub fn logic_tables(&self) -> Vec<&str> {
        self.tables.iter().map(|m| m.logic_name.as_str()).collect()
    }
}

impl Display for RouteUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[", self.data_source.actual_name)?;
        for (i, table) in self.tables.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", table.actual_name)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actual_table_lookup_ignores_case() {
        let unit = RouteUnit::new("ds_1", vec![RouteMapper::new("t_order", "t_order_0")]);
        assert_eq!(unit.actual_table("T_ORDER"), Some("t_order_0"));
        assert_eq!(unit.actual_table("t_user"), None);
        assert_eq!(unit.to_string(), "ds_1[t_order_0]");
    }
}
