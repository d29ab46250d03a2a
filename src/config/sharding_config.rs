use std::{fs, path::Path};

use serde::Deserialize;

use crate::config::{ConfigError, ConfigurationProps, EncryptColumnConfiguration, ShardingRuleConfiguration};

/// Top-level configuration document.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ShardingConfig {
    pub rule: ShardingRuleConfiguration,
    #[serde(default)]
    pub props: ConfigurationProps,
    #[serde(default)]
    pub encrypt: Vec<EncryptColumnConfiguration>,
}

impl ShardingConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&content)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::config::{KeyGenerateType, LoadBalancerType, ShardingAlgorithmConfiguration};

    const CONFIG: &str = r#"{
        "rule": {
            "data_sources": ["ds_0", "ds_1"],
            "tables": [{
                "logic_table": "t_order",
                "actual_data_nodes": "ds_${0..1}.t_order_${0..1}",
                "database_strategy": { "sharding_column": "user_id", "algorithm": { "type": "MOD", "sharding_count": 2 } },
                "table_strategy": { "sharding_column": "order_id", "algorithm": { "type": "INLINE", "algorithm_expression": "t_order_${order_id % 2}" } },
                "key_generate": { "column": "order_id", "generator": { "type": "SNOWFLAKE", "worker_id": 3 } }
            }],
            "binding_tables": ["t_order, t_order_item"],
            "readwrite_splitting": [{
                "name": "ds_0", "write_data_source": "primary_0", "read_data_sources": ["replica_0", "replica_1"]
            }]
        },
        "props": { "sql_show": true }
    }"#;

    #[test]
    fn parses_full_document() {
        let config = ShardingConfig::from_json(CONFIG).expect("valid config");
        assert_eq!(config.rule.data_sources, vec!["ds_0", "ds_1"]);
        let table = &config.rule.tables[0];
        assert_eq!(
            table.database_strategy.as_ref().map(|s| s.algorithm.clone()),
            Some(ShardingAlgorithmConfiguration::Mod { sharding_count: 2 })
        );
        assert_eq!(
            table.key_generate.as_ref().map(|k| k.generator),
            Some(KeyGenerateType::Snowflake { worker_id: 3 })
        );
        assert_eq!(config.rule.readwrite_splitting[0].load_balancer, LoadBalancerType::RoundRobin);
        assert!(config.props.sql_show);
        assert_eq!(config.props.max_cartesian_route_units, 4096);
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(CONFIG.as_bytes()).expect("write config");
        let config = ShardingConfig::from_path(file.path()).expect("config from file");
        assert_eq!(config.rule.tables.len(), 1);
    }

    #[test]
    fn reports_missing_file_and_bad_json() {
        let missing = ShardingConfig::from_path("/definitely/not/here.json");
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
        assert!(matches!(ShardingConfig::from_json("{"), Err(ConfigError::Parse(_))));
    }
}
