use serde::Deserialize;

use crate::config::KeyGenerateType;

/// Algorithm reference of a sharding strategy, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShardingAlgorithmConfiguration {
    Mod { sharding_count: u64 },
    HashMod { sharding_count: u64 },
    /// e.g. `t_order_${order_id % 2}`
    Inline { algorithm_expression: String },
    /// Ascending partition boundaries, `[1, 5, 10]` gives four partitions.
    BoundaryRange { sharding_ranges: Vec<i64> },
    /// Date-time values suffixed by `suffix_pattern` (chrono format, e.g. `%Y%m`).
    Interval { datetime_pattern: String, suffix_pattern: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShardingStrategyConfiguration {
    pub sharding_column: String,
    pub algorithm: ShardingAlgorithmConfiguration,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KeyGenerateConfiguration {
    pub column: String,
    #[serde(default)]
    pub generator: KeyGenerateType,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TableRuleConfiguration {
    pub logic_table: String,
    /// Inline expression such as `ds_${0..1}.t_order_${0..1}`; every data
    /// source holding a table named like the logic table when absent.
    #[serde(default)]
    pub actual_data_nodes: Option<String>,
    #[serde(default)]
    pub database_strategy: Option<ShardingStrategyConfiguration>,
    #[serde(default)]
    pub table_strategy: Option<ShardingStrategyConfiguration>,
    #[serde(default)]
    pub key_generate: Option<KeyGenerateConfiguration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadBalancerType {
    #[default]
    RoundRobin,
    /// Always the first replica.
    Fixed,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReadwriteSplittingConfiguration {
    /// Logical data source name used by the sharding rule.
    pub name: String,
    pub write_data_source: String,
    pub read_data_sources: Vec<String>,
    #[serde(default)]
    pub load_balancer: LoadBalancerType,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ShardingRuleConfiguration {
    pub data_sources: Vec<String>,
    #[serde(default)]
    pub tables: Vec<TableRuleConfiguration>,
    /// Comma separated groups, `"t_order, t_order_item"`.
    #[serde(default)]
    pub binding_tables: Vec<String>,
    #[serde(default)]
    pub broadcast_tables: Vec<String>,
    #[serde(default)]
    pub default_data_source: Option<String>,
    #[serde(default)]
    pub default_database_strategy: Option<ShardingStrategyConfiguration>,
    #[serde(default)]
    pub default_table_strategy: Option<ShardingStrategyConfiguration>,
    #[serde(default)]
    pub readwrite_splitting: Vec<ReadwriteSplittingConfiguration>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EncryptColumnConfiguration {
    pub table: String,
    pub column: String,
    pub cipher_column: String,
    /// Name of an encryptor registered on the encrypt rule.
    pub encryptor: String,
}
