use std::sync::Arc;

use crate::{
    config::{ConfigError, InlineExpressionParser, ShardingStrategyConfiguration, TableRuleConfiguration},
    route::{DataNode, KeyGenerator, ShardingStrategy},
};

#[derive(Debug)]
pub struct KeyGenerateStrategy {
    pub column: String,
    pub generator: Arc<KeyGenerator>,
}

/// Physical layout and strategies of one logical table.
#[derive(Debug)]
pub struct TableRule {
    pub logic_table: String,
    pub actual_data_nodes: Vec<DataNode>,
    pub database_strategy: Option<ShardingStrategy>,
    pub table_strategy: Option<ShardingStrategy>,
    pub key_generate: Option<KeyGenerateStrategy>,
}

impl TableRule {
    /// Strategies missing from `config` fall back to the rule-wide defaults.
    pub fn new(
        config: &TableRuleConfiguration,
        data_sources: &[String],
        default_database_strategy: Option<&ShardingStrategyConfiguration>,
        default_table_strategy: Option<&ShardingStrategyConfiguration>,
    ) -> Result<Self, ConfigError> {
        let logic_table = config.logic_table.clone();
        let actual_data_nodes = match &config.actual_data_nodes {
            Some(expression) => {
                let mut nodes = Vec::new();
                for text in InlineExpressionParser::expand(expression)? {
                    let node = DataNode::parse(&text).ok_or_else(|| ConfigError::InvalidInlineExpression {
                        expression: expression.clone(),
                        message: format!("'{text}' is not a data_source.table pair"),
                    })?;
                    if !data_sources.contains(&node.data_source) {
                        return Err(ConfigError::UnknownDataSource {
                            table: logic_table,
                            data_source: node.data_source,
                        });
                    }
                    nodes.push(node);
                }
                nodes
            }
            None => data_sources.iter().map(|ds| DataNode::new(ds.clone(), logic_table.clone())).collect(),
        };

        let strategy = |own: Option<&ShardingStrategyConfiguration>, default: Option<&ShardingStrategyConfiguration>| {
            own.or(default).map(|c| ShardingStrategy::from_config(c, &logic_table)).transpose()
        };
        let database_strategy = strategy(config.database_strategy.as_ref(), default_database_strategy)?;
        let table_strategy = strategy(config.table_strategy.as_ref(), default_table_strategy)?;
        let key_generate = config.key_generate.as_ref().map(|k| KeyGenerateStrategy {
            column: k.column.clone(),
            generator: Arc::new(KeyGenerator::new(k.generator)),
        });

        Ok(Self { logic_table, actual_data_nodes, database_strategy, table_strategy, key_generate })
    }

    /// Data sources holding this table, in declaration order.
    pub fn data_source_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for node in &self.actual_data_nodes {
            if !names.contains(&node.data_source) {
                names.push(node.data_source.clone());
            }
        }
        names
    }

    pub fn actual_tables_in(&self, data_source: &str) -> Vec<String> {
        self.actual_data_nodes
            .iter()
            .filter(|n| n.data_source == data_source)
            .map(|n| n.table.clone())
            .collect()
    }

    /// Position of `table` among the actual tables of `data_source`.
    pub fn actual_table_index(&self, data_source: &str, table: &str) -> Option<usize> {
        self.actual_data_nodes
            .iter()
            .filter(|n| n.data_source == data_source)
            .position(|n| n.table.eq_ignore_ascii_case(table))
    }

    pub fn node_position(&self, node: &DataNode) -> usize {
        self.actual_data_nodes.iter().position(|n| n == node).unwrap_or(usize::MAX)
    }

    pub fn is_sharding_column(&self, column: &str) -> bool {
        [&self.database_strategy, &self.table_strategy]
            .into_iter()
            .flatten()
            .any(|s| s.sharding_column.eq_ignore_ascii_case(column))
    }

    pub fn generate_key_column(&self) -> Option<&str> {
        self.key_generate.as_ref().map(|k| k.column.as_str())
    }
}
