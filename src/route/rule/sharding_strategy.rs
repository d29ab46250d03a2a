use crate::{
    config::{ConfigError, ShardingStrategyConfiguration},
    route::{RoutingError, ShardingAlgorithm, ShardingConditionValue},
};

/// Sharding column plus the algorithm applied to its values.
#[derive(Debug, Clone, PartialEq)]
pub struct ShardingStrategy {
    pub sharding_column: String,
    pub algorithm: ShardingAlgorithm,
}

impl ShardingStrategy {
    pub fn from_config(config: &ShardingStrategyConfiguration, table: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            sharding_column: config.sharding_column.clone(),
            algorithm: ShardingAlgorithm::from_config(&config.algorithm, table)?,
        })
    }

    /// Narrows `targets` with every value given for the sharding column;
    /// without one all targets stay.
    pub fn do_sharding(
        &self,
        table: &str,
        targets: &[String],
        values: &[&ShardingConditionValue],
    ) -> Result<Vec<String>, RoutingError> {
        let mut routed = targets.to_vec();
        for value in values.iter().filter(|v| v.column.eq_ignore_ascii_case(&self.sharding_column)) {
            let narrowed = self.algorithm.do_sharding(table, &self.sharding_column, targets, &value.values)?;
            routed.retain(|t| narrowed.contains(t));
        }
        Ok(routed)
    }
}
