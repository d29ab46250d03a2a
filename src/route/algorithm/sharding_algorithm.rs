use std::ops::Bound;

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    config::{ConfigError, ShardingAlgorithmConfiguration},
    route::{RoutingError, ShardingValues, ValueRange},
    statement::SqlValue,
};

static INLINE_ALGORITHM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<prefix>[^$]*)\$\{\s*(?P<column>\w+)\s*(?:%\s*(?P<modulo>\d+)\s*)?\}(?P<suffix>[^$]*)$")
        .expect("valid inline algorithm regex")
});

/// Maps sharding values onto the actual targets (data sources or tables).
#[derive(Debug, Clone, PartialEq)]
pub enum ShardingAlgorithm {
    Mod { sharding_count: u64 },
    HashMod { sharding_count: u64 },
    Inline { prefix: String, column: String, modulo: Option<u64>, suffix: String },
    BoundaryRange { boundaries: Vec<i64> },
    Interval { datetime_pattern: String, suffix_pattern: String },
}

impl ShardingAlgorithm {
    pub fn from_config(config: &ShardingAlgorithmConfiguration, table: &str) -> Result<Self, ConfigError> {
        let invalid = |message: &str| ConfigError::InvalidAlgorithm { table: table.to_string(), message: message.into() };
        match config {
            ShardingAlgorithmConfiguration::Mod { sharding_count } => {
                if *sharding_count == 0 {
                    return Err(invalid("sharding_count must be positive"));
                }
                Ok(ShardingAlgorithm::Mod { sharding_count: *sharding_count })
            }
            ShardingAlgorithmConfiguration::HashMod { sharding_count } => {
                if *sharding_count == 0 {
                    return Err(invalid("sharding_count must be positive"));
                }
                Ok(ShardingAlgorithm::HashMod { sharding_count: *sharding_count })
            }
            ShardingAlgorithmConfiguration::Inline { algorithm_expression } => {
                let captures = INLINE_ALGORITHM
                    .captures(algorithm_expression.trim())
                    .ok_or_else(|| invalid(&format!("unsupported inline expression '{algorithm_expression}'")))?;
                let modulo = match captures.name("modulo") {
                    Some(m) => match m.as_str().parse::<u64>() {
                        Ok(0) | Err(_) => return Err(invalid("inline modulo must be a positive integer")),
                        Ok(n) => Some(n),
                    },
                    None => None,
                };
                Ok(ShardingAlgorithm::Inline {
                    prefix: captures["prefix"].to_string(),
                    column: captures["column"].to_string(),
                    modulo,
                    suffix: captures["suffix"].to_string(),
                })
            }
            ShardingAlgorithmConfiguration::BoundaryRange { sharding_ranges } => {
                if sharding_ranges.windows(2).any(|w| w[0] >= w[1]) {
                    return Err(invalid("sharding_ranges must be strictly ascending"));
                }
                Ok(ShardingAlgorithm::BoundaryRange { boundaries: sharding_ranges.clone() })
            }
            ShardingAlgorithmConfiguration::Interval { datetime_pattern, suffix_pattern } => {
                Ok(ShardingAlgorithm::Interval {
                    datetime_pattern: datetime_pattern.clone(),
                    suffix_pattern: suffix_pattern.clone(),
                })
            }
        }
    }

    /// Targets selected by `values`, in the order of `targets`.
    pub fn do_sharding(
        &self,
        table: &str,
        column: &str,
        targets: &[String],
        values: &ShardingValues,
    ) -> Result<Vec<String>, RoutingError> {
        let selected: Vec<String> = match values {
            ShardingValues::List(list) => {
                let mut selected = Vec::new();
                for value in list {
                    selected.push(self.sharding_single(table, column, targets, value)?);
                }
                selected
            }
            ShardingValues::Range(range) => match self.range_partitions(range) {
                Some(keys) => targets
                    .iter()
                    .filter(|t| keys.iter().any(|k| self.target_matches(t, k)))
                    .cloned()
                    .collect(),
                None => return Ok(targets.to_vec()),
            },
        };
        Ok(targets.iter().filter(|t| selected.contains(t)).cloned().collect())
    }

    fn sharding_single(
        &self,
        table: &str,
        column: &str,
        targets: &[String],
        value: &SqlValue,
    ) -> Result<String, RoutingError> {
        let invalid = || RoutingError::InvalidShardingValue {
            table: table.to_string(),
            column: column.to_string(),
            value: value.to_sql_literal(),
        };
        let no_target = || RoutingError::NoShardingTarget {
            table: table.to_string(),
            column: column.to_string(),
            value: value.to_sql_literal(),
        };

        let find_suffix = |suffix: &str| targets.iter().find(|t| suffix_matches(t, suffix)).cloned();
        match self {
            ShardingAlgorithm::Mod { sharding_count } => {
                let v = value.as_i64().ok_or_else(invalid)?;
                find_suffix(&modulo(v, *sharding_count).to_string()).ok_or_else(no_target)
            }
            ShardingAlgorithm::HashMod { sharding_count } => {
                find_suffix(&(stable_hash(value) % sharding_count).to_string()).ok_or_else(no_target)
            }
            ShardingAlgorithm::Inline { prefix, modulo: Some(m), suffix, .. } => {
                let v = value.as_i64().ok_or_else(invalid)?;
                let name = format!("{prefix}{}{suffix}", modulo(v, *m));
                targets.iter().find(|t| t.eq_ignore_ascii_case(&name)).cloned().ok_or_else(no_target)
            }
            ShardingAlgorithm::Inline { prefix, modulo: None, suffix, .. } => {
                let raw = match value {
                    SqlValue::Text(text) => text.clone(),
                    SqlValue::Null => return Err(invalid()),
                    other => other.to_string(),
                };
                let name = format!("{prefix}{raw}{suffix}");
                targets.iter().find(|t| t.eq_ignore_ascii_case(&name)).cloned().ok_or_else(no_target)
            }
            ShardingAlgorithm::BoundaryRange { boundaries } => {
                let v = value.as_i64().ok_or_else(invalid)?;
                find_suffix(&partition_of(boundaries, v).to_string()).ok_or_else(no_target)
            }
            ShardingAlgorithm::Interval { datetime_pattern, suffix_pattern } => {
                let SqlValue::Text(text) = value else { return Err(invalid()) };
                let datetime = parse_datetime(text, datetime_pattern).ok_or_else(invalid)?;
                find_suffix(&datetime.format(suffix_pattern).to_string()).ok_or_else(no_target)
            }
        }
    }

    /// Suffixes (or inline keys) a range can reach, `None` when every target is possible.
    fn range_partitions(&self, range: &ValueRange) -> Option<Vec<String>> {
        match self {
            ShardingAlgorithm::Mod { sharding_count }
            | ShardingAlgorithm::Inline { modulo: Some(sharding_count), .. } => {
                let (low, high) = range.integer_bounds()?;
                if high < low {
                    return Some(Vec::new());
                }
                let span = (high as i128) - (low as i128) + 1;
                if span >= *sharding_count as i128 {
                    return None;
                }
                let mut suffixes: Vec<String> = Vec::new();
                for v in low..=high {
                    let suffix = modulo(v, *sharding_count).to_string();
                    if !suffixes.contains(&suffix) {
                        suffixes.push(suffix);
                    }
                }
                Some(suffixes)
            }
            ShardingAlgorithm::BoundaryRange { boundaries } => {
                let first = match &range.lower {
                    Bound::Unbounded => 0,
                    Bound::Included(v) | Bound::Excluded(v) => partition_of(boundaries, v.as_i64()?),
                };
                let last = match &range.upper {
                    Bound::Unbounded => boundaries.len(),
                    Bound::Included(v) | Bound::Excluded(v) => partition_of(boundaries, v.as_i64()?),
                };
                Some((first..=last).map(|p| p.to_string()).collect())
            }
            ShardingAlgorithm::HashMod { .. }
            | ShardingAlgorithm::Inline { modulo: None, .. }
            | ShardingAlgorithm::Interval { .. } => None,
        }
    }

    fn target_matches(&self, target: &str, key: &str) -> bool {
        match self {
            ShardingAlgorithm::Inline { prefix, suffix, .. } => {
                target.eq_ignore_ascii_case(&format!("{prefix}{key}{suffix}"))
            }
            _ => suffix_matches(target, key),
        }
    }
}

fn modulo(value: i64, count: u64) -> u64 {
    (value as i128).rem_euclid(count as i128) as u64
}

/// Number of boundaries at or below `value`.
fn partition_of(boundaries: &[i64], value: i64) -> usize {
    boundaries.iter().filter(|b| value >= **b).count()
}

/// Hash that stays the same across processes: integers hash to their
/// magnitude, text uses the 31-multiplier string hash.
fn stable_hash(value: &SqlValue) -> u64 {
    match value {
        SqlValue::Null => 0,
        SqlValue::Bool(b) => u64::from(*b),
        SqlValue::Int(v) => v.unsigned_abs(),
        SqlValue::Float(v) => v.0.to_bits(),
        SqlValue::Text(text) => {
            let hash = text.encode_utf16().fold(0i32, |h, c| h.wrapping_mul(31).wrapping_add(i32::from(c)));
            u64::from(hash.unsigned_abs())
        }
    }
}

fn parse_datetime(text: &str, pattern: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, pattern)
        .ok()
        .or_else(|| NaiveDate::parse_from_str(text, pattern).ok().and_then(|d| d.and_hms_opt(0, 0, 0)))
}

/// `t_order_10` ends with `10` but not with `0`.
pub(crate) fn suffix_matches(target: &str, suffix: &str) -> bool {
    if !target.ends_with(suffix) {
        return false;
    }
    let head = &target[..target.len() - suffix.len()];
    let suffix_is_numeric = suffix.chars().next().is_some_and(|c| c.is_ascii_digit());
    !suffix_is_numeric || !head.chars().last().is_some_and(|c| c.is_ascii_digit())
}
