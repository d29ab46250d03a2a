use tracing::debug;

use crate::route::{ConnectionSession, RouteUnit, ShardingRule};

/// Swaps each unit's logical data source for the primary or a replica of
/// its read/write group. Units outside every group are left as they are.
pub struct ReadwriteSplittingOverlay;

impl ReadwriteSplittingOverlay {
    pub fn apply(rule: &ShardingRule, units: &mut [RouteUnit], is_write: bool, session: &ConnectionSession) {
        let to_primary = is_write || session.routes_to_primary();
        for unit in units.iter_mut() {
            let Some(group) = rule.readwrite_group(&unit.data_source.logic_name) else { continue };
            let actual = if to_primary { group.write_data_source.as_str() } else { group.read_data_source() };
            debug!(logic = unit.data_source.logic_name.as_str(), actual, "read/write splitting");
            unit.data_source.actual_name = actual.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{_fixtures::sharding_rule_config, config::ReadwriteSplittingConfiguration, config::LoadBalancerType};

    fn rule() -> ShardingRule {
        let mut config = sharding_rule_config();
        config.readwrite_splitting = vec![ReadwriteSplittingConfiguration {
            name: "ds_0".into(),
            write_data_source: "primary_0".into(),
            read_data_sources: vec!["replica_0a".into(), "replica_0b".into()],
            load_balancer: LoadBalancerType::RoundRobin,
        }];
        ShardingRule::new(&config).unwrap()
    }

    #[test]
    fn reads_alternate_replicas_and_writes_hit_primary() {
        let rule = rule();
        let session = ConnectionSession::new();
        let mut units = vec![RouteUnit::new("ds_0", vec![]), RouteUnit::new("ds_1", vec![])];

        ReadwriteSplittingOverlay::apply(&rule, &mut units, false, &session);
        assert_eq!(units[0].actual_data_source(), "replica_0a");
        assert_eq!(units[1].actual_data_source(), "ds_1");
        ReadwriteSplittingOverlay::apply(&rule, &mut units, false, &session);
        assert_eq!(units[0].actual_data_source(), "replica_0b");

        ReadwriteSplittingOverlay::apply(&rule, &mut units, true, &session);
        assert_eq!(units[0].actual_data_source(), "primary_0");
    }

    #[test]
    fn visited_primary_keeps_reads_on_primary() {
        let rule = rule();
        let session = ConnectionSession { force_primary: false, primary_visited: true };
        let mut units = vec![RouteUnit::new("ds_0", vec![])];
        ReadwriteSplittingOverlay::apply(&rule, &mut units, false, &session);
        assert_eq!(units[0].actual_data_source(), "primary_0");
    }
}
