use serde::Deserialize;

/// Runtime properties of the sharding kernel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConfigurationProps {
    /// Log the logical SQL and every rewritten shard SQL.
    pub sql_show: bool,
    /// Ceiling on the number of units a Cartesian route may produce.
    pub max_cartesian_route_units: usize,
    /// Upper bound of shard statements of one query running at once.
    pub max_connections_size_per_query: usize,
    /// Rows buffered per shard stream before the producer waits for the merger.
    pub stream_buffer_rows: usize,
}

impl Default for ConfigurationProps {
    fn default() -> Self {
        Self {
            sql_show: false,
            max_cartesian_route_units: 4096,
            max_connections_size_per_query: 8,
            stream_buffer_rows: 128,
        }
    }
}

impl ConfigurationProps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sql_show(mut self, sql_show: bool) -> Self {
        self.sql_show = sql_show;
        self
    }

    pub fn with_max_cartesian_route_units(mut self, limit: usize) -> Self {
        self.max_cartesian_route_units = limit;
        self
    }
}
