use crate::{
    config::ReadwriteSplittingConfiguration,
    route::LoadBalancer,
};

/// A logical data source backed by one primary and its replicas.
#[derive(Debug)]
pub struct ReadwriteSplittingGroup {
    pub name: String,
    pub write_data_source: String,
    pub read_data_sources: Vec<String>,
    pub load_balancer: LoadBalancer,
}

impl ReadwriteSplittingGroup {
    pub fn new(config: &ReadwriteSplittingConfiguration) -> Self {
        Self {
            name: config.name.clone(),
            write_data_source: config.write_data_source.clone(),
            read_data_sources: config.read_data_sources.clone(),
            load_balancer: LoadBalancer::new(config.load_balancer),
        }
    }

    /// Replica for a read, or the primary when no replica is configured.
    pub fn read_data_source(&self) -> &str {
        self.load_balancer.choose(&self.read_data_sources).unwrap_or(&self.write_data_source)
    }
}
