use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::LoadBalancerType;

/// Picks the replica a read goes to.
#[derive(Debug)]
pub enum LoadBalancer {
    RoundRobin(AtomicUsize),
    Fixed,
}

impl LoadBalancer {
    pub fn new(balancer_type: LoadBalancerType) -> Self {
        match balancer_type {
            LoadBalancerType::RoundRobin => LoadBalancer::RoundRobin(AtomicUsize::new(0)),
            LoadBalancerType::Fixed => LoadBalancer::Fixed,
        }
    }

    pub fn choose<'a>(&self, replicas: &'a [String]) -> Option<&'a str> {
        if replicas.is_empty() {
            return None;
        }
        let index = match self {
            LoadBalancer::RoundRobin(next) => next.fetch_add(1, Ordering::Relaxed) % replicas.len(),
            LoadBalancer::Fixed => 0,
        };
        replicas.get(index).map(String::as_str)
    }
}
