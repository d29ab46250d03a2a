pub mod key_generator;
pub mod load_balancer;
pub mod sharding_algorithm;

pub use key_generator::*;
pub use load_balancer::*;
pub use sharding_algorithm::*;
