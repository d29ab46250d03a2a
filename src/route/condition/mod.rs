pub mod condition_engine;
pub mod sharding_condition;

pub use condition_engine::*;
pub use sharding_condition::*;
