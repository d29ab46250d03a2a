pub mod binding_table_rule;
pub mod readwrite_rule;
pub mod sharding_rule;
pub mod sharding_strategy;
pub mod table_rule;

pub use binding_table_rule::*;
pub use readwrite_rule::*;
pub use sharding_rule::*;
pub use sharding_strategy::*;
pub use table_rule::*;
