pub mod algorithm;
pub mod condition;
pub mod connection_session;
pub mod data_node;
pub mod engine;
pub mod generated_key;
pub mod readwrite_overlay;
pub mod route_context;
pub mod route_unit;
pub mod routing_error;
pub mod rule;
pub mod sharding_router;

pub use algorithm::*;
pub use condition::*;
pub use connection_session::*;
pub use data_node::*;
pub use engine::*;
pub use generated_key::*;
pub use readwrite_overlay::*;
pub use route_context::*;
pub use route_unit::*;
pub use routing_error::*;
pub use rule::*;
pub use sharding_router::*;
