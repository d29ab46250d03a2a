pub mod broadcast_routing;
pub mod complex_routing;
pub mod routing_engine;
pub mod routing_engine_factory;
pub mod standard_routing;
pub mod unicast_routing;

pub use broadcast_routing::*;
pub use complex_routing::*;
pub use routing_engine::*;
pub use routing_engine_factory::*;
pub use standard_routing::*;
pub use unicast_routing::*;
