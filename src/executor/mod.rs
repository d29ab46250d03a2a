pub mod execution_error;
pub mod execution_unit;
pub mod shard_execution_engine;
pub mod shard_executor;
pub mod stream_query_result;

pub use execution_error::*;
pub use execution_unit::*;
pub use shard_execution_engine::*;
pub use shard_executor::*;
pub use stream_query_result::*;
