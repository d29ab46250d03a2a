pub mod sharding_error;
pub use sharding_error::*;

pub mod execution_context;
pub use execution_context::*;

pub mod sharding_kernel;
pub use sharding_kernel::*;

pub mod sharding_runtime;
pub use sharding_runtime::*;
