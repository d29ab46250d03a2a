pub mod binder_error;
pub use binder_error::*;

pub mod projection;
pub use projection::*;

pub mod projections_context;
pub use projections_context::*;

pub mod projections_context_engine;
pub use projections_context_engine::*;

pub mod tables_context;
pub use tables_context::*;

pub mod order_by_context;
pub use order_by_context::*;

pub mod pagination_context;
pub use pagination_context::*;

pub mod statement_context;
pub use statement_context::*;

pub mod statement_binder;
pub use statement_binder::*;
