pub mod aggregation_unit;
pub mod compare;
pub mod group_by_memory;
pub mod group_by_stream;
pub mod iterator_stream;
pub mod merge_error;
pub mod merged_result;
pub mod order_by_stream;
pub mod pagination;
pub mod query_result;
pub mod result_merger;

pub use aggregation_unit::*;
pub use compare::*;
pub use group_by_memory::*;
pub use group_by_stream::*;
pub use iterator_stream::*;
pub use merge_error::*;
pub use merged_result::*;
pub use order_by_stream::*;
pub use pagination::*;
pub use query_result::*;
pub use result_merger::*;
