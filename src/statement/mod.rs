pub mod sql_value;
pub use sql_value::*;

pub mod segments;
pub use segments::*;

pub mod expression;
pub use expression::*;

pub mod projection_segment;
pub use projection_segment::*;

pub mod select_statement;
pub use select_statement::*;

pub mod dml_statement;
pub use dml_statement::*;

pub mod admin_statement;
pub use admin_statement::*;

pub mod sql_statement;
pub use sql_statement::*;
