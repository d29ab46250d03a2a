pub mod encrypt_rule;
pub mod parameter_builder;
pub mod rewrite_engine;
pub mod rewrite_error;
pub mod sql_token;
pub mod token_generator;

pub use encrypt_rule::*;
pub use parameter_builder::*;
pub use rewrite_engine::*;
pub use rewrite_error::*;
pub use sql_token::*;
pub use token_generator::*;
