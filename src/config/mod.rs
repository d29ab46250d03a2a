pub mod config_error;
pub use config_error::*;

pub mod props;
pub use props::*;

pub mod key_generate_type;
pub use key_generate_type::*;

pub mod rule_configuration;
pub use rule_configuration::*;

pub mod inline_expression;
pub use inline_expression::*;

pub mod sharding_config;
pub use sharding_config::*;
