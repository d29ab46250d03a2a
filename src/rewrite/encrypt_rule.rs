use std::{collections::HashMap, fmt::Debug, sync::Arc};

use crate::{config::EncryptColumnConfiguration, rewrite::RewriteError, statement::SqlValue};

/// Turns a plain value into the value stored in the cipher column.
pub trait Encryptor: Send + Sync + Debug {
    fn encrypt(&self, plain: &SqlValue) -> Result<SqlValue, String>;
}

/// Columns stored encrypted, with the encryptors registered by name.
#[derive(Debug, Clone, Default)]
pub struct EncryptRule {
    columns: Vec<EncryptColumnConfiguration>,
    encryptors: HashMap<String, Arc<dyn Encryptor>>,
}

impl EncryptRule {
    pub fn new(columns: Vec<EncryptColumnConfiguration>) -> Self {
        Self { columns, encryptors: HashMap::new() }
    }

    pub fn with_encryptor(mut self, name: &str, encryptor: Arc<dyn Encryptor>) -> Self {
        self.register(name, encryptor);
        self
    }

    pub fn register(&mut self, name: &str, encryptor: Arc<dyn Encryptor>) {
        self.encryptors.insert(name.to_string(), encryptor);
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn find_column(&self, table: &str, column: &str) -> Option<&EncryptColumnConfiguration> {
        self.columns
            .iter()
            .find(|c| c.table.eq_ignore_ascii_case(table) && c.column.eq_ignore_ascii_case(column))
    }

    pub fn encrypt(&self, config: &EncryptColumnConfiguration, plain: &SqlValue) -> Result<SqlValue, RewriteError> {
        let encryptor = self.encryptors.get(&config.encryptor).ok_or_else(|| RewriteError::EncryptorNotFound {
            table: config.table.clone(),
            column: config.column.clone(),
            encryptor: config.encryptor.clone(),
        })?;
        encryptor.encrypt(plain).map_err(|message| RewriteError::EncryptFailed {
            table: config.table.clone(),
            column: config.column.clone(),
            message,
        })
    }
}
