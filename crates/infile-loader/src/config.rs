//! Loader configuration.

use infile_buffer::{Charset, DEFAULT_INFILE_BUFFER_SIZE, DEFAULT_ROW_BUFFER_SIZE, InfileDataBuffer};
use infile_core::error::{ConfigError, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Configuration for a [`HierarchicalLoader`](crate::HierarchicalLoader).
///
/// Every field has a default, so partial JSON documents are accepted:
///
/// ```
/// use infile_loader::LoaderConfig;
///
/// let config = LoaderConfig::from_json(r#"{ "row_buffer_size": 4096 }"#)?;
/// assert_eq!(config.row_buffer_size, 4096);
/// assert!(config.disable_foreign_key_checks);
/// # Ok::<(), infile_core::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Batch capacity per table, in bytes (default: 10 MiB)
    pub infile_buffer_size: usize,
    /// Row scratch capacity, in bytes (default: 2 KiB)
    pub row_buffer_size: usize,
    /// Text encoding of the infile
    pub charset: Charset,
    /// Entity names that are skipped during traversal
    pub ignored_types: BTreeSet<String>,
    /// Secondary tables that receive no rows
    pub ignored_secondary_tables: BTreeSet<String>,
    /// Run `SET FOREIGN_KEY_CHECKS = 0` when a connection is installed
    pub disable_foreign_key_checks: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            infile_buffer_size: DEFAULT_INFILE_BUFFER_SIZE,
            row_buffer_size: DEFAULT_ROW_BUFFER_SIZE,
            charset: Charset::default(),
            ignored_types: BTreeSet::new(),
            ignored_secondary_tables: BTreeSet::new(),
            disable_foreign_key_checks: true,
        }
    }
}

impl LoaderConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            Error::Config(ConfigError {
                message: format!("invalid loader configuration: {e}"),
                source: Some(Box::new(e)),
            })
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Set the batch capacity.
    #[must_use]
    pub fn infile_buffer_size(mut self, size: usize) -> Self {
        self.infile_buffer_size = size;
        self
    }

    /// Set the row scratch capacity.
    #[must_use]
    pub fn row_buffer_size(mut self, size: usize) -> Self {
        self.row_buffer_size = size;
        self
    }

    /// Set the charset.
    #[must_use]
    pub fn charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    /// Skip entities of this type.
    #[must_use]
    pub fn ignore_type(mut self, entity: impl Into<String>) -> Self {
        self.ignored_types.insert(entity.into());
        self
    }

    /// Write no rows into this secondary table.
    #[must_use]
    pub fn ignore_secondary_table(mut self, table: impl Into<String>) -> Self {
        self.ignored_secondary_tables.insert(table.into());
        self
    }

    /// Enable or disable turning off foreign key checks on connect.
    #[must_use]
    pub fn disable_foreign_key_checks(mut self, value: bool) -> Self {
        self.disable_foreign_key_checks = value;
        self
    }

    /// Check buffer sizes.
    pub fn validate(&self) -> Result<()> {
        if self.row_buffer_size == 0 {
            return Err(Error::config("row_buffer_size must be positive"));
        }
        if self.row_buffer_size > self.infile_buffer_size {
            return Err(Error::config(format!(
                "row_buffer_size ({}) exceeds infile_buffer_size ({})",
                self.row_buffer_size, self.infile_buffer_size
            )));
        }
        Ok(())
    }

    /// A fresh buffer sized by this configuration.
    pub fn new_buffer(&self) -> Result<InfileDataBuffer> {
        InfileDataBuffer::new(self.charset, self.infile_buffer_size, self.row_buffer_size)
    }
}
