//! Execution bridge contract.
//!
//! The loaders never talk to a server themselves. They hand finished
//! statements and infile bytes to an [`ExecutionBridge`], which runs them
//! and reports back per-row warnings.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Statement that turns off referential-integrity checks for the session.
pub const DISABLE_FOREIGN_KEY_CHECKS: &str = "SET FOREIGN_KEY_CHECKS = 0";

/// A diagnostic produced while loading an infile, as reported by `SHOW WARNINGS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadWarning {
    /// Severity label (`Note`, `Warning`, `Error`).
    pub level: String,
    /// Server error code.
    pub code: u16,
    /// Human-readable message.
    pub message: String,
}

impl LoadWarning {
    /// A warning-level diagnostic.
    pub fn warning(code: u16, message: impl Into<String>) -> Self {
        Self {
            level: "Warning".to_string(),
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.level, self.code, self.message)
    }
}

/// Runs bulk-load statements on behalf of the loaders.
pub trait ExecutionBridge {
    /// Execute a statement that produces no rows.
    fn execute(&mut self, sql: &str) -> Result<()>;

    /// Execute a `LOAD DATA LOCAL INFILE` statement, streaming `data` as the
    /// infile contents. An empty vector means the load was clean.
    fn load_infile(&mut self, sql: &str, data: &[u8]) -> Result<Vec<LoadWarning>>;

    /// Highest identity value already stored in `table.column`, used to seed
    /// client-side key generation. `None` starts the sequence at 1.
    fn identity_seed(&mut self, table: &str, column: &str) -> Result<Option<i64>> {
        let _ = (table, column);
        Ok(None)
    }

    /// Turn off foreign key checks so rows may arrive in any table order.
    fn disable_foreign_key_checks(&mut self) -> Result<()> {
        self.execute(DISABLE_FOREIGN_KEY_CHECKS)
    }
}

impl<B: ExecutionBridge + ?Sized> ExecutionBridge for &mut B {
    fn execute(&mut self, sql: &str) -> Result<()> {
        (**self).execute(sql)
    }

    fn load_infile(&mut self, sql: &str, data: &[u8]) -> Result<Vec<LoadWarning>> {
        (**self).load_infile(sql, data)
    }

    fn identity_seed(&mut self, table: &str, column: &str) -> Result<Option<i64>> {
        (**self).identity_seed(table, column)
    }

    fn disable_foreign_key_checks(&mut self) -> Result<()> {
        (**self).disable_foreign_key_checks()
    }
}

impl<B: ExecutionBridge + ?Sized> ExecutionBridge for Box<B> {
    fn execute(&mut self, sql: &str) -> Result<()> {
        (**self).execute(sql)
    }

    fn load_infile(&mut self, sql: &str, data: &[u8]) -> Result<Vec<LoadWarning>> {
        (**self).load_infile(sql, data)
    }

    fn identity_seed(&mut self, table: &str, column: &str) -> Result<Option<i64>> {
        (**self).identity_seed(table, column)
    }

    fn disable_foreign_key_checks(&mut self) -> Result<()> {
        (**self).disable_foreign_key_checks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        statements: Vec<String>,
    }

    impl ExecutionBridge for Recorder {
        fn execute(&mut self, sql: &str) -> Result<()> {
            self.statements.push(sql.to_string());
            Ok(())
        }

        fn load_infile(&mut self, sql: &str, data: &[u8]) -> Result<Vec<LoadWarning>> {
            self.statements.push(sql.to_string());
            if data.is_empty() {
                Ok(vec![LoadWarning::warning(1261, "Row 1 doesn't contain data")])
            } else {
                Ok(Vec::new())
            }
        }
    }

    #[test]
    fn disable_foreign_key_checks_runs_set_statement() {
        let mut bridge = Recorder::default();
        bridge.disable_foreign_key_checks().unwrap();
        assert_eq!(bridge.statements, vec![DISABLE_FOREIGN_KEY_CHECKS]);
    }

    #[test]
    fn default_identity_seed_is_none() {
        let mut bridge = Recorder::default();
        assert_eq!(bridge.identity_seed("customer", "id").unwrap(), None);
    }

    #[test]
    fn boxed_bridge_forwards() {
        let mut bridge: Box<dyn ExecutionBridge> = Box::new(Recorder::default());
        let warnings = bridge.load_infile("LOAD DATA", b"").unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            warnings[0].to_string(),
            "Warning (1261): Row 1 doesn't contain data"
        );
    }
}
