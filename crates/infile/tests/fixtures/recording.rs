//! A bridge that keeps every infile payload next to the in-memory tables.

use infile::{ExecutionBridge, LoadWarning, MemoryBridge, Result};

#[derive(Debug, Default)]
pub struct RecordingBridge {
    pub inner: MemoryBridge,
    pub payloads: Vec<(String, Vec<u8>)>,
}

impl RecordingBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Payloads sent to `table`, in order.
    pub fn payloads_for(&self, table: &str) -> Vec<&[u8]> {
        let needle = format!("INTO TABLE `{table}` ");
        self.payloads
            .iter()
            .filter(|(sql, _)| sql.contains(&needle))
            .map(|(_, data)| data.as_slice())
            .collect()
    }
}

impl ExecutionBridge for RecordingBridge {
    fn execute(&mut self, sql: &str) -> Result<()> {
        self.inner.execute(sql)
    }

    fn load_infile(&mut self, sql: &str, data: &[u8]) -> Result<Vec<LoadWarning>> {
        self.payloads.push((sql.to_string(), data.to_vec()));
        self.inner.load_infile(sql, data)
    }

    fn identity_seed(&mut self, table: &str, column: &str) -> Result<Option<i64>> {
        self.inner.identity_seed(table, column)
    }
}
