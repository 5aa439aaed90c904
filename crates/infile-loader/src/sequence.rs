//! Client-side identity generation.

use infile_core::error::{Error, Result};

/// Monotonic per-table key sequence.
///
/// Unseeded until the first generated key; seeding sets the last value known
/// to be in use, so the first generated key is `seed + 1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentitySequence {
    last: Option<i64>,
}

impl IdentitySequence {
    /// An unseeded sequence.
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// Whether a seed has been applied or a key has been generated.
    pub const fn is_seeded(&self) -> bool {
        self.last.is_some()
    }

    /// Set the highest key already in use; `None` means the table is empty.
    pub fn seed(&mut self, last: Option<i64>) {
        self.last = Some(last.unwrap_or(0));
    }

    /// Record a caller-assigned key so later generated keys do not collide with it.
    pub fn observe(&mut self, value: i64) {
        self.last = Some(self.last.map_or(value, |last| last.max(value)));
    }

    /// The most recently generated or observed key.
    pub const fn current(&self) -> Option<i64> {
        self.last
    }

    /// Generate the next key.
    pub fn next_value(&mut self) -> Result<i64> {
        let next = self
            .last
            .unwrap_or(0)
            .checked_add(1)
            .ok_or_else(|| Error::config("identity sequence exhausted"))?;
        self.last = Some(next);
        Ok(next)
    }
}
