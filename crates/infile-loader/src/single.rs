//! Loader for one table of one entity type.

use crate::projection::SchemaProjection;
use crate::sequence::IdentitySequence;
use infile_buffer::InfileDataBuffer;
use infile_core::bridge::{ExecutionBridge, LoadWarning};
use infile_core::entity::{EntityRef, borrow_entity, borrow_entity_mut};
use infile_core::error::{CapacityError, CapacityErrorKind, Error, Result};
use infile_core::value::Value;
use tracing::{debug, trace, warn};

/// Buffers rows of one [`SchemaProjection`] and streams them to the bridge
/// whenever the batch fills up.
///
/// Call [`flush`](Self::flush) after the last [`add`](Self::add); rows left
/// in the batch are otherwise never sent.
#[derive(Debug)]
pub struct SingleEntityLoader {
    projection: SchemaProjection,
    buffer: InfileDataBuffer,
    sequence: IdentitySequence,
    warnings: Vec<LoadWarning>,
    rows_added: usize,
    flush_count: usize,
}

impl SingleEntityLoader {
    /// Bind `projection` to `buffer`. The buffer is reset.
    pub fn new(projection: SchemaProjection, buffer: InfileDataBuffer) -> Self {
        Self::with_sequence(projection, buffer, IdentitySequence::new())
    }

    /// Like [`new`](Self::new), continuing key generation from `sequence`.
    pub fn with_sequence(
        projection: SchemaProjection,
        mut buffer: InfileDataBuffer,
        sequence: IdentitySequence,
    ) -> Self {
        buffer.reset();
        Self {
            projection,
            buffer,
            sequence,
            warnings: Vec::new(),
            rows_added: 0,
            flush_count: 0,
        }
    }

    /// Encode `entity` as a row, flushing first if the batch is full.
    ///
    /// An auto-generated identity is assigned before the row is rendered, so
    /// it is visible on the entity as soon as this returns.
    pub fn add(&mut self, entity: &EntityRef, bridge: &mut dyn ExecutionBridge) -> Result<()> {
        if self.projection.auto_generate() {
            self.ensure_identity(entity, bridge)?;
        }

        {
            let record = borrow_entity(entity, self.projection.entity())?;
            let mut row = self.buffer.new_row();
            self.projection.render_row(&*record, &mut row)?;
        }

        if !self.buffer.add_row_to_infile() {
            self.flush(bridge)?;
            if !self.buffer.add_row_to_infile() {
                return Err(Error::Capacity(CapacityError {
                    kind: CapacityErrorKind::BatchOverflow,
                    required: self.buffer.row_len(),
                    available: self.buffer.remaining(),
                }));
            }
        }
        self.rows_added += 1;
        Ok(())
    }

    fn ensure_identity(&mut self, entity: &EntityRef, bridge: &mut dyn ExecutionBridge) -> Result<()> {
        let identity = self.projection.identity();
        if !self.sequence.is_seeded() {
            let seed = bridge.identity_seed(self.projection.table(), identity.column)?;
            self.sequence.seed(seed);
        }

        let current = borrow_entity(entity, identity.field)?.identity()?;
        if current.is_null() {
            let id = self.sequence.next_value()?;
            trace!(table = self.projection.table(), id, "generated identity");
            borrow_entity_mut(entity, identity.field)?.assign(identity.field, Value::BigInt(id))?;
        } else if let Some(id) = current.as_i64() {
            self.sequence.observe(id);
        }
        Ok(())
    }

    /// Send the batch to the bridge and clear it. An empty batch sends nothing.
    ///
    /// Warnings returned by the bridge are appended to [`warnings`](Self::warnings).
    #[tracing::instrument(level = "debug", skip(self, bridge), fields(table = self.projection.table()))]
    pub fn flush(&mut self, bridge: &mut dyn ExecutionBridge) -> Result<()> {
        if self.buffer.is_empty() {
            trace!("nothing to flush");
            return Ok(());
        }

        let statement = self.projection.statement();
        trace!(sql = statement, bytes = self.buffer.len(), "LOAD DATA");
        let warnings = bridge
            .load_infile(statement, self.buffer.contents())
            .map_err(|e| match e {
                Error::Load(mut load) if load.sql.is_none() => {
                    load.sql = Some(statement.to_string());
                    Error::Load(load)
                }
                other => other,
            })?;

        if !warnings.is_empty() {
            warn!(
                count = warnings.len(),
                first = %warnings[0],
                "LOAD DATA reported warnings"
            );
        }
        self.warnings.extend(warnings);
        self.buffer.clear();
        self.flush_count += 1;
        debug!(flushes = self.flush_count, "flushed infile batch");
        Ok(())
    }

    /// Every warning returned by every flush so far, oldest first.
    pub fn warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    /// Take the accumulated warnings, leaving the list empty.
    pub fn take_warnings(&mut self) -> Vec<LoadWarning> {
        std::mem::take(&mut self.warnings)
    }

    /// Rows added since construction.
    pub fn rows_added(&self) -> usize {
        self.rows_added
    }

    /// Statements issued since construction.
    pub fn flush_count(&self) -> usize {
        self.flush_count
    }

    /// The key sequence of this table.
    pub fn sequence(&self) -> IdentitySequence {
        self.sequence
    }

    /// The projection this loader writes.
    pub fn projection(&self) -> &SchemaProjection {
        &self.projection
    }

    /// The batch buffer.
    pub fn buffer(&self) -> &InfileDataBuffer {
        &self.buffer
    }

    /// Discard buffered rows without sending them.
    pub fn reset(&mut self) {
        self.buffer.reset();
    }
}
