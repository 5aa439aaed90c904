//! Row and batch buffers in MySQL's infile text format.
//!
//! An [`InfileDataBuffer`] owns two bounded byte regions: a row scratch area
//! that a single record is encoded into, and the batch region that complete
//! rows are packed into. A row is copied into the batch only as a whole, so
//! the batch never holds a partial row.

use crate::charset::Charset;
use infile_core::error::{CapacityError, CapacityErrorKind, Error, Result};
use infile_core::value::{Value, format_date};
use std::fmt;
use std::io::Cursor;
use tracing::trace;

/// Default batch capacity: 10 MiB.
pub const DEFAULT_INFILE_BUFFER_SIZE: usize = 10 * 1024 * 1024;

/// Default row scratch capacity: 2 KiB.
pub const DEFAULT_ROW_BUFFER_SIZE: usize = 2 * 1024;

/// The two-byte marker MySQL reads as NULL.
pub const NULL_MARKER: &[u8] = b"\\N";

const FIELD_SEPARATOR: u8 = b'\t';
const ROW_SEPARATOR: u8 = b'\n';

/// Fixed-capacity buffer collecting rows in `LOAD DATA INFILE` format.
///
/// Not synchronized; one buffer belongs to one loader.
pub struct InfileDataBuffer {
    charset: Charset,
    infile: Vec<u8>,
    infile_capacity: usize,
    row: Vec<u8>,
    row_capacity: usize,
    row_fields: usize,
}

impl InfileDataBuffer {
    /// Create a buffer with explicit capacities.
    ///
    /// The row scratch may not be larger than the batch, otherwise a valid row
    /// could fail to fit even into an empty batch.
    pub fn new(charset: Charset, infile_size: usize, row_size: usize) -> Result<Self> {
        if row_size == 0 {
            return Err(Error::config("row buffer size must be positive"));
        }
        if row_size > infile_size {
            return Err(Error::config(format!(
                "cannot create a row buffer ({row_size} bytes) larger than the infile buffer ({infile_size} bytes)"
            )));
        }
        Ok(Self {
            charset,
            infile: Vec::with_capacity(infile_size),
            infile_capacity: infile_size,
            row: Vec::with_capacity(row_size),
            row_capacity: row_size,
            row_fields: 0,
        })
    }

    /// Create a buffer with the default capacities.
    pub fn with_charset(charset: Charset) -> Self {
        Self {
            charset,
            infile: Vec::new(),
            infile_capacity: DEFAULT_INFILE_BUFFER_SIZE,
            row: Vec::with_capacity(DEFAULT_ROW_BUFFER_SIZE),
            row_capacity: DEFAULT_ROW_BUFFER_SIZE,
            row_fields: 0,
        }
    }

    /// Charset used for text fields.
    pub fn charset(&self) -> Charset {
        self.charset
    }

    /// Clear the row scratch and start a new row.
    pub fn new_row(&mut self) -> InfileRow<'_> {
        self.row.clear();
        self.row_fields = 0;
        InfileRow { buffer: self }
    }

    /// Move the current row into the batch.
    ///
    /// A newline is written first when the batch already holds a row. Returns
    /// `false`, leaving both regions untouched, if row plus separator does not
    /// fit into the remaining capacity.
    pub fn add_row_to_infile(&mut self) -> bool {
        let separator = usize::from(!self.infile.is_empty());
        if self.remaining() < self.row.len() + separator {
            trace!(
                row_len = self.row.len(),
                remaining = self.remaining(),
                "row does not fit into infile buffer"
            );
            return false;
        }
        if separator == 1 {
            self.infile.push(ROW_SEPARATOR);
        }
        self.infile.extend_from_slice(&self.row);
        true
    }

    /// The written prefix of the batch region.
    pub fn contents(&self) -> &[u8] {
        &self.infile
    }

    /// A reader over the written prefix. Clear or reset the buffer once read.
    pub fn as_reader(&self) -> Cursor<&[u8]> {
        Cursor::new(&self.infile)
    }

    /// Discard the batch contents, keeping the current row.
    pub fn clear(&mut self) {
        self.infile.clear();
    }

    /// Discard both the batch contents and the current row.
    pub fn reset(&mut self) {
        self.infile.clear();
        self.row.clear();
        self.row_fields = 0;
    }

    /// Bytes written to the batch.
    pub fn len(&self) -> usize {
        self.infile.len()
    }

    /// Whether the batch holds no rows.
    pub fn is_empty(&self) -> bool {
        self.infile.is_empty()
    }

    /// Batch capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.infile_capacity
    }

    /// Unused batch capacity in bytes.
    pub fn remaining(&self) -> usize {
        self.infile_capacity - self.infile.len()
    }

    /// Bytes in the current row.
    pub fn row_len(&self) -> usize {
        self.row.len()
    }

    /// Row scratch capacity in bytes.
    pub fn row_capacity(&self) -> usize {
        self.row_capacity
    }

    /// The current row's bytes.
    pub fn row(&self) -> &[u8] {
        &self.row
    }

    /// Append one field. `encode` writes the field body after the separator;
    /// on any failure the row is restored to its previous length.
    fn push_field<F>(&mut self, encode: F) -> Result<()>
    where
        F: FnOnce(Charset, &mut Vec<u8>) -> Result<()>,
    {
        let start = self.row.len();
        if self.row_fields > 0 {
            self.row.push(FIELD_SEPARATOR);
        }
        if let Err(err) = encode(self.charset, &mut self.row) {
            self.row.truncate(start);
            return Err(err);
        }
        if self.row.len() > self.row_capacity {
            let required = self.row.len();
            self.row.truncate(start);
            return Err(Error::Capacity(CapacityError {
                kind: CapacityErrorKind::RowOverflow,
                required,
                available: self.row_capacity,
            }));
        }
        self.row_fields += 1;
        Ok(())
    }
}

impl Default for InfileDataBuffer {
    fn default() -> Self {
        Self::with_charset(Charset::default())
    }
}

impl fmt::Debug for InfileDataBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfileDataBuffer")
            .field("charset", &self.charset)
            .field("len", &self.infile.len())
            .field("capacity", &self.infile_capacity)
            .field("row_len", &self.row.len())
            .field("row_capacity", &self.row_capacity)
            .finish()
    }
}

/// View over the row being encoded.
///
/// Every `append_*` writes a tab before all but the first field and returns
/// the view again, so fields chain with `?`:
///
/// ```
/// use infile_buffer::InfileDataBuffer;
///
/// let mut buffer = InfileDataBuffer::default();
/// buffer.new_row().append_i64(1)?.append_str("a\\b")?.append_null()?;
/// assert_eq!(buffer.row(), b"1\ta\\\\b\t\\N");
/// assert!(buffer.add_row_to_infile());
/// # Ok::<(), infile_core::Error>(())
/// ```
pub struct InfileRow<'a> {
    buffer: &'a mut InfileDataBuffer,
}

impl InfileRow<'_> {
    /// Append a single raw byte.
    pub fn append_byte(&mut self, byte: u8) -> Result<&mut Self> {
        self.buffer.push_field(|_, row| {
            row.push(byte);
            Ok(())
        })?;
        Ok(self)
    }

    /// Append raw bytes, unescaped.
    pub fn append_bytes(&mut self, bytes: &[u8]) -> Result<&mut Self> {
        self.buffer.push_field(|_, row| {
            row.extend_from_slice(bytes);
            Ok(())
        })?;
        Ok(self)
    }

    /// Append text, doubling backslashes so the server reads them literally.
    pub fn append_str(&mut self, text: &str) -> Result<&mut Self> {
        self.buffer.push_field(|charset, row| {
            if text.contains('\\') {
                charset.encode_into(&text.replace('\\', "\\\\"), row)
            } else {
                charset.encode_into(text, row)
            }
        })?;
        Ok(self)
    }

    /// Append free-form text: tabs become commas, then it is appended as text.
    pub fn append_free_text(&mut self, text: &str) -> Result<&mut Self> {
        if text.contains('\t') {
            self.append_str(&text.replace('\t', ","))
        } else {
            self.append_str(text)
        }
    }

    /// Append an integer.
    pub fn append_i64(&mut self, value: i64) -> Result<&mut Self> {
        self.append_display(&value)
    }

    /// Append a boolean as `1` or `0`.
    pub fn append_bool(&mut self, value: bool) -> Result<&mut Self> {
        self.append_byte(if value { b'1' } else { b'0' })
    }

    /// Append a date, given as days since the Unix epoch, as `yyyy-MM-dd`.
    pub fn append_date(&mut self, days: i32) -> Result<&mut Self> {
        self.append_str(&format_date(days))
    }

    /// Append the NULL marker.
    pub fn append_null(&mut self) -> Result<&mut Self> {
        self.append_bytes(NULL_MARKER)
    }

    /// Append anything printable through its display text.
    pub fn append_display(&mut self, value: &dyn fmt::Display) -> Result<&mut Self> {
        self.append_str(&value.to_string())
    }

    /// Append a dynamic value according to its kind.
    pub fn append_value(&mut self, value: &Value) -> Result<&mut Self> {
        match value {
            Value::Null => self.append_null(),
            Value::Bool(v) => self.append_bool(*v),
            Value::Text(v) => self.append_str(v),
            Value::Bytes(v) => self.append_bytes(v),
            Value::Date(_) | Value::Timestamp(_) => match value.as_epoch_days() {
                Some(days) => self.append_date(days),
                None => self.append_null(),
            },
            other => self.append_display(other),
        }
    }

    /// Finish the row, moving it into the batch. See
    /// [`InfileDataBuffer::add_row_to_infile`].
    pub fn finish(self) -> bool {
        self.buffer.add_row_to_infile()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(infile: usize, row: usize) -> InfileDataBuffer {
        InfileDataBuffer::new(Charset::Utf8, infile, row).unwrap()
    }

    fn write_row(buffer: &mut InfileDataBuffer, fields: &[&str]) {
        let mut row = buffer.new_row();
        for field in fields {
            row.append_str(field).unwrap();
        }
    }

    #[test]
    fn rejects_row_larger_than_infile() {
        let err = InfileDataBuffer::new(Charset::Utf8, 8, 16).unwrap_err();
        assert!(err.is_config());
        assert!(InfileDataBuffer::new(Charset::Utf8, 16, 16).is_ok());
    }

    #[test]
    fn separators_between_fields_only() {
        let mut buf = buffer(64, 32);
        buf.new_row()
            .append_str("a")
            .unwrap()
            .append_str("")
            .unwrap()
            .append_str("c")
            .unwrap();
        assert_eq!(buf.row(), b"a\t\tc");
    }

    #[test]
    fn leading_empty_field_still_separated() {
        let mut buf = buffer(64, 32);
        buf.new_row().append_str("").unwrap().append_str("x").unwrap();
        assert_eq!(buf.row(), b"\tx");
    }

    #[test]
    fn null_marker_in_any_position() {
        let mut buf = buffer(64, 32);
        buf.new_row()
            .append_null()
            .unwrap()
            .append_i64(7)
            .unwrap()
            .append_null()
            .unwrap();
        assert_eq!(buf.row(), b"\\N\t7\t\\N");
    }

    #[test]
    fn backslashes_are_doubled() {
        let mut buf = buffer(64, 32);
        buf.new_row().append_str(r"C:\tmp\x").unwrap();
        assert_eq!(buf.row(), br"C:\\tmp\\x");
    }

    #[test]
    fn free_text_replaces_tabs() {
        let mut buf = buffer(64, 32);
        buf.new_row().append_free_text("a\tb\\c").unwrap();
        assert_eq!(buf.row(), b"a,b\\\\c");
    }

    #[test]
    fn normal_text_keeps_tabs_verbatim() {
        let mut buf = buffer(64, 32);
        buf.new_row().append_str("a\tb").unwrap();
        assert_eq!(buf.row(), b"a\tb");
    }

    #[test]
    fn values_dispatch_by_kind() {
        let mut buf = buffer(128, 128);
        buf.new_row()
            .append_value(&Value::Bool(true))
            .unwrap()
            .append_value(&Value::Bool(false))
            .unwrap()
            .append_value(&Value::date(2012, 3, 4).unwrap())
            .unwrap()
            .append_value(&Value::Timestamp(86_400_000_000 + 5))
            .unwrap()
            .append_value(&Value::Decimal("19.99".to_string()))
            .unwrap()
            .append_value(&Value::Null)
            .unwrap();
        assert_eq!(buf.row(), b"1\t0\t2012-03-04\t1970-01-02\t19.99\t\\N");
    }

    #[test]
    fn two_rows_joined_by_one_newline() {
        let mut buf = buffer(64, 32);
        write_row(&mut buf, &["1", "a"]);
        assert!(buf.add_row_to_infile());
        write_row(&mut buf, &["2", "b"]);
        assert!(buf.add_row_to_infile());
        assert_eq!(buf.contents(), b"1\ta\n2\tb");
    }

    #[test]
    fn empty_batch_accepts_exact_fit_without_separator() {
        let mut buf = buffer(4, 4);
        write_row(&mut buf, &["abcd"]);
        assert!(buf.add_row_to_infile());
        assert_eq!(buf.contents(), b"abcd");
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    fn non_empty_batch_needs_room_for_separator() {
        // 3 bytes used, 3 remaining: a 3-byte row needs 4 with its newline.
        let mut buf = buffer(6, 4);
        write_row(&mut buf, &["abc"]);
        assert!(buf.add_row_to_infile());
        write_row(&mut buf, &["def"]);
        assert!(!buf.add_row_to_infile());
        assert_eq!(buf.contents(), b"abc");

        let mut roomy = buffer(7, 4);
        write_row(&mut roomy, &["abc"]);
        assert!(roomy.add_row_to_infile());
        write_row(&mut roomy, &["def"]);
        assert!(roomy.add_row_to_infile());
        assert_eq!(roomy.contents(), b"abc\ndef");
        assert_eq!(roomy.remaining(), 0);
    }

    #[test]
    fn row_overflow_restores_row() {
        let mut buf = buffer(64, 5);
        let mut row = buf.new_row();
        row.append_str("abc").unwrap();
        let err = row.append_str("def").err().unwrap();
        assert!(matches!(
            err,
            Error::Capacity(CapacityError {
                kind: CapacityErrorKind::RowOverflow,
                required: 7,
                available: 5,
            })
        ));
        assert_eq!(buf.row(), b"abc");
    }

    #[test]
    fn encoding_failure_restores_row() {
        let mut buf = InfileDataBuffer::new(Charset::Latin1, 64, 32).unwrap();
        let mut row = buf.new_row();
        row.append_str("ok").unwrap();
        assert!(row.append_str("€").is_err());
        assert_eq!(buf.row(), b"ok");
    }

    #[test]
    fn clear_keeps_row_reset_drops_both() {
        let mut buf = buffer(64, 32);
        write_row(&mut buf, &["x"]);
        assert!(buf.add_row_to_infile());
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.row(), b"x");
        assert!(buf.add_row_to_infile());
        buf.reset();
        assert!(buf.is_empty());
        assert_eq!(buf.row_len(), 0);
    }

    #[test]
    fn reader_exposes_written_prefix() {
        use std::io::Read;

        let mut buf = buffer(64, 32);
        assert!(buf.new_row().append_str("hello").is_ok());
        assert!(buf.add_row_to_infile());
        let mut out = Vec::new();
        buf.as_reader().read_to_end(&mut out).unwrap();
        assert_eq!(out, b"hello");
    }

    #[test]
    fn finish_adds_row() {
        let mut buf = buffer(64, 32);
        let mut row = buf.new_row();
        row.append_i64(42).unwrap();
        assert!(row.finish());
        assert_eq!(buf.contents(), b"42");
    }
}
