//! Row and batch buffers for `LOAD DATA INFILE` bulk loading.
//!
//! Rows are encoded field by field into a bounded scratch area, then moved
//! whole into a bounded batch region that is streamed to the server when
//! full. Format: tab between fields, newline between rows, `\N` for NULL,
//! backslashes doubled, dates as `yyyy-MM-dd`, booleans as `1`/`0`.

pub mod buffer;
pub mod charset;

pub use buffer::{
    DEFAULT_INFILE_BUFFER_SIZE, DEFAULT_ROW_BUFFER_SIZE, InfileDataBuffer, InfileRow, NULL_MARKER,
};
pub use charset::Charset;
