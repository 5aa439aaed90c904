//! Text encodings supported by the infile encoder.

use infile_core::error::{EncodingError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Character set used to encode text fields.
///
/// Must match the `CHARACTER SET` the server assumes for the infile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Charset {
    /// UTF-8 (`utf8mb4`).
    #[default]
    Utf8,
    /// ISO-8859-1 (`latin1`); characters above U+00FF cannot be encoded.
    Latin1,
}

impl Charset {
    /// Canonical name, as used in error messages.
    pub const fn name(self) -> &'static str {
        match self {
            Charset::Utf8 => "UTF-8",
            Charset::Latin1 => "ISO-8859-1",
        }
    }

    /// Encode `text` onto the end of `out`.
    ///
    /// On failure `out` may hold a partial encoding; callers truncate.
    pub fn encode_into(self, text: &str, out: &mut Vec<u8>) -> Result<()> {
        match self {
            Charset::Utf8 => out.extend_from_slice(text.as_bytes()),
            Charset::Latin1 => {
                out.reserve(text.len());
                for (position, character) in text.chars().enumerate() {
                    let byte = u8::try_from(u32::from(character)).map_err(|_| EncodingError {
                        charset: self.name(),
                        character,
                        position,
                    })?;
                    out.push(byte);
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
