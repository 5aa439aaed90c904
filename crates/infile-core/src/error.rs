//! Error types for infile loading operations.

use std::fmt;

/// The primary error type for all infile loading operations.
#[derive(Debug)]
pub enum Error {
    /// Configuration and precondition errors (buffer sizes, missing bridge)
    Config(ConfigError),
    /// Schema descriptor errors (missing identity, bad join columns)
    Schema(SchemaError),
    /// Row or batch capacity exhausted
    Capacity(CapacityError),
    /// Text that cannot be represented in the configured charset
    Encoding(EncodingError),
    /// Field, relation, or identity access failed on an entity
    Accessor(AccessorError),
    /// The execution bridge failed to run a statement
    Load(LoadError),
    /// I/O errors
    Io(std::io::Error),
    /// Custom error with message
    Custom(String),
}

#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug)]
pub struct SchemaError {
    pub kind: SchemaErrorKind,
    pub entity: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorKind {
    /// The type has no table declaration
    MissingTable,
    /// The type declares no identity
    MissingIdentity,
    /// A secondary table does not declare exactly one pk join column
    JoinColumns,
    /// A column name is empty
    EmptyColumn,
    /// The same column name is projected twice
    DuplicateColumn,
}

#[derive(Debug)]
pub struct CapacityError {
    pub kind: CapacityErrorKind,
    pub required: usize,
    pub available: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityErrorKind {
    /// A field does not fit in the row scratch area
    RowOverflow,
    /// A complete row does not fit even in an empty batch
    BatchOverflow,
}

#[derive(Debug)]
pub struct EncodingError {
    pub charset: &'static str,
    pub character: char,
    pub position: usize,
}

#[derive(Debug)]
pub struct AccessorError {
    pub kind: AccessorErrorKind,
    pub entity: &'static str,
    pub name: String,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorErrorKind {
    /// No field with this name
    UnknownField,
    /// No embedded value with this name
    UnknownEmbedded,
    /// No relationship with this name
    UnknownRelation,
    /// The value could not be assigned to the field
    Assign,
    /// The entity is already mutably borrowed
    Borrow,
}

#[derive(Debug)]
pub struct LoadError {
    pub sql: Option<String>,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Build a configuration error from a message.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(ConfigError {
            message: message.into(),
            source: None,
        })
    }

    /// Build a schema error for an entity type.
    pub fn schema(kind: SchemaErrorKind, entity: &'static str, message: impl Into<String>) -> Self {
        Error::Schema(SchemaError {
            kind,
            entity,
            message: message.into(),
        })
    }

    /// Build an accessor error for an entity type.
    pub fn accessor(kind: AccessorErrorKind, entity: &'static str, name: impl Into<String>) -> Self {
        Error::Accessor(AccessorError {
            kind,
            entity,
            name: name.into(),
            message: None,
        })
    }

    /// Shorthand for an unknown field on `entity`.
    pub fn unknown_field(entity: &'static str, field: &str) -> Self {
        Self::accessor(AccessorErrorKind::UnknownField, entity, field)
    }

    /// Shorthand for an unknown relationship on `entity`.
    pub fn unknown_relation(entity: &'static str, relation: &str) -> Self {
        Self::accessor(AccessorErrorKind::UnknownRelation, entity, relation)
    }

    /// Is this a capacity error (row or batch)?
    pub fn is_capacity(&self) -> bool {
        matches!(self, Error::Capacity(_))
    }

    /// Is this a precondition or configuration error?
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    /// Get the SQL that caused this error, if available
    pub fn sql(&self) -> Option<&str> {
        match self {
            Error::Load(e) => e.sql.as_deref(),
            _ => None,
        }
    }
}

impl AccessorError {
    /// Attach a detail message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e.message),
            Error::Schema(e) => write!(f, "Schema error on '{}': {}", e.entity, e.message),
            Error::Capacity(e) => write!(f, "Capacity error: {}", e),
            Error::Encoding(e) => write!(f, "Encoding error: {}", e),
            Error::Accessor(e) => write!(f, "Accessor error: {}", e),
            Error::Load(e) => {
                if let Some(sql) = &e.sql {
                    write!(f, "Load error: {} (while executing '{}')", e.message, sql)
                } else {
                    write!(f, "Load error: {}", e.message)
                }
            }
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Load(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.entity, self.message)
    }
}

impl fmt::Display for CapacityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            CapacityErrorKind::RowOverflow => write!(
                f,
                "row buffer overflow: {} bytes required, {} available",
                self.required, self.available
            ),
            CapacityErrorKind::BatchOverflow => write!(
                f,
                "cannot add row of {} bytes to infile, even though infile has been flushed ({} available)",
                self.required, self.available
            ),
        }
    }
}

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "character {:?} at position {} cannot be encoded as {}",
            self.character, self.position, self.charset
        )
    }
}

impl fmt::Display for AccessorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            AccessorErrorKind::UnknownField => "unknown field",
            AccessorErrorKind::UnknownEmbedded => "unknown embedded value",
            AccessorErrorKind::UnknownRelation => "unknown relationship",
            AccessorErrorKind::Assign => "cannot assign field",
            AccessorErrorKind::Borrow => "entity already borrowed while accessing",
        };
        write!(f, "{} '{}' on {}", what, self.name, self.entity)?;
        if let Some(message) = &self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for EncodingError {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl From<SchemaError> for Error {
    fn from(err: SchemaError) -> Self {
        Error::Schema(err)
    }
}

impl From<CapacityError> for Error {
    fn from(err: CapacityError) -> Self {
        Error::Capacity(err)
    }
}

impl From<EncodingError> for Error {
    fn from(err: EncodingError) -> Self {
        Error::Encoding(err)
    }
}

impl From<AccessorError> for Error {
    fn from(err: AccessorError) -> Self {
        Error::Accessor(err)
    }
}

impl From<LoadError> for Error {
    fn from(err: LoadError) -> Self {
        Error::Load(err)
    }
}

/// Result type alias for infile operations.
pub type Result<T> = std::result::Result<T, Error>;
