//! In-memory execution bridge.
//!
//! [`MemoryBridge`] accepts the statements the loaders issue, parses the
//! `LOAD DATA LOCAL INFILE` column list and decodes the infile bytes into
//! in-memory tables. It reports the same per-row warnings MySQL does when a
//! row's field count does not match the column list, which makes it useful
//! for exercising loaders end to end without a server.

use infile_core::bridge::{ExecutionBridge, LoadWarning};
use infile_core::error::{Error, LoadError, Result};
use infile_core::identifiers::{split_ident_list, unquote_ident_mysql};
use regex::{Regex, RegexBuilder};
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;
use tracing::{debug, trace};

/// MySQL warning code: a row has fewer fields than the column list.
pub const WARN_TOO_FEW_FIELDS: u16 = 1261;
/// MySQL warning code: a row has more fields than the column list.
pub const WARN_TOO_MANY_FIELDS: u16 = 1262;

fn load_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            RegexBuilder::new(
                r"^\s*LOAD\s+DATA\s+LOCAL\s+INFILE\s+'[^']*'\s+INTO\s+TABLE\s+(`(?:[^`]|``)+`|\w+)\s*\((.*)\)\s*;?\s*$",
            )
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build()
            .ok()
        })
        .as_ref()
}

fn fk_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            RegexBuilder::new(r"^\s*SET\s+FOREIGN_KEY_CHECKS\s*=\s*([01])\s*;?\s*$")
                .case_insensitive(true)
                .build()
                .ok()
        })
        .as_ref()
}

fn load_error(sql: &str, message: impl Into<String>) -> Error {
    Error::Load(LoadError {
        sql: Some(sql.to_string()),
        message: message.into(),
        source: None,
    })
}

/// A parsed `LOAD DATA LOCAL INFILE` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadStatement {
    /// Target table.
    pub table: String,
    /// Column list, in infile field order.
    pub columns: Vec<String>,
}

impl LoadStatement {
    /// Parse a bulk-load statement; `None` if `sql` is not one.
    pub fn parse(sql: &str) -> Option<Self> {
        let caps = load_pattern()?.captures(sql)?;
        Some(Self {
            table: unquote_ident_mysql(&caps[1]),
            columns: split_ident_list(&caps[2]),
        })
    }
}

/// Rows stored for one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryTable {
    columns: Vec<String>,
    rows: Vec<HashMap<String, Option<String>>>,
}

impl MemoryTable {
    /// Create a table with declared columns.
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Known columns, in first-seen order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// A cell; `None` for NULL, for an unknown column or a row out of range.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        self.rows.get(row)?.get(column)?.as_deref()
    }

    /// A row in column order, `None` entries being NULL.
    pub fn row(&self, row: usize) -> Option<Vec<Option<&str>>> {
        let cells = self.rows.get(row)?;
        Some(
            self.columns
                .iter()
                .map(|c| cells.get(c).and_then(|v| v.as_deref()))
                .collect(),
        )
    }

    /// All values of one column, in row order.
    pub fn column_values(&self, column: &str) -> Vec<Option<&str>> {
        self.rows
            .iter()
            .map(|r| r.get(column).and_then(|v| v.as_deref()))
            .collect()
    }

    fn ensure_columns(&mut self, columns: &[String]) {
        for column in columns {
            if !self.columns.contains(column) {
                self.columns.push(column.clone());
            }
        }
    }

    fn max_integer(&self, column: &str) -> Option<i64> {
        self.rows
            .iter()
            .filter_map(|r| r.get(column)?.as_deref()?.parse::<i64>().ok())
            .max()
    }
}

/// Decode one infile field: `\N` is NULL, other backslash sequences unescape.
fn decode_field(raw: &[u8]) -> Option<String> {
    if raw == b"\\N" {
        return None;
    }
    let mut out = Vec::with_capacity(raw.len());
    let mut bytes = raw.iter();
    while let Some(&b) = bytes.next() {
        if b != b'\\' {
            out.push(b);
            continue;
        }
        match bytes.next() {
            Some(b'0') => out.push(0),
            Some(b'b') => out.push(0x08),
            Some(b'n') => out.push(b'\n'),
            Some(b'r') => out.push(b'\r'),
            Some(b't') => out.push(b'\t'),
            Some(b'Z') => out.push(0x1a),
            Some(&other) => out.push(other),
            None => out.push(b'\\'),
        }
    }
    Some(String::from_utf8_lossy(&out).into_owned())
}

/// An [`ExecutionBridge`] backed by in-memory tables.
///
/// Text is decoded as UTF-8; invalid sequences are replaced.
///
/// ```
/// use infile_core::ExecutionBridge;
/// use infile_memory::MemoryBridge;
///
/// let mut bridge = MemoryBridge::new();
/// let warnings = bridge.load_infile(
///     "LOAD DATA LOCAL INFILE 'stream' INTO TABLE `customer` (`id`, `last_seen_on`)",
///     b"1\t\\N\n2\t2012-01-01",
/// )?;
/// assert!(warnings.is_empty());
/// let customer = bridge.table("customer").unwrap();
/// assert_eq!(customer.row(1), Some(vec![Some("2"), Some("2012-01-01")]));
/// # Ok::<(), infile_core::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct MemoryBridge {
    tables: BTreeMap<String, MemoryTable>,
    statements: Vec<String>,
    foreign_key_checks: bool,
    strict: bool,
    fail_next: Option<String>,
    loads: usize,
}

impl Default for MemoryBridge {
    fn default() -> Self {
        Self {
            tables: BTreeMap::new(),
            statements: Vec::new(),
            foreign_key_checks: true,
            strict: false,
            fail_next: None,
            loads: 0,
        }
    }
}

impl MemoryBridge {
    /// A bridge that creates tables on first load.
    pub fn new() -> Self {
        Self::default()
    }

    /// A bridge that only loads into tables declared with [`create_table`](Self::create_table).
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    /// Declare a table.
    pub fn create_table<S: Into<String>>(
        &mut self,
        name: impl Into<String>,
        columns: impl IntoIterator<Item = S>,
    ) -> &mut Self {
        self.tables.insert(name.into(), MemoryTable::new(columns));
        self
    }

    /// Make the next load fail with `message`.
    pub fn fail_next_load(&mut self, message: impl Into<String>) {
        self.fail_next = Some(message.into());
    }

    /// A table by name.
    pub fn table(&self, name: &str) -> Option<&MemoryTable> {
        self.tables.get(name)
    }

    /// Table names, sorted.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    /// Rows stored in a table, 0 if it does not exist.
    pub fn row_count(&self, table: &str) -> usize {
        self.tables.get(table).map_or(0, MemoryTable::len)
    }

    /// Every statement received, in order.
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// Bulk-load statements received.
    pub fn load_count(&self) -> usize {
        self.loads
    }

    /// Whether foreign key checks are on.
    pub fn foreign_key_checks(&self) -> bool {
        self.foreign_key_checks
    }
}

impl ExecutionBridge for MemoryBridge {
    fn execute(&mut self, sql: &str) -> Result<()> {
        self.statements.push(sql.to_string());
        let Some(caps) = fk_pattern().and_then(|re| re.captures(sql)) else {
            return Err(load_error(sql, "unsupported statement"));
        };
        self.foreign_key_checks = &caps[1] == "1";
        trace!(enabled = self.foreign_key_checks, "foreign key checks");
        Ok(())
    }

    fn load_infile(&mut self, sql: &str, data: &[u8]) -> Result<Vec<LoadWarning>> {
        self.statements.push(sql.to_string());
        if let Some(message) = self.fail_next.take() {
            return Err(load_error(sql, message));
        }
        let statement = LoadStatement::parse(sql)
            .ok_or_else(|| load_error(sql, "not a LOAD DATA LOCAL INFILE statement"))?;

        if self.strict && !self.tables.contains_key(&statement.table) {
            return Err(load_error(
                sql,
                format!("Table '{}' doesn't exist", statement.table),
            ));
        }
        let table = self.tables.entry(statement.table.clone()).or_default();
        table.ensure_columns(&statement.columns);

        let mut warnings = Vec::new();
        let mut loaded = 0usize;
        if !data.is_empty() {
            for (index, line) in data.split(|&b| b == b'\n').enumerate() {
                let row_number = index + 1;
                let fields: Vec<&[u8]> = line.split(|&b| b == b'\t').collect();
                if fields.len() < statement.columns.len() {
                    warnings.push(LoadWarning::warning(
                        WARN_TOO_FEW_FIELDS,
                        format!("Row {row_number} doesn't contain data for all columns"),
                    ));
                } else if fields.len() > statement.columns.len() {
                    warnings.push(LoadWarning::warning(
                        WARN_TOO_MANY_FIELDS,
                        format!(
                            "Row {row_number} was truncated; it contained more data than there were input columns"
                        ),
                    ));
                }
                let row = statement
                    .columns
                    .iter()
                    .enumerate()
                    .map(|(i, column)| {
                        (column.clone(), fields.get(i).and_then(|f| decode_field(f)))
                    })
                    .collect();
                table.rows.push(row);
                loaded += 1;
            }
        }

        self.loads += 1;
        debug!(
            table = %statement.table,
            rows = loaded,
            warnings = warnings.len(),
            "loaded infile"
        );
        Ok(warnings)
    }

    fn identity_seed(&mut self, table: &str, column: &str) -> Result<Option<i64>> {
        Ok(self.tables.get(table).and_then(|t| t.max_integer(column)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUSTOMER_LOAD: &str =
        "LOAD DATA LOCAL INFILE 'stream' INTO TABLE `customer` (`id`, `last_seen_on`)";

    #[test]
    fn parses_quoted_and_bare_statements() {
        let parsed = LoadStatement::parse(CUSTOMER_LOAD).unwrap();
        assert_eq!(parsed.table, "customer");
        assert_eq!(parsed.columns, vec!["id", "last_seen_on"]);

        let bare =
            LoadStatement::parse("load data local infile 'stream' into table product (id, title)")
                .unwrap();
        assert_eq!(bare.table, "product");
        assert_eq!(bare.columns, vec!["id", "title"]);

        assert!(LoadStatement::parse("SELECT 1").is_none());
    }

    #[test]
    fn decodes_null_and_escapes() {
        let mut bridge = MemoryBridge::new();
        let warnings = bridge
            .load_infile(CUSTOMER_LOAD, b"1\t\\N\n2\tC:\\\\tmp")
            .unwrap();
        assert!(warnings.is_empty());
        let table = bridge.table("customer").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.value(0, "last_seen_on"), None);
        assert_eq!(table.value(1, "last_seen_on"), Some("C:\\tmp"));
    }

    #[test]
    fn field_count_mismatch_warns() {
        let mut bridge = MemoryBridge::new();
        let warnings = bridge
            .load_infile(CUSTOMER_LOAD, b"1\n2\t\\N\textra")
            .unwrap();
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].code, WARN_TOO_FEW_FIELDS);
        assert_eq!(
            warnings[0].message,
            "Row 1 doesn't contain data for all columns"
        );
        assert_eq!(warnings[1].code, WARN_TOO_MANY_FIELDS);
        assert_eq!(bridge.table("customer").unwrap().row(0), Some(vec![Some("1"), None]));
    }

    #[test]
    fn empty_infile_loads_nothing() {
        let mut bridge = MemoryBridge::new();
        assert!(bridge.load_infile(CUSTOMER_LOAD, b"").unwrap().is_empty());
        assert_eq!(bridge.row_count("customer"), 0);
        assert_eq!(bridge.load_count(), 1);
    }

    #[test]
    fn foreign_key_checks_toggle() {
        let mut bridge = MemoryBridge::new();
        assert!(bridge.foreign_key_checks());
        bridge.disable_foreign_key_checks().unwrap();
        assert!(!bridge.foreign_key_checks());
        bridge.execute("SET FOREIGN_KEY_CHECKS = 1;").unwrap();
        assert!(bridge.foreign_key_checks());
        assert!(bridge.execute("DROP TABLE customer").is_err());
    }

    #[test]
    fn identity_seed_is_column_max() {
        let mut bridge = MemoryBridge::new();
        assert_eq!(bridge.identity_seed("customer", "id").unwrap(), None);
        bridge
            .load_infile(CUSTOMER_LOAD, b"3\t\\N\n11\t\\N\n7\t\\N")
            .unwrap();
        assert_eq!(bridge.identity_seed("customer", "id").unwrap(), Some(11));
    }

    #[test]
    fn strict_bridge_rejects_unknown_tables() {
        let mut bridge = MemoryBridge::strict();
        let err = bridge.load_infile(CUSTOMER_LOAD, b"1\t\\N").unwrap_err();
        assert!(err.sql().is_some());
        bridge.create_table("customer", ["id", "last_seen_on"]);
        assert!(bridge.load_infile(CUSTOMER_LOAD, b"1\t\\N").is_ok());
        assert_eq!(bridge.row_count("customer"), 1);
    }

    #[test]
    fn injected_failure_applies_once() {
        let mut bridge = MemoryBridge::new();
        bridge.fail_next_load("server has gone away");
        let err = bridge.load_infile(CUSTOMER_LOAD, b"1\t\\N").unwrap_err();
        assert!(err.to_string().contains("server has gone away"));
        assert!(bridge.load_infile(CUSTOMER_LOAD, b"1\t\\N").is_ok());
    }

    #[test]
    fn columns_merge_across_loads() {
        let mut bridge = MemoryBridge::new();
        bridge
            .load_infile(
                "LOAD DATA LOCAL INFILE 'stream' INTO TABLE `t` (`a`)",
                b"x",
            )
            .unwrap();
        bridge
            .load_infile(
                "LOAD DATA LOCAL INFILE 'stream' INTO TABLE `t` (`b`)",
                b"y",
            )
            .unwrap();
        let table = bridge.table("t").unwrap();
        assert_eq!(table.columns(), ["a", "b"]);
        assert_eq!(table.row(0), Some(vec![Some("x"), None]));
        assert_eq!(table.row(1), Some(vec![None, Some("y")]));
    }
}
