//! Table identifiers, namespace prefixes and size metrics.
//!
//! Every identifier that may reach a `TRUNCATE` or `DROP` statement passes
//! through [`TableName::new`]. DDL statements cannot bind identifiers as
//! parameters, so this pattern gate is the only thing standing between an
//! operator-supplied string and the catalog.

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use tablekeeper_core::{AppError, AppResult};

/// Longest identifier accepted by the catalog (PostgreSQL `NAMEDATALEN - 1`).
pub const TABLE_NAME_MAX_LENGTH: usize = 63;

/// Identity tables that are reserved regardless of what the platform reports.
pub const IDENTITY_TABLES: [&str; 2] = ["users", "usermeta"];

/// Core platform tables used when the host does not report its own list.
pub const DEFAULT_CORE_TABLES: [&str; 10] = [
    "posts",
    "postmeta",
    "comments",
    "commentmeta",
    "terms",
    "termmeta",
    "term_taxonomy",
    "term_relationships",
    "links",
    "options",
];

fn is_identifier_char(character: char) -> bool {
    character.is_ascii_alphanumeric() || character == '_'
}

/// Catalog table name validated against `^[A-Za-z0-9_]+$`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TableName(String);

impl TableName {
    /// Creates a validated table name.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();

        if value.is_empty() {
            return Err(AppError::Validation(
                "table name must not be empty".to_owned(),
            ));
        }

        if value.len() > TABLE_NAME_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "table name must not exceed {TABLE_NAME_MAX_LENGTH} characters"
            )));
        }

        if let Some(invalid) = value.chars().find(|character| !is_identifier_char(*character)) {
            return Err(AppError::Validation(format!(
                "table name '{}' contains forbidden character {invalid:?}",
                value.escape_default()
            )));
        }

        Ok(Self(value))
    }

    /// Returns the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for TableName {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TableName> for String {
    fn from(value: TableName) -> Self {
        value.0
    }
}

impl Display for TableName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Per-installation prefix separating this install's tables from co-located ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespacePrefix(String);

impl NamespacePrefix {
    /// Creates a validated prefix. An empty prefix claims every table.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if !value.chars().all(is_identifier_char) {
            return Err(AppError::Validation(format!(
                "namespace prefix '{}' may only contain ASCII letters, digits and '_'",
                value.escape_default()
            )));
        }

        Ok(Self(value))
    }

    /// Returns the prefix string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Prepends the prefix to a local table name.
    #[must_use]
    pub fn qualify(&self, local_name: &str) -> String {
        format!("{}{local_name}", self.0)
    }

    /// Returns the local part of a table name that carries this prefix.
    #[must_use]
    pub fn strip<'a>(&self, table: &'a str) -> Option<&'a str> {
        table.strip_prefix(self.0.as_str())
    }
}

/// Fully qualified table names that are never eligible for classification.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReservedTableSet {
    tables: BTreeSet<String>,
}

impl ReservedTableSet {
    /// Builds the reserved set from platform core names plus the identity tables.
    #[must_use]
    pub fn new<I, S>(prefix: &NamespacePrefix, core_table_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tables = core_table_names
            .into_iter()
            .map(|name| prefix.qualify(name.as_ref()))
            .chain(IDENTITY_TABLES.iter().map(|name| prefix.qualify(name)))
            .collect();

        Self { tables }
    }

    /// Returns whether the fully qualified table name is reserved.
    #[must_use]
    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains(table)
    }

    /// Returns the number of reserved names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Namespace rules a table must satisfy before any statement may target it.
///
/// A target must carry the installation prefix and must not be reserved.
/// Tables of co-located installs and of other applications sharing the
/// schema are therefore never touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetGuard {
    prefix: NamespacePrefix,
    reserved: ReservedTableSet,
}

impl TargetGuard {
    /// Creates a guard for one installation.
    #[must_use]
    pub fn new(prefix: NamespacePrefix, reserved: ReservedTableSet) -> Self {
        Self { prefix, reserved }
    }

    /// Returns whether truncate/drop may be issued against `table`.
    #[must_use]
    pub fn permits(&self, table: &str) -> bool {
        !self.reserved.contains(table) && self.prefix.strip(table).is_some()
    }
}

/// Row and size metrics for one table, computed on demand.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TableStats {
    rows: u64,
    size_mib: f64,
}

impl TableStats {
    /// Builds stats from a row count and an optional on-disk size in bytes.
    ///
    /// Size is reported in mebibytes rounded to two decimals, and is zero
    /// when the catalog has no storage status for the table.
    #[must_use]
    pub fn from_raw(rows: u64, size_bytes: Option<u64>) -> Self {
        let size_mib = size_bytes
            .map(|bytes| (bytes as f64 / 1024.0 / 1024.0 * 100.0).round() / 100.0)
            .unwrap_or(0.0);

        Self { rows, size_mib }
    }

    /// Returns the row count.
    #[must_use]
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Returns the size in mebibytes.
    #[must_use]
    pub fn size_mib(&self) -> f64 {
        self.size_mib
    }
}

impl Display for TableStats {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{} rows, {} MB", self.rows, self.size_mib)
    }
}
