use async_trait::async_trait;
use tablekeeper_core::{AppError, AppResult};
use tablekeeper_domain::{NamespacePrefix, TableName, TableVerb};
use thiserror::Error;

/// Result type for catalog calls.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Failure reported by the database engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The engine rejected the statement. The text is the driver message verbatim.
    #[error("{0}")]
    Driver(String),
}

impl From<CatalogError> for AppError {
    fn from(value: CatalogError) -> Self {
        match value {
            CatalogError::Driver(message) => {
                AppError::Internal(format!("catalog query failed: {message}"))
            }
        }
    }
}

/// Port over the database catalog and its destructive statements.
///
/// Calls are awaited one at a time. No locking is taken across calls, so a
/// table may disappear between `list_tables` and a later statement.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Lists every base table name in the configured schema, unvalidated.
    async fn list_tables(&self) -> CatalogResult<Vec<String>>;

    /// Counts rows in a table.
    async fn count_rows(&self, table: &TableName) -> CatalogResult<u64>;

    /// Returns the on-disk size in bytes, or `None` when the engine has no status.
    async fn table_storage_status(&self, table: &TableName) -> CatalogResult<Option<u64>>;

    /// Checks the information schema for the table.
    async fn table_exists(&self, table: &TableName) -> CatalogResult<bool>;

    /// Runs `TRUNCATE` or `DROP` against the table.
    async fn execute(&self, verb: TableVerb, table: &TableName) -> CatalogResult<()>;
}

/// Port over the host's extension registry.
#[async_trait]
pub trait ExtensionRegistry: Send + Sync {
    /// Returns raw entries of the standard active-extension list (e.g. `shop/shop.php`).
    async fn active_extensions(&self) -> AppResult<Vec<String>>;

    /// Returns file paths of extensions loaded outside the standard registry.
    async fn always_on_extensions(&self) -> AppResult<Vec<String>>;
}

/// Host platform facts needed to scope classification.
pub trait PlatformProfile: Send + Sync {
    /// Returns this installation's table prefix.
    fn namespace_prefix(&self) -> &NamespacePrefix;

    /// Returns the local names of the platform's core tables.
    fn core_table_names(&self) -> Vec<String>;
}
