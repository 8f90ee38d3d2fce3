use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use tablekeeper_application::{CatalogError, CatalogRepository, CatalogResult};
use tablekeeper_domain::{TableName, TableVerb};

/// Storage reported for a table right after it is truncated.
const EMPTY_TABLE_BYTES: u64 = 16_384;

#[derive(Debug, Clone, Copy)]
struct TableEntry {
    rows: u64,
    size_bytes: Option<u64>,
}

/// In-memory catalog used by tests and the `memory` dev backend.
///
/// Driver messages mirror the wording PostgreSQL uses so that reports read
/// the same on both backends.
#[derive(Debug, Default)]
pub struct InMemoryCatalogRepository {
    tables: RwLock<BTreeMap<String, TableEntry>>,
    failures: RwLock<HashMap<(String, TableVerb), String>>,
    listing_failure: RwLock<Option<String>>,
    statements: AtomicUsize,
}

impl InMemoryCatalogRepository {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog seeded with `(name, rows, size_bytes)` entries.
    #[must_use]
    pub fn with_tables<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = (S, u64, Option<u64>)>,
        S: Into<String>,
    {
        let tables = tables
            .into_iter()
            .map(|(name, rows, size_bytes)| (name.into(), TableEntry { rows, size_bytes }))
            .collect();

        Self {
            tables: RwLock::new(tables),
            ..Self::default()
        }
    }

    /// Adds or replaces one table.
    pub async fn insert_table(&self, name: impl Into<String>, rows: u64, size_bytes: Option<u64>) {
        self.tables
            .write()
            .await
            .insert(name.into(), TableEntry { rows, size_bytes });
    }

    /// Makes the next and every later `verb` on `table` fail with `message`.
    pub async fn fail_on(&self, table: &str, verb: TableVerb, message: impl Into<String>) {
        self.failures
            .write()
            .await
            .insert((table.to_owned(), verb), message.into());
    }

    /// Makes every later catalog listing fail with `message`.
    pub async fn fail_listing(&self, message: impl Into<String>) {
        *self.listing_failure.write().await = Some(message.into());
    }

    /// Returns how many truncate/drop statements were attempted.
    #[must_use]
    pub fn statement_count(&self) -> usize {
        self.statements.load(Ordering::SeqCst)
    }

    async fn entry(&self, table: &TableName) -> CatalogResult<TableEntry> {
        self.tables
            .read()
            .await
            .get(table.as_str())
            .copied()
            .ok_or_else(|| missing_relation(table))
    }
}

fn missing_relation(table: &TableName) -> CatalogError {
    CatalogError::Driver(format!("relation \"{table}\" does not exist"))
}

#[async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn list_tables(&self) -> CatalogResult<Vec<String>> {
        if let Some(message) = self.listing_failure.read().await.as_ref() {
            return Err(CatalogError::Driver(message.clone()));
        }

        Ok(self.tables.read().await.keys().cloned().collect())
    }

    async fn count_rows(&self, table: &TableName) -> CatalogResult<u64> {
        self.entry(table).await.map(|entry| entry.rows)
    }

    async fn table_storage_status(&self, table: &TableName) -> CatalogResult<Option<u64>> {
        Ok(self
            .tables
            .read()
            .await
            .get(table.as_str())
            .and_then(|entry| entry.size_bytes))
    }

    async fn table_exists(&self, table: &TableName) -> CatalogResult<bool> {
        Ok(self.tables.read().await.contains_key(table.as_str()))
    }

    async fn execute(&self, verb: TableVerb, table: &TableName) -> CatalogResult<()> {
        self.statements.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = self
            .failures
            .read()
            .await
            .get(&(table.as_str().to_owned(), verb))
        {
            return Err(CatalogError::Driver(message.clone()));
        }

        let mut tables = self.tables.write().await;
        match verb {
            TableVerb::Truncate => {
                let entry = tables
                    .get_mut(table.as_str())
                    .ok_or_else(|| missing_relation(table))?;
                entry.rows = 0;
                entry.size_bytes = Some(EMPTY_TABLE_BYTES);
            }
            TableVerb::Drop => {
                tables.remove(table.as_str()).ok_or_else(|| {
                    CatalogError::Driver(format!("table \"{table}\" does not exist"))
                })?;
            }
        }

        Ok(())
    }
}
