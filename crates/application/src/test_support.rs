//! Fake ports shared by the service tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tablekeeper_core::{AppError, AppResult, UserIdentity};
use tablekeeper_domain::{NamespacePrefix, Permission, TableName, TableVerb};
use tokio::sync::Mutex;

use crate::{
    AuditEvent, AuditRepository, AuthContext, AuthorizationRepository, AuthorizationService,
    CatalogError, CatalogRepository, CatalogResult, ExtensionRegistry, InventoryService,
    MaintenanceService, PlatformProfile,
};

#[derive(Default)]
pub(crate) struct FakeAuthorizationRepository {
    grants: Mutex<HashMap<String, Vec<Permission>>>,
}

impl FakeAuthorizationRepository {
    pub(crate) fn with_grants(subject: &str, permissions: Vec<Permission>) -> Self {
        Self {
            grants: Mutex::new(HashMap::from([(subject.to_owned(), permissions)])),
        }
    }
}

#[async_trait]
impl AuthorizationRepository for FakeAuthorizationRepository {
    async fn list_permissions_for_subject(&self, subject: &str) -> AppResult<Vec<Permission>> {
        Ok(self
            .grants
            .lock()
            .await
            .get(subject)
            .cloned()
            .unwrap_or_default())
    }

    async fn grant_permissions(&self, subject: &str, permissions: &[Permission]) -> AppResult<()> {
        let mut grants = self.grants.lock().await;
        let entry = grants.entry(subject.to_owned()).or_default();
        for permission in permissions {
            if !entry.contains(permission) {
                entry.push(*permission);
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeAuditRepository {
    pub(crate) events: Mutex<Vec<AuditEvent>>,
    pub(crate) fail: bool,
}

#[async_trait]
impl AuditRepository for FakeAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        if self.fail {
            return Err(AppError::Internal("audit store unavailable".to_owned()));
        }
        self.events.lock().await.push(event);
        Ok(())
    }
}

/// Catalog fake with per-table failure injection and call counters.
#[derive(Default)]
pub(crate) struct FakeCatalog {
    tables: Mutex<BTreeMap<String, (u64, Option<u64>)>>,
    failing: Mutex<HashMap<(String, TableVerb), String>>,
    missing_stats: Mutex<HashSet<String>>,
    ddl_calls: AtomicUsize,
    existence_checks: AtomicUsize,
}

impl FakeCatalog {
    pub(crate) fn with_tables(tables: &[(&str, u64, Option<u64>)]) -> Self {
        Self {
            tables: Mutex::new(
                tables
                    .iter()
                    .map(|(name, rows, size)| ((*name).to_owned(), (*rows, *size)))
                    .collect(),
            ),
            ..Self::default()
        }
    }

    pub(crate) async fn fail_on(&self, table: &str, verb: TableVerb, message: &str) {
        self.failing
            .lock()
            .await
            .insert((table.to_owned(), verb), message.to_owned());
    }

    pub(crate) async fn break_stats_for(&self, table: &str) {
        self.missing_stats.lock().await.insert(table.to_owned());
    }

    pub(crate) async fn table_names(&self) -> Vec<String> {
        self.tables.lock().await.keys().cloned().collect()
    }

    pub(crate) fn ddl_calls(&self) -> usize {
        self.ddl_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn existence_checks(&self) -> usize {
        self.existence_checks.load(Ordering::SeqCst)
    }

    async fn lookup(&self, table: &TableName) -> CatalogResult<(u64, Option<u64>)> {
        if self.missing_stats.lock().await.contains(table.as_str()) {
            return Err(CatalogError::Driver(format!(
                "relation \"{table}\" does not exist"
            )));
        }

        self.tables
            .lock()
            .await
            .get(table.as_str())
            .copied()
            .ok_or_else(|| CatalogError::Driver(format!("relation \"{table}\" does not exist")))
    }
}

#[async_trait]
impl CatalogRepository for FakeCatalog {
    async fn list_tables(&self) -> CatalogResult<Vec<String>> {
        Ok(self.table_names().await)
    }

    async fn count_rows(&self, table: &TableName) -> CatalogResult<u64> {
        self.lookup(table).await.map(|(rows, _)| rows)
    }

    async fn table_storage_status(&self, table: &TableName) -> CatalogResult<Option<u64>> {
        self.lookup(table).await.map(|(_, size)| size)
    }

    async fn table_exists(&self, table: &TableName) -> CatalogResult<bool> {
        self.existence_checks.fetch_add(1, Ordering::SeqCst);
        Ok(self.tables.lock().await.contains_key(table.as_str()))
    }

    async fn execute(&self, verb: TableVerb, table: &TableName) -> CatalogResult<()> {
        self.ddl_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = self
            .failing
            .lock()
            .await
            .get(&(table.as_str().to_owned(), verb))
        {
            return Err(CatalogError::Driver(message.clone()));
        }

        let mut tables = self.tables.lock().await;
        match verb {
            TableVerb::Truncate => match tables.get_mut(table.as_str()) {
                Some(entry) => {
                    *entry = (0, Some(16_384));
                    Ok(())
                }
                None => Err(CatalogError::Driver(format!(
                    "relation \"{table}\" does not exist"
                ))),
            },
            TableVerb::Drop => tables
                .remove(table.as_str())
                .map(|_| ())
                .ok_or_else(|| CatalogError::Driver(format!("table \"{table}\" does not exist"))),
        }
    }
}

pub(crate) struct FakeExtensionRegistry {
    pub(crate) active: Vec<String>,
    pub(crate) always_on: Vec<String>,
}

impl FakeExtensionRegistry {
    pub(crate) fn active(entries: &[&str]) -> Self {
        Self {
            active: entries.iter().map(|entry| (*entry).to_owned()).collect(),
            always_on: Vec::new(),
        }
    }
}

#[async_trait]
impl ExtensionRegistry for FakeExtensionRegistry {
    async fn active_extensions(&self) -> AppResult<Vec<String>> {
        Ok(self.active.clone())
    }

    async fn always_on_extensions(&self) -> AppResult<Vec<String>> {
        Ok(self.always_on.clone())
    }
}

pub(crate) struct FakePlatformProfile {
    pub(crate) prefix: NamespacePrefix,
    pub(crate) core_tables: Vec<String>,
}

impl FakePlatformProfile {
    pub(crate) fn new(prefix: &str, core_tables: &[&str]) -> Self {
        Self {
            prefix: NamespacePrefix::new(prefix).unwrap_or_else(|_| unreachable!()),
            core_tables: core_tables.iter().map(|name| (*name).to_owned()).collect(),
        }
    }
}

impl PlatformProfile for FakePlatformProfile {
    fn namespace_prefix(&self) -> &NamespacePrefix {
        &self.prefix
    }

    fn core_table_names(&self) -> Vec<String> {
        self.core_tables.clone()
    }
}

pub(crate) const OPERATOR: &str = "operator";
pub(crate) const SESSION_TOKEN: &str = "5f1d3c0e9a";

/// Services wired over shared fakes, with `OPERATOR` holding every permission.
pub(crate) struct Harness {
    pub(crate) catalog: Arc<FakeCatalog>,
    pub(crate) audit: Arc<FakeAuditRepository>,
    pub(crate) inventory: InventoryService,
    pub(crate) maintenance: MaintenanceService,
}

impl Harness {
    pub(crate) fn new(catalog: FakeCatalog, registry: FakeExtensionRegistry) -> Self {
        Self::with_audit(catalog, registry, FakeAuditRepository::default())
    }

    pub(crate) fn with_audit(
        catalog: FakeCatalog,
        registry: FakeExtensionRegistry,
        audit: FakeAuditRepository,
    ) -> Self {
        let catalog = Arc::new(catalog);
        let audit = Arc::new(audit);
        let authorization_service =
            AuthorizationService::new(Arc::new(FakeAuthorizationRepository::with_grants(
                OPERATOR,
                Permission::all().to_vec(),
            )));
        let inventory = InventoryService::new(
            catalog.clone(),
            Arc::new(registry),
            Arc::new(FakePlatformProfile::new("wp_", &["posts", "options"])),
            authorization_service.clone(),
        );
        let maintenance = MaintenanceService::new(
            catalog.clone(),
            inventory.clone(),
            authorization_service,
            audit.clone(),
        );

        Self {
            catalog,
            audit,
            inventory,
            maintenance,
        }
    }
}

pub(crate) fn operator_context() -> AuthContext {
    AuthContext::new(
        UserIdentity::new(OPERATOR),
        Some(SESSION_TOKEN.to_owned()),
        Some(SESSION_TOKEN.to_owned()),
    )
}

pub(crate) fn table(name: &str) -> TableName {
    TableName::new(name).unwrap_or_else(|_| unreachable!())
}
