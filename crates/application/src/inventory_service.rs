use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tablekeeper_core::{AppResult, UserIdentity};
use tablekeeper_domain::{
    ExtensionIdentifier, NamespacePrefix, Permission, ReservedTableSet, TableName, TableStats,
    TargetGuard,
};
use tracing::{debug, warn};

use crate::{
    AuthorizationService, CatalogRepository, CatalogResult, ExtensionRegistry, PlatformProfile,
};

/// Inactive tables keyed by name, ordered for a stable rendering.
pub type InactiveTables = BTreeMap<TableName, TableStats>;

/// Read-only classifier over the catalog and the extension registry.
#[derive(Clone)]
pub struct InventoryService {
    catalog: Arc<dyn CatalogRepository>,
    extension_registry: Arc<dyn ExtensionRegistry>,
    platform_profile: Arc<dyn PlatformProfile>,
    authorization_service: AuthorizationService,
}

impl InventoryService {
    /// Creates a new inventory service.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        extension_registry: Arc<dyn ExtensionRegistry>,
        platform_profile: Arc<dyn PlatformProfile>,
        authorization_service: AuthorizationService,
    ) -> Self {
        Self {
            catalog,
            extension_registry,
            platform_profile,
            authorization_service,
        }
    }

    /// Lists inactive tables for an operator allowed to read the inventory.
    pub async fn list_inactive_tables(&self, actor: &UserIdentity) -> AppResult<InactiveTables> {
        self.authorization_service
            .require_permission(actor, Permission::TableInventoryRead)
            .await?;

        self.find_inactive_tables().await
    }

    /// Classifies the current catalog and collects stats for every orphaned table.
    ///
    /// A failed stats lookup for one table (for example a concurrent drop)
    /// yields zeroed stats for that table rather than failing the inventory.
    pub async fn find_inactive_tables(&self) -> AppResult<InactiveTables> {
        let active_prefixes = self.active_prefixes().await?;
        let tables = self.catalog.list_tables().await?;
        let prefix = self.platform_profile.namespace_prefix();
        let reserved = ReservedTableSet::new(prefix, self.platform_profile.core_table_names());

        let inactive = classify_tables(&tables, prefix, &reserved, &active_prefixes);

        let mut inventory = InactiveTables::new();
        for table in inactive {
            let stats = match self.table_stats(&table).await {
                Ok(stats) => stats,
                Err(error) => {
                    warn!(
                        table = %table,
                        error = %error,
                        "failed to collect table stats"
                    );
                    TableStats::default()
                }
            };
            inventory.insert(table, stats);
        }

        debug!(
            catalog_tables = tables.len(),
            active_prefixes = active_prefixes.len(),
            inactive_tables = inventory.len(),
            "classified catalog"
        );

        Ok(inventory)
    }

    /// Returns normalized slugs from the standard and always-on extension lists.
    pub async fn active_prefixes(&self) -> AppResult<Vec<ExtensionIdentifier>> {
        let standard = self.extension_registry.active_extensions().await?;
        let always_on = self.extension_registry.always_on_extensions().await?;

        let prefixes: BTreeSet<ExtensionIdentifier> = standard
            .iter()
            .filter_map(|entry| ExtensionIdentifier::from_registry_entry(entry))
            .chain(
                always_on
                    .iter()
                    .filter_map(|path| ExtensionIdentifier::from_always_on_path(path)),
            )
            .collect();

        Ok(prefixes.into_iter().collect())
    }

    /// Returns the namespace guard for the configured installation.
    #[must_use]
    pub fn target_guard(&self) -> TargetGuard {
        let prefix = self.platform_profile.namespace_prefix();
        TargetGuard::new(
            prefix.clone(),
            ReservedTableSet::new(prefix, self.platform_profile.core_table_names()),
        )
    }

    /// Looks up row count and storage size for one table.
    pub async fn table_stats(&self, table: &TableName) -> CatalogResult<TableStats> {
        let rows = self.catalog.count_rows(table).await?;
        let size_bytes = self.catalog.table_storage_status(table).await?;

        Ok(TableStats::from_raw(rows, size_bytes))
    }
}

/// Returns the catalog tables that no active extension claims.
///
/// Reserved tables and tables outside the namespace prefix are never
/// candidates. Catalog names that fail identifier validation are skipped,
/// since no statement could safely target them.
#[must_use]
pub fn classify_tables(
    tables: &[String],
    prefix: &NamespacePrefix,
    reserved: &ReservedTableSet,
    active_prefixes: &[ExtensionIdentifier],
) -> Vec<TableName> {
    tables
        .iter()
        .filter(|table| !reserved.contains(table))
        .filter_map(|table| prefix.strip(table).map(|local_name| (table, local_name)))
        .filter(|(_, local_name)| {
            !active_prefixes
                .iter()
                .any(|extension| extension.claims(local_name))
        })
        .filter_map(|(table, _)| match TableName::new(table.as_str()) {
            Ok(name) => Some(name),
            Err(error) => {
                warn!(
                    table = %table.escape_default(),
                    error = %error,
                    "skipping catalog table with unsafe identifier"
                );
                None
            }
        })
        .collect()
}
