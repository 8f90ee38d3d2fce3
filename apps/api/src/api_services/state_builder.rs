use std::sync::Arc;

use sqlx::PgPool;
use tablekeeper_application::{
    AuditRepository, AuthorizationRepository, AuthorizationService, CatalogRepository,
    InventoryService, MaintenanceService,
};
use tablekeeper_core::AppError;
use tablekeeper_domain::NamespacePrefix;
use tablekeeper_infrastructure::{
    ConfiguredExtensionRegistry, ConfiguredPlatformProfile, InMemoryAuditRepository,
    InMemoryAuthorizationRepository, PostgresAuditRepository, PostgresAuthorizationRepository,
    PostgresCatalogRepository,
};

use crate::api_config::ApiConfig;
use crate::dev_seed::seeded_catalog;
use crate::state::AppState;

/// Storage-backed ports that differ between backends.
pub struct PortSet {
    pub catalog: Arc<dyn CatalogRepository>,
    pub authorization_repository: Arc<dyn AuthorizationRepository>,
    pub audit_repository: Arc<dyn AuditRepository>,
}

pub fn postgres_ports(pool: PgPool, config: &ApiConfig) -> Result<PortSet, AppError> {
    Ok(PortSet {
        catalog: Arc::new(PostgresCatalogRepository::new(
            pool.clone(),
            config.catalog_schema.as_str(),
        )?),
        authorization_repository: Arc::new(PostgresAuthorizationRepository::new(pool.clone())),
        audit_repository: Arc::new(PostgresAuditRepository::new(pool)),
    })
}

pub fn memory_ports(prefix: &NamespacePrefix) -> PortSet {
    PortSet {
        catalog: Arc::new(seeded_catalog(prefix)),
        authorization_repository: Arc::new(InMemoryAuthorizationRepository::new()),
        audit_repository: Arc::new(InMemoryAuditRepository::new()),
    }
}

pub fn build_app_state(ports: PortSet, config: &ApiConfig) -> AppState {
    let authorization_service = AuthorizationService::new(ports.authorization_repository);
    let inventory_service = InventoryService::new(
        ports.catalog.clone(),
        Arc::new(ConfiguredExtensionRegistry::new(
            config.active_extensions.clone(),
            config.must_use_extensions.clone(),
        )),
        Arc::new(ConfiguredPlatformProfile::new(
            config.table_prefix.clone(),
            config.core_tables.clone(),
        )),
        authorization_service.clone(),
    );
    let maintenance_service = MaintenanceService::new(
        ports.catalog,
        inventory_service.clone(),
        authorization_service.clone(),
        ports.audit_repository,
    );

    AppState {
        inventory_service,
        maintenance_service,
        authorization_service,
        frontend_url: config.frontend_url.clone(),
        bootstrap_token: config.bootstrap_token.clone(),
    }
}
