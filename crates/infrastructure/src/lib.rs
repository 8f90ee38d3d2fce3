//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod configured_host;
mod in_memory_catalog_repository;
mod in_memory_security_repository;
mod postgres_audit_repository;
mod postgres_authorization_repository;
mod postgres_catalog_repository;

pub use configured_host::{ConfiguredExtensionRegistry, ConfiguredPlatformProfile};
pub use in_memory_catalog_repository::InMemoryCatalogRepository;
pub use in_memory_security_repository::{InMemoryAuditRepository, InMemoryAuthorizationRepository};
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_authorization_repository::PostgresAuthorizationRepository;
pub use postgres_catalog_repository::PostgresCatalogRepository;
