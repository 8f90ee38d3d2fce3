//! Application services and ports.

#![forbid(unsafe_code)]

pub mod anti_forgery;

mod audit_ports;
mod authorization_service;
mod catalog_ports;
mod inventory_service;
mod maintenance_service;

#[cfg(test)]
mod test_support;

pub use audit_ports::{AuditEvent, AuditRepository};
pub use authorization_service::{AuthorizationRepository, AuthorizationService};
pub use catalog_ports::{
    CatalogError, CatalogRepository, CatalogResult, ExtensionRegistry, PlatformProfile,
};
pub use inventory_service::{InactiveTables, InventoryService, classify_tables};
pub use maintenance_service::{AuthContext, MaintenanceService};
