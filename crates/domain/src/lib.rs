//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod action;
mod extension;
mod security;
mod table;

pub use action::{
    ActionReport, ActionRequest, ActionScope, Outcome, StatusLevel, StatusMessage, TableOutcome,
    TableVerb,
};
pub use extension::ExtensionIdentifier;
pub use security::{AuditAction, Permission};
pub use table::{
    DEFAULT_CORE_TABLES, IDENTITY_TABLES, NamespacePrefix, ReservedTableSet, TABLE_NAME_MAX_LENGTH,
    TableName, TableStats, TargetGuard,
};
