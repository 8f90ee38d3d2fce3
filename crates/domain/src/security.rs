use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tablekeeper_core::AppError;

/// Permissions enforced by application policy checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Allows listing inactive tables and their metrics.
    TableInventoryRead,
    /// Allows truncating and dropping inactive tables.
    TableMaintenanceExecute,
}

impl Permission {
    /// Returns a stable storage value for this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TableInventoryRead => "tables.inventory.read",
            Self::TableMaintenanceExecute => "tables.maintenance.execute",
        }
    }

    /// Returns all known permissions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Permission] = &[
            Permission::TableInventoryRead,
            Permission::TableMaintenanceExecute,
        ];

        ALL
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "tables.inventory.read" => Ok(Self::TableInventoryRead),
            "tables.maintenance.execute" => Ok(Self::TableMaintenanceExecute),
            _ => Err(AppError::Validation(format!(
                "unknown permission value '{value}'"
            ))),
        }
    }
}

/// Stable audit actions emitted by maintenance use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted after a table was truncated.
    TableTruncated,
    /// Emitted after a table was dropped.
    TableDropped,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TableTruncated => "tables.truncated",
            Self::TableDropped => "tables.dropped",
        }
    }
}
