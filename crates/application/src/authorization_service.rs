use std::sync::Arc;

use async_trait::async_trait;
use tablekeeper_core::{AppError, AppResult, UserIdentity};
use tablekeeper_domain::Permission;
use tracing::warn;

/// Repository port for operator permission lookups.
#[async_trait]
pub trait AuthorizationRepository: Send + Sync {
    /// Lists effective permissions for a subject.
    async fn list_permissions_for_subject(&self, subject: &str) -> AppResult<Vec<Permission>>;

    /// Grants permissions to a subject. Existing grants are left untouched.
    async fn grant_permissions(&self, subject: &str, permissions: &[Permission]) -> AppResult<()>;
}

/// Application service for operator capability checks.
#[derive(Clone)]
pub struct AuthorizationService {
    repository: Arc<dyn AuthorizationRepository>,
}

impl AuthorizationService {
    /// Creates a new authorization service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn AuthorizationRepository>) -> Self {
        Self { repository }
    }

    /// Ensures the operator holds the permission.
    ///
    /// Denials carry a generic message; the missing permission is only logged.
    pub async fn require_permission(
        &self,
        actor: &UserIdentity,
        permission: Permission,
    ) -> AppResult<()> {
        if self.has_permission(actor, permission).await? {
            return Ok(());
        }

        warn!(
            subject = %actor.subject(),
            permission = permission.as_str(),
            "operator denied"
        );
        Err(AppError::Forbidden(
            "you do not have sufficient permissions to access this page".to_owned(),
        ))
    }

    /// Returns whether the operator currently holds the permission.
    pub async fn has_permission(
        &self,
        actor: &UserIdentity,
        permission: Permission,
    ) -> AppResult<bool> {
        let permissions = self
            .repository
            .list_permissions_for_subject(actor.subject())
            .await?;

        Ok(permissions.contains(&permission))
    }

    /// Grants every known permission to a bootstrapped operator.
    pub async fn ensure_operator(&self, subject: &str) -> AppResult<()> {
        self.repository
            .grant_permissions(subject, Permission::all())
            .await
    }
}
