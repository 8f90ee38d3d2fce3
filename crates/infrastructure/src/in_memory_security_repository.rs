use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use tablekeeper_application::{AuditEvent, AuditRepository, AuthorizationRepository};
use tablekeeper_core::AppResult;
use tablekeeper_domain::Permission;

/// In-memory operator permission store for the `memory` backend.
#[derive(Debug, Default)]
pub struct InMemoryAuthorizationRepository {
    grants: RwLock<HashMap<String, BTreeSet<&'static str>>>,
}

impl InMemoryAuthorizationRepository {
    /// Creates an empty permission store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthorizationRepository for InMemoryAuthorizationRepository {
    async fn list_permissions_for_subject(&self, subject: &str) -> AppResult<Vec<Permission>> {
        let grants = self.grants.read().await;
        let Some(granted) = grants.get(subject) else {
            return Ok(Vec::new());
        };

        Ok(Permission::all()
            .iter()
            .copied()
            .filter(|permission| granted.contains(permission.as_str()))
            .collect())
    }

    async fn grant_permissions(&self, subject: &str, permissions: &[Permission]) -> AppResult<()> {
        self.grants
            .write()
            .await
            .entry(subject.to_owned())
            .or_default()
            .extend(permissions.iter().map(|permission| permission.as_str()));

        Ok(())
    }
}

/// In-memory append-only audit log.
#[derive(Debug, Default)]
pub struct InMemoryAuditRepository {
    events: RwLock<Vec<AuditEvent>>,
}

impl InMemoryAuditRepository {
    /// Creates an empty audit log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of recorded events in append order.
    pub async fn events(&self) -> Vec<AuditEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl AuditRepository for InMemoryAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.events.write().await.push(event);
        Ok(())
    }
}
