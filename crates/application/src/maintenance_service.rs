use std::sync::Arc;

use tablekeeper_core::{AppResult, UserIdentity};
use tablekeeper_domain::{
    ActionReport, ActionRequest, ActionScope, AuditAction, Permission, TableName, TableOutcome,
    TableVerb, TargetGuard,
};
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::{
    AuditEvent, AuditRepository, AuthorizationService, CatalogRepository, InventoryService,
    anti_forgery,
};

/// Verified operator identity plus the anti-forgery tokens of one submission.
#[derive(Debug, Clone)]
pub struct AuthContext {
    identity: UserIdentity,
    session_token: Option<String>,
    submitted_token: Option<String>,
}

impl AuthContext {
    /// Creates a context from the session identity and both token copies.
    #[must_use]
    pub fn new(
        identity: UserIdentity,
        session_token: Option<String>,
        submitted_token: Option<String>,
    ) -> Self {
        Self {
            identity,
            session_token,
            submitted_token,
        }
    }

    /// Returns the operator identity.
    #[must_use]
    pub fn identity(&self) -> &UserIdentity {
        &self.identity
    }
}

#[derive(Clone, Copy)]
struct Execution<'a> {
    actor: &'a UserIdentity,
    request_id: Uuid,
    scope: ActionScope,
}

/// Executes truncate/drop requests and aggregates per-table outcomes.
///
/// Statements are not wrapped in a transaction and there is no rollback.
/// One failing table never stops the remaining tables of a batch.
#[derive(Clone)]
pub struct MaintenanceService {
    catalog: Arc<dyn CatalogRepository>,
    inventory_service: InventoryService,
    authorization_service: AuthorizationService,
    audit_repository: Arc<dyn AuditRepository>,
}

impl MaintenanceService {
    /// Creates a new maintenance service.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        inventory_service: InventoryService,
        authorization_service: AuthorizationService,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            catalog,
            inventory_service,
            authorization_service,
            audit_repository,
        }
    }

    /// Authorizes and runs one operator request.
    ///
    /// Permission and anti-forgery failures are returned before any catalog
    /// call. Table-level problems are folded into the report. The caller is
    /// expected to re-run the classifier afterwards for a fresh listing.
    pub async fn handle_request(
        &self,
        context: &AuthContext,
        request: ActionRequest,
    ) -> AppResult<ActionReport> {
        let actor = context.identity();
        self.authorization_service
            .require_permission(actor, Permission::TableMaintenanceExecute)
            .await?;

        anti_forgery::verify_token(
            context.session_token.as_deref(),
            context.submitted_token.as_deref(),
        )
        .inspect_err(|error| {
            warn!(subject = %actor.subject(), error = %error, "rejected maintenance request");
        })?;

        let execution = Execution {
            actor,
            request_id: Uuid::new_v4(),
            scope: request.scope(),
        };
        let span = info_span!(
            "table_maintenance",
            request_id = %execution.request_id,
            subject = %actor.subject(),
            scope = execution.scope.as_str(),
            verb = request.verb().as_str(),
        );

        async move {
            let report = self.execute(execution, request).await?;
            info!(
                processed = report.outcomes().len(),
                succeeded = report.success_count(),
                "maintenance request completed"
            );
            Ok(report)
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        execution: Execution<'_>,
        request: ActionRequest,
    ) -> AppResult<ActionReport> {
        let mut report = ActionReport::new(request.scope(), request.verb());
        let guard = self.inventory_service.target_guard();

        match request {
            ActionRequest::Single { table, verb } => {
                let outcome = match screen_target(&guard, table, verb) {
                    Ok(table) => self.execute_single(execution, table, verb).await,
                    Err(outcome) => outcome,
                };
                report.push(outcome);
            }
            ActionRequest::Bulk { tables, verb } => {
                for table in tables {
                    let outcome = match screen_target(&guard, table, verb) {
                        Ok(table) => self.apply(execution, table, verb).await,
                        Err(outcome) => outcome,
                    };
                    report.push(outcome);
                }
            }
            ActionRequest::AllScope { verb } => {
                let inactive = self.inventory_service.find_inactive_tables().await?;
                for table in inactive.into_keys() {
                    report.push(self.apply(execution, table, verb).await);
                }
            }
        }

        Ok(report)
    }

    async fn execute_single(
        &self,
        execution: Execution<'_>,
        table: TableName,
        verb: TableVerb,
    ) -> TableOutcome {
        match self.catalog.table_exists(&table).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(table = %table, "requested table does not exist");
                return TableOutcome::missing(table, verb);
            }
            Err(error) => return TableOutcome::driver_failure(table, verb, &error.to_string()),
        }

        let outcome = self.apply(execution, table, verb).await;
        if !outcome.is_success() || verb != TableVerb::Truncate {
            return outcome;
        }

        let table = outcome.table().clone();
        match self.inventory_service.table_stats(&table).await {
            Ok(stats) => TableOutcome::success(table, verb, Some(stats)),
            Err(error) => {
                warn!(
                    table = %table,
                    error = %error,
                    "failed to refresh stats after truncate"
                );
                outcome
            }
        }
    }

    async fn apply(
        &self,
        execution: Execution<'_>,
        table: TableName,
        verb: TableVerb,
    ) -> TableOutcome {
        match self.catalog.execute(verb, &table).await {
            Ok(()) => {
                self.record_audit(execution, &table, verb).await;
                TableOutcome::success(table, verb, None)
            }
            Err(error) => {
                warn!(
                    table = %table,
                    verb = verb.as_str(),
                    error = %error,
                    "table statement failed"
                );
                TableOutcome::driver_failure(table, verb, &error.to_string())
            }
        }
    }

    async fn record_audit(&self, execution: Execution<'_>, table: &TableName, verb: TableVerb) {
        let action = match verb {
            TableVerb::Truncate => AuditAction::TableTruncated,
            TableVerb::Drop => AuditAction::TableDropped,
        };

        let event = AuditEvent {
            subject: execution.actor.subject().to_owned(),
            action,
            resource_type: "table".to_owned(),
            resource_id: table.as_str().to_owned(),
            detail: Some(format!(
                "{} request {}",
                execution.scope.as_str(),
                execution.request_id
            )),
        };

        // The statement already ran; a lost audit row must not turn it into a failure.
        if let Err(error) = self.audit_repository.append_event(event).await {
            warn!(
                table = %table,
                action = action.as_str(),
                error = %error,
                "failed to append audit event"
            );
        }
    }
}

/// Passes eligible targets through and turns the rest into failure outcomes.
fn screen_target(
    guard: &TargetGuard,
    table: TableName,
    verb: TableVerb,
) -> Result<TableName, TableOutcome> {
    if guard.permits(table.as_str()) {
        return Ok(table);
    }

    warn!(table = %table, verb = verb.as_str(), "refused protected table");
    Err(TableOutcome::protected(table, verb))
}

#[cfg(test)]
mod tests;
