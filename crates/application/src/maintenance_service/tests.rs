use std::sync::Arc;

use tablekeeper_core::{AppError, UserIdentity};
use tablekeeper_domain::{
    ActionRequest, ActionScope, AuditAction, Outcome, Permission, TableVerb,
};

use crate::test_support::{
    FakeAuditRepository, FakeAuthorizationRepository, FakeCatalog, FakeExtensionRegistry,
    FakePlatformProfile, Harness, SESSION_TOKEN, operator_context, table,
};
use crate::{AuthContext, AuthorizationService, InventoryService, MaintenanceService};

fn orphan_catalog() -> FakeCatalog {
    FakeCatalog::with_tables(&[
        ("wp_posts", 50, Some(1_048_576)),
        ("wp_users", 2, Some(16_384)),
        ("wp_shop_orders", 12, Some(65_536)),
        ("wp_old_forms", 30, Some(131_072)),
        ("wp_old_stats", 900, Some(2_097_152)),
        ("wp_old_cache", 5, Some(16_384)),
    ])
}

fn shop_active() -> FakeExtensionRegistry {
    FakeExtensionRegistry::active(&["shop/shop.php"])
}

#[tokio::test]
async fn single_truncate_reports_fresh_stats_with_zero_rows() {
    let harness = Harness::new(orphan_catalog(), shop_active());

    let report = harness
        .maintenance
        .handle_request(
            &operator_context(),
            ActionRequest::single(table("wp_old_stats"), TableVerb::Truncate),
        )
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(report.outcomes().len(), 1);
    let outcome = &report.outcomes()[0];
    assert_eq!(outcome.outcome(), Outcome::Success);
    assert_eq!(outcome.stats().map(|stats| stats.rows()), Some(0));
    assert_eq!(
        outcome.detail(),
        "Table wp_old_stats truncated successfully. New stats: 0 rows, 0.02 MB"
    );

    let stats = harness.inventory.table_stats(&table("wp_old_stats")).await;
    assert_eq!(stats.map(|stats| stats.rows()).ok(), Some(0));
}

#[tokio::test]
async fn truncate_is_idempotent() {
    let harness = Harness::new(orphan_catalog(), shop_active());
    let request = ActionRequest::single(table("wp_old_cache"), TableVerb::Truncate);

    for _ in 0..2 {
        let report = harness
            .maintenance
            .handle_request(&operator_context(), request.clone())
            .await;
        let report = report.unwrap_or_else(|_| unreachable!());
        assert_eq!(report.success_count(), 1);
    }
}

#[tokio::test]
async fn single_action_on_missing_table_fails_without_ddl() {
    let harness = Harness::new(orphan_catalog(), shop_active());

    let report = harness
        .maintenance
        .handle_request(
            &operator_context(),
            ActionRequest::single(table("wp_never_existed"), TableVerb::Drop),
        )
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(report.outcomes().len(), 1);
    assert_eq!(report.outcomes()[0].outcome(), Outcome::Failure);
    assert_eq!(
        report.outcomes()[0].detail(),
        "Table wp_never_existed doesn't exist"
    );
    assert_eq!(harness.catalog.existence_checks(), 1);
    assert_eq!(harness.catalog.ddl_calls(), 0);
}

#[tokio::test]
async fn single_drop_removes_table_from_catalog_and_classifier() {
    let harness = Harness::new(orphan_catalog(), shop_active());

    let report = harness
        .maintenance
        .handle_request(
            &operator_context(),
            ActionRequest::single(table("wp_old_forms"), TableVerb::Drop),
        )
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(
        report.outcomes()[0].detail(),
        "Table wp_old_forms dropped successfully."
    );
    assert!(
        !harness
            .catalog
            .table_names()
            .await
            .contains(&"wp_old_forms".to_owned())
    );
    let inventory = harness
        .inventory
        .find_inactive_tables()
        .await
        .unwrap_or_default();
    assert!(!inventory.contains_key(&table("wp_old_forms")));
}

#[tokio::test]
async fn repeated_single_drop_fails_gracefully() {
    let harness = Harness::new(orphan_catalog(), shop_active());
    let request = ActionRequest::single(table("wp_old_cache"), TableVerb::Drop);

    let first = harness
        .maintenance
        .handle_request(&operator_context(), request.clone())
        .await
        .unwrap_or_else(|_| unreachable!());
    let second = harness
        .maintenance
        .handle_request(&operator_context(), request)
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(first.success_count(), 1);
    assert_eq!(second.success_count(), 0);
    assert_eq!(second.outcomes()[0].outcome(), Outcome::Failure);
}

#[tokio::test]
async fn single_driver_error_is_reported_verbatim() {
    let catalog = orphan_catalog();
    catalog
        .fail_on("wp_old_stats", TableVerb::Truncate, "permission denied for table wp_old_stats")
        .await;
    let harness = Harness::new(catalog, shop_active());

    let report = harness
        .maintenance
        .handle_request(
            &operator_context(),
            ActionRequest::single(table("wp_old_stats"), TableVerb::Truncate),
        )
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(
        report.failure_detail().as_deref(),
        Some("Failed to truncate wp_old_stats: permission denied for table wp_old_stats")
    );
    assert!(harness.audit.events.lock().await.is_empty());
}

#[tokio::test]
async fn bulk_action_isolates_a_failing_table() {
    let catalog = orphan_catalog();
    catalog
        .fail_on("wp_old_stats", TableVerb::Drop, "lock wait timeout exceeded")
        .await;
    let harness = Harness::new(catalog, shop_active());
    let request = ActionRequest::bulk(
        [
            table("wp_old_forms"),
            table("wp_old_stats"),
            table("wp_old_cache"),
        ],
        TableVerb::Drop,
    )
    .unwrap_or_else(|_| unreachable!());

    let report = harness
        .maintenance
        .handle_request(&operator_context(), request)
        .await
        .unwrap_or_else(|_| unreachable!());

    let outcomes: Vec<(&str, Outcome)> = report
        .outcomes()
        .iter()
        .map(|outcome| (outcome.table().as_str(), outcome.outcome()))
        .collect();
    assert_eq!(
        outcomes,
        vec![
            ("wp_old_forms", Outcome::Success),
            ("wp_old_stats", Outcome::Failure),
            ("wp_old_cache", Outcome::Success),
        ]
    );
    assert_eq!(harness.catalog.ddl_calls(), 3);
    assert_eq!(report.success_count(), 2);
    assert_eq!(
        report.failure_detail().as_deref(),
        Some("Failed to drop wp_old_stats: lock wait timeout exceeded")
    );
}

#[tokio::test]
async fn bulk_action_skips_existence_check() {
    let harness = Harness::new(orphan_catalog(), shop_active());
    let request = ActionRequest::bulk(
        [table("wp_old_cache"), table("wp_already_gone")],
        TableVerb::Drop,
    )
    .unwrap_or_else(|_| unreachable!());

    let report = harness
        .maintenance
        .handle_request(&operator_context(), request)
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(harness.catalog.existence_checks(), 0);
    assert_eq!(harness.catalog.ddl_calls(), 2);
    assert_eq!(report.success_count(), 1);
    assert_eq!(
        report.failure_detail().as_deref(),
        Some("Failed to drop wp_already_gone: table \"wp_already_gone\" does not exist")
    );
}

#[tokio::test]
async fn all_scope_acts_on_execution_time_inactive_set() {
    let harness = Harness::new(orphan_catalog(), shop_active());

    let report = harness
        .maintenance
        .handle_request(&operator_context(), ActionRequest::all_scope(TableVerb::Truncate))
        .await
        .unwrap_or_else(|_| unreachable!());

    let touched: Vec<&str> = report
        .outcomes()
        .iter()
        .map(|outcome| outcome.table().as_str())
        .collect();
    assert_eq!(touched, vec!["wp_old_cache", "wp_old_forms", "wp_old_stats"]);
    assert_eq!(report.scope(), ActionScope::AllScope);
    assert_eq!(
        report.status_messages()[0].text,
        "3 inactive tables emptied successfully."
    );
}

#[tokio::test]
async fn second_all_scope_drop_is_a_no_op() {
    let harness = Harness::new(orphan_catalog(), shop_active());
    let request = ActionRequest::all_scope(TableVerb::Drop);

    let first = harness
        .maintenance
        .handle_request(&operator_context(), request.clone())
        .await
        .unwrap_or_else(|_| unreachable!());
    let second = harness
        .maintenance
        .handle_request(&operator_context(), request)
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(first.success_count(), 3);
    assert!(second.is_empty());
    assert!(
        harness
            .inventory
            .find_inactive_tables()
            .await
            .unwrap_or_default()
            .is_empty()
    );
    let remaining = harness.catalog.table_names().await;
    assert!(remaining.contains(&"wp_posts".to_owned()));
    assert!(remaining.contains(&"wp_shop_orders".to_owned()));
}

#[tokio::test]
async fn successful_statements_are_audited() {
    let harness = Harness::new(orphan_catalog(), shop_active());

    let _ = harness
        .maintenance
        .handle_request(
            &operator_context(),
            ActionRequest::single(table("wp_old_forms"), TableVerb::Drop),
        )
        .await;

    let events = harness.audit.events.lock().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, AuditAction::TableDropped);
    assert_eq!(events[0].resource_id, "wp_old_forms");
    assert_eq!(events[0].subject, "operator");
}

#[tokio::test]
async fn audit_failure_does_not_fail_completed_statement() {
    let harness = Harness::with_audit(
        orphan_catalog(),
        shop_active(),
        FakeAuditRepository {
            fail: true,
            ..FakeAuditRepository::default()
        },
    );

    let report = harness
        .maintenance
        .handle_request(
            &operator_context(),
            ActionRequest::single(table("wp_old_forms"), TableVerb::Drop),
        )
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(report.success_count(), 1);
}

#[tokio::test]
async fn operator_without_capability_is_rejected_before_any_catalog_call() {
    let catalog = Arc::new(orphan_catalog());
    let authorization_service = AuthorizationService::new(Arc::new(
        FakeAuthorizationRepository::with_grants("viewer", vec![Permission::TableInventoryRead]),
    ));
    let inventory = InventoryService::new(
        catalog.clone(),
        Arc::new(shop_active()),
        Arc::new(FakePlatformProfile::new("wp_", &[])),
        authorization_service.clone(),
    );
    let maintenance = MaintenanceService::new(
        catalog.clone(),
        inventory,
        authorization_service,
        Arc::new(FakeAuditRepository::default()),
    );
    let context = AuthContext::new(
        UserIdentity::new("viewer"),
        Some(SESSION_TOKEN.to_owned()),
        Some(SESSION_TOKEN.to_owned()),
    );

    let result = maintenance
        .handle_request(&context, ActionRequest::all_scope(TableVerb::Drop))
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
    assert_eq!(catalog.ddl_calls(), 0);
    assert_eq!(catalog.existence_checks(), 0);
}

#[tokio::test]
async fn forged_token_fails_security_check_without_processing() {
    let harness = Harness::new(orphan_catalog(), shop_active());
    let context = AuthContext::new(
        UserIdentity::new("operator"),
        Some(SESSION_TOKEN.to_owned()),
        Some("forged".to_owned()),
    );

    let result = harness
        .maintenance
        .handle_request(&context, ActionRequest::all_scope(TableVerb::Drop))
        .await;

    assert!(matches!(result, Err(AppError::SecurityCheckFailed(_))));
    assert_eq!(harness.catalog.ddl_calls(), 0);
    assert_eq!(harness.catalog.table_names().await.len(), 6);
}

#[tokio::test]
async fn missing_token_fails_security_check() {
    let harness = Harness::new(orphan_catalog(), shop_active());
    let context = AuthContext::new(
        UserIdentity::new("operator"),
        Some(SESSION_TOKEN.to_owned()),
        None,
    );

    let result = harness
        .maintenance
        .handle_request(
            &context,
            ActionRequest::single(table("wp_old_cache"), TableVerb::Drop),
        )
        .await;

    assert!(matches!(result, Err(AppError::SecurityCheckFailed(_))));
    assert_eq!(harness.catalog.existence_checks(), 0);
}

#[tokio::test]
async fn reserved_and_foreign_targets_are_refused_without_ddl() {
    let harness = Harness::new(
        FakeCatalog::with_tables(&[
            ("wp_posts", 50, Some(1_048_576)),
            ("wp_users", 2, Some(16_384)),
            ("wp_old_forms", 30, Some(131_072)),
            ("audit_log_entries", 7, Some(16_384)),
        ]),
        shop_active(),
    );

    let single = harness
        .maintenance
        .handle_request(
            &operator_context(),
            ActionRequest::single(table("wp_users"), TableVerb::Drop),
        )
        .await
        .unwrap_or_else(|_| unreachable!());
    let bulk = harness
        .maintenance
        .handle_request(
            &operator_context(),
            ActionRequest::bulk(
                [table("wp_posts"), table("audit_log_entries"), table("wp_old_forms")],
                TableVerb::Drop,
            )
            .unwrap_or_else(|_| unreachable!()),
        )
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(single.success_count(), 0);
    assert_eq!(
        single.outcomes()[0].detail(),
        "Table wp_users is protected and cannot be dropped"
    );
    assert_eq!(bulk.success_count(), 1);
    assert_eq!(
        bulk.failure_detail().as_deref(),
        Some(
            "Table wp_posts is protected and cannot be dropped\n\
             Table audit_log_entries is protected and cannot be dropped"
        )
    );
    assert_eq!(harness.catalog.existence_checks(), 0);
    assert_eq!(harness.catalog.ddl_calls(), 1);
    assert_eq!(
        harness.catalog.table_names().await,
        vec!["audit_log_entries", "wp_posts", "wp_users"]
    );
}
