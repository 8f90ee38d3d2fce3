use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use tablekeeper_application::AuthorizationRepository;
use tablekeeper_domain::Permission;

use super::PostgresAuthorizationRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres authorization tests: {error}");
    }

    Some(pool)
}

#[tokio::test]
async fn grants_are_idempotent_and_listed() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresAuthorizationRepository::new(pool);
    let subject = format!("operator-{}", std::process::id());

    assert!(
        repository
            .grant_permissions(subject.as_str(), &[Permission::TableInventoryRead])
            .await
            .is_ok()
    );
    assert!(
        repository
            .grant_permissions(subject.as_str(), Permission::all())
            .await
            .is_ok()
    );

    let mut permissions = repository
        .list_permissions_for_subject(subject.as_str())
        .await
        .unwrap_or_default();
    permissions.sort_by_key(|permission| permission.as_str());

    assert_eq!(
        permissions,
        vec![
            Permission::TableInventoryRead,
            Permission::TableMaintenanceExecute
        ]
    );
}

#[tokio::test]
async fn unknown_subject_has_no_permissions() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresAuthorizationRepository::new(pool);

    let permissions = repository
        .list_permissions_for_subject("nobody-at-all")
        .await;

    assert_eq!(permissions.map(|granted| granted.len()).ok(), Some(0));
}
