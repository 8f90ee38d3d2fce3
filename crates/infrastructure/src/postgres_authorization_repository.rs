use std::str::FromStr;

use async_trait::async_trait;

use tablekeeper_application::AuthorizationRepository;
use tablekeeper_core::{AppError, AppResult};
use tablekeeper_domain::Permission;

use sqlx::{FromRow, PgPool};

/// PostgreSQL-backed repository for operator permission lookups.
#[derive(Clone)]
pub struct PostgresAuthorizationRepository {
    pool: PgPool,
}

impl PostgresAuthorizationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    permission: String,
}

#[async_trait]
impl AuthorizationRepository for PostgresAuthorizationRepository {
    async fn list_permissions_for_subject(&self, subject: &str) -> AppResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT permission
            FROM operator_permissions
            WHERE subject = $1
            ORDER BY permission
            "#,
        )
        .bind(subject)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load permissions: {error}")))?;

        rows.into_iter()
            .map(|row| {
                Permission::from_str(row.permission.as_str()).map_err(|error| {
                    AppError::Internal(format!(
                        "failed to decode permission '{}' for subject '{subject}': {error}",
                        row.permission
                    ))
                })
            })
            .collect()
    }

    async fn grant_permissions(&self, subject: &str, permissions: &[Permission]) -> AppResult<()> {
        for permission in permissions {
            sqlx::query(
                r#"
                INSERT INTO operator_permissions (subject, permission)
                VALUES ($1, $2)
                ON CONFLICT (subject, permission) DO NOTHING
                "#,
            )
            .bind(subject)
            .bind(permission.as_str())
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to grant permission '{}': {error}",
                    permission.as_str()
                ))
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
