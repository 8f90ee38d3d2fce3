use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tracing::debug;

use tablekeeper_application::{CatalogError, CatalogRepository, CatalogResult};
use tablekeeper_core::{AppError, AppResult};
use tablekeeper_domain::{TableName, TableVerb};

/// PostgreSQL-backed catalog scoped to one schema.
#[derive(Clone)]
pub struct PostgresCatalogRepository {
    pool: PgPool,
    schema: TableName,
}

impl PostgresCatalogRepository {
    /// Creates a repository over the given schema.
    ///
    /// The schema name goes through the same identifier gate as table names
    /// because it is interpolated into statements.
    pub fn new(pool: PgPool, schema: &str) -> AppResult<Self> {
        let schema = TableName::new(schema)
            .map_err(|error| AppError::Validation(format!("invalid catalog schema: {error}")))?;

        Ok(Self { pool, schema })
    }

    fn qualified(&self, table: &TableName) -> String {
        format!("{}.{}", quote(self.schema.as_str()), quote(table.as_str()))
    }
}

#[derive(Debug, FromRow)]
struct TableNameRow {
    table_name: String,
}

#[derive(Debug, FromRow)]
struct StorageRow {
    size_bytes: Option<i64>,
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn driver_error(error: sqlx::Error) -> CatalogError {
    let message = error
        .as_database_error()
        .map(|database_error| database_error.message().to_owned())
        .unwrap_or_else(|| error.to_string());

    CatalogError::Driver(message)
}

fn non_negative(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

#[async_trait]
impl CatalogRepository for PostgresCatalogRepository {
    async fn list_tables(&self) -> CatalogResult<Vec<String>> {
        let rows = sqlx::query_as::<_, TableNameRow>(
            r#"
            SELECT table_name::text AS table_name
            FROM information_schema.tables
            WHERE table_schema = $1
                AND table_type = 'BASE TABLE'
            ORDER BY table_name
            "#,
        )
        .bind(self.schema.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(driver_error)?;

        Ok(rows.into_iter().map(|row| row.table_name).collect())
    }

    async fn count_rows(&self, table: &TableName) -> CatalogResult<u64> {
        let statement = format!("SELECT COUNT(*) FROM {}", self.qualified(table));
        let count: i64 = sqlx::query_scalar(statement.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(driver_error)?;

        Ok(non_negative(count))
    }

    async fn table_storage_status(&self, table: &TableName) -> CatalogResult<Option<u64>> {
        let row = sqlx::query_as::<_, StorageRow>(
            r#"
            SELECT pg_table_size(classes.oid)::bigint AS size_bytes
            FROM pg_class AS classes
            INNER JOIN pg_namespace AS namespaces
                ON namespaces.oid = classes.relnamespace
            WHERE namespaces.nspname = $1
                AND classes.relname = $2
                AND classes.relkind IN ('r', 'p')
            "#,
        )
        .bind(self.schema.as_str())
        .bind(table.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(driver_error)?;

        Ok(row.and_then(|row| row.size_bytes).map(non_negative))
    }

    async fn table_exists(&self, table: &TableName) -> CatalogResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM information_schema.tables
                WHERE table_schema = $1
                    AND table_name = $2
                    AND table_type = 'BASE TABLE'
            )
            "#,
        )
        .bind(self.schema.as_str())
        .bind(table.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(driver_error)
    }

    async fn execute(&self, verb: TableVerb, table: &TableName) -> CatalogResult<()> {
        let statement = match verb {
            TableVerb::Truncate => format!("TRUNCATE TABLE {}", self.qualified(table)),
            TableVerb::Drop => format!("DROP TABLE {}", self.qualified(table)),
        };

        debug!(statement = %statement, "executing table statement");
        sqlx::query(statement.as_str())
            .execute(&self.pool)
            .await
            .map_err(driver_error)?;

        Ok(())
    }
}
