//! Database migrations infrastructure

use sqlx::postgres::PgPool;

use crate::domain::DomainError;

/// PostgreSQL migrator tracking applied versions in `_migrations`
#[derive(Debug)]
pub struct PostgresMigrator {
    pool: PgPool,
}

impl PostgresMigrator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the migrations table if it doesn't exist
    async fn ensure_migrations_table(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version BIGINT PRIMARY KEY,
                description TEXT NOT NULL,
                installed_on TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                success BOOLEAN NOT NULL DEFAULT TRUE
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create migrations table: {}", e)))?;

        Ok(())
    }

    /// Runs a single migration
    pub async fn run_migration(&self, migration: &Migration) -> Result<(), DomainError> {
        self.ensure_migrations_table().await?;

        // Check if already applied
        let applied: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM _migrations WHERE version = $1)",
        )
        .bind(migration.version)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to check migration status: {}", e)))?;

        if applied {
            return Ok(());
        }

        // Migrations hold several statements, so bypass prepared statements
        sqlx::raw_sql(&migration.up)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to run migration {}: {}",
                    migration.version, e
                ))
            })?;

        // Record the migration
        sqlx::query(
            "INSERT INTO _migrations (version, description) VALUES ($1, $2)",
        )
        .bind(migration.version)
        .bind(&migration.description)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::storage(format!("Failed to record migration {}: {}", migration.version, e))
        })?;

        Ok(())
    }

    /// Returns the latest applied migration version
    pub async fn current_version(&self) -> Result<Option<i64>, DomainError> {
        self.ensure_migrations_table().await?;

        let version: Option<i64> = sqlx::query_scalar(
            "SELECT MAX(version) FROM _migrations WHERE success = TRUE",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get migration version: {}", e)))?;

        Ok(version)
    }
}

/// Represents a database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version (timestamp-based recommended)
    pub version: i64,
    /// Human-readable description
    pub description: String,
    /// SQL to run when applying the migration
    pub up: String,
    /// SQL to run when reverting the migration
    pub down: String,
}

impl Migration {
    pub fn new(
        version: i64,
        description: impl Into<String>,
        up: impl Into<String>,
        down: impl Into<String>,
    ) -> Self {
        Self {
            version,
            description: description.into(),
            up: up.into(),
            down: down.into(),
        }
    }
}

/// Table names used by the entity storages
pub mod tables {
    pub const USERS: &str = "users";
    pub const PROJECTS: &str = "projects";
    pub const API_KEYS: &str = "api_keys";
    pub const USAGE_RECORDS: &str = "usage_records";
    pub const ALERTS: &str = "alerts";
    pub const COST_ALERTS: &str = "cost_alerts";
    pub const INVOICES: &str = "invoices";
    pub const AUDIT_LOGS: &str = "audit_logs";
}

fn entity_table(version: i64, table: &str, extra_up: &str) -> Migration {
    Migration::new(
        version,
        format!("Create {} table", table),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                key VARCHAR(255) PRIMARY KEY,
                data JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            CREATE INDEX IF NOT EXISTS idx_{table}_created_at ON {table}(created_at);
            {extra_up}
            "#
        ),
        format!("DROP TABLE IF EXISTS {table};"),
    )
}

/// Collection of migrations for the storage layer
pub fn storage_migrations() -> Vec<Migration> {
    vec![
        entity_table(
            1,
            tables::USERS,
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email ON users ((lower(data->>'email')));",
        ),
        entity_table(2, tables::PROJECTS, ""),
        entity_table(
            3,
            tables::API_KEYS,
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_api_keys_prefix ON api_keys ((data->>'key_prefix'));",
        ),
        entity_table(
            4,
            tables::USAGE_RECORDS,
            "CREATE INDEX IF NOT EXISTS idx_usage_records_project ON usage_records ((data->>'project_id'));",
        ),
        entity_table(5, tables::ALERTS, ""),
        entity_table(6, tables::COST_ALERTS, ""),
        entity_table(7, tables::INVOICES, ""),
        entity_table(
            8,
            tables::AUDIT_LOGS,
            "CREATE INDEX IF NOT EXISTS idx_audit_logs_project ON audit_logs ((data->>'project_id'));",
        ),
    ]
}

/// Runs all pending storage migrations
pub async fn run_storage_migrations(pool: &PgPool) -> Result<(), DomainError> {
    let migrator = PostgresMigrator::new(pool.clone());
    let migrations = storage_migrations();

    for migration in migrations {
        migrator.run_migration(&migration).await?;
    }

    if let Some(version) = migrator.current_version().await? {
        tracing::info!(version, "Storage migrations applied");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_creation() {
        let migration = Migration::new(1, "Test migration", "CREATE TABLE test", "DROP TABLE test");

        assert_eq!(migration.version, 1);
        assert_eq!(migration.description, "Test migration");
        assert_eq!(migration.up, "CREATE TABLE test");
        assert_eq!(migration.down, "DROP TABLE test");
    }

    #[test]
    fn test_storage_migrations_order() {
        let migrations = storage_migrations();

        assert!(!migrations.is_empty());

        // Verify migrations are in order
        for i in 1..migrations.len() {
            assert!(
                migrations[i].version > migrations[i - 1].version,
                "Migrations should be in ascending order"
            );
        }
    }

    #[test]
    fn test_every_table_has_a_migration() {
        let migrations = storage_migrations();

        for table in [
            tables::USERS,
            tables::PROJECTS,
            tables::API_KEYS,
            tables::USAGE_RECORDS,
            tables::ALERTS,
            tables::COST_ALERTS,
            tables::INVOICES,
            tables::AUDIT_LOGS,
        ] {
            let needle = format!("CREATE TABLE IF NOT EXISTS {} (", table);
            assert!(
                migrations.iter().any(|m| m.up.contains(&needle)),
                "missing migration for {}",
                table
            );
        }
    }

    #[test]
    fn test_storage_migrations_content() {
        let migrations = storage_migrations();

        // Verify all migrations have required content
        for migration in migrations {
            assert!(!migration.description.is_empty());
            assert!(!migration.up.is_empty());
            assert!(!migration.down.is_empty());
        }
    }
}
