//! Storage factory for runtime storage selection

use std::sync::Arc;

use sqlx::postgres::PgPool;

use crate::domain::storage::{Storage, StorageEntity};
use crate::domain::DomainError;

use super::in_memory::InMemoryStorage;
use super::migrations::run_storage_migrations;
use super::postgres::{connect_pool, PostgresConfig, PostgresStorage};

/// Supported storage types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageType {
    /// In-memory storage (for testing/development)
    InMemory,
    /// PostgreSQL storage
    Postgres,
}

impl StorageType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Some(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            _ => None,
        }
    }
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InMemory => write!(f, "memory"),
            Self::Postgres => write!(f, "postgres"),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// In-memory storage configuration
    InMemory,
    /// PostgreSQL storage configuration
    Postgres(PostgresConfig),
}

impl StorageConfig {
    pub fn in_memory() -> Self {
        Self::InMemory
    }

    pub fn postgres(config: PostgresConfig) -> Self {
        Self::Postgres(config)
    }

    pub fn postgres_url(url: impl Into<String>) -> Self {
        Self::Postgres(PostgresConfig::new(url))
    }

    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::InMemory => StorageType::InMemory,
            Self::Postgres(_) => StorageType::Postgres,
        }
    }
}

/// A connected storage backend that hands out per-entity storages
#[derive(Debug, Clone)]
pub enum StorageBackend {
    InMemory,
    Postgres(PgPool),
}

impl StorageBackend {
    /// Returns a storage for one entity type backed by `table_name`
    pub fn storage<E>(&self, table_name: &str) -> Arc<dyn Storage<E>>
    where
        E: StorageEntity + 'static,
    {
        match self {
            Self::InMemory => Arc::new(InMemoryStorage::<E>::new()),
            Self::Postgres(pool) => Arc::new(PostgresStorage::<E>::new(pool.clone(), table_name)),
        }
    }

    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::InMemory => StorageType::InMemory,
            Self::Postgres(_) => StorageType::Postgres,
        }
    }

    /// Checks that the backend can serve requests
    pub async fn ping(&self) -> Result<(), DomainError> {
        match self {
            Self::InMemory => Ok(()),
            Self::Postgres(pool) => sqlx::query("SELECT 1")
                .execute(pool)
                .await
                .map(|_| ())
                .map_err(|e| DomainError::storage(format!("Database ping failed: {}", e))),
        }
    }
}

/// Factory for creating storage backends
#[derive(Debug)]
pub struct StorageFactory;

impl StorageFactory {
    /// Connects the configured backend and applies pending migrations
    pub async fn connect(config: &StorageConfig) -> Result<StorageBackend, DomainError> {
        match config {
            StorageConfig::InMemory => Ok(StorageBackend::InMemory),
            StorageConfig::Postgres(pg_config) => {
                let pool = connect_pool(pg_config).await?;
                run_storage_migrations(&pool).await?;
                Ok(StorageBackend::Postgres(pool))
            }
        }
    }
}
