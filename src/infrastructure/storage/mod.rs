//! Storage infrastructure - Storage implementations

mod factory;
mod in_memory;
pub mod migrations;
mod postgres;

pub use factory::{StorageBackend, StorageConfig, StorageFactory, StorageType};
pub use in_memory::InMemoryStorage;
pub use migrations::{run_storage_migrations, tables, Migration, PostgresMigrator};
pub use postgres::{connect_pool, PostgresConfig, PostgresStorage};
