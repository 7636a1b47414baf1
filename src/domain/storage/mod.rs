//! Storage domain - Generic storage abstraction layer

mod entity;
mod repository;

pub(crate) use entity::impl_string_key;
pub use entity::{StorageEntity, StorageKey};
pub use repository::Storage;

#[cfg(test)]
pub(crate) use entity::test_support;
