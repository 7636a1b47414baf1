//! Storage entity traits and types

use std::fmt::Debug;

use serde::{de::DeserializeOwned, Serialize};

/// Trait for types that can be used as storage keys
pub trait StorageKey: Clone + Debug + Send + Sync + Eq + std::hash::Hash {
    /// Returns the key as a string for storage backends that require string keys
    fn as_str(&self) -> &str;
}

/// Trait for types that can be stored
pub trait StorageEntity: Clone + Debug + Send + Sync + Serialize + DeserializeOwned {
    /// The key type for this entity
    type Key: StorageKey;

    /// Returns the entity's key
    fn key(&self) -> &Self::Key;
}

/// Implements `StorageKey` for a newtype wrapping a `String`
macro_rules! impl_string_key {
    ($ty:ty) => {
        impl $crate::domain::storage::StorageKey for $ty {
            fn as_str(&self) -> &str {
                &self.0
            }
        }
    };
}

pub(crate) use impl_string_key;


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_storage_key_as_str() {
        assert_eq!(key("test-key").as_str(), "test-key");
    }

    #[test]
    fn test_storage_entity_key() {
        let e = entity("entity-1", "Test");
        assert_eq!(e.key().as_str(), "entity-1");
    }
}
