//! User infrastructure module
//!
//! Password hashing with Argon2, the storage-backed repository and the
//! registration / verification / login service.

mod password;
mod service;
mod storage_repository;

pub use password::{Argon2Hasher, PasswordHasher};
pub use service::{
    RegisterUserRequest, UpdatePasswordRequest, UserService, VerificationSettings,
    DEFAULT_CODE_LENGTH, DEFAULT_CODE_TTL_MINUTES,
};
pub use storage_repository::StorageUserRepository;
