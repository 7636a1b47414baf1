//! User domain
//!
//! Account entities, e-mail verification codes, validation and the
//! repository trait used by the user service.

mod entity;
mod repository;
mod validation;

pub use entity::{User, UserId, UserStatus, VerificationCode};
pub use repository::UserRepository;
pub use validation::{
    normalize_email, validate_email, validate_name, validate_password, UserValidationError,
};
