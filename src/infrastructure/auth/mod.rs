//! Authentication infrastructure module
//!
//! JWT session tokens for console users.

mod jwt;

pub use jwt::{IssuedToken, JwtClaims, JwtConfig, JwtGenerator, JwtService};
