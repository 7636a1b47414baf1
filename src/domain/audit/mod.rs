//! Audit domain

mod entity;

pub use entity::{AuditAction, AuditLog, AuditLogId};
