//! volter - request pipelines with normalized errors, card validation and request auditing

pub mod card;
#[cfg(feature = "sqlite")]
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod execution;
pub mod monitor;
pub mod persistence;

// Re-export commonly used types
pub use card::{luhn, Card, CardError, CardOptions};
pub use config::AppConfig;
pub use core::{BuildError, Gate, OperationKind, Outcome, Pipeline, Schema, SerdeSchema, Session, ValidationError};
pub use error::{Classifier, ErrorCode, ErrorRule, ServerError};
pub use execution::{bearer_token, RequestContext, ResolverContext};
pub use monitor::Monitor;
pub use persistence::{AuditRecord, AuditStore, InMemoryAuditStore};
#[cfg(feature = "sqlite")]
pub use persistence::SqliteAuditStore;
