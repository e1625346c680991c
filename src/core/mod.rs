//! Core domain models for request pipelines
//!
//! This module defines the building blocks a pipeline is assembled from:
//! input schemas, sessions, steps and the pipeline itself.

pub mod pipeline;
pub mod schema;
pub mod session;
pub mod step;

pub use pipeline::*;
pub use schema::{Issue, Schema, SerdeSchema, ValidationError};
pub use session::Session;
pub use step::{Gate, OperationKind, StepFuture, Terminal};
