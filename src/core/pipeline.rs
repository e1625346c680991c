//! Pipeline domain model and its builder

use crate::core::{
    schema::Schema,
    step::{boxed, boxed_auth, AuthFn, Gate, OperationKind, StepFn, Terminal},
    Session,
};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Converts a raw failure into the caller's error type
pub type ErrorHandler<E> = Arc<dyn Fn(anyhow::Error) -> E + Send + Sync>;

/// Result of a pipeline invocation that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<R> {
    /// The terminal operation ran and produced a value
    Completed(R),
    /// A gate returned false; nothing was done
    Skipped(Gate),
    /// Every step passed and no terminal operation is configured
    Guarded,
}

impl<R> Outcome<R> {
    pub fn completed(&self) -> Option<&R> {
        match self {
            Outcome::Completed(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped(_))
    }

    /// The payload, dropping why there was none
    pub fn into_option(self) -> Option<R> {
        match self {
            Outcome::Completed(value) => Some(value),
            Outcome::Skipped(_) | Outcome::Guarded => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(R) -> U) -> Outcome<U> {
        match self {
            Outcome::Completed(value) => Outcome::Completed(f(value)),
            Outcome::Skipped(gate) => Outcome::Skipped(gate),
            Outcome::Guarded => Outcome::Guarded,
        }
    }
}

/// Pipeline configuration rejected at construction time
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("pipeline '{pipeline}' configures both {existing} and {attempted} as terminal operations")]
    ConflictingTerminal {
        pipeline: String,
        existing: OperationKind,
        attempted: OperationKind,
    },

    #[error("pipeline '{pipeline}' requires a terminal operation but none is configured")]
    MissingTerminal { pipeline: String },

    #[error("pipeline '{pipeline}' configures more than one transform")]
    ConflictingTransform { pipeline: String },

    #[error("pipeline '{pipeline}' configures transform after its {operation} operation")]
    TransformAfterTerminal {
        pipeline: String,
        operation: OperationKind,
    },
}

/// A reusable request-processing unit
///
/// Type parameters: `T` parsed input, `P` refined input handed to the
/// terminal operation, `S` session identity, `R` result, `E` the error the
/// caller's handler produces. Built once and shared; cloning is cheap.
pub struct Pipeline<T, P, S, R, E> {
    pub(crate) name: String,
    pub(crate) input: Arc<dyn Schema<T>>,
    pub(crate) auth_required: bool,
    pub(crate) auth: Option<AuthFn<S>>,
    pub(crate) existence: Option<StepFn<T, S, bool>>,
    pub(crate) check: Option<StepFn<T, S, bool>>,
    pub(crate) transform: StepFn<T, S, P>,
    pub(crate) terminal: Option<Terminal<P, S, R>>,
    pub(crate) on_error: ErrorHandler<E>,
}

impl<T, S, R, E> Pipeline<T, T, S, R, E>
where
    T: Send + 'static,
    S: 'static,
{
    /// Start building a pipeline
    ///
    /// `input` parses every invocation's raw payload; `on_error` receives
    /// every failure, typically a [`Classifier::route`](crate::error::Classifier::route).
    pub fn builder<I, H>(name: impl Into<String>, input: I, on_error: H) -> PipelineBuilder<T, T, S, R, E>
    where
        I: Schema<T> + 'static,
        H: Fn(anyhow::Error) -> E + Send + Sync + 'static,
    {
        PipelineBuilder {
            name: name.into(),
            input: Arc::new(input),
            auth_required: false,
            auth: None,
            existence: None,
            check: None,
            transform: boxed(|input: T, _session: Session<S>| async move { anyhow::Ok(input) }),
            terminal: None,
            terminal_required: false,
            transformed: false,
            on_error: Arc::new(on_error),
            error: None,
        }
    }
}

impl<T, P, S, R, E> Pipeline<T, P, S, R, E> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn auth_required(&self) -> bool {
        self.auth_required
    }

    /// Kind of the configured terminal operation, `None` for a guard pipeline
    pub fn operation(&self) -> Option<OperationKind> {
        self.terminal.as_ref().map(Terminal::kind)
    }
}

impl<T, P, S, R, E> Clone for Pipeline<T, P, S, R, E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            input: Arc::clone(&self.input),
            auth_required: self.auth_required,
            auth: self.auth.clone(),
            existence: self.existence.clone(),
            check: self.check.clone(),
            transform: Arc::clone(&self.transform),
            terminal: self.terminal.clone(),
            on_error: Arc::clone(&self.on_error),
        }
    }
}

impl<T, P, S, R, E> fmt::Debug for Pipeline<T, P, S, R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("auth_required", &self.auth_required)
            .field("auth", &self.auth.is_some())
            .field("existence", &self.existence.is_some())
            .field("check", &self.check.is_some())
            .field("operation", &self.operation())
            .finish()
    }
}

/// Builder for [`Pipeline`]
pub struct PipelineBuilder<T, P, S, R, E> {
    name: String,
    input: Arc<dyn Schema<T>>,
    auth_required: bool,
    auth: Option<AuthFn<S>>,
    existence: Option<StepFn<T, S, bool>>,
    check: Option<StepFn<T, S, bool>>,
    transform: StepFn<T, S, P>,
    terminal: Option<Terminal<P, S, R>>,
    terminal_required: bool,
    transformed: bool,
    on_error: ErrorHandler<E>,
    error: Option<BuildError>,
}

impl<T, P, S, R, E> PipelineBuilder<T, P, S, R, E>
where
    T: 'static,
    P: 'static,
    S: 'static,
    R: 'static,
{
    /// Reject resolver calls without an `Authorization: Bearer` header
    pub fn require_auth(mut self) -> Self {
        self.auth_required = true;
        self
    }

    /// Fail `build` unless a terminal operation is configured
    pub fn require_terminal(mut self) -> Self {
        self.terminal_required = true;
        self
    }

    /// Map a raw token to the session identity
    pub fn auth<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<S>> + Send + 'static,
    {
        self.auth = Some(boxed_auth(f));
        self
    }

    /// Gate run first; `false` stops the pipeline with [`Outcome::Skipped`]
    pub fn existence<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(T, Session<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<bool>> + Send + 'static,
    {
        self.existence = Some(boxed(f));
        self
    }

    /// Gate run after `existence`
    pub fn check<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(T, Session<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<bool>> + Send + 'static,
    {
        self.check = Some(boxed(f));
        self
    }

    /// Reshape the parsed input before the terminal operation
    ///
    /// Must come before the terminal operation, which consumes the reshaped type.
    /// At most one transform is allowed.
    pub fn transform<Q, F, Fut>(self, f: F) -> PipelineBuilder<T, Q, S, R, E>
    where
        Q: 'static,
        F: Fn(T, Session<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Q>> + Send + 'static,
    {
        let error = match (self.error, &self.terminal) {
            (Some(error), _) => Some(error),
            (None, _) if self.transformed => Some(BuildError::ConflictingTransform {
                pipeline: self.name.clone(),
            }),
            (None, Some(terminal)) => Some(BuildError::TransformAfterTerminal {
                pipeline: self.name.clone(),
                operation: terminal.kind(),
            }),
            (None, None) => None,
        };

        PipelineBuilder {
            name: self.name,
            input: self.input,
            auth_required: self.auth_required,
            auth: self.auth,
            existence: self.existence,
            check: self.check,
            transform: boxed(f),
            terminal: None,
            terminal_required: self.terminal_required,
            transformed: true,
            on_error: self.on_error,
            error,
        }
    }

    pub fn insert<F, Fut>(self, f: F) -> Self
    where
        F: Fn(P, Session<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
    {
        self.terminal(OperationKind::Insert, boxed(f))
    }

    pub fn select<F, Fut>(self, f: F) -> Self
    where
        F: Fn(P, Session<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
    {
        self.terminal(OperationKind::Select, boxed(f))
    }

    pub fn update<F, Fut>(self, f: F) -> Self
    where
        F: Fn(P, Session<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
    {
        self.terminal(OperationKind::Update, boxed(f))
    }

    pub fn delete<F, Fut>(self, f: F) -> Self
    where
        F: Fn(P, Session<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
    {
        self.terminal(OperationKind::Delete, boxed(f))
    }

    fn terminal(mut self, kind: OperationKind, op: StepFn<P, S, R>) -> Self {
        match &self.terminal {
            Some(existing) => {
                if self.error.is_none() {
                    self.error = Some(BuildError::ConflictingTerminal {
                        pipeline: self.name.clone(),
                        existing: existing.kind(),
                        attempted: kind,
                    });
                }
            }
            None => self.terminal = Some(Terminal::new(kind, op)),
        }
        self
    }

    /// Validate the configuration and produce the pipeline
    pub fn build(self) -> Result<Pipeline<T, P, S, R, E>, BuildError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if self.terminal_required && self.terminal.is_none() {
            return Err(BuildError::MissingTerminal { pipeline: self.name });
        }

        Ok(Pipeline {
            name: self.name,
            input: self.input,
            auth_required: self.auth_required,
            auth: self.auth,
            existence: self.existence,
            check: self.check,
            transform: self.transform,
            terminal: self.terminal,
            on_error: self.on_error,
        })
    }
}
