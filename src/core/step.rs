//! Step model - the closures a pipeline is assembled from

use crate::core::Session;
use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Future returned by every boxed step
pub type StepFuture<T> = BoxFuture<'static, anyhow::Result<T>>;

/// `auth`: raw token to session identity
pub type AuthFn<S> = Arc<dyn Fn(String) -> StepFuture<S> + Send + Sync>;

/// Any step taking the current value and the session
pub type StepFn<A, S, X> = Arc<dyn Fn(A, Session<S>) -> StepFuture<X> + Send + Sync>;

/// Which short-circuit gate stopped a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Existence,
    Check,
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gate::Existence => f.write_str("existence"),
            Gate::Check => f.write_str("check"),
        }
    }
}

/// Kind of terminal operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Insert,
    Select,
    Update,
    Delete,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Insert => f.write_str("insert"),
            OperationKind::Select => f.write_str("select"),
            OperationKind::Update => f.write_str("update"),
            OperationKind::Delete => f.write_str("delete"),
        }
    }
}

/// The single data operation that produces a pipeline's result
pub struct Terminal<P, S, R> {
    kind: OperationKind,
    op: StepFn<P, S, R>,
}

impl<P, S, R> Terminal<P, S, R> {
    pub fn new(kind: OperationKind, op: StepFn<P, S, R>) -> Self {
        Self { kind, op }
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub async fn execute(&self, input: P, session: Session<S>) -> anyhow::Result<R> {
        (self.op)(input, session).await
    }
}

impl<P, S, R> Clone for Terminal<P, S, R> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            op: Arc::clone(&self.op),
        }
    }
}

impl<P, S, R> fmt::Debug for Terminal<P, S, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Terminal").field("kind", &self.kind).finish()
    }
}

/// Box an async closure into a [`StepFn`]
pub fn boxed<A, S, X, F, Fut>(f: F) -> StepFn<A, S, X>
where
    F: Fn(A, Session<S>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<X>> + Send + 'static,
    A: 'static,
    S: 'static,
    X: 'static,
{
    Arc::new(move |input: A, session: Session<S>| f(input, session).boxed())
}

/// Box an async closure into an [`AuthFn`]
pub fn boxed_auth<S, F, Fut>(f: F) -> AuthFn<S>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<S>> + Send + 'static,
    S: 'static,
{
    Arc::new(move |token: String| f(token).boxed())
}
