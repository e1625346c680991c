//! Maps raw failures onto the normalized taxonomy

use crate::core::ValidationError;
use crate::error::ServerError;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};

/// A backend-specific recognizer registered with a [`Classifier`]
///
/// Rules are consulted in registration order after schema validation failures
/// and before already-normalized errors. Returning `None` passes the error on.
pub trait ErrorRule: Send + Sync {
    /// Short name used in log output
    fn name(&self) -> &'static str;

    /// Normalize `error` if this rule recognizes it
    fn classify(&self, error: &anyhow::Error) -> Option<ServerError>;
}

/// Total, pure mapping from any failure to a [`ServerError`]
#[derive(Clone)]
pub struct Classifier {
    rules: Vec<Arc<dyn ErrorRule>>,
}

impl Classifier {
    /// A classifier with no backend rules
    ///
    /// It still recognizes validation failures and passes normalized errors
    /// through; everything else becomes `INTERNAL_SERVER_ERROR`.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Register a backend rule after the ones already present
    pub fn with_rule(mut self, rule: impl ErrorRule + 'static) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Names of the registered backend rules, in order
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    /// Classify a failure. Never fails itself.
    pub fn classify(&self, error: &anyhow::Error) -> ServerError {
        if let Some(validation) = error.chain().find_map(|c| c.downcast_ref::<ValidationError>()) {
            debug!("Validation failed: {}", validation.summary());
            return ServerError::validation("Failed to validate");
        }

        for rule in &self.rules {
            if let Some(normalized) = rule.classify(error) {
                debug!("Error classified by {} as {}", rule.name(), normalized.code);
                return normalized;
            }
        }

        if let Some(normalized) = error.chain().find_map(|c| c.downcast_ref::<ServerError>()) {
            return normalized.clone();
        }

        error!("Unclassified error: {:#}", error);
        ServerError::internal("Unexpected error")
    }

    /// Turn this classifier into a pipeline error handler
    ///
    /// Every failure is classified and then handed to `resolver`, whose return
    /// value becomes the pipeline's error.
    pub fn route<E, F>(self, resolver: F) -> impl Fn(anyhow::Error) -> E + Send + Sync + 'static
    where
        F: Fn(ServerError) -> E + Send + Sync + 'static,
        E: 'static,
    {
        move |error| resolver(self.classify(&error))
    }
}

impl Default for Classifier {
    /// A classifier with the rules for every storage backend compiled in
    fn default() -> Self {
        #[allow(unused_mut)]
        let mut classifier = Self::new();
        #[cfg(feature = "sqlite")]
        {
            classifier = classifier.with_rule(crate::error::rules::SqliteUniqueRule);
        }
        #[cfg(feature = "postgres")]
        {
            classifier = classifier.with_rule(
                crate::error::rules::DetailConstraintRule::<sqlx::postgres::PgDatabaseError>::new(),
            );
        }
        classifier
    }
}

impl fmt::Debug for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classifier")
            .field("rules", &self.rule_names())
            .finish()
    }
}
