//! Request auditing - persists one record per request/response pair

use crate::persistence::{AuditRecord, AuditStore};
use anyhow::{Context, Result};
use http::{Request, Response};
use std::future::Future;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, info};

/// Callback receiving every stored record
pub type Reporter = Arc<dyn Fn(&AuditRecord) + Send + Sync>;

/// Writes audit records to a store and forwards them to a reporter
#[derive(Clone)]
pub struct Monitor {
    store: Arc<dyn AuditStore>,
    reporter: Reporter,
}

impl Monitor {
    /// Monitor echoing each stored record through the log
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self {
            store,
            reporter: Arc::new(echo),
        }
    }

    /// Replace the reporter
    pub fn with_reporter<F>(mut self, reporter: F) -> Self
    where
        F: Fn(&AuditRecord) + Send + Sync + 'static,
    {
        self.reporter = Arc::new(reporter);
        self
    }

    /// Drop the reporter entirely
    pub fn silent(self) -> Self {
        self.with_reporter(|_| {})
    }

    pub fn store(&self) -> &Arc<dyn AuditStore> {
        &self.store
    }

    /// Audit one request/response pair
    ///
    /// The record is captured before the returned future is polled, so the
    /// future does not borrow the request or response.
    pub fn log<B1, B2>(
        &self,
        request: &Request<B1>,
        response: &Response<B2>,
        peer: Option<IpAddr>,
    ) -> impl Future<Output = Result<AuditRecord>> + Send + 'static {
        let record = AuditRecord::capture(request, response, peer);
        let store = self.store.clone();
        let reporter = self.reporter.clone();

        async move {
            store
                .save(&record)
                .await
                .with_context(|| format!("Failed to audit {} {}", record.method, record.url))?;
            debug!("Audited request {}", record.id);
            reporter(&record);
            Ok(record)
        }
    }
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor").finish_non_exhaustive()
    }
}

fn echo(record: &AuditRecord) {
    info!(
        method = %record.method,
        url = %record.url,
        status = record.status,
        ip = record.ip.as_deref().unwrap_or("-"),
        "request audited"
    );
}
