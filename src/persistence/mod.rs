//! Persistence layer for request audit records

#[cfg(feature = "sqlite")]
pub mod store;

#[cfg(feature = "sqlite")]
pub use store::SqliteAuditStore;

use anyhow::Result;
use chrono::{DateTime, Utc};
use http::{Request, Response};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use uuid::Uuid;

/// One audited request/response pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Unique record ID
    pub id: Uuid,

    /// HTTP method of the request
    pub method: String,

    /// Request URI as received
    pub url: String,

    /// Response status code
    pub status: u16,

    /// Client address, if it could be determined
    pub ip: Option<String>,

    /// `User-Agent` header, if sent
    pub user_agent: Option<String>,

    /// When the record was captured
    pub created: DateTime<Utc>,
}

impl AuditRecord {
    /// Capture the audited fields of a request/response pair
    ///
    /// The client address comes from `x-forwarded-for` (first hop), then
    /// `x-real-ip`, then `peer`.
    pub fn capture<B1, B2>(request: &Request<B1>, response: &Response<B2>, peer: Option<IpAddr>) -> Self {
        let headers = request.headers();
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };

        let ip = header("x-forwarded-for")
            .and_then(|value| value.split(',').next())
            .map(|hop| hop.trim().to_string())
            .or_else(|| header("x-real-ip").map(String::from))
            .or_else(|| peer.map(|addr| addr.to_string()));

        Self {
            id: Uuid::new_v4(),
            method: request.method().to_string(),
            url: request.uri().to_string(),
            status: response.status().as_u16(),
            ip,
            user_agent: header("user-agent").map(String::from),
            created: Utc::now(),
        }
    }
}

/// Trait for audit record backends
#[async_trait::async_trait]
pub trait AuditStore: Send + Sync {
    /// Save one record
    async fn save(&self, record: &AuditRecord) -> Result<()>;

    /// Load a record by ID
    async fn load(&self, id: Uuid) -> Result<Option<AuditRecord>>;

    /// Most recent records first
    async fn recent(&self, limit: usize) -> Result<Vec<AuditRecord>>;

    /// Number of stored records
    async fn count(&self) -> Result<usize>;
}

/// In-memory audit store (for testing or ephemeral use)
pub struct InMemoryAuditStore {
    records: tokio::sync::RwLock<Vec<AuditRecord>>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self {
            records: tokio::sync::RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryAuditStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn save(&self, record: &AuditRecord) -> Result<()> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn load(&self, id: Uuid) -> Result<Option<AuditRecord>> {
        let records = self.records.read().await;
        Ok(records.iter().find(|record| record.id == id).cloned())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<AuditRecord>> {
        let records = self.records.read().await;
        Ok(records.iter().rev().take(limit).cloned().collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.read().await.len())
    }
}
