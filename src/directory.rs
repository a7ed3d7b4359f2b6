//! Broadcast directory
//!
//! Fetches the list of currently active broadcasts. Pure data access: one
//! fetch per mount, no caching, no side effects. A failed or slow fetch
//! degrades to zero broadcasts rather than an error the UI must handle.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{EngineError, EngineResult};
use crate::models::Broadcast;

#[async_trait]
pub trait BroadcastDirectory: Send + Sync {
    /// Ordered, finite list of active broadcasts.
    async fn list_active(&self) -> EngineResult<Vec<Broadcast>>;
}

/// HTTP-backed directory client.
pub struct HttpBroadcastDirectory {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBroadcastDirectory {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl BroadcastDirectory for HttpBroadcastDirectory {
    async fn list_active(&self) -> EngineResult<Vec<Broadcast>> {
        let url = format!("{}/v1/streams/live", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| EngineError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EngineError::Unavailable(format!(
                "directory returned {}",
                response.status()
            )));
        }

        response
            .json::<Vec<Broadcast>>()
            .await
            .map_err(|e| EngineError::Unavailable(e.to_string()))
    }
}

/// Race the directory fetch against a fixed budget and degrade to an empty
/// list on failure or timeout. Availability over strict consistency.
pub async fn list_active_or_empty(
    directory: &dyn BroadcastDirectory,
    timeout_ms: u64,
) -> Vec<Broadcast> {
    match tokio::time::timeout(Duration::from_millis(timeout_ms), directory.list_active()).await {
        Ok(Ok(broadcasts)) => broadcasts,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "broadcast directory unavailable, presenting empty list");
            Vec::new()
        }
        Err(_) => {
            tracing::warn!(timeout_ms, "broadcast directory fetch timed out, presenting empty list");
            Vec::new()
        }
    }
}
