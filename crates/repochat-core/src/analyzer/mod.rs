pub mod client;
pub mod http;
pub mod protocol;

#[cfg(test)]
pub(crate) mod fake;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::repo_url::RepoUrl;

pub use client::AnalyzerClient;
pub use http::HttpAnalyzerApi;
pub use protocol::{Answer, AnalyzerHandle, AnalyzerStatus, QueryHandle, QueryStatus};

/// One request per method against the analyzer service. Polling and
/// fallbacks live in `AnalyzerClient`, not here.
#[async_trait]
pub trait AnalyzerApi: Send + Sync {
    async fn create_analyzer(&self, repo_url: &RepoUrl) -> Result<AnalyzerHandle, TransportError>;

    async fn analyzer_status(&self, handle: &AnalyzerHandle) -> Result<AnalyzerStatus, TransportError>;

    async fn submit_query(
        &self,
        handle: &AnalyzerHandle,
        question: &str,
    ) -> Result<QueryHandle, TransportError>;

    async fn query_status(&self, query: &QueryHandle) -> Result<QueryStatus, TransportError>;
}

/// Fixed-interval polling with a bounded number of status requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollSchedule {
    pub const fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Readiness of a freshly created analyzer: every 3s, 15 tries.
    pub const fn analyzer_default() -> Self {
        Self::new(Duration::from_millis(3000), 15)
    }

    /// Completion of a query: every 4.5s, 25 tries.
    pub const fn query_default() -> Self {
        Self::new(Duration::from_millis(4500), 25)
    }
}
