use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{AnalyzerApi, AnalyzerHandle, Answer, PollSchedule, QueryHandle, QueryStatus};
use crate::error::AnalyzerError;
use crate::prompts::FALLBACK_ANSWER;
use crate::repo_url::RepoUrl;

/// Drives the analyzer job protocol: create, poll until ready, submit a
/// query, poll until done.
#[derive(Clone)]
pub struct AnalyzerClient {
    api: Arc<dyn AnalyzerApi>,
    analyzer_schedule: PollSchedule,
    query_schedule: PollSchedule,
}

/// Wait out one poll interval. Returns false if the token fired first.
async fn wait_interval(schedule: &PollSchedule, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(schedule.interval) => true,
    }
}

impl AnalyzerClient {
    pub fn new(api: Arc<dyn AnalyzerApi>) -> Self {
        Self {
            api,
            analyzer_schedule: PollSchedule::analyzer_default(),
            query_schedule: PollSchedule::query_default(),
        }
    }

    pub fn with_schedules(mut self, analyzer: PollSchedule, query: PollSchedule) -> Self {
        self.analyzer_schedule = analyzer;
        self.query_schedule = query;
        self
    }

    pub fn analyzer_schedule(&self) -> PollSchedule {
        self.analyzer_schedule
    }

    pub fn query_schedule(&self) -> PollSchedule {
        self.query_schedule
    }

    pub async fn create_analyzer(&self, repo_url: &RepoUrl) -> Result<AnalyzerHandle, AnalyzerError> {
        let handle = self
            .api
            .create_analyzer(repo_url)
            .await
            .map_err(AnalyzerError::Creation)?;
        info!(analyzer_id = %handle.analyzer_id, repo = %repo_url, "analyzer job created");
        Ok(handle)
    }

    /// Poll until the analyzer reports READY. A failed poll still uses up an
    /// attempt. Returns false on exhaustion or cancellation.
    pub async fn poll_analyzer_ready(
        &self,
        handle: &AnalyzerHandle,
        schedule: PollSchedule,
        cancel: &CancellationToken,
    ) -> bool {
        for attempt in 1..=schedule.max_attempts {
            if cancel.is_cancelled() {
                debug!(analyzer_id = %handle.analyzer_id, "readiness poll cancelled");
                return false;
            }

            match self.api.analyzer_status(handle).await {
                Ok(status) if status.is_ready() => {
                    info!(analyzer_id = %handle.analyzer_id, attempt, "analyzer ready");
                    return true;
                }
                Ok(status) => {
                    debug!(analyzer_id = %handle.analyzer_id, attempt, ?status, "analyzer not ready");
                }
                Err(e) => {
                    warn!(analyzer_id = %handle.analyzer_id, attempt, error = %e, "analyzer status poll failed");
                }
            }

            if attempt < schedule.max_attempts && !wait_interval(&schedule, cancel).await {
                return false;
            }
        }

        warn!(
            analyzer_id = %handle.analyzer_id,
            attempts = schedule.max_attempts,
            "analyzer never reached READY"
        );
        false
    }

    pub async fn submit_query(
        &self,
        handle: &AnalyzerHandle,
        question: &str,
    ) -> Result<QueryHandle, AnalyzerError> {
        let query = self
            .api
            .submit_query(handle, question)
            .await
            .map_err(AnalyzerError::QuerySubmission)?;
        debug!(query_id = %query.query_id, analyzer_id = %handle.analyzer_id, "query submitted");
        Ok(query)
    }

    /// Poll until the query reports DONE and hand back its answer. Returns
    /// None on exhaustion or cancellation.
    pub async fn poll_query_result(
        &self,
        query: &QueryHandle,
        schedule: PollSchedule,
        cancel: &CancellationToken,
    ) -> Option<Answer> {
        for attempt in 1..=schedule.max_attempts {
            if cancel.is_cancelled() {
                debug!(query_id = %query.query_id, "query poll cancelled");
                return None;
            }

            match self.api.query_status(query).await {
                Ok(QueryStatus::Done(answer)) => {
                    debug!(query_id = %query.query_id, attempt, "query done");
                    return Some(answer);
                }
                Ok(QueryStatus::Failed) => {
                    warn!(query_id = %query.query_id, attempt, "service reported ERROR for query");
                }
                Ok(QueryStatus::Pending(progress)) => {
                    debug!(query_id = %query.query_id, attempt, %progress, "query pending");
                }
                Err(e) => {
                    warn!(query_id = %query.query_id, attempt, error = %e, "query status poll failed");
                }
            }

            if attempt < schedule.max_attempts && !wait_interval(&schedule, cancel).await {
                return None;
            }
        }

        warn!(query_id = %query.query_id, attempts = schedule.max_attempts, "query never reached DONE");
        None
    }

    /// Submit a question and wait for its answer.
    pub async fn try_fetch_answer(
        &self,
        handle: &AnalyzerHandle,
        question: &str,
        cancel: &CancellationToken,
    ) -> Result<Answer, AnalyzerError> {
        let query = self.submit_query(handle, question).await?;
        let schedule = self.query_schedule;

        match self.poll_query_result(&query, schedule, cancel).await {
            Some(answer) => Ok(answer),
            None if cancel.is_cancelled() => Err(AnalyzerError::Cancelled),
            None => Err(AnalyzerError::Timeout {
                attempts: schedule.max_attempts,
            }),
        }
    }

    /// Like `try_fetch_answer`, but any failure becomes the fixed fallback
    /// text. This is where protocol errors turn into something a user reads.
    pub async fn fetch_answer(
        &self,
        handle: &AnalyzerHandle,
        question: &str,
        cancel: &CancellationToken,
    ) -> String {
        match self.try_fetch_answer(handle, question, cancel).await {
            Ok(answer) => answer.into_inner(),
            Err(e) => {
                warn!(analyzer_id = %handle.analyzer_id, error = %e, "falling back to canned answer");
                FALLBACK_ANSWER.to_string()
            }
        }
    }
}
