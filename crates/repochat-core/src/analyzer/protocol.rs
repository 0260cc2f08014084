//! Wire schemas for the analyzer service.
//!
//! Every response is decoded into one of these structs at the boundary. A
//! body that does not fit is a `TransportError::Schema`, never a half-filled
//! value.

use serde::{Deserialize, Serialize};

/// Opaque id of an analyzer job.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnalyzerHandle {
    pub analyzer_id: String,
}

/// Opaque id of one in-flight question.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryHandle {
    pub query_id: String,
}

/// The extracted answer of a finished query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer(pub String);

impl Answer {
    pub fn into_inner(self) -> String {
        self.0
    }
}

#[derive(Serialize)]
pub(crate) struct CreateAnalyzerRequest<'a> {
    pub github_url: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct CreateAnalyzerResponse {
    pub analyzer_id: String,
}

#[derive(Deserialize)]
pub(crate) struct AnalyzerStatusResponse {
    pub progress: String,
}

#[derive(Serialize)]
pub(crate) struct SubmitQueryRequest<'a> {
    pub analyzer_id: &'a str,
    pub query: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct SubmitQueryResponse {
    pub query_id: String,
}

#[derive(Deserialize)]
pub(crate) struct QueryStatusResponse {
    pub progress: String,
    #[serde(default)]
    pub result: Option<QueryResultBody>,
}

#[derive(Deserialize)]
pub(crate) struct QueryResultBody {
    pub answer: String,
}

/// Progress of an analyzer job. Only `Ready` ends the readiness poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyzerStatus {
    Requested,
    Spawned,
    Processing,
    Ready,
    Other(String),
}

impl AnalyzerStatus {
    pub fn from_progress(progress: &str) -> Self {
        match progress {
            "REQUESTED" => AnalyzerStatus::Requested,
            "SPAWNED" => AnalyzerStatus::Spawned,
            "PROCESSING" => AnalyzerStatus::Processing,
            "READY" => AnalyzerStatus::Ready,
            other => AnalyzerStatus::Other(other.to_string()),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, AnalyzerStatus::Ready)
    }
}

/// Progress of a query job. `Done` always carries the answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryStatus {
    Pending(String),
    Failed,
    Done(Answer),
}

impl QueryStatus {
    pub(crate) fn from_response(response: QueryStatusResponse) -> Result<Self, String> {
        match response.progress.as_str() {
            "DONE" => response
                .result
                .map(|r| QueryStatus::Done(Answer(r.answer)))
                .ok_or_else(|| "progress is DONE but result.answer is missing".to_string()),
            "ERROR" => Ok(QueryStatus::Failed),
            _ => Ok(QueryStatus::Pending(response.progress)),
        }
    }
}
