//! Scripted in-memory analyzer service for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;

use super::{AnalyzerApi, AnalyzerHandle, AnalyzerStatus, Answer, QueryHandle, QueryStatus};
use crate::error::TransportError;
use crate::repo_url::RepoUrl;

#[derive(Debug, Default, Clone)]
pub(crate) struct Calls {
    pub created: Vec<String>,
    pub analyzer_polls: u32,
    pub submitted: Vec<String>,
    pub query_polls: u32,
}

impl Calls {
    pub fn total(&self) -> usize {
        self.created.len()
            + self.analyzer_polls as usize
            + self.submitted.len()
            + self.query_polls as usize
    }
}

/// Each status call pops the next scripted response. Once a script runs
/// dry the fake falls back to `auto_ready` / `auto_answer`.
#[derive(Default)]
pub(crate) struct FakeApi {
    pub fail_create: bool,
    pub fail_submit: bool,
    pub auto_ready: bool,
    pub auto_answer: bool,
    analyzer_script: Mutex<VecDeque<Result<AnalyzerStatus, ()>>>,
    query_script: Mutex<VecDeque<Result<QueryStatus, ()>>>,
    questions: Mutex<HashMap<String, String>>,
    calls: Mutex<Calls>,
}

fn unavailable(endpoint: &str) -> TransportError {
    TransportError::Status {
        endpoint: endpoint.to_string(),
        status: StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl FakeApi {
    /// Analyzer becomes ready on the first poll and every query is answered
    /// on its first poll.
    pub fn responsive() -> Self {
        Self {
            auto_ready: true,
            auto_answer: true,
            ..Self::default()
        }
    }

    /// Every `POST /analyzer` fails.
    pub fn failing_create() -> Self {
        Self {
            fail_create: true,
            ..Self::default()
        }
    }

    /// Every `POST /query` fails.
    pub fn failing_submit() -> Self {
        Self {
            fail_submit: true,
            ..Self::default()
        }
    }

    /// Analyzer becomes ready at once, but no query ever finishes.
    pub fn never_answers() -> Self {
        Self {
            auto_ready: true,
            ..Self::default()
        }
    }

    pub fn script_analyzer(self, script: Vec<Result<AnalyzerStatus, ()>>) -> Self {
        *self.analyzer_script.lock().unwrap() = script.into();
        self
    }

    pub fn script_query(self, script: Vec<Result<QueryStatus, ()>>) -> Self {
        *self.query_script.lock().unwrap() = script.into();
        self
    }

    pub fn calls(&self) -> Calls {
        self.calls.lock().unwrap().clone()
    }
}

pub(crate) fn answer_for(question: &str) -> String {
    format!("Answer to: {}", question)
}

#[async_trait]
impl AnalyzerApi for FakeApi {
    async fn create_analyzer(&self, repo_url: &RepoUrl) -> Result<AnalyzerHandle, TransportError> {
        let mut calls = self.calls.lock().unwrap();
        calls.created.push(repo_url.as_str().to_string());
        if self.fail_create {
            return Err(unavailable("POST /analyzer"));
        }
        Ok(AnalyzerHandle {
            analyzer_id: format!("analyzer-{}", calls.created.len()),
        })
    }

    async fn analyzer_status(&self, _handle: &AnalyzerHandle) -> Result<AnalyzerStatus, TransportError> {
        self.calls.lock().unwrap().analyzer_polls += 1;
        match self.analyzer_script.lock().unwrap().pop_front() {
            Some(Ok(status)) => Ok(status),
            Some(Err(())) => Err(unavailable("GET /analyzer/{id}")),
            None if self.auto_ready => Ok(AnalyzerStatus::Ready),
            None => Ok(AnalyzerStatus::Processing),
        }
    }

    async fn submit_query(
        &self,
        _handle: &AnalyzerHandle,
        question: &str,
    ) -> Result<QueryHandle, TransportError> {
        let mut calls = self.calls.lock().unwrap();
        calls.submitted.push(question.to_string());
        if self.fail_submit {
            return Err(unavailable("POST /query"));
        }
        let query_id = format!("query-{}", calls.submitted.len());
        self.questions
            .lock()
            .unwrap()
            .insert(query_id.clone(), question.to_string());
        Ok(QueryHandle { query_id })
    }

    async fn query_status(&self, query: &QueryHandle) -> Result<QueryStatus, TransportError> {
        self.calls.lock().unwrap().query_polls += 1;
        match self.query_script.lock().unwrap().pop_front() {
            Some(Ok(status)) => Ok(status),
            Some(Err(())) => Err(unavailable("GET /query/{id}")),
            None if self.auto_answer => {
                let questions = self.questions.lock().unwrap();
                let question = questions.get(&query.query_id).cloned().unwrap_or_default();
                Ok(QueryStatus::Done(Answer(answer_for(&question))))
            }
            None => Ok(QueryStatus::Pending("ANSWERING".to_string())),
        }
    }
}
