use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use super::protocol::{
    AnalyzerStatusResponse, CreateAnalyzerRequest, CreateAnalyzerResponse, QueryStatusResponse,
    SubmitQueryRequest, SubmitQueryResponse,
};
use super::{AnalyzerApi, AnalyzerHandle, AnalyzerStatus, QueryHandle, QueryStatus};
use crate::error::TransportError;
use crate::repo_url::RepoUrl;

/// `AnalyzerApi` over plain HTTP + JSON.
#[derive(Clone)]
pub struct HttpAnalyzerApi {
    client: Client,
    base: Url,
    base_url: String,
}

impl HttpAnalyzerApi {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, TransportError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let base = Url::parse(&base_url).map_err(|e| TransportError::InvalidBaseUrl {
            url: base_url.clone(),
            detail: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(TransportError::InvalidBaseUrl {
                url: base_url,
                detail: "not a hierarchical URL".to_string(),
            });
        }

        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(TransportError::Client)?;

        Ok(Self {
            client,
            base,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Base URL plus path segments. Each segment is percent-encoded, so ids
    /// from the service can never change the route.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> Result<T, TransportError> {
        let response = request.send().await.map_err(|source| TransportError::Http {
            endpoint: endpoint.to_string(),
            source,
        })?;

        if !response.status().is_success() {
            return Err(TransportError::Status {
                endpoint: endpoint.to_string(),
                status: response.status(),
            });
        }

        let body = response.text().await.map_err(|source| TransportError::Http {
            endpoint: endpoint.to_string(),
            source,
        })?;

        serde_json::from_str(&body).map_err(|e| TransportError::Schema {
            endpoint: endpoint.to_string(),
            detail: e.to_string(),
        })
    }
}

#[async_trait]
impl AnalyzerApi for HttpAnalyzerApi {
    async fn create_analyzer(&self, repo_url: &RepoUrl) -> Result<AnalyzerHandle, TransportError> {
        let request = self
            .client
            .post(self.url(&["analyzer"]))
            .json(&CreateAnalyzerRequest {
                github_url: repo_url.as_str(),
            });

        let response: CreateAnalyzerResponse = self.send("POST /analyzer", request).await?;
        Ok(AnalyzerHandle {
            analyzer_id: response.analyzer_id,
        })
    }

    async fn analyzer_status(&self, handle: &AnalyzerHandle) -> Result<AnalyzerStatus, TransportError> {
        let request = self
            .client
            .get(self.url(&["analyzer", &handle.analyzer_id]));

        let response: AnalyzerStatusResponse = self.send("GET /analyzer/{id}", request).await?;
        Ok(AnalyzerStatus::from_progress(&response.progress))
    }

    async fn submit_query(
        &self,
        handle: &AnalyzerHandle,
        question: &str,
    ) -> Result<QueryHandle, TransportError> {
        let request = self
            .client
            .post(self.url(&["query"]))
            .json(&SubmitQueryRequest {
                analyzer_id: &handle.analyzer_id,
                query: question,
            });

        let response: SubmitQueryResponse = self.send("POST /query", request).await?;
        Ok(QueryHandle {
            query_id: response.query_id,
        })
    }

    async fn query_status(&self, query: &QueryHandle) -> Result<QueryStatus, TransportError> {
        let endpoint = "GET /query/{id}";
        let request = self
            .client
            .get(self.url(&["query", &query.query_id]));

        let response: QueryStatusResponse = self.send(endpoint, request).await?;
        QueryStatus::from_response(response).map_err(|detail| TransportError::Schema {
            endpoint: endpoint.to_string(),
            detail,
        })
    }
}
