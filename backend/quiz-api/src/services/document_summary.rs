use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::utils::retry::{retry_async_with_config, RetryConfig};

const SUMMARY_QUERY: &str = "query GetRecord($mediaRecordId: UUID!) { \
     _internal_noauth_getMediaRecordSummary(mediaRecordId: $mediaRecordId) }";

/// Source of background text for generation prompts.
#[async_trait]
pub trait DocumentSummaryLookup: Send + Sync {
    /// Summary text of a document; empty when unknown or unavailable.
    async fn summary(&self, document_id: &str) -> String;
}

/// GraphQL client for the document processing service.
pub struct DocProcClient {
    client: Client,
    url: String,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<SummaryData>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct SummaryData {
    #[serde(rename = "_internal_noauth_getMediaRecordSummary", default)]
    summary: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

impl DocProcClient {
    pub fn new(client: Client, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            url: url.into(),
            timeout,
        }
    }

    async fn fetch_summary(&self, document_id: &str) -> Result<String> {
        let request = GraphQlRequest {
            query: SUMMARY_QUERY,
            variables: json!({ "mediaRecordId": document_id }),
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await
            .context("Failed to call document service")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!(
                "Document service returned error {}: {}",
                status,
                error_text
            ));
        }

        let body: GraphQlResponse = response
            .json()
            .await
            .context("Failed to parse document service response")?;

        if let Some(errors) = body.errors.filter(|errors| !errors.is_empty()) {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(anyhow!("Document service query failed: {}", messages.join("; ")));
        }

        Ok(body
            .data
            .and_then(|data| data.summary)
            .map(|parts| parts.join("\n"))
            .unwrap_or_default())
    }
}

#[async_trait]
impl DocumentSummaryLookup for DocProcClient {
    async fn summary(&self, document_id: &str) -> String {
        match retry_async_with_config(RetryConfig::quick(), || self.fetch_summary(document_id)).await
        {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!(document_id, "Document summary unavailable: {:#}", e);
                String::new()
            }
        }
    }
}

/// Lookup used when no document service is configured.
pub struct NoDocuments;

#[async_trait]
impl DocumentSummaryLookup for NoDocuments {
    async fn summary(&self, _document_id: &str) -> String {
        String::new()
    }
}
