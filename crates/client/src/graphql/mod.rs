// GraphQL-over-HTTP content source

use crate::ContentQueryClient;
use async_trait::async_trait;
use flow_pages_core::config::SourceConfig;
use flow_pages_core::{Error, QueryResponse, Result};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// Longest slice of a non-GraphQL body quoted in error messages
const BODY_SNIPPET_LEN: usize = 200;

/// GraphQL API client
pub struct GraphQlClient {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
}

impl GraphQlClient {
    /// Create new GraphQL client, optionally sending a bearer token
    pub fn new(endpoint: &str, token: Option<&str>, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| Error::ConfigParse(format!("Invalid API token: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    /// Create a client from the `[source]` config section.
    ///
    /// The token, when configured, is read from the named environment variable.
    pub fn from_config(source: &SourceConfig) -> Result<Self> {
        let endpoint = source.endpoint.as_deref().ok_or_else(|| {
            Error::ConfigParse("[source] has no 'endpoint' to query".to_string())
        })?;

        let token = match &source.token_env {
            Some(var) => Some(std::env::var(var).map_err(|_| {
                Error::ConfigParse(format!("Environment variable '{}' is not set", var))
            })?),
            None => None,
        };

        Self::new(
            endpoint,
            token.as_deref(),
            Duration::from_secs(source.timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ContentQueryClient for GraphQlClient {
    async fn execute(&self, document: &str) -> Result<QueryResponse> {
        info!(endpoint = %self.endpoint, "submitting page query");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&GraphQlRequest { query: document })
            .send()
            .await
            .map_err(|e| Error::Transport(format!("{}: {}", self.endpoint, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Transport(format!("{}: {}", self.endpoint, e)))?;
        debug!(%status, bytes = body.len(), "query response received");

        // GraphQL servers may report query errors with a non-2xx status.
        // `{"data": null}` is still a GraphQL document.
        if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(&body)
            && (status.is_success() || fields.contains_key("data") || fields.contains_key("errors"))
        {
            return serde_json::from_value::<QueryResponse>(Value::Object(fields)).map_err(|e| {
                Error::Transport(format!("{}: malformed GraphQL response: {}", self.endpoint, e))
            });
        }

        let snippet: String = body.chars().take(BODY_SNIPPET_LEN).collect();
        if status.is_success() {
            Err(Error::Transport(format!(
                "{}: response is not a GraphQL document: {}",
                self.endpoint, snippet
            )))
        } else {
            Err(Error::Transport(format!(
                "{}: HTTP {}: {}",
                self.endpoint, status, snippet
            )))
        }
    }
}
