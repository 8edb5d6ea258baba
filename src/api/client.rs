use anyhow::{Context, Result};
use log::{debug, error, info};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use crate::config::InstanceConfig;

/// GraphQL client for one Wiki.js instance
#[derive(Clone)]
pub struct WikiClient {
    endpoint: String,
    api_key: String,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

impl WikiClient {
    pub fn new(instance: &InstanceConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("wikit/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self::with_http_client(instance, http_client))
    }

    pub fn with_http_client(instance: &InstanceConfig, http_client: reqwest::Client) -> Self {
        Self {
            endpoint: instance.url.clone(),
            api_key: instance.api_key.clone(),
            http_client,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST `query` with `variables` and decode the `data` field into `T`
    pub async fn graphql<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T> {
        let preview = query_preview(query);
        info!("GraphQL request starting: {}", preview);

        let response = self
            .http_client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&serde_json::json!({ "query": query, "variables": variables }))
            .send()
            .await
            .with_context(|| format!("Request to {} failed", self.endpoint))?;

        let status = response.status();
        debug!("GraphQL response status: {}", status);

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("GraphQL fetch failed ({}): {}", status, error_text);
            anyhow::bail!("GraphQL error {}: {}", status.as_u16(), error_text);
        }

        let body = response.text().await.context("Failed to read GraphQL response")?;
        let data = parse_graphql_response(&body)?;
        info!("GraphQL request succeeded: {}", preview);
        Ok(data)
    }
}

/// Decode a GraphQL response body.
///
/// A non-empty `errors` array fails with every message on its own line.
pub fn parse_graphql_response<T: DeserializeOwned>(body: &str) -> Result<T> {
    let response: GraphQlResponse =
        serde_json::from_str(body).context("Invalid GraphQL response body")?;

    if !response.errors.is_empty() {
        let messages = response
            .errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        error!("GraphQL returned errors: {}", messages);
        anyhow::bail!("GraphQL errors:\n{}", messages);
    }

    let data = response
        .data
        .filter(|data| !data.is_null())
        .context("GraphQL response contained no data")?;
    serde_json::from_value(data).context("Unexpected GraphQL response shape")
}

fn query_preview(query: &str) -> String {
    query
        .trim()
        .lines()
        .next()
        .unwrap_or_default()
        .chars()
        .take(100)
        .collect()
}
