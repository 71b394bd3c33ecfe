//! Azure DevOps API client implementation.

use async_trait::async_trait;
use base64::Engine;
use pilot_core::{
    AzureDevOpsConfig, Error, Fetched, Result, TransientFailure, WorkItem, WorkItemRef,
    WorkTracker,
};
use tracing::{debug, warn};

use crate::scope::ProjectScope;
use crate::types::{WiqlRequest, WiqlResponse, WorkItemsResponse};
use crate::{wiql, DEFAULT_API_VERSION, MAX_BATCH_SIZE};

/// Azure DevOps work item tracking client.
pub struct AzureDevOpsClient {
    scope: ProjectScope,
    api_version: String,
    auth_header: String,
    client: reqwest::Client,
}

impl AzureDevOpsClient {
    /// Create a new client for `scope`, authenticating with a personal access token.
    pub fn new(scope: ProjectScope, token: impl AsRef<str>) -> Self {
        // Basic auth with an empty user name
        let credentials = format!(":{}", token.as_ref());
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
        Self {
            scope,
            api_version: DEFAULT_API_VERSION.to_string(),
            auth_header: format!("Basic {}", encoded),
            client: reqwest::Client::builder()
                .user_agent("backlog-pilot")
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Create a client from configuration.
    pub fn from_config(config: &AzureDevOpsConfig) -> Result<Self> {
        let scope = ProjectScope::from_config(config)?;
        let token = config
            .token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| Error::Config("Azure DevOps personal access token is missing".into()))?;
        Ok(Self::new(scope, token).with_api_version(config.api_version.clone()))
    }

    /// Override the REST API version.
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        let api_version = api_version.into();
        if !api_version.trim().is_empty() {
            self.api_version = api_version;
        }
        self
    }

    /// The project this client is scoped to.
    pub fn scope(&self) -> &ProjectScope {
        &self.scope
    }

    /// Build request with auth header.
    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
    }

    /// Run a WIQL query and return the referenced ids in result order.
    pub async fn run_wiql(&self, query: &str) -> Result<Vec<WorkItemRef>> {
        self.run_wiql_top(query, None).await
    }

    /// Run a WIQL query, optionally capping the number of hits server side.
    pub async fn run_wiql_top(&self, query: &str, top: Option<usize>) -> Result<Vec<WorkItemRef>> {
        let url = self.scope.api_url("wit/wiql");
        debug!(url = url, query = query, "Azure DevOps WIQL request");

        let mut params = vec![("api-version", self.api_version.clone())];
        if let Some(top) = top {
            params.push(("$top", top.to_string()));
        }

        let response = self
            .request(reqwest::Method::POST, &url)
            .query(&params)
            .json(&WiqlRequest { query })
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let body: WiqlResponse = self.handle_response(response).await?;
        Ok(body.work_items.into_iter().map(Into::into).collect())
    }

    /// Fetch one batch of work items. `ids` must not exceed [`MAX_BATCH_SIZE`].
    pub async fn get_work_items_batch(&self, ids: &[u64]) -> Result<Vec<WorkItem>> {
        if ids.len() > MAX_BATCH_SIZE {
            return Err(Error::InvalidArgument(format!(
                "At most {} ids can be fetched per request, got {}",
                MAX_BATCH_SIZE,
                ids.len()
            )));
        }

        let url = self.scope.api_url("wit/workitems");
        let csv: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        debug!(url = url, count = ids.len(), "Azure DevOps work items request");

        let response = self
            .request(reqwest::Method::GET, &url)
            .query(&[
                ("ids", csv.join(",")),
                ("api-version", self.api_version.clone()),
            ])
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let body: WorkItemsResponse = self.handle_response(response).await?;
        Ok(body.value.into_iter().map(Into::into).collect())
    }

    /// Check that the project answers a trivial query.
    pub async fn check_connection(&self) -> Result<()> {
        self.run_wiql_top(&wiql::probe_query(self.scope.project()), Some(1))
            .await
            .map(|_| ())
    }

    /// Handle response and map errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let status_code = status.as_u16();
            let message = response.text().await.unwrap_or_default();
            warn!(
                status = status_code,
                message = message,
                "Azure DevOps API error response"
            );
            return Err(Error::from_status(status_code, message));
        }

        response
            .json()
            .await
            .map_err(|e| Error::InvalidData(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl WorkTracker for AzureDevOpsClient {
    fn name(&self) -> &str {
        "azure-devops"
    }

    async fn query(&self, wiql: &str) -> Fetched<Vec<WorkItemRef>> {
        match self.run_wiql(wiql).await {
            Ok(refs) => Fetched::ok(refs),
            Err(e) => {
                warn!(error = %e, "WIQL query failed, continuing without its results");
                Fetched::failed(TransientFailure::from_error("WIQL query", &e))
            }
        }
    }

    async fn hydrate(&self, ids: &[u64]) -> Fetched<Vec<WorkItem>> {
        let mut items = Vec::with_capacity(ids.len());
        let mut failures = Vec::new();
        let chunks = ids.len().div_ceil(MAX_BATCH_SIZE);

        for (index, chunk) in ids.chunks(MAX_BATCH_SIZE).enumerate() {
            match self.get_work_items_batch(chunk).await {
                Ok(batch) => items.extend(batch),
                Err(e) => {
                    warn!(
                        chunk = index + 1,
                        chunks = chunks,
                        size = chunk.len(),
                        error = %e,
                        "Work item batch failed, dropping it"
                    );
                    failures.push(TransientFailure::from_error(
                        format!("hydrate batch {}/{} ({} ids)", index + 1, chunks, chunk.len()),
                        &e,
                    ));
                }
            }
        }

        Fetched::with_failures(items, failures)
    }
}
