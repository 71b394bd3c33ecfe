//! Shared fixtures for integration tests.
//!
//! `FakeAzureDevOps` stands up an httpmock server that answers the two
//! work item tracking endpoints for one project, `contoso/Fabrikam`.

#![allow(dead_code)]

use httpmock::prelude::*;
use httpmock::Mock;
use pilot_core::Config;
use serde_json::{json, Value};

pub const PAT: &str = "integration-pat";

/// Mock Azure DevOps organization.
pub struct FakeAzureDevOps {
    pub server: MockServer,
}

impl FakeAzureDevOps {
    pub fn start() -> Self {
        Self {
            server: MockServer::start(),
        }
    }

    /// Organization URL including the project.
    pub fn org_url(&self) -> String {
        format!("{}/contoso/Fabrikam", self.server.base_url())
    }

    /// Configuration pointing at this server, as if loaded from the environment.
    pub fn config(&self) -> Config {
        let org_url = self.org_url();
        let mut config = Config::default();
        config.apply_env(|name| match name {
            "AZURE_DEVOPS_ORG_URL" => Some(org_url.clone()),
            "AZURE_DEVOPS_EXT_PAT" => Some(PAT.to_string()),
            _ => None,
        });
        config
    }

    /// Answer the open items query with `ids` in priority order.
    pub fn open_items(&self, ids: &[u64]) -> Mock<'_> {
        let body = wiql_body(ids);
        self.server.mock(|when, then| {
            when.method(POST)
                .path("/contoso/Fabrikam/_apis/wit/wiql")
                .query_param("api-version", "6.0")
                .body_includes("SELECT [System.Id] FROM WorkItems");
            then.status(200).json_body(body.clone());
        })
    }

    /// Answer the open children query with `ids`.
    pub fn open_children(&self, ids: &[u64]) -> Mock<'_> {
        let body = wiql_body(ids);
        self.server.mock(|when, then| {
            when.method(POST)
                .path("/contoso/Fabrikam/_apis/wit/wiql")
                .body_includes("SELECT [System.Id], [System.Parent] FROM WorkItems");
            then.status(200).json_body(body.clone());
        })
    }

    /// Fail every WIQL query with `status`.
    pub fn wiql_failure(&self, status: u16) -> Mock<'_> {
        self.server.mock(|when, then| {
            when.method(POST).path("/contoso/Fabrikam/_apis/wit/wiql");
            then.status(status).body("service unavailable");
        })
    }

    /// Answer a batched read for exactly `items` (in that id order).
    pub fn work_items(&self, items: &[Value]) -> Mock<'_> {
        let csv: Vec<String> = items
            .iter()
            .map(|item| item["id"].as_u64().unwrap_or_default().to_string())
            .collect();
        let body = json!({ "count": items.len(), "value": items });
        self.server.mock(|when, then| {
            when.method(GET)
                .path("/contoso/Fabrikam/_apis/wit/workitems")
                .query_param("ids", csv.join(","))
                .query_param("api-version", "6.0");
            then.status(200).json_body(body.clone());
        })
    }
}

fn wiql_body(ids: &[u64]) -> Value {
    let refs: Vec<Value> = ids.iter().map(|id| json!({ "id": id })).collect();
    json!({ "queryType": "flat", "workItems": refs })
}

/// A work item as returned by `_apis/wit/workitems`.
pub fn work_item(id: u64, work_item_type: &str, title: &str, parent: Option<u64>) -> Value {
    let mut fields = json!({
        "System.Title": title,
        "System.WorkItemType": work_item_type,
        "System.State": "New",
        "Microsoft.VSTS.Common.Priority": 2
    });
    if let Some(parent) = parent {
        fields["System.Parent"] = json!(parent);
    }
    json!({ "id": id, "rev": 1, "fields": fields })
}
