//! Azure DevOps API response types.
//!
//! These types represent the raw JSON of the work item tracking endpoints.
//! They are deserialized and then mapped to unified types.

use pilot_core::{WorkItem, WorkItemRef};
use serde::{Deserialize, Serialize};

// =============================================================================
// WIQL
// =============================================================================

/// Request body for `POST _apis/wit/wiql`.
#[derive(Debug, Clone, Serialize)]
pub struct WiqlRequest<'a> {
    pub query: &'a str,
}

/// Response of a flat WIQL query.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WiqlResponse {
    #[serde(default)]
    pub query_type: Option<String>,
    #[serde(default)]
    pub work_items: Vec<WiqlWorkItem>,
}

/// A single hit of a WIQL query.
#[derive(Debug, Clone, Deserialize)]
pub struct WiqlWorkItem {
    pub id: u64,
    #[serde(default)]
    pub url: Option<String>,
}

impl From<WiqlWorkItem> for WorkItemRef {
    fn from(item: WiqlWorkItem) -> Self {
        WorkItemRef { id: item.id }
    }
}

// =============================================================================
// Work items
// =============================================================================

/// Response of `GET _apis/wit/workitems?ids=...`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkItemsResponse {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub value: Vec<AdoWorkItem>,
}

/// Azure DevOps work item representation.
#[derive(Debug, Clone, Deserialize)]
pub struct AdoWorkItem {
    pub id: u64,
    #[serde(default)]
    pub rev: Option<u64>,
    #[serde(default)]
    pub fields: AdoWorkItemFields,
    #[serde(default)]
    pub url: Option<String>,
}

/// The subset of work item fields the selector reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdoWorkItemFields {
    #[serde(rename = "System.Title", default)]
    pub title: Option<String>,
    #[serde(rename = "System.WorkItemType", default)]
    pub work_item_type: Option<String>,
    #[serde(rename = "System.State", default)]
    pub state: Option<String>,
    #[serde(rename = "System.Parent", default)]
    pub parent: Option<u64>,
    #[serde(rename = "Microsoft.VSTS.Common.Priority", default)]
    pub priority: Option<u32>,
}

impl From<AdoWorkItem> for WorkItem {
    fn from(item: AdoWorkItem) -> Self {
        let fields = item.fields;
        WorkItem {
            id: item.id,
            title: fields.title.unwrap_or_default(),
            work_item_type: fields.work_item_type.unwrap_or_default(),
            state: fields.state.unwrap_or_default(),
            parent_id: fields.parent,
            priority: fields.priority,
        }
    }
}
