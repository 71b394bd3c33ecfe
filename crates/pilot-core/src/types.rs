//! Common types shared by work trackers, the selector and the report.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A query hit that has not been hydrated with fields yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkItemRef {
    pub id: u64,
}

impl From<u64> for WorkItemRef {
    fn from(id: u64) -> Self {
        Self { id }
    }
}

/// A hydrated work item with its display fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: u64,
    pub title: String,
    /// Work item type, e.g. "Task", "Bug", "User Story"
    #[serde(rename = "type")]
    pub work_item_type: String,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
}

/// How the selector walks the backlog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalMode {
    /// Take the top open items as they come out of the priority query.
    Direct,
    /// Replace every candidate that has open children with those children.
    #[default]
    ParentAware,
}

impl From<bool> for TraversalMode {
    fn from(prioritize_parents: bool) -> Self {
        if prioritize_parents {
            TraversalMode::ParentAware
        } else {
            TraversalMode::Direct
        }
    }
}

/// A query step that failed and was absorbed instead of aborting the selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransientFailure {
    /// Which step failed, e.g. "open items query" or "hydrate chunk 2/3"
    pub step: String,
    pub message: String,
}

impl TransientFailure {
    pub fn new(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            message: message.into(),
        }
    }

    pub fn from_error(step: impl Into<String>, error: &Error) -> Self {
        Self::new(step, error.to_string())
    }
}

impl std::fmt::Display for TransientFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.step, self.message)
    }
}

/// Outcome of a best-effort fetch: whatever data was obtained, plus the
/// failures that were absorbed on the way.
///
/// An empty `data` with no failures means the tracker genuinely returned
/// nothing; an empty `data` with failures means the data is unknown.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub data: T,
    pub failures: Vec<TransientFailure>,
}

impl<T> Fetched<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data,
            failures: Vec::new(),
        }
    }

    pub fn with_failures(data: T, failures: Vec<TransientFailure>) -> Self {
        Self { data, failures }
    }

    pub fn is_degraded(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Move the data out, appending the failures to `sink`.
    pub fn drain_into(self, sink: &mut Vec<TransientFailure>) -> T {
        sink.extend(self.failures);
        self.data
    }
}

impl<T: Default> Fetched<T> {
    /// A fetch that produced nothing because of `failure`.
    pub fn failed(failure: TransientFailure) -> Self {
        Self {
            data: T::default(),
            failures: vec![failure],
        }
    }
}

/// Ordered, deduplicated selection of work items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionResult {
    pub items: Vec<WorkItem>,
    pub failures: Vec<TransientFailure>,
}

impl SelectionResult {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn ids(&self) -> Vec<u64> {
        self.items.iter().map(|item| item.id).collect()
    }

    pub fn is_degraded(&self) -> bool {
        !self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_traversal_from_bool() {
        assert_eq!(TraversalMode::from(true), TraversalMode::ParentAware);
        assert_eq!(TraversalMode::from(false), TraversalMode::Direct);
        assert_eq!(TraversalMode::default(), TraversalMode::ParentAware);
    }

    #[test]
    fn test_fetched_drain_into() {
        let fetched = Fetched::with_failures(vec![1, 2], vec![TransientFailure::new("a", "b")]);
        assert!(fetched.is_degraded());

        let mut sink = Vec::new();
        let data = fetched.drain_into(&mut sink);
        assert_eq!(data, vec![1, 2]);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].to_string(), "a: b");
    }

    #[test]
    fn test_fetched_failed_is_empty() {
        let fetched: Fetched<Vec<WorkItemRef>> =
            Fetched::failed(TransientFailure::new("wiql", "timeout"));
        assert!(fetched.data.is_empty());
        assert!(fetched.is_degraded());
    }

    #[test]
    fn test_work_item_serializes_type_field() {
        let item = WorkItem {
            id: 7,
            title: "Fix login".to_string(),
            work_item_type: "Bug".to_string(),
            state: "Active".to_string(),
            parent_id: None,
            priority: Some(1),
        };
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"type\":\"Bug\""));
        assert!(!json.contains("parent_id"));
    }
}
