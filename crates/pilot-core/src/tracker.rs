//! Work tracker trait.

use async_trait::async_trait;

use crate::types::{Fetched, WorkItem, WorkItemRef};

/// A work-tracking service that can run WIQL-style queries and hydrate ids.
///
/// Both operations are best effort: transport or status failures are
/// reported inside the returned [`Fetched`] instead of as an `Err`.
#[async_trait]
pub trait WorkTracker: Send + Sync {
    /// Get the tracker name (e.g., "azure-devops")
    fn name(&self) -> &str;

    /// Run a flat query and return the matching references in result order.
    async fn query(&self, wiql: &str) -> Fetched<Vec<WorkItemRef>>;

    /// Resolve ids into hydrated work items. One entry per resolved id,
    /// in no particular order.
    async fn hydrate(&self, ids: &[u64]) -> Fetched<Vec<WorkItem>>;
}
