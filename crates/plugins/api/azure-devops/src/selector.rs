//! Backlog selection on top of a [`WorkTracker`].
//!
//! The selector never fails because of the tracker: every failed query or
//! batch is recorded in [`SelectionResult::failures`] and the selection
//! carries on with whatever data arrived.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use pilot_core::{
    BacklogConfig, Error, Result, SelectionResult, TraversalMode, TransientFailure, WorkItem,
    WorkItemRef, WorkTracker,
};
use tracing::{debug, info};

use crate::{wiql, CANDIDATE_FANOUT};

/// Validate a caller supplied limit.
pub fn validate_limit(limit: i64) -> Result<usize> {
    if limit <= 0 {
        return Err(Error::InvalidArgument(format!(
            "limit must be a positive integer, got {}",
            limit
        )));
    }
    usize::try_from(limit)
        .map_err(|_| Error::InvalidArgument(format!("limit {} is too large", limit)))
}

/// Query shaping options.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorOptions {
    pub closed_states: Vec<String>,
    /// Empty means children of any type
    pub child_types: Vec<String>,
    /// Candidates examined per requested item in parent-aware mode
    pub fanout: usize,
}

impl Default for SelectorOptions {
    fn default() -> Self {
        Self::from(&BacklogConfig::default())
    }
}

impl From<&BacklogConfig> for SelectorOptions {
    fn from(config: &BacklogConfig) -> Self {
        Self {
            closed_states: config.closed_states.clone(),
            child_types: config.child_types.clone(),
            fanout: CANDIDATE_FANOUT,
        }
    }
}

/// A slot in the parent-aware selection, resolved once pending ids are hydrated.
enum Pick {
    Hydrated(WorkItem),
    Pending(u64),
}

/// Picks the next work items to do from one project's backlog.
pub struct BacklogSelector {
    tracker: Arc<dyn WorkTracker>,
    project: String,
    options: SelectorOptions,
}

impl BacklogSelector {
    pub fn new(
        tracker: Arc<dyn WorkTracker>,
        project: impl Into<String>,
        options: SelectorOptions,
    ) -> Self {
        Self {
            tracker,
            project: project.into(),
            options,
        }
    }

    /// Select up to `limit` items, either as returned by the priority query
    /// or with parents replaced by their open children.
    pub async fn select_backlog(
        &self,
        limit: i64,
        prioritize_parents: bool,
    ) -> Result<SelectionResult> {
        let limit = validate_limit(limit)?;
        self.select(limit, TraversalMode::from(prioritize_parents))
            .await
    }

    /// Select up to `limit` items using `mode`.
    pub async fn select(&self, limit: usize, mode: TraversalMode) -> Result<SelectionResult> {
        if limit == 0 {
            return Err(Error::InvalidArgument(
                "limit must be a positive integer, got 0".to_string(),
            ));
        }

        let mut failures = Vec::new();
        let query = wiql::open_items_query(&self.project, &self.options.closed_states);
        let refs = self.tracker.query(&query).await.drain_into(&mut failures);
        let candidates = dedupe(&refs);

        debug!(
            project = %self.project,
            candidates = candidates.len(),
            mode = ?mode,
            "Open items query finished"
        );

        let items = if candidates.is_empty() {
            Vec::new()
        } else {
            match mode {
                TraversalMode::Direct => self.select_direct(&candidates, limit, &mut failures).await,
                TraversalMode::ParentAware => {
                    self.select_parent_aware(&candidates, limit, &mut failures)
                        .await
                }
            }
        };

        info!(
            selected = items.len(),
            failures = failures.len(),
            "Backlog selection finished"
        );

        Ok(SelectionResult { items, failures })
    }

    /// Hydrate arbitrary ids, keeping the requested order and dropping
    /// duplicates and ids that could not be resolved.
    pub async fn fetch_items(&self, ids: &[u64]) -> SelectionResult {
        let mut failures = Vec::new();
        let ids = dedupe_ids(ids.iter().copied());
        let items = self.hydrate_ordered(&ids, &mut failures).await;
        SelectionResult { items, failures }
    }

    async fn select_direct(
        &self,
        candidates: &[u64],
        limit: usize,
        failures: &mut Vec<TransientFailure>,
    ) -> Vec<WorkItem> {
        let top = &candidates[..candidates.len().min(limit)];
        self.hydrate_ordered(top, failures).await
    }

    async fn select_parent_aware(
        &self,
        candidates: &[u64],
        limit: usize,
        failures: &mut Vec<TransientFailure>,
    ) -> Vec<WorkItem> {
        let cap = limit.saturating_mul(self.options.fanout.max(1));
        let candidates = &candidates[..candidates.len().min(cap)];

        let children = self.open_children(candidates, failures).await;

        let mut seen = HashSet::new();
        let mut picks = Vec::with_capacity(limit.min(candidates.len()));

        'candidates: for &candidate in candidates {
            match children.get(&candidate) {
                Some(kids) if !kids.is_empty() => {
                    for child in kids {
                        if picks.len() >= limit {
                            break 'candidates;
                        }
                        if seen.insert(child.id) {
                            picks.push(Pick::Hydrated(child.clone()));
                        }
                    }
                }
                _ => {
                    if seen.insert(candidate) {
                        picks.push(Pick::Pending(candidate));
                    }
                }
            }
            if picks.len() >= limit {
                break;
            }
        }

        let pending: Vec<u64> = picks
            .iter()
            .filter_map(|pick| match pick {
                Pick::Pending(id) => Some(*id),
                Pick::Hydrated(_) => None,
            })
            .collect();

        let mut resolved: HashMap<u64, WorkItem> = if pending.is_empty() {
            HashMap::new()
        } else {
            self.tracker
                .hydrate(&pending)
                .await
                .drain_into(failures)
                .into_iter()
                .map(|item| (item.id, item))
                .collect()
        };

        picks
            .into_iter()
            .filter_map(|pick| match pick {
                Pick::Hydrated(item) => Some(item),
                Pick::Pending(id) => resolved.remove(&id),
            })
            .collect()
    }

    /// Open children of `parents`, grouped by parent in child-query order.
    async fn open_children(
        &self,
        parents: &[u64],
        failures: &mut Vec<TransientFailure>,
    ) -> HashMap<u64, Vec<WorkItem>> {
        let query = wiql::open_children_query(
            &self.project,
            parents,
            &self.options.closed_states,
            &self.options.child_types,
        );
        let before = failures.len();
        let refs = self.tracker.query(&query).await.drain_into(failures);
        if failures.len() > before {
            debug!("Child query failed, treating candidates as childless");
        }

        let child_ids = dedupe(&refs);
        let parents: HashSet<u64> = parents.iter().copied().collect();
        let mut grouped: HashMap<u64, Vec<WorkItem>> = HashMap::new();

        for child in self.hydrate_ordered(&child_ids, failures).await {
            if let Some(parent) = child.parent_id.filter(|p| parents.contains(p)) {
                grouped.entry(parent).or_default().push(child);
            }
        }

        grouped
    }

    /// Hydrate `ids` and return the resolved items in the order of `ids`.
    async fn hydrate_ordered(
        &self,
        ids: &[u64],
        failures: &mut Vec<TransientFailure>,
    ) -> Vec<WorkItem> {
        if ids.is_empty() {
            return Vec::new();
        }

        let mut by_id: HashMap<u64, WorkItem> = self
            .tracker
            .hydrate(ids)
            .await
            .drain_into(failures)
            .into_iter()
            .map(|item| (item.id, item))
            .collect();

        ids.iter().filter_map(|id| by_id.remove(id)).collect()
    }
}

fn dedupe(refs: &[WorkItemRef]) -> Vec<u64> {
    dedupe_ids(refs.iter().map(|r| r.id))
}

fn dedupe_ids(ids: impl Iterator<Item = u64>) -> Vec<u64> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(*id)).collect()
}
