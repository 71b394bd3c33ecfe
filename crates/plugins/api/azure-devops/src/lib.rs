//! Azure DevOps provider implementation for backlog-pilot.
//!
//! This crate talks to the Azure DevOps work item tracking REST API
//! (WIQL queries and batched work item reads) and builds the backlog
//! selection on top of it.

mod client;
mod scope;
mod selector;
mod types;
pub mod wiql;

pub use client::AzureDevOpsClient;
pub use scope::ProjectScope;
pub use selector::{validate_limit, BacklogSelector, SelectorOptions};
pub use types::*;

/// Default REST API version.
pub const DEFAULT_API_VERSION: &str = "6.0";

/// Maximum number of ids accepted by one batched work item read.
pub const MAX_BATCH_SIZE: usize = 200;

/// Parent-aware mode looks at up to `limit * CANDIDATE_FANOUT` candidates.
pub const CANDIDATE_FANOUT: usize = 3;
