//! Core traits, types, and error handling for backlog-pilot.
//!
//! This crate provides the foundational abstractions used across all
//! backlog-pilot components.

pub mod config;
pub mod error;
pub mod report;
pub mod tracker;
pub mod types;

pub use config::{AzureDevOpsConfig, BacklogConfig, Config};
pub use error::{Error, Result};
pub use tracker::WorkTracker;
pub use types::{
    Fetched, SelectionResult, TransientFailure, TraversalMode, WorkItem, WorkItemRef,
};
