//! Text rendering of a backlog selection.
//!
//! The report is what the tool server hands back to the assistant, so it is
//! plain markdown: a count header followed by one checkbox line per item.

use crate::error::Error;
use crate::types::{SelectionResult, TransientFailure, WorkItem};

/// Shown when the selection is empty.
pub const BACKLOG_CLEAR: &str = "✅ No active items found. Backlog is clear!";

/// Render a selection, listing at most `limit` items.
pub fn render_selection(result: &SelectionResult, limit: usize) -> String {
    let shown: Vec<&WorkItem> = result.items.iter().take(limit).collect();

    let mut output = if shown.is_empty() {
        format!("{}\n", BACKLOG_CLEAR)
    } else {
        let mut out = format!("## 🚀 Burndown Mission ({} items)\n", shown.len());
        for item in &shown {
            out.push_str(&render_item(item));
            out.push('\n');
        }
        out
    };

    if !result.failures.is_empty() {
        output.push_str(&render_failures(&result.failures));
    }

    output
}

/// Render the result of looking up explicit ids, naming the ids that did
/// not resolve.
pub fn render_lookup(result: &SelectionResult, requested: &[u64]) -> String {
    let mut output = if result.is_empty() {
        "No matching work items found.\n".to_string()
    } else {
        let mut out = format!("## Work items ({})\n", result.len());
        for item in &result.items {
            out.push_str(&format!("{} _({})_\n", render_item(item), display_state(&item.state)));
        }
        out
    };

    let found = result.ids();
    let missing: Vec<String> = requested
        .iter()
        .filter(|id| !found.contains(id))
        .map(|id| format!("#{}", id))
        .collect();
    if !missing.is_empty() {
        output.push_str(&format!("\nNot found: {}\n", missing.join(", ")));
    }

    if !result.failures.is_empty() {
        output.push_str(&render_failures(&result.failures));
    }

    output
}

/// Render a single work item as a checkbox line.
pub fn render_item(item: &WorkItem) -> String {
    format!(
        "- [ ] **{} #{}**: {}",
        display_type(&item.work_item_type),
        item.id,
        display_title(&item.title)
    )
}

/// Render a configuration or argument problem.
pub fn render_error(error: &Error) -> String {
    match error {
        Error::Config(message) => format!("❌ Error: {}", message),
        other => format!("❌ Error: {}", other),
    }
}

/// Render an unexpected failure.
pub fn render_unexpected(error: &Error) -> String {
    format!("❌ Error fetching tasks: {}", error)
}

fn render_failures(failures: &[TransientFailure]) -> String {
    let mut out = format!(
        "\n⚠️ {} query step(s) failed; results may be incomplete:\n",
        failures.len()
    );
    for failure in failures {
        out.push_str(&format!("- {}\n", failure));
    }
    out
}

fn display_type(work_item_type: &str) -> &str {
    if work_item_type.trim().is_empty() {
        "Item"
    } else {
        work_item_type
    }
}

fn display_state(state: &str) -> &str {
    if state.trim().is_empty() {
        "Unknown"
    } else {
        state
    }
}

fn display_title(title: &str) -> &str {
    if title.trim().is_empty() {
        "Unknown"
    } else {
        title
    }
}
