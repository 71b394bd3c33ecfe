//! WIQL query builders.
//!
//! Every query is pinned to one `[System.TeamProject]` and excludes the
//! configured closed states.

/// Quote a value as a WIQL string literal.
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn string_list(values: &[String]) -> String {
    let quoted: Vec<String> = values.iter().map(|v| quote(v)).collect();
    format!("({})", quoted.join(","))
}

fn id_list(ids: &[u64]) -> String {
    let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    format!("({})", ids.join(","))
}

fn open_clauses(project: &str, closed_states: &[String]) -> Vec<String> {
    let mut clauses = vec![format!("[System.TeamProject] = {}", quote(project))];
    if !closed_states.is_empty() {
        clauses.push(format!(
            "[System.State] NOT IN {}",
            string_list(closed_states)
        ));
    }
    clauses
}

const PRIORITY_ORDER: &str =
    "ORDER BY [Microsoft.VSTS.Common.Priority] ASC, [System.Id] ASC";

/// All open items in the project, highest priority first.
pub fn open_items_query(project: &str, closed_states: &[String]) -> String {
    format!(
        "SELECT [System.Id] FROM WorkItems WHERE {} {}",
        open_clauses(project, closed_states).join(" AND "),
        PRIORITY_ORDER
    )
}

/// Open children of any of `parent_ids`, optionally restricted to
/// `child_types`, highest priority first.
pub fn open_children_query(
    project: &str,
    parent_ids: &[u64],
    closed_states: &[String],
    child_types: &[String],
) -> String {
    let mut clauses = open_clauses(project, closed_states);
    clauses.insert(1, format!("[System.Parent] IN {}", id_list(parent_ids)));
    if !child_types.is_empty() {
        clauses.push(format!(
            "[System.WorkItemType] IN {}",
            string_list(child_types)
        ));
    }
    format!(
        "SELECT [System.Id], [System.Parent] FROM WorkItems WHERE {} {}",
        clauses.join(" AND "),
        PRIORITY_ORDER
    )
}

/// Cheapest query that proves the project is reachable.
pub fn probe_query(project: &str) -> String {
    format!(
        "SELECT [System.Id] FROM WorkItems WHERE [System.TeamProject] = {}",
        quote(project)
    )
}
