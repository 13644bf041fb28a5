//! Plain-text renderings for terminal output.

use std::collections::BTreeMap;
use std::fmt::Write;
use taxflow_agent::AgentStatusSnapshot;
use taxflow_core::Envelope;

/// One line per envelope: `✓ Task 1: success`.
pub fn format_results(results: &[Envelope]) -> String {
    let mut out = String::new();
    for (i, result) in results.iter().enumerate() {
        let (icon, status) = if result.is_success() {
            ("✓", "success")
        } else {
            ("✗", "error")
        };
        let _ = write!(out, "{icon} Task {}: {status}", i + 1);
        if let Some(error) = &result.error {
            let _ = write!(out, " ({error})");
        }
        out.push('\n');
    }
    out
}

/// Agent status table keyed by registry name.
pub fn format_status(status: &BTreeMap<String, AgentStatusSnapshot>) -> String {
    let mut out = format!(
        "{:<22} {:<12} {:<30} {:<12} {:>5}\n",
        "REGISTRY", "ID", "NAME", "STATUS", "TASKS"
    );
    for (name, snapshot) in status {
        let _ = writeln!(
            out,
            "{:<22} {:<12} {:<30} {:<12} {:>5}",
            name,
            snapshot.agent_id,
            snapshot.agent_name,
            snapshot.status.to_string(),
            snapshot.tasks_completed
        );
    }
    out
}
