//! Text panel builder for CLI output.
//!
//! Formats reconciled view models as plain lines for `--text` mode.

use crate::model::{EndpointAction, StatusSnapshot};
use crate::reconcile::{self, PendingCommands, ServiceViewModel};

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Reconcile a snapshot and format one block per service.
pub(crate) fn build_text_summary(snapshot: &StatusSnapshot) -> TextSummary {
    let services = reconcile::render(snapshot, &PendingCommands::new());
    let mut lines = Vec::new();

    if services.is_empty() {
        lines.push("No services registered.".to_string());
    }

    for vm in &services {
        lines.extend(service_lines(vm));
    }

    let running = services.iter().filter(|vm| vm.is_running()).count();
    lines.push(format!("{running}/{} services running", services.len()));

    TextSummary { lines }
}

fn service_lines(vm: &ServiceViewModel) -> Vec<String> {
    let (marker, state) = if vm.is_running() {
        ('●', "running")
    } else {
        ('○', "stopped")
    };
    let mut lines = vec![format!("{marker} {} [{state}] ({})", vm.display_name, vm.key)];

    if !vm.required_endpoints.is_empty() {
        lines.push(format!("    Requires: {}", vm.required_endpoints.join(", ")));
    }
    if vm.show_endpoints_label {
        lines.push("    Endpoints:".to_string());
    }
    for ep in &vm.endpoints {
        let how = match ep.disposition.action {
            EndpointAction::OpenLink => "open",
            EndpointAction::CopyToClipboard => "copy",
        };
        lines.push(format!(
            "      {:<12} {} ({how})",
            ep.label, ep.disposition.canonical_url
        ));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_services_and_endpoints() {
        let snapshot: StatusSnapshot = serde_json::from_str(
            r#"{
                "consensus-node": {
                    "running": true,
                    "provides_endpoints": {"rpc": "tcp://0.0.0.0:26657", "grpc": "grpc://127.0.0.1:9090"}
                },
                "light-node": {"running": false, "provides_endpoints": {}, "required_endpoints": ["rpc"]}
            }"#,
        )
        .unwrap();

        let summary = build_text_summary(&snapshot);
        assert_eq!(
            summary.lines,
            vec![
                "● Consensus Node [running] (consensus-node)",
                "    Endpoints:",
                "      grpc         grpc://localhost:9090 (copy)",
                "      rpc          http://localhost:26657 (open)",
                "○ Light Node [stopped] (light-node)",
                "    Requires: rpc",
                "1/2 services running",
            ]
        );
    }

    #[test]
    fn empty_snapshot() {
        let summary = build_text_summary(&StatusSnapshot::new());
        assert_eq!(
            summary.lines,
            vec!["No services registered.", "0/0 services running"]
        );
    }
}
