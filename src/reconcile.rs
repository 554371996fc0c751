//! Snapshot to view-model reconciliation.
//!
//! `render` is a pure function of the snapshot and the set of in-flight
//! commands. Every call produces a complete model that replaces the previous
//! one; nothing is patched in place.

use crate::endpoint;
use crate::model::{EndpointAction, EndpointDisposition, PanelAction, StatusSnapshot, Verb};
use std::collections::HashMap;

/// Services with a start/stop request in flight, and which request it is.
pub type PendingCommands = HashMap<String, Verb>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Running,
    Stopped,
}

/// The start-or-stop control of a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceControl {
    pub label: &'static str,
    pub pending: bool,
    /// `None` while a command is in flight: the control is disabled.
    pub action: Option<PanelAction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointView {
    pub label: String,
    pub disposition: EndpointDisposition,
    pub action: PanelAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceViewModel {
    pub key: String,
    pub display_name: String,
    pub state: ServiceState,
    pub control: ServiceControl,
    pub show_endpoints_label: bool,
    pub endpoints: Vec<EndpointView>,
    pub required_endpoints: Vec<String>,
}

impl ServiceViewModel {
    pub fn is_running(&self) -> bool {
        self.state == ServiceState::Running
    }
}

pub fn render(snapshot: &StatusSnapshot, pending: &PendingCommands) -> Vec<ServiceViewModel> {
    snapshot
        .iter()
        .map(|(key, info)| {
            let state = if info.running {
                ServiceState::Running
            } else {
                ServiceState::Stopped
            };

            let control = match pending.get(key) {
                Some(verb) => ServiceControl {
                    label: verb.pending_label(),
                    pending: true,
                    action: None,
                },
                None => {
                    let verb = if info.running { Verb::Stop } else { Verb::Start };
                    ServiceControl {
                        label: verb.label(),
                        pending: false,
                        action: Some(PanelAction::Command {
                            verb,
                            service: key.clone(),
                        }),
                    }
                }
            };

            let endpoints: Vec<EndpointView> = info
                .provides_endpoints
                .iter()
                .map(|(label, raw)| endpoint_view(label, raw))
                .collect();

            ServiceViewModel {
                key: key.clone(),
                display_name: display_name(key),
                state,
                control,
                show_endpoints_label: info.running && !endpoints.is_empty(),
                endpoints,
                required_endpoints: info.required_endpoints.clone(),
            }
        })
        .collect()
}

fn endpoint_view(label: &str, raw: &str) -> EndpointView {
    let disposition = endpoint::normalize(raw);
    let action = match disposition.action {
        EndpointAction::OpenLink => PanelAction::OpenLink {
            url: disposition.canonical_url.clone(),
        },
        EndpointAction::CopyToClipboard => PanelAction::CopyToClipboard {
            text: disposition.canonical_url.clone(),
        },
    };
    EndpointView {
        label: label.to_string(),
        disposition,
        action,
    }
}

/// `worker-pool` -> `Worker Pool`.
pub fn display_name(key: &str) -> String {
    key.split('-')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
