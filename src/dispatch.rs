//! Start/stop command dispatch.
//!
//! Commands run as spawned tasks and report back on a channel, so issuing one
//! never blocks the controller loop. A service with a command in flight is
//! pending: a second command for it is refused until the first completes.

use crate::client::ControlClient;
use crate::model::{CommandResult, Verb};
use crate::reconcile::PendingCommands;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

/// A finished start/stop request.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub verb: Verb,
    pub service: String,
    pub result: CommandResult,
}

pub struct CommandDispatcher {
    client: ControlClient,
    outcome_tx: UnboundedSender<CommandOutcome>,
    pending: PendingCommands,
}

impl CommandDispatcher {
    pub fn new(client: ControlClient, outcome_tx: UnboundedSender<CommandOutcome>) -> Self {
        Self {
            client,
            outcome_tx,
            pending: PendingCommands::new(),
        }
    }

    pub fn start(&mut self, service: &str) -> bool {
        self.dispatch(Verb::Start, service)
    }

    pub fn stop(&mut self, service: &str) -> bool {
        self.dispatch(Verb::Stop, service)
    }

    /// Issue `verb` for `service` unless a command for it is already in flight.
    /// Returns whether a request was issued.
    pub fn dispatch(&mut self, verb: Verb, service: &str) -> bool {
        if let Some(in_flight) = self.pending.get(service) {
            debug!(
                service,
                requested = verb.as_path(),
                in_flight = in_flight.as_path(),
                "command already in flight, ignoring"
            );
            return false;
        }

        self.pending.insert(service.to_string(), verb);
        info!(service, verb = verb.as_path(), "dispatching command");

        let client = self.client.clone();
        let outcome_tx = self.outcome_tx.clone();
        let service = service.to_string();
        tokio::spawn(async move {
            let result = client.send_command(verb, &service).await;
            let _ = outcome_tx.send(CommandOutcome {
                verb,
                service,
                result,
            });
        });
        true
    }

    /// Clear the pending marker for a finished command and interpret its result.
    /// Returns the notification text for a failed command.
    pub fn complete(&mut self, outcome: &CommandOutcome) -> Option<String> {
        self.pending.remove(&outcome.service);
        interpret(outcome.verb, &outcome.service, &outcome.result)
    }

    pub fn pending(&self) -> &PendingCommands {
        &self.pending
    }
}

pub fn interpret(verb: Verb, service: &str, result: &CommandResult) -> Option<String> {
    match result.clone().into_result() {
        Ok(()) => {
            info!(service, verb = verb.as_path(), "command succeeded");
            None
        }
        Err(err) => {
            warn!(service, verb = verb.as_path(), error = ?err, "command failed");
            Some(format!(
                "Error {} service {}: {}",
                verb.progressive(),
                service,
                err
            ))
        }
    }
}
