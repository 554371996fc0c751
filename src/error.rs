use crate::model::CommandResult;
use thiserror::Error;

/// Failures of the panel core. Each one is recovered where it occurs and shown
/// to the user as a single notification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PanelError {
    /// Status endpoint unreachable or answered with a non-success status.
    #[error("{0}")]
    Fetch(String),
    #[error("malformed status response: {0}")]
    Parse(String),
    /// Start/stop answered with a non-success status; displays the response body.
    #[error("{body}")]
    CommandFailure { status: u16, body: String },
    /// Start/stop never got a response.
    #[error("{message}")]
    CommandNetwork { message: String },
}

impl CommandResult {
    pub fn into_result(self) -> Result<(), PanelError> {
        match self {
            CommandResult::Success => Ok(()),
            CommandResult::Failure { http_status, body } => Err(PanelError::CommandFailure {
                status: http_status,
                body,
            }),
            CommandResult::NetworkError { message } => {
                Err(PanelError::CommandNetwork { message })
            }
        }
    }
}
