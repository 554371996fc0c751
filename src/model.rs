use crate::reconcile::ServiceViewModel;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use std::time::Duration;
use time::{OffsetDateTime, UtcOffset};

#[derive(Debug, Clone, Serialize)]
pub struct PanelConfig {
    pub base_url: String,
    /// Zero disables periodic refresh; the panel then only refreshes on demand.
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub notification_duration: Duration,
    pub user_agent: String,
}

/// One full `/status` response. Keyed by service name; iteration order is by key,
/// which keeps rendering stable for a given snapshot.
pub type StatusSnapshot = BTreeMap<String, ServiceInfo>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub running: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub provides_endpoints: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub required_endpoints: Vec<String>,
}

// The service manager serializes empty collections as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Start,
    Stop,
}

impl Verb {
    /// Path segment of the control API (`/start/{name}`, `/stop/{name}`).
    pub fn as_path(self) -> &'static str {
        match self {
            Verb::Start => "start",
            Verb::Stop => "stop",
        }
    }

    pub fn progressive(self) -> &'static str {
        match self {
            Verb::Start => "starting",
            Verb::Stop => "stopping",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Verb::Start => "Start",
            Verb::Stop => "Stop",
        }
    }

    pub fn pending_label(self) -> &'static str {
        match self {
            Verb::Start => "Starting...",
            Verb::Stop => "Stopping...",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Success,
    Failure { http_status: u16, body: String },
    NetworkError { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub text: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointAction {
    OpenLink,
    CopyToClipboard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDisposition {
    pub canonical_url: String,
    pub action: EndpointAction,
}

/// Work a panel control performs when activated. Bound to the service name or
/// endpoint string when the view model is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelAction {
    Command { verb: Verb, service: String },
    OpenLink { url: String },
    CopyToClipboard { text: String },
}

/// Events emitted by the controller and consumed by presentation layers.
#[derive(Debug, Clone)]
pub enum PanelEvent {
    Rendered {
        services: Vec<ServiceViewModel>,
        refreshed_at: Option<OffsetDateTime>,
    },
    /// `None` means the notification slot is empty again.
    Notification(Option<Notification>),
}

static LOCAL_OFFSET: OnceLock<UtcOffset> = OnceLock::new();

/// Read the local UTC offset once. The platform only reports it while the
/// process is single-threaded, so call this before the runtime starts.
pub fn capture_local_offset() -> UtcOffset {
    *LOCAL_OFFSET.get_or_init(|| UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC))
}

/// Current time in the captured local offset, or UTC if none was captured.
pub fn now() -> OffsetDateTime {
    let offset = LOCAL_OFFSET.get().copied().unwrap_or(UtcOffset::UTC);
    OffsetDateTime::now_utc().to_offset(offset)
}
