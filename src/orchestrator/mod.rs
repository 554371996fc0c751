//! Application-level orchestration.
//!
//! This module owns the poll/command cycle: it composes the status client, the
//! command dispatcher, the reconciler and the notification slot into one event
//! loop. Presentation layers only send `UiCommand`s and draw `PanelEvent`s.

mod controller;

pub(crate) use controller::{run_controller, UiCommand};
