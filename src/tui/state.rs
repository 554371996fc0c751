use crate::model::{Notification, PanelAction, PanelEvent};
use crate::reconcile::{EndpointView, ServiceViewModel};
use time::OffsetDateTime;

/// Presentation state owned by the UI thread. The services list is replaced
/// wholesale from each `PanelEvent::Rendered`; selection is kept by service key
/// so it survives reordering.
#[derive(Default)]
pub struct UiState {
    pub base_url: String,
    pub services: Vec<ServiceViewModel>,
    pub refreshed_at: Option<OffsetDateTime>,
    pub notification: Option<Notification>,
    pub selected: usize,
    pub selected_key: Option<String>,
    pub endpoint_selected: usize,
    pub show_help: bool,
}

impl UiState {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn apply_event(&mut self, ev: PanelEvent) {
        match ev {
            PanelEvent::Rendered {
                services,
                refreshed_at,
            } => {
                self.services = services;
                self.refreshed_at = refreshed_at;
                self.restore_selection();
            }
            PanelEvent::Notification(n) => self.notification = n,
        }
    }

    fn restore_selection(&mut self) {
        let by_key = self
            .selected_key
            .as_ref()
            .and_then(|key| self.services.iter().position(|vm| &vm.key == key));
        self.selected = match by_key {
            Some(i) => i,
            None => self.selected.min(self.services.len().saturating_sub(1)),
        };
        self.selected_key = self.services.get(self.selected).map(|vm| vm.key.clone());
        self.clamp_endpoint();
    }

    fn clamp_endpoint(&mut self) {
        let n = self.selected_service().map_or(0, |vm| vm.endpoints.len());
        self.endpoint_selected = self.endpoint_selected.min(n.saturating_sub(1));
    }

    fn select(&mut self, i: usize) {
        if i != self.selected {
            self.endpoint_selected = 0;
        }
        self.selected = i;
        self.selected_key = self.services.get(i).map(|vm| vm.key.clone());
    }

    pub fn select_next(&mut self) {
        if self.services.is_empty() {
            return;
        }
        self.select((self.selected + 1) % self.services.len());
    }

    pub fn select_previous(&mut self) {
        if self.services.is_empty() {
            return;
        }
        let i = if self.selected == 0 {
            self.services.len() - 1
        } else {
            self.selected - 1
        };
        self.select(i);
    }

    pub fn next_endpoint(&mut self) {
        let n = self.selected_service().map_or(0, |vm| vm.endpoints.len());
        if n > 0 {
            self.endpoint_selected = (self.endpoint_selected + 1) % n;
        }
    }

    pub fn previous_endpoint(&mut self) {
        let n = self.selected_service().map_or(0, |vm| vm.endpoints.len());
        if n > 0 {
            self.endpoint_selected = (self.endpoint_selected + n - 1) % n;
        }
    }

    pub fn selected_service(&self) -> Option<&ServiceViewModel> {
        self.services.get(self.selected)
    }

    pub fn selected_endpoint(&self) -> Option<&EndpointView> {
        self.selected_service()
            .and_then(|vm| vm.endpoints.get(self.endpoint_selected))
    }

    /// The start-or-stop action of the selected card; `None` while it is pending.
    pub fn selected_control_action(&self) -> Option<&PanelAction> {
        self.selected_service()
            .and_then(|vm| vm.control.action.as_ref())
    }

    pub fn running_count(&self) -> usize {
        self.services.iter().filter(|vm| vm.is_running()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{StatusSnapshot, Verb};
    use crate::reconcile::{self, PendingCommands};

    fn rendered(json: &str, pending: &PendingCommands) -> PanelEvent {
        let snapshot: StatusSnapshot = serde_json::from_str(json).unwrap();
        PanelEvent::Rendered {
            services: reconcile::render(&snapshot, pending),
            refreshed_at: None,
        }
    }

    const THREE: &str = r#"{
        "alpha": {"running": false},
        "bravo": {"running": true, "provides_endpoints": {"api": "0.0.0.0:1", "rpc": "0.0.0.0:2"}},
        "charlie": {"running": false}
    }"#;

    #[test]
    fn selection_follows_the_service_key_across_renders() {
        let mut state = UiState::new("http://localhost:8080");
        state.apply_event(rendered(THREE, &PendingCommands::new()));
        state.select_next();
        assert_eq!(state.selected_service().unwrap().key, "bravo");

        // "alpha" disappears; "bravo" moves to index 0 but stays selected.
        state.apply_event(rendered(
            r#"{"bravo": {"running": true}, "charlie": {"running": false}}"#,
            &PendingCommands::new(),
        ));
        assert_eq!(state.selected, 0);
        assert_eq!(state.selected_service().unwrap().key, "bravo");
    }

    #[test]
    fn selection_wraps_and_clamps() {
        let mut state = UiState::new("");
        state.select_next();
        assert!(state.selected_service().is_none());

        state.apply_event(rendered(THREE, &PendingCommands::new()));
        state.select_previous();
        assert_eq!(state.selected_service().unwrap().key, "charlie");
        state.select_next();
        assert_eq!(state.selected_service().unwrap().key, "alpha");

        state.select_previous();
        state.apply_event(rendered(r#"{"alpha": {"running": false}}"#, &PendingCommands::new()));
        assert_eq!(state.selected_service().unwrap().key, "alpha");
    }

    #[test]
    fn endpoint_cursor_cycles_within_the_selected_card() {
        let mut state = UiState::new("");
        state.apply_event(rendered(THREE, &PendingCommands::new()));
        assert!(state.selected_endpoint().is_none());

        state.select_next();
        assert_eq!(state.selected_endpoint().unwrap().label, "api");
        state.next_endpoint();
        assert_eq!(state.selected_endpoint().unwrap().label, "rpc");
        state.next_endpoint();
        assert_eq!(state.selected_endpoint().unwrap().label, "api");
        state.previous_endpoint();
        assert_eq!(state.selected_endpoint().unwrap().label, "rpc");
    }

    #[test]
    fn pending_card_has_no_control_action() {
        let mut pending = PendingCommands::new();
        pending.insert("alpha".into(), Verb::Start);
        let mut state = UiState::new("");
        state.apply_event(rendered(THREE, &pending));
        assert!(state.selected_control_action().is_none());

        state.apply_event(rendered(THREE, &PendingCommands::new()));
        assert_eq!(
            state.selected_control_action(),
            Some(&PanelAction::Command {
                verb: Verb::Start,
                service: "alpha".into()
            })
        );
    }
}
