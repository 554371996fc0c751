//! Panel controller.
//!
//! Owns the snapshot, the in-flight command set and the notification slot, and
//! is the only place any of them is mutated. Network work runs in spawned tasks
//! that report back over channels; results are applied in completion order.

use crate::client::ControlClient;
use crate::dispatch::{CommandDispatcher, CommandOutcome};
use crate::error::PanelError;
use crate::model::{self, PanelConfig, PanelEvent, StatusSnapshot, Verb};
use crate::notify::{NotificationId, NotificationManager};
use crate::reconcile;
use anyhow::Result;
use time::OffsetDateTime;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Commands emitted by UI layers.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    Command { verb: Verb, service: String },
    Refresh,
    /// Show a message produced by the presentation layer (clipboard, opener).
    Notify(String),
    DismissNotification,
    Quit,
}

type FetchResult = Result<StatusSnapshot, PanelError>;

struct Controller {
    client: ControlClient,
    event_tx: UnboundedSender<PanelEvent>,
    fetch_tx: UnboundedSender<FetchResult>,
    dispatcher: CommandDispatcher,
    notifications: NotificationManager,
    snapshot: Option<StatusSnapshot>,
    refreshed_at: Option<OffsetDateTime>,
}

impl Controller {
    fn new(
        cfg: &PanelConfig,
        event_tx: UnboundedSender<PanelEvent>,
        fetch_tx: UnboundedSender<FetchResult>,
        outcome_tx: UnboundedSender<CommandOutcome>,
        expiry_tx: UnboundedSender<NotificationId>,
    ) -> Result<Self> {
        let client = ControlClient::new(cfg)?;
        Ok(Self {
            dispatcher: CommandDispatcher::new(client.clone(), outcome_tx),
            notifications: NotificationManager::new(cfg.notification_duration, expiry_tx),
            client,
            event_tx,
            fetch_tx,
            snapshot: None,
            refreshed_at: None,
        })
    }

    /// Start a status fetch. Overlapping fetches are neither cancelled nor merged.
    fn spawn_fetch(&self) {
        let client = self.client.clone();
        let fetch_tx = self.fetch_tx.clone();
        tokio::spawn(async move {
            let _ = fetch_tx.send(client.fetch_status().await);
        });
    }

    fn publish_panel(&self) {
        // Nothing to draw until the first snapshot arrives.
        let Some(snapshot) = self.snapshot.as_ref() else {
            return;
        };
        let services = reconcile::render(snapshot, self.dispatcher.pending());
        let _ = self.event_tx.send(PanelEvent::Rendered {
            services,
            refreshed_at: self.refreshed_at,
        });
    }

    fn publish_notification(&self) {
        let _ = self
            .event_tx
            .send(PanelEvent::Notification(self.notifications.current().cloned()));
    }

    fn notify(&mut self, text: String) {
        self.notifications.show(text);
        self.publish_notification();
    }

    fn on_fetched(&mut self, fetched: FetchResult) {
        match fetched {
            Ok(snapshot) => {
                debug!(services = snapshot.len(), "status refreshed");
                self.snapshot = Some(snapshot);
                self.refreshed_at = Some(model::now());
                self.publish_panel();
            }
            Err(e) => {
                // The previous panel stays on screen.
                warn!(error = %e, "status refresh failed");
                self.notify(format!("Error fetching status: {e}"));
            }
        }
    }

    fn on_command_finished(&mut self, outcome: CommandOutcome) {
        if let Some(text) = self.dispatcher.complete(&outcome) {
            self.notify(text);
        }
        // Success or not, the new state is learned from a fresh snapshot.
        self.spawn_fetch();
    }

    fn on_command(&mut self, verb: Verb, service: &str) {
        let issued = match verb {
            Verb::Start => self.dispatcher.start(service),
            Verb::Stop => self.dispatcher.stop(service),
        };
        if issued {
            self.publish_panel();
        }
    }

    fn on_expired(&mut self, id: NotificationId) {
        if self.notifications.expire(id) {
            self.publish_notification();
        }
    }

    fn on_dismiss(&mut self) {
        if self.notifications.dismiss_all() {
            self.publish_notification();
        }
    }
}

/// Run the poll/command cycle until the UI quits or drops its command sender.
pub(crate) async fn run_controller(
    cfg: &PanelConfig,
    event_tx: UnboundedSender<PanelEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let (fetch_tx, mut fetch_rx) = mpsc::unbounded_channel::<FetchResult>();
    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel::<CommandOutcome>();
    let (expiry_tx, mut expiry_rx) = mpsc::unbounded_channel::<NotificationId>();
    let mut ctl = Controller::new(cfg, event_tx, fetch_tx, outcome_tx, expiry_tx)?;

    info!(
        base_url = %ctl.client.base_url(),
        config = %serde_json::to_string(cfg)?,
        "controller started"
    );
    ctl.spawn_fetch();

    // Polling is optional; with a zero interval the panel refreshes on demand only.
    let mut poll = (!cfg.poll_interval.is_zero()).then(|| {
        let mut interval =
            tokio::time::interval_at(Instant::now() + cfg.poll_interval, cfg.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    });

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Command { verb, service }) => ctl.on_command(verb, &service),
                    Some(UiCommand::Refresh) => ctl.spawn_fetch(),
                    Some(UiCommand::Notify(text)) => ctl.notify(text),
                    Some(UiCommand::DismissNotification) => ctl.on_dismiss(),
                    Some(UiCommand::Quit) | None => break,
                }
            }
            Some(fetched) = fetch_rx.recv() => ctl.on_fetched(fetched),
            Some(outcome) = outcome_rx.recv() => ctl.on_command_finished(outcome),
            Some(id) = expiry_rx.recv() => ctl.on_expired(id),
            _ = async {
                match poll.as_mut() {
                    Some(interval) => {
                        interval.tick().await;
                    }
                    None => futures::future::pending::<()>().await,
                }
            } => ctl.spawn_fetch(),
        }
    }

    info!("controller stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_server::{self, config, Backend};
    use crate::model::CommandResult;
    use crate::reconcile::ServiceViewModel;
    use std::time::Duration;

    const STATUS: &str = r#"{
        "svc": {"running": true, "provides_endpoints": {"rpc": "tcp://0.0.0.0:26657"}},
        "other": {"running": false, "provides_endpoints": {}}
    }"#;

    struct Harness {
        events: UnboundedReceiver<PanelEvent>,
        cmds: UnboundedSender<UiCommand>,
        handle: tokio::task::JoinHandle<Result<()>>,
    }

    impl Harness {
        fn start(cfg: PanelConfig) -> Self {
            let (event_tx, events) = mpsc::unbounded_channel();
            let (cmds, cmd_rx) = mpsc::unbounded_channel();
            let handle = tokio::spawn(async move { run_controller(&cfg, event_tx, cmd_rx).await });
            Self {
                events,
                cmds,
                handle,
            }
        }

        async fn next_event(&mut self) -> PanelEvent {
            tokio::time::timeout(Duration::from_secs(5), self.events.recv())
                .await
                .expect("timed out waiting for a panel event")
                .expect("controller hung up")
        }

        async fn next_panel(&mut self) -> Vec<ServiceViewModel> {
            loop {
                if let PanelEvent::Rendered { services, .. } = self.next_event().await {
                    return services;
                }
            }
        }

        async fn next_notification(&mut self) -> Option<String> {
            loop {
                if let PanelEvent::Notification(n) = self.next_event().await {
                    return n.map(|n| n.text);
                }
            }
        }

        async fn quit(self) {
            self.cmds.send(UiCommand::Quit).unwrap();
            self.handle.await.unwrap().unwrap();
        }
    }

    fn find<'a>(services: &'a [ServiceViewModel], key: &str) -> &'a ServiceViewModel {
        services.iter().find(|vm| vm.key == key).unwrap()
    }

    #[tokio::test]
    async fn initial_fetch_renders_the_panel() {
        let backend = Backend::with_status(STATUS);
        let base = test_server::spawn(backend.clone()).await;
        let mut h = Harness::start(config(&base));

        let panel = h.next_panel().await;
        assert_eq!(panel.len(), 2);
        assert_eq!(find(&panel, "svc").control.label, "Stop");
        assert_eq!(find(&panel, "other").control.label, "Start");
        assert_eq!(backend.status_hits(), 1);

        h.quit().await;
    }

    #[tokio::test]
    async fn failed_stop_notifies_and_refreshes_exactly_once() {
        let backend = Backend::with_status(STATUS);
        backend.reply("stop", "svc", 500, "busy\n");
        let base = test_server::spawn(backend.clone()).await;
        let mut h = Harness::start(config(&base));
        h.next_panel().await;

        h.cmds
            .send(UiCommand::Command {
                verb: Verb::Stop,
                service: "svc".into(),
            })
            .unwrap();

        let pending = h.next_panel().await;
        assert!(find(&pending, "svc").control.pending);
        assert_eq!(find(&pending, "svc").control.label, "Stopping...");

        assert_eq!(
            h.next_notification().await.as_deref(),
            Some("Error stopping service svc: busy")
        );

        let refreshed = h.next_panel().await;
        assert!(!find(&refreshed, "svc").control.pending);
        assert_eq!(backend.status_hits(), 2);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(backend.status_hits(), 2);
        assert_eq!(backend.command_hits(), 1);
        h.quit().await;
    }

    #[tokio::test]
    async fn successful_start_refreshes_exactly_once_without_notifying() {
        let backend = Backend::with_status(STATUS);
        let base = test_server::spawn(backend.clone()).await;
        let mut h = Harness::start(config(&base));
        h.next_panel().await;

        h.cmds
            .send(UiCommand::Command {
                verb: Verb::Start,
                service: "other".into(),
            })
            .unwrap();

        let pending = h.next_panel().await;
        assert_eq!(find(&pending, "other").control.label, "Starting...");

        // Success is silent: the next event is the refreshed panel.
        match h.next_event().await {
            PanelEvent::Rendered { services, .. } => {
                assert!(!find(&services, "other").control.pending);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(backend.status_hits(), 2);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(backend.status_hits(), 2);
        assert_eq!(backend.command_hits(), 1);
        h.quit().await;
    }

    #[tokio::test]
    async fn start_transport_error_notifies_and_still_refreshes() {
        let backend = Backend::with_status(STATUS);
        let base = test_server::spawn(backend.clone()).await;
        let (event_tx, mut events) = mpsc::unbounded_channel();
        let (fetch_tx, mut fetch_rx) = mpsc::unbounded_channel();
        let (outcome_tx, _outcome_rx) = mpsc::unbounded_channel();
        let (expiry_tx, _expiry_rx) = mpsc::unbounded_channel();
        let mut ctl =
            Controller::new(&config(&base), event_tx, fetch_tx, outcome_tx, expiry_tx).unwrap();

        ctl.on_command_finished(CommandOutcome {
            verb: Verb::Start,
            service: "other".into(),
            result: CommandResult::NetworkError {
                message: "connection refused".into(),
            },
        });

        match events.recv().await.unwrap() {
            PanelEvent::Notification(Some(n)) => {
                assert_eq!(n.text, "Error starting service other: connection refused");
            }
            other => panic!("unexpected event {other:?}"),
        }

        assert!(fetch_rx.recv().await.unwrap().is_ok());
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(fetch_rx.try_recv().is_err());
        assert_eq!(backend.status_hits(), 1);
    }

    #[tokio::test]
    async fn fetch_failure_keeps_the_previous_panel() {
        let backend = Backend::with_status(STATUS);
        let base = test_server::spawn(backend.clone()).await;
        let mut h = Harness::start(config(&base));
        let before = h.next_panel().await;

        *backend.status_body.lock().unwrap() = "{broken".into();
        h.cmds.send(UiCommand::Refresh).unwrap();

        // Only a notification follows; no replacement panel is published.
        match h.next_event().await {
            PanelEvent::Notification(Some(n)) => {
                assert!(n.text.starts_with("Error fetching status: malformed status response"));
            }
            other => panic!("unexpected event {other:?}"),
        }

        *backend.status_body.lock().unwrap() = STATUS.into();
        h.cmds.send(UiCommand::Refresh).unwrap();
        assert_eq!(h.next_panel().await, before);
        h.quit().await;
    }

    #[tokio::test]
    async fn ui_notifications_share_the_single_slot() {
        let backend = Backend::with_status(STATUS);
        let base = test_server::spawn(backend).await;
        let mut h = Harness::start(config(&base));
        h.next_panel().await;

        h.cmds.send(UiCommand::Notify("Copied rpc".into())).unwrap();
        assert_eq!(h.next_notification().await.as_deref(), Some("Copied rpc"));
        h.cmds.send(UiCommand::DismissNotification).unwrap();
        assert_eq!(h.next_notification().await, None);
        h.quit().await;
    }

    #[tokio::test]
    async fn polling_refreshes_periodically() {
        let backend = Backend::with_status(STATUS);
        let base = test_server::spawn(backend.clone()).await;
        let mut cfg = config(&base);
        cfg.poll_interval = Duration::from_millis(100);
        let mut h = Harness::start(cfg);

        for _ in 0..3 {
            h.next_panel().await;
        }
        assert!(backend.status_hits() >= 3);
        h.quit().await;
    }
}
