mod actions;
mod cards;
mod help;
mod state;

use crate::cli::{build_config, Cli};
use crate::client::ControlClient;
use crate::model::{PanelAction, PanelEvent};
use crate::orchestrator::{self, UiCommand};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Terminal,
};
use state::UiState;
use std::{io, time::Duration, time::Instant};
use time::OffsetDateTime;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(args: Cli) -> Result<()> {
    let (event_tx, event_rx) = mpsc::unbounded_channel::<PanelEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();
    let cfg = build_config(&args);
    // Reject an unusable base URL before the terminal is taken over.
    ControlClient::new(&cfg)?;

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let base_url = cfg.base_url.clone();
    let ui_handle = std::thread::spawn(move || run_threaded(base_url, event_rx, cmd_tx));

    let res = orchestrator::run_controller(&cfg, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
pub fn run_threaded(
    base_url: String,
    mut event_rx: UnboundedReceiver<PanelEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let mut state = UiState::new(base_url);

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        if !drain_events(&mut state, &mut event_rx) {
            break Ok(());
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match (k.modifiers, k.code) {
                    (_, KeyCode::Char('q')) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                    (_, KeyCode::Char('j')) | (_, KeyCode::Down) => state.select_next(),
                    (_, KeyCode::Char('k')) | (_, KeyCode::Up) => state.select_previous(),
                    (_, KeyCode::Char('l')) | (_, KeyCode::Right) => state.next_endpoint(),
                    (_, KeyCode::Char('h')) | (_, KeyCode::Left) => state.previous_endpoint(),
                    (_, KeyCode::Char('s')) | (_, KeyCode::Enter) => {
                        if let Some(PanelAction::Command { verb, service }) =
                            state.selected_control_action()
                        {
                            let _ = cmd_tx.send(UiCommand::Command {
                                verb: *verb,
                                service: service.clone(),
                            });
                        }
                    }
                    (_, KeyCode::Char('o')) => {
                        let message = match state.selected_endpoint().map(|ep| &ep.action) {
                            Some(PanelAction::OpenLink { url }) => open_endpoint(url),
                            Some(PanelAction::CopyToClipboard { text }) => copy_endpoint(text),
                            _ => None,
                        };
                        if let Some(message) = message {
                            let _ = cmd_tx.send(UiCommand::Notify(message));
                        }
                    }
                    (_, KeyCode::Char('y')) => {
                        if let Some(ep) = state.selected_endpoint() {
                            if let Some(message) = copy_endpoint(&ep.disposition.canonical_url) {
                                let _ = cmd_tx.send(UiCommand::Notify(message));
                            }
                        }
                    }
                    (_, KeyCode::Char('r')) => {
                        let _ = cmd_tx.send(UiCommand::Refresh);
                    }
                    (_, KeyCode::Esc) => {
                        if state.show_help {
                            state.show_help = false;
                        } else {
                            let _ = cmd_tx.send(UiCommand::DismissNotification);
                        }
                    }
                    (_, KeyCode::Char('?')) => state.show_help = !state.show_help,
                    _ => {}
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

/// Apply every queued controller event. Returns `false` once the controller is gone.
fn drain_events(state: &mut UiState, event_rx: &mut UnboundedReceiver<PanelEvent>) -> bool {
    loop {
        match event_rx.try_recv() {
            Ok(ev) => state.apply_event(ev),
            Err(TryRecvError::Empty) => return true,
            Err(TryRecvError::Disconnected) => return false,
        }
    }
}

/// Opening a link is silent on success; failures surface as a notification.
fn open_endpoint(url: &str) -> Option<String> {
    match actions::open_link(url) {
        Ok(()) => None,
        Err(e) => Some(format!("Failed to open {url}: {e:#}")),
    }
}

fn copy_endpoint(url: &str) -> Option<String> {
    match actions::copy_to_clipboard(url) {
        Ok(()) => Some(format!("Copied {url}")),
        Err(e) => Some(format!("Failed to copy {url}: {e:#}")),
    }
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(area);

    draw_header(chunks[0], f, state);
    cards::draw_cards(chunks[1], f, state);
    draw_footer(chunks[2], f, state);

    if let Some(n) = &state.notification {
        cards::draw_notification(chunks[1], f, &n.text);
    }

    if state.show_help {
        let width = chunks[1].width.min(64);
        let height = chunks[1].height.min(16);
        let help_area = Rect {
            x: chunks[1].x + (chunks[1].width - width) / 2,
            y: chunks[1].y + (chunks[1].height - height) / 2,
            width,
            height,
        };
        help::draw_help(help_area, f);
    }
}

/// `14:03:22 +02:00`. The offset is always shown so a UTC fallback is visible.
fn format_refreshed(at: Option<OffsetDateTime>) -> String {
    at.and_then(|t| {
        t.format(time::macros::format_description!(
            "[hour]:[minute]:[second] [offset_hour sign:mandatory]:[offset_minute]"
        ))
        .ok()
    })
    .unwrap_or_else(|| "never".into())
}

fn draw_header(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let refreshed = format_refreshed(state.refreshed_at);

    let line = Line::from(vec![
        Span::styled(
            format!("{}/{} running", state.running_count(), state.services.len()),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  "),
        Span::styled("Refreshed: ", Style::default().fg(Color::Gray)),
        Span::raw(refreshed),
    ]);
    let p = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("service-panel {}", state.base_url)),
    );
    f.render_widget(p, area);
}

fn draw_footer(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let mut spans = vec![Span::styled(
        "q quit  s start/stop  o open  y copy  r refresh  ? help",
        Style::default().fg(Color::DarkGray),
    )];
    if let Some(ep) = state.selected_endpoint() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            ep.disposition.canonical_url.clone(),
            Style::default().fg(Color::Cyan),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
