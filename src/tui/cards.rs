use super::state::UiState;
use crate::model::EndpointAction;
use crate::reconcile::ServiceViewModel;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

const CARD_HEIGHT: u16 = 7;
const WIDE_LAYOUT_MIN_WIDTH: u16 = 100;
const RUNNING_BORDER: Color = Color::Rgb(50, 42, 152);
const STOPPED_BORDER: Color = Color::Rgb(152, 48, 48);

/// Lines inside one service card. `selected_endpoint` is highlighted when the
/// card has focus.
pub fn card_lines(vm: &ServiceViewModel, selected_endpoint: Option<usize>) -> Vec<Line<'static>> {
    let control_style = if vm.control.pending {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC)
    } else if vm.is_running() {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Green)
    };
    let (dot, state) = if vm.is_running() {
        ("●", "running")
    } else {
        ("○", "stopped")
    };

    let mut lines = vec![Line::from(vec![
        Span::styled(format!("[ {} ]", vm.control.label), control_style),
        Span::raw("  "),
        Span::styled(format!("{dot} {state}"), Style::default().fg(Color::Gray)),
    ])];

    if !vm.required_endpoints.is_empty() {
        lines.push(Line::from(vec![
            Span::styled("Requires: ", Style::default().fg(Color::Gray)),
            Span::raw(vm.required_endpoints.join(", ")),
        ]));
    }

    if vm.show_endpoints_label {
        lines.push(Line::from(Span::styled(
            "Endpoints:",
            Style::default().fg(Color::Gray),
        )));
    }

    if !vm.endpoints.is_empty() {
        let mut spans = Vec::new();
        for (i, ep) in vm.endpoints.iter().enumerate() {
            let (icon, color) = match ep.disposition.action {
                EndpointAction::OpenLink => ("↗", Color::Cyan),
                EndpointAction::CopyToClipboard => ("⧉", Color::Yellow),
            };
            let mut style = Style::default().fg(color);
            if selected_endpoint == Some(i) {
                style = style.add_modifier(Modifier::REVERSED);
            }
            if i > 0 {
                spans.push(Span::raw(" "));
            }
            spans.push(Span::styled(format!("{icon} {}", ep.label), style));
        }
        lines.push(Line::from(spans));
    }

    lines
}

fn draw_card(area: Rect, f: &mut Frame, vm: &ServiceViewModel, selected_endpoint: Option<usize>) {
    let border = if vm.is_running() {
        RUNNING_BORDER
    } else {
        STOPPED_BORDER
    };
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(Span::styled(
            vm.display_name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
    if selected_endpoint.is_some() {
        block = block.border_type(BorderType::Thick);
    }
    if !vm.is_running() {
        block = block.style(Style::default().bg(Color::Rgb(43, 32, 32)));
    }

    let p = Paragraph::new(card_lines(vm, selected_endpoint))
        .block(block)
        .wrap(Wrap { trim: true });
    f.render_widget(p, area);
}

/// Card grid: one column on narrow terminals, two otherwise. Scrolls so the
/// selected card stays visible.
pub fn draw_cards(area: Rect, f: &mut Frame, state: &UiState) {
    if state.services.is_empty() {
        let msg = if state.refreshed_at.is_some() {
            "No services registered.".to_string()
        } else {
            format!("Waiting for status from {}...", state.base_url)
        };
        f.render_widget(
            Paragraph::new(msg).block(Block::default().borders(Borders::ALL).title("Services")),
            area,
        );
        return;
    }

    let columns: usize = if area.width >= WIDE_LAYOUT_MIN_WIDTH { 2 } else { 1 };
    let rows_visible = ((area.height / CARD_HEIGHT) as usize).max(1);
    let selected_row = state.selected / columns;
    let first_row = selected_row.saturating_sub(rows_visible - 1);
    let card_width = area.width / columns as u16;

    for (i, vm) in state.services.iter().enumerate() {
        let row = i / columns;
        if row < first_row || row >= first_row + rows_visible {
            continue;
        }
        let y = area.y + (row - first_row) as u16 * CARD_HEIGHT;
        let height = CARD_HEIGHT.min(area.bottom().saturating_sub(y));
        if height == 0 {
            continue;
        }
        let rect = Rect {
            x: area.x + (i % columns) as u16 * card_width,
            y,
            width: card_width,
            height,
        };
        let endpoint_focus = (i == state.selected).then_some(state.endpoint_selected);
        draw_card(rect, f, vm, endpoint_focus);
    }
}

/// Transient message overlay in the bottom-right corner.
pub fn draw_notification(area: Rect, f: &mut Frame, text: &str) {
    let width = area.width.min(60);
    if width < 3 || area.height < 3 {
        return;
    }
    let inner_width = (width - 2) as usize;
    let text_lines = text.chars().count().div_ceil(inner_width).max(1) as u16;
    let height = (text_lines + 2).min(area.height);
    let rect = Rect {
        x: area.right().saturating_sub(width + 1).max(area.x),
        y: area.bottom().saturating_sub(height + 1).max(area.y),
        width,
        height,
    };

    let p = Paragraph::new(text.to_string())
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White)),
        );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}
