use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const KEYBINDS: &[(&str, &str)] = &[
    ("q / Ctrl-C", "Quit"),
    ("↑/↓ or j/k", "Select service"),
    ("←/→ or h/l", "Select endpoint"),
    ("s / Enter", "Start or stop selected service"),
    ("o", "Open endpoint (or copy when it is not HTTP)"),
    ("y", "Copy endpoint URL"),
    ("r", "Refresh now"),
    ("Esc", "Dismiss notification"),
    ("?", "Toggle this help"),
];

pub fn draw_help(area: Rect, f: &mut Frame) {
    let mut lines = vec![Line::from("Keybinds:")];
    for (keys, what) in KEYBINDS {
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(format!("{keys:<12}"), Style::default().fg(Color::Magenta)),
            Span::raw(*what),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from("Endpoints:"));
    lines.push(Line::from(vec![
        Span::raw("  "),
        Span::styled("↗", Style::default().fg(Color::Cyan)),
        Span::raw(" opens in the browser, "),
        Span::styled("⧉", Style::default().fg(Color::Yellow)),
        Span::raw(" copies to the clipboard"),
    ]));

    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(Clear, area);
    f.render_widget(p, area);
}
