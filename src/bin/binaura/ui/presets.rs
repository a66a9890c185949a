//! Preset row

use binaura::Preset;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Render the five presets, highlighting the selected one
pub fn render_presets(frame: &mut Frame, area: Rect, selected: Preset, focused: bool) {
    let border_style = if focused {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let spans: Vec<Span> = Preset::ALL
        .iter()
        .enumerate()
        .flat_map(|(i, &preset)| {
            let style = if preset == selected {
                Style::default().fg(Color::Black).bg(Color::Cyan)
            } else {
                Style::default().fg(Color::White)
            };
            [
                Span::styled(format!(" {} {} ", i + 1, preset.label()), style),
                Span::raw(" "),
            ]
        })
        .collect();

    let block = Block::default()
        .title(" Presets ")
        .borders(Borders::ALL)
        .border_style(border_style);
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}
