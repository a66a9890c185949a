//! Slider widgets for the three continuous controls

use std::ops::RangeInclusive;

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Gauge},
    Frame,
};

pub struct Slider {
    pub title: &'static str,
    pub value: f32,
    pub range: RangeInclusive<f32>,
    pub unit: &'static str,
    pub focused: bool,
}

impl Slider {
    /// Position of the value within the range, 0.0-1.0
    fn ratio(&self) -> f64 {
        let (lo, hi) = (*self.range.start(), *self.range.end());
        if hi <= lo {
            return 0.0;
        }
        (((self.value - lo) / (hi - lo)) as f64).clamp(0.0, 1.0)
    }
}

/// Render one slider as a horizontal gauge
pub fn render_slider(frame: &mut Frame, area: Rect, slider: &Slider) {
    let border_style = if slider.focused {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let block = Block::default()
        .title(format!(
            " {} ({:.0}-{:.0}{}) ",
            slider.title,
            slider.range.start(),
            slider.range.end(),
            slider.unit
        ))
        .borders(Borders::ALL)
        .border_style(border_style);

    let gauge = Gauge::default()
        .block(block)
        .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
        .ratio(slider.ratio())
        .label(format!("{:.0} {}", slider.value, slider.unit));
    frame.render_widget(gauge, area);
}
