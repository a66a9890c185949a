//! Transport bar widget - shows play state, channel frequencies and the beat pulse

use std::time::Duration;

use binaura::SessionState;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Whether the pulse indicator is lit `elapsed` into a beat at `beat_hz`
pub fn pulse_on(elapsed: Duration, beat_hz: f32) -> bool {
    (elapsed.as_secs_f64() * beat_hz as f64).fract() < 0.5
}

/// Render the transport bar
pub fn render_transport(
    frame: &mut Frame,
    area: Rect,
    session: &SessionState,
    sample_rate: Option<f32>,
    elapsed: Duration,
) {
    let block = Block::default().title(" binaura ").borders(Borders::ALL);

    let play_symbol = if session.is_playing { "▶" } else { "■" };
    let play_state_str = if session.is_playing { "Playing" } else { "Stopped" };
    let pulse = if session.is_playing && pulse_on(elapsed, session.beat_frequency) {
        "●"
    } else {
        "○"
    };

    // e.g. 48000 -> "48.0kHz"; unknown until the device opens
    let rate = match sample_rate {
        Some(hz) => format!("{:.1}kHz  ", hz / 1000.0),
        None => "--kHz  ".to_string(),
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {} {}  ", play_symbol, play_state_str),
            Style::default().fg(if session.is_playing {
                Color::Green
            } else {
                Color::Yellow
            }),
        ),
        Span::styled(
            format!("{} {:.0}Hz  ", pulse, session.beat_frequency),
            Style::default().fg(Color::Magenta),
        ),
        Span::styled(
            format!(
                "L {:.0}Hz | R {:.0}Hz  ",
                session.left_frequency(),
                session.right_frequency()
            ),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("Amp: {:.3}  ", session.amplitude()),
            Style::default().fg(Color::White),
        ),
        Span::styled(rate, Style::default().fg(Color::DarkGray)),
        Span::styled(
            session.preset.label(),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let paragraph = Paragraph::new(line).block(block);
    frame.render_widget(paragraph, area);
}
