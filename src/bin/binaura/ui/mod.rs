//! TUI module for binaura
//!
//! Sliders for beat, base and volume, a preset row, and a transport bar
//! that pulses at the beat rate.

mod controls;
mod presets;
mod transport;

use std::time::{Duration, Instant};

use binaura::{config, BeatEngine, Preset};
use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    DefaultTerminal, Frame,
};
use tracing::warn;

use controls::{render_slider, Slider};
use presets::render_presets;
use transport::render_transport;

const INSTRUCTIONS: [&str; 4] = [
    "Use headphones for the best experience",
    "Start with a preset or adjust manually",
    "Keep volume at a comfortable level",
    "Give your brain time to adjust (5-10 minutes)",
];

/// Which row arrow keys act on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Beat,
    Base,
    Volume,
    Presets,
}

impl Focus {
    const ORDER: [Focus; 4] = [Focus::Beat, Focus::Base, Focus::Volume, Focus::Presets];

    fn next(self) -> Self {
        let i = Self::ORDER.iter().position(|&f| f == self).unwrap_or(0);
        Self::ORDER[(i + 1) % Self::ORDER.len()]
    }

    fn prev(self) -> Self {
        let i = Self::ORDER.iter().position(|&f| f == self).unwrap_or(0);
        Self::ORDER[(i + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

/// UI application state
pub struct UiApp {
    engine: BeatEngine,
    focus: Focus,
    /// Last failure, shown in the status line
    status: Option<String>,
    /// Reference point for the beat pulse
    started: Instant,
    should_quit: bool,
}

impl UiApp {
    pub fn new(engine: BeatEngine) -> Self {
        Self {
            engine,
            focus: Focus::Beat,
            status: None,
            started: Instant::now(),
            should_quit: false,
        }
    }

    /// Hand the engine back for disposal
    pub fn into_engine(self) -> BeatEngine {
        self.engine
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            terminal.draw(|frame| self.render(frame))?;

            // Non-blocking, ~60fps
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode) {
        let result = match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
                Ok(())
            }
            KeyCode::Char(' ') | KeyCode::Enter => self.engine.toggle(),
            KeyCode::Up | KeyCode::BackTab => {
                self.focus = self.focus.prev();
                Ok(())
            }
            KeyCode::Down | KeyCode::Tab => {
                self.focus = self.focus.next();
                Ok(())
            }
            KeyCode::Left => self.nudge(-1.0),
            KeyCode::Right => self.nudge(1.0),
            KeyCode::PageDown => self.nudge(-10.0),
            KeyCode::PageUp => self.nudge(10.0),
            KeyCode::Char(c @ '1'..='5') => {
                let index = c as usize - '1' as usize;
                self.engine.select_preset(Preset::ALL[index])
            }
            _ => Ok(()),
        };

        match result {
            Ok(()) => {
                if matches!(key, KeyCode::Char(' ') | KeyCode::Enter) {
                    self.status = None;
                }
            }
            Err(err) => {
                warn!(%err, "control failed");
                self.status = Some(match err {
                    binaura::Error::AudioUnavailable(reason) => {
                        format!("audio unavailable: {reason}; press Space to retry")
                    }
                    other => other.to_string(),
                });
            }
        }
    }

    /// Move the focused control by `steps`
    fn nudge(&mut self, steps: f32) -> binaura::Result<()> {
        let session = self.engine.session();
        match self.focus {
            Focus::Beat => self
                .engine
                .set_beat_frequency(session.beat_frequency + steps),
            Focus::Base => self
                .engine
                .set_base_frequency(session.base_frequency + steps),
            Focus::Volume => self.engine.set_volume(session.volume + steps),
            Focus::Presets => {
                let len = Preset::ALL.len() as isize;
                let step = steps.signum() as isize;
                let index = (session.preset.index() as isize + step).rem_euclid(len);
                self.engine.select_preset(Preset::ALL[index as usize])
            }
        }
    }

    /// Render the UI
    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let session = self.engine.session();
        let limits = self.engine.config().limits();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Transport bar
                Constraint::Length(3), // Beat slider
                Constraint::Length(3), // Base slider
                Constraint::Length(3), // Volume slider
                Constraint::Length(3), // Presets
                Constraint::Min(6),    // Instructions
                Constraint::Length(1), // Status
                Constraint::Length(1), // Help bar
            ])
            .split(area);

        let sample_rate = self.engine.context().map(|ctx| ctx.sample_rate());
        render_transport(frame, chunks[0], &session, sample_rate, self.started.elapsed());

        let sliders = [
            Slider {
                title: "Beat Frequency",
                value: session.beat_frequency,
                range: config::BEAT_FREQUENCY_RANGE,
                unit: "Hz",
                focused: self.focus == Focus::Beat,
            },
            Slider {
                title: "Base Frequency",
                value: session.base_frequency,
                range: config::BASE_FREQUENCY_RANGE,
                unit: "Hz",
                focused: self.focus == Focus::Base,
            },
            Slider {
                title: "Volume",
                value: session.volume,
                range: limits.volume,
                unit: "dB",
                focused: self.focus == Focus::Volume,
            },
        ];
        for (slider, &area) in sliders.iter().zip(&chunks[1..4]) {
            render_slider(frame, area, slider);
        }

        render_presets(frame, chunks[4], session.preset, self.focus == Focus::Presets);

        let items: Vec<ListItem> = INSTRUCTIONS
            .iter()
            .map(|tip| ListItem::new(format!(" • {tip}")))
            .collect();
        let instructions = List::new(items).block(
            Block::default()
                .title(" Instructions ")
                .borders(Borders::ALL),
        );
        frame.render_widget(instructions, chunks[5]);

        let status = match &self.status {
            Some(message) => Paragraph::new(format!(" {message}"))
                .style(Style::default().fg(Color::Red)),
            None => Paragraph::new(" ready").style(Style::default().fg(Color::DarkGray)),
        };
        frame.render_widget(status, chunks[6]);

        let help = Paragraph::new(
            " [Space] Start/Stop  [↑↓] Focus  [←→] Adjust  [PgUp/PgDn] ×10  [1-5] Preset  [Q] Quit",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[7]);
    }
}
