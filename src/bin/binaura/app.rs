//! Binaura - application builder and runner

use binaura::{BeatEngine, EngineConfig, VolumeRange};
use color_eyre::eyre::{eyre, Result as EyreResult};
use tracing::info;

use super::ui::UiApp;

/// Main application builder
pub struct Binaura {
    config: EngineConfig,
}

impl Binaura {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    /// Span of the volume slider
    pub fn volume_range(mut self, range: VolumeRange) -> Self {
        self.config = self.config.with_volume_range(range);
        self
    }

    /// Run the application until the user quits.
    ///
    /// The terminal is restored before any error is reported, and the engine
    /// is disposed on the way out.
    pub fn run(self) -> EyreResult<()> {
        info!(volume_range = ?self.config.volume_range(), "starting binaura");
        let engine = BeatEngine::with_default_device(self.config);
        let mut app = UiApp::new(engine);

        let mut terminal = ratatui::init();
        let result = app.run(&mut terminal);
        ratatui::restore();

        let disposed = app
            .into_engine()
            .dispose()
            .map_err(|err| eyre!("failed to shut down audio: {err}"));
        result.and(disposed)
    }
}

impl Default for Binaura {
    fn default() -> Self {
        Self::new()
    }
}
