pub mod config; // Limits and engine settings
pub mod context; // Audio context, node handles and renderer
pub mod dsp;
pub mod engine; // Session state and the beat engine
pub mod error;
pub mod graph; // Render graph shared by mirror and renderer

pub use config::{EngineConfig, Limits, VolumeRange};
pub use context::{AudioContext, ContextOpener, OfflineOpener, Renderer};
pub use engine::{BeatEngine, Control, Effect, LiveNodes, Preset, SessionState};
pub use error::{Error, Result};

pub const MAX_BLOCK_SIZE: usize = 2048;
