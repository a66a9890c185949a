//! binaura - binaural beat generator for the terminal
//!
//! Run with: cargo run --release
//! Logs go to `binaura.log` in the system temp directory; `RUST_LOG`
//! overrides the default `binaura=debug` filter.

mod app;
mod ui;

use std::{fs::File, sync::Mutex};

use app::Binaura;
use binaura::VolumeRange;
use color_eyre::eyre::WrapErr;
use tracing_subscriber::EnvFilter;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    init_logging()?;

    Binaura::new().volume_range(VolumeRange::Standard).run()
}

/// Route `tracing` output to a file so it never draws over the UI.
fn init_logging() -> color_eyre::Result<()> {
    let path = std::env::temp_dir().join("binaura.log");
    let file = File::create(&path)
        .wrap_err_with(|| format!("failed to create log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("binaura=debug")),
        )
        .init();
    Ok(())
}
