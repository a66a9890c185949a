//! Audio contexts backed by a cpal output stream.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::RingBuffer;
use tracing::{error, info};

use crate::error::{Error, Result};

use super::{AudioContext, Output, Renderer};

fn unavailable(what: &str, err: impl std::fmt::Display) -> Error {
    Error::AudioUnavailable(format!("{what}: {err}"))
}

/// Open the default output device and start a stream rendering a fresh graph.
///
/// The renderer moves into the device callback; the returned context keeps
/// the stream alive until it is closed or dropped.
pub fn open_default(capacity: usize) -> Result<AudioContext> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| Error::AudioUnavailable("no default output device available".into()))?;
    let config = device
        .default_output_config()
        .map_err(|err| unavailable("failed to fetch default output config", err))?;

    if config.sample_format() != cpal::SampleFormat::F32 {
        return Err(Error::AudioUnavailable(format!(
            "unsupported sample format {:?}, expected f32",
            config.sample_format()
        )));
    }

    let sample_rate = config.sample_rate().0 as f32;
    let channels = config.channels() as usize;

    let (producer, consumer) = RingBuffer::new(capacity);
    let mut renderer = Renderer::new(sample_rate, consumer);

    let stream = device
        .build_output_stream(
            &config.into(),
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                renderer.render_interleaved(data, channels);
            },
            |err| error!(%err, "audio stream error"),
            None,
        )
        .map_err(|err| unavailable("failed to build output stream", err))?;
    stream
        .play()
        .map_err(|err| unavailable("failed to start output stream", err))?;

    info!(sample_rate, channels, "opened default output device");
    Ok(AudioContext::from_parts(
        sample_rate,
        producer,
        Output::Device(stream),
    ))
}
