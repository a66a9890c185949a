use thiserror::Error;

use crate::graph::GraphError;

#[derive(Debug, Error)]
pub enum Error {
    /// The platform refused to give us an output stream: no device, no
    /// supported format, or the stream failed to start.
    #[error("audio output unavailable: {0}")]
    AudioUnavailable(String),

    #[error("audio context is closed")]
    ContextClosed,

    /// The render thread has not drained earlier commands yet.
    #[error("command queue full: {pending} commands waiting for {free} free slots")]
    QueueFull { pending: usize, free: usize },

    #[error("{parameter} must be a finite number")]
    NonFinite { parameter: &'static str },

    #[error(transparent)]
    Graph(#[from] GraphError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
