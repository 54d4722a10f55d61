// SPDX-License-Identifier: MPL-2.0
//! Error taxonomy for the playback engine.
//!
//! End-of-stream is deliberately not an error: decode sources report it as
//! `Ok(None)` and the worker exits its loop gracefully. A vanished consumer
//! is likewise not an error; publishes to it are silently dropped.

use std::fmt;

#[derive(Debug, Clone)]
pub enum PlaybackError {
    /// Media resource does not exist or cannot be opened for reading.
    NotFound(String),

    /// The resource has no usable video stream, or its frame rate is
    /// unobtainable. Fatal for the load cycle.
    NotAVideo(String),

    /// Packet-level corruption. The decode source discards such packets and
    /// keeps going; this variant only surfaces from callers that opt into
    /// strict handling.
    CorruptStream(String),

    /// Decode-layer failure: codec, scaler, or seek error.
    Decode(String),
}

impl fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackError::NotFound(msg) => write!(f, "Not found: {}", msg),
            PlaybackError::NotAVideo(msg) => write!(f, "Not a video: {}", msg),
            PlaybackError::CorruptStream(msg) => write!(f, "Corrupt stream: {}", msg),
            PlaybackError::Decode(msg) => write!(f, "Decode error: {}", msg),
        }
    }
}

impl From<std::io::Error> for PlaybackError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            PlaybackError::NotFound(err.to_string())
        } else {
            PlaybackError::Decode(err.to_string())
        }
    }
}

impl From<ffmpeg_next::Error> for PlaybackError {
    fn from(err: ffmpeg_next::Error) -> Self {
        PlaybackError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PlaybackError>;
