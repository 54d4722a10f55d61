// SPDX-License-Identifier: MPL-2.0
//! Decoded frame and stream description types.

use std::sync::Arc;

/// Immutable description of a loaded video stream.
///
/// Computed once by the decode source at the start of a load cycle and
/// read-only afterward.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    /// Stream duration in seconds, when the container knows it.
    pub duration_secs: Option<f64>,

    /// Nominal frame rate in Hz.
    pub frame_rate_hz: f64,

    /// Intrinsic frame width in pixels.
    pub width: u32,

    /// Intrinsic frame height in pixels.
    pub height: u32,

    /// Rational `(numerator, denominator)` converting container timestamps
    /// to seconds.
    pub time_base: (i32, i32),
}

impl StreamInfo {
    /// Intrinsic frame size as `(width, height)`.
    pub fn intrinsic_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Whole-frames-per-second rate used for the once-a-second notification.
    pub fn nominal_rate(&self) -> u64 {
        self.frame_rate_hz.round().max(1.0) as u64
    }

    /// Frame number at a given presentation timestamp:
    /// `floor(frame_rate_hz * pts_secs)`.
    pub fn frame_number_at(&self, pts_secs: f64) -> u64 {
        (self.frame_rate_hz * pts_secs).max(0.0).floor() as u64
    }
}

/// A decoded RGBA frame ready for display.
///
/// Frames are replaced wholesale: the worker publishes a new `Frame` and the
/// consumer observes either the old or the new one, never a torn mix.
#[derive(Debug, Clone)]
pub struct Frame {
    /// RGBA pixel data (`width * height * 4` bytes).
    pub rgba: Arc<Vec<u8>>,

    /// Frame width in pixels.
    pub width: u32,

    /// Frame height in pixels.
    pub height: u32,

    /// Presentation timestamp in seconds.
    pub pts_secs: f64,

    /// Frame number derived from the presentation timestamp.
    pub frame_number: u64,
}

impl Frame {
    /// Fully transparent placeholder shown before the first real frame has
    /// decoded, so the consumer always has something to render.
    pub fn placeholder(width: u32, height: u32) -> Self {
        Self {
            rgba: Arc::new(vec![0u8; (width as usize) * (height as usize) * 4]),
            width,
            height,
            pts_secs: 0.0,
            frame_number: 0,
        }
    }

    /// Total pixel buffer size in bytes.
    pub fn size_bytes(&self) -> usize {
        self.rgba.len()
    }
}
