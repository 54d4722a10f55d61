// SPDX-License-Identifier: MPL-2.0
//! Scripted decode sources for exercising the worker and seek engine
//! without FFmpeg or real media.

use crate::error::Result;
use crate::frame::StreamInfo;
use crate::source::{DecodeSource, SourceFrame};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Synthetic keyframe spacing used by [`FakeSource::seek`].
const KEYFRAME_INTERVAL: usize = 10;

/// A deterministic decode source producing `frame_count` frames at a fixed
/// rate, with keyframe-aligned backward seeking every tenth frame.
pub(crate) struct FakeSource {
    info: StreamInfo,
    frame_count: usize,
    cursor: usize,
    decode_delay: Duration,
}

impl FakeSource {
    pub fn new(frame_rate_hz: f64, frame_count: usize) -> Self {
        Self {
            info: StreamInfo {
                duration_secs: Some(frame_count as f64 / frame_rate_hz),
                frame_rate_hz,
                width: 64,
                height: 48,
                time_base: (1, 90_000),
            },
            frame_count,
            cursor: 0,
            decode_delay: Duration::ZERO,
        }
    }

    /// Simulates a source whose duration the container does not report.
    pub fn without_duration(mut self) -> Self {
        self.info.duration_secs = None;
        self
    }

    /// Adds a fixed per-frame decode latency.
    pub fn with_decode_delay(mut self, delay: Duration) -> Self {
        self.decode_delay = delay;
        self
    }

    fn pts_of(&self, index: usize) -> f64 {
        index as f64 / self.info.frame_rate_hz
    }
}

impl DecodeSource for FakeSource {
    fn stream_info(&self) -> StreamInfo {
        self.info.clone()
    }

    fn metadata(&self) -> Vec<(String, String)> {
        vec![("title".to_string(), "fake".to_string())]
    }

    fn decode_next(&mut self, output_size: (u32, u32)) -> Result<Option<SourceFrame>> {
        if !self.decode_delay.is_zero() {
            std::thread::sleep(self.decode_delay);
        }
        if self.cursor >= self.frame_count {
            return Ok(None);
        }
        let pts_secs = self.pts_of(self.cursor);
        self.cursor += 1;
        let (width, height) = (output_size.0.max(1), output_size.1.max(1));
        Ok(Some(SourceFrame {
            rgba: vec![0u8; (width as usize) * (height as usize) * 4],
            width,
            height,
            pts_secs,
        }))
    }

    fn seek(&mut self, target_secs: f64) -> Result<()> {
        let target_index = (target_secs * self.info.frame_rate_hz).floor() as usize;
        let clamped = target_index.min(self.frame_count.saturating_sub(1));
        self.cursor = (clamped / KEYFRAME_INTERVAL) * KEYFRAME_INTERVAL;
        Ok(())
    }
}

/// Wraps a source and counts how many times it is opened, for asserting the
/// single-worker guarantee.
pub(crate) struct OpenCounter(Arc<AtomicUsize>);

impl OpenCounter {
    pub fn new() -> Self {
        Self(Arc::new(AtomicUsize::new(0)))
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    pub fn opener(
        &self,
        make: impl Fn() -> FakeSource + Send + 'static,
    ) -> impl FnOnce() -> Result<Box<dyn DecodeSource>> + Send + 'static {
        let counter = Arc::clone(&self.0);
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(make()) as Box<dyn DecodeSource>)
        }
    }
}
