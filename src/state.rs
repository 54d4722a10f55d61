// SPDX-License-Identifier: MPL-2.0
//! Playback state machine and the session state shared with the worker.
//!
//! `SharedState` is written by the worker and read by the owning thread.
//! Every field is either an atomic replaced as a whole value or a slot set
//! once per load cycle, so readers observe old or new values, never a torn
//! mix. The playback position is stored as `f64` bits in an `AtomicU64` and
//! the frame number is derived on read, which makes the invariant
//! `frame_number == floor(frame_rate_hz * timestamp)` hold by construction.

use crate::frame::StreamInfo;
use crate::signals::ControlSignals;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

/// Externally observable playback state.
///
/// `Idle -> Loading -> Playing <-> Paused -> Stopped`; `Stopped` returns to
/// `Idle` on the next `load`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No worker and nothing has been stopped since the last `load`.
    Idle,

    /// Worker is starting up: the source is being opened.
    Loading,

    /// Worker is decoding and publishing frames.
    Playing,

    /// Worker is alive but frame production is halted.
    Paused,

    /// The last cycle has ended, by `stop()` or by the stream running out.
    Stopped,
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, Self::Paused)
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }
}

#[derive(Debug, Clone)]
struct LoadedStream {
    info: StreamInfo,
    metadata: Vec<(String, String)>,
}

/// State shared between the owning thread and the decode worker.
#[derive(Debug)]
pub(crate) struct SharedState {
    pub(crate) signals: ControlSignals,

    /// Current presentation timestamp in seconds (`f64` bits).
    position_bits: AtomicU64,

    /// Display size packed as `width << 32 | height`. `(0, 0)` means "not
    /// set"; the worker substitutes the intrinsic size on load.
    display_size: AtomicU64,

    keep_aspect: AtomicBool,
    consistent_rate: AtomicBool,

    /// True from just before the worker thread spawns until its cleanup runs.
    worker_alive: AtomicBool,

    /// True once the worker has published `StreamInfo` for this cycle.
    loaded: AtomicBool,

    /// True after a cycle has ended; cleared by `load`.
    halted: AtomicBool,

    /// Gates the `Ended` notification to once per cycle, however many of
    /// `stop()` and the worker cleanup run.
    ended_sent: AtomicBool,

    stream: Mutex<Option<LoadedStream>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            signals: ControlSignals::new(),
            position_bits: AtomicU64::new(0.0f64.to_bits()),
            display_size: AtomicU64::new(0),
            keep_aspect: AtomicBool::new(false),
            consistent_rate: AtomicBool::new(true),
            worker_alive: AtomicBool::new(false),
            loaded: AtomicBool::new(false),
            halted: AtomicBool::new(false),
            ended_sent: AtomicBool::new(false),
            stream: Mutex::new(None),
        }
    }

    /// Resets per-cycle state and records the worker as running. Called on
    /// the owning thread immediately before the thread spawns, so a second
    /// `play` can never start a second worker.
    pub fn begin_cycle(&self) {
        self.signals.clear_stop();
        self.signals.set_paused(false);
        self.worker_alive.store(true, Ordering::SeqCst);
        self.loaded.store(false, Ordering::SeqCst);
        self.halted.store(false, Ordering::SeqCst);
        self.ended_sent.store(false, Ordering::SeqCst);
        self.reset_position();
        if let Ok(mut stream) = self.stream.lock() {
            *stream = None;
        }
    }

    /// Shared cleanup routine run on every worker exit path, and inline by
    /// `stop()` when no worker is alive. Safe to run any number of times;
    /// returns true for exactly one caller per cycle, which then emits the
    /// `Ended` notification.
    pub fn finish_cycle(&self) -> bool {
        self.reset_position();
        self.signals.set_paused(true);
        self.signals.request_stop();
        self.worker_alive.store(false, Ordering::SeqCst);
        self.halted.store(true, Ordering::SeqCst);
        !self.ended_sent.swap(true, Ordering::SeqCst)
    }

    pub fn clear_halted(&self) {
        self.halted.store(false, Ordering::SeqCst);
    }

    pub fn worker_alive(&self) -> bool {
        self.worker_alive.load(Ordering::SeqCst)
    }

    pub fn set_stream(&self, info: StreamInfo, metadata: Vec<(String, String)>) {
        if let Ok(mut stream) = self.stream.lock() {
            *stream = Some(LoadedStream { info, metadata });
        }
        self.loaded.store(true, Ordering::SeqCst);
    }

    pub fn stream_info(&self) -> Option<StreamInfo> {
        self.stream
            .lock()
            .ok()
            .and_then(|stream| stream.as_ref().map(|loaded| loaded.info.clone()))
    }

    pub fn metadata(&self) -> Vec<(String, String)> {
        self.stream
            .lock()
            .ok()
            .and_then(|stream| stream.as_ref().map(|loaded| loaded.metadata.clone()))
            .unwrap_or_default()
    }

    pub fn record_position(&self, pts_secs: f64) {
        self.position_bits
            .store(pts_secs.max(0.0).to_bits(), Ordering::SeqCst);
    }

    pub fn reset_position(&self) {
        self.position_bits.store(0.0f64.to_bits(), Ordering::SeqCst);
    }

    pub fn position_secs(&self) -> f64 {
        f64::from_bits(self.position_bits.load(Ordering::SeqCst))
    }

    /// Current frame number, derived from the position and the stream's
    /// frame rate. Zero before a stream has loaded.
    pub fn frame_number(&self) -> u64 {
        match self.stream_info() {
            Some(info) => info.frame_number_at(self.position_secs()),
            None => 0,
        }
    }

    pub fn set_display_size(&self, width: u32, height: u32) {
        let packed = (u64::from(width) << 32) | u64::from(height);
        self.display_size.store(packed, Ordering::SeqCst);
    }

    pub fn display_size(&self) -> (u32, u32) {
        let packed = self.display_size.load(Ordering::SeqCst);
        ((packed >> 32) as u32, packed as u32)
    }

    pub fn set_keep_aspect(&self, keep: bool) {
        self.keep_aspect.store(keep, Ordering::SeqCst);
    }

    pub fn keep_aspect(&self) -> bool {
        self.keep_aspect.load(Ordering::SeqCst)
    }

    pub fn set_consistent_frame_rate(&self, enabled: bool) {
        self.consistent_rate.store(enabled, Ordering::SeqCst);
    }

    pub fn consistent_frame_rate(&self) -> bool {
        self.consistent_rate.load(Ordering::SeqCst)
    }

    pub fn playback_state(&self) -> PlaybackState {
        if self.worker_alive() {
            if !self.loaded.load(Ordering::SeqCst) {
                PlaybackState::Loading
            } else if self.signals.is_paused() {
                PlaybackState::Paused
            } else {
                PlaybackState::Playing
            }
        } else if self.halted.load(Ordering::SeqCst) {
            PlaybackState::Stopped
        } else {
            PlaybackState::Idle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> StreamInfo {
        StreamInfo {
            duration_secs: Some(4.0),
            frame_rate_hz: 30.0,
            width: 640,
            height: 480,
            time_base: (1, 90_000),
        }
    }

    #[test]
    fn fresh_state_is_idle() {
        let state = SharedState::new();
        assert_eq!(state.playback_state(), PlaybackState::Idle);
        assert_eq!(state.frame_number(), 0);
        assert_eq!(state.display_size(), (0, 0));
    }

    #[test]
    fn cycle_transitions_drive_the_state_machine() {
        let state = SharedState::new();
        state.begin_cycle();
        assert_eq!(state.playback_state(), PlaybackState::Loading);

        state.set_stream(info(), Vec::new());
        assert_eq!(state.playback_state(), PlaybackState::Playing);

        state.signals.set_paused(true);
        assert_eq!(state.playback_state(), PlaybackState::Paused);

        state.finish_cycle();
        assert_eq!(state.playback_state(), PlaybackState::Stopped);

        state.clear_halted();
        assert_eq!(state.playback_state(), PlaybackState::Idle);
    }

    #[test]
    fn frame_number_tracks_position_and_rate() {
        let state = SharedState::new();
        state.set_stream(info(), Vec::new());
        state.record_position(2.5);
        assert_eq!(state.frame_number(), 75);
        assert!((state.position_secs() - 2.5).abs() < 1e-12);

        // Invariant: frame_number == floor(rate * timestamp), always.
        for pts in [0.0, 0.0333, 1.0, 1.9999, 3.5] {
            state.record_position(pts);
            assert_eq!(state.frame_number(), (30.0 * pts).floor() as u64);
        }
    }

    #[test]
    fn finish_cycle_resets_position_and_gates_ended() {
        let state = SharedState::new();
        state.begin_cycle();
        state.record_position(3.0);

        assert!(state.finish_cycle());
        assert!(!state.finish_cycle());
        assert_eq!(state.position_secs(), 0.0);
        assert!(state.signals.is_paused());
        assert!(state.signals.should_stop());

        // A new cycle re-arms the gate.
        state.begin_cycle();
        assert!(state.finish_cycle());
    }

    #[test]
    fn display_size_round_trips_through_packing() {
        let state = SharedState::new();
        state.set_display_size(1920, 1080);
        assert_eq!(state.display_size(), (1920, 1080));
        state.set_display_size(1, u32::MAX);
        assert_eq!(state.display_size(), (1, u32::MAX));
    }
}
