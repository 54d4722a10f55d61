// SPDX-License-Identifier: MPL-2.0
//! Cross-thread control flags polled by the decode worker.
//!
//! This is the only mutable state shared between the owning thread and the
//! worker. Correctness does not depend on immediate visibility: the worker
//! polls at sub-millisecond intervals, so pause/stop/seek requests take
//! effect within a bounded staleness window (well under 10 ms). Seek requests
//! follow "latest request wins": a new target overwrites any pending one.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Debug)]
pub struct ControlSignals {
    should_stop: AtomicBool,
    paused: AtomicBool,
    seek_requested: AtomicBool,
    /// Seek target in seconds, stored as `f64` bits.
    seek_target_bits: AtomicU64,
}

impl Default for ControlSignals {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlSignals {
    /// Creates the flag block in the stopped-and-paused state, matching a
    /// session with no active worker.
    pub fn new() -> Self {
        Self {
            should_stop: AtomicBool::new(true),
            paused: AtomicBool::new(true),
            seek_requested: AtomicBool::new(false),
            seek_target_bits: AtomicU64::new(0.0f64.to_bits()),
        }
    }

    pub fn request_stop(&self) {
        self.should_stop.store(true, Ordering::SeqCst);
    }

    pub fn clear_stop(&self) {
        self.should_stop.store(false, Ordering::SeqCst);
    }

    pub fn should_stop(&self) -> bool {
        self.should_stop.load(Ordering::SeqCst)
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Requests a seek to `target_secs`, replacing any pending request.
    /// Negative targets clamp to zero.
    pub fn request_seek(&self, target_secs: f64) {
        let target = target_secs.max(0.0);
        self.seek_target_bits
            .store(target.to_bits(), Ordering::SeqCst);
        self.seek_requested.store(true, Ordering::SeqCst);
    }

    /// Consumes a pending seek request, if any. Each request is observed at
    /// most once.
    pub fn take_seek(&self) -> Option<f64> {
        if self.seek_requested.swap(false, Ordering::SeqCst) {
            Some(f64::from_bits(self.seek_target_bits.load(Ordering::SeqCst)))
        } else {
            None
        }
    }

    pub fn seek_pending(&self) -> bool {
        self.seek_requested.load(Ordering::SeqCst)
    }
}
