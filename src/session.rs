// SPDX-License-Identifier: MPL-2.0
//! Playback controller: the externally callable surface.
//!
//! A `PlaybackSession` lives on the owning thread. None of its methods block:
//! long-running work happens on the decode worker, and control requests are
//! asynchronous signals the worker polls. Callers that need a synchronous
//! end-of-cycle guarantee wait for the `Ended` notification rather than
//! relying on `stop()` returning.

use crate::error::Result;
use crate::frame::{Frame, StreamInfo};
use crate::publisher::{output_channel, FramePublisher, OutputReceiver, PlaybackEvent};
use crate::source::{DecodeSource, FfmpegSource};
use crate::state::{PlaybackState, SharedState};
use crate::worker;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Advisory delay granted to `seek(.., precise: true)` while paused.
const SEEK_GRACE: Duration = Duration::from_millis(10);

/// One playback session: state machine, worker lifecycle and queries.
///
/// Exactly one decode worker is alive per session at any time; `play()` while
/// a worker runs is a no-op (or a resume, when paused). The session must be
/// torn down explicitly with [`dispose`](Self::dispose) or by dropping it.
pub struct PlaybackSession {
    shared: Arc<SharedState>,
    video_path: Option<PathBuf>,
    /// Worker-side handle of the current cycle, kept so `stop()` can emit
    /// `Ended` when no worker is alive to do it.
    publisher: Option<FramePublisher>,
    output: Option<OutputReceiver>,
    worker: Option<thread::JoinHandle<()>>,
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackSession {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(SharedState::new()),
            video_path: None,
            publisher: None,
            output: None,
            worker: None,
        }
    }

    /// Records the media path for the next play cycle. Valid from any state;
    /// stops any running cycle first.
    pub fn load<P: Into<PathBuf>>(&mut self, path: P) {
        self.stop();
        self.video_path = Some(path.into());
        self.shared.clear_halted();
    }

    /// Starts playback of the loaded path, or resumes when paused.
    /// Idempotent while already playing; a no-op when nothing is loaded.
    pub fn play(&mut self) {
        self.shared.signals.set_paused(false);
        self.shared.signals.clear_stop();
        if self.shared.worker_alive() {
            return;
        }
        let Some(path) = self.video_path.clone() else {
            return;
        };
        self.spawn_cycle(move || {
            FfmpegSource::open(&path).map(|source| Box::new(source) as Box<dyn DecodeSource>)
        });
    }

    /// Halts frame production. Has no effect unless a worker is active.
    pub fn pause(&mut self) {
        self.shared.signals.set_paused(true);
    }

    /// Requests cooperative termination of the current cycle. Always safe to
    /// call, fully idempotent. The shared cleanup routine (position reset,
    /// `Ended` notification) runs inline when no worker is alive, otherwise
    /// on the worker's exit path.
    pub fn stop(&mut self) {
        self.shared.signals.set_paused(true);
        self.shared.signals.request_stop();
        if !self.shared.worker_alive() {
            if self.shared.finish_cycle() {
                if let Some(publisher) = &self.publisher {
                    publisher.notify(PlaybackEvent::Ended);
                }
            }
        }
    }

    /// Requests a seek to `seconds`. Latest request wins; the worker services
    /// it at its next poll point, including while paused.
    ///
    /// With `precise` set and playback paused, the call sleeps briefly before
    /// returning so an immediate read of the current frame is more likely to
    /// reflect the seek. This is advisory only and never a guarantee; the
    /// worker polls asynchronously.
    pub fn seek(&mut self, seconds: f64, precise: bool) {
        self.shared.signals.request_seek(seconds);
        if precise && self.shared.signals.is_paused() {
            thread::sleep(SEEK_GRACE);
        }
    }

    /// Stops playback and joins the worker thread. Called from `Drop`; safe
    /// to call repeatedly.
    pub fn dispose(&mut self) {
        self.stop();
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }

    // --- Queries (non-blocking) ---

    pub fn state(&self) -> PlaybackState {
        self.shared.playback_state()
    }

    /// Stream description of the current cycle, once loaded.
    pub fn video_info(&self) -> Option<StreamInfo> {
        self.shared.stream_info()
    }

    /// Container-level key/value tags of the current cycle.
    pub fn metadata(&self) -> Vec<(String, String)> {
        self.shared.metadata()
    }

    /// The last published frame. Whole-value replacement: never torn.
    pub fn current_frame(&self) -> Option<Frame> {
        self.output.as_ref().and_then(OutputReceiver::current_frame)
    }

    pub fn current_timestamp_secs(&self) -> f64 {
        self.shared.position_secs()
    }

    pub fn current_frame_number(&self) -> u64 {
        self.shared.frame_number()
    }

    pub fn duration_secs(&self) -> Option<f64> {
        self.video_info().and_then(|info| info.duration_secs)
    }

    pub fn is_paused(&self) -> bool {
        self.shared.signals.is_paused()
    }

    /// Drains the next pending notification, if any. Intended to be called
    /// from the host's event loop.
    pub fn poll_event(&mut self) -> Option<PlaybackEvent> {
        self.output.as_mut().and_then(OutputReceiver::poll_event)
    }

    // --- Display configuration ---

    /// Sets the target display size. `(0, 0)` means "use the intrinsic
    /// frame size", which the worker substitutes on load.
    pub fn set_display_size(&mut self, width: u32, height: u32) {
        self.shared.set_display_size(width, height);
    }

    pub fn set_keep_aspect(&mut self, keep: bool) {
        self.shared.set_keep_aspect(keep);
    }

    /// Enables or disables pacing to the nominal frame rate. Enabled by
    /// default; disabling lets decode free-run.
    pub fn set_consistent_frame_rate(&mut self, enabled: bool) {
        self.shared.set_consistent_frame_rate(enabled);
    }

    /// Starts one decode cycle with the given source opener. `begin_cycle`
    /// marks the worker as running before the thread spawns, so a second
    /// call can never start a second worker.
    fn spawn_cycle<F>(&mut self, opener: F)
    where
        F: FnOnce() -> Result<Box<dyn DecodeSource>> + Send + 'static,
    {
        if self.shared.worker_alive() {
            return;
        }
        // Reap the previous cycle's thread; it has already exited.
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }

        let (publisher, output) = output_channel();
        self.publisher = Some(publisher.clone());
        self.output = Some(output);
        self.shared.begin_cycle();
        self.worker = Some(worker::spawn(
            Arc::clone(&self.shared),
            publisher,
            Box::new(opener),
        ));
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.dispose();
    }
}
