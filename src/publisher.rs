// SPDX-License-Identifier: MPL-2.0
//! Cross-thread frame handoff and playback notifications.
//!
//! Frames cross from the worker to the owning thread through a watch channel:
//! a capacity-one slot with latest-frame-wins semantics, so publishes faster
//! than the consumer drains never queue a backlog. Notifications are
//! payload-free signals drained by the host's event loop. Neither path runs
//! consumer code on the worker thread, and a vanished consumer (dropped
//! receiver) turns publishes into silent no-ops.

use crate::frame::Frame;
use tokio::sync::{mpsc, watch};

/// Notification kinds emitted to collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// Stream opened and `StreamInfo` is available.
    Loaded,

    /// The stream duration is known.
    DurationKnown,

    /// A new frame replaced the current one.
    FrameGenerated,

    /// The current frame crossed a whole-second boundary.
    SecondChanged,

    /// The load/play cycle ended. Emitted exactly once per cycle.
    Ended,
}

/// Worker-side handle for publishing frames and notifications.
pub(crate) struct FramePublisher {
    frame_tx: watch::Sender<Option<Frame>>,
    event_tx: mpsc::UnboundedSender<PlaybackEvent>,
}

impl Clone for FramePublisher {
    fn clone(&self) -> Self {
        Self {
            frame_tx: self.frame_tx.clone(),
            event_tx: self.event_tx.clone(),
        }
    }
}

impl FramePublisher {
    /// Replaces the current frame. The slot only ever holds the latest
    /// frame; an absent consumer makes this a no-op.
    pub fn publish(&self, frame: Frame) {
        let _ = self.frame_tx.send(Some(frame));
    }

    /// Emits a notification. Dropped silently when the consumer is gone.
    pub fn notify(&self, event: PlaybackEvent) {
        let _ = self.event_tx.send(event);
    }
}

/// Owning-thread side of the handoff.
pub(crate) struct OutputReceiver {
    pub(crate) frame_rx: watch::Receiver<Option<Frame>>,
    pub(crate) event_rx: mpsc::UnboundedReceiver<PlaybackEvent>,
}

impl OutputReceiver {
    pub fn current_frame(&self) -> Option<Frame> {
        self.frame_rx.borrow().clone()
    }

    pub fn poll_event(&mut self) -> Option<PlaybackEvent> {
        self.event_rx.try_recv().ok()
    }
}

/// Creates the frame slot and notification channel for one load/play cycle.
pub(crate) fn output_channel() -> (FramePublisher, OutputReceiver) {
    let (frame_tx, frame_rx) = watch::channel(None);
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    (
        FramePublisher { frame_tx, event_tx },
        OutputReceiver { frame_rx, event_rx },
    )
}
