// SPDX-License-Identifier: MPL-2.0
//! `playhead` is a paced video playback engine: a background decode loop that
//! feeds timed frames to a display surface inside an interactive application.
//!
//! The engine is split along its natural seams:
//!
//! - [`PlaybackSession`] is the externally callable surface: `load`, `play`,
//!   `pause`, `stop`, `seek` and non-blocking queries. It owns the worker's
//!   lifecycle and runs on the owning (UI) thread.
//! - The decode worker runs on its own thread for the lifetime of one
//!   load/play cycle, consuming a [`DecodeSource`] and pacing output to the
//!   nominal frame rate.
//! - [`ControlSignals`] is the only mutable state shared between the owning
//!   thread and the worker: atomic pause/stop/seek flags the worker polls.
//!   Control requests become visible within the worker's poll interval,
//!   which bounds responsiveness at well under 10 ms.
//! - Decoded frames cross back over a capacity-one, latest-frame-wins slot;
//!   payload-free [`PlaybackEvent`] notifications are drained by the host's
//!   event loop.
//!
//! Audio, network streaming, multi-track selection and hardware decode are
//! out of scope; the engine assumes a single video track and one consumer.

pub mod error;
mod frame;
mod publisher;
mod seek;
mod session;
mod signals;
pub mod sizing;
pub mod source;
mod state;
#[cfg(test)]
mod test_utils;
mod worker;

pub use error::{PlaybackError, Result};
pub use frame::{Frame, StreamInfo};
pub use publisher::PlaybackEvent;
pub use session::PlaybackSession;
pub use signals::ControlSignals;
pub use sizing::fit_display_size;
pub use source::{init_ffmpeg, DecodeSource, FfmpegSource, SourceFrame};
pub use state::PlaybackState;
