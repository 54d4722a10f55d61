// SPDX-License-Identifier: MPL-2.0
//! The decode loop: one dedicated thread per load/play cycle.
//!
//! The worker opens its decode source, publishes stream info and a
//! placeholder frame, then enters the pacing loop. Each iteration services a
//! pending seek first, then the pause flag, then decodes, publishes and
//! paces one frame. The loop exits on a stop request, end of stream, or a
//! decode-layer error; the shared cleanup routine runs on every exit path
//! and the `Ended` notification fires at most once per cycle.

use crate::error::{PlaybackError, Result};
use crate::frame::Frame;
use crate::publisher::{FramePublisher, PlaybackEvent};
use crate::seek::seek_to_target;
use crate::sizing::fit_display_size;
use crate::source::DecodeSource;
use crate::state::SharedState;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Sleep applied while paused. Keeps resume latency sub-millisecond without
/// burning a core.
const PAUSE_POLL: Duration = Duration::from_micros(100);

pub(crate) type SourceOpener = Box<dyn FnOnce() -> Result<Box<dyn DecodeSource>> + Send>;

/// Spawns the decode thread for one cycle. `SharedState::begin_cycle` must
/// already have run on the calling thread.
pub(crate) fn spawn(
    shared: Arc<SharedState>,
    publisher: FramePublisher,
    opener: SourceOpener,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        if let Err(e) = decode_cycle(&shared, &publisher, opener) {
            tracing::warn!(error = %e, "decode cycle ended with error");
        }
        if shared.finish_cycle() {
            publisher.notify(PlaybackEvent::Ended);
        }
    })
}

fn decode_cycle(
    shared: &SharedState,
    publisher: &FramePublisher,
    opener: SourceOpener,
) -> Result<()> {
    let mut source = opener()?;
    let info = source.stream_info();
    if !info.frame_rate_hz.is_finite() || info.frame_rate_hz <= 0.0 {
        return Err(PlaybackError::NotAVideo(
            "frame rate unobtainable".to_string(),
        ));
    }

    shared.set_stream(info.clone(), source.metadata());
    publisher.notify(PlaybackEvent::Loaded);
    if info.duration_secs.is_some() {
        publisher.notify(PlaybackEvent::DurationKnown);
    }

    // Before any real frame decodes, the consumer gets a transparent
    // placeholder at the display size so it always has something to render.
    if shared.display_size() == (0, 0) {
        shared.set_display_size(info.width, info.height);
    }
    let (placeholder_width, placeholder_height) = shared.display_size();
    publisher.publish(Frame::placeholder(placeholder_width, placeholder_height));

    let period = Duration::from_secs_f64(1.0 / info.frame_rate_hz);
    let nominal_rate = info.nominal_rate();

    while !shared.signals.should_stop() {
        // A seek supersedes normal pacing for this tick.
        if let Some(target_secs) = shared.signals.take_seek() {
            let output_size = output_size(shared, &info);
            if let Some(frame) = seek_to_target(source.as_mut(), &info, target_secs, output_size)? {
                shared.record_position(frame.pts_secs);
                publisher.publish(frame);
                publisher.notify(PlaybackEvent::FrameGenerated);
            }
            continue;
        }

        // Pausing halts frame production but never the thread, so resuming
        // is instant.
        if shared.signals.is_paused() {
            thread::sleep(PAUSE_POLL);
            continue;
        }

        let frame_started = Instant::now();
        let output_size = output_size(shared, &info);
        match source.decode_next(output_size) {
            Ok(Some(raw)) => {
                let frame_number = info.frame_number_at(raw.pts_secs);
                shared.record_position(raw.pts_secs);
                publisher.publish(Frame {
                    frame_number,
                    rgba: Arc::new(raw.rgba),
                    width: raw.width,
                    height: raw.height,
                    pts_secs: raw.pts_secs,
                });
                publisher.notify(PlaybackEvent::FrameGenerated);
                if frame_number % nominal_rate == 0 {
                    publisher.notify(PlaybackEvent::SecondChanged);
                }

                if shared.consistent_frame_rate() {
                    // Pace output to the nominal rate. When decode fell
                    // behind there is nothing left of the period: the sleep
                    // is skipped entirely and no frames are dropped to
                    // catch up.
                    let wait = period.saturating_sub(frame_started.elapsed());
                    if !wait.is_zero() {
                        thread::sleep(wait);
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "decode failed, ending playback");
                break;
            }
        }
    }

    Ok(())
}

fn output_size(shared: &SharedState, info: &crate::frame::StreamInfo) -> (u32, u32) {
    fit_display_size(
        info.intrinsic_size(),
        shared.display_size(),
        shared.keep_aspect(),
    )
}
