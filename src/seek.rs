// SPDX-License-Identifier: MPL-2.0
//! Seek engine: coarse backward seek, then forward decode to the target.

use crate::error::Result;
use crate::frame::{Frame, StreamInfo};
use crate::source::DecodeSource;
use std::sync::Arc;

/// Seeks to `target_secs` and decodes forward until the first frame whose
/// timestamp is at or past the target.
///
/// The backward keyframe seek guarantees the target frame stays reachable;
/// frames decoded on the way are discarded. Reaching end of stream first is
/// not a failure: the seek clamps to the last decodable frame. `Ok(None)`
/// means the stream yielded no frame at all.
pub(crate) fn seek_to_target(
    source: &mut dyn DecodeSource,
    info: &StreamInfo,
    target_secs: f64,
    output_size: (u32, u32),
) -> Result<Option<Frame>> {
    source.seek(target_secs)?;

    let mut last = None;
    loop {
        match source.decode_next(output_size)? {
            Some(frame) => {
                let reached = frame.pts_secs >= target_secs;
                last = Some(frame);
                if reached {
                    break;
                }
            }
            None => break,
        }
    }

    Ok(last.map(|raw| Frame {
        frame_number: info.frame_number_at(raw.pts_secs),
        rgba: Arc::new(raw.rgba),
        width: raw.width,
        height: raw.height,
        pts_secs: raw.pts_secs,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeSource;

    #[test]
    fn seek_lands_on_first_frame_at_or_past_target() {
        // 30 fps, 90 frames, keyframe every 10th frame.
        let mut source = FakeSource::new(30.0, 90);
        let info = source.stream_info();

        let frame = seek_to_target(&mut source, &info, 1.0, (64, 48))
            .expect("seek succeeds")
            .expect("frame found");

        assert!(frame.pts_secs >= 1.0);
        assert_eq!(frame.frame_number, 30);
        assert_eq!(
            frame.frame_number,
            (info.frame_rate_hz * frame.pts_secs).floor() as u64
        );
    }

    #[test]
    fn seek_between_keyframes_discards_leading_frames() {
        let mut source = FakeSource::new(30.0, 90);
        let info = source.stream_info();

        // Target sits mid-GOP; the engine must roll forward from frame 30.
        let frame = seek_to_target(&mut source, &info, 1.2, (64, 48))
            .expect("seek succeeds")
            .expect("frame found");

        assert_eq!(frame.frame_number, 36);
    }

    #[test]
    fn seek_past_end_clamps_to_last_frame() {
        let mut source = FakeSource::new(30.0, 60);
        let info = source.stream_info();

        let frame = seek_to_target(&mut source, &info, 100.0, (64, 48))
            .expect("seek succeeds")
            .expect("frame found");

        assert_eq!(frame.frame_number, 59);
    }

    #[test]
    fn seek_on_empty_stream_yields_nothing() {
        let mut source = FakeSource::new(30.0, 0);
        let info = source.stream_info();

        let frame = seek_to_target(&mut source, &info, 1.0, (64, 48)).expect("seek succeeds");
        assert!(frame.is_none());
    }

    #[test]
    fn seek_to_zero_yields_first_frame() {
        let mut source = FakeSource::new(25.0, 50);
        let info = source.stream_info();

        let frame = seek_to_target(&mut source, &info, 0.0, (64, 48))
            .expect("seek succeeds")
            .expect("frame found");

        assert_eq!(frame.frame_number, 0);
        assert_eq!(frame.pts_secs, 0.0);
    }
}
