// SPDX-License-Identifier: MPL-2.0
//! Decode source adapter: the seam between the playback engine and FFmpeg.
//!
//! The worker and seek engine only see the [`DecodeSource`] trait, so they
//! can be exercised with scripted sources in tests. [`FfmpegSource`] is the
//! production implementation on top of `ffmpeg-next`.

use crate::error::{PlaybackError, Result};
use crate::frame::StreamInfo;
use ffmpeg_next::util::error::EAGAIN;
use std::path::Path;
use std::sync::Once;

/// A frame as produced by a decode source: RGBA pixels at the requested
/// output size plus its presentation timestamp.
#[derive(Debug, Clone)]
pub struct SourceFrame {
    /// RGBA pixel data (`width * height * 4` bytes).
    pub rgba: Vec<u8>,

    /// Output width in pixels.
    pub width: u32,

    /// Output height in pixels.
    pub height: u32,

    /// Presentation timestamp in seconds.
    pub pts_secs: f64,
}

/// Sequential frame decoding plus random-access backward seeking, as
/// required by the decode worker.
pub trait DecodeSource {
    /// Stream description computed at open time.
    fn stream_info(&self) -> StreamInfo;

    /// Container-level key/value tags.
    fn metadata(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Decodes the next frame, rescaled and converted to RGBA at
    /// `output_size`. Returns `Ok(None)` at end of stream.
    fn decode_next(&mut self, output_size: (u32, u32)) -> Result<Option<SourceFrame>>;

    /// Coarse backward seek to the nearest keyframe at or before
    /// `target_secs`, so the exact target stays reachable by forward decode.
    fn seek(&mut self, target_secs: f64) -> Result<()>;
}

static FFMPEG_INIT: Once = Once::new();

/// Initialize FFmpeg with the libav log level forced down to ERROR.
///
/// Safe to call multiple times; initialization happens once.
pub fn init_ffmpeg() -> Result<()> {
    let mut init_result: Result<()> = Ok(());

    FFMPEG_INIT.call_once(|| {
        if let Err(e) = ffmpeg_next::init() {
            init_result = Err(PlaybackError::Decode(format!(
                "FFmpeg initialization failed: {e}"
            )));
            return;
        }

        // SAFETY: av_log_set_level is thread-safe and only affects logging.
        unsafe {
            ffmpeg_next::ffi::av_log_set_level(ffmpeg_next::ffi::AV_LOG_ERROR);
        }
    });

    init_result
}

struct Scaler {
    ctx: ffmpeg_next::software::scaling::Context,
    input_key: (ffmpeg_next::format::Pixel, u32, u32),
    output_size: (u32, u32),
}

/// FFmpeg-backed decode source for a single video stream.
pub struct FfmpegSource {
    input: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    stream_index: usize,
    info: StreamInfo,
    tags: Vec<(String, String)>,
    /// Rebuilt whenever the input geometry or requested output size changes.
    scaler: Option<Scaler>,
    /// True once `send_eof` has been issued; reset by `seek`.
    flushed: bool,
}

impl FfmpegSource {
    /// Opens `path` and prepares a decoder for its best video stream.
    ///
    /// The demuxer is configured to discard corrupt packets rather than fail
    /// the stream, and fast seek stays off so seeks trade speed for
    /// accuracy. Decoding uses FFmpeg's automatic frame threading.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        init_ffmpeg()?;

        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(PlaybackError::NotFound(path.display().to_string()));
        }

        let mut input = ffmpeg_next::format::input(&path).map_err(|e| {
            PlaybackError::NotAVideo(format!("failed to open {}: {e}", path.display()))
        })?;

        // SAFETY: only toggles a demuxer flag, same pattern as
        // av_log_set_level above.
        unsafe {
            (*input.as_mut_ptr()).flags |= ffmpeg_next::ffi::AVFMT_FLAG_DISCARD_CORRUPT;
        }

        let (stream_index, info, decoder) = {
            let stream = input
                .streams()
                .best(ffmpeg_next::media::Type::Video)
                .ok_or_else(|| PlaybackError::NotAVideo("no video stream".to_string()))?;

            let time_base = stream.time_base();
            let rate = stream.avg_frame_rate();
            let frame_rate_hz = if rate.denominator() == 0 {
                0.0
            } else {
                f64::from(rate.numerator()) / f64::from(rate.denominator())
            };
            if !frame_rate_hz.is_finite() || frame_rate_hz <= 0.0 {
                return Err(PlaybackError::NotAVideo(
                    "frame rate unobtainable".to_string(),
                ));
            }

            let duration_secs = if stream.duration() > 0 {
                Some(
                    stream.duration() as f64 * f64::from(time_base.numerator())
                        / f64::from(time_base.denominator()),
                )
            } else if input.duration() > 0 {
                Some(input.duration() as f64 / f64::from(ffmpeg_next::ffi::AV_TIME_BASE))
            } else {
                None
            };

            let mut codec_ctx =
                ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
                    .map_err(|e| {
                        PlaybackError::Decode(format!("failed to create codec context: {e}"))
                    })?;

            // Let FFmpeg pick its own decode thread count.
            let mut threading = ffmpeg_next::codec::threading::Config::default();
            threading.kind = ffmpeg_next::codec::threading::Type::Frame;
            threading.count = 0;
            codec_ctx.set_threading(threading);

            let decoder = codec_ctx.decoder().video().map_err(|e| {
                PlaybackError::Decode(format!("failed to create video decoder: {e}"))
            })?;

            if decoder.width() == 0 || decoder.height() == 0 {
                return Err(PlaybackError::NotAVideo(format!(
                    "invalid video dimensions: {}x{}",
                    decoder.width(),
                    decoder.height()
                )));
            }

            let info = StreamInfo {
                duration_secs,
                frame_rate_hz,
                width: decoder.width(),
                height: decoder.height(),
                time_base: (time_base.numerator(), time_base.denominator()),
            };

            (stream.index(), info, decoder)
        };

        let tags = input
            .metadata()
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();

        Ok(Self {
            input,
            decoder,
            stream_index,
            info,
            tags,
            scaler: None,
            flushed: false,
        })
    }

    /// Feeds the next packet of our stream into the decoder, or `send_eof`
    /// when the demuxer runs out. Undecodable packets are logged and
    /// discarded rather than failing the stream.
    fn feed_packet(&mut self) {
        loop {
            let packet = self
                .input
                .packets()
                .find_map(|(stream, packet)| (stream.index() == self.stream_index).then(|| packet));

            match packet {
                Some(packet) => match self.decoder.send_packet(&packet) {
                    Ok(()) => return,
                    Err(e) => {
                        tracing::debug!(error = %e, "discarding undecodable packet");
                    }
                },
                None => {
                    if !self.flushed {
                        self.flushed = true;
                        let _ = self.decoder.send_eof();
                    }
                    return;
                }
            }
        }
    }

    /// Converts a decoded frame to RGBA at `output_size`, handling stride.
    fn convert(
        &mut self,
        decoded: &ffmpeg_next::frame::Video,
        output_size: (u32, u32),
    ) -> Result<SourceFrame> {
        let input_key = (decoded.format(), decoded.width(), decoded.height());
        let output_size = (output_size.0.max(1), output_size.1.max(1));

        let scaler = match &mut self.scaler {
            Some(scaler) if scaler.input_key == input_key && scaler.output_size == output_size => {
                scaler
            }
            slot => {
                let ctx = ffmpeg_next::software::scaling::Context::get(
                    input_key.0,
                    input_key.1,
                    input_key.2,
                    ffmpeg_next::format::Pixel::RGBA,
                    output_size.0,
                    output_size.1,
                    ffmpeg_next::software::scaling::Flags::FAST_BILINEAR,
                )
                .map_err(|e| PlaybackError::Decode(format!("failed to create scaler: {e}")))?;
                slot.insert(Scaler {
                    ctx,
                    input_key,
                    output_size,
                })
            }
        };

        let mut rgba_frame = ffmpeg_next::frame::Video::empty();
        scaler
            .ctx
            .run(decoded, &mut rgba_frame)
            .map_err(|e| PlaybackError::Decode(format!("failed to scale frame: {e}")))?;

        let width = rgba_frame.width();
        let height = rgba_frame.height();
        let data = rgba_frame.data(0);
        let stride = rgba_frame.stride(0);

        let mut rgba = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            let row_start = y as usize * stride;
            let row_end = row_start + (width * 4) as usize;
            rgba.extend_from_slice(&data[row_start..row_end]);
        }

        let time_base = self.info.time_base;
        let pts = decoded.timestamp().unwrap_or(0);
        let pts_secs = pts as f64 * f64::from(time_base.0) / f64::from(time_base.1);

        Ok(SourceFrame {
            rgba,
            width,
            height,
            pts_secs,
        })
    }
}

impl DecodeSource for FfmpegSource {
    fn stream_info(&self) -> StreamInfo {
        self.info.clone()
    }

    fn metadata(&self) -> Vec<(String, String)> {
        self.tags.clone()
    }

    fn decode_next(&mut self, output_size: (u32, u32)) -> Result<Option<SourceFrame>> {
        loop {
            let mut decoded = ffmpeg_next::frame::Video::empty();
            match self.decoder.receive_frame(&mut decoded) {
                Ok(()) => return Ok(Some(self.convert(&decoded, output_size)?)),
                Err(ffmpeg_next::Error::Other { errno: EAGAIN }) => {
                    // Decoder wants more input.
                    if self.flushed {
                        return Ok(None);
                    }
                    self.feed_packet();
                }
                Err(ffmpeg_next::Error::Eof) => return Ok(None),
                Err(e) => {
                    return Err(PlaybackError::Decode(format!(
                        "failed to receive frame: {e}"
                    )))
                }
            }
        }
    }

    fn seek(&mut self, target_secs: f64) -> Result<()> {
        let timestamp =
            (target_secs.max(0.0) * f64::from(ffmpeg_next::ffi::AV_TIME_BASE)) as i64;
        // Range up to `timestamp` keeps the seek backward-only, landing on a
        // keyframe at or before the target.
        self.input
            .seek(timestamp, ..timestamp)
            .map_err(|e| PlaybackError::Decode(format!("seek failed: {e}")))?;
        self.decoder.flush();
        self.flushed = false;
        Ok(())
    }
}
