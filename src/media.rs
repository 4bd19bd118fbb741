//! FFmpeg-backed [`FrameSource`].
//!
//! [`MediaSource`] keeps one demuxer and one decoder open for its whole
//! lifetime and serves frames by index. Short forward hops are decoded
//! straight through; anything else repositions the stream first. How it
//! repositions is fixed at open time by [`DecodeStrategy`]:
//!
//! - [`DecodeStrategy::Keyframe`] seeks to the nearest keyframe before the
//!   target and decodes forward.
//! - [`DecodeStrategy::Sequential`] reopens the input and decodes from the
//!   first frame. Animated images and inputs that refuse to seek use this.
//!
//! The last converted frame is cached, so sampling the same index twice in a
//! row (slow motion, or a target rate above the source rate) decodes once.
//!
//! # Example
//!
//! ```no_run
//! use gifcut::{FrameSource, MediaSource};
//!
//! let mut source = MediaSource::open("input.mp4")?;
//! let metadata = source.metadata().clone();
//! if let Some(frame) = source.frame_at(metadata.duration_seconds() / 2.0) {
//!     frame.save("middle.png")?;
//! }
//! # Ok::<(), gifcut::GifCutError>(())
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
};

use ffmpeg_next::{
    Error as FfmpegError, Packet, Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};

use crate::error::GifCutError;
use crate::metadata::VideoMetadata;
use crate::probe::{self, ProbedStream};
use crate::source::{FrameBuffer, FrameSource};
use crate::utilities;

/// Forward gaps up to this many frames are decoded through instead of seeking.
const FORWARD_DECODE_LIMIT: u64 = 120;

/// Container formats that are animated images rather than seekable video.
const SEQUENTIAL_FORMATS: &[&str] = &["gif", "apng", "webp_pipe"];

/// How a [`MediaSource`] reaches a frame behind its current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStrategy {
    /// Seek to the nearest earlier keyframe and decode forward.
    Keyframe,
    /// Reopen the input and decode from the start.
    Sequential,
}

struct Scaler {
    format: Pixel,
    width: u32,
    height: u32,
    context: ScalingContext,
}

/// A video file opened for random frame access.
pub struct MediaSource {
    input_context: Input,
    decoder: VideoDecoder,
    scaler: Option<Scaler>,
    stream_index: usize,
    time_base: Rational,
    start_pts: i64,
    metadata: VideoMetadata,
    strategy: DecodeStrategy,
    /// Index of the last frame pulled from the decoder.
    last_decoded: Option<u64>,
    /// Index of the frame decoded before `last_decoded`.
    previous_decoded: Option<u64>,
    cached: Option<(u64, FrameBuffer)>,
    end_of_stream: bool,
    file_path: PathBuf,
}

impl Debug for MediaSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("MediaSource")
            .field("metadata", &self.metadata)
            .field("strategy", &self.strategy)
            .field("stream_index", &self.stream_index)
            .field("last_decoded", &self.last_decoded)
            .field("file_path", &self.file_path)
            .finish_non_exhaustive()
    }
}

impl MediaSource {
    /// Open a file, picking the decode strategy from its container.
    ///
    /// # Errors
    ///
    /// [`GifCutError::FileOpen`] when the path does not exist, cannot be
    /// decoded, has no video stream, or reports zero frames or zero fps.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GifCutError> {
        Self::open_with_strategy(path, None)
    }

    /// Open a file with a forced strategy, or `None` to detect one.
    ///
    /// # Errors
    ///
    /// Same as [`open`](Self::open).
    pub fn open_with_strategy<P: AsRef<Path>>(
        path: P,
        strategy: Option<DecodeStrategy>,
    ) -> Result<Self, GifCutError> {
        let path = path.as_ref();
        let mut input_context = probe::open_input(path)?;
        let ProbedStream {
            metadata,
            stream_index,
            time_base,
            start_pts,
        } = probe::probe_input(&input_context, path)?;

        let strategy = match strategy {
            Some(strategy) => strategy,
            None => detect_strategy(&mut input_context, &metadata),
        };

        let decoder = open_decoder(&input_context, stream_index).map_err(|error| {
            GifCutError::FileOpen {
                path: path.to_path_buf(),
                reason: error.to_string(),
            }
        })?;

        log::info!(
            "Opened {} ({}x{} @ {:.2} fps, {} frames, {:?} decoding)",
            path.display(),
            metadata.width,
            metadata.height,
            metadata.frames_per_second,
            metadata.frame_count,
            strategy,
        );

        Ok(Self {
            input_context,
            decoder,
            scaler: None,
            stream_index,
            time_base,
            start_pts,
            metadata,
            strategy,
            last_decoded: None,
            previous_decoded: None,
            cached: None,
            end_of_stream: false,
            file_path: path.to_path_buf(),
        })
    }

    /// The strategy chosen at open time.
    pub fn strategy(&self) -> DecodeStrategy {
        self.strategy
    }

    /// Path the source was opened from.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn reset_position(&mut self) {
        self.last_decoded = None;
        self.previous_decoded = None;
        self.end_of_stream = false;
    }

    /// Put the decoder at or before `frame_number`.
    fn reposition(&mut self, frame_number: u64) -> Result<(), GifCutError> {
        match self.strategy {
            DecodeStrategy::Keyframe => {
                let target = utilities::frame_number_to_seek_target(
                    frame_number,
                    self.metadata.frames_per_second,
                    self.start_pts,
                    self.time_base,
                );
                log::debug!("Seeking to frame {frame_number} (target {target})");
                self.input_context.seek(target, ..target)?;
                self.decoder.flush();
            }
            DecodeStrategy::Sequential => {
                log::debug!(
                    "Rewinding {} to reach frame {frame_number}",
                    self.file_path.display()
                );
                let input_context = probe::open_input(&self.file_path)?;
                self.decoder = open_decoder(&input_context, self.stream_index)?;
                self.input_context = input_context;
            }
        }
        self.reset_position();
        Ok(())
    }

    fn needs_reposition(&self, frame_number: u64) -> bool {
        match self.last_decoded {
            None => false,
            Some(last) if frame_number <= last => true,
            Some(last) => {
                self.strategy == DecodeStrategy::Keyframe
                    && frame_number - last > FORWARD_DECODE_LIMIT
            }
        }
    }

    /// Pull the next decoded frame, feeding packets as needed.
    fn next_frame(&mut self) -> Result<Option<(u64, VideoFrame)>, GifCutError> {
        loop {
            let mut decoded = VideoFrame::empty();
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                let index = match decoded.timestamp().or_else(|| decoded.pts()) {
                    Some(pts) => utilities::pts_to_frame_number(
                        pts,
                        self.start_pts,
                        self.time_base,
                        self.metadata.frames_per_second,
                    ),
                    None => self.last_decoded.map_or(0, |last| last + 1),
                };
                self.previous_decoded = self.last_decoded;
                self.last_decoded = Some(index);
                return Ok(Some((index, decoded)));
            }

            if self.end_of_stream {
                return Ok(None);
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input_context) {
                Ok(()) => {
                    if packet.stream() != self.stream_index {
                        continue;
                    }
                    if let Err(error) = self.decoder.send_packet(&packet) {
                        log::debug!("Dropping undecodable packet: {error}");
                    }
                }
                Err(FfmpegError::Eof) => {
                    self.decoder.send_eof()?;
                    self.end_of_stream = true;
                }
                Err(error) => return Err(error.into()),
            }
        }
    }

    /// Convert a decoded frame to RGB24 at the source dimensions.
    fn convert(&mut self, decoded: &VideoFrame) -> Result<FrameBuffer, GifCutError> {
        let (format, width, height) = (decoded.format(), decoded.width(), decoded.height());
        let target_width = self.metadata.width;
        let target_height = self.metadata.height;

        let stale = self.scaler.as_ref().is_none_or(|scaler| {
            scaler.format != format || scaler.width != width || scaler.height != height
        });
        if stale {
            let context = ScalingContext::get(
                format,
                width,
                height,
                Pixel::RGB24,
                target_width,
                target_height,
                ScalingFlags::BILINEAR,
            )?;
            self.scaler = Some(Scaler {
                format,
                width,
                height,
                context,
            });
        }

        let mut rgb_frame = VideoFrame::empty();
        if let Some(scaler) = self.scaler.as_mut() {
            scaler.context.run(decoded, &mut rgb_frame)?;
        }

        let buffer = utilities::frame_to_rgb_buffer(&rgb_frame, target_width, target_height);
        FrameBuffer::from_raw(target_width, target_height, buffer).ok_or_else(|| {
            GifCutError::VideoDecodeError(
                "Failed to construct RGB image from decoded frame data".to_string(),
            )
        })
    }

    fn cached_frame(&self, frame_number: u64) -> Option<FrameBuffer> {
        let (index, frame) = self.cached.as_ref()?;
        if *index == frame_number {
            return Some(frame.clone());
        }
        // A request that falls in a timestamp gap before the cached frame.
        let in_gap = *index > frame_number
            && self.last_decoded == Some(*index)
            && self
                .previous_decoded
                .is_some_and(|previous| previous < frame_number);
        in_gap.then(|| frame.clone())
    }
}

impl FrameSource for MediaSource {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn decode_frame(&mut self, frame_number: u64) -> Result<FrameBuffer, GifCutError> {
        let total_frames = self.metadata.frame_count;
        if frame_number >= total_frames {
            return Err(GifCutError::FrameOutOfRange {
                frame_number,
                total_frames,
            });
        }

        if let Some(frame) = self.cached_frame(frame_number) {
            return Ok(frame);
        }

        if self.end_of_stream && self.last_decoded.is_some_and(|last| frame_number > last) {
            return Err(GifCutError::VideoDecodeError(format!(
                "Frame {frame_number} lies past the end of the decoded stream"
            )));
        }

        if self.needs_reposition(frame_number) {
            self.reposition(frame_number)?;
        }

        while let Some((index, decoded)) = self.next_frame()? {
            if index < frame_number {
                continue;
            }
            // A frame past the target stands in for a missing index.
            let frame = self.convert(&decoded)?;
            self.cached = Some((index, frame.clone()));
            return Ok(frame);
        }

        Err(GifCutError::VideoDecodeError(format!(
            "Could not locate frame {frame_number} in the video stream"
        )))
    }
}

impl Drop for MediaSource {
    fn drop(&mut self) {
        log::debug!("Closing {}", self.file_path.display());
    }
}

fn open_decoder(input_context: &Input, stream_index: usize) -> Result<VideoDecoder, GifCutError> {
    let stream = input_context
        .stream(stream_index)
        .ok_or(GifCutError::NoVideoStream)?;
    let decoder_context = CodecContext::from_parameters(stream.parameters())?;
    Ok(decoder_context.decoder().video()?)
}

/// Animated-image containers, and inputs that reject a seek to the start,
/// decode sequentially.
fn detect_strategy(input_context: &mut Input, metadata: &VideoMetadata) -> DecodeStrategy {
    let animated_image = metadata
        .format
        .split(',')
        .any(|name| SEQUENTIAL_FORMATS.contains(&name));
    if animated_image {
        return DecodeStrategy::Sequential;
    }

    match input_context.seek(0, ..0) {
        Ok(()) => DecodeStrategy::Keyframe,
        Err(error) => {
            log::debug!("Input refused a seek ({error}); decoding sequentially");
            DecodeStrategy::Sequential
        }
    }
}
