//! Format-agnostic metadata probing.
//!
//! Container video and animated images report their timing differently:
//! GIF streams rarely carry a frame count, and some containers leave the
//! average frame rate unset. The probe walks a chain of fallbacks so every
//! input ends up with a positive frame rate and frame count, or is rejected.
//!
//! # Example
//!
//! ```no_run
//! use gifcut::MediaProbe;
//!
//! let metadata = MediaProbe::probe("clip.gif")?;
//! println!("{}x{} @ {:.2} fps", metadata.width, metadata.height, metadata.frames_per_second);
//! # Ok::<(), gifcut::GifCutError>(())
//! ```

use std::path::Path;

use ffmpeg_next::{
    Rational, codec::context::Context as CodecContext, format::context::Input, media::Type,
};

use crate::error::GifCutError;
use crate::metadata::VideoMetadata;
use crate::utilities::{AV_TIME_BASE, NO_PTS, positive_rate, pts_to_seconds};

/// Stream facts a decoder needs beyond the public metadata.
#[derive(Debug, Clone)]
pub(crate) struct ProbedStream {
    pub(crate) metadata: VideoMetadata,
    pub(crate) stream_index: usize,
    pub(crate) time_base: Rational,
    pub(crate) start_pts: i64,
}

/// Metadata probe that closes the file as soon as it has read it.
pub struct MediaProbe;

impl MediaProbe {
    /// Open `path`, read its video metadata, and close it.
    ///
    /// # Errors
    ///
    /// [`GifCutError::FileOpen`] if the file is missing, undecodable, or
    /// reports no usable frame rate or frame count.
    pub fn probe<P: AsRef<Path>>(path: P) -> Result<VideoMetadata, GifCutError> {
        let path = path.as_ref();
        let input = open_input(path)?;
        Ok(probe_input(&input, path)?.metadata)
    }

    /// Probe several files. Failures are reported per file.
    pub fn probe_many<P: AsRef<Path>>(paths: &[P]) -> Vec<Result<VideoMetadata, GifCutError>> {
        paths.iter().map(|path| Self::probe(path)).collect()
    }
}

fn open_failure(path: &Path, reason: impl Into<String>) -> GifCutError {
    GifCutError::FileOpen {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Initialise FFmpeg and open the demuxer.
pub(crate) fn open_input(path: &Path) -> Result<Input, GifCutError> {
    if !path.exists() {
        return Err(open_failure(path, "file does not exist"));
    }

    ffmpeg_next::init()
        .map_err(|error| open_failure(path, format!("FFmpeg initialisation failed: {error}")))?;

    ffmpeg_next::format::input(&path).map_err(|error| open_failure(path, error.to_string()))
}

/// Read the best video stream's metadata from an opened input.
pub(crate) fn probe_input(input: &Input, path: &Path) -> Result<ProbedStream, GifCutError> {
    let stream = input
        .streams()
        .best(Type::Video)
        .ok_or_else(|| open_failure(path, "no video stream"))?;

    let time_base = stream.time_base();
    let start_pts = match stream.start_time() {
        NO_PTS => 0,
        start => start,
    };

    let decoder = CodecContext::from_parameters(stream.parameters())
        .and_then(|context| context.decoder().video())
        .map_err(|error| open_failure(path, format!("Failed to create video decoder: {error}")))?;

    let width = decoder.width();
    let height = decoder.height();
    if width == 0 || height == 0 {
        return Err(open_failure(path, "decoder reports zero frame dimensions"));
    }

    let stream_seconds = match stream.duration() {
        duration if duration > 0 => pts_to_seconds(duration, time_base),
        _ => 0.0,
    };
    let container_seconds = match input.duration() {
        duration if duration > 0 => duration as f64 / AV_TIME_BASE,
        _ => 0.0,
    };
    let seconds = if stream_seconds > 0.0 {
        stream_seconds
    } else {
        container_seconds
    };
    let declared_frames = u64::try_from(stream.frames()).unwrap_or(0);

    let frames_per_second = positive_rate(stream.avg_frame_rate())
        .or_else(|| positive_rate(stream.rate()))
        .or_else(|| {
            (declared_frames > 0 && seconds > 0.0).then(|| declared_frames as f64 / seconds)
        })
        .ok_or_else(|| open_failure(path, "stream reports no frame rate"))?;

    let frame_count = if declared_frames > 0 {
        declared_frames
    } else {
        (seconds * frames_per_second).round() as u64
    };
    if frame_count == 0 {
        return Err(open_failure(path, "stream reports zero frames"));
    }

    let codec = decoder
        .codec()
        .map(|codec| codec.name().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let format = input.format().name().to_string();

    log::debug!(
        "Probed {}: {width}x{height}, {frames_per_second:.3} fps, {frame_count} frames, codec {codec}, format {format}",
        path.display(),
    );

    Ok(ProbedStream {
        metadata: VideoMetadata::new(width, height, frames_per_second, frame_count)
            .with_names(codec, format),
        stream_index: stream.index(),
        time_base,
        start_pts,
    })
}
