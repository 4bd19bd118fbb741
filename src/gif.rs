//! Animated GIF output.
//!
//! [`GifEncoder`] is the boundary the assembler hands frames across.
//! [`GifWriter`] implements it with the `gif` crate: each frame gets its own
//! NeuQuant palette, frame delays are distributed in centiseconds so the
//! total running time tracks `frames / fps`, and the file is written to a
//! temporary sibling and renamed into place only once encoding succeeded.
//!
//! # Example
//!
//! ```no_run
//! use gifcut::{EncodeParameters, FrameBuffer, GifEncoder, GifWriter};
//!
//! let frames = vec![FrameBuffer::new(64, 36); 10];
//! let parameters = EncodeParameters::new(10.0, 10, 0);
//! GifWriter::new().write_frames("out.gif".as_ref(), &frames, &parameters)?;
//! # Ok::<(), gifcut::GifCutError>(())
//! ```

use std::io::{BufWriter, Write};
use std::path::Path;

use ::gif::{Encoder, Frame, Repeat};
use tempfile::NamedTempFile;

use crate::configuration::OutputSpec;
use crate::error::GifCutError;
use crate::source::FrameBuffer;

/// What the encoder needs beyond the frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodeParameters {
    /// Playback frames per second.
    pub fps: f64,
    /// 0 (best) to 100 (most lossy).
    pub quantization_level: u8,
    /// 0 loops forever, 1 plays once.
    pub loop_flag: u8,
}

impl EncodeParameters {
    /// Bundle the three values.
    pub fn new(fps: f64, quantization_level: u8, loop_flag: u8) -> Self {
        Self {
            fps,
            quantization_level,
            loop_flag,
        }
    }

    /// Derive quantization and looping from a spec, with the playback rate
    /// chosen by the caller.
    pub fn from_spec(spec: &OutputSpec, fps: f64) -> Self {
        Self::new(fps, spec.quantization_level(), spec.loop_flag())
    }

    /// `true` when the loop flag asks for endless looping.
    pub fn loops_forever(&self) -> bool {
        self.loop_flag == 0
    }
}

/// Writes an ordered frame sequence to an animated image file.
pub trait GifEncoder: Send + Sync {
    /// Persist `frames` at `path`.
    ///
    /// # Errors
    ///
    /// [`GifCutError::GifEncodeError`] if the frames or parameters are
    /// rejected, or [`GifCutError::IoError`] if the file cannot be written.
    fn write_frames(
        &self,
        path: &Path,
        frames: &[FrameBuffer],
        parameters: &EncodeParameters,
    ) -> Result<(), GifCutError>;
}

/// [`GifEncoder`] backed by the `gif` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct GifWriter;

impl GifWriter {
    /// Create a writer.
    pub fn new() -> Self {
        Self
    }

    /// Encode into memory and return the GIF bytes.
    ///
    /// # Errors
    ///
    /// Same as [`GifEncoder::write_frames`], minus file I/O.
    pub fn encode_to_memory(
        &self,
        frames: &[FrameBuffer],
        parameters: &EncodeParameters,
    ) -> Result<Vec<u8>, GifCutError> {
        let mut buffer = Vec::new();
        encode(&mut buffer, frames, parameters)?;
        Ok(buffer)
    }
}

impl GifEncoder for GifWriter {
    fn write_frames(
        &self,
        path: &Path,
        frames: &[FrameBuffer],
        parameters: &EncodeParameters,
    ) -> Result<(), GifCutError> {
        log::debug!(
            "Encoding {} frame(s) to {} at {:.3} fps (quantization {}, loop flag {})",
            frames.len(),
            path.display(),
            parameters.fps,
            parameters.quantization_level,
            parameters.loop_flag,
        );

        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temporary = NamedTempFile::new_in(directory)?;
        {
            let mut writer = BufWriter::new(temporary.as_file_mut());
            encode(&mut writer, frames, parameters)?;
            writer.flush()?;
        }
        temporary.persist(path).map_err(|error| error.error)?;
        Ok(())
    }
}

/// NeuQuant sampling speed for a quantization level: 1 at level 0, 30 at 100.
pub fn neuquant_speed(quantization_level: u8) -> i32 {
    1 + i32::from(quantization_level.min(100)) * 29 / 100
}

/// Per-frame delays in centiseconds.
///
/// Rounding error carries over from frame to frame so the total stays close
/// to `count / fps` seconds. Every delay is at least one centisecond.
pub fn frame_delays(count: usize, fps: f64) -> Vec<u16> {
    let centiseconds_per_frame = if fps > 0.0 && fps.is_finite() {
        100.0 / fps
    } else {
        10.0
    };

    let mut elapsed: u64 = 0;
    (1..=count)
        .map(|index| {
            let target = (index as f64 * centiseconds_per_frame).round() as u64;
            let delay = target.saturating_sub(elapsed).max(1);
            elapsed += delay;
            delay.min(u64::from(u16::MAX)) as u16
        })
        .collect()
}

fn gif_side(value: u32, width: u32, height: u32) -> Result<u16, GifCutError> {
    u16::try_from(value)
        .ok()
        .filter(|side| *side > 0)
        .ok_or(GifCutError::InvalidDimensions { width, height })
}

fn encode<W: Write>(
    writer: W,
    frames: &[FrameBuffer],
    parameters: &EncodeParameters,
) -> Result<(), GifCutError> {
    let first = frames
        .first()
        .ok_or_else(|| GifCutError::GifEncodeError("No frames to encode".to_string()))?;
    let (width, height) = first.dimensions();
    let gif_width = gif_side(width, width, height)?;
    let gif_height = gif_side(height, width, height)?;

    if let Some((index, frame)) = frames
        .iter()
        .enumerate()
        .find(|(_, frame)| frame.dimensions() != (width, height))
    {
        return Err(GifCutError::GifEncodeError(format!(
            "Frame {index} is {}x{}, expected {width}x{height}",
            frame.width(),
            frame.height(),
        )));
    }

    let mut encoder = Encoder::new(writer, gif_width, gif_height, &[]).map_err(|e| {
        GifCutError::GifEncodeError(format!("Failed to create GIF encoder: {e}"))
    })?;

    if parameters.loops_forever() {
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| GifCutError::GifEncodeError(format!("Failed to set GIF repeat: {e}")))?;
    }

    let speed = neuquant_speed(parameters.quantization_level);
    let delays = frame_delays(frames.len(), parameters.fps);

    for (frame, delay) in frames.iter().zip(delays) {
        let mut gif_frame = Frame::from_rgb_speed(gif_width, gif_height, frame.as_raw(), speed);
        gif_frame.delay = delay;
        encoder.write_frame(&gif_frame).map_err(|e| {
            GifCutError::GifEncodeError(format!("Failed to write GIF frame: {e}"))
        })?;
    }

    encoder
        .into_inner()
        .map_err(|e| GifCutError::GifEncodeError(format!("Failed to finish GIF: {e}")))?;
    Ok(())
}
