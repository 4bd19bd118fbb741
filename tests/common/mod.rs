//! Shared helpers for the integration tests: a synthetic frame source and
//! recording observers.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use gifcut::{
    EncodeParameters, FrameBuffer, FrameSource, GifCutError, GifEncoder, ProgressCallback,
    ProgressInfo, VideoMetadata,
};
use image::Rgb;

/// Colour of every pixel of frame `frame_number`.
pub fn pattern_pixel(frame_number: u64) -> Rgb<u8> {
    Rgb([
        (frame_number % 256) as u8,
        (frame_number / 256 % 256) as u8,
        128,
    ])
}

/// Frames filled with [`pattern_pixel`], so every decoded frame says which
/// index it came from.
pub struct PatternSource {
    metadata: VideoMetadata,
    failing: HashSet<u64>,
    odd_shapes: HashMap<u64, (u32, u32)>,
    delay: Option<Duration>,
    decodes: usize,
}

impl PatternSource {
    pub fn new(width: u32, height: u32, fps: f64, frame_count: u64) -> Self {
        Self {
            metadata: VideoMetadata::new(width, height, fps, frame_count)
                .with_names("pattern", "synthetic"),
            failing: HashSet::new(),
            odd_shapes: HashMap::new(),
            delay: None,
            decodes: 0,
        }
    }

    /// 8x8 frames, 30 fps, ten seconds.
    pub fn small() -> Self {
        Self::new(8, 8, 30.0, 300)
    }

    pub fn with_failing(mut self, frames: impl IntoIterator<Item = u64>) -> Self {
        self.failing.extend(frames);
        self
    }

    pub fn with_odd_shape(mut self, frame_number: u64, width: u32, height: u32) -> Self {
        self.odd_shapes.insert(frame_number, (width, height));
        self
    }

    pub fn with_decode_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn decode_count(&self) -> usize {
        self.decodes
    }
}

impl FrameSource for PatternSource {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn decode_frame(&mut self, frame_number: u64) -> Result<FrameBuffer, GifCutError> {
        self.decodes += 1;
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if frame_number >= self.metadata.frame_count {
            return Err(GifCutError::FrameOutOfRange {
                frame_number,
                total_frames: self.metadata.frame_count,
            });
        }
        if self.failing.contains(&frame_number) {
            return Err(GifCutError::VideoDecodeError(format!(
                "synthetic failure at frame {frame_number}"
            )));
        }
        let (width, height) = self
            .odd_shapes
            .get(&frame_number)
            .copied()
            .unwrap_or((self.metadata.width, self.metadata.height));
        Ok(FrameBuffer::from_pixel(
            width,
            height,
            pattern_pixel(frame_number),
        ))
    }
}

/// Records every progress update.
#[derive(Default)]
pub struct RecordingProgress {
    pub infos: Mutex<Vec<ProgressInfo>>,
}

impl RecordingProgress {
    pub fn percentages(&self) -> Vec<u8> {
        self.infos
            .lock()
            .unwrap()
            .iter()
            .map(|info| info.percentage)
            .collect()
    }
}

impl ProgressCallback for RecordingProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.infos.lock().unwrap().push(info.clone());
    }
}

/// One call to [`RecordingEncoder::write_frames`].
#[derive(Debug, Clone)]
pub struct EncodeCall {
    pub path: PathBuf,
    pub frame_count: usize,
    pub parameters: EncodeParameters,
}

/// Accepts frames without writing anything.
#[derive(Default)]
pub struct RecordingEncoder {
    pub calls: Mutex<Vec<EncodeCall>>,
}

impl RecordingEncoder {
    pub fn last_call(&self) -> Option<EncodeCall> {
        self.calls.lock().unwrap().last().cloned()
    }
}

impl GifEncoder for RecordingEncoder {
    fn write_frames(
        &self,
        path: &Path,
        frames: &[FrameBuffer],
        parameters: &EncodeParameters,
    ) -> Result<(), GifCutError> {
        self.calls.lock().unwrap().push(EncodeCall {
            path: path.to_path_buf(),
            frame_count: frames.len(),
            parameters: *parameters,
        });
        Ok(())
    }
}

/// Rejects every frame sequence.
pub struct RejectingEncoder;

impl GifEncoder for RejectingEncoder {
    fn write_frames(
        &self,
        _path: &Path,
        _frames: &[FrameBuffer],
        _parameters: &EncodeParameters,
    ) -> Result<(), GifCutError> {
        Err(GifCutError::GifEncodeError("rejected".to_string()))
    }
}
