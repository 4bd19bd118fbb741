//! Per-segment frame sampling.
//!
//! Speed changes are realised by how densely the source timeline is sampled,
//! never by decoding every frame and dropping or duplicating. A segment of
//! `d` seconds yields `floor(d * target_fps / speed)` samples spaced
//! `d / count` seconds apart.
//!
//! # Example
//!
//! ```
//! use gifcut::sample_plan;
//!
//! let plan = sample_plan(10.0, 30.0, 10.0, 2.0);
//! assert_eq!(plan.len(), 50);
//! assert!((plan.time_step() - 0.2).abs() < 1e-12);
//! ```

/// Absorbs floating-point error before flooring, so `0.3 * 10.0` counts as
/// three samples rather than two.
const SAMPLE_EPSILON: f64 = 1e-9;

/// Ordered sample offsets, relative to the start of one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplePlan {
    offsets: Vec<f64>,
    time_step: f64,
    source_fps: f64,
}

impl SamplePlan {
    fn empty(source_fps: f64) -> Self {
        Self {
            offsets: Vec::new(),
            time_step: 0.0,
            source_fps,
        }
    }

    /// Offsets in seconds, each in `[0, segment_duration)`.
    pub fn offsets(&self) -> &[f64] {
        &self.offsets
    }

    /// Spacing between consecutive offsets. Zero for an empty plan.
    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// `true` if the segment contributes nothing.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Absolute source times for a segment starting at `segment_start`.
    pub fn timestamps(&self, segment_start: f64) -> impl Iterator<Item = f64> + '_ {
        self.offsets.iter().map(move |offset| segment_start + offset)
    }

    /// Nearest source frame index for each sample. Not clamped to the
    /// source's frame count.
    pub fn frame_numbers(&self, segment_start: f64) -> Vec<u64> {
        self.timestamps(segment_start)
            .map(|seconds| (seconds * self.source_fps).round().max(0.0) as u64)
            .collect()
    }
}

/// Number of output frames a segment contributes.
///
/// The caller validates `speed_factor > 0`; a non-positive or non-finite
/// product yields zero.
pub fn output_frame_count(segment_duration: f64, target_fps: f64, speed_factor: f64) -> usize {
    let raw = segment_duration * target_fps / speed_factor;
    if !raw.is_finite() || raw <= 0.0 {
        return 0;
    }
    (raw + SAMPLE_EPSILON).floor() as usize
}

/// Compute the sample offsets for one segment.
pub fn sample_plan(
    segment_duration: f64,
    source_fps: f64,
    target_fps: f64,
    speed_factor: f64,
) -> SamplePlan {
    let frame_count = output_frame_count(segment_duration, target_fps, speed_factor);
    if frame_count == 0 {
        return SamplePlan::empty(source_fps);
    }

    let time_step = segment_duration / frame_count as f64;
    let offsets = (0..frame_count).map(|f| f as f64 * time_step).collect();

    SamplePlan {
        offsets,
        time_step,
        source_fps,
    }
}

/// How the frame rate handed to the encoder is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRateMode {
    /// One continuous range with no exclusions.
    SingleRange,
    /// Output stitched together after removing excluded ranges.
    Segmented,
}

impl FrameRateMode {
    /// Segmented whenever any exclusion was requested.
    pub fn for_exclusions(excluded_count: usize) -> Self {
        if excluded_count == 0 {
            FrameRateMode::SingleRange
        } else {
            FrameRateMode::Segmented
        }
    }
}

/// Frame rate reported to the encoder or player.
///
/// A single range plays at `target_fps * speed_factor`; segmented output
/// plays at the plain `target_fps`, its speed already baked into sampling.
pub fn encoder_frame_rate(target_fps: u32, speed_factor: f64, mode: FrameRateMode) -> f64 {
    match mode {
        FrameRateMode::SingleRange => target_fps as f64 * speed_factor,
        FrameRateMode::Segmented => target_fps as f64,
    }
}
