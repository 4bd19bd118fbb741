//! Frame assembly and export.
//!
//! [`GifAssembler`] turns an [`ExportRequest`] into an ordered frame
//! sequence: it plans the effective segments, samples each one, decodes and
//! transforms every sample, and forces all frames onto one shape. Exports
//! then hand the sequence to a [`GifEncoder`].
//!
//! Frames that fail to decode are skipped. A segment that yields nothing
//! contributes nothing; only a build with no frames at all fails.
//!
//! # Example
//!
//! ```no_run
//! use gifcut::{
//!     BuildOptions, Dimensions, ExcludedSegments, ExportRequest, GifAssembler, GifWriter,
//!     MediaSource, OutputSpec, TimeRange,
//! };
//!
//! let mut source = MediaSource::open("input.mp4")?;
//! let mut excluded = ExcludedSegments::new();
//! excluded.add(TimeRange::new(5.0, 8.0)?);
//!
//! let request = ExportRequest::new(
//!     TimeRange::new(0.0, 20.0)?,
//!     excluded,
//!     OutputSpec::new(15, Dimensions::new(640, 360)),
//! );
//! let summary = GifAssembler::export(
//!     &mut source,
//!     &request,
//!     "clip.gif",
//!     &GifWriter::new(),
//!     &BuildOptions::new(),
//! )?;
//! println!("{} frames at {:.1} fps", summary.frame_count, summary.frame_rate);
//! # Ok::<(), gifcut::GifCutError>(())
//! ```

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::configuration::{BuildOptions, OutputSpec};
use crate::error::GifCutError;
use crate::gif::{EncodeParameters, GifEncoder};
use crate::progress::{OperationType, ProgressTracker};
use crate::sampler::{self, FrameRateMode, SamplePlan};
use crate::source::{FrameBuffer, FrameSource};
use crate::timeline::{self, ExcludedSegments, TimeRange};
use crate::transform::{self, CropRect, Dimensions};

/// Everything one build needs, captured at the moment the build starts.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    /// The trim window.
    pub primary: TimeRange,
    /// Ranges removed from the trim window.
    pub excluded: ExcludedSegments,
    /// Output settings.
    pub output: OutputSpec,
}

impl ExportRequest {
    /// Bundle a trim and an output spec.
    pub fn new(primary: TimeRange, excluded: ExcludedSegments, output: OutputSpec) -> Self {
        Self {
            primary,
            excluded,
            output,
        }
    }

    /// Check the output spec.
    ///
    /// # Errors
    ///
    /// Any error from [`OutputSpec::validate`].
    pub fn validate(&self) -> Result<(), GifCutError> {
        self.output.validate()
    }

    /// The primary range minus the exclusions.
    pub fn effective_segments(&self) -> Vec<TimeRange> {
        timeline::effective_segments(&self.primary, self.excluded.as_slice())
    }

    /// Seconds of source time that survive the exclusions.
    pub fn effective_duration(&self) -> f64 {
        timeline::effective_duration(&self.primary, self.excluded.as_slice())
    }

    /// Single range when nothing is excluded, segmented otherwise.
    pub fn frame_rate_mode(&self) -> FrameRateMode {
        FrameRateMode::for_exclusions(self.excluded.len())
    }

    /// Playback rate handed to the encoder.
    pub fn encoder_frame_rate(&self) -> f64 {
        sampler::encoder_frame_rate(
            self.output.fps,
            self.output.speed_factor,
            self.frame_rate_mode(),
        )
    }

    /// One sample plan per effective segment.
    pub fn sample_plans(&self, source_fps: f64) -> Vec<(TimeRange, SamplePlan)> {
        self.effective_segments()
            .into_iter()
            .map(|segment| {
                let plan = sampler::sample_plan(
                    segment.duration(),
                    source_fps,
                    f64::from(self.output.fps),
                    self.output.speed_factor,
                );
                (segment, plan)
            })
            .collect()
    }

    /// Total number of samples across all segments.
    pub fn planned_frame_count(&self) -> usize {
        self.effective_segments()
            .iter()
            .map(|segment| {
                sampler::output_frame_count(
                    segment.duration(),
                    f64::from(self.output.fps),
                    self.output.speed_factor,
                )
            })
            .sum()
    }

    /// Rough output size: `width * height * frames * 3 * quality` bytes.
    pub fn estimated_size_bytes(&self) -> u64 {
        let raw = self.output.dimensions.area() as f64
            * self.planned_frame_count() as f64
            * 3.0
            * f64::from(self.output.quality);
        raw as u64
    }
}

/// The frames of one build.
#[derive(Debug, Clone)]
pub struct AssembledFrames {
    /// Output frames, all the same shape.
    pub frames: Vec<FrameBuffer>,
    /// Playback rate for these frames.
    pub frame_rate: f64,
    /// The effective segments that were sampled.
    pub segments: Vec<TimeRange>,
    /// Sample positions attempted.
    pub samples_attempted: usize,
    /// Samples whose frame failed to decode.
    pub skipped: usize,
    /// Frames resized to repair a shape mismatch.
    pub repaired: usize,
}

impl AssembledFrames {
    /// Shape shared by every frame.
    pub fn dimensions(&self) -> Option<Dimensions> {
        self.frames.first().map(Dimensions::of)
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// `true` if there are no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Running time at [`frame_rate`](Self::frame_rate).
    pub fn playback_duration(&self) -> Duration {
        if self.frame_rate > 0.0 {
            Duration::from_secs_f64(self.frames.len() as f64 / self.frame_rate)
        } else {
            Duration::ZERO
        }
    }
}

/// Outcome of a successful export.
#[derive(Debug, Clone)]
pub struct ExportSummary {
    /// Where the GIF was written.
    pub path: PathBuf,
    /// Frames written.
    pub frame_count: usize,
    /// Playback rate handed to the encoder.
    pub frame_rate: f64,
    /// Frame shape.
    pub dimensions: Dimensions,
    /// Effective segments sampled.
    pub segments: usize,
    /// Samples skipped after decode failures.
    pub skipped_frames: usize,
    /// Frames resized to repair a shape mismatch.
    pub repaired_frames: usize,
    /// Running time of the GIF at `frame_rate`.
    pub playback: Duration,
    /// Wall-clock time for the whole export.
    pub elapsed: Duration,
}

/// Builds frame sequences and exports them.
pub struct GifAssembler;

impl GifAssembler {
    /// Sample, decode, and transform every frame of the request.
    ///
    /// Progress spans the options' band (0–90 by default), leaving the rest
    /// for an encode step the caller runs.
    ///
    /// # Errors
    ///
    /// - Validation errors from [`ExportRequest::validate`].
    /// - [`GifCutError::Cancelled`] if the token fires.
    /// - [`GifCutError::NoFramesProduced`] if nothing could be decoded.
    pub fn build<S: FrameSource + ?Sized>(
        source: &mut S,
        request: &ExportRequest,
        options: &BuildOptions,
    ) -> Result<AssembledFrames, GifCutError> {
        request.validate()?;
        let mut tracker = ProgressTracker::new(
            options.progress.clone(),
            OperationType::FrameSampling,
            request.planned_frame_count() as u64,
            options.progress_band,
            options.batch_size,
        );
        let assembled = assemble(source, request, options, &mut tracker)?;
        tracker.finish_band();
        Ok(assembled)
    }

    /// Build frames for on-screen playback. Progress spans 0–100.
    ///
    /// # Errors
    ///
    /// Same as [`build`](Self::build).
    pub fn preview<S: FrameSource + ?Sized>(
        source: &mut S,
        request: &ExportRequest,
        options: &BuildOptions,
    ) -> Result<AssembledFrames, GifCutError> {
        let options = options.clone().with_progress_band(0, 100);
        Self::build(source, request, &options)
    }

    /// Build the frames and write them with `encoder`.
    ///
    /// Progress climbs through the sampling band, then to 100 once the file
    /// is in place.
    ///
    /// # Errors
    ///
    /// Anything [`build`](Self::build) returns, plus encoder errors.
    pub fn export<S, E, P>(
        source: &mut S,
        request: &ExportRequest,
        path: P,
        encoder: &E,
        options: &BuildOptions,
    ) -> Result<ExportSummary, GifCutError>
    where
        S: FrameSource + ?Sized,
        E: GifEncoder + ?Sized,
        P: AsRef<Path>,
    {
        let started = Instant::now();
        let path = path.as_ref();
        request.validate()?;

        let mut tracker = ProgressTracker::new(
            options.progress.clone(),
            OperationType::FrameSampling,
            request.planned_frame_count() as u64,
            options.progress_band,
            options.batch_size,
        );
        let assembled = assemble(source, request, options, &mut tracker)?;
        options.check_cancelled()?;

        let (_, band_end) = options.progress_band;
        tracker.enter_phase(OperationType::GifEncoding, 1, (band_end, 100));
        tracker.report_percentage(band_end);

        let parameters = EncodeParameters::from_spec(&request.output, assembled.frame_rate);
        encoder.write_frames(path, &assembled.frames, &parameters)?;
        tracker.report_percentage(100);

        let summary = ExportSummary {
            path: path.to_path_buf(),
            frame_count: assembled.frames.len(),
            frame_rate: assembled.frame_rate,
            dimensions: assembled
                .dimensions()
                .unwrap_or(request.output.dimensions),
            segments: assembled.segments.len(),
            skipped_frames: assembled.skipped,
            repaired_frames: assembled.repaired,
            playback: assembled.playback_duration(),
            elapsed: started.elapsed(),
        };
        log::info!(
            "Exported {} frame(s) at {:.2} fps to {} in {:.2?}",
            summary.frame_count,
            summary.frame_rate,
            path.display(),
            summary.elapsed,
        );
        Ok(summary)
    }
}

fn assemble<S: FrameSource + ?Sized>(
    source: &mut S,
    request: &ExportRequest,
    options: &BuildOptions,
    tracker: &mut ProgressTracker,
) -> Result<AssembledFrames, GifCutError> {
    let metadata = source.metadata().clone();
    let target = request.output.dimensions;
    let crop = resolve_crop(request.output.crop, metadata.width, metadata.height);
    let plans = request.sample_plans(metadata.frames_per_second);

    log::debug!(
        "Assembling {} segment(s), {} planned frame(s) at {target}",
        plans.len(),
        plans.iter().map(|(_, plan)| plan.len()).sum::<usize>(),
    );

    let mut frames: Vec<FrameBuffer> = Vec::new();
    let mut samples_attempted = 0;
    let mut skipped = 0;
    let mut repaired = 0;

    for (segment_index, (segment, plan)) in plans.iter().enumerate() {
        options.check_cancelled()?;

        let mut batch = Vec::with_capacity(plan.len());
        for seconds in plan.timestamps(segment.start()) {
            options.check_cancelled()?;
            samples_attempted += 1;
            match source.frame_at(seconds) {
                Some(frame) => batch.push(transform::apply(frame, crop.as_ref(), target)),
                None => skipped += 1,
            }
            tracker.advance(Some(segment_index));
        }

        if batch.is_empty() && !plan.is_empty() {
            log::warn!("Segment {segment} produced no frames");
        }

        if let Some(canonical) = frames.first().or(batch.first()).map(Dimensions::of) {
            repaired += conform_batch(&mut batch, canonical);
        }
        frames.append(&mut batch);
    }

    if frames.is_empty() {
        return Err(GifCutError::NoFramesProduced {
            segments: plans.len(),
            samples: samples_attempted,
        });
    }

    repaired += enforce_uniform_shape(&mut frames);

    if skipped > 0 {
        log::warn!(
            "Skipped {skipped} of {samples_attempted} sampled frame(s) after decode failures"
        );
    }

    Ok(AssembledFrames {
        frames,
        frame_rate: request.encoder_frame_rate(),
        segments: plans.into_iter().map(|(segment, _)| segment).collect(),
        samples_attempted,
        skipped,
        repaired,
    })
}

fn resolve_crop(crop: Option<CropRect>, width: u32, height: u32) -> Option<CropRect> {
    let rect = crop?;
    match rect.clamp_to(width, height) {
        Some(clamped) => {
            if clamped != rect {
                log::warn!("Crop {rect:?} clamped to {clamped:?} for a {width}x{height} source");
            }
            Some(clamped)
        }
        None => {
            log::warn!("Crop {rect:?} lies outside the {width}x{height} source; ignoring it");
            None
        }
    }
}

/// Resize every frame of `batch` that is not `canonical`. Returns how many.
fn conform_batch(batch: &mut [FrameBuffer], canonical: Dimensions) -> usize {
    let mut repaired = 0;
    for frame in batch.iter_mut() {
        let shape = Dimensions::of(frame);
        if shape != canonical {
            log::warn!("Frame shape {shape} differs from {canonical}; resizing");
            *frame = transform::conform(std::mem::take(frame), canonical);
            repaired += 1;
        }
    }
    repaired
}

/// Force every frame onto the first frame's shape.
pub(crate) fn enforce_uniform_shape(frames: &mut [FrameBuffer]) -> usize {
    match frames.first().map(Dimensions::of) {
        Some(canonical) => conform_batch(frames, canonical),
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;

    fn solid(width: u32, height: u32) -> FrameBuffer {
        FrameBuffer::from_pixel(width, height, Rgb([10, 20, 30]))
    }

    #[test]
    fn conform_batch_resizes_only_mismatched_frames() {
        let canonical = Dimensions::new(8, 6);
        let mut batch = vec![solid(8, 6), solid(4, 4), solid(8, 6), solid(16, 2)];

        assert_eq!(conform_batch(&mut batch, canonical), 2);
        assert!(batch.iter().all(|frame| Dimensions::of(frame) == canonical));
        for (actual, expected) in batch[1].get_pixel(0, 0).0.iter().zip([10_u8, 20, 30]) {
            assert!(actual.abs_diff(expected) <= 1);
        }
    }

    #[test]
    fn conform_batch_leaves_matching_frames_alone() {
        let mut batch = vec![solid(8, 6), solid(8, 6)];
        assert_eq!(conform_batch(&mut batch, Dimensions::new(8, 6)), 0);
    }

    #[test]
    fn uniform_shape_on_empty_slice() {
        assert_eq!(enforce_uniform_shape(&mut []), 0);
    }

    #[test]
    fn uniform_shape_follows_the_first_frame() {
        let mut frames = vec![solid(5, 3), solid(8, 6), solid(8, 6), solid(5, 3)];

        assert_eq!(enforce_uniform_shape(&mut frames), 2);
        assert!(
            frames
                .iter()
                .all(|frame| Dimensions::of(frame) == Dimensions::new(5, 3))
        );
    }
}
