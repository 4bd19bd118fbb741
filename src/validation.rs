//! Pre-flight checks.
//!
//! [`validate_metadata`] looks at an opened source, [`validate_request`] at
//! an export request against that source. Neither decodes anything.
//!
//! # Example
//!
//! ```no_run
//! use gifcut::{Dimensions, ExcludedSegments, ExportRequest, MediaProbe, OutputSpec, validate_request};
//!
//! let metadata = MediaProbe::probe("input.mp4")?;
//! let request = ExportRequest::new(
//!     metadata.full_range()?,
//!     ExcludedSegments::new(),
//!     OutputSpec::new(15, Dimensions::new(480, 270)),
//! );
//! let report = validate_request(&metadata, &request);
//! print!("{report}");
//! # Ok::<(), gifcut::GifCutError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::assembler::ExportRequest;
use crate::configuration::RECOMMENDED_SPEED_RANGE;
use crate::metadata::VideoMetadata;
use crate::timeline::format_timecode;
use crate::transform::Dimensions;

/// Findings, split by severity.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Informational notes.
    pub info: Vec<String>,
    /// Problems that still allow an export.
    pub warnings: Vec<String>,
    /// Problems that will make an export fail.
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// `true` if there are no errors. Warnings do not count.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Total number of entries.
    pub fn issue_count(&self) -> usize {
        self.info.len() + self.warnings.len() + self.errors.len()
    }

    fn merge(&mut self, other: ValidationReport) {
        self.info.extend(other.info);
        self.warnings.extend(other.warnings);
        self.errors.extend(other.errors);
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for item in &self.info {
            writeln!(f, "[INFO] {item}")?;
        }
        for item in &self.warnings {
            writeln!(f, "[WARN] {item}")?;
        }
        for item in &self.errors {
            writeln!(f, "[ERROR] {item}")?;
        }
        if self.issue_count() == 0 {
            writeln!(f, "No issues found.")?;
        }
        Ok(())
    }
}

/// Check source metadata.
pub fn validate_metadata(metadata: &VideoMetadata) -> ValidationReport {
    let mut report = ValidationReport::default();

    if metadata.width == 0 || metadata.height == 0 {
        report.errors.push(format!(
            "Invalid video dimensions: {}x{}",
            metadata.width, metadata.height,
        ));
    }

    if metadata.frames_per_second <= 0.0 {
        report
            .errors
            .push("Video frame rate is zero or negative".to_string());
    } else if metadata.frames_per_second > 240.0 {
        report.warnings.push(format!(
            "Unusually high frame rate ({:.1} fps); sampling may be slow",
            metadata.frames_per_second,
        ));
    }

    if metadata.frame_count == 0 {
        report.errors.push("Video has no frames".to_string());
    }

    report.info.push(format!(
        "Video: {} {}x{} @ {:.2} fps, {} frames, {}",
        metadata.codec,
        metadata.width,
        metadata.height,
        metadata.frames_per_second,
        metadata.frame_count,
        format_timecode(metadata.duration_seconds()),
    ));

    report
}

/// Check an export request against the source it will run on.
pub fn validate_request(metadata: &VideoMetadata, request: &ExportRequest) -> ValidationReport {
    let mut report = validate_metadata(metadata);
    report.merge(check_output(metadata, request));
    report.merge(check_trim(metadata, request));
    report
}

fn check_output(metadata: &VideoMetadata, request: &ExportRequest) -> ValidationReport {
    let mut report = ValidationReport::default();
    let output = &request.output;

    if let Err(error) = output.validate() {
        report.errors.push(error.to_string());
        return report;
    }

    let (slowest, fastest) = RECOMMENDED_SPEED_RANGE;
    if output.speed_factor < slowest || output.speed_factor > fastest {
        report.warnings.push(format!(
            "Speed {:.2}x is outside the usual {slowest}x to {fastest}x range",
            output.speed_factor,
        ));
    }

    if f64::from(output.fps) > metadata.frames_per_second {
        report.warnings.push(format!(
            "Output rate {} fps exceeds the source rate {:.2} fps; frames will repeat",
            output.fps, metadata.frames_per_second,
        ));
    }

    let base = match output.crop {
        Some(crop) => match crop.clamp_to(metadata.width, metadata.height) {
            Some(clamped) => {
                if clamped != crop {
                    report.warnings.push(format!(
                        "Crop {}x{}+{}+{} extends past the frame and will be clamped to {}x{}+{}+{}",
                        crop.width,
                        crop.height,
                        crop.x,
                        crop.y,
                        clamped.width,
                        clamped.height,
                        clamped.x,
                        clamped.y,
                    ));
                }
                clamped.dimensions()
            }
            None => {
                report
                    .warnings
                    .push("Crop lies outside the frame and will be ignored".to_string());
                Dimensions::new(metadata.width, metadata.height)
            }
        },
        None => Dimensions::new(metadata.width, metadata.height),
    };

    if output.dimensions.width > base.width || output.dimensions.height > base.height {
        report.warnings.push(format!(
            "Output {} is larger than the {} source area; frames will be upscaled",
            output.dimensions, base,
        ));
    }

    report
}

fn check_trim(metadata: &VideoMetadata, request: &ExportRequest) -> ValidationReport {
    let mut report = ValidationReport::default();
    let duration = metadata.duration_seconds();

    if request.primary.start() >= duration {
        report.errors.push(format!(
            "Trim starts at {} but the video ends at {}",
            format_timecode(request.primary.start()),
            format_timecode(duration),
        ));
    } else if request.primary.end() > duration + 1e-6 {
        report.warnings.push(format!(
            "Trim ends at {}, past the end of the video ({}); the last frame will repeat",
            format_timecode(request.primary.end()),
            format_timecode(duration),
        ));
    }

    let segments = request.effective_segments();
    if segments.is_empty() {
        report
            .errors
            .push("Exclusions remove the entire trim range".to_string());
        return report;
    }

    let planned = request.planned_frame_count();
    if planned == 0 {
        report
            .errors
            .push("Every segment is too short to yield a frame at this rate".to_string());
    }

    report.info.push(format!(
        "{} segment(s), {} of source, {} frame(s) at {:.2} fps",
        segments.len(),
        format_timecode(request.effective_duration()),
        planned,
        request.encoder_frame_rate(),
    ));
    report.info.push(format!(
        "Estimated size: {:.1} MB",
        request.estimated_size_bytes() as f64 / (1024.0 * 1024.0),
    ));

    report
}
