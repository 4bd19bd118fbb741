//! Pre-flight validation tests.

use gifcut::{
    CropRect, Dimensions, ExcludedSegments, ExportRequest, OutputSpec, TimeRange,
    ValidationReport, VideoMetadata, validate_metadata, validate_request,
};

fn metadata() -> VideoMetadata {
    VideoMetadata::new(1920, 1080, 30.0, 300).with_names("h264", "mp4")
}

fn request_for(start: f64, end: f64, excluded: &[TimeRange], output: OutputSpec) -> ExportRequest {
    ExportRequest::new(
        TimeRange::new(start, end).unwrap(),
        ExcludedSegments::from_ranges(excluded),
        output,
    )
}

fn output() -> OutputSpec {
    OutputSpec::new(15, Dimensions::new(640, 360))
}

fn mentions(messages: &[String], needle: &str) -> bool {
    messages.iter().any(|message| message.contains(needle))
}

// ── Report ─────────────────────────────────────────────────────────

#[test]
fn empty_report_is_valid() {
    let report = ValidationReport::default();
    assert!(report.is_valid());
    assert_eq!(report.issue_count(), 0);
    assert_eq!(report.to_string(), "No issues found.\n");
}

#[test]
fn report_display_tags_each_severity() {
    let report = ValidationReport {
        info: vec!["note".to_string()],
        warnings: vec!["careful".to_string()],
        errors: vec!["broken".to_string()],
    };
    let text = report.to_string();
    assert!(text.contains("[INFO] note"));
    assert!(text.contains("[WARN] careful"));
    assert!(text.contains("[ERROR] broken"));
    assert!(!report.is_valid());
    assert_eq!(report.issue_count(), 3);
}

// ── Metadata ───────────────────────────────────────────────────────

#[test]
fn sane_metadata_passes() {
    let report = validate_metadata(&metadata());
    assert!(report.is_valid());
    assert!(report.warnings.is_empty());
    assert!(mentions(&report.info, "h264 1920x1080"));
}

#[test]
fn broken_metadata_fails() {
    let report = validate_metadata(&VideoMetadata::new(0, 0, 0.0, 0));
    assert!(!report.is_valid());
    assert_eq!(report.errors.len(), 3);
}

// ── Requests ───────────────────────────────────────────────────────

#[test]
fn ordinary_request_is_clean() {
    let report = validate_request(&metadata(), &request_for(0.0, 5.0, &[], output()));
    assert!(report.is_valid(), "{report}");
    assert!(report.warnings.is_empty(), "{report}");
    assert!(mentions(&report.info, "75 frame(s)"));
    assert!(mentions(&report.info, "Estimated size"));
}

#[test]
fn invalid_output_is_an_error() {
    let report = validate_request(
        &metadata(),
        &request_for(0.0, 5.0, &[], output().with_speed_factor(-1.0)),
    );
    assert!(!report.is_valid());
    assert!(mentions(&report.errors, "Speed factor"));
}

#[test]
fn unusual_speed_and_rate_are_warnings() {
    let report = validate_request(
        &metadata(),
        &request_for(
            0.0,
            5.0,
            &[],
            OutputSpec::new(60, Dimensions::new(640, 360)).with_speed_factor(8.0),
        ),
    );
    assert!(report.is_valid());
    assert!(mentions(&report.warnings, "Speed 8.00x"));
    assert!(mentions(&report.warnings, "exceeds the source rate"));
}

#[test]
fn upscaling_and_clamped_crops_are_warnings() {
    let report = validate_request(
        &metadata(),
        &request_for(
            0.0,
            5.0,
            &[],
            OutputSpec::new(15, Dimensions::new(400, 400))
                .with_crop(CropRect::new(1800, 1000, 400, 400)),
        ),
    );
    assert!(report.is_valid());
    assert!(mentions(&report.warnings, "will be clamped"));
    assert!(mentions(&report.warnings, "upscaled"));
}

#[test]
fn crop_outside_the_frame_is_a_warning() {
    let report = validate_request(
        &metadata(),
        &request_for(
            0.0,
            5.0,
            &[],
            output().with_crop(CropRect::new(5000, 5000, 10, 10)),
        ),
    );
    assert!(report.is_valid());
    assert!(mentions(&report.warnings, "will be ignored"));
}

#[test]
fn trim_past_the_end_is_an_error() {
    let report = validate_request(&metadata(), &request_for(12.0, 15.0, &[], output()));
    assert!(!report.is_valid());
    assert!(mentions(&report.errors, "Trim starts at 00:12.00"));
}

#[test]
fn trim_ending_past_the_video_is_a_warning() {
    let report = validate_request(&metadata(), &request_for(8.0, 12.0, &[], output()));
    assert!(report.is_valid());
    assert!(mentions(&report.warnings, "past the end of the video"));
}

#[test]
fn exclusions_covering_the_trim_are_an_error() {
    let report = validate_request(
        &metadata(),
        &request_for(2.0, 4.0, &[TimeRange::new(1.0, 5.0).unwrap()], output()),
    );
    assert!(!report.is_valid());
    assert!(mentions(&report.errors, "entire trim range"));
}

#[test]
fn too_short_for_a_single_frame_is_an_error() {
    let report = validate_request(
        &metadata(),
        &request_for(0.0, 0.05, &[], OutputSpec::new(10, Dimensions::new(64, 36))),
    );
    assert!(!report.is_valid());
    assert!(mentions(&report.errors, "too short"));
}
