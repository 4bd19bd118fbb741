//! Progress reporting and cancellation tests.

mod common;

use std::sync::Arc;

use common::{PatternSource, RecordingEncoder, RecordingProgress, RejectingEncoder};
use gifcut::{
    BuildOptions, CancellationToken, Dimensions, ExcludedSegments, ExportRequest, GifAssembler,
    GifCutError, OperationType, OutputSpec, TimeRange,
};

fn request(excluded: &[TimeRange]) -> ExportRequest {
    ExportRequest::new(
        TimeRange::new(0.0, 10.0).unwrap(),
        ExcludedSegments::from_ranges(excluded),
        OutputSpec::new(10, Dimensions::new(8, 8)),
    )
}

fn assert_non_decreasing(percentages: &[u8]) {
    for pair in percentages.windows(2) {
        assert!(
            pair[1] >= pair[0],
            "progress went backwards: {} then {}",
            pair[0],
            pair[1]
        );
    }
}

// ── CancellationToken ──────────────────────────────────────────────

#[test]
fn cancellation_token_default_not_cancelled() {
    assert!(!CancellationToken::new().is_cancelled());
    assert!(!CancellationToken::default().is_cancelled());
}

#[test]
fn cancellation_token_clone_shares_state() {
    let token = CancellationToken::new();
    let clone = token.clone();
    assert!(!clone.is_cancelled());

    token.cancel();
    assert!(clone.is_cancelled());
}

// ── Export progress ────────────────────────────────────────────────

#[test]
fn export_progress_is_monotonic_and_ends_at_100() {
    let recorder = Arc::new(RecordingProgress::default());
    let options = BuildOptions::new().with_progress(recorder.clone());
    let mut source = PatternSource::small();

    GifAssembler::export(
        &mut source,
        &request(&[TimeRange::new(2.0, 4.0).unwrap()]),
        "out.gif",
        &RecordingEncoder::default(),
        &options,
    )
    .expect("export should succeed");

    let percentages = recorder.percentages();
    assert!(!percentages.is_empty());
    assert_non_decreasing(&percentages);
    assert_eq!(percentages.last(), Some(&100));
    assert!(percentages.iter().all(|p| *p <= 100));
}

#[test]
fn export_reports_sampling_then_encoding() {
    let recorder = Arc::new(RecordingProgress::default());
    let options = BuildOptions::new().with_progress(recorder.clone());
    let mut source = PatternSource::small();

    GifAssembler::export(
        &mut source,
        &request(&[]),
        "out.gif",
        &RecordingEncoder::default(),
        &options,
    )
    .unwrap();

    let infos = recorder.infos.lock().unwrap();
    assert_eq!(infos.first().unwrap().operation, OperationType::FrameSampling);
    assert_eq!(infos.last().unwrap().operation, OperationType::GifEncoding);

    let sampling: Vec<_> = infos
        .iter()
        .filter(|info| info.operation == OperationType::FrameSampling)
        .collect();
    assert!(sampling.iter().all(|info| info.percentage <= 90));
    assert!(sampling.iter().all(|info| info.total == Some(100)));
    assert!(sampling.iter().any(|info| info.segment_index == Some(0)));
}

#[test]
fn segment_index_follows_the_segments() {
    let recorder = Arc::new(RecordingProgress::default());
    let options = BuildOptions::new().with_progress(recorder.clone());
    let mut source = PatternSource::small();

    GifAssembler::build(
        &mut source,
        &request(&[
            TimeRange::new(2.0, 4.0).unwrap(),
            TimeRange::new(6.0, 7.0).unwrap(),
        ]),
        &options,
    )
    .unwrap();

    let infos = recorder.infos.lock().unwrap();
    let indices: Vec<usize> = infos.iter().filter_map(|info| info.segment_index).collect();
    assert_eq!(indices.first(), Some(&0));
    assert_eq!(indices.last(), Some(&2));
    for pair in indices.windows(2) {
        assert!(pair[1] >= pair[0]);
    }
}

#[test]
fn batch_size_reduces_reports() {
    let every = Arc::new(RecordingProgress::default());
    let batched = Arc::new(RecordingProgress::default());
    let mut source = PatternSource::small();

    GifAssembler::build(
        &mut source,
        &request(&[]),
        &BuildOptions::new().with_progress(every.clone()),
    )
    .unwrap();
    GifAssembler::build(
        &mut source,
        &request(&[]),
        &BuildOptions::new()
            .with_progress(batched.clone())
            .with_batch_size(25),
    )
    .unwrap();

    // 100 samples plus the closing report.
    assert_eq!(every.percentages().len(), 101);
    assert_eq!(batched.percentages().len(), 5);
}

#[test]
fn custom_band_bounds_the_build() {
    let recorder = Arc::new(RecordingProgress::default());
    let options = BuildOptions::new()
        .with_progress(recorder.clone())
        .with_progress_band(20, 60);
    let mut source = PatternSource::small();

    GifAssembler::build(&mut source, &request(&[]), &options).unwrap();

    let percentages = recorder.percentages();
    assert!(percentages.iter().all(|p| (20..=60).contains(p)));
    assert_eq!(percentages.last(), Some(&60));
}

#[test]
fn no_progress_on_early_failure() {
    let recorder = Arc::new(RecordingProgress::default());
    let options = BuildOptions::new().with_progress(recorder.clone());
    let mut source = PatternSource::small();
    let invalid = ExportRequest::new(
        TimeRange::new(0.0, 10.0).unwrap(),
        ExcludedSegments::new(),
        OutputSpec::new(0, Dimensions::new(8, 8)),
    );

    let result = GifAssembler::export(
        &mut source,
        &invalid,
        "out.gif",
        &RecordingEncoder::default(),
        &options,
    );
    assert!(matches!(result, Err(GifCutError::InvalidFrameRate)));
    assert!(recorder.percentages().is_empty());
}

#[test]
fn failed_encode_never_reports_100() {
    let recorder = Arc::new(RecordingProgress::default());
    let options = BuildOptions::new().with_progress(recorder.clone());
    let mut source = PatternSource::small();

    let result = GifAssembler::export(
        &mut source,
        &request(&[]),
        "out.gif",
        &RejectingEncoder,
        &options,
    );
    assert!(result.is_err());
    assert!(!recorder.percentages().contains(&100));
}

#[test]
fn cancelled_export_returns_error() {
    let token = CancellationToken::new();
    token.cancel();
    let options = BuildOptions::new().with_cancellation(token);
    let mut source = PatternSource::small();
    let encoder = RecordingEncoder::default();

    let result = GifAssembler::export(&mut source, &request(&[]), "out.gif", &encoder, &options);

    match result {
        Err(GifCutError::Cancelled) => {}
        other => panic!("Expected Cancelled, got: {other:?}"),
    }
    assert!(encoder.last_call().is_none());
}
