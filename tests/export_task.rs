//! Background export tests (`async` feature).

#![cfg(feature = "async")]

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{PatternSource, RecordingEncoder, RecordingProgress};
use gifcut::{
    BuildOptions, CancellationToken, Dimensions, ExcludedSegments, ExportRequest, ExportTask,
    GifCutError, GifWriter, OutputSpec, TimeRange,
};

fn request() -> ExportRequest {
    ExportRequest::new(
        TimeRange::new(0.0, 10.0).unwrap(),
        ExcludedSegments::new(),
        OutputSpec::new(10, Dimensions::new(8, 8)),
    )
}

#[tokio::test]
async fn export_task_writes_the_gif() {
    let directory = tempfile::tempdir().expect("tempdir");
    let output = directory.path().join("task.gif");

    let task = ExportTask::spawn_with(
        || Ok(PatternSource::small()),
        request(),
        &output,
        GifWriter::new(),
        BuildOptions::new(),
    );
    let progress = task.progress();

    let summary = task.await.expect("export should succeed");
    assert_eq!(summary.frame_count, 100);
    assert_eq!(summary.path, output);
    assert!(output.exists());
    assert_eq!(*progress.borrow(), 100);
}

#[tokio::test]
async fn export_task_keeps_the_callers_callback() {
    let recorder = Arc::new(RecordingProgress::default());
    let task = ExportTask::spawn_with(
        || Ok(PatternSource::small()),
        request(),
        "unused.gif",
        RecordingEncoder::default(),
        BuildOptions::new().with_progress(recorder.clone()),
    );

    task.await.expect("export should succeed");
    assert_eq!(recorder.percentages().last(), Some(&100));
}

#[tokio::test]
async fn export_task_reports_open_failures() {
    let task = ExportTask::spawn_with(
        || -> Result<PatternSource, GifCutError> { Err(GifCutError::NoVideoStream) },
        request(),
        "unused.gif",
        RecordingEncoder::default(),
        BuildOptions::new(),
    );

    assert!(matches!(task.await, Err(GifCutError::NoVideoStream)));
}

#[tokio::test]
async fn export_task_honours_a_cancelled_token() {
    let token = CancellationToken::new();
    token.cancel();
    let encoder = RecordingEncoder::default();

    let task = ExportTask::spawn_with(
        || Ok(PatternSource::small()),
        request(),
        "unused.gif",
        encoder,
        BuildOptions::new().with_cancellation(token.clone()),
    );
    assert!(task.cancellation_token().is_cancelled());

    match task.await {
        Err(GifCutError::Cancelled) => {}
        other => panic!("Expected Cancelled, got: {other:?}"),
    }
}

#[tokio::test]
async fn cancel_stops_a_running_export() {
    let task = ExportTask::spawn_with(
        || Ok(PatternSource::small().with_decode_delay(Duration::from_millis(5))),
        request(),
        "unused.gif",
        RecordingEncoder::default(),
        BuildOptions::new(),
    );

    tokio::time::sleep(Duration::from_millis(20)).await;
    task.cancel();

    match task.await {
        Err(GifCutError::Cancelled) => {}
        other => panic!("Expected Cancelled, got: {other:?}"),
    }
}
