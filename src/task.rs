//! Background exports.
//!
//! [`ExportTask`] runs [`GifAssembler::export`] on a blocking thread so an
//! async caller stays responsive. Percentages are published on a
//! [`watch`](tokio::sync::watch) channel and the task resolves to the
//! [`ExportSummary`] when awaited.
//!
//! FFmpeg handles cannot cross threads, so the source is opened on the
//! worker thread itself.
//!
//! # Example
//!
//! ```no_run
//! use gifcut::{
//!     BuildOptions, Dimensions, ExcludedSegments, ExportRequest, ExportTask, GifCutError,
//!     OutputSpec, TimeRange,
//! };
//!
//! # async fn example() -> Result<(), GifCutError> {
//! let request = ExportRequest::new(
//!     TimeRange::new(0.0, 10.0)?,
//!     ExcludedSegments::new(),
//!     OutputSpec::new(15, Dimensions::new(480, 270)),
//! );
//! let task = ExportTask::spawn("input.mp4", request, "clip.gif", BuildOptions::new());
//! let mut progress = task.progress();
//! tokio::spawn(async move {
//!     while progress.changed().await.is_ok() {
//!         println!("{}%", *progress.borrow());
//!     }
//! });
//! let summary = task.await?;
//! println!("wrote {}", summary.path.display());
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::watch::{self, Receiver};
use tokio::task::JoinHandle;

use crate::assembler::{ExportRequest, ExportSummary, GifAssembler};
use crate::configuration::BuildOptions;
use crate::error::GifCutError;
use crate::gif::{GifEncoder, GifWriter};
use crate::media::MediaSource;
use crate::progress::{CancellationToken, ProgressCallback, ProgressInfo};
use crate::source::FrameSource;

/// An export running on a blocking thread.
///
/// Must be created from inside a Tokio runtime. Dropping the task does not
/// stop the work; call [`cancel`](Self::cancel) for that.
pub struct ExportTask {
    handle: JoinHandle<Result<ExportSummary, GifCutError>>,
    progress: Receiver<u8>,
    token: CancellationToken,
}

impl ExportTask {
    /// Open `input` with FFmpeg on the worker thread and export it with
    /// [`GifWriter`].
    pub fn spawn<P, Q>(input: P, request: ExportRequest, output: Q, options: BuildOptions) -> Self
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let input = input.as_ref().to_path_buf();
        Self::spawn_with(
            move || MediaSource::open(input),
            request,
            output,
            GifWriter::new(),
            options,
        )
    }

    /// Export from whatever source `open` produces, using `encoder`.
    ///
    /// Any callback and token already in `options` stay in effect.
    pub fn spawn_with<S, F, E, Q>(
        open: F,
        request: ExportRequest,
        output: Q,
        encoder: E,
        options: BuildOptions,
    ) -> Self
    where
        S: FrameSource,
        F: FnOnce() -> Result<S, GifCutError> + Send + 'static,
        E: GifEncoder + 'static,
        Q: AsRef<Path>,
    {
        let output: PathBuf = output.as_ref().to_path_buf();
        let (sender, progress) = watch::channel(0_u8);
        let token = options.cancellation().cloned().unwrap_or_default();

        let forward = options.progress.clone();
        let options = options
            .with_cancellation(token.clone())
            .with_progress(Arc::new(move |info: &ProgressInfo| {
                forward.on_progress(info);
                sender.send_replace(info.percentage);
            }));

        let handle = tokio::task::spawn_blocking(move || {
            let mut source = open()?;
            GifAssembler::export(&mut source, &request, &output, &encoder, &options)
        });

        Self {
            handle,
            progress,
            token,
        }
    }

    /// A receiver for the latest percentage.
    pub fn progress(&self) -> Receiver<u8> {
        self.progress.clone()
    }

    /// Ask the export to stop. It resolves to [`GifCutError::Cancelled`]
    /// unless it had already finished.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The token the export polls.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    /// `true` once the worker thread has returned.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Future for ExportTask {
    type Output = Result<ExportSummary, GifCutError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle)
            .poll(cx)
            .map(|result| result.unwrap_or_else(|_| Err(GifCutError::Cancelled)))
    }
}
