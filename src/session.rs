//! Editing session state.
//!
//! An [`EditSession`] owns at most one source and the trim selection made
//! on it. Opening another file closes the current one first and resets the
//! selection to the new source's full range. Every build runs on a snapshot
//! ([`ExportRequest`]) taken when it starts; since builds borrow the session
//! mutably, the selection cannot change while one is in flight.
//!
//! # Example
//!
//! ```no_run
//! use gifcut::{BuildOptions, Dimensions, EditSession, GifWriter, OutputSpec, TimeRange};
//!
//! let mut session = EditSession::new();
//! session.open("input.mp4")?;
//! session.set_primary(TimeRange::new(2.0, 12.0)?)?;
//! session.exclude(TimeRange::new(5.0, 6.5)?)?;
//!
//! let output = OutputSpec::new(15, Dimensions::new(480, 270));
//! session.export(output, "clip.gif", &GifWriter::new(), &BuildOptions::new())?;
//! # Ok::<(), gifcut::GifCutError>(())
//! ```

use std::path::Path;

use crate::assembler::{AssembledFrames, ExportRequest, ExportSummary, GifAssembler};
use crate::configuration::{BuildOptions, OutputSpec};
use crate::error::GifCutError;
use crate::gif::GifEncoder;
use crate::media::{DecodeStrategy, MediaSource};
use crate::metadata::VideoMetadata;
use crate::source::{FrameBuffer, FrameSource};
use crate::thumbnail::{ThumbnailGenerator, ThumbnailOptions};
use crate::timeline::{self, ExcludedSegments, TimeRange};

/// A primary trim range and the ranges excluded from it.
#[derive(Debug, Clone, PartialEq)]
pub struct TrimSelection {
    primary: TimeRange,
    excluded: ExcludedSegments,
}

impl TrimSelection {
    /// A selection with nothing excluded.
    pub fn new(primary: TimeRange) -> Self {
        Self {
            primary,
            excluded: ExcludedSegments::new(),
        }
    }

    /// The trim window.
    pub fn primary(&self) -> &TimeRange {
        &self.primary
    }

    /// The merged exclusions.
    pub fn excluded(&self) -> &ExcludedSegments {
        &self.excluded
    }

    /// Replace the trim window. Clears every exclusion.
    pub fn set_primary(&mut self, primary: TimeRange) {
        self.primary = primary;
        self.excluded.clear();
    }

    /// Exclude a range; overlapping exclusions merge.
    pub fn exclude(&mut self, range: TimeRange) {
        self.excluded.add(range);
    }

    /// Drop all exclusions.
    pub fn clear_exclusions(&mut self) {
        self.excluded.clear();
    }

    /// Surviving pieces of the trim window.
    pub fn effective_segments(&self) -> Vec<TimeRange> {
        timeline::effective_segments(&self.primary, self.excluded.as_slice())
    }

    /// Seconds that survive the exclusions.
    pub fn effective_duration(&self) -> f64 {
        timeline::effective_duration(&self.primary, self.excluded.as_slice())
    }

    /// Freeze the selection together with an output spec.
    pub fn snapshot(&self, output: OutputSpec) -> ExportRequest {
        ExportRequest::new(self.primary, self.excluded.clone(), output)
    }
}

/// One loaded source and its selection.
#[derive(Debug)]
pub struct EditSession<S: FrameSource = MediaSource> {
    loaded: Option<(S, TrimSelection)>,
}

impl<S: FrameSource> Default for EditSession<S> {
    fn default() -> Self {
        Self { loaded: None }
    }
}

impl EditSession<MediaSource> {
    /// Open a file, closing the current source first.
    ///
    /// # Errors
    ///
    /// [`GifCutError::FileOpen`] if the file cannot be opened. The session
    /// is left empty in that case.
    pub fn open<P: AsRef<Path>>(&mut self, path: P) -> Result<&VideoMetadata, GifCutError> {
        self.open_with_strategy(path, None)
    }

    /// Like [`open`](Self::open) with a forced decode strategy.
    ///
    /// # Errors
    ///
    /// Same as [`open`](Self::open).
    pub fn open_with_strategy<P: AsRef<Path>>(
        &mut self,
        path: P,
        strategy: Option<DecodeStrategy>,
    ) -> Result<&VideoMetadata, GifCutError> {
        self.close();
        let source = MediaSource::open_with_strategy(path, strategy)?;
        self.load(source)
    }
}

impl<S: FrameSource> EditSession<S> {
    /// An empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a source, releasing the previous one first. The selection
    /// becomes the source's full range.
    ///
    /// # Errors
    ///
    /// [`GifCutError::InvalidRange`] if the source has zero duration.
    pub fn load(&mut self, source: S) -> Result<&VideoMetadata, GifCutError> {
        self.close();
        let selection = TrimSelection::new(source.metadata().full_range()?);
        let (source, _) = self.loaded.insert((source, selection));
        Ok(source.metadata())
    }

    /// Release the current source, if any.
    pub fn close(&mut self) {
        if self.loaded.take().is_some() {
            log::debug!("Closed the current source");
        }
    }

    /// `true` if a source is loaded.
    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// Metadata of the loaded source.
    pub fn metadata(&self) -> Option<&VideoMetadata> {
        self.loaded.as_ref().map(|(source, _)| source.metadata())
    }

    /// The current selection.
    pub fn selection(&self) -> Option<&TrimSelection> {
        self.loaded.as_ref().map(|(_, selection)| selection)
    }

    /// The current selection, for editing in place.
    pub fn selection_mut(&mut self) -> Option<&mut TrimSelection> {
        self.loaded.as_mut().map(|(_, selection)| selection)
    }

    fn loaded_mut(&mut self) -> Result<&mut (S, TrimSelection), GifCutError> {
        self.loaded.as_mut().ok_or(GifCutError::NoSourceLoaded)
    }

    /// Replace the trim window and clear exclusions.
    ///
    /// # Errors
    ///
    /// [`GifCutError::NoSourceLoaded`].
    pub fn set_primary(&mut self, primary: TimeRange) -> Result<(), GifCutError> {
        self.loaded_mut()?.1.set_primary(primary);
        Ok(())
    }

    /// Add an exclusion.
    ///
    /// # Errors
    ///
    /// [`GifCutError::NoSourceLoaded`].
    pub fn exclude(&mut self, range: TimeRange) -> Result<(), GifCutError> {
        self.loaded_mut()?.1.exclude(range);
        Ok(())
    }

    /// Drop all exclusions.
    ///
    /// # Errors
    ///
    /// [`GifCutError::NoSourceLoaded`].
    pub fn clear_exclusions(&mut self) -> Result<(), GifCutError> {
        self.loaded_mut()?.1.clear_exclusions();
        Ok(())
    }

    /// Snapshot the selection for a build.
    ///
    /// # Errors
    ///
    /// [`GifCutError::NoSourceLoaded`].
    pub fn request(&self, output: OutputSpec) -> Result<ExportRequest, GifCutError> {
        self.selection()
            .map(|selection| selection.snapshot(output))
            .ok_or(GifCutError::NoSourceLoaded)
    }

    /// Build preview frames from the current selection.
    ///
    /// # Errors
    ///
    /// [`GifCutError::NoSourceLoaded`] or anything
    /// [`GifAssembler::preview`] returns.
    pub fn preview(
        &mut self,
        output: OutputSpec,
        options: &BuildOptions,
    ) -> Result<AssembledFrames, GifCutError> {
        let (source, selection) = self.loaded_mut()?;
        let request = selection.snapshot(output);
        GifAssembler::preview(source, &request, options)
    }

    /// Export the current selection.
    ///
    /// # Errors
    ///
    /// [`GifCutError::NoSourceLoaded`] or anything
    /// [`GifAssembler::export`] returns.
    pub fn export<E, P>(
        &mut self,
        output: OutputSpec,
        path: P,
        encoder: &E,
        options: &BuildOptions,
    ) -> Result<ExportSummary, GifCutError>
    where
        E: GifEncoder + ?Sized,
        P: AsRef<Path>,
    {
        let (source, selection) = self.loaded_mut()?;
        let request = selection.snapshot(output);
        GifAssembler::export(source, &request, path, encoder, options)
    }

    /// Timeline thumbnails of the loaded source.
    ///
    /// # Errors
    ///
    /// [`GifCutError::NoSourceLoaded`].
    pub fn thumbnails(
        &mut self,
        options: &ThumbnailOptions,
    ) -> Result<Vec<FrameBuffer>, GifCutError> {
        let (source, _) = self.loaded_mut()?;
        Ok(ThumbnailGenerator::thumbnails(source, options))
    }
}
