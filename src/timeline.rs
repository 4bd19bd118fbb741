//! Time ranges and segment planning.
//!
//! A trim is described by one primary [`TimeRange`] and any number of
//! excluded ranges. [`effective_segments`] subtracts the exclusions from the
//! primary range and returns the ordered, disjoint pieces that end up in the
//! output.
//!
//! # Example
//!
//! ```
//! use gifcut::{ExcludedSegments, TimeRange, effective_segments};
//!
//! let primary = TimeRange::new(0.0, 20.0)?;
//! let mut excluded = ExcludedSegments::new();
//! excluded.add(TimeRange::new(5.0, 8.0)?);
//!
//! let segments = effective_segments(&primary, excluded.as_slice());
//! assert_eq!(segments.len(), 2);
//! assert_eq!((segments[1].start(), segments[1].end()), (8.0, 20.0));
//! # Ok::<(), gifcut::GifCutError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::error::GifCutError;

/// A half-open span of source time in seconds, `start < end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    start: f64,
    end: f64,
}

impl TimeRange {
    /// Create a range.
    ///
    /// # Errors
    ///
    /// Returns [`GifCutError::InvalidRange`] if either bound is not finite,
    /// `start` is negative, or `start >= end`.
    pub fn new(start: f64, end: f64) -> Result<Self, GifCutError> {
        if !start.is_finite() || !end.is_finite() || start < 0.0 || start >= end {
            return Err(GifCutError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Start in seconds.
    pub fn start(&self) -> f64 {
        self.start
    }

    /// End in seconds.
    pub fn end(&self) -> f64 {
        self.end
    }

    /// Length in seconds, always positive.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// `true` if `seconds` lies in `[start, end)`.
    pub fn contains(&self, seconds: f64) -> bool {
        seconds >= self.start && seconds < self.end
    }

    /// `true` if the two ranges share a span of positive length.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// The overlapping part of two ranges, if any.
    pub fn intersection(&self, other: &TimeRange) -> Option<TimeRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start < end).then_some(TimeRange { start, end })
    }
}

impl Display for TimeRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{} - {}",
            format_timecode(self.start),
            format_timecode(self.end)
        )
    }
}

/// Format seconds as `MM:SS.ss`. Minutes keep counting past 59.
///
/// ```
/// assert_eq!(gifcut::format_timecode(75.5), "01:15.50");
/// ```
pub fn format_timecode(seconds: f64) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let centiseconds = (seconds * 100.0).round() as u64;
    let minutes = centiseconds / 6000;
    let remainder = centiseconds % 6000;
    format!("{minutes:02}:{:02}.{:02}", remainder / 100, remainder % 100)
}

/// Sort ranges by start and merge every pair with `a.start <= b.end`.
///
/// Touching ranges merge. The result is ordered, non-overlapping, and
/// merging it again returns it unchanged.
pub fn merge_ranges(ranges: &[TimeRange]) -> Vec<TimeRange> {
    let mut sorted = ranges.to_vec();
    sorted.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut merged: Vec<TimeRange> = Vec::with_capacity(sorted.len());
    for range in sorted {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => {
                last.end = last.end.max(range.end);
            }
            _ => merged.push(range),
        }
    }
    merged
}

/// Ranges the user removed from the primary trim.
///
/// Every mutation re-merges the set, so [`as_slice`](Self::as_slice) is
/// always sorted and free of overlaps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExcludedSegments {
    ranges: Vec<TimeRange>,
}

impl ExcludedSegments {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a merged set from arbitrary ranges.
    pub fn from_ranges(ranges: &[TimeRange]) -> Self {
        Self {
            ranges: merge_ranges(ranges),
        }
    }

    /// Add a range and re-merge.
    pub fn add(&mut self, range: TimeRange) {
        self.ranges.push(range);
        self.ranges = merge_ranges(&self.ranges);
    }

    /// Remove every range.
    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    /// The merged ranges, sorted by start.
    pub fn as_slice(&self) -> &[TimeRange] {
        &self.ranges
    }

    /// Number of merged ranges.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// `true` if nothing is excluded.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Iterate over the merged ranges.
    pub fn iter(&self) -> impl Iterator<Item = &TimeRange> {
        self.ranges.iter()
    }
}

/// Subtract `excluded` from `primary`.
///
/// Exclusions may be unsorted, overlapping, duplicated, or partly outside
/// the primary range. The result is ordered by start, pairwise disjoint,
/// contained in `primary`, and every segment has positive duration. An
/// exclusion covering the whole primary range yields an empty list.
pub fn effective_segments(primary: &TimeRange, excluded: &[TimeRange]) -> Vec<TimeRange> {
    let mut sorted = excluded.to_vec();
    sorted.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut segments = Vec::new();
    let mut cursor = primary.start;

    for range in sorted.iter().filter_map(|range| range.intersection(primary)) {
        if range.start > cursor {
            segments.push(TimeRange {
                start: cursor,
                end: range.start,
            });
        }
        // Unmerged input can hold a range nested in an earlier one.
        cursor = cursor.max(range.end);
    }

    if cursor < primary.end {
        segments.push(TimeRange {
            start: cursor,
            end: primary.end,
        });
    }

    log::debug!(
        "Planned {} effective segment(s) from {primary} minus {} exclusion(s)",
        segments.len(),
        excluded.len(),
    );
    segments
}

/// Seconds of source time left after subtracting `excluded` from `primary`.
pub fn effective_duration(primary: &TimeRange, excluded: &[TimeRange]) -> f64 {
    effective_segments(primary, excluded)
        .iter()
        .map(TimeRange::duration)
        .sum()
}
