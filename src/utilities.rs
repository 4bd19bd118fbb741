//! Internal helpers shared by the FFmpeg-backed modules.

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// FFmpeg's internal time base, in ticks per second.
pub(crate) const AV_TIME_BASE: f64 = 1_000_000.0;

/// Timestamp value FFmpeg uses for "unknown".
pub(crate) const NO_PTS: i64 = i64::MIN;

/// Copy the first plane of a packed RGB24 frame into a tightly-packed buffer.
///
/// Frames usually carry per-row padding (stride > width * 3); this strips it
/// so the result can go straight into [`image::RgbImage::from_raw`].
pub(crate) fn frame_to_rgb_buffer(video_frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_bytes = width as usize * 3;
    let rows = height as usize;
    let data = video_frame.data(0);

    if stride == row_bytes {
        return data[..row_bytes * rows].to_vec();
    }

    let mut buffer = Vec::with_capacity(row_bytes * rows);
    for row in 0..rows {
        let row_start = row * stride;
        buffer.extend_from_slice(&data[row_start..row_start + row_bytes]);
    }
    buffer
}

/// A rational as `f64`, or `None` when it is zero, negative, or undefined.
pub(crate) fn positive_rate(rate: Rational) -> Option<f64> {
    if rate.numerator() <= 0 || rate.denominator() <= 0 {
        return None;
    }
    Some(rate.numerator() as f64 / rate.denominator() as f64)
}

/// Convert a timestamp in `time_base` units to seconds.
pub(crate) fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Nearest frame index for a timestamp, measured from `start_pts`.
pub(crate) fn pts_to_frame_number(
    pts: i64,
    start_pts: i64,
    time_base: Rational,
    frames_per_second: f64,
) -> u64 {
    let seconds = pts_to_seconds(pts.saturating_sub(start_pts), time_base);
    (seconds * frames_per_second).round().max(0.0) as u64
}

/// Container-level seek target, in [`AV_TIME_BASE`] units, for a frame index.
pub(crate) fn frame_number_to_seek_target(
    frame_number: u64,
    frames_per_second: f64,
    start_pts: i64,
    time_base: Rational,
) -> i64 {
    let seconds = pts_to_seconds(start_pts, time_base) + frame_number as f64 / frames_per_second;
    (seconds * AV_TIME_BASE).round() as i64
}
