//! Frame sampling tests.

use gifcut::{FrameRateMode, encoder_frame_rate, output_frame_count, sample_plan};

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

// ── Sample counts ──────────────────────────────────────────────────

#[test]
fn normal_speed_samples_every_tenth_of_a_second() {
    let plan = sample_plan(10.0, 30.0, 10.0, 1.0);
    assert_eq!(plan.len(), 100);
    assert_close(plan.time_step(), 0.1);
    for (index, offset) in plan.offsets().iter().enumerate() {
        assert_close(*offset, index as f64 / 10.0);
    }
    assert_close(*plan.offsets().last().unwrap(), 9.9);
}

#[test]
fn double_speed_halves_the_samples() {
    let plan = sample_plan(10.0, 30.0, 10.0, 2.0);
    assert_eq!(plan.len(), 50);
    assert_close(plan.time_step(), 0.2);
    assert_close(*plan.offsets().last().unwrap(), 9.8);
}

#[test]
fn half_speed_doubles_the_samples() {
    let plan = sample_plan(10.0, 30.0, 10.0, 0.5);
    assert_eq!(plan.len(), 200);
    assert_close(plan.time_step(), 0.05);
}

#[test]
fn fast_forward_short_range() {
    let plan = sample_plan(4.0, 30.0, 10.0, 4.0);
    assert_eq!(plan.len(), 10);
    assert_close(plan.time_step(), 0.4);
    assert_close(plan.offsets()[0], 0.0);
    assert_close(*plan.offsets().last().unwrap(), 3.6);
}

#[test]
fn offsets_stay_inside_the_segment() {
    for (duration, fps, speed) in [(3.7, 12.0, 1.3), (0.9, 24.0, 0.25), (61.0, 15.0, 4.0)] {
        let plan = sample_plan(duration, 30.0, fps, speed);
        assert_eq!(plan.len(), output_frame_count(duration, fps, speed));
        for offset in plan.offsets() {
            assert!(*offset >= 0.0 && *offset < duration);
        }
        for pair in plan.offsets().windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }
}

#[test]
fn frame_count_absorbs_rounding_error() {
    assert_eq!(output_frame_count(0.3, 10.0, 1.0), 3);
    assert_eq!(output_frame_count(5.0, 15.0, 1.0), 75);
    assert_eq!(output_frame_count(12.0, 15.0, 1.0), 180);
}

#[test]
fn degenerate_inputs_give_empty_plans() {
    assert_eq!(output_frame_count(0.0, 10.0, 1.0), 0);
    assert_eq!(output_frame_count(5.0, 10.0, 0.0), 0);
    assert_eq!(output_frame_count(5.0, 10.0, -1.0), 0);
    assert_eq!(output_frame_count(5.0, 10.0, f64::NAN), 0);

    let plan = sample_plan(0.05, 30.0, 10.0, 1.0);
    assert!(plan.is_empty());
    assert_eq!(plan.time_step(), 0.0);
    assert!(plan.frame_numbers(0.0).is_empty());
}

// ── Timestamps and frame numbers ───────────────────────────────────

#[test]
fn timestamps_are_offset_by_the_segment_start() {
    let plan = sample_plan(1.0, 30.0, 10.0, 1.0);
    let timestamps: Vec<f64> = plan.timestamps(2.0).collect();
    assert_eq!(timestamps.len(), 10);
    assert_close(timestamps[0], 2.0);
    assert_close(timestamps[9], 2.9);
}

#[test]
fn frame_numbers_round_to_the_nearest_source_frame() {
    let plan = sample_plan(1.0, 30.0, 10.0, 1.0);
    let frames = plan.frame_numbers(2.0);
    let expected: Vec<u64> = (0..10).map(|k| 60 + 3 * k).collect();
    assert_eq!(frames, expected);
}

// ── Encoder frame rate ─────────────────────────────────────────────

#[test]
fn frame_rate_mode_follows_exclusions() {
    assert_eq!(FrameRateMode::for_exclusions(0), FrameRateMode::SingleRange);
    assert_eq!(FrameRateMode::for_exclusions(1), FrameRateMode::Segmented);
    assert_eq!(FrameRateMode::for_exclusions(4), FrameRateMode::Segmented);
}

#[test]
fn single_range_scales_the_rate_by_speed() {
    assert_close(encoder_frame_rate(15, 2.0, FrameRateMode::SingleRange), 30.0);
    assert_close(encoder_frame_rate(10, 0.5, FrameRateMode::SingleRange), 5.0);
}

#[test]
fn segmented_output_keeps_the_target_rate() {
    assert_close(encoder_frame_rate(15, 2.0, FrameRateMode::Segmented), 15.0);
    assert_close(encoder_frame_rate(10, 0.5, FrameRateMode::Segmented), 10.0);
}
