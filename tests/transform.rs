//! Crop and resize tests.

use gifcut::transform::{apply, conform};
use gifcut::{CropRect, Dimensions, FrameBuffer};
use image::Rgb;

/// 8x8 frame whose pixel at (x, y) is `[x * 10, y * 10, 0]`.
fn gradient() -> FrameBuffer {
    FrameBuffer::from_fn(8, 8, |x, y| Rgb([(x * 10) as u8, (y * 10) as u8, 0]))
}

// ── Dimensions and CropRect ────────────────────────────────────────

#[test]
fn dimensions_basics() {
    let dimensions = Dimensions::new(640, 360);
    assert_eq!(dimensions.to_string(), "640x360");
    assert_eq!(dimensions.area(), 230_400);
    assert!(!dimensions.is_empty());
    assert!(Dimensions::new(0, 10).is_empty());
    assert_eq!(Dimensions::of(&gradient()), Dimensions::new(8, 8));
}

#[test]
fn crop_inside_the_frame_is_unchanged() {
    let crop = CropRect::new(2, 3, 4, 2);
    assert_eq!(crop.clamp_to(8, 8), Some(crop));
    assert!(!crop.exceeds(8, 8));
    assert_eq!(crop.dimensions(), Dimensions::new(4, 2));
}

#[test]
fn crop_past_the_edge_is_clamped() {
    let crop = CropRect::new(6, 6, 10, 10);
    assert_eq!(crop.clamp_to(8, 8), Some(CropRect::new(6, 6, 2, 2)));
    assert!(crop.exceeds(8, 8));
}

#[test]
fn crop_outside_the_frame_clamps_to_nothing() {
    assert_eq!(CropRect::new(20, 20, 4, 4).clamp_to(8, 8), None);
    assert_eq!(CropRect::new(0, 0, 0, 4).clamp_to(8, 8), None);
}

// ── apply ──────────────────────────────────────────────────────────

#[test]
fn apply_without_crop_at_source_size_keeps_pixels() {
    let frame = gradient();
    let output = apply(frame.clone(), None, Dimensions::new(8, 8));
    assert_eq!(output, frame);
}

#[test]
fn apply_crops_in_source_coordinates() {
    let output = apply(
        gradient(),
        Some(&CropRect::new(2, 3, 4, 2)),
        Dimensions::new(4, 2),
    );
    assert_eq!(output.dimensions(), (4, 2));
    assert_eq!(*output.get_pixel(0, 0), Rgb([20, 30, 0]));
    assert_eq!(*output.get_pixel(3, 1), Rgb([50, 40, 0]));
}

#[test]
fn apply_clamps_an_oversized_crop() {
    let output = apply(
        gradient(),
        Some(&CropRect::new(6, 6, 10, 10)),
        Dimensions::new(2, 2),
    );
    assert_eq!(*output.get_pixel(0, 0), Rgb([60, 60, 0]));
    assert_eq!(*output.get_pixel(1, 1), Rgb([70, 70, 0]));
}

#[test]
fn apply_ignores_a_crop_outside_the_frame() {
    let frame = gradient();
    let output = apply(
        frame.clone(),
        Some(&CropRect::new(20, 20, 4, 4)),
        Dimensions::new(8, 8),
    );
    assert_eq!(output, frame);
}

#[test]
fn apply_resizes_to_the_target() {
    let output = apply(gradient(), Some(&CropRect::new(0, 0, 8, 4)), Dimensions::new(16, 8));
    assert_eq!(output.dimensions(), (16, 8));

    let output = apply(gradient(), None, Dimensions::new(3, 5));
    assert_eq!(output.dimensions(), (3, 5));
}

// ── conform ────────────────────────────────────────────────────────

#[test]
fn conform_keeps_uniform_colour() {
    let frame = FrameBuffer::from_pixel(20, 10, Rgb([200, 100, 50]));
    let output = conform(frame, Dimensions::new(7, 3));
    assert_eq!(output.dimensions(), (7, 3));
    for pixel in output.pixels() {
        for (actual, expected) in pixel.0.iter().zip([200_u8, 100, 50]) {
            assert!(actual.abs_diff(expected) <= 1);
        }
    }
}

#[test]
fn conform_with_an_empty_target_leaves_the_frame_alone() {
    let frame = gradient();
    assert_eq!(conform(frame.clone(), Dimensions::new(0, 0)), frame);
}
