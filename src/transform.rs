//! Crop and resize of decoded frames.
//!
//! [`apply`] crops first, in source pixel coordinates, then resizes to the
//! output shape. [`conform`] is the resize-only path the assembler uses to
//! repair frames whose shape drifted.

use std::fmt::{Display, Formatter, Result as FmtResult};

use image::imageops::{self, FilterType};

use crate::source::FrameBuffer;

/// The single interpolation filter used for every resize.
pub const RESIZE_FILTER: FilterType = FilterType::Triangle;

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create a new pair.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Shape of an existing frame.
    pub fn of(frame: &FrameBuffer) -> Self {
        Self::new(frame.width(), frame.height())
    }

    /// `true` if either side is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Pixel count.
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl Display for Dimensions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A crop rectangle in source pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl CropRect {
    /// Create a new rectangle.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Shape of the rectangle.
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    /// Clamp the rectangle into a `frame_width` x `frame_height` frame.
    ///
    /// Returns `None` when nothing of the rectangle lies inside the frame.
    pub fn clamp_to(&self, frame_width: u32, frame_height: u32) -> Option<CropRect> {
        let x = self.x.min(frame_width);
        let y = self.y.min(frame_height);
        let width = self.width.min(frame_width - x);
        let height = self.height.min(frame_height - y);
        (width > 0 && height > 0).then_some(CropRect::new(x, y, width, height))
    }

    /// `true` if clamping into the frame changes the rectangle.
    pub fn exceeds(&self, frame_width: u32, frame_height: u32) -> bool {
        self.clamp_to(frame_width, frame_height) != Some(*self)
    }
}

/// Crop (when given) then resize to `target`.
///
/// A crop that clamps to an empty area is ignored and the full frame is
/// used instead.
pub fn apply(frame: FrameBuffer, crop: Option<&CropRect>, target: Dimensions) -> FrameBuffer {
    let cropped = match crop {
        Some(rect) => match rect.clamp_to(frame.width(), frame.height()) {
            Some(clamped) if clamped.dimensions() == Dimensions::of(&frame) => frame,
            Some(clamped) => {
                imageops::crop_imm(&frame, clamped.x, clamped.y, clamped.width, clamped.height)
                    .to_image()
            }
            None => {
                log::warn!(
                    "Crop {rect:?} lies outside the {} frame; using the full frame",
                    Dimensions::of(&frame),
                );
                frame
            }
        },
        None => frame,
    };

    conform(cropped, target)
}

/// Resize `frame` to `target` if its shape differs.
pub fn conform(frame: FrameBuffer, target: Dimensions) -> FrameBuffer {
    if Dimensions::of(&frame) == target || target.is_empty() {
        return frame;
    }
    imageops::resize(&frame, target.width, target.height, RESIZE_FILTER)
}
