//! Output settings, presets, and build options.
//!
//! [`OutputSpec`] says what the GIF should look like. [`BuildOptions`]
//! carries the operational side (progress, cancellation, reporting cadence)
//! without widening every function signature.
//!
//! # Example
//!
//! ```
//! use gifcut::{Dimensions, OutputSpec};
//!
//! let spec = OutputSpec::new(15, Dimensions::new(640, 360))
//!     .with_quality(0.85)
//!     .with_speed_factor(2.0)
//!     .with_loop(false);
//! spec.validate()?;
//! assert_eq!(spec.quantization_level(), 15);
//! assert_eq!(spec.loop_flag(), 1);
//! # Ok::<(), gifcut::GifCutError>(())
//! ```

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::sync::Arc;

use crate::error::GifCutError;
use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};
use crate::transform::{CropRect, Dimensions};

/// Default output quality.
pub const DEFAULT_QUALITY: f32 = 0.9;

/// Speed range the interactive slider offered; values outside still work.
pub const RECOMMENDED_SPEED_RANGE: (f64, f64) = (0.25, 4.0);

/// Largest side a GIF logical screen can have.
const MAX_GIF_SIDE: u32 = u16::MAX as u32;

/// What the exported GIF should look like.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSpec {
    /// Output frames per second.
    pub fps: u32,
    /// Output frame size.
    pub dimensions: Dimensions,
    /// 0.0 (smallest) to 1.0 (best).
    pub quality: f32,
    /// Loop forever, or play once.
    pub loop_forever: bool,
    /// Playback speed multiplier; above 1 is fast-forward.
    pub speed_factor: f64,
    /// Region of the source to keep, in source pixels.
    pub crop: Option<CropRect>,
}

impl OutputSpec {
    /// A looping, full-frame spec at quality 0.9 and normal speed.
    pub fn new(fps: u32, dimensions: Dimensions) -> Self {
        Self {
            fps,
            dimensions,
            quality: DEFAULT_QUALITY,
            loop_forever: true,
            speed_factor: 1.0,
            crop: None,
        }
    }

    /// Set the quality.
    #[must_use]
    pub fn with_quality(mut self, quality: f32) -> Self {
        self.quality = quality;
        self
    }

    /// Loop forever (`true`) or play once.
    #[must_use]
    pub fn with_loop(mut self, loop_forever: bool) -> Self {
        self.loop_forever = loop_forever;
        self
    }

    /// Set the speed multiplier.
    #[must_use]
    pub fn with_speed_factor(mut self, speed_factor: f64) -> Self {
        self.speed_factor = speed_factor;
        self
    }

    /// Crop the source before resizing.
    #[must_use]
    pub fn with_crop(mut self, crop: CropRect) -> Self {
        self.crop = Some(crop);
        self
    }

    /// Check every field.
    ///
    /// # Errors
    ///
    /// [`GifCutError::InvalidFrameRate`], [`GifCutError::InvalidDimensions`],
    /// [`GifCutError::InvalidQuality`], or [`GifCutError::InvalidSpeedFactor`].
    pub fn validate(&self) -> Result<(), GifCutError> {
        if self.fps == 0 {
            return Err(GifCutError::InvalidFrameRate);
        }
        let Dimensions { width, height } = self.dimensions;
        if self.dimensions.is_empty() || width > MAX_GIF_SIDE || height > MAX_GIF_SIDE {
            return Err(GifCutError::InvalidDimensions { width, height });
        }
        if !self.quality.is_finite() || !(0.0..=1.0).contains(&self.quality) {
            return Err(GifCutError::InvalidQuality(self.quality));
        }
        if !self.speed_factor.is_finite() || self.speed_factor <= 0.0 {
            return Err(GifCutError::InvalidSpeedFactor(self.speed_factor));
        }
        Ok(())
    }

    /// `round(100 - quality * 100)`: 0 is best, 100 is most lossy.
    pub fn quantization_level(&self) -> u8 {
        let level = (100.0 - f64::from(self.quality) * 100.0).round();
        level.clamp(0.0, 100.0) as u8
    }

    /// Encoder loop flag: 0 loops forever, 1 plays once.
    pub fn loop_flag(&self) -> u8 {
        if self.loop_forever { 0 } else { 1 }
    }
}

/// Output size choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionPreset {
    /// Keep the base size.
    Original,
    /// 720 pixels tall.
    P720,
    /// 480 pixels tall.
    P480,
    /// 360 pixels tall.
    P360,
    /// 240 pixels tall.
    P240,
    /// Exact size.
    Custom(Dimensions),
}

impl ResolutionPreset {
    /// Every named preset, largest first.
    pub const NAMED: [ResolutionPreset; 5] = [
        ResolutionPreset::Original,
        ResolutionPreset::P720,
        ResolutionPreset::P480,
        ResolutionPreset::P360,
        ResolutionPreset::P240,
    ];

    fn height(self) -> Option<u32> {
        match self {
            ResolutionPreset::P720 => Some(720),
            ResolutionPreset::P480 => Some(480),
            ResolutionPreset::P360 => Some(360),
            ResolutionPreset::P240 => Some(240),
            ResolutionPreset::Original | ResolutionPreset::Custom(_) => None,
        }
    }

    /// Resolve against the base size (the crop, or the full source).
    ///
    /// Height presets derive the width from the base aspect ratio, or from
    /// 16:9 when `maintain_aspect` is off.
    pub fn resolve(self, base: Dimensions, maintain_aspect: bool) -> Dimensions {
        match (self, self.height()) {
            (ResolutionPreset::Custom(dimensions), _) => dimensions,
            (_, Some(height)) => {
                let width = if maintain_aspect && base.height > 0 {
                    (height as f64 * base.width as f64 / base.height as f64) as u32
                } else {
                    height * 16 / 9
                };
                Dimensions::new(width.max(1), height)
            }
            _ => base,
        }
    }
}

impl Display for ResolutionPreset {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match (self, self.height()) {
            (ResolutionPreset::Original, _) => write!(f, "original"),
            (ResolutionPreset::Custom(dimensions), _) => write!(f, "{dimensions}"),
            (_, Some(height)) => write!(f, "{height}p"),
            (_, None) => Ok(()),
        }
    }
}

impl FromStr for ResolutionPreset {
    type Err = String;

    /// Accepts `original`, `720p` (or `720`), and `WIDTHxHEIGHT`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim().to_ascii_lowercase();
        match value.trim_end_matches('p') {
            "original" => return Ok(ResolutionPreset::Original),
            "720" => return Ok(ResolutionPreset::P720),
            "480" => return Ok(ResolutionPreset::P480),
            "360" => return Ok(ResolutionPreset::P360),
            "240" => return Ok(ResolutionPreset::P240),
            _ => {}
        }
        if let Some((width, height)) = value.split_once('x') {
            let width = width
                .parse::<u32>()
                .map_err(|_| format!("invalid width in resolution: {value}"))?;
            let height = height
                .parse::<u32>()
                .map_err(|_| format!("invalid height in resolution: {value}"))?;
            return Ok(ResolutionPreset::Custom(Dimensions::new(width, height)));
        }
        Err(format!("unknown resolution: {value}"))
    }
}

/// A named combination of frame rate, quality, size, and speed.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPreset {
    /// Display name.
    pub name: String,
    /// Output frames per second.
    pub fps: u32,
    /// Output quality.
    pub quality: f32,
    /// Output size.
    pub resolution: ResolutionPreset,
    /// Speed multiplier.
    pub speed_factor: f64,
}

impl ExportPreset {
    /// The three presets every installation ships with.
    pub fn builtin() -> Vec<ExportPreset> {
        vec![
            ExportPreset {
                name: "High Quality".to_string(),
                fps: 30,
                quality: 0.95,
                resolution: ResolutionPreset::Original,
                speed_factor: 1.0,
            },
            ExportPreset {
                name: "Balanced".to_string(),
                fps: 20,
                quality: 0.85,
                resolution: ResolutionPreset::P720,
                speed_factor: 1.0,
            },
            ExportPreset {
                name: "Compressed".to_string(),
                fps: 15,
                quality: 0.70,
                resolution: ResolutionPreset::P480,
                speed_factor: 1.0,
            },
        ]
    }

    /// Find a built-in preset by name, ignoring case, spaces, dashes, and
    /// underscores.
    pub fn find(name: &str) -> Option<ExportPreset> {
        let key = normalize_preset_name(name);
        Self::builtin()
            .into_iter()
            .find(|preset| normalize_preset_name(&preset.name) == key)
    }

    /// Turn the preset into an output spec for a given base size.
    pub fn to_output_spec(&self, base: Dimensions, maintain_aspect: bool) -> OutputSpec {
        OutputSpec::new(self.fps, self.resolution.resolve(base, maintain_aspect))
            .with_quality(self.quality)
            .with_speed_factor(self.speed_factor)
    }
}

fn normalize_preset_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Operational settings for builds, exports, and thumbnail runs.
#[derive(Clone)]
pub struct BuildOptions {
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
    pub(crate) batch_size: u64,
    pub(crate) progress_band: (u8, u8),
}

impl Debug for BuildOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("BuildOptions")
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .field("progress_band", &self.progress_band)
            .finish()
    }
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildOptions {
    /// No callback, no cancellation, report every frame, sampling spans 0–90.
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
            progress_band: (0, 90),
        }
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Report every `size` sampled frames. Clamped to at least 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Percentage band the sampling phase of an export spans. The encode
    /// phase takes the rest up to 100.
    #[must_use]
    pub fn with_progress_band(mut self, low: u8, high: u8) -> Self {
        let low = low.min(100);
        self.progress_band = (low, high.clamp(low, 100));
        self
    }

    /// The cancellation token, if any.
    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancellation.as_ref()
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }

    pub(crate) fn check_cancelled(&self) -> Result<(), GifCutError> {
        if self.is_cancelled() {
            return Err(GifCutError::Cancelled);
        }
        Ok(())
    }
}
