//! Configuration structures for the palette analysis pipeline.
//!
//! This module defines all tunable parameters, organized into groups for
//! quantization, pencil matching, and export.
//!
//! # Configuration Loading
//!
//! Configuration can be loaded from JSON files or constructed programmatically:
//!
//! ```no_run
//! use pencil_palette::PipelineConfig;
//! use std::path::Path;
//!
//! // Load from file
//! let config = PipelineConfig::from_json_file(Path::new("palette.json"))?;
//!
//! // Or use defaults
//! let config = PipelineConfig::default();
//! # Ok::<(), pencil_palette::PaletteError>(())
//! ```
//!
//! # Configuration Sections
//!
//! - [`QuantizerConfig`]: extraction algorithm, sampling and seed
//! - [`MatchOptions`]: brand restriction and poor-fit threshold
//! - [`ExportMetadata`]: palette name and rendering style

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{export, quantize};
use crate::error::{PaletteError, Result};

/// Complete pipeline configuration for one analysis request.
///
/// Can be serialized to/from JSON for reproducible runs. Missing sections
/// and fields fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Requested number of dominant colors (k)
    pub palette_size: usize,

    /// Quantizer configuration
    pub quantizer: QuantizerConfig,

    /// Pencil matching configuration
    pub matching: MatchOptions,

    /// Export defaults
    pub export: ExportMetadata,
}

/// Color quantization algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    /// Seeded Lloyd k-means in Lab space
    #[default]
    KMeans,
    /// Weighted median cut over the Lab histogram
    MedianCut,
    /// Uniform RGB binning, most populated bins win
    HistogramBinning,
}

/// Quantizer parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantizerConfig {
    /// Extraction algorithm
    pub algorithm: Algorithm,

    /// Sample every n-th pixel on both axes (1 = every pixel)
    pub sample_stride: u32,

    /// Upper bound on sampled pixels; the stride grows until the sample fits.
    /// `None` samples at `sample_stride` regardless of image size.
    pub max_sample_pixels: Option<u64>,

    /// Seed for k-means initialization
    pub random_seed: u64,

    /// Maximum k-means iterations
    pub max_iterations: usize,

    /// k-means convergence threshold (Lab units)
    pub convergence: f32,

    /// Ignore pixels whose mean brightness is outside this open range
    pub brightness_filter: Option<BrightnessRange>,
}

/// Open interval on the mean of the R, G and B channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrightnessRange {
    pub min: u8,
    pub max: u8,
}

impl Default for BrightnessRange {
    fn default() -> Self {
        Self {
            min: quantize::BRIGHTNESS_FILTER_MIN,
            max: quantize::BRIGHTNESS_FILTER_MAX,
        }
    }
}

/// Pencil matching options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchOptions {
    /// Restrict matching to these brands (case-insensitive); `None` = all brands
    pub brand_filter: Option<BTreeSet<String>>,

    /// Distances above this threshold are flagged as poor fits
    pub max_distance: Option<f32>,
}

/// How swatches are named in formats that carry swatch names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorNamingStyle {
    /// "#RRGGBB"
    #[default]
    Hex,
    /// "rgb(r, g, b)"
    Rgb,
    /// "Brand Pencil Name"
    PencilName,
}

/// Export rendering options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportMetadata {
    /// Palette name embedded in formats that carry one
    pub palette_name: String,

    /// Emit match distances in JSON and CSV
    pub include_distance_scores: bool,

    /// Swatch naming style
    pub color_naming_style: ColorNamingStyle,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            palette_size: quantize::DEFAULT_PALETTE_SIZE,
            quantizer: QuantizerConfig::default(),
            matching: MatchOptions::default(),
            export: ExportMetadata::default(),
        }
    }
}

impl Default for QuantizerConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::KMeans,
            sample_stride: 1,
            max_sample_pixels: Some(quantize::DEFAULT_MAX_SAMPLE_PIXELS),
            random_seed: quantize::DEFAULT_SEED,
            max_iterations: quantize::DEFAULT_MAX_ITERATIONS,
            convergence: quantize::DEFAULT_CONVERGENCE,
            brightness_filter: None,
        }
    }
}

impl Default for ExportMetadata {
    fn default() -> Self {
        Self {
            palette_name: export::DEFAULT_PALETTE_NAME.to_string(),
            include_distance_scores: true,
            color_naming_style: ColorNamingStyle::Hex,
        }
    }
}

impl QuantizerConfig {
    /// Stride actually used for a `width` x `height` image: the smallest
    /// stride no finer than `sample_stride` that respects `max_sample_pixels`
    pub fn effective_stride(&self, width: u32, height: u32) -> u32 {
        let mut lo = self.sample_stride.max(1);
        let Some(limit) = self.max_sample_pixels.filter(|&limit| limit > 0) else {
            return lo;
        };

        let sampled = |stride: u32| -> u64 {
            let per_axis = |n: u32| (n as u64).div_ceil(stride as u64);
            per_axis(width) * per_axis(height)
        };
        if sampled(lo) <= limit {
            return lo;
        }

        // One sample per image fits any limit, and the count only shrinks
        // as the stride grows
        let mut hi = width.max(height).max(lo);
        while lo + 1 < hi {
            let mid = lo + (hi - lo) / 2;
            if sampled(mid) <= limit {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        hi
    }

    /// Check parameter ranges
    pub fn validate(&self) -> Result<()> {
        if self.sample_stride == 0 {
            return Err(PaletteError::invalid_parameter("sample_stride", 0));
        }
        if self.max_sample_pixels == Some(0) {
            return Err(PaletteError::invalid_parameter("max_sample_pixels", 0));
        }
        if self.max_iterations == 0 {
            return Err(PaletteError::invalid_parameter("max_iterations", 0));
        }
        if !self.convergence.is_finite() || self.convergence < 0.0 {
            return Err(PaletteError::invalid_parameter(
                "convergence",
                self.convergence,
            ));
        }
        if let Some(range) = self.brightness_filter {
            if range.min >= range.max {
                return Err(PaletteError::invalid_parameter(
                    "brightness_filter",
                    format!("{}..{}", range.min, range.max),
                ));
            }
        }
        Ok(())
    }
}

impl MatchOptions {
    /// Check parameter ranges
    pub fn validate(&self) -> Result<()> {
        if let Some(max) = self.max_distance {
            if !max.is_finite() || max < 0.0 {
                return Err(PaletteError::invalid_parameter("max_distance", max));
            }
        }
        Ok(())
    }
}

/// Check a requested palette size
pub fn validate_palette_size(k: usize) -> Result<()> {
    if k == 0 || k > quantize::MAX_PALETTE_SIZE {
        return Err(PaletteError::invalid_parameter("palette_size", k));
    }
    Ok(())
}

impl PipelineConfig {
    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        validate_palette_size(self.palette_size)?;
        self.quantizer.validate()?;
        self.matching.validate()
    }

    /// Load configuration from JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PaletteError::config(format!("cannot read {}", path.display()), e)
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            PaletteError::config(format!("cannot parse {}", path.display()), e)
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to JSON file
    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| PaletteError::config("cannot serialize configuration", e))?;
        std::fs::write(path, json)
            .map_err(|e| PaletteError::config(format!("cannot write {}", path.display()), e))
    }
}
