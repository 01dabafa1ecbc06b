//! Pinned defaults and reference values for palette analysis
//!
//! Every value here is part of the reproducibility contract: exports and
//! tests depend on them staying fixed.

/// Quantizer defaults
pub mod quantize {
    /// Default number of dominant colors to extract
    pub const DEFAULT_PALETTE_SIZE: usize = 8;

    /// Largest supported palette (k-means labels are stored as `u8`)
    pub const MAX_PALETTE_SIZE: usize = 255;

    /// Default seed for k-means initialization
    pub const DEFAULT_SEED: u64 = 42;

    /// Maximum Lloyd iterations for k-means
    pub const DEFAULT_MAX_ITERATIONS: usize = 20;

    /// k-means convergence threshold in Lab units
    pub const DEFAULT_CONVERGENCE: f32 = 1e-4;

    /// Initial bits per channel for histogram binning
    pub const BINNING_START_BITS: u32 = 4;

    /// Mean-brightness window used by the optional extremes filter
    pub const BRIGHTNESS_FILTER_MIN: u8 = 20;
    pub const BRIGHTNESS_FILTER_MAX: u8 = 235;

    /// Default cap on sampled pixels (a 300x300 image)
    pub const DEFAULT_MAX_SAMPLE_PIXELS: u64 = 90_000;

    /// Rows handed to one parallel sampling task
    pub const SAMPLING_ROWS_PER_CHUNK: usize = 64;

    /// Tolerance on the sum of palette weights
    pub const WEIGHT_SUM_TOLERANCE: f32 = 1e-4;
}

/// Match quality thresholds (ΔE76)
pub mod quality {
    /// Below this distance colors are practically indistinguishable
    pub const EXCELLENT: f32 = 3.0;
    pub const VERY_GOOD: f32 = 6.0;
    pub const GOOD: f32 = 12.0;
    /// At or above this distance a match is considered poor
    pub const ACCEPTABLE: f32 = 25.0;
}

/// Location analysis parameters
pub mod location {
    /// Coverage percentage above which an image third counts as a primary area
    pub const PRIMARY_AREA_PERCENT: f32 = 20.0;

    /// Spread (fraction of extent) above which a color is widespread on both axes
    pub const WIDESPREAD_SPREAD: f32 = 0.7;

    /// Standard deviation (fraction of extent) below which a color is concentrated
    pub const CONCENTRATED_STD: f32 = 0.15;

    /// Spread below which a color is localized on at least one axis
    pub const LOCALIZED_SPREAD: f32 = 0.3;
}

/// Export layout parameters
pub mod export {
    /// Default palette name used by formats that carry one
    pub const DEFAULT_PALETTE_NAME: &str = "Extracted Color Palette";

    /// Swatch size in pixels for PNG swatch sheets
    pub const SWATCH_SIZE: u32 = 100;

    /// Columns used by the grid swatch layout
    pub const GRID_COLUMNS: usize = 4;

    /// Pencils listed per brand in the text shopping list
    pub const SHOPPING_LIST_PER_BRAND: usize = 10;
}
