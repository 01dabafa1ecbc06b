//! # Pencil Palette
//!
//! A Rust crate that turns an image into a colored-pencil shopping palette.
//!
//! The pipeline:
//! - Extracts the dominant colors of an image (k-means, median cut or
//!   histogram binning)
//! - Matches each color to the perceptually nearest pencil of a catalog
//! - Exports the matched palette for design tools (JSON, CSV, CSS, SCSS,
//!   Adobe swatches, Figma, Affinity, Photopea, PNG)
//! - Produces a [`SessionRecord`] for history storage
//!
//! ## Example
//!
//! ```rust,no_run
//! use pencil_palette::{analyze, load_image, PencilCatalog, PipelineConfig};
//! use std::path::Path;
//!
//! let image = load_image(Path::new("sunset.jpg"))?;
//! let config = PipelineConfig::default();
//! let analysis = analyze(&image, &config, PencilCatalog::builtin()?)?;
//!
//! for m in &analysis.matches {
//!     println!("{} -> {} (ΔE {:.1})", m.entry.hex(), m.pencil, m.distance);
//! }
//! for (tag, doc) in analysis.export(&["css", "ase"], &config.export) {
//!     println!("{}: {} bytes", tag, doc?.len());
//! }
//! # Ok::<(), pencil_palette::PaletteError>(())
//! ```
//!
//! The library logs through the `log` facade and never installs a logger.

use std::time::{Duration, Instant};

use chrono::Utc;
use log::info;

pub mod catalog;
pub mod color;
pub mod config;
pub mod constants;
pub mod error;
pub mod export;
pub mod history;
pub mod image_loader;
pub mod matcher;
pub mod quantize;
pub mod session;

pub use catalog::{PencilCatalog, PencilColor};
pub use color::{delta_e, Color};
pub use config::{
    Algorithm, BrightnessRange, ColorNamingStyle, ExportMetadata, MatchOptions, PipelineConfig,
    QuantizerConfig,
};
pub use error::{PaletteError, Result};
pub use export::{render, render_batch, render_tag, ExportDocument, ExportFormat, PaletteExporter};
pub use history::{HistoryStatistics, JsonLinesStore, MemoryStore, SessionStore};
pub use image_loader::{decode_image, load_image, SourceImage};
pub use matcher::{match_palette, Match, MatchQuality, PaletteMatcher};
pub use quantize::{extract, ColorLocation, ColorQuantizer, PaletteEntry};
pub use session::{ImageInfo, SessionRecord};

/// Result of one extract-and-match run
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteAnalysis {
    /// Dominant colors, descending weight
    pub entries: Vec<PaletteEntry>,
    /// One match per entry, same order
    pub matches: Vec<Match>,
    pub image: ImageInfo,
    /// Requested k
    pub palette_size: usize,
    pub algorithm: Algorithm,
    /// Stride used for sampling, after the sample cap
    pub sample_stride: u32,
    pub elapsed: Duration,
}

impl PaletteAnalysis {
    /// Render the matches into each requested format independently
    pub fn export(
        &self,
        tags: &[&str],
        metadata: &ExportMetadata,
    ) -> Vec<(String, Result<ExportDocument>)> {
        render_batch(&self.matches, tags, metadata)
    }

    /// Where each palette color appears in `image`
    pub fn locations(&self, image: &SourceImage) -> Vec<ColorLocation> {
        quantize::analyze_locations(image, &self.entries, self.sample_stride)
    }

    /// Freeze the analysis into a history record
    pub fn into_record(
        self,
        session_id: &str,
        file_name: Option<&str>,
        exports: Vec<ExportDocument>,
    ) -> SessionRecord {
        let mut image = self.image;
        image.file_name = file_name.map(str::to_string);
        SessionRecord::new(
            session_id,
            image,
            self.palette_size,
            self.algorithm,
            Utc::now(),
            self.elapsed.as_millis() as u64,
            self.matches,
            exports,
        )
    }
}

/// Extract the dominant colors of `image` and match them against `catalog`
///
/// # Errors
///
/// - `InvalidParameter` for an out-of-range configuration
/// - `InvalidImage` if the image has no usable pixels
/// - `UnknownBrand` if the brand filter names a brand not in `catalog`
pub fn analyze(
    image: &SourceImage,
    config: &PipelineConfig,
    catalog: &PencilCatalog,
) -> Result<PaletteAnalysis> {
    config.validate()?;
    let start = Instant::now();

    // Resolve the brand filter before any pixel work
    let matcher = PaletteMatcher::new(catalog, &config.matching)?;
    let entries = extract(image, config.palette_size, &config.quantizer)?;
    let matches = matcher.match_entries(&entries);
    let elapsed = start.elapsed();

    info!(
        "analyzed {}x{} image: {} colors, {} poor fits, {:.1?}",
        image.width(),
        image.height(),
        entries.len(),
        matches.iter().filter(|m| m.poor_fit).count(),
        elapsed
    );

    Ok(PaletteAnalysis {
        entries,
        matches,
        image: ImageInfo::from_image(image, None),
        palette_size: config.palette_size,
        algorithm: config.quantizer.algorithm,
        sample_stride: config
            .quantizer
            .effective_stride(image.width(), image.height()),
        elapsed,
    })
}
