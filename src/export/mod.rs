//! Palette export into design-tool formats
//!
//! Rendering is a pure function of the matches and [`ExportMetadata`]: the
//! same input always produces byte-identical output, which lets callers cache
//! and diff exports.
//!
//! ## Formats
//!
//! | Tag | Content |
//! |---|---|
//! | `json` | array of `{hex, rgb, pencilBrand, pencilName, distance}` |
//! | `csv` | `hex,r,g,b,pencil_brand,pencil_name,distance` rows |
//! | `css` | `:root` block of `--color-N` custom properties |
//! | `scss` | `$color-N` variables |
//! | `adobe-swatch` / `ase` | Adobe Swatch Exchange 1.0 (binary) |
//! | `figma` | Figma plugin palette JSON |
//! | `affinity` | Affinity palette XML |
//! | `photopea` / `aco` | Adobe Color swatch file, versions 1 and 2 (binary) |
//! | `png` | swatch sheet image |

mod image_sheet;
mod shopping;
mod swatch;
mod text;
mod tools;

use std::fmt;
use std::str::FromStr;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::{ColorNamingStyle, ExportMetadata};
use crate::error::{PaletteError, Result};
use crate::matcher::Match;

pub use image_sheet::{swatch_sheet, SwatchLayout};
pub use shopping::{shopping_list, ShoppingListFormat};

/// Target export format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportFormat {
    Json,
    Csv,
    Css,
    Scss,
    AdobeSwatch,
    Figma,
    Affinity,
    Photopea,
    Png,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 9] = [
        ExportFormat::Json,
        ExportFormat::Csv,
        ExportFormat::Css,
        ExportFormat::Scss,
        ExportFormat::AdobeSwatch,
        ExportFormat::Figma,
        ExportFormat::Affinity,
        ExportFormat::Photopea,
        ExportFormat::Png,
    ];

    /// Canonical tag
    pub fn tag(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Css => "css",
            ExportFormat::Scss => "scss",
            ExportFormat::AdobeSwatch => "adobe-swatch",
            ExportFormat::Figma => "figma",
            ExportFormat::Affinity => "affinity",
            ExportFormat::Photopea => "photopea",
            ExportFormat::Png => "png",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Css => "css",
            ExportFormat::Scss => "scss",
            ExportFormat::AdobeSwatch => "ase",
            ExportFormat::Figma => "figma.json",
            ExportFormat::Affinity => "afpalette",
            ExportFormat::Photopea => "aco",
            ExportFormat::Png => "png",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Json | ExportFormat::Figma => "application/json",
            ExportFormat::Csv => "text/csv",
            ExportFormat::Css => "text/css",
            ExportFormat::Scss => "text/x-scss",
            ExportFormat::Affinity => "application/xml",
            ExportFormat::AdobeSwatch | ExportFormat::Photopea => "application/octet-stream",
            ExportFormat::Png => "image/png",
        }
    }

    /// Binary formats carry no UTF-8 text
    pub fn is_binary(self) -> bool {
        matches!(
            self,
            ExportFormat::AdobeSwatch | ExportFormat::Photopea | ExportFormat::Png
        )
    }
}

impl FromStr for ExportFormat {
    type Err = PaletteError;

    fn from_str(s: &str) -> Result<Self> {
        let tag = s.trim().to_ascii_lowercase();
        let format = match tag.as_str() {
            "json" => ExportFormat::Json,
            "csv" => ExportFormat::Csv,
            "css" => ExportFormat::Css,
            "scss" => ExportFormat::Scss,
            "adobe-swatch" | "ase" => ExportFormat::AdobeSwatch,
            "figma" => ExportFormat::Figma,
            "affinity" | "afpalette" => ExportFormat::Affinity,
            "photopea" | "aco" => ExportFormat::Photopea,
            "png" => ExportFormat::Png,
            _ => {
                return Err(PaletteError::UnsupportedFormat {
                    format: s.to_string(),
                })
            }
        };
        Ok(format)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One rendered export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub format: ExportFormat,
    /// Suggested download name, e.g. `my-palette.ase`
    pub file_name: String,
    pub mime_type: String,
    pub content: Vec<u8>,
}

impl ExportDocument {
    fn new(format: ExportFormat, metadata: &ExportMetadata, content: Vec<u8>) -> Self {
        Self {
            format,
            file_name: format!("{}.{}", file_stem(&metadata.palette_name), format.extension()),
            mime_type: format.mime_type().to_string(),
            content,
        }
    }

    /// Content as text, for the text-based formats
    pub fn as_text(&self) -> Option<&str> {
        if self.format.is_binary() {
            return None;
        }
        std::str::from_utf8(&self.content).ok()
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Lowercase, dash-separated file stem for a palette name
fn file_stem(name: &str) -> String {
    let mut stem = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            stem.push(c.to_ascii_lowercase());
        } else if !stem.is_empty() && !stem.ends_with('-') {
            stem.push('-');
        }
    }
    let stem = stem.trim_end_matches('-');
    if stem.is_empty() {
        "palette".to_string()
    } else {
        stem.to_string()
    }
}

/// Swatch name for formats that carry names
pub(crate) fn swatch_name(m: &Match, style: ColorNamingStyle) -> String {
    let color = m.entry.color;
    match style {
        ColorNamingStyle::Hex => color.hex(),
        ColorNamingStyle::Rgb => format!("rgb({}, {}, {})", color.r, color.g, color.b),
        ColorNamingStyle::PencilName => m.pencil.display_name(),
    }
}

/// Render `matches` into `format`
pub fn render(matches: &[Match], format: ExportFormat, metadata: &ExportMetadata) -> Result<ExportDocument> {
    let content = match format {
        ExportFormat::Json => text::json(matches, metadata)?.into_bytes(),
        ExportFormat::Csv => text::csv(matches, metadata).into_bytes(),
        ExportFormat::Css => text::css(matches).into_bytes(),
        ExportFormat::Scss => text::scss(matches).into_bytes(),
        ExportFormat::AdobeSwatch => swatch::ase(matches, metadata)?,
        ExportFormat::Figma => tools::figma(matches, metadata)?.into_bytes(),
        ExportFormat::Affinity => tools::affinity(matches, metadata).into_bytes(),
        ExportFormat::Photopea => swatch::aco(matches, metadata)?,
        ExportFormat::Png => swatch_sheet(matches, SwatchLayout::Horizontal)?,
    };
    debug!("rendered {} colors as {} ({} bytes)", matches.len(), format, content.len());
    Ok(ExportDocument::new(format, metadata, content))
}

/// Render by format tag
///
/// # Errors
///
/// Returns `UnsupportedFormat` for an unrecognized tag; nothing is rendered.
pub fn render_tag(matches: &[Match], tag: &str, metadata: &ExportMetadata) -> Result<ExportDocument> {
    let format: ExportFormat = tag.parse()?;
    render(matches, format, metadata)
}

/// Render each tag independently; a failing tag does not stop the others
pub fn render_batch(
    matches: &[Match],
    tags: &[&str],
    metadata: &ExportMetadata,
) -> Vec<(String, Result<ExportDocument>)> {
    tags.iter()
        .map(|&tag| {
            let result = render_tag(matches, tag, metadata);
            if let Err(e) = &result {
                warn!("export '{}' failed: {}", tag, e);
            }
            (tag.to_string(), result)
        })
        .collect()
}

/// Exporter bound to one set of metadata
#[derive(Debug, Clone, Default)]
pub struct PaletteExporter {
    metadata: ExportMetadata,
}

impl PaletteExporter {
    pub fn new(metadata: ExportMetadata) -> Self {
        Self { metadata }
    }

    pub fn metadata(&self) -> &ExportMetadata {
        &self.metadata
    }

    pub fn render(&self, matches: &[Match], format: ExportFormat) -> Result<ExportDocument> {
        render(matches, format, &self.metadata)
    }

    pub fn render_tag(&self, matches: &[Match], tag: &str) -> Result<ExportDocument> {
        render_tag(matches, tag, &self.metadata)
    }

    pub fn render_batch(&self, matches: &[Match], tags: &[&str]) -> Vec<(String, Result<ExportDocument>)> {
        render_batch(matches, tags, &self.metadata)
    }
}
