//! Pairing palette colors with their nearest pencils
//!
//! Every palette entry yields exactly one [`Match`], in palette order. A bad
//! match is never dropped; it is flagged through [`Match::poor_fit`] and its
//! distance so the caller can decide whether to warn.

use log::debug;
use palette::Hsv;
use serde::{Deserialize, Serialize};

use crate::catalog::{PencilCatalog, PencilColor};
use crate::color::Color;
use crate::config::MatchOptions;
use crate::constants::quality;
use crate::error::Result;
use crate::quantize::PaletteEntry;

/// A palette entry and its nearest pencil
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub entry: PaletteEntry,
    pub pencil: PencilColor,
    /// ΔE76 between the entry color and the pencil (lower is closer)
    pub distance: f32,
    /// Distance exceeds the configured threshold
    pub poor_fit: bool,
}

impl Match {
    pub fn quality(&self) -> MatchQuality {
        MatchQuality::from_distance(self.distance)
    }
}

/// Qualitative grade of a ΔE76 distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchQuality {
    Excellent,
    VeryGood,
    Good,
    Acceptable,
    Poor,
}

impl MatchQuality {
    pub fn from_distance(distance: f32) -> Self {
        if distance < quality::EXCELLENT {
            MatchQuality::Excellent
        } else if distance < quality::VERY_GOOD {
            MatchQuality::VeryGood
        } else if distance < quality::GOOD {
            MatchQuality::Good
        } else if distance < quality::ACCEPTABLE {
            MatchQuality::Acceptable
        } else {
            MatchQuality::Poor
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MatchQuality::Excellent => "Excellent match",
            MatchQuality::VeryGood => "Very good match",
            MatchQuality::Good => "Good match",
            MatchQuality::Acceptable => "Acceptable match",
            MatchQuality::Poor => "Poor match",
        }
    }
}

/// Matcher bound to a catalog and validated options
#[derive(Debug, Clone)]
pub struct PaletteMatcher<'a> {
    catalog: &'a PencilCatalog,
    brands: Option<Vec<&'a str>>,
    max_distance: Option<f32>,
}

impl<'a> PaletteMatcher<'a> {
    /// Resolve the brand filter against `catalog`
    ///
    /// # Errors
    ///
    /// - `UnknownBrand` if a filtered brand is not in the catalog
    /// - `InvalidParameter` if `max_distance` is negative or not finite
    pub fn new(catalog: &'a PencilCatalog, options: &MatchOptions) -> Result<Self> {
        options.validate()?;

        let brands = match &options.brand_filter {
            Some(filter) if !filter.is_empty() => Some(
                filter
                    .iter()
                    .map(|brand| catalog.resolve_brand(brand))
                    .collect::<Result<Vec<&str>>>()?,
            ),
            _ => None,
        };

        Ok(Self {
            catalog,
            brands,
            max_distance: options.max_distance,
        })
    }

    /// Match one entry
    pub fn match_entry(&self, entry: PaletteEntry) -> Match {
        let (pencil, distance) = match &self.brands {
            Some(brands) => self
                .catalog
                .nearest_among(entry.color, brands)
                .unwrap_or_else(|| self.catalog.nearest_to(entry.color)),
            None => self.catalog.nearest_to(entry.color),
        };

        let poor_fit = match self.max_distance {
            Some(max) => distance > max,
            None => MatchQuality::from_distance(distance) == MatchQuality::Poor,
        };

        Match {
            entry,
            pencil: pencil.clone(),
            distance,
            poor_fit,
        }
    }

    /// Match every entry, preserving order
    pub fn match_entries(&self, entries: &[PaletteEntry]) -> Vec<Match> {
        let matches: Vec<Match> = entries.iter().map(|&e| self.match_entry(e)).collect();
        debug!(
            "matched {} colors, {} poor fits",
            matches.len(),
            matches.iter().filter(|m| m.poor_fit).count()
        );
        matches
    }
}

/// Match each palette entry to its nearest pencil
///
/// The result has exactly one `Match` per entry, in the same order.
pub fn match_palette(
    entries: &[PaletteEntry],
    catalog: &PencilCatalog,
    options: &MatchOptions,
) -> Result<Vec<Match>> {
    Ok(PaletteMatcher::new(catalog, options)?.match_entries(entries))
}

/// Alternative pencils for a color: up to `per_brand` per brand within
/// `max_difference`, brands in catalog order, closest first within a brand
pub fn candidate_matches<'a>(
    color: Color,
    catalog: &'a PencilCatalog,
    per_brand: usize,
    max_difference: f32,
) -> Vec<(&'a PencilColor, f32)> {
    let mut candidates = Vec::new();
    for brand in catalog.brands() {
        let ranked = catalog
            .nearest_n(color, per_brand, Some(brand.as_str()))
            .unwrap_or_default();
        candidates.extend(ranked.into_iter().filter(|(_, d)| *d <= max_difference));
    }
    candidates
}

/// Opposite hue on the HSV color wheel, same saturation and value
pub fn complementary_color(color: Color) -> Color {
    let hsv = color.to_hsv();
    let rotated = Hsv::new(
        hsv.hue.into_degrees() + 180.0,
        hsv.saturation,
        hsv.value,
    );
    Color::from_hsv(rotated)
}

/// Closest pencils to the complementary color of `color`
pub fn complementary_matches(
    color: Color,
    catalog: &PencilCatalog,
    n: usize,
) -> Vec<(&PencilColor, f32)> {
    catalog
        .nearest_n(complementary_color(color), n, None)
        .unwrap_or_default()
}
