//! Where each palette color appears in the image
//!
//! Every sampled pixel is assigned to its nearest palette entry in Lab. For
//! each entry we then report the share of its pixels falling into each image
//! third (top/middle/bottom and left/center/right) and classify how its
//! pixels are spread.

use std::collections::HashMap;
use std::fmt;

use palette::Lab;
use serde::{Deserialize, Serialize};

use super::{nearest_index, PaletteEntry};
use crate::color::Color;
use crate::constants::location::{
    CONCENTRATED_STD, LOCALIZED_SPREAD, PRIMARY_AREA_PERCENT, WIDESPREAD_SPREAD,
};
use crate::image_loader::SourceImage;

/// How a color's pixels are spread over the image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distribution {
    /// Spans more than 70% of both axes
    Widespread,
    /// Tightly clustered around one point
    Concentrated,
    /// Narrow along at least one axis
    Localized,
    Scattered,
    /// No sampled pixel belongs to the color
    None,
}

/// One third of the image along either axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Area {
    Top,
    Middle,
    Bottom,
    Left,
    Center,
    Right,
}

impl Area {
    pub fn description(self) -> &'static str {
        match self {
            Area::Top => "Upper portion",
            Area::Middle => "Middle section",
            Area::Bottom => "Lower portion",
            Area::Left => "Left side",
            Area::Center => "Center area",
            Area::Right => "Right side",
        }
    }
}

/// Percentage of a color's pixels per image third
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coverage {
    pub top: f32,
    pub middle: f32,
    pub bottom: f32,
    pub left: f32,
    pub center: f32,
    pub right: f32,
}

impl Coverage {
    fn get(&self, area: Area) -> f32 {
        match area {
            Area::Top => self.top,
            Area::Middle => self.middle,
            Area::Bottom => self.bottom,
            Area::Left => self.left,
            Area::Center => self.center,
            Area::Right => self.right,
        }
    }
}

/// Location summary for one palette entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorLocation {
    pub color: Color,
    pub distribution: Distribution,
    pub coverage: Coverage,
    /// Thirds holding more than 20% of the color's pixels, vertical first
    pub primary_areas: Vec<Area>,
}

impl ColorLocation {
    /// Human readable regions, e.g. `["Top and bottom edges"]`
    pub fn describe(&self) -> Vec<String> {
        let has = |area| self.primary_areas.contains(&area);
        if self.primary_areas.is_empty() {
            return vec!["Throughout the image".to_string()];
        }
        if has(Area::Top) && has(Area::Bottom) && !has(Area::Middle) {
            return vec!["Top and bottom edges".to_string()];
        }
        if has(Area::Left) && has(Area::Right) && !has(Area::Center) {
            return vec!["Left and right sides".to_string()];
        }
        self.primary_areas
            .iter()
            .map(|area| area.description().to_string())
            .collect()
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Distribution::Widespread => "widespread",
            Distribution::Concentrated => "concentrated",
            Distribution::Localized => "localized",
            Distribution::Scattered => "scattered",
            Distribution::None => "none",
        };
        f.write_str(name)
    }
}

/// Running coordinate statistics for one entry
#[derive(Debug, Default, Clone)]
struct Accumulator {
    count: u64,
    rows: [u64; 3],
    cols: [u64; 3],
    min: (u32, u32),
    max: (u32, u32),
    sum: (f64, f64),
    sum_sq: (f64, f64),
}

impl Accumulator {
    fn add(&mut self, x: u32, y: u32, width: u32, height: u32) {
        if self.count == 0 {
            self.min = (x, y);
            self.max = (x, y);
        } else {
            self.min = (self.min.0.min(x), self.min.1.min(y));
            self.max = (self.max.0.max(x), self.max.1.max(y));
        }
        self.count += 1;
        self.rows[third(y, height)] += 1;
        self.cols[third(x, width)] += 1;
        let (fx, fy) = (x as f64, y as f64);
        self.sum.0 += fx;
        self.sum.1 += fy;
        self.sum_sq.0 += fx * fx;
        self.sum_sq.1 += fy * fy;
    }

    fn coverage(&self) -> Coverage {
        if self.count == 0 {
            return Coverage::default();
        }
        let pct = |n: u64| (n as f64 * 100.0 / self.count as f64) as f32;
        Coverage {
            top: pct(self.rows[0]),
            middle: pct(self.rows[1]),
            bottom: pct(self.rows[2]),
            left: pct(self.cols[0]),
            center: pct(self.cols[1]),
            right: pct(self.cols[2]),
        }
    }

    fn distribution(&self, width: u32, height: u32) -> Distribution {
        if self.count == 0 {
            return Distribution::None;
        }
        let (w, h) = (width as f64, height as f64);
        let x_spread = (self.max.0 - self.min.0) as f64 / w;
        let y_spread = (self.max.1 - self.min.1) as f64 / h;

        let n = self.count as f64;
        let std = |sum: f64, sum_sq: f64| (sum_sq / n - (sum / n).powi(2)).max(0.0).sqrt();
        let x_std = std(self.sum.0, self.sum_sq.0) / w;
        let y_std = std(self.sum.1, self.sum_sq.1) / h;

        let widespread = WIDESPREAD_SPREAD as f64;
        let concentrated = CONCENTRATED_STD as f64;
        let localized = LOCALIZED_SPREAD as f64;

        if x_spread > widespread && y_spread > widespread {
            Distribution::Widespread
        } else if x_std < concentrated && y_std < concentrated {
            Distribution::Concentrated
        } else if x_spread < localized || y_spread < localized {
            Distribution::Localized
        } else {
            Distribution::Scattered
        }
    }
}

/// Which third of `extent` the coordinate falls into
fn third(pos: u32, extent: u32) -> usize {
    ((pos as u64 * 3) / extent.max(1) as u64).min(2) as usize
}

/// Locate every palette entry in the image, sampling every `stride`-th pixel
///
/// The result has one `ColorLocation` per entry, in palette order.
pub fn analyze_locations(
    image: &SourceImage,
    entries: &[PaletteEntry],
    stride: u32,
) -> Vec<ColorLocation> {
    let stride = stride.max(1) as usize;
    let (width, height) = (image.width(), image.height());
    let centroids: Vec<Lab> = entries.iter().map(|e| e.color.to_lab()).collect();
    let mut stats = vec![Accumulator::default(); entries.len()];

    if !centroids.is_empty() {
        let mut labels: HashMap<Color, usize> = HashMap::new();
        for y in (0..height).step_by(stride) {
            for x in (0..width).step_by(stride) {
                let Some(color) = image.pixel(x, y) else {
                    continue;
                };
                let label = *labels
                    .entry(color)
                    .or_insert_with(|| nearest_index(color.to_lab(), &centroids));
                stats[label].add(x, y, width, height);
            }
        }
    }

    entries
        .iter()
        .zip(&stats)
        .map(|(entry, acc)| {
            let coverage = acc.coverage();
            let primary_areas = [
                Area::Top,
                Area::Middle,
                Area::Bottom,
                Area::Left,
                Area::Center,
                Area::Right,
            ]
            .into_iter()
            .filter(|&area| coverage.get(area) > PRIMARY_AREA_PERCENT)
            .collect();

            ColorLocation {
                color: entry.color,
                distribution: acc.distribution(width, height),
                coverage,
                primary_areas,
            }
        })
        .collect()
}
