//! Pixel sampling into an order-independent color histogram
//!
//! Rows are scanned in parallel chunks; each chunk counts colors into its own
//! map and the maps are merged by summation. The merged histogram is sorted by
//! RGB value, so nothing downstream can observe scan order.

use std::collections::HashMap;

use log::warn;
use palette::Lab;
use rayon::prelude::*;

use crate::color::Color;
use crate::config::BrightnessRange;
use crate::constants::quantize::SAMPLING_ROWS_PER_CHUNK;
use crate::image_loader::SourceImage;

/// One distinct sampled color
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct HistogramBin {
    pub color: Color,
    pub lab: Lab,
    pub count: u64,
}

/// Distinct colors of a sampled image, ascending by RGB
#[derive(Debug, Clone, Default)]
pub(crate) struct ColorHistogram {
    bins: Vec<HistogramBin>,
    total: u64,
}

impl ColorHistogram {
    fn from_counts(counts: HashMap<Color, u64>) -> Self {
        let mut bins: Vec<HistogramBin> = counts
            .into_iter()
            .map(|(color, count)| HistogramBin {
                color,
                lab: color.to_lab(),
                count,
            })
            .collect();
        bins.sort_unstable_by_key(|bin| bin.color);
        let total = bins.iter().map(|bin| bin.count).sum();
        Self { bins, total }
    }

    pub fn bins(&self) -> &[HistogramBin] {
        &self.bins
    }

    /// Number of distinct colors
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Number of sampled pixels
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Drop colors outside the brightness window.
    ///
    /// If fewer than `min_pixels` pixels survive, the histogram is returned
    /// unfiltered.
    pub fn filter_brightness(self, range: BrightnessRange, min_pixels: u64) -> Self {
        let kept: Vec<HistogramBin> = self
            .bins
            .iter()
            .copied()
            .filter(|bin| {
                let brightness = bin.color.brightness();
                brightness > range.min as f32 && brightness < range.max as f32
            })
            .collect();
        let kept_total: u64 = kept.iter().map(|bin| bin.count).sum();

        if kept_total < min_pixels.max(1) {
            warn!(
                "brightness filter {}..{} leaves {} pixels, using all {} sampled pixels",
                range.min, range.max, kept_total, self.total
            );
            return self;
        }

        Self {
            bins: kept,
            total: kept_total,
        }
    }
}

/// Count colors of every `stride`-th pixel on both axes, skipping transparent pixels
pub(crate) fn sample_histogram(image: &SourceImage, stride: u32) -> ColorHistogram {
    let stride = stride.max(1) as usize;
    let width = image.width();
    let rows: Vec<u32> = (0..image.height()).step_by(stride).collect();

    let counts = rows
        .par_chunks(SAMPLING_ROWS_PER_CHUNK)
        .map(|chunk| {
            let mut counts: HashMap<Color, u64> = HashMap::new();
            for &y in chunk {
                for x in (0..width).step_by(stride) {
                    if let Some(color) = image.pixel(x, y) {
                        *counts.entry(color).or_insert(0) += 1;
                    }
                }
            }
            counts
        })
        .reduce(HashMap::new, |mut merged, partial| {
            for (color, count) in partial {
                *merged.entry(color).or_insert(0) += count;
            }
            merged
        });

    ColorHistogram::from_counts(counts)
}
