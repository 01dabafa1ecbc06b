//! Dominant color extraction
//!
//! Reduces a [`SourceImage`] to at most `k` representative colors, each with
//! its share of the sampled pixels. Three algorithms are available (see
//! [`Algorithm`]); all of them run on the same RGB-ordered histogram, which
//! makes the result independent of pixel scan order.
//!
//! ## Guarantees
//!
//! - Output length is `min(k, distinct sampled colors)`, with distinct colors
//! - Entries are ordered by descending weight, ties by lowest RGB
//! - Weights sum to 1.0 (within floating-point tolerance)
//! - Identical input, `k` and configuration give identical output

mod binning;
mod kmeans;
pub mod location;
mod median_cut;
mod sampling;

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use log::debug;
use palette::Lab;
use serde::{Deserialize, Serialize};

use crate::color::{delta_e_squared, Color};
use crate::config::{validate_palette_size, Algorithm, QuantizerConfig};
use crate::error::{PaletteError, Result};
use crate::image_loader::SourceImage;

pub use location::{analyze_locations, ColorLocation, Distribution};

/// A dominant color and its relative frequency in the source image
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub color: Color,
    /// Fraction of sampled pixels (0.0 - 1.0)
    pub weight: f32,
}

impl PaletteEntry {
    pub fn new(color: Color, weight: f32) -> Self {
        Self { color, weight }
    }

    pub fn hex(&self) -> String {
        self.color.hex()
    }
}

/// Intermediate algorithm output
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Cluster {
    /// Representative color, usually the rounded mean
    pub color: Color,
    /// Sampled pixels in the cluster
    pub count: u64,
    /// Distinct sampled colors assigned to the cluster
    pub members: Vec<Color>,
}

/// Index of the centroid closest to `lab`; the lowest index wins ties
pub(crate) fn nearest_index(lab: Lab, centroids: &[Lab]) -> usize {
    let mut best = 0;
    let mut best_distance = f32::INFINITY;
    for (i, &centroid) in centroids.iter().enumerate() {
        let distance = delta_e_squared(lab, centroid);
        if distance < best_distance {
            best = i;
            best_distance = distance;
        }
    }
    best
}

/// Quantizer bound to one configuration
#[derive(Debug, Clone, Default)]
pub struct ColorQuantizer {
    config: QuantizerConfig,
}

impl ColorQuantizer {
    pub fn new(config: QuantizerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &QuantizerConfig {
        &self.config
    }

    pub fn extract(&self, image: &SourceImage, k: usize) -> Result<Vec<PaletteEntry>> {
        extract(image, k, &self.config)
    }
}

/// Extract up to `k` dominant colors from `image`
///
/// # Errors
///
/// - `InvalidParameter` if `k` is 0 or above the supported maximum, or the
///   configuration is out of range
/// - `InvalidImage` if no opaque pixel was sampled
pub fn extract(image: &SourceImage, k: usize, config: &QuantizerConfig) -> Result<Vec<PaletteEntry>> {
    validate_palette_size(k)?;
    config.validate()?;

    let start = Instant::now();
    let stride = config.effective_stride(image.width(), image.height());
    let mut hist = sampling::sample_histogram(image, stride);
    if let Some(range) = config.brightness_filter {
        hist = hist.filter_brightness(range, k as u64);
    }
    if hist.is_empty() {
        return Err(PaletteError::invalid_image("image has no opaque pixels"));
    }
    debug!(
        "sampled {} pixels, {} distinct colors (stride {})",
        hist.total(),
        hist.len(),
        stride
    );

    let clusters = if hist.len() <= k {
        hist.bins()
            .iter()
            .map(|bin| Cluster {
                color: bin.color,
                count: bin.count,
                members: vec![bin.color],
            })
            .collect()
    } else {
        match config.algorithm {
            Algorithm::KMeans => kmeans::cluster(&hist, k, config),
            Algorithm::MedianCut => median_cut::cluster(&hist, k),
            Algorithm::HistogramBinning => binning::cluster(&hist, k),
        }
    };

    let entries = finalize(clusters, hist.total());
    debug!(
        "{:?} extracted {} colors in {:.1?}",
        config.algorithm,
        entries.len(),
        start.elapsed()
    );
    Ok(entries)
}

fn by_count_then_color(a: &(Color, u64), b: &(Color, u64)) -> std::cmp::Ordering {
    b.1.cmp(&a.1).then(a.0.cmp(&b.0))
}

/// Give every cluster its own color, then normalize and order the entries
///
/// Larger clusters choose first. A cluster keeps its representative unless
/// it is already taken or is a sampled color owned by another cluster; it
/// then takes its own member nearest the representative. Members partition
/// the sampled colors, so such a member is always free.
fn finalize(clusters: Vec<Cluster>, total: u64) -> Vec<PaletteEntry> {
    let mut clusters = clusters;
    clusters.sort_by(|a, b| by_count_then_color(&(a.color, a.count), &(b.color, b.count)));

    let owner: BTreeMap<Color, usize> = clusters
        .iter()
        .enumerate()
        .flat_map(|(i, c)| c.members.iter().map(move |&m| (m, i)))
        .collect();

    let mut used: BTreeSet<Color> = BTreeSet::new();
    let mut resolved: Vec<(Color, u64)> = Vec::with_capacity(clusters.len());
    for (i, cluster) in clusters.iter().enumerate() {
        let owned_elsewhere = owner.get(&cluster.color).is_some_and(|&o| o != i);
        let color = if used.contains(&cluster.color) || owned_elsewhere {
            nearest_free_member(cluster, &used).unwrap_or(cluster.color)
        } else {
            cluster.color
        };

        // Only a cluster without members can land on a taken color
        match resolved.iter_mut().find(|(c, _)| *c == color) {
            Some((_, count)) => *count += cluster.count,
            None => {
                used.insert(color);
                resolved.push((color, cluster.count));
            }
        }
    }

    resolved.sort_by(by_count_then_color);

    let total = total.max(1) as f64;
    resolved
        .into_iter()
        .map(|(color, count)| PaletteEntry::new(color, (count as f64 / total) as f32))
        .collect()
}

/// Unused member closest to the cluster's representative, ties by lowest RGB
fn nearest_free_member(cluster: &Cluster, used: &BTreeSet<Color>) -> Option<Color> {
    let target = cluster.color.to_lab();
    cluster
        .members
        .iter()
        .copied()
        .filter(|m| !used.contains(m))
        .map(|m| (delta_e_squared(m.to_lab(), target), m))
        .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
        .map(|(_, m)| m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::quantize::WEIGHT_SUM_TOLERANCE;

    const ALGORITHMS: [Algorithm; 3] = [
        Algorithm::KMeans,
        Algorithm::MedianCut,
        Algorithm::HistogramBinning,
    ];

    fn config_for(algorithm: Algorithm) -> QuantizerConfig {
        QuantizerConfig {
            algorithm,
            ..QuantizerConfig::default()
        }
    }

    /// 8x8 image with four quadrants in different shades
    fn noisy_quadrants() -> SourceImage {
        let mut data = Vec::new();
        for y in 0..8u8 {
            for x in 0..8u8 {
                let jitter = (x * 3 + y * 5) % 7;
                let base = match (x < 4, y < 4) {
                    (true, true) => [200, 20, 20],
                    (false, true) => [20, 200, 20],
                    (true, false) => [20, 20, 200],
                    (false, false) => [220, 220, 40],
                };
                data.extend_from_slice(&[base[0] + jitter, base[1] + jitter, base[2] + jitter]);
            }
        }
        SourceImage::from_raw(8, 8, 3, data).unwrap()
    }

    #[test]
    fn test_solid_image_single_entry() {
        let img = SourceImage::solid(10, 10, Color::new(255, 0, 0)).unwrap();
        for algorithm in ALGORITHMS {
            let palette = extract(&img, 3, &config_for(algorithm)).unwrap();
            assert_eq!(palette.len(), 1);
            assert_eq!(palette[0].color, Color::new(255, 0, 0));
            assert_eq!(palette[0].weight, 1.0);
        }
    }

    #[test]
    fn test_output_length_and_weights() {
        let img = noisy_quadrants();
        for algorithm in ALGORITHMS {
            let palette = extract(&img, 4, &config_for(algorithm)).unwrap();
            assert_eq!(palette.len(), 4, "{:?}", algorithm);

            let sum: f32 = palette.iter().map(|e| e.weight).sum();
            assert!((sum - 1.0).abs() < WEIGHT_SUM_TOLERANCE, "{:?}: {}", algorithm, sum);

            for pair in palette.windows(2) {
                assert!(pair[0].weight >= pair[1].weight);
            }
        }
    }

    #[test]
    fn test_deterministic_per_algorithm() {
        let img = noisy_quadrants();
        for algorithm in ALGORITHMS {
            let config = config_for(algorithm);
            let first = extract(&img, 5, &config).unwrap();
            let second = extract(&img, 5, &config).unwrap();
            assert_eq!(first, second, "{:?}", algorithm);
        }
    }

    #[test]
    fn test_few_colors_returned_verbatim() {
        let mut data = Vec::new();
        for _ in 0..3 {
            data.extend_from_slice(&[10, 20, 30]);
        }
        data.extend_from_slice(&[200, 100, 50]);
        let img = SourceImage::from_raw(4, 1, 3, data).unwrap();

        let palette = extract(&img, 8, &QuantizerConfig::default()).unwrap();
        assert_eq!(
            palette,
            vec![
                PaletteEntry::new(Color::new(10, 20, 30), 0.75),
                PaletteEntry::new(Color::new(200, 100, 50), 0.25),
            ]
        );
    }

    #[test]
    fn test_weight_ties_broken_by_lowest_rgb() {
        let data = vec![200, 0, 0, 0, 0, 200];
        let img = SourceImage::from_raw(2, 1, 3, data).unwrap();
        let palette = extract(&img, 2, &QuantizerConfig::default()).unwrap();
        assert_eq!(palette[0].color, Color::new(0, 0, 200));
        assert_eq!(palette[1].color, Color::new(200, 0, 0));
    }

    #[test]
    fn test_invalid_k() {
        let img = SourceImage::solid(2, 2, Color::new(1, 2, 3)).unwrap();
        assert!(matches!(
            extract(&img, 0, &QuantizerConfig::default()),
            Err(PaletteError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_fully_transparent_image_rejected() {
        let img = SourceImage::from_raw(2, 1, 4, vec![0; 8]).unwrap();
        assert!(matches!(
            extract(&img, 3, &QuantizerConfig::default()),
            Err(PaletteError::InvalidImage { .. })
        ));
    }

    fn cluster(color: (u8, u8, u8), count: u64, members: &[(u8, u8, u8)]) -> Cluster {
        Cluster {
            color: Color::new(color.0, color.1, color.2),
            count,
            members: members.iter().map(|&(r, g, b)| Color::new(r, g, b)).collect(),
        }
    }

    /// Deterministic xorshift noise with every channel in 0..8
    fn dark_noise_row(seed: u64, width: u32) -> SourceImage {
        let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1;
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state % 8) as u8
        };
        let data = (0..width * 3).map(|_| next()).collect();
        SourceImage::from_raw(width, 1, 3, data).unwrap()
    }

    #[test]
    fn test_finalize_keeps_colliding_clusters_apart() {
        let entries = finalize(
            vec![
                cluster((20, 20, 20), 2, &[(30, 30, 30), (22, 22, 22)]),
                cluster((20, 20, 20), 5, &[(18, 18, 18), (21, 21, 21)]),
            ],
            7,
        );
        // The larger cluster keeps the shared mean, the other its nearest member
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].color, Color::new(20, 20, 20));
        assert_eq!(entries[1].color, Color::new(22, 22, 22));
    }

    #[test]
    fn test_finalize_never_takes_another_clusters_member() {
        let entries = finalize(
            vec![
                cluster((5, 5, 5), 3, &[(4, 4, 4), (9, 9, 9)]),
                cluster((5, 5, 5), 2, &[(5, 5, 5), (7, 7, 7)]),
                cluster((12, 12, 12), 3, &[(12, 12, 12)]),
            ],
            8,
        );
        let colors: Vec<Color> = entries.iter().map(|e| e.color).collect();
        assert_eq!(
            colors,
            vec![Color::new(4, 4, 4), Color::new(12, 12, 12), Color::new(5, 5, 5)]
        );
        assert_eq!(entries[2].weight, 0.25);
    }

    #[test]
    fn test_length_is_min_of_k_and_distinct_colors() {
        for seed in 0..200u64 {
            let img = dark_noise_row(seed, 6 + (seed % 12) as u32);
            let distinct = (0..img.width())
                .filter_map(|x| img.pixel(x, 0))
                .collect::<BTreeSet<_>>()
                .len();
            for k in 2..=5 {
                for algorithm in ALGORITHMS {
                    let palette = extract(&img, k, &config_for(algorithm)).unwrap();
                    assert_eq!(
                        palette.len(),
                        k.min(distinct),
                        "{:?} seed={} k={} distinct={}",
                        algorithm,
                        seed,
                        k,
                        distinct
                    );
                    let colors: BTreeSet<Color> = palette.iter().map(|e| e.color).collect();
                    assert_eq!(colors.len(), palette.len());
                }
            }
        }
    }

    #[test]
    fn test_sample_cap_coarsens_stride() {
        // Only (0, 0) survives a stride of 4 on a 4x4 image
        let mut data = vec![0u8; 4 * 4 * 3];
        for px in data.chunks_mut(3).skip(1) {
            px.copy_from_slice(&[0, 0, 255]);
        }
        data[..3].copy_from_slice(&[255, 0, 0]);
        let img = SourceImage::from_raw(4, 4, 3, data).unwrap();

        let capped = QuantizerConfig {
            max_sample_pixels: Some(1),
            ..QuantizerConfig::default()
        };
        let palette = extract(&img, 3, &capped).unwrap();
        assert_eq!(palette, vec![PaletteEntry::new(Color::new(255, 0, 0), 1.0)]);

        let full = extract(&img, 3, &QuantizerConfig::default()).unwrap();
        assert_eq!(full[0].color, Color::new(0, 0, 255));
        assert_eq!(full.len(), 2);
    }

    #[test]
    fn test_nearest_index_prefers_first_on_tie() {
        let a = Color::new(0, 0, 0).to_lab();
        assert_eq!(nearest_index(a, &[a, a]), 0);
    }

    #[test]
    fn test_quantizer_rejects_bad_config() {
        let config = QuantizerConfig {
            sample_stride: 0,
            ..QuantizerConfig::default()
        };
        assert!(ColorQuantizer::new(config).is_err());
    }
}
