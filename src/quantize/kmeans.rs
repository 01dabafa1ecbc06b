//! Seeded k-means clustering in Lab space
//!
//! Clustering runs on the sampled pixels in RGB order, so for a fixed seed the
//! result depends only on the histogram. After Lloyd iterations every distinct
//! color is reassigned to its nearest centroid. If any cluster ends up empty,
//! the surviving centroids are snapped to their nearest sampled colors and the
//! colors farthest from all centroids are added until there are `k`; a
//! centroid that is itself a sampled color can never lose that color, so all
//! `k` clusters hold pixels.

use kmeans_colors::get_kmeans;
use log::{debug, warn};
use palette::Lab;

use super::sampling::ColorHistogram;
use super::{nearest_index, Cluster};
use crate::color::{delta_e_squared, Color};
use crate::config::QuantizerConfig;

/// Cluster `hist` into exactly `k` non-empty clusters (`k < hist.len()`)
pub(crate) fn cluster(hist: &ColorHistogram, k: usize, config: &QuantizerConfig) -> Vec<Cluster> {
    let samples: Vec<Lab> = hist
        .bins()
        .iter()
        .flat_map(|bin| std::iter::repeat(bin.lab).take(bin.count as usize))
        .collect();

    let result = get_kmeans(
        k,
        config.max_iterations,
        config.convergence,
        false,
        &samples,
        config.random_seed,
    );
    debug!("k-means k={} score={:.3}", k, result.score);

    let mut centroids = result.centroids;
    let mut assignment = assign(hist, &centroids);

    let live = live_centroids(&centroids, &assignment.1);
    if live.len() < k {
        warn!("k-means left {} empty clusters, reseeding", k - live.len());
        centroids = snap_to_samples(hist, &live);
        while centroids.len() < k {
            let Some(seed) = farthest_color(hist, &centroids) else {
                break;
            };
            centroids.push(seed);
        }
        assignment = assign(hist, &centroids);
    }

    let (labels, counts) = assignment;
    let mut sums = vec![(0.0f64, 0.0f64, 0.0f64); centroids.len()];
    let mut members = vec![Vec::new(); centroids.len()];
    for (bin, &label) in hist.bins().iter().zip(&labels) {
        let w = bin.count as f64;
        sums[label].0 += bin.lab.l as f64 * w;
        sums[label].1 += bin.lab.a as f64 * w;
        sums[label].2 += bin.lab.b as f64 * w;
        members[label].push(bin.color);
    }

    sums.into_iter()
        .zip(counts)
        .zip(members)
        .filter(|((_, count), _)| *count > 0)
        .map(|(((l, a, b), count), members)| {
            let n = count as f64;
            let mean = Lab::new((l / n) as f32, (a / n) as f32, (b / n) as f32);
            Cluster {
                color: Color::from_lab(mean),
                count,
                members,
            }
        })
        .collect()
}

/// Nearest centroid per histogram bin, plus pixel counts per centroid
fn assign(hist: &ColorHistogram, centroids: &[Lab]) -> (Vec<usize>, Vec<u64>) {
    let mut counts = vec![0u64; centroids.len()];
    let labels = hist
        .bins()
        .iter()
        .map(|bin| {
            let label = nearest_index(bin.lab, centroids);
            counts[label] += bin.count;
            label
        })
        .collect();
    (labels, counts)
}

fn live_centroids(centroids: &[Lab], counts: &[u64]) -> Vec<Lab> {
    centroids
        .iter()
        .zip(counts)
        .filter(|(_, count)| **count > 0)
        .map(|(&lab, _)| lab)
        .collect()
}

/// Replace each centroid by its nearest sampled color, dropping duplicates
fn snap_to_samples(hist: &ColorHistogram, centroids: &[Lab]) -> Vec<Lab> {
    let labs: Vec<Lab> = hist.bins().iter().map(|bin| bin.lab).collect();
    let mut picked: Vec<usize> = Vec::with_capacity(centroids.len());
    for &centroid in centroids {
        let idx = nearest_index(centroid, &labs);
        if !picked.contains(&idx) {
            picked.push(idx);
        }
    }
    picked.into_iter().map(|idx| labs[idx]).collect()
}

/// Distinct color with the largest distance to its nearest centroid
fn farthest_color(hist: &ColorHistogram, centroids: &[Lab]) -> Option<Lab> {
    let mut best: Option<(f32, Lab)> = None;
    for bin in hist.bins() {
        let distance = centroids
            .iter()
            .map(|&c| delta_e_squared(bin.lab, c))
            .fold(f32::INFINITY, f32::min);
        if distance > 0.0 && best.map_or(true, |(d, _)| distance > d) {
            best = Some((distance, bin.lab));
        }
    }
    best.map(|(_, lab)| lab)
}
