//! Histogram binning: the most populated uniform RGB bins win
//!
//! Bins start coarse and are refined one bit per channel at a time until
//! there are at least `k` non-empty bins (at 8 bits every distinct color is a
//! bin). Pixels of bins that did not make the top `k` are folded into the
//! nearest kept bin in Lab.

use std::collections::BTreeMap;

use palette::Lab;

use super::sampling::ColorHistogram;
use super::{nearest_index, Cluster};
use crate::color::Color;
use crate::constants::quantize::BINNING_START_BITS;

#[derive(Debug, Clone, Copy, Default)]
struct Bin {
    sum: [u64; 3],
    count: u64,
}

impl Bin {
    fn mean(&self) -> Color {
        let n = self.count.max(1);
        let channel = |sum: u64| ((sum + n / 2) / n) as u8;
        Color::new(channel(self.sum[0]), channel(self.sum[1]), channel(self.sum[2]))
    }
}

fn bin_key(color: Color, bits: u32) -> [u8; 3] {
    let shift = 8 - bits;
    [color.r >> shift, color.g >> shift, color.b >> shift]
}

fn build_bins(hist: &ColorHistogram, bits: u32) -> BTreeMap<[u8; 3], Bin> {
    let mut bins: BTreeMap<[u8; 3], Bin> = BTreeMap::new();
    for entry in hist.bins() {
        let bin = bins.entry(bin_key(entry.color, bits)).or_default();
        bin.sum[0] += entry.color.r as u64 * entry.count;
        bin.sum[1] += entry.color.g as u64 * entry.count;
        bin.sum[2] += entry.color.b as u64 * entry.count;
        bin.count += entry.count;
    }
    bins
}

/// Pick the `k` most populated bins (`k < hist.len()`)
pub(crate) fn cluster(hist: &ColorHistogram, k: usize) -> Vec<Cluster> {
    let mut bits = BINNING_START_BITS;
    let mut bins = build_bins(hist, bits);
    while bins.len() < k && bits < 8 {
        bits += 1;
        bins = build_bins(hist, bits);
    }

    // BTreeMap iteration is key-ordered, so the stable sort breaks count ties
    // by lowest bin.
    let mut ranked: Vec<([u8; 3], Bin)> = bins.into_iter().collect();
    ranked.sort_by(|a, b| b.1.count.cmp(&a.1.count));
    ranked.truncate(k);

    let kept_keys: Vec<[u8; 3]> = ranked.iter().map(|(key, _)| *key).collect();
    let colors: Vec<Color> = ranked.iter().map(|(_, bin)| bin.mean()).collect();
    let labs: Vec<Lab> = colors.iter().map(|c| c.to_lab()).collect();
    let mut counts: Vec<u64> = ranked.iter().map(|(_, bin)| bin.count).collect();
    let mut members: Vec<Vec<Color>> = vec![Vec::new(); kept_keys.len()];

    for entry in hist.bins() {
        let key = bin_key(entry.color, bits);
        match kept_keys.iter().position(|kept| *kept == key) {
            Some(idx) => members[idx].push(entry.color),
            None => {
                let idx = nearest_index(entry.lab, &labs);
                counts[idx] += entry.count;
                members[idx].push(entry.color);
            }
        }
    }

    colors
        .into_iter()
        .zip(counts)
        .zip(members)
        .map(|((color, count), members)| Cluster {
            color,
            count,
            members,
        })
        .collect()
}
