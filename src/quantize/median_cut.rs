//! Weighted median cut over the Lab histogram

use palette::Lab;

use super::sampling::{ColorHistogram, HistogramBin};
use super::Cluster;
use crate::color::Color;

/// A box of histogram bins for median cut subdivision.
#[derive(Debug, Clone)]
struct ColorBox {
    bins: Vec<HistogramBin>,
}

impl ColorBox {
    fn total_weight(&self) -> u64 {
        self.bins.iter().map(|bin| bin.count).sum()
    }

    /// Range (max - min) along each Lab axis.
    fn ranges(&self) -> [f32; 3] {
        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        for bin in &self.bins {
            for (axis, value) in axes(bin.lab).into_iter().enumerate() {
                min[axis] = min[axis].min(value);
                max[axis] = max[axis].max(value);
            }
        }
        [max[0] - min[0], max[1] - min[1], max[2] - min[2]]
    }

    /// Larger, more varied boxes split first.
    fn priority(&self) -> f32 {
        let [rl, ra, rb] = self.ranges();
        self.total_weight() as f32 * rl.max(ra).max(rb)
    }

    /// Weighted centroid of all bins.
    fn centroid(&self) -> Lab {
        let mut sum = [0.0f64; 3];
        let mut weight = 0.0f64;
        for bin in &self.bins {
            let w = bin.count as f64;
            for (axis, value) in axes(bin.lab).into_iter().enumerate() {
                sum[axis] += value as f64 * w;
            }
            weight += w;
        }
        if weight <= 0.0 {
            return Lab::new(0.0, 0.0, 0.0);
        }
        Lab::new(
            (sum[0] / weight) as f32,
            (sum[1] / weight) as f32,
            (sum[2] / weight) as f32,
        )
    }

    /// Split along the widest axis at the weighted median.
    fn split(mut self) -> (ColorBox, ColorBox) {
        let [rl, ra, rb] = self.ranges();
        let axis = if rl >= ra && rl >= rb {
            0
        } else if ra >= rb {
            1
        } else {
            2
        };

        self.bins.sort_by(|a, b| {
            axes(a.lab)[axis]
                .total_cmp(&axes(b.lab)[axis])
                .then(a.color.cmp(&b.color))
        });

        let half = self.total_weight() as f64 / 2.0;
        let mut accumulated = 0u64;
        let mut split_idx = 1;
        for (i, bin) in self.bins.iter().enumerate() {
            accumulated += bin.count;
            if accumulated as f64 >= half && i + 1 < self.bins.len() {
                split_idx = i + 1;
                break;
            }
        }
        // At least one bin per side
        split_idx = split_idx.clamp(1, self.bins.len() - 1);

        let right = self.bins.split_off(split_idx);
        (self, ColorBox { bins: right })
    }
}

fn axes(lab: Lab) -> [f32; 3] {
    [lab.l, lab.a, lab.b]
}

/// Median-cut `hist` into `k` boxes (`k < hist.len()`)
pub(crate) fn cluster(hist: &ColorHistogram, k: usize) -> Vec<Cluster> {
    let mut boxes = vec![ColorBox {
        bins: hist.bins().to_vec(),
    }];

    while boxes.len() < k {
        let best = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.bins.len() >= 2)
            .fold(None::<(usize, f32)>, |best, (i, b)| {
                let priority = b.priority();
                match best {
                    Some((_, p)) if p >= priority => best,
                    _ => Some((i, priority)),
                }
            });

        let Some((idx, _)) = best else {
            break;
        };

        let (left, right) = boxes.remove(idx).split();
        boxes.insert(idx, right);
        boxes.insert(idx, left);
    }

    boxes
        .iter()
        .map(|b| Cluster {
            color: Color::from_lab(b.centroid()),
            count: b.total_weight(),
            members: b.bins.iter().map(|bin| bin.color).collect(),
        })
        .collect()
}
