//! Blend descriptors, weight functions and per-curve accumulation.
//!
//! 1D and 2D blends are pull-based: the caller supplies the parameter each
//! call, the weights are recomputed from scratch and written onto still,
//! clamped base-layer clips. Evaluation then folds every active clip's sample
//! into a `CurveAccumulator` keyed by curve name.

use hashbrown::HashMap;
use propanim_api_core::blend::{bilinear_weights, inverse_lerp};
use serde::{Deserialize, Serialize};

use crate::ids::ClipId;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlendClip {
    pub clip: ClipId,
    pub position: f32,
}

/// Clips along one axis, ascending by position. Ordering is the caller's
/// contract and is not checked.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Blend1D {
    pub clips: Vec<BlendClip>,
}

impl Blend1D {
    pub fn new(clips: impl IntoIterator<Item = (ClipId, f32)>) -> Self {
        Self {
            clips: clips
                .into_iter()
                .map(|(clip, position)| BlendClip { clip, position })
                .collect(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Blend2D {
    pub top_left: ClipId,
    pub top_right: ClipId,
    pub bot_left: ClipId,
    pub bot_right: ClipId,
}

impl Blend2D {
    /// Corners in the order `weights_2d` reports them.
    pub fn corners(&self) -> [ClipId; 4] {
        [self.top_left, self.top_right, self.bot_left, self.bot_right]
    }
}

/// Weight per entry for absolute position `t`. `t` is clamped to the
/// descriptor's domain; the two entries bracketing it share the weight and
/// every other entry gets 0. A single entry or a zero-width domain gives the
/// first entry full weight.
pub fn weights_1d(positions: &[f32], t: f32) -> Vec<f32> {
    let n = positions.len();
    let mut weights = vec![0.0; n];
    if n == 0 {
        return weights;
    }
    let start = positions.iter().copied().fold(f32::INFINITY, f32::min);
    let end = positions.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if n == 1 || end - start <= 0.0 {
        weights[0] = 1.0;
        return weights;
    }

    let x = t.clamp(start, end);
    let hi = positions.partition_point(|p| *p <= x).clamp(1, n - 1);
    let lo = hi - 1;
    let local = inverse_lerp(positions[lo], positions[hi], x).clamp(0.0, 1.0);
    weights[lo] = 1.0 - local;
    weights[hi] += local;
    weights
}

/// Bilinear corner weights `[top_left, top_right, bot_left, bot_right]` at
/// `(u, v)`, each clamped to `[0, 1]`.
pub fn weights_2d(u: f32, v: f32) -> [f32; 4] {
    bilinear_weights(u.clamp(0.0, 1.0), v.clamp(0.0, 1.0))
}

#[derive(Clone, Debug, Default)]
struct CurveSum {
    base: f32,
    additive: f32,
    contributed: bool,
}

/// Weighted per-curve sums for one evaluation. The base layer contributes
/// `Σ w·sample`; additive layers add their own `Σ w·sample` on top.
#[derive(Clone, Debug, Default)]
pub struct CurveAccumulator {
    sums: Vec<(String, CurveSum)>,
    index: HashMap<String, usize>,
}

impl CurveAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.sums.clear();
        self.index.clear();
    }

    fn slot(&mut self, curve: &str) -> &mut CurveSum {
        let idx = match self.index.get(curve) {
            Some(i) => *i,
            None => {
                self.sums.push((curve.to_string(), CurveSum::default()));
                self.index.insert(curve.to_string(), self.sums.len() - 1);
                self.sums.len() - 1
            }
        };
        &mut self.sums[idx].1
    }

    /// Fold one weighted sample in. Zero weights do not count as contributions.
    pub fn add(&mut self, curve: &str, sample: f32, weight: f32, additive: bool) {
        if weight == 0.0 {
            return;
        }
        let s = self.slot(curve);
        if additive {
            s.additive += sample * weight;
        } else {
            s.base += sample * weight;
        }
        s.contributed = true;
    }

    /// Blended value of `curve`, `None` when nothing contributed.
    pub fn value(&self, curve: &str) -> Option<f32> {
        let (_, s) = &self.sums[*self.index.get(curve)?];
        s.contributed.then_some(s.base + s.additive)
    }

    /// Every driven curve with its blended value, in first-contribution order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.sums
            .iter()
            .filter(|(_, s)| s.contributed)
            .map(|(name, s)| (name.as_str(), s.base + s.additive))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() <= 1e-5
    }

    #[test]
    fn one_d_brackets_and_clamps() {
        let w = weights_1d(&[0.0, 1.0], 0.25);
        assert!(approx(w[0], 0.75) && approx(w[1], 0.25));

        let w = weights_1d(&[0.0, 1.0, 3.0], 2.0);
        assert_eq!(w[0], 0.0);
        assert!(approx(w[1], 0.5) && approx(w[2], 0.5));

        assert_eq!(weights_1d(&[0.0, 1.0, 3.0], -4.0), vec![1.0, 0.0, 0.0]);
        assert_eq!(weights_1d(&[0.0, 1.0, 3.0], 9.0), vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn one_d_degenerate() {
        assert!(weights_1d(&[], 0.5).is_empty());
        assert_eq!(weights_1d(&[2.0], 0.5), vec![1.0]);
        assert_eq!(weights_1d(&[1.0, 1.0], 0.5), vec![1.0, 0.0]);
        // Unsorted input is a caller error; it must still not panic.
        assert_eq!(weights_1d(&[3.0, 0.0, 1.0], 0.5).len(), 3);
    }

    #[test]
    fn two_d_center_is_uniform() {
        for w in weights_2d(0.5, 0.5) {
            assert!(approx(w, 0.25));
        }
        assert_eq!(weights_2d(2.0, -1.0), [0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn accumulator_layers() {
        let mut acc = CurveAccumulator::new();
        acc.add("a", 2.0, 0.5, false);
        acc.add("a", 4.0, 0.5, false);
        acc.add("a", 1.0, 0.5, true);
        acc.add("b", 9.0, 0.0, false);
        assert!(approx(acc.value("a").unwrap(), 3.5));
        assert_eq!(acc.value("b"), None);
        assert_eq!(acc.iter().count(), 1);
        acc.clear();
        assert_eq!(acc.value("a"), None);
    }
}
