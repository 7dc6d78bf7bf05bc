//! Curve sources and named curves.
//!
//! `CurveSource` is the only thing playback needs from a curve: a value at a
//! time and a length. `LinearCurve` is the piecewise-linear source used by
//! fixtures and tests; hosts plug in their own implementations.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use propanim_api_core::blend::lerp;
use serde::{Deserialize, Serialize};

pub trait CurveSource: Send + Sync {
    /// Value at `time` seconds. With `looping`, time wraps over `length()`.
    fn evaluate(&self, time: f32, looping: bool) -> f32;
    fn length(&self) -> f32;
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
}

/// Keyframes sorted by time, linearly interpolated, held flat outside the range.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearCurve {
    pub keys: Vec<Keyframe>,
}

impl LinearCurve {
    /// Build from `(time, value)` pairs. Keys are sorted by time.
    pub fn new(keys: impl IntoIterator<Item = (f32, f32)>) -> Self {
        let mut keys: Vec<Keyframe> = keys
            .into_iter()
            .map(|(time, value)| Keyframe { time, value })
            .collect();
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    pub fn constant(value: f32) -> Self {
        Self::new([(0.0, value)])
    }

    /// Segment `[i, i+1]` containing `t` and the local parameter in `[0, 1]`.
    /// Outside the key range both indices name the nearest end key.
    fn find_segment(&self, t: f32) -> (usize, usize, f32) {
        let keys = &self.keys;
        let n = keys.len();
        if n <= 1 || t <= keys[0].time {
            return (0, 0, 0.0);
        }
        if t >= keys[n - 1].time {
            return (n - 1, n - 1, 0.0);
        }
        let hi = keys.partition_point(|k| k.time <= t).min(n - 1);
        let lo = hi - 1;
        let span = (keys[hi].time - keys[lo].time).max(f32::EPSILON);
        (lo, hi, ((t - keys[lo].time) / span).clamp(0.0, 1.0))
    }
}

impl CurveSource for LinearCurve {
    fn evaluate(&self, time: f32, looping: bool) -> f32 {
        if self.keys.is_empty() {
            return 0.0;
        }
        let len = self.length();
        let t = if looping && len > 0.0 {
            time.rem_euclid(len)
        } else {
            time
        };
        let (i0, i1, lt) = self.find_segment(t);
        lerp(self.keys[i0].value, self.keys[i1].value, lt)
    }

    fn length(&self) -> f32 {
        self.keys.last().map(|k| k.time).unwrap_or(0.0).max(0.0)
    }
}

bitflags! {
    /// Import-time classification of a curve.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct CurveFlags: u8 {
        const IMPORTED = 0b001;
        /// Drives a morph-shape frame; never bound to a property.
        const MORPH_FRAME = 0b010;
        /// Drives a morph-channel weight; never bound to a property.
        const MORPH_WEIGHT = 0b100;
    }
}

impl CurveFlags {
    #[inline]
    pub fn is_morph(self) -> bool {
        self.intersects(CurveFlags::MORPH_FRAME | CurveFlags::MORPH_WEIGHT)
    }
}

/// A curve together with the property path (or generic name) it drives.
#[derive(Clone)]
pub struct NamedCurve {
    pub name: String,
    pub flags: CurveFlags,
    pub curve: Arc<dyn CurveSource>,
}

impl NamedCurve {
    pub fn new(name: impl Into<String>, curve: impl CurveSource + 'static) -> Self {
        Self {
            name: name.into(),
            flags: CurveFlags::empty(),
            curve: Arc::new(curve),
        }
    }

    pub fn with_flags(mut self, flags: CurveFlags) -> Self {
        self.flags = flags;
        self
    }
}

impl fmt::Debug for NamedCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedCurve")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("length", &self.curve.length())
            .finish()
    }
}
