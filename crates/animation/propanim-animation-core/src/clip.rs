//! Animation clips: named curves plus timed event markers.

use serde::{Deserialize, Serialize};

use crate::curve::NamedCurve;

/// A marker on the clip timeline. `name` is `"Type/Method"`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationEvent {
    pub time: f32,
    pub name: String,
}

#[derive(Clone, Debug, Default)]
pub struct AnimationClip {
    pub name: String,
    pub curves: Vec<NamedCurve>,
    pub events: Vec<AnimationEvent>,
    /// Authored as a delta pose for additive layers.
    pub additive: bool,
    /// Explicit duration; derived from curves and events when absent.
    pub length: Option<f32>,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_curve(mut self, curve: NamedCurve) -> Self {
        self.curves.push(curve);
        self
    }

    pub fn with_event(mut self, time: f32, name: impl Into<String>) -> Self {
        self.events.push(AnimationEvent {
            time,
            name: name.into(),
        });
        self
    }

    pub fn additive(mut self, additive: bool) -> Self {
        self.additive = additive;
        self
    }

    pub fn with_length(mut self, length: f32) -> Self {
        self.length = Some(length);
        self
    }

    /// Duration in seconds, never negative.
    pub fn length(&self) -> f32 {
        if let Some(l) = self.length {
            return l.max(0.0);
        }
        let curves = self.curves.iter().map(|c| c.curve.length());
        let events = self.events.iter().map(|e| e.time);
        curves.chain(events).fold(0.0_f32, f32::max)
    }

    /// Events sorted by time, stable for equal times.
    pub(crate) fn sort_events(&mut self) {
        self.events.sort_by(|a, b| a.time.total_cmp(&b.time));
    }
}
