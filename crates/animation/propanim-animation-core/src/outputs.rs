//! Per-tick record of what the animator did.
//!
//! Outputs carry the blended value written for every driven curve, the events
//! fired and, after a rebind, the curves that could not be bound. Hosts use
//! them for inspection; the scene itself has already been written.

use serde::{Deserialize, Serialize};

use crate::binder::BindingSkipped;
use crate::events::DispatchOutcome;
use crate::ids::ClipId;

/// One driven curve and the blended sample written for it this tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub curve: String,
    pub value: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FiredEvent {
    pub clip: ClipId,
    pub name: String,
    /// Marker time on the clip timeline.
    pub time: f32,
    pub outcome: DispatchOutcome,
}

/// Outputs returned by `Animator::update()`.
#[derive(Clone, Debug, Default)]
pub struct Outputs {
    pub changes: Vec<Change>,
    pub events: Vec<FiredEvent>,
    /// Filled only on ticks that rebuilt bindings.
    pub skipped: Vec<BindingSkipped>,
}

impl Outputs {
    #[inline]
    pub fn clear(&mut self) {
        self.changes.clear();
        self.events.clear();
        self.skipped.clear();
    }

    #[inline]
    pub fn push_change(&mut self, change: Change) {
        self.changes.push(change);
    }

    #[inline]
    pub fn push_event(&mut self, event: FiredEvent) {
        self.events.push(event);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.events.is_empty() && self.skipped.is_empty()
    }

    /// Value written for `curve` this tick.
    pub fn change(&self, curve: &str) -> Option<f32> {
        self.changes
            .iter()
            .find(|c| c.curve == curve)
            .map(|c| c.value)
    }
}
