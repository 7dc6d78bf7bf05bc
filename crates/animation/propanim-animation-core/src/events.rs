//! Named clip events: `"Type/Method"` markers swept by playback and routed to
//! the first matching behavior on the animated node.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::clip::AnimationEvent;
use crate::playback::{TimeStep, WrapMode};
use crate::scene::{NodeId, Scene};

/// Decoded event name.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EventName<'a> {
    Target { type_name: &'a str, method: &'a str },
    Malformed,
}

impl<'a> EventName<'a> {
    /// Exactly one `/`, both halves non-empty.
    pub fn parse(name: &'a str) -> Self {
        match name.split_once('/') {
            Some((type_name, method))
                if !type_name.is_empty() && !method.is_empty() && !method.contains('/') =>
            {
                EventName::Target { type_name, method }
            }
            _ => EventName::Malformed,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchOutcome {
    Invoked,
    Malformed,
    NoMatch,
}

/// Invoke the method named by `name` on the first behavior of `node` whose
/// type name matches. Malformed names and missing targets are ignored.
pub fn dispatch(scene: &mut Scene, node: NodeId, name: &str) -> DispatchOutcome {
    let EventName::Target { type_name, method } = EventName::parse(name) else {
        debug!("ignoring malformed event name '{name}'");
        return DispatchOutcome::Malformed;
    };
    let Some(behavior) = scene.find_behavior(node, type_name) else {
        debug!("event '{name}': no {type_name} behavior on node");
        return DispatchOutcome::NoMatch;
    };
    let invoked = scene
        .with_behavior_mut(behavior, |registry, tid, data| {
            registry.invoke(tid, method, data)
        })
        .unwrap_or(false);
    if invoked {
        DispatchOutcome::Invoked
    } else {
        debug!("event '{name}': {type_name} has no method {method}");
        DispatchOutcome::NoMatch
    }
}

/// Markers whose time lies in the window swept by `step`.
///
/// Only forward motion fires. Under `Loop` the window is split where it wraps
/// and a step covering a whole cycle fires every marker once. Under `Clamp`
/// the window stops at the clip end, and a marker sitting exactly on the end
/// fires when the clip reaches it.
pub fn markers_crossed<'e>(events: &'e [AnimationEvent], step: &TimeStep) -> Vec<&'e AnimationEvent> {
    let (from, delta, len) = (step.from, step.delta, step.length);
    if delta <= 0.0 || len <= 0.0 {
        return Vec::new();
    }
    let end = from + delta;

    let hit = |e: &&AnimationEvent| -> bool {
        let t = e.time;
        match step.wrap_mode {
            WrapMode::Loop if delta >= len => true,
            WrapMode::Loop if end < len => t >= from && t < end,
            WrapMode::Loop => (t >= from && t <= len) || (t >= 0.0 && t < end - len),
            WrapMode::Clamp => {
                (t >= from && t < end.min(len)) || (t == len && from < len && end >= len)
            }
        }
    };
    events.iter().filter(hit).collect()
}
