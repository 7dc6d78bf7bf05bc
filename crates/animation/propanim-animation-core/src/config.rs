//! Configuration for the animation driver.

use serde::{Deserialize, Serialize};

use crate::playback::WrapMode;

/// Defaults applied to newly played clips, plus output sizing.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatorConfig {
    /// Speed given to clips started by `play`, `cross_fade` and `blend_additive`.
    pub default_speed: f32,
    pub default_wrap_mode: WrapMode,

    /// Maximum events recorded (and dispatched) per tick. Later ones are dropped.
    pub max_events_per_tick: usize,

    /// Record `BindingSkipped` diagnostics in `Outputs` after a rebuild.
    pub record_skipped_bindings: bool,
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self {
            default_speed: 1.0,
            default_wrap_mode: WrapMode::Loop,
            max_events_per_tick: 1024,
            record_skipped_bindings: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: AnimatorConfig =
            serde_json::from_str(r#"{"default_wrap_mode":"Clamp"}"#).unwrap();
        assert_eq!(cfg.default_wrap_mode, WrapMode::Clamp);
        assert_eq!(cfg.default_speed, 1.0);
        assert_eq!(cfg.max_events_per_tick, 1024);
    }
}
