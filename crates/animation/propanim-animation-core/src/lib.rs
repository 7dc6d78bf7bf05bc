//! propanim animation core (engine-agnostic)
//!
//! Binds textual property paths on a scene graph to curve-driven setters and
//! plays clips on layers: single play, additive layers, cross-fades, 1D and
//! 2D blends, plus `"Type/Method"` events embedded in clips. The `Animator`
//! ties the pieces together once per tick.

pub mod animator;
pub mod binder;
pub mod blend;
pub mod clip;
pub mod config;
pub mod curve;
pub mod events;
pub mod ids;
pub mod outputs;
pub mod playback;
pub mod registry;
pub mod resolver;
pub mod scene;

// Re-exports for hosts
pub use animator::{Animator, AnimatorError};
pub use binder::{bind, bind_clip_curves, BindingSkipped, ClipBindings, CurveSetter, SkipReason};
pub use blend::{weights_1d, weights_2d, Blend1D, Blend2D, BlendClip};
pub use clip::{AnimationClip, AnimationEvent};
pub use config::AnimatorConfig;
pub use curve::{CurveFlags, CurveSource, Keyframe, LinearCurve, NamedCurve};
pub use events::{dispatch, DispatchOutcome, EventName};
pub use ids::ClipId;
pub use outputs::{Change, FiredEvent, Outputs};
pub use playback::{ClipPlayback, ClipState, Layer, LayerStatus, WrapMode};
pub use registry::{BehaviorRegistry, FieldValue};
pub use resolver::{resolve, resolve_path, PropertyTarget, ResolutionError, ResolvedProperty};
pub use scene::{BehaviorId, LocalTransform, NodeId, Scene, SceneError};
pub use propanim_api_core::{PathError, Rgba, ScenePath, Value, ValueKind};
