//! propanim-api-core: value model, scene path grammar and blend helpers
//! shared by the animation core and any host adapter.

pub mod blend;
pub mod euler;
pub mod scene_path;
pub mod value;

pub use scene_path::{ComponentSuffix, PathError, ScenePath, SuffixFamily};
pub use value::{Rgba, Value, ValueKind};
