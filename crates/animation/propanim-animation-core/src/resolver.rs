//! Path resolution: textual `ScenePath` -> stable property handle.
//!
//! A `ResolvedProperty` never holds a reference into the scene. It stores the
//! node or behavior handle plus the field identifier and re-resolves both on
//! every `get`/`set`, so a despawned target surfaces as an error instead of a
//! dangling write.

use std::any::TypeId;

use propanim_api_core::euler::{euler_deg_from_quat, quat_from_euler_deg};
use propanim_api_core::{ComponentSuffix, PathError, ScenePath, Value, ValueKind};
use thiserror::Error;

use crate::scene::{BehaviorId, NodeId, Scene};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolutionError {
    #[error("malformed path: {0}")]
    BadOrder(#[from] PathError),
    #[error("node not found: {0}")]
    NodeNotFound(String),
    #[error("behavior not found: {0}")]
    BehaviorNotFound(String),
    #[error("field not found: {0}")]
    FieldNotFound(String),
    #[error("index {index} out of bounds for '{field}' (len {len})")]
    IndexOutOfBounds {
        field: String,
        index: usize,
        len: usize,
    },
    #[error("unsupported property: {0}")]
    UnsupportedType(String),
}

/// Built-in node aliases usable without a behavior segment.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TransformChannel {
    Position,
    /// Euler angles in degrees over the stored quaternion.
    Rotation,
    Scale,
}

impl TransformChannel {
    pub fn from_alias(name: &str) -> Option<Self> {
        match name {
            "Position" => Some(Self::Position),
            "Rotation" => Some(Self::Rotation),
            "Scale" => Some(Self::Scale),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PropertyTarget {
    Transform {
        node: NodeId,
        channel: TransformChannel,
    },
    Field {
        behavior: BehaviorId,
        type_id: TypeId,
        field: String,
        index: Option<usize>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedProperty {
    pub kind: ValueKind,
    pub target: PropertyTarget,
    pub component: Option<ComponentSuffix>,
}

impl ResolvedProperty {
    pub fn get(&self, scene: &Scene) -> Result<Value, ResolutionError> {
        match &self.target {
            PropertyTarget::Transform { node, channel } => {
                let tf = scene
                    .transform(*node)
                    .ok_or_else(|| ResolutionError::NodeNotFound(format!("{node:?}")))?;
                Ok(Value::Vec3(match channel {
                    TransformChannel::Position => tf.position,
                    TransformChannel::Rotation => euler_deg_from_quat(tf.rotation),
                    TransformChannel::Scale => tf.scale,
                }))
            }
            PropertyTarget::Field {
                behavior,
                type_id,
                field,
                index,
            } => {
                let (tid, data) = scene
                    .behavior_any(*behavior)
                    .filter(|(tid, _)| tid == type_id)
                    .ok_or_else(|| ResolutionError::BehaviorNotFound(format!("{behavior:?}")))?;
                let accessor = scene
                    .registry()
                    .field(tid, field)
                    .ok_or_else(|| ResolutionError::FieldNotFound(field.clone()))?;
                accessor
                    .get(data, *index)
                    .ok_or_else(|| out_of_bounds(field, *index, accessor.len(data)))
            }
        }
    }

    pub fn set(&self, scene: &mut Scene, value: Value) -> Result<(), ResolutionError> {
        if value.kind() != self.kind {
            return Err(ResolutionError::UnsupportedType(format!(
                "{:?} written to {:?} property",
                value.kind(),
                self.kind
            )));
        }
        match &self.target {
            PropertyTarget::Transform { node, channel } => {
                let tf = scene
                    .transform_mut(*node)
                    .ok_or_else(|| ResolutionError::NodeNotFound(format!("{node:?}")))?;
                let Value::Vec3(v) = value else {
                    return Err(ResolutionError::UnsupportedType(format!("{channel:?}")));
                };
                match channel {
                    TransformChannel::Position => tf.position = v,
                    TransformChannel::Rotation => tf.rotation = quat_from_euler_deg(v),
                    TransformChannel::Scale => tf.scale = v,
                }
                Ok(())
            }
            PropertyTarget::Field {
                behavior,
                type_id,
                field,
                index,
            } => scene
                .with_behavior_mut(*behavior, |registry, tid, data| {
                    if tid != *type_id {
                        return Err(ResolutionError::BehaviorNotFound(format!("{behavior:?}")));
                    }
                    let accessor = registry
                        .field(tid, field)
                        .ok_or_else(|| ResolutionError::FieldNotFound(field.clone()))?;
                    let len = accessor.len(data);
                    if accessor.set(data, *index, value) {
                        Ok(())
                    } else {
                        Err(out_of_bounds(field, *index, len))
                    }
                })
                .unwrap_or_else(|| Err(ResolutionError::BehaviorNotFound(format!("{behavior:?}")))),
        }
    }
}

fn out_of_bounds(field: &str, index: Option<usize>, len: Option<usize>) -> ResolutionError {
    match (index, len) {
        (Some(index), Some(len)) => ResolutionError::IndexOutOfBounds {
            field: field.to_string(),
            index,
            len,
        },
        _ => ResolutionError::UnsupportedType(field.to_string()),
    }
}

/// Parse and resolve `path` relative to `root`.
pub fn resolve(scene: &Scene, root: NodeId, path: &str) -> Result<ResolvedProperty, ResolutionError> {
    let parsed = ScenePath::parse(path)?;
    resolve_path(scene, root, &parsed)
}

/// Resolve a pre-parsed path. Any unresolved segment aborts with no partial result.
pub fn resolve_path(
    scene: &Scene,
    root: NodeId,
    path: &ScenePath,
) -> Result<ResolvedProperty, ResolutionError> {
    if !scene.contains(root) {
        return Err(ResolutionError::NodeNotFound(format!("{root:?}")));
    }

    let mut node = root;
    for name in path.descent() {
        node = scene
            .find_child(node, name)
            .ok_or_else(|| ResolutionError::NodeNotFound(name.to_string()))?;
    }

    let field = &path.field;
    let Some(type_name) = path.behavior_name() else {
        let channel = TransformChannel::from_alias(&field.name)
            .ok_or_else(|| ResolutionError::FieldNotFound(field.name.clone()))?;
        if field.index.is_some() {
            return Err(ResolutionError::UnsupportedType(format!(
                "{} cannot be indexed",
                field.name
            )));
        }
        return Ok(ResolvedProperty {
            kind: ValueKind::Vector3,
            target: PropertyTarget::Transform { node, channel },
            component: path.component,
        });
    };

    let behavior = scene
        .find_behavior(node, type_name)
        .ok_or_else(|| ResolutionError::BehaviorNotFound(type_name.to_string()))?;
    let (type_id, data) = scene
        .behavior_any(behavior)
        .ok_or_else(|| ResolutionError::BehaviorNotFound(type_name.to_string()))?;
    let accessor = scene
        .registry()
        .field(type_id, &field.name)
        .ok_or_else(|| ResolutionError::FieldNotFound(format!("{type_name}.{}", field.name)))?;

    match (accessor.indexed, field.index) {
        (true, Some(index)) => {
            let len = accessor.len(data).unwrap_or(0);
            if index >= len {
                return Err(ResolutionError::IndexOutOfBounds {
                    field: field.name.clone(),
                    index,
                    len,
                });
            }
        }
        (true, None) => {
            return Err(ResolutionError::UnsupportedType(format!(
                "{} is a collection and needs an index",
                field.name
            )))
        }
        (false, Some(_)) => {
            return Err(ResolutionError::UnsupportedType(format!(
                "{} cannot be indexed",
                field.name
            )))
        }
        (false, None) => {}
    }

    Ok(ResolvedProperty {
        kind: accessor.kind,
        target: PropertyTarget::Field {
            behavior,
            type_id,
            field: field.name.clone(),
            index: field.index,
        },
        component: path.component,
    })
}
