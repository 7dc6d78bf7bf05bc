//! Property binding: turns a resolved property into a per-frame setter that
//! writes one scalar curve sample.

use hashbrown::HashMap;
use log::{debug, warn};
use propanim_api_core::{ComponentSuffix, SuffixFamily, Value, ValueKind};

use crate::curve::NamedCurve;
use crate::resolver::{resolve, ResolutionError, ResolvedProperty};
use crate::scene::{NodeId, Scene};

/// How a scalar sample lands in the property.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SetterOp {
    /// Read-modify-write of one lane of a vector or color.
    Lane(usize),
    /// `sample > 0`.
    Bool,
    /// Truncate toward zero.
    Int,
    Float,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CurveSetter {
    pub property: ResolvedProperty,
    pub op: SetterOp,
}

impl CurveSetter {
    pub fn apply(&self, scene: &mut Scene, sample: f32) -> Result<(), ResolutionError> {
        let value = match self.op {
            SetterOp::Lane(lane) => {
                let current = self.property.get(scene)?;
                current.with_component(lane, sample).ok_or_else(|| {
                    ResolutionError::UnsupportedType(format!("lane {lane} of {:?}", current.kind()))
                })?
            }
            SetterOp::Bool => Value::Bool(sample > 0.0),
            SetterOp::Int => Value::Int(sample as i32),
            SetterOp::Float => Value::Float(sample),
        };
        self.property.set(scene, value)
    }
}

fn family_for(kind: ValueKind) -> SuffixFamily {
    match kind {
        ValueKind::Color => SuffixFamily::Color,
        _ => SuffixFamily::Vector,
    }
}

/// Build the setter for a resolved property, or `None` when the property
/// shape and component suffix do not fit together.
pub fn bind(property: &ResolvedProperty) -> Option<CurveSetter> {
    let op = match (property.kind, property.component) {
        (kind, component) if kind.is_multi_lane() => {
            let lane = match component {
                None => 0,
                Some(ComponentSuffix { lane, family }) => {
                    if family != family_for(kind) || lane >= kind.lanes() {
                        return None;
                    }
                    lane
                }
            };
            SetterOp::Lane(lane)
        }
        (_, Some(_)) => return None,
        (ValueKind::Bool, None) => SetterOp::Bool,
        (ValueKind::Int, None) => SetterOp::Int,
        (ValueKind::Scalar, None) => SetterOp::Float,
        _ => return None,
    };
    Some(CurveSetter {
        property: property.clone(),
        op,
    })
}

#[derive(Clone, Debug, PartialEq)]
pub enum SkipReason {
    Resolution(ResolutionError),
    Unsupported {
        kind: ValueKind,
        component: Option<ComponentSuffix>,
    },
}

/// A curve left undriven by the last bind pass.
#[derive(Clone, Debug, PartialEq)]
pub struct BindingSkipped {
    pub curve: String,
    pub reason: SkipReason,
}

#[derive(Clone, Debug)]
pub struct CurveBinding {
    pub curve: String,
    pub setter: CurveSetter,
}

/// Result of one bind pass, in first-seen curve order.
#[derive(Clone, Debug, Default)]
pub struct ClipBindings {
    pub bindings: Vec<CurveBinding>,
    pub skipped: Vec<BindingSkipped>,
    index: HashMap<String, usize>,
}

impl ClipBindings {
    pub fn get(&self, curve: &str) -> Option<&CurveSetter> {
        self.index.get(curve).map(|i| &self.bindings[*i].setter)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Resolve and bind every property curve. A failing curve is recorded and
/// skipped; the pass never aborts. Morph curves are not property-bound.
pub fn bind_clip_curves<'a>(
    scene: &Scene,
    root: NodeId,
    curves: impl IntoIterator<Item = &'a NamedCurve>,
) -> ClipBindings {
    let mut out = ClipBindings::default();
    let mut seen: hashbrown::HashSet<&str> = hashbrown::HashSet::new();

    for curve in curves {
        if curve.flags.is_morph() || !seen.insert(curve.name.as_str()) {
            continue;
        }
        let skipped = match resolve(scene, root, &curve.name) {
            Ok(property) => match bind(&property) {
                Some(setter) => {
                    out.index.insert(curve.name.clone(), out.bindings.len());
                    out.bindings.push(CurveBinding {
                        curve: curve.name.clone(),
                        setter,
                    });
                    continue;
                }
                None => SkipReason::Unsupported {
                    kind: property.kind,
                    component: property.component,
                },
            },
            Err(e) => SkipReason::Resolution(e),
        };
        warn!("curve '{}' left unbound: {:?}", curve.name, skipped);
        out.skipped.push(BindingSkipped {
            curve: curve.name.clone(),
            reason: skipped,
        });
    }

    debug!(
        "bound {} curves, skipped {}",
        out.bindings.len(),
        out.skipped.len()
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{CurveFlags, LinearCurve};
    use crate::registry::BehaviorRegistry;
    use propanim_api_core::Rgba;

    #[derive(Default)]
    struct Light {
        on: bool,
        count: i32,
        tint: Rgba,
        intensity: f32,
    }

    fn scene() -> (Scene, NodeId) {
        let mut reg = BehaviorRegistry::new();
        reg.register::<Light>("Light")
            .field("on", |l| &l.on, |l| &mut l.on)
            .field("count", |l| &l.count, |l| &mut l.count)
            .field("tint", |l| &l.tint, |l| &mut l.tint)
            .field("intensity", |l| &l.intensity, |l| &mut l.intensity);
        let mut s = Scene::new(reg);
        let root = s.spawn("root", None).unwrap();
        s.attach(root, Light::default()).unwrap();
        (s, root)
    }

    fn setter(s: &Scene, root: NodeId, path: &str) -> Option<CurveSetter> {
        bind(&resolve(s, root, path).unwrap())
    }

    #[test]
    fn int_truncates_toward_zero() {
        let (mut s, root) = scene();
        let set = setter(&s, root, ":Light/count").unwrap();
        set.apply(&mut s, -2.9).unwrap();
        assert_eq!(set.property.get(&s).unwrap(), Value::Int(-2));
        set.apply(&mut s, 3.99).unwrap();
        assert_eq!(set.property.get(&s).unwrap(), Value::Int(3));
    }

    #[test]
    fn color_lane_read_modify_write() {
        let (mut s, root) = scene();
        let g = setter(&s, root, ":Light/tint.g").unwrap();
        assert_eq!(g.op, SetterOp::Lane(1));
        g.apply(&mut s, 0.5).unwrap();
        assert_eq!(
            g.property.get(&s).unwrap(),
            Value::Color([0.0, 0.5, 0.0, 0.0])
        );
    }

    #[test]
    fn unsupported_combinations() {
        let (s, root) = scene();
        assert!(setter(&s, root, ":Light/tint.x").is_none());
        assert!(setter(&s, root, ":Light/intensity.x").is_none());
        assert!(setter(&s, root, ":Light/on.r").is_none());
        assert!(setter(&s, root, "Position.w").is_none());
        assert_eq!(
            setter(&s, root, "Scale").map(|b| b.op),
            Some(SetterOp::Lane(0))
        );
    }

    #[test]
    fn bind_pass_skips_and_dedupes() {
        let (s, root) = scene();
        let curves = vec![
            NamedCurve::new(":Light/intensity", LinearCurve::constant(1.0)),
            NamedCurve::new(":Light/intensity", LinearCurve::constant(2.0)),
            NamedCurve::new("!Missing/Position.x", LinearCurve::constant(1.0)),
            NamedCurve::new(":Light/on.x", LinearCurve::constant(1.0)),
            NamedCurve::new("smile", LinearCurve::constant(1.0))
                .with_flags(CurveFlags::MORPH_WEIGHT),
        ];
        let b = bind_clip_curves(&s, root, &curves);
        assert_eq!(b.len(), 1);
        assert!(b.get(":Light/intensity").is_some());
        assert_eq!(b.skipped.len(), 2);
        assert!(matches!(
            b.skipped[0].reason,
            SkipReason::Resolution(ResolutionError::NodeNotFound(_))
        ));
        assert!(matches!(
            b.skipped[1].reason,
            SkipReason::Unsupported {
                kind: ValueKind::Bool,
                ..
            }
        ));
    }
}
