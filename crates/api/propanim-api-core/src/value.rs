//! Value: runtime instances of every property shape a curve can drive.
//! All numeric types use f32, integers use i32.

use serde::{Deserialize, Serialize};

/// Coarse shape of a bindable property.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Scalar,
    Vector2,
    Vector3,
    Vector4,
    Color,
    Bool,
    Int,
}

impl ValueKind {
    /// Number of lanes a component suffix may address. Zero for kinds that
    /// have no addressable lanes.
    #[inline]
    pub fn lanes(self) -> usize {
        match self {
            ValueKind::Vector2 => 2,
            ValueKind::Vector3 => 3,
            ValueKind::Vector4 | ValueKind::Color => 4,
            ValueKind::Scalar | ValueKind::Bool | ValueKind::Int => 0,
        }
    }

    /// Vector2/3/4 and Color: the kinds written through read-modify-write.
    #[inline]
    pub fn is_multi_lane(self) -> bool {
        self.lanes() > 0
    }
}

/// RGBA color stored as four linear floats.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rgba(pub [f32; 4]);

impl Rgba {
    pub const WHITE: Rgba = Rgba([1.0, 1.0, 1.0, 1.0]);

    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Rgba([r, g, b, a])
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Value {
    /// Scalar float
    Float(f32),

    /// 2D vector
    Vec2([f32; 2]),

    /// 3D vector
    Vec3([f32; 3]),

    /// 4D vector
    Vec4([f32; 4]),

    /// RGBA color (linear by convention)
    Color([f32; 4]),

    /// Boolean (step)
    Bool(bool),

    /// Signed integer (step)
    Int(i32),
}

impl Value {
    /// Return the coarse kind of this value.
    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Float(_) => ValueKind::Scalar,
            Value::Vec2(_) => ValueKind::Vector2,
            Value::Vec3(_) => ValueKind::Vector3,
            Value::Vec4(_) => ValueKind::Vector4,
            Value::Color(_) => ValueKind::Color,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
        }
    }

    fn lanes_slice(&self) -> Option<&[f32]> {
        match self {
            Value::Vec2(a) => Some(a),
            Value::Vec3(a) => Some(a),
            Value::Vec4(a) | Value::Color(a) => Some(a),
            _ => None,
        }
    }

    fn lanes_slice_mut(&mut self) -> Option<&mut [f32]> {
        match self {
            Value::Vec2(a) => Some(a),
            Value::Vec3(a) => Some(a),
            Value::Vec4(a) | Value::Color(a) => Some(a),
            _ => None,
        }
    }

    /// Read one lane of a vector/color value.
    pub fn component(&self, lane: usize) -> Option<f32> {
        self.lanes_slice().and_then(|l| l.get(lane).copied())
    }

    /// Copy of `self` with one lane replaced. `None` when the value has no
    /// such lane.
    pub fn with_component(mut self, lane: usize, v: f32) -> Option<Value> {
        let slot = self.lanes_slice_mut()?.get_mut(lane)?;
        *slot = v;
        Some(self)
    }

    /// Convenience constructor
    pub fn vec3(x: f32, y: f32, z: f32) -> Self {
        Value::Vec3([x, y, z])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_component_overwrites_single_lane() {
        let v = Value::vec3(1.0, 2.0, 3.0);
        assert_eq!(v.with_component(1, 9.0), Some(Value::vec3(1.0, 9.0, 3.0)));
        assert_eq!(v.with_component(3, 9.0), None);
        assert_eq!(Value::Float(1.0).with_component(0, 2.0), None);
    }

    #[test]
    fn lanes_per_kind() {
        assert_eq!(ValueKind::Vector2.lanes(), 2);
        assert_eq!(ValueKind::Color.lanes(), 4);
        assert!(!ValueKind::Int.is_multi_lane());
    }

    #[test]
    fn serde_tagged_form() {
        let json = serde_json::to_string(&Value::Int(3)).unwrap();
        assert_eq!(json, r#"{"type":"int","data":3}"#);
        let back: Value = serde_json::from_str(r#"{"type":"vec2","data":[1.0,2.0]}"#).unwrap();
        assert_eq!(back, Value::Vec2([1.0, 2.0]));
    }
}
