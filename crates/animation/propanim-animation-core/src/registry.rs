//! Load-time reflection for behavior types.
//!
//! Each behavior type registers a name, its animatable fields and its
//! zero-argument methods. Field access goes through boxed accessors over
//! `dyn Any`, so the rest of the crate never needs to know concrete types.

use std::any::{Any, TypeId};
use std::marker::PhantomData;

use hashbrown::HashMap;
use propanim_api_core::{Rgba, Value, ValueKind};

/// A Rust type that can back an animatable field.
pub trait FieldValue: Copy + 'static {
    const KIND: ValueKind;
    fn to_value(self) -> Value;
    fn from_value(v: Value) -> Option<Self>;
}

impl FieldValue for f32 {
    const KIND: ValueKind = ValueKind::Scalar;
    fn to_value(self) -> Value {
        Value::Float(self)
    }
    fn from_value(v: Value) -> Option<Self> {
        match v {
            Value::Float(f) => Some(f),
            _ => None,
        }
    }
}

impl FieldValue for bool {
    const KIND: ValueKind = ValueKind::Bool;
    fn to_value(self) -> Value {
        Value::Bool(self)
    }
    fn from_value(v: Value) -> Option<Self> {
        match v {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }
}

impl FieldValue for i32 {
    const KIND: ValueKind = ValueKind::Int;
    fn to_value(self) -> Value {
        Value::Int(self)
    }
    fn from_value(v: Value) -> Option<Self> {
        match v {
            Value::Int(i) => Some(i),
            _ => None,
        }
    }
}

impl FieldValue for [f32; 2] {
    const KIND: ValueKind = ValueKind::Vector2;
    fn to_value(self) -> Value {
        Value::Vec2(self)
    }
    fn from_value(v: Value) -> Option<Self> {
        match v {
            Value::Vec2(a) => Some(a),
            _ => None,
        }
    }
}

impl FieldValue for [f32; 3] {
    const KIND: ValueKind = ValueKind::Vector3;
    fn to_value(self) -> Value {
        Value::Vec3(self)
    }
    fn from_value(v: Value) -> Option<Self> {
        match v {
            Value::Vec3(a) => Some(a),
            _ => None,
        }
    }
}

impl FieldValue for [f32; 4] {
    const KIND: ValueKind = ValueKind::Vector4;
    fn to_value(self) -> Value {
        Value::Vec4(self)
    }
    fn from_value(v: Value) -> Option<Self> {
        match v {
            Value::Vec4(a) => Some(a),
            _ => None,
        }
    }
}

impl FieldValue for Rgba {
    const KIND: ValueKind = ValueKind::Color;
    fn to_value(self) -> Value {
        Value::Color(self.0)
    }
    fn from_value(v: Value) -> Option<Self> {
        match v {
            Value::Color(a) => Some(Rgba(a)),
            _ => None,
        }
    }
}

type Getter = Box<dyn Fn(&dyn Any, Option<usize>) -> Option<Value> + Send + Sync>;
type Setter = Box<dyn Fn(&mut dyn Any, Option<usize>, Value) -> bool + Send + Sync>;
type Method = Box<dyn Fn(&mut dyn Any) + Send + Sync>;

/// Type-erased access to one registered field.
pub struct FieldAccessor {
    pub kind: ValueKind,
    /// Collection field: every access must carry an index.
    pub indexed: bool,
    len: Box<dyn Fn(&dyn Any) -> Option<usize> + Send + Sync>,
    get: Getter,
    set: Setter,
}

impl FieldAccessor {
    pub fn get(&self, data: &dyn Any, index: Option<usize>) -> Option<Value> {
        (self.get)(data, index)
    }

    /// Returns false when the downcast, index or value shape does not match.
    pub fn set(&self, data: &mut dyn Any, index: Option<usize>, value: Value) -> bool {
        (self.set)(data, index, value)
    }

    /// Current length of a collection field; `None` for plain fields.
    pub fn len(&self, data: &dyn Any) -> Option<usize> {
        (self.len)(data)
    }
}

impl std::fmt::Debug for FieldAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldAccessor")
            .field("kind", &self.kind)
            .field("indexed", &self.indexed)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct TypeEntry {
    name: String,
    fields: HashMap<String, FieldAccessor>,
    methods: HashMap<String, Method>,
}

#[derive(Default)]
pub struct BehaviorRegistry {
    types: HashMap<TypeId, TypeEntry>,
    by_name: HashMap<String, TypeId>,
}

impl BehaviorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under `name`. Registering the same type again keeps its
    /// existing fields and renames it.
    pub fn register<T: Any>(&mut self, name: &str) -> TypeBuilder<'_, T> {
        let tid = TypeId::of::<T>();
        let entry = self.types.entry(tid).or_default();
        if !entry.name.is_empty() {
            self.by_name.remove(&entry.name);
        }
        entry.name = name.to_string();
        self.by_name.insert(name.to_string(), tid);
        TypeBuilder {
            entry,
            _marker: PhantomData,
        }
    }

    pub fn type_name(&self, tid: TypeId) -> Option<&str> {
        self.types.get(&tid).map(|e| e.name.as_str())
    }

    pub fn type_id(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    pub fn field(&self, tid: TypeId, name: &str) -> Option<&FieldAccessor> {
        self.types.get(&tid)?.fields.get(name)
    }

    pub fn has_method(&self, tid: TypeId, name: &str) -> bool {
        self.types
            .get(&tid)
            .is_some_and(|e| e.methods.contains_key(name))
    }

    /// Call a registered method. Returns false when none is registered.
    pub fn invoke(&self, tid: TypeId, name: &str, data: &mut dyn Any) -> bool {
        match self.types.get(&tid).and_then(|e| e.methods.get(name)) {
            Some(m) => {
                m(data);
                true
            }
            None => false,
        }
    }
}

pub struct TypeBuilder<'r, T> {
    entry: &'r mut TypeEntry,
    _marker: PhantomData<fn(T)>,
}

impl<'r, T: Any> TypeBuilder<'r, T> {
    /// Plain field. `name` may be dotted to reach into nested data.
    pub fn field<F: FieldValue>(
        self,
        name: &str,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> Self {
        let accessor = FieldAccessor {
            kind: F::KIND,
            indexed: false,
            len: Box::new(|_| None),
            get: Box::new(move |data, index| {
                if index.is_some() {
                    return None;
                }
                data.downcast_ref::<T>().map(|t| get(t).to_value())
            }),
            set: Box::new(move |data, index, value| {
                if index.is_some() {
                    return false;
                }
                match (data.downcast_mut::<T>(), F::from_value(value)) {
                    (Some(t), Some(v)) => {
                        *get_mut(t) = v;
                        true
                    }
                    _ => false,
                }
            }),
        };
        self.entry.fields.insert(name.to_string(), accessor);
        self
    }

    /// Indexed collection field, addressed as `name[n]`.
    pub fn list<F: FieldValue>(
        self,
        name: &str,
        get: fn(&T) -> &[F],
        get_mut: fn(&mut T) -> &mut [F],
    ) -> Self {
        let accessor = FieldAccessor {
            kind: F::KIND,
            indexed: true,
            len: Box::new(move |data| data.downcast_ref::<T>().map(|t| get(t).len())),
            get: Box::new(move |data, index| {
                let t = data.downcast_ref::<T>()?;
                get(t).get(index?).map(|v| v.to_value())
            }),
            set: Box::new(move |data, index, value| {
                let (Some(t), Some(i), Some(v)) =
                    (data.downcast_mut::<T>(), index, F::from_value(value))
                else {
                    return false;
                };
                match get_mut(t).get_mut(i) {
                    Some(slot) => {
                        *slot = v;
                        true
                    }
                    None => false,
                }
            }),
        };
        self.entry.fields.insert(name.to_string(), accessor);
        self
    }

    /// Zero-argument method reachable from animation events.
    pub fn method(self, name: &str, f: fn(&mut T)) -> Self {
        self.entry.methods.insert(
            name.to_string(),
            Box::new(move |data| {
                if let Some(t) = data.downcast_mut::<T>() {
                    f(t);
                }
            }),
        );
        self
    }
}
