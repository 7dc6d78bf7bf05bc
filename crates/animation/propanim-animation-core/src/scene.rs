//! Scene graph the animation core drives.
//!
//! Nodes and behaviors live in generational slot maps, so a handle to a destroyed
//! node or behavior never aliases a later insertion. Every structural edit bumps
//! `structure_version`, which drivers compare to decide whether their bindings
//! are stale.

use std::any::{Any, TypeId};

use slotmap::{new_key_type, SlotMap};
use thiserror::Error;

use crate::registry::BehaviorRegistry;

new_key_type! {
    pub struct NodeId;
    pub struct BehaviorId;
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    #[error("node {0:?} does not exist")]
    MissingNode(NodeId),
    #[error("behavior {0:?} does not exist")]
    MissingBehavior(BehaviorId),
    #[error("cannot parent {child:?} under its own descendant {parent:?}")]
    Cycle { child: NodeId, parent: NodeId },
}

/// Local TRS of a node. Rotation is a unit quaternion (x, y, z, w).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LocalTransform {
    pub position: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0; 3],
        }
    }
}

#[derive(Debug)]
pub struct Node {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    behaviors: Vec<BehaviorId>,
    pub transform: LocalTransform,
}

impl Node {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

struct BehaviorSlot {
    owner: NodeId,
    type_id: TypeId,
    data: Box<dyn Any>,
}

pub struct Scene {
    nodes: SlotMap<NodeId, Node>,
    behaviors: SlotMap<BehaviorId, BehaviorSlot>,
    registry: BehaviorRegistry,
    structure_version: u64,
}

impl Scene {
    pub fn new(registry: BehaviorRegistry) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            behaviors: SlotMap::with_key(),
            registry,
            structure_version: 0,
        }
    }

    pub fn registry(&self) -> &BehaviorRegistry {
        &self.registry
    }

    /// Monotonic counter bumped by every hierarchy or attachment change.
    #[inline]
    pub fn structure_version(&self) -> u64 {
        self.structure_version
    }

    fn touch(&mut self) {
        self.structure_version = self.structure_version.wrapping_add(1);
    }

    pub fn spawn(
        &mut self,
        name: impl Into<String>,
        parent: Option<NodeId>,
    ) -> Result<NodeId, SceneError> {
        if let Some(p) = parent {
            if !self.nodes.contains_key(p) {
                return Err(SceneError::MissingNode(p));
            }
        }
        let id = self.nodes.insert(Node {
            name: name.into(),
            parent,
            children: Vec::new(),
            behaviors: Vec::new(),
            transform: LocalTransform::default(),
        });
        if let Some(p) = parent.and_then(|p| self.nodes.get_mut(p)) {
            p.children.push(id);
        }
        self.touch();
        Ok(id)
    }

    /// Destroy a node, its whole subtree, and every behavior attached to them.
    pub fn despawn(&mut self, node: NodeId) -> Result<(), SceneError> {
        let parent = self
            .nodes
            .get(node)
            .ok_or(SceneError::MissingNode(node))?
            .parent;
        if let Some(p) = parent.and_then(|p| self.nodes.get_mut(p)) {
            p.children.retain(|c| *c != node);
        }

        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(removed) = self.nodes.remove(id) {
                for b in removed.behaviors {
                    self.behaviors.remove(b);
                }
                stack.extend(removed.children);
            }
        }
        self.touch();
        Ok(())
    }

    fn is_ancestor(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.nodes.get(node).and_then(|n| n.parent) {
                Some(p) => node = p,
                None => return false,
            }
        }
    }

    pub fn reparent(&mut self, node: NodeId, parent: Option<NodeId>) -> Result<(), SceneError> {
        let old_parent = self
            .nodes
            .get(node)
            .ok_or(SceneError::MissingNode(node))?
            .parent;
        if let Some(p) = parent {
            if !self.nodes.contains_key(p) {
                return Err(SceneError::MissingNode(p));
            }
            if self.is_ancestor(node, p) {
                return Err(SceneError::Cycle {
                    child: node,
                    parent: p,
                });
            }
        }

        if let Some(op) = old_parent.and_then(|p| self.nodes.get_mut(p)) {
            op.children.retain(|c| *c != node);
        }
        if let Some(np) = parent.and_then(|p| self.nodes.get_mut(p)) {
            np.children.push(node);
        }
        if let Some(n) = self.nodes.get_mut(node) {
            n.parent = parent;
        }
        self.touch();
        Ok(())
    }

    #[inline]
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(node)
    }

    pub fn node(&self, node: NodeId) -> Option<&Node> {
        self.nodes.get(node)
    }

    pub fn name(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node).map(|n| n.name.as_str())
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// First direct child of `node` called `name`.
    pub fn find_child(&self, node: NodeId, name: &str) -> Option<NodeId> {
        self.children(node)
            .iter()
            .copied()
            .find(|c| self.nodes.get(*c).is_some_and(|n| n.name == name))
    }

    pub fn transform(&self, node: NodeId) -> Option<&LocalTransform> {
        self.nodes.get(node).map(|n| &n.transform)
    }

    pub fn transform_mut(&mut self, node: NodeId) -> Option<&mut LocalTransform> {
        self.nodes.get_mut(node).map(|n| &mut n.transform)
    }

    /// Attach a behavior instance to `node`. Order of attachment is the order
    /// in which behaviors are scanned by path resolution and event dispatch.
    pub fn attach<T: Any>(&mut self, node: NodeId, behavior: T) -> Result<BehaviorId, SceneError> {
        if !self.nodes.contains_key(node) {
            return Err(SceneError::MissingNode(node));
        }
        let id = self.behaviors.insert(BehaviorSlot {
            owner: node,
            type_id: TypeId::of::<T>(),
            data: Box::new(behavior),
        });
        if let Some(n) = self.nodes.get_mut(node) {
            n.behaviors.push(id);
        }
        self.touch();
        Ok(id)
    }

    pub fn detach(&mut self, behavior: BehaviorId) -> Result<(), SceneError> {
        let slot = self
            .behaviors
            .remove(behavior)
            .ok_or(SceneError::MissingBehavior(behavior))?;
        if let Some(n) = self.nodes.get_mut(slot.owner) {
            n.behaviors.retain(|b| *b != behavior);
        }
        self.touch();
        Ok(())
    }

    pub fn behaviors(&self, node: NodeId) -> &[BehaviorId] {
        self.nodes
            .get(node)
            .map(|n| n.behaviors.as_slice())
            .unwrap_or(&[])
    }

    pub fn behavior_type(&self, behavior: BehaviorId) -> Option<TypeId> {
        self.behaviors.get(behavior).map(|s| s.type_id)
    }

    pub fn behavior<T: Any>(&self, behavior: BehaviorId) -> Option<&T> {
        self.behaviors.get(behavior)?.data.downcast_ref::<T>()
    }

    pub fn behavior_mut<T: Any>(&mut self, behavior: BehaviorId) -> Option<&mut T> {
        self.behaviors.get_mut(behavior)?.data.downcast_mut::<T>()
    }

    /// First behavior on `node` whose registered type name is `type_name`.
    pub fn find_behavior(&self, node: NodeId, type_name: &str) -> Option<BehaviorId> {
        self.behaviors(node).iter().copied().find(|b| {
            self.behavior_type(*b)
                .and_then(|t| self.registry.type_name(t))
                .is_some_and(|n| n == type_name)
        })
    }

    pub(crate) fn behavior_any(&self, behavior: BehaviorId) -> Option<(TypeId, &dyn Any)> {
        self.behaviors
            .get(behavior)
            .map(|s| (s.type_id, s.data.as_ref()))
    }

    /// Split borrow: registry shared, behavior data exclusive.
    pub(crate) fn with_behavior_mut<R>(
        &mut self,
        behavior: BehaviorId,
        f: impl FnOnce(&BehaviorRegistry, TypeId, &mut dyn Any) -> R,
    ) -> Option<R> {
        let slot = self.behaviors.get_mut(behavior)?;
        Some(f(&self.registry, slot.type_id, slot.data.as_mut()))
    }
}
