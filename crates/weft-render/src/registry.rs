//! Scene node id → render container.

use crate::tree::ContainerId;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use weft_core::id::NodeId;
use weft_core::model::SceneNode;

/// Bookkeeping for an expanded instance.
#[derive(Debug, Clone, Default)]
pub struct InstanceRecord {
    /// Components whose subtrees this expansion read.
    pub dependencies: HashSet<NodeId>,
    /// Logical descendant id → its container.
    pub index: HashMap<NodeId, ContainerId>,
    pub placeholder: bool,
}

#[derive(Debug, Clone)]
pub struct Entry {
    pub container: ContainerId,
    /// The node as last applied to the container.
    pub node: Rc<SceneNode>,
    /// Effective size the display list was drawn at.
    pub drawn_size: (f32, f32),
    pub instance: Option<InstanceRecord>,
}

#[derive(Debug, Default)]
pub struct Registry {
    entries: HashMap<NodeId, Entry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: NodeId) -> Option<&Entry> {
        self.entries.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Entry> {
        self.entries.get_mut(&id)
    }

    pub fn container(&self, id: NodeId) -> Option<ContainerId> {
        self.entries.get(&id).map(|e| e.container)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn insert(&mut self, id: NodeId, entry: Entry) {
        self.entries.insert(id, entry);
    }

    pub fn remove(&mut self, id: NodeId) -> Option<Entry> {
        self.entries.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Entry)> + '_ {
        self.entries.iter().map(|(id, e)| (*id, e))
    }

    /// Instances whose expansion read any of `components`.
    pub fn instances_depending_on(&self, components: &HashSet<NodeId>) -> Vec<NodeId> {
        let mut out: Vec<NodeId> = self
            .entries
            .iter()
            .filter(|(_, e)| {
                e.instance
                    .as_ref()
                    .is_some_and(|r| !r.dependencies.is_disjoint(components))
            })
            .map(|(id, _)| *id)
            .collect();
        out.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        out
    }
}
