//! Per-type node renderers.
//!
//! `Renderer` borrows the tree, registry and asset cache for one pass and
//! turns scene nodes into containers. Each node kind draws its display list
//! in its own module; this one owns the shared lifecycle: create, update in
//! place, replace on kind change, destroy, and the common transform/alpha/
//! visibility properties.

mod frame;
mod instance;
mod path;
mod shape;
mod text;

pub use path::path_outline;
pub use shape::Outline;

use crate::assets::{AssetCache, AssetLoader};
use crate::env::RenderEnv;
use crate::error::RenderError;
use crate::registry::{Entry, Registry};
use crate::tree::{ContainerId, HostRole, RenderTree, Transform};
use std::mem::discriminant;
use std::rc::Rc;
use weft_core::id::NodeId;
use weft_core::model::{NodeKind, SceneNode};
use weft_core::theme::ThemeScope;

pub struct Renderer<'r, 'a> {
    pub tree: &'r mut RenderTree,
    pub registry: &'r mut Registry,
    pub assets: &'r mut AssetCache,
    pub loader: &'r dyn AssetLoader,
    pub env: &'r RenderEnv<'a>,
    pub errors: &'r mut Vec<RenderError>,
}

/// Two versions of a node that differ only in placement and visibility.
fn same_visuals(a: &SceneNode, b: &SceneNode) -> bool {
    let mut placed = a.clone();
    placed.x = b.x;
    placed.y = b.y;
    placed.rotation = b.rotation;
    placed.opacity = b.opacity;
    placed.visible = b.visible;
    placed.enabled = b.enabled;
    placed.flip_x = b.flip_x;
    placed.flip_y = b.flip_y;
    placed == *b
}

impl<'r, 'a> Renderer<'r, 'a> {
    /// Build `id` and its scene subtree; returns the existing container if
    /// it is already registered. The caller attaches the result.
    pub fn build(&mut self, id: NodeId) -> Option<ContainerId> {
        let scope = self.env.scope_for(id);
        self.build_scoped(id, &scope)
    }

    fn build_scoped(&mut self, id: NodeId, scope: &ThemeScope) -> Option<ContainerId> {
        if let Some(container) = self.registry.container(id) {
            return Some(container);
        }
        let env = self.env;
        let node = Rc::clone(env.scene.node_rc(id)?);
        let container = self.create(&node, scope);
        if let Some(host) = self.tree.host(container, HostRole::Children) {
            let inner = scope.enter(node.theme_override());
            for &child in env.scene.children(id) {
                if let Some(c) = self.build_scoped(child, &inner) {
                    self.tree.attach(host, c, None);
                }
            }
        }
        Some(container)
    }

    fn create(&mut self, node: &Rc<SceneNode>, scope: &ThemeScope) -> ContainerId {
        let env = self.env;
        let id = node.id;
        let container = self.tree.create(id, Some(id));
        let (size, instance) = match &node.kind {
            NodeKind::InstanceRef(_) => {
                let (size, record) = self.draw_instance(container, node, scope);
                (size, Some(record))
            }
            _ => {
                if node.has_children_host() {
                    self.tree.create_host(container, HostRole::Children);
                }
                let size = env.effective_size(node);
                self.draw_kind(container, node, size, scope, id);
                (size, None)
            }
        };
        self.apply_common(container, node, size, env.position(node), env.node_visible(node));
        log::trace!("created {} `{id}`", node.kind.name());
        self.registry.insert(
            id,
            Entry {
                container,
                node: Rc::clone(node),
                drawn_size: size,
                instance,
            },
        );
        container
    }

    /// Apply a new version of a registered node. Redraws only when something
    /// other than placement changed (or the effective size moved).
    pub fn update(&mut self, id: NodeId, next: &Rc<SceneNode>) {
        self.apply(id, next, false);
    }

    /// Redraw a registered node unconditionally (an asset landed or a
    /// component it expands changed).
    pub fn refresh(&mut self, id: NodeId) {
        if let Some(node) = self.env.scene.node_rc(id).cloned() {
            self.apply(id, &node, true);
        }
    }

    /// Re-read position and size after a layout pass.
    pub fn apply_layout(&mut self, id: NodeId) {
        if let Some(node) = self.env.scene.node_rc(id).cloned() {
            self.apply(id, &node, false);
        }
    }

    fn apply(&mut self, id: NodeId, next: &Rc<SceneNode>, force: bool) {
        let Some(entry) = self.registry.get(id) else {
            return;
        };
        let (container, prev, drawn) = (entry.container, Rc::clone(&entry.node), entry.drawn_size);
        if discriminant(&prev.kind) != discriminant(&next.kind) {
            log::debug!("`{id}` changed kind, replacing its container");
            self.replace(id);
            return;
        }
        let env = self.env;
        let scope = env.scope_for(id);
        let changed = force || (!Rc::ptr_eq(&prev, next) && !same_visuals(&prev, next));
        let mut record = None;
        let size = match &next.kind {
            NodeKind::InstanceRef(_) if changed => {
                let (size, r) = self.draw_instance(container, next, &scope);
                record = Some(r);
                size
            }
            NodeKind::InstanceRef(_) => drawn,
            _ => {
                let size = env.effective_size(next);
                if changed || size != drawn {
                    self.draw_kind(container, next, size, &scope, id);
                }
                size
            }
        };
        self.apply_common(container, next, size, env.position(next), env.node_visible(next));
        if let Some(entry) = self.registry.get_mut(id) {
            entry.node = Rc::clone(next);
            entry.drawn_size = size;
            if record.is_some() {
                entry.instance = record;
            }
        }
    }

    /// Destroy and rebuild `id` in its parent's child list. Registered
    /// children are carried over to the new container.
    fn replace(&mut self, id: NodeId) {
        let env = self.env;
        let parent = env.scene.parent(id);
        self.rescue_survivors(id);
        self.destroy(id);
        if let (Some(container), Some(host)) = (self.build(id), self.host_for(parent)) {
            self.tree.attach(host, container, None);
        }
        // The new kind may have no child host for them.
        for &child in env.scene.children(id) {
            if self
                .registry
                .container(child)
                .is_some_and(|c| self.tree.parent(c).is_none())
            {
                self.destroy(child);
            }
        }
        self.reconcile_children(parent);
    }

    /// Destroy a node's container and everything under it, dropping the
    /// registry entries and asset waiters of every scene node inside.
    pub fn destroy(&mut self, id: NodeId) {
        let Some(entry) = self.registry.remove(id) else {
            return;
        };
        for render_id in self.tree.destroy(entry.container) {
            self.registry.remove(render_id);
            self.assets.forget(render_id);
        }
        self.assets.forget(id);
    }

    /// Detach registered descendants of `id` that still exist in the scene,
    /// so destroying `id` does not take them along. Only the topmost
    /// survivors move; their own subtrees come with them.
    pub fn rescue_survivors(&mut self, id: NodeId) {
        if let Some(container) = self.registry.container(id) {
            self.rescue_under(container);
        }
    }

    fn rescue_under(&mut self, container: ContainerId) {
        for child in self.tree.children(container).to_vec() {
            let survivor = self.tree.get(child).is_some_and(|c| {
                c.label.is_some()
                    && self.registry.container(c.render_id) == Some(child)
                    && self.env.scene.contains(c.render_id)
            });
            if survivor {
                self.tree.detach(child);
            } else {
                self.rescue_under(child);
            }
        }
    }

    /// Container that holds the scene children of `parent` (the tree root
    /// for top-level nodes).
    pub fn host_for(&self, parent: Option<NodeId>) -> Option<ContainerId> {
        match parent {
            None => Some(self.tree.root()),
            Some(p) => self
                .registry
                .container(p)
                .and_then(|c| self.tree.host(c, HostRole::Children)),
        }
    }

    /// Make the host's children match the scene order of `parent`'s
    /// children. Containers no longer listed are detached; unregistered
    /// ones (leftovers of an interrupted pass) are destroyed.
    pub fn reconcile_children(&mut self, parent: Option<NodeId>) {
        let Some(host) = self.host_for(parent) else {
            return;
        };
        let env = self.env;
        let ids: &[NodeId] = match parent {
            Some(p) => env.scene.children(p),
            None => env.scene.root_ids.as_slice(),
        };
        let ordered: Vec<ContainerId> = ids
            .iter()
            .filter_map(|c| self.registry.container(*c))
            .collect();
        for stray in self.tree.set_children(host, &ordered) {
            let live = self
                .tree
                .get(stray)
                .is_some_and(|c| self.registry.container(c.render_id) == Some(stray));
            if !live {
                log::debug!("destroying unregistered container {stray:?}");
                for render_id in self.tree.destroy(stray) {
                    self.assets.forget(render_id);
                }
            }
        }
    }

    /// Re-evaluate visibility of every registered node and every instance
    /// descendant against the current selection.
    pub fn apply_visibility(&mut self) {
        let env = self.env;
        let entries: Vec<(NodeId, ContainerId)> = self
            .registry
            .iter()
            .map(|(id, e)| (id, e.container))
            .collect();
        for (id, container) in entries {
            if let Some(node) = env.scene.node(id) {
                self.tree.set_visible(container, env.node_visible(node));
            }
        }
        let descendants: Vec<(NodeId, NodeId, ContainerId)> = self
            .registry
            .iter()
            .filter_map(|(id, e)| e.instance.as_ref().map(|r| (id, r)))
            .flat_map(|(id, r)| r.index.iter().map(move |(l, c)| (id, *l, *c)))
            .collect();
        for (instance, logical, container) in descendants {
            self.tree
                .set_visible(container, !env.descendant_hidden(instance, logical));
        }
    }

    /// Set the rasterization resolution on every text container.
    pub fn apply_text_resolution(&mut self) {
        let resolution = self.env.text_resolution;
        for container in self.tree.walk(self.tree.root()) {
            if self.tree.get(container).is_some_and(|c| c.has_text()) {
                self.tree.set_text_resolution(container, resolution);
            }
        }
    }

    /// Drop every container and registry entry.
    pub fn clear(&mut self) {
        for render_id in self.tree.clear() {
            self.assets.forget(render_id);
        }
        self.registry.clear();
    }

    fn apply_common(
        &mut self,
        container: ContainerId,
        node: &SceneNode,
        size: (f32, f32),
        position: (f32, f32),
        visible: bool,
    ) {
        let (x, y) = (position.0 as f64, position.1 as f64);
        let (w, h) = (size.0 as f64, size.1 as f64);
        let transform = Transform {
            x,
            y,
            rotation: (node.rotation as f64).to_radians(),
            scale_x: if node.flip_x { -1.0 } else { 1.0 },
            scale_y: if node.flip_y { -1.0 } else { 1.0 },
            pivot_x: if node.flip_x { w } else { 0.0 },
            pivot_y: if node.flip_y { h } else { 0.0 },
        };
        self.tree.set_transform(container, transform);
        self.tree.set_alpha(container, node.opacity.clamp(0.0, 1.0));
        self.tree.set_visible(container, visible);
        self.tree.set_size(container, w, h);
    }

    /// Draw the display list of a non-instance node. `waiter` is the scene
    /// node refreshed when an asset this draw needs arrives.
    fn draw_kind(
        &mut self,
        container: ContainerId,
        node: &SceneNode,
        size: (f32, f32),
        scope: &ThemeScope,
        waiter: NodeId,
    ) {
        match &node.kind {
            NodeKind::Frame(props) => self.draw_frame(container, node, props, size, scope, waiter),
            NodeKind::Text(props) => self.draw_text(container, node, props, size, scope, waiter),
            NodeKind::Path(props) => self.draw_path(container, node, props, size, scope, waiter),
            NodeKind::Group | NodeKind::InstanceRef(_) => {}
            _ => self.draw_shape(container, node, size, scope, waiter),
        }
    }
}
