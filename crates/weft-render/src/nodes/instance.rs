//! Instance nodes: an expanded component copy under an instance-children
//! host. Descendant containers carry qualified render ids and are labeled
//! with their logical ids; they are tracked in the instance's record, not
//! the registry.

use super::{Outline, Renderer};
use crate::draw::{Brush, DrawCmd, Geometry, StrokeSpec};
use crate::registry::InstanceRecord;
use crate::tree::{ContainerId, HostRole};
use std::collections::HashMap;
use weft_core::id::NodeId;
use weft_core::instance::{InstanceResolver, ResolvedInstance, ResolvedNode};
use weft_core::model::{FillRule, SceneNode};
use weft_core::theme::ThemeScope;

impl Renderer<'_, '_> {
    /// Resolve and draw the instance into `container`, replacing any
    /// previous expansion. Returns the resolved size and the record.
    pub(super) fn draw_instance(
        &mut self,
        container: ContainerId,
        node: &SceneNode,
        scope: &ThemeScope,
    ) -> ((f32, f32), InstanceRecord) {
        let env = self.env;
        let resolved =
            InstanceResolver::new(env.scene, env.text, env.config.instance_limits()).resolve(node);
        if resolved.placeholder {
            log::debug!(
                "instance `{}` of `{}` renders as a placeholder",
                node.id,
                resolved.component_id
            );
        }
        let host = match self.tree.host(container, HostRole::InstanceChildren) {
            Some(host) => host,
            None => self.tree.create_host(container, HostRole::InstanceChildren),
        };
        for old in self.tree.children(host).to_vec() {
            self.tree.destroy(old);
        }
        let mut index = HashMap::new();
        self.draw_expansion(container, host, &resolved, scope, node.id, &mut index);
        (
            (resolved.width, resolved.height),
            InstanceRecord {
                dependencies: resolved.dependencies,
                index,
                placeholder: resolved.placeholder,
            },
        )
    }

    fn draw_expansion(
        &mut self,
        container: ContainerId,
        host: ContainerId,
        resolved: &ResolvedInstance,
        scope: &ThemeScope,
        instance_id: NodeId,
        index: &mut HashMap<NodeId, ContainerId>,
    ) {
        let (w, h) = (resolved.width, resolved.height);
        if resolved.placeholder {
            let config = self.env.config;
            let geometry = Geometry::rect(w, h, 0.0);
            self.tree.redraw(
                container,
                vec![
                    DrawCmd::Fill {
                        geometry: geometry.clone(),
                        brush: Brush::Solid(config.placeholder_fill),
                        rule: FillRule::NonZero,
                    },
                    DrawCmd::Stroke {
                        geometry,
                        brush: Brush::Solid(config.placeholder_stroke),
                        stroke: StrokeSpec::new(1.0),
                    },
                ],
            );
            self.tree.set_mask(host, None);
            return;
        }

        let frame = &resolved.frame;
        let outline = Outline::boxed(w, h, frame.corner_radius);
        let cmds = self.decorate(frame, &outline, (w, h), scope, instance_id);
        self.tree.redraw(container, cmds);
        let clip = frame.as_frame().is_some_and(|f| f.clip);
        self.tree
            .set_mask(host, clip.then(|| outline.geometry.clone()));

        let inner = scope.enter(frame.theme_override());
        for child in &resolved.children {
            let c = self.render_resolved(child, &inner, instance_id, index);
            self.tree.attach(host, c, None);
        }
    }

    fn render_resolved(
        &mut self,
        resolved: &ResolvedNode,
        scope: &ThemeScope,
        instance_id: NodeId,
        index: &mut HashMap<NodeId, ContainerId>,
    ) -> ContainerId {
        let container = self
            .tree
            .create(resolved.render_id, Some(resolved.logical_id));
        index.entry(resolved.logical_id).or_insert(container);
        let node = &resolved.node;
        let size = match &resolved.instance {
            Some(nested) => (nested.width, nested.height),
            None => (node.width, node.height),
        };
        match &resolved.instance {
            Some(nested) => {
                let host = self.tree.create_host(container, HostRole::InstanceChildren);
                self.draw_expansion(container, host, nested, scope, instance_id, index);
            }
            None => {
                let host = node
                    .has_children_host()
                    .then(|| self.tree.create_host(container, HostRole::Children));
                self.draw_kind(container, node, size, scope, instance_id);
                if let Some(host) = host {
                    let inner = scope.enter(node.theme_override());
                    for child in &resolved.children {
                        let c = self.render_resolved(child, &inner, instance_id, index);
                        self.tree.attach(host, c, None);
                    }
                }
            }
        }
        let visible = !self.env.descendant_hidden(instance_id, resolved.logical_id);
        self.apply_common(container, node, size, (node.x, node.y), visible);
        container
    }
}

#[cfg(test)]
mod tests {
    use crate::draw::DrawCmd;
    use crate::tree::{HostRole, RenderTree};
    use crate::{AssetCache, NoopLoader, Registry, RenderConfig, RenderEnv, Renderer};
    use std::collections::HashMap;
    use weft_core::id::NodeId;
    use weft_core::layout::LayoutContext;
    use weft_core::model::{Color, NodeOverride, SceneNode};
    use weft_core::scene::SceneState;
    use weft_core::store::{SelectionState, ThemeState};
    use weft_core::text::TextMetricsCache;

    fn scene() -> SceneState {
        let card = NodeId::intern("r_card");
        SceneState::new()
            .push(
                None,
                SceneNode::frame("r_card", 120.0, 40.0)
                    .reusable()
                    .with_fill(Color::WHITE),
            )
            .push(
                Some(card),
                SceneNode::text("r_title", "Title").with_fill(Color::BLACK),
            )
            .push(
                None,
                SceneNode::instance("r_inst", "r_card").with_instance(|i| {
                    i.descendants.insert(
                        NodeId::intern("r_title"),
                        NodeOverride {
                            content: Some("Override".into()),
                            ..Default::default()
                        },
                    );
                }),
            )
            .push(None, SceneNode::instance("r_missing", "nowhere"))
    }

    fn render(scene: &SceneState, selection: &SelectionState) -> (RenderTree, Registry) {
        let mut tree = RenderTree::new();
        let mut registry = Registry::new();
        let mut assets = AssetCache::new();
        let mut errors = Vec::new();
        let text = TextMetricsCache::default();
        let layout = LayoutContext::new(scene, &text);
        let theme = ThemeState::default();
        let boxes = HashMap::new();
        let config = RenderConfig::default();
        let env = RenderEnv {
            scene,
            theme: &theme,
            selection,
            text: &text,
            layout: &layout,
            boxes: &boxes,
            config: &config,
            text_resolution: 1.0,
        };
        let mut renderer = Renderer {
            tree: &mut tree,
            registry: &mut registry,
            assets: &mut assets,
            loader: &NoopLoader,
            env: &env,
            errors: &mut errors,
        };
        for id in ["r_inst", "r_missing"] {
            renderer.build(NodeId::intern(id));
        }
        (tree, registry)
    }

    #[test]
    fn descendants_are_indexed_by_logical_id() {
        let (tree, registry) = render(&scene(), &SelectionState::default());
        let record = registry
            .get(NodeId::intern("r_inst"))
            .and_then(|e| e.instance.as_ref())
            .unwrap();
        assert!(record.dependencies.contains(&NodeId::intern("r_card")));
        let title = tree.get(record.index[&NodeId::intern("r_title")]).unwrap();
        assert_eq!(title.render_id.as_str(), "r_inst:0/r_title");
        let Some(DrawCmd::Text(run)) = title.display.first() else {
            panic!("expected a text run");
        };
        assert_eq!(run.lines[0].text, "Override");
        // descendants are not registry entries
        assert!(!registry.contains(NodeId::intern("r_inst:0/r_title")));
    }

    #[test]
    fn unresolvable_component_draws_placeholder() {
        let (tree, registry) = render(&scene(), &SelectionState::default());
        let entry = registry.get(NodeId::intern("r_missing")).unwrap();
        assert!(entry.instance.as_ref().is_some_and(|r| r.placeholder));
        assert_eq!(entry.drawn_size, (100.0, 100.0));
        let container = tree.get(entry.container).unwrap();
        assert_eq!(container.display.len(), 2);
        let host = tree.host(entry.container, HostRole::InstanceChildren).unwrap();
        assert!(tree.children(host).is_empty());
    }
}
