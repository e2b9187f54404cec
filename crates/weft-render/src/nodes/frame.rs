use super::{Outline, Renderer};
use crate::tree::{ContainerId, HostRole};
use weft_core::id::NodeId;
use weft_core::model::{FrameProps, SceneNode};
use weft_core::theme::ThemeScope;

impl Renderer<'_, '_> {
    /// Frame background plus the clip mask on its children host.
    pub(super) fn draw_frame(
        &mut self,
        container: ContainerId,
        node: &SceneNode,
        props: &FrameProps,
        size: (f32, f32),
        scope: &ThemeScope,
        waiter: NodeId,
    ) {
        let outline = Outline::boxed(size.0, size.1, node.corner_radius);
        let cmds = self.decorate(node, &outline, size, scope, waiter);
        self.tree.redraw(container, cmds);
        if let Some(host) = self.tree.host(container, HostRole::Children) {
            self.tree
                .set_mask(host, props.clip.then(|| outline.geometry.clone()));
        }
    }
}
