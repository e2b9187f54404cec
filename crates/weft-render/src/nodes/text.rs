use super::Renderer;
use crate::draw::DrawCmd;
use crate::text::TextRun;
use crate::tree::ContainerId;
use weft_core::id::NodeId;
use weft_core::model::{Color, SceneNode, TextProps, WidthMode};
use weft_core::theme::{ThemeScope, resolve_paint};

impl Renderer<'_, '_> {
    /// Text draws in the fallback family until its own font has loaded.
    pub(super) fn draw_text(
        &mut self,
        container: ContainerId,
        node: &SceneNode,
        props: &TextProps,
        size: (f32, f32),
        scope: &ThemeScope,
        waiter: NodeId,
    ) {
        let env = self.env;
        let family = if self.assets.font_ready(&props.font.family, waiter, self.loader) {
            props.font.family.as_str()
        } else {
            env.config.fallback_font_family.as_str()
        };
        let wrap = (props.width_mode == WidthMode::Fixed).then_some(size.0);
        let metrics = env.text.measure(props, wrap);
        let color = node
            .fill
            .as_ref()
            .and_then(|p| resolve_paint(p, &env.theme.variables, scope))
            .unwrap_or(Color::BLACK);
        let run = TextRun::layout(props, &metrics, size.0, color, family, wrap);
        self.tree.redraw(container, vec![DrawCmd::Text(run)]);
        self.tree.set_text_resolution(container, env.text_resolution);
    }
}
