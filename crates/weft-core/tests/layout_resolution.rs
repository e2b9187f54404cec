//! Integration tests: JSON document → snapshot → auto-layout → verify boxes.

use pretty_assertions::assert_eq;
use weft_core::id::NodeId;
use weft_core::layout::{LayoutContext, layout_roots};
use weft_core::scene::SceneState;
use weft_core::text::TextMetricsCache;

fn dashboard() -> SceneState {
    SceneState::from_json(include_str!("fixtures/dashboard.json")).expect("fixture parses")
}

fn id(s: &str) -> NodeId {
    NodeId::intern(s)
}

// ─── Row layout ─────────────────────────────────────────────────────────

#[test]
fn toolbar_row_places_children_after_padding_and_gap() {
    let scene = dashboard();
    let text = TextMetricsCache::default();
    let cx = LayoutContext::new(&scene, &text);
    let result = cx.run(id("toolbar")).unwrap();

    let back = result.boxes[&id("tb_back")];
    let title = result.boxes[&id("tb_title")];
    assert_eq!((back.x, back.y), (4.0, 4.0));
    assert_eq!(title.x, 52.0);
    // 24px line box centered in 40px of content height
    assert!((title.y - 12.0).abs() < 1e-3);
}

#[test]
fn fill_child_pushes_last_child_to_trailing_edge() {
    let scene = dashboard();
    let text = TextMetricsCache::default();
    let cx = LayoutContext::new(&scene, &text);
    let result = cx.run(id("toolbar")).unwrap();

    let avatar = result.boxes[&id("tb_avatar")];
    assert!((avatar.x - 364.0).abs() < 1e-3, "avatar at {}", avatar.x);
    assert_eq!(avatar.y, 8.0);
    assert!(result.boxes[&id("tb_spacer")].width > 200.0);
}

// ─── Column layout ──────────────────────────────────────────────────────

#[test]
fn sidebar_column_stacks_and_hugs_vertically() {
    let scene = dashboard();
    let text = TextMetricsCache::default();
    let cx = LayoutContext::new(&scene, &text);
    let children = cx.layout_children(id("sidebar")).unwrap();

    let ys: Vec<f32> = children.iter().map(|c| c.y).collect();
    assert_eq!(ys, vec![0.0, 34.0, 68.0]);
    assert_eq!(cx.effective_size(id("sidebar")), (200.0, 98.0));
}

#[test]
fn disabled_child_is_not_laid_out() {
    let scene = dashboard();
    let text = TextMetricsCache::default();
    let cx = LayoutContext::new(&scene, &text);
    let result = cx.run(id("sidebar")).unwrap();
    assert!(!result.boxes.contains_key(&id("nav_hidden")));
}

// ─── Instances inside layout ─────────────────────────────────────────────

#[test]
fn instance_children_use_resolved_size() {
    let scene = dashboard();
    let text = TextMetricsCache::default();
    let cx = LayoutContext::new(&scene, &text);
    let children = cx.layout_children(id("list")).unwrap();

    assert_eq!(children.len(), 2);
    assert_eq!((children[0].width, children[0].height), (300.0, 40.0));
    assert_eq!(children[1].y, 40.0);
    assert_eq!(cx.effective_size(id("list")), (300.0, 80.0));
}

// ─── Dirty roots ─────────────────────────────────────────────────────────

#[test]
fn layout_roots_cover_changed_children_only() {
    let scene = dashboard();
    assert_eq!(layout_roots(&scene, [id("nav_item_2")]), vec![id("sidebar")]);
    assert_eq!(
        layout_roots(&scene, [id("tb_title"), id("nav_item_1")]),
        vec![id("sidebar"), id("toolbar")]
    );
    assert!(layout_roots(&scene, [id("row_a")]).contains(&id("list")));
}
