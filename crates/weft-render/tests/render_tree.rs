//! Integration tests: JSON document → node renderers → render tree →
//! hit testing and painting.

use kurbo::{Affine, Point};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use weft_core::id::NodeId;
use weft_core::layout::LayoutContext;
use weft_core::model::FillRule;
use weft_core::scene::SceneState;
use weft_core::store::{SelectionState, ThemeState};
use weft_core::text::TextMetricsCache;
use weft_render::{
    AssetCache, Container, DrawCmd, Geometry, NoopLoader, RenderConfig, RenderEnv, RenderError,
    RenderTree, Registry, Renderer, hit_test, paint_tree,
};

fn id(s: &str) -> NodeId {
    NodeId::intern(s)
}

struct Built {
    tree: RenderTree,
    registry: Registry,
    assets: AssetCache,
    errors: Vec<RenderError>,
}

impl Built {
    fn container(&self, node: &str) -> &Container {
        let c = self.registry.container(id(node)).expect("registered");
        self.tree.get(c).expect("alive")
    }

    fn first_fill(&self, node: &str) -> (&Geometry, FillRule) {
        self.container(node)
            .display
            .iter()
            .find_map(|cmd| match cmd {
                DrawCmd::Fill { geometry, rule, .. } => Some((geometry, *rule)),
                _ => None,
            })
            .expect("node is filled")
    }
}

fn build_board() -> Built {
    let scene = SceneState::from_json(include_str!("fixtures/board.json")).expect("fixture parses");
    let text = TextMetricsCache::default();
    let layout = LayoutContext::new(&scene, &text);
    let theme = ThemeState::default();
    let selection = SelectionState::default();
    let boxes = HashMap::new();
    let config = RenderConfig::default();
    let env = RenderEnv {
        scene: &scene,
        theme: &theme,
        selection: &selection,
        text: &text,
        layout: &layout,
        boxes: &boxes,
        config: &config,
        text_resolution: 1.0,
    };

    let mut built = Built {
        tree: RenderTree::new(),
        registry: Registry::new(),
        assets: AssetCache::new(),
        errors: Vec::new(),
    };
    let mut renderer = Renderer {
        tree: &mut built.tree,
        registry: &mut built.registry,
        assets: &mut built.assets,
        loader: &NoopLoader,
        env: &env,
        errors: &mut built.errors,
    };
    for &root in scene.root_ids.iter() {
        if let Some(c) = renderer.build(root) {
            let top = renderer.tree.root();
            renderer.tree.attach(top, c, None);
        }
    }
    built
}

#[test]
fn malformed_path_falls_back_to_its_bounds() {
    let built = build_board();
    assert_eq!(built.errors.len(), 1);
    assert!(matches!(
        &built.errors[0],
        RenderError::Geometry { node, .. } if *node == id("scribble")
    ));
    let (geometry, _) = built.first_fill("scribble");
    assert_eq!(*geometry, Geometry::rect(30.0, 30.0, 0.0));
}

#[test]
fn compound_path_fills_even_odd() {
    let built = build_board();
    let (geometry, rule) = built.first_fill("donut");
    assert_eq!(rule, FillRule::EvenOdd);
    let bounds = geometry.bounds();
    assert!((bounds.width() - 40.0).abs() < 1e-6);
    assert!((bounds.height() - 40.0).abs() < 1e-6);
}

#[test]
fn hits_report_logical_ids_and_respect_clips() {
    let built = build_board();
    let tree = &built.tree;

    assert_eq!(hit_test(tree, Point::new(211.0, 111.0)), Some(id("badge_label")));
    assert_eq!(hit_test(tree, Point::new(275.0, 125.0)), Some(id("badge_1")));
    assert_eq!(hit_test(tree, Point::new(390.0, 290.0)), Some(id("overflow")));
    assert_eq!(hit_test(tree, Point::new(10.0, 200.0)), Some(id("board")));
    // Outside the board's clip the overflowing rect is not hit.
    assert_eq!(hit_test(tree, Point::new(430.0, 320.0)), None);
}

#[test]
fn painting_walks_the_whole_tree() {
    let built = build_board();
    let mut scene = vello::Scene::new();
    paint_tree(&mut scene, &built.tree, &built.assets, None, Affine::IDENTITY);
    assert!(!scene.encoding().is_empty());
}
