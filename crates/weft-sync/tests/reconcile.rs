//! Integration tests: JSON document → engine → render tree.
//!
//! Mutation counters on the render tree make reuse observable: a pass that
//! should not touch a container must leave `MutationStats` at zero.

use pretty_assertions::assert_eq;
use std::collections::HashSet;
use weft_core::id::NodeId;
use weft_core::model::{AutoLayout, Color, NodeKind, NodeOverride, SceneNode};
use weft_core::scene::SceneState;
use weft_core::store::ThemeState;
use weft_core::text::ApproxMeasurer;
use weft_core::theme::{Variable, VariableSet};
use weft_render::{Brush, Container, DrawCmd, HostRole, NoopLoader, TextRun};
use weft_sync::{Engine, EngineConfig, Stores};

fn canvas() -> SceneState {
    SceneState::from_json(include_str!("fixtures/canvas.json")).expect("fixture parses")
}

fn id(s: &str) -> NodeId {
    NodeId::intern(s)
}

fn theme(active: &str) -> ThemeState {
    ThemeState {
        active_theme: active.into(),
        variables: VariableSet::new([Variable::new("surface")
            .with_value("light", Color::WHITE)
            .with_value("dark", Color::BLACK)]),
    }
}

fn mounted(scene: SceneState) -> (Engine, Stores) {
    let _ = env_logger::builder().is_test(true).try_init();
    let stores = Stores::default();
    stores.scene.set(scene);
    stores.theme.set(theme("light"));
    let mut engine = Engine::new(
        EngineConfig::default(),
        Box::new(NoopLoader),
        Box::new(ApproxMeasurer),
    );
    engine.mount(&stores);
    engine.tree_mut().take_stats();
    (engine, stores)
}

/// Apply `next` directly against the engine's current snapshot.
fn apply(engine: &mut Engine, next: &SceneState) {
    let prev = engine.scene().clone();
    engine.sync(next, &prev);
}

fn container<'e>(engine: &'e Engine, node: &str) -> &'e Container {
    let c = engine
        .registry()
        .container(id(node))
        .unwrap_or_else(|| panic!("`{node}` has no container"));
    engine.tree().get(c).unwrap()
}

fn descendant<'e>(engine: &'e Engine, instance: &str, logical: &str) -> Option<&'e Container> {
    let record = engine.registry().get(id(instance))?.instance.as_ref()?;
    engine.tree().get(*record.index.get(&id(logical))?)
}

fn solid_fill(c: &Container) -> Option<Color> {
    c.display.iter().find_map(|cmd| match cmd {
        DrawCmd::Fill {
            brush: Brush::Solid(color),
            ..
        } => Some(*color),
        _ => None,
    })
}

fn text_run(c: &Container) -> &TextRun {
    c.display
        .iter()
        .find_map(|cmd| match cmd {
            DrawCmd::Text(run) => Some(run),
            _ => None,
        })
        .expect("container draws text")
}

// ─── Build / teardown ───────────────────────────────────────────────────

#[test]
fn initial_build_registers_every_scene_node() {
    let scene = canvas();
    let (engine, _stores) = mounted(scene.clone());

    let registered: HashSet<NodeId> = engine.registry().ids().collect();
    let expected: HashSet<NodeId> = scene.walk().into_iter().collect();
    assert_eq!(registered, expected);

    let root = engine.tree().root();
    assert_eq!(engine.tree().children(root).len(), 2);
}

#[test]
fn syncing_the_same_snapshot_mutates_nothing() {
    let (mut engine, _stores) = mounted(canvas());
    let current = engine.scene().clone();
    engine.sync(&current, &current);
    assert_eq!(engine.tree().stats().total(), 0);

    // Equal content but a fresh snapshot diffs empty too.
    let reloaded = current.update_node(id("btn_a"), |_| {});
    apply(&mut engine, &reloaded);
    assert_eq!(engine.tree().stats().redraws, 0);
}

#[test]
fn syncing_to_an_empty_scene_leaves_nothing_behind() {
    let (mut engine, _stores) = mounted(canvas());
    apply(&mut engine, &SceneState::new());
    assert!(engine.registry().is_empty());
    assert!(engine.tree().children(engine.tree().root()).is_empty());
    assert!(engine.tree().is_empty());
}

// ─── Incremental updates ────────────────────────────────────────────────

#[test]
fn recoloring_one_leaf_redraws_only_that_leaf() {
    let (mut engine, _stores) = mounted(canvas());
    let sibling = engine.registry().container(id("btn_b"));

    let red = Color::rgba(1.0, 0.0, 0.0, 1.0);
    let next = engine.scene().update_node(id("btn_a"), |n| {
        *n = n.clone().with_fill(red);
    });
    apply(&mut engine, &next);

    let stats = engine.tree().stats();
    assert_eq!(stats.redraws, 1);
    assert_eq!(stats.created, 0);
    assert_eq!(stats.destroyed, 0);
    assert_eq!(engine.registry().container(id("btn_b")), sibling);
    assert_eq!(solid_fill(container(&engine, "btn_a")), Some(red));
}

#[test]
fn reparented_node_keeps_its_container() {
    let (mut engine, _stores) = mounted(canvas());
    let swatch = engine.registry().container(id("panel_swatch")).unwrap();

    // Move the swatch out of the panel and delete the panel in one edit.
    let next = engine
        .scene()
        .move_node(id("panel_swatch"), Some(id("page")), 0)
        .remove(id("panel"));
    apply(&mut engine, &next);

    assert_eq!(engine.registry().container(id("panel_swatch")), Some(swatch));
    assert!(!engine.registry().contains(id("panel")));
    assert!(!engine.registry().contains(id("panel_bg")));

    let page = engine.registry().container(id("page")).unwrap();
    let host = engine.tree().host(page, HostRole::Children).unwrap();
    assert_eq!(engine.tree().children(host).first(), Some(&swatch));
}

#[test]
fn reordering_children_follows_scene_order() {
    let (mut engine, _stores) = mounted(canvas());
    let next = engine.scene().move_node(id("btn_b"), Some(id("toolbar")), 0);
    apply(&mut engine, &next);

    let toolbar = engine.registry().container(id("toolbar")).unwrap();
    let host = engine.tree().host(toolbar, HostRole::Children).unwrap();
    let order: Vec<Option<NodeId>> = engine
        .tree()
        .children(host)
        .iter()
        .map(|c| engine.tree().get(*c).and_then(|c| c.label))
        .collect();
    assert_eq!(order, vec![Some(id("btn_b")), Some(id("btn_a"))]);
    // Layout follows the new order too.
    assert_eq!(container(&engine, "btn_b").transform.x, 0.0);
    assert_eq!(container(&engine, "btn_a").transform.x, 68.0);
}

#[test]
fn kind_change_swaps_the_container_in_place() {
    let (mut engine, _stores) = mounted(canvas());
    let next = engine
        .scene()
        .update_node(id("panel_swatch"), |n| n.kind = NodeKind::Rect);
    apply(&mut engine, &next);

    let panel = engine.registry().container(id("panel")).unwrap();
    let host = engine.tree().host(panel, HostRole::Children).unwrap();
    let swatch = engine.registry().container(id("panel_swatch")).unwrap();
    assert_eq!(engine.tree().children(host).last(), Some(&swatch));
}

// ─── Auto-layout ────────────────────────────────────────────────────────

#[test]
fn row_gap_places_second_child_after_first() {
    let (engine, _stores) = mounted(canvas());
    assert_eq!(container(&engine, "btn_a").transform.x, 0.0);
    assert_eq!(container(&engine, "btn_b").transform.x, 48.0);
}

#[test]
fn row_gap_holds_for_any_non_negative_gap() {
    let (mut engine, _stores) = mounted(canvas());
    for gap in [0.0_f32, 3.5, 12.0, 40.0] {
        let next = engine.scene().update_node(id("toolbar"), |n| {
            if let NodeKind::Frame(frame) = &mut n.kind {
                frame.auto_layout = Some(AutoLayout::row(gap));
            }
        });
        apply(&mut engine, &next);
        let a = container(&engine, "btn_a");
        let b = container(&engine, "btn_b");
        assert_eq!(b.transform.x, a.transform.x + 40.0 + gap as f64, "gap {gap}");
    }
}

#[test]
fn resizing_a_child_shifts_its_siblings_without_redrawing_them() {
    let (mut engine, _stores) = mounted(canvas());
    let next = engine.scene().update_node(id("btn_a"), |n| n.width = 50.0);
    apply(&mut engine, &next);

    assert_eq!(container(&engine, "btn_b").transform.x, 58.0);
    assert_eq!(engine.tree().stats().redraws, 1);
}

/// A row frame whose children carry stored positions the layout ignores,
/// next to a free frame.
fn row_and_free() -> SceneState {
    let row = id("p_row");
    SceneState::new()
        .push(
            None,
            SceneNode::frame("p_row", 300.0, 100.0).with_auto_layout(AutoLayout::row(8.0)),
        )
        .push(Some(row), SceneNode::rect("p_a", 40.0, 20.0).at(200.0, 50.0))
        .push(Some(row), SceneNode::rect("p_b", 60.0, 20.0).at(150.0, 70.0))
        .push(None, SceneNode::frame("p_free", 300.0, 200.0).at(0.0, 200.0))
}

fn placement(engine: &Engine, node: &str) -> (f64, f64, (f64, f64)) {
    let c = container(engine, node);
    (c.transform.x, c.transform.y, c.size)
}

#[test]
fn leaving_auto_layout_by_reparenting_restores_stored_position() {
    let (mut engine, _stores) = mounted(row_and_free());
    assert_eq!(container(&engine, "p_b").transform.x, 48.0);

    let next = engine.scene().move_node(id("p_b"), Some(id("p_free")), 0);
    apply(&mut engine, &next);

    assert_eq!(placement(&engine, "p_b"), (150.0, 70.0, (60.0, 20.0)));
    let (fresh, _fresh_stores) = mounted(next);
    assert_eq!(placement(&engine, "p_b"), placement(&fresh, "p_b"));
    assert_eq!(placement(&engine, "p_a"), placement(&fresh, "p_a"));
}

#[test]
fn clearing_auto_layout_restores_stored_positions() {
    let (mut engine, _stores) = mounted(row_and_free());

    let next = engine.scene().update_node(id("p_row"), |n| {
        if let NodeKind::Frame(frame) = &mut n.kind {
            frame.auto_layout = None;
        }
    });
    apply(&mut engine, &next);

    assert_eq!(placement(&engine, "p_a"), (200.0, 50.0, (40.0, 20.0)));
    assert_eq!(placement(&engine, "p_b"), (150.0, 70.0, (60.0, 20.0)));
    let (fresh, _fresh_stores) = mounted(next);
    assert_eq!(placement(&engine, "p_b"), placement(&fresh, "p_b"));
}

// ─── Structural edge cases ──────────────────────────────────────────────

#[test]
fn child_arriving_before_its_parent_is_attached_later() {
    // The child's parent id names a frame this snapshot does not have yet.
    let early = SceneState::new()
        .push(None, SceneNode::frame("anchor", 50.0, 50.0))
        .push(Some(id("late_parent")), SceneNode::rect("late_child", 10.0, 10.0).at(4.0, 4.0));
    let (mut engine, _stores) = mounted(early);
    assert!(!engine.registry().contains(id("late_child")));
    assert_eq!(engine.tree().walk(engine.tree().root()).len(), 3);

    let complete = engine
        .scene()
        .insert(None, 0, SceneNode::frame("late_parent", 80.0, 80.0));
    apply(&mut engine, &complete);

    let parent = engine.registry().container(id("late_parent")).unwrap();
    let host = engine.tree().host(parent, HostRole::Children).unwrap();
    let child = engine.registry().container(id("late_child")).unwrap();
    assert_eq!(engine.tree().children(host), &[child]);
    assert_eq!(container(&engine, "late_child").transform.x, 4.0);

    // A later pass neither duplicates nor moves it.
    engine.tree_mut().take_stats();
    let nudged = engine.scene().update_node(id("anchor"), |n| n.x = 10.0);
    apply(&mut engine, &nudged);
    assert_eq!(engine.registry().container(id("late_child")), Some(child));
    assert_eq!(engine.tree().stats().created, 0);
}

#[test]
fn removing_an_already_destroyed_subtree_is_a_no_op() {
    let (mut engine, _stores) = mounted(canvas());
    let before = engine.scene().clone();
    let without = before.remove(id("toolbar"));

    // Parent and children leave together: the children are gone with the
    // parent's container before their own removal runs.
    engine.sync(&without, &before);
    for gone in ["toolbar", "btn_a", "btn_b"] {
        assert!(!engine.registry().contains(id(gone)));
    }
    let remaining = engine.registry().len();
    let containers = engine.tree().len();

    // Replaying the same removal against the stale snapshot.
    engine.tree_mut().take_stats();
    engine.sync(&without, &before);
    assert_eq!(engine.tree().stats().destroyed, 0);
    assert_eq!(engine.tree().stats().created, 0);
    assert_eq!(engine.registry().len(), remaining);
    assert_eq!(engine.tree().len(), containers);
}

// ─── Themes ─────────────────────────────────────────────────────────────

#[test]
fn frame_theme_override_scopes_descendant_colors() {
    let (engine, _stores) = mounted(canvas());
    assert_eq!(solid_fill(container(&engine, "page")), Some(Color::WHITE));
    assert_eq!(solid_fill(container(&engine, "panel_bg")), Some(Color::BLACK));
}

#[test]
fn theme_override_change_rebuilds_everything() {
    let (mut engine, _stores) = mounted(canvas());
    let before = engine.registry().container(id("page")).unwrap();
    let count = engine.registry().len();

    let next = engine.scene().update_node(id("panel"), |n| {
        *n = n.clone().themed("light");
    });
    apply(&mut engine, &next);

    let stats = engine.tree().stats();
    assert_eq!(engine.registry().len(), count);
    assert_eq!(stats.created, stats.destroyed);
    assert_eq!(stats.created, engine.tree().len() - 1);
    assert_ne!(engine.registry().container(id("page")), Some(before));
    assert_eq!(solid_fill(container(&engine, "panel_bg")), Some(Color::WHITE));
}

// ─── Instances ──────────────────────────────────────────────────────────

#[test]
fn instance_override_wins_and_reverts() {
    let (mut engine, _stores) = mounted(canvas());
    let title = |engine: &Engine, instance: &str| {
        let c = descendant(engine, instance, "card_title").expect("title rendered");
        text_run(c).lines[0].text.clone()
    };
    assert_eq!(title(&engine, "card_1"), "Title");
    assert_eq!(title(&engine, "card_2"), "Override");

    let next = engine.scene().update_node(id("card_2"), |n| {
        if let NodeKind::InstanceRef(props) = &mut n.kind {
            props.descendants.clear();
        }
    });
    apply(&mut engine, &next);
    assert_eq!(title(&engine, "card_2"), "Title");
}

#[test]
fn instance_descendants_get_namespaced_render_ids() {
    let (engine, _stores) = mounted(canvas());
    let a = descendant(&engine, "card_1", "card_title").unwrap();
    let b = descendant(&engine, "card_2", "card_title").unwrap();
    assert_eq!(a.render_id.as_str(), "card_1:0/card_title");
    assert_eq!(b.render_id.as_str(), "card_2:0/card_title");
    assert_eq!(a.label, Some(id("card_title")));
    assert_eq!(b.label, Some(id("card_title")));
}

#[test]
fn instance_text_keeps_component_font_size_across_moves() {
    let (mut engine, _stores) = mounted(canvas());
    let size = |engine: &Engine| {
        text_run(descendant(engine, "card_1", "card_title").unwrap())
            .style
            .size
    };
    assert_eq!(size(&engine), 16.0);

    let next = engine.scene().update_node(id("card_1"), |n| n.x = 340.0);
    apply(&mut engine, &next);
    assert_eq!(size(&engine), 16.0);
    assert_eq!(engine.tree().stats().redraws, 0);
    assert_eq!(container(&engine, "card_1").transform.x, 340.0);
}

#[test]
fn editing_a_component_re_expands_its_instances() {
    let (mut engine, _stores) = mounted(canvas());
    let next = engine.scene().update_node(id("card_title"), |n| {
        *n = n.clone().with_text(|t| t.content = "Heading".into());
    });
    apply(&mut engine, &next);

    let text = |instance: &str| {
        text_run(descendant(&engine, instance, "card_title").unwrap()).lines[0]
            .text
            .clone()
    };
    assert_eq!(text("card_1"), "Heading");
    assert_eq!(text("card_2"), "Override");
}

#[test]
fn hidden_override_suppresses_the_descendant_container() {
    let (mut engine, _stores) = mounted(canvas());
    let next = engine.scene().update_node(id("card_1"), |n| {
        if let NodeKind::InstanceRef(props) = &mut n.kind {
            props.descendants.insert(
                id("card_title"),
                NodeOverride {
                    visible: Some(false),
                    ..Default::default()
                },
            );
        }
    });
    apply(&mut engine, &next);
    assert!(descendant(&engine, "card_1", "card_title").is_none());
    assert!(descendant(&engine, "card_2", "card_title").is_some());
}

#[test]
fn missing_component_renders_placeholder_until_defined() {
    let (mut engine, _stores) = mounted(canvas());
    let next = engine
        .scene()
        .push(Some(id("page")), SceneNode::instance("ghost_ref", "ghost").at(600.0, 400.0));
    apply(&mut engine, &next);
    let placeholder = |engine: &Engine| {
        engine
            .registry()
            .get(id("ghost_ref"))
            .and_then(|e| e.instance.as_ref())
            .map(|r| r.placeholder)
    };
    assert_eq!(placeholder(&engine), Some(true));
    assert_eq!(container(&engine, "ghost_ref").size, (100.0, 100.0));

    let defined = engine.scene().push(
        None,
        SceneNode::frame("ghost", 50.0, 30.0)
            .reusable()
            .with_fill(Color::BLACK),
    );
    apply(&mut engine, &defined);
    assert_eq!(placeholder(&engine), Some(false));
    assert_eq!(container(&engine, "ghost_ref").size, (50.0, 30.0));
}
