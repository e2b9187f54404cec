//! Reconciliation engine.
//!
//! The engine keeps a retained `RenderTree` equal to a from-scratch render
//! of the last applied `SceneState`. Every pass is a diff against that last
//! applied snapshot:
//!
//! - **Layout** runs first for the topmost auto-layout frames the diff
//!   touched, so new and updated containers read fresh boxes.
//! - **Additions** build bottom-up and attach under the parent's child host;
//!   a node whose host does not exist yet is deferred to a later pass.
//! - **Removals** destroy subtrees after rescuing descendants that moved
//!   elsewhere in the scene.
//! - **Updates** redraw only when something visual changed.
//! - **Structure**: each changed child list is reordered in its host.
//! - **Instances** that read a touched component are re-expanded.
//!
//! A frame theme-override change, or a new active theme / variable set,
//! discards the incremental path for a full rebuild.

use crate::config::EngineConfig;
use crate::diff::SceneDiff;
use crate::schedule::{Debounce, Inbox, SharedInbox};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::time::Instant;
use weft_core::id::NodeId;
use weft_core::layout::{LayoutContext, layout_roots};
use weft_core::model::ResolvedBounds;
use weft_core::scene::SceneState;
use weft_core::store::{SelectionState, Store, Subscription, ThemeState, ViewportState};
use weft_core::text::{TextMeasurer, TextMetricsCache};
use weft_render::{
    AssetCache, AssetLoader, RenderConfig, RenderEnv, RenderError, RenderTree, Registry, Renderer,
    text_resolution,
};

/// The external stores an engine follows once mounted.
#[derive(Clone)]
pub struct Stores {
    pub scene: Store<SceneState>,
    pub selection: Store<SelectionState>,
    pub theme: Store<ThemeState>,
    pub viewport: Store<ViewportState>,
}

impl Default for Stores {
    fn default() -> Self {
        Self {
            scene: Store::new(SceneState::new()),
            selection: Store::new(SelectionState::default()),
            theme: Store::new(ThemeState::default()),
            viewport: Store::new(ViewportState::default()),
        }
    }
}

type ErrorHook = Box<dyn FnMut(&RenderError)>;

pub struct Engine {
    config: EngineConfig,
    render_config: RenderConfig,
    loader: Box<dyn AssetLoader>,
    text: TextMetricsCache,
    tree: RenderTree,
    registry: Registry,
    assets: AssetCache,
    /// Auto-layout boxes of the applied scene.
    boxes: HashMap<NodeId, ResolvedBounds>,
    /// Last applied values.
    scene: SceneState,
    selection: SelectionState,
    theme: ThemeState,
    scale: f32,
    text_resolution: f32,
    zoom: Debounce,
    inbox: SharedInbox,
    subscriptions: Vec<Subscription>,
    /// Added ids whose parent host did not exist yet.
    deferred: Vec<NodeId>,
    error_hook: Option<ErrorHook>,
    torn_down: bool,
}

impl Engine {
    pub fn new(config: EngineConfig, loader: Box<dyn AssetLoader>, measurer: Box<dyn TextMeasurer>) -> Self {
        let render_config = config.render_config();
        let text = TextMetricsCache::with_capacity(measurer, config.text_cache_capacity);
        let zoom = Debounce::new(config.zoom_settle());
        let resolution = text_resolution(1.0, config.device_pixel_ratio, config.max_text_resolution);
        Self {
            config,
            render_config,
            loader,
            text,
            tree: RenderTree::new(),
            registry: Registry::new(),
            assets: AssetCache::new(),
            boxes: HashMap::new(),
            scene: SceneState::new(),
            selection: SelectionState::default(),
            theme: ThemeState::default(),
            scale: 1.0,
            text_resolution: resolution,
            zoom,
            inbox: Inbox::shared(),
            subscriptions: Vec::new(),
            deferred: Vec::new(),
            error_hook: None,
            torn_down: false,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tree(&self) -> &RenderTree {
        &self.tree
    }

    /// Mutation counters live on the tree; tests reset them between passes.
    pub fn tree_mut(&mut self) -> &mut RenderTree {
        &mut self.tree
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn assets(&self) -> &AssetCache {
        &self.assets
    }

    pub fn scene(&self) -> &SceneState {
        &self.scene
    }

    pub fn text_metrics(&self) -> &TextMetricsCache {
        &self.text
    }

    pub fn text_resolution(&self) -> f32 {
        self.text_resolution
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Receive every recovered asset, geometry and layout error.
    pub fn set_error_hook(&mut self, hook: impl FnMut(&RenderError) + 'static) {
        self.error_hook = Some(Box::new(hook));
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────

    /// Subscribe to `stores`, adopt their current values and build the
    /// current scene.
    pub fn mount(&mut self, stores: &Stores) {
        if self.torn_down {
            return;
        }
        self.subscriptions.clear();
        let inbox = Rc::clone(&self.inbox);
        self.subscriptions.push(stores.scene.subscribe(move |scene: &SceneState| {
            let mut inbox = inbox.borrow_mut();
            inbox.scene = Some(scene.clone());
            inbox.frame_requested = true;
        }));
        let inbox = Rc::clone(&self.inbox);
        self.subscriptions
            .push(stores.selection.subscribe(move |selection: &SelectionState| {
                let mut inbox = inbox.borrow_mut();
                inbox.selection = Some(selection.clone());
                inbox.frame_requested = true;
            }));
        let inbox = Rc::clone(&self.inbox);
        self.subscriptions.push(stores.theme.subscribe(move |theme: &ThemeState| {
            let mut inbox = inbox.borrow_mut();
            inbox.theme = Some(theme.clone());
            inbox.frame_requested = true;
        }));
        let inbox = Rc::clone(&self.inbox);
        self.subscriptions
            .push(stores.viewport.subscribe(move |viewport: &ViewportState| {
                let mut inbox = inbox.borrow_mut();
                inbox.scale = Some(viewport.scale);
                inbox.frame_requested = true;
            }));

        self.selection = stores.selection.get();
        self.theme = stores.theme.get();
        self.scale = stores.viewport.get().scale;
        self.text_resolution = self.resolution_for(self.scale);
        for family in &self.config.preloaded_fonts {
            self.assets.request_font(family, self.loader.as_ref());
        }
        log::debug!("mounted; {} store subscriptions", self.subscriptions.len());

        let scene = stores.scene.get();
        let prev = self.scene.clone();
        self.sync(&scene, &prev);
    }

    /// Whether the host should schedule another `tick`.
    pub fn needs_frame(&self) -> bool {
        if self.torn_down {
            return false;
        }
        let inbox = self.inbox.borrow();
        inbox.frame_requested
            || inbox.has_pending()
            || self.zoom.is_pending()
            || self.assets.has_pending_events()
    }

    /// Per-frame callback: applies everything the stores and the asset
    /// loader queued since the last tick.
    pub fn tick(&mut self, now: Instant) {
        if self.torn_down {
            return;
        }
        let pending = self.inbox.borrow_mut().take();

        let selection_changed = match pending.selection {
            Some(selection) if selection != self.selection => {
                self.selection = selection;
                true
            }
            _ => false,
        };

        let rebuilt = match (pending.theme, pending.scene) {
            (Some(theme), scene) if theme != self.theme => {
                log::debug!("theme changed to `{}`, rebuilding", theme.active_theme);
                self.theme = theme;
                if let Some(scene) = scene {
                    self.scene = scene;
                }
                self.full_rebuild();
                true
            }
            (_, Some(scene)) => {
                let prev = self.scene.clone();
                self.sync(&scene, &prev);
                false
            }
            _ => false,
        };
        if selection_changed && !rebuilt {
            let scene = self.scene.clone();
            self.render(&scene, |r| r.apply_visibility());
        }

        if let Some(scale) = pending.scale
            && scale != self.scale
        {
            self.scale = scale;
            self.zoom.schedule(now);
        }
        if self.zoom.fire(now) {
            let resolution = self.resolution_for(self.scale);
            if resolution != self.text_resolution {
                log::debug!("text resolution {} -> {resolution}", self.text_resolution);
                self.text_resolution = resolution;
                let scene = self.scene.clone();
                self.render(&scene, |r| r.apply_text_resolution());
            }
        }

        self.drain_assets();
    }

    /// Unsubscribe, cancel pending work and destroy every container. Every
    /// entry point is a no-op afterwards.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.subscriptions.clear();
        self.zoom.cancel();
        self.inbox.borrow_mut().take();
        let scene = std::mem::take(&mut self.scene);
        self.render(&scene, |r| r.clear());
        self.deferred.clear();
        self.boxes.clear();
        self.text.clear();
        self.torn_down = true;
        log::debug!("engine torn down");
    }

    // ─── Reconciliation ──────────────────────────────────────────────────

    /// Bring the render tree from `prev` to `next`.
    pub fn sync(&mut self, next: &SceneState, prev: &SceneState) {
        if self.torn_down {
            return;
        }
        self.scene = next.clone();
        if next.same_as(prev) {
            return;
        }
        let diff = SceneDiff::between(prev, next);
        if diff.theme_override_changed {
            log::debug!("frame theme override changed, rebuilding");
            self.full_rebuild();
            return;
        }
        if diff.is_empty() && self.deferred.is_empty() {
            return;
        }
        log::trace!(
            "sync: +{} -{} ~{} children:{}",
            diff.added.len(),
            diff.removed.len(),
            diff.updated.len(),
            diff.children_changed.len()
        );

        let added: HashSet<NodeId> = diff.added.iter().copied().collect();
        let dependents = self.dependent_instances(&diff, next, prev, &added);

        let touched: Vec<NodeId> = diff
            .changed_ids()
            .chain(diff.removed.iter().filter_map(|id| prev.parent(*id)))
            .chain(dependents.iter().copied())
            .filter(|id| next.contains(*id))
            .collect();
        let relaid = self.relayout(next, &touched);

        let pending: Vec<NodeId> = std::mem::take(&mut self.deferred)
            .into_iter()
            .chain(diff.added.iter().copied())
            .collect();
        self.deferred = self.render(next, |r| {
            let scene = r.env.scene;
            let mut deferred = Vec::new();
            for id in pending {
                if !scene.contains(id) || r.registry.contains(id) {
                    continue;
                }
                let Some(host) = r.host_for(scene.parent(id)) else {
                    log::debug!("deferring `{id}`: parent container not built yet");
                    deferred.push(id);
                    continue;
                };
                if let Some(container) = r.build(id) {
                    r.tree.attach(host, container, None);
                }
            }
            deferred
        });

        self.render(next, |r| {
            let scene = r.env.scene;
            for &id in &diff.removed {
                r.rescue_survivors(id);
                r.destroy(id);
            }
            for &id in &diff.updated {
                if let Some(node) = scene.node_rc(id) {
                    r.update(id, node);
                }
            }
            for &parent in &diff.children_changed {
                if parent.is_none_or(|p| scene.contains(p)) {
                    r.reconcile_children(parent);
                }
            }
            for &id in &dependents {
                log::trace!("re-expanding instance `{id}`");
                r.refresh(id);
            }
            for id in relaid {
                r.apply_layout(id);
            }
            r.apply_visibility();
        });
    }

    /// Drop every container and rebuild the applied scene from its roots.
    pub fn full_rebuild(&mut self) {
        if self.torn_down {
            return;
        }
        let scene = self.scene.clone();
        self.render(&scene, |r| r.clear());
        self.deferred.clear();
        self.boxes.clear();
        self.text.clear();
        self.sync(&scene, &SceneState::new());
    }

    /// Registered instances whose expansion read a component the diff
    /// touched, in either version of the scene.
    fn dependent_instances(
        &self,
        diff: &SceneDiff,
        next: &SceneState,
        prev: &SceneState,
        added: &HashSet<NodeId>,
    ) -> Vec<NodeId> {
        let components: HashSet<NodeId> = diff
            .changed_ids()
            .flat_map(|id| {
                let mut found = next.enclosing_components(id);
                found.extend(prev.enclosing_components(id));
                found
            })
            .collect();
        if components.is_empty() {
            return Vec::new();
        }
        self.registry
            .instances_depending_on(&components)
            .into_iter()
            .filter(|id| next.contains(*id) && !added.contains(id))
            .collect()
    }

    /// Recompute the topmost dirty auto-layout frames. Returns the ids whose
    /// position or size may have moved: every laid-out node, every node that
    /// lost its layout box, the layout roots, and the ancestors of `touched`
    /// (fit-content frames grow with their children).
    fn relayout(&mut self, next: &SceneState, touched: &[NodeId]) -> Vec<NodeId> {
        let mut moved: Vec<NodeId> = Vec::new();
        // Nodes that left auto-layout fall back to their stored geometry.
        self.boxes.retain(|id, _| {
            let keep = next.is_auto_layout_child(*id);
            if !keep && next.contains(*id) {
                moved.push(*id);
            }
            keep
        });
        let roots = layout_roots(next, touched.iter().copied());
        let mut errors = Vec::new();
        {
            let layout =
                LayoutContext::new(next, &self.text).with_limits(self.render_config.instance_limits());
            for &root in &roots {
                match layout.run(root) {
                    Ok(result) => {
                        for (id, bounds) in result.boxes {
                            if id != root {
                                moved.push(id);
                                self.boxes.insert(id, bounds);
                            }
                        }
                    }
                    Err(e) => {
                        log::warn!("layout of `{root}` failed, keeping stored geometry: {e}");
                        for &child in next.children(root) {
                            if self.boxes.remove(&child).is_some() {
                                moved.push(child);
                            }
                        }
                        errors.push(RenderError::Layout(e));
                    }
                }
            }
        }
        for error in &errors {
            self.report(error);
        }
        moved.extend(roots);
        let mut seen: HashSet<NodeId> = moved.iter().copied().collect();
        for &id in touched {
            for ancestor in next.ancestors(id) {
                if seen.insert(ancestor) {
                    moved.push(ancestor);
                }
            }
        }
        moved.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        moved.dedup();
        moved
    }

    // ─── Assets ──────────────────────────────────────────────────────────

    /// Apply loader completions queued since the last drain and redraw the
    /// nodes that were waiting on them.
    fn drain_assets(&mut self) {
        let drained = self.assets.drain();
        for error in drained.errors {
            log::warn!("{error}; drawing without it");
            self.report(&RenderError::Asset(error));
        }
        if drained.refresh.is_empty() {
            return;
        }
        let mut refresh: Vec<NodeId> = drained
            .refresh
            .into_iter()
            .filter(|id| self.registry.contains(*id))
            .collect();
        refresh.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        let scene = self.scene.clone();
        self.render(&scene, |r| {
            for id in refresh {
                r.refresh(id);
            }
        });
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn resolution_for(&self, scale: f32) -> f32 {
        text_resolution(scale, self.config.device_pixel_ratio, self.config.max_text_resolution)
    }

    /// Run `f` with a renderer over `scene`, then report the errors it
    /// recovered from.
    fn render<R>(&mut self, scene: &SceneState, f: impl FnOnce(&mut Renderer<'_, '_>) -> R) -> R {
        let mut errors = Vec::new();
        let out = {
            let layout =
                LayoutContext::new(scene, &self.text).with_limits(self.render_config.instance_limits());
            let env = RenderEnv {
                scene,
                theme: &self.theme,
                selection: &self.selection,
                text: &self.text,
                layout: &layout,
                boxes: &self.boxes,
                config: &self.render_config,
                text_resolution: self.text_resolution,
            };
            let mut renderer = Renderer {
                tree: &mut self.tree,
                registry: &mut self.registry,
                assets: &mut self.assets,
                loader: self.loader.as_ref(),
                env: &env,
                errors: &mut errors,
            };
            f(&mut renderer)
        };
        for error in &errors {
            self.report(error);
        }
        out
    }

    fn report(&mut self, error: &RenderError) {
        log::debug!("recovered: {error}");
        if let Some(hook) = self.error_hook.as_mut() {
            hook(error);
        }
    }
}
