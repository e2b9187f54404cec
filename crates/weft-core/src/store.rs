//! Observable single-threaded stores.
//!
//! The document, selection, theme and viewport state live outside the
//! reconciliation engine. Each is exposed through a `Store<T>`: read the
//! current value, replace it, and subscribe to replacements. Subscriptions
//! are RAII handles: dropping one (or calling `cancel`) unsubscribes.

use crate::id::NodeId;
use crate::theme::VariableSet;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Listener<T> = Rc<dyn Fn(&T)>;

struct StoreInner<T> {
    value: T,
    next_id: u64,
    listeners: Vec<(u64, Listener<T>)>,
}

/// An observable value.
pub struct Store<T> {
    inner: Rc<RefCell<StoreInner<T>>>,
}

impl<T: Clone + 'static> Store<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(StoreInner {
                value,
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }

    /// Current value (cheap for `Rc`-backed snapshots).
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Replace the value and notify every subscriber.
    pub fn set(&self, value: T) {
        self.inner.borrow_mut().value = value.clone();
        // Clone the listener list so callbacks may subscribe/unsubscribe.
        let listeners: Vec<Listener<T>> = self
            .inner
            .borrow()
            .listeners
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        for listener in listeners {
            listener(&value);
        }
    }

    /// Replace the value through `f`.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = f(&self.inner.borrow().value);
        self.set(next);
    }

    pub fn subscribe(&self, listener: impl Fn(&T) + 'static) -> Subscription {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.listeners.push((id, Rc::new(listener)));
            id
        };
        let weak: Weak<RefCell<StoreInner<T>>> = Rc::downgrade(&self.inner);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.borrow_mut().listeners.retain(|(lid, _)| *lid != id);
                }
            })),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

/// Handle returned by `Store::subscribe`; unsubscribes when dropped.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

// ─── Store payloads ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    #[default]
    Text,
    Path,
}

/// The node currently being edited inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextEditing {
    pub node_id: NodeId,
    pub mode: EditMode,
}

/// An instance descendant selected for editing, by its unqualified id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceEditContext {
    pub instance_id: NodeId,
    pub descendant_id: NodeId,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    pub selected: Vec<NodeId>,
    pub text_editing: Option<TextEditing>,
    pub instance_context: Option<InstanceEditContext>,
}

impl SelectionState {
    /// The scene node hidden while its inline editor is open.
    pub fn editing_node(&self) -> Option<NodeId> {
        self.text_editing
            .filter(|e| e.mode == EditMode::Text)
            .map(|e| e.node_id)
    }

    /// The instance descendant hidden while its inline editor is open:
    /// text editing targets the instance itself and a descendant context is set.
    pub fn editing_descendant(&self) -> Option<InstanceEditContext> {
        let editing = self.editing_node()?;
        self.instance_context
            .filter(|ctx| ctx.instance_id == editing)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThemeState {
    pub active_theme: String,
    pub variables: VariableSet,
}

impl Default for ThemeState {
    fn default() -> Self {
        Self {
            active_theme: "light".into(),
            variables: VariableSet::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    pub scale: f32,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}
