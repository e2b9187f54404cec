//! Frame scheduling.
//!
//! Store callbacks never touch the render tree. They only record the latest
//! value in an `Inbox` shared with the engine and raise `frame_requested`;
//! the host's per-frame callback (`Engine::tick`) drains it. Several scene
//! changes between two frames therefore collapse into one pass against the
//! newest snapshot.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};
use weft_core::scene::SceneState;
use weft_core::store::{SelectionState, ThemeState};

/// Latest store values not yet applied.
#[derive(Debug, Default)]
pub struct Inbox {
    pub scene: Option<SceneState>,
    pub selection: Option<SelectionState>,
    pub theme: Option<ThemeState>,
    pub scale: Option<f32>,
    pub frame_requested: bool,
}

impl Inbox {
    pub fn shared() -> SharedInbox {
        Rc::new(RefCell::new(Inbox::default()))
    }

    pub fn has_pending(&self) -> bool {
        self.scene.is_some() || self.selection.is_some() || self.theme.is_some() || self.scale.is_some()
    }

    /// Move everything out, leaving the inbox empty.
    pub fn take(&mut self) -> Inbox {
        std::mem::take(self)
    }
}

pub type SharedInbox = Rc<RefCell<Inbox>>;

/// Trailing-edge debounce: fires once `window` has passed since the last
/// `schedule`.
#[derive(Debug, Clone)]
pub struct Debounce {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    /// (Re)start the window at `now`.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// True exactly once, on the first call at or after the deadline.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
