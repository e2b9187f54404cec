pub mod id;
pub mod instance;
pub mod layout;
pub mod model;
pub mod scene;
pub mod store;
pub mod text;
pub mod theme;

pub use id::NodeId;
pub use instance::{InstanceLimits, InstanceResolver, ResolvedInstance, ResolvedNode, resolve_instance};
pub use layout::{LayoutContext, LayoutError, LayoutResult, compute_layout, layout_roots};
pub use model::*;
pub use scene::{SceneDocument, SceneState};
pub use store::{
    EditMode, InstanceEditContext, SelectionState, Store, Subscription, TextEditing, ThemeState,
    ViewportState,
};
pub use text::{ApproxMeasurer, TextMeasurer, TextMetrics, TextMetricsCache};
pub use theme::{ThemeScope, Variable, VariableSet, resolve_color, resolve_paint};
