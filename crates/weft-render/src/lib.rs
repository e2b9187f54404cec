pub mod assets;
pub mod draw;
pub mod env;
pub mod error;
pub mod hit;
pub mod nodes;
pub mod paint;
pub mod registry;
pub mod text;
pub mod tree;

pub use assets::{AssetCache, AssetDrain, AssetError, AssetInbox, AssetLoader, ImageAsset, NoopLoader};
pub use draw::{Brush, DrawCmd, Geometry, StrokeSpec};
pub use env::{RenderConfig, RenderEnv};
pub use error::{GeometryError, RenderError};
pub use hit::{hit_test, hit_test_rect};
pub use nodes::{Outline, Renderer, path_outline};
pub use paint::{TextPainter, paint_tree};
pub use registry::{Entry, InstanceRecord, Registry};
pub use text::{TextLine, TextRun, TextStyle, text_resolution};
pub use tree::{Container, ContainerId, HostRole, MutationStats, RenderTree, Transform};
