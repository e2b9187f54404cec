use crate::assets::AssetError;
use thiserror::Error;
use weft_core::id::NodeId;
use weft_core::layout::LayoutError;

/// Malformed node geometry.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("invalid path data: {0}")]
    Svg(#[from] kurbo::SvgParseError),
    #[error("path data has no extent")]
    Empty,
}

/// Everything a render pass recovers from locally. Reported, never fatal.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("node {node}: {source}")]
    Geometry {
        node: NodeId,
        #[source]
        source: GeometryError,
    },
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
}
