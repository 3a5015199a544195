use super::NodeId;
use serde::{Deserialize, Serialize};

/// a directed traversal of one link. a bidirectional link yields two edges that
/// share a link index and differ in `reversed`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub src: NodeId,
    pub dst: NodeId,
    /// index of the link in the [crate::model::link::GeometryStore]
    pub link_index: usize,
    /// true when the edge runs against the link's coordinate order
    pub reversed: bool,
    pub weight: f64,
}
