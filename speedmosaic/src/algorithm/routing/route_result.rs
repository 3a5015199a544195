use crate::model::{graph::NodeId, link::LinkId};
use geo::LineString;
use serde::Serialize;

/// a computed route. geometry is empty when every route point snapped to the same node.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct RouteResult {
    /// traversed links in order, deduplicated where consecutive segments meet
    pub link_ids: Vec<LinkId>,
    pub geometry: LineString<f64>,
    /// sum of edge weights, see `cost_unit`
    pub total_cost: f64,
    pub cost_unit: String,
    pub length_meters: f64,
    /// the node each route point snapped to, in input order
    pub snapped_nodes: Vec<NodeId>,
    pub snap_distances_meters: Vec<f64>,
}

impl RouteResult {
    pub fn is_empty(&self) -> bool {
        self.link_ids.is_empty()
    }
}
