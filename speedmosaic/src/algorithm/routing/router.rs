use super::{dijkstra, RouteResult, RoutingError};
use crate::{
    model::graph::{NodeId, RoadGraph},
    util::geo_utils,
};
use geo::{Coord, LineString};

/// default limit on the distance between a route point and its snapped node.
pub const DEFAULT_MAX_SNAP_DISTANCE_METERS: f64 = 500.0;

/// shortest-path router over an immutable [RoadGraph].
#[derive(Debug, Clone, Copy)]
pub struct Router<'a> {
    graph: &'a RoadGraph,
    max_snap_distance_meters: f64,
}

impl<'a> Router<'a> {
    pub fn new(graph: &'a RoadGraph) -> Router<'a> {
        Router {
            graph,
            max_snap_distance_meters: DEFAULT_MAX_SNAP_DISTANCE_METERS,
        }
    }

    pub fn with_max_snap_distance(self, meters: f64) -> Router<'a> {
        Router {
            max_snap_distance_meters: meters,
            ..self
        }
    }

    pub fn graph(&self) -> &RoadGraph {
        self.graph
    }

    /// snaps a coordinate to its nearest node. `index` identifies the point in errors.
    pub fn snap(&self, coord: Coord<f64>, index: usize) -> Result<(NodeId, f64), RoutingError> {
        let unroutable = |reason: String| RoutingError::PointUnroutable {
            index,
            x: coord.x,
            y: coord.y,
            reason,
        };
        if !coord.x.is_finite() || !coord.y.is_finite() {
            return Err(unroutable(String::from("coordinate is not finite")));
        }
        let (node, distance) = self
            .graph
            .nearest_node(coord)
            .ok_or_else(|| unroutable(String::from("road graph is empty")))?;
        if distance > self.max_snap_distance_meters {
            return Err(unroutable(format!(
                "nearest node is {distance:.1}m away, limit is {}m",
                self.max_snap_distance_meters
            )));
        }
        Ok((node, distance))
    }

    /// routes from `start` to `end` through each of `vias` in order.
    pub fn route(
        &self,
        start: Coord<f64>,
        end: Coord<f64>,
        vias: &[Coord<f64>],
    ) -> Result<RouteResult, RoutingError> {
        let points: Vec<Coord<f64>> = std::iter::once(start)
            .chain(vias.iter().copied())
            .chain(std::iter::once(end))
            .collect();
        let mut snapped_nodes = Vec::with_capacity(points.len());
        let mut snap_distances_meters = Vec::with_capacity(points.len());
        for (index, coord) in points.iter().enumerate() {
            let (node, distance) = self.snap(*coord, index)?;
            snapped_nodes.push(node);
            snap_distances_meters.push(distance);
        }

        let mut link_ids = vec![];
        let mut coords: Vec<Coord<f64>> = vec![];
        let mut total_cost = 0.0;
        let mut length_meters = 0.0;
        for (from_index, pair) in snapped_nodes.windows(2).enumerate() {
            let path = dijkstra::shortest_path(self.graph, pair[0], pair[1]).ok_or(
                RoutingError::NoPathFound {
                    from_index,
                    to_index: from_index + 1,
                },
            )?;
            total_cost += path.cost;
            for edge in path.edges.iter().filter_map(|e| self.graph.edge(*e)) {
                let link = self.graph.link(edge);
                if link_ids.last() != Some(&link.id) {
                    link_ids.push(link.id.clone());
                }
                length_meters += link.length_meters;
                coords.extend(self.graph.edge_geometry(edge));
            }
        }
        geo_utils::dedup_coords(&mut coords);

        log::debug!(
            "routed {} points over {} links, cost {total_cost:.1} {}",
            points.len(),
            link_ids.len(),
            self.graph.weight().unit()
        );
        Ok(RouteResult {
            link_ids,
            geometry: LineString::new(coords),
            total_cost,
            cost_unit: self.graph.weight().unit().to_string(),
            length_meters,
            snapped_nodes,
            snap_distances_meters,
        })
    }
}
