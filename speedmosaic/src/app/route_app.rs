use crate::{
    algorithm::routing::{RouteResult, Router, RoutingError},
    config::GraphConfig,
    model::{graph::RoadGraph, link::GeometryStore},
};
use geo::Coord;
use geojson::{Feature, Geometry, JsonObject, Value};
use serde_json::json;
use std::{path::Path, sync::Arc};

/// routing over one loaded link dataset.
#[derive(Debug)]
pub struct RouteApp {
    graph: RoadGraph,
    max_snap_distance_meters: f64,
}

impl RouteApp {
    pub fn load(link_dataset: &Path, config: &GraphConfig) -> Result<RouteApp, RoutingError> {
        let store = GeometryStore::load(link_dataset, &config.link_fields)?;
        RouteApp::from_store(Arc::new(store), config)
    }

    pub fn from_store(
        store: Arc<GeometryStore>,
        config: &GraphConfig,
    ) -> Result<RouteApp, RoutingError> {
        let graph =
            RoadGraph::build(store, config.edge_weight).map_err(RoutingError::GraphBuild)?;
        Ok(RouteApp {
            graph,
            max_snap_distance_meters: config.max_snap_distance_meters,
        })
    }

    pub fn graph(&self) -> &RoadGraph {
        &self.graph
    }

    /// routes through an ordered list of at least two points: the first is the
    /// start, the last the end and any others are via points.
    pub fn route(&self, points: &[Coord<f64>]) -> Result<RouteResult, RoutingError> {
        let (start, end, vias) = match points {
            [start, vias @ .., end] => (*start, *end, vias),
            _ => {
                return Err(RoutingError::InvalidParameters(format!(
                    "a route needs at least 2 points, found {}",
                    points.len()
                )))
            }
        };
        Router::new(&self.graph)
            .with_max_snap_distance(self.max_snap_distance_meters)
            .route(start, end, vias)
    }
}

/// parses a "x,y" (longitude, latitude) pair.
pub fn parse_point(value: &str) -> Result<Coord<f64>, String> {
    let parts = value.split(',').map(|p| p.trim()).collect::<Vec<_>>();
    match parts.as_slice() {
        [x, y] => {
            let x = x
                .parse::<f64>()
                .map_err(|e| format!("invalid longitude in '{value}': {e}"))?;
            let y = y
                .parse::<f64>()
                .map_err(|e| format!("invalid latitude in '{value}': {e}"))?;
            if !(-180.0..=180.0).contains(&x) || !(-90.0..=90.0).contains(&y) {
                return Err(format!("point '{value}' is outside WGS84 bounds"));
            }
            Ok(Coord { x, y })
        }
        _ => Err(format!("expected 'x,y', found '{value}'")),
    }
}

/// the route as a GeoJSON LineString feature carrying the link ids and costs
pub fn route_feature(result: &RouteResult) -> Feature {
    let coordinates = result
        .geometry
        .0
        .iter()
        .map(|c| vec![c.x, c.y])
        .collect::<Vec<_>>();
    let mut properties = JsonObject::new();
    properties.insert(String::from("link_ids"), json!(result.link_ids));
    properties.insert(String::from("total_cost"), json!(result.total_cost));
    properties.insert(String::from("cost_unit"), json!(result.cost_unit));
    properties.insert(String::from("length_meters"), json!(result.length_meters));
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::LineString(coordinates))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// route response document: `{ "route": <Feature>, "link_ids": [...] }`
pub fn route_response(result: &RouteResult) -> serde_json::Value {
    json!({
        "route": route_feature(result),
        "link_ids": result.link_ids,
    })
}
