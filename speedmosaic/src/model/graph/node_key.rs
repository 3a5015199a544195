use geo::Coord;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// size of the grid cell, in degrees, that link endpoints are rounded to. endpoints
/// that round to the same cell become one node. 1e-6 degrees is roughly 0.11 m
/// of latitude.
pub const NODE_QUANTIZATION_DEGREES: f64 = 1e-6;

/// inverse of [NODE_QUANTIZATION_DEGREES], multiplied rather than divided so that
/// integral degree values land exactly on grid cells.
const NODE_QUANTIZATION_SCALE: f64 = 1e6;

/// spatially-quantized coordinate used to merge coincident link endpoints.
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash, Deserialize, Serialize,
)]
pub struct NodeKey {
    pub x: i64,
    pub y: i64,
}

impl NodeKey {
    pub fn from_coord(coord: Coord<f64>) -> NodeKey {
        NodeKey {
            x: (coord.x * NODE_QUANTIZATION_SCALE).round() as i64,
            y: (coord.y * NODE_QUANTIZATION_SCALE).round() as i64,
        }
    }

    /// center of the grid cell
    pub fn coord(&self) -> Coord<f64> {
        Coord {
            x: self.x as f64 / NODE_QUANTIZATION_SCALE,
            y: self.y as f64 / NODE_QUANTIZATION_SCALE,
        }
    }
}

impl Display for NodeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let c = self.coord();
        write!(f, "({}, {})", c.x, c.y)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub struct NodeId(pub usize);

impl Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub struct EdgeId(pub usize);

impl Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
