use super::{LinkDirection, LinkId};
use crate::util::geo_utils;
use geo::{Coord, LineString};
use serde::{Deserialize, Serialize};

/// an atomic road segment with a stable identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub geometry: LineString<f64>,
    pub direction: LinkDirection,
    /// great-circle length of the geometry
    pub length_meters: f64,
    /// optional posted or typical speed used for travel time weights
    pub speed_kph: Option<f64>,
}

impl Link {
    /// builds a link, rejecting degenerate geometries: fewer than two distinct
    /// coordinates, non-finite coordinates, or a zero length.
    pub fn new(
        id: LinkId,
        geometry: LineString<f64>,
        direction: LinkDirection,
        speed_kph: Option<f64>,
    ) -> Result<Link, String> {
        if id.0.trim().is_empty() {
            return Err(String::from("link id is empty"));
        }
        let mut coords = geometry.into_inner();
        if coords.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
            return Err(format!("link '{id}' has non-finite coordinates"));
        }
        geo_utils::dedup_coords(&mut coords);
        if coords.len() < 2 {
            return Err(format!(
                "link '{id}' has fewer than two distinct coordinates"
            ));
        }
        let geometry = LineString::new(coords);
        let length_meters = geo_utils::linestring_meters(&geometry);
        if !(length_meters > 0.0) {
            return Err(format!("link '{id}' has zero length"));
        }
        let speed_kph = match speed_kph {
            Some(s) if s.is_finite() && s > 0.0 => Some(s),
            Some(s) => {
                log::debug!("link '{id}' ignoring invalid speed attribute {s}");
                None
            }
            None => None,
        };
        Ok(Link {
            id,
            geometry,
            direction,
            length_meters,
            speed_kph,
        })
    }

    /// first coordinate of the polyline
    pub fn start(&self) -> Coord<f64> {
        self.geometry.0[0]
    }

    /// last coordinate of the polyline
    pub fn end(&self) -> Coord<f64> {
        self.geometry.0[self.geometry.0.len() - 1]
    }
}
