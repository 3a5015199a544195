use crate::model::link::Link;
use serde::{Deserialize, Serialize};

/// cost assigned to traversing a link in the road graph.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum EdgeWeight {
    /// link length in meters
    #[default]
    Distance,
    /// free-flow travel time in seconds, using the link's speed attribute when
    /// present and `default_speed_kph` otherwise
    TravelTime { default_speed_kph: f64 },
}

impl EdgeWeight {
    pub fn validate(&self) -> Result<(), String> {
        match self {
            EdgeWeight::Distance => Ok(()),
            EdgeWeight::TravelTime { default_speed_kph } => {
                if default_speed_kph.is_finite() && *default_speed_kph > 0.0 {
                    Ok(())
                } else {
                    Err(format!(
                        "travel time weight requires a positive default speed, found {default_speed_kph}"
                    ))
                }
            }
        }
    }

    pub fn cost(&self, link: &Link) -> f64 {
        match self {
            EdgeWeight::Distance => link.length_meters,
            EdgeWeight::TravelTime { default_speed_kph } => {
                let kph = link.speed_kph.unwrap_or(*default_speed_kph);
                link.length_meters / (kph / 3.6)
            }
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            EdgeWeight::Distance => "meters",
            EdgeWeight::TravelTime { .. } => "seconds",
        }
    }
}
