//! fixed speed band palette of the mosaic image.
//!
//! | band (km/h) | color        | rgb            |
//! |-------------|--------------|----------------|
//! | < 10        | dark red     | (128, 0, 0)    |
//! | 10 to 20    | red          | (220, 20, 20)  |
//! | 20 to 30    | orange       | (255, 140, 0)  |
//! | 30 to 40    | yellow       | (250, 215, 0)  |
//! | 40 to 50    | yellow-green | (154, 205, 50) |
//! | 50 to 60    | green        | (0, 150, 60)   |
//! | >= 60       | blue         | (30, 90, 220)  |
//! | no data     | grey         | (190, 190, 190)|
//!
//! lower band edges are inclusive.

pub type Rgb = [u8; 3];

/// fill of cells that received no probe samples. not used by any speed band.
pub const NO_DATA_COLOR: Rgb = [190, 190, 190];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedBand {
    /// inclusive lower edge in km/h
    pub min_kph: f64,
    /// exclusive upper edge in km/h
    pub max_kph: f64,
    pub color: Rgb,
    pub label: &'static str,
}

pub const SPEED_BANDS: [SpeedBand; 7] = [
    SpeedBand {
        min_kph: f64::NEG_INFINITY,
        max_kph: 10.0,
        color: [128, 0, 0],
        label: "< 10 km/h",
    },
    SpeedBand {
        min_kph: 10.0,
        max_kph: 20.0,
        color: [220, 20, 20],
        label: "10-20 km/h",
    },
    SpeedBand {
        min_kph: 20.0,
        max_kph: 30.0,
        color: [255, 140, 0],
        label: "20-30 km/h",
    },
    SpeedBand {
        min_kph: 30.0,
        max_kph: 40.0,
        color: [250, 215, 0],
        label: "30-40 km/h",
    },
    SpeedBand {
        min_kph: 40.0,
        max_kph: 50.0,
        color: [154, 205, 50],
        label: "40-50 km/h",
    },
    SpeedBand {
        min_kph: 50.0,
        max_kph: 60.0,
        color: [0, 150, 60],
        label: "50-60 km/h",
    },
    SpeedBand {
        min_kph: 60.0,
        max_kph: f64::INFINITY,
        color: [30, 90, 220],
        label: ">= 60 km/h",
    },
];

pub const NO_DATA_LABEL: &str = "no data";

/// band color of an average speed.
pub fn color_for_speed(speed_kph: f64) -> Rgb {
    SPEED_BANDS
        .iter()
        .find(|b| speed_kph < b.max_kph)
        .map(|b| b.color)
        .unwrap_or(SPEED_BANDS[SPEED_BANDS.len() - 1].color)
}
