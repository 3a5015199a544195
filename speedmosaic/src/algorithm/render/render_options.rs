use super::RenderError;
use serde::{Deserialize, Serialize};

/// layout settings of the mosaic image.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct RenderOptions {
    /// preferred cell width, shrunk when the image would exceed `max_dimension`
    pub cell_width: u32,
    /// preferred cell height, shrunk when the image would exceed `max_dimension`
    pub cell_height: u32,
    /// largest permitted image width or height
    pub max_dimension: u32,
    pub margin: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            cell_width: 16,
            cell_height: 8,
            max_dimension: 4096,
            margin: 8,
        }
    }
}

impl RenderOptions {
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.cell_width == 0 || self.cell_height == 0 {
            return Err(RenderError::InvalidOptions(String::from(
                "cell width and height must be positive",
            )));
        }
        if self.max_dimension <= 2 * self.margin {
            return Err(RenderError::InvalidOptions(format!(
                "max dimension {} leaves no room inside margin {}",
                self.max_dimension, self.margin
            )));
        }
        Ok(())
    }
}
