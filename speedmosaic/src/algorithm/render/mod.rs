pub mod color_scale;
mod mosaic_metadata;
mod mosaic_renderer;
pub mod raster;
mod render_error;
mod render_options;

pub use mosaic_metadata::MosaicMetadata;
pub use mosaic_renderer::{encode_png, MosaicRenderer};
pub use render_error::RenderError;
pub use render_options::RenderOptions;
