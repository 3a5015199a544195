mod date_range;
mod mosaic_cell;
mod speed_mosaic;

pub use date_range::DateRange;
pub use mosaic_cell::{CellKey, MosaicCell};
pub use speed_mosaic::{Mosaic, MosaicCsvRow};
