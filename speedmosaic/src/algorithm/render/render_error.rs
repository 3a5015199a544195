use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("invalid render options: {0}")]
    InvalidOptions(String),
    #[error("mosaic of {columns} links by {rows} buckets cannot fit within {max_dimension} pixels")]
    TooLarge {
        columns: usize,
        rows: usize,
        max_dimension: u32,
    },
    #[error("failure encoding png: {0}")]
    Encoding(#[from] png::EncodingError),
}
