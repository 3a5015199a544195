pub mod algorithm;
pub mod app;
pub mod config;
pub mod model;
pub mod util;
