pub mod geo_utils;
pub mod test_utils;
