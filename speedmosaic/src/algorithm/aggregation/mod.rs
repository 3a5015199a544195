mod aggregate;
mod aggregation_error;
pub mod running_mean;

pub use aggregate::aggregate;
pub use aggregation_error::AggregationError;
