pub mod dijkstra;
mod route_result;
mod router;
mod routing_error;

pub use route_result::RouteResult;
pub use router::{Router, DEFAULT_MAX_SNAP_DISTANCE_METERS};
pub use routing_error::RoutingError;
