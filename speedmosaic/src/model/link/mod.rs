mod geometry_store;
mod link_direction;
mod link_id;
mod link_source;
mod road_link;

pub use geometry_store::{GeometryStore, LinkSegment};
pub use link_direction::LinkDirection;
pub use link_id::LinkId;
pub use link_source::{LinkFieldNames, LinkLoadSummary, LinkSource};
pub use road_link::Link;
