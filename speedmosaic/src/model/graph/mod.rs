mod edge_weight;
mod graph_edge;
mod node_key;
mod road_graph;

pub use edge_weight::EdgeWeight;
pub use graph_edge::GraphEdge;
pub use node_key::{EdgeId, NodeId, NodeKey, NODE_QUANTIZATION_DEGREES};
pub use road_graph::{NodeLocation, RoadGraph};
