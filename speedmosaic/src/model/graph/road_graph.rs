use super::{EdgeId, EdgeWeight, GraphEdge, NodeId, NodeKey};
use crate::{
    model::link::{GeometryStore, Link},
    util::geo_utils,
};
use geo::Coord;
use itertools::Itertools;
use rstar::{primitives::GeomWithData, RTree};
use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

pub type NodeLocation = GeomWithData<[f64; 2], NodeId>;

/// directed multigraph over the links of a [GeometryStore]. nodes are quantized
/// link endpoints, edges are link traversals. immutable once built and safe to
/// share between threads.
#[derive(Debug)]
pub struct RoadGraph {
    store: Arc<GeometryStore>,
    weight: EdgeWeight,
    nodes: Vec<NodeKey>,
    edges: Vec<GraphEdge>,
    /// out-edges of each node, sorted by link id then orientation
    adjacency: Vec<Vec<EdgeId>>,
    node_rtree: RTree<NodeLocation>,
}

impl RoadGraph {
    /// builds the graph for a link dataset. node ids follow the sorted order of
    /// their keys and edges follow link order, so rebuilding the same dataset
    /// yields an identical graph.
    pub fn build(store: Arc<GeometryStore>, weight: EdgeWeight) -> Result<RoadGraph, String> {
        weight.validate()?;

        let keys: BTreeSet<NodeKey> = store
            .links()
            .iter()
            .flat_map(|l| [NodeKey::from_coord(l.start()), NodeKey::from_coord(l.end())])
            .collect();
        let nodes = keys.into_iter().collect_vec();
        let node_lookup: HashMap<NodeKey, NodeId> = nodes
            .iter()
            .enumerate()
            .map(|(idx, key)| (*key, NodeId(idx)))
            .collect();

        let mut edges: Vec<GraphEdge> = Vec::with_capacity(store.len() * 2);
        for (link_index, link) in store.links().iter().enumerate() {
            let start = node_lookup
                .get(&NodeKey::from_coord(link.start()))
                .copied()
                .ok_or_else(|| format!("internal error: link '{}' start not a node", link.id))?;
            let end = node_lookup
                .get(&NodeKey::from_coord(link.end()))
                .copied()
                .ok_or_else(|| format!("internal error: link '{}' end not a node", link.id))?;
            let cost = weight.cost(link);
            if link.direction.allows_forward() {
                edges.push(GraphEdge {
                    src: start,
                    dst: end,
                    link_index,
                    reversed: false,
                    weight: cost,
                });
            }
            if link.direction.allows_backward() {
                edges.push(GraphEdge {
                    src: end,
                    dst: start,
                    link_index,
                    reversed: true,
                    weight: cost,
                });
            }
        }

        let mut adjacency: Vec<Vec<EdgeId>> = vec![vec![]; nodes.len()];
        for (idx, edge) in edges.iter().enumerate() {
            adjacency[edge.src.0].push(EdgeId(idx));
        }
        for out_edges in adjacency.iter_mut() {
            out_edges.sort_by(|a, b| {
                let ea = &edges[a.0];
                let eb = &edges[b.0];
                let la = &store.links()[ea.link_index].id;
                let lb = &store.links()[eb.link_index].id;
                la.cmp(lb).then(ea.reversed.cmp(&eb.reversed))
            });
        }

        let node_rtree = RTree::bulk_load(
            nodes
                .iter()
                .enumerate()
                .map(|(idx, key)| {
                    let c = key.coord();
                    GeomWithData::new([c.x, c.y], NodeId(idx))
                })
                .collect_vec(),
        );

        log::info!(
            "built road graph with {} nodes and {} edges from {} links",
            nodes.len(),
            edges.len(),
            store.len()
        );

        Ok(RoadGraph {
            store,
            weight,
            nodes,
            edges,
            adjacency,
            node_rtree,
        })
    }

    pub fn store(&self) -> &GeometryStore {
        &self.store
    }

    pub fn weight(&self) -> EdgeWeight {
        self.weight
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn node_coord(&self, node: NodeId) -> Option<Coord<f64>> {
        self.nodes.get(node.0).map(|k| k.coord())
    }

    pub fn edge(&self, edge: EdgeId) -> Option<&GraphEdge> {
        self.edges.get(edge.0)
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// out-edges of a node in deterministic (link id, orientation) order.
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = (EdgeId, &GraphEdge)> + '_ {
        self.adjacency
            .get(node.0)
            .into_iter()
            .flatten()
            .map(move |e| (*e, &self.edges[e.0]))
    }

    /// the link traversed by an edge
    pub fn link(&self, edge: &GraphEdge) -> &Link {
        &self.store.links()[edge.link_index]
    }

    /// polyline of an edge in the direction of travel.
    pub fn edge_geometry(&self, edge: &GraphEdge) -> Vec<Coord<f64>> {
        let coords = &self.link(edge).geometry.0;
        if edge.reversed {
            coords.iter().rev().copied().collect()
        } else {
            coords.clone()
        }
    }

    /// finds the node nearest to a coordinate and its great-circle distance in meters.
    /// ties are broken by node id.
    ///
    /// the planar nearest node bounds the search; every node inside a metric
    /// envelope of that distance is ranked by great-circle distance.
    pub fn nearest_node(&self, coord: Coord<f64>) -> Option<(NodeId, f64)> {
        let distance = |n: &NodeLocation| {
            let node_coord = Coord {
                x: n.geom()[0],
                y: n.geom()[1],
            };
            geo_utils::haversine_meters(node_coord, coord)
        };
        let planar = self.node_rtree.nearest_neighbor(&[coord.x, coord.y])?;
        let envelope = geo_utils::envelope_around(coord, distance(planar));
        self.node_rtree
            .locate_in_envelope(&envelope)
            .map(|n| (n.data, distance(n)))
            .min_by(|(na, da), (nb, db)| da.total_cmp(db).then_with(|| na.cmp(nb)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::link::{LinkDirection, LinkId};
    use geo::{coord, line_string, LineString};

    fn link(id: &str, ls: LineString<f64>, direction: LinkDirection) -> Link {
        Link::new(LinkId::from(id), ls, direction, None)
            .expect("test invariant failed: link should be valid")
    }

    fn graph(links: Vec<Link>) -> RoadGraph {
        let store = GeometryStore::from_links("test", links)
            .expect("test invariant failed: store should build");
        RoadGraph::build(Arc::new(store), EdgeWeight::Distance)
            .expect("test invariant failed: graph should build")
    }

    /// edge multiset keyed by node coordinates, independent of node numbering
    fn signature(g: &RoadGraph) -> Vec<(NodeKey, NodeKey, LinkId, bool)> {
        g.edges()
            .iter()
            .map(|e| {
                (
                    g.nodes[e.src.0],
                    g.nodes[e.dst.0],
                    g.link(e).id.clone(),
                    e.reversed,
                )
            })
            .sorted()
            .collect()
    }

    #[test]
    fn test_shared_endpoints_merge() {
        let g = graph(vec![
            link("A", line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)], LinkDirection::Both),
            link(
                "B",
                line_string![(x: 1.000_000_01, y: 0.0), (x: 2.0, y: 0.0)],
                LinkDirection::Forward,
            ),
        ]);
        assert_eq!(g.n_nodes(), 3);
        assert_eq!(g.n_edges(), 3);
        let (middle, _) = g
            .nearest_node(coord! { x: 1.0, y: 0.0 })
            .expect("should snap");
        let out = g.out_edges(middle).map(|(_, e)| g.link(e).id.0.clone()).collect_vec();
        assert_eq!(out, vec!["A", "B"]);
    }

    #[test]
    fn test_backward_link_only_reverse_edge() {
        let g = graph(vec![link(
            "A",
            line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)],
            LinkDirection::Backward,
        )]);
        assert_eq!(g.n_edges(), 1);
        let e = &g.edges()[0];
        assert!(e.reversed);
        assert_eq!(g.node_coord(e.src), Some(coord! { x: 1.0, y: 0.0 }));
        assert_eq!(
            g.edge_geometry(e),
            vec![coord! { x: 1.0, y: 0.0 }, coord! { x: 0.0, y: 0.0 }]
        );
    }

    #[test]
    fn test_nearest_node_at_high_latitude() {
        // node 105.6 m east is nearer than ten link ends 167 m north, though every
        // northern node is nearer in planar degrees
        let mut links = (0..10)
            .map(|i| {
                let x = -0.001 + i as f64 * 0.0002;
                link(
                    &format!("N{i}"),
                    line_string![(x: x, y: 60.0015), (x: x + 0.0001, y: 60.0015)],
                    LinkDirection::Both,
                )
            })
            .collect_vec();
        links.push(link(
            "E",
            line_string![(x: 0.0019, y: 60.0), (x: 0.0019, y: 59.99)],
            LinkDirection::Both,
        ));
        let g = graph(links);
        let (node, d) = g
            .nearest_node(coord! { x: 0.0, y: 60.0 })
            .expect("should snap");
        let c = g.node_coord(node).expect("node should exist");
        assert!((c.x - 0.0019).abs() < 1e-9 && (c.y - 60.0).abs() < 1e-9);
        assert!((d - 105.6).abs() < 1.0, "unexpected distance {d}");
    }

    #[test]
    fn test_rebuild_is_isomorphic() {
        let links = || {
            vec![
                link("C", line_string![(x: 2.0, y: 0.0), (x: 2.0, y: 1.0)], LinkDirection::Both),
                link("A", line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)], LinkDirection::Both),
                link("B", line_string![(x: 1.0, y: 0.0), (x: 2.0, y: 0.0)], LinkDirection::Forward),
            ]
        };
        let g1 = graph(links());
        let mut reordered = links();
        reordered.reverse();
        let g2 = graph(reordered);
        assert_eq!(signature(&g1), signature(&g2));
        assert_eq!(g1.nodes, g2.nodes);
    }

    #[test]
    fn test_travel_time_weight() {
        let fast = Link::new(
            LinkId::from("F"),
            line_string![(x: 0.0, y: 0.0), (x: 0.01, y: 0.0)],
            LinkDirection::Forward,
            Some(72.0),
        )
        .expect("test invariant failed: link should be valid");
        let expected = fast.length_meters / 20.0;
        let store = GeometryStore::from_links("test", vec![fast])
            .expect("test invariant failed: store should build");
        let weight = EdgeWeight::TravelTime {
            default_speed_kph: 30.0,
        };
        let g = RoadGraph::build(Arc::new(store), weight).expect("graph should build");
        assert!((g.edges()[0].weight - expected).abs() < 1e-9);
        let invalid = EdgeWeight::TravelTime {
            default_speed_kph: 0.0,
        };
        assert!(invalid.validate().is_err());
    }
}
