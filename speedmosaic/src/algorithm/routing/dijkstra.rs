use crate::model::{
    graph::{EdgeId, NodeId, RoadGraph},
    link::LinkId,
};
use ordered_float::OrderedFloat;
use std::{cmp::Reverse, collections::BinaryHeap};

/// edges of a shortest path from source to target in traversal order.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortestPath {
    pub edges: Vec<EdgeId>,
    pub cost: f64,
}

/// frontier entry ordered by (cost, hop count) with the node id making the order total.
type HeapEntry = Reverse<(OrderedFloat<f64>, usize, NodeId)>;

/// finds the least-cost path between two nodes. among paths of equal cost the one
/// with the fewest links wins, then the lexicographically smallest sequence of link
/// ids. edge weights must be positive, which holds for any [RoadGraph].
///
/// # Returns
///
/// None if the target is not reachable from the source.
pub fn shortest_path(graph: &RoadGraph, source: NodeId, target: NodeId) -> Option<ShortestPath> {
    let n = graph.n_nodes();
    if source.0 >= n || target.0 >= n {
        return None;
    }
    if source == target {
        return Some(ShortestPath {
            edges: vec![],
            cost: 0.0,
        });
    }

    let mut best: Vec<Option<(f64, usize)>> = vec![None; n];
    let mut pred: Vec<Option<EdgeId>> = vec![None; n];
    let mut settled: Vec<bool> = vec![false; n];
    let mut frontier: BinaryHeap<HeapEntry> = BinaryHeap::new();

    best[source.0] = Some((0.0, 0));
    frontier.push(Reverse((OrderedFloat(0.0), 0, source)));

    while let Some(Reverse((OrderedFloat(cost), hops, node))) = frontier.pop() {
        if settled[node.0] || best[node.0] != Some((cost, hops)) {
            continue;
        }
        settled[node.0] = true;
        if node == target {
            break;
        }
        for (edge_id, edge) in graph.out_edges(node) {
            let next = edge.dst;
            if settled[next.0] {
                continue;
            }
            let candidate = (cost + edge.weight, hops + 1);
            let improves = match best[next.0] {
                None => true,
                Some(current) if lt(candidate, current) => true,
                Some(current) if candidate == current => {
                    // equal keys: both chains run through settled nodes and are final
                    let mut via_node = link_sequence(graph, &pred, node);
                    via_node.push(&graph.link(edge).id);
                    let incumbent = link_sequence(graph, &pred, next);
                    if via_node < incumbent {
                        pred[next.0] = Some(edge_id);
                    }
                    false
                }
                Some(_) => false,
            };
            if improves {
                best[next.0] = Some(candidate);
                pred[next.0] = Some(edge_id);
                frontier.push(Reverse((OrderedFloat(candidate.0), candidate.1, next)));
            }
        }
    }

    let (cost, _) = best[target.0]?;
    if !settled[target.0] {
        return None;
    }
    let mut edges = edge_chain(graph, &pred, target);
    edges.reverse();
    Some(ShortestPath { edges, cost })
}

fn lt(a: (f64, usize), b: (f64, usize)) -> bool {
    a.0 < b.0 || (a.0 == b.0 && a.1 < b.1)
}

/// predecessor edges from `node` back to the source, last edge first
fn edge_chain(graph: &RoadGraph, pred: &[Option<EdgeId>], node: NodeId) -> Vec<EdgeId> {
    let mut chain = vec![];
    let mut cursor = node;
    while let Some(edge_id) = pred[cursor.0] {
        chain.push(edge_id);
        match graph.edge(edge_id) {
            Some(edge) => cursor = edge.src,
            None => break,
        }
        // a chain longer than the edge count can only come from a corrupted table
        if chain.len() > graph.n_edges() {
            break;
        }
    }
    chain
}

fn link_sequence<'a>(
    graph: &'a RoadGraph,
    pred: &[Option<EdgeId>],
    node: NodeId,
) -> Vec<&'a LinkId> {
    edge_chain(graph, pred, node)
        .into_iter()
        .rev()
        .filter_map(|e| graph.edge(e).map(|edge| &graph.link(edge).id))
        .collect()
}
