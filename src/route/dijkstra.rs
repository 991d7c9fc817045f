// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::{BinaryHeap, HashMap};

use super::{check_endpoints, Path, RouteError};
use crate::{Adjacency, Map};

#[derive(Debug, Clone)]
struct QueueItem {
    at: String,
    cost: f64,
}

impl PartialEq for QueueItem {
    fn eq(&self, other: &Self) -> bool {
        self.cost.eq(&other.cost)
    }
}

impl Eq for QueueItem {}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueItem {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // NOTE: We revert the order of comparison,
        // as lower costs are considered better ("higher"),
        // and Rust's BinaryHeap is a max-heap.
        other.cost.total_cmp(&self.cost)
    }
}

fn reconstruct_path(came_from: &HashMap<String, String>, last: &str) -> Vec<String> {
    let mut path = vec![last.to_string()];
    let mut last = last;

    while let Some(nd) = came_from.get(last) {
        path.push(nd.clone());
        last = nd;
    }

    path.reverse();
    path
}

/// Runs Dijkstra's algorithm over the adjacency view, returning the node
/// sequence and total distance, or `None` when the target is unreachable.
///
/// The heap keeps stale duplicate items instead of decreasing keys; they
/// are skipped when their cost exceeds the known cost of their node, so
/// each step still expands the unvisited node of minimum tentative
/// distance.
pub(super) fn run(adj: &Adjacency, from_id: &str, to_id: &str) -> Option<(Vec<String>, f64)> {
    let mut queue: BinaryHeap<QueueItem> = BinaryHeap::default();
    let mut came_from: HashMap<String, String> = HashMap::default();
    let mut known_costs: HashMap<String, f64> = HashMap::default();

    queue.push(QueueItem {
        at: from_id.to_string(),
        cost: 0.0,
    });
    known_costs.insert(from_id.to_string(), 0.0);

    while let Some(item) = queue.pop() {
        if item.at == to_id {
            return Some((reconstruct_path(&came_from, to_id), item.cost));
        }

        if item.cost > known_costs.get(&item.at).copied().unwrap_or(f64::INFINITY) {
            continue;
        }

        for neighbor in adj.neighbors(&item.at) {
            let neighbor_cost = item.cost + neighbor.weight;
            if neighbor_cost
                >= known_costs
                    .get(&neighbor.node)
                    .copied()
                    .unwrap_or(f64::INFINITY)
            {
                continue;
            }

            came_from.insert(neighbor.node.clone(), item.at.clone());
            known_costs.insert(neighbor.node.clone(), neighbor_cost);
            queue.push(QueueItem {
                at: neighbor.node.clone(),
                cost: neighbor_cost,
            });
        }
    }

    None
}

/// Finds the shortest route between two points of interest using
/// [Dijkstra's algorithm](https://en.wikipedia.org/wiki/Dijkstra%27s_algorithm)
/// over non-negative edge weights.
///
/// Fails with [RouteError::NotFound] when the destination is unreachable,
/// [RouteError::UnknownNode] when either id is absent from the map, and
/// [RouteError::SameEndpoints] when source and destination coincide.
///
/// The search is read-only over the map; the caller must not mutate the
/// map concurrently.
pub fn shortest_path(map: &Map, from_id: &str, to_id: &str) -> Result<Path, RouteError> {
    let adj = Adjacency::from_map(map);
    shortest_path_in(map, &adj, from_id, to_id)
}

pub(super) fn shortest_path_in(
    map: &Map,
    adj: &Adjacency,
    from_id: &str,
    to_id: &str,
) -> Result<Path, RouteError> {
    check_endpoints(map, from_id, to_id)?;
    match run(adj, from_id, to_id) {
        Some((node_ids, distance)) => Ok(Path::resolve(map, node_ids, distance)),
        None => Err(RouteError::NotFound),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Edge, Node, NodeKind, Point};

    macro_rules! assert_almost_eq {
        ($a:expr, $b:expr) => {
            assert!(
                (($a - $b).abs() < 1e-9),
                "assertion failed: {} ≈ {}",
                $a,
                $b
            )
        };
    }

    fn poi(id: &str, x: f64, y: f64) -> Node {
        Node {
            id: id.to_string(),
            name: id.to_string(),
            kind: NodeKind::Junction,
            aliases: vec![],
            floor: 1,
            position: Point::new(x, y, 0.0),
            geo: None,
        }
    }

    fn link(map: &mut Map, from: &str, to: &str, distance: f64) {
        map.insert_edge(Edge::walked(
            from,
            to,
            1,
            distance,
            vec![
                map.get_node(from).unwrap().position,
                map.get_node(to).unwrap().position,
            ],
        ))
        .unwrap();
    }

    //   A --2-- B --2-- D
    //    \             /
    //     4--- C ---1-+
    fn diamond() -> Map {
        let mut map = Map::new();
        for (id, x, y) in [("A", 0.0, 0.0), ("B", 2.0, 1.0), ("C", 4.0, -1.0), ("D", 4.0, 1.0)] {
            map.insert_node(poi(id, x, y)).unwrap();
        }
        link(&mut map, "A", "B", 2.0);
        link(&mut map, "B", "D", 2.0);
        link(&mut map, "A", "C", 4.0);
        link(&mut map, "C", "D", 1.0);
        map
    }

    #[test]
    fn picks_the_cheaper_branch() {
        let map = diamond();
        let path = shortest_path(&map, "A", "D").unwrap();
        assert_eq!(path.node_ids, ["A", "B", "D"]);
        assert_almost_eq!(path.distance, 4.0);
    }

    #[test]
    fn symmetric_in_both_directions() {
        let map = diamond();
        let forward = shortest_path(&map, "A", "D").unwrap();
        let backward = shortest_path(&map, "D", "A").unwrap();
        assert_almost_eq!(forward.distance, backward.distance);

        let mut reversed = backward.node_ids.clone();
        reversed.reverse();
        assert_eq!(forward.node_ids, reversed);
    }

    #[test]
    fn unreachable_is_not_found() {
        let mut map = diamond();
        map.insert_node(poi("X", 100.0, 100.0)).unwrap();
        assert_eq!(
            shortest_path(&map, "A", "X").unwrap_err(),
            RouteError::NotFound
        );
    }

    #[test]
    fn direct_neighbor() {
        let map = diamond();
        let path = shortest_path(&map, "C", "D").unwrap();
        assert_eq!(path.node_ids, ["C", "D"]);
        assert_almost_eq!(path.distance, 1.0);
    }
}
