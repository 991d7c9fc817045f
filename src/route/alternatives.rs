// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use super::dijkstra::run;
use super::{check_endpoints, Path, RouteError};
use crate::{Adjacency, Map};

/// Enumerates up to `k` distinct routes between two points of interest,
/// ordered by non-decreasing total distance. The first element is always
/// the true shortest path; an empty list means no route exists at all.
///
/// Alternatives are found by re-running the shortest-path search on copies
/// of the adjacency view with one edge of an already-accepted route
/// removed (both directions), keeping the best reachable candidate whose
/// node sequence differs from every accepted route. Two routes are
/// distinct purely by their ordered node-id sequences.
///
/// This is a simplified relative of
/// [Yen's algorithm](https://en.wikipedia.org/wiki/Yen%27s_algorithm):
/// only single edges of found routes are removed, without exploring full
/// spur combinatorics, so in dense graphs it can miss true alternatives
/// and return fewer than `k` routes even when more distinct ones exist.
/// That is an accepted approximation the surrounding product depends on,
/// not a correctness bug.
///
/// The trials never mutate the caller's map. Endpoint validation matches
/// [shortest_path](crate::shortest_path): unknown ids and identical
/// endpoints are rejected.
pub fn k_shortest_paths(
    map: &Map,
    from_id: &str,
    to_id: &str,
    k: usize,
) -> Result<Vec<Path>, RouteError> {
    check_endpoints(map, from_id, to_id)?;
    if k == 0 {
        return Ok(vec![]);
    }

    let adj = Adjacency::from_map(map);
    let first = match run(&adj, from_id, to_id) {
        Some(found) => found,
        None => return Ok(vec![]),
    };

    let mut accepted: Vec<(Vec<String>, f64)> = vec![first];
    while accepted.len() < k {
        let mut best: Option<(Vec<String>, f64)> = None;

        for (node_ids, _) in &accepted {
            for pair in node_ids.windows(2) {
                let trial = adj.without_connection(&pair[0], &pair[1]);
                let (candidate_ids, candidate_dist) = match run(&trial, from_id, to_id) {
                    Some(found) => found,
                    None => continue,
                };

                if accepted.iter().any(|(ids, _)| *ids == candidate_ids) {
                    continue;
                }
                if best
                    .as_ref()
                    .map_or(true, |(_, best_dist)| candidate_dist < *best_dist)
                {
                    best = Some((candidate_ids, candidate_dist));
                }
            }
        }

        match best {
            Some(found) => accepted.push(found),
            None => break,
        }
    }

    accepted.sort_by(|(_, a), (_, b)| a.total_cmp(b));
    Ok(accepted
        .into_iter()
        .map(|(node_ids, distance)| Path::resolve(map, node_ids, distance))
        .collect())
}
