// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use log::debug;

use crate::distance::{planar_distance, point_distance, polyline_length};
use crate::{Edge, GraphError, Map, Point};

/// Minimum 3-D spacing between accepted trajectory points, in meters.
/// Samples closer to the last accepted point are dropped to keep GPS
/// jitter from flooding the trajectory.
pub const MIN_POINT_SPACING: f64 = 1.0;

/// Planar radius within which a passing trajectory "touches" a node,
/// in meters.
pub const PROXIMITY_RADIUS: f64 = 5.0;

/// Synthetic vertical cost per level difference, in meters.
pub const FLOOR_HEIGHT: f64 = 4.0;

/// Altitude change beyond which a floor switch is suggested, in meters.
const Z_THRESHOLD: f64 = 2.0;

/// The ephemeral state of one walked trajectory.
#[derive(Debug, Default, Clone, PartialEq)]
struct Session {
    points: Vec<Point>,
    touched: Vec<String>,
    last: Option<Point>,
    walked: f64,
}

/// Turns a live stream of projected positions into new graph edges,
/// using proximity to existing nodes as the connection signal.
///
/// The recorder is an explicit `Idle -> Recording -> Idle` state machine
/// owning its session; there is no process-wide recording state. Samples
/// arriving while idle are ignored, and [stop](Recorder::stop) while idle
/// is a no-op.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Recorder {
    active_floor: i32,
    session: Option<Session>,
}

impl Recorder {
    pub fn new(active_floor: i32) -> Self {
        Self {
            active_floor,
            session: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_some()
    }

    pub fn active_floor(&self) -> i32 {
        self.active_floor
    }

    /// Switches the active floor. Allowed mid-session: proximity scans and
    /// edge floor tags follow the current value, so the operator can change
    /// the floor tab while walking.
    pub fn set_active_floor(&mut self, floor: i32) {
        self.active_floor = floor;
    }

    /// Starts a recording session, clearing any previous session state.
    pub fn start(&mut self) {
        self.session = Some(Session::default());
        debug!("recording started on floor {}", self.active_floor);
    }

    /// Processes one projected position while recording, returning the ids
    /// of nodes newly touched by this sample. Ignored while idle.
    ///
    /// The sample is dropped when it lies within [MIN_POINT_SPACING] of the
    /// last accepted point; otherwise it extends the trajectory and every
    /// untouched node on the active floor within [PROXIMITY_RADIUS]
    /// (planar distance, altitude ignored) joins the touched list in
    /// first-touch order.
    pub fn push_sample(&mut self, map: &Map, position: Point) -> Vec<String> {
        let floor = self.active_floor;
        let session = match self.session.as_mut() {
            Some(s) => s,
            None => return vec![],
        };

        if let Some(last) = session.last {
            let d = point_distance(&last, &position);
            if d < MIN_POINT_SPACING {
                return vec![];
            }
            session.walked += d;
        }
        session.points.push(position);
        session.last = Some(position);

        let mut touched = vec![];
        for node in map.nodes_on_floor(floor) {
            if session.touched.iter().any(|id| id == &node.id) {
                continue;
            }
            if planar_distance(&node.position, &position) <= PROXIMITY_RADIUS {
                session.touched.push(node.id.clone());
                touched.push(node.id.clone());
            }
        }
        touched
    }

    /// Appends a node directly to the touched list, preserving first-touch
    /// order. Used when a node is created at the current position
    /// mid-recording. Returns false while idle or when already touched.
    pub fn touch(&mut self, node_id: &str) -> bool {
        match self.session.as_mut() {
            Some(s) if !s.touched.iter().any(|id| id == node_id) => {
                s.touched.push(node_id.to_string());
                true
            }
            _ => false,
        }
    }

    /// The trajectory accepted so far; empty while idle.
    pub fn session_points(&self) -> &[Point] {
        self.session.as_ref().map(|s| s.points.as_slice()).unwrap_or_default()
    }

    /// Ids of the nodes touched so far, in first-touch order.
    pub fn touched_nodes(&self) -> &[String] {
        self.session.as_ref().map(|s| s.touched.as_slice()).unwrap_or_default()
    }

    /// Cumulative 3-D distance over accepted points of the current session.
    pub fn walked_distance(&self) -> f64 {
        self.session.as_ref().map(|s| s.walked).unwrap_or(0.0)
    }

    /// Stops recording and synthesizes edges into `map`, returning the ids
    /// of the edges created. A no-op returning no ids while idle.
    ///
    /// Sessions with fewer than 2 touched nodes or fewer than 2 points are
    /// discarded without mutating the graph. Otherwise each consecutive
    /// pair of touched nodes without an existing connection gets one walked
    /// edge. The distance is the 3-D length of the *entire* session
    /// polyline, and the full point sequence is attached to every pair: a
    /// session is expected to represent one corridor walk between adjacent
    /// points of interest, so sharing the polyline is an accepted
    /// simplification rather than per-pair sub-segment extraction.
    pub fn stop(&mut self, map: &mut Map) -> Vec<String> {
        let session = match self.session.take() {
            Some(s) => s,
            None => return vec![],
        };
        map.recorded_distance += session.walked;

        if session.touched.len() < 2 || session.points.len() < 2 {
            debug!(
                "recording discarded: {} points, {} touched nodes",
                session.points.len(),
                session.touched.len()
            );
            return vec![];
        }

        // Tenth-of-a-meter rounding, matching the persisted format.
        let path_dist = (polyline_length(&session.points) * 10.0).round() / 10.0;

        let mut created = vec![];
        for pair in session.touched.windows(2) {
            let (from, to) = (&pair[0], &pair[1]);
            if map.connected(from, to) {
                continue;
            }
            // A touched node may have been deleted mid-session.
            if map.get_node(from).is_none() || map.get_node(to).is_none() {
                continue;
            }

            let edge = Edge::walked(
                from,
                to,
                self.active_floor,
                path_dist,
                session.points.clone(),
            );
            let id = edge.id.clone();
            // Cannot fail: endpoints, self-loop and duplicates were
            // checked above, and the id is freshly generated.
            if map.insert_edge(edge).is_ok() {
                created.push(id);
            }
        }

        debug!(
            "recording stopped: {} points, {} touched nodes, {} new edges",
            session.points.len(),
            session.touched.len(),
            created.len()
        );
        created
    }
}

/// Links a freshly inserted stairs/lift node to its same-named, same-kind
/// counterparts on other floors, returning the ids of the vertical edges
/// created. Nodes of other kinds produce no links.
///
/// Triggered by the caller on every node insertion, independent of the
/// recording state. Each counterpart without an existing connection gets a
/// vertical edge weighted `|floor difference| * 4` meters, with the two
/// endpoint positions as its polyline. Name comparison is
/// case-insensitive.
pub fn auto_link_vertical(map: &mut Map, node_id: &str) -> Result<Vec<String>, GraphError> {
    let node = map
        .get_node(node_id)
        .ok_or_else(|| GraphError::UnknownEndpoint(node_id.to_string()))?
        .clone();
    if !node.kind.is_vertical_circulation() {
        return Ok(vec![]);
    }

    let name = node.name.to_lowercase();
    let matches: Vec<(String, i32, Point)> = map
        .nodes()
        .filter(|n| {
            n.id != node.id
                && n.kind == node.kind
                && n.floor != node.floor
                && n.name.to_lowercase() == name
        })
        .map(|n| (n.id.clone(), n.floor, n.position))
        .collect();

    let mut created = vec![];
    for (other_id, other_floor, other_position) in matches {
        if map.connected(&node.id, &other_id) {
            continue;
        }

        let floor_diff = (node.floor - other_floor).unsigned_abs();
        let edge = Edge::vertical(
            &other_id,
            &node.id,
            other_floor,
            node.floor,
            floor_diff as f64 * FLOOR_HEIGHT,
            vec![other_position, node.position],
        );
        let id = edge.id.clone();
        map.insert_edge(edge)?;
        debug!(
            "vertical link \"{}\": floor {} <-> floor {}",
            node.name, other_floor, node.floor
        );
        created.push(id);
    }

    Ok(created)
}

/// Suggests a floor switch when the altitude has drifted more than 2
/// meters since the last confirmed floor change. Display plumbing only;
/// the floor is never switched automatically.
pub fn floor_change_hint(z: f64, last_floor_z: f64) -> bool {
    (z - last_floor_z).abs() > Z_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Node, NodeKind};

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

    fn poi(id: &str, name: &str, kind: NodeKind, floor: i32, x: f64, y: f64) -> Node {
        Node {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            aliases: vec![],
            floor,
            position: Point::new(x, y, (floor - 1) as f64 * 4.0),
            geo: None,
        }
    }

    fn corridor_map() -> Map {
        let mut map = Map::new();
        map.insert_node(poi("N1", "Entrance", NodeKind::Entrance, 1, 0.0, 0.0))
            .unwrap();
        map.insert_node(poi("N2", "Lobby", NodeKind::Junction, 1, 15.0, 0.0))
            .unwrap();
        map.insert_node(poi("N9", "Room B-01", NodeKind::Room, -1, 7.0, 0.0))
            .unwrap();
        map
    }

    #[test]
    fn samples_ignored_while_idle() {
        let mut rec = Recorder::new(1);
        let map = corridor_map();
        assert!(rec.push_sample(&map, Point::default()).is_empty());
        assert!(rec.session_points().is_empty());
    }

    #[test]
    fn jitter_below_spacing_is_filtered() {
        let mut rec = Recorder::new(1);
        let map = corridor_map();
        rec.start();

        rec.push_sample(&map, Point::new(100.0, 100.0, 0.0));
        rec.push_sample(&map, Point::new(100.5, 100.0, 0.0));
        assert_eq!(rec.session_points().len(), 1);
        assert_almost_eq!(rec.walked_distance(), 0.0);

        rec.push_sample(&map, Point::new(102.0, 100.0, 0.0));
        assert_eq!(rec.session_points().len(), 2);
        assert_almost_eq!(rec.walked_distance(), 2.0);
    }

    #[test]
    fn proximity_touches_active_floor_only_once() {
        let mut rec = Recorder::new(1);
        let map = corridor_map();
        rec.start();

        // Within 5 m of N1 (planar), and of basement node N9 which must
        // not be touched: it lies on another floor.
        let touched = rec.push_sample(&map, Point::new(3.0, 0.0, 0.0));
        assert_eq!(touched, vec!["N1".to_string()]);

        // Still near N1: no re-touch.
        let touched = rec.push_sample(&map, Point::new(4.5, 0.0, 0.0));
        assert!(touched.is_empty());

        let touched = rec.push_sample(&map, Point::new(12.0, 0.0, 0.0));
        assert_eq!(touched, vec!["N2".to_string()]);
        assert_eq!(rec.touched_nodes(), ["N1", "N2"]);
    }

    #[test]
    fn proximity_ignores_altitude() {
        let mut rec = Recorder::new(1);
        let map = corridor_map();
        rec.start();

        // 3 m planar but far in z; still a touch.
        let touched = rec.push_sample(&map, Point::new(3.0, 0.0, 50.0));
        assert_eq!(touched, vec!["N1".to_string()]);
    }

    #[test]
    fn stop_synthesizes_one_edge_per_consecutive_pair() {
        let mut rec = Recorder::new(1);
        let mut map = corridor_map();
        rec.start();

        for x in [0.0, 3.0, 6.0, 9.0, 12.0, 15.0] {
            rec.push_sample(&map, Point::new(x, 0.0, 0.0));
        }
        let created = rec.stop(&mut map);

        assert_eq!(created.len(), 1);
        assert!(!rec.is_recording());

        let edge = map.get_edge(&created[0]).unwrap();
        assert_eq!(edge.from, "N1");
        assert_eq!(edge.to, "N2");
        assert_eq!(edge.floor, Some(1));
        assert!(!edge.is_vertical);
        assert_almost_eq!(edge.distance, 15.0);
        // The full session polyline is attached.
        assert_eq!(edge.polyline.len(), 6);
        assert_almost_eq!(map.recorded_distance, 15.0);
    }

    #[test]
    fn short_sessions_are_discarded() {
        let mut rec = Recorder::new(1);
        let mut map = corridor_map();

        // Only one node touched.
        rec.start();
        rec.push_sample(&map, Point::new(0.0, 0.0, 0.0));
        rec.push_sample(&map, Point::new(3.0, 0.0, 0.0));
        assert!(rec.stop(&mut map).is_empty());
        assert_eq!(map.edge_count(), 0);

        // Stop while idle is a no-op.
        assert!(rec.stop(&mut map).is_empty());
    }

    #[test]
    fn existing_connections_are_not_duplicated() {
        let mut rec = Recorder::new(1);
        let mut map = corridor_map();
        map.insert_edge(Edge::walked(
            "N1",
            "N2",
            1,
            15.0,
            vec![Point::default(), Point::new(15.0, 0.0, 0.0)],
        ))
        .unwrap();

        rec.start();
        for x in [0.0, 5.0, 10.0, 15.0] {
            rec.push_sample(&map, Point::new(x, 0.0, 0.0));
        }
        assert!(rec.stop(&mut map).is_empty());
        assert_eq!(map.edge_count(), 1);
    }

    #[test]
    fn touch_joins_current_session() {
        let mut rec = Recorder::new(1);

        assert!(!rec.touch("N1"));
        rec.start();
        assert!(rec.touch("N1"));
        assert!(!rec.touch("N1"));
        assert_eq!(rec.touched_nodes(), ["N1"]);
    }

    #[test]
    fn auto_link_creates_one_vertical_edge_per_counterpart() {
        let mut map = Map::new();
        map.insert_node(poi("S1", "Stairs A", NodeKind::Stairs, 1, 15.0, 10.0))
            .unwrap();
        map.insert_node(poi("S2", "stairs a", NodeKind::Stairs, 2, 15.0, 10.0))
            .unwrap();

        let created = auto_link_vertical(&mut map, "S2").unwrap();
        assert_eq!(created.len(), 1);

        let edge = map.get_edge(&created[0]).unwrap();
        assert!(edge.is_vertical);
        assert_eq!(edge.floor, None);
        assert_eq!(edge.from_floor, Some(1));
        assert_eq!(edge.to_floor, Some(2));
        assert_almost_eq!(edge.distance, 4.0);
        assert_eq!(edge.polyline.len(), 2);

        // Linking again finds the existing connection and adds nothing.
        assert!(auto_link_vertical(&mut map, "S2").unwrap().is_empty());
        assert_eq!(map.edge_count(), 1);
    }

    #[test]
    fn auto_link_spans_multiple_levels() {
        let mut map = Map::new();
        map.insert_node(poi("L1", "Lift A", NodeKind::Lift, -1, 0.0, 0.0))
            .unwrap();
        map.insert_node(poi("L2", "Lift A", NodeKind::Lift, 3, 0.0, 0.0))
            .unwrap();

        let created = auto_link_vertical(&mut map, "L2").unwrap();
        assert_eq!(created.len(), 1);
        assert_almost_eq!(map.get_edge(&created[0]).unwrap().distance, 16.0);
    }

    #[test]
    fn auto_link_requires_matching_kind_and_name() {
        let mut map = Map::new();
        map.insert_node(poi("S1", "Stairs A", NodeKind::Stairs, 1, 0.0, 0.0))
            .unwrap();
        map.insert_node(poi("L1", "Stairs A", NodeKind::Lift, 2, 0.0, 0.0))
            .unwrap();
        map.insert_node(poi("S3", "Stairs B", NodeKind::Stairs, 2, 5.0, 0.0))
            .unwrap();
        map.insert_node(poi("R1", "Room 1", NodeKind::Room, 2, 9.0, 0.0))
            .unwrap();

        assert!(auto_link_vertical(&mut map, "S1").unwrap().is_empty());
        assert!(auto_link_vertical(&mut map, "R1").unwrap().is_empty());
        assert_eq!(map.edge_count(), 0);

        assert_eq!(
            auto_link_vertical(&mut map, "missing").unwrap_err(),
            GraphError::UnknownEndpoint("missing".to_string())
        );
    }

    #[test]
    fn floor_hint_threshold() {
        assert!(!floor_change_hint(1.5, 0.0));
        assert!(floor_change_hint(2.5, 0.0));
        assert!(floor_change_hint(-3.0, 0.0));
    }
}
