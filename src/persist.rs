// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! The serialization boundary: pure data mapping between [Map] and the
//! persisted JSON document shape consumed by the key-value store and the
//! file import/export collaborators.
//!
//! Two historically-produced node shapes are accepted on load: an array
//! of records, or an id-keyed mapping of records. Both normalize into the
//! same internal representation, with missing coordinates, aliases and
//! kinds defaulted. Export produces the denormalized shape (nodes keyed
//! by id with a `connections` summary, a flat edge list, and a
//! precomputed adjacency map) which round-trips through the same loader.
//!
//! This module knows nothing about the storage medium, its keys, or
//! quota limits.

use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::project::OriginFix;
use crate::{Adjacency, Edge, GeoPoint, GraphError, Map, Node, NodeKind, Point};

/// Error conditions which may occur when loading or saving a map
/// document.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// The document is not valid JSON or misses required fields.
    #[error("malformed map document: {0}")]
    Json(#[from] serde_json::Error),

    /// The document parsed, but its graph violates a [Map] invariant
    /// (dangling endpoint, duplicate id, duplicate connection, ...).
    #[error("inconsistent map document: {0}")]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeRecord {
    #[serde(default)]
    id: String,
    name: String,
    #[serde(rename = "type", default)]
    kind: NodeKind,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    #[serde(default)]
    z: f64,
    floor: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lng: Option<f64>,
    /// Per-incident-edge summaries, written on export for consumers which
    /// don't rebuild adjacency. Ignored on load.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    connections: Vec<ConnectionRecord>,
    /// Nested position shape written by older exporters; each component
    /// takes precedence over its flat counterpart.
    #[serde(default, skip_serializing)]
    coordinates: Option<CoordinatesRecord>,
    #[serde(default, skip_serializing)]
    gps: Option<GpsRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionRecord {
    to: String,
    distance: f64,
    #[serde(default)]
    is_vertical: bool,
}

#[derive(Debug, Default, Deserialize)]
struct CoordinatesRecord {
    #[serde(default)]
    x: Option<f64>,
    #[serde(default)]
    y: Option<f64>,
    #[serde(default)]
    z: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct GpsRecord {
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lng: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EdgeRecord {
    id: String,
    from: String,
    to: String,
    #[serde(default)]
    floor: Option<i32>,
    distance: f64,
    #[serde(default)]
    is_vertical: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    from_floor: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    to_floor: Option<i32>,
    #[serde(default, alias = "pathPoints")]
    points: Vec<Point>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NeighborRecord {
    node: String,
    weight: f64,
    #[serde(default)]
    vertical: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Stats {
    nodes: usize,
    edges: usize,
    vertical_edges: usize,
    total_distance: f64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    building: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    origin: Option<OriginFix>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stats: Option<Stats>,
}

/// Both node shapes found in persisted documents.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum NodeSet {
    List(Vec<NodeRecord>),
    ById(BTreeMap<String, NodeRecord>),
}

/// The full persisted document shape.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    saved_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<Metadata>,
    nodes: NodeSet,
    #[serde(default)]
    edges: Vec<EdgeRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    graph: Option<BTreeMap<String, Vec<NeighborRecord>>>,
}

fn node_from_record(rec: NodeRecord, fallback_id: Option<String>) -> Node {
    let id = if rec.id.is_empty() {
        fallback_id.unwrap_or_default()
    } else {
        rec.id
    };
    let coordinates = rec.coordinates.unwrap_or_default();
    let gps = rec.gps.unwrap_or_default();
    let geo = match (gps.lat.or(rec.lat), gps.lng.or(rec.lng)) {
        (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
        _ => None,
    };
    Node {
        id,
        name: rec.name,
        kind: rec.kind,
        aliases: rec.aliases,
        floor: rec.floor,
        position: Point::new(
            coordinates.x.unwrap_or(rec.x),
            coordinates.y.unwrap_or(rec.y),
            coordinates.z.unwrap_or(rec.z),
        ),
        geo,
    }
}

fn node_to_record(node: &Node, connections: Vec<ConnectionRecord>) -> NodeRecord {
    NodeRecord {
        id: node.id.clone(),
        name: node.name.clone(),
        kind: node.kind,
        aliases: node.aliases.clone(),
        x: node.position.x,
        y: node.position.y,
        z: node.position.z,
        floor: node.floor,
        lat: node.geo.map(|g| g.lat),
        lng: node.geo.map(|g| g.lng),
        connections,
        coordinates: None,
        gps: None,
    }
}

fn document_into_map(doc: MapDocument) -> Result<Map, PersistError> {
    let mut map = Map::new();
    let metadata = doc.metadata.unwrap_or_default();
    map.name = doc.name.or(metadata.building);
    map.origin = metadata.origin;
    map.recorded_distance = metadata.stats.map(|s| s.total_distance).unwrap_or(0.0);

    match doc.nodes {
        NodeSet::List(records) => {
            for rec in records {
                map.insert_node(node_from_record(rec, None))?;
            }
        }
        NodeSet::ById(records) => {
            for (id, rec) in records {
                map.insert_node(node_from_record(rec, Some(id)))?;
            }
        }
    }

    for rec in doc.edges {
        let polyline = if rec.points.len() >= 2 {
            rec.points
        } else {
            // Degenerate or missing polyline: fall back to a straight
            // segment between the endpoint positions.
            match (map.get_node(&rec.from), map.get_node(&rec.to)) {
                (Some(a), Some(b)) => vec![a.position, b.position],
                _ => return Err(GraphError::UnknownEndpoint(rec.from).into()),
            }
        };
        map.insert_edge(Edge {
            id: rec.id,
            from: rec.from,
            to: rec.to,
            floor: rec.floor,
            distance: rec.distance,
            polyline,
            is_vertical: rec.is_vertical,
            from_floor: rec.from_floor,
            to_floor: rec.to_floor,
        })?;
    }

    // The precomputed `graph` field of older documents is redundant with
    // the edge list and is rebuilt on demand; it is intentionally ignored.
    info!(
        "loaded map {:?}: {} nodes, {} edges",
        map.name.as_deref().unwrap_or("<unnamed>"),
        map.node_count(),
        map.edge_count()
    );
    Ok(map)
}

fn document_from_map(map: &Map) -> MapDocument {
    let now = chrono::Utc::now().to_rfc3339();

    let nodes: BTreeMap<String, NodeRecord> = map
        .nodes()
        .map(|n| {
            let connections = map
                .edges_at(&n.id)
                .map(|e| ConnectionRecord {
                    to: if e.from == n.id {
                        e.to.clone()
                    } else {
                        e.from.clone()
                    },
                    distance: e.distance,
                    is_vertical: e.is_vertical,
                })
                .collect();
            (n.id.clone(), node_to_record(n, connections))
        })
        .collect();

    let edges: Vec<EdgeRecord> = map
        .edges()
        .map(|e| EdgeRecord {
            id: e.id.clone(),
            from: e.from.clone(),
            to: e.to.clone(),
            floor: e.floor,
            distance: e.distance,
            is_vertical: e.is_vertical,
            from_floor: e.from_floor,
            to_floor: e.to_floor,
            points: e.polyline.clone(),
        })
        .collect();

    let adjacency = Adjacency::from_map(map);
    let graph: BTreeMap<String, Vec<NeighborRecord>> = adjacency
        .iter()
        .map(|(id, neighbors)| {
            let records = neighbors
                .iter()
                .map(|n| NeighborRecord {
                    node: n.node.clone(),
                    weight: n.weight,
                    vertical: n.is_vertical,
                })
                .collect();
            (id.clone(), records)
        })
        .collect();

    MapDocument {
        name: map.name.clone(),
        saved_at: Some(now.clone()),
        metadata: Some(Metadata {
            building: map.name.clone(),
            created_at: Some(now),
            origin: map.origin,
            stats: Some(Stats {
                nodes: map.node_count(),
                edges: map.edge_count(),
                vertical_edges: map.edges().filter(|e| e.is_vertical).count(),
                total_distance: map.recorded_distance.round(),
            }),
        }),
        nodes: NodeSet::ById(nodes),
        edges,
        graph: Some(graph),
    }
}

/// Loads a map document from a string.
pub fn load_from_str(data: &str) -> Result<Map, PersistError> {
    document_into_map(serde_json::from_str(data)?)
}

/// Loads a map document from a reader.
pub fn load_from_io<R: io::Read>(reader: R) -> Result<Map, PersistError> {
    document_into_map(serde_json::from_reader(reader)?)
}

/// Loads a map document from a file at the provided path.
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Map, PersistError> {
    load_from_io(File::open(path)?)
}

/// Serializes a map into the persisted document shape.
pub fn to_string_pretty(map: &Map) -> Result<String, PersistError> {
    let doc = document_from_map(map);
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// Writes a map document to a writer.
pub fn save_to_io<W: io::Write>(map: &Map, writer: W) -> Result<(), PersistError> {
    let doc = document_from_map(map);
    serde_json::to_writer_pretty(writer, &doc)?;
    debug!(
        "saved map {:?}: {} nodes, {} edges",
        map.name.as_deref().unwrap_or("<unnamed>"),
        map.node_count(),
        map.edge_count()
    );
    Ok(())
}

/// Writes a map document to a file at the provided path.
pub fn save_to_file<P: AsRef<Path>>(map: &Map, path: P) -> Result<(), PersistError> {
    save_to_io(map, File::create(path)?)
}
