// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

/// Error conditions which may occur during [shortest_path](crate::shortest_path)
/// or [k_shortest_paths](crate::k_shortest_paths).
///
/// All are recoverable query failures; the map is never touched by a
/// route search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// The source or destination id is not present in the graph.
    UnknownNode(String),

    /// Source and destination are the same node. Rejected as a caller
    /// input error rather than answered with a zero-length path.
    SameEndpoints(String),

    /// No route exists between the two nodes. Surfaced to the user as
    /// "no route found", never as a crash.
    NotFound,
}

impl std::fmt::Display for RouteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownNode(id) => write!(f, "unknown node: {}", id),
            Self::SameEndpoints(id) => {
                write!(f, "source and destination are the same node: {}", id)
            }
            Self::NotFound => write!(f, "no route found"),
        }
    }
}

impl std::error::Error for RouteError {}
