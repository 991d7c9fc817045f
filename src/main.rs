use std::error::Error;
use std::path::{Path, PathBuf};

use clap::Parser;
use floornav::{k_shortest_paths, Map, Node};

#[derive(Debug, thiserror::Error)]
#[error("{}: {}", .0.display(), .1)]
struct MapLoadError(PathBuf, #[source] floornav::persist::PersistError);

#[derive(Debug, thiserror::Error)]
enum LocationError {
    #[error("no point of interest matches {0:?}")]
    NoMatch(String),

    #[error("{0:?} is ambiguous: matches {1}")]
    Ambiguous(String, String),
}

#[derive(Parser)]
struct Cli {
    /// The path to the map JSON file
    map_file: PathBuf,

    /// Name or alias of the start point of interest
    from: String,

    /// Name or alias of the destination point of interest
    to: String,

    /// How many alternative routes to look for
    #[arg(short = 'k', long = "alternatives", default_value_t = 3)]
    alternatives: usize,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    colog::init();
    let cli = Cli::parse();

    let map = load_map(&cli.map_file)?;
    let from = resolve_location(&map, &cli.from)?;
    let to = resolve_location(&map, &cli.to)?;

    let paths = k_shortest_paths(&map, &from.id, &to.id, cli.alternatives.max(1))?;
    if paths.is_empty() {
        println!("No route found between \"{}\" and \"{}\".", from.name, to.name);
        return Ok(());
    }

    for (idx, path) in paths.iter().enumerate() {
        let label = if idx == 0 { " (shortest)" } else { "" };
        println!(
            "Route {}{}: {}, ~{}, {} stops",
            idx + 1,
            label,
            format_distance(path.distance),
            format_duration(path.distance),
            path.node_ids.len(),
        );
        for node in &path.nodes {
            println!("  {} ({}, {})", node.name, node.kind, floor_label(node.floor));
        }
    }

    Ok(())
}

fn load_map<P: AsRef<Path>>(path: P) -> Result<Map, MapLoadError> {
    floornav::persist::load_from_file(path.as_ref())
        .map_err(|e| MapLoadError(PathBuf::from(path.as_ref()), e))
}

/// Resolves a user-typed location to a single node. An exact
/// (case-insensitive) name match wins over substring matches, so "Lift A"
/// resolves even when "Lift A1" also exists.
fn resolve_location<'a>(map: &'a Map, query: &str) -> Result<&'a Node, LocationError> {
    let matches = map.find_nodes(query);
    match matches.as_slice() {
        [] => Err(LocationError::NoMatch(query.to_string())),
        [node] => Ok(node),
        _ => {
            let exact: Vec<&Node> = matches
                .iter()
                .copied()
                .filter(|n| n.name.eq_ignore_ascii_case(query.trim()))
                .collect();
            if exact.len() == 1 {
                return Ok(exact[0]);
            }
            let names: Vec<&str> = matches.iter().map(|n| n.name.as_str()).collect();
            Err(LocationError::Ambiguous(
                query.to_string(),
                names.join(", "),
            ))
        }
    }
}

fn floor_label(floor: i32) -> String {
    if floor < 0 {
        format!("B{}", -floor)
    } else {
        format!("L{}", floor)
    }
}

fn format_distance(meters: f64) -> String {
    if meters < 1.0 {
        format!("{:.0} cm", meters * 100.0)
    } else {
        format!("{:.1} m", meters)
    }
}

/// Estimates the walking duration at 1.4 m/s.
fn format_duration(meters: f64) -> String {
    let seconds = meters / 1.4;
    if seconds < 60.0 {
        format!("{:.0} sec", seconds)
    } else {
        format!("{}m {:.0}s", (seconds / 60.0) as u64, seconds % 60.0)
    }
}
