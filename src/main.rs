// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use log::{info, LevelFilter};
use serde_json::json;

use roadgraph::store::{DirStore, GraphStore};
use roadgraph::RoutingService;

#[derive(Debug, thiserror::Error)]
#[error("{0}: {1}")]
struct IngestError(PathBuf, #[source] roadgraph::osm::Error);

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Log more details (repeat for even more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert an OSM file into routable nodes and edges, and save them in a store directory
    Import {
        /// The path to the OSM file
        osm_file: PathBuf,

        /// Directory where the graph should be stored
        store_dir: PathBuf,

        /// Format of the OSM file
        #[arg(long, value_enum, default_value_t = Format::Auto)]
        format: Format,

        /// Only keep nodes within a bounding box
        #[arg(
            long,
            num_args = 4,
            action = clap::ArgAction::Set,
            allow_negative_numbers = true,
            value_names = ["MIN_LON", "MIN_LAT", "MAX_LON", "MAX_LAT"],
        )]
        bbox: Option<Vec<f64>>,
    },

    /// Find a route between two positions and print it as GeoJSON
    #[command(allow_negative_numbers = true)]
    Route {
        /// Directory with the stored graph
        store_dir: PathBuf,

        /// Latitude of the start point
        start_lat: f64,

        /// Longitude of the start point
        start_lon: f64,

        /// Latitude of the end point
        end_lat: f64,

        /// Longitude of the end point
        end_lon: f64,

        /// Name of the routing algorithm, see the "algorithms" command
        #[arg(short, long, default_value = "astar")]
        algorithm: String,

        /// Maximum number of nodes to expand before giving up
        #[arg(long, default_value_t = roadgraph::DEFAULT_STEP_LIMIT)]
        step_limit: usize,
    },

    /// Print all nodes of the stored graph as CSV
    Nodes {
        /// Directory with the stored graph
        store_dir: PathBuf,
    },

    /// Print the names of available routing algorithms
    Algorithms,

    /// Print statistics of the stored graph as JSON
    Stats {
        /// Directory with the stored graph
        store_dir: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Auto,
    Xml,
    XmlGz,
    XmlBz2,
}

impl From<Format> for roadgraph::osm::FileFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Auto => Self::Unknown,
            Format::Xml => Self::Xml,
            Format::XmlGz => Self::XmlGz,
            Format::XmlBz2 => Self::XmlBz2,
        }
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let level = match (cli.quiet, cli.verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Warn,
        (false, 1) => LevelFilter::Info,
        (false, 2) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    };
    colog::default_builder().filter_level(level).init();

    match cli.command {
        Command::Import {
            osm_file,
            store_dir,
            format,
            bbox,
        } => import(osm_file, store_dir, format, bbox),

        Command::Route {
            store_dir,
            start_lat,
            start_lon,
            end_lat,
            end_lon,
            algorithm,
            step_limit,
        } => {
            let service =
                RoutingService::new(DirStore::new(store_dir)).with_step_limit(step_limit);
            service.load_graph()?;
            route(&service, [start_lat, start_lon], [end_lat, end_lon], &algorithm)
        }

        Command::Nodes { store_dir } => {
            let store = DirStore::new(store_dir);
            let nodes = store.read_nodes()?;

            let mut out = io::BufWriter::new(io::stdout().lock());
            writeln!(out, "id,lat,lon")?;
            for n in nodes {
                writeln!(out, "{},{},{}", n.id, n.lat, n.lon)?;
            }
            out.flush()?;
            Ok(())
        }

        Command::Algorithms => {
            for a in roadgraph::Algorithm::ALL {
                println!("{}", a.name());
            }
            Ok(())
        }

        Command::Stats { store_dir } => {
            let service = RoutingService::new(DirStore::new(store_dir));
            let stats = service.load_graph()?;
            serde_json::to_writer_pretty(io::stdout().lock(), &stats)?;
            println!();
            Ok(())
        }
    }
}

fn import(
    osm_file: PathBuf,
    store_dir: PathBuf,
    format: Format,
    bbox: Option<Vec<f64>>,
) -> Result<(), Box<dyn Error>> {
    let options = roadgraph::osm::Options {
        profile: &roadgraph::osm::CAR_PROFILE,
        file_format: format.into(),
        bbox: match bbox {
            Some(values) => parse_bbox(&values)?,
            None => [0.0; 4],
        },
    };

    let ingest = match roadgraph::osm::ingest_from_file(&options, &osm_file) {
        Ok(ingest) => ingest,
        Err(e) => return Err(IngestError(osm_file, e).into()),
    };

    DirStore::new(store_dir).write_all(&ingest)?;
    info!(
        "accepted {} of {} ways ({} skipped)",
        ingest.stats.accepted_ways,
        ingest.stats.total_ways,
        ingest.stats.skipped_ways(),
    );
    Ok(())
}

fn parse_bbox(values: &[f64]) -> Result<[f64; 4], String> {
    <[f64; 4]>::try_from(values)
        .map_err(|_| format!("--bbox takes exactly 4 values, got {}", values.len()))
}

fn route(
    service: &RoutingService<DirStore>,
    start: [f64; 2],
    end: [f64; 2],
    algorithm: &str,
) -> Result<(), Box<dyn Error>> {
    let start_id = service
        .snap(start[0], start[1])?
        .ok_or("no node corresponding to the given start position")?;
    let end_id = service
        .snap(end[0], end[1])?
        .ok_or("no node corresponding to the given end position")?;

    let route = service
        .find_path(start_id, end_id, Some(algorithm))?
        .ok_or("no route found")?;

    let g = service.graph();
    let coordinates: Vec<[f64; 2]> = route
        .path
        .iter()
        .filter_map(|&id| g.get_node(id))
        .map(|n| [n.lon, n.lat])
        .collect();

    let feature_collection = json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {
                "algorithm": algorithm,
                "nodes": route.path,
                "steps": route.steps,
                "distance": route.distance,
                "time": route.time,
                "score": route.score,
                "metric": route.metric,
            },
            "geometry": {
                "type": "LineString",
                "coordinates": coordinates,
            },
        }],
    });

    serde_json::to_writer_pretty(io::stdout().lock(), &feature_collection)?;
    println!();
    Ok(())
}
