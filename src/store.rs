// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Persistence of ingested records.
//!
//! A [GraphStore] is written once per ingestion run with [GraphStore::write_all],
//! and bulk-read by the [GraphLoader](crate::GraphLoader) whenever a graph is (re)loaded.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::osm::{Ingest, Way};
use crate::{Edge, Node};

/// Error which can occur when reading from or writing to a [GraphStore].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate node id: {0}")]
    DuplicateNode(i64),

    #[error("duplicate way id: {0}")]
    DuplicateWay(i64),

    /// The store doesn't exist or can't be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Bulk access to persisted nodes, ways and edges.
pub trait GraphStore {
    /// Reads all persisted nodes.
    fn read_nodes(&self) -> Result<Vec<Node>, StoreError>;

    /// Reads all persisted edges.
    fn read_edges(&self) -> Result<Vec<Edge>, StoreError>;

    /// Reads all persisted nodes and edges, both coming from the same
    /// [GraphStore::write_all] call.
    ///
    /// The default implementation calls [GraphStore::read_nodes] and
    /// [GraphStore::read_edges] one after another. Stores which may be written
    /// concurrently must override it.
    fn read_all(&self) -> Result<(Vec<Node>, Vec<Edge>), StoreError> {
        Ok((self.read_nodes()?, self.read_edges()?))
    }

    /// Replaces the contents of the store with the result of an ingestion run.
    ///
    /// Node ids and way ids must be unique; otherwise nothing is written
    /// and [StoreError::DuplicateNode] or [StoreError::DuplicateWay] is returned.
    ///
    /// Either all collections are replaced, or (on error) none of them.
    fn write_all(&self, ingest: &Ingest) -> Result<(), StoreError>;
}

fn check_unique_ids(ingest: &Ingest) -> Result<(), StoreError> {
    let mut seen: HashSet<i64> = HashSet::with_capacity(ingest.nodes.len());
    for n in &ingest.nodes {
        if !seen.insert(n.id) {
            return Err(StoreError::DuplicateNode(n.id));
        }
    }

    seen.clear();
    for w in &ingest.ways {
        if !seen.insert(w.id) {
            return Err(StoreError::DuplicateWay(w.id));
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct Manifest {
    generation: u64,
}

/// GraphStore keeping every collection as a JSON array in a separate file
/// (`nodes.json`, `ways.json` and `edges.json`) inside a directory.
///
/// Each [GraphStore::write_all] call creates a new `generation-N` subdirectory,
/// and only after all three files are written, publishes it by atomically
/// replacing `current.json`. Readers always follow `current.json`, so they
/// never see collections coming from different writes.
#[derive(Debug, Clone)]
pub struct DirStore {
    dir: PathBuf,
}

impl DirStore {
    pub const MANIFEST_FILE: &'static str = "current.json";
    pub const NODES_FILE: &'static str = "nodes.json";
    pub const WAYS_FILE: &'static str = "ways.json";
    pub const EDGES_FILE: &'static str = "edges.json";

    /// Creates a store in the provided directory. Nothing is accessed until
    /// the first read or write; the directory is created by [GraphStore::write_all].
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the directory holding the collections of the given generation.
    pub fn generation_dir(&self, generation: u64) -> PathBuf {
        self.dir.join(format!("generation-{}", generation))
    }

    /// Returns the currently published generation, or `None` if nothing
    /// was written to the store yet.
    pub fn current_generation(&self) -> Result<Option<u64>, StoreError> {
        let f = match File::open(self.dir.join(Self::MANIFEST_FILE)) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let manifest: Manifest = serde_json::from_reader(BufReader::new(f))?;
        Ok(Some(manifest.generation))
    }

    /// Reads all persisted ways.
    pub fn read_ways(&self) -> Result<Vec<Way>, StoreError> {
        read_collection(&self.current_dir()?, Self::WAYS_FILE)
    }

    fn current_dir(&self) -> Result<PathBuf, StoreError> {
        match self.current_generation()? {
            Some(generation) => Ok(self.generation_dir(generation)),
            None => Err(StoreError::Unavailable(
                self.dir.join(Self::MANIFEST_FILE).display().to_string(),
            )),
        }
    }

    fn write_generation(&self, dir: &Path, ingest: &Ingest) -> Result<(), StoreError> {
        fs::create_dir_all(dir)?;
        write_json(&dir.join(Self::NODES_FILE), &ingest.nodes)?;
        write_json(&dir.join(Self::WAYS_FILE), &ingest.ways)?;
        write_json(&dir.join(Self::EDGES_FILE), &ingest.edges)?;
        Ok(())
    }

    fn publish(&self, generation: u64) -> Result<(), StoreError> {
        let path = self.dir.join(Self::MANIFEST_FILE);
        let tmp_path = self.dir.join(format!("{}.tmp", Self::MANIFEST_FILE));

        write_json(&tmp_path, &Manifest { generation })?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }
}

fn read_collection<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<Vec<T>, StoreError> {
    let path = dir.join(name);
    let f = match File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(StoreError::Unavailable(path.display().to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_reader(BufReader::new(f))?)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let mut w = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut w, value)?;
    w.flush()?;
    Ok(())
}

impl GraphStore for DirStore {
    fn read_nodes(&self) -> Result<Vec<Node>, StoreError> {
        read_collection(&self.current_dir()?, Self::NODES_FILE)
    }

    fn read_edges(&self) -> Result<Vec<Edge>, StoreError> {
        read_collection(&self.current_dir()?, Self::EDGES_FILE)
    }

    fn read_all(&self) -> Result<(Vec<Node>, Vec<Edge>), StoreError> {
        let dir = self.current_dir()?;
        let nodes = read_collection(&dir, Self::NODES_FILE)?;
        let edges = read_collection(&dir, Self::EDGES_FILE)?;
        Ok((nodes, edges))
    }

    fn write_all(&self, ingest: &Ingest) -> Result<(), StoreError> {
        check_unique_ids(ingest)?;
        fs::create_dir_all(&self.dir)?;

        let previous = self.current_generation()?;
        let generation = previous.map_or(1, |g| g + 1);
        let dir = self.generation_dir(generation);

        if let Err(e) = self
            .write_generation(&dir, ingest)
            .and_then(|()| self.publish(generation))
        {
            if let Err(cleanup) = fs::remove_dir_all(&dir) {
                warn!("failed to remove {}: {}", dir.display(), cleanup);
            }
            return Err(e);
        }

        if let Some(previous) = previous {
            let previous_dir = self.generation_dir(previous);
            if let Err(e) = fs::remove_dir_all(&previous_dir) {
                warn!("failed to remove {}: {}", previous_dir.display(), e);
            }
        }

        info!(
            "wrote {} nodes, {} ways and {} edges to {}",
            ingest.nodes.len(),
            ingest.ways.len(),
            ingest.edges.len(),
            dir.display(),
        );
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Records {
    nodes: Vec<Node>,
    ways: Vec<Way>,
    edges: Vec<Edge>,
}

/// GraphStore keeping all records in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Records>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_ways(&self) -> Vec<Way> {
        self.records.read().ways.clone()
    }
}

impl GraphStore for MemoryStore {
    fn read_nodes(&self) -> Result<Vec<Node>, StoreError> {
        Ok(self.records.read().nodes.clone())
    }

    fn read_edges(&self) -> Result<Vec<Edge>, StoreError> {
        Ok(self.records.read().edges.clone())
    }

    fn read_all(&self) -> Result<(Vec<Node>, Vec<Edge>), StoreError> {
        let records = self.records.read();
        Ok((records.nodes.clone(), records.edges.clone()))
    }

    fn write_all(&self, ingest: &Ingest) -> Result<(), StoreError> {
        check_unique_ids(ingest)?;
        *self.records.write() = Records {
            nodes: ingest.nodes.clone(),
            ways: ingest.ways.clone(),
            edges: ingest.edges.clone(),
        };
        Ok(())
    }
}

impl<S: GraphStore + ?Sized> GraphStore for &S {
    fn read_nodes(&self) -> Result<Vec<Node>, StoreError> {
        (**self).read_nodes()
    }

    fn read_edges(&self) -> Result<Vec<Edge>, StoreError> {
        (**self).read_edges()
    }

    fn read_all(&self) -> Result<(Vec<Node>, Vec<Edge>), StoreError> {
        (**self).read_all()
    }

    fn write_all(&self, ingest: &Ingest) -> Result<(), StoreError> {
        (**self).write_all(ingest)
    }
}
