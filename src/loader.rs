// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{info, warn};
use parking_lot::{Mutex, RwLock};

use crate::store::{GraphStore, StoreError};
use crate::Graph;

/// Error which can occur when loading a [Graph] from a [GraphStore].
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("graph store: {0}")]
    Store(#[from] StoreError),
}

/// GraphLoader builds [Graphs](Graph) from a [GraphStore] and publishes them
/// for concurrent readers.
///
/// A new graph is fully built before it replaces the current one. Readers hold
/// an [Arc] to the snapshot they started with, which stays valid (and unchanged)
/// regardless of any reloads happening in the meantime.
#[derive(Debug)]
pub struct GraphLoader<S: GraphStore> {
    store: S,
    current: RwLock<Arc<Graph>>,
    reload: Mutex<()>,
    loaded: AtomicBool,
}

impl<S: GraphStore> GraphLoader<S> {
    /// Creates a loader with an empty graph published.
    pub fn new(store: S) -> Self {
        Self {
            store,
            current: RwLock::new(Arc::new(Graph::default())),
            reload: Mutex::new(()),
            loaded: AtomicBool::new(false),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reads all nodes and edges from the store, builds a new [Graph]
    /// and publishes it, replacing the previous one.
    ///
    /// On failure, nothing is published and the previous graph remains current.
    pub fn load_all(&self) -> Result<Arc<Graph>, LoadError> {
        // Reloads are serialized: the most recent read is published last
        let _guard = self.reload.lock();

        let g = match self.build() {
            Ok(g) => Arc::new(g),
            Err(e) => {
                warn!("failed to load graph, keeping the previous one: {}", e);
                return Err(e);
            }
        };

        info!(
            "loaded graph with {} nodes and {} edges",
            g.len(),
            g.edge_count()
        );

        *self.current.write() = Arc::clone(&g);
        if g.edge_count() > 0 {
            self.loaded.store(true, Ordering::Release);
        }

        Ok(g)
    }

    fn build(&self) -> Result<Graph, LoadError> {
        let (nodes, edges) = self.store.read_all()?;
        Ok(Graph::from_records(nodes, edges))
    }

    /// Returns true once at least one load has produced a graph with edges.
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// Returns the currently published graph.
    pub fn graph(&self) -> Arc<Graph> {
        self.current.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osm::{ingest_from_buffer, FileFormat, Ingest, Options, CAR_PROFILE};
    use crate::search::{Algorithm, DEFAULT_STEP_LIMIT};
    use crate::store::MemoryStore;
    use crate::{Edge, Node};

    const SIMPLE_XML: &[u8] = include_bytes!("osm/reader/test_fixtures/simple.osm");

    fn simple_ingest() -> Ingest {
        let options = Options {
            profile: &CAR_PROFILE,
            file_format: FileFormat::Xml,
            bbox: [0.0; 4],
        };
        ingest_from_buffer(&options, SIMPLE_XML).unwrap()
    }

    /// Store which can be switched off, simulating an unreachable database.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        down: AtomicBool,
    }

    impl FlakyStore {
        fn check(&self) -> Result<(), StoreError> {
            if self.down.load(Ordering::Relaxed) {
                Err(StoreError::Unavailable("connection refused".to_string()))
            } else {
                Ok(())
            }
        }
    }

    impl GraphStore for FlakyStore {
        fn read_nodes(&self) -> Result<Vec<Node>, StoreError> {
            self.check()?;
            self.inner.read_nodes()
        }

        fn read_edges(&self) -> Result<Vec<Edge>, StoreError> {
            self.check()?;
            self.inner.read_edges()
        }

        fn write_all(&self, ingest: &Ingest) -> Result<(), StoreError> {
            self.check()?;
            self.inner.write_all(ingest)
        }
    }

    #[test]
    fn initially_empty() {
        let loader = GraphLoader::new(MemoryStore::new());
        assert!(!loader.is_loaded());
        assert!(loader.graph().is_empty());
    }

    #[test]
    fn load() {
        let store = MemoryStore::new();
        store.write_all(&simple_ingest()).unwrap();
        let loader = GraphLoader::new(store);

        let g = loader.load_all().unwrap();
        assert!(loader.is_loaded());
        assert_eq!(g.len(), 9);
        assert_eq!(g.edge_count(), 12);
        assert!(Arc::ptr_eq(&g, &loader.graph()));
    }

    #[test]
    fn load_empty_store() {
        let loader = GraphLoader::new(MemoryStore::new());
        let g = loader.load_all().unwrap();
        assert!(g.is_empty());
        assert!(!loader.is_loaded());
    }

    #[test]
    fn reload_is_deterministic() {
        let store = MemoryStore::new();
        store.write_all(&simple_ingest()).unwrap();
        let loader = GraphLoader::new(store);

        let first = loader.load_all().unwrap();
        let second = loader.load_all().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.edge_count(), second.edge_count());
        assert_eq!(first.adjacency(), second.adjacency());
        assert_eq!(first.nodes(), second.nodes());
    }

    #[test]
    fn failed_load_keeps_previous_graph() {
        let store = FlakyStore::default();
        store.write_all(&simple_ingest()).unwrap();
        let loader = GraphLoader::new(store);

        let loaded = loader.load_all().unwrap();

        loader.store().down.store(true, Ordering::Relaxed);
        assert!(matches!(
            loader.load_all(),
            Err(LoadError::Store(StoreError::Unavailable(_)))
        ));
        assert!(loader.is_loaded());
        assert!(Arc::ptr_eq(&loaded, &loader.graph()));
    }

    #[test]
    fn failed_first_load() {
        let store = FlakyStore::default();
        store.down.store(true, Ordering::Relaxed);
        let loader = GraphLoader::new(store);

        assert!(loader.load_all().is_err());
        assert!(!loader.is_loaded());
        assert!(loader.graph().is_empty());
    }

    #[test]
    fn snapshot_survives_reload() {
        let store = MemoryStore::new();
        store.write_all(&simple_ingest()).unwrap();
        let loader = GraphLoader::new(store);
        loader.load_all().unwrap();

        let snapshot = loader.graph();

        let mut smaller = simple_ingest();
        smaller.edges.retain(|e| e.way_id == 106);
        loader.store().write_all(&smaller).unwrap();
        loader.load_all().unwrap();

        assert_eq!(snapshot.edge_count(), 12);
        assert!(Algorithm::Dijkstra
            .find_path(&snapshot, 1, 5, DEFAULT_STEP_LIMIT)
            .unwrap()
            .is_some());

        let current = loader.graph();
        assert_eq!(current.edge_count(), 2);
        assert_eq!(
            Algorithm::Dijkstra.find_path(&current, 1, 5, DEFAULT_STEP_LIMIT),
            Ok(None)
        );
    }

    #[test]
    fn concurrent_queries_and_reloads() {
        let store = MemoryStore::new();
        store.write_all(&simple_ingest()).unwrap();
        let loader = GraphLoader::new(store);
        loader.load_all().unwrap();

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..50 {
                        let g = loader.graph();
                        let route = Algorithm::AStar
                            .find_path(&g, 1, 5, DEFAULT_STEP_LIMIT)
                            .unwrap()
                            .unwrap();
                        assert_eq!(route.path.first(), Some(&1));
                        assert_eq!(route.path.last(), Some(&5));
                    }
                });
            }

            s.spawn(|| {
                for _ in 0..20 {
                    loader.load_all().unwrap();
                }
            });
        });

        assert_eq!(loader.graph().edge_count(), 12);
    }
}
