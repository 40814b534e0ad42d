//! Route discovery: scan handler files, extract declared routes, cache.

use crate::routing::table::RouteInsertError;
use std::fs;
use std::hash::{Hash, Hasher};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use trellis_core::{AnnotationReader, ControllerRef, HandlerId, Route};

/// Discovery failures. All of them are fatal at startup.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// The configured route directory could not be walked.
    #[error("failed to scan route directory {directory}: {source}")]
    Scan {
        /// The directory that failed.
        directory: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// The annotation reader failed for one handler.
    #[error("route extraction failed for {handler}: {source}")]
    Extraction {
        /// The handler being read.
        handler: HandlerId,
        /// The reader's error.
        source: trellis_core::BoxError,
    },

    /// A cache file exists but could not be read back.
    #[error("failed to read route cache {path}: {reason}")]
    CacheRead {
        /// The cache file.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// The cache file could not be written.
    #[error("failed to write route cache {path}: {reason}")]
    CacheWrite {
        /// The cache file.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// A discovered route carried a pattern the table rejected.
    #[error(transparent)]
    Insert(#[from] RouteInsertError),
}

/// Extracts route metadata for one (namespace, directory) mapping.
///
/// In non-debug mode the extracted metadata is persisted as JSON under the
/// cache directory and read back on the next discovery instead of
/// re-scanning — a pure performance optimization that yields an identical
/// table given unchanged source. In debug mode the cache is neither read nor
/// written, trading startup cost for always-fresh routes.
pub struct RouteDiscovery {
    reader: Arc<dyn AnnotationReader>,
    debug: bool,
    cache_dir: PathBuf,
}

impl RouteDiscovery {
    /// Create a discovery pass over the given annotation reader.
    pub fn new(reader: Arc<dyn AnnotationReader>, debug: bool, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            debug,
            cache_dir: cache_dir.into(),
        }
    }

    /// Discover routes for one (namespace, directory) pair.
    ///
    /// Idempotent: discovering the same pair twice yields the same routes.
    pub fn discover(&self, namespace: &str, directory: &Path) -> Result<Vec<Route>, DiscoveryError> {
        if !self.debug {
            if let Some(routes) = self.load_cache(namespace, directory)? {
                tracing::info!(namespace, routes = routes.len(), "loaded routes from cache");
                return Ok(routes);
            }
        }
        let routes = self.scan(namespace, directory)?;
        if !self.debug {
            self.store_cache(namespace, directory, &routes)?;
        }
        Ok(routes)
    }

    /// Walk handler files under `directory` in sorted order and ask the
    /// annotation reader for each handler's declared routes.
    fn scan(&self, namespace: &str, directory: &Path) -> Result<Vec<Route>, DiscoveryError> {
        let entries = fs::read_dir(directory).map_err(|source| DiscoveryError::Scan {
            directory: directory.to_path_buf(),
            source,
        })?;

        let mut files: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| DiscoveryError::Scan {
                directory: directory.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() {
                files.push(path);
            }
        }
        // Deterministic ordering so repeated scans produce identical tables.
        files.sort();

        let mut routes = Vec::new();
        for file in files {
            let Some(stem) = file.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let handler = HandlerId::new(namespace, stem);
            let decls = self
                .reader
                .routes_for(&handler)
                .map_err(|source| DiscoveryError::Extraction {
                    handler: handler.clone(),
                    source,
                })?;
            for decl in decls {
                routes.push(Route {
                    method: decl.method,
                    path: decl.path,
                    target: ControllerRef::new(namespace, stem, decl.action),
                    params: decl.params,
                });
            }
        }
        tracing::info!(namespace, routes = routes.len(), "scanned route metadata");
        Ok(routes)
    }

    fn cache_path(&self, namespace: &str, directory: &Path) -> PathBuf {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        directory.hash(&mut hasher);
        let key: String = namespace
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();
        self.cache_dir
            .join(format!("routes-{key}-{:016x}.json", hasher.finish()))
    }

    fn load_cache(
        &self,
        namespace: &str,
        directory: &Path,
    ) -> Result<Option<Vec<Route>>, DiscoveryError> {
        let path = self.cache_path(namespace, directory);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(DiscoveryError::CacheRead {
                    path,
                    reason: source.to_string(),
                });
            }
        };
        let routes = serde_json::from_str(&contents).map_err(|source| DiscoveryError::CacheRead {
            path,
            reason: source.to_string(),
        })?;
        Ok(Some(routes))
    }

    fn store_cache(
        &self,
        namespace: &str,
        directory: &Path,
        routes: &[Route],
    ) -> Result<(), DiscoveryError> {
        let path = self.cache_path(namespace, directory);
        fs::create_dir_all(&self.cache_dir).map_err(|source| DiscoveryError::CacheWrite {
            path: path.clone(),
            reason: source.to_string(),
        })?;
        let contents =
            serde_json::to_string_pretty(routes).map_err(|source| DiscoveryError::CacheWrite {
                path: path.clone(),
                reason: source.to_string(),
            })?;
        fs::write(&path, contents).map_err(|source| DiscoveryError::CacheWrite {
            path,
            reason: source.to_string(),
        })?;
        tracing::debug!(namespace, "persisted route cache");
        Ok(())
    }
}
