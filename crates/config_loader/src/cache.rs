//! Sensor configuration cache
//!
//! Filename-keyed cache over [`ConfigResolver`]. Entries stay valid until
//! `reload`, `invalidate` or `clear` is called; file changes on disk are not
//! watched.

use std::collections::HashMap;
use std::sync::Arc;

use contracts::{ConfigDocument, ContractError};
use tracing::debug;

use crate::sensor_config::ConfigResolver;

/// Cached sensor configuration documents
#[derive(Debug)]
pub struct ConfigCache {
    resolver: ConfigResolver,
    entries: HashMap<String, Arc<ConfigDocument>>,
    hits: u64,
    misses: u64,
}

impl ConfigCache {
    pub fn new(resolver: ConfigResolver) -> Self {
        Self {
            resolver,
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn resolver(&self) -> &ConfigResolver {
        &self.resolver
    }

    /// Cached document, loading it on first use
    ///
    /// Failed loads are not cached.
    pub fn get_or_load(&mut self, filename: &str) -> Result<Arc<ConfigDocument>, ContractError> {
        if let Some(doc) = self.entries.get(filename) {
            self.hits += 1;
            debug!(filename, "sensor config cache hit");
            return Ok(Arc::clone(doc));
        }

        self.misses += 1;
        let doc = Arc::new(self.resolver.load(filename)?);
        self.entries.insert(filename.to_string(), Arc::clone(&doc));
        Ok(doc)
    }

    /// Re-read `filename` from disk, replacing any cached entry
    ///
    /// On failure the previous entry is dropped as well.
    pub fn reload(&mut self, filename: &str) -> Result<Arc<ConfigDocument>, ContractError> {
        self.entries.remove(filename);
        self.get_or_load(filename)
    }

    /// Drop the entry for `filename`; returns whether one existed
    pub fn invalidate(&mut self, filename: &str) -> bool {
        self.entries.remove(filename).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses)
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

/// Where the vehicle factory gets its sensor configuration from
#[derive(Debug)]
pub enum SensorConfigSource {
    /// Parse the file on every request
    Direct(ConfigResolver),
    /// Parse once per filename
    Cached(ConfigCache),
}

impl SensorConfigSource {
    pub fn direct(resolver: ConfigResolver) -> Self {
        Self::Direct(resolver)
    }

    pub fn cached(resolver: ConfigResolver) -> Self {
        Self::Cached(ConfigCache::new(resolver))
    }

    /// Fetch the document for `filename`
    pub fn fetch(&mut self, filename: &str) -> Result<Arc<ConfigDocument>, ContractError> {
        match self {
            Self::Direct(resolver) => resolver.load(filename).map(Arc::new),
            Self::Cached(cache) => cache.get_or_load(filename),
        }
    }

    pub fn resolver(&self) -> &ConfigResolver {
        match self {
            Self::Direct(resolver) => resolver,
            Self::Cached(cache) => cache.resolver(),
        }
    }
}
