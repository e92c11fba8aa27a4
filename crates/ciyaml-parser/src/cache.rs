//! Caches shared between documents.
//!
//! A [`Caches`] value is created once per process and passed by reference to
//! every parse and validation call. Each cache has its own lock, held only
//! for a single map read or write.

use std::{
    collections::HashMap,
    hash::Hash,
    path::{Path, PathBuf},
    sync::Arc,
};

use log::debug;
use parking_lot::Mutex;

use ciyaml_core::semantic::OrbInfo;

/// A thread-safe map from keys to shared values.
#[derive(Debug)]
pub struct Cache<K, V> {
    entries: Mutex<HashMap<K, V>>,
}

impl<K, V> Default for Cache<K, V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash, V: Clone> Cache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy of the cached value.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.entries.lock().get(key).cloned()
    }

    /// Store a value, replacing any previous one.
    pub fn insert(&self, key: K, value: V) {
        self.entries.lock().insert(key, value);
    }

    /// Remove a value, returning it if it was cached.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.entries.lock().remove(key)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: std::borrow::Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.entries.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

/// The caches of one analysis process.
#[derive(Debug, Default)]
pub struct Caches {
    /// Resolved remote orbs, keyed by `name@version`.
    orbs: Cache<String, Arc<OrbInfo>>,
    /// Docker Hub repository existence, keyed by `namespace/name`.
    docker_images: Cache<String, bool>,
    /// Docker Hub repository tags, keyed by `namespace/name`.
    docker_tags: Cache<String, Arc<[String]>>,
    /// Contents of files read from disk.
    files: Cache<PathBuf, Arc<str>>,
}

impl Caches {
    pub fn new() -> Self {
        Self::default()
    }

    /// The resolved orb with the given `name@version` id.
    pub fn orb(&self, id: &str) -> Option<Arc<OrbInfo>> {
        let orb = self.orbs.get(id);
        debug!(id = id, hit = orb.is_some(); "Orb cache lookup");
        orb
    }

    /// Cache a resolved orb under its id and return the shared copy.
    pub fn insert_orb(&self, info: OrbInfo) -> Arc<OrbInfo> {
        let info = Arc::new(info);
        self.orbs.insert(info.id.clone(), Arc::clone(&info));
        info
    }

    pub fn remove_orb(&self, id: &str) -> Option<Arc<OrbInfo>> {
        self.orbs.remove(id)
    }

    /// Whether a Docker Hub repository was found, if it was looked up before.
    pub fn docker_image_exists(&self, repository: &str) -> Option<bool> {
        self.docker_images.get(repository)
    }

    pub fn set_docker_image_exists(&self, repository: impl Into<String>, exists: bool) {
        self.docker_images.insert(repository.into(), exists);
    }

    /// The tags of a Docker Hub repository, if they were fetched before.
    pub fn docker_tags(&self, repository: &str) -> Option<Arc<[String]>> {
        self.docker_tags.get(repository)
    }

    pub fn set_docker_tags(&self, repository: impl Into<String>, tags: Vec<String>) {
        self.docker_tags.insert(repository.into(), tags.into());
    }

    /// The cached contents of a file.
    pub fn file(&self, path: &Path) -> Option<Arc<str>> {
        self.files.get(path)
    }

    /// Cache the contents of a file and return the shared copy.
    pub fn insert_file(&self, path: impl Into<PathBuf>, content: impl Into<Arc<str>>) -> Arc<str> {
        let content = content.into();
        self.files.insert(path.into(), Arc::clone(&content));
        content
    }

    pub fn remove_file(&self, path: &Path) -> Option<Arc<str>> {
        self.files.remove(path)
    }
}
