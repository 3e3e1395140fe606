#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Shared cache of decoded assets.
//!
//! An [`AssetCache`] owns everything needed to turn an asset path into a
//! decoded asset: the data root, a decoder thread pool and the result maps.
//! Each path is decoded at most once at a time. Concurrent requests for the
//! same path wait for the first one and share its result, and failures are
//! remembered so that a broken file isn't decoded over and over.

mod cache;
mod loader;
mod path;
mod resolve;

pub use loader::{
    AssetLoader, AttributeLoader, MappingLoader, ModelLoader, ObjectListLoader, TextureLoader,
};
pub use path::AssetPath;

use std::{
    any::TypeId,
    collections::HashMap,
    fmt::Display,
    fs::{self, File},
    io,
    marker::PhantomData,
    mem,
    path::{Path, PathBuf},
    result,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard,
    },
};

use mu_text::{Script, TextArchive};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, debug_span, warn};

use cache::{CacheManager, Cached, Slot};

#[derive(Debug, Clone, Error, Hash, PartialEq, Eq)]
pub enum Error {
    #[error("asset `{0}` not found")]
    NotFound(String),
    #[error("io error reading `{path}`: {error}")]
    Io { path: PathBuf, error: String },
    #[error("failed to decode `{path}`: {error}")]
    Decode {
        path: String,
        error: mu_binary::Error,
    },
    #[error("failed to read script `{path}`: {error}")]
    Script { path: String, error: mu_text::Error },
    #[error("could not start decoder threads: {0}")]
    ThreadPool(String),
}

impl Error {
    fn from_io(err: &io::Error, path: &Path) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            error: err.to_string(),
        }
    }
}

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    root: PathBuf,
    threads: Option<usize>,
    script_archive: Option<PathBuf>,
    fallback_folder: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            threads: None,
            script_archive: None,
            fallback_folder: "texture".to_owned(),
        }
    }
}

impl Settings {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Directory all asset paths are relative to.
    pub fn root(&mut self, root: impl Into<PathBuf>) {
        self.root = root.into();
    }

    /// Number of decoder threads, one per core if unset.
    pub fn threads(&mut self, threads: usize) {
        self.threads = Some(threads);
    }

    /// Zip archive scripts are read from instead of the data root.
    pub fn script_archive(&mut self, script_archive: impl Into<PathBuf>) {
        self.script_archive = Some(script_archive.into());
    }

    /// Folder next to an asset that is searched when the asset itself is missing.
    pub fn fallback_folder(&mut self, fallback_folder: impl Into<String>) {
        self.fallback_folder = fallback_folder.into();
    }
}

pub struct AssetCache {
    settings: Settings,
    cache_manager: RwLock<CacheManager>,
    resolved: RwLock<HashMap<AssetPath, Option<PathBuf>>>,
    archive: Option<Mutex<TextArchive<File>>>,
    tp: rayon::ThreadPool,
    finished_assets: AtomicUsize,
    in_progress_assets: AtomicUsize,
}

impl AssetCache {
    /// # Errors
    ///
    /// Returns `Err` if the configured script archive can't be opened or the
    /// decoder threads can't be started.
    pub fn new(settings: Settings) -> Result<Self> {
        let mut builder =
            rayon::ThreadPoolBuilder::new().thread_name(|index| format!("asset decoder {index}"));
        if let Some(threads) = settings.threads {
            builder = builder.num_threads(threads);
        }
        let tp = builder
            .build()
            .map_err(|err| Error::ThreadPool(err.to_string()))?;

        let archive = match &settings.script_archive {
            Some(path) => {
                let archive = TextArchive::open(path).map_err(|error| Error::Script {
                    path: path.display().to_string(),
                    error,
                })?;
                debug!(path = %path.display(), entries = archive.len(), "opened script archive");
                Some(Mutex::new(archive))
            }
            None => None,
        };

        Ok(Self {
            settings,
            cache_manager: RwLock::default(),
            resolved: RwLock::default(),
            archive,
            tp,
            finished_assets: AtomicUsize::new(0),
            in_progress_assets: AtomicUsize::new(0),
        })
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Finds the file storing `path`, first as given, then inside the fallback
    /// folder next to it. Names are matched case-insensitively.
    ///
    /// Results, including misses, are cached until evicted.
    pub fn resolve(&self, path: impl Into<AssetPath>) -> Option<PathBuf> {
        self.resolve_stored(&path.into())
    }

    /// Like [`AssetCache::resolve`], for the file `loader` would read `path` from.
    pub fn resolve_for<L: AssetLoader>(
        &self,
        loader: &L,
        path: impl Into<AssetPath>,
    ) -> Option<PathBuf> {
        self.resolve_stored(&stored_path(loader, &path.into()))
    }

    fn resolve_stored(&self, path: &AssetPath) -> Option<PathBuf> {
        if let Some(resolved) = self.read_resolved().get(path) {
            return resolved.clone();
        }

        let resolved = resolve::candidates(path, &self.settings.fallback_folder)
            .iter()
            .find_map(|candidate| {
                match resolve::find_file(&self.settings.root, candidate) {
                    Ok(found) => found,
                    Err(err) => {
                        warn!(%candidate, %err, "could not search for asset");
                        None
                    }
                }
            });

        match &resolved {
            Some(file) => debug!(%path, file = %file.display(), "resolved asset"),
            None => debug!(%path, "asset not found"),
        }

        self.write_resolved().insert(path.clone(), resolved.clone());
        resolved
    }

    /// Reads and decodes an asset, bypassing the result cache.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the asset can't be found, read or decoded.
    pub fn load<L: AssetLoader>(
        &self,
        loader: &L,
        path: impl Into<AssetPath>,
    ) -> Result<L::Output> {
        self.load_stored(loader, &stored_path(loader, &path.into()))
    }

    fn load_stored<L: AssetLoader>(&self, loader: &L, stored: &AssetPath) -> Result<L::Output> {
        let file = self
            .resolve_stored(stored)
            .ok_or_else(|| Error::NotFound(stored.to_string()))?;

        let bytes = fs::read(&file).map_err(|err| Error::from_io(&err, &file))?;

        loader
            .decode(stored, &bytes)
            .map_err(|error| Error::Decode {
                path: stored.to_string(),
                error,
            })
    }

    /// Decodes an asset, or returns the result of an earlier decode.
    ///
    /// If another thread is decoding the same asset, waits for it and shares
    /// its result. A failed decode is logged and cached as `None`.
    ///
    /// Paths that only differ in the extension `loader` replaces share a result,
    /// so `sword.jpg` and `sword.ozj` are decoded once.
    pub fn prepare<L: AssetLoader>(
        &self,
        loader: &L,
        path: impl Into<AssetPath>,
    ) -> Option<Arc<L::Output>> {
        let stored = stored_path(loader, &path.into());
        self.single_flight(TypeId::of::<L>(), &stored, || {
            self.load_stored(loader, &stored)
        })
    }

    /// Prepares every path on the decoder threads, returning results in input order.
    pub fn prepare_each<L, P>(
        &self,
        loader: &L,
        paths: impl IntoIterator<Item = P>,
    ) -> Vec<Option<Arc<L::Output>>>
    where
        L: AssetLoader,
        P: Into<AssetPath>,
    {
        let paths: Vec<AssetPath> = paths.into_iter().map(Into::into).collect();

        self.tp.install(|| {
            paths
                .par_iter()
                .map(|path| self.prepare(loader, path))
                .collect()
        })
    }

    /// Returns a successfully decoded asset without decoding anything.
    pub fn get<L: AssetLoader>(
        &self,
        loader: &L,
        path: impl Into<AssetPath>,
    ) -> Option<Arc<L::Output>> {
        self.read_cache_manager()
            .get(TypeId::of::<L>(), &stored_path(loader, &path.into()))
    }

    /// Reads and tokenizes a script, bypassing the result cache.
    ///
    /// Scripts come from the configured archive, or from the data root if there is none.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the script can't be found, read or tokenized.
    pub fn load_script(&self, entry: impl Into<AssetPath>) -> Result<Script> {
        let entry = entry.into();
        let script_error = |error| Error::Script {
            path: entry.to_string(),
            error,
        };

        let bytes = match &self.archive {
            Some(archive) => archive
                .lock()
                .expect("the mutex shouldn't be poisoned")
                .read_entry(entry.as_str())
                .map_err(script_error)?,
            None => {
                let file = self
                    .resolve_stored(&entry)
                    .ok_or_else(|| Error::NotFound(entry.to_string()))?;
                fs::read(&file).map_err(|err| Error::from_io(&err, &file))?
            }
        };

        Script::decode(&bytes).map_err(script_error)
    }

    /// The script counterpart of [`AssetCache::prepare`].
    pub fn prepare_script(&self, entry: impl Into<AssetPath>) -> Option<Arc<Script>> {
        let entry = entry.into();
        self.single_flight(TypeId::of::<Script>(), &entry, || self.load_script(&entry))
    }

    /// The script counterpart of [`AssetCache::get`].
    pub fn get_script(&self, entry: impl Into<AssetPath>) -> Option<Arc<Script>> {
        self.read_cache_manager()
            .get(TypeId::of::<Script>(), &entry.into())
    }

    /// Forgets the result and resolved file of an asset, so the next
    /// [`AssetCache::prepare`] decodes it again.
    ///
    /// If the asset is being decoded, that decode finishes but its result is
    /// discarded. Returns whether a result was cached or in progress.
    pub fn evict<L: AssetLoader>(&self, loader: &L, path: impl Into<AssetPath>) -> bool {
        let stored = stored_path(loader, &path.into());
        self.write_resolved().remove(&stored);
        self.write_cache_manager()
            .evict::<L::Output>(TypeId::of::<L>(), &stored)
    }

    /// Forgets every cached result and resolved file. Running decodes finish
    /// but their results are discarded.
    pub fn clear(&self) {
        self.write_resolved().clear();
        self.write_cache_manager().clear();
    }

    /// Number of prepared assets finished so far, whether they were found and
    /// decoded or not.
    pub fn finished_assets(&self) -> usize {
        self.finished_assets.load(Ordering::Relaxed)
    }

    pub fn in_progress_assets(&self) -> usize {
        self.in_progress_assets.load(Ordering::Relaxed)
    }

    fn single_flight<T, E>(
        &self,
        kind: TypeId,
        path: &AssetPath,
        load: impl FnOnce() -> result::Result<T, E>,
    ) -> Cached<T>
    where
        T: Send + Sync + 'static,
        E: Display,
    {
        loop {
            let slot = self.write_cache_manager().claim::<T>(kind, path);

            match slot {
                Slot::Ready(cached) => return cached,
                Slot::Pending(wait_group) => {
                    let _span = debug_span!("wait", %path).entered();
                    wait_group.wait();
                }
                Slot::Claimed => break,
            }
        }

        self.in_progress_assets.fetch_add(1, Ordering::Relaxed);
        let claim = Claim::<T> {
            cache_manager: &self.cache_manager,
            in_progress_assets: &self.in_progress_assets,
            kind,
            path,
            marker: PhantomData,
        };

        let result = {
            let _span = debug_span!("decode", %path).entered();

            match load() {
                Ok(output) => Some(Arc::new(output)),
                Err(err) => {
                    warn!(%path, %err, "asset failed to load, caching the failure");
                    None
                }
            }
        };

        claim.complete(result.clone());
        self.finished_assets.fetch_add(1, Ordering::Relaxed);

        result
    }

    fn read_cache_manager(&self) -> RwLockReadGuard<CacheManager> {
        self.cache_manager
            .read()
            .expect("rwlock shouldn't be poisoned")
    }

    fn write_cache_manager(&self) -> RwLockWriteGuard<CacheManager> {
        self.cache_manager
            .write()
            .expect("rwlock shouldn't be poisoned")
    }

    fn read_resolved(&self) -> RwLockReadGuard<HashMap<AssetPath, Option<PathBuf>>> {
        self.resolved.read().expect("rwlock shouldn't be poisoned")
    }

    fn write_resolved(&self) -> RwLockWriteGuard<HashMap<AssetPath, Option<PathBuf>>> {
        self.resolved.write().expect("rwlock shouldn't be poisoned")
    }
}

/// A claimed cache slot. If the load unwinds before finishing, the slot is
/// completed as failed so that waiting threads are released.
struct Claim<'a, T: Send + Sync + 'static> {
    cache_manager: &'a RwLock<CacheManager>,
    in_progress_assets: &'a AtomicUsize,
    kind: TypeId,
    path: &'a AssetPath,
    marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> Claim<'_, T> {
    fn complete(self, result: Cached<T>) {
        self.cache_manager
            .write()
            .expect("rwlock shouldn't be poisoned")
            .complete(self.kind, self.path, result);
        self.in_progress_assets.fetch_sub(1, Ordering::Relaxed);
        mem::forget(self);
    }
}

impl<T: Send + Sync + 'static> Drop for Claim<'_, T> {
    fn drop(&mut self) {
        self.in_progress_assets.fetch_sub(1, Ordering::Relaxed);

        if let Ok(mut cache_manager) = self.cache_manager.write() {
            cache_manager.complete::<T>(self.kind, self.path, None);
        }
    }
}

/// The path `loader` reads an asset referenced as `path` from.
fn stored_path<L: AssetLoader>(loader: &L, path: &AssetPath) -> AssetPath {
    match loader.expected_extension(path) {
        Some(extension) => path.with_extension(extension),
        None => path.clone(),
    }
}
