//! Session cookies shared by the executors of one client.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::{Arc, MutexGuard};

use consult_core::paths::write_private_file;
use cookie_store::CookieStore;
use log::{debug, warn};
use reqwest_cookie_store::CookieStoreMutex;

/// Cookie jar handed to every executor as its cookie provider.
///
/// Clones share the same jar. When opened on a path the jar is loaded from
/// that JSON file and written back whenever a response sets cookies, so a
/// cookie-backed session outlives the process the same way the file
/// credential store does.
#[derive(Clone, Default)]
pub struct SessionCookies {
    store: Arc<CookieStoreMutex>,
    path: Option<PathBuf>,
}

impl SessionCookies {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens a persistent jar, loading any cookies already saved at `path`.
    ///
    /// A missing file starts an empty jar; an unreadable or malformed one is
    /// logged and replaced on the next save.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let store = Self::read_store(&path);
        debug!("Opened cookie jar at {:?}", path);
        Self {
            store: Arc::new(CookieStoreMutex::new(store)),
            path: Some(path),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of cookies currently held, expired ones excluded.
    pub fn len(&self) -> usize {
        self.lock().iter_unexpired().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn provider(&self) -> Arc<CookieStoreMutex> {
        Arc::clone(&self.store)
    }

    /// Writes the jar to its file. No-op for an in-memory jar.
    ///
    /// Session cookies are kept too; the server decides when they end.
    pub fn persist(&self) {
        let Some(path) = &self.path else {
            return;
        };
        let mut buffer = Vec::new();
        let saved = {
            let store = self.lock();
            cookie_store::serde::json::save_incl_expired_and_nonpersistent(&store, &mut buffer)
        };
        if let Err(err) = saved {
            warn!("Failed to serialize cookies for {:?}: {}", path, err);
            return;
        }
        if let Err(err) = write_private_file(path, &buffer) {
            warn!("Failed to persist cookies to {:?}: {}", path, err);
        }
    }

    fn lock(&self) -> MutexGuard<'_, CookieStore> {
        self.store
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read_store(path: &Path) -> CookieStore {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return CookieStore::default(),
            Err(err) => {
                warn!("Failed to read cookie file {:?}: {}", path, err);
                return CookieStore::default();
            }
        };
        cookie_store::serde::json::load_all(BufReader::new(file)).unwrap_or_else(|err| {
            warn!("Failed to parse cookie file {:?}: {}", path, err);
            CookieStore::default()
        })
    }
}

impl fmt::Debug for SessionCookies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCookies")
            .field("path", &self.path)
            .field("cookies", &self.len())
            .finish()
    }
}
