//! Bearer credential and the store that owns it.
//!
//! A single store instance is built by the composing layer and shared by
//! every service through `Arc<dyn CredentialStore>`. Services only read or
//! replace the whole value; nothing ever edits a credential in place.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use parking_lot::RwLock;

use crate::paths::write_private_file;

/// Opaque bearer token for an authenticated session.
///
/// `Debug` and `Display` never print the token itself.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token, for building the `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for Credential {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for Credential {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

/// Holder of the current credential shared across services.
///
/// Implementations must be cheap to call and must not block on I/O for
/// longer than a local file write; callers never hold the value across an
/// `.await`.
pub trait CredentialStore: Send + Sync + fmt::Debug {
    fn get(&self) -> Option<Credential>;

    /// Replaces any existing credential.
    fn set(&self, credential: Credential);

    fn clear(&self);
}

/// Process-local store. Starts empty.
#[derive(Default)]
pub struct MemoryCredentialStore {
    current: RwLock<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a credential.
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            current: RwLock::new(Some(credential)),
        }
    }
}

impl fmt::Debug for MemoryCredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCredentialStore")
            .field("present", &self.current.read().is_some())
            .finish()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Option<Credential> {
        self.current.read().clone()
    }

    fn set(&self, credential: Credential) {
        *self.current.write() = Some(credential);
    }

    fn clear(&self) {
        *self.current.write() = None;
    }
}

/// Store mirrored to a single-line file so a session survives restarts.
///
/// The in-memory value is authoritative for the running process. Failed
/// file writes are logged and otherwise ignored.
pub struct FileCredentialStore {
    path: PathBuf,
    current: RwLock<Option<Credential>>,
}

impl FileCredentialStore {
    /// Opens the store, loading any credential already saved at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = Self::read_credential(&path);
        debug!(
            "Opened credential store at {:?} (credential present: {})",
            path,
            current.is_some()
        );
        Self {
            path,
            current: RwLock::new(current),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_credential(path: &Path) -> Option<Credential> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return None,
            Err(err) => {
                warn!("Failed to read credential file {:?}: {}", path, err);
                return None;
            }
        };
        let trimmed = content.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Credential::new(trimmed))
        }
    }

    fn write_credential(&self, credential: &Credential) -> std::io::Result<()> {
        write_private_file(&self.path, credential.expose().as_bytes())
    }
}

impl fmt::Debug for FileCredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileCredentialStore")
            .field("path", &self.path)
            .field("present", &self.current.read().is_some())
            .finish()
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Option<Credential> {
        self.current.read().clone()
    }

    fn set(&self, credential: Credential) {
        let mut current = self.current.write();
        if let Err(err) = self.write_credential(&credential) {
            warn!("Failed to persist credential to {:?}: {}", self.path, err);
        }
        *current = Some(credential);
    }

    fn clear(&self) {
        let mut current = self.current.write();
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => warn!("Failed to remove credential file {:?}: {}", self.path, err),
        }
        *current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn credential_formatting_is_redacted() {
        let credential = Credential::new("super-secret-token");
        assert!(!format!("{credential:?}").contains("super-secret"));
        assert!(!format!("{credential}").contains("super-secret"));
        assert_eq!(credential.expose(), "super-secret-token");
    }

    #[test]
    fn memory_store_lifecycle() {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.get(), None);

        store.set(Credential::new("t1"));
        assert_eq!(store.get(), Some(Credential::new("t1")));

        store.set(Credential::new("t2"));
        assert_eq!(store.get(), Some(Credential::new("t2")));

        store.clear();
        assert_eq!(store.get(), None);
    }

    #[test]
    fn shared_store_is_seen_by_every_holder() {
        let store: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::new());
        let other = Arc::clone(&store);

        store.set(Credential::new("shared"));
        assert_eq!(other.get(), Some(Credential::new("shared")));

        other.clear();
        assert_eq!(store.get(), None);
    }

    #[test]
    fn store_debug_does_not_leak_token() {
        let store = MemoryCredentialStore::with_credential(Credential::new("leak-me"));
        let rendered = format!("{store:?}");
        assert!(rendered.contains("present: true"));
        assert!(!rendered.contains("leak-me"));
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("credential");

        let store = FileCredentialStore::open(&path);
        assert_eq!(store.get(), None);
        store.set(Credential::new("persisted"));

        let reopened = FileCredentialStore::open(&path);
        assert_eq!(reopened.get(), Some(Credential::new("persisted")));

        reopened.clear();
        assert!(!path.exists());
        assert_eq!(FileCredentialStore::open(&path).get(), None);
    }

    #[test]
    fn file_store_trims_and_ignores_blank_files() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("credential");

        std::fs::write(&path, "  token-value \n").expect("write credential");
        assert_eq!(
            FileCredentialStore::open(&path).get(),
            Some(Credential::new("token-value"))
        );

        std::fs::write(&path, " \n").expect("write blank");
        assert_eq!(FileCredentialStore::open(&path).get(), None);
    }

    #[cfg(unix)]
    #[test]
    fn file_store_token_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("credential");
        FileCredentialStore::open(&path).set(Credential::new("secret"));

        let mode = std::fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn file_store_clear_without_file_is_noop() {
        let dir = tempdir().expect("tempdir");
        let store = FileCredentialStore::open(dir.path().join("missing"));
        store.clear();
        assert_eq!(store.get(), None);
    }
}
