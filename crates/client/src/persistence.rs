//! Durable session storage.
//!
//! The session survives restarts as two scalar entries in a string
//! key-value store: [`USER_KEY`] holds the identity as JSON (without the
//! token) and [`TOKEN_KEY`] holds the bearer token. A session is restored only
//! when both entries are present.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sweet_shop_core::{Role, SessionIdentity};
use thiserror::Error;
use tracing::warn;

/// Key of the serialized identity.
pub const USER_KEY: &str = "user";
/// Key of the bearer token.
pub const TOKEN_KEY: &str = "authToken";

/// Errors that can occur while reading or writing the persisted session.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Session storage I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Corrupt session entry: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where the session store keeps the identity between runs.
pub trait SessionPersistence: Send + Sync {
    /// The persisted identity, if a complete one exists.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if storage cannot be read or an entry is corrupt.
    fn load(&self) -> Result<Option<SessionIdentity>, PersistenceError>;

    /// Replace the persisted identity.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if storage cannot be written.
    fn save(&self, identity: &SessionIdentity) -> Result<(), PersistenceError>;

    /// Remove both entries.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if storage cannot be written.
    fn clear(&self) -> Result<(), PersistenceError>;
}

impl<T: SessionPersistence + ?Sized> SessionPersistence for std::sync::Arc<T> {
    fn load(&self) -> Result<Option<SessionIdentity>, PersistenceError> {
        (**self).load()
    }

    fn save(&self, identity: &SessionIdentity) -> Result<(), PersistenceError> {
        (**self).save(identity)
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        (**self).clear()
    }
}

/// The `user` entry.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedUser {
    username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_in: Option<i64>,
}

type Entries = BTreeMap<String, String>;

fn encode(entries: &mut Entries, identity: &SessionIdentity) -> Result<(), PersistenceError> {
    let user = PersistedUser {
        username: identity.username.clone(),
        email: identity.email.clone(),
        role: identity.role,
        expires_in: identity.expires_in_ms,
    };
    entries.insert(USER_KEY.to_owned(), serde_json::to_string(&user)?);
    entries.insert(
        TOKEN_KEY.to_owned(),
        identity.token.expose_secret().to_owned(),
    );
    Ok(())
}

fn decode(entries: &Entries) -> Result<Option<SessionIdentity>, PersistenceError> {
    let (Some(user), Some(token)) = (entries.get(USER_KEY), entries.get(TOKEN_KEY)) else {
        return Ok(None);
    };
    if token.is_empty() {
        return Ok(None);
    }

    let user: PersistedUser = serde_json::from_str(user)?;
    Ok(Some(SessionIdentity {
        username: user.username,
        email: user.email,
        role: user.role,
        token: SecretString::from(token.clone()),
        expires_in_ms: user.expires_in,
    }))
}

fn remove(entries: &mut Entries) {
    entries.remove(USER_KEY);
    entries.remove(TOKEN_KEY);
}

/// In-process storage, for tests and for sessions that should not outlive the process.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    entries: Mutex<Entries>,
}

impl MemoryPersistence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw entry, as a browser's storage inspector would show it.
    #[must_use]
    pub fn entry(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    /// Overwrite a raw entry.
    pub fn set_entry(&self, key: &str, value: impl Into<String>) {
        self.lock().insert(key.to_owned(), value.into());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionPersistence for MemoryPersistence {
    fn load(&self) -> Result<Option<SessionIdentity>, PersistenceError> {
        decode(&self.lock())
    }

    fn save(&self, identity: &SessionIdentity) -> Result<(), PersistenceError> {
        encode(&mut self.lock(), identity)
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        remove(&mut self.lock());
        Ok(())
    }
}

/// Entries kept in a JSON object on disk.
///
/// Unrelated keys in the file are preserved. On unix the file is readable by
/// its owner only, since it holds the bearer token.
#[derive(Debug, Clone)]
pub struct FilePersistence {
    path: PathBuf,
}

impl FilePersistence {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Entries, PersistenceError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(Entries::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Entries::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Current entries for a read-modify-write. A corrupt file counts as
    /// empty so a fresh login can replace it; any other failure is returned.
    fn read_for_update(&self) -> Result<Entries, PersistenceError> {
        match self.read() {
            Err(PersistenceError::Json(e)) => {
                warn!(path = %self.path.display(), error = %e, "Replacing corrupt session file");
                Ok(Entries::new())
            }
            other => other,
        }
    }

    fn write(&self, entries: &Entries) -> Result<(), PersistenceError> {
        if entries.is_empty() {
            return match std::fs::remove_file(&self.path) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(entries)?;
        write_private(&self.path, contents.as_bytes())?;
        Ok(())
    }
}

/// Write `contents` to `path`, restricting the file to its owner on unix.
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    // The mode only applies on creation; tighten files that already existed
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents)?;
    file.flush()
}

impl SessionPersistence for FilePersistence {
    fn load(&self) -> Result<Option<SessionIdentity>, PersistenceError> {
        decode(&self.read()?)
    }

    fn save(&self, identity: &SessionIdentity) -> Result<(), PersistenceError> {
        let mut entries = self.read_for_update()?;
        encode(&mut entries, identity)?;
        self.write(&entries)
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        let mut entries = self.read_for_update()?;
        remove(&mut entries);
        self.write(&entries)
    }
}
