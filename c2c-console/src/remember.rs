//! Durable remember-me storage.

use crate::error::Result;
use crate::session::{Redacted, MIN_KEY_LEN};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Persisted copy of the operator's key and name.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RememberRecord {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_remember: bool,
}

impl RememberRecord {
    /// Record to persist for a remembered login.
    pub fn remembered(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            is_remember: true,
        }
    }

    /// Record that overwrites a previous login.
    pub fn cleared() -> Self {
        Self::default()
    }

    /// Whether this record may pre-populate the session. A key too short to
    /// pass the authorization gate is never restored.
    pub fn is_restorable(&self) -> bool {
        self.is_remember && self.key.chars().count() >= MIN_KEY_LEN
    }
}

impl fmt::Debug for RememberRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RememberRecord")
            .field("key", &Redacted(&self.key))
            .field("name", &self.name)
            .field("is_remember", &self.is_remember)
            .finish()
    }
}

/// Key-value device storage for the remember-me record. Last write wins.
pub trait RememberStore: Send + Sync {
    /// Load the stored record, `None` if nothing was ever stored.
    fn load(&self) -> Result<Option<RememberRecord>>;

    /// Store `record`, replacing what was there.
    fn save(&self, record: &RememberRecord) -> Result<()>;

    /// Overwrite the stored record with [`RememberRecord::cleared`].
    fn clear(&self) -> Result<()> {
        self.save(&RememberRecord::cleared())
    }
}

/// JSON file backed store.
#[derive(Debug, Clone)]
pub struct FileRememberStore {
    path: PathBuf,
}

impl FileRememberStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RememberStore for FileRememberStore {
    fn load(&self) -> Result<Option<RememberRecord>> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&data)?))
    }

    fn save(&self, record: &RememberRecord) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        // Write then rename so a crash never leaves a torn file.
        let tmp = self.path.with_extension("tmp");
        write_private(&tmp, &serde_json::to_vec_pretty(record)?)?;
        fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = %self.path.display(), is_remember = record.is_remember, "remember record saved");
        Ok(())
    }
}

/// Write `data` to `path`, readable by the owner only on unix.
fn write_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(data)?;
    file.sync_all()
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryRememberStore {
    record: Mutex<Option<RememberRecord>>,
}

impl MemoryRememberStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with `record`.
    pub fn with_record(record: RememberRecord) -> Self {
        Self {
            record: Mutex::new(Some(record)),
        }
    }
}

impl RememberStore for MemoryRememberStore {
    fn load(&self) -> Result<Option<RememberRecord>> {
        Ok(self.record.lock().clone())
    }

    fn save(&self, record: &RememberRecord) -> Result<()> {
        *self.record.lock() = Some(record.clone());
        Ok(())
    }
}
