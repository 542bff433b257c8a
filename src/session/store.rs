use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::types::Session;

/// Per-user document store for session records, keyed by session id.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Fetch a session owned by `user_id`; `None` covers both "no such
    /// session" and "owned by someone else".
    async fn get(&self, user_id: &str, session_id: &str) -> Result<Option<Session>>;

    /// Create or replace the session document.
    async fn put(&self, session: &Session) -> Result<()>;

    /// Most recent session for (user, role) by creation time.
    async fn find_latest(&self, user_id: &str, role: &str) -> Result<Option<Session>>;
}

/// Raw-upload blob storage. Keys are deterministic per
/// (user, session, question index) so re-recordings overwrite in place.
#[async_trait]
pub trait AudioBlobStore: Send + Sync {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Path to a locally readable copy of the blob; `None` when it does
    /// not exist.
    async fn get(&self, key: &str) -> Result<Option<PathBuf>>;
}

/// Replace anything that could act as a path separator or traversal.
pub(crate) fn sanitize_component(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

// ============================================================================
// Filesystem adapters
// ============================================================================

/// One JSON document per session, nested under the owning user:
/// `<root>/<user>/<session>.json`.
pub struct FsSessionRepository {
    root: PathBuf,
}

impl FsSessionRepository {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).context("Failed to create session store directory")?;
        Ok(Self { root })
    }

    fn user_dir(&self, user_id: &str) -> PathBuf {
        self.root.join(sanitize_component(user_id))
    }

    fn doc_path(&self, user_id: &str, session_id: &str) -> PathBuf {
        self.user_dir(user_id)
            .join(format!("{}.json", sanitize_component(session_id)))
    }
}

#[async_trait]
impl SessionRepository for FsSessionRepository {
    async fn get(&self, user_id: &str, session_id: &str) -> Result<Option<Session>> {
        let path = self.doc_path(user_id, session_id);

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).context("Failed to read session document"),
        };

        let session: Session =
            serde_json::from_slice(&bytes).context("Failed to parse session document")?;

        // The path layout implies ownership, but the document is authoritative
        if session.user_id != user_id {
            return Ok(None);
        }

        Ok(Some(session))
    }

    async fn put(&self, session: &Session) -> Result<()> {
        let dir = self.user_dir(&session.user_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .context("Failed to create user directory")?;

        let path = self.doc_path(&session.user_id, &session.session_id);
        let json = serde_json::to_vec_pretty(session).context("Failed to encode session")?;

        // Write-then-rename keeps readers off torn documents
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json)
            .await
            .context("Failed to write session document")?;
        tokio::fs::rename(&tmp, &path)
            .await
            .context("Failed to replace session document")?;

        debug!(
            "Persisted session {} for {}",
            session.session_id, session.user_id
        );
        Ok(())
    }

    async fn find_latest(&self, user_id: &str, role: &str) -> Result<Option<Session>> {
        let dir = self.user_dir(user_id);

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).context("Failed to list user sessions"),
        };

        let mut latest: Option<Session> = None;
        while let Some(entry) = entries
            .next_entry()
            .await
            .context("Failed to list user sessions")?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("Skipping unreadable session doc {}: {}", path.display(), e);
                    continue;
                }
            };
            let Ok(session) = serde_json::from_slice::<Session>(&bytes) else {
                warn!("Skipping malformed session doc {}", path.display());
                continue;
            };

            if session.role != role {
                continue;
            }
            if latest.as_ref().map_or(true, |current| {
                (session.created_at, session.round_number)
                    > (current.created_at, current.round_number)
            }) {
                latest = Some(session);
            }
        }

        Ok(latest)
    }
}

/// Filesystem blob store for raw answer uploads. Blobs are retained after
/// analysis; only normalized waveforms are temporary.
pub struct LocalAudioStore {
    root: PathBuf,
}

impl LocalAudioStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).context("Failed to create upload directory")?;
        Ok(Self { root })
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        let mut path = self.root.clone();
        for component in key.split('/') {
            path.push(sanitize_component(component));
        }
        path
    }
}

#[async_trait]
impl AudioBlobStore for LocalAudioStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.blob_path(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create upload directory")?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .context("Failed to write audio blob")?;
        debug!("Stored {} bytes at {}", bytes.len(), path.display());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<PathBuf>> {
        let path = self.blob_path(key);
        match tokio::fs::try_exists(&path).await {
            Ok(true) => Ok(Some(path)),
            Ok(false) => Ok(None),
            Err(e) => Err(e).context("Failed to stat audio blob"),
        }
    }
}

// ============================================================================
// In-memory adapter
// ============================================================================

/// In-memory repository for tests and local development.
#[derive(Default, Clone)]
pub struct InMemorySessionRepository {
    sessions: Arc<RwLock<HashMap<(String, String), Session>>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn get(&self, user_id: &str, session_id: &str) -> Result<Option<Session>> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(&(user_id.to_string(), session_id.to_string()))
            .cloned())
    }

    async fn put(&self, session: &Session) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(
            (session.user_id.clone(), session.session_id.clone()),
            session.clone(),
        );
        Ok(())
    }

    async fn find_latest(&self, user_id: &str, role: &str) -> Result<Option<Session>> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .values()
            .filter(|s| s.user_id == user_id && s.role == role)
            .max_by_key(|s| (s.created_at, s.round_number))
            .cloned())
    }
}
