use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;

use triage_core::{ConversationId, ConversationRiskState, PersistedRiskState};

use crate::error::{StoreError, StoreResult};
use crate::store::{escalated_since, ConversationStore};

/// Filesystem-backed store, one JSON record per conversation.
///
/// Layout: `<root>/conversations/<encoded id>.json`, each file holding the
/// camelCase persisted-state shape. Writes go to a temp file in the same
/// directory and are renamed into place.
#[derive(Debug, Clone)]
pub struct FsConversationStore {
    dir: PathBuf,
}

impl FsConversationStore {
    /// Create a store rooted at `root`. Creates `root/conversations/` if needed.
    pub fn new(root: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = root.as_ref().join("conversations");
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn record_path(&self, id: &ConversationId) -> PathBuf {
        self.dir.join(format!("{}.json", encode_id(id.as_str())))
    }

    async fn blocking<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(PathBuf) -> StoreResult<T> + Send + 'static,
    {
        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || f(dir))
            .await
            .map_err(|e| StoreError::Backend(format!("blocking task failed: {e}")))?
    }
}

/// Keep `[A-Za-z0-9_-]`, escape everything else as `%XX` per byte.
fn encode_id(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for b in id.bytes() {
        if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

fn read_record(path: &Path) -> StoreResult<Option<ConversationRiskState>> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let record: PersistedRiskState = serde_json::from_slice(&data)?;
    let conversation_id = record.conversation_id.clone();
    ConversationRiskState::try_from(record)
        .map(Some)
        .map_err(|source| StoreError::Corrupt {
            conversation_id,
            source,
        })
}

fn write_record(dir: &Path, path: &Path, state: &ConversationRiskState) -> StoreResult<()> {
    let json = serde_json::to_vec_pretty(&PersistedRiskState::from(state))?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(&json)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl ConversationStore for FsConversationStore {
    async fn load(&self, id: &ConversationId) -> StoreResult<Option<ConversationRiskState>> {
        let path = self.record_path(id);
        self.blocking(move |_| read_record(&path)).await
    }

    async fn save(&self, state: &ConversationRiskState) -> StoreResult<()> {
        let path = self.record_path(&state.conversation_id);
        let state = state.clone();
        self.blocking(move |dir| write_record(&dir, &path, &state))
            .await
    }

    async fn list_escalated_since(
        &self,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<ConversationRiskState>> {
        self.blocking(move |dir| {
            let mut states = Vec::new();
            for entry in fs::read_dir(&dir)? {
                let path = entry?.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                if let Some(state) = read_record(&path)? {
                    states.push(state);
                }
            }
            Ok(escalated_since(states, since))
        })
        .await
    }
}
