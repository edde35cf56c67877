use crate::debug::state::Breakpoint;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedBreakpoint {
    pub line: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "hitCondition")]
    pub hit_condition: Option<String>,
}

impl From<&Breakpoint> for PersistedBreakpoint {
    fn from(bp: &Breakpoint) -> Self {
        Self {
            line: bp.line,
            condition: bp.condition.clone(),
            hit_condition: bp.hit_condition.clone(),
        }
    }
}

/// `DATA_DIR/sessions/<id>.json` contents (spec §6 persisted state
/// layout). Volatile stop context is never included — recovery
/// reconstructs intent, not a live wire (spec §4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedSession {
    pub schema: u32,
    pub id: String,
    pub language: String,
    pub project_root: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub breakpoints: HashMap<String, Vec<PersistedBreakpoint>>,
    pub attach: Option<serde_json::Value>,
    pub launch: Option<serde_json::Value>,
}

impl PersistedSession {
    pub fn new(id: String, language: String, project_root: String) -> Self {
        Self {
            schema: SCHEMA_VERSION,
            id,
            language,
            project_root,
            created_at: chrono::Utc::now(),
            breakpoints: HashMap::new(),
            attach: None,
            launch: None,
        }
    }
}

fn sessions_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("sessions")
}

fn session_path(data_dir: &Path, id: &str) -> PathBuf {
    sessions_dir(data_dir).join(format!("{id}.json"))
}

/// Write-through with the tmp+fsync+rename discipline spec §4.8 mandates.
pub fn write_through(data_dir: &Path, session: &PersistedSession) -> Result<()> {
    let dir = sessions_dir(data_dir);
    fs::create_dir_all(&dir)?;

    let final_path = session_path(data_dir, &session.id);
    let tmp_path = dir.join(format!("{}.json.tmp", session.id));

    let body = serde_json::to_vec_pretty(session)?;
    {
        let mut file = fs::File::create(&tmp_path)?;
        use std::io::Write;
        file.write_all(&body)?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, &final_path)?;
    Ok(())
}

/// Scan `DATA_DIR/sessions` for recoverable descriptors. Corrupt files are
/// quarantined (renamed with a `.corrupt` suffix) and skipped rather than
/// failing the scan; the broker still starts.
pub fn list_recoverable(data_dir: &Path) -> Result<Vec<PersistedSession>> {
    let dir = sessions_dir(data_dir);
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut out = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }

        match fs::read(&path).map_err(Error::from).and_then(|bytes| {
            serde_json::from_slice::<PersistedSession>(&bytes).map_err(Error::from)
        }) {
            Ok(session) => out.push(session),
            Err(e) => {
                warn!("quarantining corrupt session file {:?}: {}", path, e);
                let corrupt_path = path.with_extension("json.corrupt");
                if let Err(rename_err) = fs::rename(&path, &corrupt_path) {
                    warn!("failed to quarantine {:?}: {}", path, rename_err);
                }
            }
        }
    }
    Ok(out)
}

pub fn recover_session(data_dir: &Path, id: &str) -> Result<PersistedSession> {
    let path = session_path(data_dir, id);
    let bytes = fs::read(&path).map_err(|_| Error::NotFound {
        kind: "persisted session",
        id: id.to_string(),
    })?;
    let session: PersistedSession = serde_json::from_slice(&bytes)
        .map_err(|e| Error::Corrupted(format!("session {id}: {e}")))?;
    info!("recovered persisted session {id} (schema {})", session.schema);
    Ok(session)
}
