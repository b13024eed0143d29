// src/state.rs
//! Durable storage for the seen-state: one JSON document, written
//! atomically (temp file + rename) so a crash mid-run never corrupts the
//! previous valid state.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::reconcile::SeenState;

/// Load the persisted state. A missing file is the empty default; an
/// unreadable or corrupt file is an error so the caller aborts before it
/// can overwrite anything.
pub fn load_state(path: &Path) -> Result<SeenState> {
    if !path.exists() {
        tracing::info!(target: "state", path = %path.display(), "no state file yet, starting empty");
        return Ok(SeenState::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading state from {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("parsing state from {}", path.display()))
}

/// Atomically replace the state file: write a temp file in the target
/// directory, then rename over the destination.
pub fn save_state(path: &Path, state: &SeenState) -> Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = dir {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let json = serde_json::to_string_pretty(state).context("serializing state")?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir.unwrap_or_else(|| Path::new(".")))
        .context("creating temp state file")?;
    use std::io::Write as _;
    tmp.write_all(json.as_bytes()).context("writing temp state file")?;
    tmp.persist(path)
        .with_context(|| format!("replacing {}", path.display()))?;

    tracing::info!(
        target: "state",
        path = %path.display(),
        tracked = state.seen_ids.len(),
        "state saved"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn missing_file_yields_default() {
        let dir = tempfile::tempdir().unwrap();
        let state = load_state(&dir.path().join("seen_jobs.json")).unwrap();
        assert_eq!(state, SeenState::default());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("seen_jobs.json");

        let mut state = SeenState::default();
        state.seen_ids.insert("ki_varbi:1".into());
        state.mark_applied("ki_varbi:1");
        state.last_updated = Some(Utc::now());

        save_state(&path, &state).unwrap();
        let loaded = load_state(&path).unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn corrupt_file_is_an_error_not_a_reset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen_jobs.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(load_state(&path).is_err());
    }

    #[test]
    fn save_overwrites_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen_jobs.json");

        let mut first = SeenState::default();
        first.seen_ids.insert("ki_varbi:1".into());
        save_state(&path, &first).unwrap();

        let mut second = SeenState::default();
        second.seen_ids.insert("ki_varbi:2".into());
        save_state(&path, &second).unwrap();

        let loaded = load_state(&path).unwrap();
        assert_eq!(loaded, second);
    }
}
