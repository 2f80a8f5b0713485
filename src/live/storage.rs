use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use super::ScoreDraft;

const DRAFTS_VERSION: u32 = 1;

/// Unsaved score drafts, keyed by match id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftBook {
    pub version: u32,
    #[serde(default)]
    pub drafts: HashMap<String, ScoreDraft>,
}

impl Default for DraftBook {
    fn default() -> Self {
        Self::new()
    }
}

impl DraftBook {
    pub fn new() -> Self {
        Self {
            version: DRAFTS_VERSION,
            drafts: HashMap::new(),
        }
    }

    pub fn get(&self, match_id: &str) -> Option<&ScoreDraft> {
        self.drafts.get(match_id)
    }

    pub fn put(&mut self, draft: ScoreDraft) {
        self.drafts.insert(draft.match_id.clone(), draft);
    }

    pub fn remove(&mut self, match_id: &str) -> Option<ScoreDraft> {
        self.drafts.remove(match_id)
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }
}

/// ~/.config/y-ultimate/drafts.json
pub fn get_drafts_path() -> PathBuf {
    crate::config::get_config_dir().join("drafts.json")
}

/// Load drafts from a JSON file. A missing file is an empty book.
pub fn load_drafts(path: &Path) -> Result<DraftBook> {
    if !path.exists() {
        return Ok(DraftBook::new());
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open score drafts at {}", path.display()))?;
    let book: DraftBook = serde_json::from_reader(file).context("Failed to load score drafts")?;

    if book.version != DRAFTS_VERSION {
        anyhow::bail!("Unsupported score drafts version: {}", book.version);
    }
    Ok(book)
}

/// Save drafts atomically so a crash never leaves a half-written file.
pub fn save_drafts(path: &Path, book: &DraftBook) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    serde_json::to_writer_pretty(&mut file, book).context("Failed to serialize score drafts")?;
    file.commit().context("Failed to save score drafts")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::types::MatchStatus;
    use chrono::Utc;
    use std::env;

    fn draft(id: &str, a: u32, b: u32) -> ScoreDraft {
        ScoreDraft {
            match_id: id.to_string(),
            status: MatchStatus::Live,
            saved_a: 0,
            saved_b: 0,
            team_a_score: a,
            team_b_score: b,
            pending_status: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_load_missing_file_returns_empty() {
        let path = env::temp_dir().join("y_ultimate_test_drafts_missing.json");
        let _ = std::fs::remove_file(&path);
        let book = load_drafts(&path).unwrap();
        assert_eq!(book.version, 1);
        assert!(book.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let path = env::temp_dir().join("y_ultimate_test_drafts_roundtrip.json");
        let _ = std::fs::remove_file(&path);

        let mut book = DraftBook::new();
        book.put(draft("m1", 3, 2));
        book.put(draft("m2", 0, 1));
        book.put(draft("m1", 4, 2));
        save_drafts(&path, &book).unwrap();

        let loaded = load_drafts(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get("m1").map(|d| d.team_a_score), Some(4));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_unsupported_version() {
        let path = env::temp_dir().join("y_ultimate_test_drafts_version.json");
        std::fs::write(&path, r#"{"version": 9, "drafts": {}}"#).unwrap();
        let err = load_drafts(&path).unwrap_err();
        assert!(err.to_string().contains("version"));
        let _ = std::fs::remove_file(&path);
    }
}
