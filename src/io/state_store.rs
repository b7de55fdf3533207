use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::model::{BackupInfo, Document};

/// Whole-document persistence with backup snapshots, last write wins.
///
/// Layout under the data directory: `state.json` plus a `backups/` folder of
/// timestamped snapshots; the descriptors of those snapshots live inside the
/// document itself.
pub struct StateStore {
    data_dir: PathBuf,
}

impl StateStore {
    /// Store rooted at the per-user data directory.
    pub fn default_location() -> Result<Self, String> {
        let dirs = directories::ProjectDirs::from("", "", "timeplan")
            .ok_or_else(|| "Could not resolve a user data directory".to_string())?;
        Ok(Self::at(dirs.data_dir().to_path_buf()))
    }

    /// Store rooted at an explicit directory.
    pub fn at(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn state_file(&self) -> PathBuf {
        self.data_dir.join("state.json")
    }

    fn backups_dir(&self) -> PathBuf {
        self.data_dir.join("backups")
    }

    fn ensure_dirs(&self) -> Result<(), String> {
        fs::create_dir_all(self.backups_dir())
            .map_err(|e| format!("Failed to create data directory: {}", e))
    }

    /// Load the document. A missing or unreadable state file falls back to
    /// the default document so the engine always starts from a well-formed
    /// state.
    pub fn load(&self) -> Document {
        let json = match fs::read_to_string(self.state_file()) {
            Ok(json) => json,
            Err(_) => return Document::default(),
        };
        match serde_json::from_str(&json) {
            Ok(doc) => doc,
            Err(e) => {
                eprintln!("Error loading state file: {}", e);
                Document::default()
            }
        }
    }

    /// Save the whole document, optionally snapshotting a backup first. The
    /// backup descriptor is appended to `doc.backups` before either file is
    /// written. Returns the save instant and the backup id, if one was made.
    pub fn save(
        &self,
        doc: &mut Document,
        create_backup: bool,
        now: DateTime<Utc>,
    ) -> Result<(DateTime<Utc>, Option<String>), String> {
        self.ensure_dirs()?;
        let backup_id = if create_backup {
            Some(self.create_backup(doc, now)?)
        } else {
            None
        };
        let json =
            serde_json::to_string_pretty(doc).map_err(|e| format!("Failed to encode: {}", e))?;
        fs::write(self.state_file(), json).map_err(|e| format!("Failed to save: {}", e))?;
        Ok((now, backup_id))
    }

    fn create_backup(&self, doc: &mut Document, now: DateTime<Utc>) -> Result<String, String> {
        let stamp = now.format("%Y%m%d_%H%M%S");
        let backup_id = format!("bkp_{}", stamp);
        let file_name = format!("state_{}.json", stamp);

        let info = BackupInfo {
            id: backup_id.clone(),
            created_at: now,
            reason: "manual_save".to_string(),
            file_name: file_name.clone(),
        };
        if !doc.backups.contains(&info) {
            doc.backups.push(info);
        }

        let json =
            serde_json::to_string_pretty(doc).map_err(|e| format!("Failed to encode: {}", e))?;
        fs::write(self.backups_dir().join(&file_name), json)
            .map_err(|e| format!("Failed to write backup: {}", e))?;
        Ok(backup_id)
    }

    /// Descriptors of all known backups.
    pub fn list_backups(&self) -> Vec<BackupInfo> {
        self.load().backups
    }

    /// Restore the document from a backup snapshot. A safety backup of the
    /// current state is taken first, and the restored document keeps the
    /// up-to-date backup list rather than the stale one inside the snapshot.
    pub fn restore(&self, backup_id: &str, now: DateTime<Utc>) -> Result<Document, String> {
        let mut current = self.load();
        let info = current
            .backups
            .iter()
            .find(|b| b.id == backup_id)
            .cloned()
            .ok_or_else(|| format!("Backup not found: {}", backup_id))?;

        let path = self.backups_dir().join(&info.file_name);
        let json = fs::read_to_string(&path)
            .map_err(|e| format!("Backup file not found: {}: {}", path.display(), e))?;

        self.ensure_dirs()?;
        self.create_backup(&mut current, now)?;

        let mut restored: Document =
            serde_json::from_str(&json).map_err(|e| format!("Corrupt backup: {}", e))?;
        restored.backups = current.backups;

        self.save(&mut restored, false, now)?;
        Ok(restored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    struct TempStore {
        dir: PathBuf,
        store: StateStore,
    }

    impl TempStore {
        fn new() -> Self {
            let dir = std::env::temp_dir().join(format!("timeplan-test-{}", Uuid::new_v4()));
            Self {
                store: StateStore::at(dir.clone()),
                dir,
            }
        }
    }

    impl Drop for TempStore {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.dir);
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn missing_state_file_loads_default() {
        let tmp = TempStore::new();
        let doc = tmp.store.load();
        assert!(doc.projects.is_empty());
        assert_eq!(doc.schema_version, crate::model::document::SCHEMA_VERSION);
    }

    #[test]
    fn save_then_load_round_trips() {
        let tmp = TempStore::new();
        let mut doc = Document::default();
        doc.app.timezone = "Europe/Copenhagen".to_string();

        let (_, backup_id) = tmp.store.save(&mut doc, true, at(1_700_000_000)).unwrap();
        assert!(backup_id.is_some());
        assert_eq!(doc.backups.len(), 1);

        let loaded = tmp.store.load();
        assert_eq!(loaded.app.timezone, "Europe/Copenhagen");
        assert_eq!(tmp.store.list_backups().len(), 1);
    }

    #[test]
    fn restore_rolls_back_but_keeps_backup_list() {
        let tmp = TempStore::new();

        let mut doc = Document::default();
        doc.app.timezone = "original".to_string();
        let (_, backup_id) = tmp.store.save(&mut doc, true, at(1_700_000_000)).unwrap();
        let backup_id = backup_id.unwrap();

        doc.app.timezone = "changed".to_string();
        tmp.store.save(&mut doc, true, at(1_700_000_060)).unwrap();

        let restored = tmp.store.restore(&backup_id, at(1_700_000_120)).unwrap();
        assert_eq!(restored.app.timezone, "original");
        // First save, second save, plus the pre-restore safety snapshot.
        assert_eq!(restored.backups.len(), 3);
        assert_eq!(tmp.store.load().app.timezone, "original");
    }

    #[test]
    fn restoring_an_unknown_backup_fails() {
        let tmp = TempStore::new();
        let mut doc = Document::default();
        tmp.store.save(&mut doc, false, at(1_700_000_000)).unwrap();
        assert!(tmp.store.restore("bkp_nope", at(1_700_000_060)).is_err());
    }
}
