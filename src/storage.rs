use crate::config::atomic_rename;
use crate::model::{PetSnapshot, SaveFile, SAVE_VERSION};
use chrono::Utc;
use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum StoreError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("pet record {path} is unreadable: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not encode pet record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Where pets live between runs. One record per owner.
pub(crate) trait PetStore: Send {
    /// `Ok(None)` means the owner never had a pet.
    fn load(&self, owner: &str) -> Result<Option<PetSnapshot>, StoreError>;
    fn save(&self, owner: &str, pet: &PetSnapshot) -> Result<(), StoreError>;
    fn describe(&self) -> String;
}

/// One pretty-printed JSON file per owner under `dir`.
pub(crate) struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub(crate) fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub(crate) fn record_path(&self, owner: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(owner)))
    }
}

/// Owner ids come from the command line; keep them from escaping the directory.
fn file_stem(owner: &str) -> String {
    let stem: String = owner
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "default".to_string()
    } else {
        stem
    }
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl PetStore for JsonFileStore {
    fn load(&self, owner: &str) -> Result<Option<PetSnapshot>, StoreError> {
        let path = self.record_path(owner);
        let raw = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_err(&path)(e)),
        };
        let save: SaveFile =
            serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?;
        if save.version > SAVE_VERSION {
            tracing::warn!(
                version = save.version,
                path = %path.display(),
                "pet record written by a newer build, reading it anyway"
            );
        }
        Ok(Some(save.pet))
    }

    fn save(&self, owner: &str, pet: &PetSnapshot) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(io_err(&self.dir))?;
        let path = self.record_path(owner);
        let save = SaveFile {
            version: SAVE_VERSION,
            owner_id: owner.to_string(),
            saved_at: Utc::now(),
            pet: pet.clone(),
        };
        let data = serde_json::to_vec_pretty(&save)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, data).map_err(io_err(&tmp))?;
        atomic_rename(&tmp, &path).map_err(io_err(&path))?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("json files in {}", self.dir.display())
    }
}

/// Keeps pets for the lifetime of the process only. Clones share records.
#[derive(Clone, Default)]
pub(crate) struct MemoryStore {
    records: Arc<Mutex<HashMap<String, PetSnapshot>>>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, owner: &str) -> Option<PetSnapshot> {
        self.lock().get(owner).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, PetSnapshot>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PetStore for MemoryStore {
    fn load(&self, owner: &str) -> Result<Option<PetSnapshot>, StoreError> {
        Ok(self.get(owner))
    }

    fn save(&self, owner: &str, pet: &PetSnapshot) -> Result<(), StoreError> {
        self.lock().insert(owner.to_string(), pet.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory (nothing is kept after exit)".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InitialStats;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicU32, Ordering};

    static DIR_SEQ: AtomicU32 = AtomicU32::new(0);

    fn scratch_dir() -> PathBuf {
        let n = DIR_SEQ.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!(
            "pixelpup-store-{}-{}",
            std::process::id(),
            n
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn pup() -> PetSnapshot {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        PetSnapshot::fresh(&InitialStats::default(), t)
    }

    #[test]
    fn missing_record_is_none() {
        let store = JsonFileStore::new(scratch_dir());
        assert!(store.load("nobody").unwrap().is_none());
    }

    #[test]
    fn saved_record_loads_back() {
        let dir = scratch_dir();
        let store = JsonFileStore::new(&dir);
        let mut pet = pup();
        pet.level = 4;
        pet.is_sleeping = true;
        store.save("ada", &pet).unwrap();

        let loaded = store.load("ada").unwrap().unwrap();
        assert_eq!(loaded, pet);
        assert!(!dir.join("ada.json.tmp").exists());
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn record_carries_owner_and_version() {
        let dir = scratch_dir();
        let store = JsonFileStore::new(&dir);
        store.save("ada", &pup()).unwrap();
        let raw = fs::read_to_string(store.record_path("ada")).unwrap();
        let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(v["owner_id"], "ada");
        assert_eq!(v["version"], SAVE_VERSION);
        assert_eq!(v["pet"]["is_dead"], false);
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn garbage_file_is_reported_as_corrupt() {
        let dir = scratch_dir();
        fs::create_dir_all(&dir).unwrap();
        let store = JsonFileStore::new(&dir);
        fs::write(store.record_path("ada"), "{ not json").unwrap();
        let err = store.load("ada").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }), "{err}");
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn owner_ids_cannot_escape_the_directory() {
        let store = JsonFileStore::new("/data/pets");
        assert_eq!(
            store.record_path("../../etc/passwd"),
            PathBuf::from("/data/pets/______etc_passwd.json")
        );
        assert_eq!(store.record_path("  "), PathBuf::from("/data/pets/default.json"));
    }

    #[test]
    fn memory_store_shares_records_between_clones() {
        let store = MemoryStore::new();
        let handle = store.clone();
        assert!(store.load("ada").unwrap().is_none());
        store.save("ada", &pup()).unwrap();
        assert_eq!(handle.get("ada"), Some(pup()));
    }
}
