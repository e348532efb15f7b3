//! Persistent skeleton template library.
//!
//! Templates live as one JSON array in a single named slot of a key-value
//! store: a JSON file per key on native targets, `localStorage` in the
//! browser, or an in-memory map in tests. Every save or delete reads the
//! whole list, edits it and writes it back.

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;

use crate::model::{EntityId, SkeletonTemplate};

/// Slot holding the template list.
pub const TEMPLATES_KEY: &str = "skeletons";

/// Errors raised by the template library.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A template must be named before it can be saved.
    #[error("Skeleton name is required")]
    MissingName,

    #[error("No skeleton with id {id}")]
    NotFound { id: EntityId },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode templates: {0}")]
    Json(#[from] serde_json::Error),

    /// Browser storage unavailable or rejected the write.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// A string-valued key-value store.
pub trait SlotStore: fmt::Debug {
    /// Read a slot, `None` if it was never written.
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace a slot's contents.
    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Volatile store, mainly for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SlotStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.slots.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One `<key>.json` file per slot inside a directory.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStore {
    pub fn new(dir: impl Into<std::path::PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Platform data directory for the application.
    ///
    /// - Linux: `~/.config/pixelsuite/`
    /// - macOS: `~/Library/Application Support/pixelsuite/`
    /// - Windows: `%APPDATA%\pixelsuite\`
    pub fn default_dir() -> Option<std::path::PathBuf> {
        dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .map(|dir| dir.join("pixelsuite"))
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    /// File backing `key`.
    pub fn path_for(&self, key: &str) -> std::path::PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl SlotStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        if !path.exists() {
            log::debug!("No store file at {:?}", path);
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(path)?))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        std::fs::write(&path, value)?;
        log::debug!("Wrote {} bytes to {:?}", value.len(), path);
        Ok(())
    }
}

/// The browser's `localStorage`.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    fn storage() -> Result<web_sys::Storage, StoreError> {
        let window = web_sys::window()
            .ok_or_else(|| StoreError::Storage("No window object available".to_string()))?;
        window
            .local_storage()
            .map_err(|e| StoreError::Storage(format!("localStorage access error: {:?}", e)))?
            .ok_or_else(|| StoreError::Storage("localStorage not available".to_string()))
    }
}

#[cfg(target_arch = "wasm32")]
impl SlotStore for LocalStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Self::storage()?
            .get_item(key)
            .map_err(|e| StoreError::Storage(format!("Failed to read localStorage: {:?}", e)))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| StoreError::Storage(format!("Failed to write localStorage: {:?}", e)))
    }
}

/// Named skeleton templates kept in a [`SlotStore`].
#[derive(Debug)]
pub struct SkeletonLibrary<S: SlotStore> {
    store: S,
}

impl<S: SlotStore> SkeletonLibrary<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Every stored template.
    ///
    /// Never fails: an absent, unreadable or malformed slot yields an
    /// empty list and malformed records are skipped.
    pub fn load(&self) -> Vec<SkeletonTemplate> {
        match self.records() {
            Ok(records) => parse_records(&records),
            Err(e) => {
                log::warn!("Failed to read skeleton library: {}", e);
                Vec::new()
            }
        }
    }

    /// Look up a template by id.
    pub fn get(&self, id: &EntityId) -> Option<SkeletonTemplate> {
        self.load().into_iter().find(|t| &t.id == id)
    }

    /// Insert `template`, replacing any stored template with the same id.
    ///
    /// Returns the updated list. Blank names are rejected before anything
    /// is read or written. Records that fail to parse are written back
    /// as they were.
    pub fn save(&mut self, template: SkeletonTemplate) -> Result<Vec<SkeletonTemplate>, StoreError> {
        if template.name.trim().is_empty() {
            return Err(StoreError::MissingName);
        }

        let mut records = self.records()?;
        records.retain(|r| record_id(r) != Some(template.id.as_str()));
        records.push(serde_json::to_value(&template)?);
        self.write(&records)?;
        log::info!(
            "Saved skeleton '{}' ({} keypoints, {} connections)",
            template.name,
            template.keypoints.len(),
            template.connections.len()
        );
        Ok(parse_records(&records))
    }

    /// Remove the template with `id`, returning the updated list.
    pub fn delete(&mut self, id: &EntityId) -> Result<Vec<SkeletonTemplate>, StoreError> {
        let mut records = self.records()?;
        let before = records.len();
        records.retain(|r| record_id(r) != Some(id.as_str()));
        if records.len() == before {
            return Err(StoreError::NotFound { id: id.clone() });
        }
        self.write(&records)?;
        log::info!("Deleted skeleton {}", id);
        Ok(parse_records(&records))
    }

    /// Raw records of the slot. A slot that is not a JSON array counts as
    /// empty.
    fn records(&self) -> Result<Vec<serde_json::Value>, StoreError> {
        let Some(json) = self.store.read(TEMPLATES_KEY)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&json) {
            Ok(records) => Ok(records),
            Err(e) => {
                log::warn!("Discarding corrupt skeleton library: {}", e);
                Ok(Vec::new())
            }
        }
    }

    fn write(&mut self, records: &[serde_json::Value]) -> Result<(), StoreError> {
        let json = serde_json::to_string(records)?;
        self.store.write(TEMPLATES_KEY, &json)
    }
}

fn record_id(record: &serde_json::Value) -> Option<&str> {
    record.get("id")?.as_str()
}

fn parse_records(records: &[serde_json::Value]) -> Vec<SkeletonTemplate> {
    records
        .iter()
        .enumerate()
        .filter_map(
            |(i, record)| match SkeletonTemplate::deserialize(record) {
                Ok(template) => Some(template),
                Err(e) => {
                    log::warn!("Skipping malformed skeleton record {}: {}", i, e);
                    None
                }
            },
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Connection, TemplateKeypoint};

    fn template(id: &str, name: &str) -> SkeletonTemplate {
        SkeletonTemplate::new(
            EntityId::new(id),
            name,
            vec![
                TemplateKeypoint {
                    id: EntityId::new("a"),
                    x: 0.1,
                    y: 0.2,
                    name: "KP 1".into(),
                },
                TemplateKeypoint {
                    id: EntityId::new("b"),
                    x: 0.3,
                    y: 0.4,
                    name: "KP 2".into(),
                },
            ],
            vec![Connection::new(EntityId::new("a"), EntityId::new("b"))],
        )
    }

    fn library() -> SkeletonLibrary<MemoryStore> {
        SkeletonLibrary::new(MemoryStore::new())
    }

    #[test]
    fn test_empty_library_loads_empty() {
        assert!(library().load().is_empty());
    }

    #[test]
    fn test_corrupt_slot_loads_empty() {
        let mut store = MemoryStore::new();
        store.write(TEMPLATES_KEY, "{not json").unwrap();
        assert!(SkeletonLibrary::new(store).load().is_empty());
    }

    #[test]
    fn test_malformed_record_is_skipped() {
        let mut store = MemoryStore::new();
        store
            .write(
                TEMPLATES_KEY,
                r#"[{"id": "ok", "name": "arm"}, {"name": 3}]"#,
            )
            .unwrap();
        let loaded = SkeletonLibrary::new(store).load();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "arm");
        assert!(loaded[0].keypoints.is_empty());
    }

    #[test]
    fn test_save_upserts_by_id() {
        let mut lib = library();
        lib.save(template("t1", "arm")).unwrap();
        lib.save(template("t2", "leg")).unwrap();
        let list = lib.save(template("t1", "left arm")).unwrap();

        assert_eq!(list.len(), 2);
        assert_eq!(list[0].name, "leg");
        assert_eq!(list[1].name, "left arm");
        assert_eq!(lib.load(), list);
        assert_eq!(lib.get(&EntityId::new("t1")).map(|t| t.name), Some("left arm".into()));
    }

    #[test]
    fn test_save_without_name_is_rejected() {
        let mut lib = library();
        assert!(matches!(
            lib.save(template("t1", "  ")),
            Err(StoreError::MissingName)
        ));
        assert!(lib.store().read(TEMPLATES_KEY).unwrap().is_none());
    }

    #[test]
    fn test_unparsed_records_survive_writes() {
        let mut store = MemoryStore::new();
        store
            .write(TEMPLATES_KEY, r#"[{"name": 3, "note": "keep me"}]"#)
            .unwrap();
        let mut lib = SkeletonLibrary::new(store);

        assert_eq!(lib.save(template("t1", "arm")).unwrap().len(), 1);
        lib.save(template("t2", "leg")).unwrap();
        lib.delete(&EntityId::new("t1")).unwrap();

        let raw = lib.store().read(TEMPLATES_KEY).unwrap().unwrap();
        let records: Vec<serde_json::Value> = serde_json::from_str(&raw).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["note"], "keep me");
        assert_eq!(records[1]["id"], "t2");
        assert_eq!(lib.load().len(), 1);
    }

    #[test]
    fn test_delete() {
        let mut lib = library();
        lib.save(template("t1", "arm")).unwrap();
        assert!(lib.delete(&EntityId::new("t1")).unwrap().is_empty());
        assert!(matches!(
            lib.delete(&EntityId::new("t1")),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_file_store_round_trip() {
        let dir = std::env::temp_dir().join(format!("pixelsuite-store-{}", uuid::Uuid::new_v4()));
        let mut lib = SkeletonLibrary::new(FileStore::new(&dir));
        assert!(lib.load().is_empty());

        lib.save(template("t1", "arm")).unwrap();
        assert!(lib.store().path_for(TEMPLATES_KEY).exists());

        let reopened = SkeletonLibrary::new(FileStore::new(&dir));
        assert_eq!(reopened.load(), vec![template("t1", "arm")]);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
