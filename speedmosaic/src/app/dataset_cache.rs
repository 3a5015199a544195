use crate::model::{
    link::{GeometryStore, LinkFieldNames},
    DatasetError,
};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::SystemTime,
};

type CacheKey = (PathBuf, Option<SystemTime>);
type CacheSlot = Arc<Mutex<Option<Arc<GeometryStore>>>>;

/// shares loaded link datasets between jobs. entries are keyed by path and
/// modification time, so an edited file is reloaded, and each key is loaded by at
/// most one caller at a time while others wait for its result.
#[derive(Debug, Default)]
pub struct DatasetCache {
    fields: LinkFieldNames,
    slots: Mutex<HashMap<CacheKey, CacheSlot>>,
}

impl DatasetCache {
    pub fn new(fields: LinkFieldNames) -> DatasetCache {
        DatasetCache {
            fields,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn geometry(&self, path: &Path) -> Result<Arc<GeometryStore>, DatasetError> {
        let filename = path.to_string_lossy().to_string();
        let metadata = std::fs::metadata(path)
            .map_err(|_| DatasetError::DatasetNotFound(filename.clone()))?;
        let key: CacheKey = (path.to_path_buf(), metadata.modified().ok());
        let poisoned = || {
            DatasetError::ReadError(
                filename.clone(),
                String::from("dataset cache lock poisoned"),
            )
        };

        let slot = {
            let mut slots = self.slots.lock().map_err(|_| poisoned())?;
            slots.retain(|(p, modified), _| p != &key.0 || *modified == key.1);
            slots.entry(key.clone()).or_default().clone()
        };
        let mut entry = match slot.lock() {
            Ok(entry) => entry,
            Err(e) => {
                // a load panicked while holding the slot; it never stored a value
                log::warn!("recovering link dataset cache entry for {filename}");
                slot.clear_poison();
                e.into_inner()
            }
        };
        if let Some(store) = entry.as_ref() {
            log::debug!("using cached link dataset {filename}");
            return Ok(store.clone());
        }
        match GeometryStore::load(path, &self.fields) {
            Ok(store) => {
                let store = Arc::new(store);
                *entry = Some(store.clone());
                Ok(store)
            }
            Err(e) => {
                drop(entry);
                self.evict(&key, &slot);
                Err(e)
            }
        }
    }

    /// removes the slot of a failed load unless a newer slot replaced it.
    fn evict(&self, key: &CacheKey, slot: &CacheSlot) {
        if let Ok(mut slots) = self.slots.lock() {
            if slots.get(key).is_some_and(|s| Arc::ptr_eq(s, slot)) {
                slots.remove(key);
            }
        }
    }

    /// the entry a load of `path` would use. holding its lock stalls that load.
    #[cfg(test)]
    pub(crate) fn entry_for(&self, path: &Path) -> CacheSlot {
        let modified = std::fs::metadata(path).and_then(|m| m.modified()).ok();
        let mut slots = self.slots.lock().expect("test invariant failed: cache lock");
        slots
            .entry((path.to_path_buf(), modified))
            .or_default()
            .clone()
    }

    /// number of datasets currently loaded
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .map(|slots| {
                slots
                    .values()
                    .filter(|s| s.try_lock().map(|e| e.is_some()).unwrap_or(false))
                    .count()
            })
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
