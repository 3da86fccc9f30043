use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use ron::ser::{to_string_pretty, PrettyConfig};
use tracing::{debug, info};

use crate::model::WatchedPrinter;
use crate::{targets, Error, StorageAction};

pub type WatchedSet = BTreeMap<Ipv4Addr, WatchedPrinter>;

pub trait WatchedStore: Send + Sync {
    fn list_watched(&self) -> Result<WatchedSet, Error>;

    fn upsert(&self, address: Ipv4Addr, entry: WatchedPrinter) -> Result<bool, Error>;

    /// Replaces an existing row; unknown addresses are left out.
    fn update(&self, address: Ipv4Addr, entry: WatchedPrinter) -> Result<bool, Error>;

    fn update_many(&self, entries: WatchedSet) -> Result<usize, Error> {
        let mut matched = 0;
        for (address, entry) in entries {
            if self.update(address, entry)? {
                matched += 1;
            }
        }
        Ok(matched)
    }

    fn delete(&self, address: Ipv4Addr) -> Result<bool, Error>;
}

#[derive(Debug)]
pub struct RonStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl RonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn path_label(&self) -> Option<String> {
        Some(self.path.display().to_string())
    }

    fn read(&self) -> Result<WatchedSet, Error> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Ok(WatchedSet::new());
            }
            Err(source) => {
                return Err(Error::StorageIo {
                    action: StorageAction::Load,
                    path: self.path_label(),
                    source,
                });
            }
        };
        if contents.trim().is_empty() {
            return Ok(WatchedSet::new());
        }
        ron::from_str(&contents).map_err(|error| Error::Ron {
            action: StorageAction::Load,
            path: self.path_label(),
            source: error.code,
        })
    }

    fn write(&self, watched: &WatchedSet) -> Result<(), Error> {
        let contents = to_string_pretty(watched, PrettyConfig::new()).map_err(|source| Error::Ron {
            action: StorageAction::Save,
            path: self.path_label(),
            source,
        })?;
        fs::write(&self.path, contents).map_err(|source| Error::StorageIo {
            action: StorageAction::Save,
            path: self.path_label(),
            source,
        })?;
        debug!(
            target: targets::STORAGE,
            path = %self.path.display(),
            count = watched.len(),
            "Watched printers saved"
        );
        Ok(())
    }

    fn modify<T>(&self, change: impl FnOnce(&mut WatchedSet) -> (T, bool)) -> Result<T, Error> {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        let mut watched = self.read()?;
        let (result, dirty) = change(&mut watched);
        if dirty {
            self.write(&watched)?;
        }
        Ok(result)
    }
}

impl WatchedStore for RonStore {
    fn list_watched(&self) -> Result<WatchedSet, Error> {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        self.read()
    }

    fn upsert(&self, address: Ipv4Addr, entry: WatchedPrinter) -> Result<bool, Error> {
        self.modify(|watched| {
            watched.insert(address, entry);
            (true, true)
        })?;
        info!(target: targets::STORAGE, address = %address, "Printer watched");
        Ok(true)
    }

    fn update(&self, address: Ipv4Addr, entry: WatchedPrinter) -> Result<bool, Error> {
        self.modify(|watched| match watched.get_mut(&address) {
            Some(existing) if *existing == entry => (true, false),
            Some(existing) => {
                *existing = entry;
                (true, true)
            }
            None => (false, false),
        })
    }

    fn update_many(&self, entries: WatchedSet) -> Result<usize, Error> {
        self.modify(|watched| {
            let mut matched = 0;
            let mut dirty = false;
            for (address, entry) in entries {
                if let Some(existing) = watched.get_mut(&address) {
                    matched += 1;
                    if *existing != entry {
                        *existing = entry;
                        dirty = true;
                    }
                }
            }
            (matched, dirty)
        })
    }

    fn delete(&self, address: Ipv4Addr) -> Result<bool, Error> {
        let removed = self.modify(|watched| {
            let removed = watched.remove(&address).is_some();
            (removed, removed)
        })?;
        if removed {
            info!(target: targets::STORAGE, address = %address, "Printer unwatched");
        }
        Ok(removed)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    watched: Mutex<WatchedSet>,
}

impl MemoryStore {
    pub fn with_entries(entries: impl IntoIterator<Item = (Ipv4Addr, WatchedPrinter)>) -> Self {
        Self {
            watched: Mutex::new(entries.into_iter().collect()),
        }
    }
}

impl WatchedStore for MemoryStore {
    fn list_watched(&self) -> Result<WatchedSet, Error> {
        Ok(self
            .watched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn upsert(&self, address: Ipv4Addr, entry: WatchedPrinter) -> Result<bool, Error> {
        self.watched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(address, entry);
        Ok(true)
    }

    fn update(&self, address: Ipv4Addr, entry: WatchedPrinter) -> Result<bool, Error> {
        let mut watched = self.watched.lock().unwrap_or_else(PoisonError::into_inner);
        match watched.get_mut(&address) {
            Some(existing) => {
                *existing = entry;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(&self, address: Ipv4Addr) -> Result<bool, Error> {
        Ok(self
            .watched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&address)
            .is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> WatchedPrinter {
        WatchedPrinter {
            name: name.to_string(),
            location: "Floor 1".to_string(),
            last_seen: None,
        }
    }

    #[test]
    fn missing_file_is_an_empty_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = RonStore::new(dir.path().join("watched.ron"));
        assert!(store.list_watched().expect("list").is_empty());
    }

    #[test]
    fn ron_store_crud() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("watched.ron");
        let store = RonStore::new(&path);
        let address = Ipv4Addr::new(192, 168, 1, 20);

        assert!(!store.update(address, entry("ghost")).expect("update"));
        assert!(store.upsert(address, entry("Reception")).expect("upsert"));
        assert!(store.update(address, entry("Front desk")).expect("update"));

        let reopened = RonStore::new(&path);
        let watched = reopened.list_watched().expect("list");
        assert_eq!(watched[&address].name, "Front desk");

        assert!(reopened.delete(address).expect("delete"));
        assert!(!reopened.delete(address).expect("delete again"));
        assert!(store.list_watched().expect("list").is_empty());
    }

    #[test]
    fn batch_update_touches_only_watched_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("watched.ron");
        let store = RonStore::new(&path);
        let kept = Ipv4Addr::new(192, 168, 1, 20);
        let unknown = Ipv4Addr::new(192, 168, 1, 21);
        store.upsert(kept, entry("Reception")).expect("upsert");

        let batch: WatchedSet = [(kept, entry("Front desk")), (unknown, entry("Stranger"))]
            .into_iter()
            .collect();
        assert_eq!(store.update_many(batch.clone()).expect("update"), 1);

        let watched = RonStore::new(&path).list_watched().expect("list");
        assert_eq!(watched.len(), 1);
        assert_eq!(watched[&kept].name, "Front desk");

        let memory = MemoryStore::with_entries([(kept, entry("Reception"))]);
        assert_eq!(memory.update_many(batch).expect("update"), 1);
        assert_eq!(memory.list_watched().expect("list")[&kept].name, "Front desk");
    }

    #[test]
    fn malformed_file_reports_ron_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("watched.ron");
        fs::write(&path, "{ not ron").expect("write");

        let error = RonStore::new(&path).list_watched().expect_err("malformed");
        assert!(matches!(
            error,
            Error::Ron {
                action: StorageAction::Load,
                ..
            }
        ));
    }

    #[test]
    fn memory_store_update_requires_existing_row() {
        let address = Ipv4Addr::new(10, 1, 1, 1);
        let store = MemoryStore::default();
        assert!(!store.update(address, entry("a")).expect("update"));
        store.upsert(address, entry("a")).expect("upsert");
        assert!(store.update(address, entry("b")).expect("update"));
        assert_eq!(store.list_watched().expect("list")[&address].name, "b");
    }
}
