//! StateStore: redb-backed persistence for okctl.
//!
//! One database file per cluster, `<data_dir>/<cluster_name>.redb`. The
//! file is opened, used and closed inside every call; no handle is held
//! between calls. Opens of the same file within this process are
//! serialized, since redb refuses a second concurrent open.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::{self, Table};

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

#[derive(Clone)]
enum Backend {
    Dir {
        root: PathBuf,
        locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
    },
    /// In-memory databases per cluster; kept open for the life of the store.
    Memory(Arc<Mutex<HashMap<String, Arc<Database>>>>),
}

/// Thread-safe handle to the okctl state directory.
#[derive(Clone)]
pub struct StateStore {
    backend: Backend,
}

impl StateStore {
    /// Use `root` as the state directory, creating it if needed.
    pub fn open(root: &Path) -> StateResult<Self> {
        std::fs::create_dir_all(root).map_err(map_err!(Open))?;
        debug!(?root, "state directory ready");
        Ok(Self {
            backend: Backend::Dir {
                root: root.to_path_buf(),
                locks: Arc::default(),
            },
        })
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        debug!("in-memory state store opened");
        Ok(Self {
            backend: Backend::Memory(Arc::default()),
        })
    }

    /// Database file backing `cluster_name`, if the store is on disk.
    pub fn path_for(&self, cluster_name: &str) -> Option<PathBuf> {
        match &self.backend {
            Backend::Dir { root, .. } => Some(root.join(format!("{cluster_name}.redb"))),
            Backend::Memory(_) => None,
        }
    }

    /// Run `f` against the cluster's database, opened for this call only.
    fn with_db<T>(
        &self,
        cluster_name: &str,
        f: impl FnOnce(&Database) -> StateResult<T>,
    ) -> StateResult<T> {
        check_cluster_name(cluster_name)?;
        match &self.backend {
            Backend::Dir { root, locks } => {
                let lock = locks
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .entry(cluster_name.to_string())
                    .or_default()
                    .clone();
                let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
                let path = root.join(format!("{cluster_name}.redb"));
                let db = Database::create(&path).map_err(map_err!(Open))?;
                ensure_tables(&db)?;
                let out = f(&db);
                drop(db);
                out
            }
            Backend::Memory(dbs) => {
                let db = {
                    let mut dbs = dbs.lock().unwrap_or_else(PoisonError::into_inner);
                    match dbs.get(cluster_name) {
                        Some(db) => db.clone(),
                        None => {
                            let backend = redb::backends::InMemoryBackend::new();
                            let db = Database::builder()
                                .create_with_backend(backend)
                                .map_err(map_err!(Open))?;
                            ensure_tables(&db)?;
                            let db = Arc::new(db);
                            dbs.insert(cluster_name.to_string(), db.clone());
                            db
                        }
                    }
                };
                f(&db)
            }
        }
    }

    /// Get the raw value stored under `key`.
    pub fn get(&self, cluster_name: &str, table: Table, key: &str) -> StateResult<Option<Vec<u8>>> {
        self.with_db(cluster_name, |db| {
            let txn = db.begin_read().map_err(map_err!(Transaction))?;
            let table = txn.open_table(table).map_err(map_err!(Table))?;
            let value = table.get(key).map_err(map_err!(Read))?.map(|g| g.value().to_vec());
            Ok(value)
        })
    }

    /// All rows of a table, ordered by key.
    pub fn scan(&self, cluster_name: &str, table: Table) -> StateResult<Vec<(String, Vec<u8>)>> {
        self.with_db(cluster_name, |db| {
            let txn = db.begin_read().map_err(map_err!(Transaction))?;
            let table = txn.open_table(table).map_err(map_err!(Table))?;
            let mut rows = Vec::new();
            for entry in table.iter().map_err(map_err!(Read))? {
                let (key, value) = entry.map_err(map_err!(Read))?;
                rows.push((key.value().to_string(), value.value().to_vec()));
            }
            Ok(rows)
        })
    }

    /// Read-modify-write of one row inside a single write transaction.
    ///
    /// `f` receives the current value and returns the value to write, or
    /// `None` to leave the row untouched. Returns whether a write happened.
    pub fn update<F>(&self, cluster_name: &str, table: Table, key: &str, f: F) -> StateResult<bool>
    where
        F: FnOnce(Option<Vec<u8>>) -> StateResult<Option<Vec<u8>>>,
    {
        self.with_db(cluster_name, |db| {
            let txn = db.begin_write().map_err(map_err!(Transaction))?;
            let written;
            {
                let mut table = txn.open_table(table).map_err(map_err!(Table))?;
                let current = table.get(key).map_err(map_err!(Read))?.map(|g| g.value().to_vec());
                match f(current)? {
                    Some(value) => {
                        table
                            .insert(key, value.as_slice())
                            .map_err(map_err!(Write))?;
                        written = true;
                    }
                    None => written = false,
                }
            }
            txn.commit().map_err(map_err!(Transaction))?;
            Ok(written)
        })
    }

    /// Remove a row. Returns true if it existed.
    pub fn remove(&self, cluster_name: &str, table: Table, key: &str) -> StateResult<bool> {
        self.with_db(cluster_name, |db| {
            let txn = db.begin_write().map_err(map_err!(Transaction))?;
            let existed;
            {
                let mut table = txn.open_table(table).map_err(map_err!(Table))?;
                existed = table.remove(key).map_err(map_err!(Write))?.is_some();
            }
            txn.commit().map_err(map_err!(Transaction))?;
            debug!(%key, existed, "row removed");
            Ok(existed)
        })
    }
}

/// Create all tables if they don't exist yet.
fn ensure_tables(db: &Database) -> StateResult<()> {
    let txn = db.begin_write().map_err(map_err!(Transaction))?;
    for table in tables::ALL {
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(table).map_err(map_err!(Table))?;
    }
    txn.commit().map_err(map_err!(Transaction))?;
    Ok(())
}

/// The cluster name becomes a file name; keep it to one path segment.
fn check_cluster_name(cluster_name: &str) -> StateResult<()> {
    let ok = !cluster_name.is_empty()
        && cluster_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(StateError::Open(format!("invalid cluster name {cluster_name:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::{CERTIFICATES, VPCS};

    fn put(store: &StateStore, cluster: &str, key: &str, value: &[u8]) {
        let value = value.to_vec();
        store
            .update(cluster, CERTIFICATES, key, |_| Ok(Some(value)))
            .unwrap();
    }

    #[test]
    fn put_and_get() {
        let store = StateStore::open_in_memory().unwrap();
        put(&store, "okctl-staging", "argocd.okctl.io", b"cert");
        assert_eq!(
            store.get("okctl-staging", CERTIFICATES, "argocd.okctl.io").unwrap(),
            Some(b"cert".to_vec())
        );
        assert!(store.get("okctl-staging", VPCS, "argocd.okctl.io").unwrap().is_none());
    }

    #[test]
    fn clusters_are_isolated() {
        let store = StateStore::open_in_memory().unwrap();
        put(&store, "okctl-staging", "a", b"1");
        put(&store, "okctl-prod", "b", b"2");
        assert_eq!(store.scan("okctl-staging", CERTIFICATES).unwrap().len(), 1);
        assert!(store.get("okctl-prod", CERTIFICATES, "a").unwrap().is_none());
    }

    #[test]
    fn update_can_decline_to_write() {
        let store = StateStore::open_in_memory().unwrap();
        let written = store
            .update("okctl-staging", CERTIFICATES, "a", |current| {
                assert!(current.is_none());
                Ok(None)
            })
            .unwrap();
        assert!(!written);
        assert!(store.scan("okctl-staging", CERTIFICATES).unwrap().is_empty());
    }

    #[test]
    fn remove_reports_existence() {
        let store = StateStore::open_in_memory().unwrap();
        put(&store, "okctl-staging", "a", b"1");
        assert!(store.remove("okctl-staging", CERTIFICATES, "a").unwrap());
        assert!(!store.remove("okctl-staging", CERTIFICATES, "a").unwrap());
    }

    #[test]
    fn scan_is_ordered_by_key() {
        let store = StateStore::open_in_memory().unwrap();
        for key in ["c", "a", "b"] {
            put(&store, "okctl-staging", key, key.as_bytes());
        }
        let keys: Vec<String> = store
            .scan("okctl-staging", CERTIFICATES)
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, ["a", "b", "c"]);
    }

    #[test]
    fn rejects_path_like_cluster_names() {
        let store = StateStore::open_in_memory().unwrap();
        assert!(store.get("../etc", CERTIFICATES, "a").is_err());
        assert!(store.get("", CERTIFICATES, "a").is_err());
    }

    #[test]
    fn persistence_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = StateStore::open(dir.path()).unwrap();
            put(&store, "okctl-staging", "argocd.okctl.io", b"cert");
        }

        let store = StateStore::open(dir.path()).unwrap();
        let path = store.path_for("okctl-staging").unwrap();
        assert!(path.exists());
        assert_eq!(
            store.get("okctl-staging", CERTIFICATES, "argocd.okctl.io").unwrap(),
            Some(b"cert".to_vec())
        );
    }

    #[test]
    fn file_is_closed_between_calls() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::open(dir.path()).unwrap();
        put(&store, "okctl-staging", "a", b"1");

        // a second handle can open the same file once the call returned
        let other = StateStore::open(dir.path()).unwrap();
        put(&other, "okctl-staging", "b", b"2");
        assert_eq!(store.scan("okctl-staging", CERTIFICATES).unwrap().len(), 2);
    }
}
