//! Shared name-set storage with file persistence and audit logging.
//!
//! One mutex guards the set for the full duration of each mutating
//! operation, including the database write and the audit append, so
//! concurrent mutations are serialized end-to-end. The database file always
//! reflects the last successful mutation: writes go through a temp file
//! renamed over the target, and a failed write rolls the in-memory change
//! back before the error is reported.

use chrono::Local;
use std::collections::BTreeSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;
use tracing::{info, trace, warn};

/// Result of a store operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreResult {
    /// Name inserted, persisted, and logged
    Added,
    /// ADD on a name already present; no side effects
    AlreadyExists,
    /// Name removed, persisted, and logged
    Deleted,
    /// DEL on an absent name; no side effects
    NotFound,
}

/// Store failures that surface as server errors
#[derive(Debug)]
pub enum StoreError {
    Load(PathBuf, std::io::Error),
    Persist(std::io::Error),
    Audit(std::io::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Load(path, e) => {
                write!(f, "Failed to load database file '{}': {}", path.display(), e)
            }
            StoreError::Persist(e) => write!(f, "Failed to persist database: {}", e),
            StoreError::Audit(e) => write!(f, "Failed to append audit log: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

/// The shared in-memory set of names plus its persistence targets
pub struct Store {
    /// The set; BTreeSet keeps iteration sorted for LIST and persistence
    names: Mutex<BTreeSet<String>>,
    /// Database file, one name per line, sorted
    db_path: PathBuf,
    /// Append-only audit log
    log_path: PathBuf,
}

impl Store {
    /// Open the store, loading the set from the database file.
    /// An absent file is created empty.
    pub fn open(
        db_path: impl Into<PathBuf>,
        log_path: impl Into<PathBuf>,
    ) -> Result<Arc<Self>, StoreError> {
        let db_path = db_path.into();
        let log_path = log_path.into();
        let names = load_names(&db_path)?;

        info!(
            count = names.len(),
            db = %db_path.display(),
            "Loaded name database"
        );

        Ok(Arc::new(Store {
            names: Mutex::new(names),
            db_path,
            log_path,
        }))
    }

    /// Sorted snapshot of all names
    pub fn list(&self) -> Vec<String> {
        let names = self.names.lock().unwrap();
        names.iter().cloned().collect()
    }

    /// Number of names currently held
    pub fn len(&self) -> usize {
        self.names.lock().unwrap().len()
    }

    /// Add a name: insert, persist the full set, append an ADD audit entry.
    ///
    /// A persist failure rolls the insert back so the prior on-disk state
    /// stays authoritative. An audit failure after a successful persist
    /// keeps the mutation (memory and database file agree) and reports the
    /// error to the caller.
    pub fn add(&self, name: &str) -> Result<StoreResult, StoreError> {
        let mut names = self.names.lock().unwrap();

        if !names.insert(name.to_string()) {
            return Ok(StoreResult::AlreadyExists);
        }

        if let Err(e) = self.persist(&names) {
            names.remove(name);
            warn!(name, error = %e, "Persist failed, rolling back add");
            return Err(StoreError::Persist(e));
        }

        self.append_audit("ADD", name).map_err(StoreError::Audit)?;

        trace!(name, count = names.len(), "Name added");
        Ok(StoreResult::Added)
    }

    /// Delete a name: remove, persist the reduced set, append a DEL audit
    /// entry. Symmetric to [`Store::add`], including rollback on a failed
    /// persist.
    pub fn delete(&self, name: &str) -> Result<StoreResult, StoreError> {
        let mut names = self.names.lock().unwrap();

        if !names.remove(name) {
            return Ok(StoreResult::NotFound);
        }

        if let Err(e) = self.persist(&names) {
            names.insert(name.to_string());
            warn!(name, error = %e, "Persist failed, rolling back delete");
            return Err(StoreError::Persist(e));
        }

        self.append_audit("DEL", name).map_err(StoreError::Audit)?;

        trace!(name, count = names.len(), "Name deleted");
        Ok(StoreResult::Deleted)
    }

    /// Write the whole set to the database file, one name per line, sorted.
    ///
    /// Goes through a temp file in the same directory and renames it over
    /// the target so no reader observes a partially written file.
    fn persist(&self, names: &BTreeSet<String>) -> std::io::Result<()> {
        let dir = match self.db_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir)?;
        for name in names {
            writeln!(tmp, "{}", name)?;
        }
        tmp.persist(&self.db_path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Append one audit entry: `[YYYY-MM-DD HH:MM:SS] <ACTION>: <name>`
    fn append_audit(&self, action: &str, name: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(file, "[{}] {}: {}", timestamp, action, name)
    }
}

/// Load the set from the database file, creating an empty file if absent.
/// Blank lines are skipped.
fn load_names(db_path: &Path) -> Result<BTreeSet<String>, StoreError> {
    if !db_path.exists() {
        fs::File::create(db_path).map_err(|e| StoreError::Load(db_path.to_path_buf(), e))?;
        return Ok(BTreeSet::new());
    }

    let contents = fs::read_to_string(db_path)
        .map_err(|e| StoreError::Load(db_path.to_path_buf(), e))?;

    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn open_store(dir: &Path) -> Arc<Store> {
        Store::open(dir.join("database.txt"), dir.join("logs.txt")).unwrap()
    }

    #[test]
    fn test_add_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());

        assert_eq!(store.add("Juan").unwrap(), StoreResult::Added);
        assert_eq!(store.add("Ana").unwrap(), StoreResult::Added);
        assert_eq!(store.list(), vec!["Ana", "Juan"]);
    }

    #[test]
    fn test_add_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());

        assert_eq!(store.add("Juan").unwrap(), StoreResult::Added);
        assert_eq!(store.add("Juan").unwrap(), StoreResult::AlreadyExists);
        assert_eq!(store.list(), vec!["Juan"]);
    }

    #[test]
    fn test_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());

        store.add("Juan").unwrap();
        assert_eq!(store.delete("Juan").unwrap(), StoreResult::Deleted);
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_delete_absent_leaves_set_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());

        store.add("Juan").unwrap();
        assert_eq!(store.delete("Ana").unwrap(), StoreResult::NotFound);
        assert_eq!(store.list(), vec!["Juan"]);
    }

    #[test]
    fn test_database_file_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());

        store.add("Juan").unwrap();
        store.add("Ana").unwrap();
        store.add("Pedro").unwrap();

        let contents = fs::read_to_string(dir.path().join("database.txt")).unwrap();
        assert_eq!(contents, "Ana\nJuan\nPedro\n");
    }

    #[test]
    fn test_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = open_store(dir.path());
            store.add("Juan").unwrap();
            store.add("Ana").unwrap();
            store.delete("Juan").unwrap();
        }

        let reloaded = open_store(dir.path());
        assert_eq!(reloaded.list(), vec!["Ana"]);
    }

    #[test]
    fn test_open_creates_missing_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("database.txt");
        assert!(!db_path.exists());

        let store = open_store(dir.path());
        assert!(db_path.exists());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_audit_log_format() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());

        store.add("Juan").unwrap();
        store.delete("Juan").unwrap();

        let log = fs::read_to_string(dir.path().join("logs.txt")).unwrap();
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("] ADD: Juan"));
        assert!(lines[1].ends_with("] DEL: Juan"));

        // Timestamps carry the fixed local format.
        for line in lines {
            let stamp = &line[1..line.find(']').unwrap()];
            chrono::NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S").unwrap();
        }
    }

    #[test]
    fn test_duplicate_add_writes_no_audit_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());

        store.add("Juan").unwrap();
        store.add("Juan").unwrap();
        store.delete("Ana").unwrap();

        let log = fs::read_to_string(dir.path().join("logs.txt")).unwrap();
        assert_eq!(log.lines().count(), 1);
    }

    #[test]
    fn test_persist_failure_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("data");
        fs::create_dir(&sub).unwrap();

        let store = Store::open(sub.join("database.txt"), sub.join("logs.txt")).unwrap();
        store.add("Ana").unwrap();

        // Removing the directory makes the temp-file write fail.
        fs::remove_dir_all(&sub).unwrap();

        let result = store.add("Juan");
        assert!(matches!(result, Err(StoreError::Persist(_))));
        assert_eq!(store.list(), vec!["Ana"]);
    }

    #[test]
    fn test_concurrent_adds_all_land() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());

        let handles: Vec<_> = ["Ana", "Juan", "Pedro", "Lucía", "Marta", "Diego"]
            .into_iter()
            .map(|name| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.add(name).unwrap())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), StoreResult::Added);
        }

        assert_eq!(store.len(), 6);

        // The persisted file agrees with memory after the dust settles.
        let reloaded = open_store(dir.path());
        assert_eq!(reloaded.list(), store.list());
    }
}
