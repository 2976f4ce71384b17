use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use super::error::DataResult;
use super::loader::load_file;
use super::model::Dataset;
use super::normalize::NormalizeRules;

/// Identity of the file a cached dataset was read from. A change in any part
/// means the file was rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Fingerprint {
    path: PathBuf,
    modified: Option<SystemTime>,
    len: u64,
}

impl Fingerprint {
    fn of(path: &Path) -> DataResult<Self> {
        let meta = std::fs::metadata(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

/// Lazily loaded copy of the default dataset.
///
/// The first [`DatasetCache::get`] reads the file; later calls return the same
/// `Arc` until the file changes on disk, the path changes, or
/// [`DatasetCache::invalidate`] is called.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entry: Option<(Fingerprint, Arc<Dataset>)>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, path: &Path, rules: &NormalizeRules) -> DataResult<Arc<Dataset>> {
        let fingerprint = match Fingerprint::of(path) {
            Ok(fp) => fp,
            Err(e) => {
                self.entry = None;
                return Err(e);
            }
        };

        if let Some((cached, dataset)) = &self.entry {
            if *cached == fingerprint {
                log::debug!("default dataset served from cache: {}", path.display());
                return Ok(Arc::clone(dataset));
            }
        }

        let dataset = Arc::new(load_file(path, rules)?);
        log::info!(
            "loaded {} records with columns {:?} from {}",
            dataset.len(),
            dataset.columns(),
            path.display()
        );
        self.entry = Some((fingerprint, Arc::clone(&dataset)));
        Ok(dataset)
    }

    /// Drop the cached copy so the next `get` reads the file again.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    #[cfg(test)]
    pub fn is_loaded(&self) -> bool {
        self.entry.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::error::DataError;
    use std::io::Write;

    fn write_csv(path: &Path, body: &str) {
        let mut f = std::fs::File::create(path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
    }

    #[test]
    fn second_get_reuses_loaded_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("observers.csv");
        write_csv(&path, "Name\nSat-A\n");

        let mut cache = DatasetCache::new();
        let rules = NormalizeRules::default();
        let first = cache.get(&path, &rules).unwrap();
        let second = cache.get(&path, &rules).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn rewritten_file_is_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("observers.csv");
        write_csv(&path, "Name\nSat-A\n");

        let mut cache = DatasetCache::new();
        let rules = NormalizeRules::default();
        assert_eq!(cache.get(&path, &rules).unwrap().len(), 1);

        // Different length, so the change is seen even with coarse mtimes.
        write_csv(&path, "Name\nSat-A\nSat-B\n");
        assert_eq!(cache.get(&path, &rules).unwrap().len(), 2);
    }

    #[test]
    fn invalidate_forces_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("observers.csv");
        write_csv(&path, "Name\nSat-A\n");

        let mut cache = DatasetCache::new();
        let rules = NormalizeRules::default();
        let first = cache.get(&path, &rules).unwrap();
        cache.invalidate();
        assert!(!cache.is_loaded());
        let second = cache.get(&path, &rules).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);
    }

    #[test]
    fn missing_file_clears_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("observers.csv");
        write_csv(&path, "Name\nSat-A\n");

        let mut cache = DatasetCache::new();
        let rules = NormalizeRules::default();
        cache.get(&path, &rules).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(cache.get(&path, &rules), Err(DataError::Io(_))));
        assert!(!cache.is_loaded());
    }
}
