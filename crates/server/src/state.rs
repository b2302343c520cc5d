use std::{
    path::PathBuf,
    sync::atomic::{AtomicU64, Ordering},
};

use transito::{import::ImportManager, repository::Repository};

pub struct AppState {
    pub repository: Repository,
    pub imports: ImportManager,
    pub downloads: Downloads,
}

/// Hands out a fresh file for every feed fetched by URL, next to the database.
/// A new download never truncates a file an earlier import is still reading.
pub struct Downloads {
    base: PathBuf,
    next: AtomicU64,
}

impl Downloads {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            next: AtomicU64::new(1),
        }
    }

    pub fn next_path(&self) -> PathBuf {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        self.base
            .with_extension(format!("download-{}-{n}.zip", std::process::id()))
    }
}

#[test]
fn download_paths_are_unique_test() {
    let downloads = Downloads::new("/data/transito.db");
    let first = downloads.next_path();
    let second = downloads.next_path();

    assert_ne!(first, second);
    for path in [&first, &second] {
        assert_eq!(path.parent(), Some(std::path::Path::new("/data")));
        assert_eq!(path.extension().and_then(|ext| ext.to_str()), Some("zip"));
    }
    assert!(first.to_string_lossy().starts_with("/data/transito.download-"));
}
