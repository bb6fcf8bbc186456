//! Materialising the bundled dataset asset into the data directory

use std::io::ErrorKind;
use std::path::Path;
use tempfile::NamedTempFile;
use crate::{Error, Result};

/// Copy `asset` to `target` unless `target` already exists.
///
/// Returns `true` when this call published the copy. The copy is staged in a
/// uniquely named file next to the target and linked into place without
/// overwriting, so concurrent starts never see a partial database and exactly
/// one of them wins. A failed copy removes its staging file.
pub fn materialize(asset: &Path, target: &Path) -> Result<bool> {
    if target.exists() {
        tracing::debug!("Reusing existing database {}", target.display());
        return Ok(false);
    }

    if !asset.is_file() {
        return Err(Error::init(asset, "bundled dataset asset not found"));
    }

    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    // Dropping `staging` on any early return deletes it.
    let mut staging = NamedTempFile::new_in(dir)?;
    let mut source = std::fs::File::open(asset)?;
    std::io::copy(&mut source, staging.as_file_mut())?;
    staging.as_file().sync_all()?;

    match staging.persist_noclobber(target) {
        Ok(_) => {
            tracing::info!("Materialized {} -> {}", asset.display(), target.display());
            Ok(true)
        }
        Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
            tracing::debug!("Another process materialized {} first", target.display());
            Ok(false)
        }
        Err(e) => Err(e.error.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copies_once() {
        let dir = tempfile::tempdir().unwrap();
        let asset = dir.path().join("asset.db");
        let target = dir.path().join("data").join("databases").join("app_database");
        std::fs::write(&asset, b"first").unwrap();

        assert!(materialize(&asset, &target).unwrap());
        assert_eq!(std::fs::read(&target).unwrap(), b"first");

        std::fs::write(&asset, b"second").unwrap();
        assert!(!materialize(&asset, &target).unwrap());
        assert_eq!(std::fs::read(&target).unwrap(), b"first");
    }

    #[test]
    fn test_missing_asset() {
        let dir = tempfile::tempdir().unwrap();
        let err = materialize(&dir.path().join("nope.db"), &dir.path().join("out.db")).unwrap_err();
        assert!(matches!(err, Error::Initialization { .. }));
        assert!(!dir.path().join("out.db").exists());
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_leaves_no_staging_files() {
        let dir = tempfile::tempdir().unwrap();
        let asset = dir.path().join("asset.db");
        let data = dir.path().join("databases");
        std::fs::write(&asset, b"dataset").unwrap();

        assert!(materialize(&asset, &data.join("app_database")).unwrap());
        assert_eq!(entries(&data), vec!["app_database"]);
    }

    #[test]
    fn test_concurrent_materialize_publishes_once() {
        const THREADS: usize = 8;
        let dir = tempfile::tempdir().unwrap();
        let asset = dir.path().join("asset.db");
        let data = dir.path().join("databases");
        let target = data.join("app_database");
        let contents = vec![7u8; 256 * 1024];
        std::fs::write(&asset, &contents).unwrap();

        let barrier = std::sync::Barrier::new(THREADS);
        let published: Vec<bool> = std::thread::scope(|s| {
            let workers: Vec<_> = (0..THREADS)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        materialize(&asset, &target).unwrap()
                    })
                })
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });

        assert_eq!(published.iter().filter(|p| **p).count(), 1);
        assert_eq!(std::fs::read(&target).unwrap(), contents);
        assert_eq!(entries(&data), vec!["app_database"]);
    }
}
