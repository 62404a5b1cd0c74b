//! Locating the catalog export on disk.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use copydesk_shared::{CatalogConfig, CopydeskError, Result};

/// Where a catalog comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// An explicit export file.
    File(PathBuf),
    /// The most recently modified `.csv` in a directory.
    LatestIn(PathBuf),
}

impl CatalogSource {
    /// Pick the source from an optional CLI override and the `[catalog]` section.
    ///
    /// A directory given as override is scanned like `catalog.dir`.
    pub fn from_config(config: &CatalogConfig, override_path: Option<&Path>) -> Self {
        match override_path {
            Some(p) if p.is_dir() => Self::LatestIn(p.to_path_buf()),
            Some(p) => Self::File(p.to_path_buf()),
            None => match &config.path {
                Some(p) => Self::File(PathBuf::from(p)),
                None => Self::LatestIn(PathBuf::from(&config.dir)),
            },
        }
    }

    /// Resolve to a concrete file, or fail with `FileNotFound`.
    pub fn resolve(&self) -> Result<PathBuf> {
        match self {
            Self::File(path) if path.is_file() => Ok(path.clone()),
            Self::File(path) => Err(CopydeskError::file_not_found(path)),
            Self::LatestIn(dir) => latest_csv(dir),
        }
    }
}

impl std::fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(p) => write!(f, "{}", p.display()),
            Self::LatestIn(d) => write!(f, "newest CSV in {}", d.display()),
        }
    }
}

/// The most recently modified `.csv` file directly inside `dir`.
pub fn latest_csv(dir: &Path) -> Result<PathBuf> {
    if !dir.is_dir() {
        return Err(CopydeskError::file_not_found(dir));
    }

    let entries = std::fs::read_dir(dir).map_err(|e| CopydeskError::io(dir, e))?;

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for entry in entries {
        let entry = entry.map_err(|e| CopydeskError::io(dir, e))?;
        let path = entry.path();
        if !is_csv(&path) {
            continue;
        }
        let meta = entry.metadata().map_err(|e| CopydeskError::io(&path, e))?;
        if !meta.is_file() {
            continue;
        }
        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);

        // Ties go to the lexicographically larger name so the pick is stable.
        let newer = match &newest {
            None => true,
            Some((t, p)) => modified > *t || (modified == *t && path > *p),
        };
        if newer {
            newest = Some((modified, path));
        }
    }

    match newest {
        Some((_, path)) => {
            debug!(path = %path.display(), "selected newest catalog export");
            Ok(path)
        }
        None => Err(CopydeskError::file_not_found(dir)),
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;

    fn touch(path: &Path, age_secs: u64) {
        std::fs::write(path, "SKU,Name\n").expect("write");
        let when = SystemTime::now() - Duration::from_secs(age_secs);
        File::options()
            .write(true)
            .open(path)
            .expect("open")
            .set_modified(when)
            .expect("set mtime");
    }

    #[test]
    fn picks_most_recent_csv() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(&dir.path().join("export-old.csv"), 3600);
        touch(&dir.path().join("export-new.CSV"), 10);
        touch(&dir.path().join("notes.txt"), 0);

        let picked = latest_csv(dir.path()).expect("latest");
        assert_eq!(picked.file_name().unwrap(), "export-new.CSV");
    }

    #[test]
    fn empty_directory_is_file_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(&dir.path().join("readme.md"), 0);

        let err = latest_csv(dir.path()).unwrap_err();
        assert!(matches!(err, CopydeskError::FileNotFound { .. }));
    }

    #[test]
    fn missing_paths_are_file_not_found() {
        let missing = PathBuf::from("/definitely/not/here/catalog.csv");
        let err = CatalogSource::File(missing).resolve().unwrap_err();
        assert!(matches!(err, CopydeskError::FileNotFound { .. }));

        let err = CatalogSource::LatestIn(PathBuf::from("/definitely/not/here"))
            .resolve()
            .unwrap_err();
        assert!(matches!(err, CopydeskError::FileNotFound { .. }));
    }

    #[test]
    fn override_beats_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = CatalogConfig {
            dir: "unused".into(),
            path: Some("/srv/export.csv".into()),
        };

        assert_eq!(
            CatalogSource::from_config(&config, None),
            CatalogSource::File(PathBuf::from("/srv/export.csv"))
        );
        assert_eq!(
            CatalogSource::from_config(&config, Some(dir.path())),
            CatalogSource::LatestIn(dir.path().to_path_buf())
        );

        let config = CatalogConfig::default();
        assert_eq!(
            CatalogSource::from_config(&config, None),
            CatalogSource::LatestIn(PathBuf::from("data/product_data"))
        );
    }
}
