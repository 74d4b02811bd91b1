use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use thiserror::Error;
use walkdir::WalkDir;

/// Extensions the capture flow writes. Matching is exact: the capture
/// naming below always produces lowercase `jpg` or `png`, and anything
/// else in the directory is not part of the store.
pub const CAPTURE_EXTENSIONS: [&str; 2] = ["jpg", "png"];

/// Capture filename pattern, millisecond precision.
const CAPTURE_NAME_FORMAT: &str = "%Y-%m-%d-%H-%M-%S-%3f";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("unsupported photo extension: {path}")]
    UnsupportedExtension { path: String },
}

/// Default capture location: `Pictures/WorkGoodApp`, falling back to the
/// home directory on platforms without a pictures directory.
pub fn default_capture_dir() -> PathBuf {
    dirs::picture_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("WorkGoodApp")
}

/// Whether a path carries one of the capture extensions.
pub fn is_capture_image(path: &Path) -> bool {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => CAPTURE_EXTENSIONS.contains(&ext),
        None => false,
    }
}

/// Flat listing of the qualifying photos in a directory, in whatever
/// order the filesystem yields them. Callers must not assume the order
/// is chronological. A missing directory is an empty store.
pub fn list_images(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }

    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_capture_image(path))
        .collect()
}

/// The capture directory: every photo the capture flow has saved.
///
/// The directory is created on first import; until then it may simply
/// not exist, which every operation treats as an empty store.
pub struct CaptureStore {
    dir: PathBuf,
}

impl CaptureStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn list(&self) -> Vec<PathBuf> {
        list_images(&self.dir)
    }

    /// Copy a freshly captured photo into the store under a
    /// millisecond-timestamp name, creating the directory on first use.
    /// Same-millisecond imports get a numeric suffix.
    pub fn import(&self, source: &Path) -> Result<PathBuf, StoreError> {
        let ext = match source.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if CAPTURE_EXTENSIONS.contains(&ext) => ext,
            _ => {
                return Err(StoreError::UnsupportedExtension {
                    path: source.display().to_string(),
                });
            }
        };

        fs::create_dir_all(&self.dir)?;

        let stem = Local::now().format(CAPTURE_NAME_FORMAT).to_string();
        let mut dest = self.dir.join(format!("{}.{}", stem, ext));
        let mut n = 1;
        while dest.exists() {
            dest = self.dir.join(format!("{}-{}.{}", stem, n, ext));
            n += 1;
        }

        fs::copy(source, &dest)?;
        log::info!("Captured {} -> {}", source.display(), dest.display());
        Ok(dest)
    }

    /// Remove a photo the user rejected from the preview. Already-gone
    /// files are fine: the comparison pass may have beaten us to it.
    pub fn discard(&self, path: &Path) -> Result<bool, StoreError> {
        match fs::remove_file(path) {
            Ok(()) => {
                log::info!("Discarded {}", path.display());
                Ok(true)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(StoreError::Io(err)),
        }
    }

    /// Delete every captured photo, e.g. before taking a fresh baseline.
    /// Individual failures are logged and skipped. Returns how many files
    /// were actually removed.
    pub fn clear(&self) -> usize {
        let mut removed = 0;
        for path in self.list() {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(err) => log::warn!("Could not delete {}: {}", path.display(), err),
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn listing_is_flat_and_exact_on_extension() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("a.jpg"));
        touch(&dir.path().join("b.png"));
        touch(&dir.path().join("c.jpeg"));
        touch(&dir.path().join("d.JPG"));
        touch(&dir.path().join("e.txt"));
        touch(&dir.path().join("noext"));
        fs::create_dir(dir.path().join("nested")).unwrap();
        touch(&dir.path().join("nested").join("f.jpg"));

        let mut names: Vec<String> = list_images(dir.path())
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        names.sort();

        assert_eq!(names, vec!["a.jpg", "b.png"]);
    }

    #[test]
    fn missing_directory_lists_as_empty() {
        let dir = TempDir::new().unwrap();
        let gone = dir.path().join("never-created");
        assert!(list_images(&gone).is_empty());
    }

    #[test]
    fn import_names_by_timestamp_and_keeps_extension() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("shot.png");
        touch(&source);

        let store = CaptureStore::new(dir.path().join("captures"));
        let saved = store.import(&source).unwrap();

        assert!(saved.exists());
        let name = saved.file_name().unwrap().to_string_lossy().into_owned();
        // yyyy-mm-dd-hh-mm-ss-mmm.png
        assert_eq!(name.len(), 27);
        assert!(name.ends_with(".png"));
        assert!(
            name[..23].chars().all(|c| c.is_ascii_digit() || c == '-'),
            "unexpected name {}",
            name
        );
    }

    #[test]
    fn import_creates_the_directory_on_first_use() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("shot.jpg");
        touch(&source);

        let target = dir.path().join("deep").join("captures");
        let store = CaptureStore::new(&target);
        store.import(&source).unwrap();

        assert!(target.is_dir());
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn rapid_imports_produce_distinct_files() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("shot.jpg");
        touch(&source);

        let store = CaptureStore::new(dir.path().join("captures"));
        let first = store.import(&source).unwrap();
        let second = store.import(&source).unwrap();

        assert_ne!(first, second);
        assert_eq!(store.list().len(), 2);
    }

    #[test]
    fn import_rejects_unlisted_extensions() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("clip.gif");
        touch(&source);

        let store = CaptureStore::new(dir.path().join("captures"));
        let err = store.import(&source).unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedExtension { .. }));
    }

    #[test]
    fn discard_tolerates_missing_files() {
        let dir = TempDir::new().unwrap();
        let store = CaptureStore::new(dir.path());

        let photo = dir.path().join("a.jpg");
        touch(&photo);

        assert!(store.discard(&photo).unwrap());
        assert!(!photo.exists());
        assert!(!store.discard(&photo).unwrap());
    }

    #[test]
    fn clear_removes_only_capture_images() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("a.jpg"));
        touch(&dir.path().join("b.png"));
        touch(&dir.path().join(".history.jsonl"));
        touch(&dir.path().join("notes.txt"));

        let store = CaptureStore::new(dir.path());
        assert_eq!(store.clear(), 2);
        assert!(store.list().is_empty());
        assert!(dir.path().join(".history.jsonl").exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn default_capture_dir_ends_with_app_folder() {
        assert!(default_capture_dir().ends_with("WorkGoodApp"));
    }
}
