use super::FileSystem;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// In-memory file system; writes can be made to fail for error-path tests
#[derive(Default)]
pub struct MockFileSystem {
    files: RwLock<HashMap<PathBuf, String>>,
    dirs: RwLock<HashSet<PathBuf>>,
    fail_writes_to: RwLock<Option<String>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Any write whose path ends with `file_name` returns a permission error
    pub fn fail_writes_to(&self, file_name: impl Into<String>) {
        *self.fail_writes_to.write().unwrap_or_else(|e| e.into_inner()) = Some(file_name.into());
    }

    pub fn file_count(&self) -> usize {
        self.files.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn contains_dir(&self, path: &Path) -> bool {
        self.dirs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(path)
    }
}

impl FileSystem for MockFileSystem {
    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut dirs = self.dirs.write().unwrap_or_else(|e| e.into_inner());
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            dirs.insert(current.clone());
        }
        Ok(())
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        let mut dirs = self.dirs.write().unwrap_or_else(|e| e.into_inner());
        if !dirs.insert(path.to_path_buf()) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", path.display()),
            ));
        }
        Ok(())
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        let fail = self
            .fail_writes_to
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if let Some(name) = fail {
            if path.ends_with(&name) {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    format!("cannot write {}", path.display()),
                ));
            }
        }

        self.files
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_round_trip() {
        let fs = MockFileSystem::new();
        fs.create_dir_all(Path::new("/out/p")).unwrap();
        fs.write(Path::new("/out/p/index.html"), "x").unwrap();

        assert!(fs.contains_dir(Path::new("/out")));
        assert_eq!(fs.read_to_string(Path::new("/out/p/index.html")).unwrap(), "x");
        assert_eq!(fs.file_count(), 1);
    }

    #[test]
    fn test_mock_injected_failure() {
        let fs = MockFileSystem::new();
        fs.fail_writes_to("README.md");

        assert!(fs.write(Path::new("/p/index.html"), "x").is_ok());
        let err = fs.write(Path::new("/p/README.md"), "x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_mock_create_dir_refuses_existing() {
        let fs = MockFileSystem::new();
        fs.create_dir(Path::new("/p")).unwrap();
        assert!(fs.create_dir(Path::new("/p")).is_err());
    }
}
