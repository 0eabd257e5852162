//! Writing generated files into a per-run project directory

use crate::fs::FileSystem;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error("no generated files to deploy")]
    NothingToDeploy,

    #[error("generated files do not include {0}")]
    MissingEntryFile(String),

    #[error("unsafe file path {0:?}: must be relative and stay inside the project")]
    UnsafePath(String),

    #[error("failed to create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// `project_{requester}_{YYYYmmdd_HHMMSS_mmm}`
pub fn project_dir_name(requester_id: &str, now: DateTime<Utc>) -> String {
    format!("project_{}_{}", requester_id, now.format("%Y%m%d_%H%M%S_%3f"))
}

/// Rejects keys that could escape the project directory
pub fn check_relative_path(key: &str) -> Result<&Path, DeploymentError> {
    let path = Path::new(key);
    let safe = !key.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        && path.components().any(|c| matches!(c, Component::Normal(_)));

    if safe {
        Ok(path)
    } else {
        Err(DeploymentError::UnsafePath(key.to_string()))
    }
}

/// Writes every file under `projects_dir/dir_name`, a directory that must not exist yet
///
/// All keys are checked before anything is written. A write failure stops the
/// deployment but leaves files already written in place.
pub fn write_project(
    fs: &dyn FileSystem,
    projects_dir: &Path,
    dir_name: &str,
    files: &BTreeMap<String, String>,
    entry_file: &str,
) -> Result<PathBuf, DeploymentError> {
    if files.is_empty() {
        return Err(DeploymentError::NothingToDeploy);
    }
    if !files.contains_key(entry_file) {
        return Err(DeploymentError::MissingEntryFile(entry_file.to_string()));
    }
    let relative: Vec<(&Path, &String)> = files
        .iter()
        .map(|(key, content)| Ok((check_relative_path(key)?, content)))
        .collect::<Result<_, DeploymentError>>()?;

    fs.create_dir_all(projects_dir)
        .map_err(|source| DeploymentError::CreateDir {
            path: projects_dir.to_path_buf(),
            source,
        })?;

    let project_dir = projects_dir.join(dir_name);
    fs.create_dir(&project_dir)
        .map_err(|source| DeploymentError::CreateDir {
            path: project_dir.clone(),
            source,
        })?;

    for (path, content) in relative {
        let target = project_dir.join(path);
        if let Some(parent) = target.parent() {
            if parent != project_dir {
                fs.create_dir_all(parent)
                    .map_err(|source| DeploymentError::CreateDir {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }
        }
        fs.write(&target, content)
            .map_err(|source| DeploymentError::Write {
                path: target.clone(),
                source,
            })?;
    }

    Ok(project_dir)
}

/// Web path of the entry file, e.g. `/static/projects/<dir>/index.html`
pub fn deployment_url(url_prefix: &str, dir_name: &str, entry_file: &str) -> String {
    format!("{}/{}/{}", url_prefix.trim_end_matches('/'), dir_name, entry_file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{MockFileSystem, RealFileSystem};
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn bundle() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("index.html".to_string(), "<html>🐍</html>".to_string()),
            ("js/game.js".to_string(), "let x = 1;\n".to_string()),
        ])
    }

    #[test]
    fn test_project_dir_name() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap()
            + chrono::Duration::milliseconds(42);
        assert_eq!(project_dir_name("u1", now), "project_u1_20240305_140709_042");
    }

    #[test]
    fn test_check_relative_path() {
        assert!(check_relative_path("index.html").is_ok());
        assert!(check_relative_path("assets/img/a.png").is_ok());
        assert!(check_relative_path("./styles.css").is_ok());
        assert!(check_relative_path("").is_err());
        assert!(check_relative_path(".").is_err());
        assert!(check_relative_path("/etc/passwd").is_err());
        assert!(check_relative_path("../escape.html").is_err());
        assert!(check_relative_path("a/../../b").is_err());
    }

    #[test]
    fn test_deployment_url() {
        assert_eq!(
            deployment_url("/static/projects/", "project_u1_x", "index.html"),
            "/static/projects/project_u1_x/index.html"
        );
    }

    #[test]
    fn test_write_project_round_trip() {
        let temp = TempDir::new().unwrap();
        let fs = RealFileSystem;
        let files = bundle();

        let dir = write_project(&fs, temp.path(), "project_u1_1", &files, "index.html").unwrap();

        for (key, content) in &files {
            let on_disk = std::fs::read(dir.join(key)).unwrap();
            assert_eq!(on_disk, content.as_bytes());
        }
    }

    #[test]
    fn test_write_project_never_reuses_dir() {
        let temp = TempDir::new().unwrap();
        let fs = RealFileSystem;
        write_project(&fs, temp.path(), "same", &bundle(), "index.html").unwrap();

        let err = write_project(&fs, temp.path(), "same", &bundle(), "index.html").unwrap_err();
        assert!(matches!(err, DeploymentError::CreateDir { .. }));
    }

    #[test]
    fn test_unsafe_key_writes_nothing() {
        let fs = MockFileSystem::new();
        let mut files = bundle();
        files.insert("../x.html".to_string(), "x".to_string());

        let err = write_project(&fs, Path::new("/out"), "p", &files, "index.html").unwrap_err();
        assert!(matches!(err, DeploymentError::UnsafePath(_)));
        assert_eq!(fs.file_count(), 0);
    }

    #[test]
    fn test_missing_entry_file() {
        let fs = MockFileSystem::new();
        let files = BTreeMap::from([("game.js".to_string(), "x".to_string())]);
        let err = write_project(&fs, Path::new("/out"), "p", &files, "index.html").unwrap_err();
        assert!(matches!(err, DeploymentError::MissingEntryFile(_)));
    }

    #[test]
    fn test_write_failure_keeps_written_files() {
        let fs = MockFileSystem::new();
        fs.fail_writes_to("game.js");

        let err = write_project(&fs, Path::new("/out"), "p", &bundle(), "index.html").unwrap_err();
        assert!(matches!(err, DeploymentError::Write { .. }));
        assert_eq!(
            fs.read_to_string(Path::new("/out/p/index.html")).unwrap(),
            "<html>🐍</html>"
        );
    }
}
