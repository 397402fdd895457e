//! Local disk filesystem.

use bytes::Bytes;
use sluice_core::{DatasetError, Result};
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

use crate::path::{StoragePath, DEFAULT_PROTOCOL};
use crate::{FileSystem, FindOptions};

/// Filesystem over the local disk.
///
/// Paths are used as given (relative paths resolve against the working
/// directory), so listings keep the same prefix as the root they came from.
#[derive(Debug, Clone, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for LocalFileSystem {
    fn protocol(&self) -> &str {
        DEFAULT_PROTOCOL
    }

    fn find(&self, root: &str, options: &FindOptions) -> Result<Vec<String>> {
        let root = self.strip_protocol(root);
        let root_path = Path::new(&root);
        if !root_path.exists() {
            debug!(root = %root, "find on missing root");
            return Ok(Vec::new());
        }
        if root_path.is_file() {
            return Ok(vec![root]);
        }

        let mut walker = WalkDir::new(root_path).min_depth(1);
        if let Some(depth) = options.maxdepth {
            walker = walker.max_depth(depth);
        }

        let mut found = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| DatasetError::io(root.clone(), e.into()))?;
            let file_type = entry.file_type();
            if file_type.is_file() || (options.withdirs && file_type.is_dir()) {
                found.push(entry.path().to_string_lossy().into_owned());
            }
        }
        found.sort();
        Ok(found)
    }

    fn exists(&self, path: &str) -> Result<bool> {
        Ok(Path::new(&self.strip_protocol(path)).exists())
    }

    fn remove_recursive(&self, path: &str) -> Result<()> {
        let stripped = self.strip_protocol(path);
        let target = Path::new(&stripped);
        let removed = if target.is_dir() {
            std::fs::remove_dir_all(target)
        } else {
            std::fs::remove_file(target)
        };
        removed.map_err(|e| DatasetError::io(stripped.clone(), e))?;
        debug!(path = %stripped, "removed");
        Ok(())
    }

    fn strip_protocol(&self, path: &str) -> String {
        StoragePath::strip_for(path, DEFAULT_PROTOCOL, self.sep())
    }

    fn read(&self, path: &str) -> Result<Bytes> {
        let stripped = self.strip_protocol(path);
        std::fs::read(&stripped)
            .map(Bytes::from)
            .map_err(|e| DatasetError::io(stripped, e))
    }

    fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        let stripped = self.strip_protocol(path);
        let target = Path::new(&stripped);
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| DatasetError::io(parent.to_string_lossy(), e))?;
        }
        std::fs::write(target, data).map_err(|e| DatasetError::io(stripped.clone(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root_of(dir: &tempfile::TempDir) -> String {
        dir.path().to_string_lossy().into_owned()
    }

    #[test]
    fn test_find_lists_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let root = root_of(&dir);
        let fs = LocalFileSystem::new();
        fs.write(&format!("{root}/b.csv"), b"b").unwrap();
        fs.write(&format!("{root}/a.csv"), b"a").unwrap();
        fs.write(&format!("{root}/nested/c.txt"), b"c").unwrap();

        let found = fs.find(&root, &FindOptions::default()).unwrap();
        assert_eq!(
            found,
            vec![
                format!("{root}/a.csv"),
                format!("{root}/b.csv"),
                format!("{root}/nested/c.txt"),
            ]
        );

        let shallow = fs
            .find(&root, &FindOptions::default().with_maxdepth(1))
            .unwrap();
        assert_eq!(shallow.len(), 2);

        let with_dirs = fs.find(&root, &FindOptions::default().with_dirs()).unwrap();
        assert!(with_dirs.contains(&format!("{root}/nested")));
    }

    #[test]
    fn test_find_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFileSystem::new();
        let found = fs
            .find(&format!("{}/absent", root_of(&dir)), &FindOptions::default())
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_file_scheme_is_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let root = root_of(&dir);
        let fs = LocalFileSystem::new();
        fs.write(&format!("file://{root}/x.txt"), b"x").unwrap();
        assert!(fs.exists(&format!("{root}/x.txt")).unwrap());
        assert_eq!(fs.read(&format!("file://{root}/x.txt")).unwrap(), Bytes::from_static(b"x"));
    }

    #[test]
    fn test_read_missing() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFileSystem::new();
        let err = fs.read(&format!("{}/nope", root_of(&dir))).unwrap_err();
        assert!(err.is_missing());
    }

    #[test]
    fn test_remove_recursive() {
        let dir = tempfile::tempdir().unwrap();
        let root = root_of(&dir);
        let fs = LocalFileSystem::new();
        fs.write(&format!("{root}/parts/a/b.txt"), b"b").unwrap();
        fs.remove_recursive(&format!("{root}/parts")).unwrap();
        assert!(!fs.exists(&format!("{root}/parts")).unwrap());
    }
}
