// Recursive file enumeration for a batch run.

use crate::error::{DaltonizeError, Result};
use log::debug;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Every regular file under `root`, depth-first, with each directory's entries
/// visited in file-name order and subdirectories inlined where they appear.
/// Symbolic links are followed, so a linked file or directory is listed under
/// the link's own path.
pub fn discover(root: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    let discovery_error = |source: io::Error| DaltonizeError::Discovery {
        path: root.to_path_buf(),
        source,
    };

    let metadata = std::fs::metadata(root).map_err(discovery_error)?;
    if !metadata.is_dir() {
        return Err(discovery_error(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a directory",
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| discovery_error(e.into()))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    debug!("discovered {} files under {}", files.len(), root.display());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn walks_depth_first_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("b/inner")).unwrap();
        fs::create_dir_all(root.join("d")).unwrap();
        for file in ["a.png", "b/x.png", "b/inner/y.txt", "c.png", "d/z.png"] {
            fs::write(root.join(file), b"").unwrap();
        }

        let found: Vec<PathBuf> = discover(root)
            .unwrap()
            .into_iter()
            .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        let expected: Vec<PathBuf> = ["a.png", "b/inner/y.txt", "b/x.png", "c.png", "d/z.png"]
            .iter()
            .map(PathBuf::from)
            .collect();
        assert_eq!(found, expected);
    }

    #[cfg(unix)]
    #[test]
    fn follows_symlinked_files_and_directories() {
        use std::os::unix::fs::symlink;

        let outside = tempfile::tempdir().unwrap();
        fs::create_dir_all(outside.path().join("shared")).unwrap();
        fs::write(outside.path().join("shared/glass.png"), b"").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("real.png"), b"").unwrap();
        symlink(root.join("real.png"), root.join("link.png")).unwrap();
        symlink(outside.path().join("shared"), root.join("shared")).unwrap();

        let found: Vec<PathBuf> = discover(root)
            .unwrap()
            .into_iter()
            .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        let expected: Vec<PathBuf> = ["link.png", "real.png", "shared/glass.png"]
            .iter()
            .map(PathBuf::from)
            .collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn empty_directory_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn missing_root_is_a_discovery_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover(dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, DaltonizeError::Discovery { .. }));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn file_root_is_a_discovery_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("single.png");
        fs::write(&file, b"").unwrap();
        assert!(matches!(discover(&file), Err(DaltonizeError::Discovery { .. })));
    }
}
