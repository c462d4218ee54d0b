use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::{io_err, Result};

/// Remove everything inside `dir` but keep `dir` itself.
/// A missing directory is a no-op.
pub fn empty_dir(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }

    for entry in fs::read_dir(dir).map_err(io_err("list", dir))? {
        let path = entry.map_err(io_err("list", dir))?.path();
        if path.is_dir() {
            fs::remove_dir_all(&path).map_err(io_err("remove", &path))?;
        } else {
            fs::remove_file(&path).map_err(io_err("remove", &path))?;
        }
    }

    debug!(dir = %dir.display(), "emptied");
    Ok(())
}

/// Empty every directory sitting next to `keep` in its parent
pub fn empty_siblings(keep: &Path) -> Result<usize> {
    let Some(parent) = keep.parent() else {
        return Ok(0);
    };
    if !parent.is_dir() {
        return Ok(0);
    }

    let mut emptied = 0;
    for entry in fs::read_dir(parent).map_err(io_err("list", parent))? {
        let path = entry.map_err(io_err("list", parent))?.path();
        if path.is_dir() && path != keep {
            empty_dir(&path)?;
            emptied += 1;
        }
    }
    Ok(emptied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empties_files_and_nested_folders() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("Sent");
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("a.jpg"), "a").unwrap();
        fs::write(dir.join("nested/b.jpg"), "b").unwrap();

        empty_dir(&dir).unwrap();
        assert!(dir.is_dir());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);

        empty_dir(&dir).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn missing_dir_is_a_no_op() {
        let root = TempDir::new().unwrap();
        empty_dir(&root.path().join("Private")).unwrap();
        assert!(!root.path().join("Private").exists());
    }

    #[test]
    fn siblings_are_emptied_but_kept_folder_survives() {
        let root = TempDir::new().unwrap();
        let keep = root.path().join("Telegram Images");
        let other = root.path().join("Telegram Documents");
        fs::create_dir_all(&keep).unwrap();
        fs::create_dir_all(&other).unwrap();
        fs::write(keep.join("photo_1.jpg"), "k").unwrap();
        fs::write(other.join("doc.pdf"), "d").unwrap();
        fs::write(root.path().join("loose.txt"), "l").unwrap();

        assert_eq!(empty_siblings(&keep).unwrap(), 1);
        assert!(keep.join("photo_1.jpg").exists());
        assert!(other.is_dir());
        assert_eq!(fs::read_dir(&other).unwrap().count(), 0);
        assert!(root.path().join("loose.txt").exists());
    }
}
