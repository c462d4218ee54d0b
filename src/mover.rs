use fs_extra::file::{self, CopyOptions};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{io_err, Result, ShiftError};

/// Batches at least this long get a progress bar
const PROGRESS_THRESHOLD: usize = 20;

pub(crate) fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

fn progress_bar(len: usize) -> ProgressBar {
    if len < PROGRESS_THRESHOLD {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} files {msg}") {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

/// Move one file into `dest_dir` under the same base name, replacing any
/// file already there
pub fn move_file(path: &Path, dest_dir: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| ShiftError::NotAFile { path: path.to_path_buf() })?;
    let target = dest_dir.join(name);

    let mut options = CopyOptions::new();
    options.overwrite = true;

    file::move_file(path, &target, &options).map_err(|source| ShiftError::Move {
        from: path.to_path_buf(),
        to: target.clone(),
        source,
    })?;

    debug!(from = %path.display(), to = %target.display(), "moved");
    Ok(target)
}

/// Move a batch into `dest_dir`. Last write wins on name clashes.
pub fn move_files(paths: &[PathBuf], dest_dir: &Path) -> Result<()> {
    let pb = progress_bar(paths.len());

    for path in paths {
        pb.inc(1);
        move_file(path, dest_dir)?;
    }

    pb.finish_and_clear();
    if !paths.is_empty() {
        info!(count = paths.len(), dest = %dest_dir.display(), "files moved");
    }
    Ok(())
}

/// Shift the files directly inside `dir/subfolder` up into `dir`.
/// A missing subfolder is a no-op.
pub fn absorb(dir: &Path, subfolder: &Path) -> Result<usize> {
    let source = dir.join(subfolder);
    if !source.is_dir() {
        return Ok(0);
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(&source).map_err(io_err("list", &source))? {
        let path = entry.map_err(io_err("list", &source))?.path();
        if path.is_file() && !is_hidden(&path) {
            files.push(path);
        }
    }
    files.sort();

    move_files(&files, dir)?;
    Ok(files.len())
}

/// Gather every file below `dir` into `dir` itself, then remove the
/// emptied subfolders. Returns the files now sitting at the root.
pub fn flatten(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let nested: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(2)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && !is_hidden(e.path()))
        .map(|e| e.into_path())
        .collect();

    let mut gathered = Vec::with_capacity(nested.len());
    for path in &nested {
        gathered.push(move_file(path, dir)?);
    }

    for entry in fs::read_dir(dir).map_err(io_err("list", dir))? {
        let path = entry.map_err(io_err("list", dir))?.path();
        if path.is_dir() {
            fs::remove_dir_all(&path).map_err(io_err("remove", &path))?;
        }
    }

    Ok(gathered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn move_overwrites_existing_destination() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write(&src.path().join("a.jpg"), "new a");
        write(&src.path().join("b.jpg"), "new b");
        write(&dst.path().join("a.jpg"), "old a");

        move_files(
            &[src.path().join("a.jpg"), src.path().join("b.jpg")],
            dst.path(),
        )
        .unwrap();

        let mut names: Vec<_> = fs::read_dir(dst.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["a.jpg", "b.jpg"]);
        assert_eq!(fs::read_to_string(dst.path().join("a.jpg")).unwrap(), "new a");
        assert!(!src.path().join("a.jpg").exists());
        assert!(!src.path().join("b.jpg").exists());
    }

    #[test]
    fn move_handles_shell_significant_characters() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let name = "Tom & Jerry's [live] (2023).mp4";
        write(&src.path().join(name), "video");

        move_files(&[src.path().join(name)], dst.path()).unwrap();
        assert!(dst.path().join(name).exists());
    }

    #[test]
    fn missing_source_is_a_move_error() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let err = move_files(&[src.path().join("ghost.jpg")], dst.path()).unwrap_err();
        assert!(matches!(err, ShiftError::Move { .. }));
    }

    #[test]
    fn absorb_shifts_sent_files_up() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("Sent/AUD-20230101-WA0001.opus"), "x");
        write(&dir.path().join("Sent/.nomedia"), "");

        let moved = absorb(dir.path(), Path::new("Sent")).unwrap();
        assert_eq!(moved, 1);
        assert!(dir.path().join("AUD-20230101-WA0001.opus").exists());
        assert_eq!(absorb(dir.path(), Path::new("Missing")).unwrap(), 0);
    }

    #[test]
    fn flatten_gathers_nested_files_and_drops_subfolders() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("202301/PTT-20230101-WA0001.opus"), "1");
        write(&dir.path().join("202302/PTT-20230201-WA0002.opus"), "2");
        write(&dir.path().join("202302/.DS_Store"), "");

        let gathered = flatten(dir.path()).unwrap();
        assert_eq!(
            gathered,
            vec![
                dir.path().join("PTT-20230101-WA0001.opus"),
                dir.path().join("PTT-20230201-WA0002.opus"),
            ]
        );
        assert!(!dir.path().join("202301").exists());
        assert!(!dir.path().join("202302").exists());
    }
}
