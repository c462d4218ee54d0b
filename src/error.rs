use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::platform::Platform;

/// Errors raised by the rename / convert / move core.
///
/// An empty batch and a failing transcoder are not errors: the first is
/// reported through the run summary, the second is logged and skipped.
#[derive(Debug, Error)]
pub enum ShiftError {
    /// The upstream app changed its naming convention.
    #[error("{platform} file name `{file_name}` does not match the expected pattern: {reason}")]
    NamingPatternMismatch {
        platform: Platform,
        file_name: String,
        reason: &'static str,
    },

    /// Two files of a batch, or a batch file and an existing file, would
    /// end up under the same name.
    #[error("renaming {} would overwrite {}", file.display(), target.display())]
    NameClash { file: PathBuf, target: PathBuf },

    #[error("failed to {action} {}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to move {} to {}", from.display(), to.display())]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: fs_extra::error::Error,
    },

    #[error("failed to copy {} to {}", from.display(), to.display())]
    CopyTree {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: fs_extra::error::Error,
    },

    #[error("failed to convert image {}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("path has no file name: {}", path.display())]
    NotAFile { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, ShiftError>;

/// Build a `map_err` adapter that tags an io error with the failed action
pub(crate) fn io_err(action: &'static str, path: &Path) -> impl FnOnce(io::Error) -> ShiftError {
    let path = path.to_path_buf();
    move |source| ShiftError::Io { action, path, source }
}
