//! dropsync-shift - renames, converts and moves media synced from phone apps

pub mod error;
pub mod platform;
pub mod timestamp;
pub mod naming;
pub mod renamer;
pub mod convert;
pub mod mover;
pub mod pruner;
pub mod snapshot;
pub mod summary;
pub mod notify;
pub mod config;
pub mod pipeline;
pub mod cli;

// Re-exports for easy access
pub use error::{Result, ShiftError};
pub use platform::{NamingRule, Platform};
pub use timestamp::{FixedTimestamp, FsTimestamps, Stamp, TimestampResolver};
pub use renamer::{plan_batch, rename_batch, RenamePlan};
pub use convert::{stickers_to_png, webp_to_png, AudioConverter};
pub use mover::{move_file, move_files};
pub use pruner::empty_dir;
pub use snapshot::{CommitOutcome, Snapshot};
pub use summary::{RunOutcome, RunSummary, SourceOutcome};
pub use notify::{ConsoleNotifier, Notification, Notifier, NotifyBackend, OsascriptNotifier, SilentNotifier};
pub use config::{Config, Conversion, SnapshotSettings, SourceConfig};
pub use pipeline::{Pipeline, SourcePlan};
pub use cli::{Cli, Commands};

pub mod colors {
    use colored::Color;

    pub const SUCCESS: Color = Color::TrueColor { r: 77, g: 255, b: 157 };
    pub const HEADER: Color = Color::TrueColor { r: 157, g: 77, b: 255 };
    pub const PATH: Color = Color::TrueColor { r: 77, g: 195, b: 255 };
    pub const WARNING: Color = Color::TrueColor { r: 255, g: 217, b: 61 };
}

/// Current version of dropsync-shift
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
