//! Runs every configured source through prepare, collect, rename, convert,
//! prune and move, one source at a time.

use anyhow::{Context, Result};
use colored::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::colors;
use crate::config::{Config, Conversion, SourceConfig};
use crate::convert;
use crate::mover::{self, is_hidden};
use crate::notify::{Notification, Notifier};
use crate::pruner;
use crate::renamer::{self, RenamePlan};
use crate::snapshot::{CommitOutcome, Snapshot};
use crate::summary::{RunOutcome, RunSummary};
use crate::timestamp::{FsTimestamps, TimestampResolver};

const NOTIFY_TITLE: &str = "dropsync-shift";

/// Proposed renames for one source, as shown by a dry run
#[derive(Debug, Clone)]
pub struct SourcePlan {
    pub label: String,
    pub folder: PathBuf,
    pub plans: Vec<RenamePlan>,
}

pub struct Pipeline {
    config: Config,
    resolver: Box<dyn TimestampResolver>,
    notifier: Box<dyn Notifier>,
}

impl Pipeline {
    /// Pipeline reading real file timestamps and notifying through the
    /// configured backend
    pub fn new(config: Config) -> Self {
        let notifier = config.notifications.notifier();
        Self {
            config,
            resolver: Box::new(FsTimestamps),
            notifier,
        }
    }

    pub fn with_resolver(mut self, resolver: impl TimestampResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    /// Process every source once.
    ///
    /// With `take_snapshot` set (and snapshots enabled), the source tree is
    /// copied first and the copy is discarded only if the run completes and
    /// the tree is drained.
    pub fn run(&self, take_snapshot: bool) -> Result<RunSummary> {
        self.notifier.notify(
            &Notification::new(
                NOTIFY_TITLE,
                "Running dropsync-shift",
                "→ Renaming and moving process started...",
            )
            .with_sound("Blow"),
        );

        fs::create_dir_all(&self.config.destination).with_context(|| {
            format!("Failed to create destination {}", self.config.destination.display())
        })?;

        let snapshot = if take_snapshot && self.config.snapshot.enabled && self.config.source_root.is_dir() {
            println!("{} Taking a snapshot of {}", "📸".cyan(), self.config.source_root.display());
            Some(
                Snapshot::take(&self.config.source_root, &self.config.snapshot_dir())
                    .context("Failed to snapshot the source folder")?,
            )
        } else {
            None
        };

        let mut summary = RunSummary::new();
        for source in &self.config.sources {
            let moved = self
                .process_source(source, &mut summary)
                .with_context(|| format!("Failed to process {}", source.label))?;
            match moved {
                Some(count) => summary.record_processed(&source.label, count),
                None => summary.record_empty(&source.label),
            }
        }

        for folder in &self.config.junk_folders {
            let path = self.config.source_root.join(folder);
            pruner::empty_dir(&path).with_context(|| format!("Failed to empty {}", path.display()))?;
        }

        self.report(&summary);

        if let Some(snapshot) = snapshot {
            let outcome = snapshot
                .commit(self.config.snapshot.residual_bytes)
                .context("Failed to commit the snapshot")?;
            if let CommitOutcome::Retained { path, residual_bytes } = outcome {
                summary.warn(format!(
                    "Source folder still holds {} bytes, snapshot kept at {}",
                    residual_bytes,
                    path.display()
                ));
            }
        }

        Ok(summary)
    }

    /// Proposed renames for every source without touching the filesystem
    pub fn plan(&self) -> Result<Vec<SourcePlan>> {
        let mut plans = Vec::with_capacity(self.config.sources.len());
        for source in &self.config.sources {
            let folder = self.config.source_root.join(&source.folder);
            let mut source_plans = Vec::new();
            for batch in collect(&folder, source)? {
                source_plans.extend(
                    renamer::plan_batch(&batch, source.platform, &*self.resolver)
                        .with_context(|| format!("Failed to plan {}", source.label))?,
                );
            }
            plans.push(SourcePlan {
                label: source.label.clone(),
                folder,
                plans: source_plans,
            });
        }
        Ok(plans)
    }

    /// `None` when the source had nothing to process
    fn process_source(&self, source: &SourceConfig, summary: &mut RunSummary) -> Result<Option<usize>> {
        let folder = self.config.source_root.join(&source.folder);
        println!();
        println!("{} {}", "▶".color(colors::HEADER), source.label.bold().color(colors::HEADER));

        if !folder.is_dir() {
            println!("  {} Folder not found: {}", "⚠️".yellow(), folder.display().to_string().color(colors::PATH));
            return Ok(None);
        }

        prepare(&folder, source)?;

        let batches = collect(&folder, source)?;
        if batches.is_empty() {
            warn!(source = %source.label, "no files to process");
            println!("  {} No files to process", "•".cyan());
            return Ok(None);
        }

        let mut ready = Vec::new();
        for batch in batches {
            println!("  {} Renaming {} file(s)", "•".cyan(), batch.len());
            let renamed = renamer::rename_batch(&batch, source.platform, &*self.resolver)?;
            ready.extend(self.convert(source, renamed, summary)?);
        }

        for junk in &source.junk {
            let path = folder.join(junk);
            println!("  {} Emptying \"{}\"", "•".cyan(), junk.display());
            pruner::empty_dir(&path)?;
        }

        println!(
            "  {} Moving {} file(s) to {}",
            "•".cyan(),
            ready.len(),
            self.config.destination.display().to_string().color(colors::PATH)
        );
        mover::move_files(&ready, &self.config.destination)?;

        info!(source = %source.label, count = ready.len(), "source processed");
        Ok(Some(ready.len()))
    }

    fn convert(&self, source: &SourceConfig, paths: Vec<PathBuf>, summary: &mut RunSummary) -> Result<Vec<PathBuf>> {
        match source.conversion {
            Conversion::None => Ok(paths),
            Conversion::Sticker => {
                println!("  {} Converting stickers to png", "•".cyan());
                Ok(convert::stickers_to_png(&paths)?)
            }
            Conversion::Audio => {
                let audio = &self.config.audio;
                println!("  {} Converting audio to .{}", "•".cyan(), audio.target_extension);
                let converted = audio.to_standard_audio(&paths)?;
                for path in &converted {
                    let is_target = path
                        .extension()
                        .and_then(|ext| ext.to_str())
                        .is_some_and(|ext| ext.eq_ignore_ascii_case(&audio.target_extension));
                    if !is_target {
                        summary.warn(format!("{} was not converted to .{}", path.display(), audio.target_extension));
                    }
                }
                Ok(converted)
            }
        }
    }

    fn report(&self, summary: &RunSummary) {
        let empty = summary.empty_sources();
        if !empty.is_empty() {
            println!();
            println!(
                "{} List of empty folders (i.e. that currently do not contain files to be moved):",
                "⚠️".yellow()
            );
            for label in empty {
                println!(" • {}", label);
            }
        }

        for warning in &summary.warnings {
            println!("{} {}", "⚠️".yellow(), warning.color(colors::WARNING));
        }

        let notification = match summary.outcome() {
            RunOutcome::Aborted => Notification::new(
                NOTIFY_TITLE,
                "⚠️️ Process aborted!",
                "→ There are no files to move to the destination folder!",
            )
            .with_sound("Sosumi"),
            RunOutcome::Success => Notification::new(
                NOTIFY_TITLE,
                "🏆 Process successful!",
                "→ Files have been renamed and moved to the destination folder!",
            )
            .with_sound("Hero"),
        };
        self.notifier.notify(&notification);
    }
}

/// Shift, flatten and prune so every candidate sits at the collection depth
fn prepare(folder: &Path, source: &SourceConfig) -> Result<()> {
    for sub in &source.absorb {
        let moved = mover::absorb(folder, sub)?;
        if moved > 0 {
            println!("  {} Shifted {} file(s) up from \"{}\"", "•".cyan(), moved, sub.display());
        }
    }

    if source.flatten {
        let gathered = mover::flatten(folder)?;
        if !gathered.is_empty() {
            println!("  {} Gathered {} file(s) from subfolders", "•".cyan(), gathered.len());
        }
    }

    if source.prune_siblings {
        let emptied = pruner::empty_siblings(folder)?;
        if emptied > 0 {
            println!("  {} Emptied {} sibling folder(s)", "•".cyan(), emptied);
        }
    }

    Ok(())
}

/// Candidate files of a source grouped by parent directory, each group
/// sorted by name. Missing folders yield no groups.
fn collect(folder: &Path, source: &SourceConfig) -> Result<Vec<Vec<PathBuf>>> {
    if !folder.is_dir() {
        return Ok(Vec::new());
    }

    let mut groups: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
    let walker = WalkDir::new(folder)
        .min_depth(source.depth)
        .max_depth(source.depth)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to list {}", folder.display()))?;
        let path = entry.path();
        if !entry.file_type().is_file() || is_hidden(path) {
            continue;
        }
        if !source.accepts(path.extension().and_then(|ext| ext.to_str())) {
            continue;
        }
        let parent = path.parent().unwrap_or(folder).to_path_buf();
        groups.entry(parent).or_default().push(entry.into_path());
    }

    Ok(groups.into_values().collect())
}
