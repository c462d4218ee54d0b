use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{io_err, Result, ShiftError};
use crate::naming::{self, Proposal};
use crate::platform::Platform;
use crate::timestamp::TimestampResolver;

/// Proposed new name for one file of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamePlan {
    pub original: PathBuf,
    /// `None` when the file already carries a canonical name
    pub new_name: Option<String>,
}

impl RenamePlan {
    /// Where the file ends up once the plan is applied
    pub fn target(&self) -> PathBuf {
        match &self.new_name {
            Some(name) => self
                .original
                .parent()
                .map(|parent| parent.join(name))
                .unwrap_or_else(|| PathBuf::from(name)),
            None => self.original.clone(),
        }
    }
}

/// Compute new names for a batch without touching the filesystem.
///
/// A name that does not fit the platform's convention fails the whole batch.
pub fn plan_batch<R: TimestampResolver + ?Sized>(
    paths: &[PathBuf],
    platform: Platform,
    resolver: &R,
) -> Result<Vec<RenamePlan>> {
    paths.iter().map(|path| plan_one(path, platform, resolver)).collect()
}

fn plan_one<R: TimestampResolver + ?Sized>(
    path: &Path,
    platform: Platform,
    resolver: &R,
) -> Result<RenamePlan> {
    let stamp = resolver.resolve(path)?;
    let new_name = match naming::propose(platform, path, &stamp)? {
        Proposal::Rename(name) => Some(name),
        Proposal::AlreadyRenamed => {
            warn!(file = %path.display(), "{} files have already been renamed", platform);
            None
        }
    };

    Ok(RenamePlan {
        original: path.to_path_buf(),
        new_name,
    })
}

/// Rename every file of a batch in place and return the new paths in
/// input order.
///
/// All paths must share the parent directory of the first one. An empty
/// batch returns an empty list. The whole batch is planned first, so a name
/// mismatch or a name clash fails before any file is touched. Renames are
/// then applied one by one, so an I/O failure part way leaves earlier files
/// renamed.
pub fn rename_batch<R: TimestampResolver + ?Sized>(
    paths: &[PathBuf],
    platform: Platform,
    resolver: &R,
) -> Result<Vec<PathBuf>> {
    let Some(first) = paths.first() else {
        warn!(platform = %platform, "The list of files to rename is empty");
        return Ok(Vec::new());
    };
    let parent = first.parent().unwrap_or_else(|| Path::new(""));

    let plans = plan_batch(paths, platform, resolver)?;
    check_clashes(&plans, parent)?;

    let mut renamed = Vec::with_capacity(plans.len());
    for plan in plans {
        match plan.new_name {
            Some(name) => {
                let target = parent.join(&name);
                fs::rename(&plan.original, &target).map_err(io_err("rename", &plan.original))?;
                debug!(from = %plan.original.display(), to = %target.display(), "renamed");
                renamed.push(target);
            }
            None => renamed.push(plan.original),
        }
    }

    info!(platform = %platform, count = renamed.len(), dir = %parent.display(), "batch renamed");
    Ok(renamed)
}

/// Every target must be unique within the batch and must not land on any
/// other file already in the folder
fn check_clashes(plans: &[RenamePlan], parent: &Path) -> Result<()> {
    let mut claimed: HashMap<PathBuf, &Path> = HashMap::with_capacity(plans.len());

    for plan in plans {
        let target = match &plan.new_name {
            Some(name) => parent.join(name),
            None => plan.original.clone(),
        };
        if let Some(earlier) = claimed.get(&target) {
            return Err(ShiftError::NameClash {
                file: plan.original.clone(),
                target: earlier.to_path_buf(),
            });
        }
        if target != plan.original && target.exists() {
            return Err(ShiftError::NameClash {
                file: plan.original.clone(),
                target,
            });
        }
        claimed.insert(target, &plan.original);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp::{FixedTimestamp, Stamp};
    use tempfile::TempDir;

    fn at(text: &str) -> FixedTimestamp {
        FixedTimestamp(Stamp::parse(text).unwrap())
    }

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, name.as_bytes()).unwrap();
        path
    }

    #[test]
    fn empty_batch_returns_empty() {
        let renamed = rename_batch(&[], Platform::WhatsApp, &at("2023-01-01_10-00-00")).unwrap();
        assert!(renamed.is_empty());
    }

    #[test]
    fn whatsapp_batch_is_renamed_then_idempotent() {
        let dir = TempDir::new().unwrap();
        let original = touch(dir.path(), "IMG-20230101-WA0005.jpg");
        let resolver = at("2023-01-01_10-00-00");

        let first = rename_batch(&[original.clone()], Platform::WhatsApp, &resolver).unwrap();
        let expected = dir.path().join("2023-01-01_10-00-00_WhatsApp_0005.jpg");
        assert_eq!(first, vec![expected.clone()]);
        assert!(expected.exists());
        assert!(!original.exists());

        let second = rename_batch(&first, Platform::WhatsApp, &at("2030-12-31_23-59-59")).unwrap();
        assert_eq!(second, first);
        assert!(expected.exists());
    }

    #[test]
    fn output_keeps_length_order_and_parent() {
        let dir = TempDir::new().unwrap();
        let paths = vec![
            touch(dir.path(), "snap_photo0001.jpg"),
            touch(dir.path(), "snap_video0002.mp4"),
            touch(dir.path(), "snap_photo0003.JPG"),
        ];

        let renamed = rename_batch(&paths, Platform::Snapchat, &at("2023-03-01_09-15-30")).unwrap();
        assert_eq!(renamed.len(), paths.len());
        assert!(renamed.iter().all(|p| p.parent() == Some(dir.path())));
        let names: Vec<_> = renamed
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "2023-03-01_09-15-30_Snapchat_0001.jpg",
                "2023-03-01_09-15-30_Snapchat_0002.mp4",
                "2023-03-01_09-15-30_Snapchat_0003.JPG",
            ]
        );
    }

    #[test]
    fn mismatch_aborts_before_any_rename() {
        let dir = TempDir::new().unwrap();
        let good = touch(dir.path(), "IMG-20230101-WA0001.jpg");
        let bad = touch(dir.path(), "holiday.jpg");

        let err = rename_batch(&[good.clone(), bad.clone()], Platform::WhatsApp, &at("2023-01-01_10-00-00"))
            .unwrap_err();
        assert!(matches!(err, ShiftError::NamingPatternMismatch { .. }));
        assert!(good.exists());
        assert!(bad.exists());
    }

    #[test]
    fn same_second_duplicates_clash_without_losing_data() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("snap_a_photo1234.jpg");
        let b = dir.path().join("snap_b_photo1234.jpg");
        fs::write(&a, "AAA").unwrap();
        fs::write(&b, "BBB").unwrap();

        let err = rename_batch(&[a.clone(), b.clone()], Platform::Snapchat, &at("2023-03-01_09-15-30"))
            .unwrap_err();
        match err {
            ShiftError::NameClash { file, target } => {
                assert_eq!(file, b);
                assert_eq!(target, a);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(fs::read_to_string(&a).unwrap(), "AAA");
        assert_eq!(fs::read_to_string(&b).unwrap(), "BBB");
        assert!(!dir.path().join("2023-03-01_09-15-30_Snapchat_1234.jpg").exists());
    }

    #[test]
    fn existing_file_under_the_target_name_is_a_clash() {
        let dir = TempDir::new().unwrap();
        let done = dir.path().join("2023-06-01_20-01-00_track.m4a");
        fs::write(&done, "earlier run").unwrap();
        let fresh = dir.path().join("track.m4a");
        fs::write(&fresh, "new download").unwrap();

        let err = rename_batch(&[fresh.clone()], Platform::CloudMusic, &at("2023-06-01_20-01-00")).unwrap_err();
        assert!(matches!(err, ShiftError::NameClash { .. }));
        assert_eq!(fs::read_to_string(&done).unwrap(), "earlier run");
        assert!(fresh.exists());
    }

    #[test]
    fn plan_does_not_touch_files() {
        let dir = TempDir::new().unwrap();
        let file = touch(dir.path(), "photo_1234.jpg");

        let plans = plan_batch(&[file.clone()], Platform::Telegram, &at("2023-04-02_12-00-01")).unwrap();
        assert_eq!(plans[0].new_name.as_deref(), Some("2023-04-02_12-00-01_Telegram_1234.jpg"));
        assert_eq!(plans[0].target(), dir.path().join("2023-04-02_12-00-01_Telegram_1234.jpg"));
        assert!(file.exists());
    }

    #[test]
    fn real_timestamps_produce_canonical_names() {
        let dir = TempDir::new().unwrap();
        let file = touch(dir.path(), "track.m4a");

        let renamed = rename_batch(&[file], Platform::CloudMusic, &crate::timestamp::FsTimestamps).unwrap();
        let name = renamed[0].file_name().unwrap().to_string_lossy().into_owned();
        let (stamp, rest) = name.split_at(19);
        assert!(Stamp::parse(stamp).is_some());
        assert_eq!(rest, "_track.m4a");
    }
}
