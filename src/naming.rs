//! Per-platform naming rules.
//!
//! Every rule is a pure function of the original file name (plus the path
//! for rules that look at folders) and the resolved capture stamp. None of
//! them touch the filesystem, which is what `renamer` is for.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use crate::error::{Result, ShiftError};
use crate::platform::{NamingRule, Platform};
use crate::timestamp::Stamp;

const LABEL_SEPARATOR: char = '_';
const SEQUENCE_SEPARATOR: char = '-';
const SEQUENCE_FIELD: usize = 2;
const EXPORT_FIELD: usize = 1;
const TAIL_LEN: usize = 4;

static NUMERIC_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.[A-Za-z0-9]+)$").expect("valid suffix regex"));

/// Outcome of applying a naming rule to one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Proposal {
    /// New base name for the file
    Rename(String),
    /// The name already follows the canonical scheme; leave it alone
    AlreadyRenamed,
}

/// Apply `platform`'s naming rule to the file at `path`
pub fn propose(platform: Platform, path: &Path, stamp: &Stamp) -> Result<Proposal> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| ShiftError::NotAFile { path: path.to_path_buf() })?;

    match platform.rule() {
        NamingRule::MessagingSequence => messaging_sequence(platform, file_name, stamp),
        NamingRule::ChatExport => chat_export(platform, file_name, stamp).map(Proposal::Rename),
        NamingRule::EphemeralTail => ephemeral_tail(platform, file_name, stamp).map(Proposal::Rename),
        NamingRule::VerbatimDownload => Ok(Proposal::Rename(verbatim_download(file_name, stamp))),
        NamingRule::AccountFolder => account_folder(platform, path, file_name, stamp).map(Proposal::Rename),
    }
}

fn mismatch(platform: Platform, file_name: &str, reason: &'static str) -> ShiftError {
    ShiftError::NamingPatternMismatch {
        platform,
        file_name: file_name.to_string(),
        reason,
    }
}

/// `IMG-20230101-WA0005.jpg` -> `<stamp>_WhatsApp_0005.jpg`
pub fn messaging_sequence(platform: Platform, file_name: &str, stamp: &Stamp) -> Result<Proposal> {
    if file_name.starts_with(|c: char| c.is_ascii_digit()) {
        return Ok(Proposal::AlreadyRenamed);
    }

    let field = file_name
        .split(SEQUENCE_SEPARATOR)
        .nth(SEQUENCE_FIELD)
        .ok_or_else(|| mismatch(platform, file_name, "expected three `-` separated fields"))?;

    let label = match platform.short_code() {
        Some(code) => field.replacen(code, &format!("{}{}", platform.name(), LABEL_SEPARATOR), 1),
        None => field.to_string(),
    };

    Ok(Proposal::Rename(format!("{stamp}{LABEL_SEPARATOR}{label}")))
}

/// `photo_1234.jpg` -> `<stamp>_Telegram_1234.jpg`
pub fn chat_export(platform: Platform, file_name: &str, stamp: &Stamp) -> Result<String> {
    let field = file_name
        .split(LABEL_SEPARATOR)
        .nth(EXPORT_FIELD)
        .filter(|field| !field.is_empty())
        .ok_or_else(|| mismatch(platform, file_name, "expected a `_` separated second field"))?;

    let mut label = format!("{}{}{}", platform.name(), LABEL_SEPARATOR, field);
    if !field.contains('.') {
        if let Some(ext) = Path::new(file_name).extension().and_then(|ext| ext.to_str()) {
            label.push('.');
            label.push_str(ext);
        }
    }

    Ok(format!("{stamp}{LABEL_SEPARATOR}{label}"))
}

/// `snap_2023-03-01_photo1234.jpg` -> `<stamp>_Snapchat_1234.jpg`
pub fn ephemeral_tail(platform: Platform, file_name: &str, stamp: &Stamp) -> Result<String> {
    let path = Path::new(file_name);
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| mismatch(platform, file_name, "missing extension"))?;
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default();

    let skip = stem.chars().count().saturating_sub(TAIL_LEN);
    let tail: String = stem.chars().skip(skip).collect();

    Ok(format!("{stamp}{LABEL_SEPARATOR}{}{LABEL_SEPARATOR}{tail}.{ext}", platform.name()))
}

/// `song.m4a` -> `<stamp>_song.m4a`
///
/// The stamp renders whole seconds, which is the only truncation this rule
/// needs.
pub fn verbatim_download(file_name: &str, stamp: &Stamp) -> String {
    format!("{stamp}{LABEL_SEPARATOR}{file_name}")
}

/// `<account>/<kind>/photo_0042.jpg` -> `<date>_<account>_0042.jpg`
pub fn account_folder(platform: Platform, path: &Path, file_name: &str, stamp: &Stamp) -> Result<String> {
    let account = path
        .parent()
        .and_then(Path::parent)
        .and_then(Path::file_name)
        .and_then(|name| name.to_str())
        .ok_or_else(|| mismatch(platform, file_name, "no account folder above the file"))?;

    let suffix = NUMERIC_SUFFIX
        .captures(file_name)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| mismatch(platform, file_name, "expected a numeric suffix before the extension"))?;

    Ok(format!(
        "{}{LABEL_SEPARATOR}{account}{LABEL_SEPARATOR}{}",
        stamp.date_part(),
        suffix.as_str()
    ))
}
