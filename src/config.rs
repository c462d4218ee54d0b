use anyhow::{Context, Result};
use colored::*;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::colors;
use crate::convert::AudioConverter;
use crate::notify::NotifyBackend;
use crate::platform::Platform;

const CONFIG_FILE: &str = ".dropsync-shift.json";
const DEFAULT_RESIDUAL_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Folder the sync app writes into
    pub source_root: PathBuf,
    /// Single folder every processed file ends up in
    pub destination: PathBuf,
    #[serde(default)]
    pub audio: AudioConverter,
    #[serde(default)]
    pub notifications: NotifyBackend,
    #[serde(default)]
    pub snapshot: SnapshotSettings,
    /// Processed in order
    pub sources: Vec<SourceConfig>,
    /// Emptied once every source is done, relative to `source_root`
    #[serde(default)]
    pub junk_folders: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub label: String,
    pub platform: Platform,
    /// Relative to `source_root`
    pub folder: PathBuf,
    /// Accepted extensions, case-insensitive; empty accepts every file
    #[serde(default)]
    pub extensions: Vec<String>,
    /// How deep below `folder` the candidate files sit
    #[serde(default = "default_depth")]
    pub depth: usize,
    /// Subfolders whose files are shifted up into `folder` first
    #[serde(default)]
    pub absorb: Vec<PathBuf>,
    /// Gather every nested file into `folder` and drop the subfolders
    #[serde(default)]
    pub flatten: bool,
    /// Empty every directory next to `folder`
    #[serde(default)]
    pub prune_siblings: bool,
    /// Subfolders of `folder` emptied after renaming
    #[serde(default)]
    pub junk: Vec<PathBuf>,
    #[serde(default)]
    pub conversion: Conversion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Conversion {
    #[default]
    None,
    /// Transcode to the configured audio format
    Audio,
    /// webp stickers to png
    Sticker,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotSettings {
    pub enabled: bool,
    /// Defaults to `<source_root>.snapshots`
    #[serde(default)]
    pub directory: Option<PathBuf>,
    /// Largest leftover size that still counts as a drained source tree
    #[serde(default = "default_residual_bytes")]
    pub residual_bytes: u64,
}

fn default_depth() -> usize {
    1
}

fn default_residual_bytes() -> u64 {
    DEFAULT_RESIDUAL_BYTES
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: None,
            residual_bytes: DEFAULT_RESIDUAL_BYTES,
        }
    }
}

impl SourceConfig {
    fn new(label: &str, platform: Platform, folder: &str, extensions: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            platform,
            folder: PathBuf::from(folder),
            extensions: extensions.iter().map(|ext| ext.to_string()).collect(),
            depth: default_depth(),
            absorb: Vec::new(),
            flatten: false,
            prune_siblings: false,
            junk: Vec::new(),
            conversion: Conversion::None,
        }
    }

    fn junk(mut self, folders: &[&str]) -> Self {
        self.junk = folders.iter().map(PathBuf::from).collect();
        self
    }

    fn absorb(mut self, folders: &[&str]) -> Self {
        self.absorb = folders.iter().map(PathBuf::from).collect();
        self
    }

    fn flattened(mut self) -> Self {
        self.flatten = true;
        self
    }

    fn pruning_siblings(mut self) -> Self {
        self.prune_siblings = true;
        self
    }

    fn depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    fn conversion(mut self, conversion: Conversion) -> Self {
        self.conversion = conversion;
        self
    }

    /// Whether `ext` is one of the accepted extensions
    pub fn accepts(&self, ext: Option<&str>) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        ext.is_some_and(|ext| self.extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
    }
}

/// Sources laid out the way the sync app mirrors the phone
pub fn default_sources() -> Vec<SourceConfig> {
    use Platform::*;

    vec![
        SourceConfig::new("WhatsApp Images", WhatsApp, "WhatsApp/WhatsApp Images", &["jpg", "jpeg"])
            .junk(&["Sent", "Private"]),
        SourceConfig::new("WhatsApp Video", WhatsApp, "WhatsApp/WhatsApp Video", &["mp4"])
            .junk(&["Sent", "Private"]),
        SourceConfig::new("WhatsApp Stickers", WhatsApp, "WhatsApp/WhatsApp Stickers", &["webp", "png"])
            .conversion(Conversion::Sticker),
        SourceConfig::new("WhatsApp Audio", WhatsApp, "WhatsApp/WhatsApp Audio", &[])
            .absorb(&["Sent"])
            .conversion(Conversion::Audio),
        SourceConfig::new("WhatsApp Voice Notes", WhatsApp, "WhatsApp/WhatsApp Voice Notes", &[])
            .flattened()
            .conversion(Conversion::Audio),
        SourceConfig::new("WhatsApp Animated Gifs", WhatsApp, "WhatsApp/WhatsApp Animated Gifs", &["mp4"]),
        SourceConfig::new("Telegram Images", Telegram, "Telegram/Telegram Images", &["jpg"]).pruning_siblings(),
        SourceConfig::new("Snapchat", Snapchat, "Snapchat", &["jpg", "mp4"]),
        SourceConfig::new("CLOUD_MUSIC", CloudMusic, "CLOUD_MUSIC", &["m4a"]).conversion(Conversion::Audio),
        SourceConfig::new("VidMate", VidMate, "VidMate/download", &["mp4"]).pruning_siblings(),
        SourceConfig::new("Social Clone", SocialClone, "SocialClone", &["jpg", "jpeg", "png", "webp", "mp4"])
            .depth(3)
            .conversion(Conversion::Sticker),
    ]
}

/// WhatsApp folders that never hold anything worth keeping
pub fn default_junk_folders() -> Vec<PathBuf> {
    [
        "WhatsApp/MISC",
        "WhatsApp/WallPaper",
        "WhatsApp/WhatsApp Documents",
        "WhatsApp/WhatsApp Profile Photos",
    ]
    .iter()
    .map(PathBuf::from)
    .collect()
}

impl Default for Config {
    fn default() -> Self {
        let dropbox = dirs::home_dir().unwrap_or_default().join("Dropbox");
        Self {
            source_root: dropbox.join("DropsyncFiles"),
            destination: dropbox.join("Camera Uploads"),
            audio: AudioConverter::default(),
            notifications: NotifyBackend::default(),
            snapshot: SnapshotSettings::default(),
            sources: default_sources(),
            junk_folders: default_junk_folders(),
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(CONFIG_FILE))
    }

    fn backup_path(path: &Path) -> PathBuf {
        path.with_extension("json.backup")
    }

    /// Load config from `path`, or fall back to the built-in defaults when
    /// the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        match serde_json::from_str(&data) {
            Ok(config) => Ok(config),
            Err(e) => {
                warn!(config = %path.display(), error = %e, "config corrupted, trying backup");
                eprintln!("{} Config corrupted, trying backup...", "⚠️".yellow());
                if let Ok(backup) = Self::load_backup(path) {
                    eprintln!("{} Restored from backup", "✅".green());
                    return Ok(backup);
                }
                Err(e).with_context(|| format!("Failed to parse config file {}", path.display()))
            }
        }
    }

    fn load_backup(path: &Path) -> Result<Self> {
        let backup_path = Self::backup_path(path);
        let data = fs::read_to_string(&backup_path).context("Failed to read backup file")?;
        serde_json::from_str(&data).context("Failed to parse backup file")
    }

    /// Write the config to `path`, keeping the previous file as a backup
    pub fn save(&self, path: &Path) -> Result<()> {
        if path.exists() {
            fs::copy(path, Self::backup_path(path)).context("Failed to create backup")?;
        }

        let temp_path = path.with_extension("json.tmp");
        let data = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&temp_path, &data).context("Failed to write temp config")?;
        fs::rename(&temp_path, path).context("Failed to finalize config")?;

        Ok(())
    }

    /// Where snapshots go for this source root
    pub fn snapshot_dir(&self) -> PathBuf {
        if let Some(dir) = &self.snapshot.directory {
            return dir.clone();
        }
        let mut name = self
            .source_root
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".snapshots");
        self.source_root.with_file_name(name)
    }

    /// Interactive setup, starting from the current values
    pub fn run_init_wizard(current: &Config) -> Result<Self> {
        let theme = ColorfulTheme::default();
        let mut config = current.clone();

        println!("{}", "=".repeat(60).color(colors::HEADER));
        println!("{}", "   📦 DROPSYNC SHIFT - SETUP   ".bold());
        println!("{}", "=".repeat(60).color(colors::HEADER));
        println!();

        println!("{}", "1. SOURCE FOLDER".bold());
        let source_root: String = Input::with_theme(&theme)
            .with_prompt("Folder the sync app writes into")
            .default(current.source_root.display().to_string())
            .interact_text()?;
        config.source_root = PathBuf::from(source_root);
        if !config.source_root.is_dir() {
            println!("{} Folder does not exist yet, every source will be reported empty", "⚠️".yellow());
        }
        println!();

        println!("{}", "2. DESTINATION FOLDER".bold());
        let destination: String = Input::with_theme(&theme)
            .with_prompt("Folder renamed files are moved into")
            .default(current.destination.display().to_string())
            .interact_text()?;
        config.destination = PathBuf::from(destination);
        println!();

        println!("{}", "3. NOTIFICATIONS".bold());
        let backends = [NotifyBackend::Console, NotifyBackend::Osascript, NotifyBackend::None];
        let backend_items = &[
            "Console - print to the terminal",
            "macOS Notification Center (osascript)",
            "None",
        ];
        let backend_idx = Select::with_theme(&theme)
            .items(backend_items)
            .default(backends.iter().position(|b| *b == current.notifications).unwrap_or(0))
            .interact()?;
        config.notifications = backends[backend_idx];
        println!();

        println!("{}", "4. SAFETY SNAPSHOT".bold());
        config.snapshot.enabled = Confirm::with_theme(&theme)
            .with_prompt("Copy the source folder before every run?")
            .default(current.snapshot.enabled)
            .interact()?;
        if config.snapshot.enabled {
            println!("{} Snapshots go to {}", "ℹ️".cyan(), config.snapshot_dir().display());
        }

        Ok(config)
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("{}", "🔧 CURRENT CONFIGURATION".bold().color(colors::HEADER));
        println!();

        println!("{} Source root: {}", "•".cyan(), self.source_root.display().to_string().color(colors::PATH));
        println!("{} Destination: {}", "•".cyan(), self.destination.display().to_string().color(colors::PATH));
        println!(
            "{} Audio: {} → .{}",
            "•".cyan(),
            self.audio.program,
            self.audio.target_extension
        );
        println!("{} Notifications: {}", "•".cyan(), match self.notifications {
            NotifyBackend::Console => "Console",
            NotifyBackend::Osascript => "macOS Notification Center",
            NotifyBackend::None => "Disabled",
        });
        if self.snapshot.enabled {
            println!("{} Snapshot: {}", "•".cyan(), self.snapshot_dir().display());
        } else {
            println!("{} Snapshot: Disabled", "•".cyan());
        }

        println!();
        println!("{} Sources ({}):", "•".cyan(), self.sources.len());
        for source in &self.sources {
            let extensions = if source.extensions.is_empty() {
                "any".to_string()
            } else {
                source.extensions.join(", ")
            };
            println!(
                "  - {} [{}] {} ({})",
                source.label.bold(),
                source.platform,
                source.folder.display(),
                extensions
            );
        }

        if !self.junk_folders.is_empty() {
            println!();
            println!("{} Junk folders ({}):", "•".cyan(), self.junk_folders.len());
            for folder in &self.junk_folders {
                println!("  - {}", folder.display());
            }
        }
    }
}
