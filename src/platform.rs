use serde::{Deserialize, Serialize};
use std::fmt;

/// The app a batch of files was synced from.
///
/// Each platform owns exactly one naming rule (see `naming`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    WhatsApp,
    Telegram,
    Snapchat,
    /// YouTube-to-mp3 downloader app
    CloudMusic,
    /// YouTube video downloader app
    VidMate,
    /// Cloned social app storing media per account folder
    SocialClone,
}

/// Which naming rule a platform follows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingRule {
    /// `IMG-20230101-WA0005.jpg` -> `<stamp>_WhatsApp_0005.jpg`
    MessagingSequence,
    /// `photo_1234.jpg` -> `<stamp>_Telegram_1234.jpg`
    ChatExport,
    /// `snap_photo1234.jpg` -> `<stamp>_Snapchat_1234.jpg`
    EphemeralTail,
    /// `song.m4a` -> `<stamp>_song.m4a`
    VerbatimDownload,
    /// `<account>/<kind>/photo_0042.jpg` -> `<date>_<account>_0042.jpg`
    AccountFolder,
}

impl Platform {
    /// Full name used inside generated labels
    pub fn name(&self) -> &'static str {
        match self {
            Platform::WhatsApp => "WhatsApp",
            Platform::Telegram => "Telegram",
            Platform::Snapchat => "Snapchat",
            Platform::CloudMusic => "CLOUD_MUSIC",
            Platform::VidMate => "VidMate",
            Platform::SocialClone => "SocialClone",
        }
    }

    /// Short code the app embeds in its own file names, if any
    pub fn short_code(&self) -> Option<&'static str> {
        match self {
            Platform::WhatsApp => Some("WA"),
            _ => None,
        }
    }

    pub fn rule(&self) -> NamingRule {
        match self {
            Platform::WhatsApp => NamingRule::MessagingSequence,
            Platform::Telegram => NamingRule::ChatExport,
            Platform::Snapchat => NamingRule::EphemeralTail,
            Platform::CloudMusic | Platform::VidMate => NamingRule::VerbatimDownload,
            Platform::SocialClone => NamingRule::AccountFolder,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
