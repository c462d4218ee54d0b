use colored::*;
use serde::{Deserialize, Serialize};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

use crate::colors;

/// Desktop notification payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub subtitle: String,
    pub message: String,
    /// System sound name, e.g. `Hero`
    pub sound: Option<String>,
}

impl Notification {
    pub fn new(title: &str, subtitle: &str, message: &str) -> Self {
        Self {
            title: title.to_string(),
            subtitle: subtitle.to_string(),
            message: message.to_string(),
            sound: None,
        }
    }

    pub fn with_sound(mut self, sound: &str) -> Self {
        self.sound = Some(sound.to_string());
        self
    }
}

/// Anything that can surface a notification to the user.
///
/// Delivery is best effort: a notifier never fails the run.
pub trait Notifier {
    fn notify(&self, notification: &Notification);
}

/// Which notifier the config asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyBackend {
    #[default]
    Console,
    Osascript,
    None,
}

impl NotifyBackend {
    pub fn notifier(&self) -> Box<dyn Notifier> {
        match self {
            NotifyBackend::Console => Box::new(ConsoleNotifier),
            NotifyBackend::Osascript => Box::new(OsascriptNotifier),
            NotifyBackend::None => Box::new(SilentNotifier),
        }
    }
}

/// Prints notifications as a colored block on stdout
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: &Notification) {
        println!();
        println!("{} {}", "🔔".yellow(), notification.title.bold().color(colors::HEADER));
        if !notification.subtitle.is_empty() {
            println!("   {}", notification.subtitle.color(colors::PATH));
        }
        if !notification.message.is_empty() {
            println!("   {}", notification.message);
        }
    }
}

/// macOS Notification Center through `osascript`
#[derive(Debug, Default)]
pub struct OsascriptNotifier;

impl OsascriptNotifier {
    fn script(notification: &Notification) -> String {
        let mut script = format!(
            "display notification {} with title {} subtitle {}",
            quote(&notification.message),
            quote(&notification.title),
            quote(&notification.subtitle),
        );
        if let Some(sound) = &notification.sound {
            script.push_str(&format!(" sound name {}", quote(sound)));
        }
        script
    }
}

impl Notifier for OsascriptNotifier {
    fn notify(&self, notification: &Notification) {
        let result = Command::new("osascript")
            .arg("-e")
            .arg(Self::script(notification))
            .stdin(Stdio::null())
            .status();

        match result {
            Ok(status) if status.success() => debug!(title = %notification.title, "notification sent"),
            Ok(status) => warn!(code = ?status.code(), "osascript failed to post the notification"),
            Err(err) => warn!(error = %err, "could not run osascript"),
        }
    }
}

/// AppleScript string literal
fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Drops every notification
#[derive(Debug, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, _notification: &Notification) {}
}
