//! User-facing messages and the surface they are shown on.
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "de")]
    German,
}

/// Localized outcome strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Messages {
    pub success: &'static str,
    pub failure: &'static str,
    pub please_wait: &'static str,
}

impl Language {
    pub fn messages(self) -> Messages {
        match self {
            Language::English => Messages {
                success: "Success",
                failure: "An error occurred",
                please_wait: "Please wait",
            },
            Language::German => Messages {
                success: "Erfolgreich",
                failure: "Ein Fehler ist aufgetreten.",
                please_wait: "Bitte warten",
            },
        }
    }
}

pub trait Display: Send + Sync {
    /// Replace the status label.
    fn set_status(&self, message: &str);

    /// Short-lived notification.
    fn notify(&self, text: &str);

    /// Show or hide the "please wait" indicator.
    fn busy(&self, on: bool);
}

/// Writes status lines to stdout and notices/progress to stderr.
#[derive(Debug)]
pub struct TerminalDisplay {
    messages: Messages,
    last_status: Mutex<String>,
}

impl TerminalDisplay {
    pub fn new(language: Language) -> Self {
        Self {
            messages: language.messages(),
            last_status: Mutex::new(String::new()),
        }
    }

    pub fn last_status(&self) -> String {
        self.last_status
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

impl Display for TerminalDisplay {
    fn set_status(&self, message: &str) {
        if let Ok(mut last) = self.last_status.lock() {
            *last = message.to_string();
        }
        if !message.is_empty() {
            let _ = writeln!(std::io::stdout(), "{}", message);
        }
    }

    fn notify(&self, text: &str) {
        let _ = writeln!(std::io::stderr(), "{}", text);
    }

    fn busy(&self, on: bool) {
        if on {
            let _ = writeln!(std::io::stderr(), "{}...", self.messages.please_wait);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn localized_outcome_strings() {
        let en = Language::English.messages();
        assert_eq!(en.success, "Success");
        assert_eq!(en.failure, "An error occurred");

        let de = Language::German.messages();
        assert_eq!(de.success, "Erfolgreich");
        assert_eq!(de.failure, "Ein Fehler ist aufgetreten.");
    }

    #[test]
    fn language_codes() {
        let lang: Language = serde_yaml::from_str("de").unwrap();
        assert_eq!(lang, Language::German);
        assert_eq!(Language::default(), Language::English);
    }

    #[test]
    fn terminal_display_tracks_last_status() {
        let display = TerminalDisplay::new(Language::English);
        display.set_status("Success");
        assert_eq!(display.last_status(), "Success");
        display.set_status("");
        assert_eq!(display.last_status(), "");
    }
}
