//! Light/dark theme preference
//!
//! The flag is device-wide (not per account) and persisted under
//! `device:theme`.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::{get_json, scoped_key, set_json, KeyValueStore};
use tokio::sync::watch;

/// Persisted theme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemePreference {
    /// Dark mode enabled
    #[serde(default)]
    pub dark_mode: bool,
}

/// Colours for one theme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Screen background
    pub background: &'static str,
    /// Body text
    pub text: &'static str,
    /// Card background
    pub card: &'static str,
    /// Destructive (remove) buttons
    pub remove_button: &'static str,
}

impl Palette {
    /// Light palette
    pub const fn light() -> Self {
        Self {
            background: "#FFFFFF",
            text: "#000000",
            card: "#F5F5F5",
            remove_button: "red",
        }
    }

    /// Dark palette
    pub const fn dark() -> Self {
        Self {
            background: "#121212",
            text: "#FFFFFF",
            card: "#1E1E1E",
            remove_button: "#BB0000",
        }
    }

    /// Palette for a dark-mode flag
    pub const fn for_mode(dark_mode: bool) -> Self {
        if dark_mode {
            Self::dark()
        } else {
            Self::light()
        }
    }
}

/// Theme store
pub struct ThemeStore {
    kv: Arc<dyn KeyValueStore>,
    preference: RwLock<ThemePreference>,
    changes_tx: watch::Sender<bool>,
}

impl ThemeStore {
    /// Create a store in light mode
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        let (changes_tx, _) = watch::channel(false);
        Self {
            kv,
            preference: RwLock::new(ThemePreference::default()),
            changes_tx,
        }
    }

    /// Restore the persisted preference; unreadable data means light mode
    pub async fn load(&self) -> bool {
        let preference = match get_json::<ThemePreference, _>(self.kv.as_ref(), &theme_key()).await
        {
            Ok(preference) => preference.unwrap_or_default(),
            Err(e) => {
                tracing::warn!("Failed to read theme preference: {}", e);
                ThemePreference::default()
            }
        };

        self.apply(preference.dark_mode);
        preference.dark_mode
    }

    /// Dark mode enabled
    pub fn dark_mode(&self) -> bool {
        self.preference.read().dark_mode
    }

    /// Palette for the current mode
    pub fn palette(&self) -> Palette {
        Palette::for_mode(self.dark_mode())
    }

    /// Enable or disable dark mode
    ///
    /// The in-memory flag changes even if persisting it fails.
    pub async fn set_dark_mode(&self, dark_mode: bool) {
        self.apply(dark_mode);

        let preference = ThemePreference { dark_mode };
        if let Err(e) = set_json(self.kv.as_ref(), &theme_key(), &preference).await {
            tracing::error!("Failed to save theme preference: {}", e);
        }
    }

    /// Flip dark mode, returning the new value
    pub async fn toggle_dark_mode(&self) -> bool {
        let dark_mode = !self.dark_mode();
        self.set_dark_mode(dark_mode).await;
        dark_mode
    }

    /// Subscribe to dark-mode changes
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.changes_tx.subscribe()
    }

    fn apply(&self, dark_mode: bool) {
        self.preference.write().dark_mode = dark_mode;
        self.changes_tx.send_replace(dark_mode);
    }
}

fn theme_key() -> String {
    scoped_key(&["device", "theme"])
}
