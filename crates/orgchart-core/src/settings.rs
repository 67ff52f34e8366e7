//! Per-title colors and their persistence.
//!
//! The store is a single JSON file (`~/.org_chart_settings.json` by default):
//!
//! ```json
//! { "title_colors": { "Team Lead": [39, 94, 254] } }
//! ```
//!
//! Unknown top-level keys are kept and written back on save.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE_NAME: &str = ".org_chart_settings.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Preselected color offered by color pickers for titles without a color.
    pub const DEFAULT_PICK: Rgb = Rgb(39, 94, 254);

    /// Parses `#rgb` or `#rrggbb` (the `#` is optional).
    pub fn from_hex(text: &str) -> Option<Self> {
        let hex = text.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        fn nibble(c: u8) -> Option<u8> {
            (c as char).to_digit(16).map(|v| v as u8)
        }
        let b = hex.as_bytes();
        match b.len() {
            3 => Some(Rgb(
                nibble(b[0])? * 17,
                nibble(b[1])? * 17,
                nibble(b[2])? * 17,
            )),
            6 => Some(Rgb(
                (nibble(b[0])? << 4) | nibble(b[1])?,
                (nibble(b[2])? << 4) | nibble(b[3])?,
                (nibble(b[4])? << 4) | nibble(b[5])?,
            )),
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    /// WCAG relative luminance in `0.0..=1.0`.
    pub fn relative_luminance(self) -> f64 {
        fn channel(v: u8) -> f64 {
            let c = f64::from(v) / 255.0;
            if c <= 0.03928 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        0.2126 * channel(self.0) + 0.7152 * channel(self.1) + 0.0722 * channel(self.2)
    }

    /// Each channel multiplied by `factor`, truncated and clamped to `0..=255`.
    pub fn scaled(self, factor: f64) -> Self {
        fn ch(v: u8, f: f64) -> u8 {
            (f64::from(v) * f).clamp(0.0, 255.0) as u8
        }
        Rgb(ch(self.0, factor), ch(self.1, factor), ch(self.2, factor))
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Title → color. Entries for titles absent from the current dataset are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TitleColors(BTreeMap<String, Rgb>);

impl TitleColors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, title: &str) -> Option<Rgb> {
        self.0.get(title).copied()
    }

    pub fn set(&mut self, title: impl Into<String>, color: Rgb) {
        self.0.insert(title.into(), color);
    }

    pub fn remove(&mut self, title: &str) -> Option<Rgb> {
        self.0.remove(title)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Rgb)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl FromIterator<(String, Rgb)> for TitleColors {
    fn from_iter<I: IntoIterator<Item = (String, Rgb)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub title_colors: TitleColors,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsIoError {
    #[error("failed to read settings {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write settings {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed settings {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsStore {
    path: PathBuf,
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$HOME/.org_chart_settings.json` (`%USERPROFILE%` when `HOME` is unset), or the current
    /// directory as a last resort.
    pub fn default_path() -> PathBuf {
        std::env::var_os("HOME")
            .filter(|h| !h.is_empty())
            .or_else(|| std::env::var_os("USERPROFILE").filter(|h| !h.is_empty()))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(SETTINGS_FILE_NAME)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads settings; a missing file yields empty settings.
    pub fn try_load(&self) -> Result<Settings, SettingsIoError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Settings::default());
            }
            Err(source) => {
                return Err(SettingsIoError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        serde_json::from_str(&text).map_err(|source| SettingsIoError::Malformed {
            path: self.path.clone(),
            source,
        })
    }

    /// Like [`SettingsStore::try_load`], but unreadable or malformed files degrade to empty
    /// settings with a warning.
    pub fn load(&self) -> Settings {
        match self.try_load() {
            Ok(s) => s,
            Err(err) => {
                tracing::warn!(error = %err, "ignoring settings file");
                Settings::default()
            }
        }
    }

    pub fn save(&self, settings: &Settings) -> Result<(), SettingsIoError> {
        let text = serde_json::to_string_pretty(settings).map_err(|source| {
            SettingsIoError::Malformed {
                path: self.path.clone(),
                source,
            }
        })?;
        std::fs::write(&self.path, text).map_err(|source| SettingsIoError::Write {
            path: self.path.clone(),
            source,
        })?;
        tracing::info!(
            path = %self.path.display(),
            colors = settings.title_colors.len(),
            "settings saved"
        );
        Ok(())
    }
}
