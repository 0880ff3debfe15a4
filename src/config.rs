use crate::foundation::error::{PlayerError, PlayerResult};
use crate::playback::clock::Speed;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How grid entities are drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// The raw grid symbol, coloured by entity style.
    #[default]
    Symbolic,
    /// The entity style's emoji.
    Iconographic,
}

impl DisplayMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Symbolic => Self::Iconographic,
            Self::Iconographic => Self::Symbolic,
        }
    }
}

/// Settings persisted across sessions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Preferences {
    pub speed: Speed,
    pub narration: bool,
    pub display_mode: DisplayMode,
}

impl Preferences {
    /// Read preferences from a JSON file.
    ///
    /// A missing file yields defaults silently; an unreadable or invalid one yields defaults and
    /// a warning.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(Some(p)) => p,
            Ok(None) => Self::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), "ignoring preferences: {e}");
                Self::default()
            }
        }
    }

    /// `Ok(None)` when the file does not exist.
    pub fn load(path: &Path) -> PlayerResult<Option<Self>> {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(PlayerError::config(format!(
                    "read '{}': {e}",
                    path.display()
                )));
            }
        };
        let prefs = serde_json::from_str(&text)
            .map_err(|e| PlayerError::config(format!("parse '{}': {e}", path.display())))?;
        Ok(Some(prefs))
    }

    /// Write pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> PlayerResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                PlayerError::config(format!("create dir '{}': {e}", parent.display()))
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| PlayerError::serde(e.to_string()))?;
        std::fs::write(path, json + "\n")
            .map_err(|e| PlayerError::config(format!("write '{}': {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        assert_eq!(Preferences::load(&path).unwrap(), None);
        assert_eq!(Preferences::load_or_default(&path), Preferences::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/dir/prefs.json");
        let prefs = Preferences {
            speed: Speed::MAX,
            narration: true,
            display_mode: DisplayMode::Iconographic,
        };
        prefs.save(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"display_mode\": \"iconographic\""));
        assert_eq!(Preferences::load_or_default(&path), prefs);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, r#"{"narration": true}"#).unwrap();
        let p = Preferences::load_or_default(&path);
        assert!(p.narration);
        assert_eq!(p.speed, Speed::NORMAL);
    }

    #[test]
    fn invalid_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, r#"{"speed": 3}"#).unwrap();
        assert!(matches!(Preferences::load(&path), Err(PlayerError::Config(_))));
        assert_eq!(Preferences::load_or_default(&path), Preferences::default());
    }

    #[test]
    fn display_mode_toggles() {
        assert_eq!(DisplayMode::Symbolic.toggled(), DisplayMode::Iconographic);
        assert_eq!(DisplayMode::Iconographic.toggled().toggled(), DisplayMode::Iconographic);
    }
}
