//! Editor configuration.
//!
//! Persisted as JSON under the user config directory. Every field has a
//! default, so a partial file only overrides what it names.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::canvas::Size;
use crate::grid::DEFAULT_GRID_SIZE;
use crate::shapes::ShapeKind;

/// Largest width or height a shape style may ask for
pub const MAX_SHAPE_SIZE: i32 = 100_000;

/// Fixed size and default label for one kind of shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeStyle {
    pub width: i32,
    pub height: i32,
    pub label: String,
}

impl ShapeStyle {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Grid spacing in canvas units
    pub grid_size: i32,
    pub rectangle: ShapeStyle,
    pub ellipse: ShapeStyle,
    /// Maximum number of undo steps
    pub max_history: usize,
    /// How close (in canvas units) a click must land to pick a connector
    pub hit_tolerance: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            rectangle: ShapeStyle {
                width: 100,
                height: 50,
                label: ShapeKind::Rectangle.name().to_string(),
            },
            ellipse: ShapeStyle {
                width: 100,
                height: 100,
                label: ShapeKind::Ellipse.name().to_string(),
            },
            max_history: 100,
            hit_tolerance: 4.0,
        }
    }
}

impl EditorConfig {
    /// Load from the default config path, falling back to defaults
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }
        Self::load_from(&path).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "ignoring unreadable config");
            Self::default()
        })
    }

    /// Load from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config.normalized())
    }

    /// Write the config as pretty JSON, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("writing config {}", path.display()))?;
        Ok(())
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        let config_dir = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".config")
            });
        config_dir.join("gridsketch").join("config.json")
    }

    /// Clamp values that would make the editor misbehave
    pub fn normalized(mut self) -> Self {
        self.grid_size = self.grid_size.max(1);
        self.max_history = self.max_history.max(1);
        for style in [&mut self.rectangle, &mut self.ellipse] {
            style.width = style.width.clamp(1, MAX_SHAPE_SIZE);
            style.height = style.height.clamp(1, MAX_SHAPE_SIZE);
        }
        if !self.hit_tolerance.is_finite() || self.hit_tolerance < 0.0 {
            self.hit_tolerance = 0.0;
        }
        self
    }

    /// Size and default label for a shape kind
    pub fn style(&self, kind: ShapeKind) -> &ShapeStyle {
        match kind {
            ShapeKind::Rectangle => &self.rectangle,
            ShapeKind::Ellipse => &self.ellipse,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.grid_size, 20);
        assert_eq!(config.style(ShapeKind::Rectangle).size(), Size::new(100, 50));
        assert_eq!(config.style(ShapeKind::Ellipse).size(), Size::new(100, 100));
        assert_eq!(config.style(ShapeKind::Ellipse).label, "Ellipse");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "grid_size": 10, "ellipse": { "width": 60, "height": 40, "label": "Node" } }"#).unwrap();

        let config = EditorConfig::load_from(&path).unwrap();
        assert_eq!(config.grid_size, 10);
        assert_eq!(config.ellipse.label, "Node");
        assert_eq!(config.rectangle, EditorConfig::default().rectangle);
        assert_eq!(config.max_history, 100);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = EditorConfig {
            grid_size: 25,
            max_history: 7,
            ..EditorConfig::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(EditorConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_values_are_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "grid_size": -5, "max_history": 0, "hit_tolerance": -1.0,
                 "rectangle": { "width": 2147483647, "height": 0, "label": "Wide" } }"#,
        )
        .unwrap();

        let config = EditorConfig::load_from(&path).unwrap();
        assert_eq!(config.grid_size, 1);
        assert_eq!(config.max_history, 1);
        assert_eq!(config.hit_tolerance, 0.0);
        assert_eq!(config.rectangle.size(), Size::new(MAX_SHAPE_SIZE, 1));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();
        assert!(EditorConfig::load_from(&path).is_err());
        assert!(EditorConfig::load_from(&dir.path().join("missing.json")).is_err());
    }
}
