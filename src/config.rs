//! Editor configuration
//!
//! Everything has a default; a TOML file only needs the keys it overrides.
//!
//! ```toml
//! overlay_offset = 2.0
//!
//! [components]
//! section_cols = 2
//! header_title = "Orders"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Defaults used by the built-in component templates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentDefaults {
    pub section_cols: u32,
    pub form_cols: u32,
    pub card_cols: u32,
    pub section_title: String,
    pub form_title: String,
    pub card_title: String,
    pub header_title: String,
    pub button_label: String,
}

impl Default for ComponentDefaults {
    fn default() -> Self {
        Self {
            section_cols: 4,
            form_cols: 4,
            card_cols: 1,
            section_title: "Section Title".to_string(),
            form_title: "Form Title".to_string(),
            card_title: "Card".to_string(),
            header_title: "This Is Nice Page".to_string(),
            button_label: "Button".to_string(),
        }
    }
}

/// Configuration for an [`Editor`](crate::Editor)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Pixels added on every side of a feedback rectangle before clipping
    pub overlay_offset: f64,

    /// Origin of the zero-area rectangle used for hidden feedback
    pub offscreen: f64,

    /// Placeholder text shown while the canvas is empty
    pub empty_canvas_message: String,

    pub components: ComponentDefaults,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            overlay_offset: 1.0,
            offscreen: -9999.0,
            empty_canvas_message: "Drop a Section or Form here. Then add cards/components inside."
                .to_string(),
            components: ComponentDefaults::default(),
        }
    }
}

impl EditorConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Set the overlay inflation offset
    pub fn with_overlay_offset(mut self, offset: f64) -> Self {
        self.overlay_offset = offset;
        self
    }

    /// Set the off-screen origin
    pub fn with_offscreen(mut self, origin: f64) -> Self {
        self.offscreen = origin;
        self
    }

    /// Set the empty-canvas placeholder text
    pub fn with_empty_canvas_message(mut self, message: impl Into<String>) -> Self {
        self.empty_canvas_message = message.into();
        self
    }

    /// Replace the component template defaults
    pub fn with_components(mut self, components: ComponentDefaults) -> Self {
        self.components = components;
        self
    }
}
