// Configuration module
//
// One canonical, immutable configuration record. Every change produces a new
// value; the store port persists it and broadcasts the new snapshot.

pub mod store;

pub use store::{ConfigStore, MemoryConfigStore, YamlConfigStore};

use crate::watermark::{parse_hex_color, TextRenderOptions};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Environment variable '{0}' is referenced but not set")]
    MissingEnvVar(String),

    #[error("Invalid substitution pattern: {0}")]
    Pattern(#[from] regex::Error),
}

fn default_enabled() -> bool {
    true
}

/// Watermark configuration.
///
/// Documents written before the `enabled` flag existed deserialize as
/// enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    /// Gate for running the pipeline at all (default: true)
    #[serde(default = "default_enabled")]
    enabled: bool,

    /// Text shown instead of the derived identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    identifier_override: Option<String>,

    /// Requested font family; absent means the renderer default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    font_family: Option<String>,

    /// Requested font size in pixels; absent means the renderer default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    font_size_px: Option<i32>,

    /// Packed `0xAARRGGBB` text colour; written as `#AARRGGBB`
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "argb_color"
    )]
    text_color_argb: Option<u32>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            identifier_override: None,
            font_family: None,
            font_size_px: None,
            text_color_argb: None,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl Configuration {
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn identifier_override(&self) -> Option<&str> {
        self.identifier_override.as_deref()
    }

    pub fn font_family(&self) -> Option<&str> {
        self.font_family.as_deref()
    }

    pub fn font_size_px(&self) -> Option<i32> {
        self.font_size_px
    }

    pub fn text_color_argb(&self) -> Option<u32> {
        self.text_color_argb
    }

    pub fn with_enabled(self, enabled: bool) -> Self {
        Self { enabled, ..self }
    }

    pub fn with_identifier_override(self, text: Option<impl Into<String>>) -> Self {
        Self {
            identifier_override: non_blank(text.map(Into::into)),
            ..self
        }
    }

    pub fn with_font_family(self, family: Option<impl Into<String>>) -> Self {
        Self {
            font_family: non_blank(family.map(Into::into)),
            ..self
        }
    }

    pub fn with_font_size_px(self, size: Option<i32>) -> Self {
        Self {
            font_size_px: size.map(|s| s.max(1)),
            ..self
        }
    }

    pub fn with_text_color_argb(self, argb: Option<u32>) -> Self {
        Self {
            text_color_argb: argb,
            ..self
        }
    }

    /// Blank strings become absent and non-positive sizes become 1.
    pub fn normalized(self) -> Self {
        let Self {
            enabled,
            identifier_override,
            font_family,
            font_size_px,
            text_color_argb,
        } = self;
        Self {
            enabled,
            identifier_override: non_blank(identifier_override),
            font_family: non_blank(font_family),
            font_size_px: font_size_px.map(|s| s.max(1)),
            text_color_argb,
        }
    }

    /// Style overrides handed to the renderer.
    pub fn text_render_options(&self) -> TextRenderOptions {
        TextRenderOptions {
            font_family: self.font_family.clone(),
            font_size_px: self.font_size_px,
            color_argb: self.text_color_argb,
        }
    }

    /// Parse YAML after replacing `${VAR_NAME}` with environment values.
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, ConfigError> {
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")?;

        // First, check that all referenced environment variables exist
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            if std::env::var(var_name).is_err() {
                return Err(ConfigError::MissingEnvVar(var_name.to_string()));
            }
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        if substituted.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Configuration = serde_yaml::from_str(&substituted)?;
        Ok(config.normalized())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Serde adapter for the packed colour: accepts an unsigned or signed 32-bit
/// integer or a hex string, writes `#AARRGGBB`.
mod argb_color {
    use super::parse_hex_color;
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Packed(u32),
        Signed(i64),
        Hex(String),
    }

    pub fn serialize<S: Serializer>(value: &Option<u32>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(argb) => serializer.serialize_str(&format!("#{:08X}", argb)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
        match Option::<Raw>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Raw::Packed(argb)) => Ok(Some(argb)),
            Some(Raw::Signed(value)) => i32::try_from(value)
                .map(|v| Some(v as u32))
                .map_err(|_| de::Error::custom(format!("colour {} is out of range", value))),
            Some(Raw::Hex(hex)) => parse_hex_color(&hex)
                .map(|color| Some(color.to_argb()))
                .map_err(de::Error::custom),
        }
    }
}
