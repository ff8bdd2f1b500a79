//! Composite background property reconciliation.
//!
//! The host display mechanism accepts a single string of four comma-separated
//! fields:
//!
//! ```text
//! path,opacity_percent,fill_style,anchor
//! ```
//!
//! The last three fields never contain a comma, so a `path` that does is still
//! read back intact. Only `path` is owned by this crate. Opacity, fill style and anchor belong to
//! the user and are carried over verbatim when present and valid; missing or
//! unparsable fields fall back to documented defaults one by one.
//!
//! ```
//! use project_identifier::background::reconcile;
//!
//! assert_eq!(reconcile(None, "/a/b.png"), "/a/b.png,15,plain,bottom_right");
//! assert_eq!(
//!     reconcile(Some("/old.png,40,tile,center"), "/new.png"),
//!     "/new.png,40,tile,center"
//! );
//! ```

use crate::constants::{
    COMPOSITE_SEPARATOR, DEFAULT_OPACITY_PERCENT, MAX_OPACITY_PERCENT, MIN_OPACITY_PERCENT,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the image fills the editor background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillStyle {
    /// Drawn once at its natural size
    #[default]
    Plain,
    /// Stretched to the background area
    Scale,
    /// Repeated across the background area
    Tile,
    /// Centered at its natural size
    Center,
}

impl FillStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Scale => "scale",
            Self::Tile => "tile",
            Self::Center => "center",
        }
    }
}

impl FromStr for FillStyle {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain" => Ok(Self::Plain),
            "scale" => Ok(Self::Scale),
            "tile" => Ok(Self::Tile),
            "center" => Ok(Self::Center),
            _ => Err(()),
        }
    }
}

impl fmt::Display for FillStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the image is anchored within the background area (9-grid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    MiddleLeft,
    Center,
    MiddleRight,
    BottomLeft,
    BottomCenter,
    #[default]
    BottomRight,
}

impl Anchor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopLeft => "top_left",
            Self::TopCenter => "top_center",
            Self::TopRight => "top_right",
            Self::MiddleLeft => "middle_left",
            Self::Center => "center",
            Self::MiddleRight => "middle_right",
            Self::BottomLeft => "bottom_left",
            Self::BottomCenter => "bottom_center",
            Self::BottomRight => "bottom_right",
        }
    }
}

impl FromStr for Anchor {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top_left" => Ok(Self::TopLeft),
            "top_center" => Ok(Self::TopCenter),
            "top_right" => Ok(Self::TopRight),
            "middle_left" => Ok(Self::MiddleLeft),
            "center" => Ok(Self::Center),
            "middle_right" => Ok(Self::MiddleRight),
            "bottom_left" => Ok(Self::BottomLeft),
            "bottom_center" => Ok(Self::BottomCenter),
            "bottom_right" => Ok(Self::BottomRight),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed form of the composite property string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundProperties {
    pub path: String,
    pub opacity_percent: u8,
    pub fill: FillStyle,
    pub anchor: Anchor,
}

impl Default for BackgroundProperties {
    fn default() -> Self {
        Self {
            path: String::new(),
            opacity_percent: DEFAULT_OPACITY_PERCENT,
            fill: FillStyle::default(),
            anchor: Anchor::default(),
        }
    }
}

impl BackgroundProperties {
    /// Parse a composite string; absent input and bad fields become defaults.
    pub fn parse(existing: Option<&str>) -> Self {
        let Some(existing) = existing else {
            return Self::default();
        };

        let [path, opacity, fill, anchor] = split_fields(existing);
        let path = path.unwrap_or_default().to_string();
        let opacity_percent = opacity
            .and_then(parse_opacity)
            .unwrap_or(DEFAULT_OPACITY_PERCENT);
        let fill = fill.and_then(|s| s.parse().ok()).unwrap_or_default();
        let anchor = anchor.and_then(|s| s.parse().ok()).unwrap_or_default();

        Self {
            path,
            opacity_percent,
            fill,
            anchor,
        }
    }

    /// Same properties with a different path.
    pub fn with_path(self, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..self
        }
    }

    /// Same path with opacity, fill and anchor reset to defaults.
    pub fn reset(self) -> Self {
        Self {
            path: self.path,
            ..Self::default()
        }
    }

    /// Render as `path,opacity,style,anchor`.
    pub fn to_composite(&self) -> String {
        format!(
            "{path}{sep}{opacity}{sep}{fill}{sep}{anchor}",
            path = self.path,
            opacity = self.opacity_percent,
            fill = self.fill,
            anchor = self.anchor,
            sep = COMPOSITE_SEPARATOR,
        )
    }
}

impl fmt::Display for BackgroundProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_composite())
    }
}

/// Split into `[path, opacity, fill, anchor]`, each trimmed.
///
/// With four or more fields the last three are the settings and everything
/// before them is the path, so paths may contain the separator. Shorter
/// strings are read left to right.
fn split_fields(existing: &str) -> [Option<&str>; 4] {
    if existing.matches(COMPOSITE_SEPARATOR).count() >= 3 {
        let mut fields = existing.rsplitn(4, COMPOSITE_SEPARATOR).map(str::trim);
        let anchor = fields.next();
        let fill = fields.next();
        let opacity = fields.next();
        [fields.next(), opacity, fill, anchor]
    } else {
        let mut fields = existing.split(COMPOSITE_SEPARATOR).map(str::trim);
        [fields.next(), fields.next(), fields.next(), None]
    }
}

/// Parse an integer percentage, clamped to `[0, 100]`.
fn parse_opacity(field: &str) -> Option<u8> {
    field
        .parse::<i64>()
        .ok()
        .map(|value| value.clamp(MIN_OPACITY_PERCENT, MAX_OPACITY_PERCENT) as u8)
}

/// Replace the path of `existing`, preserving the user's other fields.
pub fn reconcile(existing: Option<&str>, new_path: &str) -> String {
    BackgroundProperties::parse(existing)
        .with_path(new_path)
        .to_composite()
}

/// Keep the path of `existing` and force every other field to its default.
pub fn reset_to_defaults(existing: Option<&str>) -> String {
    BackgroundProperties::parse(existing).reset().to_composite()
}
