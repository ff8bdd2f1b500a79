//! Font catalog capability.
//!
//! The renderer never enumerates host fonts itself. It is handed a
//! [`FontCatalog`] that answers two questions: which family names exist, and
//! how to load one of them. A bundled DejaVu Sans face is always available as
//! the generic sans-serif fallback.

use super::WatermarkError;
use crate::constants::FALLBACK_FONT_FAMILY;
use ab_glyph::{FontArc, FontVec};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::OnceLock;

/// Bundled generic sans-serif face (DejaVu Sans, Bitstream Vera derived license).
const EMBEDDED_FONT_DATA: &[u8] = include_bytes!("fonts/DejaVuSans.ttf");

static FALLBACK_FONT: OnceLock<Result<FontArc, WatermarkError>> = OnceLock::new();

/// Get the bundled fallback font, parsing it once.
pub fn fallback_font() -> Result<FontArc, WatermarkError> {
    FALLBACK_FONT
        .get_or_init(|| {
            FontArc::try_from_slice(EMBEDDED_FONT_DATA)
                .map_err(|e| WatermarkError::FontError(format!("embedded font: {}", e)))
        })
        .clone()
}

/// Source of fonts available to the renderer.
pub trait FontCatalog: Send + Sync {
    /// Family names known to the host, or `None` when they cannot be enumerated.
    fn family_names(&self) -> Option<BTreeSet<String>>;

    /// Load a regular face of `family`, if the catalog has one.
    fn load(&self, family: &str) -> Option<FontArc>;
}

/// Catalog containing only the bundled fallback face.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedFontCatalog;

impl FontCatalog for EmbeddedFontCatalog {
    fn family_names(&self) -> Option<BTreeSet<String>> {
        Some(BTreeSet::from([FALLBACK_FONT_FAMILY.to_string()]))
    }

    fn load(&self, family: &str) -> Option<FontArc> {
        if family == FALLBACK_FONT_FAMILY {
            fallback_font().ok()
        } else {
            None
        }
    }
}

/// Catalog backed by a `fontdb` database of host fonts.
pub struct SystemFontCatalog {
    db: fontdb::Database,
    families: BTreeSet<String>,
}

impl SystemFontCatalog {
    /// Enumerate the fonts installed on this machine.
    pub fn new() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        Self::from_database(db)
    }

    /// Enumerate the fonts installed on this machine plus those under `dir`.
    pub fn with_fonts_dir(dir: &Path) -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        if dir.is_dir() {
            db.load_fonts_dir(dir);
        } else {
            tracing::warn!(dir = %dir.display(), "Font directory does not exist; using system fonts only");
        }
        Self::from_database(db)
    }

    /// Wrap an already populated database.
    pub fn from_database(db: fontdb::Database) -> Self {
        let families: BTreeSet<String> = db
            .faces()
            .flat_map(|face| face.families.iter().map(|(name, _)| name.clone()))
            .collect();
        tracing::debug!(
            faces = db.len(),
            families = families.len(),
            "Font catalog built"
        );
        Self { db, families }
    }

    /// Number of faces known to the catalog.
    pub fn face_count(&self) -> usize {
        self.db.len()
    }
}

impl Default for SystemFontCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl FontCatalog for SystemFontCatalog {
    fn family_names(&self) -> Option<BTreeSet<String>> {
        if self.families.is_empty() {
            None
        } else {
            Some(self.families.clone())
        }
    }

    fn load(&self, family: &str) -> Option<FontArc> {
        let families = [fontdb::Family::Name(family)];
        let query = fontdb::Query {
            families: &families,
            ..Default::default()
        };
        let id = self.db.query(&query)?;

        let parsed = self.db.with_face_data(id, |data, index| {
            FontVec::try_from_vec_and_index(data.to_vec(), index)
        })?;

        match parsed {
            Ok(font) => Some(FontArc::new(font)),
            Err(e) => {
                tracing::warn!(family = family, error = %e, "Failed to parse font face");
                None
            }
        }
    }
}
