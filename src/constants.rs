// Constants module - centralized default values
//
// Every documented default and limit used by the watermark pipeline lives here
// so that renderer, reconciler and file manager agree on the same numbers.

// =============================================================================
// Rendering defaults
// =============================================================================

/// Default font size in pixels when none is configured (108pt at 96 DPI)
pub const DEFAULT_FONT_SIZE_PX: u32 = 144;

/// Smallest font size the renderer will use; smaller requests are clamped up
pub const MIN_FONT_SIZE_PX: u32 = 1;

/// Transparent margin added to the right of the measured text
pub const MARGIN_RIGHT_PX: u32 = 50;

/// Transparent margin added below the text descent
pub const MARGIN_BOTTOM_PX: u32 = 10;

/// Default text colour: white at roughly 15% alpha (0x26 = 38/255)
pub const DEFAULT_TEXT_COLOR_ARGB: u32 = 0x26FF_FFFF;

/// Largest canvas the renderer will allocate, in pixels (4096 x 4096).
/// Larger requests render the blank image instead.
pub const MAX_CANVAS_PIXELS: u64 = 4096 * 4096;

/// Family name of the bundled generic sans-serif face
pub const FALLBACK_FONT_FAMILY: &str = "DejaVu Sans";

// =============================================================================
// Composite background property defaults
// =============================================================================

/// Default background opacity in percent
pub const DEFAULT_OPACITY_PERCENT: u8 = 15;

/// Lower bound for a parsed opacity value
pub const MIN_OPACITY_PERCENT: i64 = 0;

/// Upper bound for a parsed opacity value
pub const MAX_OPACITY_PERCENT: i64 = 100;

/// Separator between fields of the composite property string
pub const COMPOSITE_SEPARATOR: char = ',';

/// Host property key holding the composite string
pub const KEY_BACKGROUND_IMAGE: &str = "background.image";

/// Auxiliary host property keys read by the host's settings UI
pub const KEY_BACKGROUND_OPACITY: &str = "background.image.opacity";
pub const KEY_BACKGROUND_FILL: &str = "background.image.fill";
pub const KEY_BACKGROUND_ANCHOR: &str = "background.image.anchor";

// =============================================================================
// Storage defaults
// =============================================================================

/// Sub-directory created under the host cache root (and the temp dir fallback)
pub const WATERMARK_DIR_NAME: &str = "project-identifier";

/// Number of hex characters in the unique file token
pub const FILE_TOKEN_LENGTH: usize = 10;

/// Extension of every generated watermark file
pub const WATERMARK_FILE_EXTENSION: &str = "png";

// =============================================================================
// Logging & events
// =============================================================================

/// Maximum number of characters of user-provided text shown in log lines
pub const LOG_PREVIEW_LENGTH: usize = 64;

/// Buffer size of the configuration change channel
pub const CHANGE_BROADCAST_BUFFER_SIZE: usize = 16;

/// Truncate `text` to [`LOG_PREVIEW_LENGTH`] characters for logging.
pub fn log_preview(text: &str) -> String {
    if text.chars().count() > LOG_PREVIEW_LENGTH {
        let mut preview: String = text.chars().take(LOG_PREVIEW_LENGTH).collect();
        preview.push('…');
        preview
    } else {
        text.to_string()
    }
}
