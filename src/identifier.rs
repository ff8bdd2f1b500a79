//! Identifier derivation.
//!
//! Turns a project name into a short acronym: the first character of every
//! run of Unicode letters/digits, uppercased, in order.
//!
//! ```
//! use project_identifier::identifier::generate;
//!
//! assert_eq!(generate("My Awesome Project"), "MAP");
//! assert_eq!(generate("foo-bar_baz"), "FBB");
//! ```

use regex::Regex;
use std::sync::OnceLock;

static TOKEN_PATTERN: OnceLock<Regex> = OnceLock::new();

fn token_pattern() -> &'static Regex {
    TOKEN_PATTERN.get_or_init(|| {
        // Pattern is a literal; failing to compile it is a programming error.
        Regex::new(r"[\p{L}\p{N}]+").expect("token pattern is valid")
    })
}

/// Derive a concise identifier from `name`.
///
/// Blank input yields an empty string.
pub fn generate(name: &str) -> String {
    if name.trim().is_empty() {
        return String::new();
    }

    token_pattern()
        .find_iter(name)
        .filter_map(|token| token.as_str().chars().next())
        .map(uppercase_char)
        .collect()
}

/// Uppercase a single character, keeping it unchanged when its uppercase form
/// expands to several characters (e.g. `ß`).
fn uppercase_char(c: char) -> char {
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(single), None) => single,
        _ => c,
    }
}
