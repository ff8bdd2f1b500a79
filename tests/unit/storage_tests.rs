// Watermark file lifecycle tests
//
// At most one current watermark per project survives a write; other
// projects' files and unrelated files are never touched.

use project_identifier::storage::{
    self, fallback_directory, resolve_or_fallback, sanitize_component, CacheRootResolver,
    DirectoryResolver, StorageError,
};
use rstest::rstest;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn files_with_prefix(dir: &Path, prefix: &str) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with(prefix))
        .collect()
}

#[test]
fn test_second_write_supersedes_first() {
    let dir = TempDir::new().unwrap();

    let first = storage::write(dir.path(), "Proj", "PM", b"first").unwrap();
    let second = storage::write(dir.path(), "Proj", "XY", b"second").unwrap();

    let remaining = files_with_prefix(dir.path(), "Proj-");
    assert_eq!(remaining.len(), 1);
    assert!(remaining[0].starts_with("Proj-XY-"));
    assert!(!first.exists());
    assert_eq!(std::fs::read(second).unwrap(), b"second");
}

#[test]
fn test_names_are_sanitized() {
    let dir = TempDir::new().unwrap();
    let path = storage::write(dir.path(), "My Proj/2", "Ü:1", b"png").unwrap();

    let name = path.file_name().unwrap().to_str().unwrap().to_string();
    assert!(name.starts_with("My_Proj_2-__1-"), "{name}");
    assert!(name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')));
    let token = name
        .trim_start_matches("My_Proj_2-__1-")
        .trim_end_matches(".png");
    assert_eq!(token.len(), 10);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn test_prefix_match_is_literal() {
    let dir = TempDir::new().unwrap();
    // Shares leading characters but not the "Proj-" prefix.
    std::fs::write(dir.path().join("Project-X-0000000000.png"), b"keep").unwrap();
    std::fs::write(dir.path().join("ProjA-X-0000000000.png"), b"keep").unwrap();

    storage::write(dir.path(), "Proj", "P", b"png").unwrap();

    assert!(dir.path().join("Project-X-0000000000.png").exists());
    assert!(dir.path().join("ProjA-X-0000000000.png").exists());
}

#[test]
fn test_relative_directory_returns_absolute_path() {
    let dir = TempDir::new_in(".").unwrap();
    let relative = PathBuf::from(dir.path().file_name().unwrap());

    let path = storage::write(&relative, "Proj", "P", b"png").unwrap();
    assert!(path.is_absolute());
    assert!(path.exists());
}

#[test]
fn test_error_reports_offending_path() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("occupied");
    std::fs::write(&blocker, b"file").unwrap();

    let err = storage::write(&blocker.join("sub"), "Proj", "P", b"png").unwrap_err();
    assert!(matches!(err, StorageError::CreateDir { .. }));
    assert!(err.path().starts_with(&blocker));
}

#[test]
fn test_directory_resolution_and_fallback() {
    let root = TempDir::new().unwrap();
    let resolver = CacheRootResolver::new(root.path());
    assert_eq!(
        resolve_or_fallback(&resolver, "Proj"),
        resolver.watermark_dir("Proj").unwrap()
    );

    let fallback = resolve_or_fallback(&CacheRootResolver::unavailable(), "A B");
    assert_eq!(fallback, fallback_directory("A B"));
    assert!(fallback.ends_with(sanitize_component("A B")));
}

#[rstest]
#[case("app", "app-server")]
#[case("my app", "my app-v2")]
fn test_prefix_sharing_projects_get_separate_directories(#[case] short: &str, #[case] long: &str) {
    let root = TempDir::new().unwrap();
    let resolver = CacheRootResolver::new(root.path());

    let long_dir = resolve_or_fallback(&resolver, long);
    let short_dir = resolve_or_fallback(&resolver, short);
    let long_file = storage::write(&long_dir, long, "L", b"long").unwrap();
    let short_file = storage::write(&short_dir, short, "S", b"short").unwrap();

    assert!(long_file.exists(), "{short} cleanup removed {long}'s file");
    assert!(short_file.exists());
    assert_ne!(fallback_directory(short), fallback_directory(long));
}
