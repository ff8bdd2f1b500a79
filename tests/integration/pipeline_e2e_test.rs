// End-to-end pipeline runs
//
// Startup trigger -> derived text -> PNG in the cache directory -> composite
// property and auxiliary keys -> repaint.

use super::test_harness::HostHarness;
use project_identifier::config::{ConfigStore, Configuration};
use project_identifier::constants::{
    KEY_BACKGROUND_ANCHOR, KEY_BACKGROUND_FILL, KEY_BACKGROUND_IMAGE, KEY_BACKGROUND_OPACITY,
};
use project_identifier::background::PropertyStore;
use project_identifier::pipeline::{interactive_channel, RunOutcome};
use std::sync::Arc;

#[tokio::test]
async fn test_startup_installs_watermark() {
    let host = HostHarness::new();
    let pipeline = host.pipeline("My Awesome Project");

    let outcome = pipeline.on_startup().await.unwrap();
    let RunOutcome::Applied(path) = outcome else {
        panic!("expected an applied run, got {outcome:?}");
    };

    assert!(path.is_absolute());
    assert!(path.starts_with(host.watermark_dir("My Awesome Project")));
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("My_Awesome_Project-MAP-"));
    assert!(name.ends_with(".png"));

    let png = std::fs::read(&path).unwrap();
    let image = image::load_from_memory(&png).unwrap().to_rgba8();
    assert!(image.width() > 50 && image.height() > 10);

    assert_eq!(
        host.composite(),
        Some(format!("{},15,plain,bottom_right", path.display()))
    );
    assert_eq!(host.properties.value(KEY_BACKGROUND_OPACITY).as_deref(), Some("15"));
    assert_eq!(host.properties.value(KEY_BACKGROUND_FILL).as_deref(), Some("plain"));
    assert_eq!(host.properties.value(KEY_BACKGROUND_ANCHOR).as_deref(), Some("bottom_right"));
    assert_eq!(host.repaint_count(), 1);
}

#[tokio::test]
async fn test_user_choices_survive_a_new_watermark() {
    let host = HostHarness::new();
    host.properties
        .set(KEY_BACKGROUND_IMAGE, "/somewhere/else.png,35,tile,top_right")
        .unwrap();

    let pipeline = host.pipeline("Proj");
    let RunOutcome::Applied(path) = pipeline.on_startup().await.unwrap() else {
        panic!("expected an applied run");
    };

    assert_eq!(
        host.composite(),
        Some(format!("{},35,tile,top_right", path.display()))
    );
    assert_eq!(host.properties.value(KEY_BACKGROUND_OPACITY).as_deref(), Some("35"));
}

#[tokio::test]
async fn test_disabled_configuration_has_no_effect() {
    let host = HostHarness::new();
    host.store
        .save(Configuration::default().with_enabled(false))
        .unwrap();

    let outcome = host.pipeline("Proj").on_startup().await.unwrap();

    assert_eq!(outcome, RunOutcome::Disabled);
    assert!(host.watermark_files("Proj").is_empty());
    assert!(!host.watermark_dir("Proj").exists());
    assert_eq!(host.composite(), None);
    assert_eq!(host.repaint_count(), 0);
}

#[tokio::test]
async fn test_legacy_settings_without_enabled_flag_run() {
    let host = HostHarness::new();
    std::fs::create_dir_all(host.store.path().parent().unwrap()).unwrap();
    std::fs::write(host.store.path(), "identifier_override: LEG\n").unwrap();

    let outcome = host.pipeline("Proj").on_startup().await.unwrap();

    assert!(matches!(outcome, RunOutcome::Applied(_)));
    assert!(host.watermark_files("Proj")[0].starts_with("Proj-LEG-"));
}

#[tokio::test]
async fn test_malformed_settings_fail_quietly() {
    let host = HostHarness::new();
    std::fs::create_dir_all(host.store.path().parent().unwrap()).unwrap();
    std::fs::write(host.store.path(), "enabled: {broken\n").unwrap();

    let outcome = host.pipeline("Proj").on_startup().await.unwrap();

    assert_eq!(outcome, RunOutcome::Failed);
    assert!(host.watermark_files("Proj").is_empty());
    assert_eq!(host.composite(), None);
}

#[tokio::test]
async fn test_blank_project_name_still_writes_an_image() {
    let host = HostHarness::new();

    let RunOutcome::Applied(path) = host.pipeline("   ").on_startup().await.unwrap() else {
        panic!("expected an applied run");
    };

    let png = std::fs::read(path).unwrap();
    let image = image::load_from_memory(&png).unwrap();
    assert_eq!((image.width(), image.height()), (1, 1));
}

#[tokio::test]
async fn test_interactive_queue_applies_on_drain() {
    let host = HostHarness::new();
    let (dispatcher, mut queue) = interactive_channel();
    let pipeline = host.pipeline_with_dispatcher("Proj", Some(Arc::new(dispatcher)));

    let outcome = pipeline.on_startup().await.unwrap();
    assert!(matches!(outcome, RunOutcome::Applied(_)));
    assert_eq!(host.composite(), None);
    assert_eq!(host.repaint_count(), 0);

    assert_eq!(queue.run_pending(), 1);
    assert!(host.composite().is_some());
    assert_eq!(host.repaint_count(), 1);
}

#[tokio::test]
async fn test_reset_background_restores_defaults() {
    let host = HostHarness::new();
    host.properties
        .set(KEY_BACKGROUND_IMAGE, "/img.png,80,center,top_left")
        .unwrap();

    host.pipeline("Proj").reset_background();

    assert_eq!(host.composite().as_deref(), Some("/img.png,15,plain,bottom_right"));
    assert_eq!(host.properties.value(KEY_BACKGROUND_ANCHOR).as_deref(), Some("bottom_right"));
    assert_eq!(host.repaint_count(), 1);
}

#[tokio::test]
async fn test_settings_file_styles_the_image() {
    let host = HostHarness::new();
    host.store
        .save(
            Configuration::default()
                .with_font_size_px(Some(48))
                .with_text_color_argb(Some(0xFF20_4060)),
        )
        .unwrap();

    let RunOutcome::Applied(path) = host.pipeline("Proj").on_startup().await.unwrap() else {
        panic!("expected an applied run");
    };

    let image = image::load_from_memory(&std::fs::read(path).unwrap())
        .unwrap()
        .to_rgba8();
    assert!(image.pixels().any(|p| p.0 == [0x20, 0x40, 0x60, 0xFF]));
}

#[tokio::test]
async fn test_absurd_font_size_still_completes() {
    let host = HostHarness::new();
    host.store
        .save(Configuration::default().with_font_size_px(Some(i32::MAX)))
        .unwrap();

    let RunOutcome::Applied(path) = host.pipeline("Proj").on_startup().await.unwrap() else {
        panic!("expected an applied run");
    };

    let image = image::load_from_memory(&std::fs::read(path).unwrap()).unwrap();
    assert_eq!((image.width(), image.height()), (1, 1));
    assert!(host.composite().is_some());
}
