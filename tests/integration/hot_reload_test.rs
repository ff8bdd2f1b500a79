// Configuration hot reload
//
// Saving settings broadcasts the new snapshot; the pipeline's listener turns
// each change into a fresh run without a restart.

use super::test_harness::HostHarness;
use project_identifier::config::{ConfigStore, Configuration};
use project_identifier::pipeline::RunOutcome;
use project_identifier::reload::{ChangeBroadcaster, ConfigurationChanged};

#[tokio::test]
async fn test_saved_change_rerenders_watermark() {
    let host = HostHarness::new();
    let pipeline = host.pipeline("Proj");
    let _listener = pipeline.watch_config_store();

    host.store
        .save(Configuration::default().with_identifier_override(Some("ONE")))
        .unwrap();
    assert!(
        host.wait_for(|h| h.composite().map_or(false, |c| c.contains("Proj-ONE-")))
            .await
    );

    host.store
        .save(Configuration::default().with_identifier_override(Some("TWO")))
        .unwrap();
    assert!(
        host.wait_for(|h| h.composite().map_or(false, |c| c.contains("Proj-TWO-")))
            .await
    );

    let files = host.watermark_files("Proj");
    assert_eq!(files.len(), 1, "{files:?}");
    assert!(files[0].starts_with("Proj-TWO-"));
}

#[tokio::test]
async fn test_disabling_keeps_previous_watermark() {
    let host = HostHarness::new();
    let pipeline = host.pipeline("Proj");

    let RunOutcome::Applied(path) = pipeline.on_startup().await.unwrap() else {
        panic!("expected an applied run");
    };
    let before = host.composite();

    host.store
        .save(Configuration::default().with_enabled(false))
        .unwrap();
    let outcome = pipeline.on_configuration_changed().await.unwrap();

    assert_eq!(outcome, RunOutcome::Disabled);
    assert!(path.exists());
    assert_eq!(host.composite(), before);
    assert_eq!(host.repaint_count(), 1);
}

#[tokio::test]
async fn test_listener_stops_when_channel_closes() {
    let host = HostHarness::new();
    let pipeline = host.pipeline("Proj");

    let broadcaster = ChangeBroadcaster::new();
    let listener = pipeline.listen(broadcaster.subscribe());
    assert_eq!(broadcaster.receiver_count(), 1);

    broadcaster.publish(Configuration::default());
    drop(broadcaster);

    listener.await.unwrap();
    assert!(host.wait_for(|h| h.composite().is_some()).await);
}

#[tokio::test]
async fn test_lagged_listener_still_runs() {
    let host = HostHarness::new();
    let pipeline = host.pipeline("Proj");

    let (tx, rx) = tokio::sync::broadcast::channel(1);
    // Overflow the single-slot buffer before the listener starts reading.
    for _ in 0..3 {
        tx.send(ConfigurationChanged(Configuration::default())).unwrap();
    }
    let listener = pipeline.listen(rx);
    drop(tx);

    listener.await.unwrap();
    assert!(host.wait_for(|h| h.composite().is_some()).await);
}
