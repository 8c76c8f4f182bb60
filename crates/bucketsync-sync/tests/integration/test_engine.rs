//! End-to-end event processing through `BucketSyncEngine`

use std::sync::Arc;

use bucketsync_core::domain::{Entry, FullPath, MetadataEvent, MountMappings, RemoteStorageLocation};
use bucketsync_sync::bootstrap::bootstrap;
use bucketsync_sync::engine::BucketSyncEngine;
use bucketsync_sync::executor::ActionExecutor;
use bucketsync_sync::planner::Planner;
use bucketsync_sync::tracker::ConfigTracker;
use bucketsync_sync::SyncError;

use crate::common::*;

async fn engine(fx: &Fixture, create_bucket_at: Option<&str>) -> BucketSyncEngine {
    let tracker = ConfigTracker::new(CONFIG_DIR, "mount.mapping", ".conf");
    let state = bootstrap(fx.filer.as_ref(), &tracker, FullPath::new(BUCKETS).unwrap())
        .await
        .unwrap();
    BucketSyncEngine::new(
        Planner::new(tracker, create_bucket_at.map(str::to_string)),
        ActionExecutor::new(
            Arc::new(MemoryRemoteFactory {
                remote: fx.remote.clone(),
            }),
            Arc::new(InlineContent),
            fx.filer.clone(),
        ),
        state,
    )
}

#[tokio::test]
async fn test_photo_lifecycle_scenario() {
    let fx = Fixture::new();
    let mut engine = engine(&fx, Some("s3a")).await;

    // create
    let created = MetadataEvent::created("/buckets/photos", file("a.jpg", "h1", 100), 1);
    engine.process_event(&created).await.unwrap();
    assert_eq!(fx.remote.calls(), vec!["write_file s3a/photos/a.jpg"]);

    let updates = fx.filer.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].0, "/buckets/photos");
    let remote_entry = updates[0].1.remote_entry.clone().unwrap();
    assert_eq!(remote_entry.storage_name, "s3a");
    assert_eq!(remote_entry.remote_size, 4);

    // metadata only
    fx.remote.clear_calls();
    let touched = MetadataEvent::updated(
        "/buckets/photos",
        file("a.jpg", "h1", 100),
        file("a.jpg", "h1", 200),
        2,
    );
    engine.process_event(&touched).await.unwrap();
    assert_eq!(fx.remote.calls(), vec!["update_file_metadata s3a/photos/a.jpg"]);

    // delete
    fx.remote.clear_calls();
    let deleted = MetadataEvent::deleted("/buckets/photos", file("a.jpg", "h1", 200), 3);
    engine.process_event(&deleted).await.unwrap();
    assert_eq!(fx.remote.calls(), vec!["delete_file s3a/photos/a.jpg"]);
    assert!(fx.remote.object("s3a/photos/a.jpg").is_none());

    // bucket removal
    fx.remote.clear_calls();
    let bucket_gone = MetadataEvent::deleted(BUCKETS, Entry::directory("photos"), 4);
    engine.process_event(&bucket_gone).await.unwrap();
    assert_eq!(fx.remote.calls(), vec!["delete_bucket photos"]);
    assert!(fx.filer.mappings.lock().unwrap().is_empty());
    assert!(engine.state().mappings().is_empty());
}

#[tokio::test]
async fn test_replayed_creation_is_idempotent() {
    let fx = Fixture::new();
    let mut engine = engine(&fx, None).await;
    let created = MetadataEvent::created("/buckets/photos", file("a.jpg", "h1", 100), 1);

    engine.process_event(&created).await.unwrap();
    let first = fx.remote.objects.lock().unwrap().clone();
    engine.process_event(&created).await.unwrap();

    assert_eq!(*fx.remote.objects.lock().unwrap(), first);
    assert_eq!(first.len(), 1);
}

#[tokio::test]
async fn test_content_change_reuploads() {
    let fx = Fixture::new();
    let mut engine = engine(&fx, None).await;

    let changed = MetadataEvent::updated(
        "/buckets/photos",
        file("a.jpg", "h1", 100),
        file("a.jpg", "h2", 200),
        1,
    );
    engine.process_event(&changed).await.unwrap();

    assert_eq!(fx.remote.calls(), vec!["write_file s3a/photos/a.jpg"]);
    assert_eq!(fx.remote.object("s3a/photos/a.jpg").unwrap(), b"3,h2".to_vec());
}

#[tokio::test]
async fn test_entries_from_remote_are_not_sent_back() {
    let fx = Fixture::new();
    let mut engine = engine(&fx, None).await;

    let created = MetadataEvent::created("/buckets/photos", file("a.jpg", "h1", 100), 1);
    engine.process_event(&created).await.unwrap();
    let synced = fx.filer.updates()[0].1.clone();
    fx.remote.clear_calls();

    // the write-back itself comes around as an update event
    let echo = MetadataEvent::updated("/buckets/photos", file("a.jpg", "h1", 100), synced, 2);
    engine.process_event(&echo).await.unwrap();
    assert!(fx.remote.calls().is_empty());
}

#[tokio::test]
async fn test_edit_after_sync_is_uploaded_despite_remote_clock() {
    let fx = Fixture::new();
    let mut engine = engine(&fx, None).await;

    let created = MetadataEvent::created("/buckets/photos", file("a.jpg", "h1", 100), 1);
    engine.process_event(&created).await.unwrap();
    let synced = fx.filer.updates()[0].1.clone();
    let mut remote = synced.remote_entry.clone().unwrap();
    assert!(remote.remote_mtime > synced.attributes.mtime);
    fx.remote.clear_calls();

    // edited locally after the sync stamp, still before the remote's mtime
    let later = remote.last_local_sync_ts_ns / 1_000_000_000 + 60;
    remote.remote_mtime = later + 3_600;
    let mut edited = file("a.jpg", "h2", later);
    edited.remote_entry = Some(remote);
    let edit = MetadataEvent::updated("/buckets/photos", synced, edited, 2);
    engine.process_event(&edit).await.unwrap();

    assert_eq!(fx.remote.calls(), vec!["write_file s3a/photos/a.jpg"]);
    assert_eq!(fx.remote.object("s3a/photos/a.jpg").unwrap(), b"3,h2".to_vec());
}

#[tokio::test]
async fn test_rename_between_mapped_buckets() {
    let fx = Fixture::new();
    let mut engine = engine(&fx, None).await;

    let mut mappings = engine.state().mappings().clone();
    mappings.insert("/buckets/docs", RemoteStorageLocation::new("s3a", "archive", "/docs"));
    let remap = MetadataEvent::updated(
        CONFIG_DIR,
        Entry::file("mount.mapping"),
        mount_file_entry(&mappings),
        1,
    );
    engine.process_event(&remap).await.unwrap();
    assert!(fx.remote.calls().is_empty());

    let moved = MetadataEvent::renamed(
        "/buckets/photos/2024",
        file("scan.pdf", "h9", 100),
        "/buckets/docs/inbox",
        file("scan.pdf", "h9", 100),
        2,
    );
    engine.process_event(&moved).await.unwrap();

    assert_eq!(
        fx.remote.calls(),
        vec![
            "delete_file s3a/photos/2024/scan.pdf",
            "write_file s3a/archive/docs/inbox/scan.pdf",
        ]
    );
}

#[tokio::test]
async fn test_rename_directory_inside_bucket() {
    let fx = Fixture::new();
    let mut engine = engine(&fx, None).await;

    let renamed = MetadataEvent::updated(
        "/buckets/photos",
        Entry::directory("2023"),
        Entry::directory("old"),
        1,
    );
    engine.process_event(&renamed).await.unwrap();
    assert_eq!(
        fx.remote.calls(),
        vec!["remove_directory s3a/photos/2023", "write_directory s3a/photos/old"]
    );

    fx.remote.clear_calls();
    let touched = MetadataEvent::updated(
        "/buckets/photos",
        Entry::directory("old"),
        Entry::directory("old").with_mtime(9),
        2,
    );
    engine.process_event(&touched).await.unwrap();
    assert!(fx.remote.calls().is_empty());
}

#[tokio::test]
async fn test_new_bucket_is_created_and_replicated() {
    let fx = Fixture::new();
    let mut engine = engine(&fx, Some("s3a")).await;

    let bucket = MetadataEvent::created(BUCKETS, Entry::directory("videos"), 1);
    engine.process_event(&bucket).await.unwrap();
    assert_eq!(
        fx.filer.mappings.lock().unwrap().get("/buckets/videos"),
        Some(&RemoteStorageLocation::new("s3a", "videos", "/"))
    );

    let clip = MetadataEvent::created("/buckets/videos", file("clip.mp4", "v1", 100), 2);
    engine.process_event(&clip).await.unwrap();

    assert_eq!(
        fx.remote.calls(),
        vec!["create_bucket videos", "write_file s3a/videos/clip.mp4"]
    );
}

#[tokio::test]
async fn test_bucket_rename_creates_new_then_deletes_old() {
    let fx = Fixture::new();
    let mut engine = engine(&fx, Some("s3a")).await;

    let renamed = MetadataEvent::updated(
        BUCKETS,
        Entry::directory("photos"),
        Entry::directory("pictures"),
        1,
    );
    engine.process_event(&renamed).await.unwrap();

    assert_eq!(
        fx.remote.calls(),
        vec!["create_bucket pictures", "delete_bucket photos"]
    );
    let mappings = engine.state().mappings();
    assert!(mappings.get("/buckets/photos").is_none());
    assert!(mappings.get("/buckets/pictures").is_some());
}

#[tokio::test]
async fn test_bucket_creation_without_target_fails() {
    let fx = Fixture::new();
    let mut engine = engine(&fx, None).await;

    let bucket = MetadataEvent::created(BUCKETS, Entry::directory("videos"), 1);
    let err = engine.process_event(&bucket).await.unwrap_err();

    assert!(format!("{err:#}").contains("create /buckets/videos"));
    assert!(matches!(
        err.downcast_ref::<SyncError>(),
        Some(SyncError::NoCreateTarget(_))
    ));
    assert!(fx.remote.calls().is_empty());
}

#[tokio::test]
async fn test_unmapped_and_unconfigured_buckets_are_skipped() {
    let fx = Fixture::new();
    let mut engine = engine(&fx, None).await;

    let unmapped = MetadataEvent::created("/buckets/videos", file("clip.mp4", "v1", 1), 1);
    engine.process_event(&unmapped).await.unwrap();

    let mut mappings = MountMappings::new();
    mappings.insert("/buckets/photos", RemoteStorageLocation::new("gcs", "photos", "/"));
    let remap = MetadataEvent::created(CONFIG_DIR, mount_file_entry(&mappings), 2);
    engine.process_event(&remap).await.unwrap();

    let unconfigured = MetadataEvent::created("/buckets/photos", file("a.jpg", "h1", 1), 3);
    engine.process_event(&unconfigured).await.unwrap();

    assert!(fx.remote.calls().is_empty());
}

#[tokio::test]
async fn test_remote_conf_events_update_registry() {
    let fx = Fixture::new();
    let mut engine = engine(&fx, None).await;

    let removed = MetadataEvent::deleted(CONFIG_DIR, conf_entry("s3a.conf", "s3a", "s3"), 1);
    engine.process_event(&removed).await.unwrap();
    let skipped = MetadataEvent::created("/buckets/photos", file("a.jpg", "h1", 1), 2);
    engine.process_event(&skipped).await.unwrap();
    assert!(fx.remote.calls().is_empty());

    let added = MetadataEvent::created(CONFIG_DIR, conf_entry("s3a.conf", "s3a", "s3"), 3);
    engine.process_event(&added).await.unwrap();
    engine.process_event(&skipped).await.unwrap();
    assert_eq!(fx.remote.calls(), vec!["write_file s3a/photos/a.jpg"]);
}

#[tokio::test]
async fn test_malformed_config_fails_without_changing_state() {
    let fx = Fixture::new();
    let mut engine = engine(&fx, None).await;
    let before = engine.state().mappings().clone();

    let broken = MetadataEvent::created(
        CONFIG_DIR,
        Entry::file("mount.mapping").with_content("{broken"),
        1,
    );
    let err = engine.process_event(&broken).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<SyncError>(),
        Some(SyncError::ConfigDecode { .. })
    ));
    assert_eq!(engine.state().mappings(), &before);
}

#[tokio::test]
async fn test_remote_failure_aborts_event() {
    let fx = Fixture::new();
    let mut engine = engine(&fx, None).await;
    *fx.remote.fail_writes.lock().unwrap() = true;

    let created = MetadataEvent::created("/buckets/photos", file("a.jpg", "h1", 100), 1);
    let err = engine.process_event(&created).await.unwrap_err();

    let message = format!("{err:#}");
    assert!(message.contains("create /buckets/photos/a.jpg"));
    assert!(message.contains("connection reset by peer"));
    assert!(fx.filer.updates().is_empty());
}

#[tokio::test]
async fn test_unsupported_remote_kind_is_an_error() {
    let fx = Fixture::new();
    fx.filer.put(CONFIG_DIR, conf_entry("s3a.conf", "s3a", "unsupported"));
    let mut engine = engine(&fx, None).await;

    let created = MetadataEvent::created("/buckets/photos", file("a.jpg", "h1", 100), 1);
    let err = engine.process_event(&created).await.unwrap_err();
    assert!(format!("{err:#}").contains("unsupported remote storage type"));
}
