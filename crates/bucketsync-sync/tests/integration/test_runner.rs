//! Subscription runner and supervisor behavior

use std::sync::Arc;
use std::time::Duration;

use bucketsync_core::config::ConfigBuilder;
use bucketsync_core::domain::{Entry, MetadataEvent};
use bucketsync_sync::runner::{BucketSyncRunner, RunOutcome};
use bucketsync_sync::SyncError;
use tokio_util::sync::CancellationToken;

use crate::common::*;

const ROOT_CREATED_NS: i64 = 1_600_000_000 * 1_000_000_000;

fn runner(fx: &Fixture, subscriber: Arc<ScriptedSubscriber>) -> BucketSyncRunner {
    BucketSyncRunner::from_config(&config(), fx.ports(subscriber)).unwrap()
}

fn photo(name: &str, ts_ns: i64) -> MetadataEvent {
    MetadataEvent::created("/buckets/photos", file(name, name, 100), ts_ns)
}

#[tokio::test]
async fn test_run_once_processes_stream_in_order() {
    let fx = Fixture::new();
    let subscriber = Arc::new(ScriptedSubscriber::new(vec![Script::events(vec![
        photo("a.jpg", ROOT_CREATED_NS + 10),
        MetadataEvent::deleted("/buckets/photos", file("a.jpg", "a.jpg", 100), ROOT_CREATED_NS + 20),
        photo("b.jpg", ROOT_CREATED_NS + 30),
    ])]));
    let runner = runner(&fx, subscriber.clone());

    let outcome = runner.run_once(&CancellationToken::new()).await.unwrap();

    assert_eq!(outcome, RunOutcome::StreamEnded);
    assert_eq!(
        fx.remote.calls(),
        vec![
            "write_file s3a/photos/a.jpg",
            "delete_file s3a/photos/a.jpg",
            "write_file s3a/photos/b.jpg",
        ]
    );
    // first event flushes immediately, the rest on termination
    assert_eq!(
        fx.offsets.writes(),
        vec![ROOT_CREATED_NS + 10, ROOT_CREATED_NS + 30]
    );
}

#[tokio::test]
async fn test_subscription_request_shape() {
    let fx = Fixture::new();
    let subscriber = Arc::new(ScriptedSubscriber::new(vec![Script::events(Vec::new())]));
    let config = ConfigBuilder::new()
        .buckets_dir("/buckets")
        .job_name("replicate.primary")
        .exclude_prefix("/buckets/tmp")
        .build();
    let runner = BucketSyncRunner::from_config(&config, fx.ports(subscriber.clone())).unwrap();

    runner.run_once(&CancellationToken::new()).await.unwrap();

    let requests = subscriber.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.client_name, "replicate.primary");
    assert_eq!(request.path_prefix, "/buckets");
    assert_eq!(request.additional_prefixes, vec!["/etc/remote".to_string()]);
    assert_eq!(request.excluded_prefixes, vec!["/buckets/tmp".to_string()]);
    // no stored offset: start at the root's creation time
    assert_eq!(request.since_ns, ROOT_CREATED_NS);
    assert!(fx.offsets.writes().is_empty());
}

#[tokio::test]
async fn test_resumes_after_stored_offset() {
    let fx = Fixture::new();
    let stored = ROOT_CREATED_NS + 5_000;
    fx.offsets.stored.lock().unwrap().insert(
        ("filer.remote.sync".to_string(), "/buckets".to_string()),
        stored,
    );
    let subscriber = Arc::new(ScriptedSubscriber::new(vec![Script::events(vec![photo(
        "c.jpg",
        stored + 1,
    )])]));
    let runner = runner(&fx, subscriber.clone());

    runner.run_once(&CancellationToken::new()).await.unwrap();

    assert_eq!(subscriber.requests()[0].since_ns, stored);
    assert_eq!(fx.offsets.writes(), vec![stored + 1]);
}

#[tokio::test]
async fn test_time_ago_overrides_stored_offset() {
    let fx = Fixture::new();
    fx.offsets.stored.lock().unwrap().insert(
        ("filer.remote.sync".to_string(), "/buckets".to_string()),
        i64::MAX / 2,
    );
    let subscriber = Arc::new(ScriptedSubscriber::new(vec![Script::events(Vec::new())]));
    let config = ConfigBuilder::new().time_ago_secs(3600).build();
    let runner = BucketSyncRunner::from_config(&config, fx.ports(subscriber.clone())).unwrap();

    runner.run_once(&CancellationToken::new()).await.unwrap();

    let since = subscriber.requests()[0].since_ns;
    let now = chrono::Utc::now().timestamp_nanos_opt().unwrap();
    let hour = 3600 * 1_000_000_000_i64;
    assert!(since <= now - hour && since > now - 2 * hour);
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_flushes_offset() {
    let fx = Fixture::new();
    let subscriber = Arc::new(ScriptedSubscriber::new(vec![Script::open(vec![
        photo("a.jpg", ROOT_CREATED_NS + 1),
        photo("b.jpg", ROOT_CREATED_NS + 2),
        photo("c.jpg", ROOT_CREATED_NS + 3),
    ])]));
    let runner = runner(&fx, subscriber);
    let token = CancellationToken::new();

    let (outcome, _) = tokio::join!(runner.run_once(&token), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        token.cancel();
    });

    assert_eq!(outcome.unwrap(), RunOutcome::Cancelled);
    assert_eq!(fx.remote.calls().len(), 3);
    assert_eq!(
        fx.offsets.writes(),
        vec![ROOT_CREATED_NS + 1, ROOT_CREATED_NS + 3]
    );
}

#[tokio::test]
async fn test_event_failure_stops_run_without_advancing_offset() {
    let fx = Fixture::new();
    *fx.remote.fail_writes.lock().unwrap() = true;
    let subscriber = Arc::new(ScriptedSubscriber::new(vec![Script::events(vec![
        photo("a.jpg", ROOT_CREATED_NS + 1),
        photo("b.jpg", ROOT_CREATED_NS + 2),
    ])]));
    let runner = runner(&fx, subscriber);

    let err = runner.run_once(&CancellationToken::new()).await.unwrap_err();

    assert!(format!("{err:#}").contains("create /buckets/photos/a.jpg"));
    assert_eq!(fx.remote.calls(), vec!["write_file s3a/photos/a.jpg"]);
    assert!(fx.offsets.writes().is_empty());
}

#[tokio::test]
async fn test_subscription_error_item_ends_run() {
    let fx = Fixture::new();
    let subscriber = Arc::new(ScriptedSubscriber::new(vec![Script {
        items: vec![
            Ok(photo("a.jpg", ROOT_CREATED_NS + 1)),
            Err(anyhow::anyhow!("stream reset")),
        ],
        keep_open: false,
    }]));
    let runner = runner(&fx, subscriber);

    let err = runner.run_once(&CancellationToken::new()).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<SyncError>(),
        Some(SyncError::Subscription(_))
    ));
    assert_eq!(fx.offsets.writes(), vec![ROOT_CREATED_NS + 1]);
}

#[tokio::test(start_paused = true)]
async fn test_supervisor_restarts_after_failure() {
    let fx = Fixture::new();
    let broken = MetadataEvent::created(
        CONFIG_DIR,
        Entry::file("mount.mapping").with_content("{broken"),
        ROOT_CREATED_NS + 1,
    );
    let subscriber = Arc::new(ScriptedSubscriber::new(vec![
        Script::events(vec![broken]),
        Script::events(Vec::new()),
        Script::open(vec![photo("a.jpg", ROOT_CREATED_NS + 2)]),
    ]));
    let runner = runner(&fx, subscriber.clone());
    let token = CancellationToken::new();

    let (result, _) = tokio::join!(runner.run(token.clone()), async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        token.cancel();
    });

    result.unwrap();
    assert_eq!(subscriber.requests().len(), 3);
    assert_eq!(fx.remote.calls(), vec!["write_file s3a/photos/a.jpg"]);
    assert_eq!(fx.offsets.writes(), vec![ROOT_CREATED_NS + 2]);
}

#[tokio::test(start_paused = true)]
async fn test_unreadable_offset_retries_instead_of_replaying() {
    let fx = Fixture::new();
    let stored = 1_700_000_000 * 1_000_000_000_i64;
    fx.offsets.stored.lock().unwrap().insert(
        ("filer.remote.sync".to_string(), "/buckets".to_string()),
        stored,
    );
    *fx.offsets.read_failures.lock().unwrap() = 2;
    let subscriber = Arc::new(ScriptedSubscriber::new(vec![Script::open(vec![photo(
        "a.jpg",
        stored + 1,
    )])]));
    let runner = runner(&fx, subscriber.clone());

    let first = runner.run_once(&CancellationToken::new()).await.unwrap_err();
    assert!(matches!(
        first.downcast_ref::<SyncError>(),
        Some(SyncError::OffsetRead { .. })
    ));
    assert!(subscriber.requests().is_empty());

    // the supervisor's first attempt fails the same way, then resumes
    let token = CancellationToken::new();
    let (result, _) = tokio::join!(runner.run(token.clone()), async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        token.cancel();
    });

    result.unwrap();
    let requests = subscriber.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].since_ns, stored);
    assert_eq!(fx.offsets.writes(), vec![stored + 1]);
}

#[tokio::test]
async fn test_supervisor_gives_up_on_bootstrap_failure() {
    let fx = Fixture::new();
    *fx.filer.unavailable.lock().unwrap() = true;
    let subscriber = Arc::new(ScriptedSubscriber::default());
    let runner = runner(&fx, subscriber.clone());

    let err = runner.run(CancellationToken::new()).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<SyncError>(),
        Some(SyncError::Bootstrap { .. })
    ));
    assert!(subscriber.requests().is_empty());
}
