use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ready_broker::{
    resolve_connection, EventBus, NodeBuilder, ReadyError, ReadyEvent, ReadyProbe, ResourceNode,
};
use tokio_util::sync::CancellationToken;

// --- Test Kind ---
//
// A minimal cache-like kind: the factory resolves the node's connection and
// records each run, so tests can count factory executions directly.

#[derive(Clone)]
struct CacheClientReady {
    resource: ResourceNode,
    endpoint: String,
}

impl ReadyEvent for CacheClientReady {
    fn resource(&self) -> &ResourceNode {
        &self.resource
    }

    fn event_name() -> &'static str {
        "cache-client-ready"
    }
}

const MARKER: &str = "cache/client-ready";

fn counting_factory(
    runs: Arc<AtomicUsize>,
) -> impl Fn(
    ResourceNode,
    CancellationToken,
) -> std::pin::Pin<
    Box<dyn std::future::Future<Output = Result<CacheClientReady, ReadyError>> + Send>,
> + Clone {
    move |node, token| {
        let runs = runs.clone();
        Box::pin(async move {
            runs.fetch_add(1, Ordering::SeqCst);
            let resolved = resolve_connection(&node, &token).await?;
            Ok(CacheClientReady {
                resource: node,
                endpoint: resolved.endpoint(),
            })
        })
    }
}

fn recording_handler(
    probe: ReadyProbe,
    label: &str,
) -> impl Fn(
    Arc<CacheClientReady>,
    CancellationToken,
) -> std::pin::Pin<
    Box<dyn std::future::Future<Output = Result<(), ready_broker::BoxError>> + Send>,
> + Clone {
    let label = label.to_string();
    move |event, _token| {
        let probe = probe.clone();
        let label = label.clone();
        Box::pin(async move {
            probe.record(format!("{label}:{}", event.endpoint));
            Ok(())
        })
    }
}

// --- Tests ---

#[tokio::test]
async fn registering_many_times_attaches_exactly_one_factory() {
    let bus = EventBus::new();
    let cache = NodeBuilder::root("cache", bus);
    let runs = Arc::new(AtomicUsize::new(0));
    let probe = ReadyProbe::new();

    for i in 0..5 {
        cache.on_ready(
            MARKER,
            counting_factory(runs.clone()),
            recording_handler(probe.clone(), &format!("h{i}")),
        );
    }

    cache.node().set_connection_string("redis://localhost");
    let token = CancellationToken::new();
    cache.node().notify_ready(&token).await.unwrap();

    // One firing, one factory run, but all five handlers delivered.
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(probe.count(), 5);
}

#[tokio::test]
async fn fan_out_delivers_in_registration_order() {
    let bus = EventBus::new();
    let cache = NodeBuilder::root("cache", bus);
    let runs = Arc::new(AtomicUsize::new(0));
    let probe = ReadyProbe::new();

    cache.on_ready(
        MARKER,
        counting_factory(runs.clone()),
        recording_handler(probe.clone(), "first"),
    );
    cache.on_ready(
        MARKER,
        counting_factory(runs.clone()),
        recording_handler(probe.clone(), "second"),
    );
    cache.on_ready(
        MARKER,
        counting_factory(runs.clone()),
        recording_handler(probe.clone(), "third"),
    );

    cache.node().set_connection_string("redis://localhost");
    let token = CancellationToken::new();
    cache.node().notify_ready(&token).await.unwrap();

    assert_eq!(
        probe.entries(),
        vec![
            "first:redis://localhost",
            "second:redis://localhost",
            "third:redis://localhost",
        ]
    );
}

#[tokio::test]
async fn late_registration_never_replays() {
    let bus = EventBus::new();
    let cache = NodeBuilder::root("cache", bus);
    let runs = Arc::new(AtomicUsize::new(0));
    let early = ReadyProbe::new();
    let late = ReadyProbe::new();

    cache.on_ready(
        MARKER,
        counting_factory(runs.clone()),
        recording_handler(early.clone(), "early"),
    );

    cache.node().set_connection_string("redis://localhost");
    let token = CancellationToken::new();
    cache.node().notify_ready(&token).await.unwrap();
    assert_eq!(early.count(), 1);

    // Subscribed after the publish completed: sees nothing, ever.
    cache.on_ready(
        MARKER,
        counting_factory(runs.clone()),
        recording_handler(late.clone(), "late"),
    );
    assert!(late.is_empty());
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn repeat_firings_rerun_the_factory_and_redeliver() {
    let bus = EventBus::new();
    let cache = NodeBuilder::root("cache", bus);
    let runs = Arc::new(AtomicUsize::new(0));
    let probe = ReadyProbe::new();

    cache.on_ready(
        MARKER,
        counting_factory(runs.clone()),
        recording_handler(probe.clone(), "h"),
    );

    cache.node().set_connection_string("redis://localhost");
    let token = CancellationToken::new();
    // Health flapping: the host reports ready twice.
    cache.node().notify_ready(&token).await.unwrap();
    cache.node().notify_ready(&token).await.unwrap();

    assert_eq!(runs.load(Ordering::SeqCst), 2);
    assert_eq!(probe.count(), 2);
}

#[tokio::test]
async fn failure_is_isolated_to_the_broken_tree() {
    let bus = EventBus::new();

    // Tree C: the root's provisioning failed, so the grandchild's resolution
    // cannot succeed.
    let broken_root = NodeBuilder::root("broken", bus.clone());
    broken_root.node().fail_provisioning("emulator crashed");
    let c = broken_root.child("c");

    // Tree D: independently resolvable.
    let healthy_root = NodeBuilder::root("healthy", bus);
    healthy_root.node().set_connection_string("conn:healthy");
    let d = healthy_root.child("d");

    let runs = Arc::new(AtomicUsize::new(0));
    let c_probe = ReadyProbe::new();
    let d_probe = ReadyProbe::new();

    c.on_ready(
        MARKER,
        counting_factory(runs.clone()),
        recording_handler(c_probe.clone(), "c"),
    );
    d.on_ready(
        MARKER,
        counting_factory(runs.clone()),
        recording_handler(d_probe.clone(), "d"),
    );

    let token = CancellationToken::new();
    let err = c.node().notify_ready(&token).await.unwrap_err();
    match err {
        ReadyError::Aggregate { ref errors, .. } => {
            assert!(matches!(
                errors[0],
                ReadyError::ProvisioningFailed { .. }
            ));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(c_probe.is_empty());

    // The sibling tree still delivers normally.
    d.node().notify_ready(&token).await.unwrap();
    assert_eq!(d_probe.entries(), vec!["d:conn:healthy/d"]);
}

#[tokio::test]
async fn concurrent_registrations_race_to_a_single_listener() {
    let bus = EventBus::new();
    let cache = NodeBuilder::root("cache", bus);
    let runs = Arc::new(AtomicUsize::new(0));
    let probe = ReadyProbe::new();

    let mut joins = Vec::new();
    for i in 0..32 {
        let cache = cache.clone();
        let runs = runs.clone();
        let probe = probe.clone();
        joins.push(tokio::spawn(async move {
            cache.on_ready(
                MARKER,
                counting_factory(runs),
                recording_handler(probe, &format!("h{i}")),
            );
        }));
    }
    for join in joins {
        join.await.unwrap();
    }

    cache.node().set_connection_string("redis://localhost");
    let token = CancellationToken::new();
    cache.node().notify_ready(&token).await.unwrap();

    // The race on the annotation store has exactly one winner.
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(probe.count(), 32);
}

#[tokio::test]
async fn cancellation_aborts_the_factory_path() {
    let bus = EventBus::new();
    let cache = NodeBuilder::root("cache", bus);
    let runs = Arc::new(AtomicUsize::new(0));
    let probe = ReadyProbe::new();

    cache.on_ready(
        MARKER,
        counting_factory(runs.clone()),
        recording_handler(probe.clone(), "h"),
    );

    // Descriptor never populated; the resolver would wait forever, but the
    // token is already cancelled when the signal fires.
    let token = CancellationToken::new();
    token.cancel();
    let err = cache.node().notify_ready(&token).await.unwrap_err();
    match err {
        ReadyError::Aggregate { ref errors, .. } => {
            assert!(matches!(errors[0], ReadyError::Cancelled));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(probe.is_empty());
}

#[tokio::test]
async fn failing_handler_surfaces_through_the_readiness_signal() {
    let bus = EventBus::new();
    let cache = NodeBuilder::root("cache", bus);
    let runs = Arc::new(AtomicUsize::new(0));
    let probe = ReadyProbe::new();

    cache.on_ready(MARKER, counting_factory(runs.clone()), |_event, _token| async {
        Err(ready_broker::mock::boxed_failure("subscriber exploded"))
    });
    cache.on_ready(
        MARKER,
        counting_factory(runs.clone()),
        recording_handler(probe.clone(), "survivor"),
    );

    cache.node().set_connection_string("redis://localhost");
    let token = CancellationToken::new();
    let err = cache.node().notify_ready(&token).await.unwrap_err();

    // The sibling handler still ran; the failure is reported, not swallowed.
    assert_eq!(probe.count(), 1);
    assert!(matches!(err, ReadyError::Aggregate { .. }));
}
