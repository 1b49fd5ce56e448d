//! End-to-end tests over the public API, exercising the full
//! client/lifecycle/dispatcher/handles stack together against
//! [`ari_cluster_client::testing::MockBus`].

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use ari_cluster_client::config::ClientConfig;
use ari_cluster_client::envelope::EventType;
use ari_cluster_client::testing::{MockBus, Recorded};
use ari_cluster_client::Client;

fn config() -> ClientConfig {
    ClientConfig::builder("ari", "myapp", "nats://localhost:4222").build()
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

#[tokio::test]
async fn s2_coordinate_check_produces_no_bus_traffic() {
    let bus = Arc::new(MockBus::new());
    let client = Client::with_bus(config(), bus.clone());

    let key = ari_cluster_client::key::Key::new(ari_cluster_client::key::KeyKind::Channel, "c1")
        .with_node("nA");
    let err = client.channel().get(key).hangup("normal").await.unwrap_err();

    assert!(matches!(err, ari_cluster_client::ClientError::IncompleteCoordinates { .. }));
    assert_eq!(bus.request_count(), 0);
}

#[tokio::test]
async fn s3_announcement_updates_cluster_registry() {
    let bus = Arc::new(MockBus::new());
    let client = Client::with_bus(config(), bus.clone());

    client.listen(Arc::new(|_, _, _| Box::pin(async {}))).await.unwrap();

    let announcement = br#"{"event_name":"proxy","node":"nB","application":"myapp"}"#;
    bus.deliver("ari.announce.nB", announcement.to_vec());
    settle().await;

    assert_eq!(client.registry().application_of("nB"), Some("myapp".to_string()));
}

#[tokio::test]
async fn s4_call_lifecycle_opens_and_drains_per_call_subscription() {
    let bus = Arc::new(MockBus::new());
    let client = Client::with_bus(config(), bus.clone());
    let seen_channel_id = Arc::new(std::sync::Mutex::new(None));
    let seen_for_handler = seen_channel_id.clone();
    let ends_seen = Arc::new(AtomicUsize::new(0));
    let ends_for_listener = ends_seen.clone();

    client.events().add_listener(EventType::StasisEnd, move |_| {
        ends_for_listener.fetch_add(1, Ordering::SeqCst);
    });

    client
        .listen(Arc::new(move |_, channel, _event| {
            let seen = seen_for_handler.clone();
            Box::pin(async move {
                *seen.lock().unwrap() = Some(channel.id().to_string());
            })
        }))
        .await
        .unwrap();

    // The channel id's `.` is escaped to `#` for the subject segment (§3,
    // §6); the decoded event payload still carries the original id.
    let start = br#"{"type":"StasisStart","node":"nA","application":"myapp","channel":{"id":"c42.7"}}"#;
    bus.deliver("ari.myapp.nA.c42#7.stasisstart.foo", start.to_vec());
    settle().await;

    assert_eq!(seen_channel_id.lock().unwrap().as_deref(), Some("c42.7"));

    let end = br#"{"type":"StasisEnd","node":"nA","application":"myapp","channel":{"id":"c42.7"}}"#;
    bus.deliver("ari.myapp.nA.c42#7.stasisend", end.to_vec());
    settle().await;
    assert_eq!(ends_seen.load(Ordering::SeqCst), 1);

    // The per-call subscription was drained on StasisEnd, so a second
    // delivery on the same topic reaches no handler at all — the listener
    // count must not advance further.
    bus.deliver("ari.myapp.nA.c42#7.stasisend", end.to_vec());
    settle().await;
    assert_eq!(ends_seen.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn s5_rpc_happy_path_sends_expected_envelope() {
    let bus = Arc::new(MockBus::new());
    bus.script_reply("ari.myapp.command.nA", |_| Ok(b"{}".to_vec()));
    let client = Client::with_bus(config(), bus.clone());

    let key = ari_cluster_client::key::Key::new(ari_cluster_client::key::KeyKind::Channel, "c1")
        .with_app("myapp")
        .with_node("nA");
    client.channel().get(key).answer().await.unwrap();

    let calls = bus.recorded_calls();
    assert_eq!(calls.len(), 1);
    if let Recorded::Request { subject, payload } = &calls[0] {
        assert_eq!(subject, "ari.myapp.command.nA");
        let sent: serde_json::Value = serde_json::from_slice(payload).unwrap();
        assert_eq!(sent["kind"], "ChannelAnswer");
    } else {
        panic!("expected a request");
    }
}

#[tokio::test]
async fn s6_not_found_mapping() {
    let bus = Arc::new(MockBus::new());
    bus.script_reply("ari.myapp.data.nA", |_| Ok(br#"{"error":"Not found"}"#.to_vec()));
    let client = Client::with_bus(config(), bus.clone());

    let key = ari_cluster_client::key::Key::new(ari_cluster_client::key::KeyKind::Bridge, "b1")
        .with_app("myapp")
        .with_node("nA");
    let err = client.bridge().get(key).data().await.unwrap_err();
    assert!(matches!(err, ari_cluster_client::ClientError::NotFound { .. }));
}

#[tokio::test]
async fn event_dispatcher_listeners_fire_alongside_stasis_handler() {
    let bus = Arc::new(MockBus::new());
    let client = Client::with_bus(config(), bus.clone());
    let starts_seen = Arc::new(AtomicUsize::new(0));
    let starts_for_listener = starts_seen.clone();

    client.events().add_listener(EventType::StasisStart, move |_| {
        starts_for_listener.fetch_add(1, Ordering::SeqCst);
    });

    client
        .listen(Arc::new(|_, _, _| Box::pin(async {})))
        .await
        .unwrap();

    let start = br#"{"type":"StasisStart","node":"nA","application":"myapp","channel":{"id":"c1"}}"#;
    bus.deliver("ari.myapp.nA.c1.stasisstart.foo", start.to_vec());
    settle().await;

    assert_eq!(starts_seen.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn staged_bridge_create_runs_exactly_once_on_exec() {
    let bus = Arc::new(MockBus::new());
    bus.script_reply("ari.myapp.create.nA", |_| {
        Ok(br#"{"key":{"kind":"bridge","id":"b1","node":"nA","app":"myapp"}}"#.to_vec())
    });
    let client = Client::with_bus(config(), bus.clone());

    let key = ari_cluster_client::key::Key::new(ari_cluster_client::key::KeyKind::Bridge, "b1")
        .with_app("myapp")
        .with_node("nA");
    let staged = client.bridge().stage_create(key, "mixing", "b1");

    assert_eq!(bus.request_count(), 0);
    staged.exec().await.unwrap();
    staged.exec().await.unwrap();
    assert_eq!(bus.request_count(), 1);
}

#[tokio::test]
async fn close_drains_subscriptions_without_error() {
    let bus = Arc::new(MockBus::new());
    let client = Client::with_bus(config(), bus.clone());

    client.listen(Arc::new(|_, _, _| Box::pin(async {}))).await.unwrap();
    client.close().await.unwrap();
}
