//! End-to-end fan-out behavior through the public API only.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::sync::mpsc;

use hearth_core::frames::EntityState;
use hearth_core::ids::ClientId;
use hearth_realtime::{Broadcaster, ClientRegistry, DomainEvent, RealtimeConfig, spawn_maintenance};

const TOKEN: &str = "correct horse";

fn state(entity_id: &str, value: &str) -> EntityState {
    EntityState {
        entity_id: entity_id.into(),
        state: value.into(),
        attributes: json!({}),
        last_changed: "2026-08-30T12:00:00.000Z".into(),
        last_updated: "2026-08-30T12:00:00.000Z".into(),
    }
}

fn parse(msg: &Arc<String>) -> Value {
    serde_json::from_str(msg).unwrap()
}

async fn connect(
    b: &Broadcaster,
    id: &str,
    token: Option<&str>,
) -> mpsc::Receiver<Arc<String>> {
    let (tx, mut rx) = mpsc::channel(64);
    let _client = b
        .registry()
        .add_client(ClientId::from(id), tx, token)
        .await
        .expect("under capacity");
    let ack = parse(&rx.try_recv().expect("handshake"));
    assert_eq!(ack["type"], "connection");
    rx
}

async fn settle() {
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn observers_with_mixed_interests_each_get_one_copy() {
    let b = Broadcaster::new(ClientRegistry::new(RealtimeConfig::with_token(TOKEN)));

    let mut kitchen_watcher = connect(&b, "kitchen", Some(TOKEN)).await;
    let mut light_watcher = connect(&b, "lights", Some(TOKEN)).await;
    let mut everything_watcher = connect(&b, "all", Some(TOKEN)).await;
    let mut intruder = connect(&b, "intruder", Some("guess")).await;

    b.subscribe_to_entity(&ClientId::from("kitchen"), "light.kitchen").await;
    b.subscribe_to_domain(&ClientId::from("lights"), "light").await;
    b.subscribe_to_event(&ClientId::from("all"), "state_changed").await;
    // Ignored: wrong token.
    b.subscribe_to_event(&ClientId::from("intruder"), "state_changed").await;

    b.broadcast_state_change(state("light.kitchen", "on")).await;
    b.broadcast_state_change(state("switch.fan", "off")).await;

    // Entity subscriber: only the kitchen light.
    assert_eq!(parse(&kitchen_watcher.try_recv().unwrap())["data"]["entity_id"], "light.kitchen");
    assert!(kitchen_watcher.try_recv().is_err());

    // Domain subscriber: only the light domain.
    assert_eq!(parse(&light_watcher.try_recv().unwrap())["data"]["entity_id"], "light.kitchen");
    assert!(light_watcher.try_recv().is_err());

    // Blanket subscriber: both, in broadcast order.
    assert_eq!(parse(&everything_watcher.try_recv().unwrap())["data"]["entity_id"], "light.kitchen");
    assert_eq!(parse(&everything_watcher.try_recv().unwrap())["data"]["entity_id"], "switch.fan");

    // Unauthenticated: nothing past the handshake, ever.
    assert!(intruder.try_recv().is_err());
}

#[tokio::test]
async fn capacity_boundary_is_exact() {
    let b = Broadcaster::new(ClientRegistry::new(RealtimeConfig {
        max_clients: 3,
        ..RealtimeConfig::with_token(TOKEN)
    }));
    let _rx: Vec<_> = {
        let mut held = Vec::new();
        for i in 0..3 {
            held.push(connect(&b, &format!("c{i}"), Some(TOKEN)).await);
        }
        held
    };

    let (tx, _rx4) = mpsc::channel(8);
    assert!(
        b.registry()
            .add_client(ClientId::from("c3"), tx, Some(TOKEN))
            .await
            .is_err()
    );

    b.registry().remove_client(&ClientId::from("c0")).await;
    let _rx5 = connect(&b, "c3", Some(TOKEN)).await;
    assert_eq!(b.registry().len().await, 3);

    // Removing an id that is long gone stays a no-op.
    b.registry().remove_client(&ClientId::from("c0")).await;
    assert_eq!(b.registry().len().await, 3);
}

#[tokio::test]
async fn late_subscriber_catches_up_via_replay() {
    let b = Broadcaster::new(ClientRegistry::new(RealtimeConfig::with_token(TOKEN)));
    b.broadcast_state_change(state("climate.living", "heat")).await;
    b.broadcast_state_change(state("climate.living", "cool")).await;

    let mut rx = connect(&b, "late", Some(TOKEN)).await;
    b.subscribe_to_entity(&ClientId::from("late"), "climate.living").await;

    let replay = parse(&rx.try_recv().unwrap());
    assert_eq!(replay["type"], "state_changed");
    assert_eq!(replay["data"]["state"], "cool", "replay carries the last value only");
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn domain_events_fan_out_by_tag() {
    let b = Broadcaster::new(ClientRegistry::new(RealtimeConfig::with_token(TOKEN)));
    let mut automations = connect(&b, "auto", Some(TOKEN)).await;
    let mut scripts = connect(&b, "scripts", Some(TOKEN)).await;
    b.subscribe_to_event(&ClientId::from("auto"), "automation_triggered").await;
    b.subscribe_to_event(&ClientId::from("scripts"), "script_executed").await;

    b.broadcast_automation_triggered("morning_lights", json!({"platform": "sun"})).await;
    b.broadcast_script_executed("good_night", json!({})).await;
    b.broadcast_event(DomainEvent::new("unrelated", json!({}))).await;

    assert_eq!(parse(&automations.try_recv().unwrap())["type"], "automation_triggered");
    assert!(automations.try_recv().is_err());
    assert_eq!(parse(&scripts.try_recv().unwrap())["type"], "script_executed");
    assert!(scripts.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn maintenance_evicts_only_the_silent_client() {
    let b = Broadcaster::new(ClientRegistry::new(RealtimeConfig {
        // Pings disabled for "silent" eviction; "lively" is kept fresh by
        // explicit broadcasts instead.
        heartbeat_period: Duration::from_secs(100_000),
        ..RealtimeConfig::with_token(TOKEN)
    }));
    let registry = Arc::clone(b.registry());
    let mut lively_rx = connect(&b, "lively", Some(TOKEN)).await;
    let _silent_rx = connect(&b, "silent", Some(TOKEN)).await;
    b.subscribe_to_entity(&ClientId::from("lively"), "sensor.tick").await;

    let task = spawn_maintenance(Arc::clone(&registry));

    // Six minutes in 60s steps, a broadcast keeping "lively" active each
    // step: the sweep at 360s finds "silent" idle past the 300s threshold.
    for _ in 0..6 {
        tokio::time::advance(Duration::from_secs(60)).await;
        settle().await;
        b.broadcast_state_change(state("sensor.tick", "t")).await;
        while lively_rx.try_recv().is_ok() {}
    }
    assert_eq!(registry.len().await, 1, "silent client evicted past 300s idle");

    // Six more silent minutes and "lively" goes the same way.
    for _ in 0..6 {
        tokio::time::advance(Duration::from_secs(60)).await;
        settle().await;
    }
    assert!(registry.is_empty().await, "lively goes idle once traffic stops");
    task.abort();
}

#[tokio::test]
async fn statistics_reflect_the_world() {
    let b = Broadcaster::new(ClientRegistry::new(RealtimeConfig::with_token(TOKEN)));
    let _rx1 = connect(&b, "a1", Some(TOKEN)).await;
    let _rx2 = connect(&b, "a2", Some(TOKEN)).await;
    let _rx3 = connect(&b, "anon", None).await;

    b.subscribe_to_entity(&ClientId::from("a1"), "light.kitchen").await;
    b.subscribe_to_entity(&ClientId::from("a1"), "light.hall").await;
    b.subscribe_to_domain(&ClientId::from("a2"), "light").await;
    b.subscribe_to_domain(&ClientId::from("a2"), "climate").await;
    b.subscribe_to_event(&ClientId::from("a2"), "zone_entered").await;

    b.broadcast_state_change(state("light.kitchen", "on")).await;

    let stats = b.statistics().await;
    assert_eq!(stats.total_clients, 3);
    assert_eq!(stats.authenticated_clients, 2);
    assert_eq!(stats.total_subscriptions, 5);
    assert_eq!(stats.tracked_entities, 1);
}
