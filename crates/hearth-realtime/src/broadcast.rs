//! Event fan-out to matching subscribers.
//!
//! One explicitly constructed [`Broadcaster`] per process, handed to the
//! event source and the connection acceptor — never a hidden global, so
//! tests run isolated instances side by side.

use std::collections::HashMap;
use std::sync::Arc;

use metrics::counter;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

use hearth_core::frames::{
    AUTOMATION_TRIGGERED, EntityState, EventFrame, SCRIPT_EXECUTED, SERVICE_CALLED, StateChanged,
};
use hearth_core::ids::{ClientId, EntityId};

use crate::registry::ClientRegistry;
use crate::stats::Statistics;

/// A generic inbound domain event from the upstream source.
#[derive(Clone, Debug)]
pub struct DomainEvent {
    /// Event type tag; clients subscribe to it verbatim.
    pub event_type: String,
    /// Opaque payload.
    pub data: Value,
    /// Where the event originated.
    pub origin: String,
    /// Event-native occurrence time, if the source supplied one.
    pub time_fired: Option<String>,
    /// Opaque correlation context.
    pub context: Option<Value>,
}

impl DomainEvent {
    /// A local event with the given tag and payload.
    #[must_use]
    pub fn new(event_type: impl Into<String>, data: Value) -> Self {
        Self {
            event_type: event_type.into(),
            data,
            origin: "LOCAL".to_owned(),
            time_fired: None,
            context: None,
        }
    }
}

/// Fans out state changes and domain events to subscribed clients and
/// owns the last-known-state cache used for subscribe-time replay.
pub struct Broadcaster {
    registry: Arc<ClientRegistry>,
    states: RwLock<HashMap<String, EntityState>>,
}

impl Broadcaster {
    /// Build a broadcaster over an existing registry.
    #[must_use]
    pub fn new(registry: Arc<ClientRegistry>) -> Self {
        Self {
            registry,
            states: RwLock::new(HashMap::new()),
        }
    }

    /// The registry this broadcaster fans out over.
    #[must_use]
    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    /// Broadcast an entity state change.
    ///
    /// Updates the state cache, then delivers one `state_changed` frame to
    /// every authenticated client subscribed to the entity, its domain, or
    /// the blanket `state_changed` event — exactly one copy each, however
    /// many criteria match.
    pub async fn broadcast_state_change(&self, state: EntityState) {
        let entity_id = state.entity_id.clone();
        let domain = EntityId::from(entity_id.as_str()).domain().to_owned();
        {
            let _ = self
                .states
                .write()
                .await
                .insert(entity_id.clone(), state.clone());
        }

        let Some(json) = encode(&StateChanged::new(state)) else {
            return;
        };
        let targets = self
            .registry
            .matching(|c| c.subscriptions.lock().matches_state_change(&entity_id, &domain))
            .await;
        debug!(entity_id = %entity_id, recipients = targets.len(), "broadcast state change");
        counter!("hearth_state_changes_total").increment(1);
        for client in targets {
            let _ = self.registry.deliver(&client, Arc::clone(&json)).await;
        }
    }

    /// Broadcast a generic domain event to clients subscribed to its tag.
    pub async fn broadcast_event(&self, event: DomainEvent) {
        let frame = EventFrame::new(
            event.event_type,
            event.data,
            event.origin,
            event.time_fired,
            event.context,
        );
        let Some(json) = encode(&frame) else { return };
        let targets = self
            .registry
            .matching(|c| c.subscriptions.lock().matches_event(&frame.event_type))
            .await;
        debug!(event_type = %frame.event_type, recipients = targets.len(), "broadcast event");
        counter!("hearth_events_total").increment(1);
        for client in targets {
            let _ = self.registry.deliver(&client, Arc::clone(&json)).await;
        }
    }

    /// Notify `service_called` subscribers that a service was invoked.
    pub async fn broadcast_service_call(&self, domain: &str, service: &str, data: Value) {
        self.broadcast_event(DomainEvent::new(
            SERVICE_CALLED,
            serde_json::json!({
                "domain": domain,
                "service": service,
                "service_data": data,
            }),
        ))
        .await;
    }

    /// Notify `automation_triggered` subscribers.
    pub async fn broadcast_automation_triggered(&self, automation_id: &str, trigger: Value) {
        self.broadcast_event(DomainEvent::new(
            AUTOMATION_TRIGGERED,
            serde_json::json!({
                "automation_id": automation_id,
                "trigger": trigger,
            }),
        ))
        .await;
    }

    /// Notify `script_executed` subscribers.
    pub async fn broadcast_script_executed(&self, script_id: &str, data: Value) {
        self.broadcast_event(DomainEvent::new(
            SCRIPT_EXECUTED,
            serde_json::json!({
                "script_id": script_id,
                "data": data,
            }),
        ))
        .await;
    }

    /// Subscribe a client to an entity id and immediately replay the
    /// entity's cached state to it, if one exists. The subscribe itself is
    /// a silent no-op for unknown/unauthenticated clients.
    pub async fn subscribe_to_entity(&self, id: &ClientId, entity_id: &str) {
        if !self.registry.subscribe_entity(id, entity_id).await {
            return;
        }
        let cached = { self.states.read().await.get(entity_id).cloned() };
        let Some(state) = cached else { return };
        let Some(client) = self.registry.client(id).await else {
            return;
        };
        if let Some(json) = encode(&StateChanged::new(state)) {
            debug!(client_id = %id, entity_id, "replaying cached state");
            let _ = self.registry.deliver(&client, json).await;
        }
    }

    /// Subscribe a client to a whole domain.
    pub async fn subscribe_to_domain(&self, id: &ClientId, domain: &str) {
        let _ = self.registry.subscribe_domain(id, domain).await;
    }

    /// Subscribe a client to an event type tag.
    pub async fn subscribe_to_event(&self, id: &ClientId, event_type: &str) {
        let _ = self.registry.subscribe_event(id, event_type).await;
    }

    /// Last known state for an entity, if any has been broadcast.
    pub async fn entity_state(&self, entity_id: &str) -> Option<EntityState> {
        self.states.read().await.get(entity_id).cloned()
    }

    /// Read-only snapshot of registry and cache counts. Mutates nothing.
    pub async fn statistics(&self) -> Statistics {
        let now = Instant::now();
        let mut stats = Statistics::default();
        for client in self.registry.snapshot().await {
            stats.total_clients += 1;
            if client.authenticated {
                stats.authenticated_clients += 1;
            }
            stats.total_subscriptions += client.subscription_count();
            stats
                .connections_by_age
                .record(now.duration_since(client.connected_at()));
        }
        stats.tracked_entities = self.states.read().await.len();
        stats
    }
}

impl std::fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster").finish_non_exhaustive()
    }
}

/// Serialize a frame once; recipients share the allocation.
fn encode<T: Serialize>(frame: &T) -> Option<Arc<String>> {
    match serde_json::to_string(frame) {
        Ok(json) => Some(Arc::new(json)),
        Err(e) => {
            warn!(error = %e, "failed to serialize outbound frame");
            None
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
