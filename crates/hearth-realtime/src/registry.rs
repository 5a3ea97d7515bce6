//! Client registry: the authoritative map of connected observers.
//!
//! The registry is the only component that creates or deletes a
//! [`Client`]. It owns the shared delivery path (rate gate → `try_send` →
//! touch-or-remove) used by broadcasts, handshake acks, replays, and
//! heartbeat pings, so transport failures are handled identically
//! everywhere they can occur.

use std::collections::HashMap;
use std::sync::Arc;

use metrics::counter;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tracing::{debug, info, warn};

use hearth_core::errors::RegistryError;
use hearth_core::frames::{ConnectionAck, ErrorFrame, Ping};
use hearth_core::ids::ClientId;

use crate::client::{Client, Sink};
use crate::config::RealtimeConfig;
use crate::rate_limit::RateDecision;

/// Owns the client map and enforces capacity, auth, and liveness policy.
pub struct ClientRegistry {
    clients: RwLock<HashMap<ClientId, Arc<Client>>>,
    config: RealtimeConfig,
}

impl ClientRegistry {
    /// Build an empty registry with the given policy.
    #[must_use]
    pub fn new(config: RealtimeConfig) -> Arc<Self> {
        Arc::new(Self {
            clients: RwLock::new(HashMap::new()),
            config,
        })
    }

    /// The policy this registry enforces.
    #[must_use]
    pub fn config(&self) -> &RealtimeConfig {
        &self.config
    }

    /// Admit a new client.
    ///
    /// Capacity check and insertion happen under one write-lock
    /// acquisition, so concurrent calls cannot overshoot the limit and no
    /// partial state exists for a rejected connection. On success the
    /// client immediately receives a `connection` ack and its heartbeat
    /// task starts. Admitting an id that is already connected replaces the
    /// old record (its heartbeat is cancelled like a removal).
    pub async fn add_client(
        self: &Arc<Self>,
        id: ClientId,
        sink: Sink,
        token: Option<&str>,
    ) -> Result<Arc<Client>, RegistryError> {
        let authenticated = match (&self.config.auth_token, token) {
            (Some(secret), Some(presented)) => secret == presented,
            _ => false,
        };
        let client = Arc::new(Client::new(id.clone(), sink, authenticated, Instant::now()));

        {
            let mut clients = self.clients.write().await;
            if clients.len() >= self.config.max_clients {
                counter!("hearth_clients_rejected_total").increment(1);
                return Err(RegistryError::CapacityExceeded {
                    max: self.config.max_clients,
                });
            }
            // Handle stored before the record is visible, so a concurrent
            // removal always finds something to abort.
            *client.heartbeat.lock() = Some(self.spawn_heartbeat(&client));
            if let Some(old) = clients.insert(id.clone(), Arc::clone(&client)) {
                if let Some(handle) = old.heartbeat.lock().take() {
                    handle.abort();
                }
                warn!(client_id = %id, "duplicate client id, replaced previous connection");
            }
        }

        info!(client_id = %id, authenticated, "client connected");
        match serde_json::to_string(&ConnectionAck::new(id.as_str(), authenticated)) {
            Ok(json) => {
                let _ = self.deliver(&client, Arc::new(json)).await;
            }
            Err(e) => warn!(client_id = %id, error = %e, "failed to serialize connection ack"),
        }
        Ok(client)
    }

    /// Remove a client. Idempotent — removing an absent id is a no-op.
    /// The heartbeat task is aborted synchronously before the record is
    /// dropped; no ping is observable after this returns.
    pub async fn remove_client(&self, id: &ClientId) {
        let removed = { self.clients.write().await.remove(id) };
        if let Some(client) = removed {
            if let Some(handle) = client.heartbeat.lock().take() {
                handle.abort();
            }
            counter!("hearth_clients_removed_total").increment(1);
            info!(client_id = %id, "client removed");
        }
    }

    /// Look up a client by id.
    pub async fn client(&self, id: &ClientId) -> Option<Arc<Client>> {
        self.clients.read().await.get(id).cloned()
    }

    /// Number of connected clients.
    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Whether no clients are connected.
    pub async fn is_empty(&self) -> bool {
        self.clients.read().await.is_empty()
    }

    /// Snapshot of every connected client.
    pub(crate) async fn snapshot(&self) -> Vec<Arc<Client>> {
        self.clients.read().await.values().cloned().collect()
    }

    /// Authenticated clients satisfying a subscription predicate.
    pub(crate) async fn matching(
        &self,
        pred: impl Fn(&Client) -> bool,
    ) -> Vec<Arc<Client>> {
        self.clients
            .read()
            .await
            .values()
            .filter(|c| c.authenticated && pred(c.as_ref()))
            .cloned()
            .collect()
    }

    /// Add an entity-id interest. Silent no-op for unknown or
    /// unauthenticated clients; returns whether the subscribe was accepted
    /// (the broadcaster replays cached state on acceptance).
    pub async fn subscribe_entity(&self, id: &ClientId, entity_id: &str) -> bool {
        self.subscribe(id, |subs| {
            let _ = subs.entities.insert(entity_id.to_owned());
        })
        .await
    }

    /// Add a domain interest. Silent no-op for unknown or unauthenticated
    /// clients.
    pub async fn subscribe_domain(&self, id: &ClientId, domain: &str) -> bool {
        self.subscribe(id, |subs| {
            let _ = subs.domains.insert(domain.to_owned());
        })
        .await
    }

    /// Add an event-type interest. Silent no-op for unknown or
    /// unauthenticated clients.
    pub async fn subscribe_event(&self, id: &ClientId, event_type: &str) -> bool {
        self.subscribe(id, |subs| {
            let _ = subs.events.insert(event_type.to_owned());
        })
        .await
    }

    async fn subscribe(
        &self,
        id: &ClientId,
        insert: impl FnOnce(&mut crate::subscriptions::Subscriptions),
    ) -> bool {
        let Some(client) = self.client(id).await else {
            return false;
        };
        if !client.authenticated {
            // Silent by design: no error leaks topic existence to
            // unauthenticated observers.
            debug!(client_id = %id, "ignoring subscribe from unauthenticated client");
            return false;
        }
        insert(&mut client.subscriptions.lock());
        true
    }

    /// Deliver one pre-serialized frame through the gated path.
    ///
    /// Rate-window check first; past the ceiling the payload is dropped
    /// and a single `rate_limit_exceeded` frame is written straight to the
    /// sink (it never re-enters the limiter, so suppression cannot
    /// recurse). A transport failure removes the client immediately.
    /// Returns whether the client is still registered.
    pub(crate) async fn deliver(&self, client: &Arc<Client>, payload: Arc<String>) -> bool {
        let now = Instant::now();
        let decision = client.rate.lock().check(
            now,
            self.config.rate_limit_window,
            self.config.rate_limit_max,
        );
        let frame = match decision {
            RateDecision::Allow => payload,
            RateDecision::Limited => {
                counter!("hearth_rate_limited_total").increment(1);
                let substitute = ErrorFrame::rate_limit_exceeded(
                    self.config.rate_limit_max,
                    self.config.rate_limit_window.as_secs(),
                );
                match serde_json::to_string(&substitute) {
                    Ok(json) => Arc::new(json),
                    Err(e) => {
                        warn!(client_id = %client.id, error = %e, "failed to serialize error frame");
                        return true;
                    }
                }
            }
        };
        match client.try_send(frame) {
            Ok(()) => {
                client.touch(now);
                counter!("hearth_frames_sent_total").increment(1);
                true
            }
            Err(e) => {
                counter!("hearth_send_failures_total").increment(1);
                warn!(client_id = %client.id, error = %e, "send failed, removing client");
                self.remove_client(&client.id).await;
                false
            }
        }
    }

    /// One maintenance pass: evict clients idle past the threshold, reset
    /// lapsed rate windows for the rest. One client's trouble never halts
    /// the sweep for others.
    pub async fn sweep(&self) {
        let now = Instant::now();
        for client in self.snapshot().await {
            if now.duration_since(client.last_activity()) > self.config.idle_timeout {
                counter!("hearth_clients_evicted_total").increment(1);
                info!(client_id = %client.id, "evicting idle client");
                self.remove_client(&client.id).await;
            } else {
                let _ = client
                    .rate
                    .lock()
                    .reset_if_expired(now, self.config.rate_limit_window);
            }
        }
    }

    /// One lightweight task per client; `Weak` so a removed record does
    /// not outlive its registration, abort on removal so no ping is
    /// observed afterwards.
    fn spawn_heartbeat(self: &Arc<Self>, client: &Arc<Client>) -> JoinHandle<()> {
        let registry = Arc::clone(self);
        let weak = Arc::downgrade(client);
        let period = self.config.heartbeat_period;
        let mut ticker = interval_at(Instant::now() + period, period);
        tokio::spawn(async move {
            loop {
                let _ = ticker.tick().await;
                let Some(client) = weak.upgrade() else { break };
                let ping = match serde_json::to_string(&Ping::new()) {
                    Ok(json) => Arc::new(json),
                    Err(_) => break,
                };
                // A successful ping refreshes last_activity, shielding
                // quiet-topic subscribers from idle eviction. A failed
                // ping removes the client, which aborts this task.
                if !registry.deliver(&client, ping).await {
                    break;
                }
            }
        })
    }
}

impl std::fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRegistry")
            .field("max_clients", &self.config.max_clients)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
