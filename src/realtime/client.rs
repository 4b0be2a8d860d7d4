//! The connection manager.
//!
//! [`RealtimeClient`] owns at most one transport session at a time and
//! exposes connect/disconnect, a state-guarded send, a topic subscription
//! registry, and an explicit opt-in heartbeat. All transport faults are
//! absorbed here: they become log lines or the close notification, never
//! errors in subscriber or caller code.
//!
//! The client is constructed once at application startup, shared by
//! reference (or `Arc`) with every consumer, and torn down with
//! [`RealtimeClient::disconnect`] on shutdown. Methods that spawn
//! background work (`connect`, `start_heartbeat`) must be called from
//! within a Tokio runtime.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::envelope::{topics, Envelope};
use super::registry::{Subscription, SubscriptionRegistry};
use super::transport::{Connector, TransportEvent, TransportSession, WsConnector};
use super::{SessionState, SharedSessionState};

/// Callback invoked on session open or close.
///
/// Stored as data rather than captured implicitly, so the lifecycle is
/// testable without a real socket.
pub type LifecycleCallback = Box<dyn Fn() + Send + Sync + 'static>;

/// Simulation control action accepted by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationAction {
    /// Pause the running simulation.
    Pause,
    /// Resume a paused simulation.
    Resume,
    /// Stop the simulation entirely.
    Stop,
}

impl SimulationAction {
    /// Wire value for the `action` payload field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Stop => "stop",
        }
    }
}

/// Fires a session's close callback at most once, whether the close came
/// from the transport or from an explicit disconnect.
struct CloseNotifier {
    callback: Option<LifecycleCallback>,
    fired: AtomicBool,
}

impl CloseNotifier {
    fn new(callback: Option<LifecycleCallback>) -> Arc<Self> {
        Arc::new(Self {
            callback,
            fired: AtomicBool::new(false),
        })
    }

    fn notify(&self) {
        if !self.fired.swap(true, Ordering::SeqCst) {
            if let Some(callback) = &self.callback {
                callback();
            }
        }
    }
}

/// One live session: the transport write half, the task pumping its
/// inbound events into the registry, and the close notifier shared with
/// that task.
struct Session {
    transport: Box<dyn TransportSession>,
    pump: JoinHandle<()>,
    close: Arc<CloseNotifier>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}

/// Topic-multiplexed realtime client for the dashboard push channel.
pub struct RealtimeClient {
    url: String,
    connector: Arc<dyn Connector>,
    state: Arc<SharedSessionState>,
    registry: Arc<SubscriptionRegistry>,
    // Shared with the heartbeat task so ticks reach the current session
    // rather than the one that existed when the timer started.
    session: Arc<Mutex<Option<Session>>>,
    heartbeat: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for RealtimeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeClient")
            .field("url", &self.url)
            .field("state", &self.state.get())
            .finish_non_exhaustive()
    }
}

impl RealtimeClient {
    /// Create a client targeting `url` over a real WebSocket transport.
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_connector(url, Arc::new(WsConnector::new()))
    }

    /// Create a client with an injected connector.
    ///
    /// Used by tests to drive the state machine through a fake transport.
    pub fn with_connector(url: impl Into<String>, connector: Arc<dyn Connector>) -> Self {
        Self {
            url: url.into(),
            connector,
            state: SharedSessionState::new(),
            registry: SubscriptionRegistry::new(),
            session: Arc::new(Mutex::new(None)),
            heartbeat: Mutex::new(None),
        }
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    /// Open a new session toward the configured address.
    ///
    /// Returns immediately; handshake completion is reported through
    /// `on_open`, and any later session end through `on_close`. A session
    /// that was still connecting or open is silently replaced. If the
    /// transport cannot be constructed at all this logs and returns,
    /// leaving the manager in its prior state.
    ///
    /// The heartbeat is NOT started here; see
    /// [`RealtimeClient::start_heartbeat`].
    pub fn connect(
        &self,
        on_open: Option<LifecycleCallback>,
        on_close: Option<LifecycleCallback>,
    ) {
        let (transport, events) = match self.connector.connect(&self.url) {
            Ok(pair) => pair,
            Err(e) => {
                log::error!("Failed to create realtime session for {}: {e}", self.url);
                return;
            }
        };

        let mut slot = self.session.lock().expect("session lock poisoned");
        if let Some(retired) = slot.take() {
            // Discard without teardown; stopping the pump is enough to keep
            // the retired session from delivering or flipping state.
            retired.pump.abort();
        }

        self.state.set(SessionState::Connecting);
        log::info!("Connecting realtime session to {}", self.url);

        let close = CloseNotifier::new(on_close);
        let pump = tokio::spawn(pump_events(
            events,
            Arc::clone(&self.state),
            Arc::clone(&self.registry),
            on_open,
            Arc::clone(&close),
        ));
        *slot = Some(Session {
            transport,
            pump,
            close,
        });
    }

    /// Tear down the active session, if any.
    ///
    /// Stops the heartbeat, stops inbound delivery, closes the transport
    /// and clears the session reference. Idempotent and safe from any
    /// state; after it returns no further deliveries or heartbeat ticks
    /// occur. The session's `on_close` callback fires here if the
    /// transport had not already ended the session; it fires at most once
    /// per session either way.
    pub fn disconnect(&self) {
        if let Some(heartbeat) = self
            .heartbeat
            .lock()
            .expect("heartbeat lock poisoned")
            .take()
        {
            heartbeat.abort();
        }

        let mut slot = self.session.lock().expect("session lock poisoned");
        let Some(session) = slot.take() else {
            return;
        };

        // Order matters: mark closed and stop the pump before touching the
        // transport, so a tick or delivery already pending observes the
        // torn-down state and no-ops.
        self.state.set(SessionState::Closed);
        session.pump.abort();
        session.transport.close();
        session.close.notify();
        log::info!("Realtime session disconnected");
    }

    /// Send one envelope if and only if the session is open.
    ///
    /// Returns whether the write was attempted. A `false` result means
    /// nothing was written and nothing is buffered for later; callers must
    /// check it rather than assume delivery.
    pub fn send(&self, topic: &str, payload: Map<String, Value>) -> bool {
        if !self.state.is_open() {
            return false;
        }

        let slot = self.session.lock().expect("session lock poisoned");
        let Some(session) = slot.as_ref() else {
            return false;
        };

        let envelope = Envelope::with_payload(topic, payload);
        let text = match envelope.to_wire() {
            Ok(text) => text,
            Err(e) => {
                log::error!("Failed to serialize {topic} envelope: {e}");
                return false;
            }
        };

        match session.transport.send_text(&text) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Realtime send of {topic} failed: {e}");
                false
            }
        }
    }

    /// Register `handler` under `topic`.
    ///
    /// Handlers for the same topic run in registration order. The reserved
    /// topic `*` receives every inbound envelope with the `type` field
    /// intact; any other topic receives its payload with `type` stripped.
    /// Subscriptions survive reconnection.
    pub fn subscribe(
        &self,
        topic: &str,
        handler: impl Fn(Value) + Send + Sync + 'static,
    ) -> Subscription {
        self.registry.subscribe(topic, Arc::new(handler))
    }

    /// Begin sending `{"type":"ping"}` every `interval` while the session
    /// is open.
    ///
    /// At most one heartbeat timer exists: starting a new one cancels any
    /// prior one. A tick that finds the session not open is skipped
    /// silently. [`RealtimeClient::disconnect`] stops the timer.
    pub fn start_heartbeat(&self, interval: Duration) {
        let mut slot = self.heartbeat.lock().expect("heartbeat lock poisoned");
        if let Some(previous) = slot.take() {
            previous.abort();
        }

        let state = Arc::clone(&self.state);
        let session = Arc::clone(&self.session);
        *slot = Some(tokio::spawn(async move {
            let first_tick = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(first_tick, interval);
            loop {
                ticker.tick().await;
                if !state.is_open() {
                    continue;
                }
                let guard = session.lock().expect("session lock poisoned");
                let Some(session) = guard.as_ref() else {
                    continue;
                };
                if let Ok(text) = Envelope::new(topics::PING).to_wire() {
                    if let Err(e) = session.transport.send_text(&text) {
                        log::debug!("Heartbeat ping not written: {e}");
                    } else {
                        log::trace!("Sent heartbeat ping");
                    }
                }
            }
        }));
    }

    /// Ask the server to push current rake positions. No payload.
    pub fn request_positions(&self) -> bool {
        self.send(topics::REQUEST_POSITIONS, Map::new())
    }

    /// Notify the server of a simulation event for one rake.
    ///
    /// Payload shape: `{eventType, rakeId, ...details}`; `details` entries
    /// with colliding keys win, matching the wire contract.
    pub fn send_simulation_event(
        &self,
        event_type: &str,
        rake_id: &str,
        details: Map<String, Value>,
    ) -> bool {
        let mut payload = Map::new();
        payload.insert(
            "eventType".to_string(),
            Value::String(event_type.to_string()),
        );
        payload.insert("rakeId".to_string(), Value::String(rake_id.to_string()));
        payload.extend(details);
        self.send(topics::SIMULATION_EVENT, payload)
    }

    /// Issue a pause/resume/stop control. Payload shape: `{action}`.
    pub fn control_simulation(&self, action: SimulationAction) -> bool {
        let mut payload = Map::new();
        payload.insert(
            "action".to_string(),
            Value::String(action.as_str().to_string()),
        );
        self.send(topics::SIMULATION_CONTROL, payload)
    }
}

impl Drop for RealtimeClient {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.heartbeat.lock() {
            if let Some(heartbeat) = slot.take() {
                heartbeat.abort();
            }
        }
        if let Ok(mut slot) = self.session.lock() {
            if let Some(session) = slot.take() {
                session.pump.abort();
                session.transport.close();
            }
        }
    }
}

/// Drive one session's events into state changes and registry dispatch.
///
/// Parse failures are logged and dropped per message; they never reach
/// subscribers and never end the session.
async fn pump_events(
    mut events: mpsc::UnboundedReceiver<TransportEvent>,
    state: Arc<SharedSessionState>,
    registry: Arc<SubscriptionRegistry>,
    on_open: Option<LifecycleCallback>,
    close: Arc<CloseNotifier>,
) {
    while let Some(event) = events.recv().await {
        match event {
            TransportEvent::Opened => {
                state.set(SessionState::Open);
                log::info!("Realtime session open");
                if let Some(callback) = &on_open {
                    callback();
                }
            }
            TransportEvent::Message(text) => match Envelope::parse(&text) {
                Ok(envelope) => registry.dispatch(&envelope),
                Err(e) => log::warn!("Discarding unparseable frame: {e}"),
            },
            TransportEvent::Closed => {
                state.set(SessionState::Closed);
                log::info!("Realtime session closed");
                close.notify();
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::transport::TransportError;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Test double for the transport: records outbound frames and lets the
    /// test inject open/message/close events per session.
    #[derive(Default)]
    struct FakeWire {
        sent: Mutex<Vec<String>>,
        sessions: Mutex<Vec<mpsc::UnboundedSender<TransportEvent>>>,
        refuse_construction: AtomicBool,
        closes: AtomicUsize,
    }

    impl FakeWire {
        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }

        fn ping_count(&self) -> usize {
            self.sent()
                .iter()
                .filter(|frame| frame.as_str() == r#"{"type":"ping"}"#)
                .count()
        }

        fn session_count(&self) -> usize {
            self.sessions.lock().unwrap().len()
        }

        fn event_sender(&self, index: usize) -> mpsc::UnboundedSender<TransportEvent> {
            self.sessions.lock().unwrap()[index].clone()
        }

        fn open(&self) {
            let senders = self.sessions.lock().unwrap();
            senders
                .last()
                .unwrap()
                .send(TransportEvent::Opened)
                .unwrap();
        }

        fn deliver(&self, raw: &str) {
            let senders = self.sessions.lock().unwrap();
            senders
                .last()
                .unwrap()
                .send(TransportEvent::Message(raw.to_string()))
                .unwrap();
        }

        fn drop_connection(&self) {
            let senders = self.sessions.lock().unwrap();
            senders
                .last()
                .unwrap()
                .send(TransportEvent::Closed)
                .unwrap();
        }
    }

    struct FakeSession {
        wire: Arc<FakeWire>,
    }

    impl TransportSession for FakeSession {
        fn send_text(&self, text: &str) -> Result<(), TransportError> {
            self.wire.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }

        fn close(&self) {
            self.wire.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct FakeConnector {
        wire: Arc<FakeWire>,
    }

    impl Connector for FakeConnector {
        fn connect(
            &self,
            _url: &str,
        ) -> Result<
            (
                Box<dyn TransportSession>,
                mpsc::UnboundedReceiver<TransportEvent>,
            ),
            TransportError,
        > {
            if self.wire.refuse_construction.load(Ordering::SeqCst) {
                return Err(TransportError::Construction("refused by test".to_string()));
            }
            let (event_tx, event_rx) = mpsc::unbounded_channel();
            self.wire.sessions.lock().unwrap().push(event_tx);
            Ok((
                Box::new(FakeSession {
                    wire: Arc::clone(&self.wire),
                }),
                event_rx,
            ))
        }
    }

    fn client_with_fake_wire() -> (RealtimeClient, Arc<FakeWire>) {
        let wire = Arc::new(FakeWire::default());
        let client = RealtimeClient::with_connector(
            "ws://localhost:8000/ws",
            Arc::new(FakeConnector {
                wire: Arc::clone(&wire),
            }),
        );
        (client, wire)
    }

    /// Let spawned pump/heartbeat tasks run on the current-thread runtime.
    async fn settle() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    fn counter_callback(counter: &Arc<AtomicUsize>) -> LifecycleCallback {
        let counter = Arc::clone(counter);
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test]
    async fn test_connect_transitions_to_open_and_fires_on_open_once() {
        let (client, wire) = client_with_fake_wire();
        let opens = Arc::new(AtomicUsize::new(0));

        assert_eq!(client.state(), SessionState::Idle);
        client.connect(Some(counter_callback(&opens)), None);
        assert_eq!(client.state(), SessionState::Connecting);

        wire.open();
        settle().await;

        assert_eq!(client.state(), SessionState::Open);
        assert_eq!(opens.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_position_update_routes_to_topic_and_wildcard() {
        let (client, wire) = client_with_fake_wire();

        let topic_seen = Arc::new(Mutex::new(None));
        let wildcard_seen = Arc::new(Mutex::new(None));
        {
            let seen = Arc::clone(&topic_seen);
            client.subscribe("position_update", move |payload| {
                *seen.lock().unwrap() = Some(payload);
            });
        }
        {
            let seen = Arc::clone(&wildcard_seen);
            client.subscribe("*", move |envelope| {
                *seen.lock().unwrap() = Some(envelope);
            });
        }

        client.connect(None, None);
        wire.open();
        wire.deliver(r#"{"type":"position_update","rakeId":"R1","progress":42}"#);
        settle().await;

        let payload = topic_seen.lock().unwrap().take().unwrap();
        assert!(payload.get("type").is_none());
        assert_eq!(payload["rakeId"], "R1");
        assert_eq!(payload["progress"], 42);

        let full = wildcard_seen.lock().unwrap().take().unwrap();
        assert_eq!(full["type"], "position_update");
        assert_eq!(full["rakeId"], "R1");
        assert_eq!(full["progress"], 42);
    }

    #[tokio::test]
    async fn test_send_refused_until_open_then_writes_exactly_one_frame() {
        let (client, wire) = client_with_fake_wire();

        // Idle: nothing written, nothing buffered.
        assert!(!client.control_simulation(SimulationAction::Pause));
        assert!(wire.sent().is_empty());

        client.connect(None, None);
        // Connecting is not open either.
        assert!(!client.request_positions());
        assert!(wire.sent().is_empty());

        wire.open();
        settle().await;

        assert!(client.control_simulation(SimulationAction::Pause));
        let frames = wire.sent();
        assert_eq!(frames.len(), 1);
        let frame: Value = serde_json::from_str(&frames[0]).unwrap();
        assert_eq!(frame["type"], "simulation_control");
        assert_eq!(frame["action"], "pause");
    }

    #[tokio::test]
    async fn test_simulation_event_payload_shape() {
        let (client, wire) = client_with_fake_wire();
        client.connect(None, None);
        wire.open();
        settle().await;

        let mut details = Map::new();
        details.insert("station".to_string(), json!("BKSC"));
        assert!(client.send_simulation_event("arrival", "R7", details));

        let frame: Value = serde_json::from_str(&wire.sent()[0]).unwrap();
        assert_eq!(frame["type"], "simulation_event");
        assert_eq!(frame["eventType"], "arrival");
        assert_eq!(frame["rakeId"], "R7");
        assert_eq!(frame["station"], "BKSC");
    }

    #[tokio::test]
    async fn test_unexpected_close_fires_on_close_and_refuses_sends() {
        let (client, wire) = client_with_fake_wire();
        let closes = Arc::new(AtomicUsize::new(0));

        client.connect(None, Some(counter_callback(&closes)));
        wire.open();
        settle().await;
        assert_eq!(client.state(), SessionState::Open);

        wire.drop_connection();
        settle().await;

        assert_eq!(client.state(), SessionState::Closed);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert!(!client.control_simulation(SimulationAction::Pause));
        assert!(wire.sent().is_empty());
    }

    #[tokio::test]
    async fn test_explicit_disconnect_fires_on_close_exactly_once() {
        let (client, wire) = client_with_fake_wire();
        let closes = Arc::new(AtomicUsize::new(0));

        client.connect(None, Some(counter_callback(&closes)));
        wire.open();
        settle().await;

        // Intentional teardown notifies the same way a transport close
        // would, once.
        client.disconnect();
        settle().await;
        assert_eq!(closes.load(Ordering::SeqCst), 1);

        // Repeated disconnects find no session and stay quiet.
        client.disconnect();
        settle().await;
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_on_close_not_repeated_when_disconnect_follows_transport_close() {
        let (client, wire) = client_with_fake_wire();
        let closes = Arc::new(AtomicUsize::new(0));

        client.connect(None, Some(counter_callback(&closes)));
        wire.open();
        settle().await;

        wire.drop_connection();
        settle().await;
        assert_eq!(closes.load(Ordering::SeqCst), 1);

        // Cleaning up the already-closed session does not notify again.
        client.disconnect();
        settle().await;
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_sends_one_ping_per_tick() {
        let (client, wire) = client_with_fake_wire();
        client.connect(None, None);
        wire.open();
        settle().await;

        client.start_heartbeat(Duration::from_secs(1));
        settle().await; // let the timer task initialize before advancing
        for _ in 0..3 {
            tokio::time::advance(Duration::from_secs(1)).await;
            settle().await;
        }
        assert_eq!(wire.ping_count(), 3);

        client.disconnect();
        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(wire.ping_count(), 3, "no pings after disconnect");
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_tick_skipped_while_not_open() {
        let (client, wire) = client_with_fake_wire();

        // Timer running with no session at all: every tick is a no-op.
        client.start_heartbeat(Duration::from_secs(1));
        settle().await;
        tokio::time::advance(Duration::from_secs(3)).await;
        settle().await;
        assert_eq!(wire.ping_count(), 0);

        // Once a session opens, the same timer starts landing pings.
        client.connect(None, None);
        wire.open();
        settle().await;
        tokio::time::advance(Duration::from_secs(1)).await;
        settle().await;
        assert_eq!(wire.ping_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restarting_heartbeat_cancels_the_previous_timer() {
        let (client, wire) = client_with_fake_wire();
        client.connect(None, None);
        wire.open();
        settle().await;

        client.start_heartbeat(Duration::from_secs(1));
        client.start_heartbeat(Duration::from_secs(10));
        settle().await;

        // The 1s timer is gone; nothing fires before the 10s tick.
        tokio::time::advance(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(wire.ping_count(), 0);

        tokio::time::advance(Duration::from_secs(8)).await;
        settle().await;
        assert_eq!(wire.ping_count(), 1);
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent_and_closes_once() {
        let (client, wire) = client_with_fake_wire();

        // Disconnecting a never-connected client is a no-op.
        client.disconnect();
        assert_eq!(client.state(), SessionState::Idle);

        client.connect(None, None);
        wire.open();
        settle().await;

        client.disconnect();
        client.disconnect();
        settle().await;

        assert_eq!(client.state(), SessionState::Closed);
        assert_eq!(wire.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_construction_failure_keeps_prior_state() {
        let (client, wire) = client_with_fake_wire();
        wire.refuse_construction.store(true, Ordering::SeqCst);

        client.connect(None, None);
        assert_eq!(client.state(), SessionState::Idle);
        assert_eq!(wire.session_count(), 0);
    }

    #[tokio::test]
    async fn test_subscriptions_survive_reconnect() {
        let (client, wire) = client_with_fake_wire();
        let deliveries = Arc::new(AtomicUsize::new(0));
        {
            let deliveries = Arc::clone(&deliveries);
            client.subscribe("position_update", move |_| {
                deliveries.fetch_add(1, Ordering::SeqCst);
            });
        }

        client.connect(None, None);
        wire.open();
        wire.deliver(r#"{"type":"position_update","rakeId":"R1"}"#);
        settle().await;
        wire.drop_connection();
        settle().await;
        assert_eq!(client.state(), SessionState::Closed);

        // Caller-driven reconnect: brand-new session, same registry.
        client.connect(None, None);
        assert_eq!(wire.session_count(), 2);
        wire.open();
        wire.deliver(r#"{"type":"position_update","rakeId":"R2"}"#);
        settle().await;

        assert_eq!(deliveries.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_replacing_a_connecting_session_discards_the_old_one() {
        let (client, wire) = client_with_fake_wire();

        client.connect(None, None);
        settle().await;
        client.connect(None, None);
        settle().await;
        assert_eq!(wire.session_count(), 2);

        // The retired session's pump is gone: its events go nowhere and
        // cannot flip the manager's state.
        let stale = wire.event_sender(0);
        assert!(stale.send(TransportEvent::Opened).is_err());
        assert_eq!(client.state(), SessionState::Connecting);
    }

    #[tokio::test]
    async fn test_unparseable_frame_is_dropped_without_breaking_the_session() {
        let (client, wire) = client_with_fake_wire();
        let deliveries = Arc::new(AtomicUsize::new(0));
        {
            let deliveries = Arc::clone(&deliveries);
            client.subscribe("*", move |_| {
                deliveries.fetch_add(1, Ordering::SeqCst);
            });
        }

        client.connect(None, None);
        wire.open();
        wire.deliver("not json at all");
        wire.deliver(r#"{"type":"simulation_event","eventType":"arrival"}"#);
        settle().await;

        assert_eq!(client.state(), SessionState::Open);
        assert_eq!(deliveries.load(Ordering::SeqCst), 1);
    }
}
