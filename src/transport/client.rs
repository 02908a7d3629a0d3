//! WebSocket transport to the room server
//!
//! Owns the duplex connection: connect and bounded reconnect, heartbeat pings
//! with round-trip measurement, and demultiplexing of inbound messages by their
//! `type` field. Inbound messages are dispatched strictly in arrival order from a
//! single reader loop.

use super::{heartbeat::PingTracker, reconnect::ReconnectPolicy};
use crate::{
    config::{CONNECTION_FAILED_MSG, CONNECTION_LOST_MSG, Config, PING_ID_FIELD},
    error::{Error, Result},
    observer::{SessionObserver, ToastLevel},
    protocol::Outbound,
};
use futures::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Handler for one inbound message type, receives the whole JSON object
pub type MessageHandler = Arc<dyn Fn(Value) + Send + Sync>;

/// Produces extra fields merged into every heartbeat ping
pub type HeartbeatDataProvider = Arc<dyn Fn() -> Map<String, Value> + Send + Sync>;

/// State of the duplex channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        };
        write!(f, "{label}")
    }
}

/// Timing knobs of the transport
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub max_reconnect_attempts: u32,
    pub reconnect_delay: Duration,
    pub heartbeat_interval: Duration,
    pub ping_expiry: Duration,
}

impl From<&Config> for TransportConfig {
    fn from(config: &Config) -> Self {
        Self {
            max_reconnect_attempts: config.max_reconnect_attempts,
            reconnect_delay: config.reconnect_delay(),
            heartbeat_interval: config.heartbeat_interval(),
            ping_expiry: config.ping_expiry(),
        }
    }
}

struct Shared {
    config: TransportConfig,
    observer: Arc<dyn SessionObserver>,
    state: Mutex<ConnectionState>,
    outbound: Mutex<Option<mpsc::UnboundedSender<Message>>>,
    handlers: Mutex<HashMap<String, MessageHandler>>,
    heartbeat_provider: Mutex<Option<HeartbeatDataProvider>>,
    pings: Mutex<PingTracker>,
    failure: watch::Sender<Option<u32>>,
    closing: Mutex<bool>,
    greeting: Mutex<Option<Outbound>>,
}

/// Real-time duplex channel to one room
#[derive(Clone)]
pub struct Transport {
    shared: Arc<Shared>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Transport {
    pub fn new(config: TransportConfig, observer: Arc<dyn SessionObserver>) -> Self {
        let (failure, _) = watch::channel(None);
        let ping_expiry = config.ping_expiry;
        Self {
            shared: Arc::new(Shared {
                config,
                observer,
                state: Mutex::new(ConnectionState::Disconnected),
                outbound: Mutex::new(None),
                handlers: Mutex::new(HashMap::new()),
                heartbeat_provider: Mutex::new(None),
                pings: Mutex::new(PingTracker::new(ping_expiry)),
                failure,
                closing: Mutex::new(false),
                greeting: Mutex::new(None),
            }),
        }
    }

    /// Opens the channel to `endpoint`.
    ///
    /// Returns once the first attempt either opened the channel or failed; a
    /// failed first attempt is retried in the background like any other drop.
    /// Exhaustion of the reconnect budget is reported through [`Transport::failed`].
    pub async fn connect(&self, endpoint: &str) -> Result<()> {
        if self.state() == ConnectionState::Connected {
            return Ok(());
        }
        *lock(&self.shared.closing) = false;

        let (ready_tx, ready_rx) = oneshot::channel();
        tokio::spawn(supervise(
            self.shared.clone(),
            endpoint.to_string(),
            ready_tx,
        ));
        // The supervisor always signals after its first attempt
        let _ = ready_rx.await;
        Ok(())
    }

    /// Closes the channel without reconnecting
    pub fn disconnect(&self) {
        *lock(&self.shared.closing) = true;
        if let Some(tx) = lock(&self.shared.outbound).as_ref() {
            let _ = tx.send(Message::Close(None));
        }
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        *lock(&self.shared.state)
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Sends a message while connected; silently drops it otherwise.
    ///
    /// Returns whether the message was handed to the connection.
    pub fn send(&self, message: &Outbound) -> bool {
        match message.encode() {
            Ok(text) => self.shared.send_text(message.message_type(), text),
            Err(err) => {
                error!("{err}");
                false
            }
        }
    }

    /// Sends `{type, ...payload}` while connected; silently drops it otherwise
    pub fn send_raw(&self, message_type: &str, payload: Map<String, Value>) -> bool {
        self.shared.send_object(message_type, payload)
    }

    /// Registers the handler for `message_type`, replacing any earlier one
    pub fn on_message<F>(&self, message_type: &str, handler: F)
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        lock(&self.shared.handlers).insert(message_type.to_string(), Arc::new(handler));
    }

    /// Sets the message sent first on every (re)opened connection
    pub fn set_greeting(&self, message: Outbound) {
        *lock(&self.shared.greeting) = Some(message);
    }

    /// Sets the producer of extra heartbeat fields
    pub fn set_heartbeat_data_provider<F>(&self, provider: F)
    where
        F: Fn() -> Map<String, Value> + Send + Sync + 'static,
    {
        *lock(&self.shared.heartbeat_provider) = Some(Arc::new(provider));
    }

    /// Resolves with the exhausted error once reconnection gave up
    pub async fn failed(&self, endpoint: &str) -> Error {
        let mut failure = self.shared.failure.subscribe();
        let attempts = match failure.wait_for(Option::is_some).await {
            Ok(attempts) => attempts.unwrap_or_default(),
            // The sender lives as long as `self`, this arm is unreachable in practice
            Err(_) => self.shared.config.max_reconnect_attempts,
        };
        Error::ReconnectExhausted {
            endpoint: endpoint.to_string(),
            attempts,
        }
    }
}

impl Shared {
    fn set_state(&self, state: ConnectionState) {
        let changed = {
            let mut current = lock(&self.state);
            let changed = *current != state;
            *current = state;
            changed
        };
        if changed {
            self.observer.connection_status(state);
        }
    }

    fn send_object(&self, message_type: &str, mut payload: Map<String, Value>) -> bool {
        payload.insert("type".to_string(), Value::String(message_type.to_string()));
        match serde_json::to_string(&Value::Object(payload)) {
            Ok(text) => self.send_text(message_type, text),
            Err(source) => {
                error!(
                    "{}",
                    Error::MessageEncodeFailed {
                        message_type: message_type.to_string(),
                        source,
                    }
                );
                false
            }
        }
    }

    fn send_text(&self, message_type: &str, text: String) -> bool {
        if *lock(&self.state) != ConnectionState::Connected {
            debug!("Dropping '{message_type}' while not connected");
            return false;
        }
        match lock(&self.outbound).as_ref() {
            Some(tx) => tx.send(Message::Text(text)).is_ok(),
            None => false,
        }
    }

    /// Single dispatch point for inbound text frames
    fn dispatch(&self, text: &str) {
        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(err) => {
                error!("Failed to parse message: {err}");
                return;
            }
        };

        let Some(message_type) = value.get("type").and_then(Value::as_str).map(str::to_string)
        else {
            warn!("Dropping message without type");
            return;
        };

        if message_type == "pong" {
            self.handle_pong(&value);
            return;
        }

        let handler = lock(&self.handlers).get(&message_type).cloned();
        match handler {
            Some(handler) => {
                debug!("Dispatching '{message_type}'");
                handler(value);
            }
            None => warn!("Unknown message type: {message_type}"),
        }
    }

    fn handle_pong(&self, value: &Value) {
        let id = value.get(PING_ID_FIELD).and_then(Value::as_u64);
        let rtt = lock(&self.pings).resolve(id, Instant::now());
        if let Err(err) = self.observer.rtt_updated(rtt) {
            debug!("Ignoring RTT report failure: {err}");
        }
    }

    fn send_heartbeat(&self) {
        if *lock(&self.state) != ConnectionState::Connected {
            return;
        }
        let provider = lock(&self.heartbeat_provider).clone();
        let mut payload = provider.map(|provider| provider()).unwrap_or_default();

        let id = {
            let mut pings = lock(&self.pings);
            let now = Instant::now();
            pings.prune(now);
            pings.register(now)
        };
        payload.insert(PING_ID_FIELD.to_string(), Value::from(id));
        self.send_object("ping", payload);
    }

    fn send_greeting(&self) {
        let greeting = lock(&self.greeting).clone();
        if let Some(greeting) = greeting {
            match greeting.encode() {
                Ok(text) => {
                    self.send_text(greeting.message_type(), text);
                }
                Err(err) => error!("{err}"),
            }
        }
    }

    fn is_closing(&self) -> bool {
        *lock(&self.closing)
    }
}

/// Connects, runs the connection and reconnects until the budget is spent
async fn supervise(shared: Arc<Shared>, endpoint: String, ready: oneshot::Sender<()>) {
    let mut ready = Some(ready);
    let mut policy = ReconnectPolicy::new(
        shared.config.max_reconnect_attempts,
        shared.config.reconnect_delay,
    );

    loop {
        shared.set_state(ConnectionState::Connecting);
        match connect_async(endpoint.as_str()).await {
            Ok((stream, _)) => {
                info!("Connected to {endpoint}");
                policy.reset();
                let (tx, rx) = mpsc::unbounded_channel();
                *lock(&shared.outbound) = Some(tx);
                shared.set_state(ConnectionState::Connected);
                shared.send_greeting();
                shared.observer.connection_restored();
                if let Some(ready) = ready.take() {
                    let _ = ready.send(());
                }
                run_connection(&shared, stream, rx).await;
            }
            Err(source) => {
                warn!(
                    "{}",
                    Error::WebSocketConnectFailed {
                        endpoint: endpoint.clone(),
                        source,
                    }
                );
                if let Some(ready) = ready.take() {
                    let _ = ready.send(());
                }
            }
        }

        shared.set_state(ConnectionState::Disconnected);
        if shared.is_closing() {
            info!("Connection to {endpoint} closed");
            return;
        }

        match policy.next_delay() {
            Some(delay) => {
                if policy.attempts() == 1 {
                    shared.observer.toast(ToastLevel::Warning, CONNECTION_LOST_MSG);
                }
                shared
                    .observer
                    .connection_lost(policy.attempts(), policy.max_attempts());
                sleep(delay).await;
            }
            None => {
                error!(
                    "Giving up on {endpoint} after {} reconnection attempts",
                    policy.attempts()
                );
                shared.observer.toast(ToastLevel::Error, CONNECTION_FAILED_MSG);
                shared.observer.connection_failed();
                shared.failure.send_replace(Some(policy.attempts()));
                return;
            }
        }
    }
}

/// Pumps one open connection until it closes
async fn run_connection(
    shared: &Shared,
    stream: WsStream,
    mut rx: mpsc::UnboundedReceiver<Message>,
) {
    let (mut write, mut read) = stream.split();

    let period = shared.config.heartbeat_interval;
    let mut heartbeat = interval_at(Instant::now() + period, period);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            Some(message) = rx.recv() => {
                let closing = matches!(message, Message::Close(_));
                if let Err(err) = write.send(message).await {
                    warn!("Failed to send message: {err}");
                    break;
                }
                if closing {
                    break;
                }
            }
            incoming = read.next() => match incoming {
                Some(Ok(Message::Text(text))) => shared.dispatch(&text),
                Some(Ok(Message::Close(frame))) => {
                    info!("Server closed the connection: {frame:?}");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    warn!("WebSocket error: {err}");
                    break;
                }
                None => break,
            },
            _ = heartbeat.tick() => shared.send_heartbeat(),
        }
    }

    *lock(&shared.outbound) = None;
}
