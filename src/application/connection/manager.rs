//! Connection manager - one reconnecting session per endpoint.
//!
//! # Lifecycle
//!
//! ```text
//!              connect()
//! Disconnected ─────────▶ Connecting ──handshake──▶ Open
//!      ▲                      │                       │
//!      │  attempt failed      │      error / remote   │
//!      ├──────────────────────┘      close / silence  │
//!      ◀──────────────────────────────────────────────┘
//!      │
//!      └── retry delay, then Connecting again, until `max_attempts`
//!          consecutive failures; then stay Disconnected and report the
//!          connection as lost until `connect()` is called again.
//!
//! Open ──shutdown()──▶ Closing ──▶ Disconnected
//! ```
//!
//! A single background task owns the transport session, the keepalive
//! ticker, the liveness deadline and the retry timer. Callers talk to it
//! through a command channel and observe it through a `watch` channel.
//! Inbound messages are parsed on that task and handed, in order, to a
//! second task running the [`Dispatcher`], so slow handlers never delay
//! keepalive handling.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, sleep_until, Instant, MissedTickBehavior};
use url::Url;

use super::dispatcher::{BatchRoute, Dispatcher};
use super::{KeepalivePolicy, ManagerStopped, RetryPolicy, SendError};
use crate::domain::connection::{
    ConnectionSnapshot, ConnectionState, InboundEnvelope, OutboundMessage,
};
use crate::domain::foundation::{SessionId, StateMachine, Timestamp};
use crate::ports::{
    BatchHandler, ConnectionObserver, MessageHandler, NoopObserver, Transport, TransportError,
    TransportSession,
};

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

enum Command {
    Connect,
    Send {
        message: OutboundMessage,
        reply: oneshot::Sender<Result<(), SendError>>,
    },
    Shutdown,
}

// ============================================
// Builder
// ============================================

/// Configures and starts a [`ConnectionManager`].
pub struct ConnectionManagerBuilder {
    transport: Arc<dyn Transport>,
    endpoint: Url,
    retry: RetryPolicy,
    keepalive: KeepalivePolicy,
    connect_timeout: Duration,
    channels: Vec<String>,
    routes: HashMap<String, Arc<dyn MessageHandler>>,
    batched: Vec<BatchRoute>,
    fallback: Option<Arc<dyn MessageHandler>>,
    observer: Arc<dyn ConnectionObserver>,
}

impl ConnectionManagerBuilder {
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn keepalive(mut self, keepalive: KeepalivePolicy) -> Self {
        self.keepalive = keepalive;
        self
    }

    /// Upper bound on a single handshake.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Adds a channel to (re)subscribe to after every open.
    pub fn subscribe(mut self, channel: impl Into<String>) -> Self {
        let channel = channel.into();
        if !self.channels.contains(&channel) {
            self.channels.push(channel);
        }
        self
    }

    /// Registers the handler for a message tag.
    pub fn on(mut self, tag: impl Into<String>, handler: Arc<dyn MessageHandler>) -> Self {
        let tag = tag.into();
        self.batched.retain(|route| route.tag != tag);
        self.routes.insert(tag, handler);
        self
    }

    /// Registers a batch handler for a high-frequency tag.
    ///
    /// Messages with this tag are delivered at most once per `period`, in
    /// batches of at most `buffer_size` (newest kept).
    pub fn on_batched(
        mut self,
        tag: impl Into<String>,
        period: Duration,
        buffer_size: usize,
        handler: Arc<dyn BatchHandler>,
    ) -> Self {
        let tag = tag.into();
        self.routes.remove(&tag);
        self.batched.retain(|route| route.tag != tag);
        self.batched.push(BatchRoute {
            tag,
            period,
            buffer_size,
            handler,
        });
        self
    }

    /// Handles messages whose tag has no registered handler.
    pub fn fallback(mut self, handler: Arc<dyn MessageHandler>) -> Self {
        self.fallback = Some(handler);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn ConnectionObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Starts the manager in `Disconnected`; call
    /// [`ConnectionManager::connect`] to open the first session.
    ///
    /// Requires a Tokio runtime.
    pub fn build(self) -> ConnectionManager {
        let mut dispatcher = Dispatcher::new();
        for (tag, handler) in self.routes {
            dispatcher.route(tag, handler);
        }
        if let Some(fallback) = self.fallback {
            dispatcher.set_fallback(fallback);
        }
        let forwarders = self
            .batched
            .into_iter()
            .map(|route| dispatcher.route_batched(route))
            .collect();

        let (inbound_tx, mut inbound_rx) = mpsc::unbounded_channel::<InboundEnvelope>();
        let dispatch_task = tokio::spawn(async move {
            while let Some(envelope) = inbound_rx.recv().await {
                dispatcher.dispatch(envelope).await;
            }
        });

        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionSnapshot::default());

        let task = ConnectionTask {
            transport: self.transport,
            endpoint: self.endpoint.clone(),
            retry: self.retry,
            keepalive: self.keepalive,
            connect_timeout: self.connect_timeout,
            channels: self.channels,
            observer: self.observer,
            commands: commands_rx,
            state: state_tx,
            inbound: inbound_tx,
            forwarders,
            dispatch_task,
        };
        tokio::spawn(task.run());

        ConnectionManager {
            endpoint: self.endpoint,
            commands: commands_tx,
            state: state_rx,
        }
    }
}

// ============================================
// Handle
// ============================================

/// Handle to a running connection manager.
///
/// Dropping the handle shuts the manager down.
pub struct ConnectionManager {
    endpoint: Url,
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ConnectionSnapshot>,
}

impl ConnectionManager {
    pub fn builder(transport: Arc<dyn Transport>, endpoint: Url) -> ConnectionManagerBuilder {
        ConnectionManagerBuilder {
            transport,
            endpoint,
            retry: RetryPolicy::default(),
            keepalive: KeepalivePolicy::default(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            channels: Vec::new(),
            routes: HashMap::new(),
            batched: Vec::new(),
            fallback: None,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Opens a session, or re-initiates after the connection was lost.
    ///
    /// Resets the failure count. A no-op while connecting or open.
    pub fn connect(&self) -> Result<(), ManagerStopped> {
        self.commands
            .send(Command::Connect)
            .map_err(|_| ManagerStopped)
    }

    /// Sends a message on the open session.
    pub async fn send(&self, message: OutboundMessage) -> Result<(), SendError> {
        if !self.state.borrow().is_open() {
            return Err(SendError::NotOpen);
        }
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Send { message, reply })
            .map_err(|_| SendError::Stopped)?;
        response.await.unwrap_or(Err(SendError::Stopped))
    }

    pub fn state(&self) -> ConnectionState {
        self.state.borrow().state
    }

    pub fn snapshot(&self) -> ConnectionSnapshot {
        self.state.borrow().clone()
    }

    /// Subscribes to snapshot changes.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionSnapshot> {
        self.state.clone()
    }

    /// Closes the session and stops all timers and background tasks.
    ///
    /// The manager cannot be reconnected afterwards.
    pub async fn shutdown(&self) {
        if self.commands.send(Command::Shutdown).is_ok() {
            self.commands.closed().await;
        }
    }
}

// ============================================
// Background task
// ============================================

enum Phase {
    Idle,
    Connecting,
    Backoff,
    Open(Box<dyn TransportSession>),
    Stopped,
}

/// What to do with a command that arrived while no session is open.
enum Control {
    Continue,
    Connect,
    Stop,
}

enum SessionEvent {
    Frame(Option<Result<String, TransportError>>),
    Command(Option<Command>),
    KeepaliveTick,
    LivenessExpired,
}

struct ConnectionTask {
    transport: Arc<dyn Transport>,
    endpoint: Url,
    retry: RetryPolicy,
    keepalive: KeepalivePolicy,
    connect_timeout: Duration,
    channels: Vec<String>,
    observer: Arc<dyn ConnectionObserver>,
    commands: mpsc::UnboundedReceiver<Command>,
    state: watch::Sender<ConnectionSnapshot>,
    inbound: mpsc::UnboundedSender<InboundEnvelope>,
    forwarders: Vec<JoinHandle<()>>,
    dispatch_task: JoinHandle<()>,
}

impl ConnectionTask {
    async fn run(mut self) {
        let mut phase = Phase::Idle;
        loop {
            phase = match phase {
                Phase::Idle => self.idle().await,
                Phase::Connecting => self.attempt().await,
                Phase::Backoff => self.backoff().await,
                Phase::Open(session) => self.run_session(session).await,
                Phase::Stopped => break,
            };
        }

        self.commands.close();
        for forwarder in &self.forwarders {
            forwarder.abort();
        }
        tracing::debug!(endpoint = %self.endpoint, "Connection manager stopped");
        // Dropping `inbound` lets the dispatch task drain and finish.
        drop(self.inbound);
        let _ = self.dispatch_task.await;
    }

    async fn idle(&mut self) -> Phase {
        loop {
            let command = self.commands.recv().await;
            match self.answer_closed(command) {
                Control::Continue => continue,
                Control::Connect => {
                    self.state.send_modify(|snapshot| {
                        snapshot.retry_count = 0;
                        snapshot.connection_lost = false;
                    });
                    return Phase::Connecting;
                }
                Control::Stop => return Phase::Stopped,
            }
        }
    }

    async fn attempt(&mut self) -> Phase {
        self.transition(ConnectionState::Connecting);

        let transport = Arc::clone(&self.transport);
        let endpoint = self.endpoint.clone();
        let timeout = self.connect_timeout;
        let attempt = async move { tokio::time::timeout(timeout, transport.connect(&endpoint)).await };
        tokio::pin!(attempt);

        loop {
            tokio::select! {
                result = &mut attempt => {
                    return match result {
                        Ok(Ok(session)) => self.opened(session).await,
                        Ok(Err(e)) => self.failed(e),
                        Err(_) => self.failed(TransportError::Timeout),
                    };
                }
                command = self.commands.recv() => match self.answer_closed(command) {
                    Control::Continue | Control::Connect => continue,
                    Control::Stop => return Phase::Stopped,
                },
            }
        }
    }

    async fn backoff(&mut self) -> Phase {
        let delay = self.retry.delay;
        let attempt = self.state.borrow().retry_count + 1;
        tracing::info!(
            endpoint = %self.endpoint,
            attempt,
            max_attempts = self.retry.max_attempts,
            delay_ms = delay.as_millis() as u64,
            "Reconnect scheduled"
        );

        let timer = sleep(delay);
        tokio::pin!(timer);

        loop {
            tokio::select! {
                _ = &mut timer => return Phase::Connecting,
                command = self.commands.recv() => match self.answer_closed(command) {
                    Control::Continue => continue,
                    Control::Connect => return Phase::Connecting,
                    Control::Stop => return Phase::Stopped,
                },
            }
        }
    }

    async fn opened(&mut self, mut session: Box<dyn TransportSession>) -> Phase {
        let session_id = SessionId::new();
        self.state.send_modify(|snapshot| {
            snapshot.retry_count = 0;
            snapshot.connection_lost = false;
            snapshot.last_error = None;
            snapshot.session_id = Some(session_id);
            snapshot.session_started_at = Some(Timestamp::now());
        });
        self.transition(ConnectionState::Open);
        tracing::info!(session_id = %session_id, endpoint = %self.endpoint, "Session opened");
        self.observer.on_open(session_id);

        for channel in self.channels.clone() {
            if let Err(e) = send_frame(session.as_mut(), &OutboundMessage::subscribe(&channel)).await {
                tracing::warn!(session_id = %session_id, channel = %channel, error = %e, "Subscribe failed");
                return self.dropped(session, e.to_string()).await;
            }
            tracing::debug!(session_id = %session_id, channel = %channel, "Subscribed");
        }

        Phase::Open(session)
    }

    fn failed(&mut self, error: TransportError) -> Phase {
        let reason = error.to_string();
        self.state.send_modify(|snapshot| {
            snapshot.retry_count += 1;
            snapshot.last_error = Some(reason.clone());
        });
        self.transition(ConnectionState::Disconnected);
        self.observer.on_error(&error);

        let failures = self.state.borrow().retry_count;
        tracing::warn!(
            endpoint = %self.endpoint,
            attempt = failures,
            max_attempts = self.retry.max_attempts,
            error = %error,
            "Connection attempt failed"
        );

        if !self.retry.is_exhausted(failures) {
            return Phase::Backoff;
        }

        self.state.send_modify(|snapshot| snapshot.connection_lost = true);
        tracing::error!(
            endpoint = %self.endpoint,
            attempts = failures,
            last_error = %reason,
            "Connection lost, giving up until reconnect is requested"
        );
        self.observer.on_connection_lost(failures, Some(&reason));
        Phase::Idle
    }

    async fn run_session(&mut self, mut session: Box<dyn TransportSession>) -> Phase {
        let session_id = self.state.borrow().session_id.unwrap_or_default();
        let interval = self.keepalive.interval;
        let mut keepalive = interval_at(Instant::now() + interval, interval);
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_inbound = Instant::now();

        loop {
            let liveness_deadline = last_inbound + self.keepalive.liveness_timeout();

            let event = tokio::select! {
                frame = session.recv() => SessionEvent::Frame(frame),
                command = self.commands.recv() => SessionEvent::Command(command),
                _ = keepalive.tick() => SessionEvent::KeepaliveTick,
                _ = sleep_until(liveness_deadline) => SessionEvent::LivenessExpired,
            };

            match event {
                SessionEvent::Frame(Some(Ok(frame))) => {
                    last_inbound = Instant::now();
                    self.deliver(session_id, &frame);
                }
                SessionEvent::Frame(Some(Err(e))) => {
                    self.observer.on_error(&e);
                    return self.dropped(session, e.to_string()).await;
                }
                SessionEvent::Frame(None) => {
                    return self.dropped(session, "closed by server".to_string()).await;
                }
                SessionEvent::Command(Some(Command::Send { message, reply })) => {
                    let result = send_frame(session.as_mut(), &message).await;
                    let transport_error = match &result {
                        Err(SendError::Transport(e)) => Some(e.clone()),
                        _ => None,
                    };
                    let _ = reply.send(result);
                    if let Some(e) = transport_error {
                        self.observer.on_error(&e);
                        return self.dropped(session, e.to_string()).await;
                    }
                }
                SessionEvent::Command(Some(Command::Connect)) => {}
                SessionEvent::Command(Some(Command::Shutdown)) | SessionEvent::Command(None) => {
                    self.close(session).await;
                    return Phase::Stopped;
                }
                SessionEvent::KeepaliveTick => {
                    if let Err(e) = send_frame(session.as_mut(), &OutboundMessage::Ping).await {
                        return self.dropped(session, e.to_string()).await;
                    }
                    tracing::trace!(session_id = %session_id, "Keepalive ping sent");
                }
                SessionEvent::LivenessExpired => {
                    tracing::warn!(
                        session_id = %session_id,
                        silence_secs = self.keepalive.liveness_timeout().as_secs(),
                        "No traffic within liveness window, treating session as dead"
                    );
                    let _ = session.close().await;
                    return self.dropped(session, "liveness timeout".to_string()).await;
                }
            }
        }
    }

    /// Parses a frame and queues it for dispatch; malformed frames are
    /// logged and dropped.
    fn deliver(&self, session_id: SessionId, frame: &str) {
        match InboundEnvelope::parse(frame) {
            Ok(envelope) => {
                tracing::trace!(session_id = %session_id, tag = %envelope.tag(), "Inbound message");
                let _ = self.inbound.send(envelope);
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %session_id,
                    error = %e,
                    frame_len = frame.len(),
                    "Dropping malformed inbound frame"
                );
            }
        }
    }

    /// The open session ended without being asked to.
    async fn dropped(&mut self, mut session: Box<dyn TransportSession>, reason: String) -> Phase {
        let _ = session.close().await;
        let session_id = self.state.borrow().session_id;
        self.state
            .send_modify(|snapshot| snapshot.last_error = Some(reason.clone()));
        self.transition(ConnectionState::Disconnected);

        if let Some(session_id) = session_id {
            tracing::warn!(session_id = %session_id, reason = %reason, "Session dropped");
            self.observer.on_disconnect(session_id, &reason);
        }

        if self.retry.is_exhausted(self.state.borrow().retry_count) {
            return Phase::Idle;
        }
        Phase::Backoff
    }

    /// Orderly close requested by the owner.
    async fn close(&mut self, mut session: Box<dyn TransportSession>) {
        self.transition(ConnectionState::Closing);
        if let Err(e) = session.close().await {
            tracing::debug!(error = %e, "Error while closing session");
        }
        self.transition(ConnectionState::Disconnected);

        let session_id = self.state.borrow().session_id;
        if let Some(session_id) = session_id {
            tracing::info!(session_id = %session_id, "Session closed");
            self.observer.on_disconnect(session_id, "shutdown");
        }
    }

    fn answer_closed(&mut self, command: Option<Command>) -> Control {
        match command {
            Some(Command::Connect) => Control::Connect,
            Some(Command::Send { reply, .. }) => {
                let _ = reply.send(Err(SendError::NotOpen));
                Control::Continue
            }
            Some(Command::Shutdown) | None => {
                if self.state.borrow().state == ConnectionState::Connecting {
                    self.transition(ConnectionState::Disconnected);
                }
                Control::Stop
            }
        }
    }

    fn transition(&self, next: ConnectionState) {
        let current = self.state.borrow().state;
        if current == next {
            return;
        }
        if !current.can_transition_to(&next) {
            tracing::warn!(from = %current, to = %next, "Unexpected connection state transition");
        }
        tracing::debug!(from = %current, to = %next, endpoint = %self.endpoint, "Connection state");
        self.state.send_modify(|snapshot| snapshot.state = next);
    }
}

async fn send_frame(
    session: &mut dyn TransportSession,
    message: &OutboundMessage,
) -> Result<(), SendError> {
    let frame = message
        .to_frame()
        .map_err(|e| SendError::Encode(e.to_string()))?;
    session.send(frame).await?;
    Ok(())
}
