//! # Client Connection Management
//!
//! This module owns the single connection between the client and a game
//! server.
//!
//! # Architecture
//!
//! After the init handshake the framed stream is split and two Tokio tasks
//! take over:
//! - the receiver loop owns the read half, answers keep-alives and hands
//!   every other frame to the [`HandlerRegistry`]
//! - the writer loop drains the [`PacketQueue`], stamps each frame with the
//!   next sequence value and writes it
//!
//! Both stop on a shared `CancellationToken`, so a disconnect unblocks the
//! pending read immediately.
//!
//! # Lifecycle
//!
//! ```text
//! Disconnected → Connecting → Connected → Initialized
//!      ↑              │            │            │
//!      └──────────────┴────────────┴────────────┘
//!              (refused, handshake failure, connection lost)
//! ```
//!
//! # Failure Handling
//!
//! Any read or write failure, EOF, fatal decode error or sequence desync
//! puts the client back to `Disconnected`, clears the queue, resets the
//! sequence state, disarms obfuscation and broadcasts
//! [`ConnectionEvent::ConnectionLost`].
//!
//! # Keep-alive Framing
//!
//! `Connection_Player` is read as `{SHORT echo}{SHORT s1}{BYTE s2}`, where
//! the echo is the sequence value the server expects next. This differs
//! from the stock server, which sends only `{SHORT s1}{BYTE s2}`; against
//! it the first keep-alive fails with `TruncatedFrame`.

use eoclient_core::{EoError, PlayerId, Result};
use eoclient_protocol::{
    build_connection_accept, build_init_request, build_ping_reply, init::generate_challenge, FamilyActionKey,
    InitData, InitResponse, PacketEncoder, PacketFrame, SequenceService,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;

use crate::config::NetworkConfig;
use crate::handlers::HandlerRegistry;
use crate::queue::PacketQueue;
use crate::transport::{connect_tcp, FrameCodec, SharedEncoder};

/// Capacity of the connection event channel
const EVENT_CAPACITY: usize = 64;

/// State of the client connection
///
/// # Purpose
/// Tracks where the connection is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No socket. Initial and terminal state.
    #[default]
    Disconnected,

    /// TCP connect in progress
    Connecting,

    /// Socket open, init handshake in progress
    Connected,

    /// Handshake complete; sequence and obfuscation armed, frames may be sent
    Initialized,
}

impl ConnectionState {
    /// Whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Disconnected, Connecting)
                | (Connecting, Connected)
                | (Connected, Initialized)
                | (Connecting | Connected | Initialized, Disconnected)
        )
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Connected => "Connected",
            ConnectionState::Initialized => "Initialized",
        };
        f.write_str(name)
    }
}

/// Notifications broadcast to [`Client::subscribe`] receivers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The connection entered a new state
    StateChanged(ConnectionState),

    /// An established connection failed; carries the reason
    ConnectionLost(String),
}

/// Connection state shared between the client handle and its tasks
struct Shared {
    state: Mutex<ConnectionState>,
    queue: PacketQueue,
    sequence: SequenceService,
    encoder: SharedEncoder,
    handlers: Arc<HandlerRegistry>,
    events: broadcast::Sender<ConnectionEvent>,
    init: Mutex<Option<InitData>>,
    cancel: Mutex<Option<CancellationToken>>,
}

impl Shared {
    fn transition(&self, next: ConnectionState) -> Result<()> {
        {
            let mut state = self.state.lock();
            if !state.can_transition_to(next) {
                return Err(EoError::InvalidState(format!("cannot move from {} to {}", *state, next)));
            }
            *state = next;
        }
        tracing::info!("Connection state: {}", next);
        let _ = self.events.send(ConnectionEvent::StateChanged(next));
        Ok(())
    }

    /// Drop everything tied to the current session
    ///
    /// Returns `false` when the client was already disconnected.
    fn teardown(&self) -> bool {
        if let Some(token) = self.cancel.lock().take() {
            token.cancel();
        }
        if self.transition(ConnectionState::Disconnected).is_err() {
            return false;
        }
        self.queue.clear();
        self.sequence.reset();
        *self.encoder.write() = None;
        *self.init.lock() = None;
        true
    }

    /// Tear down after an established connection failed
    fn fail(&self, reason: String) {
        if self.teardown() {
            tracing::error!("Connection lost: {}", reason);
            let _ = self.events.send(ConnectionEvent::ConnectionLost(reason));
        }
    }

    /// Queue a frame for the current session
    ///
    /// The state lock is held across the check and the enqueue, so a
    /// concurrent teardown either rejects the frame or clears it.
    fn enqueue_if_initialized(&self, frame: PacketFrame) -> Result<()> {
        let state = self.state.lock();
        if *state != ConnectionState::Initialized {
            return Err(EoError::NotInitialized);
        }
        self.queue.enqueue(frame);
        Ok(())
    }

    /// Prepend the next outgoing sequence value once the sequence is seeded
    fn stamp(&self, frame: &mut PacketFrame) -> Result<()> {
        if let Some(sequence) = self.sequence.compute_sequence() {
            frame.prepend_sequence(sequence)?;
        }
        Ok(())
    }

    /// Process one received frame
    fn handle_frame(&self, frame: &mut PacketFrame) -> Result<()> {
        if frame.key() == FamilyActionKey::CONNECTION_PLAYER {
            return self.handle_keep_alive(frame);
        }
        self.handlers.dispatch(frame).map(|_| ())
    }

    /// `Connection_Player`: `{SHORT echo}{SHORT s1}{BYTE s2}`
    ///
    /// The echo must match the expected incoming sequence value; the new
    /// seeds then replace both sequence states and the server gets a ping
    /// reply.
    fn handle_keep_alive(&self, frame: &mut PacketFrame) -> Result<()> {
        let echo = frame.get_short()?;
        let s1 = frame.get_short()?;
        let s2 = frame.get_byte()?;

        self.sequence.check_sequence(echo)?;
        self.sequence
            .reseed(s1, s2)
            .map_err(|e| EoError::Protocol(e.to_string()))?;
        self.queue.enqueue(build_ping_reply());
        Ok(())
    }
}

/// Handle to the client connection
///
/// # Purpose
/// Dials the server, runs the handshake and manages the receiver and
/// writer tasks. Cheap to share behind an `Arc`.
///
/// # Example
///
/// ```no_run
/// use eoclient_network::{Client, HandlerRegistry, NetworkConfig};
/// use std::sync::Arc;
///
/// # async fn example() -> eoclient_core::Result<()> {
/// let client = Client::new(NetworkConfig::default(), Arc::new(HandlerRegistry::new()));
/// client.connect().await?;
/// client.open_locker(10, 12)?;
/// # Ok(())
/// # }
/// ```
pub struct Client {
    config: NetworkConfig,
    shared: Arc<Shared>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Client {
    pub fn new(config: NetworkConfig, handlers: Arc<HandlerRegistry>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            config,
            shared: Arc::new(Shared {
                state: Mutex::new(ConnectionState::Disconnected),
                queue: PacketQueue::new(),
                sequence: SequenceService::new(),
                encoder: Arc::new(RwLock::new(None)),
                handlers,
                events,
                init: Mutex::new(None),
                cancel: Mutex::new(None),
            }),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        *self.shared.state.lock()
    }

    pub fn is_initialized(&self) -> bool {
        self.state() == ConnectionState::Initialized
    }

    pub fn handlers(&self) -> &Arc<HandlerRegistry> {
        &self.shared.handlers
    }

    /// Receive state changes and connection loss notifications
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.shared.events.subscribe()
    }

    /// Handshake parameters of the current session
    pub fn init_data(&self) -> Option<InitData> {
        *self.shared.init.lock()
    }

    /// Player id assigned by the server during the handshake
    pub fn player_id(&self) -> Option<PlayerId> {
        self.init_data().map(|init| init.player_id)
    }

    /// Number of frames waiting for the writer
    pub fn queued(&self) -> usize {
        self.shared.queue.len()
    }

    /// Queue a frame for sending
    ///
    /// # Errors
    /// - `NotInitialized` unless the handshake has completed
    pub fn send(&self, frame: PacketFrame) -> Result<()> {
        self.shared.enqueue_if_initialized(frame)
    }

    /// Dial the configured server and run the handshake
    ///
    /// # Errors
    /// - `InvalidState` if not `Disconnected`
    /// - `Network` if the TCP connect fails or times out
    /// - `Handshake` if the server refuses or answers incorrectly
    pub async fn connect(&self) -> Result<()> {
        self.config.validate()?;
        self.shared.transition(ConnectionState::Connecting)?;

        let stream = match connect_tcp(&self.config).await {
            Ok(stream) => stream,
            Err(e) => {
                self.shared.teardown();
                return Err(e);
            }
        };

        self.start(stream).await
    }

    /// Run the handshake over an already open stream
    ///
    /// Accepts anything byte-oriented; tests use `tokio::io::duplex`.
    pub async fn connect_with_stream<S>(&self, stream: S) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        self.shared.transition(ConnectionState::Connecting)?;
        self.start(stream).await
    }

    async fn start<S>(&self, stream: S) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        if let Err(e) = self.shared.transition(ConnectionState::Connected) {
            self.shared.teardown();
            return Err(e);
        }

        let mut framed = Framed::new(stream, FrameCodec::new(Arc::clone(&self.shared.encoder)));
        let init = match self.handshake(&mut framed).await {
            Ok(init) => init,
            Err(e) => {
                tracing::error!("Handshake failed: {}", e);
                self.shared.teardown();
                return Err(e);
            }
        };

        *self.shared.init.lock() = Some(init);
        let token = CancellationToken::new();
        *self.shared.cancel.lock() = Some(token.clone());

        if let Err(e) = self.shared.transition(ConnectionState::Initialized) {
            self.shared.teardown();
            return Err(e);
        }

        let (sink, stream) = framed.split();
        let receiver = tokio::spawn(receive_loop(Arc::clone(&self.shared), stream, token.clone()));
        let writer = tokio::spawn(write_loop(Arc::clone(&self.shared), sink, token));

        let finished = {
            let mut tasks = self.tasks.lock();
            let finished: Vec<_> = tasks.drain(..).collect();
            tasks.push(receiver);
            tasks.push(writer);
            finished
        };
        for task in finished {
            task.abort();
        }

        tracing::info!("Session initialized as player {}", init.player_id.get());
        Ok(())
    }

    /// Init handshake
    ///
    /// ```text
    /// client: Init_Init {challenge, version, hdid}
    /// server: Init_Init {Ok, seeds, multiples, player id, response}
    /// client: Connection_Accept {multiples, player id}   (sequenced, scrambled)
    /// ```
    async fn handshake<S>(&self, framed: &mut Framed<S, FrameCodec>) -> Result<InitData>
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let challenge = generate_challenge();
        framed
            .send(build_init_request(challenge, self.config.version, &self.config.hdid)?)
            .await?;

        let mut reply = match tokio::time::timeout(self.config.connect_timeout, framed.next()).await {
            Ok(Some(frame)) => frame?,
            Ok(None) => return Err(EoError::ConnectionLost("server closed the connection during handshake".into())),
            Err(_) => {
                return Err(EoError::Handshake(format!(
                    "no init reply within {:?}",
                    self.config.connect_timeout
                )))
            }
        };

        let init = InitResponse::parse(&mut reply)?.into_init_data(challenge)?;
        tracing::debug!(
            "Init accepted: player={} multiples=({}, {})",
            init.player_id.get(),
            init.decode_multiple,
            init.encode_multiple
        );

        self.shared.sequence.initialize(init.seq1, init.seq2)?;
        *self.shared.encoder.write() = Some(PacketEncoder::new(init.decode_multiple, init.encode_multiple));

        let mut accept = build_connection_accept(&init)?;
        self.shared.stamp(&mut accept)?;
        framed.send(accept).await?;
        Ok(init)
    }

    /// Close the connection
    ///
    /// Stops both tasks and clears session state. Does nothing when already
    /// disconnected.
    pub async fn disconnect(&self) {
        if self.shared.teardown() {
            tracing::info!("Disconnected");
        }

        let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            if let Err(e) = task.await {
                tracing::warn!("Connection task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        if let Some(token) = self.shared.cancel.lock().take() {
            token.cancel();
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("address", &self.config.address())
            .field("state", &self.state())
            .finish()
    }
}

/// Receiver task: exclusive owner of the read half
async fn receive_loop<S>(shared: Arc<Shared>, mut stream: SplitStream<Framed<S, FrameCodec>>, token: CancellationToken)
where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    loop {
        let next = tokio::select! {
            _ = token.cancelled() => break,
            next = stream.next() => next,
        };

        let reason = match next {
            None => "server closed the connection".to_string(),
            Some(Err(e)) => e.to_string(),
            Some(Ok(mut frame)) => match shared.handle_frame(&mut frame) {
                Ok(()) => continue,
                Err(e) if e.is_connection_fatal() => format!("{} while handling {}", e, frame.key()),
                Err(e) => {
                    tracing::warn!("Handler for {} failed: {}", frame.key(), e);
                    continue;
                }
            },
        };

        shared.fail(reason);
        break;
    }
    tracing::debug!("Receiver stopped");
}

/// Writer task: drains the queue onto the write half
async fn write_loop<S>(
    shared: Arc<Shared>,
    mut sink: SplitSink<Framed<S, FrameCodec>, PacketFrame>,
    token: CancellationToken,
) where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    'outer: loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = shared.queue.wait() => {}
        }

        for mut frame in shared.queue.dequeue_all() {
            if token.is_cancelled() {
                break 'outer;
            }

            let key = frame.key();
            if let Err(e) = shared.stamp(&mut frame) {
                tracing::warn!("Dropping {}: {}", key, e);
                continue;
            }

            match sink.send(frame).await {
                Ok(()) => {}
                Err(EoError::EncodingOverflow { value, .. }) => {
                    tracing::warn!("Dropping {}: body of {} bytes is too large", key, value);
                }
                Err(e) => {
                    shared.fail(format!("write failed: {}", e));
                    break 'outer;
                }
            }
        }
    }
    tracing::debug!("Writer stopped");
}
