// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Asynchronous TLS socket.
//!
//! [`TlsSocket`] owns one transport stream and one engine session and
//! bridges the engine's synchronous "give me / take this buffer" requests
//! onto asynchronous reads and writes of the transport.
//!
//! # Phase machine
//!
//! ```text
//!      +---------------+
//!      | Uninitialized |
//!      +-------+-------+
//!   connect()  |  accept()
//!      +-------+-------+
//!      v               v
//! +----------+   +-----------+
//! |Connecting|   | Accepting |--(error/cancel/close)--+
//! +----+-----+   +-----+-----+                        |
//!      +-------+-------+                              |
//!              v                                      v
//!      +---------------+                        +-----------+
//!      |  Established  |--(error/cancel/close)->|  Closed   |
//!      +---------------+                        +-----------+
//! ```
//!
//! `Closed` is terminal. Send and receive may be outstanding at the same
//! time once `Established`, at most one of each.
//!
//! # Pull/push bridge
//!
//! Each engine request is satisfied by exactly one suspended transport
//! operation:
//!
//! - `WantWrite`: take the engine's ciphertext and write it (partial writes
//!   are continued until the chunk is on the wire), then call the engine
//!   again.
//! - `WantRead(n)`: read once (at most `n` bytes), hand the bytes to the
//!   engine, then call the engine again.
//!
//! Ciphertext is always drained while holding the write half, so output
//! produced by a receive (alerts, key updates) and by a send hits the
//! transport in the order the engine produced it. While a send is
//! outstanding it drains all engine output, and a receive never waits on
//! the write half.
//!
//! # Cancellation
//!
//! [`TlsSocket::cancel`] only sets a flag and wakes suspended transport
//! operations. Every completion point checks the flag first, so an
//! operation whose I/O finished at the same moment still reports
//! [`AdapterError::Cancelled`]. A cancelled operation closes the socket.

mod cursor;


use std::fmt;
use std::future::Future;
use std::io::{self, IoSlice, IoSliceMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::{watch, Mutex as AsyncMutex};

use crate::cert::{Fingerprint, PeerCertificate};
use crate::config::{SocketConfig, TlsVersion};
use crate::context::{ContextBase, TlsContext};
use crate::engine::{DecryptStep, HandshakeStep, Role, RustlsSession, SessionInfo, TlsSession};
use crate::error::{AdapterError, EngineError, TlsError, TlsResult};

use cursor::{total_len, BufCursor};

// ============================================================================
// Public types
// ============================================================================

/// Lifecycle phase of a [`TlsSocket`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    /// No handshake started
    #[default]
    Uninitialized,
    /// Client handshake in progress
    Connecting,
    /// Server handshake in progress
    Accepting,
    /// Handshake complete, data may flow
    Established,
    /// Terminal
    Closed,
}

impl Phase {
    /// Check if the phase is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Closed)
    }

    /// Check if a handshake is running.
    pub fn is_handshaking(&self) -> bool {
        matches!(self, Phase::Connecting | Phase::Accepting)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Uninitialized => "Uninitialized",
            Phase::Connecting => "Connecting",
            Phase::Accepting => "Accepting",
            Phase::Established => "Established",
            Phase::Closed => "Closed",
        };
        write!(f, "{}", s)
    }
}

/// How the peer's identity was checked during the handshake.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeerVerification {
    /// Peer presented no certificate (server without client auth)
    NotPresented,
    /// Peer chain verified by the engine against the trust store
    Verified {
        /// Certificates in the presented chain
        chain_len: usize,
    },
    /// Verified and the end-entity certificate matched the pinned fingerprint
    Pinned {
        /// Certificates in the presented chain
        chain_len: usize,
    },
}

/// Result of a successful handshake.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandshakeOutcome {
    /// Side this socket played
    pub role: Role,
    /// Negotiated protocol version
    pub protocol_version: Option<TlsVersion>,
    /// Negotiated cipher suite
    pub cipher_suite: Option<String>,
    /// Negotiated ALPN protocol
    pub alpn_protocol: Option<Vec<u8>>,
    /// Outcome of the peer identity check
    pub peer_verification: PeerVerification,
}

/// Result of a receive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Received {
    /// Every buffer was filled
    Filled(usize),
    /// Peer closed the session after this many bytes
    PeerClosed(usize),
}

impl Received {
    /// Bytes written into the caller's buffers.
    pub fn len(&self) -> usize {
        match self {
            Received::Filled(n) | Received::PeerClosed(n) => *n,
        }
    }

    /// Check if no bytes were received.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if the peer closed the session.
    pub fn is_peer_closed(&self) -> bool {
        matches!(self, Received::PeerClosed(_))
    }
}

// ============================================================================
// Cancellation
// ============================================================================

#[derive(Debug)]
struct Interrupt {
    cancel_requested: AtomicBool,
    wake: watch::Sender<bool>,
}

impl Interrupt {
    fn new() -> Self {
        let (wake, _) = watch::channel(false);
        Self {
            cancel_requested: AtomicBool::new(false),
            wake,
        }
    }

    fn cancel(&self) {
        self.cancel_requested.store(true, Ordering::SeqCst);
        self.wake.send_replace(true);
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_requested.load(Ordering::SeqCst)
    }

    /// Resolve once `cancel` or `close` has been signalled.
    async fn interrupted(&self) {
        let mut rx = self.wake.subscribe();
        loop {
            let set = *rx.borrow_and_update();
            if set {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Cloneable handle that cancels a socket's outstanding operations.
#[derive(Clone, Debug)]
pub struct CancelHandle(Arc<Interrupt>);

impl CancelHandle {
    /// Request cancellation (see [`TlsSocket::cancel`]).
    pub fn cancel(&self) {
        self.0.cancel();
    }

    /// Check if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.is_cancelled()
    }
}

/// Marks one direction busy for the lifetime of an operation.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> TlsResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AdapterError::OperationInProgress)?;
        Ok(Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ============================================================================
// TlsSocket
// ============================================================================

struct EngineState {
    phase: Phase,
    session: Option<Box<dyn TlsSession>>,
}

struct ReadSide<S> {
    half: Option<ReadHalf<S>>,
    scratch: Vec<u8>,
}

/// TLS socket over an asynchronous byte stream.
///
/// # Example
///
/// ```ignore
/// use std::io::{IoSlice, IoSliceMut};
/// use tlsbridge::{TlsContext, TlsSocket};
///
/// let socket = TlsSocket::new(tcp_stream, &client_ctx)?;
/// socket.connect().await?;
/// socket.send(&[IoSlice::new(b"ping")]).await?;
///
/// let mut reply = [0u8; 4];
/// socket.recv(&mut [IoSliceMut::new(&mut reply)]).await?;
/// ```
pub struct TlsSocket<S> {
    context: Option<Arc<ContextBase>>,
    config: SocketConfig,
    engine: Mutex<EngineState>,
    reader: AsyncMutex<ReadSide<S>>,
    writer: AsyncMutex<Option<WriteHalf<S>>>,
    interrupt: Arc<Interrupt>,
    send_busy: AtomicBool,
    recv_busy: AtomicBool,
}

impl<S> TlsSocket<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    /// Create a socket from a context with the default configuration.
    ///
    /// The context is frozen from here on.
    pub fn new(transport: S, context: &TlsContext) -> TlsResult<Self> {
        Self::with_config(transport, context, SocketConfig::default())
    }

    /// Create a socket from a context.
    pub fn with_config(transport: S, context: &TlsContext, config: SocketConfig) -> TlsResult<Self> {
        let base = context.share()?;
        Ok(Self::build(transport, Some(base), None, config))
    }

    /// Create a socket around an already constructed engine session.
    ///
    /// `connect` or `accept` must match the session's role.
    pub fn with_session(transport: S, session: Box<dyn TlsSession>, config: SocketConfig) -> Self {
        Self::build(transport, None, Some(session), config)
    }

    fn build(
        transport: S,
        context: Option<Arc<ContextBase>>,
        session: Option<Box<dyn TlsSession>>,
        config: SocketConfig,
    ) -> Self {
        let (read_half, write_half) = tokio::io::split(transport);
        Self {
            context,
            engine: Mutex::new(EngineState {
                phase: Phase::Uninitialized,
                session,
            }),
            reader: AsyncMutex::new(ReadSide {
                half: Some(read_half),
                scratch: vec![0u8; config.read_chunk.max(1)],
            }),
            writer: AsyncMutex::new(Some(write_half)),
            interrupt: Arc::new(Interrupt::new()),
            send_busy: AtomicBool::new(false),
            recv_busy: AtomicBool::new(false),
            config,
        }
    }

    // ------------------------------------------------------------------------
    // State queries
    // ------------------------------------------------------------------------

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.engine.lock().phase
    }

    /// Check if data may flow.
    pub fn is_established(&self) -> bool {
        self.phase() == Phase::Established
    }

    /// Check if the socket is closed.
    pub fn is_closed(&self) -> bool {
        self.phase() == Phase::Closed
    }

    /// Socket configuration.
    pub fn config(&self) -> &SocketConfig {
        &self.config
    }

    /// Handle that can cancel this socket from elsewhere.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(Arc::clone(&self.interrupt))
    }

    /// Negotiated session parameters, while the session is alive.
    pub fn session_info(&self) -> Option<SessionInfo> {
        self.engine.lock().session.as_ref().map(|s| s.info())
    }

    /// The peer's end-entity certificate, once the handshake presented one.
    pub fn peer_certificate(&self) -> TlsResult<Option<PeerCertificate>> {
        let info = self.session_info().ok_or(AdapterError::Closed)?;
        match info.peer_certificates.first() {
            Some(der) => Ok(Some(PeerCertificate::from_der(der)?)),
            None => Ok(None),
        }
    }

    // ------------------------------------------------------------------------
    // Handshake
    // ------------------------------------------------------------------------

    /// Run the client handshake.
    pub async fn connect(&self) -> TlsResult<HandshakeOutcome> {
        self.handshake(Role::Client).await
    }

    /// Run the server handshake.
    pub async fn accept(&self) -> TlsResult<HandshakeOutcome> {
        self.handshake(Role::Server).await
    }

    async fn handshake(&self, role: Role) -> TlsResult<HandshakeOutcome> {
        self.begin_handshake(role)?;
        let result = self.drive_handshake(role).await;
        self.settle(result)
    }

    /// Validate the phase, create the session and enter Connecting/Accepting.
    fn begin_handshake(&self, role: Role) -> TlsResult<()> {
        let mut guard = self.engine.lock();
        let state = &mut *guard;
        match state.phase {
            Phase::Uninitialized => {}
            Phase::Closed => return Err(AdapterError::Closed.into()),
            _ => return Err(AdapterError::HandshakeInProgress.into()),
        }

        match state.session.as_ref() {
            Some(session) if session.role() != role => {
                return Err(match role {
                    Role::Client => AdapterError::OnlyValidForClientContext,
                    Role::Server => AdapterError::OnlyValidForServerContext,
                }
                .into());
            }
            Some(_) => {}
            None => {
                let base = self.context.as_ref().ok_or(AdapterError::ContextNotInit)?;
                let session: Box<dyn TlsSession> = match role {
                    Role::Client => Box::new(RustlsSession::client(
                        base.client_config()?,
                        &self.config.server_name,
                    )?),
                    Role::Server => Box::new(RustlsSession::server(base.server_config()?)?),
                };
                state.session = Some(session);
            }
        }

        state.phase = match role {
            Role::Client => Phase::Connecting,
            Role::Server => Phase::Accepting,
        };
        log::debug!("[tls] {} handshake started", role);
        Ok(())
    }

    async fn drive_handshake(&self, role: Role) -> TlsResult<HandshakeOutcome> {
        loop {
            self.check_cancel()?;
            match self.engine_call(|s| s.step_handshake())? {
                HandshakeStep::Done => break,
                HandshakeStep::WantWrite => self.flush_once().await?,
                HandshakeStep::WantRead(max) => self.fill(max).await?,
                HandshakeStep::Failure(e) => {
                    self.flush_alert().await;
                    return Err(e.into());
                }
            }
        }

        let info = self.engine_call(|s| s.info())?;
        let peer_verification = self.verify_peer(&info)?;

        let mut state = self.engine.lock();
        if state.phase == Phase::Closed {
            return Err(AdapterError::Closed.into());
        }
        state.phase = Phase::Established;
        drop(state);

        log::debug!(
            "[tls] {} handshake complete ({:?}, {:?}, {:?})",
            role,
            info.protocol_version,
            info.cipher_suite,
            peer_verification
        );
        Ok(HandshakeOutcome {
            role,
            protocol_version: info.protocol_version,
            cipher_suite: info.cipher_suite,
            alpn_protocol: info.alpn_protocol,
            peer_verification,
        })
    }

    /// Check the negotiated peer identity against the configured pin.
    fn verify_peer(&self, info: &SessionInfo) -> TlsResult<PeerVerification> {
        let chain_len = info.peer_certificates.len();
        let leaf = info.peer_certificates.first();
        match (&self.config.expected_peer_fingerprint, leaf) {
            (Some(expected), Some(leaf)) => {
                let actual = Fingerprint::of(leaf);
                if actual == *expected {
                    Ok(PeerVerification::Pinned { chain_len })
                } else {
                    log::warn!(
                        "[tls] peer certificate {} does not match pinned {}",
                        actual,
                        expected
                    );
                    Err(AdapterError::SessionIdMismatch.into())
                }
            }
            (Some(_), None) => {
                log::warn!("[tls] pinned peer presented no certificate");
                Err(AdapterError::SessionIdMismatch.into())
            }
            (None, Some(_)) => Ok(PeerVerification::Verified { chain_len }),
            (None, None) => Ok(PeerVerification::NotPresented),
        }
    }

    // ------------------------------------------------------------------------
    // Data transfer
    // ------------------------------------------------------------------------

    /// Encrypt and send every byte of `bufs`, in order.
    ///
    /// Resolves with the total plaintext byte count once all resulting
    /// ciphertext has been written to the transport. Only one send may be
    /// outstanding.
    pub async fn send(&self, bufs: &[IoSlice<'_>]) -> TlsResult<usize> {
        self.require_established()?;
        let _busy = BusyGuard::acquire(&self.send_busy)?;
        self.settle(self.check_cancel())?;
        if total_len(bufs) == 0 {
            return Ok(0);
        }
        let result = self.drive_send(bufs).await;
        self.settle(result)
    }

    async fn drive_send(&self, bufs: &[IoSlice<'_>]) -> TlsResult<usize> {
        let mut cursor = BufCursor::new();
        loop {
            self.check_cancel()?;
            if self.engine_call(|s| s.wants_write())? {
                self.flush_once().await?;
                continue;
            }
            let Some(chunk) = cursor.remaining(bufs) else {
                break;
            };
            let accepted = self.engine_call(|s| s.encrypt(chunk))??;
            if accepted == 0 && !self.engine_call(|s| s.wants_write())? {
                return Err(EngineError::failure("engine accepted no plaintext").into());
            }
            cursor.advance(accepted);
        }

        // Output a concurrent receive queued while this send was busy.
        self.flush_all().await?;
        self.check_cancel()?;

        log::trace!("[tls] sent {} bytes", cursor.transferred());
        Ok(cursor.transferred())
    }

    /// Receive plaintext until every buffer in `bufs` is full.
    ///
    /// Resolves early with [`Received::PeerClosed`] when the peer closes the
    /// session cleanly. Only one receive may be outstanding.
    pub async fn recv(&self, bufs: &mut [IoSliceMut<'_>]) -> TlsResult<Received> {
        self.require_established()?;
        let _busy = BusyGuard::acquire(&self.recv_busy)?;
        self.settle(self.check_cancel())?;
        if total_len(bufs) == 0 {
            return Ok(Received::Filled(0));
        }
        let result = self.drive_recv(bufs).await;
        self.settle(result)
    }

    async fn drive_recv(&self, bufs: &mut [IoSliceMut<'_>]) -> TlsResult<Received> {
        let mut cursor = BufCursor::new();
        loop {
            self.check_cancel()?;
            let Some(out) = cursor.remaining_mut(bufs) else {
                log::trace!("[tls] received {} bytes", cursor.transferred());
                return Ok(Received::Filled(cursor.transferred()));
            };
            match self.engine_call(|s| s.decrypt(out))? {
                DecryptStep::Plaintext(n) => cursor.advance(n),
                DecryptStep::WantRead(max) => self.fill(max).await?,
                // An outstanding send drains engine output; keep reading so
                // neither direction waits on the other.
                DecryptStep::WantWrite if self.send_busy.load(Ordering::Acquire) => {
                    self.fill(self.config.read_chunk).await?
                }
                DecryptStep::WantWrite => self.flush_once().await?,
                DecryptStep::EndOfStream => {
                    log::debug!(
                        "[tls] peer closed session after {} bytes",
                        cursor.transferred()
                    );
                    return Ok(Received::PeerClosed(cursor.transferred()));
                }
                DecryptStep::Failure(e) => {
                    self.flush_alert().await;
                    return Err(e.into());
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // Cancel / close
    // ------------------------------------------------------------------------

    /// Request cancellation of outstanding operations.
    ///
    /// Does not abort anything synchronously: the next completion point of
    /// each outstanding operation reports [`AdapterError::Cancelled`] (even
    /// if its I/O succeeded) and the socket closes.
    pub fn cancel(&self) {
        log::debug!("[tls] cancel requested");
        self.interrupt.cancel();
    }

    /// Release the engine session and the transport.
    ///
    /// Idempotent and safe from any phase. No close notification is sent;
    /// use [`TlsSocket::shutdown`] for a graceful close.
    pub fn close(&self) {
        let session = {
            let mut state = self.engine.lock();
            if state.phase != Phase::Closed {
                log::debug!("[tls] {} -> Closed", state.phase);
                state.phase = Phase::Closed;
            }
            state.session.take()
        };
        drop(session);

        // Wake operations suspended on the transport.
        self.interrupt.wake.send_replace(true);

        // Halves held by an in-flight operation are released on a later
        // close or when the socket drops.
        if let Ok(mut reader) = self.reader.try_lock() {
            reader.half.take();
        }
        if let Ok(mut writer) = self.writer.try_lock() {
            writer.take();
        }
    }

    /// Send a close notification, flush it, shut the transport down and
    /// close the socket.
    pub async fn shutdown(&self) -> TlsResult<()> {
        let queued = {
            let mut guard = self.engine.lock();
            let state = &mut *guard;
            match (state.phase, state.session.as_mut()) {
                (Phase::Established, Some(session)) => {
                    session.close();
                    true
                }
                _ => false,
            }
        };

        let result = if queued {
            self.flush_all().await
        } else {
            Ok(())
        };

        {
            let mut writer = self.writer.lock().await;
            if let Some(half) = writer.as_mut() {
                if let Err(e) = half.shutdown().await {
                    log::trace!("[tls] transport shutdown failed: {}", e);
                }
            }
        }

        self.close();
        result
    }

    // ------------------------------------------------------------------------
    // Bridge internals
    // ------------------------------------------------------------------------

    fn require_established(&self) -> TlsResult<()> {
        match self.engine.lock().phase {
            Phase::Established => Ok(()),
            Phase::Closed => Err(AdapterError::Closed.into()),
            _ => Err(AdapterError::NotEstablished.into()),
        }
    }

    fn check_cancel(&self) -> TlsResult<()> {
        if self.interrupt.is_cancelled() {
            return Err(AdapterError::Cancelled.into());
        }
        Ok(())
    }

    /// Run `f` against the live session.
    fn engine_call<T>(&self, f: impl FnOnce(&mut dyn TlsSession) -> T) -> TlsResult<T> {
        let mut guard = self.engine.lock();
        let state = &mut *guard;
        if state.phase == Phase::Closed {
            return Err(AdapterError::Closed.into());
        }
        match state.session.as_mut() {
            Some(session) => Ok(f(session.as_mut())),
            None => Err(AdapterError::Closed.into()),
        }
    }

    /// Await one transport operation, giving cancellation the last word.
    async fn io<T>(&self, op: impl Future<Output = io::Result<T>>) -> TlsResult<T> {
        let result = tokio::select! {
            biased;
            _ = self.interrupt.interrupted() => None,
            r = op => Some(r),
        };
        self.check_cancel()?;
        match result {
            Some(r) => Ok(r?),
            None => Err(AdapterError::Closed.into()),
        }
    }

    /// One transport read of at most `max` bytes, staged into the engine.
    async fn fill(&self, max: usize) -> TlsResult<()> {
        let mut guard = self.reader.lock().await;
        let side = &mut *guard;
        let half = side.half.as_mut().ok_or(AdapterError::Closed)?;
        let limit = max.min(side.scratch.len()).max(1);

        let n = self.io(half.read(&mut side.scratch[..limit])).await?;
        log::trace!("[tls] transport read {} bytes", n);

        let bytes = &side.scratch[..n];
        self.engine_call(|s| {
            if bytes.is_empty() {
                s.supply_eof();
            } else {
                s.supply_input(bytes);
            }
        })
    }

    /// Drain one chunk of ciphertext and write all of it.
    ///
    /// Returns `false` if the engine had nothing to send.
    async fn write_chunk(&self, half: &mut WriteHalf<S>) -> TlsResult<bool> {
        let max = self.config.write_chunk.max(1);
        let chunk = self.engine_call(|s| s.take_output(max))?;
        if chunk.is_empty() {
            return Ok(false);
        }
        let mut written = 0;
        while written < chunk.len() {
            let n = self.io(half.write(&chunk[written..])).await?;
            if n == 0 {
                return Err(io::Error::new(io::ErrorKind::WriteZero, "transport wrote 0 bytes").into());
            }
            written += n;
        }
        self.io(half.flush()).await?;
        log::trace!("[tls] transport wrote {} bytes", written);
        Ok(true)
    }

    /// Satisfy one `WantWrite` request.
    async fn flush_once(&self) -> TlsResult<()> {
        let mut guard = self.writer.lock().await;
        let half = guard.as_mut().ok_or(AdapterError::Closed)?;
        self.write_chunk(half).await?;
        Ok(())
    }

    /// Write everything the engine has produced.
    async fn flush_all(&self) -> TlsResult<()> {
        let mut guard = self.writer.lock().await;
        let half = guard.as_mut().ok_or(AdapterError::Closed)?;
        while self.write_chunk(half).await? {}
        Ok(())
    }

    /// Best effort: send the alert the engine queued for a failure.
    async fn flush_alert(&self) {
        let pending = self.engine_call(|s| s.wants_write()).unwrap_or(false);
        if pending {
            if let Err(e) = self.flush_all().await {
                log::trace!("[tls] could not deliver alert: {}", e);
            }
        }
    }

    /// Close the socket if an operation failed.
    fn settle<T>(&self, result: TlsResult<T>) -> TlsResult<T> {
        if let Err(e) = &result {
            match e {
                TlsError::Adapter(AdapterError::Cancelled) => {
                    log::debug!("[tls] operation cancelled")
                }
                _ => log::warn!("[tls] operation failed: {}", e),
            }
            self.close();
        }
        result
    }
}

impl<S> fmt::Debug for TlsSocket<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsSocket")
            .field("phase", &self.engine.lock().phase)
            .field("server_name", &self.config.server_name)
            .field("cancel_requested", &self.interrupt.is_cancelled())
            .finish()
    }
}
