// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! TLS engine boundary.
//!
//! The adapter never performs cryptography. It drives a [`TlsSession`], a
//! synchronous, non-reentrant state machine that never touches the network
//! itself. Ciphertext moves in and out through two accessors:
//!
//! - [`TlsSession::supply_input`]: "here is ciphertext, consume it"
//! - [`TlsSession::take_output`]: "drain ciphertext I produced"
//!
//! Every driving call ([`step_handshake`](TlsSession::step_handshake),
//! [`encrypt`](TlsSession::encrypt), [`decrypt`](TlsSession::decrypt))
//! reports what it needs next. The adapter satisfies a `WantRead` or
//! `WantWrite` with exactly one transport operation and then repeats the
//! same call; all protocol state stays inside the session, so resuming is
//! always "call again".
//!
//! ```text
//!   TlsSocket                      TlsSession
//!   ---------                      ----------
//!   step_handshake() ------------> WantWrite
//!   take_output() <--------------- ciphertext
//!   transport.write(ciphertext)
//!   step_handshake() ------------> WantRead(n)
//!   transport.read(n)
//!   supply_input(bytes) ---------> (staged)
//!   step_handshake() ------------> Done
//! ```

mod rustls_session;

pub use rustls_session::RustlsSession;

use crate::config::TlsVersion;
use crate::error::EngineError;

/// Which side of the handshake a session plays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// Sends the ClientHello
    Client,
    /// Answers the ClientHello
    Server,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Client => write!(f, "client"),
            Role::Server => write!(f, "server"),
        }
    }
}

/// Result of one handshake step.
#[derive(Debug)]
pub enum HandshakeStep {
    /// Handshake finished and no ciphertext is pending
    Done,
    /// Engine needs up to `n` more ciphertext bytes
    WantRead(usize),
    /// Engine produced ciphertext; drain it with `take_output`
    WantWrite,
    /// Handshake failed
    Failure(EngineError),
}

/// Result of one decrypt call.
#[derive(Debug)]
pub enum DecryptStep {
    /// `n` plaintext bytes were written to the output buffer
    Plaintext(usize),
    /// Engine needs up to `n` more ciphertext bytes
    WantRead(usize),
    /// Engine produced ciphertext (alerts, key updates) that must be sent
    /// before more input is useful
    WantWrite,
    /// Peer closed the session cleanly
    EndOfStream,
    /// Record layer failure
    Failure(EngineError),
}

/// What the engine negotiated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionInfo {
    /// Negotiated protocol version
    pub protocol_version: Option<TlsVersion>,
    /// Negotiated cipher suite name
    pub cipher_suite: Option<String>,
    /// Negotiated ALPN protocol
    pub alpn_protocol: Option<Vec<u8>>,
    /// Peer certificate chain (DER), end-entity first
    pub peer_certificates: Vec<Vec<u8>>,
}

/// A per-connection TLS engine session.
pub trait TlsSession: Send {
    /// Role this session was created for.
    fn role(&self) -> Role;

    /// Advance the handshake as far as buffered input allows.
    fn step_handshake(&mut self) -> HandshakeStep;

    /// Hand plaintext to the engine.
    ///
    /// Returns how many bytes were accepted. `Ok(0)` for a non-empty chunk
    /// means pending ciphertext must be drained first.
    fn encrypt(&mut self, plaintext: &[u8]) -> Result<usize, EngineError>;

    /// Produce plaintext into `out` from buffered input.
    fn decrypt(&mut self, out: &mut [u8]) -> DecryptStep;

    /// Stage ciphertext received from the transport.
    fn supply_input(&mut self, ciphertext: &[u8]);

    /// Signal that the transport reached end of file.
    fn supply_eof(&mut self);

    /// Check if ciphertext is waiting to be drained.
    fn wants_write(&self) -> bool;

    /// Drain up to `max` bytes of produced ciphertext.
    fn take_output(&mut self, max: usize) -> Vec<u8>;

    /// Queue a close notification for the peer.
    fn close(&mut self);

    /// Negotiated parameters (meaningful after the handshake).
    fn info(&self) -> SessionInfo;
}
