// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # tlsbridge - Asynchronous TLS over any byte stream
//!
//! Drives a synchronous TLS engine (rustls) over an asynchronous transport
//! (any tokio `AsyncRead + AsyncWrite` stream) without busy-waiting and
//! without issuing more than one transport operation per engine request.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::io::{IoSlice, IoSliceMut};
//! use tlsbridge::{ContextMode, TlsContext, TlsResult, TlsSocket};
//!
//! async fn ping(stream: tokio::net::TcpStream, ca_pem: &[u8]) -> TlsResult<()> {
//!     let mut ctx = TlsContext::new();
//!     ctx.init(ContextMode::Client)?;
//!     ctx.load_cert(ca_pem)?;
//!
//!     let socket = TlsSocket::new(stream, &ctx)?;
//!     socket.connect().await?;
//!     socket.send(&[IoSlice::new(b"ping")]).await?;
//!
//!     let mut reply = [0u8; 4];
//!     socket.recv(&mut [IoSliceMut::new(&mut reply)]).await?;
//!     socket.shutdown().await
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |  TlsContext (roles, trust anchors, identity)  -- shared, read-only   |
//! +---------------------------------------------------------------------+
//! |  TlsSocket: phase machine + pull/push bridge + cancellation          |
//! +----------------------------------+----------------------------------+
//! |  TlsSession (engine boundary)    |  tokio AsyncRead/AsyncWrite      |
//! |  RustlsSession                   |  TcpStream, DuplexStream, ...    |
//! +----------------------------------+----------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`TlsContext`] | Credentials and role, frozen once a socket uses it |
//! | [`TlsSocket`] | One TLS session over one transport stream |
//! | [`TlsSession`] | Engine boundary, implemented by [`RustlsSession`] |
//! | [`ConnectionTable`] | Handle-addressed set of live sockets |
//! | [`TlsError`] | Engine, adapter and I/O errors |

/// Peer certificate inspection and fingerprints.
pub mod cert;
/// Socket configuration and protocol constants.
pub mod config;
/// Credential context (roles, trust anchors, identity, DH parameters).
pub mod context;
/// TLS engine boundary and the rustls binding.
pub mod engine;
/// Error domains, codes and the category registry.
pub mod error;
/// Asynchronous TLS socket.
pub mod socket;
/// Connection table.
pub mod table;

pub use cert::{Fingerprint, PeerCertificate};
pub use config::{SocketConfig, SocketConfigBuilder, TlsVersion};
pub use context::{read_file, ContextMode, ContextState, TlsContext};
pub use engine::{DecryptStep, HandshakeStep, Role, RustlsSession, SessionInfo, TlsSession};
pub use error::{
    category, AdapterError, EngineError, ErrorCategory, ErrorCode, ErrorDomain, TlsError,
    TlsResult,
};
pub use socket::{
    CancelHandle, HandshakeOutcome, Phase, PeerVerification, Received, TlsSocket,
};
pub use table::{ConnectionTable, SocketHandle};
