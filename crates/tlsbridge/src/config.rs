// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-socket configuration.

use crate::cert::Fingerprint;

/// Largest TLS record on the wire: 2^14 plaintext bytes, 2048 bytes of
/// expansion, 5 bytes of header.
pub const MAX_TLS_RECORD_SIZE: usize = 16 * 1024 + 2048 + 5;

/// Default upper bound on the ciphertext handed to one transport write.
pub const DEFAULT_WRITE_CHUNK: usize = 64 * 1024;

/// Default server name used for SNI and certificate name checks.
pub const DEFAULT_SERVER_NAME: &str = "localhost";

/// TLS protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum TlsVersion {
    /// TLS 1.2
    #[default]
    Tls12,
    /// TLS 1.3
    Tls13,
}

impl TlsVersion {
    pub(crate) fn from_rustls(v: rustls::ProtocolVersion) -> Option<Self> {
        match v {
            rustls::ProtocolVersion::TLSv1_2 => Some(TlsVersion::Tls12),
            rustls::ProtocolVersion::TLSv1_3 => Some(TlsVersion::Tls13),
            _ => None,
        }
    }
}

/// Socket configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketConfig {
    /// Name the client expects in the server certificate (also sent as SNI).
    pub server_name: String,

    /// Maximum bytes requested from the transport per read (default: one
    /// full TLS record).
    pub read_chunk: usize,

    /// Maximum ciphertext bytes handed to the transport per write
    /// (default: 64KB).
    pub write_chunk: usize,

    /// SHA-256 of the peer's end-entity certificate the handshake must
    /// negotiate. A mismatch fails the handshake with `SessionIdMismatch`.
    pub expected_peer_fingerprint: Option<Fingerprint>,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            server_name: DEFAULT_SERVER_NAME.to_string(),
            read_chunk: MAX_TLS_RECORD_SIZE,
            write_chunk: DEFAULT_WRITE_CHUNK,
            expected_peer_fingerprint: None,
        }
    }
}

impl SocketConfig {
    /// Create a new configuration builder.
    pub fn builder() -> SocketConfigBuilder {
        SocketConfigBuilder::default()
    }
}

/// Builder for [`SocketConfig`].
#[derive(Debug, Default)]
pub struct SocketConfigBuilder {
    config: SocketConfig,
}

impl SocketConfigBuilder {
    /// Set the expected server name.
    pub fn server_name(mut self, name: impl Into<String>) -> Self {
        self.config.server_name = name.into();
        self
    }

    /// Set the per-read size. Values below 1 are raised to 1.
    pub fn read_chunk(mut self, size: usize) -> Self {
        self.config.read_chunk = size.max(1);
        self
    }

    /// Set the per-write size. Values below 1 are raised to 1.
    pub fn write_chunk(mut self, size: usize) -> Self {
        self.config.write_chunk = size.max(1);
        self
    }

    /// Pin the peer certificate.
    pub fn expect_peer_fingerprint(mut self, fingerprint: Fingerprint) -> Self {
        self.config.expected_peer_fingerprint = Some(fingerprint);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> SocketConfig {
        self.config
    }
}
