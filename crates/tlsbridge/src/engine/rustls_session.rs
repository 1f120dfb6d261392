// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! [`TlsSession`] backed by a rustls connection.

use std::fmt;
use std::io::{self, Read, Write};
use std::sync::Arc;

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, Connection, ServerConfig};

use super::{DecryptStep, HandshakeStep, Role, SessionInfo, TlsSession};
use crate::config::{TlsVersion, MAX_TLS_RECORD_SIZE};
use crate::error::EngineError;

/// Writer that accepts at most `max` bytes in total.
struct Capped<'a> {
    out: &'a mut Vec<u8>,
    max: usize,
}

impl Write for Capped<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let room = self.max.saturating_sub(self.out.len());
        let n = room.min(buf.len());
        self.out.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// rustls client or server connection driven as a [`TlsSession`].
///
/// Ciphertext from the transport is staged in `inbound` and fed to rustls
/// only while it asks for more, so bytes arriving together with the last
/// handshake flight are kept for the first `decrypt`.
pub struct RustlsSession {
    conn: Connection,
    role: Role,
    inbound: Vec<u8>,
    eof: bool,
    eof_delivered: bool,
    read_hint: usize,
}

impl RustlsSession {
    /// Client session verifying the server as `server_name`.
    pub fn client(config: Arc<ClientConfig>, server_name: &str) -> Result<Self, EngineError> {
        let name = ServerName::try_from(server_name.to_string()).map_err(|e| {
            EngineError::failure(format!("invalid server name '{}': {}", server_name, e))
        })?;
        let conn = rustls::ClientConnection::new(config, name)?;
        Ok(Self::new(conn.into(), Role::Client))
    }

    /// Server session.
    pub fn server(config: Arc<ServerConfig>) -> Result<Self, EngineError> {
        let conn = rustls::ServerConnection::new(config)?;
        Ok(Self::new(conn.into(), Role::Server))
    }

    fn new(conn: Connection, role: Role) -> Self {
        Self {
            conn,
            role,
            inbound: Vec::new(),
            eof: false,
            eof_delivered: false,
            read_hint: MAX_TLS_RECORD_SIZE,
        }
    }

    /// Feed staged ciphertext to rustls while it wants more.
    ///
    /// Returns `Ok(true)` if anything was consumed.
    fn pump(&mut self) -> Result<bool, EngineError> {
        let mut progressed = false;

        while self.conn.wants_read() && !self.inbound.is_empty() {
            let mut rd: &[u8] = &self.inbound;
            let n = self
                .conn
                .read_tls(&mut rd)
                .map_err(|e| EngineError::failure(format!("read_tls: {}", e)))?;
            if n == 0 {
                break;
            }
            self.inbound.drain(..n);
            progressed = true;
            self.conn.process_new_packets()?;
        }

        if self.eof && !self.eof_delivered && self.inbound.is_empty() {
            // A zero-length read tells rustls the transport hit EOF.
            let mut empty: &[u8] = &[];
            self.conn
                .read_tls(&mut empty)
                .map_err(|e| EngineError::failure(format!("read_tls: {}", e)))?;
            self.eof_delivered = true;
            progressed = true;
            self.conn.process_new_packets()?;
        }

        Ok(progressed)
    }
}

impl TlsSession for RustlsSession {
    fn role(&self) -> Role {
        self.role
    }

    fn step_handshake(&mut self) -> HandshakeStep {
        // Flush before reading: rustls refuses input while a flight is pending.
        if self.conn.wants_write() {
            return HandshakeStep::WantWrite;
        }
        if !self.conn.is_handshaking() {
            return HandshakeStep::Done;
        }

        if let Err(e) = self.pump() {
            return HandshakeStep::Failure(e);
        }

        if self.conn.wants_write() {
            return HandshakeStep::WantWrite;
        }
        if !self.conn.is_handshaking() {
            return HandshakeStep::Done;
        }
        if self.eof_delivered {
            return HandshakeStep::Failure(EngineError::failure(
                "peer closed the connection during the handshake",
            ));
        }
        HandshakeStep::WantRead(self.read_hint)
    }

    fn encrypt(&mut self, plaintext: &[u8]) -> Result<usize, EngineError> {
        self.conn
            .writer()
            .write(plaintext)
            .map_err(|e| EngineError::failure(format!("encrypt: {}", e)))
    }

    fn decrypt(&mut self, out: &mut [u8]) -> DecryptStep {
        if out.is_empty() {
            return DecryptStep::Plaintext(0);
        }
        loop {
            match self.conn.reader().read(out) {
                // rustls reports a received close_notify as a zero-length read
                Ok(0) => return DecryptStep::EndOfStream,
                Ok(n) => return DecryptStep::Plaintext(n),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    return DecryptStep::Failure(EngineError::failure(
                        "peer closed the connection without close_notify",
                    ));
                }
                Err(e) => {
                    return DecryptStep::Failure(EngineError::failure(format!("decrypt: {}", e)))
                }
            }

            match self.pump() {
                Ok(true) => continue,
                Ok(false) => {}
                Err(e) => return DecryptStep::Failure(e),
            }

            if self.conn.wants_write() {
                return DecryptStep::WantWrite;
            }
            return DecryptStep::WantRead(self.read_hint);
        }
    }

    fn supply_input(&mut self, ciphertext: &[u8]) {
        self.inbound.extend_from_slice(ciphertext);
    }

    fn supply_eof(&mut self) {
        self.eof = true;
    }

    fn wants_write(&self) -> bool {
        self.conn.wants_write()
    }

    fn take_output(&mut self, max: usize) -> Vec<u8> {
        let mut out = Vec::new();
        let mut capped = Capped { out: &mut out, max };
        // Writing into memory cannot fail; stop once rustls has nothing left.
        while let Ok(n) = self.conn.write_tls(&mut capped) {
            if n == 0 {
                break;
            }
        }
        out
    }

    fn close(&mut self) {
        self.conn.send_close_notify();
    }

    fn info(&self) -> SessionInfo {
        SessionInfo {
            protocol_version: self
                .conn
                .protocol_version()
                .and_then(TlsVersion::from_rustls),
            cipher_suite: self
                .conn
                .negotiated_cipher_suite()
                .map(|s| format!("{:?}", s.suite())),
            alpn_protocol: self.conn.alpn_protocol().map(<[u8]>::to_vec),
            peer_certificates: self
                .conn
                .peer_certificates()
                .map(|chain| chain.iter().map(|c| c.as_ref().to_vec()).collect())
                .unwrap_or_default(),
        }
    }
}

impl fmt::Debug for RustlsSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RustlsSession")
            .field("role", &self.role)
            .field("handshaking", &self.conn.is_handshaking())
            .field("staged_input", &self.inbound.len())
            .field("eof", &self.eof)
            .finish()
    }
}
