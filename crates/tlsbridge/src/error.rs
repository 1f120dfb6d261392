// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for the TLS adapter.
//!
//! Errors fall into two domains:
//!
//! - **Engine**: failures reported by the TLS engine (rustls). The numeric
//!   code is opaque to the adapter; `0` means success and `1` is the generic
//!   failure every engine error maps to. The engine's own error value is kept
//!   alongside so callers can inspect it.
//! - **Adapter**: misuse and policy failures raised by the adapter itself
//!   (context lifecycle, handshake identity check, cancellation).
//!
//! Each domain has a read-only [`ErrorCategory`] in a process-wide registry,
//! looked up with [`category`].

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::OnceLock;

/// Result type for adapter operations.
pub type TlsResult<T> = Result<T, TlsError>;

// ============================================================================
// Error domains and the category registry
// ============================================================================

/// Tag identifying which domain an error code belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorDomain {
    /// Codes forwarded from the TLS engine
    Engine,
    /// Codes raised by the adapter
    Adapter,
}

/// Static description of an error domain.
#[derive(Debug)]
pub struct ErrorCategory {
    name: &'static str,
    describe: fn(i32) -> String,
}

impl ErrorCategory {
    /// Category name, stable across releases.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Human readable message for a code in this category.
    pub fn message(&self, code: i32) -> String {
        (self.describe)(code)
    }
}

fn describe_engine(code: i32) -> String {
    match code {
        EngineError::SUCCESS => "Success".to_string(),
        EngineError::FAILURE => "Failure".to_string(),
        other => format!("engine error {}", other),
    }
}

fn describe_adapter(code: i32) -> String {
    match AdapterError::from_code(code) {
        Some(err) => err.message().to_string(),
        None if code == 0 => "Success".to_string(),
        None if code == 1 => "Generic failure".to_string(),
        None => "unknown error".to_string(),
    }
}

static CATEGORIES: OnceLock<HashMap<ErrorDomain, ErrorCategory>> = OnceLock::new();

/// Look up the category registered for `domain`.
///
/// The registry is built on first use and never mutated afterwards.
pub fn category(domain: ErrorDomain) -> &'static ErrorCategory {
    let registry = CATEGORIES.get_or_init(|| {
        let mut map = HashMap::with_capacity(2);
        map.insert(
            ErrorDomain::Engine,
            ErrorCategory {
                name: "tlsbridge_engine",
                describe: describe_engine,
            },
        );
        map.insert(
            ErrorDomain::Adapter,
            ErrorCategory {
                name: "tlsbridge_adapter",
                describe: describe_adapter,
            },
        );
        map
    });
    // Both domains are inserted above.
    &registry[&domain]
}

/// A domain-qualified numeric error code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ErrorCode {
    /// Domain the value belongs to
    pub domain: ErrorDomain,
    /// Raw value inside the domain
    pub value: i32,
}

impl ErrorCode {
    /// Message registered for this code.
    pub fn message(&self) -> String {
        category(self.domain).message(self.value)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", category(self.domain).name(), self.value)
    }
}

// ============================================================================
// Engine errors
// ============================================================================

/// Failure reported by the TLS engine.
#[derive(Debug, Clone)]
pub struct EngineError {
    code: i32,
    detail: String,
    source: Option<rustls::Error>,
}

impl EngineError {
    /// Engine success baseline.
    pub const SUCCESS: i32 = 0;
    /// Generic engine failure.
    pub const FAILURE: i32 = 1;

    /// Generic failure with a description.
    pub fn failure(detail: impl Into<String>) -> Self {
        Self {
            code: Self::FAILURE,
            detail: detail.into(),
            source: None,
        }
    }

    /// Error carrying an explicit engine code.
    pub fn with_code(code: i32, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: detail.into(),
            source: None,
        }
    }

    /// Raw engine code.
    pub fn code(&self) -> i32 {
        self.code
    }

    /// Description supplied by the engine.
    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// The rustls error behind this failure, if the engine was rustls.
    pub fn rustls_error(&self) -> Option<&rustls::Error> {
        self.source.as_ref()
    }
}

impl From<rustls::Error> for EngineError {
    fn from(e: rustls::Error) -> Self {
        Self {
            code: Self::FAILURE,
            detail: e.to_string(),
            source: Some(e),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", describe_engine(self.code), self.detail)
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ============================================================================
// Adapter errors
// ============================================================================

/// Errors raised by the adapter itself.
///
/// Discriminants are the codes registered in the adapter category; `0` and
/// `1` are reserved for success and generic failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum AdapterError {
    /// Context used before `init`
    ContextNotInit = 2,
    /// `init` called on an initialized context
    ContextAlreadyInit = 3,
    /// Engine rejected the context configuration
    ContextFailedToInit = 4,
    /// Operation requires a server (or dual-role) context
    OnlyValidForServerContext = 5,
    /// Negotiated peer identity does not match the expected one
    SessionIdMismatch = 6,
    /// Operation completed after `cancel()` was requested
    Cancelled = 7,
    /// Operation requires a client (or dual-role) context
    OnlyValidForClientContext = 8,
    /// Context is shared with a socket and can no longer be changed
    ContextInUse = 9,
    /// Data transfer attempted before the handshake completed
    NotEstablished = 10,
    /// A handshake was already started on this socket
    HandshakeInProgress = 11,
    /// A send (or recv) is already outstanding on this socket
    OperationInProgress = 12,
    /// Socket is closed
    Closed = 13,
}

impl AdapterError {
    const ALL: [AdapterError; 12] = [
        AdapterError::ContextNotInit,
        AdapterError::ContextAlreadyInit,
        AdapterError::ContextFailedToInit,
        AdapterError::OnlyValidForServerContext,
        AdapterError::SessionIdMismatch,
        AdapterError::Cancelled,
        AdapterError::OnlyValidForClientContext,
        AdapterError::ContextInUse,
        AdapterError::NotEstablished,
        AdapterError::HandshakeInProgress,
        AdapterError::OperationInProgress,
        AdapterError::Closed,
    ];

    /// Numeric code in the adapter category.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Reverse of [`AdapterError::code`].
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|e| e.code() == code)
    }

    /// Static message for this error.
    pub fn message(self) -> &'static str {
        match self {
            Self::ContextNotInit => "TLS context not init",
            Self::ContextAlreadyInit => "TLS context is already init",
            Self::ContextFailedToInit => "TLS context failed to init",
            Self::OnlyValidForServerContext => {
                "Operation is only valid for server initialized TLS context"
            }
            Self::SessionIdMismatch => {
                "Critical error on connect: peer identity mismatch, likely an active attack"
            }
            Self::Cancelled => "Operation cancelled",
            Self::OnlyValidForClientContext => {
                "Operation is only valid for client initialized TLS context"
            }
            Self::ContextInUse => "TLS context is in use by a socket and cannot be modified",
            Self::NotEstablished => "TLS session is not established",
            Self::HandshakeInProgress => "TLS handshake already started on this socket",
            Self::OperationInProgress => "Another operation in this direction is outstanding",
            Self::Closed => "TLS socket is closed",
        }
    }
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for AdapterError {}

// ============================================================================
// Top-level error
// ============================================================================

/// Any error surfaced by the adapter.
#[derive(Debug)]
pub enum TlsError {
    /// TLS engine failure
    Engine(EngineError),
    /// Adapter misuse or policy failure
    Adapter(AdapterError),
    /// Transport or credential-store I/O error
    Io(io::Error),
}

impl TlsError {
    /// Domain-qualified code, if the error has one (I/O errors do not).
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Engine(e) => Some(ErrorCode {
                domain: ErrorDomain::Engine,
                value: e.code(),
            }),
            Self::Adapter(e) => Some(ErrorCode {
                domain: ErrorDomain::Adapter,
                value: e.code(),
            }),
            Self::Io(_) => None,
        }
    }

    /// The adapter error, if this is one.
    pub fn adapter(&self) -> Option<AdapterError> {
        match self {
            Self::Adapter(e) => Some(*e),
            _ => None,
        }
    }

    /// Check whether the operation ended because of `cancel()`.
    pub fn is_cancelled(&self) -> bool {
        self.adapter() == Some(AdapterError::Cancelled)
    }
}

impl fmt::Display for TlsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Engine(e) => write!(f, "TLS engine error: {}", e),
            Self::Adapter(e) => write!(f, "TLS adapter error: {}", e),
            Self::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for TlsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Engine(e) => Some(e),
            Self::Adapter(e) => Some(e),
            Self::Io(e) => Some(e),
        }
    }
}

impl From<EngineError> for TlsError {
    fn from(e: EngineError) -> Self {
        Self::Engine(e)
    }
}

impl From<AdapterError> for TlsError {
    fn from(e: AdapterError) -> Self {
        Self::Adapter(e)
    }
}

impl From<io::Error> for TlsError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<rustls::Error> for TlsError {
    fn from(e: rustls::Error) -> Self {
        Self::Engine(e.into())
    }
}

// ============================================================================
// Tests
// ============================================================================
