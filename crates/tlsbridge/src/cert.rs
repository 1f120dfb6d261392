// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Minimal X.509 accessors for the negotiated peer certificate.
//!
//! Only what callers of the socket need: subject common name, validity
//! window and a SHA-256 fingerprint used for pinning.

use std::fmt;

use ring::digest::{digest, SHA256};
use x509_parser::prelude::*;

use crate::error::EngineError;

/// SHA-256 digest of a DER-encoded certificate.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Fingerprint of a DER certificate.
    pub fn of(der: &[u8]) -> Self {
        let mut out = [0u8; 32];
        out.copy_from_slice(digest(&SHA256, der).as_ref());
        Self(out)
    }

    /// Wrap a precomputed digest.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02X}", b)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self)
    }
}

/// Parsed view of a peer's end-entity certificate.
#[derive(Debug, Clone)]
pub struct PeerCertificate {
    der: Vec<u8>,
    common_name: Option<String>,
    not_before: String,
    not_after: String,
    not_before_ts: i64,
    not_after_ts: i64,
}

impl PeerCertificate {
    /// Parse a DER certificate.
    pub fn from_der(der: &[u8]) -> Result<Self, EngineError> {
        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|e| EngineError::failure(format!("invalid peer certificate: {:?}", e)))?;

        let common_name = cert
            .subject()
            .iter_common_name()
            .next()
            .and_then(|cn| cn.as_str().ok())
            .map(str::to_string);
        let validity = cert.validity();

        Ok(Self {
            der: der.to_vec(),
            common_name,
            not_before: validity.not_before.to_string(),
            not_after: validity.not_after.to_string(),
            not_before_ts: validity.not_before.timestamp(),
            not_after_ts: validity.not_after.timestamp(),
        })
    }

    /// Subject common name, if present.
    pub fn common_name(&self) -> Option<&str> {
        self.common_name.as_deref()
    }

    /// Start of the validity window, human readable.
    pub fn not_before(&self) -> &str {
        &self.not_before
    }

    /// End of the validity window, human readable.
    pub fn not_after(&self) -> &str {
        &self.not_after
    }

    /// Start of the validity window as a Unix timestamp.
    pub fn not_before_timestamp(&self) -> i64 {
        self.not_before_ts
    }

    /// End of the validity window as a Unix timestamp.
    pub fn not_after_timestamp(&self) -> i64 {
        self.not_after_ts
    }

    /// SHA-256 fingerprint of the DER encoding.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(&self.der)
    }

    /// DER encoding.
    pub fn der(&self) -> &[u8] {
        &self.der
    }
}
