// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Credential context shared by TLS sockets.
//!
//! A [`TlsContext`] holds everything needed to start sessions: the role it
//! was initialized for, trust anchors, the local certificate chain and key,
//! optional Diffie-Hellman parameters and the peer-certificate policy.
//!
//! # Lifecycle
//!
//! ```text
//!   TlsContext::new() --> Uninitialized --init(mode)--> Initialized(mode)
//!                                                          |
//!                              load_cert / load_key_pair / | first socket created
//!                              request_peer_cert / ...     v
//!                                                        frozen (shared)
//! ```
//!
//! Configure the context completely before creating sockets from it. Once a
//! socket holds a reference, every mutator fails with
//! [`AdapterError::ContextInUse`]; the engine configurations built from it
//! are then read concurrently without locking.
//!
//! # Example
//!
//! ```ignore
//! use tlsbridge::{ContextMode, TlsContext};
//!
//! let mut server = TlsContext::new();
//! server.init(ContextMode::Server)?;
//! server.load_key_pair_file("server.crt", "server.key")?;
//!
//! let mut client = TlsContext::new();
//! client.init(ContextMode::Client)?;
//! client.load_cert_file("ca.crt")?;
//! ```

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rustls::crypto::CryptoProvider;
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::server::WebPkiClientVerifier;
use rustls::{ClientConfig, RootCertStore, ServerConfig, SupportedProtocolVersion};

use crate::config::TlsVersion;
use crate::error::{AdapterError, EngineError, TlsError, TlsResult};

/// PEM label of Diffie-Hellman parameter blocks.
const DH_PARAMS_TAG: &str = "DH PARAMETERS";

/// Role a context is initialized for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContextMode {
    /// Only initiates connections
    Client,
    /// Only accepts connections
    Server,
    /// Initiates and accepts
    Both,
}

impl ContextMode {
    /// Check if sockets from this context may connect.
    pub fn allows_client(&self) -> bool {
        matches!(self, ContextMode::Client | ContextMode::Both)
    }

    /// Check if sockets from this context may accept.
    pub fn allows_server(&self) -> bool {
        matches!(self, ContextMode::Server | ContextMode::Both)
    }
}

impl fmt::Display for ContextMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContextMode::Client => "Client",
            ContextMode::Server => "Server",
            ContextMode::Both => "Both",
        };
        write!(f, "{}", s)
    }
}

/// Initialization state of a [`TlsContext`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextState {
    /// `init` has not succeeded yet
    Uninitialized,
    /// Initialized for the given role
    Initialized(ContextMode),
}

/// Read a credential file.
pub fn read_file(path: impl AsRef<Path>) -> TlsResult<Vec<u8>> {
    std::fs::read(path.as_ref()).map_err(|e| {
        log::warn!(
            "[tls] failed to read credential file {}: {}",
            path.as_ref().display(),
            e
        );
        TlsError::Io(e)
    })
}

fn protocol_versions(
    min: TlsVersion,
    max: TlsVersion,
) -> Vec<&'static SupportedProtocolVersion> {
    let mut versions = Vec::with_capacity(2);
    if min <= TlsVersion::Tls13 && TlsVersion::Tls13 <= max {
        versions.push(&rustls::version::TLS13);
    }
    if min <= TlsVersion::Tls12 && TlsVersion::Tls12 <= max {
        versions.push(&rustls::version::TLS12);
    }
    versions
}

fn parse_certs(pem: &[u8]) -> TlsResult<Vec<CertificateDer<'static>>> {
    let certs = CertificateDer::pem_slice_iter(pem)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| EngineError::failure(format!("invalid certificate PEM: {:?}", e)))?;
    if certs.is_empty() {
        return Err(EngineError::failure("no certificates found in PEM data").into());
    }
    Ok(certs)
}

// ============================================================================
// Context internals
// ============================================================================

/// Frozen-after-share state behind a [`TlsContext`].
pub(crate) struct ContextBase {
    mode: ContextMode,
    provider: Arc<CryptoProvider>,
    min_version: TlsVersion,
    max_version: TlsVersion,
    roots: RootCertStore,
    cert_chain: Vec<CertificateDer<'static>>,
    private_key: Option<PrivateKeyDer<'static>>,
    dh_params: Option<Vec<u8>>,
    require_peer_cert: bool,
    alpn_protocols: Vec<Vec<u8>>,
    client_config: Mutex<Option<Arc<ClientConfig>>>,
    server_config: Mutex<Option<Arc<ServerConfig>>>,
}

impl ContextBase {
    fn new(mode: ContextMode) -> TlsResult<Self> {
        let base = Self {
            mode,
            provider: Arc::new(rustls::crypto::ring::default_provider()),
            min_version: TlsVersion::Tls12,
            max_version: TlsVersion::Tls13,
            roots: RootCertStore::empty(),
            cert_chain: Vec::new(),
            private_key: None,
            dh_params: None,
            require_peer_cert: false,
            alpn_protocols: Vec::new(),
            client_config: Mutex::new(None),
            server_config: Mutex::new(None),
        };
        base.validate()?;
        Ok(base)
    }

    /// Ask the engine whether it accepts the role and protocol versions.
    fn validate(&self) -> TlsResult<()> {
        let versions = protocol_versions(self.min_version, self.max_version);
        if self.mode.allows_client() {
            ClientConfig::builder_with_provider(Arc::clone(&self.provider))
                .with_protocol_versions(&versions)?;
        }
        if self.mode.allows_server() {
            ServerConfig::builder_with_provider(Arc::clone(&self.provider))
                .with_protocol_versions(&versions)?;
        }
        Ok(())
    }

    /// Drop cached engine configurations after a mutation.
    fn invalidate(&mut self) {
        *self.client_config.get_mut() = None;
        *self.server_config.get_mut() = None;
    }

    /// Engine configuration for client sessions, built once.
    pub(crate) fn client_config(&self) -> TlsResult<Arc<ClientConfig>> {
        if !self.mode.allows_client() {
            return Err(AdapterError::OnlyValidForClientContext.into());
        }
        let mut slot = self.client_config.lock();
        if let Some(config) = slot.as_ref() {
            return Ok(Arc::clone(config));
        }

        let versions = protocol_versions(self.min_version, self.max_version);
        let builder = ClientConfig::builder_with_provider(Arc::clone(&self.provider))
            .with_protocol_versions(&versions)?
            .with_root_certificates(self.roots.clone());

        // Present our own chain when one is loaded (mutual TLS).
        let mut config = match &self.private_key {
            Some(key) if !self.cert_chain.is_empty() => {
                builder.with_client_auth_cert(self.cert_chain.clone(), key.clone_key())?
            }
            _ => builder.with_no_client_auth(),
        };
        config.alpn_protocols = self.alpn_protocols.clone();

        let config = Arc::new(config);
        *slot = Some(Arc::clone(&config));
        log::debug!(
            "[tls] built client config (roots={}, client_auth={})",
            self.roots.len(),
            self.private_key.is_some()
        );
        Ok(config)
    }

    /// Engine configuration for server sessions, built once.
    pub(crate) fn server_config(&self) -> TlsResult<Arc<ServerConfig>> {
        if !self.mode.allows_server() {
            return Err(AdapterError::OnlyValidForServerContext.into());
        }
        let mut slot = self.server_config.lock();
        if let Some(config) = slot.as_ref() {
            return Ok(Arc::clone(config));
        }

        let key = self.private_key.as_ref().ok_or_else(|| {
            EngineError::failure("server context has no certificate and private key")
        })?;

        let versions = protocol_versions(self.min_version, self.max_version);
        let builder = ServerConfig::builder_with_provider(Arc::clone(&self.provider))
            .with_protocol_versions(&versions)?;
        let builder = if self.require_peer_cert {
            let verifier = WebPkiClientVerifier::builder_with_provider(
                Arc::new(self.roots.clone()),
                Arc::clone(&self.provider),
            )
            .build()
            .map_err(|e| EngineError::failure(format!("client verifier: {}", e)))?;
            builder.with_client_cert_verifier(verifier)
        } else {
            builder.with_no_client_auth()
        };

        let mut config = builder.with_single_cert(self.cert_chain.clone(), key.clone_key())?;
        config.alpn_protocols = self.alpn_protocols.clone();

        let config = Arc::new(config);
        *slot = Some(Arc::clone(&config));
        log::debug!(
            "[tls] built server config (require_peer_cert={})",
            self.require_peer_cert
        );
        Ok(config)
    }
}

// ============================================================================
// TlsContext
// ============================================================================

/// Credential context shared by sockets.
///
/// Cloning the handle shares the same context; a shared context is frozen.
#[derive(Clone, Default)]
pub struct TlsContext {
    base: Option<Arc<ContextBase>>,
}

impl TlsContext {
    /// Create an uninitialized context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize the context for a role.
    pub fn init(&mut self, mode: ContextMode) -> TlsResult<()> {
        if self.base.is_some() {
            return Err(AdapterError::ContextAlreadyInit.into());
        }
        let base = ContextBase::new(mode).map_err(|e| {
            log::warn!("[tls] engine rejected {} context: {}", mode, e);
            TlsError::from(AdapterError::ContextFailedToInit)
        })?;
        self.base = Some(Arc::new(base));
        log::debug!("[tls] context initialized as {}", mode);
        Ok(())
    }

    /// Current initialization state.
    pub fn state(&self) -> ContextState {
        match &self.base {
            Some(base) => ContextState::Initialized(base.mode),
            None => ContextState::Uninitialized,
        }
    }

    /// Role of an initialized context.
    pub fn mode(&self) -> Option<ContextMode> {
        self.base.as_ref().map(|b| b.mode)
    }

    /// Check if `init` has succeeded.
    pub fn is_init(&self) -> bool {
        self.base.is_some()
    }

    /// Check if a socket (or another handle) shares this context.
    pub fn is_frozen(&self) -> bool {
        self.base
            .as_ref()
            .map(|b| Arc::strong_count(b) > 1)
            .unwrap_or(false)
    }

    fn base_mut(&mut self) -> TlsResult<&mut ContextBase> {
        let base = self.base.as_mut().ok_or(AdapterError::ContextNotInit)?;
        let base = Arc::get_mut(base).ok_or(AdapterError::ContextInUse)?;
        base.invalidate();
        Ok(base)
    }

    /// Shared handle used by sockets. Freezes the context.
    pub(crate) fn share(&self) -> TlsResult<Arc<ContextBase>> {
        self.base
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| AdapterError::ContextNotInit.into())
    }

    /// Add trusted certificate(s) (PEM) used to verify the peer.
    pub fn load_cert(&mut self, pem: &[u8]) -> TlsResult<()> {
        let base = self.base_mut()?;
        let certs = parse_certs(pem)?;
        // Nothing is trusted unless the whole bundle is.
        let mut added = RootCertStore::empty();
        for cert in certs {
            added.add(cert)?;
        }
        base.roots.extend(added.roots);
        log::debug!("[tls] trust store now holds {} roots", base.roots.len());
        Ok(())
    }

    /// Load trusted certificate(s) from a PEM file.
    pub fn load_cert_file(&mut self, path: impl AsRef<Path>) -> TlsResult<()> {
        if !self.is_init() {
            return Err(AdapterError::ContextNotInit.into());
        }
        let pem = read_file(path)?;
        self.load_cert(&pem)
    }

    /// Set the local certificate chain and private key (both PEM).
    pub fn load_key_pair(&mut self, cert_chain_pem: &[u8], private_key_pem: &[u8]) -> TlsResult<()> {
        let base = self.base_mut()?;
        let chain = parse_certs(cert_chain_pem)?;
        let key = PrivateKeyDer::from_pem_slice(private_key_pem)
            .map_err(|e| EngineError::failure(format!("invalid private key PEM: {:?}", e)))?;

        // Make sure the engine can sign with it before accepting it.
        base.provider.key_provider.load_private_key(key.clone_key())?;

        base.cert_chain = chain;
        base.private_key = Some(key);
        Ok(())
    }

    /// Load the local certificate chain and private key from PEM files.
    pub fn load_key_pair_file(
        &mut self,
        cert_chain_path: impl AsRef<Path>,
        private_key_path: impl AsRef<Path>,
    ) -> TlsResult<()> {
        if !self.is_init() {
            return Err(AdapterError::ContextNotInit.into());
        }
        let chain = read_file(cert_chain_path)?;
        let key = read_file(private_key_path)?;
        self.load_key_pair(&chain, &key)
    }

    /// Trust the bundled webpki root set.
    #[cfg(feature = "system-roots")]
    pub fn load_system_roots(&mut self) -> TlsResult<()> {
        let base = self.base_mut()?;
        base.roots
            .extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        Ok(())
    }

    /// Set Diffie-Hellman parameters (PEM `DH PARAMETERS` block).
    pub fn set_dh_params(&mut self, pem_data: &[u8]) -> TlsResult<()> {
        let base = self.base_mut()?;
        let block = ::pem::parse(pem_data)
            .map_err(|e| EngineError::failure(format!("invalid DH parameters PEM: {}", e)))?;
        if block.tag() != DH_PARAMS_TAG {
            return Err(EngineError::failure(format!(
                "expected {} block, found {}",
                DH_PARAMS_TAG,
                block.tag()
            ))
            .into());
        }
        base.dh_params = Some(block.contents().to_vec());
        Ok(())
    }

    /// Load Diffie-Hellman parameters from a PEM file.
    pub fn set_dh_params_file(&mut self, path: impl AsRef<Path>) -> TlsResult<()> {
        if !self.is_init() {
            return Err(AdapterError::ContextNotInit.into());
        }
        let pem = read_file(path)?;
        self.set_dh_params(&pem)
    }

    /// DER contents of the configured DH parameters.
    pub fn dh_params(&self) -> Option<&[u8]> {
        self.base.as_ref().and_then(|b| b.dh_params.as_deref())
    }

    /// Require connecting clients to present a certificate signed by one of
    /// the trusted roots.
    pub fn request_peer_cert(&mut self) -> TlsResult<()> {
        let mode = self.mode().ok_or(AdapterError::ContextNotInit)?;
        if !mode.allows_server() {
            return Err(AdapterError::OnlyValidForServerContext.into());
        }
        self.base_mut()?.require_peer_cert = true;
        Ok(())
    }

    /// Check if peers must present a certificate.
    pub fn requires_peer_cert(&self) -> bool {
        self.base
            .as_ref()
            .map(|b| b.require_peer_cert)
            .unwrap_or(false)
    }

    /// Set ALPN protocols offered (client) or accepted (server).
    pub fn set_alpn_protocols(&mut self, protocols: Vec<Vec<u8>>) -> TlsResult<()> {
        self.base_mut()?.alpn_protocols = protocols;
        Ok(())
    }

    /// Restrict the negotiable protocol versions.
    pub fn set_protocol_versions(&mut self, min: TlsVersion, max: TlsVersion) -> TlsResult<()> {
        let base = self.base_mut()?;
        if min > max {
            return Err(EngineError::failure(format!(
                "minimum version {:?} above maximum {:?}",
                min, max
            ))
            .into());
        }
        base.min_version = min;
        base.max_version = max;
        Ok(())
    }
}

impl fmt::Debug for TlsContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.base {
            None => f
                .debug_struct("TlsContext")
                .field("state", &ContextState::Uninitialized)
                .finish(),
            Some(base) => f
                .debug_struct("TlsContext")
                .field("mode", &base.mode)
                .field("roots", &base.roots.len())
                .field("has_key_pair", &base.private_key.is_some())
                .field("require_peer_cert", &base.require_peer_cert)
                .field("frozen", &(Arc::strong_count(base) > 1))
                .finish(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn self_signed() -> (String, String) {
        let key = rcgen::KeyPair::generate().unwrap();
        let params = rcgen::CertificateParams::new(vec!["localhost".to_string()]).unwrap();
        let cert = params.self_signed(&key).unwrap();
        (cert.pem(), key.serialize_pem())
    }

    #[test]
    fn test_uninitialized_state() {
        let ctx = TlsContext::new();
        assert_eq!(ctx.state(), ContextState::Uninitialized);
        assert_eq!(ctx.mode(), None);
        assert!(!ctx.is_init());
        assert!(!ctx.is_frozen());
    }

    #[test]
    fn test_load_cert_before_init() {
        let mut ctx = TlsContext::new();
        let (cert, key) = self_signed();
        let err = ctx.load_cert(cert.as_bytes()).unwrap_err();
        assert_eq!(err.adapter(), Some(AdapterError::ContextNotInit));
        let err = ctx.load_key_pair(cert.as_bytes(), key.as_bytes()).unwrap_err();
        assert_eq!(err.adapter(), Some(AdapterError::ContextNotInit));
        let err = ctx.request_peer_cert().unwrap_err();
        assert_eq!(err.adapter(), Some(AdapterError::ContextNotInit));
        let err = ctx.set_dh_params(b"").unwrap_err();
        assert_eq!(err.adapter(), Some(AdapterError::ContextNotInit));
    }

    #[test]
    fn test_file_loaders_before_init_skip_io() {
        let mut ctx = TlsContext::new();
        let err = ctx.load_cert_file("/nonexistent/ca.pem").unwrap_err();
        assert_eq!(err.adapter(), Some(AdapterError::ContextNotInit));
    }

    #[test]
    fn test_init_twice() {
        let mut ctx = TlsContext::new();
        ctx.init(ContextMode::Client).unwrap();
        let err = ctx.init(ContextMode::Server).unwrap_err();
        assert_eq!(err.adapter(), Some(AdapterError::ContextAlreadyInit));
        assert_eq!(ctx.mode(), Some(ContextMode::Client));
    }

    #[test]
    fn test_request_peer_cert_requires_server() {
        let mut ctx = TlsContext::new();
        ctx.init(ContextMode::Client).unwrap();
        let err = ctx.request_peer_cert().unwrap_err();
        assert_eq!(err.adapter(), Some(AdapterError::OnlyValidForServerContext));

        for mode in [ContextMode::Server, ContextMode::Both] {
            let mut ctx = TlsContext::new();
            ctx.init(mode).unwrap();
            ctx.request_peer_cert().unwrap();
            assert!(ctx.requires_peer_cert());
        }
    }

    #[test]
    fn test_load_cert_rejects_empty_pem() {
        let mut ctx = TlsContext::new();
        ctx.init(ContextMode::Client).unwrap();
        let err = ctx.load_cert(b"no pem here").unwrap_err();
        assert!(matches!(err, TlsError::Engine(_)));
    }

    #[test]
    fn test_load_cert_bundle_is_all_or_nothing() {
        let mut ctx = TlsContext::new();
        ctx.init(ContextMode::Client).unwrap();
        let roots = |ctx: &TlsContext| ctx.base.as_ref().unwrap().roots.len();

        let (cert, _) = self_signed();
        let garbage = pem::encode(&pem::Pem::new("CERTIFICATE", vec![1, 2, 3]));
        let bundle = format!("{}\n{}", cert, garbage);

        assert!(ctx.load_cert(bundle.as_bytes()).is_err());
        assert_eq!(roots(&ctx), 0);

        ctx.load_cert(cert.as_bytes()).unwrap();
        assert_eq!(roots(&ctx), 1);

        let (other, _) = self_signed();
        let bundle = format!("{}\n{}", other, garbage);
        assert!(ctx.load_cert(bundle.as_bytes()).is_err());
        assert_eq!(roots(&ctx), 1);
    }

    #[test]
    fn test_load_key_pair() {
        let mut ctx = TlsContext::new();
        ctx.init(ContextMode::Server).unwrap();
        let (cert, key) = self_signed();
        ctx.load_key_pair(cert.as_bytes(), key.as_bytes()).unwrap();
        assert!(ctx.share().unwrap().server_config().is_ok());
    }

    #[test]
    fn test_server_config_without_key_fails() {
        let mut ctx = TlsContext::new();
        ctx.init(ContextMode::Server).unwrap();
        let err = ctx.share().unwrap().server_config().unwrap_err();
        assert!(matches!(err, TlsError::Engine(_)));
    }

    #[test]
    fn test_role_checks_on_configs() {
        let mut ctx = TlsContext::new();
        ctx.init(ContextMode::Client).unwrap();
        let base = ctx.share().unwrap();
        assert!(base.client_config().is_ok());
        let err = base.server_config().unwrap_err();
        assert_eq!(err.adapter(), Some(AdapterError::OnlyValidForServerContext));
    }

    #[test]
    fn test_client_config_is_cached() {
        let mut ctx = TlsContext::new();
        ctx.init(ContextMode::Client).unwrap();
        let base = ctx.share().unwrap();
        let a = base.client_config().unwrap();
        let b = base.client_config().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_shared_context_is_frozen() {
        let mut ctx = TlsContext::new();
        ctx.init(ContextMode::Both).unwrap();
        let shared = ctx.share().unwrap();
        assert!(ctx.is_frozen());
        let (cert, _) = self_signed();
        let err = ctx.load_cert(cert.as_bytes()).unwrap_err();
        assert_eq!(err.adapter(), Some(AdapterError::ContextInUse));

        drop(shared);
        assert!(!ctx.is_frozen());
        ctx.load_cert(cert.as_bytes()).unwrap();
    }

    #[test]
    fn test_dh_params() {
        let mut ctx = TlsContext::new();
        ctx.init(ContextMode::Server).unwrap();
        let block = ::pem::Pem::new(DH_PARAMS_TAG, vec![0x30, 0x03, 0x02, 0x01, 0x05]);
        let encoded = ::pem::encode(&block);
        ctx.set_dh_params(encoded.as_bytes()).unwrap();
        assert_eq!(ctx.dh_params(), Some(&[0x30, 0x03, 0x02, 0x01, 0x05][..]));

        let wrong = ::pem::encode(&::pem::Pem::new("CERTIFICATE", vec![1, 2, 3]));
        assert!(ctx.set_dh_params(wrong.as_bytes()).is_err());
    }

    #[test]
    fn test_protocol_versions() {
        assert_eq!(protocol_versions(TlsVersion::Tls12, TlsVersion::Tls13).len(), 2);
        assert_eq!(protocol_versions(TlsVersion::Tls13, TlsVersion::Tls13).len(), 1);

        let mut ctx = TlsContext::new();
        ctx.init(ContextMode::Client).unwrap();
        assert!(ctx
            .set_protocol_versions(TlsVersion::Tls13, TlsVersion::Tls12)
            .is_err());
        ctx.set_protocol_versions(TlsVersion::Tls12, TlsVersion::Tls12)
            .unwrap();
    }

    #[test]
    fn test_load_from_files() {
        let (cert, key) = self_signed();
        let mut cert_file = tempfile::NamedTempFile::new().unwrap();
        cert_file.write_all(cert.as_bytes()).unwrap();
        let mut key_file = tempfile::NamedTempFile::new().unwrap();
        key_file.write_all(key.as_bytes()).unwrap();

        let mut ctx = TlsContext::new();
        ctx.init(ContextMode::Both).unwrap();
        ctx.load_cert_file(cert_file.path()).unwrap();
        ctx.load_key_pair_file(cert_file.path(), key_file.path())
            .unwrap();

        let err = ctx.load_cert_file("/nonexistent/ca.pem").unwrap_err();
        assert!(matches!(err, TlsError::Io(_)));
    }
}
