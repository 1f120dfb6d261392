// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shared fixtures: an rcgen PKI and socket pairs over in-memory streams.

#![allow(dead_code)]

use std::io::{IoSlice, IoSliceMut};

use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DnType, ExtendedKeyUsagePurpose, IsCa,
    KeyPair, KeyUsagePurpose,
};
use tlsbridge::{
    ContextMode, Received, SocketConfig, TlsContext, TlsSocket, TlsVersion,
};
use tokio::io::{duplex, AsyncRead, AsyncWrite, DuplexStream};

/// Issued certificate with its key, both PEM.
pub struct Identity {
    pub cert_pem: String,
    pub key_pem: String,
    pub der: Vec<u8>,
}

/// Root CA plus server and client identities it signed.
pub struct Pki {
    pub ca_pem: String,
    pub server: Identity,
    pub client: Identity,
}

fn issue(
    name: &str,
    purpose: ExtendedKeyUsagePurpose,
    ca: &Certificate,
    ca_key: &KeyPair,
) -> Identity {
    let key = KeyPair::generate().unwrap();
    let mut params = CertificateParams::new(vec![name.to_string()]).unwrap();
    params.distinguished_name.push(DnType::CommonName, name);
    params.key_usages = vec![KeyUsagePurpose::DigitalSignature];
    params.extended_key_usages = vec![purpose];
    let cert = params.signed_by(&key, ca, ca_key).unwrap();
    Identity {
        cert_pem: cert.pem(),
        key_pem: key.serialize_pem(),
        der: cert.der().to_vec(),
    }
}

impl Pki {
    pub fn new() -> Self {
        let ca_key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
        params.distinguished_name.push(DnType::CommonName, "tlsbridge test root");
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];
        let ca = params.self_signed(&ca_key).unwrap();

        let server = issue("localhost", ExtendedKeyUsagePurpose::ServerAuth, &ca, &ca_key);
        let client = issue("client.local", ExtendedKeyUsagePurpose::ClientAuth, &ca, &ca_key);
        Self {
            ca_pem: ca.pem(),
            server,
            client,
        }
    }

    /// Client trusting the root, without its own identity.
    pub fn client_context(&self) -> TlsContext {
        let mut ctx = TlsContext::new();
        ctx.init(ContextMode::Client).unwrap();
        ctx.load_cert(self.ca_pem.as_bytes()).unwrap();
        ctx
    }

    /// Client trusting the root and presenting the client identity.
    pub fn mtls_client_context(&self) -> TlsContext {
        let mut ctx = self.client_context();
        ctx.load_key_pair(
            self.client.cert_pem.as_bytes(),
            self.client.key_pem.as_bytes(),
        )
        .unwrap();
        ctx
    }

    /// Server presenting the server identity.
    pub fn server_context(&self) -> TlsContext {
        let mut ctx = TlsContext::new();
        ctx.init(ContextMode::Server).unwrap();
        ctx.load_key_pair(
            self.server.cert_pem.as_bytes(),
            self.server.key_pem.as_bytes(),
        )
        .unwrap();
        ctx
    }

    /// Server that requires a client certificate signed by the root.
    pub fn mtls_server_context(&self) -> TlsContext {
        let mut ctx = self.server_context();
        ctx.load_cert(self.ca_pem.as_bytes()).unwrap();
        ctx.request_peer_cert().unwrap();
        ctx
    }
}

/// Restrict a context to a single protocol version.
pub fn pin_version(ctx: &mut TlsContext, version: TlsVersion) {
    ctx.set_protocol_versions(version, version).unwrap();
}

/// Unconnected client and server sockets over an in-memory pipe.
pub fn socket_pair(
    client_ctx: &TlsContext,
    server_ctx: &TlsContext,
    client_config: SocketConfig,
) -> (TlsSocket<DuplexStream>, TlsSocket<DuplexStream>) {
    let (a, b) = duplex(64 * 1024);
    let client = TlsSocket::with_config(a, client_ctx, client_config).unwrap();
    let server = TlsSocket::new(b, server_ctx).unwrap();
    (client, server)
}

/// Client and server sockets with the handshake completed.
pub async fn established_pair(pki: &Pki) -> (TlsSocket<DuplexStream>, TlsSocket<DuplexStream>) {
    let (client, server) = socket_pair(
        &pki.client_context(),
        &pki.server_context(),
        SocketConfig::default(),
    );
    let (c, s) = tokio::join!(client.connect(), server.accept());
    c.unwrap();
    s.unwrap();
    (client, server)
}

pub async fn send_all<S>(socket: &TlsSocket<S>, data: &[u8])
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let n = socket.send(&[IoSlice::new(data)]).await.unwrap();
    assert_eq!(n, data.len());
}

pub async fn recv_exact<S>(socket: &TlsSocket<S>, len: usize) -> Vec<u8>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let mut buf = vec![0u8; len];
    let got = socket.recv(&mut [IoSliceMut::new(&mut buf)]).await.unwrap();
    assert_eq!(got, Received::Filled(len));
    buf
}
