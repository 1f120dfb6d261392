// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Data transfer integration tests over rustls.

mod common;

use std::io::{IoSlice, IoSliceMut};
use std::sync::Arc;
use std::time::Duration;

use common::{established_pair, recv_exact, send_all, socket_pair, Pki};
use tlsbridge::{
    AdapterError, ConnectionTable, Phase, Received, SocketConfig, TlsSocket,
};
use tokio::net::{TcpListener, TcpStream};

/// Split `data` into randomly sized slices.
fn random_split(rng: &mut fastrand::Rng, data: &[u8]) -> Vec<Vec<u8>> {
    let mut parts = Vec::new();
    let mut rest = data;
    while !rest.is_empty() {
        let n = rng.usize(0..=rest.len().min(5000));
        parts.push(rest[..n].to_vec());
        rest = &rest[n..];
    }
    parts
}

// ============================================================================
// Round trip
// ============================================================================

#[tokio::test]
async fn test_round_trip_random_splits() {
    let pki = Pki::new();
    let (client, server) = established_pair(&pki).await;
    let mut rng = fastrand::Rng::with_seed(0x7155_b41d);

    let mut payload = vec![0u8; 100_000];
    rng.fill(&mut payload);

    let send_parts = random_split(&mut rng, &payload);
    let recv_sizes: Vec<usize> = random_split(&mut rng, &payload)
        .iter()
        .map(Vec::len)
        .collect();

    let send = async {
        let slices: Vec<IoSlice<'_>> = send_parts.iter().map(|p| IoSlice::new(p)).collect();
        assert_eq!(client.send(&slices).await.unwrap(), payload.len());
    };
    let recv = async {
        let mut out = Vec::with_capacity(payload.len());
        for size in &recv_sizes {
            out.extend(recv_exact(&server, *size).await);
        }
        out
    };
    let ((), received) = tokio::join!(send, recv);

    assert_eq!(received, payload);
}

#[tokio::test]
async fn test_scatter_gather_recv() {
    let pki = Pki::new();
    let (client, server) = established_pair(&pki).await;

    send_all(&client, b"header:").await;
    send_all(&client, b"body").await;

    let mut head = [0u8; 7];
    let mut empty = [0u8; 0];
    let mut body = [0u8; 4];
    let got = server
        .recv(&mut [
            IoSliceMut::new(&mut head),
            IoSliceMut::new(&mut empty),
            IoSliceMut::new(&mut body),
        ])
        .await
        .unwrap();

    assert_eq!(got, Received::Filled(11));
    assert_eq!(&head, b"header:");
    assert_eq!(&body, b"body");
}

#[tokio::test]
async fn test_full_duplex_echo() {
    let pki = Pki::new();
    let (client, server) = established_pair(&pki).await;
    let payload: Vec<u8> = (0..64 * 1024).map(|i| (i % 251) as u8).collect();

    let echo = async {
        for _ in 0..4 {
            let chunk = recv_exact(&server, 16 * 1024).await;
            send_all(&server, &chunk).await;
        }
    };
    let drive = async {
        let bufs = [IoSlice::new(&payload)];
        let (sent, back) = tokio::join!(client.send(&bufs), recv_exact(&client, payload.len()));
        assert_eq!(sent.unwrap(), payload.len());
        back
    };
    let ((), back) = tokio::join!(echo, drive);

    assert_eq!(back, payload);
}

/// Sends complete in issue order and the bytes arrive in that order.
#[tokio::test]
async fn test_ordered_completion() {
    let pki = Pki::new();
    let (client, server) = established_pair(&pki).await;

    for i in 0u8..20 {
        send_all(&client, &[i; 3]).await;
    }
    let data = recv_exact(&server, 60).await;
    let expected: Vec<u8> = (0u8..20).flat_map(|i| [i; 3]).collect();
    assert_eq!(data, expected);
}

#[tokio::test]
async fn test_small_chunks() {
    let pki = Pki::new();
    let config = SocketConfig::builder().read_chunk(7).write_chunk(11).build();
    let (client, server) = socket_pair(&pki.client_context(), &pki.server_context(), config);

    let (c, s) = tokio::join!(client.connect(), server.accept());
    c.unwrap();
    s.unwrap();

    let payload = vec![0x5A; 4096];
    let bufs = [IoSlice::new(&payload)];
    let (sent, got) = tokio::join!(client.send(&bufs), recv_exact(&server, payload.len()));
    assert_eq!(sent.unwrap(), payload.len());
    assert_eq!(got, payload);

    send_all(&server, b"ok").await;
    assert_eq!(recv_exact(&client, 2).await, b"ok");
}

// ============================================================================
// Close
// ============================================================================

#[tokio::test]
async fn test_shutdown_reports_peer_closed() {
    let pki = Pki::new();
    let (client, server) = established_pair(&pki).await;

    send_all(&server, b"last words").await;
    server.shutdown().await.unwrap();

    let mut buf = [0u8; 64];
    let got = client.recv(&mut [IoSliceMut::new(&mut buf)]).await.unwrap();
    assert_eq!(got, Received::PeerClosed(10));
    assert_eq!(&buf[..10], b"last words");
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let pki = Pki::new();
    let (client, server) = established_pair(&pki).await;

    client.close();
    client.close();
    assert_eq!(client.phase(), Phase::Closed);
    assert!(client.session_info().is_none());

    let err = client.send(&[IoSlice::new(b"x")]).await.unwrap_err();
    assert_eq!(err.adapter(), Some(AdapterError::Closed));

    // Abrupt close: the peer sees truncation, not a clean shutdown.
    let mut buf = [0u8; 1];
    assert!(server.recv(&mut [IoSliceMut::new(&mut buf)]).await.is_err());
    server.close();
    assert!(server.is_closed());
}

#[tokio::test]
async fn test_shutdown_after_close_is_harmless() {
    let pki = Pki::new();
    let (client, _server) = established_pair(&pki).await;

    client.close();
    client.shutdown().await.unwrap();
    assert!(client.is_closed());
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn test_cancel_pending_recv() {
    let pki = Pki::new();
    let (client, _server) = established_pair(&pki).await;
    let handle = client.cancel_handle();

    let recv = async {
        let mut buf = [0u8; 8];
        client.recv(&mut [IoSliceMut::new(&mut buf)]).await
    };
    let cancel = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.cancel();
    };
    let (res, ()) = tokio::join!(recv, cancel);

    assert!(res.unwrap_err().is_cancelled());
    assert!(client.is_closed());
}

/// A cancel racing an about-to-complete receive yields exactly one of the two
/// outcomes and always leaves the socket closed.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancel_races_completing_recv() {
    for round in 0..50u64 {
        let pki = Pki::new();
        let (client, server) = established_pair(&pki).await;
        let client = Arc::new(client);

        send_all(&server, b"race").await;

        let handle = client.cancel_handle();
        let reader = Arc::clone(&client);
        let task = tokio::spawn(async move {
            let mut buf = [0u8; 4];
            let res = reader.recv(&mut [IoSliceMut::new(&mut buf)]).await;
            (res, buf)
        });
        if round % 2 == 0 {
            tokio::task::yield_now().await;
        }
        handle.cancel();

        let (res, buf) = task.await.unwrap();
        match res {
            Ok(got) => {
                assert_eq!(got, Received::Filled(4));
                assert_eq!(&buf, b"race");
            }
            Err(e) => assert!(e.is_cancelled(), "round {}: {}", round, e),
        }

        // The flag is sticky: whatever happened above, the next operation
        // observes it and the socket ends up closed.
        let mut more = [0u8; 1];
        let next = client.recv(&mut [IoSliceMut::new(&mut more)]).await;
        assert!(next.is_err());
        assert!(client.is_closed());
    }
}

// ============================================================================
// Real sockets
// ============================================================================

#[tokio::test]
async fn test_tcp_ping_pong() {
    let pki = Pki::new();
    let client_ctx = pki.client_context();
    let server_ctx = pki.server_context();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let socket = TlsSocket::new(stream, &server_ctx).unwrap();
        socket.accept().await.unwrap();
        let ping = recv_exact(&socket, 4).await;
        assert_eq!(ping, b"ping");
        send_all(&socket, b"pong").await;
        socket.shutdown().await.unwrap();
    });

    let stream = TcpStream::connect(addr).await.unwrap();
    let socket = TlsSocket::new(stream, &client_ctx).unwrap();
    socket.connect().await.unwrap();
    send_all(&socket, b"ping").await;

    let mut buf = [0u8; 16];
    let got = socket.recv(&mut [IoSliceMut::new(&mut buf)]).await.unwrap();
    assert_eq!(got, Received::PeerClosed(4));
    assert_eq!(&buf[..4], b"pong");

    server.await.unwrap();
    socket.close();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_connection_table_many_sockets() {
    let pki = Pki::new();
    let client_ctx = pki.client_context();
    let server_ctx = pki.server_context();
    let clients = Arc::new(ConnectionTable::new());
    let servers = Arc::new(ConnectionTable::new());

    let mut tasks = Vec::new();
    for i in 0..8u8 {
        let (client, server) = socket_pair(&client_ctx, &server_ctx, SocketConfig::default());
        let ch = clients.insert(client);
        let sh = servers.insert(server);
        let clients = Arc::clone(&clients);
        let servers = Arc::clone(&servers);

        tasks.push(tokio::spawn(async move {
            let client = clients.get(ch).unwrap();
            let server = servers.get(sh).unwrap();
            let (c, s) = tokio::join!(client.connect(), server.accept());
            c.unwrap();
            s.unwrap();

            send_all(&*client, &[i; 32]).await;
            assert_eq!(recv_exact(&*server, 32).await, vec![i; 32]);
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(clients.len(), 8);
    clients.close_all();
    servers.close_all();
    assert!(clients.is_empty());
    assert!(servers.is_empty());
}
