// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Connection table.
//!
//! Sockets are owned by the table and referenced through a stable
//! [`SocketHandle`]. A socket is never moved once inserted; callers hold an
//! `Arc` while operations are outstanding.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::socket::TlsSocket;

/// Stable identifier of a socket in a [`ConnectionTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SocketHandle(u64);

impl SocketHandle {
    /// Raw handle value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SocketHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "socket#{}", self.0)
    }
}

/// Concurrent map of live sockets.
pub struct ConnectionTable<S> {
    sockets: DashMap<SocketHandle, Arc<TlsSocket<S>>>,
    next_handle: AtomicU64,
}

impl<S> Default for ConnectionTable<S> {
    fn default() -> Self {
        Self {
            sockets: DashMap::new(),
            next_handle: AtomicU64::new(1),
        }
    }
}

impl<S> ConnectionTable<S>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Send + 'static,
{
    /// Create an empty table. Handles start at 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `socket` and return its handle.
    ///
    /// Handles are never reused.
    pub fn insert(&self, socket: TlsSocket<S>) -> SocketHandle {
        let handle = SocketHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.sockets.insert(handle, Arc::new(socket));
        log::debug!("[table] inserted {}", handle);
        handle
    }

    /// Shared reference to a live socket.
    pub fn get(&self, handle: SocketHandle) -> Option<Arc<TlsSocket<S>>> {
        self.sockets.get(&handle).map(|entry| Arc::clone(entry.value()))
    }

    /// Close the socket and drop the table's reference.
    pub fn remove(&self, handle: SocketHandle) -> Option<Arc<TlsSocket<S>>> {
        let (_, socket) = self.sockets.remove(&handle)?;
        socket.close();
        log::debug!("[table] removed {}", handle);
        Some(socket)
    }

    /// Close and remove every socket.
    pub fn close_all(&self) {
        let handles: Vec<SocketHandle> = self.sockets.iter().map(|e| *e.key()).collect();
        for handle in handles {
            self.remove(handle);
        }
    }

    /// Handles of every live socket.
    pub fn handles(&self) -> Vec<SocketHandle> {
        let mut handles: Vec<SocketHandle> = self.sockets.iter().map(|e| *e.key()).collect();
        handles.sort_unstable();
        handles
    }

    /// Number of sockets currently registered.
    pub fn len(&self) -> usize {
        self.sockets.len()
    }

    /// Check if no socket is registered.
    pub fn is_empty(&self) -> bool {
        self.sockets.is_empty()
    }
}

impl<S> fmt::Debug for ConnectionTable<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionTable")
            .field("sockets", &self.sockets.len())
            .finish()
    }
}
