// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Position tracking over caller-supplied scatter/gather buffers.

use std::ops::{Deref, DerefMut};

/// Cursor into a list of buffers: current buffer index, bytes consumed
/// within it, and the running total.
///
/// Empty buffers are skipped. The cursor never owns the buffers; callers
/// pass the same list on every call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BufCursor {
    idx: usize,
    offset: usize,
    transferred: usize,
}

impl BufCursor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Unconsumed part of the current buffer, or `None` when every buffer
    /// is exhausted.
    pub(crate) fn remaining<'a, B>(&mut self, bufs: &'a [B]) -> Option<&'a [u8]>
    where
        B: Deref<Target = [u8]>,
    {
        while let Some(buf) = bufs.get(self.idx) {
            if self.offset < buf.len() {
                return Some(&buf[self.offset..]);
            }
            self.idx += 1;
            self.offset = 0;
        }
        None
    }

    /// Mutable unconsumed part of the current buffer.
    pub(crate) fn remaining_mut<'a, B>(&mut self, bufs: &'a mut [B]) -> Option<&'a mut [u8]>
    where
        B: DerefMut<Target = [u8]>,
    {
        loop {
            let len = bufs.get(self.idx)?.len();
            if self.offset < len {
                return Some(&mut bufs[self.idx][self.offset..]);
            }
            self.idx += 1;
            self.offset = 0;
        }
    }

    /// Record `n` bytes consumed from the current buffer.
    pub(crate) fn advance(&mut self, n: usize) {
        self.offset += n;
        self.transferred += n;
    }

    /// Total bytes consumed so far.
    pub(crate) fn transferred(&self) -> usize {
        self.transferred
    }
}

/// Sum of buffer lengths.
pub(crate) fn total_len<B>(bufs: &[B]) -> usize
where
    B: Deref<Target = [u8]>,
{
    bufs.iter().map(|b| b.len()).sum()
}
