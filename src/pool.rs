//! Scratch buffer pool.
//!
//! Encoding writes into a scratch buffer before the bytes are copied out or
//! handed to a writer. [`BufferPool`] keeps a free list of those buffers so
//! steady-state encoding does not allocate. A lease is an RAII guard: the
//! buffer goes back to the pool when the guard drops, on the error path
//! included.
//!
//! ```rust
//! use ido::{BufferPool, Options};
//!
//! let pool = BufferPool::new(&Options::default());
//! {
//!     let mut scratch = pool.acquire();
//!     scratch.extend_from_slice(b"{1,2}");
//!     assert_eq!(pool.leased(), 1);
//! }
//! assert_eq!(pool.leased(), 0);
//! assert_eq!(pool.available(), 1);
//! ```

use crate::Options;
use parking_lot::Mutex;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::trace;

/// A free list of reusable byte buffers.
pub struct BufferPool {
    free_list: Mutex<Vec<Vec<u8>>>,
    leased: AtomicUsize,
    initial_capacity: usize,
    max_buffers: usize,
    max_capacity: usize,
}

impl BufferPool {
    pub fn new(options: &Options) -> Self {
        BufferPool {
            free_list: Mutex::new(Vec::new()),
            leased: AtomicUsize::new(0),
            initial_capacity: options.scratch_capacity,
            max_buffers: options.max_pooled_buffers,
            max_capacity: options.max_pooled_capacity,
        }
    }

    /// Leases an empty buffer, reusing an idle one when available.
    pub fn acquire(&self) -> PooledBuffer<'_> {
        let reused = self.free_list.lock().pop();
        let buf = match reused {
            Some(mut buf) => {
                buf.clear();
                buf
            }
            None => Vec::with_capacity(self.initial_capacity),
        };
        self.leased.fetch_add(1, Ordering::Relaxed);
        PooledBuffer {
            buf,
            pool: self,
        }
    }

    /// Number of buffers currently leased out.
    pub fn leased(&self) -> usize {
        self.leased.load(Ordering::Relaxed)
    }

    /// Number of idle buffers held by the pool.
    pub fn available(&self) -> usize {
        self.free_list.lock().len()
    }

    /// Drops every idle buffer and returns how many bytes of capacity that
    /// released.
    pub fn clear(&self) -> usize {
        let mut list = self.free_list.lock();
        let reclaimed = list.iter().map(Vec::capacity).sum();
        list.clear();
        reclaimed
    }

    fn release(&self, mut buf: Vec<u8>) {
        let _ = self
            .leased
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |prev| {
                Some(prev.saturating_sub(1))
            });
        if buf.capacity() > self.max_capacity {
            trace!(capacity = buf.capacity(), "dropping oversized scratch buffer");
            return;
        }
        let mut list = self.free_list.lock();
        if list.len() < self.max_buffers {
            buf.clear();
            list.push(buf);
        } else {
            trace!(retained = list.len(), "scratch pool full, dropping buffer");
        }
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        BufferPool::new(&Options::default())
    }
}

impl fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferPool")
            .field("leased", &self.leased())
            .field("available", &self.available())
            .field("max_buffers", &self.max_buffers)
            .field("max_capacity", &self.max_capacity)
            .finish()
    }
}

/// A leased scratch buffer. Dereferences to `Vec<u8>`.
pub struct PooledBuffer<'a> {
    buf: Vec<u8>,
    pool: &'a BufferPool,
}

impl Deref for PooledBuffer<'_> {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.buf
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buf));
    }
}

impl fmt::Debug for PooledBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledBuffer")
            .field("len", &self.buf.len())
            .field("capacity", &self.buf.capacity())
            .finish()
    }
}
