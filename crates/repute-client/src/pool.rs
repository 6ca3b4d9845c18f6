//! Per-client pool of reusable HTTP transports and receive buffers.

use crate::buffer::ResponseBuffer;
use reqwest::Client as HttpClient;
use repute_core::{ReputeError, Result};
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::debug;

/// How new transports are built and how many idle ones are kept
#[derive(Debug, Clone, Default)]
pub(crate) struct PoolSettings {
    pub user_agent: String,
    pub timeout: Option<Duration>,
    pub max_idle: Option<usize>,
    pub max_response_bytes: Option<usize>,
}

/// Snapshot of a pool's size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Resources waiting on the free list
    pub idle: usize,
    /// Resources allocated over the pool's lifetime
    pub created: usize,
}

/// One transport plus the buffer its response lands in.
///
/// Owned by exactly one caller between [`ResourcePool::acquire`] and the
/// drop of the guard that wraps it.
#[derive(Debug)]
pub(crate) struct IoResource {
    pub id: usize,
    pub http: HttpClient,
    pub buf: ResponseBuffer,
}

/// Free list of [`IoResource`]s.
///
/// The lock only covers list manipulation; building a transport and every
/// network call happen outside it.
#[derive(Debug)]
pub(crate) struct ResourcePool {
    free: Mutex<Vec<IoResource>>,
    created: AtomicUsize,
    settings: PoolSettings,
}

impl ResourcePool {
    pub fn new(settings: PoolSettings) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            created: AtomicUsize::new(0),
            settings,
        }
    }

    /// Check out a resource, recycling an idle one when available.
    pub fn acquire(&self) -> Result<PooledIo<'_>> {
        let recycled = self.lock().pop();

        let io = match recycled {
            Some(mut io) => {
                io.buf.clear();
                io
            }
            None => self.allocate()?,
        };

        Ok(PooledIo {
            pool: self,
            io: Some(io),
        })
    }

    /// Return a resource to the free list.
    fn release(&self, io: IoResource) {
        let mut free = self.lock();
        match self.settings.max_idle {
            Some(max) if free.len() >= max => {
                drop(free);
                debug!(id = io.id, max_idle = max, "pool full, dropping transport");
            }
            _ => free.push(io),
        }
    }

    fn allocate(&self) -> Result<IoResource> {
        let mut builder = HttpClient::builder()
            .user_agent(&self.settings.user_agent)
            .gzip(true);
        if let Some(timeout) = self.settings.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ReputeError::Internal(format!("failed to build HTTP client: {e}")))?;

        let id = self.created.fetch_add(1, Ordering::Relaxed);
        debug!(id, "allocated pooled transport");

        Ok(IoResource {
            id,
            http,
            buf: ResponseBuffer::with_limit(self.settings.max_response_bytes),
        })
    }

    /// Drop every idle resource, returning how many were released.
    pub fn drain(&self) -> usize {
        let drained = std::mem::take(&mut *self.lock());
        drained.len()
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            idle: self.lock().len(),
            created: self.created.load(Ordering::Relaxed),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<IoResource>> {
        self.free.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A checked-out [`IoResource`]; goes back to the pool on drop.
#[derive(Debug)]
pub(crate) struct PooledIo<'a> {
    pool: &'a ResourcePool,
    io: Option<IoResource>,
}

impl Deref for PooledIo<'_> {
    type Target = IoResource;

    fn deref(&self) -> &IoResource {
        self.io.as_ref().expect("resource present until drop")
    }
}

impl DerefMut for PooledIo<'_> {
    fn deref_mut(&mut self) -> &mut IoResource {
        self.io.as_mut().expect("resource present until drop")
    }
}

impl Drop for PooledIo<'_> {
    fn drop(&mut self) {
        if let Some(io) = self.io.take() {
            self.pool.release(io);
        }
    }
}
