//! Shared surfaces and the queue that moves them between producer and
//! consumer.
//!
//! ```text
//!            checkout                produce
//!   pool ──────────────► producer ────────────► due
//!    ▲                                           │
//!    │        checkin                 consume    │
//!    └─────────────────── consumer ◄─────────────┘
//! ```
//!
//! A [`Surface`] is deliberately not `Clone`: it is moved through the queue,
//! so at any instant it is owned by exactly one of the pool, the due list,
//! the producer or the consumer.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::queue::BlockingQueue;

/// Default bound for `checkout` / `consume` waits.
pub const DEFAULT_WAIT: Duration = Duration::from_millis(100);

/// Opaque cross-context identity of a surface's underlying memory.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShareHandle(Uuid);

impl ShareHandle {
    /// A fresh, process-unique identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ShareHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ShareHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShareHandle({})", self.0.simple())
    }
}

impl fmt::Display for ShareHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// A GPU-resident buffer exchangeable between two rendering contexts.
///
/// Immutable after creation. Holds no GPU object itself; each context
/// resolves the [`ShareHandle`] to its own view of the memory.
#[derive(Debug, PartialEq, Eq)]
pub struct Surface {
    handle: ShareHandle,
    width: u32,
    height: u32,
}

impl Surface {
    pub fn new(handle: ShareHandle, width: u32, height: u32) -> Self {
        Self {
            handle,
            width,
            height,
        }
    }

    pub fn share_handle(&self) -> ShareHandle {
        self.handle
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Shared handle to a queue, as returned by `Scene::queue`.
pub type SharedSurfaceQueue = Arc<SurfaceQueue>;

/// Two independent FIFOs: `pool` (free for writing) and `due` (ready for
/// reading).
///
/// The producer is back-pressured by an empty pool, the consumer is paced
/// by an empty due list. The order of `produce` calls is the order seen by
/// `consume`.
#[derive(Debug)]
pub struct SurfaceQueue {
    pool: BlockingQueue<Surface>,
    due: BlockingQueue<Surface>,
    capacity: usize,
}

impl SurfaceQueue {
    /// Build a queue whose pool starts out holding every surface.
    pub fn new(surfaces: impl IntoIterator<Item = Surface>) -> Self {
        let pool = BlockingQueue::new();
        let mut capacity = 0;
        for surface in surfaces {
            pool.push(surface);
            capacity += 1;
        }
        log::debug!("Surface queue created with {capacity} surface(s)");
        Self {
            pool,
            due: BlockingQueue::new(),
            capacity,
        }
    }

    /// Acquire a writable surface from the pool.
    ///
    /// `None` means no buffer is free this cycle; the caller skips the frame.
    pub fn checkout(&self, timeout: Duration) -> Option<Surface> {
        let surface = self.pool.pop(timeout);
        if surface.is_none() {
            log::debug!("checkout: no free surface after {timeout:?}");
        }
        surface
    }

    /// Hand a fully written surface to the consumer side.
    pub fn produce(&self, surface: Surface) {
        log::trace!("produce {}", surface.share_handle());
        self.due.push(surface);
    }

    /// Acquire the next finished frame.
    pub fn consume(&self, timeout: Duration) -> Option<Surface> {
        let surface = self.due.pop(timeout);
        if surface.is_none() {
            log::debug!("consume: no frame due after {timeout:?}");
        }
        surface
    }

    /// Return a surface the consumer has finished reading.
    pub fn checkin(&self, surface: Surface) {
        log::trace!("checkin {}", surface.share_handle());
        self.pool.push(surface);
    }

    /// Number of surfaces the queue was built with.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn free_count(&self) -> usize {
        self.pool.len()
    }

    pub fn due_count(&self) -> usize {
        self.due.len()
    }

    /// Surfaces currently held by callers (checked out or being consumed).
    ///
    /// The two queues are read under separate locks, so while other threads
    /// are exchanging surfaces the result is approximate. It is exact once
    /// the queue is quiescent.
    pub fn in_flight(&self) -> usize {
        self.capacity
            .saturating_sub(self.free_count() + self.due_count())
    }
}
