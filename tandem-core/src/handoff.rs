//! Fenced producer-side handoff.
//!
//! A surface only enters the due list after its completion token has
//! signalled. What happens when the wait times out is an explicit policy:
//! by default the frame is dropped and the surface goes back to the pool.

use std::time::Duration;

use crate::fence::{wait_for_completion, CompletionToken};
use crate::surface::{Surface, SurfaceQueue};

/// Behaviour when the completion fence does not signal in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FencePolicy {
    /// Return the surface to the pool; the consumer never sees the frame.
    #[default]
    DropFrame,
    /// Produce the surface anyway. The consumer may read a partially
    /// written frame; accepted as an approximation.
    PublishUnconfirmed,
}

/// Outcome of [`publish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handoff {
    /// The fence signalled and the surface was produced.
    Published,
    /// The fence timed out and the surface was produced regardless.
    PublishedUnconfirmed,
    /// The fence timed out and the surface was checked back in.
    Dropped,
}

impl Handoff {
    /// Whether the consumer will see this frame.
    pub fn is_visible(self) -> bool {
        !matches!(self, Handoff::Dropped)
    }
}

/// Wait for `token`, then move `surface` into the due list or back into
/// the pool according to `policy`.
pub fn publish<T: CompletionToken + ?Sized>(
    queue: &SurfaceQueue,
    surface: Surface,
    token: &T,
    timeout: Duration,
    policy: FencePolicy,
) -> Handoff {
    if wait_for_completion(token, timeout) {
        queue.produce(surface);
        return Handoff::Published;
    }

    match policy {
        FencePolicy::DropFrame => {
            log::warn!(
                "Completion fence for {} timed out after {timeout:?}; dropping frame",
                surface.share_handle()
            );
            queue.checkin(surface);
            Handoff::Dropped
        }
        FencePolicy::PublishUnconfirmed => {
            log::warn!(
                "Completion fence for {} timed out after {timeout:?}; publishing unconfirmed frame",
                surface.share_handle()
            );
            queue.produce(surface);
            Handoff::PublishedUnconfirmed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fence::SignalToken;
    use crate::surface::{ShareHandle, DEFAULT_WAIT};

    fn single() -> SurfaceQueue {
        SurfaceQueue::new([Surface::new(ShareHandle::new(), 8, 8)])
    }

    #[test]
    fn test_completed_fence_publishes() {
        let q = single();
        let s = q.checkout(DEFAULT_WAIT).unwrap();
        let h = s.share_handle();
        let out = publish(&q, s, &SignalToken::signaled(), DEFAULT_WAIT, FencePolicy::DropFrame);
        assert_eq!(out, Handoff::Published);
        assert_eq!(q.consume(DEFAULT_WAIT).unwrap().share_handle(), h);
    }

    #[test]
    fn test_timed_out_fence_drops_frame_by_default() {
        let q = single();
        let s = q.checkout(DEFAULT_WAIT).unwrap();
        let pending = SignalToken::new();
        let out = publish(&q, s, &pending, Duration::from_millis(10), FencePolicy::default());
        assert_eq!(out, Handoff::Dropped);
        assert!(!out.is_visible());
        assert_eq!(q.due_count(), 0);
        assert_eq!(q.free_count(), 1);
    }

    #[test]
    fn test_timed_out_fence_exposes_unconfirmed_frame_when_opted_in() {
        // The consumer receives a surface whose writes were never confirmed.
        let q = single();
        let s = q.checkout(DEFAULT_WAIT).unwrap();
        let pending = SignalToken::new();
        let out = publish(
            &q,
            s,
            &pending,
            Duration::from_millis(10),
            FencePolicy::PublishUnconfirmed,
        );
        assert_eq!(out, Handoff::PublishedUnconfirmed);
        assert!(out.is_visible());
        assert_eq!(q.due_count(), 1);
        assert!(!pending.is_complete());
    }
}
