//! GPU-to-host completion waiting.
//!
//! Command submission is asynchronous with respect to host code, so a
//! producer must confirm that its writes have landed before handing a
//! surface over. Backends expose that as a [`CompletionToken`];
//! [`wait_for_completion`] bounds the wait.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Bound on a completion wait before the frame is treated as unconfirmed.
pub const FENCE_TIMEOUT: Duration = Duration::from_secs(1);

/// Something that eventually reports that submitted GPU work has finished.
///
/// `is_complete` may drive the backend (e.g. poll a device) and must be
/// cheap enough to call in a tight loop.
pub trait CompletionToken {
    fn is_complete(&self) -> bool;
}

impl<T: CompletionToken + ?Sized> CompletionToken for &T {
    fn is_complete(&self) -> bool {
        (**self).is_complete()
    }
}

/// Poll `token` until it signals or `timeout` elapses.
///
/// Yields the thread every other iteration. Returns `false` on timeout.
pub fn wait_for_completion<T: CompletionToken + ?Sized>(token: &T, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    let mut spins: u64 = 0;
    loop {
        if token.is_complete() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        spins += 1;
        if spins % 2 == 0 {
            thread::yield_now();
        }
    }
}

/// A flag-backed token, signalled from any thread.
///
/// Backends hand a clone to whatever callback reports completion.
#[derive(Debug, Clone, Default)]
pub struct SignalToken {
    done: Arc<AtomicBool>,
}

impl SignalToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that has already completed.
    pub fn signaled() -> Self {
        let token = Self::new();
        token.signal();
        token
    }

    pub fn signal(&self) {
        self.done.store(true, Ordering::Release);
    }
}

impl CompletionToken for SignalToken {
    fn is_complete(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Never;

    impl CompletionToken for Never {
        fn is_complete(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_signaled_token_returns_immediately() {
        let started = Instant::now();
        assert!(wait_for_completion(&SignalToken::signaled(), FENCE_TIMEOUT));
        assert!(started.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn test_never_completing_token_times_out() {
        let started = Instant::now();
        assert!(!wait_for_completion(&Never, Duration::from_millis(30)));
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_signal_from_another_thread() {
        let token = SignalToken::new();
        let remote = token.clone();
        let signaller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            remote.signal();
        });
        assert!(wait_for_completion(&token, Duration::from_secs(5)));
        signaller.join().unwrap();
    }

    #[test]
    fn test_works_through_trait_object() {
        let token: Box<dyn CompletionToken> = Box::new(SignalToken::signaled());
        assert!(wait_for_completion(token.as_ref(), Duration::ZERO));
    }
}
