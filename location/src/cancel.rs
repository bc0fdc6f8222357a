use std::fmt;

use tokio_util::sync::{CancellationToken, DropGuard};

/// Platform resources held by an in-flight single request.
///
/// Returned by [`crate::LocationProvider::request_current`]. Releasing it
/// withdraws the request from the OS if it is still pending.
pub trait Release: Send {
    /// Gives the resources back.
    fn release(self: Box<Self>);
}

/// Nothing to give back.
impl Release for () {
    fn release(self: Box<Self>) {}
}

/// Scope of one single request.
///
/// Dropping it cancels the request's token and releases the provider's
/// resources, both exactly once, on every exit path.
pub struct RequestGuard {
    release: Option<Box<dyn Release>>,
    _cancel: DropGuard,
}

impl RequestGuard {
    /// Guards `token` and the provider's `release` hook.
    #[must_use]
    pub fn new(token: CancellationToken, release: Box<dyn Release>) -> Self {
        Self {
            release: Some(release),
            _cancel: token.drop_guard(),
        }
    }
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release.release();
        }
    }
}

impl fmt::Debug for RequestGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestGuard").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct Counted(Arc<AtomicUsize>);

    impl Release for Counted {
        fn release(self: Box<Self>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn drop_cancels_token_and_releases_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let token = CancellationToken::new();

        let guard = RequestGuard::new(token.clone(), Box::new(Counted(count.clone())));
        assert!(!token.is_cancelled());
        assert_eq!(count.load(Ordering::SeqCst), 0);

        drop(guard);
        assert!(token.is_cancelled());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unit_release_is_a_no_op() {
        let token = CancellationToken::new();
        drop(RequestGuard::new(token.clone(), Box::new(())));
        assert!(token.is_cancelled());
    }
}
