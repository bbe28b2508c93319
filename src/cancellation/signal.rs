//! Cancellation signal with callback registration.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::error::{ClientError, ClientResult};

type Callback = Box<dyn FnOnce() + Send>;

/// Identifier of a registered callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

#[derive(Default)]
struct State {
    cancelled: bool,
    next_id: u64,
    callbacks: Vec<(CallbackId, Callback)>,
}

#[derive(Default)]
struct Inner {
    state: Mutex<State>,
}

/// A cooperative cancellation signal.
///
/// Clones share the same state: cancelling any clone cancels all of them.
#[derive(Clone, Default)]
pub struct CancellationSignal {
    inner: Arc<Inner>,
}

impl CancellationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` to run on cancellation.
    ///
    /// If the signal is already cancelled the callback runs right away, on
    /// the calling thread, and the returned registration is inert.
    pub fn register<F>(&self, callback: F) -> Registration
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.inner.state.lock();
        let id = CallbackId(state.next_id);
        state.next_id += 1;

        if state.cancelled {
            drop(state);
            callback();
            return Registration {
                id,
                signal: Weak::new(),
            };
        }

        state.callbacks.push((id, Box::new(callback)));
        Registration {
            id,
            signal: Arc::downgrade(&self.inner),
        }
    }

    /// Remove a callback. Returns false if it was not registered (anymore).
    pub fn unregister(&self, id: CallbackId) -> bool {
        self.inner.remove(id)
    }

    /// Cancel the signal and fire every registered callback once.
    ///
    /// Subsequent calls are no-ops.
    pub fn cancel(&self) {
        let callbacks = {
            let mut state = self.inner.state.lock();
            if state.cancelled {
                return;
            }
            state.cancelled = true;
            std::mem::take(&mut state.callbacks)
        };

        tracing::debug!(callbacks = callbacks.len(), "Cancellation signal fired");

        // Run outside the lock: callbacks may touch the signal again.
        for (_, callback) in callbacks {
            callback();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.state.lock().cancelled
    }

    /// Fail with [`ClientError::OperationCanceled`] iff the signal is cancelled.
    pub fn ensure_not_cancelled(&self) -> ClientResult<()> {
        if self.is_cancelled() {
            Err(ClientError::OperationCanceled)
        } else {
            Ok(())
        }
    }

    /// Resolve once the signal is cancelled.
    ///
    /// Dropping the future releases its registration.
    pub async fn cancelled(&self) {
        let notify = Arc::new(Notify::new());
        let waker = notify.clone();
        let _registration = self.register(move || waker.notify_one());
        notify.notified().await;
    }

    /// Number of callbacks currently waiting for cancellation.
    pub fn pending_callbacks(&self) -> usize {
        self.inner.state.lock().callbacks.len()
    }
}

impl Inner {
    fn remove(&self, id: CallbackId) -> bool {
        let mut state = self.state.lock();
        let before = state.callbacks.len();
        state.callbacks.retain(|(registered, _)| *registered != id);
        state.callbacks.len() != before
    }
}

impl fmt::Debug for CancellationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("CancellationSignal")
            .field("cancelled", &state.cancelled)
            .field("callbacks", &state.callbacks.len())
            .finish()
    }
}

/// A registered callback. Unregisters itself when dropped.
#[must_use = "dropping a Registration unregisters its callback"]
#[derive(Debug)]
pub struct Registration {
    id: CallbackId,
    signal: Weak<Inner>,
}

impl Registration {
    pub fn id(&self) -> CallbackId {
        self.id
    }

    /// Keep the callback registered for the lifetime of the signal.
    pub fn detach(mut self) -> CallbackId {
        self.signal = Weak::new();
        self.id
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Some(inner) = self.signal.upgrade() {
            inner.remove(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> Box<dyn FnOnce() + Send>) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let make = move || {
            let c = c.clone();
            Box::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }) as Box<dyn FnOnce() + Send>
        };
        (count, make)
    }

    #[test]
    fn test_register_after_cancel_fires_immediately() {
        let signal = CancellationSignal::new();
        signal.cancel();

        let (count, make) = counter();
        let registration = signal.register(make());
        assert_eq!(count.load(Ordering::SeqCst), 1);

        drop(registration);
        signal.cancel();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancel_fires_all_callbacks_once() {
        let signal = CancellationSignal::new();
        let (count, make) = counter();

        let registrations: Vec<_> = (0..5).map(|_| signal.register(make())).collect();
        assert_eq!(signal.pending_callbacks(), 5);

        signal.cancel();
        signal.cancel();
        assert_eq!(count.load(Ordering::SeqCst), 5);
        assert!(signal.is_cancelled());
        assert_eq!(signal.pending_callbacks(), 0);
        drop(registrations);
    }

    #[test]
    fn test_unregister() {
        let signal = CancellationSignal::new();
        let (count, make) = counter();

        let kept = signal.register(make());
        let removed = signal.register(make());
        assert!(signal.unregister(removed.id()));
        assert!(!signal.unregister(removed.id()));

        signal.cancel();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        drop(kept);
    }

    #[test]
    fn test_drop_unregisters_and_detach_keeps() {
        let signal = CancellationSignal::new();
        let (count, make) = counter();

        drop(signal.register(make()));
        assert_eq!(signal.pending_callbacks(), 0);

        let _id = signal.register(make()).detach();
        assert_eq!(signal.pending_callbacks(), 1);

        signal.cancel();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clones_share_state() {
        let signal = CancellationSignal::new();
        let observer = signal.clone();
        assert!(observer.ensure_not_cancelled().is_ok());

        signal.cancel();
        assert!(matches!(
            observer.ensure_not_cancelled(),
            Err(ClientError::OperationCanceled)
        ));
    }

    #[tokio::test]
    async fn test_cancelled_future() {
        let signal = CancellationSignal::new();
        let trigger = signal.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        tokio::time::timeout(Duration::from_secs(2), signal.cancelled())
            .await
            .expect("cancelled() should resolve");
        assert_eq!(signal.pending_callbacks(), 0);
    }
}
