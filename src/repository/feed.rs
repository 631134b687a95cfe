//! In-process change notification used for push-style reads.
//!
//! A [`ChangeFeed`] keeps a list of listeners and hands every published
//! snapshot to each of them. Registering returns a [`Subscription`] guard;
//! the listener stays attached exactly as long as the guard is alive.
//!
//! Snapshots taken through [`ChangeFeed::refresh`] and
//! [`ChangeFeed::subscribe_with`] are loaded and delivered one at a time, so
//! a listener never receives an older snapshot after a newer one. Listeners
//! must not write through the owner of the feed while being notified.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

type Listener<T> = Arc<dyn Fn(&[T]) + Send + Sync>;

struct Listeners<T> {
    next_id: u64,
    entries: Vec<(u64, Listener<T>)>,
}

/// Fan-out of full collection snapshots to registered listeners.
pub struct ChangeFeed<T> {
    listeners: Mutex<Listeners<T>>,
    /// Held from loading a snapshot until it has been delivered.
    updates: Mutex<()>,
}

impl<T> fmt::Debug for ChangeFeed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeFeed")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl<T: 'static> ChangeFeed<T> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            listeners: Mutex::new(Listeners {
                next_id: 0,
                entries: Vec::new(),
            }),
            updates: Mutex::new(()),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Listeners<T>> {
        // A listener that panicked must not take the whole feed down with it.
        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_updates(&self) -> MutexGuard<'_, ()> {
        self.updates
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Attach `listener` and return the guard that keeps it attached.
    pub fn register<F>(self: &Arc<Self>, listener: F) -> Subscription
    where
        F: Fn(&[T]) + Send + Sync + 'static,
    {
        let id = {
            let mut listeners = self.lock();
            let id = listeners.next_id;
            listeners.next_id += 1;
            listeners.entries.push((id, Arc::new(listener)));
            id
        };

        let feed: Weak<Self> = Arc::downgrade(self);
        Subscription::new(move || {
            if let Some(feed) = feed.upgrade() {
                feed.lock().entries.retain(|(entry_id, _)| *entry_id != id);
            }
        })
    }

    /// Hand `snapshot` to every attached listener.
    ///
    /// Listeners run outside the registry lock, so they may subscribe or drop
    /// subscriptions while being notified.
    pub fn publish(&self, snapshot: &[T]) {
        let listeners: Vec<Listener<T>> = self
            .lock()
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener(snapshot);
        }
    }

    /// Load a fresh snapshot with `load` and publish it.
    ///
    /// Refreshes run one after another, each loading after the previous one
    /// was delivered. Nothing is loaded while no listener is attached.
    pub fn refresh<E, L>(&self, load: L) -> Result<(), E>
    where
        L: FnOnce() -> Result<Vec<T>, E>,
    {
        let _updates = self.lock_updates();
        if !self.has_listeners() {
            return Ok(());
        }

        let snapshot = load()?;
        self.publish(&snapshot);
        Ok(())
    }

    /// Attach `listener` and hand it the snapshot returned by `load` before
    /// any later refresh reaches it.
    ///
    /// When `load` fails the listener is detached again and the error returned.
    pub fn subscribe_with<F, E, L>(
        self: &Arc<Self>,
        listener: F,
        load: L,
    ) -> Result<Subscription, E>
    where
        F: Fn(&[T]) + Send + Sync + 'static,
        L: FnOnce() -> Result<Vec<T>, E>,
    {
        let _updates = self.lock_updates();

        let listener: Listener<T> = Arc::new(listener);
        let attached = Arc::clone(&listener);
        let subscription = self.register(move |snapshot: &[T]| attached(snapshot));

        match load() {
            Ok(snapshot) => {
                listener(&snapshot);
                Ok(subscription)
            }
            Err(err) => {
                subscription.unsubscribe();
                Err(err)
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn has_listeners(&self) -> bool {
        self.listener_count() > 0
    }
}

/// Guard returned by every subscribe call. Dropping it detaches the listener.
#[must_use = "dropping a subscription immediately detaches its listener"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    fn new(release: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A guard with nothing attached, returned when subscribing failed.
    pub fn detached() -> Self {
        Self { release: None }
    }

    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }

    /// Detach the listener now instead of at the end of the scope.
    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
