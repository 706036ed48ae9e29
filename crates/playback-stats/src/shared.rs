//! Lazily started state shared by many subscribers.
//!
//! A [`SharedState`] runs one producer task while at least one
//! [`Subscription`] is attached. Every value the producer publishes is kept in
//! a last-value slot and broadcast to all subscribers; a new subscriber first
//! receives the slot's value. When the last subscriber detaches the producer
//! keeps running for a grace period, then it is cancelled and the slot is reset
//! to the initial value.

use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::Stream;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::StatisticsError;

/// Values that can be shared across subscribers.
pub trait SharedValue: Clone + PartialEq + Send + Sync + 'static {}

impl<T: Clone + PartialEq + Send + Sync + 'static> SharedValue for T {}

/// Starts the producer for one activation.
///
/// The returned future must finish once the token is cancelled.
pub type Producer<T> =
    Box<dyn Fn(Publisher<T>, CancellationToken) -> BoxFuture<'static, ()> + Send + Sync>;

struct Slot<T> {
    latest: T,
    /// `None` once the state is closed
    tx: Option<broadcast::Sender<T>>,
    subscribers: usize,
    /// Bumped on every attach; a scheduled stop only applies if unchanged
    attach_epoch: u64,
    /// Bumped on every start and stop; publishes from older activations are dropped
    generation: u64,
    running: Option<CancellationToken>,
}

struct Inner<T: SharedValue> {
    name: &'static str,
    initial: T,
    grace_period: Duration,
    producer: Producer<T>,
    parent: CancellationToken,
    slot: Mutex<Slot<T>>,
}

impl<T: SharedValue> Inner<T> {
    fn start_locked(self: &Arc<Self>, slot: &mut Slot<T>) {
        slot.generation += 1;
        let token = self.parent.child_token();
        slot.running = Some(token.clone());

        debug!(name = self.name, generation = slot.generation, "Starting producer");

        let publisher = Publisher {
            generation: slot.generation,
            inner: Arc::downgrade(self),
        };
        let producer = (self.producer)(publisher, token);
        let weak = Arc::downgrade(self);

        tokio::spawn(async move {
            producer.await;
            if let Some(inner) = weak.upgrade()
                && inner.parent.is_cancelled()
            {
                inner.close();
            }
        });
    }

    fn stop_locked(&self, slot: &mut Slot<T>) {
        if let Some(token) = slot.running.take() {
            token.cancel();
            debug!(name = self.name, generation = slot.generation, "Stopped producer");
        }
        slot.generation += 1;
        slot.latest = self.initial.clone();
    }

    fn detach(self: &Arc<Self>) {
        let mut slot = self.slot.lock();
        slot.subscribers = slot.subscribers.saturating_sub(1);
        if slot.subscribers > 0 || slot.running.is_none() {
            return;
        }

        if self.grace_period.is_zero() {
            self.stop_locked(&mut slot);
            return;
        }

        let epoch = slot.attach_epoch;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let weak = Arc::downgrade(self);
                let grace_period = self.grace_period;
                handle.spawn(async move {
                    tokio::time::sleep(grace_period).await;
                    if let Some(inner) = weak.upgrade() {
                        let mut slot = inner.slot.lock();
                        if slot.subscribers == 0 && slot.attach_epoch == epoch {
                            inner.stop_locked(&mut slot);
                        }
                    }
                });
            }
            // No runtime to wait on, stop right away.
            Err(_) => self.stop_locked(&mut slot),
        }
    }

    fn close(&self) {
        let mut slot = self.slot.lock();
        if slot.tx.is_none() {
            return;
        }
        self.stop_locked(&mut slot);
        slot.tx = None;
        debug!(name = self.name, "Closed");
    }
}

impl<T: SharedValue> Drop for Inner<T> {
    fn drop(&mut self) {
        if let Some(token) = self.slot.get_mut().running.take() {
            token.cancel();
        }
    }
}

/// Handle the producer publishes through.
pub struct Publisher<T: SharedValue> {
    generation: u64,
    inner: Weak<Inner<T>>,
}

impl<T: SharedValue> Publisher<T> {
    /// Publish a new value.
    ///
    /// Returns `false` if this producer's activation has ended; the value is
    /// discarded in that case. A value equal to the latest one is not
    /// re-broadcast.
    pub fn publish(&self, value: T) -> bool {
        let Some(inner) = self.inner.upgrade() else {
            return false;
        };
        let mut slot = inner.slot.lock();
        if slot.generation != self.generation {
            return false;
        }
        if slot.latest == value {
            return true;
        }

        slot.latest = value.clone();
        if let Some(tx) = &slot.tx {
            // No receivers is fine; the slot still holds the value.
            let _ = tx.send(value);
        }
        true
    }
}

/// Multicast state started on first subscription.
pub struct SharedState<T: SharedValue> {
    inner: Arc<Inner<T>>,
}

impl<T: SharedValue> SharedState<T> {
    /// Create a shared state that is closed together with `parent`.
    pub fn new(
        name: &'static str,
        initial: T,
        grace_period: Duration,
        capacity: usize,
        parent: &CancellationToken,
        producer: Producer<T>,
    ) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));

        Self {
            inner: Arc::new(Inner {
                name,
                initial: initial.clone(),
                grace_period,
                producer,
                parent: parent.clone(),
                slot: Mutex::new(Slot {
                    latest: initial,
                    tx: Some(tx),
                    subscribers: 0,
                    attach_epoch: 0,
                    generation: 0,
                    running: None,
                }),
            }),
        }
    }

    /// Attach a subscriber, starting the producer if needed.
    ///
    /// Must be called within a Tokio runtime.
    pub fn subscribe(&self) -> Result<Subscription<T>, StatisticsError> {
        if self.inner.parent.is_cancelled() {
            self.inner.close();
            return Err(StatisticsError::SessionClosed);
        }

        let mut slot = self.inner.slot.lock();
        let rx = match &slot.tx {
            Some(tx) => tx.subscribe(),
            None => return Err(StatisticsError::SessionClosed),
        };
        let latest = slot.latest.clone();
        slot.subscribers += 1;
        slot.attach_epoch += 1;

        if slot.running.is_none() {
            self.inner.start_locked(&mut slot);
        }

        Ok(Subscription {
            pending: Some(latest),
            rx,
            inner: Arc::clone(&self.inner),
        })
    }

    /// Latest value, or the initial value when not running.
    pub fn value(&self) -> T {
        self.inner.slot.lock().latest.clone()
    }

    pub fn is_active(&self) -> bool {
        self.inner.slot.lock().running.is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.slot.lock().subscribers
    }

    /// Stop the producer and end every subscription.
    pub fn close(&self) {
        self.inner.close();
    }
}

/// A live view of a [`SharedState`].
///
/// Dropping the subscription detaches it.
pub struct Subscription<T: SharedValue> {
    pending: Option<T>,
    rx: broadcast::Receiver<T>,
    inner: Arc<Inner<T>>,
}

impl<T: SharedValue> Subscription<T> {
    /// Receive the next value.
    ///
    /// The first call returns the value current at subscription time. Returns
    /// `None` once the state is closed.
    pub async fn recv(&mut self) -> Option<T> {
        if let Some(value) = self.pending.take() {
            return Some(value);
        }

        match self.rx.recv().await {
            Ok(value) => Some(value),
            Err(RecvError::Lagged(skipped)) => {
                debug!(name = self.inner.name, skipped, "Subscriber lagged, resyncing");
                let slot = self.inner.slot.lock();
                let tx = slot.tx.as_ref()?;
                self.rx = tx.subscribe();
                Some(slot.latest.clone())
            }
            Err(RecvError::Closed) => None,
        }
    }

    /// Latest published value, without waiting.
    pub fn latest(&self) -> T {
        self.inner.slot.lock().latest.clone()
    }

    pub fn into_stream(self) -> impl Stream<Item = T> {
        futures::stream::unfold(self, |mut subscription| async move {
            let value = subscription.recv().await?;
            Some((value, subscription))
        })
    }
}

impl<T: SharedValue> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.inner.detach();
    }
}
