//! Signal/slot system for Horizon Grid.
//!
//! Signals are how the selection core talks to the outside world: a row
//! marker changed, a node was selected, the selection as a whole changed.
//! Connected slots (closures) are invoked when a signal is emitted.
//!
//! # Key Types
//!
//! - [`Signal<Args>`] - The signal type
//! - [`ConnectionId`] - Returned when connecting a slot, used to disconnect it
//! - [`ConnectionGuard`] - Scoped connection, removed on drop
//!
//! # Delivery
//!
//! [`Signal::emit`] invokes every slot synchronously, in connection order.
//! [`Signal::emit_queued`] posts one task per slot to a [`TaskQueue`] instead;
//! the host drains that queue once the current event has been handled.
//!
//! # Example
//!
//! ```
//! use horizon_grid_core::Signal;
//!
//! let row_count_changed = Signal::<usize>::new();
//!
//! let conn_id = row_count_changed.connect(|count| {
//!     println!("Now showing {} rows", count);
//! });
//!
//! row_count_changed.emit(42);
//! row_count_changed.disconnect(conn_id);
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use slotmap::{new_key_type, SlotMap};

use crate::logging::targets;
use crate::task::TaskQueue;

new_key_type! {
    /// Key of one connected slot, passed back to [`Signal::disconnect`].
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;
type Connections<Args> = Mutex<SlotMap<ConnectionId, Connection<Args>>>;

/// A connected slot. Slot-map indices are reused after a disconnect, so
/// connection order is tracked separately.
struct Connection<Args> {
    seq: u64,
    slot: Slot<Args>,
}

/// A notification with any number of connected slots.
///
/// Slots receive `&Args`; signals without a payload use `()` and those with
/// several values use a tuple such as `(usize, Option<bool>)`.
///
/// Slots are snapshotted before they are invoked, so a slot may connect or
/// disconnect other slots on the same signal without deadlocking. Changes made
/// that way take effect from the next emission.
pub struct Signal<Args> {
    connections: Arc<Connections<Args>>,
    next_seq: AtomicU64,
    blocked: AtomicBool,
}

impl<Args: Clone + Send + 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: Clone + Send + 'static> Signal<Args> {
    /// Creates a signal with nothing connected.
    pub fn new() -> Self {
        Self {
            connections: Arc::new(Mutex::new(SlotMap::with_key())),
            next_seq: AtomicU64::new(0),
            blocked: AtomicBool::new(false),
        }
    }

    /// Connects `slot`. Slots run in connection order.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.connections.lock().insert(Connection {
            seq,
            slot: Arc::new(slot),
        })
    }

    /// Connect a slot that is disconnected when the returned guard is dropped.
    ///
    /// The guard only holds a weak handle to the connection list, so it may
    /// outlive the signal safely.
    ///
    /// ```
    /// use horizon_grid_core::Signal;
    /// use std::sync::atomic::{AtomicI32, Ordering};
    /// use std::sync::Arc;
    ///
    /// let signal = Signal::<i32>::new();
    /// let total = Arc::new(AtomicI32::new(0));
    /// {
    ///     let total = total.clone();
    ///     let _guard = signal.connect_scoped(move |&n| {
    ///         total.fetch_add(n, Ordering::SeqCst);
    ///     });
    ///     signal.emit(42);
    /// }
    /// signal.emit(43);
    /// assert_eq!(total.load(Ordering::SeqCst), 42);
    /// ```
    pub fn connect_scoped<F>(&self, slot: F) -> ConnectionGuard<Args>
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let id = self.connect(slot);
        ConnectionGuard {
            connections: Arc::downgrade(&self.connections),
            id,
        }
    }

    /// Removes one slot. Returns `false` if `id` was already gone.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    /// Removes every slot.
    pub fn disconnect_all(&self) {
        self.connections.lock().clear();
    }

    /// Number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Block signal emission temporarily.
    ///
    /// While blocked, calls to `emit()` and `emit_queued()` do nothing.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Check if signal emission is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Emit the signal, invoking all connected slots in the current thread.
    #[tracing::instrument(skip_all, target = "horizon_grid_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: targets::SIGNAL, "signal blocked, skipping emit");
            return;
        }

        let slots = self.snapshot();
        tracing::trace!(target: targets::SIGNAL, connection_count = slots.len(), "emitting signal");

        for slot in slots {
            slot(&args);
        }
    }

    /// Emit through a task queue instead of invoking slots now.
    ///
    /// One task is posted per connected slot; each receives its own clone of
    /// `args`. Returns the number of tasks posted, or 0 if the signal is
    /// blocked.
    pub fn emit_queued(&self, args: Args, queue: &TaskQueue) -> usize {
        if self.is_blocked() {
            return 0;
        }

        let slots = self.snapshot();
        let count = slots.len();
        for slot in slots {
            let args = args.clone();
            queue.post(move || slot(&args));
        }

        tracing::trace!(target: targets::SIGNAL, queued = count, "queued signal emission");
        count
    }

    fn snapshot(&self) -> Vec<Slot<Args>> {
        let mut connections: Vec<(u64, Slot<Args>)> = self
            .connections
            .lock()
            .values()
            .map(|connection| (connection.seq, connection.slot.clone()))
            .collect();
        connections.sort_unstable_by_key(|(seq, _)| *seq);
        connections.into_iter().map(|(_, slot)| slot).collect()
    }
}

/// A connection guard that automatically disconnects when dropped.
///
/// Created via [`Signal::connect_scoped`].
pub struct ConnectionGuard<Args> {
    connections: Weak<Connections<Args>>,
    id: ConnectionId,
}

impl<Args> ConnectionGuard<Args> {
    /// The id of the guarded connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl<Args> Drop for ConnectionGuard<Args> {
    fn drop(&mut self) {
        if let Some(connections) = self.connections.upgrade() {
            connections.lock().remove(self.id);
        }
    }
}
