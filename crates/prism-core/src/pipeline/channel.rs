//! Bounded channels for backpressure in the processing pipeline.
//!
//! A [`BoundedChannel`] is a fixed-capacity FIFO shared by reference between
//! threads. `put` blocks while the channel is full, `get` blocks while it is
//! empty and still open. Closing never drops queued items: consumers keep
//! draining until the channel is both closed and empty, then every `get`
//! returns `None`.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

use crate::error::{PipelineError, PipelineResult};

/// Fixed-capacity, thread-safe FIFO hand-off with blocking put/get.
pub struct BoundedChannel<T> {
    state: Mutex<ChannelState<T>>,
    not_full: Condvar,
    not_empty: Condvar,
    capacity: usize,
}

struct ChannelState<T> {
    items: VecDeque<T>,
    closed: bool,
    high_water: usize,
}

impl<T> BoundedChannel<T> {
    /// Create an open channel holding at most `capacity` items.
    ///
    /// A zero capacity would deadlock the first `put`, so it is rejected.
    pub fn new(capacity: usize) -> PipelineResult<Self> {
        if capacity == 0 {
            return Err(PipelineError::InvalidCapacity { capacity });
        }
        Ok(Self {
            state: Mutex::new(ChannelState {
                items: VecDeque::with_capacity(capacity),
                closed: false,
                high_water: 0,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            capacity,
        })
    }

    /// Enqueue an item, blocking while the channel is full.
    ///
    /// Fails with [`PipelineError::ChannelClosed`] if the channel is closed
    /// before space becomes available; the item is dropped in that case.
    pub fn put(&self, item: T) -> PipelineResult<()> {
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return Err(PipelineError::ChannelClosed);
            }
            if state.items.len() < self.capacity {
                break;
            }
            self.not_full.wait(&mut state);
        }

        state.items.push_back(item);
        state.high_water = state.high_water.max(state.items.len());
        drop(state);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Dequeue the oldest item, blocking while the channel is empty and open.
    ///
    /// Returns `None` once the channel is closed and fully drained.
    pub fn get(&self) -> Option<T> {
        let mut state = self.state.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                drop(state);
                self.not_full.notify_one();
                return Some(item);
            }
            if state.closed {
                return None;
            }
            self.not_empty.wait(&mut state);
        }
    }

    /// Close the channel. Idempotent.
    ///
    /// Wakes every blocked caller: pending puts fail, pending gets drain what
    /// is left and then observe closure.
    pub fn close(&self) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        drop(state);
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }

    /// Current number of queued items.
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    /// True if no item is queued.
    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    /// True once `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Maximum number of queued items.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Highest occupancy observed since construction.
    pub fn high_water_mark(&self) -> usize {
        self.state.lock().high_water
    }
}

impl<T> std::fmt::Debug for BoundedChannel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("BoundedChannel")
            .field("capacity", &self.capacity)
            .field("len", &state.items.len())
            .field("closed", &state.closed)
            .finish()
    }
}
