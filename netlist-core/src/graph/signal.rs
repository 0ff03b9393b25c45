//! Signal Values
//!
//! A `Signal` is the value cell carried by every element output and every
//! link. It is the only piece of graph state shared between threads once a
//! circuit is running: the evaluation loop, the clock tasks, and any probes
//! held by the caller all read and write through it.
//!
//! # Thread Safety
//!
//! The value lives in an `AtomicBool` behind an `Arc`. Stores use `Release`
//! and loads use `Acquire`, so a write made by a clock task is visible to the
//! next read on the evaluation thread and a reader can never observe a
//! partial value.
//!
//! Cloning a signal shares the underlying cell. The graph guarantees that
//! each cell has exactly one writer; clones handed out to callers are either
//! read-only (`Probe`) or the designated writer (`InputHandle`).

use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A shared boolean value cell.
#[derive(Clone, Default)]
pub struct Signal {
    value: Arc<AtomicBool>,
}

impl Signal {
    /// Create a new signal with the given initial value.
    pub fn new(value: bool) -> Self {
        Self {
            value: Arc::new(AtomicBool::new(value)),
        }
    }

    /// Get the current value.
    pub fn get(&self) -> bool {
        self.value.load(Ordering::Acquire)
    }

    /// Publish a new value.
    pub fn set(&self, value: bool) {
        self.value.store(value, Ordering::Release);
    }

    /// Invert the value and return the new one.
    pub fn toggle(&self) -> bool {
        !self.value.fetch_xor(true, Ordering::AcqRel)
    }
}

impl Debug for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Signal").field(&self.get()).finish()
    }
}

/// Read-only view of an element output or a link value.
#[derive(Clone, Debug)]
pub struct Probe {
    signal: Signal,
}

impl Probe {
    pub(crate) fn new(signal: Signal) -> Self {
        Self { signal }
    }

    /// Current value.
    pub fn get(&self) -> bool {
        self.signal.get()
    }
}

/// Write access to the value of an explicit input element.
///
/// The evaluation loop copies this value onto the input's output links on
/// every pass.
#[derive(Clone, Debug)]
pub struct InputHandle {
    signal: Signal,
}

impl InputHandle {
    pub(crate) fn new(signal: Signal) -> Self {
        Self { signal }
    }

    /// Current value of the input.
    pub fn get(&self) -> bool {
        self.signal.get()
    }

    /// Drive the input to a new value.
    pub fn set(&self, value: bool) {
        self.signal.set(value);
    }

    /// Invert the input.
    pub fn toggle(&self) -> bool {
        self.signal.toggle()
    }
}
