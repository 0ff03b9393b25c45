//! Signal Links
//!
//! A link is a directed edge with a single producer and any number of
//! consumers. The order of its destinations is significant: levelization
//! walks them in that order, so it decides which elements land in a level
//! first and which edge is cut on an ambiguous cycle.

use std::fmt;

use serde::Serialize;
use smallvec::SmallVec;

use super::element::ElementId;
use super::signal::Signal;

/// Stable identifier of a link: its index in the netlist arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LinkId(usize);

impl LinkId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the raw arena index.
    pub fn raw(&self) -> usize {
        self.0
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "l{}", self.0)
    }
}

/// A link in the netlist.
#[derive(Debug)]
pub struct Link {
    id: LinkId,

    /// The element driving this link.
    source: ElementId,

    /// Elements reading this link, in insertion order.
    destinations: SmallVec<[ElementId; 4]>,

    /// Exact levelization: the producer has been placed in a level.
    valid: bool,

    /// Value carried by the link.
    signal: Signal,
}

impl Link {
    pub(crate) fn new(id: LinkId, source: ElementId) -> Self {
        Self {
            id,
            source,
            destinations: SmallVec::new(),
            valid: false,
            signal: Signal::new(false),
        }
    }

    /// Arena index of this link.
    pub fn id(&self) -> LinkId {
        self.id
    }

    /// The single element driving this link.
    pub fn source(&self) -> ElementId {
        self.source
    }

    /// Elements fed by this link, in order.
    pub fn destinations(&self) -> &[ElementId] {
        &self.destinations
    }

    /// Whether the producer has been placed during exact levelization.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub(crate) fn set_valid(&mut self, valid: bool) {
        self.valid = valid;
    }

    /// The cell holding the value carried by this link.
    pub fn signal(&self) -> &Signal {
        &self.signal
    }

    pub(crate) fn add_destination(&mut self, element: ElementId) {
        self.destinations.push(element);
    }

    /// Remove the destination at `slot`, keeping the others in order.
    pub(crate) fn remove_destination(&mut self, slot: usize) -> ElementId {
        self.destinations.remove(slot)
    }

    /// Put a destination back at `slot` (clamped to the current length).
    pub(crate) fn insert_destination(&mut self, slot: usize, element: ElementId) {
        let slot = slot.min(self.destinations.len());
        self.destinations.insert(slot, element);
    }
}
