//! Graph Elements
//!
//! This module defines the elements that live in the netlist arena.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use smallvec::SmallVec;

use super::link::LinkId;
use super::signal::Signal;
use crate::logic::Logic;

/// Stable identifier of an element: its index in the netlist arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ElementId(usize);

impl ElementId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the raw arena index.
    pub fn raw(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// The kind of element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// A value driven from outside the circuit. Always scheduled at level 0.
    Explicit,

    /// A free-running clock. Always scheduled at level 0.
    /// The output toggles every half period.
    Clock { period: Duration },

    /// A gate whose output depends only on its current inputs.
    Combinational,

    /// An element with internal state (latches, flip-flops, counters).
    Sequential,
}

impl ElementKind {
    /// Sources drive the circuit and have no inputs of their own.
    pub fn is_source(&self) -> bool {
        matches!(self, ElementKind::Explicit | ElementKind::Clock { .. })
    }
}

/// An element in the netlist.
#[derive(Debug)]
pub struct Element {
    id: ElementId,

    name: String,

    kind: ElementKind,

    /// Links feeding this element, in the order its logic expects them.
    /// The same link may appear more than once.
    inputs: SmallVec<[LinkId; 4]>,

    /// Links driven by this element.
    outputs: SmallVec<[LinkId; 2]>,

    /// Still a possible member of a feedback loop.
    /// Cleared once loop breaking proves every path out of here acyclic.
    loop_candidate: bool,

    /// On the current depth-first path.
    visited: bool,

    /// Current output value.
    value: Signal,

    /// Evaluation function. `None` for sources.
    logic: Option<Box<dyn Logic>>,
}

impl Element {
    /// Create a source (explicit input or clock).
    pub(crate) fn source(id: ElementId, name: String, kind: ElementKind, initial: bool) -> Self {
        debug_assert!(kind.is_source());
        Self::new(id, name, kind, Signal::new(initial), None)
    }

    /// Create a combinational or sequential element.
    pub(crate) fn with_logic(
        id: ElementId,
        name: String,
        kind: ElementKind,
        logic: Box<dyn Logic>,
    ) -> Self {
        debug_assert!(!kind.is_source());
        Self::new(id, name, kind, Signal::new(false), Some(logic))
    }

    fn new(
        id: ElementId,
        name: String,
        kind: ElementKind,
        value: Signal,
        logic: Option<Box<dyn Logic>>,
    ) -> Self {
        Self {
            id,
            name,
            kind,
            inputs: SmallVec::new(),
            outputs: SmallVec::new(),
            loop_candidate: true,
            visited: false,
            value,
            logic,
        }
    }

    /// Arena index of this element.
    pub fn id(&self) -> ElementId {
        self.id
    }

    /// Name given at construction, used in logs and errors.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// What drives this element.
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Whether this element is an explicit input or a clock.
    pub fn is_source(&self) -> bool {
        self.kind.is_source()
    }

    /// Input links, in evaluation order.
    pub fn inputs(&self) -> &[LinkId] {
        &self.inputs
    }

    /// Output links, in insertion order.
    pub fn outputs(&self) -> &[LinkId] {
        &self.outputs
    }

    /// The cell holding this element's current output value.
    pub fn value(&self) -> &Signal {
        &self.value
    }

    /// Whether loop breaking may still find a cycle through this element.
    pub fn loop_candidate(&self) -> bool {
        self.loop_candidate
    }

    /// Whether this element is on the current loop-breaking path.
    pub fn visited(&self) -> bool {
        self.visited
    }

    pub(crate) fn set_loop_candidate(&mut self, loop_candidate: bool) {
        self.loop_candidate = loop_candidate;
    }

    pub(crate) fn set_visited(&mut self, visited: bool) {
        self.visited = visited;
    }

    /// Reset traversal flags before a scheduling run.
    pub(crate) fn reset_traversal(&mut self) {
        self.loop_candidate = true;
        self.visited = false;
    }

    pub(crate) fn add_input(&mut self, link: LinkId) {
        self.inputs.push(link);
    }

    pub(crate) fn add_output(&mut self, link: LinkId) {
        self.outputs.push(link);
    }

    /// Remove the first occurrence of `link` from the inputs.
    ///
    /// Returns the position it was removed from.
    pub(crate) fn remove_input(&mut self, link: LinkId) -> Option<usize> {
        let slot = self.inputs.iter().position(|l| *l == link)?;
        self.inputs.remove(slot);
        Some(slot)
    }

    /// Put `link` back at `slot` (clamped to the current length).
    pub(crate) fn insert_input(&mut self, slot: usize, link: LinkId) {
        let slot = slot.min(self.inputs.len());
        self.inputs.insert(slot, link);
    }

    /// Compute the next output value.
    ///
    /// Sources have no logic; their value is driven by a clock task or an
    /// input handle and is returned unchanged.
    pub(crate) fn evaluate(&mut self, inputs: &[bool]) -> bool {
        match self.logic.as_mut() {
            Some(logic) => {
                let next = logic.evaluate(inputs);
                self.value.set(next);
                next
            }
            None => self.value.get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::Gate;

    fn gate(index: usize) -> Element {
        Element::with_logic(
            ElementId::new(index),
            format!("g{index}"),
            ElementKind::Combinational,
            Box::new(Gate::And),
        )
    }

    #[test]
    fn new_elements_are_loop_candidates() {
        let element = gate(0);
        assert!(element.loop_candidate());
        assert!(!element.visited());
    }

    #[test]
    fn sources_are_classified() {
        let input = Element::source(ElementId::new(0), "in".into(), ElementKind::Explicit, true);
        let clock = Element::source(
            ElementId::new(1),
            "clk".into(),
            ElementKind::Clock {
                period: Duration::from_millis(10),
            },
            false,
        );
        assert!(input.is_source());
        assert!(clock.is_source());
        assert!(!gate(2).is_source());
        assert!(input.value().get());
    }

    #[test]
    fn input_removal_and_reinsertion_keep_order() {
        let mut element = gate(0);
        let (a, b, c) = (LinkId::new(0), LinkId::new(1), LinkId::new(2));
        element.add_input(a);
        element.add_input(b);
        element.add_input(c);

        let slot = element.remove_input(b).unwrap();
        assert_eq!(slot, 1);
        assert_eq!(element.inputs(), &[a, c]);

        element.insert_input(slot, b);
        assert_eq!(element.inputs(), &[a, b, c]);
    }

    #[test]
    fn duplicate_input_removes_first_occurrence() {
        let mut element = gate(0);
        let (a, b) = (LinkId::new(0), LinkId::new(1));
        element.add_input(a);
        element.add_input(b);
        element.add_input(a);

        assert_eq!(element.remove_input(a), Some(0));
        assert_eq!(element.inputs(), &[b, a]);
        assert_eq!(element.remove_input(LinkId::new(9)), None);
    }

    #[test]
    fn source_evaluation_returns_driven_value() {
        let mut input = Element::source(ElementId::new(0), "in".into(), ElementKind::Explicit, false);
        input.value().set(true);
        assert!(input.evaluate(&[]));
    }

    #[test]
    fn logic_evaluation_updates_value() {
        let mut element = gate(0);
        assert!(element.evaluate(&[true, true]));
        assert!(element.value().get());
        assert!(!element.evaluate(&[true, false]));
        assert!(!element.value().get());
    }
}
