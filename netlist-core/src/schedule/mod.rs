//! Evaluation Scheduling
//!
//! Turns a possibly cyclic netlist into an ordered list of levels.
//!
//! # Pipeline
//!
//! 1. Validate the graph's structural preconditions.
//! 2. Break every feedback loop reachable from level 0, recording each cut.
//! 3. Levelize the now acyclic graph (exact or real-time).
//! 4. Restore every cut edge so the run-time graph equals the original.
//!
//! Scheduling is single-threaded and runs to completion before any clock or
//! evaluation thread exists. It can be repeated; the result depends only on
//! the graph and its construction order.

mod levelizer;
mod loop_breaker;

pub use levelizer::levelize;
pub use loop_breaker::{break_loops, SeveredEdge, SeveredEdges};

use serde::Serialize;

use crate::config::LevelizeMode;
use crate::error::Result;
use crate::graph::{ElementId, Netlist};

/// The evaluation order computed for a circuit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schedule {
    mode: LevelizeMode,

    /// Elements per level; level 0 first.
    levels: Vec<Vec<ElementId>>,

    /// Feedback edges that were cut during levelization (already restored).
    severed: Vec<SeveredEdge>,

    /// Elements not reachable from level 0. These are never evaluated.
    unscheduled: Vec<ElementId>,
}

impl Schedule {
    /// The levelization mode this schedule was built with.
    pub fn mode(&self) -> LevelizeMode {
        self.mode
    }

    /// Levels in evaluation order; level 0 holds the inputs and clocks.
    pub fn levels(&self) -> &[Vec<ElementId>] {
        &self.levels
    }

    /// Number of levels.
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Number of scheduled elements across all levels.
    pub fn element_count(&self) -> usize {
        self.levels.iter().map(Vec::len).sum()
    }

    /// The level an element was assigned to.
    pub fn level_of(&self, element: ElementId) -> Option<usize> {
        self.levels
            .iter()
            .position(|level| level.contains(&element))
    }

    /// Edges cut to break feedback loops, in removal order.
    pub fn severed(&self) -> &[SeveredEdge] {
        &self.severed
    }

    /// Elements that are never evaluated.
    pub fn unscheduled(&self) -> &[ElementId] {
        &self.unscheduled
    }

    /// Dump the schedule as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Compute the evaluation schedule of a netlist.
///
/// The netlist is left structurally identical to how it was passed in.
pub fn build_schedule(netlist: &mut Netlist, mode: LevelizeMode) -> Result<Schedule> {
    netlist.validate()?;

    let mut severed = break_loops(netlist)?;
    for (link, destinations) in severed.by_link() {
        tracing::debug!(%link, ?destinations, "feedback edges cut");
    }

    let levels = levelize(netlist, mode)?;
    let cut: Vec<SeveredEdge> = severed.iter().copied().collect();
    severed.restore(netlist)?;

    let mut placed = vec![false; netlist.elements().len()];
    for id in levels.iter().flatten() {
        placed[id.raw()] = true;
    }
    let unscheduled: Vec<ElementId> = netlist
        .elements()
        .iter()
        .map(|element| element.id())
        .filter(|id| !placed[id.raw()])
        .collect();

    if !unscheduled.is_empty() {
        tracing::warn!(
            count = unscheduled.len(),
            "elements not reachable from any input or clock will not be evaluated"
        );
    }

    let schedule = Schedule {
        mode,
        levels,
        severed: cut,
        unscheduled,
    };

    tracing::debug!(
        mode = %mode,
        levels = schedule.level_count(),
        elements = schedule.element_count(),
        severed = schedule.severed.len(),
        "schedule built"
    );

    Ok(schedule)
}
