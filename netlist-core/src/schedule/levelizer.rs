//! Levelizer
//!
//! Partitions the elements reachable from level 0 into ordered levels. The
//! evaluation loop walks the levels in order, so in exact mode every element
//! is evaluated after all of its producers.
//!
//! Level 0 holds the explicit inputs and clocks in insertion order. Level
//! `k + 1` is built by walking the output links of level `k` in order:
//!
//! - exact mode promotes a destination only when every one of its input
//!   links is marked valid, i.e. every producer already sits at a level
//!   `<= k` (Kahn-style readiness);
//! - real-time mode promotes every destination that has not been placed yet.
//!
//! Levelization expects feedback edges to have been removed already.

use indexmap::IndexSet;

use crate::config::LevelizeMode;
use crate::error::Result;
use crate::graph::{ElementId, Netlist};

/// Assign every reachable element to exactly one level.
pub fn levelize(netlist: &mut Netlist, mode: LevelizeMode) -> Result<Vec<Vec<ElementId>>> {
    netlist.reset_validity();

    let mut placed = vec![false; netlist.elements().len()];
    let mut levels: Vec<IndexSet<ElementId>> = Vec::new();

    let roots: IndexSet<ElementId> = netlist.roots().iter().copied().collect();
    for root in &roots {
        placed[root.raw()] = true;
    }
    levels.push(roots);

    let mut level = 0;
    while level < levels.len() {
        if mode == LevelizeMode::Exact {
            mark_outputs_valid(netlist, &levels[level])?;
        }

        let next = expand_level(netlist, &levels[level], mode, &mut placed)?;
        if !next.is_empty() {
            levels.push(next);
        }
        level += 1;
    }

    Ok(levels
        .into_iter()
        .map(|level| level.into_iter().collect())
        .collect())
}

fn mark_outputs_valid(netlist: &mut Netlist, level: &IndexSet<ElementId>) -> Result<()> {
    for &id in level {
        let outputs = netlist.element(id)?.outputs().to_vec();
        for link in outputs {
            netlist.link_mut(link)?.set_valid(true);
        }
    }
    Ok(())
}

fn expand_level(
    netlist: &Netlist,
    level: &IndexSet<ElementId>,
    mode: LevelizeMode,
    placed: &mut [bool],
) -> Result<IndexSet<ElementId>> {
    let mut next = IndexSet::new();

    for &id in level {
        for &link_id in netlist.element(id)?.outputs() {
            for &destination in netlist.link(link_id)?.destinations() {
                if placed[destination.raw()] {
                    continue;
                }
                if mode == LevelizeMode::Exact && !inputs_ready(netlist, destination)? {
                    continue;
                }
                placed[destination.raw()] = true;
                next.insert(destination);
            }
        }
    }

    Ok(next)
}

fn inputs_ready(netlist: &Netlist, element: ElementId) -> Result<bool> {
    for &link in netlist.element(element)?.inputs() {
        if !netlist.link(link)?.is_valid() {
            return Ok(false);
        }
    }
    Ok(true)
}
