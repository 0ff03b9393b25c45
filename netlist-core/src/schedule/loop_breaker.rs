//! Loop Breaker
//!
//! Cuts feedback edges reachable from the level-0 elements so that the
//! levelizer sees an acyclic graph.
//!
//! # Algorithm
//!
//! Depth-first search from every root, with an explicit stack so that graph
//! depth is bounded only by memory:
//!
//! 1. A frame holds the element and two cursors: the output link being
//!    walked and the destination on that link.
//! 2. Elements whose `loop_candidate` flag is cleared are skipped.
//! 3. Reaching an element already on the current path is a back edge. That
//!    single edge is removed and recorded, and the whole search unwinds.
//! 4. An element whose outputs are exhausted without finding a back edge is
//!    acyclic from here on: its `loop_candidate` flag is cleared for good.
//!
//! The driver rescans all roots after every cut and stops after a scan that
//! cuts nothing. Each scan cuts at most one edge, so the number of scans is
//! bounded by the number of edges plus one.

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{CircuitError, Result};
use crate::graph::{ElementId, LinkId, Netlist};

/// One edge removed to break a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeveredEdge {
    pub link: LinkId,
    pub destination: ElementId,
    /// Position of the destination in the link's destination list.
    pub destination_slot: usize,
    /// Position of the link in the destination's input list.
    pub input_slot: usize,
}

/// Edges removed by the most recent loop-breaking pass, in removal order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeveredEdges {
    log: Vec<SeveredEdge>,
}

impl SeveredEdges {
    /// Number of removed edges.
    pub fn len(&self) -> usize {
        self.log.len()
    }

    /// Whether no edge was removed.
    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// Removed edges in removal order.
    pub fn iter(&self) -> impl Iterator<Item = &SeveredEdge> {
        self.log.iter()
    }

    /// Removed destinations grouped by link, in removal order.
    pub fn by_link(&self) -> IndexMap<LinkId, Vec<ElementId>> {
        let mut grouped: IndexMap<LinkId, Vec<ElementId>> = IndexMap::new();
        for edge in &self.log {
            grouped.entry(edge.link).or_default().push(edge.destination);
        }
        grouped
    }

    fn record(&mut self, edge: SeveredEdge) {
        self.log.push(edge);
    }

    /// Put every removed edge back where it was and empty the table.
    ///
    /// Edges are reinstated in reverse removal order at their recorded
    /// positions, which reproduces the original destination and input lists
    /// exactly.
    pub fn restore(&mut self, netlist: &mut Netlist) -> Result<usize> {
        let restored = self.log.len();
        for edge in self.log.drain(..).rev() {
            netlist.insert_edge(
                edge.link,
                edge.destination,
                edge.destination_slot,
                edge.input_slot,
            )?;
        }
        Ok(restored)
    }
}

/// Resumable DFS state for one element.
#[derive(Debug, Clone, Copy)]
struct Frame {
    element: ElementId,
    output: usize,
    destination: usize,
}

impl Frame {
    fn new(element: ElementId) -> Self {
        Self {
            element,
            output: 0,
            destination: 0,
        }
    }
}

/// What the frame on top of the stack does next.
enum Step {
    Descend(ElementId),
    BackEdge { link: LinkId, slot: usize },
    Exhausted,
}

/// Remove feedback edges until no cycle is reachable from the roots.
///
/// Traversal flags are reset first, so calling this on a restored graph
/// repeats the same cuts.
pub fn break_loops(netlist: &mut Netlist) -> Result<SeveredEdges> {
    netlist.reset_traversal();

    let roots = netlist.roots().to_vec();
    let edges = netlist.edge_count();
    let mut severed = SeveredEdges::default();
    let mut scans = 0;

    loop {
        scans += 1;
        if scans > edges + 1 {
            return Err(CircuitError::LoopBreakingDiverged { scans, edges });
        }

        let mut broken = false;
        for &root in &roots {
            if break_first_cycle(netlist, root, &mut severed)? {
                broken = true;
                break;
            }
        }

        if !broken {
            break;
        }
    }

    tracing::debug!(severed = severed.len(), scans, "loop breaking finished");
    Ok(severed)
}

/// Search depth-first from `root` and cut the first back edge found.
///
/// Returns whether an edge was cut.
fn break_first_cycle(
    netlist: &mut Netlist,
    root: ElementId,
    severed: &mut SeveredEdges,
) -> Result<bool> {
    let mut stack = vec![Frame::new(root)];
    let mut broken = false;

    while let Some(top) = stack.last().map(|frame| frame.element) {
        if broken || !netlist.element(top)?.loop_candidate() {
            netlist.element_mut(top)?.set_visited(false);
            stack.pop();
            if let Some(parent) = stack.last_mut() {
                parent.destination += 1;
            }
            continue;
        }

        netlist.element_mut(top)?.set_visited(true);

        let step = match stack.last_mut() {
            Some(frame) => next_step(netlist, frame)?,
            None => break,
        };

        match step {
            Step::Descend(destination) => stack.push(Frame::new(destination)),
            Step::BackEdge { link, slot } => {
                let (destination, input_slot) = netlist.remove_edge(link, slot)?;
                tracing::debug!(
                    %link,
                    from = %top,
                    to = %destination,
                    "severed feedback edge"
                );
                severed.record(SeveredEdge {
                    link,
                    destination,
                    destination_slot: slot,
                    input_slot,
                });

                netlist.element_mut(top)?.set_visited(false);
                stack.pop();
                broken = true;
            }
            Step::Exhausted => {
                let element = netlist.element_mut(top)?;
                element.set_visited(false);
                element.set_loop_candidate(false);
                stack.pop();
                if let Some(parent) = stack.last_mut() {
                    parent.destination += 1;
                }
            }
        }
    }

    Ok(broken)
}

/// Advance the frame's cursors to the next destination and classify it.
fn next_step(netlist: &Netlist, frame: &mut Frame) -> Result<Step> {
    let element = netlist.element(frame.element)?;

    while let Some(&link_id) = element.outputs().get(frame.output) {
        let link = netlist.link(link_id)?;
        match link.destinations().get(frame.destination) {
            Some(&destination) => {
                if netlist.element(destination)?.visited() {
                    return Ok(Step::BackEdge {
                        link: link_id,
                        slot: frame.destination,
                    });
                }
                return Ok(Step::Descend(destination));
            }
            None => {
                frame.output += 1;
                frame.destination = 0;
            }
        }
    }

    Ok(Step::Exhausted)
}
