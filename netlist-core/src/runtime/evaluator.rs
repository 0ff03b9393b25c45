//! Evaluation Loop
//!
//! Re-evaluates the whole circuit, level by level, forever. One pass calls
//! every scheduled element's logic exactly once and then hands control to the
//! debugger hook.
//!
//! The evaluator owns the netlist for the lifetime of the simulation, so the
//! graph structure and element state need no locking. The only values shared
//! with other threads are `Signal`s: clock and input values written
//! elsewhere and read here, and element/link values written here and read by
//! probes.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use smallvec::SmallVec;

use super::debugger::Debugger;
use crate::graph::{ElementId, Netlist};

pub(crate) struct Evaluator {
    netlist: Netlist,
    levels: Vec<Vec<ElementId>>,
    debugger: Box<dyn Debugger>,
    passes: Arc<AtomicU64>,
    shutdown: Arc<AtomicBool>,
}

impl Evaluator {
    pub(crate) fn new(
        netlist: Netlist,
        levels: Vec<Vec<ElementId>>,
        debugger: Box<dyn Debugger>,
        passes: Arc<AtomicU64>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            netlist,
            levels,
            debugger,
            passes,
            shutdown,
        }
    }

    /// Evaluate every scheduled element once, in level order.
    pub(crate) fn evaluate_pass(&mut self) {
        let Self {
            netlist, levels, ..
        } = self;
        let (elements, links) = netlist.parts_mut();
        let mut inputs: SmallVec<[bool; 8]> = SmallVec::new();

        for id in levels.iter().flatten() {
            let Some(element) = elements.get_mut(id.raw()) else {
                continue;
            };

            inputs.clear();
            inputs.extend(element.inputs().iter().map(|link| {
                links
                    .get(link.raw())
                    .map(|link| link.signal().get())
                    .unwrap_or(false)
            }));

            let value = element.evaluate(&inputs);

            for output in element.outputs() {
                if let Some(link) = links.get(output.raw()) {
                    link.signal().set(value);
                }
            }
        }
    }

    /// Run passes until shutdown is requested.
    pub(crate) fn run(mut self) {
        tracing::info!(levels = self.levels.len(), "evaluation loop started");

        while !self.shutdown.load(Ordering::Acquire) {
            self.evaluate_pass();
            let pass = self.passes.fetch_add(1, Ordering::AcqRel) + 1;
            tracing::trace!(pass, "pass complete");
            self.debugger.step();
        }

        tracing::info!(
            passes = self.passes.load(Ordering::Acquire),
            "evaluation loop stopped"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LevelizeMode;
    use crate::graph::ElementKind;
    use crate::logic::Gate;
    use crate::runtime::NoDebugger;
    use crate::schedule::build_schedule;

    fn build_evaluator(mut netlist: Netlist, mode: LevelizeMode) -> Evaluator {
        let schedule = build_schedule(&mut netlist, mode).unwrap();
        Evaluator::new(
            netlist,
            schedule.levels().to_vec(),
            Box::new(NoDebugger),
            Arc::new(AtomicU64::new(0)),
            Arc::new(AtomicBool::new(false)),
        )
    }

    #[test]
    fn chain_settles_in_one_exact_pass() {
        let mut netlist = Netlist::new();
        let a = netlist.add_source("a", ElementKind::Explicit, true);
        let b = netlist.add_source("b", ElementKind::Explicit, true);
        let and = netlist.add_logic("and", ElementKind::Combinational, Box::new(Gate::And));
        let not = netlist.add_logic("not", ElementKind::Combinational, Box::new(Gate::Not));
        netlist.connect(a, and).unwrap();
        netlist.connect(b, and).unwrap();
        netlist.connect(and, not).unwrap();
        let a_value = netlist.element(a).unwrap().value().clone();
        let not_value = netlist.element(not).unwrap().value().clone();
        not_value.set(true);

        let mut evaluator = build_evaluator(netlist, LevelizeMode::Exact);
        evaluator.evaluate_pass();
        assert!(!not_value.get());

        a_value.set(false);
        evaluator.evaluate_pass();
        assert!(not_value.get());
    }

    #[test]
    fn sources_copy_their_value_to_links() {
        let mut netlist = Netlist::new();
        let a = netlist.add_source("a", ElementKind::Explicit, true);
        let buf = netlist.add_logic("buf", ElementKind::Combinational, Box::new(Gate::Buffer));
        let link = netlist.connect(a, buf).unwrap();
        let link_value = netlist.link(link).unwrap().signal().clone();

        let mut evaluator = build_evaluator(netlist, LevelizeMode::Exact);
        assert!(!link_value.get());
        evaluator.evaluate_pass();
        assert!(link_value.get());
    }

    #[test]
    fn feedback_uses_previous_pass_value() {
        // a = OR(in, b), b = BUF(a): once a goes high it latches.
        let mut netlist = Netlist::new();
        let input = netlist.add_source("in", ElementKind::Explicit, false);
        let a = netlist.add_logic("a", ElementKind::Combinational, Box::new(Gate::Or));
        let b = netlist.add_logic("b", ElementKind::Combinational, Box::new(Gate::Buffer));
        netlist.connect(input, a).unwrap();
        netlist.connect(a, b).unwrap();
        netlist.connect(b, a).unwrap();
        let input_value = netlist.element(input).unwrap().value().clone();
        let b_value = netlist.element(b).unwrap().value().clone();

        let mut evaluator = build_evaluator(netlist, LevelizeMode::Exact);
        evaluator.evaluate_pass();
        assert!(!b_value.get());

        input_value.set(true);
        evaluator.evaluate_pass();
        assert!(b_value.get());

        input_value.set(false);
        evaluator.evaluate_pass();
        evaluator.evaluate_pass();
        assert!(b_value.get());
    }

    #[test]
    fn run_stops_when_shutdown_is_set() {
        struct StopAfter {
            remaining: u32,
            shutdown: Arc<AtomicBool>,
        }

        impl Debugger for StopAfter {
            fn step(&mut self) {
                self.remaining -= 1;
                if self.remaining == 0 {
                    self.shutdown.store(true, Ordering::Release);
                }
            }
        }

        let shutdown = Arc::new(AtomicBool::new(false));
        let passes = Arc::new(AtomicU64::new(0));
        let evaluator = Evaluator::new(
            Netlist::new(),
            vec![Vec::new()],
            Box::new(StopAfter {
                remaining: 3,
                shutdown: Arc::clone(&shutdown),
            }),
            Arc::clone(&passes),
            shutdown,
        );

        evaluator.run();
        assert_eq!(passes.load(Ordering::Acquire), 3);
    }
}
