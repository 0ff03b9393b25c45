//! Property tests for loop breaking and levelization on random graphs.

use std::collections::HashSet;

use netlist_core::graph::{ElementId, ElementKind, Netlist};
use netlist_core::schedule::{break_loops, build_schedule, levelize};
use netlist_core::{Gate, LevelizeMode};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct GraphShape {
    inputs: usize,
    gates: usize,
    /// (producer, gate) pairs; producers index inputs then gates.
    edges: Vec<(usize, usize)>,
}

prop_compose! {
    fn arb_graph()(
        inputs in 1usize..4,
        gates in 1usize..14,
    )(
        edges in prop::collection::vec((0..inputs + gates, 0..gates), 0..40),
        inputs in Just(inputs),
        gates in Just(gates),
    ) -> GraphShape {
        GraphShape { inputs, gates, edges }
    }
}

fn build(shape: &GraphShape) -> (Netlist, Vec<ElementId>) {
    let mut netlist = Netlist::new();
    let mut ids = Vec::new();
    for n in 0..shape.inputs {
        ids.push(netlist.add_source(format!("i{n}"), ElementKind::Explicit, false));
    }
    let gates: Vec<ElementId> = (0..shape.gates)
        .map(|n| netlist.add_logic(format!("g{n}"), ElementKind::Combinational, Box::new(Gate::Or)))
        .collect();
    ids.extend(gates.iter().copied());

    for &(producer, gate) in &shape.edges {
        netlist.connect(ids[producer], gates[gate]).unwrap();
    }
    (netlist, ids)
}

fn snapshot(netlist: &Netlist) -> (Vec<Vec<ElementId>>, Vec<Vec<netlist_core::LinkId>>) {
    let destinations = netlist
        .links()
        .iter()
        .map(|l| l.destinations().to_vec())
        .collect();
    let inputs = netlist
        .elements()
        .iter()
        .map(|e| e.inputs().to_vec())
        .collect();
    (destinations, inputs)
}

/// Recursive three-colour DFS; fine for the small graphs generated here.
fn has_reachable_cycle(netlist: &Netlist) -> bool {
    fn visit(netlist: &Netlist, id: ElementId, on_path: &mut HashSet<ElementId>, done: &mut HashSet<ElementId>) -> bool {
        if done.contains(&id) {
            return false;
        }
        if !on_path.insert(id) {
            return true;
        }
        let element = netlist.element(id).unwrap();
        for link in element.outputs() {
            for &next in netlist.link(*link).unwrap().destinations() {
                if visit(netlist, next, on_path, done) {
                    return true;
                }
            }
        }
        on_path.remove(&id);
        done.insert(id);
        false
    }

    let mut done = HashSet::new();
    netlist
        .roots()
        .iter()
        .any(|&root| visit(netlist, root, &mut HashSet::new(), &mut done))
}

fn reachable(netlist: &Netlist) -> HashSet<ElementId> {
    let mut seen: HashSet<ElementId> = netlist.roots().iter().copied().collect();
    let mut queue: Vec<ElementId> = netlist.roots().to_vec();
    while let Some(id) = queue.pop() {
        for link in netlist.element(id).unwrap().outputs() {
            for &next in netlist.link(*link).unwrap().destinations() {
                if seen.insert(next) {
                    queue.push(next);
                }
            }
        }
    }
    seen
}

/// Elements the exact levelizer can place on the cut graph: the roots, then
/// every element with at least one input whose producers are all placeable.
fn fully_fed(netlist: &Netlist) -> HashSet<ElementId> {
    let mut fed: HashSet<ElementId> = netlist.roots().iter().copied().collect();
    loop {
        let before = fed.len();
        for element in netlist.elements() {
            if fed.contains(&element.id()) || element.inputs().is_empty() {
                continue;
            }
            let ready = element
                .inputs()
                .iter()
                .all(|link| fed.contains(&netlist.link(*link).unwrap().source()));
            if ready {
                fed.insert(element.id());
            }
        }
        if fed.len() == before {
            return fed;
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn loop_breaking_leaves_no_reachable_cycle(shape in arb_graph()) {
        let (mut netlist, _) = build(&shape);
        break_loops(&mut netlist).unwrap();
        prop_assert!(!has_reachable_cycle(&netlist));
    }

    #[test]
    fn every_cut_is_needed(shape in arb_graph()) {
        let (mut netlist, _) = build(&shape);
        let cut: Vec<_> = break_loops(&mut netlist).unwrap().iter().copied().collect();

        for edge in cut {
            let (mut rebuilt, _) = build(&shape);
            break_loops(&mut rebuilt).unwrap();
            prop_assert!(!has_reachable_cycle(&rebuilt));

            rebuilt.attach(edge.link, edge.destination).unwrap();
            prop_assert!(has_reachable_cycle(&rebuilt), "{} -> {} was not part of a cycle", edge.link, edge.destination);
        }
    }

    #[test]
    fn restoration_reproduces_the_original_graph(shape in arb_graph()) {
        let (mut netlist, _) = build(&shape);
        let before = snapshot(&netlist);

        let mut severed = break_loops(&mut netlist).unwrap();
        let cut = severed.len();
        prop_assert_eq!(netlist.edge_count() + cut, shape.edges.len());

        severed.restore(&mut netlist).unwrap();
        prop_assert!(severed.is_empty());
        prop_assert_eq!(snapshot(&netlist), before);
    }

    #[test]
    fn exact_levels_respect_every_producer(shape in arb_graph()) {
        let (mut netlist, _) = build(&shape);
        let mut severed = break_loops(&mut netlist).unwrap();
        let levels = levelize(&mut netlist, LevelizeMode::Exact).unwrap();

        let level_of = |id: ElementId| levels.iter().position(|l| l.contains(&id));
        for (k, level) in levels.iter().enumerate().skip(1) {
            for &id in level {
                for link in netlist.element(id).unwrap().inputs() {
                    let producer = netlist.link(*link).unwrap().source();
                    let producer_level = level_of(producer);
                    prop_assert!(producer_level.is_some());
                    prop_assert!(producer_level.unwrap() < k);
                }
            }
        }
        severed.restore(&mut netlist).unwrap();
    }

    #[test]
    fn exact_levels_cover_every_fully_fed_element(shape in arb_graph()) {
        let (mut netlist, _) = build(&shape);
        let mut severed = break_loops(&mut netlist).unwrap();
        let expected = fully_fed(&netlist);

        let levels = levelize(&mut netlist, LevelizeMode::Exact).unwrap();
        let placed: HashSet<ElementId> = levels.iter().flatten().copied().collect();

        prop_assert_eq!(placed, expected);
        severed.restore(&mut netlist).unwrap();
    }

    #[test]
    fn real_time_levels_cover_reachable_elements_once(shape in arb_graph()) {
        let (mut netlist, _) = build(&shape);
        let expected = reachable(&netlist);

        let schedule = build_schedule(&mut netlist, LevelizeMode::RealTime).unwrap();
        let placed: Vec<ElementId> = schedule.levels().iter().flatten().copied().collect();
        let unique: HashSet<ElementId> = placed.iter().copied().collect();

        prop_assert_eq!(placed.len(), unique.len());
        prop_assert_eq!(unique, expected);
    }

    #[test]
    fn exact_levels_place_each_element_at_most_once(shape in arb_graph()) {
        let (mut netlist, _) = build(&shape);
        let schedule = build_schedule(&mut netlist, LevelizeMode::Exact).unwrap();
        let placed: Vec<ElementId> = schedule.levels().iter().flatten().copied().collect();
        let unique: HashSet<ElementId> = placed.iter().copied().collect();

        prop_assert_eq!(placed.len(), unique.len());
        prop_assert_eq!(placed.len() + schedule.unscheduled().len(), netlist.elements().len());
    }

    #[test]
    fn scheduling_is_deterministic(shape in arb_graph()) {
        let (mut first, _) = build(&shape);
        let (mut second, _) = build(&shape);

        let a = build_schedule(&mut first, LevelizeMode::Exact).unwrap();
        let b = build_schedule(&mut first, LevelizeMode::Exact).unwrap();
        let c = build_schedule(&mut second, LevelizeMode::Exact).unwrap();

        prop_assert_eq!(&a, &b);
        prop_assert_eq!(&a, &c);
    }
}
