//! Netlist Core
//!
//! This crate provides the controller of a digital logic simulator. It
//! implements:
//!
//! - An element/link graph of inputs, clocks, gates, and sequential elements
//! - Loop breaking for feedback paths, with stack-safe depth-first search
//! - Levelization into an evaluation schedule (exact or real-time)
//! - Free-running clock tasks and a continuous evaluation loop
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `graph`: element and link arenas, shared signal values
//! - `schedule`: loop breaking, levelization, edge restoration
//! - `runtime`: clock tasks, evaluation loop, debugger hook
//! - `circuit`: the controller tying construction, scheduling and start-up together
//! - `logic`: the element evaluation contract and standard gates
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use netlist_core::{Circuit, Gate};
//!
//! let mut circuit = Circuit::new();
//! let a = circuit.add_input("a", true);
//! let b = circuit.add_input("b", false);
//! let and = circuit.add_gate("and", Gate::And);
//! circuit.connect(a, and)?;
//! circuit.connect(b, and)?;
//!
//! let running = circuit.start_circuit()?;
//! running.input_handle(b)?.set(true);
//! std::thread::sleep(Duration::from_millis(10));
//! assert!(running.probe(and)?.get());
//! running.shutdown();
//! # Ok::<(), netlist_core::CircuitError>(())
//! ```

pub mod circuit;
pub mod config;
pub mod error;
pub mod graph;
pub mod logic;
pub mod runtime;
pub mod schedule;

pub use circuit::{Circuit, RunningCircuit};
pub use config::{LevelizeMode, SimulationConfig};
pub use error::{CircuitError, Result};
pub use graph::{ElementId, ElementKind, InputHandle, LinkId, Probe};
pub use logic::{DFlipFlop, Gate, Logic};
pub use runtime::{Debugger, NoDebugger, Stepper};
pub use schedule::Schedule;
