//! Simulation Runtime
//!
//! Once a circuit is scheduled, three kinds of activity run concurrently:
//!
//! - one evaluation loop, on a blocking thread, walking the levels forever;
//! - one timer task per clock element, toggling that clock's value;
//! - the debugger hook, called on the evaluation thread after every pass.
//!
//! # Thread Safety
//!
//! The evaluation thread owns the netlist. Values crossing threads go
//! through `Signal` cells, and each cell has a single writer: a clock's task,
//! an input's handle, or the evaluation loop for everything else.

mod clock;
mod debugger;
mod evaluator;

pub use debugger::{Debugger, NoDebugger, Stepper};

pub(crate) use clock::spawn_clocks;
pub(crate) use evaluator::Evaluator;
