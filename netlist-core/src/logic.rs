//! Element Logic
//!
//! The controller never looks inside an element's evaluation function. It
//! only needs the `Logic` contract: given the current input values, in input
//! order, produce the element's next output value. Any internal state (a
//! flip-flop's stored bit, the previous clock level) belongs to the
//! implementation and is touched only from the evaluation thread.
//!
//! A small standard library of gates and a D flip-flop is provided so that
//! circuits can be built without writing custom logic.

use std::fmt::Debug;

/// Evaluation function of a combinational or sequential element.
pub trait Logic: Send + Debug {
    /// Compute the next output value from the current inputs.
    fn evaluate(&mut self, inputs: &[bool]) -> bool;
}

/// Standard combinational gates.
///
/// Multi-input gates accept any number of inputs. With no inputs, `And`
/// yields `true` and `Or`/`Xor` yield `false` (their identity values).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    And,
    Or,
    Nand,
    Nor,
    Xor,
    Xnor,
    /// Inverts its first input.
    Not,
    /// Copies its first input.
    Buffer,
}

impl Logic for Gate {
    fn evaluate(&mut self, inputs: &[bool]) -> bool {
        let first = inputs.first().copied().unwrap_or(false);
        match self {
            Gate::And => inputs.iter().all(|v| *v),
            Gate::Or => inputs.iter().any(|v| *v),
            Gate::Nand => !inputs.iter().all(|v| *v),
            Gate::Nor => !inputs.iter().any(|v| *v),
            Gate::Xor => inputs.iter().filter(|v| **v).count() % 2 == 1,
            Gate::Xnor => inputs.iter().filter(|v| **v).count() % 2 == 0,
            Gate::Not => !first,
            Gate::Buffer => first,
        }
    }
}

/// Rising-edge D flip-flop.
///
/// Inputs are `[d, clock]`. The stored bit takes the value of `d` when the
/// clock input goes from low to high and is held otherwise.
#[derive(Debug, Clone, Default)]
pub struct DFlipFlop {
    state: bool,
    last_clock: bool,
}

impl DFlipFlop {
    /// A flip-flop whose output starts at `initial`.
    pub fn new(initial: bool) -> Self {
        Self {
            state: initial,
            last_clock: false,
        }
    }
}

impl Logic for DFlipFlop {
    fn evaluate(&mut self, inputs: &[bool]) -> bool {
        let d = inputs.first().copied().unwrap_or(false);
        let clock = inputs.get(1).copied().unwrap_or(false);

        if clock && !self.last_clock {
            self.state = d;
        }
        self.last_clock = clock;
        self.state
    }
}
