//! Debugger Hook
//!
//! The evaluation loop hands control to a `Debugger` once per pass. The hook
//! may block, which is how pausing and single-stepping are implemented: the
//! loop simply does not start the next pass until `step` returns.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Hook invoked by the evaluation loop.
pub trait Debugger: Send {
    /// Called once, before the first pass.
    fn start_debugger(&mut self) {}

    /// Called after every pass. Blocking here suspends the simulation.
    fn step(&mut self);
}

/// A debugger that never pauses.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDebugger;

impl Debugger for NoDebugger {
    fn step(&mut self) {}
}

#[derive(Debug, Default)]
struct StepState {
    started: bool,
    paused: bool,
    /// Passes granted by `step_once` while paused.
    budget: u64,
    passes: u64,
}

/// Pause/step controller.
///
/// Clones share state: hand one clone to the circuit as its debugger and
/// keep another to drive it.
#[derive(Debug, Clone, Default)]
pub struct Stepper {
    shared: Arc<(Mutex<StepState>, Condvar)>,
}

impl Stepper {
    /// A stepper that lets the simulation run freely.
    pub fn new() -> Self {
        Self::default()
    }

    /// A stepper that holds the simulation after its first pass.
    pub fn paused() -> Self {
        let stepper = Self::default();
        stepper.pause();
        stepper
    }

    /// Hold the simulation after the pass in progress.
    pub fn pause(&self) {
        let (state, _) = &*self.shared;
        state.lock().paused = true;
    }

    /// Let the simulation run freely again.
    pub fn resume(&self) {
        let (state, condvar) = &*self.shared;
        let mut state = state.lock();
        state.paused = false;
        state.budget = 0;
        condvar.notify_all();
    }

    /// Allow exactly one more pass while paused. Does nothing while running.
    pub fn step_once(&self) {
        let (state, condvar) = &*self.shared;
        let mut state = state.lock();
        if state.paused {
            state.budget += 1;
            condvar.notify_all();
        }
    }

    /// Whether passes are currently being held.
    pub fn is_paused(&self) -> bool {
        self.shared.0.lock().paused
    }

    /// Whether the evaluation loop has started.
    pub fn started(&self) -> bool {
        self.shared.0.lock().started
    }

    /// Number of completed passes.
    pub fn passes(&self) -> u64 {
        self.shared.0.lock().passes
    }

    /// Block until at least `passes` passes have completed.
    ///
    /// Returns `false` if the timeout elapsed first.
    pub fn wait_for_passes(&self, passes: u64, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let (state, condvar) = &*self.shared;
        let mut state = state.lock();
        while state.passes < passes {
            if condvar.wait_until(&mut state, deadline).timed_out() {
                return state.passes >= passes;
            }
        }
        true
    }
}

impl Debugger for Stepper {
    fn start_debugger(&mut self) {
        let (state, condvar) = &*self.shared;
        state.lock().started = true;
        condvar.notify_all();
    }

    fn step(&mut self) {
        let (state, condvar) = &*self.shared;
        let mut state = state.lock();
        state.passes += 1;
        condvar.notify_all();

        while state.paused && state.budget == 0 {
            condvar.wait(&mut state);
        }
        if state.paused {
            state.budget -= 1;
        }
    }
}
