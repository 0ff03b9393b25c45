//! Circuit Controller
//!
//! `Circuit` is the entry point: build the element graph, optionally inspect
//! the schedule, then start the simulation.
//!
//! Starting consumes the circuit. The graph moves onto the evaluation thread
//! and the caller keeps a `RunningCircuit` handle with probes and input
//! handles; a circuit can therefore never be started twice.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;

use crate::config::{LevelizeMode, SimulationConfig};
use crate::error::{CircuitError, Result};
use crate::graph::{ElementId, ElementKind, InputHandle, LinkId, Netlist, Probe, Signal};
use crate::logic::Logic;
use crate::runtime::{spawn_clocks, Debugger, Evaluator, NoDebugger};
use crate::schedule::{build_schedule, Schedule};

/// A circuit under construction.
pub struct Circuit {
    netlist: Netlist,
    debugger: Box<dyn Debugger>,
    config: SimulationConfig,
}

impl Circuit {
    /// Create an empty circuit with the default configuration.
    pub fn new() -> Self {
        Self {
            netlist: Netlist::new(),
            debugger: Box::new(NoDebugger),
            config: SimulationConfig::default(),
        }
    }

    /// Replace the simulation configuration.
    pub fn with_config(mut self, config: SimulationConfig) -> Self {
        self.config = config;
        self
    }

    /// Install the hook called after every evaluation pass.
    pub fn with_debugger(mut self, debugger: impl Debugger + 'static) -> Self {
        self.debugger = Box::new(debugger);
        self
    }

    /// The element graph built so far.
    pub fn netlist(&self) -> &Netlist {
        &self.netlist
    }

    /// Add an explicit input, driven through its `InputHandle`.
    pub fn add_input(&mut self, name: impl Into<String>, initial: bool) -> ElementId {
        self.netlist.add_source(name, ElementKind::Explicit, initial)
    }

    /// Add a clock that completes one low/high cycle per `period`.
    pub fn add_clock(&mut self, name: impl Into<String>, period: Duration) -> Result<ElementId> {
        let name = name.into();
        if period.is_zero() {
            return Err(CircuitError::ZeroClockPeriod { name });
        }
        Ok(self
            .netlist
            .add_source(name, ElementKind::Clock { period }, false))
    }

    /// Add a combinational element.
    pub fn add_gate(&mut self, name: impl Into<String>, logic: impl Logic + 'static) -> ElementId {
        self.netlist
            .add_logic(name, ElementKind::Combinational, Box::new(logic))
    }

    /// Add a sequential element.
    pub fn add_sequential(
        &mut self,
        name: impl Into<String>,
        logic: impl Logic + 'static,
    ) -> ElementId {
        self.netlist
            .add_logic(name, ElementKind::Sequential, Box::new(logic))
    }

    /// Create a new output link on `source` with no destinations yet.
    pub fn add_link(&mut self, source: ElementId) -> Result<LinkId> {
        self.netlist.add_link(source)
    }

    /// Append `destination` to a link.
    pub fn attach(&mut self, link: LinkId, destination: ElementId) -> Result<()> {
        self.netlist.attach(link, destination)
    }

    /// Feed `destination` from `source`'s first output link.
    pub fn connect(&mut self, source: ElementId, destination: ElementId) -> Result<LinkId> {
        self.netlist.connect(source, destination)
    }

    /// Writer for an explicit input.
    pub fn input_handle(&self, id: ElementId) -> Result<InputHandle> {
        let element = self.netlist.element(id)?;
        input_handle_for(id, element.kind(), element.value())
    }

    /// Observe an element's output value.
    pub fn probe(&self, id: ElementId) -> Result<Probe> {
        Ok(Probe::new(self.netlist.element(id)?.value().clone()))
    }

    /// Observe the value carried by a link.
    pub fn probe_link(&self, id: LinkId) -> Result<Probe> {
        Ok(Probe::new(self.netlist.link(id)?.signal().clone()))
    }

    /// Compute the evaluation schedule without starting anything.
    ///
    /// May be called any number of times; the graph is left unchanged.
    pub fn schedule(&mut self, mode: LevelizeMode) -> Result<Schedule> {
        build_schedule(&mut self.netlist, mode)
    }

    /// Start in the configured mode (exact unless configured otherwise).
    pub fn start_circuit(self) -> Result<RunningCircuit> {
        let mode = self.config.mode;
        self.start(mode)
    }

    /// Start in the mode named by `mode`; see `LevelizeMode::parse`.
    pub fn start_circuit_with_mode(self, mode: &str) -> Result<RunningCircuit> {
        self.start(LevelizeMode::parse(mode))
    }

    /// Schedule the circuit, start its clocks and debugger, and launch the
    /// evaluation loop.
    pub fn start(mut self, mode: LevelizeMode) -> Result<RunningCircuit> {
        let schedule = self.schedule(mode)?;

        let runtime = Builder::new_multi_thread()
            .worker_threads(self.config.worker_threads())
            .thread_name("netlist-worker")
            .enable_time()
            .build()?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let passes = Arc::new(AtomicU64::new(0));

        let clocks = match spawn_clocks(runtime.handle(), &self.netlist, &shutdown) {
            Ok(clocks) => clocks,
            Err(err) => {
                shutdown.store(true, Ordering::Release);
                release_runtime(runtime, self.config.shutdown_grace());
                return Err(err);
            }
        };

        let values: Vec<(ElementKind, Signal)> = self
            .netlist
            .elements()
            .iter()
            .map(|element| (element.kind(), element.value().clone()))
            .collect();

        let Circuit {
            netlist,
            mut debugger,
            config,
        } = self;

        debugger.start_debugger();

        let evaluator = Evaluator::new(
            netlist,
            schedule.levels().to_vec(),
            debugger,
            Arc::clone(&passes),
            Arc::clone(&shutdown),
        );
        let evaluation = runtime.spawn_blocking(move || evaluator.run());

        tracing::info!(
            mode = %mode,
            levels = schedule.level_count(),
            elements = schedule.element_count(),
            clocks = clocks.len(),
            "circuit started"
        );

        Ok(RunningCircuit {
            runtime: Some(runtime),
            schedule,
            values,
            clocks,
            evaluation: Some(evaluation),
            passes,
            shutdown,
            grace: config.shutdown_grace(),
        })
    }
}

impl Default for Circuit {
    fn default() -> Self {
        Self::new()
    }
}

/// Shut a runtime down without blocking a caller that is itself async.
///
/// Tokio forbids a blocking shutdown from within a runtime context, so in
/// that case the runtime is released in the background and the grace period
/// is not waited for.
fn release_runtime(runtime: Runtime, grace: Duration) {
    if Handle::try_current().is_ok() {
        runtime.shutdown_background();
    } else {
        runtime.shutdown_timeout(grace);
    }
}

fn input_handle_for(id: ElementId, kind: ElementKind, value: &Signal) -> Result<InputHandle> {
    match kind {
        ElementKind::Explicit => Ok(InputHandle::new(value.clone())),
        _ => Err(CircuitError::NotAnInput(id)),
    }
}

/// Handle to a started circuit.
///
/// Dropping the handle stops the clocks and the evaluation loop.
pub struct RunningCircuit {
    runtime: Option<Runtime>,
    schedule: Schedule,
    values: Vec<(ElementKind, Signal)>,
    clocks: Vec<JoinHandle<()>>,
    evaluation: Option<JoinHandle<()>>,
    passes: Arc<AtomicU64>,
    shutdown: Arc<AtomicBool>,
    grace: Duration,
}

impl RunningCircuit {
    /// The schedule the evaluation loop is running.
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Completed evaluation passes.
    pub fn passes(&self) -> u64 {
        self.passes.load(Ordering::Acquire)
    }

    /// Whether the evaluation loop is still running.
    pub fn is_running(&self) -> bool {
        self.evaluation
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Observe an element's output value.
    pub fn probe(&self, id: ElementId) -> Result<Probe> {
        let (_, value) = self
            .values
            .get(id.raw())
            .ok_or(CircuitError::UnknownElement(id))?;
        Ok(Probe::new(value.clone()))
    }

    /// Writer for an explicit input of the running circuit.
    pub fn input_handle(&self, id: ElementId) -> Result<InputHandle> {
        let (kind, value) = self
            .values
            .get(id.raw())
            .ok_or(CircuitError::UnknownElement(id))?;
        input_handle_for(id, *kind, value)
    }

    /// Stop the simulation.
    ///
    /// The evaluation loop finishes its current pass; a debugger blocked in
    /// `step` is given the configured grace period before it is abandoned.
    /// Called from inside a tokio runtime, the shutdown does not wait.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(runtime) = self.runtime.take() else {
            return;
        };

        self.shutdown.store(true, Ordering::Release);
        for clock in self.clocks.drain(..) {
            clock.abort();
        }
        self.evaluation.take();

        release_runtime(runtime, self.grace);
        tracing::info!(passes = self.passes(), "circuit stopped");
    }
}

impl Drop for RunningCircuit {
    fn drop(&mut self) {
        self.stop();
    }
}
