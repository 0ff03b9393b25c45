//! Clock Driver
//!
//! Every clock element runs as its own timer task. The task is the only
//! writer of the clock's output value; the evaluation loop picks the value up
//! on its next pass and copies it onto the clock's links.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::error::Result;
use crate::graph::{ElementKind, Netlist, Signal};

/// Timer state of one clock element.
#[derive(Debug, Clone)]
pub(crate) struct ClockDriver {
    name: String,
    period: Duration,
    value: Signal,
}

impl ClockDriver {
    pub(crate) fn new(name: impl Into<String>, period: Duration, value: Signal) -> Self {
        Self {
            name: name.into(),
            period,
            value,
        }
    }

    /// Time between toggles. One full cycle is two toggles.
    pub(crate) fn half_period(&self) -> Duration {
        (self.period / 2).max(Duration::from_micros(1))
    }

    /// Toggle the clock until shutdown is requested.
    pub(crate) async fn run(self, shutdown: Arc<AtomicBool>) {
        let mut ticker = interval(self.half_period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if shutdown.load(Ordering::Acquire) {
                break;
            }
            let level = self.value.toggle();
            tracing::trace!(clock = %self.name, level, "clock edge");
        }

        tracing::debug!(clock = %self.name, "clock stopped");
    }
}

/// Spawn one timer task per clock element of the netlist.
pub(crate) fn spawn_clocks(
    handle: &Handle,
    netlist: &Netlist,
    shutdown: &Arc<AtomicBool>,
) -> Result<Vec<JoinHandle<()>>> {
    let mut tasks = Vec::with_capacity(netlist.clocks().len());

    for &id in netlist.clocks() {
        let element = netlist.element(id)?;
        if let ElementKind::Clock { period } = element.kind() {
            let driver = ClockDriver::new(element.name(), period, element.value().clone());
            tracing::debug!(clock = %element.name(), ?period, "starting clock");
            tasks.push(handle.spawn(driver.run(Arc::clone(shutdown))));
        }
    }

    Ok(tasks)
}
