//! Circuit Graph
//!
//! This module implements the element/link graph the controller schedules
//! and evaluates.
//!
//! # Overview
//!
//! - Elements are logic units: explicit inputs, clocks, gates, and
//!   sequential devices.
//! - Links are directed edges from one element's output to the inputs of one
//!   or more elements. A link has exactly one producer.
//!
//! The graph may contain cycles. Scheduling cuts them temporarily; the
//! evaluation loop runs on the original graph.
//!
//! # Design Decisions
//!
//! 1. Elements and links live in flat arenas and refer to each other by
//!    index. Removing or restoring an edge touches two index lists and never
//!    moves ownership.
//!
//! 2. Both directions of every edge are stored (link destinations and
//!    element inputs), in order, because evaluation order and element
//!    semantics both depend on that order.
//!
//! 3. Values shared across threads are `Signal`s; everything else in the
//!    graph is owned by a single thread at a time.

mod element;
mod link;
mod netlist;
mod signal;

pub use element::{Element, ElementId, ElementKind};
pub use link::{Link, LinkId};
pub use netlist::Netlist;
pub use signal::{InputHandle, Probe, Signal};
