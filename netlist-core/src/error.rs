//! Error types for the circuit controller.
//!
//! Construction and scheduling report precondition violations here. Data
//! races on signal values are ruled out by the single-writer design and have
//! no variant.

use thiserror::Error;

use crate::graph::{ElementId, LinkId};

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CircuitError>;

/// Errors raised while building, scheduling, or starting a circuit.
#[derive(Error, Debug)]
pub enum CircuitError {
    /// An element handle does not belong to this circuit.
    #[error("unknown element {0}")]
    UnknownElement(ElementId),

    /// A link handle does not belong to this circuit.
    #[error("unknown link {0}")]
    UnknownLink(LinkId),

    /// A link was created but never attached to a destination.
    #[error("link {link} from '{source_name}' has no destinations")]
    DanglingLink {
        /// The link without destinations.
        link: LinkId,
        /// Name of the element driving it.
        source_name: String,
    },

    /// The destination list of a link and the input list of an element disagree.
    #[error("link {link} and element {element} disagree about their connection")]
    InputMismatch {
        /// The link involved.
        link: LinkId,
        /// The element whose inputs do not match.
        element: ElementId,
    },

    /// Explicit inputs and clocks drive the circuit and cannot be driven.
    #[error("source element '{name}' ({element}) has input links")]
    SourceWithInputs {
        /// The offending source element.
        element: ElementId,
        /// Its name.
        name: String,
    },

    /// An input handle was requested for something that is not an explicit input.
    #[error("element {0} is not an explicit input")]
    NotAnInput(ElementId),

    /// Clocks need a non-zero period.
    #[error("clock '{name}' has a zero period")]
    ZeroClockPeriod {
        /// Name of the clock.
        name: String,
    },

    /// Loop breaking kept finding cycles after every edge could have been cut.
    #[error("loop breaking did not converge after {scans} scans over {edges} edges")]
    LoopBreakingDiverged {
        /// Number of scans performed.
        scans: usize,
        /// Number of edges in the graph.
        edges: usize,
    },

    /// The tokio runtime backing clocks and evaluation could not be built.
    #[error("failed to build simulation runtime: {0}")]
    Runtime(#[from] std::io::Error),

    /// A configuration document could not be parsed.
    #[error("invalid simulation config: {0}")]
    Config(#[from] serde_json::Error),
}
