//! Setup pipeline and runtime of a signal flow.
//!
//! Setting up a [`FlowGraph`] runs these passes in order:
//!
//! 1. **Integrity** - every connection descriptor is checked locally and
//!    turned into receiver-to-sender links.
//! 2. **Flatten** - link chains through composite boundaries are collapsed
//!    into direct links between atomic ports.
//! 3. **Schedule** - atomic components are sorted topologically; cycles are
//!    reported.
//! 4. **Resolve** - connected channels are merged into signals and each
//!    signal gets one row of a [`CommunicationArea`].
//! 5. **Bind** - parameter channels are created and their endpoints handed
//!    to the components ([`AudioSignalFlow`]).
//!
//! Passes 1-3 report into a shared [`IntegrityReport`], so every problem is
//! listed at once.

mod area;
mod engine;
mod flatten;
mod integrity;
mod io;
mod resolve;
mod schedule;

pub use area::{CommunicationArea, CommunicationAreas};
pub use engine::{AudioSignalFlow, FlowState};
pub use flatten::{FlatAudioLink, FlatParameterLink};
pub use integrity::{AudioEndpoint, IntegrityReport, Violation, ViolationKind};
pub use io::ProcessIo;

use crate::graph::{ComponentId, FlowGraph};

/// Result of the checking passes.
pub(crate) struct Analysis {
    pub flat: flatten::FlatTopology,
    /// Atomic components in execution order.
    pub order: Vec<ComponentId>,
}

/// Runs integrity checking, flattening and scheduling.
pub(crate) fn analyze(graph: &FlowGraph) -> Result<Analysis, IntegrityReport> {
    let mut report = IntegrityReport::default();
    let links = integrity::collect_links(graph, &mut report);
    let flat = flatten::flatten(graph, &links, &mut report);
    let order = schedule::execution_order(graph, &flat, &mut report);

    #[cfg(feature = "tracing")]
    tracing::debug!(
        "flow_analyze: {} with {} violation(s)",
        graph.path(graph.root()),
        report.len()
    );

    if report.is_ok() {
        Ok(Analysis { flat, order })
    } else {
        Err(report)
    }
}
