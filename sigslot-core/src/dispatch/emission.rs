//! Fan-out of one emission to its bindings.

use tracing::{debug, trace};

use super::args::Args;
use super::binding::{Binding, Delivery};
use super::context::EmissionContext;
use crate::declare::SignalId;
use crate::error::Result;

/// Summary of one emission.
///
/// Signals are fire-and-forget: no slot output is collected. The summary
/// only says how many slots ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Emission {
    delivered: usize,
    skipped: usize,
}

impl Emission {
    /// Number of slots invoked.
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    /// Number of connections passed over because the live receiver had
    /// been dropped.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Whether no slot was invoked.
    pub fn is_empty(&self) -> bool {
        self.delivered == 0
    }
}

/// Invoke every binding in `snapshot`, in order.
///
/// `snapshot` is a copy of the connection list taken before any slot runs;
/// connections made or removed by a slot apply from the next emission.
pub(crate) fn fan_out(
    signal: &SignalId,
    publisher: &'static str,
    snapshot: &[Binding],
    args: &Args,
    max_depth: Option<usize>,
) -> Result<Emission> {
    let _ctx = EmissionContext::enter(signal, publisher, max_depth)?;
    let mut emission = Emission::default();

    for binding in snapshot {
        match binding.deliver(args) {
            Delivery::Delivered => {
                trace!(%signal, slot = %binding.slot(), receiver = binding.receiver_type(), "delivered");
                emission.delivered += 1;
            }
            Delivery::Dropped => {
                debug!(%signal, slot = %binding.slot(), receiver = binding.receiver_type(), "receiver dropped; skipping");
                emission.skipped += 1;
            }
        }
    }

    Ok(emission)
}
