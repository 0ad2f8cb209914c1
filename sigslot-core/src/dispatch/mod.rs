//! Emission Dispatcher
//!
//! Everything between "a signal was raised" and "every connected slot ran":
//! argument lists, the type-erased bindings stored in connection tables, the
//! per-thread emission context, and the fan-out itself.
//!
//! # Delivery rules
//!
//! - Bindings are invoked in the order they were connected.
//! - The connection list is snapshotted before the first slot runs, so slots
//!   may connect, disconnect or raise further signals without affecting the
//!   in-flight fan-out.
//! - Live receivers are held weakly. A receiver dropped since it was
//!   connected is skipped and counted in [`Emission::skipped`].
//! - Lazy receivers are constructed afresh for every connection on every
//!   emission.
//! - Slot return values are not collected; an emission yields only an
//!   [`Emission`] summary.
//!
//! # Recursion
//!
//! Nested emissions are not cycle-checked. Without a `max_depth` setting a
//! slot that unconditionally re-raises its own signal recurses until the
//! thread's stack overflows. With `max_depth` set, the emission that would
//! exceed it fails with `SignalError::RecursionLimit` instead.

mod args;
mod binding;
mod context;
mod emission;

pub use args::{Args, Config, Value, INLINE_ARGS};
pub use context::EmissionContext;
pub use emission::Emission;

pub(crate) use binding::{address_of, Binding, ReceiverKey};
pub(crate) use emission::fan_out;
