//! Sigslot Core
//!
//! This crate provides signal/slot dispatch for Rust objects. A publisher
//! raises named signals; receivers expose named slots; connecting a slot to a
//! signal means every emission of the signal invokes the slot with the
//! emission's arguments.
//!
//! It implements:
//!
//! - Explicit per-type declarations of signals and slots
//! - Instance-scoped connection tables with emission restricted to the
//!   publisher's type hierarchy
//! - Live receivers (held weakly) and lazily constructed receivers
//! - A global registry of `(publisher, signal) -> (receiver, slot)` pairs
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `declare`: signal and slot declarations, cached per type
//! - `dispatch`: arguments, bindings, emission context and fan-out
//! - `instance`: per-publisher [`Signals`] tables and the access guard
//! - `global`: the [`PairRegistry`]
//! - `config` and `error`: settings and the crate's error type
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use sigslot_core::{args, PairRegistry, Publisher, Receiver, SignalDeclarations, SlotDeclarations};
//!
//! struct Rock;
//!
//! impl Publisher for Rock {
//!     fn declare_signals(decl: &mut SignalDeclarations<Self>) {
//!         decl.signal("thrown");
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Windshield {
//!     blown: AtomicUsize,
//! }
//!
//! impl Receiver for Windshield {
//!     fn declare_slots(decl: &mut SlotDeclarations<Self>) {
//!         decl.slot("blowup", |w, _| {
//!             w.blown.fetch_add(1, Ordering::SeqCst);
//!         });
//!     }
//! }
//!
//! let registry = PairRegistry::new();
//! let rock = Arc::new(Rock);
//! let windshield = Arc::new(Windshield::default());
//!
//! registry.connect(&rock, "thrown", &windshield, "blowup").unwrap();
//! registry.emit(&*rock, "thrown", args!["hard"]).unwrap();
//! assert_eq!(windshield.blown.load(Ordering::SeqCst), 1);
//! ```

pub mod config;
pub mod declare;
pub mod dispatch;
pub mod error;
pub mod global;
pub mod instance;

pub use config::{DeclarationMode, DispatchSettings};
pub use declare::{
    Construct, Publisher, Receiver, SignalDeclarations, SignalId, SignalSet, SlotDeclarations, SlotFn,
    SlotId, SlotSet,
};
pub use dispatch::{Args, Config, Emission, EmissionContext, Value};
pub use error::{Result, SignalError};
pub use global::PairRegistry;
pub use instance::{Caller, Emitter, Signals};
