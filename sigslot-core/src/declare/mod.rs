//! Declaration Registry
//!
//! Publisher types declare the signals they raise, receiver types declare the
//! slots they accept. Declarations are explicit `{name -> handler}`
//! registrations made once per type, cached for the process, and read-only
//! afterwards.
//!
//! # Mis-declarations
//!
//! An empty name, or a name a type declares twice, is a mis-declaration. How
//! it is handled depends on [`DeclarationMode`](crate::DeclarationMode):
//! strict builds fail with `SignalError::Configuration`, lenient builds log
//! a warning and skip the entry.

mod cache;
mod ids;
mod signals;
mod slots;

pub use ids::{SignalId, SlotId};
pub use signals::{Publisher, SignalDeclarations, SignalSet};
pub use slots::{Construct, Receiver, SlotDeclarations, SlotFn, SlotSet};

pub(crate) use cache::{signals_of, slots_of};
