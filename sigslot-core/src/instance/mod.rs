//! Instance-scoped signals.
//!
//! Each publisher embeds its own [`Signals`] table. Anyone holding a
//! reference to the table may connect and disconnect; raising a signal is
//! reserved to the publisher's type hierarchy (see [`access`]).
//!
//! # Typical shape
//!
//! ```text
//! struct Person {
//!     signals: Signals<Person>,   // public or exposed via a getter
//!     emitter: Emitter<Person>,   // private
//! }
//! ```

pub mod access;
mod table;

pub use access::{Caller, Emitter};
pub use table::Signals;
