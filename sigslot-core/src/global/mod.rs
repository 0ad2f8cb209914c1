//! Global pair registry.
//!
//! An alternative to embedded [`Signals`](crate::Signals) tables: one
//! registry holds the connections of many publishers, keyed by publisher
//! identity. [`PairRegistry::global`] is the process-wide instance;
//! independent registries can be created for tests or isolated subsystems.

mod registry;

pub use registry::PairRegistry;
