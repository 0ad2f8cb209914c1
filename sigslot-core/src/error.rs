//! Error types for declaration, connection and emission.
//!
//! Every failure the core can report is a variant of [`SignalError`]. All of
//! them are local and recoverable: they are handed back to the caller of
//! `connect`, `emit` or `raise` and never swallowed. `disconnect` has no error
//! path at all, since removing a pairing that does not exist is normal usage.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = SignalError> = std::result::Result<T, E>;

/// Errors produced by the signal/slot core.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SignalError {
    /// The signal is not declared on the publisher type.
    #[error("'{signal}' signal is not declared in {publisher}")]
    UndeclaredSignal {
        /// Name of the offending signal.
        signal: String,
        /// Type name of the publisher.
        publisher: &'static str,
    },

    /// The slot is not declared on the receiver type.
    #[error("'{slot}' slot is not declared in {receiver}")]
    UndeclaredSlot {
        /// Name of the offending slot.
        slot: String,
        /// Type name of the receiver.
        receiver: &'static str,
    },

    /// A caller outside the publisher's type lineage tried to raise a signal.
    #[error("{caller} may not raise '{signal}' on {publisher}")]
    MemberAccess {
        /// Name of the signal being raised.
        signal: String,
        /// Type name of the rejected caller.
        caller: &'static str,
        /// Type name of the publisher.
        publisher: &'static str,
    },

    /// A type's declarations are inconsistent (duplicate or colliding names).
    #[error("invalid declarations on {type_name}: {reason}")]
    Configuration {
        /// Type whose declarations were rejected.
        type_name: &'static str,
        /// What was wrong.
        reason: String,
    },

    /// Nested emission went deeper than the configured limit.
    #[error("emitting '{signal}' would exceed the maximum emission depth of {depth}")]
    RecursionLimit {
        /// Signal whose emission was refused.
        signal: String,
        /// The configured limit.
        depth: usize,
    },

    /// A settings document could not be parsed.
    #[error("invalid dispatch settings: {0}")]
    Settings(#[from] serde_json::Error),
}

impl SignalError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            SignalError::UndeclaredSignal { .. } => "undeclared_signal",
            SignalError::UndeclaredSlot { .. } => "undeclared_slot",
            SignalError::MemberAccess { .. } => "member_access",
            SignalError::Configuration { .. } => "configuration",
            SignalError::RecursionLimit { .. } => "recursion_limit",
            SignalError::Settings(_) => "settings",
        }
    }

    pub(crate) fn undeclared_signal<P: ?Sized>(signal: &str) -> Self {
        SignalError::UndeclaredSignal {
            signal: signal.to_string(),
            publisher: std::any::type_name::<P>(),
        }
    }

    pub(crate) fn undeclared_slot<R: ?Sized>(slot: &str) -> Self {
        SignalError::UndeclaredSlot {
            slot: slot.to_string(),
            receiver: std::any::type_name::<R>(),
        }
    }
}
