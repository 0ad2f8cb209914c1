//! Emission Context
//!
//! The emission context tracks which signals are currently being emitted on
//! this thread. A slot that raises another signal pushes a new frame on top
//! of the one that invoked it, so nested emissions are observable and can be
//! bounded.
//!
//! # Implementation
//!
//! We use a thread-local stack. Entering an emission pushes a frame and
//! returns a guard; dropping the guard pops it, including when a slot panics
//! and the stack unwinds through the fan-out.

use std::cell::RefCell;

use tracing::error;

use crate::declare::SignalId;
use crate::error::{Result, SignalError};

thread_local! {
    static EMISSION_STACK: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

/// One in-flight emission.
#[derive(Debug, Clone)]
struct Frame {
    signal: SignalId,
    publisher: &'static str,
}

/// Guard that pops the emission frame when dropped.
#[derive(Debug)]
pub struct EmissionContext {
    depth: usize,
}

impl EmissionContext {
    /// Enter an emission of `signal`.
    ///
    /// Fails with `RecursionLimit` when `limit` emissions are already active
    /// on this thread.
    pub(crate) fn enter(
        signal: &SignalId,
        publisher: &'static str,
        limit: Option<usize>,
    ) -> Result<Self> {
        EMISSION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();

            if let Some(limit) = limit {
                if stack.len() >= limit {
                    error!(%signal, publisher, depth = limit, "emission depth limit reached");
                    return Err(SignalError::RecursionLimit {
                        signal: signal.to_string(),
                        depth: limit,
                    });
                }
            }

            stack.push(Frame {
                signal: signal.clone(),
                publisher,
            });
            Ok(Self { depth: stack.len() })
        })
    }

    /// Check if an emission is in progress on this thread.
    pub fn is_active() -> bool {
        EMISSION_STACK.with(|stack| !stack.borrow().is_empty())
    }

    /// Number of nested emissions in progress on this thread.
    pub fn depth() -> usize {
        EMISSION_STACK.with(|stack| stack.borrow().len())
    }

    /// The innermost signal being emitted, if any.
    pub fn current() -> Option<SignalId> {
        EMISSION_STACK.with(|stack| stack.borrow().last().map(|frame| frame.signal.clone()))
    }

    /// Type name of the publisher of the innermost emission, if any.
    pub fn current_publisher() -> Option<&'static str> {
        EMISSION_STACK.with(|stack| stack.borrow().last().map(|frame| frame.publisher))
    }

    /// Every signal being emitted, outermost first.
    pub fn stack() -> Vec<SignalId> {
        EMISSION_STACK.with(|stack| {
            stack
                .borrow()
                .iter()
                .map(|frame| frame.signal.clone())
                .collect()
        })
    }
}

impl Drop for EmissionContext {
    fn drop(&mut self) {
        EMISSION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();

            // Guards are dropped in reverse order of creation.
            debug_assert_eq!(
                stack.len(),
                self.depth,
                "EmissionContext mismatch: expected depth {}, got {}",
                self.depth,
                stack.len()
            );
            stack.pop();
        });
    }
}
