//! Slot declarations.
//!
//! A slot is a handler registered under a name. Being invocable by the
//! dispatcher is a property of that registration: the handler is an ordinary
//! closure over `&Self`, so the receiver's own methods can stay private.

use std::marker::PhantomData;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::warn;

use super::ids::SlotId;
use crate::config::DeclarationMode;
use crate::dispatch::{Args, Config};
use crate::error::{Result, SignalError};

/// A registered slot handler for receivers of type `R`.
pub type SlotFn<R> = Arc<dyn Fn(&R, &Args) + Send + Sync>;

/// A type whose instances can be connected to signals.
///
/// Handlers receive a shared reference, so receivers that record state use
/// interior mutability (atomics, locks).
///
/// # Example
///
/// ```rust
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use sigslot_core::{Receiver, SlotDeclarations};
///
/// #[derive(Default)]
/// struct Tire {
///     times_blown: AtomicUsize,
/// }
///
/// impl Receiver for Tire {
///     fn declare_slots(decl: &mut SlotDeclarations<Self>) {
///         decl.slot("blow", |tire, _args| {
///             tire.times_blown.fetch_add(1, Ordering::SeqCst);
///         });
///     }
/// }
/// ```
pub trait Receiver: Send + Sync + Sized + 'static {
    /// Register every slot of this type.
    fn declare_slots(decl: &mut SlotDeclarations<Self>);
}

/// A receiver that can be built on demand for lazy connections.
///
/// A lazy connection constructs a fresh receiver for every delivery.
pub trait Construct: Receiver {
    /// Build a receiver. `config` is empty when the connection carries none.
    fn construct(config: &Config) -> Self;
}

/// Builder handed to [`Receiver::declare_slots`].
pub struct SlotDeclarations<R> {
    mode: DeclarationMode,
    slots: IndexMap<SlotId, SlotFn<R>>,
    problems: Vec<String>,
    _receiver: PhantomData<fn() -> R>,
}

impl<R: Receiver> SlotDeclarations<R> {
    /// Register `handler` under `name`.
    pub fn slot<F>(&mut self, name: impl Into<SlotId>, handler: F) -> &mut Self
    where
        F: Fn(&R, &Args) + Send + Sync + 'static,
    {
        let name = name.into();
        if name.as_str().is_empty() {
            self.reject("slot name is empty".to_string());
        } else if self.slots.contains_key(&name) {
            self.reject(format!("slot '{name}' is declared twice"));
        } else {
            self.slots.insert(name, Arc::new(handler));
        }
        self
    }

    fn reject(&mut self, reason: String) {
        match self.mode {
            DeclarationMode::Strict => self.problems.push(reason),
            DeclarationMode::Lenient => {
                warn!(receiver = std::any::type_name::<R>(), %reason, "skipping slot declaration");
            }
        }
    }

    pub(crate) fn build(mode: DeclarationMode) -> Result<SlotSet<R>> {
        let mut decl = Self {
            mode,
            slots: IndexMap::new(),
            problems: Vec::new(),
            _receiver: PhantomData,
        };
        R::declare_slots(&mut decl);

        if !decl.problems.is_empty() {
            return Err(SignalError::Configuration {
                type_name: std::any::type_name::<R>(),
                reason: decl.problems.join("; "),
            });
        }

        Ok(SlotSet { slots: decl.slots })
    }
}

/// The built, read-only slot declarations of one receiver type.
pub struct SlotSet<R> {
    slots: IndexMap<SlotId, SlotFn<R>>,
}

impl<R: Receiver> SlotSet<R> {
    /// Whether `slot` is declared.
    pub fn contains(&self, slot: &str) -> bool {
        self.slots.contains_key(slot)
    }

    /// Declared slot names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &SlotId> {
        self.slots.keys()
    }

    /// Resolve a slot name to its id and handler.
    pub(crate) fn resolve(&self, slot: &str) -> Result<(SlotId, SlotFn<R>)> {
        self.slots
            .get_key_value(slot)
            .map(|(id, handler)| (id.clone(), Arc::clone(handler)))
            .ok_or_else(|| SignalError::undeclared_slot::<R>(slot))
    }
}

impl<R> std::fmt::Debug for SlotSet<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotSet")
            .field("receiver", &std::any::type_name::<R>())
            .field("slots", &self.slots.keys().collect::<Vec<_>>())
            .finish()
    }
}
