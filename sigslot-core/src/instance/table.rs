//! Per-publisher connection table.
//!
//! A [`Signals`] table is owned by one publisher instance and dropped with
//! it. It maps each declared signal to the ordered list of bindings
//! connected to it.
//!
//! # Thread Safety
//!
//! The bindings live behind a `parking_lot::RwLock`. Connect and disconnect
//! take the write lock; emission takes the read lock only long enough to
//! clone the signal's list, then runs the slots with no lock held.

use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::{debug, error};

use super::access::{check_caller, check_emitter, Caller, Emitter};
use crate::config::DispatchSettings;
use crate::declare::{signals_of, slots_of, Construct, Publisher, Receiver, SignalId, SignalSet};
use crate::dispatch::{fan_out, Args, Binding, Config, Emission, ReceiverKey};
use crate::error::{Result, SignalError};

/// Counter for generating unique table IDs.
static TABLE_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_table_id() -> u64 {
    TABLE_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// The connection table of one publisher of type `P`.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use sigslot_core::{args, Emitter, Publisher, Receiver, SignalDeclarations, Signals, SlotDeclarations};
///
/// struct Person {
///     signals: Signals<Person>,
///     emitter: Emitter<Person>,
/// }
///
/// impl Publisher for Person {
///     fn declare_signals(decl: &mut SignalDeclarations<Self>) {
///         decl.signal("ready");
///     }
/// }
///
/// impl Person {
///     fn new() -> sigslot_core::Result<Self> {
///         let (signals, emitter) = Signals::new()?;
///         Ok(Self { signals, emitter })
///     }
///
///     fn ready(&self, msg: &str) -> sigslot_core::Result<()> {
///         self.signals.emit(&self.emitter, "ready", args![msg])?;
///         Ok(())
///     }
/// }
///
/// #[derive(Default)]
/// struct Car {
///     open_count: AtomicUsize,
/// }
///
/// impl Receiver for Car {
///     fn declare_slots(decl: &mut SlotDeclarations<Self>) {
///         decl.slot("open_door", |car, _| {
///             car.open_count.fetch_add(1, Ordering::SeqCst);
///         });
///     }
/// }
///
/// let person = Person::new().unwrap();
/// let car = Arc::new(Car::default());
///
/// person.signals.connect("ready", &car, "open_door").unwrap();
/// person.ready("Let's go!").unwrap();
/// assert_eq!(car.open_count.load(Ordering::SeqCst), 1);
/// ```
pub struct Signals<P: Publisher> {
    /// Unique identifier for this table; emitters are bound to it.
    id: u64,

    declared: Arc<SignalSet>,

    settings: DispatchSettings,

    /// One entry per declared signal, in declaration order.
    connections: RwLock<IndexMap<SignalId, Vec<Binding>>>,

    _publisher: PhantomData<fn() -> P>,
}

impl<P: Publisher> Signals<P> {
    /// Create a table with default settings, together with the capability
    /// to emit on it.
    pub fn new() -> Result<(Self, Emitter<P>)> {
        Self::with_settings(DispatchSettings::default())
    }

    /// Create a table with the given settings.
    ///
    /// Fails with `SignalError::Configuration` if `P`'s declarations are
    /// rejected under `settings.declaration_mode`.
    pub fn with_settings(settings: DispatchSettings) -> Result<(Self, Emitter<P>)> {
        Self::build(settings)
    }

    /// Create a table of `P`'s signals owned by a subtype `C`.
    ///
    /// The returned emitter mints [`Caller`]s of type `C` that may `raise`
    /// on this table. Fails with `SignalError::Configuration` unless `C`
    /// declares that it extends `P`.
    pub fn for_subtype<C: Publisher>(settings: DispatchSettings) -> Result<(Self, Emitter<C>)> {
        let subtype = signals_of::<C>(settings.declaration_mode)?;
        if !subtype.descends_from(TypeId::of::<P>()) {
            return Err(SignalError::Configuration {
                type_name: std::any::type_name::<C>(),
                reason: format!("does not extend {}", std::any::type_name::<P>()),
            });
        }
        Self::build(settings)
    }

    fn build<C>(settings: DispatchSettings) -> Result<(Self, Emitter<C>)> {
        let declared = signals_of::<P>(settings.declaration_mode)?;
        let connections = declared
            .iter()
            .map(|signal| (signal.clone(), Vec::new()))
            .collect();

        let id = next_table_id();
        let table = Self {
            id,
            declared,
            settings,
            connections: RwLock::new(connections),
            _publisher: PhantomData,
        };
        Ok((table, Emitter::new(id)))
    }

    /// Get the table's unique ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The settings this table was created with.
    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    /// Whether `signal` is declared on `P`.
    pub fn declares(&self, signal: &str) -> bool {
        self.declared.contains(signal)
    }

    /// Signals declared on `P`, in declaration order.
    pub fn declared_signals(&self) -> impl Iterator<Item = &SignalId> {
        self.declared.iter()
    }

    /// Connect `slot` of a live receiver to `signal`.
    ///
    /// The table keeps only a weak reference: connecting does not extend
    /// the receiver's lifetime. Connecting the same triple twice yields two
    /// deliveries per emission.
    pub fn connect<R: Receiver>(&self, signal: &str, receiver: &Arc<R>, slot: &str) -> Result<()> {
        let (slot, handler) = slots_of::<R>(self.settings.declaration_mode)?.resolve(slot)?;
        let signal = self.declared_signal(signal)?;
        self.push(signal, Binding::live(receiver, slot, handler));
        Ok(())
    }

    /// Connect `slot` of receiver type `R` to `signal`. A fresh `R` is
    /// constructed from `config` for every delivery.
    pub fn connect_lazy<R: Construct>(&self, signal: &str, slot: &str, config: Config) -> Result<()> {
        let (slot, handler) = slots_of::<R>(self.settings.declaration_mode)?.resolve(slot)?;
        let signal = self.declared_signal(signal)?;
        self.push(signal, Binding::lazy::<R>(slot, handler, config));
        Ok(())
    }

    /// Remove every connection of `receiver`'s `slot` to `signal`.
    ///
    /// Returns whether anything was removed. Never fails.
    pub fn disconnect<R: 'static>(&self, signal: &str, receiver: &R, slot: &str) -> bool {
        self.remove(signal, ReceiverKey::live(receiver), slot)
    }

    /// Remove every lazy connection of `R`'s `slot` to `signal`.
    pub fn disconnect_lazy<R: 'static>(&self, signal: &str, slot: &str) -> bool {
        self.remove(signal, ReceiverKey::lazy::<R>(), slot)
    }

    /// Remove every connection to `signal`. Returns how many were removed.
    pub fn disconnect_all(&self, signal: &str) -> usize {
        let mut table = self.connections.write();
        match table.get_mut(signal) {
            Some(list) => {
                let removed = list.len();
                list.clear();
                removed
            }
            None => 0,
        }
    }

    /// Number of connections to `signal`.
    pub fn connection_count(&self, signal: &str) -> usize {
        self.connections.read().get(signal).map_or(0, Vec::len)
    }

    /// Whether `receiver`'s `slot` is connected to `signal`.
    pub fn is_connected<R: 'static>(&self, signal: &str, receiver: &R, slot: &str) -> bool {
        let key = ReceiverKey::live(receiver);
        self.connections
            .read()
            .get(signal)
            .is_some_and(|list| list.iter().any(|binding| binding.matches(key, slot)))
    }

    /// Emit `signal` with the publisher's own [`Emitter`].
    ///
    /// Fails with `MemberAccess` if `emitter` belongs to another table, with
    /// `UndeclaredSignal` if `signal` is not declared on `P`.
    pub fn emit(&self, emitter: &Emitter<P>, signal: &str, args: Args) -> Result<Emission> {
        check_emitter(emitter, self.id, signal)?;
        self.dispatch(signal, &args)
    }

    /// Raise `signal` by name on behalf of `caller`.
    ///
    /// The caller must have been minted from this table's emitter, and be
    /// `P` itself or a type that declares it extends `P`; anyone else gets
    /// `MemberAccess`.
    pub fn raise(&self, caller: &Caller, signal: &str, args: Args) -> Result<Emission> {
        check_caller::<P>(caller, self.id, signal)?;
        self.dispatch(signal, &args)
    }

    fn declared_signal(&self, signal: &str) -> Result<SignalId> {
        self.declared
            .get(signal)
            .cloned()
            .ok_or_else(|| SignalError::undeclared_signal::<P>(signal))
    }

    fn push(&self, signal: SignalId, binding: Binding) {
        debug!(
            publisher = std::any::type_name::<P>(),
            %signal,
            slot = %binding.slot(),
            receiver = binding.receiver_type(),
            "connect"
        );
        self.connections.write().entry(signal).or_default().push(binding);
    }

    fn remove(&self, signal: &str, key: ReceiverKey, slot: &str) -> bool {
        let mut table = self.connections.write();
        let Some(list) = table.get_mut(signal) else {
            return false;
        };

        let before = list.len();
        list.retain(|binding| !binding.matches(key, slot));
        let removed = before - list.len();

        if removed > 0 {
            debug!(publisher = std::any::type_name::<P>(), signal, slot, removed, "disconnect");
        }
        removed > 0
    }

    fn dispatch(&self, signal: &str, args: &Args) -> Result<Emission> {
        let (signal, snapshot) = {
            let table = self.connections.read();
            match table.get_key_value(signal) {
                Some((id, list)) => (id.clone(), list.clone()),
                None => {
                    error!(publisher = std::any::type_name::<P>(), signal, "emit of undeclared signal");
                    return Err(SignalError::undeclared_signal::<P>(signal));
                }
            }
        };

        fan_out(
            &signal,
            std::any::type_name::<P>(),
            &snapshot,
            args,
            self.settings.max_depth,
        )
    }
}

impl<P: Publisher> fmt::Debug for Signals<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.connections.read();
        let counts: Vec<_> = table
            .iter()
            .map(|(signal, list)| (signal.as_str(), list.len()))
            .collect();
        f.debug_struct("Signals")
            .field("id", &self.id)
            .field("publisher", &std::any::type_name::<P>())
            .field("connections", &counts)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
