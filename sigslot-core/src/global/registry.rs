//! Pair Registry
//!
//! The registry maps `(publisher, signal)` pairs to ordered lists of
//! `(receiver, slot)` pairs. Publishers need no embedded table: any type
//! implementing [`Publisher`] can emit through a registry by passing itself.
//!
//! # How It Works
//!
//! 1. `connect` validates the signal against the publisher type's
//!    declarations and the slot against the receiver type's, then appends a
//!    binding under the publisher's identity.
//!
//! 2. `emit` looks up the publisher's identity and the signal, snapshots the
//!    bindings and delivers in insertion order.
//!
//! 3. Entries stay until disconnected. Neither side's lifetime is extended:
//!    the registry holds weak references, skips receivers that are gone and
//!    drops dead entries on [`PairRegistry::prune`].
//!
//! # Thread Safety
//!
//! One `parking_lot::RwLock` guards the table: writers for
//! connect/disconnect, readers for the emission snapshot. No lock is held
//! while slots run.

use std::any::{Any, TypeId};
use std::sync::{Arc, OnceLock, Weak};

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::{debug, error};

use crate::config::DispatchSettings;
use crate::declare::{signals_of, slots_of, Construct, Publisher, Receiver, SignalId};
use crate::dispatch::{address_of, fan_out, Args, Binding, Config, Emission, ReceiverKey};
use crate::error::{Result, SignalError};

/// Identity of a publisher: its address and concrete type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PublisherKey {
    address: usize,
    type_id: TypeId,
}

impl PublisherKey {
    fn of<P: 'static>(publisher: &P) -> Self {
        Self {
            address: address_of(publisher),
            type_id: TypeId::of::<P>(),
        }
    }
}

/// Everything connected to one publisher.
struct PublisherEntry {
    /// Keeps the publisher's allocation reserved while the entry exists.
    pin: Weak<dyn Any + Send + Sync>,
    type_name: &'static str,
    signals: IndexMap<SignalId, Vec<Binding>>,
}

impl PublisherEntry {
    fn is_alive(&self) -> bool {
        self.pin.strong_count() > 0
    }
}

/// A table of publisher/signal to receiver/slot pairs.
pub struct PairRegistry {
    settings: DispatchSettings,
    pairs: RwLock<IndexMap<PublisherKey, PublisherEntry>>,
}

static GLOBAL: OnceLock<PairRegistry> = OnceLock::new();

impl PairRegistry {
    /// Create an empty registry with default settings.
    pub fn new() -> Self {
        Self::with_settings(DispatchSettings::default())
    }

    /// Create an empty registry with the given settings.
    pub fn with_settings(settings: DispatchSettings) -> Self {
        Self {
            settings,
            pairs: RwLock::new(IndexMap::new()),
        }
    }

    /// The process-wide registry, created with default settings on first
    /// use and alive until the process exits.
    pub fn global() -> &'static PairRegistry {
        GLOBAL.get_or_init(PairRegistry::new)
    }

    /// The settings this registry was created with.
    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    /// Connect `receiver`'s `slot` to `publisher`'s `signal`.
    pub fn connect<P: Publisher, R: Receiver>(
        &self,
        publisher: &Arc<P>,
        signal: &str,
        receiver: &Arc<R>,
        slot: &str,
    ) -> Result<()> {
        let (slot, handler) = slots_of::<R>(self.settings.declaration_mode)?.resolve(slot)?;
        let signal = self.declared_signal::<P>(signal)?;
        self.push(publisher, signal, Binding::live(receiver, slot, handler));
        Ok(())
    }

    /// Connect `slot` of receiver type `R` to `publisher`'s `signal`; a fresh
    /// `R` is constructed from `config` for every delivery.
    pub fn connect_lazy<P: Publisher, R: Construct>(
        &self,
        publisher: &Arc<P>,
        signal: &str,
        slot: &str,
        config: Config,
    ) -> Result<()> {
        let (slot, handler) = slots_of::<R>(self.settings.declaration_mode)?.resolve(slot)?;
        let signal = self.declared_signal::<P>(signal)?;
        self.push(publisher, signal, Binding::lazy::<R>(slot, handler, config));
        Ok(())
    }

    /// Remove every connection of `receiver`'s `slot` to `publisher`'s
    /// `signal`. Returns whether anything was removed.
    pub fn disconnect<P: 'static, R: 'static>(
        &self,
        publisher: &P,
        signal: &str,
        receiver: &R,
        slot: &str,
    ) -> bool {
        self.remove(PublisherKey::of(publisher), signal, ReceiverKey::live(receiver), slot)
    }

    /// Remove every lazy connection of `R`'s `slot` to `publisher`'s `signal`.
    pub fn disconnect_lazy<P: 'static, R: 'static>(&self, publisher: &P, signal: &str, slot: &str) -> bool {
        self.remove(PublisherKey::of(publisher), signal, ReceiverKey::lazy::<R>(), slot)
    }

    /// Remove everything connected to `publisher`. Returns the number of
    /// connections removed.
    pub fn disconnect_publisher<P: 'static>(&self, publisher: &P) -> usize {
        self.pairs
            .write()
            .shift_remove(&PublisherKey::of(publisher))
            .map_or(0, |entry| entry.signals.values().map(Vec::len).sum())
    }

    /// Emit `publisher`'s `signal` to every connected slot, in connection
    /// order.
    ///
    /// Fails with `UndeclaredSignal` if `signal` is not declared on `P`. A
    /// declared signal with no connections yields an empty [`Emission`].
    pub fn emit<P: Publisher>(&self, publisher: &P, signal: &str, args: Args) -> Result<Emission> {
        let signal = match self.declared_signal::<P>(signal) {
            Ok(signal) => signal,
            Err(err) => {
                error!(publisher = std::any::type_name::<P>(), signal, error = %err, "emit rejected");
                return Err(err);
            }
        };

        let snapshot = self
            .pairs
            .read()
            .get(&PublisherKey::of(publisher))
            .and_then(|entry| entry.signals.get(&signal))
            .cloned()
            .unwrap_or_default();

        fan_out(
            &signal,
            std::any::type_name::<P>(),
            &snapshot,
            &args,
            self.settings.max_depth,
        )
    }

    /// Number of connections to `publisher`'s `signal`.
    pub fn connection_count<P: 'static>(&self, publisher: &P, signal: &str) -> usize {
        self.pairs
            .read()
            .get(&PublisherKey::of(publisher))
            .and_then(|entry| entry.signals.get(signal))
            .map_or(0, Vec::len)
    }

    /// Number of publishers with at least one connection.
    pub fn publisher_count(&self) -> usize {
        self.pairs.read().len()
    }

    /// Drop connections whose live receiver is gone, and entries whose
    /// publisher is gone. Returns the number of connections dropped.
    pub fn prune(&self) -> usize {
        let mut pairs = self.pairs.write();
        let mut dropped = 0;

        pairs.retain(|_, entry| {
            if !entry.is_alive() {
                dropped += entry.signals.values().map(Vec::len).sum::<usize>();
                return false;
            }
            for list in entry.signals.values_mut() {
                let before = list.len();
                list.retain(Binding::is_alive);
                dropped += before - list.len();
            }
            entry.signals.retain(|_, list| !list.is_empty());
            !entry.signals.is_empty()
        });

        if dropped > 0 {
            debug!(dropped, "pruned dead connections");
        }
        dropped
    }

    /// Remove every connection.
    pub fn clear(&self) {
        self.pairs.write().clear();
    }

    fn declared_signal<P: Publisher>(&self, signal: &str) -> Result<SignalId> {
        signals_of::<P>(self.settings.declaration_mode)?
            .get(signal)
            .cloned()
            .ok_or_else(|| SignalError::undeclared_signal::<P>(signal))
    }

    fn push<P: Publisher>(&self, publisher: &Arc<P>, signal: SignalId, binding: Binding) {
        debug!(
            publisher = std::any::type_name::<P>(),
            %signal,
            slot = %binding.slot(),
            receiver = binding.receiver_type(),
            "connect"
        );

        let mut pairs = self.pairs.write();
        let entry = pairs
            .entry(PublisherKey::of::<P>(&**publisher))
            .or_insert_with(|| {
                let weak: Weak<P> = Arc::downgrade(publisher);
                let pin: Weak<dyn Any + Send + Sync> = weak;
                PublisherEntry {
                    pin,
                    type_name: std::any::type_name::<P>(),
                    signals: IndexMap::new(),
                }
            });
        entry.signals.entry(signal).or_default().push(binding);
    }

    fn remove(&self, publisher: PublisherKey, signal: &str, receiver: ReceiverKey, slot: &str) -> bool {
        let mut pairs = self.pairs.write();
        let Some(entry) = pairs.get_mut(&publisher) else {
            return false;
        };
        let Some(list) = entry.signals.get_mut(signal) else {
            return false;
        };

        let before = list.len();
        list.retain(|binding| !binding.matches(receiver, slot));
        let removed = before - list.len();

        if list.is_empty() {
            entry.signals.shift_remove(signal);
        }
        if removed > 0 {
            debug!(publisher = entry.type_name, signal, slot, removed, "disconnect");
        }
        if entry.signals.is_empty() {
            pairs.shift_remove(&publisher);
        }
        removed > 0
    }
}

impl Default for PairRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PairRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pairs = self.pairs.read();
        let publishers: Vec<_> = pairs
            .values()
            .map(|entry| (entry.type_name, entry.signals.values().map(Vec::len).sum::<usize>()))
            .collect();
        f.debug_struct("PairRegistry")
            .field("settings", &self.settings)
            .field("publishers", &publishers)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declare::{SignalDeclarations, SlotDeclarations};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Rock;

    impl Publisher for Rock {
        fn declare_signals(decl: &mut SignalDeclarations<Self>) {
            decl.signal("thrown");
        }
    }

    #[derive(Default)]
    struct Windshield {
        blownup_count: AtomicUsize,
    }

    impl Receiver for Windshield {
        fn declare_slots(decl: &mut SlotDeclarations<Self>) {
            decl.slot("blowup", |w, _| {
                w.blownup_count.fetch_add(1, Ordering::SeqCst);
            });
        }
    }

    impl Windshield {
        fn count(&self) -> usize {
            self.blownup_count.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn registries_are_independent() {
        let first = PairRegistry::new();
        let second = PairRegistry::new();
        let rock = Arc::new(Rock);
        let windshield = Arc::new(Windshield::default());

        first.connect(&rock, "thrown", &windshield, "blowup").unwrap();
        second.emit(&*rock, "thrown", Args::new()).unwrap();
        assert_eq!(windshield.count(), 0);

        first.emit(&*rock, "thrown", Args::new()).unwrap();
        assert_eq!(windshield.count(), 1);
    }

    #[test]
    fn publishers_are_told_apart_by_identity() {
        let registry = PairRegistry::new();
        let rock = Arc::new(Rock);
        let pebble = Arc::new(Rock);
        let windshield = Arc::new(Windshield::default());

        registry.connect(&rock, "thrown", &windshield, "blowup").unwrap();
        registry.emit(&*pebble, "thrown", Args::new()).unwrap();
        assert_eq!(windshield.count(), 0);
        assert_eq!(registry.connection_count(&*rock, "thrown"), 1);
        assert_eq!(registry.connection_count(&*pebble, "thrown"), 0);
    }

    #[test]
    fn validation_matches_instance_tables() {
        let registry = PairRegistry::new();
        let rock = Arc::new(Rock);
        let windshield = Arc::new(Windshield::default());

        let err = registry.connect(&rock, "thrown", &windshield, "shatter").unwrap_err();
        assert_eq!(err.as_label(), "undeclared_slot");

        let err = registry.connect(&rock, "rolled", &windshield, "blowup").unwrap_err();
        assert_eq!(err.as_label(), "undeclared_signal");

        let err = registry.emit(&*rock, "rolled", Args::new()).unwrap_err();
        assert_eq!(err.as_label(), "undeclared_signal");
        assert_eq!(registry.publisher_count(), 0);
    }

    #[test]
    fn empty_entries_are_removed() {
        let registry = PairRegistry::new();
        let rock = Arc::new(Rock);
        let windshield = Arc::new(Windshield::default());

        registry.connect(&rock, "thrown", &windshield, "blowup").unwrap();
        assert_eq!(registry.publisher_count(), 1);

        assert!(registry.disconnect(&*rock, "thrown", &*windshield, "blowup"));
        assert_eq!(registry.publisher_count(), 0);
        assert!(!registry.disconnect(&*rock, "thrown", &*windshield, "blowup"));
    }

    #[test]
    fn disconnect_publisher_and_clear() {
        let registry = PairRegistry::new();
        let rock = Arc::new(Rock);
        let windshield = Arc::new(Windshield::default());

        registry.connect(&rock, "thrown", &windshield, "blowup").unwrap();
        registry.connect(&rock, "thrown", &windshield, "blowup").unwrap();
        assert_eq!(registry.disconnect_publisher(&*rock), 2);
        assert_eq!(registry.disconnect_publisher(&*rock), 0);

        registry.connect(&rock, "thrown", &windshield, "blowup").unwrap();
        registry.clear();
        assert_eq!(registry.publisher_count(), 0);
    }

    #[test]
    fn registry_does_not_own_publishers() {
        let registry = PairRegistry::new();
        let rock = Arc::new(Rock);
        let windshield = Arc::new(Windshield::default());

        registry.connect(&rock, "thrown", &windshield, "blowup").unwrap();
        assert_eq!(Arc::strong_count(&rock), 1);
        assert_eq!(Arc::weak_count(&rock), 1);

        drop(rock);
        assert_eq!(registry.prune(), 1);
    }

    #[test]
    fn prune_drops_dead_receivers_and_publishers() {
        let registry = PairRegistry::new();
        let rock = Arc::new(Rock);
        let gone_rock = Arc::new(Rock);
        let kept = Arc::new(Windshield::default());
        let gone = Arc::new(Windshield::default());

        registry.connect(&rock, "thrown", &kept, "blowup").unwrap();
        registry.connect(&rock, "thrown", &gone, "blowup").unwrap();
        registry.connect(&gone_rock, "thrown", &kept, "blowup").unwrap();
        drop(gone);
        drop(gone_rock);

        let emission = registry.emit(&*rock, "thrown", Args::new()).unwrap();
        assert_eq!(emission.delivered(), 1);
        assert_eq!(emission.skipped(), 1);

        assert_eq!(registry.prune(), 2);
        assert_eq!(registry.publisher_count(), 1);
        assert_eq!(registry.connection_count(&*rock, "thrown"), 1);
        assert_eq!(registry.prune(), 0);
    }
}
