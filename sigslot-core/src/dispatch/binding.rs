//! Type-erased connections.
//!
//! A [`Binding`] is what a connection table stores for one
//! `(receiver, slot)` pair. The receiver's concrete type is erased behind the
//! invoke closure, so bindings to different receiver types share one list.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::{Arc, Weak};

use super::args::{Args, Config};
use crate::declare::{Construct, Receiver, SlotFn, SlotId};

/// Identity of the receiver side of a connection.
///
/// Live receivers are identified by allocation and type, lazy receivers by
/// type alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ReceiverKey {
    Live { address: usize, type_id: TypeId },
    Lazy { type_id: TypeId },
}

impl ReceiverKey {
    pub(crate) fn live<R: 'static>(receiver: &R) -> Self {
        ReceiverKey::Live {
            address: address_of(receiver),
            type_id: TypeId::of::<R>(),
        }
    }

    pub(crate) fn lazy<R: 'static>() -> Self {
        ReceiverKey::Lazy { type_id: TypeId::of::<R>() }
    }
}

/// Address of a value, used as its identity.
pub(crate) fn address_of<T>(value: &T) -> usize {
    value as *const T as *const () as usize
}

/// Outcome of handing arguments to one binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    Delivered,
    /// The live receiver has been dropped.
    Dropped,
}

type Invoke = dyn Fn(&Args) -> Delivery + Send + Sync;

/// One connection: a receiver and the slot to call on it.
#[derive(Clone)]
pub(crate) struct Binding {
    key: ReceiverKey,
    receiver_type: &'static str,
    slot: SlotId,
    /// Keeps the receiver's allocation (not its value) alive so the address
    /// in `key` cannot be reused while the binding exists.
    pin: Option<Weak<dyn Any + Send + Sync>>,
    invoke: Arc<Invoke>,
}

impl Binding {
    /// Bind a live receiver. The binding holds only a weak reference.
    pub(crate) fn live<R: Receiver>(receiver: &Arc<R>, slot: SlotId, handler: SlotFn<R>) -> Self {
        let weak = Arc::downgrade(receiver);
        let target = weak.clone();
        let invoke = move |args: &Args| match target.upgrade() {
            Some(receiver) => {
                handler(&*receiver, args);
                Delivery::Delivered
            }
            None => Delivery::Dropped,
        };
        let pin: Weak<dyn Any + Send + Sync> = weak;

        Self {
            key: ReceiverKey::live(&**receiver),
            receiver_type: std::any::type_name::<R>(),
            slot,
            pin: Some(pin),
            invoke: Arc::new(invoke),
        }
    }

    /// Bind a receiver type; a fresh `R` is constructed from `config` on
    /// every delivery.
    pub(crate) fn lazy<R: Construct>(slot: SlotId, handler: SlotFn<R>, config: Config) -> Self {
        let invoke = move |args: &Args| {
            let receiver = R::construct(&config);
            handler(&receiver, args);
            Delivery::Delivered
        };

        Self {
            key: ReceiverKey::lazy::<R>(),
            receiver_type: std::any::type_name::<R>(),
            slot,
            pin: None,
            invoke: Arc::new(invoke),
        }
    }

    pub(crate) fn matches(&self, key: ReceiverKey, slot: &str) -> bool {
        self.key == key && self.slot.as_str() == slot
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.pin.as_ref().map_or(true, |pin| pin.strong_count() > 0)
    }

    pub(crate) fn slot(&self) -> &SlotId {
        &self.slot
    }

    pub(crate) fn receiver_type(&self) -> &'static str {
        self.receiver_type
    }

    pub(crate) fn deliver(&self, args: &Args) -> Delivery {
        (self.invoke)(args)
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("receiver", &self.receiver_type)
            .field("slot", &self.slot)
            .field("lazy", &matches!(self.key, ReceiverKey::Lazy { .. }))
            .field("alive", &self.is_alive())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declare::SlotDeclarations;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static CONSTRUCTED: AtomicUsize = AtomicUsize::new(0);

    #[derive(Default)]
    struct Tire {
        times_blown: AtomicUsize,
    }

    impl Receiver for Tire {
        fn declare_slots(decl: &mut SlotDeclarations<Self>) {
            decl.slot("blow", |tire, _| {
                tire.times_blown.fetch_add(1, Ordering::SeqCst);
            });
        }
    }

    impl Construct for Tire {
        fn construct(_config: &Config) -> Self {
            CONSTRUCTED.fetch_add(1, Ordering::SeqCst);
            Tire::default()
        }
    }

    fn blow() -> SlotFn<Tire> {
        Arc::new(|tire: &Tire, _: &Args| {
            tire.times_blown.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn live_binding_reaches_receiver() {
        let tire = Arc::new(Tire::default());
        let binding = Binding::live(&tire, SlotId::new("blow"), blow());

        assert_eq!(binding.deliver(&Args::new()), Delivery::Delivered);
        assert_eq!(binding.deliver(&Args::new()), Delivery::Delivered);
        assert_eq!(tire.times_blown.load(Ordering::SeqCst), 2);
        assert!(binding.matches(ReceiverKey::live(&*tire), "blow"));
        assert!(!binding.matches(ReceiverKey::live(&*tire), "patch"));
    }

    #[test]
    fn live_binding_does_not_own_receiver() {
        let tire = Arc::new(Tire::default());
        let binding = Binding::live(&tire, SlotId::new("blow"), blow());
        assert!(binding.is_alive());

        drop(tire);
        assert!(!binding.is_alive());
        assert_eq!(binding.deliver(&Args::new()), Delivery::Dropped);
    }

    #[test]
    fn lazy_binding_constructs_per_delivery() {
        let binding = Binding::lazy::<Tire>(SlotId::new("blow"), blow(), Config::new());
        let before = CONSTRUCTED.load(Ordering::SeqCst);

        binding.deliver(&Args::new());
        binding.deliver(&Args::new());

        assert_eq!(CONSTRUCTED.load(Ordering::SeqCst) - before, 2);
        assert!(binding.matches(ReceiverKey::lazy::<Tire>(), "blow"));
        assert!(binding.is_alive());
    }
}
