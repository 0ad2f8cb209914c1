//! Access Guard
//!
//! Raising a signal on a [`Signals`](super::Signals) table is restricted to
//! the publisher's own type hierarchy. Two surfaces enforce this:
//!
//! - [`Emitter`]: a capability created together with the table. The
//!   publisher keeps it in a private field, so ordinary visibility decides
//!   who may emit. An emitter only works on the table it was created with.
//! - [`Caller`]: the identity presented to the by-name `raise` surface. A
//!   caller is minted from an emitter and stays bound to that emitter's
//!   table. It may raise a signal on that table if its type is the
//!   publisher type or a type that declares (directly or transitively) that
//!   it extends the publisher.
//!
//! Creating a fresh table yields a fresh emitter, but that emitter is bound
//! to the fresh table: it cannot be used to raise on anyone else's.

use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::config::DeclarationMode;
use crate::declare::{signals_of, Publisher};
use crate::error::{Result, SignalError};

/// Capability to emit signals on one connection table.
pub struct Emitter<P> {
    table: u64,
    _publisher: PhantomData<fn() -> P>,
}

impl<P> Emitter<P> {
    pub(crate) fn new(table: u64) -> Self {
        Self {
            table,
            _publisher: PhantomData,
        }
    }

    /// Id of the table this emitter belongs to.
    pub fn table_id(&self) -> u64 {
        self.table
    }
}

impl<P> fmt::Debug for Emitter<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("publisher", &std::any::type_name::<P>())
            .field("table", &self.table)
            .finish()
    }
}

/// Identity of the code raising a signal by name.
#[derive(Debug, Clone)]
pub struct Caller {
    /// `None` for callers that hold no emitter.
    origin: Option<Origin>,
    type_name: &'static str,
}

#[derive(Debug, Clone)]
struct Origin {
    type_id: TypeId,
    table: u64,
    lineage: Arc<[TypeId]>,
}

impl Caller {
    /// The holder of `emitter`, with the lineage `C` declares through
    /// `extends`.
    pub fn of<C: Publisher>(emitter: &Emitter<C>) -> Self {
        // Lenient builds never fail, and lineage does not depend on mode.
        let lineage = signals_of::<C>(DeclarationMode::Lenient)
            .map(|set| set.ancestors().collect::<Arc<[TypeId]>>())
            .unwrap_or_else(|_| Arc::from(Vec::new()));

        Self {
            origin: Some(Origin {
                type_id: TypeId::of::<C>(),
                table: emitter.table,
                lineage,
            }),
            type_name: std::any::type_name::<C>(),
        }
    }

    /// Any code without an emitter. Such a caller may never raise.
    pub fn foreign<C: ?Sized + 'static>() -> Self {
        Self {
            origin: None,
            type_name: std::any::type_name::<C>(),
        }
    }

    /// Type name of the caller.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Id of the table this caller's emitter belongs to.
    pub fn table_id(&self) -> Option<u64> {
        self.origin.as_ref().map(|origin| origin.table)
    }

    /// Whether this caller's type is `P` or one of its subtypes.
    pub fn descends_from<P: 'static>(&self) -> bool {
        let publisher = TypeId::of::<P>();
        self.origin
            .as_ref()
            .is_some_and(|origin| origin.type_id == publisher || origin.lineage.contains(&publisher))
    }
}

/// Reject callers outside `P`'s hierarchy or bound to another table.
pub(crate) fn check_caller<P: Publisher>(caller: &Caller, table: u64, signal: &str) -> Result<()> {
    if caller.table_id() == Some(table) && caller.descends_from::<P>() {
        Ok(())
    } else {
        Err(SignalError::MemberAccess {
            signal: signal.to_string(),
            caller: caller.type_name(),
            publisher: std::any::type_name::<P>(),
        })
    }
}

/// Reject emitters minted for another table.
pub(crate) fn check_emitter<P: Publisher>(emitter: &Emitter<P>, table: u64, signal: &str) -> Result<()> {
    if emitter.table == table {
        Ok(())
    } else {
        Err(SignalError::MemberAccess {
            signal: signal.to_string(),
            caller: "emitter of another table",
            publisher: std::any::type_name::<P>(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declare::SignalDeclarations;

    struct Person;

    impl Publisher for Person {
        fn declare_signals(decl: &mut SignalDeclarations<Self>) {
            decl.signal("ready");
        }
    }

    struct Hero;

    impl Publisher for Hero {
        fn declare_signals(decl: &mut SignalDeclarations<Self>) {
            decl.extends::<Person>();
        }
    }

    struct Champion;

    impl Publisher for Champion {
        fn declare_signals(decl: &mut SignalDeclarations<Self>) {
            decl.extends::<Hero>();
        }
    }

    struct Stranger;

    #[test]
    fn own_type_and_subtypes_may_raise() {
        assert!(Caller::of(&Emitter::<Person>::new(1)).descends_from::<Person>());
        assert!(Caller::of(&Emitter::<Hero>::new(1)).descends_from::<Person>());

        let champion = Caller::of(&Emitter::<Champion>::new(1));
        assert!(champion.descends_from::<Person>());
        assert!(check_caller::<Person>(&champion, 1, "ready").is_ok());
    }

    #[test]
    fn base_types_and_strangers_may_not() {
        assert!(!Caller::of(&Emitter::<Person>::new(1)).descends_from::<Hero>());

        let stranger = Caller::foreign::<Stranger>();
        assert_eq!(stranger.table_id(), None);
        let err = check_caller::<Person>(&stranger, 1, "ready").unwrap_err();
        assert!(matches!(err, SignalError::MemberAccess { ref signal, .. } if signal == "ready"));
        assert!(err.to_string().contains("Stranger"));
    }

    #[test]
    fn foreign_callers_cannot_claim_a_publisher_type() {
        let impostor = Caller::foreign::<Person>();
        assert!(!impostor.descends_from::<Person>());
        assert!(check_caller::<Person>(&impostor, 1, "ready").is_err());
    }

    #[test]
    fn callers_are_bound_to_their_table() {
        let caller = Caller::of(&Emitter::<Person>::new(3));
        assert_eq!(caller.table_id(), Some(3));
        assert!(check_caller::<Person>(&caller, 3, "ready").is_ok());
        assert_eq!(check_caller::<Person>(&caller, 4, "ready").unwrap_err().as_label(), "member_access");
    }

    #[test]
    fn emitters_are_bound_to_their_table() {
        let emitter = Emitter::<Person>::new(7);
        assert_eq!(emitter.table_id(), 7);
        assert!(check_emitter(&emitter, 7, "ready").is_ok());
        assert_eq!(check_emitter(&emitter, 8, "ready").unwrap_err().as_label(), "member_access");
    }
}
