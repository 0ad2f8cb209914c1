//! Per-type declaration cache.
//!
//! Declarations are built the first time a type is used and then shared for
//! the rest of the process. The cache is keyed by the builder's `TypeId` and
//! the declaration mode, since lenient and strict builds of the same type can
//! differ.

use std::any::{Any, TypeId};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

use super::signals::{Publisher, SignalDeclarations, SignalSet};
use super::slots::{Receiver, SlotDeclarations, SlotSet};
use crate::config::DeclarationMode;
use crate::error::Result;

type Key = (TypeId, DeclarationMode);

static DECLARATIONS: OnceLock<DashMap<Key, Arc<dyn Any + Send + Sync>>> = OnceLock::new();

fn declarations() -> &'static DashMap<Key, Arc<dyn Any + Send + Sync>> {
    DECLARATIONS.get_or_init(DashMap::new)
}

/// Cached lookup, building with `build` on a miss.
///
/// The map guard is released before `build` runs: building a type's
/// declarations may look up other types (`extends`).
fn cached<T, F>(key: Key, build: F) -> Result<Arc<T>>
where
    T: Send + Sync + 'static,
    F: FnOnce() -> Result<T>,
{
    let hit = declarations()
        .get(&key)
        .map(|entry| Arc::clone(entry.value()));
    if let Some(found) = hit.and_then(|any| any.downcast::<T>().ok()) {
        return Ok(found);
    }

    let built = Arc::new(build()?);
    let erased: Arc<dyn Any + Send + Sync> = built.clone();
    let stored = declarations().entry(key).or_insert(erased).value().clone();
    Ok(stored.downcast::<T>().unwrap_or(built))
}

/// Signal declarations of `P`.
pub(crate) fn signals_of<P: Publisher>(mode: DeclarationMode) -> Result<Arc<SignalSet>> {
    cached((TypeId::of::<SignalDeclarations<P>>(), mode), || {
        SignalDeclarations::<P>::build(mode)
    })
}

/// Slot declarations of `R`.
pub(crate) fn slots_of<R: Receiver>(mode: DeclarationMode) -> Result<Arc<SlotSet<R>>> {
    cached((TypeId::of::<SlotSet<R>>(), mode), || SlotDeclarations::<R>::build(mode))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static BUILDS: AtomicUsize = AtomicUsize::new(0);

    struct Counted;

    impl Publisher for Counted {
        fn declare_signals(decl: &mut SignalDeclarations<Self>) {
            BUILDS.fetch_add(1, Ordering::SeqCst);
            decl.signal("counted");
        }
    }

    #[test]
    fn builds_once_per_mode() {
        let first = signals_of::<Counted>(DeclarationMode::Strict).unwrap();
        let second = signals_of::<Counted>(DeclarationMode::Strict).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(BUILDS.load(Ordering::SeqCst), 1);

        let lenient = signals_of::<Counted>(DeclarationMode::Lenient).unwrap();
        assert!(lenient.contains("counted"));
        assert_eq!(BUILDS.load(Ordering::SeqCst), 2);
    }
}
