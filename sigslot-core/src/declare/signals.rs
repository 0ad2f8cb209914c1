//! Signal declarations.
//!
//! A publisher type lists the signals it can raise once, in
//! [`Publisher::declare_signals`]. A type may also declare that it extends
//! another publisher: it then inherits the base type's signals, and the base
//! type appears in its lineage, which is what the access guard consults to
//! decide whether a caller belongs to the publisher's type hierarchy.

use std::any::TypeId;
use std::cell::RefCell;
use std::marker::PhantomData;

use indexmap::IndexSet;
use tracing::warn;

use super::cache;
use super::ids::SignalId;
use crate::config::DeclarationMode;
use crate::error::{Result, SignalError};

/// A type that raises signals.
///
/// # Example
///
/// ```rust
/// use sigslot_core::{Publisher, SignalDeclarations};
///
/// struct Person;
///
/// impl Publisher for Person {
///     fn declare_signals(decl: &mut SignalDeclarations<Self>) {
///         decl.signal("ready").signal("death");
///     }
/// }
/// ```
pub trait Publisher: Send + Sync + Sized + 'static {
    /// Register every signal of this type.
    ///
    /// Called at most once per declaration mode; the result is cached for
    /// the rest of the process. A type that (transitively) extends itself is
    /// a mis-declaration.
    fn declare_signals(decl: &mut SignalDeclarations<Self>);
}

thread_local! {
    /// Publisher types whose declarations are being built on this thread.
    static BUILDING: RefCell<Vec<TypeId>> = const { RefCell::new(Vec::new()) };
}

/// Marks a type as under construction; unmarks it on drop.
struct BuildGuard;

impl BuildGuard {
    /// `None` if `type_id` is already being built further up the stack.
    fn enter(type_id: TypeId) -> Option<Self> {
        BUILDING.with(|building| {
            let mut building = building.borrow_mut();
            if building.contains(&type_id) {
                return None;
            }
            building.push(type_id);
            Some(BuildGuard)
        })
    }
}

impl Drop for BuildGuard {
    fn drop(&mut self) {
        BUILDING.with(|building| {
            building.borrow_mut().pop();
        });
    }
}

/// Builder handed to [`Publisher::declare_signals`].
pub struct SignalDeclarations<P> {
    mode: DeclarationMode,
    signals: IndexSet<SignalId>,
    own: IndexSet<SignalId>,
    ancestors: IndexSet<TypeId>,
    problems: Vec<String>,
    _publisher: PhantomData<fn() -> P>,
}

impl<P: Publisher> SignalDeclarations<P> {
    fn new(mode: DeclarationMode) -> Self {
        Self {
            mode,
            signals: IndexSet::new(),
            own: IndexSet::new(),
            ancestors: IndexSet::new(),
            problems: Vec::new(),
            _publisher: PhantomData,
        }
    }

    /// Declare a signal.
    pub fn signal(&mut self, name: impl Into<SignalId>) -> &mut Self {
        let name = name.into();
        if name.as_str().is_empty() {
            self.reject("signal name is empty".to_string());
        } else if !self.own.insert(name.clone()) {
            self.reject(format!("signal '{name}' is declared twice"));
        } else {
            self.signals.insert(name);
        }
        self
    }

    /// Inherit the signals of `B` and record `B` (and its own ancestors) in
    /// this type's lineage.
    pub fn extends<B: Publisher>(&mut self) -> &mut Self {
        match cache::signals_of::<B>(self.mode) {
            Ok(base) => {
                self.signals.extend(base.signals.iter().cloned());
                self.ancestors.insert(base.type_id);
                self.ancestors.extend(base.ancestors.iter().copied());
            }
            Err(err) => self.reject(format!("base {}: {err}", std::any::type_name::<B>())),
        }
        self
    }

    fn reject(&mut self, reason: String) {
        match self.mode {
            DeclarationMode::Strict => self.problems.push(reason),
            DeclarationMode::Lenient => {
                warn!(publisher = std::any::type_name::<P>(), %reason, "skipping signal declaration");
            }
        }
    }

    pub(crate) fn build(mode: DeclarationMode) -> Result<SignalSet> {
        let Some(_guard) = BuildGuard::enter(TypeId::of::<P>()) else {
            return Err(SignalError::Configuration {
                type_name: std::any::type_name::<P>(),
                reason: "extends cycle: the type extends itself".to_string(),
            });
        };

        let mut decl = Self::new(mode);
        P::declare_signals(&mut decl);

        if !decl.problems.is_empty() {
            return Err(SignalError::Configuration {
                type_name: std::any::type_name::<P>(),
                reason: decl.problems.join("; "),
            });
        }

        Ok(SignalSet {
            type_id: TypeId::of::<P>(),
            type_name: std::any::type_name::<P>(),
            signals: decl.signals,
            ancestors: decl.ancestors,
        })
    }
}

/// The built, read-only signal declarations of one publisher type.
#[derive(Debug)]
pub struct SignalSet {
    type_id: TypeId,
    type_name: &'static str,
    signals: IndexSet<SignalId>,
    ancestors: IndexSet<TypeId>,
}

impl SignalSet {
    /// Type name of the publisher.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Look up a declared signal by name.
    pub fn get(&self, signal: &str) -> Option<&SignalId> {
        self.signals.get(signal)
    }

    /// Whether `signal` is declared.
    pub fn contains(&self, signal: &str) -> bool {
        self.signals.contains(signal)
    }

    /// Declared signals, own and inherited, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &SignalId> {
        self.signals.iter()
    }

    /// Whether the type is `ancestor` or declares that it extends it.
    pub fn descends_from(&self, ancestor: TypeId) -> bool {
        self.type_id == ancestor || self.ancestors.contains(&ancestor)
    }

    pub(crate) fn ancestors(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.ancestors.iter().copied()
    }
}
