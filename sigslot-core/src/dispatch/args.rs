//! Argument lists passed from an emission to every slot.

use std::ops::Deref;

use smallvec::SmallVec;

pub use serde_json::Value;

/// Configuration handed to a lazily constructed receiver.
pub type Config = serde_json::Map<String, Value>;

/// Number of arguments stored without a heap allocation.
pub const INLINE_ARGS: usize = 6;

/// An ordered list of dynamically typed arguments.
///
/// Arity is unbounded; the first [`INLINE_ARGS`] values live inline.
/// Build one with [`args!`](crate::args) or by chaining [`Args::with`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args(SmallVec<[Value; INLINE_ARGS]>);

impl Args {
    /// An empty argument list.
    pub fn new() -> Self {
        Self(SmallVec::new())
    }

    /// Append an argument, builder style.
    pub fn with(mut self, value: impl Into<Value>) -> Self {
        self.0.push(value.into());
        self
    }

    /// Append an argument.
    pub fn push(&mut self, value: impl Into<Value>) {
        self.0.push(value.into());
    }

    /// Whether the list outgrew its inline storage.
    pub fn spilled(&self) -> bool {
        self.0.spilled()
    }
}

impl Deref for Args {
    type Target = [Value];

    fn deref(&self) -> &[Value] {
        &self.0
    }
}

impl FromIterator<Value> for Args {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<Value>> for Args {
    fn from(values: Vec<Value>) -> Self {
        Self(SmallVec::from_vec(values))
    }
}

impl<'a> IntoIterator for &'a Args {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Build an [`Args`] list from expressions convertible into a `Value`.
///
/// ```rust
/// use sigslot_core::args;
///
/// let args = args!["Let's go!", 1_700_000_000_u64, true];
/// assert_eq!(args.len(), 3);
/// assert_eq!(args[0], "Let's go!");
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::Args::new()
    };
    ($($arg:expr),+ $(,)?) => {
        <$crate::Args as ::core::iter::FromIterator<$crate::Value>>::from_iter([
            $($crate::Value::from($arg)),+
        ])
    };
}
