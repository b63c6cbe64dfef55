//! Element identifiers backed by a global string interner.
//!
//! Every element in a scene is addressed by an [`Id`]. Model files carry ids
//! as strings; interning them once makes the ids `Copy` and turns the many
//! parent/child/endpoint comparisons the controller performs into integer
//! comparisons.

use std::{
    fmt,
    sync::{Mutex, OnceLock, PoisonError},
};

use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Global string interner for identifier storage.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn with_interner<R>(f: impl FnOnce(&mut DefaultStringInterner) -> R) -> R {
    let mut interner = INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    f(&mut interner)
}

/// Interned element identifier.
///
/// # Examples
///
/// ```
/// use meridian_core::identifier::Id;
///
/// let node = Id::new("node-1");
/// let same: Id = "node-1".into();
///
/// assert_eq!(node, same);
/// assert_eq!(node, "node-1");
/// assert_eq!(node.to_string(), "node-1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Creates an `Id` from a string, interning it on first use.
    pub fn new(name: &str) -> Self {
        Self(with_interner(|interner| interner.get_or_intern(name)))
    }

    /// Returns true when the identifier is the empty string.
    pub fn is_empty(self) -> bool {
        self == ""
    }

    fn resolve<R>(self, f: impl FnOnce(&str) -> R) -> R {
        with_interner(|interner| f(interner.resolve(self.0).unwrap_or_default()))
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.resolve(str::to_owned);
        f.write_str(&value)
    }
}

impl From<&str> for Id {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<&String> for Id {
    fn from(name: &String) -> Self {
        Self::new(name)
    }
}

impl From<Id> for String {
    fn from(id: Id) -> Self {
        id.to_string()
    }
}

impl PartialEq<str> for Id {
    fn eq(&self, other: &str) -> bool {
        self.resolve(|value| value == other)
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}
