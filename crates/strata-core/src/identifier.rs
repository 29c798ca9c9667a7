//! Interned keys for nodes and edges.
//!
//! Nodes and edges are identified by caller-supplied keys. The [`Id`] type
//! wraps an interned symbol so that keys are `Copy`, cheap to hash, and compare
//! by value rather than by object identity.

use std::{
    fmt,
    sync::{Mutex, OnceLock},
};

use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Process-wide symbol table behind every [`Id`].
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

/// Prefix reserved for identifiers generated by the engines themselves.
const ANONYMOUS_PREFIX: &str = "__anon#";

fn with_interner<R>(f: impl FnOnce(&mut DefaultStringInterner) -> R) -> R {
    let mut interner = INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .expect("identifier table lock poisoned");
    f(&mut interner)
}

/// Value-typed key for graph nodes and edges.
///
/// Two `Id`s are equal exactly when they were created from the same string.
///
/// # Examples
///
/// ```
/// use strata_core::identifier::Id;
///
/// let a = Id::new("service_a");
/// let b: Id = "service_a".into();
/// assert_eq!(a, b);
/// assert_eq!(a, "service_a");
///
/// // Engine-generated identifiers
/// let dummy = Id::from_anonymous(3);
/// assert!(dummy.is_anonymous());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Interns `name`, returning the same `Id` for equal strings.
    pub fn new(name: &str) -> Self {
        Self(with_interner(|interner| interner.get_or_intern(name)))
    }

    /// Creates an internal `Id` that does not come from the caller.
    ///
    /// The layout engines use these for dummy nodes and synthetic edge keys.
    /// Callers should check [`Id::is_anonymous`] rather than rely on the
    /// textual form.
    pub fn from_anonymous(idx: usize) -> Self {
        let name = format!("{ANONYMOUS_PREFIX}{idx}");
        Self::new(&name)
    }

    /// Returns true if this identifier was produced by [`Id::from_anonymous`].
    pub fn is_anonymous(self) -> bool {
        with_interner(|interner| {
            interner
                .resolve(self.0)
                .is_some_and(|name| name.starts_with(ANONYMOUS_PREFIX))
        })
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = with_interner(|interner| {
            interner
                .resolve(self.0)
                .expect("every Id is interned")
                .to_string()
        });
        write!(f, "{name}")
    }
}

impl From<&str> for Id {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for Id {
    fn eq(&self, other: &str) -> bool {
        with_interner(|interner| {
            interner
                .resolve(self.0)
                .expect("every Id is interned")
                == other
        })
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_new() {
        let id1 = Id::new("Rectangle");
        let id2 = Id::new("Rectangle");
        let id3 = Id::new("Oval");

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
        assert_eq!(id1, "Rectangle");
    }

    #[test]
    fn test_from_anonymous() {
        let id1 = Id::from_anonymous(0);
        let id2 = Id::from_anonymous(1);
        let id3 = Id::from_anonymous(0);

        assert_ne!(id1, id2);
        assert_eq!(id1, id3);
        assert!(id1.is_anonymous());
        assert!(!Id::new("node").is_anonymous());
    }

    #[test]
    fn test_hash_follows_value() {
        let mut set = HashSet::new();
        set.insert(Id::new("a"));
        set.insert(Id::new("a"));
        set.insert(Id::new("b"));
        assert_eq!(set.len(), 2);
        assert!(set.contains(&Id::from("a")));
    }

    #[test]
    fn test_display() {
        assert_eq!(Id::new("node_42").to_string(), "node_42");
    }
}
