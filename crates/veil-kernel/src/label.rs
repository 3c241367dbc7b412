//! Privacy labels.
//!
//! A label says who may read a value: everyone (`all`), the current
//! transaction sender (`me`), or whoever the named address-typed variable
//! currently points to (`Id`).
//!
//! # Example
//!
//! ```
//! use veil_base::Interner;
//! use veil_kernel::Label;
//!
//! let mut interner = Interner::new();
//! let alice = interner.intern("alice");
//!
//! assert!(Label::All.is_all());
//! assert!(Label::Me.is_me());
//! assert!(!Label::Id(alice).is_all());
//! assert_eq!(Label::Id(alice), Label::Id(alice));
//! ```

use veil_base::{Interner, Symbol};

/// Who may view a value carrying this label.
///
/// Equality is structural: two `Id` labels are equal only if they name the
/// same interned identifier. `Label` carries no notion of equivalence
/// across program points — that is what [`crate::PartitionState`] tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    /// Public: readable by everyone.
    All,
    /// Readable only by the current transaction sender.
    Me,
    /// Readable only by the address held by the named variable/parameter.
    Id(Symbol),
}

impl Label {
    /// Returns `true` if this label is `all`.
    pub fn is_all(&self) -> bool {
        matches!(self, Label::All)
    }

    /// Returns `true` if this label is `me`.
    pub fn is_me(&self) -> bool {
        matches!(self, Label::Me)
    }

    /// Structural equality, spelled out for readability at call sites that
    /// already hold two labels rather than relying on `PartialEq`.
    pub fn equal(&self, other: &Label) -> bool {
        self == other
    }

    /// Renders the label using the source syntax it displays as, resolving
    /// `Id` symbols through `interner`.
    pub fn display<'a>(&self, interner: &'a Interner) -> std::borrow::Cow<'a, str> {
        match self {
            Label::All => std::borrow::Cow::Borrowed("all"),
            Label::Me => std::borrow::Cow::Borrowed("me"),
            Label::Id(sym) => std::borrow::Cow::Borrowed(interner.resolve(*sym)),
        }
    }
}
