//! Type algebra.
//!
//! Elementary types (`bool`, `uint`, `address`) plus the composite
//! `mapping(address!tag => T)` and function types, each optionally paired
//! with a [`Label`] to form an annotated type `T@L`.

use std::fmt;
use veil_base::Symbol;

use crate::label::Label;
use crate::partition::PartitionState;

/// An elementary or composite type, ignoring privacy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Bool,
    /// A fixed-width unsigned integer, e.g. `uint` or `uint32`.
    Uint(u32),
    Address,
    /// `mapping(address!tag => value)`. `tag` is a purely documentary name
    /// for the key's ownership role — it has no effect on assignability.
    Mapping {
        tag: Symbol,
        value: Box<Type>,
    },
    /// A function signature: parameter and return annotated types.
    Function {
        params: Vec<AnnotatedType>,
        returns: Vec<AnnotatedType>,
    },
}

impl Type {
    /// Only elementary types and mappings of elementary types may carry a
    /// non-`all` label.
    pub fn can_carry_label(&self) -> bool {
        match self {
            Type::Bool | Type::Uint(_) | Type::Address => true,
            Type::Mapping { value, .. } => value.can_carry_label(),
            Type::Function { .. } => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bool => write!(f, "bool"),
            Type::Uint(width) => write!(f, "uint{}", width),
            Type::Address => write!(f, "address"),
            Type::Mapping { value, .. } => write!(f, "mapping(address => {})", value),
            Type::Function { params, returns } => {
                write!(f, "function(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p.ty)?;
                }
                write!(f, ")")?;
                if !returns.is_empty() {
                    write!(f, " returns (")?;
                    for (i, r) in returns.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", r.ty)?;
                    }
                    write!(f, ")")?;
                }
                Ok(())
            }
        }
    }
}

/// A type paired with the privacy label that restricts who may read it.
///
/// `T@L` is the annotated-type notation from the source language; a bare
/// `T` is sugar for `(T, all)` ([`AnnotatedType::public`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedType {
    pub ty: Type,
    pub label: Label,
}

impl AnnotatedType {
    /// Builds `(ty, label)` directly.
    pub fn new(ty: Type, label: Label) -> Self {
        AnnotatedType { ty, label }
    }

    /// Builds the public annotated type `(ty, all)`.
    pub fn public(ty: Type) -> Self {
        AnnotatedType { ty, label: Label::All }
    }

    /// Assignment compatibility: `self ≤ other` iff the underlying types
    /// are identical and either `self` is public (widening a public value
    /// into any target is always safe), or `self` and `other`'s labels are
    /// proven equivalent by `partition`. A public `other` does not by
    /// itself permit the assignment — narrowing a private `self` into a
    /// public target without `reveal` must still be rejected.
    ///
    /// `partition` is the statement's `before_analysis` partition state —
    /// the caller is expected to have both labels already inserted into it
    /// when they are address-valued names in scope.
    pub fn assignable_to(&self, other: &AnnotatedType, partition: &PartitionState) -> bool {
        if self.ty != other.ty {
            return false;
        }
        if self.label.is_all() {
            return true;
        }
        partition.has(self.label) && partition.has(other.label)
            && partition.same_partition(self.label, other.label)
    }
}

impl fmt::Display for AnnotatedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.label.is_all() {
            write!(f, "{}", self.ty)
        } else {
            write!(f, "{}@{:?}", self.ty, self.label)
        }
    }
}
