//! Generic signatures.

use std::fmt;

use crate::{NominalPath, TypeNode};

/// Position of a generic parameter: nesting depth of the generic context and
/// index within that context.
///
/// `<T, U>` on a top-level function are `(0, 0)` and `(0, 1)`; a generic
/// method `<V>` inside `struct Box<T>` introduces `(1, 0)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenericParamKey {
    pub depth: u32,
    pub index: u32,
}

impl GenericParamKey {
    pub const fn new(depth: u32, index: u32) -> Self {
        GenericParamKey { depth, index }
    }
}

impl fmt::Display for GenericParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "τ_{}_{}", self.depth, self.index)
    }
}

/// Layout constraints (`T: AnyObject`, `T: _Trivial`, ...).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LayoutConstraint {
    Unknown,
    RefCounted,
    NativeRefCounted,
    Class,
    NativeClass,
    Trivial,
    TrivialOfExactSize(u32),
    TrivialOfAtMostSize(u32),
}

/// One `where`-clause requirement.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Requirement {
    /// `subject: Protocol`
    Conformance {
        subject: TypeNode,
        protocol: NominalPath,
    },
    /// `subject: SomeClass`
    BaseClass { subject: TypeNode, class: TypeNode },
    /// `subject == target`
    SameType { subject: TypeNode, target: TypeNode },
    /// `subject: AnyObject` and friends
    Layout {
        subject: TypeNode,
        constraint: LayoutConstraint,
    },
}

impl Requirement {
    pub fn subject(&self) -> &TypeNode {
        match self {
            Requirement::Conformance { subject, .. }
            | Requirement::BaseClass { subject, .. }
            | Requirement::SameType { subject, .. }
            | Requirement::Layout { subject, .. } => subject,
        }
    }
}

/// Generic parameters in declaration order plus their requirements in
/// declared order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenericSignature {
    pub params: Vec<GenericParamKey>,
    pub requirements: Vec<Requirement>,
}

impl GenericSignature {
    pub fn empty() -> Self {
        GenericSignature::default()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty() && self.requirements.is_empty()
    }

    /// Position of `key` in the parameter list.
    pub fn position(&self, key: GenericParamKey) -> Option<usize> {
        self.params.iter().position(|param| *param == key)
    }

    /// Deepest generic context the signature introduces parameters for.
    pub fn max_depth(&self) -> Option<u32> {
        self.params.iter().map(|param| param.depth).max()
    }

    /// Append `other`'s parameters and requirements after this signature's.
    ///
    /// Parameters already present are not duplicated.
    pub fn extend(&mut self, other: &GenericSignature) {
        for param in &other.params {
            if !self.params.contains(param) {
                self.params.push(*param);
            }
        }
        self.requirements.extend(other.requirements.iter().cloned());
    }
}
