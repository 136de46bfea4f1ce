//! Tern IR - the declaration and type model.
//!
//! This crate holds the data structures every other stage of the binding
//! pipeline speaks:
//! - [`Ident`] for shared, cheaply cloned identifier text
//! - [`TypeNode`] for structural type trees (hashable, so they can key caches)
//! - [`Declaration`] for one demangled symbol
//! - [`GenericSignature`] and [`Requirement`] for generic constraints
//! - [`ProtocolShape`] for the ordered requirement list of a protocol
//! - [`ClassificationError`] for every failure after demangling
//!
//! # Design Philosophy
//!
//! - **Immutable after construction**: a `Declaration` is produced once by the
//!   demangler and only read afterwards, so it is freely shared across threads.
//! - **Structural equality**: two independently parsed occurrences of the same
//!   type compare equal and hash identically. Caches key on the tree itself.
//! - **Normalized at construction**: standard-library scalars become
//!   [`TypeNode::Primitive`] and `Swift.Optional<T>` becomes
//!   [`TypeNode::Optional`] no matter which spelling the mangling used.

mod decl;
mod error;
mod flags;
mod generics;
mod ident;
mod protocol;
mod types;

pub use decl::{
    AccessorKind, ConstructorKind, Context, ContextSegment, DeclKind, DeclName, Declaration,
    DescriptorRole, DestructorKind, ExtensionContext, OperatorFixity, ProtocolConformance,
};
pub use error::{ClassificationError, LayoutUnavailable};
pub use flags::DeclFlags;
pub use generics::{GenericParamKey, GenericSignature, LayoutConstraint, Requirement};
pub use ident::Ident;
pub use protocol::{ProtocolRequirement, ProtocolShape, RequirementKind};
pub use types::{
    BuiltinKind, ExistentialType, FunctionConvention, FunctionType, NominalKind, NominalPath,
    NominalType, ParamConvention, Parameter, PrimitiveKind, TupleElement, TypeNode,
};

/// Name of the standard library module.
pub const STDLIB_MODULE: &str = "Swift";

/// Module that hosts imported C and Objective-C declarations.
pub const IMPORTED_MODULE: &str = "__C";
