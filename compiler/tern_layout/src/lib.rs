//! Type layout resolution for the binding pipeline.
//!
//! Answers one question per type: how big is it, and can a value of it
//! travel in registers? The answer is a [`LayoutFact`]; the classifier uses
//! it to pick between direct and indirect passing.
//!
//! # Sources of truth
//!
//! - Structural types (tuples, optionals, closures, existentials, metatypes)
//!   are laid out from the type tree alone.
//! - Scalars come from the [`TargetConfig`].
//! - Nominal types need their stored fields, which only a [`LayoutLookup`]
//!   knows: the library's own registrations ([`LibraryLayouts`]), a type
//!   catalog, or the standard library table ([`StdlibLayouts`]), chained
//!   with [`ChainedLookup`].
//!
//! A nominal type nobody knows is reported as [`LayoutOutcome::Unavailable`].
//! The resolver never guesses a size.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tern_ir::{PrimitiveKind, TupleElement, TypeNode};
//! use tern_layout::{LayoutResolver, NoLayouts, TargetConfig};
//!
//! let resolver = LayoutResolver::new(TargetConfig::host_64(), Arc::new(NoLayouts));
//! let pair = TypeNode::Tuple(vec![
//!     TupleElement::unlabeled(TypeNode::Primitive(PrimitiveKind::Int32)),
//!     TupleElement::unlabeled(TypeNode::Primitive(PrimitiveKind::Int32)),
//! ]);
//! let outcome = resolver.layout_of(&pair).unwrap();
//! let fact = outcome.fact().unwrap();
//! assert_eq!(fact.size, 8);
//! assert!(fact.is_direct_passable);
//! ```

mod fact;
mod lookup;
mod resolver;
mod stdlib;
mod target;

pub use fact::{EnumCase, FieldLayout, LayoutFact, LayoutOutcome, NominalLayout, NominalShape};
pub use lookup::{ChainedLookup, LayoutLookup, LibraryLayouts, NoLayouts};
pub use resolver::LayoutResolver;
pub use stdlib::StdlibLayouts;
pub use target::TargetConfig;
