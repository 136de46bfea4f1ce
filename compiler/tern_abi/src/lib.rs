//! Calling-convention classification for demangled declarations.
//!
//! Given a [`Declaration`](tern_ir::Declaration) and a [`LayoutResolver`]
//! that knows the library's types, this crate decides how every argument,
//! the return value and the generic plumbing of a call cross the native
//! boundary:
//!
//! 1. [`resolve_signature`]: effective generic signature and the witness
//!    tables it requires
//! 2. [`classify`]: one [`CallingConventionSlot`] per argument position
//! 3. [`BindingPlanBuilder`]: order check and packaging into a
//!    [`BindingPlan`]
//!
//! [`BindingPlanBuilder::plan`] runs all three.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tern_abi::{BindingPlanBuilder, CallingConventionSlot};
//! use tern_layout::{LayoutResolver, StdlibLayouts, TargetConfig};
//!
//! let target = TargetConfig::host_64();
//! let resolver = LayoutResolver::new(target, Arc::new(StdlibLayouts::new(&target)));
//! let decl = tern_demangle::demangle("$s4main3addyS2i_SitF").unwrap();
//! let plan = BindingPlanBuilder::new(&resolver).plan(&decl).unwrap();
//! assert_eq!(plan.parameter_slots.len(), 2);
//! assert!(matches!(
//!     plan.return_slot,
//!     Some(CallingConventionSlot::DirectValue { word_count: 1, .. })
//! ));
//! ```
//!
//! [`LayoutResolver`]: tern_layout::LayoutResolver

mod classify;
#[cfg(test)]
mod fixtures;
mod plan;
mod signature;
mod slot;

pub use classify::{classify, ClassifiedSlots};
pub use plan::{BindingPlan, BindingPlanBuilder};
pub use signature::{effective_signature, resolve_signature, ResolvedSignature};
pub use slot::{CallingConventionSlot, Ownership, SelfPassing};
