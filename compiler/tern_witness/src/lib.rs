//! Witness-table plumbing for generic calls.
//!
//! Two questions are answered here:
//!
//! - [`resolve`]: which witness tables a generic signature makes the caller
//!   pass, and in what order.
//! - [`map_witnesses`]: which witness-table slot each protocol witness thunk
//!   of a conformance occupies.

mod resolve;
mod witness_map;

pub use resolve::{resolve, WitnessKind, WitnessRequirement};
pub use witness_map::{map_witnesses, WitnessEntry, WitnessTableMap, CONFORMANCE_DESCRIPTOR_SLOT};
