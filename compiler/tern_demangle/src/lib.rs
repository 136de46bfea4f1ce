//! Demangler for `$s`-mangled native library symbols.
//!
//! Turns an exported symbol name into a [`Declaration`]: owning module and
//! nominal path, entity kind, generic signature, parameters and result. The
//! output feeds the layout resolver and the calling-convention classifier, so
//! it keeps only what those need and never produces a pretty-printed name.
//!
//! # Design
//!
//! Parsing and lowering are separate passes:
//!
//! - **Parse** (`parser`): an explicit-stack operator machine over the bytes
//!   of the symbol. It builds a node DAG in an arena; substitutions share
//!   nodes instead of copying them. Nothing here recurses.
//! - **Lower** (`lower`): a recursive walk from the root node to `tern_ir`
//!   values. Nesting is bounded by a [`DepthBudget`] and total work by
//!   [`DemangleConfig::max_type_nodes`], so hostile input fails with an error
//!   instead of exhausting memory or stack.
//!
//! Every call owns its parser, arena and substitution table. Concurrent calls
//! share nothing, and a failed call leaves nothing behind.
//!
//! # Example
//!
//! ```
//! use tern_demangle::demangle;
//!
//! let decl = demangle("$s4main3addyS2i_SitF").unwrap();
//! assert_eq!(decl.name_text(), "add");
//! assert_eq!(decl.params.len(), 2);
//! ```

mod cursor;
mod error;
mod lower;
mod node;
mod parser;
pub mod punycode;
mod standard;

pub use error::{DemangleError, DemangleErrorKind};

use tern_ir::{Declaration, TypeNode};
use tern_stack::{DepthBudget, DEFAULT_MAX_DEPTH};

use crate::lower::Lowerer;
use crate::parser::Parser;

/// Limits applied while demangling one symbol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DemangleConfig {
    /// Maximum nesting of the lowered tree.
    pub max_depth: u32,
    /// Maximum repeat count of a single substitution (`A12a`, `S4i`).
    pub max_repeat: u32,
    /// Maximum parse nodes allocated for one symbol.
    pub max_nodes: usize,
    /// Maximum type and context nodes visited while lowering. Substitutions
    /// can make a short symbol describe a very large tree.
    pub max_type_nodes: usize,
}

impl Default for DemangleConfig {
    fn default() -> Self {
        DemangleConfig {
            max_depth: DEFAULT_MAX_DEPTH,
            max_repeat: 2048,
            max_nodes: 65_536,
            max_type_nodes: 100_000,
        }
    }
}

/// Prefixes accepted by [`demangle`], longest first.
const PREFIXES: [&str; 4] = ["_$s", "_$S", "$s", "$S"];

fn prefix_len(symbol: &str) -> Option<usize> {
    PREFIXES
        .iter()
        .find(|prefix| symbol.starts_with(**prefix))
        .map(|prefix| prefix.len())
}

/// Demangle `symbol` with the default limits.
pub fn demangle(symbol: &str) -> Result<Declaration, DemangleError> {
    demangle_with(symbol, &DemangleConfig::default())
}

/// Demangle `symbol` into a declaration.
///
/// # Errors
///
/// Returns [`DemangleErrorKind::UnsupportedPrefix`] at offset 0 for symbols
/// that do not use the `$s` mangling, and a positioned error for malformed,
/// truncated or unsupported input. No partial declaration is returned.
pub fn demangle_with(symbol: &str, config: &DemangleConfig) -> Result<Declaration, DemangleError> {
    let Some(start) = prefix_len(symbol) else {
        return Err(DemangleError::new(0, &[], DemangleErrorKind::UnsupportedPrefix));
    };
    let mut parser = Parser::new(symbol, start, config);
    let global = parser.parse_symbol()?;
    let lowerer = Lowerer::new(&parser.arena, symbol, config);
    let mut budget = DepthBudget::new(config.max_depth);
    let decl = lowerer.lower_symbol(&mut budget, global)?;
    tracing::debug!(
        symbol,
        kind = ?decl.kind,
        name = decl.name_text(),
        params = decl.params.len(),
        "demangled symbol"
    );
    Ok(decl)
}

/// Demangle a bare type mangling such as `SaySiG` (no prefix).
pub fn demangle_type(mangled_type: &str) -> Result<TypeNode, DemangleError> {
    demangle_type_with(mangled_type, &DemangleConfig::default())
}

pub fn demangle_type_with(
    mangled_type: &str,
    config: &DemangleConfig,
) -> Result<TypeNode, DemangleError> {
    let mut parser = Parser::new(mangled_type, 0, config);
    let ty = parser.parse_type()?;
    let lowerer = Lowerer::new(&parser.arena, mangled_type, config);
    let mut budget = DepthBudget::new(config.max_depth);
    lowerer.lower_type_root(&mut budget, ty)
}

/// Returns `true` if `symbol` starts with a prefix [`demangle`] accepts.
pub fn is_mangled(symbol: &str) -> bool {
    prefix_len(symbol).is_some()
}
