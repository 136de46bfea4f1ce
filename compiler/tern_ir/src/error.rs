//! Errors raised after demangling.

use crate::{DeclKind, GenericParamKey, NominalPath};

/// Marker for a nominal type whose field layout nobody could supply.
///
/// Not an error by itself: the layout resolver returns it as a value, and
/// only the classifier decides that a missing layout blocks a binding.
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[error("no layout known for `{path}`")]
pub struct LayoutUnavailable {
    pub path: NominalPath,
}

/// A declaration demangled fine but cannot be bound.
///
/// Every variant is local to one symbol; the pipeline excludes the symbol
/// and moves on.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ClassificationError {
    #[error("layout of `{}` is unavailable ({role})", .missing.path)]
    LayoutUnavailable {
        missing: LayoutUnavailable,
        role: String,
    },

    #[error("`{path}` contains itself inline")]
    RecursiveLayout { path: NominalPath },

    #[error("type nesting exceeds the limit of {limit}")]
    NestingTooDeep { limit: u32 },

    #[error("`{path}` expects {expected} generic arguments, found {found}")]
    GenericArity {
        path: NominalPath,
        expected: usize,
        found: usize,
    },

    #[error("generic parameter {param} is not part of the signature")]
    UnknownGenericParam { param: GenericParamKey },

    #[error("same-type constraints bind `{subject}` to both `{first}` and `{second}`")]
    ConflictingSameType {
        subject: String,
        first: String,
        second: String,
    },

    #[error("unsupported generic shape: {detail}")]
    UnsupportedGenericShape { detail: String },

    #[error("unsupported type `{ty}`: {detail}")]
    UnsupportedType { ty: String, detail: String },

    #[error("slot {position} breaks the calling-convention order: {detail}")]
    SlotOrder { position: usize, detail: String },

    #[error("{kind:?} symbol is not a callable entry point")]
    NotCallable { kind: DeclKind },

    #[error("witness `{witness}` does not match any requirement of `{protocol}`")]
    UnmatchedWitness {
        witness: String,
        protocol: NominalPath,
    },

    #[error("requirement #{ordinal} of `{protocol}` has more than one witness")]
    DuplicateWitness {
        ordinal: usize,
        protocol: NominalPath,
    },

    #[error("witness `{witness}` belongs to a different conformance than `{protocol}`")]
    ForeignWitness {
        witness: String,
        protocol: NominalPath,
    },
}

impl ClassificationError {
    /// Wrap a missing layout with a note about what needed it.
    pub fn unavailable(missing: LayoutUnavailable, role: impl Into<String>) -> Self {
        ClassificationError::LayoutUnavailable {
            missing,
            role: role.into(),
        }
    }
}
