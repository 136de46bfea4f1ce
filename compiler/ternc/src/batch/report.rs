//! What a batch run produced.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use tern_abi::BindingPlan;
use tern_demangle::DemangleError;
use tern_ir::{ClassificationError, NominalPath, TypeNode};
use tern_witness::WitnessTableMap;

use crate::inventory::Inventory;

/// Why a symbol that demangled fine was not planned.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Rejected by the catalog's include/exclude patterns.
    Filtered,
    /// Lives in a data section.
    Data,
    /// Metadata, descriptors and other non-function symbols.
    NotCallable,
}

/// Why a symbol failed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SymbolFailure {
    #[error(transparent)]
    Demangle(DemangleError),
    #[error(transparent)]
    Classification(ClassificationError),
}

impl SymbolFailure {
    /// Byte offset in the symbol, for demangling failures.
    pub fn offset(&self) -> Option<usize> {
        match self {
            SymbolFailure::Demangle(err) => Some(err.offset),
            SymbolFailure::Classification(_) => None,
        }
    }
}

impl Serialize for SymbolFailure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("SymbolFailure", 3)?;
        let stage = match self {
            SymbolFailure::Demangle(_) => "demangle",
            SymbolFailure::Classification(_) => "classify",
        };
        state.serialize_field("stage", stage)?;
        state.serialize_field("offset", &self.offset())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("symbol {index} `{mangled}`: {error}")]
pub struct SymbolError {
    /// Position in the input list.
    pub index: usize,
    pub mangled: String,
    pub error: SymbolFailure,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlannedSymbol {
    pub index: usize,
    pub mangled: String,
    pub plan: BindingPlan,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SkippedSymbol {
    pub index: usize,
    pub mangled: String,
    pub reason: SkipReason,
}

/// A conformance whose witnesses could not be laid out.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("conformance of `{conforming}` to `{protocol}`: {error}")]
pub struct ConformanceError {
    pub protocol: NominalPath,
    pub conforming: TypeNode,
    pub error: ClassificationError,
}

/// Everything one batch run produced, in input order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub plans: Vec<PlannedSymbol>,
    pub skipped: Vec<SkippedSymbol>,
    pub errors: Vec<SymbolError>,
    pub witness_tables: Vec<WitnessTableMap>,
    pub conformance_errors: Vec<ConformanceError>,
    pub inventory: Inventory,
}

impl BatchReport {
    /// Plan for `mangled`, if it was planned.
    pub fn plan(&self, mangled: &str) -> Option<&BindingPlan> {
        self.plans
            .iter()
            .find(|planned| planned.mangled == mangled)
            .map(|planned| &planned.plan)
    }

    pub fn error(&self, mangled: &str) -> Option<&SymbolError> {
        self.errors.iter().find(|error| error.mangled == mangled)
    }

    pub fn witness_table(&self, protocol: &NominalPath) -> Option<&WitnessTableMap> {
        self.witness_tables
            .iter()
            .find(|table| table.protocol == *protocol)
    }

    /// Returns `true` if no symbol or conformance failed.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.conformance_errors.is_empty()
    }

    /// The report as pretty-printed JSON, for emitters.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
