//! Parallel batch pipeline over an export table.
//!
//! Symbols are demangled first, then every layout attached to a type symbol
//! is registered, and only then is anything classified. A symbol's plan
//! therefore never depends on where its types appear in the table, or on
//! which worker got to them first.

mod report;

pub use report::{
    BatchReport, ConformanceError, PlannedSymbol, SkipReason, SkippedSymbol, SymbolError,
    SymbolFailure,
};

use std::sync::Arc;

use rayon::prelude::*;
use rayon::ThreadPool;
use rustc_hash::FxHashMap;
use tern_abi::BindingPlanBuilder;
use tern_demangle::{demangle_with, DemangleError};
use tern_ir::{DeclKind, Declaration, NominalPath, TypeNode};
use tern_layout::{ChainedLookup, LayoutResolver, LibraryLayouts, NominalLayout, StdlibLayouts};
use tern_witness::map_witnesses;

use crate::inventory::Inventory;
use crate::{BatchConfig, TypeCatalog};

/// Section an exported symbol lives in.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// Executable code.
    #[default]
    Code,
    /// Data: metadata records, descriptors, global storage.
    Data,
}

/// One row of the library's export table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolEntry {
    pub mangled: String,
    pub kind: SymbolKind,
    /// Field layout of the type a type symbol describes, when the symbol
    /// source could read it from the library's reflection records.
    pub layout: Option<NominalLayout>,
}

impl SymbolEntry {
    pub fn code(mangled: &str) -> Self {
        SymbolEntry {
            mangled: mangled.to_owned(),
            kind: SymbolKind::Code,
            layout: None,
        }
    }

    pub fn data(mangled: &str) -> Self {
        SymbolEntry {
            kind: SymbolKind::Data,
            ..Self::code(mangled)
        }
    }

    #[must_use]
    pub fn with_layout(mut self, layout: NominalLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Parse a symbol list: one symbol per line, optionally followed by
    /// `code` or `data`. Blank lines and `#` comments are skipped.
    pub fn parse_list(text: &str) -> Vec<SymbolEntry> {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| {
                let mut words = line.split_whitespace();
                let mangled = words.next().unwrap_or_default();
                match words.next() {
                    Some("data") => SymbolEntry::data(mangled),
                    _ => SymbolEntry::code(mangled),
                }
            })
            .collect()
    }
}

/// What happened to one symbol.
enum Outcome {
    Planned(tern_abi::BindingPlan),
    Skipped(SkipReason),
    Failed(SymbolFailure),
}

/// Runs the pipeline over whole symbol lists.
pub struct BatchDriver {
    config: BatchConfig,
    catalog: Arc<TypeCatalog>,
    stdlib: Arc<StdlibLayouts>,
}

impl BatchDriver {
    pub fn new(config: BatchConfig, catalog: TypeCatalog) -> Self {
        let stdlib = Arc::new(StdlibLayouts::new(&config.target));
        BatchDriver {
            config,
            catalog: Arc::new(catalog),
            stdlib,
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    /// Demangle, classify and plan every symbol in `symbols`.
    ///
    /// Report entries keep the order of `symbols`.
    pub fn run(&self, symbols: &[SymbolEntry]) -> BatchReport {
        let pool = self.pool();
        let demangle = &self.config.demangle;

        let decls: Vec<Result<Declaration, DemangleError>> = install(pool.as_ref(), || {
            symbols
                .par_iter()
                .map(|entry| demangle_with(&entry.mangled, demangle))
                .collect()
        });

        let library = Arc::new(LibraryLayouts::new());
        for (entry, decl) in symbols.iter().zip(&decls) {
            if let (Some(layout), Ok(decl)) = (&entry.layout, decl) {
                register_layout(&library, &entry.mangled, decl, layout);
            }
        }
        let lookup = ChainedLookup::new()
            .then(library)
            .then(self.catalog.clone())
            .then(self.stdlib.clone());
        let resolver = LayoutResolver::new(self.config.target, Arc::new(lookup));

        let outcomes: Vec<Outcome> = install(pool.as_ref(), || {
            symbols
                .par_iter()
                .zip(decls.par_iter())
                .map(|(entry, decl)| self.process(&resolver, entry, decl))
                .collect()
        });

        let mut report = BatchReport::default();
        for (index, (entry, outcome)) in symbols.iter().zip(outcomes).enumerate() {
            let mangled = entry.mangled.clone();
            match outcome {
                Outcome::Planned(plan) => report.plans.push(PlannedSymbol {
                    index,
                    mangled,
                    plan,
                }),
                Outcome::Skipped(reason) => report.skipped.push(SkippedSymbol {
                    index,
                    mangled,
                    reason,
                }),
                Outcome::Failed(error) => report.errors.push(SymbolError {
                    index,
                    mangled,
                    error,
                }),
            }
        }

        let demangled: Vec<&Declaration> =
            decls.iter().filter_map(|decl| decl.as_ref().ok()).collect();
        self.map_conformances(&demangled, &mut report);
        report.inventory = Inventory::build(demangled.iter().copied());

        tracing::debug!(
            symbols = symbols.len(),
            planned = report.plans.len(),
            skipped = report.skipped.len(),
            failed = report.errors.len(),
            layouts = resolver.cached_types(),
            "batch finished"
        );
        report
    }

    fn process(
        &self,
        resolver: &LayoutResolver,
        entry: &SymbolEntry,
        decl: &Result<Declaration, DemangleError>,
    ) -> Outcome {
        let decl = match decl {
            Ok(decl) => decl,
            Err(err) => {
                tracing::warn!(symbol = %entry.mangled, error = %err, "excluding symbol");
                return Outcome::Failed(SymbolFailure::Demangle(err.clone()));
            }
        };
        if !self.catalog.filter().allows_decl(decl) {
            tracing::debug!(symbol = %entry.mangled, "filtered out by name pattern");
            return Outcome::Skipped(SkipReason::Filtered);
        }
        if entry.kind == SymbolKind::Data {
            return Outcome::Skipped(SkipReason::Data);
        }
        if !decl.is_callable() {
            return Outcome::Skipped(SkipReason::NotCallable);
        }
        match BindingPlanBuilder::new(resolver).plan(decl) {
            Ok(plan) => Outcome::Planned(plan),
            Err(err) => {
                tracing::warn!(symbol = %entry.mangled, error = %err, "excluding symbol");
                Outcome::Failed(SymbolFailure::Classification(err))
            }
        }
    }

    /// Map the witness thunks of every conformance whose protocol the
    /// catalog describes.
    fn map_conformances(&self, decls: &[&Declaration], report: &mut BatchReport) {
        let mut groups: Vec<(NominalPath, TypeNode, Vec<Declaration>)> = Vec::new();
        let mut index: FxHashMap<(&NominalPath, &TypeNode), usize> = FxHashMap::default();
        for decl in decls {
            if decl.kind != DeclKind::ProtocolWitness || !self.catalog.filter().allows_decl(decl) {
                continue;
            }
            let Some(conformance) = &decl.conformance else {
                continue;
            };
            let key = (&conformance.protocol, &conformance.conforming);
            let slot = *index.entry(key).or_insert_with(|| {
                groups.push((
                    conformance.protocol.clone(),
                    conformance.conforming.clone(),
                    Vec::new(),
                ));
                groups.len() - 1
            });
            groups[slot].2.push((*decl).clone());
        }

        for (protocol, conforming, witnesses) in groups {
            let Some(shape) = self.catalog.protocol(&protocol) else {
                tracing::debug!(%protocol, "no requirement list for protocol");
                continue;
            };
            match map_witnesses(shape, &witnesses) {
                Ok(map) => report.witness_tables.push(map),
                Err(error) => {
                    tracing::warn!(%protocol, %conforming, %error, "cannot map witness table");
                    report.conformance_errors.push(ConformanceError {
                        protocol,
                        conforming,
                        error,
                    });
                }
            }
        }
    }

    fn pool(&self) -> Option<ThreadPool> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.num_threads)
            .build()
            .map_err(|e| tracing::warn!("failed to create thread pool ({e}), using the global pool"))
            .ok()
    }
}

fn install<R: Send>(pool: Option<&ThreadPool>, work: impl FnOnce() -> R + Send) -> R {
    match pool {
        Some(pool) => pool.install(work),
        None => work(),
    }
}

/// Register `layout` for the type `decl` describes.
fn register_layout(
    library: &LibraryLayouts,
    mangled: &str,
    decl: &Declaration,
    layout: &NominalLayout,
) {
    let path = match &decl.subject {
        Some(TypeNode::Nominal(nominal)) => Some(nominal.path.clone()),
        _ if decl.kind == DeclKind::NominalType => decl.context.owner_path(),
        _ => None,
    };
    match path {
        Some(path) => library.register(path, layout.clone()),
        None => tracing::warn!(symbol = mangled, "layout attached to a symbol that names no type"),
    }
}
