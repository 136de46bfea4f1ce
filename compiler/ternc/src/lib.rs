//! Tern driver - runs the binding pipeline over a library's symbol list.
//!
//! The core crates work on one symbol at a time. This crate feeds them a
//! whole export table:
//!
//! ```text
//! SymbolEntry[] ──► demangle (parallel)
//!                       │
//!                       ▼
//!           register attached layouts ──► LibraryLayouts
//!                       │
//!                       ▼
//!        filter ──► plan (parallel) ──► BatchReport
//!                       │                  ├─ plans
//!                       ▼                  ├─ skipped / errors
//!               witness-table maps         └─ inventory
//! ```
//!
//! Layout lookups are chained library first, then the [`TypeCatalog`], then
//! the standard library table. A symbol that fails at any stage is reported
//! and excluded; the rest of the batch is unaffected.

pub mod batch;
pub mod catalog;
pub mod commands;
mod config;
pub mod filter;
pub mod inventory;

pub use batch::{
    BatchDriver, BatchReport, ConformanceError, PlannedSymbol, SkipReason, SkippedSymbol,
    SymbolEntry, SymbolError, SymbolFailure, SymbolKind,
};
pub use catalog::{CatalogError, TypeCatalog};
pub use config::BatchConfig;
pub use filter::{qualified_name, NameFilter, NamePattern};
pub use inventory::{Inventory, ModuleContents, PropertyContents, TypeContents};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `RUST_LOG=tern_abi=debug` or `RUST_LOG=ternc=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true).with_writer(std::io::stderr))
                .with(filter)
                .init();
        }
    });
}
