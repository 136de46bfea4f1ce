//! Command implementations for the `ternc` binary.
//!
//! Each command reads its inputs, runs the pipeline and prints JSON to
//! stdout. Failures to read or parse inputs are returned as [`CommandError`];
//! per-symbol failures are part of the printed report instead.

use std::path::Path;

use tern_demangle::demangle_with;
use tern_layout::TargetConfig;

use crate::{BatchConfig, BatchDriver, CatalogError, Inventory, SymbolEntry, TypeCatalog};

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("failed to read `{path}`: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("invalid option `{0}`")]
    Option(String),
}

/// Options of the `plan` command.
#[derive(Clone, Debug, Default)]
pub struct PlanOptions {
    pub catalog: Option<String>,
    pub config: BatchConfig,
}

impl PlanOptions {
    /// Parse `--catalog=<file>`, `--threads=<n>` and `--target=32|64`.
    pub fn parse(args: &[String]) -> Result<(Self, Vec<String>), CommandError> {
        let mut options = PlanOptions::default();
        let mut rest = Vec::new();
        for arg in args {
            if let Some(path) = arg.strip_prefix("--catalog=") {
                options.catalog = Some(path.to_owned());
            } else if let Some(threads) = arg.strip_prefix("--threads=") {
                options.config.num_threads = threads
                    .parse()
                    .map_err(|_| CommandError::Option(arg.clone()))?;
            } else if arg == "--target=64" {
                options.config.target = TargetConfig::host_64();
            } else if arg == "--target=32" {
                options.config.target = TargetConfig::host_32();
            } else if arg.starts_with('-') {
                return Err(CommandError::Option(arg.clone()));
            } else {
                rest.push(arg.clone());
            }
        }
        Ok((options, rest))
    }
}

fn read(path: &str) -> Result<String, CommandError> {
    std::fs::read_to_string(Path::new(path)).map_err(|source| CommandError::Read {
        path: path.to_owned(),
        source,
    })
}

/// Demangle each symbol and return its declaration as JSON.
pub fn demangle_symbols(symbols: &[String]) -> Result<String, CommandError> {
    let config = tern_demangle::DemangleConfig::default();
    let results: Vec<serde_json::Value> = symbols
        .iter()
        .map(|symbol| match demangle_with(symbol, &config) {
            Ok(decl) => serde_json::json!({ "symbol": symbol, "declaration": decl }),
            Err(err) => serde_json::json!({
                "symbol": symbol,
                "error": err.to_string(),
                "offset": err.offset,
            }),
        })
        .collect();
    Ok(serde_json::to_string_pretty(&results)?)
}

/// Run the whole pipeline over a symbol list file.
pub fn plan_file(symbols_path: &str, options: &PlanOptions) -> Result<String, CommandError> {
    let catalog = match &options.catalog {
        Some(path) => TypeCatalog::from_json_str(&read(path)?)?,
        None => TypeCatalog::new(),
    };
    let symbols = SymbolEntry::parse_list(&read(symbols_path)?);
    let report = BatchDriver::new(options.config.clone(), catalog).run(&symbols);
    Ok(report.to_json()?)
}

/// Group a symbol list file into an inventory. Symbols that fail to
/// demangle are left out.
pub fn inventory_file(symbols_path: &str) -> Result<String, CommandError> {
    let config = tern_demangle::DemangleConfig::default();
    let decls: Vec<_> = SymbolEntry::parse_list(&read(symbols_path)?)
        .iter()
        .filter_map(|entry| demangle_with(&entry.mangled, &config).ok())
        .collect();
    Ok(serde_json::to_string_pretty(&Inventory::build(&decls))?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap to panic on unexpected state")]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|arg| (*arg).to_owned()).collect()
    }

    #[test]
    fn plan_options() {
        let (options, rest) =
            PlanOptions::parse(&args(&["--threads=3", "symbols.txt", "--target=32"])).unwrap();
        assert_eq!(options.config.num_threads, 3);
        assert_eq!(options.config.target, TargetConfig::host_32());
        assert_eq!(options.catalog, None);
        assert_eq!(rest, vec!["symbols.txt".to_owned()]);

        assert!(PlanOptions::parse(&args(&["--threads=many"])).is_err());
        assert!(PlanOptions::parse(&args(&["--verbose"])).is_err());
    }

    #[test]
    fn demangle_output() {
        let json = demangle_symbols(&args(&["$s4main3addyS2i_SitF", "nope"])).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["declaration"]["kind"], "Function");
        assert_eq!(value[1]["offset"], 0);
    }

    #[test]
    fn missing_files() {
        let err = plan_file("/nonexistent/symbols.txt", &PlanOptions::default()).unwrap_err();
        assert!(matches!(err, CommandError::Read { .. }));
    }
}
