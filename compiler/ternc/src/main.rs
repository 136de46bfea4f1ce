//! Tern CLI
//!
//! Demangle symbols, build binding plans for a library's export table, or
//! list its declarations grouped by type.

use ternc::commands::{demangle_symbols, inventory_file, plan_file, PlanOptions};

fn main() {
    ternc::init_tracing();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        return;
    }

    let result = match args[1].as_str() {
        "demangle" => {
            if args.len() < 3 {
                eprintln!("Usage: ternc demangle <symbol>...");
                std::process::exit(1);
            }
            demangle_symbols(&args[2..])
        }
        "plan" => {
            let (options, rest) = match PlanOptions::parse(&args[2..]) {
                Ok(parsed) => parsed,
                Err(e) => {
                    eprintln!("error: {e}");
                    std::process::exit(1);
                }
            };
            let Some(symbols) = rest.first() else {
                eprintln!("Usage: ternc plan <symbols.txt> [options]");
                eprintln!();
                eprintln!("Options:");
                eprintln!("  --catalog=<file>    JSON type catalog");
                eprintln!("  --threads=<n>       Worker threads (default: one per core)");
                eprintln!("  --target=<32|64>    Target word size (default: 64)");
                std::process::exit(1);
            };
            plan_file(symbols, &options)
        }
        "inventory" => {
            if args.len() < 3 {
                eprintln!("Usage: ternc inventory <symbols.txt>");
                std::process::exit(1);
            }
            inventory_file(&args[2])
        }
        "help" | "--help" | "-h" => {
            print_usage();
            return;
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    match result {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!("Tern - native library binding planner");
    println!();
    println!("Usage: ternc <command> [options]");
    println!();
    println!("Commands:");
    println!("  demangle <symbol>...   Demangle symbols to declarations");
    println!("  plan <symbols.txt>     Build binding plans for a symbol list");
    println!("  inventory <symbols.txt>  Group a symbol list by owning type");
    println!();
    println!("Symbol lists hold one symbol per line, optionally followed by `data`.");
    println!("Set RUST_LOG (e.g. RUST_LOG=ternc=debug) for pipeline logs.");
}
