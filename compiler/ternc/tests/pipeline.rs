//! End-to-end batch runs over small export tables.

#![allow(clippy::unwrap_used, reason = "Tests can panic")]

use pretty_assertions::assert_eq;
use tern_abi::{CallingConventionSlot, Ownership};
use tern_ir::{NominalKind, NominalPath, PrimitiveKind, TypeNode};
use tern_layout::{FieldLayout, NominalLayout, TargetConfig};
use ternc::{BatchConfig, BatchDriver, SkipReason, SymbolEntry, SymbolFailure, TypeCatalog};

const CATALOG: &str = r#"{
  "types": [
    { "path": "main.Triple", "kind": "struct",
      "fields": [{ "name": "a", "type": "Si" }, { "name": "b", "type": "Si" }, { "name": "c", "type": "Si" }] }
  ],
  "protocols": [
    { "path": "main.P",
      "requirements": [
        { "kind": "Getter", "name": "name" },
        { "kind": "Method", "name": "bar" }
      ] }
  ],
  "exclude": ["main.hidden*"]
}"#;

const SCALAR: &str = "$s4main1fySSSi_SbtF";
const EQUATABLE: &str = "$s4main7isEqual1a1bSbx_xtSQRzlF";
const TAKE_PAIR: &str = "$s4main4take1pyAA4PairV_tF";
const TAKE_TRIPLE: &str = "$s4main4take1tyAA6TripleV_tF";
const TAKE_MYSTERY: &str = "$s4main4take1myAA7MysteryV_tF";
const TRUNCATED: &str = "$s17unitHelpFrawework3FooC4failACSgSb_t";
const THROWING: &str = "$s17unitHelpFrawework16MaybeItWillThrow1aySb_tKF";
const WITNESS: &str = "$s4main3FooVAA1PA2aDP3baryyFTW";

fn symbols() -> Vec<SymbolEntry> {
    let pair = NominalLayout::structure(vec![
        FieldLayout::new("x", TypeNode::Primitive(PrimitiveKind::Int32)),
        FieldLayout::new("y", TypeNode::Primitive(PrimitiveKind::Int32)),
    ]);
    vec![
        SymbolEntry::code(SCALAR),
        SymbolEntry::code(EQUATABLE),
        SymbolEntry::code(TRUNCATED),
        SymbolEntry::code(TAKE_PAIR),
        SymbolEntry::code(TAKE_TRIPLE),
        SymbolEntry::code(TAKE_MYSTERY),
        SymbolEntry::code(THROWING),
        SymbolEntry::code(WITNESS),
        SymbolEntry::data("$s4main4PairVMn").with_layout(pair),
    ]
}

fn run(config: BatchConfig) -> ternc::BatchReport {
    let catalog = TypeCatalog::from_json_str(CATALOG).unwrap();
    BatchDriver::new(config, catalog).run(&symbols())
}

fn nominal(name: &str) -> TypeNode {
    TypeNode::nominal(NominalPath::top_level("main", name), NominalKind::Struct, Vec::new())
}

#[test]
fn truncated_symbol_does_not_stop_the_batch() {
    let report = run(BatchConfig::default());

    let error = report.error(TRUNCATED).unwrap();
    assert_eq!(error.index, 2);
    let SymbolFailure::Demangle(demangle) = &error.error else {
        panic!("expected a demangling failure, got {:?}", error.error);
    };
    assert!(demangle.offset <= TRUNCATED.len());
    assert!(TRUNCATED.starts_with(&demangle.consumed));

    // The symbol after it is planned.
    assert!(report.plan(TAKE_PAIR).is_some());
}

#[test]
fn scalar_function() {
    let report = run(BatchConfig::default());
    let plan = report.plan(SCALAR).unwrap();
    assert_eq!(
        plan.parameter_slots,
        vec![
            CallingConventionSlot::DirectValue {
                ty: TypeNode::Primitive(PrimitiveKind::Int),
                word_count: 1
            },
            CallingConventionSlot::DirectValue {
                ty: TypeNode::Primitive(PrimitiveKind::Bool),
                word_count: 1
            },
        ]
    );
    assert_eq!(
        plan.return_slot.as_ref().and_then(CallingConventionSlot::ownership),
        Some(Ownership::ReturnedOwned)
    );
    assert!(!plan.throws);
}

#[test]
fn generic_function() {
    let report = run(BatchConfig::default());
    let plan = report.plan(EQUATABLE).unwrap();
    assert_eq!(plan.formal_parameters().filter(|slot| slot.is_indirect()).count(), 2);
    assert_eq!(plan.metadata_count(), 1);
    assert_eq!(plan.witness_count(), 1);
}

#[test]
fn layouts_come_from_symbols_and_the_catalog() {
    let report = run(BatchConfig::default());

    let pair = report.plan(TAKE_PAIR).unwrap();
    assert_eq!(
        pair.parameter_slots,
        vec![CallingConventionSlot::DirectValue {
            ty: nominal("Pair"),
            word_count: 1
        }]
    );

    let triple = report.plan(TAKE_TRIPLE).unwrap();
    assert!(triple.parameter_slots[0].is_indirect());

    let mystery = report.error(TAKE_MYSTERY).unwrap();
    assert!(matches!(mystery.error, SymbolFailure::Classification(_)));
    assert!(mystery.to_string().contains("main.Mystery"));
}

#[test]
fn throwing_function_and_witnesses() {
    let report = run(BatchConfig::default());
    let plan = report.plan(THROWING).unwrap();
    assert!(plan.throws);
    assert_eq!(
        plan.parameter_slots.last(),
        Some(&CallingConventionSlot::ErrorOut)
    );

    let table = report
        .witness_table(&NominalPath::top_level("main", "P"))
        .unwrap();
    assert_eq!(table.conforming, Some(nominal("Foo")));
    assert!(table.entry(0).unwrap().witness.is_none());
    assert!(table.entry(1).unwrap().witness.is_some());
}

#[test]
fn every_symbol_is_accounted_for() {
    let report = run(BatchConfig::default());
    let mut indices: Vec<_> = report
        .plans
        .iter()
        .map(|planned| planned.index)
        .chain(report.skipped.iter().map(|skipped| skipped.index))
        .chain(report.errors.iter().map(|error| error.index))
        .collect();
    indices.sort_unstable();
    assert_eq!(indices, (0..symbols().len()).collect::<Vec<_>>());
    assert_eq!(report.skipped[0].reason, SkipReason::Data);
}

#[test]
fn excluded_names_are_skipped() {
    let catalog = TypeCatalog::from_json_str(CATALOG).unwrap();
    let report = BatchDriver::new(BatchConfig::single_threaded(), catalog)
        .run(&[SymbolEntry::code("$s4main6hiddenyyF"), SymbolEntry::code(SCALAR)]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].reason, SkipReason::Filtered);
    assert_eq!(report.plans.len(), 1);
}

#[test]
fn reports_are_deterministic() {
    let first = run(BatchConfig::with_threads(8));
    let second = run(BatchConfig::single_threaded());
    assert_eq!(first, second);
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
}

#[test]
fn narrow_targets_change_word_counts() {
    let report = run(BatchConfig::single_threaded().target(TargetConfig::host_32()));
    let plan = report.plan(TAKE_PAIR).unwrap();
    assert_eq!(
        plan.parameter_slots,
        vec![CallingConventionSlot::DirectValue {
            ty: nominal("Pair"),
            word_count: 2
        }]
    );
}
