//! End-to-end classification of demangled symbols.

#![allow(clippy::unwrap_used, reason = "Tests can panic")]

use std::sync::Arc;

use pretty_assertions::assert_eq;
use rayon::prelude::*;
use tern_abi::{BindingPlan, BindingPlanBuilder, CallingConventionSlot, Ownership, SelfPassing};
use tern_demangle::demangle;
use tern_ir::{
    ClassificationError, LayoutUnavailable, NominalKind, NominalPath, PrimitiveKind, TypeNode,
};
use tern_layout::{
    ChainedLookup, FieldLayout, LayoutResolver, LibraryLayouts, NominalLayout, StdlibLayouts,
    TargetConfig,
};

fn main_type(name: &str) -> NominalPath {
    NominalPath::top_level("main", name)
}

fn resolver() -> LayoutResolver {
    let int = TypeNode::Primitive(PrimitiveKind::Int);
    let int32 = TypeNode::Primitive(PrimitiveKind::Int32);
    let library = LibraryLayouts::new();
    library.register(
        main_type("Pair"),
        NominalLayout::structure(vec![
            FieldLayout::new("a", int32.clone()),
            FieldLayout::new("b", int32),
        ]),
    );
    library.register(
        main_type("Triple"),
        NominalLayout::structure(vec![
            FieldLayout::new("a", int.clone()),
            FieldLayout::new("b", int.clone()),
            FieldLayout::new("c", int),
        ]),
    );
    library.register(main_type("Foo"), NominalLayout::structure(Vec::new()));
    library.register(main_type("Node"), NominalLayout::class());

    let framework = NominalPath::top_level("unitHelpFrawework", "Foo");
    library.register(
        framework.clone(),
        NominalLayout::class().with_generic_depths(vec![1]),
    );
    library.register(
        framework.child("Bar".into()),
        NominalLayout::class().with_generic_depths(vec![1, 1]),
    );

    let target = TargetConfig::host_64();
    let lookup = ChainedLookup::new()
        .then(Arc::new(library))
        .then(Arc::new(StdlibLayouts::new(&target)));
    LayoutResolver::new(target, Arc::new(lookup))
}

fn plan(resolver: &LayoutResolver, symbol: &str) -> Result<BindingPlan, ClassificationError> {
    let decl = demangle(symbol).unwrap();
    BindingPlanBuilder::new(resolver).plan(&decl)
}

fn prim(kind: PrimitiveKind) -> TypeNode {
    TypeNode::Primitive(kind)
}

#[test]
fn scalar_function_with_string_result() {
    // f(Int, Bool) -> String
    let plan = plan(&resolver(), "$s4main1fySSSi_SbtF").unwrap();
    assert_eq!(
        plan.parameter_slots,
        vec![
            CallingConventionSlot::DirectValue {
                ty: prim(PrimitiveKind::Int),
                word_count: 1
            },
            CallingConventionSlot::DirectValue {
                ty: prim(PrimitiveKind::Bool),
                word_count: 1
            },
        ]
    );
    assert_eq!(
        plan.return_slot,
        Some(CallingConventionSlot::IndirectPointer {
            ty: prim(PrimitiveKind::String),
            ownership: Ownership::ReturnedOwned,
            mutable: false,
        })
    );
    assert!(!plan.throws);
}

#[test]
fn generic_equatable_function() {
    // isEqual<T: Equatable>(a: T, b: T) -> Bool
    let plan = plan(&resolver(), "$s4main7isEqual1a1bSbx_xtSQRzlF").unwrap();
    let t = TypeNode::generic_param(0, 0);
    let borrowed = |ty: TypeNode| CallingConventionSlot::IndirectPointer {
        ty,
        ownership: Ownership::Borrowed,
        mutable: false,
    };
    assert_eq!(
        plan.parameter_slots,
        vec![
            borrowed(t.clone()),
            borrowed(t),
            CallingConventionSlot::TypeMetadata { generic_index: 0 },
            CallingConventionSlot::WitnessTable {
                requirement_index: 0
            },
        ]
    );
    assert_eq!(
        plan.return_slot,
        Some(CallingConventionSlot::DirectValue {
            ty: prim(PrimitiveKind::Bool),
            word_count: 1
        })
    );
}

#[test]
fn direct_passability_boundary() {
    let pair = plan(&resolver(), "$s4main4take1pyAA4PairV_tF").unwrap();
    assert!(matches!(
        pair.parameter_slots.as_slice(),
        [CallingConventionSlot::DirectValue { word_count: 1, .. }]
    ));

    let triple = plan(&resolver(), "$s4main4take1tyAA6TripleV_tF").unwrap();
    assert!(matches!(
        triple.parameter_slots.as_slice(),
        [CallingConventionSlot::IndirectPointer {
            ownership: Ownership::Borrowed,
            mutable: false,
            ..
        }]
    ));
}

#[test]
fn throwing_function_ends_with_error_slot() {
    let plan = plan(
        &resolver(),
        "$s17unitHelpFrawework16MaybeItWillThrow1aySb_tKF",
    )
    .unwrap();
    assert!(plan.throws);
    assert_eq!(plan.parameter_slots.last(), Some(&CallingConventionSlot::ErrorOut));
    assert_eq!(plan.return_slot, None);
}

#[test]
fn witness_thunk_is_classified_in_the_protocol_context() {
    let plan = plan(&resolver(), "$s4main3FooVAA1PA2aDP3baryyFTW").unwrap();
    assert_eq!(
        plan.parameter_slots,
        vec![
            CallingConventionSlot::SelfParameter {
                ty: TypeNode::generic_param(0, 0),
                passing: SelfPassing::Indirect {
                    ownership: Ownership::Borrowed,
                    mutable: false
                },
            },
            CallingConventionSlot::TypeMetadata { generic_index: 0 },
            CallingConventionSlot::WitnessTable {
                requirement_index: 0
            },
        ]
    );
}

#[test]
fn class_method_passes_the_object_reference() {
    let plan = plan(&resolver(), "$s4main4NodeC3runyyF").unwrap();
    assert_eq!(
        plan.parameter_slots,
        vec![CallingConventionSlot::SelfParameter {
            ty: TypeNode::nominal(main_type("Node"), NominalKind::Class, Vec::new()),
            passing: SelfPassing::Direct {
                word_count: 1,
                ownership: Ownership::Borrowed
            },
        }]
    );
}

#[test]
fn initializing_constructor_takes_self_instead_of_the_metatype() {
    let node = TypeNode::nominal(main_type("Node"), NominalKind::Class, Vec::new());
    let plan = plan(&resolver(), "$s4main4NodeC4nameACSS_tcfc").unwrap();
    assert_eq!(plan.owner_metatype, None);
    assert_eq!(
        plan.parameter_slots,
        vec![
            CallingConventionSlot::SelfParameter {
                ty: node.clone(),
                passing: SelfPassing::Direct {
                    word_count: 1,
                    ownership: Ownership::Owned
                },
            },
            CallingConventionSlot::IndirectPointer {
                ty: prim(PrimitiveKind::String),
                ownership: Ownership::Owned,
                mutable: false,
            },
        ]
    );
    assert_eq!(
        plan.return_slot,
        Some(CallingConventionSlot::IndirectPointer {
            ty: node,
            ownership: Ownership::ReturnedOwned,
            mutable: false,
        })
    );
}

#[test]
fn nested_generic_method_passes_every_level() {
    let plan = plan(
        &resolver(),
        "$s17unitHelpFrawework3FooC3BarC4doIt1a1b1cyx_qd__qd0__tlF",
    )
    .unwrap();
    let bar = NominalPath::new(
        "unitHelpFrawework",
        ["Foo".into(), "Bar".into()],
    );
    assert_eq!(
        plan.receiver().and_then(CallingConventionSlot::ty),
        Some(&TypeNode::nominal(
            bar,
            NominalKind::Class,
            vec![TypeNode::generic_param(0, 0), TypeNode::generic_param(1, 0)]
        ))
    );
    assert_eq!(plan.formal_parameters().count(), 3);
    assert_eq!(plan.metadata_count(), 3);
    assert_eq!(plan.witness_count(), 0);
}

#[test]
fn unknown_parameter_type_excludes_the_symbol() {
    let err = plan(&resolver(), "$s4main4take1myAA7MysteryV_tF").unwrap_err();
    assert_eq!(
        err,
        ClassificationError::unavailable(
            LayoutUnavailable {
                path: main_type("Mystery")
            },
            "parameter 0"
        )
    );
}

#[test]
fn plans_are_deterministic_across_threads() {
    let symbols = [
        "$s4main1fySSSi_SbtF",
        "$s4main7isEqual1a1bSbx_xtSQRzlF",
        "$s4main4take1pyAA4PairV_tF",
        "$s4main4take1tyAA6TripleV_tF",
        "$s4main3FooVAA1PA2aDP3baryyFTW",
        "$s17unitHelpFrawework3FooC3BarC4doIt1a1b1cyx_qd__qd0__tlF",
    ];
    let sequential: Vec<_> = symbols
        .iter()
        .map(|symbol| plan(&resolver(), symbol).unwrap())
        .collect();

    let shared = resolver();
    for _ in 0..4 {
        let parallel: Vec<_> = symbols
            .par_iter()
            .rev()
            .map(|symbol| plan(&shared, symbol).unwrap())
            .collect();
        let reversed: Vec<_> = parallel.into_iter().rev().collect();
        assert_eq!(reversed, sequential);
    }
}
