use pretty_assertions::assert_eq;
use tern_ir::{
    DeclFlags, DeclKind, DescriptorRole, GenericParamKey, GenericSignature, NominalKind,
    NominalPath, PrimitiveKind, Requirement, TypeNode,
};

use super::*;
use crate::fixtures::{function, member, param, prim, resolver, value};
use crate::{Ownership, SelfPassing};

fn generic_equal() -> Declaration {
    let t = TypeNode::generic_param(0, 0);
    let mut decl = function("isEqual", vec![t.clone(), t.clone()], prim(PrimitiveKind::Bool));
    decl.generic_signature = GenericSignature {
        params: vec![GenericParamKey::new(0, 0)],
        requirements: vec![Requirement::Conformance {
            subject: t,
            protocol: NominalPath::top_level("Swift", "Equatable"),
        }],
    };
    decl
}

fn pieces(decl: &Declaration) -> (ResolvedSignature, ClassifiedSlots) {
    let resolver = resolver();
    let signature = resolve_signature(decl, &resolver).unwrap();
    let slots = classify(decl, &resolver, &signature).unwrap();
    (signature, slots)
}

fn order_error(position: usize, detail: &str) -> ClassificationError {
    ClassificationError::SlotOrder {
        position,
        detail: detail.to_owned(),
    }
}

#[test]
fn plan_runs_the_whole_pipeline() {
    let mut decl = member("Pair", NominalKind::Struct, DeclKind::Method);
    decl.params = vec![param(prim(PrimitiveKind::String))];
    decl.flags |= DeclFlags::THROWING;

    let resolver = resolver();
    let plan = BindingPlanBuilder::new(&resolver).plan(&decl).unwrap();
    assert_eq!(
        plan.parameter_slots,
        vec![
            CallingConventionSlot::SelfParameter {
                ty: value("Pair", vec![]),
                passing: SelfPassing::Direct {
                    word_count: 2,
                    ownership: Ownership::Borrowed,
                },
            },
            CallingConventionSlot::IndirectPointer {
                ty: prim(PrimitiveKind::String),
                ownership: Ownership::Borrowed,
                mutable: false,
            },
            CallingConventionSlot::ErrorOut,
        ]
    );
    assert!(plan.throws);
    assert_eq!(plan.return_slot, None);
    assert_eq!(plan.declaration, decl);
    assert!(plan.receiver().is_some());
    assert_eq!(plan.formal_parameters().count(), 1);
}

#[test]
fn plan_counts_generic_plumbing() {
    let resolver = resolver();
    let plan = BindingPlanBuilder::new(&resolver).plan(&generic_equal()).unwrap();
    assert_eq!(plan.receiver(), None);
    assert_eq!(plan.formal_parameters().count(), 2);
    assert_eq!(plan.metadata_count(), 1);
    assert_eq!(plan.witness_count(), 1);
    assert!(!plan.throws);
}

#[test]
fn reordered_slots_are_rejected() {
    let decl = generic_equal();
    let (signature, mut slots) = pieces(&decl);
    slots.parameter_slots.swap(1, 2);
    assert_eq!(
        BindingPlanBuilder::build(&decl, &signature, slots).unwrap_err(),
        order_error(1, "expected a parameter, found type metadata")
    );
}

#[test]
fn missing_and_extra_error_slots_are_rejected() {
    let mut decl = function("load", vec![prim(PrimitiveKind::Int)], TypeNode::unit());
    decl.flags |= DeclFlags::THROWING;
    let (signature, mut slots) = pieces(&decl);
    slots.parameter_slots.pop();
    assert_eq!(
        BindingPlanBuilder::build(&decl, &signature, slots).unwrap_err(),
        order_error(1, "expected the error slot, found the end of the slots")
    );

    let decl = function("load", vec![prim(PrimitiveKind::Int)], TypeNode::unit());
    let (signature, mut slots) = pieces(&decl);
    slots.parameter_slots.push(CallingConventionSlot::ErrorOut);
    assert_eq!(
        BindingPlanBuilder::build(&decl, &signature, slots).unwrap_err(),
        order_error(1, "an error slot after the last expected slot")
    );
}

#[test]
fn metadata_for_a_missing_generic_parameter_is_rejected() {
    let decl = generic_equal();
    let (signature, mut slots) = pieces(&decl);
    // Witness table without the metadata it belongs to.
    slots.parameter_slots.remove(2);
    assert_eq!(
        BindingPlanBuilder::build(&decl, &signature, slots).unwrap_err(),
        order_error(2, "expected type metadata, found a witness table")
    );
}

#[test]
fn return_slot_must_carry_the_result() {
    let decl = function("name", Vec::new(), prim(PrimitiveKind::String));
    let (signature, mut slots) = pieces(&decl);
    slots.return_slot = None;
    assert!(matches!(
        BindingPlanBuilder::build(&decl, &signature, slots),
        Err(ClassificationError::SlotOrder { position: 0, .. })
    ));
}

#[test]
fn metadata_symbols_are_not_planned() {
    let mut decl = member("Mystery", NominalKind::Struct, DeclKind::NominalType);
    decl.descriptor = Some(DescriptorRole::NominalTypeDescriptor);
    let resolver = resolver();
    assert_eq!(
        BindingPlanBuilder::new(&resolver).plan(&decl).unwrap_err(),
        ClassificationError::NotCallable {
            kind: DeclKind::NominalType
        }
    );
}
