use pretty_assertions::assert_eq;
use tern_ir::{
    AccessorKind, ClassificationError, ConstructorKind, DeclFlags, DeclKind, DescriptorRole,
    GenericParamKey, GenericSignature, LayoutUnavailable, NominalKind, ParamConvention, Parameter,
    PrimitiveKind, Requirement, TypeNode,
};

use super::*;
use crate::fixtures::{class, function, member, param, path, prim, resolver, value};
use crate::resolve_signature;

fn slots_of(decl: &Declaration) -> ClassifiedSlots {
    let resolver = resolver();
    let signature = resolve_signature(decl, &resolver).unwrap();
    classify(decl, &resolver, &signature).unwrap()
}

fn direct(ty: TypeNode, word_count: u32) -> CallingConventionSlot {
    CallingConventionSlot::DirectValue { ty, word_count }
}

fn indirect(ty: TypeNode, ownership: Ownership) -> CallingConventionSlot {
    CallingConventionSlot::IndirectPointer {
        ty,
        ownership,
        mutable: false,
    }
}

fn receiver(ty: TypeNode, passing: SelfPassing) -> CallingConventionSlot {
    CallingConventionSlot::SelfParameter { ty, passing }
}

const BORROWED_SELF: SelfPassing = SelfPassing::Indirect {
    ownership: Ownership::Borrowed,
    mutable: false,
};

const BORROWED_REFERENCE: SelfPassing = SelfPassing::Direct {
    word_count: 1,
    ownership: Ownership::Borrowed,
};

const OWNED_REFERENCE: SelfPassing = SelfPassing::Direct {
    word_count: 1,
    ownership: Ownership::Owned,
};

// ── Parameters ──────────────────────────────────────────────────

#[test]
fn small_trivial_structs_are_direct() {
    let decl = function("f", vec![value("Point", vec![]), value("Pair", vec![])], TypeNode::unit());
    assert_eq!(
        slots_of(&decl).parameter_slots,
        vec![direct(value("Point", vec![]), 1), direct(value("Pair", vec![]), 2)]
    );
}

#[test]
fn third_word_or_reference_field_is_indirect() {
    let decl = function(
        "f",
        vec![value("Triple", vec![]), value("Holder", vec![]), class("Node")],
        TypeNode::unit(),
    );
    assert_eq!(
        slots_of(&decl).parameter_slots,
        vec![
            indirect(value("Triple", vec![]), Ownership::Borrowed),
            indirect(value("Holder", vec![]), Ownership::Borrowed),
            indirect(class("Node"), Ownership::Borrowed),
        ]
    );
}

#[test]
fn inout_is_always_a_mutable_pointer() {
    let mut decl = function("bump", Vec::new(), TypeNode::unit());
    decl.params = vec![Parameter {
        convention: ParamConvention::InOut,
        ..param(prim(PrimitiveKind::Int))
    }];
    assert_eq!(
        slots_of(&decl).parameter_slots,
        vec![CallingConventionSlot::IndirectPointer {
            ty: prim(PrimitiveKind::Int),
            ownership: Ownership::Borrowed,
            mutable: true,
        }]
    );
}

#[test]
fn parameter_conventions_decide_ownership() {
    let mut decl = function("take", Vec::new(), TypeNode::unit());
    decl.params = vec![
        Parameter {
            convention: ParamConvention::Owned,
            ..param(prim(PrimitiveKind::String))
        },
        Parameter {
            convention: ParamConvention::Shared,
            ..param(prim(PrimitiveKind::String))
        },
        param(prim(PrimitiveKind::String)),
    ];
    let ownerships: Vec<_> = slots_of(&decl)
        .parameter_slots
        .iter()
        .map(|slot| slot.ownership().unwrap())
        .collect();
    assert_eq!(
        ownerships,
        vec![Ownership::Owned, Ownership::Borrowed, Ownership::Borrowed]
    );
}

#[test]
fn generic_parameters_are_indirect_and_followed_by_metadata() {
    let t = TypeNode::generic_param(0, 0);
    let mut decl = function("same", vec![t.clone(), t.clone()], prim(PrimitiveKind::Bool));
    decl.generic_signature = GenericSignature {
        params: vec![GenericParamKey::new(0, 0)],
        requirements: vec![Requirement::Conformance {
            subject: t.clone(),
            protocol: tern_ir::NominalPath::top_level("Swift", "Equatable"),
        }],
    };
    let slots = slots_of(&decl);
    assert_eq!(
        slots.parameter_slots,
        vec![
            indirect(t.clone(), Ownership::Borrowed),
            indirect(t, Ownership::Borrowed),
            CallingConventionSlot::TypeMetadata { generic_index: 0 },
            CallingConventionSlot::WitnessTable {
                requirement_index: 0
            },
        ]
    );
    assert_eq!(slots.return_slot, Some(direct(prim(PrimitiveKind::Bool), 1)));
}

#[test]
fn throwing_adds_a_trailing_error_slot() {
    let mut decl = function("load", vec![prim(PrimitiveKind::Int)], TypeNode::unit());
    decl.flags |= DeclFlags::THROWING;
    let slots = slots_of(&decl);
    assert_eq!(slots.parameter_slots.last(), Some(&CallingConventionSlot::ErrorOut));
    assert_eq!(slots.return_slot, None);
}

// ── Returns ─────────────────────────────────────────────────────

#[test]
fn return_ownership_follows_storage() {
    let cases = [
        (prim(PrimitiveKind::String), Ownership::ReturnedOwned),
        (class("Node"), Ownership::ReturnedOwned),
        (value("Triple", vec![]), Ownership::Owned),
        (TypeNode::generic_param(0, 0), Ownership::ReturnedOwned),
    ];
    for (ty, ownership) in cases {
        let mut decl = function("make", Vec::new(), ty.clone());
        if ty.has_generic_params() {
            decl.generic_signature = GenericSignature {
                params: vec![GenericParamKey::new(0, 0)],
                requirements: Vec::new(),
            };
        }
        assert_eq!(slots_of(&decl).return_slot, Some(indirect(ty, ownership)));
    }
}

// ── Receivers ───────────────────────────────────────────────────

#[test]
fn small_receiver_is_direct() {
    let decl = member("Point", NominalKind::Struct, DeclKind::Method);
    let slots = slots_of(&decl);
    assert_eq!(
        slots.parameter_slots,
        vec![receiver(
            value("Point", vec![]),
            SelfPassing::Direct {
                word_count: 1,
                ownership: Ownership::Borrowed
            }
        )]
    );
    assert_eq!(slots.owner_metatype, None);
}

#[test]
fn mutating_receiver_is_a_mutable_pointer() {
    let mut decl = member("Point", NominalKind::Struct, DeclKind::Method);
    decl.flags |= DeclFlags::MUTATING;
    let mut setter = member("Point", NominalKind::Struct, DeclKind::Setter);
    setter.accessor = Some(AccessorKind::Setter);
    setter.params = vec![param(prim(PrimitiveKind::Int32))];

    let mutable = SelfPassing::Indirect {
        ownership: Ownership::Borrowed,
        mutable: true,
    };
    for decl in [decl, setter] {
        assert_eq!(
            slots_of(&decl).parameter_slots[0],
            receiver(value("Point", vec![]), mutable)
        );
    }
}

#[test]
fn class_receiver_is_the_object_reference() {
    let method = member("Node", NominalKind::Class, DeclKind::Method);
    let mut setter = member("Node", NominalKind::Class, DeclKind::Setter);
    setter.accessor = Some(AccessorKind::Setter);
    setter.params = vec![param(prim(PrimitiveKind::String))];

    assert_eq!(
        slots_of(&method).parameter_slots,
        vec![receiver(class("Node"), BORROWED_REFERENCE)]
    );
    assert_eq!(
        slots_of(&setter).parameter_slots,
        vec![
            receiver(class("Node"), BORROWED_REFERENCE),
            // The new value is consumed.
            indirect(prim(PrimitiveKind::String), Ownership::Owned),
        ]
    );
    let grid = member("Grid", NominalKind::Class, DeclKind::Method);
    assert!(!slots_of(&grid).parameter_slots[0].is_indirect());
}

#[test]
fn non_trivial_struct_receiver_is_borrowed() {
    let decl = member("Holder", NominalKind::Struct, DeclKind::Method);
    assert_eq!(
        slots_of(&decl).parameter_slots,
        vec![receiver(value("Holder", vec![]), BORROWED_SELF)]
    );
}

#[test]
fn generic_receiver_carries_owner_metadata() {
    let decl = member("Box", NominalKind::Struct, DeclKind::Method);
    let boxed = value("Box", vec![TypeNode::generic_param(0, 0)]);
    assert_eq!(
        slots_of(&decl).parameter_slots,
        vec![
            receiver(boxed, BORROWED_SELF),
            CallingConventionSlot::TypeMetadata { generic_index: 0 },
        ]
    );
}

#[test]
fn destructor_consumes_self() {
    let mut decl = member("Node", NominalKind::Class, DeclKind::Destructor);
    decl.destructor = Some(tern_ir::DestructorKind::Deallocating);
    assert_eq!(
        slots_of(&decl).parameter_slots,
        vec![receiver(class("Node"), OWNED_REFERENCE)]
    );
}

// ── Static members and constructors ─────────────────────────────

#[test]
fn constructor_receives_the_metatype_and_returns_owned_self() {
    let mut decl = member("Node", NominalKind::Class, DeclKind::Constructor);
    decl.constructor = Some(ConstructorKind::Allocating);
    decl.params = vec![
        param(prim(PrimitiveKind::String)),
        Parameter {
            convention: ParamConvention::Shared,
            ..param(prim(PrimitiveKind::String))
        },
        param(prim(PrimitiveKind::Int)),
    ];
    decl.result = class("Node");
    let slots = slots_of(&decl);
    assert_eq!(
        slots.parameter_slots,
        vec![
            indirect(prim(PrimitiveKind::String), Ownership::Owned),
            indirect(prim(PrimitiveKind::String), Ownership::Borrowed),
            direct(prim(PrimitiveKind::Int), 1),
        ]
    );
    assert_eq!(slots.owner_metatype, Some(class("Node")));
    assert_eq!(
        slots.return_slot,
        Some(indirect(class("Node"), Ownership::ReturnedOwned))
    );
}

#[test]
fn initializing_constructor_consumes_the_allocated_instance() {
    let mut decl = member("Node", NominalKind::Class, DeclKind::Constructor);
    decl.constructor = Some(ConstructorKind::Initializing);
    decl.params = vec![param(prim(PrimitiveKind::String))];
    decl.result = class("Node");
    let slots = slots_of(&decl);
    assert_eq!(
        slots.parameter_slots,
        vec![
            receiver(class("Node"), OWNED_REFERENCE),
            indirect(prim(PrimitiveKind::String), Ownership::Owned),
        ]
    );
    assert_eq!(slots.owner_metatype, None);
    assert_eq!(
        slots.return_slot,
        Some(indirect(class("Node"), Ownership::ReturnedOwned))
    );
}

#[test]
fn static_member_receives_the_metatype() {
    let mut decl = member("Box", NominalKind::Struct, DeclKind::Method);
    decl.flags |= DeclFlags::STATIC;
    let slots = slots_of(&decl);
    assert_eq!(
        slots.owner_metatype,
        Some(value("Box", vec![TypeNode::generic_param(0, 0)]))
    );
    assert_eq!(
        slots.parameter_slots,
        vec![CallingConventionSlot::TypeMetadata { generic_index: 0 }]
    );
}

#[test]
fn protocol_members_pass_self_generically() {
    let decl = member("Drawable", NominalKind::Protocol, DeclKind::Method);
    assert_eq!(
        slots_of(&decl).parameter_slots,
        vec![
            receiver(TypeNode::generic_param(0, 0), BORROWED_SELF),
            CallingConventionSlot::TypeMetadata { generic_index: 0 },
            CallingConventionSlot::WitnessTable {
                requirement_index: 0
            },
        ]
    );
}

// ── Failures ────────────────────────────────────────────────────

#[test]
fn unavailable_layout_names_the_role() {
    let unknown = value("Mystery", vec![]);
    let resolver = resolver();
    let cases = [
        (
            function("f", vec![prim(PrimitiveKind::Int), unknown.clone()], TypeNode::unit()),
            "parameter 1",
        ),
        (function("g", Vec::new(), unknown.clone()), "return value"),
    ];
    for (decl, role) in cases {
        let err = classify(&decl, &resolver, &ResolvedSignature::default()).unwrap_err();
        assert_eq!(
            err,
            ClassificationError::unavailable(
                LayoutUnavailable {
                    path: path("Mystery")
                },
                role
            )
        );
    }
}

#[test]
fn descriptors_are_not_callable() {
    let mut decl = member("Node", NominalKind::Class, DeclKind::NominalType);
    decl.descriptor = Some(DescriptorRole::TypeMetadata);
    assert_eq!(
        classify(&decl, &resolver(), &ResolvedSignature::default()).unwrap_err(),
        ClassificationError::NotCallable {
            kind: DeclKind::NominalType
        }
    );
}

#[test]
fn classification_is_deterministic() {
    let decl = function(
        "f",
        vec![value("Pair", vec![]), prim(PrimitiveKind::String)],
        value("Holder", vec![]),
    );
    assert_eq!(slots_of(&decl), slots_of(&decl));
}
