use pretty_assertions::assert_eq;
use tern_ir::{
    ClassificationError, GenericParamKey, GenericSignature, Ident, LayoutConstraint, NominalKind,
    NominalPath, PrimitiveKind, Requirement, TypeNode,
};

use super::*;

fn proto(name: &str) -> NominalPath {
    NominalPath::top_level("Lib", name)
}

fn param(index: u32) -> TypeNode {
    TypeNode::generic_param(0, index)
}

fn member(base: TypeNode, name: &str) -> TypeNode {
    TypeNode::DependentMember {
        base: Box::new(base),
        protocol: Some(proto("Container")),
        name: Ident::new(name),
    }
}

fn conforms(subject: TypeNode, protocol: &str) -> Requirement {
    Requirement::Conformance {
        subject,
        protocol: proto(protocol),
    }
}

fn same(subject: TypeNode, target: TypeNode) -> Requirement {
    Requirement::SameType { subject, target }
}

fn signature(params: u32, requirements: Vec<Requirement>) -> GenericSignature {
    GenericSignature {
        params: (0..params).map(|i| GenericParamKey::new(0, i)).collect(),
        requirements,
    }
}

fn table(parameter_index: usize, protocol: &str) -> WitnessRequirement {
    WitnessRequirement {
        parameter_index,
        protocol: proto(protocol),
        kind: WitnessKind::WitnessTable,
        associated_type: None,
    }
}

#[test]
fn unconstrained_parameters_need_no_witnesses() {
    assert_eq!(resolve(&signature(2, Vec::new())).unwrap(), Vec::new());
}

#[test]
fn parameters_in_order_then_requirements_in_order() {
    // Requirements are declared U-first; witnesses still follow T, then U.
    let sig = signature(
        2,
        vec![
            conforms(param(1), "Hashable"),
            conforms(param(0), "Equatable"),
            conforms(param(1), "Codable"),
        ],
    );
    assert_eq!(
        resolve(&sig).unwrap(),
        vec![table(0, "Equatable"), table(1, "Hashable"), table(1, "Codable")]
    );
}

#[test]
fn associated_type_conformance() {
    let element = member(param(0), "Element");
    let sig = signature(
        1,
        vec![conforms(param(0), "Container"), conforms(element.clone(), "Equatable")],
    );
    assert_eq!(
        resolve(&sig).unwrap(),
        vec![
            table(0, "Container"),
            WitnessRequirement {
                parameter_index: 0,
                protocol: proto("Equatable"),
                kind: WitnessKind::AssociatedTypeMetadata,
                associated_type: Some(element),
            },
        ]
    );
}

#[test]
fn class_and_layout_constraints_add_nothing() {
    let base = TypeNode::nominal(proto("Base"), NominalKind::Class, Vec::new());
    let sig = signature(
        1,
        vec![
            Requirement::BaseClass {
                subject: param(0),
                class: base,
            },
            Requirement::Layout {
                subject: param(0),
                constraint: LayoutConstraint::Class,
            },
        ],
    );
    assert_eq!(resolve(&sig).unwrap(), Vec::new());
}

#[test]
fn consistent_same_type_constraints() {
    let int = TypeNode::Primitive(PrimitiveKind::Int);
    let sig = signature(
        2,
        vec![
            same(param(0), param(1)),
            same(member(param(0), "Element"), int.clone()),
            same(member(param(1), "Element"), int),
            conforms(param(0), "Container"),
        ],
    );
    assert_eq!(resolve(&sig).unwrap(), vec![table(0, "Container")]);
}

#[test]
fn conflicting_same_type_constraints() {
    let int = TypeNode::Primitive(PrimitiveKind::Int);
    let string = TypeNode::Primitive(PrimitiveKind::String);
    let sig = signature(
        2,
        vec![
            same(param(0), int),
            same(param(1), string),
            same(param(0), param(1)),
        ],
    );
    let err = resolve(&sig).unwrap_err();
    assert_eq!(
        err,
        ClassificationError::ConflictingSameType {
            subject: "τ_0_0".to_owned(),
            first: "Int".to_owned(),
            second: "String".to_owned(),
        }
    );
}

#[test]
fn direct_rebinding_conflicts() {
    let sig = signature(
        1,
        vec![
            same(member(param(0), "Element"), TypeNode::Primitive(PrimitiveKind::Int)),
            same(member(param(0), "Element"), TypeNode::Primitive(PrimitiveKind::Bool)),
        ],
    );
    assert!(matches!(
        resolve(&sig),
        Err(ClassificationError::ConflictingSameType { .. })
    ));
}

#[test]
fn requirement_on_unknown_parameter() {
    let sig = signature(1, vec![conforms(TypeNode::generic_param(1, 0), "Equatable")]);
    assert_eq!(
        resolve(&sig).unwrap_err(),
        ClassificationError::UnknownGenericParam {
            param: GenericParamKey::new(1, 0)
        }
    );

    let sig = signature(1, vec![same(param(0), param(3))]);
    assert_eq!(
        resolve(&sig).unwrap_err(),
        ClassificationError::UnknownGenericParam {
            param: GenericParamKey::new(0, 3)
        }
    );
}

#[test]
fn requirement_on_concrete_type_is_unsupported() {
    let sig = signature(
        1,
        vec![conforms(TypeNode::Primitive(PrimitiveKind::Int), "Equatable")],
    );
    assert!(matches!(
        resolve(&sig),
        Err(ClassificationError::UnsupportedGenericShape { .. })
    ));
}

#[test]
fn demangled_signature() {
    let decl = tern_demangle::demangle("$s15BadAssociations7doPrint1a1byx_q_tAA5AdderR_AA6SubberR_r0_lF")
        .unwrap();
    let resolved = resolve(&decl.generic_signature).unwrap();
    let summary: Vec<_> = resolved
        .iter()
        .map(|req| (req.parameter_index, req.protocol.to_string(), req.kind))
        .collect();
    assert_eq!(
        summary,
        vec![
            (1, "BadAssociations.Adder".to_owned(), WitnessKind::WitnessTable),
            (1, "BadAssociations.Subber".to_owned(), WitnessKind::WitnessTable),
        ]
    );
}
