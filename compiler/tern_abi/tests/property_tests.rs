//! Property-based tests for slot order.
//!
//! For any declaration with N parameters, G generic parameters, W witness
//! requirements and throwing flag T, the plan's slots must be
//! `[self?] ++ N values ++ G metadata ++ W witness tables ++ [error iff T]`.

#![allow(clippy::unwrap_used, reason = "Tests can panic")]
#![allow(
    clippy::doc_markdown,
    clippy::redundant_closure_for_method_calls,
    reason = "Proptest macros generate code with these patterns"
)]

use std::sync::Arc;

use proptest::prelude::*;
use tern_abi::{BindingPlanBuilder, CallingConventionSlot};
use tern_ir::{
    Context, DeclFlags, DeclKind, Declaration, GenericParamKey, GenericSignature, NominalKind,
    NominalPath, Parameter, PrimitiveKind, Requirement, TypeNode,
};
use tern_layout::{
    ChainedLookup, FieldLayout, LayoutResolver, LibraryLayouts, NominalLayout, StdlibLayouts,
    TargetConfig,
};

const PROTOCOLS: &[&str] = &["Equatable", "Hashable", "Comparable"];

/// Where the declaration lives.
#[derive(Copy, Clone, Debug)]
enum Owner {
    TopLevel,
    Instance,
    Static,
}

#[derive(Clone, Debug)]
struct Shape {
    owner: Owner,
    generics: u32,
    /// Indices into [`value_type`].
    params: Vec<usize>,
    /// `(generic parameter, protocol)` pairs.
    requirements: Vec<(u32, usize)>,
    throws: bool,
}

fn pair() -> NominalPath {
    NominalPath::top_level("main", "Pair")
}

fn resolver() -> LayoutResolver {
    let int = TypeNode::Primitive(PrimitiveKind::Int);
    let library = LibraryLayouts::new();
    library.register(
        pair(),
        NominalLayout::structure(vec![
            FieldLayout::new("a", int.clone()),
            FieldLayout::new("b", int),
        ]),
    );
    let target = TargetConfig::host_64();
    let lookup = ChainedLookup::new()
        .then(Arc::new(library))
        .then(Arc::new(StdlibLayouts::new(&target)));
    LayoutResolver::new(target, Arc::new(lookup))
}

fn value_type(index: usize) -> TypeNode {
    match index {
        0 => TypeNode::Primitive(PrimitiveKind::Int),
        1 => TypeNode::Primitive(PrimitiveKind::Bool),
        2 => TypeNode::Primitive(PrimitiveKind::String),
        3 => TypeNode::nominal(pair(), NominalKind::Struct, Vec::new()),
        4 => TypeNode::Optional(Box::new(TypeNode::Primitive(PrimitiveKind::Double))),
        generic => TypeNode::generic_param(0, u32::try_from(generic - 5).unwrap()),
    }
}

fn shape() -> impl Strategy<Value = Shape> {
    (0u32..3)
        .prop_flat_map(|generics| {
            let requirements = if generics == 0 {
                Just(Vec::new()).boxed()
            } else {
                prop::collection::vec((0..generics, 0..PROTOCOLS.len()), 0..4).boxed()
            };
            (
                prop_oneof![Just(Owner::TopLevel), Just(Owner::Instance), Just(Owner::Static)],
                Just(generics),
                prop::collection::vec(0..5 + generics as usize, 0..6),
                requirements,
                any::<bool>(),
            )
        })
        .prop_map(|(owner, generics, params, requirements, throws)| Shape {
            owner,
            generics,
            params,
            requirements,
            throws,
        })
}

fn declaration(shape: &Shape) -> Declaration {
    let mut decl = match shape.owner {
        Owner::TopLevel => Declaration::new(DeclKind::Function, Context::module("main")),
        Owner::Instance | Owner::Static => Declaration::new(
            DeclKind::Method,
            Context::nominal(&pair(), &[NominalKind::Struct]),
        ),
    };
    if matches!(shape.owner, Owner::Static) {
        decl.flags |= DeclFlags::STATIC;
    }
    if shape.throws {
        decl.flags |= DeclFlags::THROWING;
    }
    decl.params = shape
        .params
        .iter()
        .map(|&index| Parameter::new(None, value_type(index)))
        .collect();
    decl.generic_signature = GenericSignature {
        params: (0..shape.generics).map(|index| GenericParamKey::new(0, index)).collect(),
        requirements: shape
            .requirements
            .iter()
            .map(|&(param, protocol)| Requirement::Conformance {
                subject: TypeNode::generic_param(0, param),
                protocol: NominalPath::top_level("Swift", PROTOCOLS[protocol]),
            })
            .collect(),
    };
    decl
}

fn distinct_requirements(shape: &Shape) -> usize {
    let mut seen = Vec::new();
    for requirement in &shape.requirements {
        if !seen.contains(requirement) {
            seen.push(*requirement);
        }
    }
    seen.len()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn slots_follow_the_calling_convention_order(shape in shape()) {
        let decl = declaration(&shape);
        let resolver = resolver();
        let plan = BindingPlanBuilder::new(&resolver).plan(&decl).unwrap();

        let mut expected = Vec::new();
        if matches!(shape.owner, Owner::Instance) {
            expected.push("self");
        }
        expected.extend(decl.params.iter().map(|_| "value"));
        expected.extend((0..shape.generics).map(|_| "metadata"));
        expected.extend((0..distinct_requirements(&shape)).map(|_| "witness"));
        if shape.throws {
            expected.push("error");
        }
        let actual: Vec<_> = plan
            .parameter_slots
            .iter()
            .map(|slot| match slot {
                CallingConventionSlot::SelfParameter { .. } => "self",
                CallingConventionSlot::DirectValue { .. }
                | CallingConventionSlot::IndirectPointer { .. } => "value",
                CallingConventionSlot::TypeMetadata { .. } => "metadata",
                CallingConventionSlot::WitnessTable { .. } => "witness",
                CallingConventionSlot::ErrorOut => "error",
            })
            .collect();
        prop_assert_eq!(actual, expected);
        prop_assert_eq!(plan.throws, shape.throws);
        prop_assert_eq!(plan.owner_metatype.is_some(), matches!(shape.owner, Owner::Static));
    }

    #[test]
    fn values_keep_source_order(shape in shape()) {
        let decl = declaration(&shape);
        let resolver = resolver();
        let plan = BindingPlanBuilder::new(&resolver).plan(&decl).unwrap();
        let types: Vec<_> = plan.formal_parameters().filter_map(|slot| slot.ty()).collect();
        let declared: Vec<_> = decl.params.iter().map(|param| &param.ty).collect();
        prop_assert_eq!(types, declared);

        for slot in plan.formal_parameters() {
            let generic = slot.ty().is_some_and(|ty| ty.has_generic_params());
            if generic {
                prop_assert!(slot.is_indirect());
            }
        }
    }

    #[test]
    fn planning_is_deterministic(shape in shape()) {
        let decl = declaration(&shape);
        let first = resolver();
        let second = resolver();
        let a = BindingPlanBuilder::new(&first).plan(&decl).unwrap();
        let b = BindingPlanBuilder::new(&second).plan(&decl).unwrap();
        let again = BindingPlanBuilder::new(&first).plan(&decl).unwrap();
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(&a, &again);
    }
}
