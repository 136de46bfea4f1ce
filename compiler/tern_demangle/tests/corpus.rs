//! Demangling real exported symbols.
//!
//! The corpus below was collected from libraries built by the stable
//! toolchain. Each entry must demangle; the assertions check the parts of the
//! declaration later stages depend on.

#![allow(clippy::unwrap_used, reason = "tests panic on unexpected failures")]

use pretty_assertions::assert_eq;
use tern_demangle::{demangle, demangle_type, is_mangled, DemangleErrorKind};
use tern_ir::{
    Context, DeclKind, DescriptorRole, NominalKind, NominalPath, PrimitiveKind, TypeNode,
};

const CORPUS: &[&str] = &[
    "$s10Foundation4DateVMa",
    "$s10Foundation4DateVMn",
    "$s10Foundation4DateVN",
    "$s11OutputTests3FooC1xSivMTq",
    "$s12CoreGraphics7CGFloatVN",
    "$s17unitHelpFrawework10AKDurationV16secondsPerMinuteSivau",
    "$s17unitHelpFrawework10ReturnsInt1a1bS2i_SitF",
    "$s17unitHelpFrawework10ReturnsInt1a1bS2iz_SitF",
    "$s17unitHelpFrawework10ReturnsInt1a1bS2u_SitF",
    "$s17unitHelpFrawework10ReturnsInt1a1bSiSb_SitF",
    "$s17unitHelpFrawework10ReturnsInt1a1bSiSd_SitF",
    "$s17unitHelpFrawework10ReturnsInt1a1bSiSf_SitF",
    "$s17unitHelpFrawework10ReturnsInt1aS2iSg_tF",
    "$s17unitHelpFrawework10ReturnsInt3arg1cS2u1a_Si1bt_SitF",
    "$s17unitHelpFrawework10ReturnsIntSiyF",
    "$s17unitHelpFrawework11aFinalClassC11aStaticPropSbvpZ",
    "$s17unitHelpFrawework12ReturnsTuple1a1bSb_SitSb_SitF",
    "$s17unitHelpFrawework16MaybeItWillThrow1aySb_tKF",
    "$s17unitHelpFrawework20AKPinkNoiseAudioUnitC9amplitudeSivW",
    "$s17unitHelpFrawework20AKPinkNoiseAudioUnitC9amplitudeSivw",
    "$s17unitHelpFrawework3BarVMn",
    "$s17unitHelpFrawework3BazOMn",
    "$s17unitHelpFrawework3FooC2eeoiySbAC_ACtFZ",
    "$s17unitHelpFrawework3FooC3BarC4doIt1a1b1cyx_qd__qd0__tlF",
    "$s17unitHelpFrawework3FooC4failACSgSb_tcfc",
    "$s17unitHelpFrawework3FooC5waterSivpfi",
    "$s17unitHelpFrawework3FooC8TestFunc1aSiSb_tFZ",
    "$s17unitHelpFrawework3FooCAA4UppyAAWP",
    "$s17unitHelpFrawework3FooCMa",
    "$s17unitHelpFrawework3FooCMn",
    "$s17unitHelpFrawework3FooCN",
    "$s17unitHelpFrawework3FooCyS2iciM",
    "$s17unitHelpFrawework3FooCyS2icig",
    "$s17unitHelpFrawework3FooCyS2icis",
    "$s17unitHelpFrawework3FooO8TestFunc1aSiSb_tF",
    "$s17unitHelpFrawework3FooV8TestFunc1aSiSb_tF",
    "$s17unitHelpFrawework3FooVMn",
    "$s17unitHelpFrawework3foo1a1b1c1dyx_q_q0_q1_tr2_lF",
    "$s17unitHelpFrawework3foo_1b1c1dyx_S3itlF",
    "$s17unitHelpFrawework3spsoiyS2i_SitF",
    "$s17unitHelpFrawework4JSONC17dictionaryLiteralACSS_yptd_tcfC",
    "$s17unitHelpFrawework4NoneC8somePropSivM",
    "_$s17unitHelpFrawework21PathPositionAnimationC014createKeyframeF033_3D85A716E8AC30D62D97E78DB643A23DLLyyF",
    "$s4main3FooVAA1PA2aDP3baryyFTW",
    "_$s14DateTimePicker0abC8DelegateTL",
    "_$s4Neon9FrameableTL",
    "_$s4Neon10AnchorablePAA9FrameableTb",
    "_$s4Neon9GroupablePAA9FrameableTb",
    "_$s8itsAFiveMXM",
    "_$s8itsAFive2E2OMF",
    "_$s8itsAFive2E2OMB",
];

#[test]
fn corpus_demangles() {
    for symbol in CORPUS {
        if let Err(err) = demangle(symbol) {
            panic!("{symbol}: {err}");
        }
    }
}

#[test]
fn corpus_is_deterministic() {
    for symbol in CORPUS {
        assert_eq!(demangle(symbol), demangle(symbol), "{symbol}");
    }
}

#[test]
fn independent_parses_share_type_identity() {
    let first = demangle("$s17unitHelpFrawework3FooC4failACSgSb_tcfc").unwrap();
    let second = demangle("$s17unitHelpFrawework3FooCMn").unwrap();
    let TypeNode::Optional(wrapped) = &first.result else {
        panic!("expected an optional result, got {:?}", first.result);
    };
    assert_eq!(Some(wrapped.as_ref()), second.subject.as_ref());
}

#[test]
fn concurrent_calls_agree() {
    let expected: Vec<_> = CORPUS.iter().map(|s| demangle(s)).collect();
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| CORPUS.iter().map(|s| demangle(s)).collect::<Vec<_>>()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn truncated_symbol_does_not_poison_the_next() {
    let truncated = "$s17unitHelpFrawework3FooC4failACSgSb_t";
    let err = demangle(truncated).unwrap_err();
    assert!(err.offset <= truncated.len());
    assert!(truncated.starts_with(&err.consumed));

    let decl = demangle("$s17unitHelpFrawework3FooC4failACSgSb_tcfc").unwrap();
    assert_eq!(decl.kind, DeclKind::Constructor);
}

#[test]
fn foreign_symbols_are_rejected_up_front() {
    for symbol in ["_ZN3foo3barEv", "main", "", "_T0SiN"] {
        assert!(!is_mangled(symbol));
        let err = demangle(symbol).unwrap_err();
        assert_eq!(err.kind, DemangleErrorKind::UnsupportedPrefix);
        assert_eq!(err.offset, 0);
    }
}

#[test]
fn uppercase_prefix_is_accepted() {
    let decl = demangle("$S17unitHelpFrawework3FooCMn").unwrap();
    assert_eq!(decl.descriptor, Some(DescriptorRole::NominalTypeDescriptor));
}

#[test]
fn reflection_and_context_descriptors() {
    let e2 = TypeNode::nominal(NominalPath::top_level("itsAFive", "E2"), NominalKind::Enum, vec![]);
    for (symbol, role) in [
        ("_$s8itsAFive2E2OMF", DescriptorRole::FieldDescriptor),
        ("_$s8itsAFive2E2OMB", DescriptorRole::BuiltinDescriptor),
    ] {
        let decl = demangle(symbol).unwrap();
        assert_eq!(decl.kind, DeclKind::NominalType);
        assert_eq!(decl.descriptor, Some(role));
        assert_eq!(decl.subject.as_ref(), Some(&e2));
        assert!(!decl.is_callable());
    }

    let module = demangle("_$s8itsAFiveMXM").unwrap();
    assert_eq!(module.descriptor, Some(DescriptorRole::ModuleDescriptor));
    assert_eq!(module.context, Context::module("itsAFive"));
    assert_eq!(module.subject, None);
}

#[test]
fn protocol_requirement_descriptors() {
    let base = demangle("_$s14DateTimePicker0abC8DelegateTL").unwrap();
    assert_eq!(
        base.descriptor,
        Some(DescriptorRole::ProtocolRequirementsBaseDescriptor)
    );
    assert_eq!(
        base.context.owner_path(),
        Some(NominalPath::top_level("DateTimePicker", "DateTimePickerDelegate"))
    );

    let inherited = demangle("_$s4Neon10AnchorablePAA9FrameableTb").unwrap();
    assert_eq!(inherited.descriptor, Some(DescriptorRole::BaseConformanceDescriptor));
    assert_eq!(
        inherited.context.owner_path(),
        Some(NominalPath::top_level("Neon", "Anchorable"))
    );
    let conformance = inherited.conformance.unwrap();
    assert_eq!(conformance.protocol, NominalPath::top_level("Neon", "Frameable"));
    assert_eq!(conformance.module.as_str(), "Neon");
}

#[test]
fn bare_types() {
    assert_eq!(demangle_type("Si").unwrap(), TypeNode::Primitive(PrimitiveKind::Int));
    assert_eq!(
        demangle_type("SiSg").unwrap(),
        TypeNode::Optional(Box::new(TypeNode::Primitive(PrimitiveKind::Int)))
    );
    assert_eq!(
        demangle_type("SaySSG").unwrap(),
        TypeNode::nominal(
            NominalPath::top_level("Swift", "Array"),
            NominalKind::Struct,
            vec![TypeNode::Primitive(PrimitiveKind::String)],
        )
    );
    assert_eq!(
        demangle_type("Sd_Sdt").unwrap(),
        TypeNode::Tuple(vec![
            tern_ir::TupleElement::unlabeled(TypeNode::Primitive(PrimitiveKind::Double)),
            tern_ir::TupleElement::unlabeled(TypeNode::Primitive(PrimitiveKind::Double)),
        ])
    );
}

#[test]
fn bare_nominal_from_another_module() {
    let ty = demangle_type("12CoreGraphics7CGFloatV").unwrap();
    assert_eq!(
        ty,
        TypeNode::nominal(
            NominalPath::top_level("CoreGraphics", "CGFloat"),
            NominalKind::Struct,
            vec![],
        )
    );
}
