//! Platform layouts of standard-library types.
//!
//! Scalars never get here; the type model turns them into
//! [`TypeNode::Primitive`] up front. This table covers the generic containers
//! and pointer wrappers that show up in library signatures.

use rustc_hash::FxHashMap;
use tern_ir::{NominalPath, TypeNode, STDLIB_MODULE};

use crate::{EnumCase, FieldLayout, LayoutFact, LayoutLookup, NominalLayout, TargetConfig};

/// Built-in [`LayoutLookup`] for the `Swift` module.
#[derive(Clone, Debug)]
pub struct StdlibLayouts {
    layouts: FxHashMap<NominalPath, NominalLayout>,
}

impl StdlibLayouts {
    pub fn new(target: &TargetConfig) -> Self {
        let mut table = Table {
            layouts: FxHashMap::default(),
        };

        // ── Reference-backed containers ──
        let one_ref = LayoutFact::reference(target);
        table.opaque("Array", &[1], one_ref);
        table.opaque("ContiguousArray", &[1], one_ref);
        table.opaque("Set", &[1], one_ref);
        table.opaque("Dictionary", &[2], one_ref);
        table.opaque("ArraySlice", &[1], LayoutFact::reference_words(4, target));
        table.opaque("Substring", &[], LayoutFact::reference_words(4, target));
        table.opaque("AnyHashable", &[], LayoutFact::reference_words(5, target));
        table.opaque("AnyKeyPath", &[], one_ref);
        table.opaque("KeyPath", &[2], one_ref);
        table.opaque("WritableKeyPath", &[2], one_ref);
        table.opaque("ReferenceWritableKeyPath", &[2], one_ref);

        // ── Pointers ──
        let pointer = LayoutFact::trivial_words(1, true, target);
        table.opaque("UnsafePointer", &[1], pointer);
        table.opaque("UnsafeMutablePointer", &[1], pointer);
        table.opaque("AutoreleasingUnsafeMutablePointer", &[1], pointer);
        table.opaque("Unmanaged", &[1], pointer);
        table.opaque("ObjectIdentifier", &[], pointer);
        let buffer = LayoutFact::trivial_words(2, false, target);
        table.opaque("UnsafeBufferPointer", &[1], buffer);
        table.opaque("UnsafeMutableBufferPointer", &[1], buffer);
        table.opaque("UnsafeRawBufferPointer", &[], buffer);
        table.opaque("UnsafeMutableRawBufferPointer", &[], buffer);

        // StaticString: start pointer or scalar, byte count, one flags byte.
        let static_string = LayoutFact::fixed(target.words(2) + 1, target.word_size, true);
        table.opaque("StaticString", &[], static_string.finish(target));

        // ── Generic value types with visible fields ──
        let bound = TypeNode::generic_param(0, 0);
        for range in ["Range", "ClosedRange"] {
            table.fields(
                range,
                &[1],
                vec![
                    FieldLayout::new("lowerBound", bound.clone()),
                    FieldLayout::new("upperBound", bound.clone()),
                ],
            );
        }
        table.fields(
            "PartialRangeFrom",
            &[1],
            vec![FieldLayout::new("lowerBound", bound.clone())],
        );
        table.fields(
            "PartialRangeUpTo",
            &[1],
            vec![FieldLayout::new("upperBound", bound.clone())],
        );
        table.fields(
            "PartialRangeThrough",
            &[1],
            vec![FieldLayout::new("upperBound", bound.clone())],
        );
        table.cases(
            "Result",
            &[2],
            vec![
                EnumCase::with_payload("success", bound),
                EnumCase::with_payload("failure", TypeNode::generic_param(0, 1)),
            ],
        );
        table.cases("Never", &[], Vec::new());
        // Optional types lower to `TypeNode::Optional`; the entry only
        // describes the generic context of extensions on `Optional`.
        table.cases(
            "Optional",
            &[1],
            vec![
                EnumCase::with_payload("some", TypeNode::generic_param(0, 0)),
                EnumCase::empty("none"),
            ],
        );

        StdlibLayouts {
            layouts: table.layouts,
        }
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }
}

impl LayoutLookup for StdlibLayouts {
    fn nominal_layout(&self, path: &NominalPath) -> Option<NominalLayout> {
        if !path.is_stdlib() {
            return None;
        }
        self.layouts.get(path).cloned()
    }
}

struct Table {
    layouts: FxHashMap<NominalPath, NominalLayout>,
}

impl Table {
    fn insert(&mut self, name: &str, depths: &[u32], layout: NominalLayout) {
        self.layouts.insert(
            NominalPath::top_level(STDLIB_MODULE, name),
            layout.with_generic_depths(depths.to_vec()),
        );
    }

    fn opaque(&mut self, name: &str, depths: &[u32], fact: LayoutFact) {
        self.insert(name, depths, NominalLayout::opaque(fact));
    }

    fn fields(&mut self, name: &str, depths: &[u32], fields: Vec<FieldLayout>) {
        self.insert(name, depths, NominalLayout::structure(fields));
    }

    fn cases(&mut self, name: &str, depths: &[u32], cases: Vec<EnumCase>) {
        self.insert(name, depths, NominalLayout::enumeration(cases));
    }
}
