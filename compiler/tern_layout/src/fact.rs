//! Layout facts and the nominal layouts they are derived from.

use tern_ir::{GenericParamKey, Ident, LayoutUnavailable, TypeNode};

use crate::TargetConfig;

/// Physical layout of one type on one target.
///
/// `size` excludes tail padding, matching how the runtime reports value
/// sizes. `size_in_words` and `is_direct_passable` are derived from `size`,
/// triviality and the target; use [`LayoutFact::finish`] after changing them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayoutFact {
    pub size: u64,
    pub alignment: u32,
    pub size_in_words: u32,
    /// Copyable bit for bit with no retain, release or copy hook.
    pub is_trivial: bool,
    /// Fixed-size, trivial and small enough for registers.
    pub is_direct_passable: bool,
    /// May hold a reference-counted object somewhere inside.
    pub has_reference_counted_storage: bool,
    /// Has invalid bit patterns an enclosing enum can use as tags.
    pub has_extra_inhabitants: bool,
    /// Size is known without runtime metadata.
    pub is_fixed_size: bool,
}

impl LayoutFact {
    /// A fixed-size fact; call [`LayoutFact::finish`] before handing it out.
    pub const fn fixed(size: u64, alignment: u32, is_trivial: bool) -> Self {
        LayoutFact {
            size,
            alignment,
            size_in_words: 0,
            is_trivial,
            is_direct_passable: false,
            has_reference_counted_storage: false,
            has_extra_inhabitants: false,
            is_fixed_size: true,
        }
    }

    /// Fixed-size trivial scalar.
    pub fn scalar(size: u64, target: &TargetConfig) -> Self {
        let alignment = u32::try_from(size.clamp(1, 16)).unwrap_or(1);
        LayoutFact::fixed(size, alignment, true).finish(target)
    }

    /// A value of `words` pointer-sized words holding retained references.
    pub fn reference_words(words: u64, target: &TargetConfig) -> Self {
        LayoutFact {
            has_reference_counted_storage: true,
            has_extra_inhabitants: true,
            ..LayoutFact::fixed(target.words(words), target.word_size, false)
        }
        .finish(target)
    }

    /// A single strong reference (class instance, boxed payload).
    pub fn reference(target: &TargetConfig) -> Self {
        LayoutFact::reference_words(1, target)
    }

    /// A trivial value of `words` words; `extra` marks non-null pointers.
    pub fn trivial_words(words: u64, extra: bool, target: &TargetConfig) -> Self {
        LayoutFact {
            has_extra_inhabitants: extra,
            ..LayoutFact::fixed(target.words(words), target.word_size, true)
        }
        .finish(target)
    }

    /// Layout only known at runtime through type metadata.
    ///
    /// Generic parameters and dependent members resolve to this: not fixed,
    /// assumed to hold references, never passed directly.
    pub const fn dependent() -> Self {
        LayoutFact {
            size: 0,
            alignment: 1,
            size_in_words: 0,
            is_trivial: false,
            is_direct_passable: false,
            has_reference_counted_storage: true,
            has_extra_inhabitants: false,
            is_fixed_size: false,
        }
    }

    /// Recompute the derived fields for `target`.
    #[must_use]
    pub fn finish(mut self, target: &TargetConfig) -> Self {
        if self.is_fixed_size {
            self.size_in_words = target.words_for(self.size);
        } else {
            self.size_in_words = 0;
        }
        self.alignment = self.alignment.max(1);
        self.is_direct_passable = self.is_fixed_size
            && self.is_trivial
            && self.size_in_words <= target.max_direct_words;
        self
    }
}

/// Result of a layout query that did not fail outright.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LayoutOutcome {
    Fact(LayoutFact),
    /// Some nominal type inside has no known layout.
    Unavailable(LayoutUnavailable),
}

impl LayoutOutcome {
    pub fn fact(&self) -> Option<&LayoutFact> {
        match self {
            LayoutOutcome::Fact(fact) => Some(fact),
            LayoutOutcome::Unavailable(_) => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, LayoutOutcome::Fact(_))
    }
}

/// A stored property of a struct.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldLayout {
    pub name: Ident,
    /// Field type; generic parameters refer to the owning nominal's own.
    pub ty: TypeNode,
}

impl FieldLayout {
    pub fn new(name: &str, ty: TypeNode) -> Self {
        FieldLayout {
            name: Ident::new(name),
            ty,
        }
    }
}

/// One case of an enum.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EnumCase {
    pub name: Ident,
    pub payload: Option<TypeNode>,
    /// Payload lives in a heap box (`indirect case`).
    pub indirect: bool,
}

impl EnumCase {
    pub fn empty(name: &str) -> Self {
        EnumCase {
            name: Ident::new(name),
            payload: None,
            indirect: false,
        }
    }

    pub fn with_payload(name: &str, payload: TypeNode) -> Self {
        EnumCase {
            name: Ident::new(name),
            payload: Some(payload),
            indirect: false,
        }
    }

    #[must_use]
    pub fn indirect(mut self) -> Self {
        self.indirect = true;
        self
    }
}

/// How a nominal type is laid out.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum NominalShape {
    /// Precomputed; field layout is not exposed.
    Opaque(LayoutFact),
    Struct { fields: Vec<FieldLayout> },
    Enum { cases: Vec<EnumCase> },
    /// Reference type; instances are one strong reference.
    Class,
}

/// Layout of a nominal type as supplied by a [`LayoutLookup`](crate::LayoutLookup).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NominalLayout {
    /// Number of generic parameters introduced at each depth, outermost
    /// first. `Outer<A>.Inner<B, C>` is `[1, 2]`; non-generic types are `[]`.
    pub generic_depths: Vec<u32>,
    pub shape: NominalShape,
}

impl NominalLayout {
    pub fn opaque(fact: LayoutFact) -> Self {
        NominalLayout {
            generic_depths: Vec::new(),
            shape: NominalShape::Opaque(fact),
        }
    }

    pub fn structure(fields: Vec<FieldLayout>) -> Self {
        NominalLayout {
            generic_depths: Vec::new(),
            shape: NominalShape::Struct { fields },
        }
    }

    pub fn enumeration(cases: Vec<EnumCase>) -> Self {
        NominalLayout {
            generic_depths: Vec::new(),
            shape: NominalShape::Enum { cases },
        }
    }

    pub fn class() -> Self {
        NominalLayout {
            generic_depths: Vec::new(),
            shape: NominalShape::Class,
        }
    }

    #[must_use]
    pub fn with_generic_depths(mut self, depths: Vec<u32>) -> Self {
        self.generic_depths = depths;
        self
    }

    /// Total generic parameters across all depths.
    pub fn generic_param_count(&self) -> usize {
        self.generic_depths.iter().map(|&count| count as usize).sum()
    }

    /// Generic parameters in declaration order, outermost depth first.
    pub fn generic_params(&self) -> Vec<GenericParamKey> {
        let mut params = Vec::with_capacity(self.generic_param_count());
        for (depth, &count) in (0u32..).zip(&self.generic_depths) {
            params.extend((0..count).map(|index| GenericParamKey::new(depth, index)));
        }
        params
    }

    /// Position of `key` in the flattened argument list.
    pub fn argument_index(&self, key: GenericParamKey) -> Option<usize> {
        let depth = usize::try_from(key.depth).ok()?;
        let count = *self.generic_depths.get(depth)?;
        if key.index >= count {
            return None;
        }
        let before: usize = self.generic_depths[..depth]
            .iter()
            .map(|&count| count as usize)
            .sum();
        Some(before + key.index as usize)
    }
}
