//! Memoizing layout resolver.
//!
//! Two read-through caches sit in front of the computation:
//!
//! | Cache | Key | Value |
//! |-------|-----|-------|
//! | types | `TypeNode` | layout outcome or error |
//! | nominals | `NominalPath` | raw layout from the lookup |
//!
//! Both are `DashMap`s of `Arc<OnceLock<_>>` cells. A caller clones the cell
//! out of the map, releases the shard lock, then initializes the cell, so
//! concurrent callers asking for the same key block on one computation
//! instead of repeating it, and no shard lock is held across the recursion.
//!
//! A `OnceLock` cannot be re-entered by its own initializer, so a type that
//! contains itself inline would deadlock. [`cycle`] walks the inline
//! containment of a type before any type cell is touched and reports such
//! types as [`ClassificationError::RecursiveLayout`].

mod aggregate;
mod cycle;

use std::fmt;
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use tern_ir::{
    BuiltinKind, ClassificationError, ExistentialType, FunctionConvention, FunctionType,
    LayoutUnavailable, NominalKind, NominalPath, NominalType, PrimitiveKind, TypeNode,
};
use tern_stack::{ensure_sufficient_stack, DEFAULT_MAX_DEPTH};

use crate::{LayoutFact, LayoutLookup, LayoutOutcome, NominalLayout, NominalShape, TargetConfig};

use self::aggregate::{enum_fact, Aggregate};

type LayoutResult = Result<LayoutOutcome, ClassificationError>;
type TypeCell = Arc<OnceLock<LayoutResult>>;
type NominalCell = Arc<OnceLock<Option<Arc<NominalLayout>>>>;

/// Computes [`LayoutFact`]s for the types in demangled declarations.
///
/// Shared by every symbol of a batch; all methods take `&self`.
pub struct LayoutResolver {
    target: TargetConfig,
    lookup: Arc<dyn LayoutLookup>,
    max_depth: u32,
    types: DashMap<TypeNode, TypeCell>,
    nominals: DashMap<NominalPath, NominalCell>,
}

impl LayoutResolver {
    pub fn new(target: TargetConfig, lookup: Arc<dyn LayoutLookup>) -> Self {
        LayoutResolver {
            target,
            lookup,
            max_depth: DEFAULT_MAX_DEPTH,
            types: DashMap::new(),
            nominals: DashMap::new(),
        }
    }

    /// Limit on inline nesting (struct in struct in tuple ...).
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn target(&self) -> &TargetConfig {
        &self.target
    }

    /// Layout of `ty` on the configured target.
    ///
    /// Returns `Unavailable` when some nominal type inside has no known
    /// layout. Errors are reserved for types that cannot have a layout at all
    /// (inline cycles, wrong generic arity) or nest too deeply.
    pub fn layout_of(&self, ty: &TypeNode) -> Result<LayoutOutcome, ClassificationError> {
        if let Some(done) = self.cached(ty) {
            return done;
        }
        cycle::check(self, ty)?;
        self.resolve(ty)
    }

    /// Raw layout of a nominal type, asking the lookup at most once per path.
    pub fn nominal_layout(&self, path: &NominalPath) -> Option<Arc<NominalLayout>> {
        let cell = match self.nominals.get(path) {
            Some(cell) => Arc::clone(cell.value()),
            None => Arc::clone(self.nominals.entry(path.clone()).or_default().value()),
        };
        cell.get_or_init(|| {
            let found = self.lookup.nominal_layout(path).map(Arc::new);
            tracing::debug!(%path, found = found.is_some(), "nominal layout lookup");
            found
        })
        .clone()
    }

    /// Number of types with a memoized outcome.
    pub fn cached_types(&self) -> usize {
        self.types
            .iter()
            .filter(|entry| entry.value().get().is_some())
            .count()
    }

    fn cached(&self, ty: &TypeNode) -> Option<LayoutResult> {
        self.types.get(ty).and_then(|cell| cell.value().get().cloned())
    }

    fn is_cached(&self, ty: &TypeNode) -> bool {
        self.types
            .get(ty)
            .is_some_and(|cell| cell.value().get().is_some())
    }

    // ── Resolution ──────────────────────────────────────────────

    /// Resolve without the cycle pre-check; callers have already run it on
    /// an enclosing type.
    fn resolve(&self, ty: &TypeNode) -> LayoutResult {
        let target = &self.target;
        let fact = match ty {
            TypeNode::Primitive(kind) => primitive_fact(*kind, target),
            TypeNode::GenericParam(_) | TypeNode::DependentMember { .. } => {
                LayoutFact::dependent()
            }
            TypeNode::Metatype(_) => LayoutFact::trivial_words(1, true, target),
            TypeNode::ExistentialMetatype(inner) => {
                let tables = match inner.as_ref() {
                    TypeNode::Existential(existential) => existential.protocols.len() as u64,
                    _ => 0,
                };
                LayoutFact::trivial_words(1 + tables, true, target)
            }
            TypeNode::Existential(existential) => existential_fact(existential, target),
            TypeNode::Function(func) => function_fact(func, target),
            TypeNode::Tuple(_) | TypeNode::Optional(_) | TypeNode::Nominal(_) => {
                return self.resolve_cached(ty);
            }
        };
        Ok(LayoutOutcome::Fact(fact))
    }

    fn resolve_cached(&self, ty: &TypeNode) -> LayoutResult {
        let cell = match self.types.get(ty) {
            Some(cell) => Arc::clone(cell.value()),
            None => Arc::clone(self.types.entry(ty.clone()).or_default().value()),
        };
        cell.get_or_init(|| {
            let result = ensure_sufficient_stack(|| self.compute(ty));
            match &result {
                Ok(LayoutOutcome::Fact(fact)) => {
                    tracing::debug!(
                        %ty,
                        size = fact.size,
                        direct = fact.is_direct_passable,
                        "computed layout"
                    );
                }
                Ok(LayoutOutcome::Unavailable(missing)) => {
                    tracing::debug!(%ty, missing = %missing.path, "layout unavailable");
                }
                Err(error) => tracing::debug!(%ty, %error, "layout failed"),
            }
            result
        })
        .clone()
    }

    fn compute(&self, ty: &TypeNode) -> LayoutResult {
        match ty {
            TypeNode::Tuple(elements) => {
                self.aggregate(elements.iter().map(|element| element.ty.clone()))
            }
            TypeNode::Optional(wrapped) => {
                let payload = match self.resolve(wrapped)? {
                    LayoutOutcome::Fact(fact) => fact,
                    unavailable @ LayoutOutcome::Unavailable(_) => return Ok(unavailable),
                };
                Ok(LayoutOutcome::Fact(enum_fact(&[payload], 1, &self.target)))
            }
            TypeNode::Nominal(nominal) => self.nominal(nominal),
            _ => self.resolve(ty),
        }
    }

    fn nominal(&self, nominal: &NominalType) -> LayoutResult {
        let target = &self.target;
        match nominal.kind {
            NominalKind::Class => return Ok(LayoutOutcome::Fact(LayoutFact::reference(target))),
            NominalKind::Protocol => {
                let existential = ExistentialType {
                    protocols: vec![nominal.path.clone()],
                    class_bound: false,
                    superclass: None,
                };
                return Ok(LayoutOutcome::Fact(existential_fact(&existential, target)));
            }
            NominalKind::Struct | NominalKind::Enum | NominalKind::TypeAlias => {}
        }

        let Some(layout) = self.nominal_layout(&nominal.path) else {
            return Ok(LayoutOutcome::Unavailable(LayoutUnavailable {
                path: nominal.path.clone(),
            }));
        };
        check_arity(&layout, nominal)?;

        match &layout.shape {
            NominalShape::Opaque(fact) => Ok(LayoutOutcome::Fact(fact.finish(target))),
            NominalShape::Class => Ok(LayoutOutcome::Fact(LayoutFact::reference(target))),
            NominalShape::Struct { fields } => self.aggregate(
                fields
                    .iter()
                    .map(|field| instantiate(&layout, &nominal.args, &field.ty)),
            ),
            NominalShape::Enum { cases } => {
                let mut payloads = Vec::new();
                let mut empty_cases = 0usize;
                for case in cases {
                    match &case.payload {
                        None => empty_cases += 1,
                        Some(_) if case.indirect => payloads.push(LayoutFact::reference(target)),
                        Some(payload) => {
                            let payload = instantiate(&layout, &nominal.args, payload);
                            match self.resolve(&payload)? {
                                LayoutOutcome::Fact(fact) => payloads.push(fact),
                                unavailable @ LayoutOutcome::Unavailable(_) => {
                                    return Ok(unavailable)
                                }
                            }
                        }
                    }
                }
                Ok(LayoutOutcome::Fact(enum_fact(&payloads, empty_cases, target)))
            }
        }
    }

    /// Lay out `children` one after another under natural alignment.
    fn aggregate(&self, children: impl Iterator<Item = TypeNode>) -> LayoutResult {
        let mut aggregate = Aggregate::new();
        for child in children {
            match self.resolve(&child)? {
                LayoutOutcome::Fact(fact) => aggregate.push(&fact),
                unavailable @ LayoutOutcome::Unavailable(_) => return Ok(unavailable),
            }
        }
        Ok(LayoutOutcome::Fact(aggregate.finish(&self.target)))
    }
}

impl fmt::Debug for LayoutResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutResolver")
            .field("target", &self.target)
            .field("max_depth", &self.max_depth)
            .field("types", &self.types.len())
            .field("nominals", &self.nominals.len())
            .finish_non_exhaustive()
    }
}

// ── Instantiation ───────────────────────────────────────────────

fn check_arity(layout: &NominalLayout, nominal: &NominalType) -> Result<(), ClassificationError> {
    let expected = layout.generic_param_count();
    if nominal.args.len() == expected {
        return Ok(());
    }
    Err(ClassificationError::GenericArity {
        path: nominal.path.clone(),
        expected,
        found: nominal.args.len(),
    })
}

/// Replace the nominal's own generic parameters in `ty` with `args`.
fn instantiate(layout: &NominalLayout, args: &[TypeNode], ty: &TypeNode) -> TypeNode {
    if !ty.has_generic_params() {
        return ty.clone();
    }
    ty.substitute(&|key| {
        layout
            .argument_index(key)
            .and_then(|index| args.get(index).cloned())
    })
}

// ── Leaf facts ──────────────────────────────────────────────────

fn primitive_fact(kind: PrimitiveKind, target: &TargetConfig) -> LayoutFact {
    match kind {
        PrimitiveKind::Int | PrimitiveKind::UInt => LayoutFact::scalar(target.word(), target),
        PrimitiveKind::Int8 | PrimitiveKind::UInt8 => LayoutFact::scalar(1, target),
        PrimitiveKind::Int16 | PrimitiveKind::UInt16 => LayoutFact::scalar(2, target),
        PrimitiveKind::Int32 | PrimitiveKind::UInt32 | PrimitiveKind::Float => {
            LayoutFact::scalar(4, target)
        }
        PrimitiveKind::Int64 | PrimitiveKind::UInt64 | PrimitiveKind::Double => {
            LayoutFact::scalar(8, target)
        }
        PrimitiveKind::Bool => LayoutFact {
            has_extra_inhabitants: true,
            ..LayoutFact::scalar(1, target)
        },
        PrimitiveKind::String | PrimitiveKind::Character => string_fact(target),
        PrimitiveKind::RawPointer
        | PrimitiveKind::MutableRawPointer
        | PrimitiveKind::OpaquePointer => LayoutFact::trivial_words(1, true, target),
        PrimitiveKind::Builtin(builtin) => builtin_fact(builtin, target),
    }
}

/// Two words on 64-bit targets; count, variant and discriminator words on 32-bit.
fn string_fact(target: &TargetConfig) -> LayoutFact {
    let size = if target.word_size >= 8 { 16 } else { 12 };
    LayoutFact {
        has_reference_counted_storage: true,
        has_extra_inhabitants: true,
        ..LayoutFact::fixed(size, target.word_size, false)
    }
    .finish(target)
}

fn builtin_fact(kind: BuiltinKind, target: &TargetConfig) -> LayoutFact {
    match kind {
        BuiltinKind::Int(bits) | BuiltinKind::Float(bits) => {
            LayoutFact::scalar(u64::from(bits).div_ceil(8), target)
        }
        BuiltinKind::Word => LayoutFact::scalar(target.word(), target),
        BuiltinKind::RawPointer => LayoutFact::trivial_words(1, true, target),
        BuiltinKind::NativeObject | BuiltinKind::UnknownObject | BuiltinKind::BridgeObject => {
            LayoutFact::reference(target)
        }
        BuiltinKind::UnsafeValueBuffer => {
            LayoutFact::fixed(target.words(3), target.word_size, false).finish(target)
        }
        BuiltinKind::Executor => LayoutFact::trivial_words(2, false, target),
    }
}

fn function_fact(func: &FunctionType, target: &TargetConfig) -> LayoutFact {
    match func.convention {
        convention if convention.is_context_free() => LayoutFact::trivial_words(1, true, target),
        FunctionConvention::Block | FunctionConvention::EscapingBlock => {
            LayoutFact::reference(target)
        }
        // Function pointer plus context.
        _ => LayoutFact::reference_words(2, target),
    }
}

fn existential_fact(existential: &ExistentialType, target: &TargetConfig) -> LayoutFact {
    let tables = existential.protocols.len() as u64;
    if existential.class_bound || existential.superclass.is_some() {
        return LayoutFact::reference_words(1 + tables, target);
    }
    // `any Error` is a single boxed reference.
    if let [only] = existential.protocols.as_slice() {
        if only.is_stdlib_type("Error") {
            return LayoutFact::reference(target);
        }
    }
    // Three-word inline buffer, type metadata, one witness table per protocol.
    LayoutFact::reference_words(3 + 1 + tables, target)
}
