//! Lowering of the parse tree into a [`Declaration`].
//!
//! The parse tree mirrors the mangling grammar; a `Declaration` mirrors what
//! a binding generator needs. Lowering walks the tree once, top-down:
//!
//! 1. Strip function attributes (`To`, `Td`, ...) into [`DeclFlags`].
//! 2. Unwrap thunks, descriptors and witness tables into the entity they
//!    describe, recording the role.
//! 3. Lower the entity: context path, name, function type, accessor shape.
//!
//! Substitutions make the tree a DAG, so a small symbol can describe an
//! exponentially large type. Every lowered type or context node counts
//! against `DemangleConfig::max_type_nodes`, and nesting is bounded by a
//! [`DepthBudget`].

mod types;

use std::cell::Cell;

use tern_ir::{
    AccessorKind, ConstructorKind, Context, DeclFlags, DeclKind, Declaration, DescriptorRole,
    DestructorKind, NominalKind, NominalPath, Parameter, ProtocolConformance, TypeNode,
    STDLIB_MODULE,
};
use tern_stack::DepthBudget;

use self::types::SignatureBase;
use crate::error::{DemangleError, DemangleErrorKind};
use crate::node::{NodeArena, NodeId, NodeKind};
use crate::DemangleConfig;

pub(crate) type LResult<T> = Result<T, DemangleError>;

pub(crate) struct Lowerer<'a> {
    arena: &'a NodeArena,
    symbol: &'a str,
    max_visits: usize,
    visits: Cell<usize>,
}

impl<'a> Lowerer<'a> {
    pub(crate) fn new(arena: &'a NodeArena, symbol: &'a str, config: &DemangleConfig) -> Self {
        Lowerer {
            arena,
            symbol,
            max_visits: config.max_type_nodes,
            visits: Cell::new(0),
        }
    }

    // ── Helpers ─────────────────────────────────────────────────

    /// Lowering errors point past the end: the whole symbol was consumed.
    fn error(&self, kind: DemangleErrorKind) -> DemangleError {
        DemangleError::new(self.symbol.len(), self.symbol.as_bytes(), kind)
    }

    fn missing(&self, what: &'static str) -> DemangleError {
        self.error(DemangleErrorKind::MissingOperand(what))
    }

    fn child(&self, node: NodeId, index: usize, what: &'static str) -> LResult<NodeId> {
        self.arena.child(node, index).ok_or_else(|| self.missing(what))
    }

    fn last_child(&self, node: NodeId, what: &'static str) -> LResult<NodeId> {
        self.arena
            .children(node)
            .last()
            .copied()
            .ok_or_else(|| self.missing(what))
    }

    fn text(&self, node: NodeId, what: &'static str) -> LResult<tern_ir::Ident> {
        self.arena.text(node).cloned().ok_or_else(|| self.missing(what))
    }

    fn tick(&self) -> LResult<()> {
        let visits = self.visits.get() + 1;
        if visits > self.max_visits {
            return Err(self.error(DemangleErrorKind::TooLarge(self.max_visits)));
        }
        self.visits.set(visits);
        Ok(())
    }

    fn descend<R>(
        &self,
        budget: &mut DepthBudget,
        f: impl FnOnce(&mut DepthBudget) -> LResult<R>,
    ) -> LResult<R> {
        budget
            .descend(f)
            .unwrap_or_else(|exceeded| Err(self.error(DemangleErrorKind::NestingTooDeep(exceeded.limit))))
    }

    // ── Roots ───────────────────────────────────────────────────

    /// Lower a `Global` node produced by `Parser::parse_symbol`.
    pub(crate) fn lower_symbol(&self, budget: &mut DepthBudget, global: NodeId) -> LResult<Declaration> {
        let mut flags = DeclFlags::empty();
        let mut main: Option<NodeId> = None;
        let mut extra = 0usize;
        for &child in self.arena.children(global) {
            match self.arena.kind(child) {
                NodeKind::ObjCAttribute => flags |= DeclFlags::OBJC,
                NodeKind::NonObjCAttribute => flags |= DeclFlags::NON_OBJC,
                NodeKind::DynamicAttribute => flags |= DeclFlags::DYNAMIC,
                NodeKind::DirectMethodReferenceAttribute => flags |= DeclFlags::FINAL,
                NodeKind::MergedFunction => flags |= DeclFlags::MERGED,
                NodeKind::Suffix => {}
                _ if main.is_none() => main = Some(child),
                _ => extra += 1,
            }
        }
        if extra > 0 {
            return Err(self.error(DemangleErrorKind::TrailingNodes(extra + 1)));
        }
        let main = main.ok_or_else(|| self.missing("entity"))?;
        let mut decl = self.lower_root(budget, main)?;
        decl.flags |= flags;
        Ok(decl)
    }

    /// Lower a bare `Type` node produced by `Parser::parse_type`.
    pub(crate) fn lower_type_root(&self, budget: &mut DepthBudget, ty: NodeId) -> LResult<TypeNode> {
        self.lower_type(budget, ty)
    }

    fn lower_root(&self, budget: &mut DepthBudget, node: NodeId) -> LResult<Declaration> {
        let kind = self.arena.kind(node);
        if let Some(role) = type_descriptor_role(kind) {
            let ty = self.child(node, 0, "described type")?;
            return self.type_symbol(budget, ty, Some(role));
        }
        if let Some(role) = conformance_descriptor_role(kind) {
            let conformance = self.child(node, 0, "conformance")?;
            return self.conformance_symbol(budget, conformance, role);
        }
        match kind {
            NodeKind::LazyProtocolWitnessTableAccessor => {
                let conformance = self.child(node, 1, "conformance")?;
                self.conformance_symbol(budget, conformance, DescriptorRole::LazyWitnessTableAccessor)
            }
            NodeKind::LazyProtocolWitnessTableCacheVariable => {
                let conformance = self.child(node, 1, "conformance")?;
                self.conformance_symbol(budget, conformance, DescriptorRole::LazyWitnessTableCache)
            }
            NodeKind::AssociatedTypeMetadataAccessor => {
                let conformance = self.child(node, 0, "conformance")?;
                let name = self.child(node, 1, "associated type name")?;
                let mut decl = self.conformance_symbol(
                    budget,
                    conformance,
                    DescriptorRole::AssociatedTypeMetadataAccessor,
                )?;
                decl.name = Some(self.decl_name(budget, name)?);
                Ok(decl)
            }
            NodeKind::BaseConformanceDescriptor => {
                let protocol = self.child(node, 0, "protocol")?;
                let base = self.child(node, 1, "base protocol")?;
                let mut decl = self.type_symbol(
                    budget,
                    protocol,
                    Some(DescriptorRole::BaseConformanceDescriptor),
                )?;
                decl.conformance = Some(ProtocolConformance {
                    conforming: self.lower_type(budget, protocol)?,
                    protocol: self.protocol_path(budget, base)?,
                    module: decl.context.module.clone(),
                });
                Ok(decl)
            }
            NodeKind::ModuleDescriptor => {
                let module = self.child(node, 0, "module")?;
                let context = Context::module(self.text(module, "module")?);
                let mut decl = Declaration::new(DeclKind::NominalType, context);
                decl.descriptor = Some(DescriptorRole::ModuleDescriptor);
                Ok(decl)
            }
            NodeKind::PropertyDescriptor => {
                let entity = self.child(node, 0, "entity")?;
                self.described_entity(budget, entity, DescriptorRole::PropertyDescriptor)
            }
            NodeKind::FieldOffset => {
                let entity = self.child(node, 1, "entity")?;
                self.described_entity(budget, entity, DescriptorRole::FieldOffset)
            }
            NodeKind::MethodDescriptor => {
                let entity = self.child(node, 0, "entity")?;
                let mut decl = self.lower_entity(budget, entity)?;
                decl.descriptor = Some(DescriptorRole::MethodDescriptor);
                Ok(decl)
            }
            NodeKind::ProtocolWitness => {
                let conformance = self.child(node, 0, "conformance")?;
                let entity = self.child(node, 1, "entity")?;
                let mut decl = self.lower_entity(budget, entity)?;
                decl.kind = DeclKind::ProtocolWitness;
                decl.conformance = Some(self.conformance(budget, conformance)?);
                Ok(decl)
            }
            NodeKind::DispatchThunk | NodeKind::CurryThunk => {
                let entity = self.child(node, 0, "entity")?;
                let mut decl = self.lower_entity(budget, entity)?;
                decl.flags |= if kind == NodeKind::DispatchThunk {
                    DeclFlags::DISPATCH_THUNK
                } else {
                    DeclFlags::CURRIED
                };
                Ok(decl)
            }
            NodeKind::VTableThunk => {
                let derived = self.child(node, 0, "overriding entity")?;
                let mut decl = self.lower_entity(budget, derived)?;
                decl.flags |= DeclFlags::VTABLE_THUNK;
                Ok(decl)
            }
            NodeKind::TypeMangling => {
                let ty = self.child(node, 0, "type")?;
                self.type_symbol(budget, ty, None)
            }
            kind if kind.is_entity() => self.lower_entity(budget, node),
            _ => Err(self.error(DemangleErrorKind::Unsupported("symbol kind"))),
        }
    }

    /// A `NominalType` declaration describing `ty`.
    fn type_symbol(
        &self,
        budget: &mut DepthBudget,
        ty: NodeId,
        role: Option<DescriptorRole>,
    ) -> LResult<Declaration> {
        let subject = self.lower_type(budget, ty)?;
        let context = self.subject_context(budget, ty)?;
        let mut decl = Declaration::new(DeclKind::NominalType, context);
        decl.subject = Some(subject);
        decl.descriptor = role;
        Ok(decl)
    }

    /// Context of a type symbol: the nominal type itself, or the standard
    /// library for structural types.
    fn subject_context(&self, budget: &mut DepthBudget, ty: NodeId) -> LResult<Context> {
        let mut node = self.unwrap_type(ty);
        if self.arena.kind(node) == NodeKind::DependentGenericType {
            node = self.unwrap_type(self.child(node, 1, "type")?);
        }
        let kind = self.arena.kind(node);
        if kind.is_any_generic()
            || matches!(
                kind,
                NodeKind::BoundGenericClass
                    | NodeKind::BoundGenericStructure
                    | NodeKind::BoundGenericEnum
                    | NodeKind::BoundGenericProtocol
                    | NodeKind::BoundGenericTypeAlias
            )
        {
            return Ok(self.lower_context(budget, node)?.context);
        }
        Ok(Context::module(STDLIB_MODULE))
    }

    fn conformance_symbol(
        &self,
        budget: &mut DepthBudget,
        conformance: NodeId,
        role: DescriptorRole,
    ) -> LResult<Declaration> {
        let conforming = self.child(conformance, 0, "conforming type")?;
        let mut decl = self.type_symbol(budget, conforming, Some(role))?;
        let conformance = self.conformance(budget, conformance)?;
        decl.subject = Some(conformance.conforming.clone());
        decl.conformance = Some(conformance);
        Ok(decl)
    }

    fn conformance(&self, budget: &mut DepthBudget, node: NodeId) -> LResult<ProtocolConformance> {
        let mut conforming = self.unwrap_type(self.child(node, 0, "conforming type")?);
        if self.arena.kind(conforming) == NodeKind::DependentGenericType {
            conforming = self.child(conforming, 1, "conforming type")?;
        }
        let protocol = self.child(node, 1, "protocol")?;
        let module = self.child(node, 2, "conformance module")?;
        Ok(ProtocolConformance {
            conforming: self.lower_type(budget, conforming)?,
            protocol: self.protocol_path(budget, protocol)?,
            module: self.text(module, "conformance module")?,
        })
    }

    fn described_entity(
        &self,
        budget: &mut DepthBudget,
        entity: NodeId,
        role: DescriptorRole,
    ) -> LResult<Declaration> {
        let mut decl = self.lower_entity(budget, entity)?;
        if decl.kind == DeclKind::Getter || decl.kind == DeclKind::Setter {
            decl.kind = DeclKind::Variable;
        }
        decl.descriptor = Some(role);
        Ok(decl)
    }

    // ── Entities ────────────────────────────────────────────────

    fn lower_entity(&self, budget: &mut DepthBudget, node: NodeId) -> LResult<Declaration> {
        self.tick()?;
        self.descend(budget, |budget| self.lower_entity_inner(budget, node))
    }

    fn lower_entity_inner(&self, budget: &mut DepthBudget, node: NodeId) -> LResult<Declaration> {
        let kind = self.arena.kind(node);
        match kind {
            NodeKind::Static => {
                let inner = self.child(node, 0, "static entity")?;
                let mut decl = self.lower_entity(budget, inner)?;
                decl.flags |= DeclFlags::STATIC;
                Ok(decl)
            }
            NodeKind::Function => self.function(budget, node),
            NodeKind::Allocator | NodeKind::Constructor => self.constructor(budget, node),
            NodeKind::Deallocator
            | NodeKind::Destructor
            | NodeKind::IVarDestroyer
            | NodeKind::IVarInitializer => {
                let context = self.child(node, 0, "context")?;
                let context = self.lower_context(budget, context)?.context;
                let mut decl = Declaration::new(DeclKind::Destructor, context);
                decl.destructor = Some(match kind {
                    NodeKind::Deallocator => DestructorKind::Deallocating,
                    NodeKind::Destructor => DestructorKind::Destroying,
                    NodeKind::IVarDestroyer => DestructorKind::IVarDestroyer,
                    _ => DestructorKind::IVarInitializer,
                });
                Ok(decl)
            }
            NodeKind::Initializer => {
                let storage = self.child(node, 0, "initialized variable")?;
                let mut decl = self.lower_entity(budget, storage)?;
                decl.descriptor = Some(DescriptorRole::VariableInitializer);
                Ok(decl)
            }
            NodeKind::DefaultArgumentInitializer => {
                let owner = self.child(node, 0, "owning function")?;
                let mut decl = self.lower_entity(budget, owner)?;
                decl.descriptor = Some(DescriptorRole::DefaultArgumentInitializer);
                decl.params.clear();
                decl.result = TypeNode::unit();
                Ok(decl)
            }
            NodeKind::Variable => {
                let storage = self.storage(budget, node)?;
                let mut decl = Declaration::new(DeclKind::Variable, storage.context);
                decl.name = storage.name;
                decl.generic_signature = storage.signature;
                decl.result = storage.value;
                Ok(decl)
            }
            NodeKind::Subscript => {
                let storage = self.storage(budget, node)?;
                let mut decl = Declaration::new(DeclKind::Subscript, storage.context);
                decl.name = storage.name;
                decl.generic_signature = storage.signature;
                decl.params = storage.indices;
                decl.result = storage.value;
                Ok(decl)
            }
            kind if kind.is_accessor() => self.accessor(budget, node),
            _ => Err(self.error(DemangleErrorKind::Unsupported("entity kind"))),
        }
    }

    fn function(&self, budget: &mut DepthBudget, node: NodeId) -> LResult<Declaration> {
        let context = self.child(node, 0, "context")?;
        let name = self.child(node, 1, "function name")?;
        let labels = self.arena.find_child(node, NodeKind::LabelList);
        let ty = self.last_child(node, "function type")?;

        let context = self.lower_context(budget, context)?.context;
        let kind = if context.is_type_member() {
            DeclKind::Method
        } else {
            DeclKind::Function
        };
        let mut decl = Declaration::new(kind, context);
        decl.name = Some(self.decl_name(budget, name)?);
        self.apply_function_type(budget, &mut decl, ty, labels)?;
        Ok(decl)
    }

    fn constructor(&self, budget: &mut DepthBudget, node: NodeId) -> LResult<Declaration> {
        let context = self.child(node, 0, "context")?;
        let labels = self.arena.find_child(node, NodeKind::LabelList);
        let ty = self
            .arena
            .find_child(node, NodeKind::Type)
            .ok_or_else(|| self.missing("constructor type"))?;

        let context = self.lower_context(budget, context)?.context;
        let mut decl = Declaration::new(DeclKind::Constructor, context);
        decl.constructor = Some(if self.arena.kind(node) == NodeKind::Allocator {
            ConstructorKind::Allocating
        } else {
            ConstructorKind::Initializing
        });
        self.apply_function_type(budget, &mut decl, ty, labels)?;
        Ok(decl)
    }

    /// Fill parameters, result, effects and generic signature from a
    /// (possibly generic) function type.
    fn apply_function_type(
        &self,
        budget: &mut DepthBudget,
        decl: &mut Declaration,
        ty: NodeId,
        labels: Option<NodeId>,
    ) -> LResult<()> {
        let (signature, func) = self.split_generic(ty)?;
        let func = self.function_type(budget, func, labels)?;
        if func.throws {
            decl.flags |= DeclFlags::THROWING;
        }
        if func.is_async {
            decl.flags |= DeclFlags::ASYNC;
        }
        decl.params = func.params;
        decl.result = func.result;
        if let Some(signature) = signature {
            let refs: Vec<&TypeNode> = decl
                .params
                .iter()
                .map(|param| &param.ty)
                .chain(std::iter::once(&decl.result))
                .collect();
            let base = SignatureBase::Inferred {
                minimum: signature_minimum(&decl.context),
            };
            decl.generic_signature = self.signature(budget, signature, base, &refs)?;
        }
        Ok(())
    }

    /// Split `DependentGenericType(sig, Type(fn))` into its parts.
    fn split_generic(&self, ty: NodeId) -> LResult<(Option<NodeId>, NodeId)> {
        let node = self.unwrap_type(ty);
        if self.arena.kind(node) == NodeKind::DependentGenericType {
            let signature = self.child(node, 0, "generic signature")?;
            let inner = self.child(node, 1, "generic type")?;
            return Ok((Some(signature), self.unwrap_type(inner)));
        }
        Ok((None, node))
    }

    // ── Storage and accessors ───────────────────────────────────

    /// Lower a `Variable` or `Subscript` node.
    fn storage(&self, budget: &mut DepthBudget, node: NodeId) -> LResult<Storage> {
        let context = self.child(node, 0, "context")?;
        let context = self.lower_context(budget, context)?.context;
        let ty = self
            .arena
            .find_child(node, NodeKind::Type)
            .ok_or_else(|| self.missing("storage type"))?;

        if self.arena.kind(node) == NodeKind::Variable {
            let name = self.child(node, 1, "variable name")?;
            let name = self.decl_name(budget, name)?;
            let (signature, value_ty) = self.split_generic(ty)?;
            let value = self.lower_type(budget, value_ty)?;
            let signature = match signature {
                Some(signature) => {
                    let base = SignatureBase::Inferred {
                        minimum: signature_minimum(&context),
                    };
                    self.signature(budget, signature, base, &[&value])?
                }
                None => tern_ir::GenericSignature::empty(),
            };
            return Ok(Storage {
                context,
                name: Some(name),
                signature,
                indices: Vec::new(),
                value,
            });
        }

        let labels = self.arena.find_child(node, NodeKind::LabelList);
        let (signature, func) = self.split_generic(ty)?;
        let func = self.function_type(budget, func, labels)?;
        let generic_signature = match signature {
            Some(signature) => {
                let refs: Vec<&TypeNode> = func
                    .params
                    .iter()
                    .map(|param| &param.ty)
                    .chain(std::iter::once(&func.result))
                    .collect();
                let base = SignatureBase::Inferred {
                    minimum: signature_minimum(&context),
                };
                self.signature(budget, signature, base, &refs)?
            }
            None => tern_ir::GenericSignature::empty(),
        };
        let name = match self.arena.find_child(node, NodeKind::PrivateDeclName) {
            Some(private) => Some(self.decl_name(budget, private)?),
            None => None,
        };
        Ok(Storage {
            context,
            name,
            signature: generic_signature,
            indices: func.params,
            value: func.result,
        })
    }

    fn accessor(&self, budget: &mut DepthBudget, node: NodeId) -> LResult<Declaration> {
        let accessor = accessor_kind(self.arena.kind(node))
            .ok_or_else(|| self.missing("accessor"))?;
        let storage_node = self.child(node, 0, "accessed storage")?;
        let is_subscript = match self.arena.kind(storage_node) {
            NodeKind::Variable => false,
            NodeKind::Subscript => true,
            _ => return Err(self.missing("accessed storage")),
        };
        let storage = self.storage(budget, storage_node)?;

        let kind = if is_subscript {
            DeclKind::Subscript
        } else if accessor.is_mutating_access() {
            DeclKind::Setter
        } else {
            DeclKind::Getter
        };
        let mutating = accessor.is_mutating_access()
            && matches!(
                storage.context.owner_kind(),
                Some(NominalKind::Struct | NominalKind::Enum | NominalKind::Protocol)
            );

        let mut decl = Declaration::new(kind, storage.context);
        decl.name = storage.name;
        decl.generic_signature = storage.signature;
        decl.accessor = Some(accessor);
        if mutating {
            decl.flags |= DeclFlags::MUTATING;
        }

        let value = storage.value;
        match accessor {
            AccessorKind::Setter | AccessorKind::WillSet | AccessorKind::InitAccessor => {
                let mut params = Vec::with_capacity(storage.indices.len() + 1);
                params.push(Parameter::new(None, value));
                params.extend(storage.indices);
                decl.params = params;
            }
            AccessorKind::DidSet => {}
            AccessorKind::UnsafeAddressor
            | AccessorKind::OwningAddressor
            | AccessorKind::NativeOwningAddressor
            | AccessorKind::NativePinningAddressor => {
                decl.params = storage.indices;
                decl.result = pointer_to(value, "UnsafePointer");
            }
            AccessorKind::UnsafeMutableAddressor
            | AccessorKind::OwningMutableAddressor
            | AccessorKind::NativeOwningMutableAddressor
            | AccessorKind::NativePinningMutableAddressor => {
                decl.params = storage.indices;
                decl.result = pointer_to(value, "UnsafeMutablePointer");
            }
            AccessorKind::Getter
            | AccessorKind::GlobalGetter
            | AccessorKind::Read
            | AccessorKind::Modify
            | AccessorKind::MaterializeForSet => {
                decl.params = storage.indices;
                decl.result = value;
            }
        }
        Ok(decl)
    }
}

/// A lowered property or subscript.
struct Storage {
    context: Context,
    name: Option<tern_ir::DeclName>,
    signature: tern_ir::GenericSignature,
    indices: Vec<Parameter>,
    value: TypeNode,
}

/// Lowest depth a member's own generic parameters can start at.
///
/// Protocol members sit under `Self` at depth 0; members of a constrained
/// extension sit under the extension's parameters.
fn signature_minimum(context: &Context) -> u32 {
    let protocol = u32::from(context.is_protocol());
    let extension = context
        .extension
        .as_ref()
        .and_then(|ext| ext.signature.as_ref())
        .and_then(tern_ir::GenericSignature::max_depth)
        .map_or(0, |depth| depth.saturating_add(1));
    protocol.max(extension)
}

fn pointer_to(pointee: TypeNode, pointer: &str) -> TypeNode {
    TypeNode::nominal(
        NominalPath::top_level(STDLIB_MODULE, pointer),
        NominalKind::Struct,
        vec![pointee],
    )
}

fn accessor_kind(kind: NodeKind) -> Option<AccessorKind> {
    let accessor = match kind {
        NodeKind::Getter => AccessorKind::Getter,
        NodeKind::Setter => AccessorKind::Setter,
        NodeKind::ModifyAccessor => AccessorKind::Modify,
        NodeKind::ReadAccessor => AccessorKind::Read,
        NodeKind::WillSet => AccessorKind::WillSet,
        NodeKind::DidSet => AccessorKind::DidSet,
        NodeKind::GlobalGetter => AccessorKind::GlobalGetter,
        NodeKind::InitAccessor => AccessorKind::InitAccessor,
        NodeKind::MaterializeForSet => AccessorKind::MaterializeForSet,
        NodeKind::UnsafeAddressor => AccessorKind::UnsafeAddressor,
        NodeKind::UnsafeMutableAddressor => AccessorKind::UnsafeMutableAddressor,
        NodeKind::OwningAddressor => AccessorKind::OwningAddressor,
        NodeKind::OwningMutableAddressor => AccessorKind::OwningMutableAddressor,
        NodeKind::NativeOwningAddressor => AccessorKind::NativeOwningAddressor,
        NodeKind::NativeOwningMutableAddressor => AccessorKind::NativeOwningMutableAddressor,
        NodeKind::NativePinningAddressor => AccessorKind::NativePinningAddressor,
        NodeKind::NativePinningMutableAddressor => AccessorKind::NativePinningMutableAddressor,
        _ => return None,
    };
    Some(accessor)
}

/// Role of a metadata symbol whose only operand is a type.
fn type_descriptor_role(kind: NodeKind) -> Option<DescriptorRole> {
    let role = match kind {
        NodeKind::TypeMetadata => DescriptorRole::TypeMetadata,
        NodeKind::FullTypeMetadata => DescriptorRole::FullTypeMetadata,
        NodeKind::TypeMetadataAccessFunction => DescriptorRole::MetadataAccessor,
        NodeKind::TypeMetadataLazyCache => DescriptorRole::LazyMetadataCache,
        NodeKind::Metaclass => DescriptorRole::Metaclass,
        NodeKind::NominalTypeDescriptor => DescriptorRole::NominalTypeDescriptor,
        NodeKind::ProtocolDescriptor => DescriptorRole::ProtocolDescriptor,
        NodeKind::MethodLookupFunction => DescriptorRole::MethodLookupFunction,
        NodeKind::GenericTypeMetadataPattern => DescriptorRole::GenericMetadataPattern,
        NodeKind::TypeMetadataInstantiationCache => DescriptorRole::MetadataInstantiationCache,
        NodeKind::TypeMetadataInstantiationFunction => {
            DescriptorRole::MetadataInstantiationFunction
        }
        NodeKind::TypeMetadataCompletionFunction => DescriptorRole::MetadataCompletionFunction,
        NodeKind::TypeMetadataSingletonInitializationCache => {
            DescriptorRole::SingletonInitializationCache
        }
        NodeKind::ClassMetadataBaseOffset => DescriptorRole::ClassMetadataBaseOffset,
        NodeKind::ValueWitnessTable => DescriptorRole::ValueWitnessTable,
        NodeKind::ReflectionFieldDescriptor => DescriptorRole::FieldDescriptor,
        NodeKind::ReflectionBuiltinDescriptor => DescriptorRole::BuiltinDescriptor,
        NodeKind::ProtocolRequirementsBaseDescriptor => {
            DescriptorRole::ProtocolRequirementsBaseDescriptor
        }
        _ => return None,
    };
    Some(role)
}

/// Role of a symbol whose only operand is a protocol conformance.
fn conformance_descriptor_role(kind: NodeKind) -> Option<DescriptorRole> {
    let role = match kind {
        NodeKind::ProtocolConformanceDescriptor => DescriptorRole::ConformanceDescriptor,
        NodeKind::ProtocolWitnessTable => DescriptorRole::WitnessTable,
        NodeKind::ProtocolWitnessTablePattern => DescriptorRole::WitnessTablePattern,
        NodeKind::ProtocolWitnessTableAccessor => DescriptorRole::WitnessTableAccessor,
        NodeKind::GenericProtocolWitnessTable => DescriptorRole::GenericWitnessTableCache,
        NodeKind::GenericProtocolWitnessTableInstantiationFunction => {
            DescriptorRole::WitnessTableInstantiation
        }
        NodeKind::ResilientProtocolWitnessTable => DescriptorRole::ResilientWitnessTable,
        _ => return None,
    };
    Some(role)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
