//! Type, context, name and signature lowering.

use smallvec::SmallVec;
use tern_ir::{
    BuiltinKind, Context, ContextSegment, DeclName, ExistentialType, ExtensionContext,
    FunctionConvention, FunctionType, GenericParamKey, GenericSignature, LayoutConstraint,
    NominalKind, NominalPath, OperatorFixity, ParamConvention, Parameter, PrimitiveKind,
    Requirement, TupleElement, TypeNode, STDLIB_MODULE,
};
use tern_stack::DepthBudget;

use super::{LResult, Lowerer};
use crate::error::DemangleErrorKind;
use crate::node::{NodeId, NodeKind, Payload};

/// A lowered context plus the generic arguments bound along its chain,
/// outermost first.
pub(super) struct ContextInfo {
    pub(super) context: Context,
    pub(super) args: Vec<TypeNode>,
}

/// How the first depth of a signature's parameter counts is chosen.
#[derive(Copy, Clone)]
pub(super) enum SignatureBase {
    /// Counts start at a known depth (extension signatures start at 0).
    Fixed(u32),
    /// Counts cover the innermost depths referenced by the declaration, but
    /// never start below `minimum`.
    Inferred { minimum: u32 },
}

impl Lowerer<'_> {
    /// Strip a `Type` wrapper, if any.
    pub(super) fn unwrap_type(&self, node: NodeId) -> NodeId {
        if self.arena.kind(node) == NodeKind::Type {
            self.arena.child(node, 0).unwrap_or(node)
        } else {
            node
        }
    }

    pub(super) fn lower_type(&self, budget: &mut DepthBudget, node: NodeId) -> LResult<TypeNode> {
        self.tick()?;
        self.descend(budget, |budget| self.lower_type_inner(budget, node))
    }

    fn lower_type_inner(&self, budget: &mut DepthBudget, node: NodeId) -> LResult<TypeNode> {
        let node = self.unwrap_type(node);
        match self.arena.kind(node) {
            NodeKind::Class
            | NodeKind::Structure
            | NodeKind::Enum
            | NodeKind::Protocol
            | NodeKind::TypeAlias
            | NodeKind::BoundGenericClass
            | NodeKind::BoundGenericStructure
            | NodeKind::BoundGenericEnum
            | NodeKind::BoundGenericTypeAlias => self.nominal_type(budget, node),
            NodeKind::BoundGenericProtocol => {
                Err(self.error(DemangleErrorKind::Unsupported("parameterized protocol type")))
            }
            NodeKind::Tuple => self.tuple_type(budget, node),
            NodeKind::BuiltinTypeName => {
                let name = self.text(node, "builtin name")?;
                let builtin = builtin_kind(name.as_str())
                    .ok_or_else(|| self.error(DemangleErrorKind::Unsupported("builtin type")))?;
                Ok(TypeNode::Primitive(PrimitiveKind::Builtin(builtin)))
            }
            kind if kind.is_function_type() => {
                let func = self.function_type(budget, node, None)?;
                Ok(TypeNode::Function(Box::new(func)))
            }
            NodeKind::InOut | NodeKind::Shared | NodeKind::Owned | NodeKind::DynamicSelf => {
                let inner = self.child(node, 0, "wrapped type")?;
                self.lower_type(budget, inner)
            }
            NodeKind::Metatype => {
                let inner = self.last_child(node, "metatype instance")?;
                Ok(TypeNode::Metatype(Box::new(self.lower_type(budget, inner)?)))
            }
            NodeKind::ExistentialMetatype => {
                let inner = self.last_child(node, "metatype instance")?;
                Ok(TypeNode::ExistentialMetatype(Box::new(
                    self.lower_type(budget, inner)?,
                )))
            }
            NodeKind::ProtocolList => {
                let protocols = self.protocol_list(budget, node)?;
                Ok(TypeNode::Existential(ExistentialType {
                    protocols,
                    class_bound: false,
                    superclass: None,
                }))
            }
            NodeKind::ProtocolListWithAnyObject => {
                let list = self.child(node, 0, "protocol list")?;
                let protocols = self.protocol_list(budget, list)?;
                Ok(TypeNode::Existential(ExistentialType {
                    protocols,
                    class_bound: true,
                    superclass: None,
                }))
            }
            NodeKind::ProtocolListWithClass => {
                let list = self.child(node, 0, "protocol list")?;
                let superclass = self.child(node, 1, "superclass")?;
                let protocols = self.protocol_list(budget, list)?;
                let superclass = self.lower_type(budget, superclass)?;
                Ok(TypeNode::Existential(ExistentialType {
                    protocols,
                    class_bound: true,
                    superclass: Some(Box::new(superclass)),
                }))
            }
            NodeKind::DependentGenericParamType => match self.arena.get(node).payload {
                Payload::Param { depth, index } => Ok(TypeNode::generic_param(depth, index)),
                _ => Err(self.missing("generic parameter")),
            },
            NodeKind::DependentMemberType => {
                let base = self.child(node, 0, "associated type base")?;
                let assoc = self.child(node, 1, "associated type")?;
                let name = self.text(assoc, "associated type name")?;
                let protocol = match self.arena.child(assoc, 0) {
                    Some(protocol) => Some(self.protocol_path(budget, protocol)?),
                    None => None,
                };
                Ok(TypeNode::DependentMember {
                    base: Box::new(self.lower_type(budget, base)?),
                    protocol,
                    name,
                })
            }
            NodeKind::AssociatedTypeRef => {
                let base = self.child(node, 0, "associated type base")?;
                let name = self.child(node, 1, "associated type name")?;
                Ok(TypeNode::DependentMember {
                    base: Box::new(self.lower_type(budget, base)?),
                    protocol: None,
                    name: self.text(name, "associated type name")?,
                })
            }
            NodeKind::DependentGenericType => {
                Err(self.error(DemangleErrorKind::Unsupported("generic function value")))
            }
            _ => Err(self.missing("type")),
        }
    }

    fn nominal_type(&self, budget: &mut DepthBudget, node: NodeId) -> LResult<TypeNode> {
        let info = self.lower_context(budget, node)?;
        let (Some(path), Some(kind)) = (info.context.owner_path(), info.context.owner_kind())
        else {
            return Err(self.missing("nominal type"));
        };
        if kind == NominalKind::Protocol {
            return Ok(TypeNode::Existential(ExistentialType {
                protocols: vec![path],
                class_bound: false,
                superclass: None,
            }));
        }
        Ok(TypeNode::nominal(path, kind, info.args))
    }

    fn tuple_type(&self, budget: &mut DepthBudget, node: NodeId) -> LResult<TypeNode> {
        let mut elements = Vec::with_capacity(self.arena.children(node).len());
        for &element in self.arena.children(node) {
            let label = match self.arena.find_child(element, NodeKind::TupleElementName) {
                Some(name) => Some(self.text(name, "tuple label")?),
                None => None,
            };
            let variadic = self
                .arena
                .find_child(element, NodeKind::VariadicMarker)
                .is_some();
            let ty = self
                .arena
                .find_child(element, NodeKind::Type)
                .ok_or_else(|| self.missing("tuple element type"))?;
            elements.push(TupleElement {
                label,
                ty: self.lower_type(budget, ty)?,
                variadic,
            });
        }
        if let [only] = elements.as_slice() {
            if only.label.is_none() && !only.variadic {
                return Ok(only.ty.clone());
            }
        }
        Ok(TypeNode::Tuple(elements))
    }

    fn protocol_list(&self, budget: &mut DepthBudget, list: NodeId) -> LResult<Vec<NominalPath>> {
        let types = self.child(list, 0, "protocol type list")?;
        self.arena
            .children(types)
            .iter()
            .map(|&protocol| self.protocol_path(budget, protocol))
            .collect()
    }

    /// Path of a protocol named by a `Type(Protocol)` node.
    pub(super) fn protocol_path(&self, budget: &mut DepthBudget, node: NodeId) -> LResult<NominalPath> {
        let protocol = self.unwrap_type(node);
        if self.arena.kind(protocol) != NodeKind::Protocol {
            return Err(self.missing("protocol"));
        }
        let info = self.lower_context(budget, protocol)?;
        info.context
            .owner_path()
            .ok_or_else(|| self.missing("protocol"))
    }

    // ── Function types and parameters ───────────────────────────

    /// Lower a function type node, applying `labels` to its parameters.
    pub(super) fn function_type(
        &self,
        budget: &mut DepthBudget,
        node: NodeId,
        labels: Option<NodeId>,
    ) -> LResult<FunctionType> {
        let convention = match self.arena.kind(node) {
            NodeKind::FunctionType => FunctionConvention::Swift,
            NodeKind::NoEscapeFunctionType => FunctionConvention::NoEscape,
            NodeKind::ObjCBlock => FunctionConvention::Block,
            NodeKind::EscapingObjCBlock => FunctionConvention::EscapingBlock,
            NodeKind::CFunctionPointer => FunctionConvention::CPointer,
            NodeKind::ThinFunctionType => FunctionConvention::Thin,
            NodeKind::AutoClosureType => FunctionConvention::AutoClosure,
            NodeKind::EscapingAutoClosureType => FunctionConvention::EscapingAutoClosure,
            _ => return Err(self.missing("function type")),
        };
        let args = self
            .arena
            .find_child(node, NodeKind::ArgumentTuple)
            .and_then(|args| self.arena.child(args, 0))
            .ok_or_else(|| self.missing("parameter types"))?;
        let result = self
            .arena
            .find_child(node, NodeKind::ReturnType)
            .and_then(|ret| self.arena.child(ret, 0))
            .ok_or_else(|| self.missing("result type"))?;
        Ok(FunctionType {
            params: self.parameters(budget, args, labels)?,
            result: self.lower_type(budget, result)?,
            throws: self
                .arena
                .find_child(node, NodeKind::ThrowsAnnotation)
                .is_some(),
            is_async: self.arena.find_child(node, NodeKind::AsyncAnnotation).is_some(),
            convention,
        })
    }

    fn parameters(
        &self,
        budget: &mut DepthBudget,
        args: NodeId,
        labels: Option<NodeId>,
    ) -> LResult<Vec<Parameter>> {
        let inner = self.unwrap_type(args);
        let mut entries: SmallVec<[(NodeId, bool); 4]> = SmallVec::new();
        if self.arena.kind(inner) == NodeKind::Tuple {
            for &element in self.arena.children(inner) {
                let ty = self
                    .arena
                    .find_child(element, NodeKind::Type)
                    .ok_or_else(|| self.missing("parameter type"))?;
                let variadic = self
                    .arena
                    .find_child(element, NodeKind::VariadicMarker)
                    .is_some();
                entries.push((ty, variadic));
            }
        } else {
            entries.push((args, false));
        }

        let labels: &[NodeId] = labels.map_or(&[], |labels| self.arena.children(labels));
        if !labels.is_empty() && labels.len() != entries.len() {
            return Err(self.error(DemangleErrorKind::Unsupported(
                "argument label count does not match the parameters",
            )));
        }

        let mut params = Vec::with_capacity(entries.len());
        for (i, &(ty, variadic)) in entries.iter().enumerate() {
            let label = match labels.get(i) {
                Some(&label) if self.arena.kind(label) == NodeKind::Identifier => {
                    Some(self.text(label, "argument label")?)
                }
                _ => None,
            };
            let mut node = self.unwrap_type(ty);
            let convention = match self.arena.kind(node) {
                NodeKind::InOut => ParamConvention::InOut,
                NodeKind::Shared => ParamConvention::Shared,
                NodeKind::Owned => ParamConvention::Owned,
                _ => ParamConvention::Default,
            };
            if convention != ParamConvention::Default {
                node = self.child(node, 0, "parameter type")?;
            }
            let mut ty = self.lower_type(budget, node)?;
            if variadic {
                ty = TypeNode::nominal(
                    NominalPath::top_level(STDLIB_MODULE, "Array"),
                    NominalKind::Struct,
                    vec![ty],
                );
            }
            params.push(Parameter {
                label,
                ty,
                convention,
                variadic,
            });
        }
        Ok(params)
    }

    // ── Contexts and names ──────────────────────────────────────

    pub(super) fn lower_context(&self, budget: &mut DepthBudget, node: NodeId) -> LResult<ContextInfo> {
        self.tick()?;
        self.descend(budget, |budget| self.lower_context_inner(budget, node))
    }

    fn lower_context_inner(&self, budget: &mut DepthBudget, node: NodeId) -> LResult<ContextInfo> {
        let node = self.unwrap_type(node);
        let kind = self.arena.kind(node);
        match kind {
            NodeKind::Module => Ok(ContextInfo {
                context: Context::module(self.text(node, "module name")?),
                args: Vec::new(),
            }),
            NodeKind::Class
            | NodeKind::Structure
            | NodeKind::Enum
            | NodeKind::Protocol
            | NodeKind::TypeAlias => {
                let parent = self.child(node, 0, "context")?;
                let name = self.child(node, 1, "type name")?;
                let mut info = self.lower_context(budget, parent)?;
                let name = self.decl_name(budget, name)?;
                info.context.extension = None;
                info.context.path.push(ContextSegment {
                    name: name.text,
                    kind: nominal_kind(kind),
                });
                Ok(info)
            }
            NodeKind::BoundGenericClass
            | NodeKind::BoundGenericStructure
            | NodeKind::BoundGenericEnum
            | NodeKind::BoundGenericProtocol
            | NodeKind::BoundGenericTypeAlias => {
                let nominal = self.child(node, 0, "generic type")?;
                let list = self.child(node, 1, "generic arguments")?;
                let mut info = self.lower_context(budget, nominal)?;
                for &arg in self.arena.children(list) {
                    info.args.push(self.lower_type(budget, arg)?);
                }
                Ok(info)
            }
            NodeKind::Extension => {
                let module = self.child(node, 0, "extension module")?;
                let extended = self.child(node, 1, "extended type")?;
                let mut info = self.lower_context(budget, extended)?;
                let signature = match self.arena.child(node, 2) {
                    Some(sig) => Some(self.signature(budget, sig, SignatureBase::Fixed(0), &[])?),
                    None => None,
                };
                info.context.extension = Some(ExtensionContext {
                    module: self.text(module, "extension module")?,
                    signature,
                });
                Ok(info)
            }
            kind if kind.is_entity() => {
                let parent = self.child(node, 0, "context")?;
                self.lower_context(budget, parent)
            }
            _ => Err(self.missing("context")),
        }
    }

    pub(super) fn decl_name(&self, budget: &mut DepthBudget, node: NodeId) -> LResult<DeclName> {
        let operator = match self.arena.kind(node) {
            NodeKind::Identifier => None,
            NodeKind::PrefixOperator => Some(OperatorFixity::Prefix),
            NodeKind::InfixOperator => Some(OperatorFixity::Infix),
            NodeKind::PostfixOperator => Some(OperatorFixity::Postfix),
            NodeKind::PrivateDeclName => {
                let discriminator = self.child(node, 0, "private discriminator")?;
                let name = self.child(node, 1, "declaration name")?;
                let mut name = self.descend(budget, |budget| self.decl_name(budget, name))?;
                name.private_discriminator = Some(self.text(discriminator, "private discriminator")?);
                return Ok(name);
            }
            NodeKind::LocalDeclName | NodeKind::RelatedEntityDeclName => {
                let name = self.child(node, 1, "declaration name")?;
                return self.descend(budget, |budget| self.decl_name(budget, name));
            }
            _ => return Err(self.missing("declaration name")),
        };
        Ok(DeclName {
            text: self.text(node, "declaration name")?,
            operator,
            private_discriminator: None,
        })
    }

    // ── Generic signatures ──────────────────────────────────────

    /// Lower a `DependentGenericSignature`.
    ///
    /// Parameter types referenced in the mangling carry absolute depths, but
    /// the count list only covers the depths this signature introduces.
    /// `refs` are the declaration types used to place those counts when the
    /// base is inferred.
    pub(super) fn signature(
        &self,
        budget: &mut DepthBudget,
        node: NodeId,
        base: SignatureBase,
        refs: &[&TypeNode],
    ) -> LResult<GenericSignature> {
        let mut counts: SmallVec<[u64; 2]> = SmallVec::new();
        let mut requirements = Vec::new();
        for &child in self.arena.children(node) {
            match self.arena.kind(child) {
                NodeKind::DependentGenericParamCount => {
                    counts.push(self.arena.index(child).unwrap_or(0));
                }
                _ => requirements.push(self.requirement(budget, child)?),
            }
        }

        let total = counts.iter().try_fold(0u64, |acc, &count| acc.checked_add(count));
        let limit = u64::try_from(self.max_visits).unwrap_or(u64::MAX);
        if total.map_or(true, |total| total > limit) {
            return Err(self.error(DemangleErrorKind::TooLarge(self.max_visits)));
        }

        let levels = u32::try_from(counts.len())
            .map_err(|_| self.error(DemangleErrorKind::NumberOverflow))?;
        let base_depth = match base {
            SignatureBase::Fixed(depth) => depth,
            SignatureBase::Inferred { minimum } => {
                let mut deepest: Option<u32> = None;
                let mut note = |key: GenericParamKey| {
                    deepest = Some(deepest.map_or(key.depth, |d| d.max(key.depth)));
                };
                for ty in refs {
                    ty.visit_generic_params(&mut note);
                }
                for requirement in &requirements {
                    visit_requirement(requirement, &mut note);
                }
                match deepest {
                    Some(depth) => depth.saturating_sub(levels.saturating_sub(1)).max(minimum),
                    None => minimum,
                }
            }
        };

        let mut params = Vec::new();
        for (level, &count) in (0u32..).zip(counts.iter()) {
            let depth = base_depth.saturating_add(level);
            for index in 0..count {
                let index =
                    u32::try_from(index).map_err(|_| self.error(DemangleErrorKind::NumberOverflow))?;
                params.push(GenericParamKey::new(depth, index));
            }
        }
        Ok(GenericSignature {
            params,
            requirements,
        })
    }

    fn requirement(&self, budget: &mut DepthBudget, node: NodeId) -> LResult<Requirement> {
        let subject = self.child(node, 0, "requirement subject")?;
        let subject = self.lower_type(budget, subject)?;
        match self.arena.kind(node) {
            NodeKind::DependentGenericConformanceRequirement => {
                let constraint = self.child(node, 1, "requirement constraint")?;
                if self.arena.kind(self.unwrap_type(constraint)) == NodeKind::Protocol {
                    Ok(Requirement::Conformance {
                        subject,
                        protocol: self.protocol_path(budget, constraint)?,
                    })
                } else {
                    Ok(Requirement::BaseClass {
                        subject,
                        class: self.lower_type(budget, constraint)?,
                    })
                }
            }
            NodeKind::DependentGenericSameTypeRequirement => {
                let target = self.child(node, 1, "same-type target")?;
                Ok(Requirement::SameType {
                    subject,
                    target: self.lower_type(budget, target)?,
                })
            }
            NodeKind::DependentGenericLayoutRequirement => {
                let name = self.child(node, 1, "layout name")?;
                let size = match self.arena.child(node, 2).and_then(|n| self.arena.index(n)) {
                    Some(size) => u32::try_from(size)
                        .map_err(|_| self.error(DemangleErrorKind::NumberOverflow))?,
                    None => 0,
                };
                let constraint = match self.text(name, "layout name")?.as_str() {
                    "U" => LayoutConstraint::Unknown,
                    "R" => LayoutConstraint::RefCounted,
                    "N" => LayoutConstraint::NativeRefCounted,
                    "C" => LayoutConstraint::Class,
                    "D" => LayoutConstraint::NativeClass,
                    "T" => LayoutConstraint::Trivial,
                    "E" | "e" => LayoutConstraint::TrivialOfExactSize(size),
                    "M" | "m" => LayoutConstraint::TrivialOfAtMostSize(size),
                    _ => return Err(self.error(DemangleErrorKind::Unsupported("layout constraint"))),
                };
                Ok(Requirement::Layout {
                    subject,
                    constraint,
                })
            }
            _ => Err(self.missing("requirement")),
        }
    }
}

fn visit_requirement(requirement: &Requirement, f: &mut dyn FnMut(GenericParamKey)) {
    requirement.subject().visit_generic_params(f);
    match requirement {
        Requirement::BaseClass { class: other, .. } | Requirement::SameType { target: other, .. } => {
            other.visit_generic_params(f);
        }
        Requirement::Conformance { .. } | Requirement::Layout { .. } => {}
    }
}

fn nominal_kind(kind: NodeKind) -> NominalKind {
    match kind {
        NodeKind::Class => NominalKind::Class,
        NodeKind::Enum => NominalKind::Enum,
        NodeKind::Protocol => NominalKind::Protocol,
        NodeKind::TypeAlias => NominalKind::TypeAlias,
        _ => NominalKind::Struct,
    }
}

fn builtin_kind(name: &str) -> Option<BuiltinKind> {
    if let Some(bits) = name.strip_prefix("FPIEEE") {
        return bits.parse().ok().map(BuiltinKind::Float);
    }
    if let Some(bits) = name.strip_prefix("Int") {
        return bits.parse().ok().map(BuiltinKind::Int);
    }
    let kind = match name {
        "Word" => BuiltinKind::Word,
        "RawPointer" => BuiltinKind::RawPointer,
        "NativeObject" => BuiltinKind::NativeObject,
        "UnknownObject" => BuiltinKind::UnknownObject,
        "BridgeObject" => BuiltinKind::BridgeObject,
        "UnsafeValueBuffer" => BuiltinKind::UnsafeValueBuffer,
        "Executor" => BuiltinKind::Executor,
        _ => return None,
    };
    Some(kind)
}
