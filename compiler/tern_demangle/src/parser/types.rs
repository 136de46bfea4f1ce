//! Type productions: standard substitutions, builtins, tuples, function
//! types, bound generics and protocol compositions.

use smallvec::SmallVec;
use tern_ir::{Ident, IMPORTED_MODULE, STDLIB_MODULE};

use super::{PResult, Parser};
use crate::error::DemangleErrorKind;
use crate::node::{NodeId, NodeKind};
use crate::standard::standard_type;

/// Module name of declarations synthesized by the Clang importer.
const CLANG_IMPORTER_MODULE: &str = "__C_Synthesized";

/// Widest builtin integer or float accepted.
const MAX_BUILTIN_BITS: u64 = 4096;

/// One level of a bound generic type being rebuilt.
struct BoundFrame {
    node: NodeId,
    args: Option<usize>,
}

impl Parser<'_> {
    /// `S`: standard substitutions and the `Sg` optional sugar.
    pub(super) fn standard_substitution(&mut self) -> PResult<NodeId> {
        match self.next_char()? {
            b'o' => self.create_text(NodeKind::Module, Ident::new(IMPORTED_MODULE)),
            b'C' => self.create_text(NodeKind::Module, Ident::new(CLANG_IMPORTER_MODULE)),
            b'g' => {
                let wrapped = self.pop_type()?;
                let optional = self.swift_type(NodeKind::Enum, "Optional")?;
                let args = self.create_with(NodeKind::TypeList, &[wrapped])?;
                let bound = self.create_with(NodeKind::BoundGenericEnum, &[optional, args])?;
                let ty = self.create_type(bound)?;
                self.add_substitution(ty);
                Ok(ty)
            }
            _ => {
                self.cursor.push_back();
                let repeat = self.natural()?.unwrap_or(0);
                self.check_repeat(repeat)?;
                let concurrency = self.cursor.next_if(b'c');
                let c = self.next_char()?;
                let (kind, name) = standard_type(c, concurrency).ok_or_else(|| self.unexpected(c))?;
                let ty = self.swift_type(kind, name)?;
                for _ in 1..repeat {
                    self.push(ty);
                }
                Ok(ty)
            }
        }
    }

    /// `Type(kind(Module "Swift", Identifier name))`.
    fn swift_type(&mut self, kind: NodeKind, name: &str) -> PResult<NodeId> {
        let module = self.create_text(NodeKind::Module, Ident::new(STDLIB_MODULE))?;
        let ident = self.create_text(NodeKind::Identifier, Ident::new(name))?;
        let nominal = self.create_with(kind, &[module, ident])?;
        self.create_type(nominal)
    }

    /// `B`: compiler builtin types.
    pub(super) fn builtin_type(&mut self) -> PResult<NodeId> {
        let name: String = match self.next_char()? {
            b'b' => "BridgeObject".into(),
            b'B' => "UnsafeValueBuffer".into(),
            b'e' => "Executor".into(),
            b'f' => format!("FPIEEE{}", self.builtin_bits()?),
            b'i' => format!("Int{}", self.builtin_bits()?),
            b'O' => "UnknownObject".into(),
            b'o' => "NativeObject".into(),
            b'p' => "RawPointer".into(),
            b'w' => "Word".into(),
            b'I' | b'v' | b't' => return Err(self.error(DemangleErrorKind::Unsupported("builtin type"))),
            other => return Err(self.unexpected(other)),
        };
        let builtin = self.create_text(NodeKind::BuiltinTypeName, Ident::from(name))?;
        let ty = self.create_type(builtin)?;
        self.add_substitution(ty);
        Ok(ty)
    }

    fn builtin_bits(&mut self) -> PResult<u64> {
        let bits = self.index()?.saturating_sub(1);
        if bits == 0 || bits > MAX_BUILTIN_BITS {
            return Err(self.error(DemangleErrorKind::Unsupported("builtin bit width")));
        }
        Ok(bits)
    }

    /// `C`, `V`, `O`, `P`, `a`: a nominal type named by `name` in `context`.
    pub(super) fn any_generic_type(&mut self, kind: NodeKind) -> PResult<NodeId> {
        let name = self.pop_decl_name()?;
        let context = self.pop_context()?;
        let nominal = self.create_with(kind, &[context, name])?;
        let ty = self.create_type(nominal)?;
        self.add_substitution(ty);
        Ok(ty)
    }

    /// `t`: tuple, elements pushed in order with a marker after the first.
    pub(super) fn pop_tuple(&mut self) -> PResult<NodeId> {
        let mut elements: SmallVec<[NodeId; 4]> = SmallVec::new();
        if self.pop_kind(NodeKind::EmptyList).is_none() {
            loop {
                let first = self.pop_kind(NodeKind::FirstElementMarker).is_some();
                let mut children: SmallVec<[NodeId; 3]> = SmallVec::new();
                if let Some(variadic) = self.pop_kind(NodeKind::VariadicMarker) {
                    children.push(variadic);
                }
                if let Some(label) = self.pop_kind(NodeKind::Identifier) {
                    let text = self.arena.text(label).cloned().unwrap_or_else(|| Ident::new(""));
                    children.push(self.create_text(NodeKind::TupleElementName, text)?);
                }
                children.push(self.pop_type()?);
                elements.push(self.create_with(NodeKind::TupleElement, &children)?);
                if first {
                    break;
                }
            }
            elements.reverse();
        }
        let tuple = self.create_with(NodeKind::Tuple, &elements)?;
        self.create_type(tuple)
    }

    /// Pop result and parameter types plus effect annotations into a function type.
    pub(super) fn pop_function_type(&mut self, kind: NodeKind) -> PResult<NodeId> {
        let mut children: SmallVec<[NodeId; 5]> = SmallVec::new();
        if let Some(throws) = self.pop_kind(NodeKind::ThrowsAnnotation) {
            children.push(throws);
        }
        if let Some(concurrent) = self.pop_kind(NodeKind::ConcurrentFunctionType) {
            children.push(concurrent);
        }
        if let Some(is_async) = self.pop_kind(NodeKind::AsyncAnnotation) {
            children.push(is_async);
        }
        children.push(self.pop_function_params(NodeKind::ArgumentTuple)?);
        children.push(self.pop_function_params(NodeKind::ReturnType)?);
        let func = self.create_with(kind, &children)?;
        self.create_type(func)
    }

    fn pop_function_params(&mut self, kind: NodeKind) -> PResult<NodeId> {
        let params = if self.pop_kind(NodeKind::EmptyList).is_some() {
            let empty = self.create(NodeKind::Tuple)?;
            self.create_type(empty)?
        } else {
            let ty = self.pop_kind(NodeKind::Type);
            self.require(ty, "function parameter type")?
        };
        self.create_with(kind, &[params])
    }

    /// Pop the argument labels that follow a function's type.
    ///
    /// Returns `None` when the symbol carries no label list, which the caller
    /// treats as "every parameter unlabeled".
    pub(super) fn pop_function_param_labels(&mut self, ty: NodeId) -> PResult<Option<NodeId>> {
        if self.pop_kind(NodeKind::EmptyList).is_some() {
            return self.create(NodeKind::LabelList).map(Some);
        }
        if self.arena.kind(ty) != NodeKind::Type {
            return Ok(None);
        }
        let Some(mut func) = self.arena.child(ty, 0) else {
            return Ok(None);
        };
        if self.arena.kind(func) == NodeKind::DependentGenericType {
            match self.arena.child(func, 1).and_then(|inner| self.arena.child(inner, 0)) {
                Some(inner) => func = inner,
                None => return Ok(None),
            }
        }
        if !matches!(
            self.arena.kind(func),
            NodeKind::FunctionType | NodeKind::NoEscapeFunctionType
        ) {
            return Ok(None);
        }

        let params = self
            .arena
            .find_child(func, NodeKind::ArgumentTuple)
            .and_then(|args| self.arena.child(args, 0))
            .and_then(|params_ty| self.arena.child(params_ty, 0));
        let Some(params) = params else {
            return Ok(None);
        };
        let count = if self.arena.kind(params) == NodeKind::Tuple {
            self.arena.children(params).len()
        } else {
            1
        };
        if count == 0 {
            return Ok(None);
        }

        let mut labels: SmallVec<[NodeId; 4]> = SmallVec::with_capacity(count);
        let mut has_labels = false;
        for _ in 0..count {
            let label = self.pop();
            let label = self.require(label, "argument label")?;
            match self.arena.kind(label) {
                NodeKind::Identifier => has_labels = true,
                NodeKind::FirstElementMarker => {}
                _ => return Err(self.error(DemangleErrorKind::MissingOperand("argument label"))),
            }
            labels.push(label);
        }
        if !has_labels {
            return self.create(NodeKind::LabelList).map(Some);
        }
        labels.reverse();
        self.create_with(NodeKind::LabelList, &labels).map(Some)
    }

    /// `X`: function conventions, metatypes and class-bound compositions.
    pub(super) fn special_type(&mut self) -> PResult<NodeId> {
        match self.next_char()? {
            b'E' => self.pop_function_type(NodeKind::NoEscapeFunctionType),
            b'A' => self.pop_function_type(NodeKind::EscapingAutoClosureType),
            b'f' => self.pop_function_type(NodeKind::ThinFunctionType),
            b'K' => self.pop_function_type(NodeKind::AutoClosureType),
            b'L' => self.pop_function_type(NodeKind::EscapingObjCBlock),
            b'B' => self.pop_function_type(NodeKind::ObjCBlock),
            b'C' => self.pop_function_type(NodeKind::CFunctionPointer),
            b'D' => {
                let ty = self.pop_type()?;
                let dynamic_self = self.create_with(NodeKind::DynamicSelf, &[ty])?;
                self.create_type(dynamic_self)
            }
            b'M' => {
                let repr = self.metatype_representation()?;
                let ty = self.pop_type()?;
                let meta = self.create_with(NodeKind::Metatype, &[repr, ty])?;
                self.create_type(meta)
            }
            b'm' => {
                let repr = self.metatype_representation()?;
                let ty = self.pop_type()?;
                let meta = self.create_with(NodeKind::ExistentialMetatype, &[repr, ty])?;
                self.create_type(meta)
            }
            b'p' => {
                let ty = self.pop_type()?;
                let meta = self.create_with(NodeKind::ExistentialMetatype, &[ty])?;
                self.create_type(meta)
            }
            b'c' => {
                let superclass = self.pop_type()?;
                let protocols = self.protocol_list()?;
                let composition =
                    self.create_with(NodeKind::ProtocolListWithClass, &[protocols, superclass])?;
                self.create_type(composition)
            }
            b'l' => {
                let protocols = self.protocol_list()?;
                let composition =
                    self.create_with(NodeKind::ProtocolListWithAnyObject, &[protocols])?;
                self.create_type(composition)
            }
            b'o' | b'u' | b'w' => Err(self.error(DemangleErrorKind::Unsupported("reference storage"))),
            other => Err(self.unexpected(other)),
        }
    }

    fn metatype_representation(&mut self) -> PResult<NodeId> {
        let repr = match self.next_char()? {
            b't' => "@thin",
            b'T' => "@thick",
            b'o' => "@objc_metatype",
            other => return Err(self.unexpected(other)),
        };
        self.create_text(NodeKind::MetatypeRepresentation, Ident::new(repr))
    }

    /// `p`: an existential of zero or more protocols.
    pub(super) fn protocol_list_type(&mut self) -> PResult<NodeId> {
        let list = self.protocol_list()?;
        self.create_type(list)
    }

    fn protocol_list(&mut self) -> PResult<NodeId> {
        let mut protocols: SmallVec<[NodeId; 4]> = SmallVec::new();
        if self.pop_kind(NodeKind::EmptyList).is_none() {
            loop {
                let first = self.pop_kind(NodeKind::FirstElementMarker).is_some();
                protocols.push(self.pop_protocol()?);
                if first {
                    break;
                }
            }
            protocols.reverse();
        }
        let list = self.create_with(NodeKind::TypeList, &protocols)?;
        self.create_with(NodeKind::ProtocolList, &[list])
    }

    /// `Y`: effect annotations on function types.
    pub(super) fn type_annotation(&mut self) -> PResult<NodeId> {
        match self.next_char()? {
            b'a' => self.create(NodeKind::AsyncAnnotation),
            b'b' => self.create(NodeKind::ConcurrentFunctionType),
            b'c' | b'i' | b'j' | b'k' | b'K' | b'T' | b't' | b'u' => {
                Err(self.error(DemangleErrorKind::Unsupported("type annotation")))
            }
            other => Err(self.unexpected(other)),
        }
    }

    /// `u`: a type under its own generic signature.
    pub(super) fn generic_type(&mut self) -> PResult<NodeId> {
        let signature = self.pop_kind(NodeKind::DependentGenericSignature);
        let signature = self.require(signature, "generic signature")?;
        let ty = self.pop_type()?;
        let generic = self.create_with(NodeKind::DependentGenericType, &[signature, ty])?;
        self.create_type(generic)
    }

    /// `D`: a bare type mangling, optionally followed by argument labels.
    pub(super) fn type_mangling(&mut self) -> PResult<NodeId> {
        let ty = self.pop_type()?;
        match self.pop_function_param_labels(ty)? {
            Some(labels) => self.create_with(NodeKind::TypeMangling, &[ty, labels]),
            None => self.create_with(NodeKind::TypeMangling, &[ty]),
        }
    }

    /// `G`: apply generic argument lists to a nominal type.
    ///
    /// Lists are separated by `_` and closed by `y`; the list nearest the
    /// operator binds the innermost type.
    pub(super) fn bound_generic_type(&mut self) -> PResult<NodeId> {
        let mut lists: Vec<SmallVec<[NodeId; 4]>> = Vec::with_capacity(2);
        loop {
            let mut list: SmallVec<[NodeId; 4]> = SmallVec::new();
            while let Some(ty) = self.pop_kind(NodeKind::Type) {
                list.push(ty);
            }
            list.reverse();
            lists.push(list);
            if self.pop_kind(NodeKind::EmptyList).is_some() {
                break;
            }
            if self.pop_kind(NodeKind::FirstElementMarker).is_none() {
                return Err(self.error(DemangleErrorKind::MissingOperand("generic argument list")));
            }
        }
        let nominal = self.pop_any_generic()?;
        let bound = self.bind_generic_args(nominal, &lists)?;
        let ty = self.create_type(bound)?;
        self.add_substitution(ty);
        Ok(ty)
    }

    /// Attach `lists[0]` to `nominal`, `lists[1]` to its parent, and so on.
    fn bind_generic_args(
        &mut self,
        nominal: NodeId,
        lists: &[SmallVec<[NodeId; 4]>],
    ) -> PResult<NodeId> {
        let mut frames: Vec<BoundFrame> = Vec::with_capacity(lists.len());
        let mut current = nominal;
        let mut next_list = 0;
        loop {
            let consumes = !matches!(
                self.arena.kind(current),
                NodeKind::Variable | NodeKind::Subscript
            );
            let args = consumes.then_some(next_list);
            if consumes {
                next_list += 1;
            }
            frames.push(BoundFrame {
                node: current,
                args,
            });
            if next_list >= lists.len() {
                break;
            }
            let Some(context) = self.arena.child(current, 0) else {
                return Err(self.error(DemangleErrorKind::MissingOperand("generic context")));
            };
            current = if self.arena.kind(context) == NodeKind::Extension {
                self.arena
                    .child(context, 1)
                    .ok_or_else(|| self.error(DemangleErrorKind::MissingOperand("extended type")))?
            } else {
                context
            };
        }

        let mut bound_parent: Option<NodeId> = None;
        for frame in frames.iter().rev() {
            let mut node = frame.node;
            if let Some(parent) = bound_parent {
                node = self.replace_context(node, parent)?;
            }
            let bound = match frame.args.map(|i| &lists[i]) {
                Some(args) if !args.is_empty() => self.bind_level(node, args)?,
                _ => node,
            };
            bound_parent = Some(bound);
        }
        bound_parent.ok_or_else(|| self.error(DemangleErrorKind::MissingOperand("generic type")))
    }

    /// Rebuild `node` with `parent` substituted for its context, keeping an
    /// enclosing extension in place.
    fn replace_context(&mut self, node: NodeId, parent: NodeId) -> PResult<NodeId> {
        let children: SmallVec<[NodeId; 4]> = SmallVec::from_slice(self.arena.children(node));
        let Some(&context) = children.first() else {
            return Err(self.error(DemangleErrorKind::MissingOperand("generic context")));
        };
        let new_context = if self.arena.kind(context) == NodeKind::Extension {
            let mut ext: SmallVec<[NodeId; 3]> = SmallVec::from_slice(self.arena.children(context));
            if ext.len() < 2 {
                return Err(self.error(DemangleErrorKind::MissingOperand("extended type")));
            }
            ext[1] = parent;
            self.create_with(NodeKind::Extension, &ext)?
        } else {
            parent
        };
        let mut rebuilt = children;
        rebuilt[0] = new_context;
        let kind = self.arena.kind(node);
        self.create_with(kind, &rebuilt)
    }

    fn bind_level(&mut self, node: NodeId, args: &[NodeId]) -> PResult<NodeId> {
        let kind = match self.arena.kind(node) {
            NodeKind::Class => NodeKind::BoundGenericClass,
            NodeKind::Structure => NodeKind::BoundGenericStructure,
            NodeKind::Enum => NodeKind::BoundGenericEnum,
            NodeKind::Protocol => NodeKind::BoundGenericProtocol,
            NodeKind::TypeAlias => NodeKind::BoundGenericTypeAlias,
            _ => {
                return Err(self.error(DemangleErrorKind::Unsupported(
                    "generic arguments on a non-nominal context",
                )))
            }
        };
        let ty = self.create_type(node)?;
        let list = self.create_with(NodeKind::TypeList, args)?;
        self.create_with(kind, &[ty, list])
    }
}
