//! Structural type trees.

use std::fmt;

use smallvec::SmallVec;

use crate::{GenericParamKey, Ident, STDLIB_MODULE};

/// Fully qualified name of a nominal type: module plus nested type names.
///
/// `Swift.Dictionary.Index` is `{ module: "Swift", names: ["Dictionary", "Index"] }`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NominalPath {
    pub module: Ident,
    pub names: SmallVec<[Ident; 2]>,
}

impl NominalPath {
    pub fn new(module: impl Into<Ident>, names: impl IntoIterator<Item = Ident>) -> Self {
        NominalPath {
            module: module.into(),
            names: names.into_iter().collect(),
        }
    }

    /// Path of a top-level type.
    pub fn top_level(module: &str, name: &str) -> Self {
        NominalPath::new(Ident::new(module), [Ident::new(name)])
    }

    /// Innermost type name.
    pub fn name(&self) -> Option<&Ident> {
        self.names.last()
    }

    /// Path of the enclosing type, if this type is nested.
    pub fn parent(&self) -> Option<NominalPath> {
        if self.names.len() < 2 {
            return None;
        }
        let mut parent = self.clone();
        parent.names.pop();
        Some(parent)
    }

    /// Path of a type nested inside this one.
    pub fn child(&self, name: Ident) -> NominalPath {
        let mut child = self.clone();
        child.names.push(name);
        child
    }

    pub fn is_stdlib(&self) -> bool {
        self.module == STDLIB_MODULE
    }

    /// Returns `true` for the top-level standard-library type `name`.
    pub fn is_stdlib_type(&self, name: &str) -> bool {
        self.is_stdlib() && self.names.len() == 1 && self.names[0] == name
    }
}

impl fmt::Display for NominalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.module.as_str())?;
        for name in &self.names {
            write!(f, ".{name}")?;
        }
        Ok(())
    }
}

/// What kind of nominal declaration a path names.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NominalKind {
    Class,
    Struct,
    Enum,
    Protocol,
    TypeAlias,
}

/// Compiler builtin types that surface in standard-library signatures.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BuiltinKind {
    Int(u16),
    Float(u16),
    Word,
    RawPointer,
    NativeObject,
    UnknownObject,
    BridgeObject,
    UnsafeValueBuffer,
    Executor,
}

/// Scalar types with a fixed, platform-determined layout.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PrimitiveKind {
    Int,
    UInt,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float,
    Double,
    Bool,
    String,
    Character,
    RawPointer,
    MutableRawPointer,
    OpaquePointer,
    Builtin(BuiltinKind),
}

impl PrimitiveKind {
    /// Map a top-level standard-library struct name to its primitive kind.
    pub fn from_stdlib_name(name: &str) -> Option<PrimitiveKind> {
        let kind = match name {
            "Int" => PrimitiveKind::Int,
            "UInt" => PrimitiveKind::UInt,
            "Int8" => PrimitiveKind::Int8,
            "Int16" => PrimitiveKind::Int16,
            "Int32" => PrimitiveKind::Int32,
            "Int64" => PrimitiveKind::Int64,
            "UInt8" => PrimitiveKind::UInt8,
            "UInt16" => PrimitiveKind::UInt16,
            "UInt32" => PrimitiveKind::UInt32,
            "UInt64" => PrimitiveKind::UInt64,
            "Float" => PrimitiveKind::Float,
            "Double" => PrimitiveKind::Double,
            "Bool" => PrimitiveKind::Bool,
            "String" => PrimitiveKind::String,
            "Character" => PrimitiveKind::Character,
            "UnsafeRawPointer" => PrimitiveKind::RawPointer,
            "UnsafeMutableRawPointer" => PrimitiveKind::MutableRawPointer,
            "OpaquePointer" => PrimitiveKind::OpaquePointer,
            _ => return None,
        };
        Some(kind)
    }

    /// Standard-library name of the struct backing this primitive, if any.
    pub fn stdlib_name(self) -> Option<&'static str> {
        let name = match self {
            PrimitiveKind::Int => "Int",
            PrimitiveKind::UInt => "UInt",
            PrimitiveKind::Int8 => "Int8",
            PrimitiveKind::Int16 => "Int16",
            PrimitiveKind::Int32 => "Int32",
            PrimitiveKind::Int64 => "Int64",
            PrimitiveKind::UInt8 => "UInt8",
            PrimitiveKind::UInt16 => "UInt16",
            PrimitiveKind::UInt32 => "UInt32",
            PrimitiveKind::UInt64 => "UInt64",
            PrimitiveKind::Float => "Float",
            PrimitiveKind::Double => "Double",
            PrimitiveKind::Bool => "Bool",
            PrimitiveKind::String => "String",
            PrimitiveKind::Character => "Character",
            PrimitiveKind::RawPointer => "UnsafeRawPointer",
            PrimitiveKind::MutableRawPointer => "UnsafeMutableRawPointer",
            PrimitiveKind::OpaquePointer => "OpaquePointer",
            PrimitiveKind::Builtin(_) => return None,
        };
        Some(name)
    }
}

/// A reference to a nominal type, possibly with generic arguments.
///
/// Arguments of nested generic types are flattened outermost-first:
/// `Outer<A>.Inner<B>` carries `[A, B]`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NominalType {
    pub path: NominalPath,
    pub kind: NominalKind,
    pub args: Vec<TypeNode>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TupleElement {
    pub label: Option<Ident>,
    pub ty: TypeNode,
    pub variadic: bool,
}

impl TupleElement {
    pub fn unlabeled(ty: TypeNode) -> Self {
        TupleElement {
            label: None,
            ty,
            variadic: false,
        }
    }
}

/// How a parameter value is handed to the callee at the source level.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParamConvention {
    /// Borrowed for the duration of the call.
    #[default]
    Default,
    /// Passed by address; the callee may write through it.
    InOut,
    /// Explicitly borrowed (`__shared`).
    Shared,
    /// Explicitly consumed (`__owned`).
    Owned,
}

/// One formal parameter of a function or function type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Parameter {
    pub label: Option<Ident>,
    pub ty: TypeNode,
    pub convention: ParamConvention,
    pub variadic: bool,
}

impl Parameter {
    pub fn new(label: Option<Ident>, ty: TypeNode) -> Self {
        Parameter {
            label,
            ty,
            convention: ParamConvention::Default,
            variadic: false,
        }
    }

    #[inline]
    pub fn is_inout(&self) -> bool {
        self.convention == ParamConvention::InOut
    }
}

/// Calling convention of a function value.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FunctionConvention {
    /// Escaping closure: function pointer plus retained context.
    #[default]
    Swift,
    /// Non-escaping closure.
    NoEscape,
    /// Objective-C block.
    Block,
    /// Escaping Objective-C block.
    EscapingBlock,
    /// Bare C function pointer.
    CPointer,
    /// Function pointer without context.
    Thin,
    AutoClosure,
    EscapingAutoClosure,
}

impl FunctionConvention {
    /// Returns `true` when values of this convention carry no context object.
    pub fn is_context_free(self) -> bool {
        matches!(self, FunctionConvention::CPointer | FunctionConvention::Thin)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FunctionType {
    pub params: Vec<Parameter>,
    pub result: TypeNode,
    pub throws: bool,
    pub is_async: bool,
    pub convention: FunctionConvention,
}

/// An existential (`any P & Q`, `AnyObject`, `Base & P`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExistentialType {
    pub protocols: Vec<NominalPath>,
    /// Constrained to class instances (`AnyObject` or a superclass bound).
    pub class_bound: bool,
    pub superclass: Option<Box<TypeNode>>,
}

impl ExistentialType {
    /// `Any`: an opaque existential with no protocols.
    pub fn any() -> Self {
        ExistentialType {
            protocols: Vec::new(),
            class_bound: false,
            superclass: None,
        }
    }
}

/// Structural representation of a type appearing in a declaration.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeNode {
    Primitive(PrimitiveKind),
    Nominal(NominalType),
    Tuple(Vec<TupleElement>),
    Function(Box<FunctionType>),
    Metatype(Box<TypeNode>),
    ExistentialMetatype(Box<TypeNode>),
    Existential(ExistentialType),
    GenericParam(GenericParamKey),
    /// Associated type reached through a generic parameter (`T.Element`).
    DependentMember {
        base: Box<TypeNode>,
        protocol: Option<NominalPath>,
        name: Ident,
    },
    Optional(Box<TypeNode>),
}

impl TypeNode {
    /// The empty tuple `()`.
    pub fn unit() -> Self {
        TypeNode::Tuple(Vec::new())
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, TypeNode::Tuple(elements) if elements.is_empty())
    }

    /// Build a nominal type, normalizing standard-library spellings.
    ///
    /// `Swift.Int` becomes `Primitive(Int)` and `Swift.Optional<T>` becomes
    /// `Optional(T)`, so every spelling of the same type compares equal.
    pub fn nominal(path: NominalPath, kind: NominalKind, mut args: Vec<TypeNode>) -> Self {
        if path.is_stdlib() && path.names.len() == 1 {
            let name = path.names[0].as_str();
            if name == "Optional" && kind == NominalKind::Enum && args.len() == 1 {
                if let Some(wrapped) = args.pop() {
                    return TypeNode::Optional(Box::new(wrapped));
                }
            }
            if kind == NominalKind::Struct && args.is_empty() {
                if let Some(prim) = PrimitiveKind::from_stdlib_name(name) {
                    return TypeNode::Primitive(prim);
                }
            }
        }
        TypeNode::Nominal(NominalType { path, kind, args })
    }

    pub fn generic_param(depth: u32, index: u32) -> Self {
        TypeNode::GenericParam(GenericParamKey { depth, index })
    }

    /// The generic parameter at the root of a dependent member chain.
    ///
    /// Returns the parameter itself for `GenericParam`, the base parameter for
    /// `T.A.B`, and `None` for every other type.
    pub fn root_generic_param(&self) -> Option<GenericParamKey> {
        match self {
            TypeNode::GenericParam(key) => Some(*key),
            TypeNode::DependentMember { base, .. } => base.root_generic_param(),
            _ => None,
        }
    }

    /// Returns `true` if any generic parameter occurs in this type.
    pub fn has_generic_params(&self) -> bool {
        let mut found = false;
        self.visit_generic_params(&mut |_| found = true);
        found
    }

    /// Call `f` for every generic parameter occurrence, left to right.
    pub fn visit_generic_params(&self, f: &mut dyn FnMut(GenericParamKey)) {
        match self {
            TypeNode::Primitive(_) => {}
            TypeNode::GenericParam(key) => f(*key),
            TypeNode::Nominal(nominal) => {
                for arg in &nominal.args {
                    arg.visit_generic_params(f);
                }
            }
            TypeNode::Tuple(elements) => {
                for element in elements {
                    element.ty.visit_generic_params(f);
                }
            }
            TypeNode::Function(func) => {
                for param in &func.params {
                    param.ty.visit_generic_params(f);
                }
                func.result.visit_generic_params(f);
            }
            TypeNode::Metatype(inner)
            | TypeNode::ExistentialMetatype(inner)
            | TypeNode::Optional(inner) => inner.visit_generic_params(f),
            TypeNode::Existential(existential) => {
                if let Some(superclass) = &existential.superclass {
                    superclass.visit_generic_params(f);
                }
            }
            TypeNode::DependentMember { base, .. } => base.visit_generic_params(f),
        }
    }

    /// Number of type nodes in this tree, counting `self`.
    pub fn node_count(&self) -> usize {
        let children = match self {
            TypeNode::Primitive(_) | TypeNode::GenericParam(_) => 0,
            TypeNode::Nominal(nominal) => nominal.args.iter().map(TypeNode::node_count).sum(),
            TypeNode::Tuple(elements) => elements.iter().map(|element| element.ty.node_count()).sum(),
            TypeNode::Function(func) => {
                func.params.iter().map(|param| param.ty.node_count()).sum::<usize>()
                    + func.result.node_count()
            }
            TypeNode::Metatype(inner)
            | TypeNode::ExistentialMetatype(inner)
            | TypeNode::Optional(inner)
            | TypeNode::DependentMember { base: inner, .. } => inner.node_count(),
            TypeNode::Existential(existential) => existential
                .superclass
                .as_ref()
                .map_or(0, |superclass| superclass.node_count()),
        };
        children + 1
    }

    /// Replace generic parameters using `subst`, leaving unmatched ones alone.
    pub fn substitute(&self, subst: &dyn Fn(GenericParamKey) -> Option<TypeNode>) -> TypeNode {
        match self {
            TypeNode::Primitive(_) => self.clone(),
            TypeNode::GenericParam(key) => subst(*key).unwrap_or_else(|| self.clone()),
            TypeNode::Nominal(nominal) => TypeNode::nominal(
                nominal.path.clone(),
                nominal.kind,
                nominal.args.iter().map(|arg| arg.substitute(subst)).collect(),
            ),
            TypeNode::Tuple(elements) => TypeNode::Tuple(
                elements
                    .iter()
                    .map(|element| TupleElement {
                        label: element.label.clone(),
                        ty: element.ty.substitute(subst),
                        variadic: element.variadic,
                    })
                    .collect(),
            ),
            TypeNode::Function(func) => TypeNode::Function(Box::new(FunctionType {
                params: func
                    .params
                    .iter()
                    .map(|param| Parameter {
                        ty: param.ty.substitute(subst),
                        ..param.clone()
                    })
                    .collect(),
                result: func.result.substitute(subst),
                ..(**func).clone()
            })),
            TypeNode::Metatype(inner) => TypeNode::Metatype(Box::new(inner.substitute(subst))),
            TypeNode::ExistentialMetatype(inner) => {
                TypeNode::ExistentialMetatype(Box::new(inner.substitute(subst)))
            }
            TypeNode::Optional(inner) => TypeNode::Optional(Box::new(inner.substitute(subst))),
            TypeNode::Existential(existential) => TypeNode::Existential(ExistentialType {
                superclass: existential
                    .superclass
                    .as_ref()
                    .map(|superclass| Box::new(superclass.substitute(subst))),
                ..existential.clone()
            }),
            TypeNode::DependentMember {
                base,
                protocol,
                name,
            } => TypeNode::DependentMember {
                base: Box::new(base.substitute(subst)),
                protocol: protocol.clone(),
                name: name.clone(),
            },
        }
    }
}

impl fmt::Display for TypeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeNode::Primitive(PrimitiveKind::Builtin(builtin)) => write!(f, "Builtin.{builtin:?}"),
            TypeNode::Primitive(prim) => f.write_str(prim.stdlib_name().unwrap_or("?")),
            TypeNode::Nominal(nominal) => {
                write!(f, "{}", nominal.path)?;
                if !nominal.args.is_empty() {
                    f.write_str("<")?;
                    write_list(f, nominal.args.iter())?;
                    f.write_str(">")?;
                }
                Ok(())
            }
            TypeNode::Tuple(elements) => {
                f.write_str("(")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    if let Some(label) = &element.label {
                        write!(f, "{label}: ")?;
                    }
                    write!(f, "{}", element.ty)?;
                    if element.variadic {
                        f.write_str("...")?;
                    }
                }
                f.write_str(")")
            }
            TypeNode::Function(func) => {
                f.write_str("(")?;
                write_list(f, func.params.iter().map(|param| &param.ty))?;
                f.write_str(")")?;
                if func.is_async {
                    f.write_str(" async")?;
                }
                if func.throws {
                    f.write_str(" throws")?;
                }
                write!(f, " -> {}", func.result)
            }
            TypeNode::Metatype(inner) => write!(f, "{inner}.Type"),
            TypeNode::ExistentialMetatype(inner) => write!(f, "{inner}.Type"),
            TypeNode::Existential(existential) => {
                if existential.protocols.is_empty() && existential.superclass.is_none() {
                    return f.write_str(if existential.class_bound { "AnyObject" } else { "Any" });
                }
                f.write_str("any ")?;
                let mut first = true;
                if let Some(superclass) = &existential.superclass {
                    write!(f, "{superclass}")?;
                    first = false;
                }
                for protocol in &existential.protocols {
                    if !first {
                        f.write_str(" & ")?;
                    }
                    write!(f, "{protocol}")?;
                    first = false;
                }
                Ok(())
            }
            TypeNode::GenericParam(key) => write!(f, "{key}"),
            TypeNode::DependentMember { base, name, .. } => write!(f, "{base}.{name}"),
            TypeNode::Optional(inner) => write!(f, "{inner}?"),
        }
    }
}

fn write_list<'a>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = &'a TypeNode>,
) -> fmt::Result {
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}
