//! Demangled declarations.

use crate::{
    DeclFlags, GenericSignature, Ident, NominalKind, NominalPath, Parameter, TypeNode,
};

/// What a symbol names.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeclKind {
    /// Free function.
    Function,
    /// Function declared inside a type or extension.
    Method,
    Constructor,
    Destructor,
    /// Reading accessor of a property (getter, read coroutine, addressor).
    Getter,
    /// Writing accessor of a property (setter, modify, observers).
    Setter,
    /// Any accessor of a subscript; [`Declaration::accessor`] says which.
    Subscript,
    /// Thunk that adapts a conforming type's member to a protocol requirement.
    ProtocolWitness,
    /// Metadata, descriptor or witness table of a type (or, for a module
    /// descriptor, of a module).
    NominalType,
    /// Storage of a global or member variable.
    Variable,
}

/// Which accessor of a property or subscript a symbol implements.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AccessorKind {
    Getter,
    Setter,
    Modify,
    Read,
    WillSet,
    DidSet,
    GlobalGetter,
    InitAccessor,
    MaterializeForSet,
    UnsafeAddressor,
    UnsafeMutableAddressor,
    OwningAddressor,
    OwningMutableAddressor,
    NativeOwningAddressor,
    NativeOwningMutableAddressor,
    NativePinningAddressor,
    NativePinningMutableAddressor,
}

impl AccessorKind {
    /// Returns `true` for accessors that write to the storage.
    pub fn is_mutating_access(self) -> bool {
        matches!(
            self,
            AccessorKind::Setter
                | AccessorKind::Modify
                | AccessorKind::WillSet
                | AccessorKind::DidSet
                | AccessorKind::InitAccessor
                | AccessorKind::MaterializeForSet
                | AccessorKind::UnsafeMutableAddressor
                | AccessorKind::OwningMutableAddressor
                | AccessorKind::NativeOwningMutableAddressor
                | AccessorKind::NativePinningMutableAddressor
        )
    }

    /// Returns `true` for accessors that take the new value as a parameter.
    pub fn takes_new_value(self) -> bool {
        matches!(
            self,
            AccessorKind::Setter | AccessorKind::WillSet | AccessorKind::InitAccessor
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConstructorKind {
    /// Allocates the instance, then initializes it.
    Allocating,
    /// Initializes an already allocated instance.
    Initializing,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DestructorKind {
    /// Destroys and frees the instance.
    Deallocating,
    /// Destroys the instance's contents.
    Destroying,
    /// Destroys stored properties only.
    IVarDestroyer,
    /// Initializes stored properties only.
    IVarInitializer,
}

/// Role of a metadata or descriptor symbol.
///
/// None of these are callable through the native calling convention except
/// the accessors, which the pipeline treats as runtime plumbing and skips.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DescriptorRole {
    TypeMetadata,
    FullTypeMetadata,
    MetadataAccessor,
    LazyMetadataCache,
    Metaclass,
    NominalTypeDescriptor,
    ProtocolDescriptor,
    ConformanceDescriptor,
    WitnessTable,
    WitnessTablePattern,
    WitnessTableAccessor,
    LazyWitnessTableAccessor,
    LazyWitnessTableCache,
    GenericWitnessTableCache,
    WitnessTableInstantiation,
    ResilientWitnessTable,
    AssociatedTypeMetadataAccessor,
    ValueWitnessTable,
    PropertyDescriptor,
    FieldOffset,
    MethodDescriptor,
    MethodLookupFunction,
    GenericMetadataPattern,
    MetadataInstantiationCache,
    MetadataInstantiationFunction,
    MetadataCompletionFunction,
    SingletonInitializationCache,
    ClassMetadataBaseOffset,
    VariableInitializer,
    DefaultArgumentInitializer,
    /// Reflection field descriptor (`MF`).
    FieldDescriptor,
    /// Reflection descriptor of a builtin type (`MB`).
    BuiltinDescriptor,
    /// Context descriptor of a module (`MXM`); the declaration has no subject.
    ModuleDescriptor,
    /// Base of a protocol's requirement descriptors (`TL`).
    ProtocolRequirementsBaseDescriptor,
    /// A protocol's requirement to conform to a base protocol (`Tb`). The
    /// declaration's conformance names the inheriting protocol as the
    /// conforming type.
    BaseConformanceDescriptor,
}

/// Fixity of an operator declaration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OperatorFixity {
    Prefix,
    Infix,
    Postfix,
}

/// Name of a declaration as written in the library.
///
/// The core never renames; hosts that cannot spell [`DeclName::is_non_ascii`]
/// names map them through their own identifier mapper.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeclName {
    pub text: Ident,
    pub operator: Option<OperatorFixity>,
    /// File-private discriminator, present for `private`/`fileprivate` decls.
    pub private_discriminator: Option<Ident>,
}

impl DeclName {
    pub fn plain(text: impl Into<Ident>) -> Self {
        DeclName {
            text: text.into(),
            operator: None,
            private_discriminator: None,
        }
    }

    pub fn is_non_ascii(&self) -> bool {
        self.text.is_non_ascii()
    }

    pub fn is_operator(&self) -> bool {
        self.operator.is_some()
    }
}

/// One nominal type in a context path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContextSegment {
    pub name: Ident,
    pub kind: NominalKind,
}

/// Extension that declares a member outside its type's body.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtensionContext {
    /// Module that declares the extension.
    pub module: Ident,
    /// Constraints of a constrained extension (`extension Array where Element: P`).
    pub signature: Option<GenericSignature>,
}

/// Where a declaration lives.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Context {
    pub module: Ident,
    /// Enclosing nominal types, outermost first. Empty for top-level decls.
    pub path: Vec<ContextSegment>,
    pub extension: Option<ExtensionContext>,
}

impl Context {
    pub fn module(module: impl Into<Ident>) -> Self {
        Context {
            module: module.into(),
            path: Vec::new(),
            extension: None,
        }
    }

    /// Context of members declared inside `path`.
    pub fn nominal(path: &NominalPath, kinds: &[NominalKind]) -> Self {
        Context {
            module: path.module.clone(),
            path: path
                .names
                .iter()
                .zip(kinds)
                .map(|(name, kind)| ContextSegment {
                    name: name.clone(),
                    kind: *kind,
                })
                .collect(),
            extension: None,
        }
    }

    /// Returns `true` if the declaration is a member of a type.
    pub fn is_type_member(&self) -> bool {
        !self.path.is_empty()
    }

    /// Path of the innermost enclosing type.
    pub fn owner_path(&self) -> Option<NominalPath> {
        if self.path.is_empty() {
            return None;
        }
        Some(NominalPath::new(
            self.module.clone(),
            self.path.iter().map(|segment| segment.name.clone()),
        ))
    }

    pub fn owner_kind(&self) -> Option<NominalKind> {
        self.path.last().map(|segment| segment.kind)
    }

    pub fn is_protocol(&self) -> bool {
        self.owner_kind() == Some(NominalKind::Protocol)
    }

    pub fn is_extension(&self) -> bool {
        self.extension.is_some()
    }
}

/// A protocol conformance named by a witness table or witness thunk.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProtocolConformance {
    pub conforming: TypeNode,
    pub protocol: NominalPath,
    /// Module that declares the conformance.
    pub module: Ident,
}

/// One demangled symbol.
///
/// Produced by the demangler and never mutated afterwards; every later stage
/// reads it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Declaration {
    pub kind: DeclKind,
    pub context: Context,
    /// `None` for constructors, destructors, subscripts and type symbols.
    pub name: Option<DeclName>,
    /// Generic signature spelled in the symbol. Parameters inherited from an
    /// enclosing generic context are not repeated here.
    pub generic_signature: GenericSignature,
    pub params: Vec<Parameter>,
    pub result: TypeNode,
    pub flags: DeclFlags,
    pub accessor: Option<AccessorKind>,
    pub constructor: Option<ConstructorKind>,
    pub destructor: Option<DestructorKind>,
    pub descriptor: Option<DescriptorRole>,
    pub conformance: Option<ProtocolConformance>,
    /// Type described by a `NominalType` symbol.
    pub subject: Option<TypeNode>,
}

impl Declaration {
    /// A declaration of `kind` in `context` with no parameters, returning `()`.
    pub fn new(kind: DeclKind, context: Context) -> Self {
        Declaration {
            kind,
            context,
            name: None,
            generic_signature: GenericSignature::empty(),
            params: Vec::new(),
            result: TypeNode::unit(),
            flags: DeclFlags::empty(),
            accessor: None,
            constructor: None,
            destructor: None,
            descriptor: None,
            conformance: None,
            subject: None,
        }
    }

    /// Returns `true` if the symbol is a function entry point the host can call.
    pub fn is_callable(&self) -> bool {
        self.descriptor.is_none()
            && !matches!(self.kind, DeclKind::NominalType | DeclKind::Variable)
    }

    /// Returns `true` if calls pass a receiver (`self`) as a parameter.
    ///
    /// Allocating constructors and static members receive the owner's
    /// metatype instead. Initializing constructors receive the allocated
    /// instance.
    pub fn has_receiver(&self) -> bool {
        self.context.is_type_member()
            && !self.flags.is_static()
            && self.kind != DeclKind::Function
            && !self.receives_metatype_as_constructor()
    }

    /// Returns `true` for a constructor entry point that allocates.
    fn receives_metatype_as_constructor(&self) -> bool {
        match self.constructor {
            Some(kind) => kind == ConstructorKind::Allocating,
            None => self.kind == DeclKind::Constructor,
        }
    }

    pub fn throws(&self) -> bool {
        self.flags.throws()
    }

    /// Name text, or an empty string for unnamed declarations.
    pub fn name_text(&self) -> &str {
        self.name.as_ref().map_or("", |name| name.text.as_str())
    }
}
