//! Parse tree produced by the operator machine.
//!
//! Nodes live in a per-call arena and are addressed by [`NodeId`]. A node is
//! never modified after allocation: operators that "change" a node allocate a
//! new one. Substitutions share subtrees by id, so the tree is a DAG.

use smallvec::SmallVec;
use tern_ir::Ident;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum NodeKind {
    Global,
    Suffix,

    // Names
    Identifier,
    Module,
    LocalDeclName,
    PrivateDeclName,
    RelatedEntityDeclName,
    InfixOperator,
    PrefixOperator,
    PostfixOperator,
    Number,

    // Nominal contexts
    Class,
    Structure,
    Enum,
    Protocol,
    TypeAlias,
    Extension,

    // Types
    Type,
    TypeList,
    LabelList,
    EmptyList,
    FirstElementMarker,
    VariadicMarker,
    Tuple,
    TupleElement,
    TupleElementName,
    BuiltinTypeName,
    BoundGenericClass,
    BoundGenericStructure,
    BoundGenericEnum,
    BoundGenericProtocol,
    BoundGenericTypeAlias,
    FunctionType,
    NoEscapeFunctionType,
    ObjCBlock,
    EscapingObjCBlock,
    CFunctionPointer,
    ThinFunctionType,
    AutoClosureType,
    EscapingAutoClosureType,
    ArgumentTuple,
    ReturnType,
    ThrowsAnnotation,
    AsyncAnnotation,
    ConcurrentFunctionType,
    InOut,
    Shared,
    Owned,
    Metatype,
    ExistentialMetatype,
    MetatypeRepresentation,
    DynamicSelf,
    ProtocolList,
    ProtocolListWithAnyObject,
    ProtocolListWithClass,

    // Generics
    DependentGenericParamType,
    DependentMemberType,
    DependentAssociatedTypeRef,
    AssociatedTypeRef,
    DependentGenericType,
    DependentGenericSignature,
    DependentGenericParamCount,
    DependentGenericConformanceRequirement,
    DependentGenericSameTypeRequirement,
    DependentGenericLayoutRequirement,

    // Entities
    Function,
    Variable,
    Subscript,
    Allocator,
    Constructor,
    Deallocator,
    Destructor,
    IVarDestroyer,
    IVarInitializer,
    Initializer,
    DefaultArgumentInitializer,
    Static,

    // Accessors
    Getter,
    Setter,
    ModifyAccessor,
    ReadAccessor,
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

    // Conformances, metadata and witnesses
    ProtocolConformance,
    TypeMetadata,
    FullTypeMetadata,
    TypeMetadataAccessFunction,
    TypeMetadataLazyCache,
    Metaclass,
    NominalTypeDescriptor,
    ProtocolDescriptor,
    ProtocolConformanceDescriptor,
    PropertyDescriptor,
    MethodLookupFunction,
    GenericTypeMetadataPattern,
    TypeMetadataInstantiationCache,
    TypeMetadataInstantiationFunction,
    TypeMetadataCompletionFunction,
    TypeMetadataSingletonInitializationCache,
    ClassMetadataBaseOffset,
    ReflectionFieldDescriptor,
    ReflectionBuiltinDescriptor,
    ModuleDescriptor,
    ProtocolRequirementsBaseDescriptor,
    BaseConformanceDescriptor,
    ProtocolWitnessTable,
    ProtocolWitnessTablePattern,
    ProtocolWitnessTableAccessor,
    LazyProtocolWitnessTableAccessor,
    LazyProtocolWitnessTableCacheVariable,
    GenericProtocolWitnessTable,
    GenericProtocolWitnessTableInstantiationFunction,
    ResilientProtocolWitnessTable,
    AssociatedTypeMetadataAccessor,
    ValueWitnessTable,
    FieldOffset,
    Directness,
    TypeMangling,

    // Thunks and attributes
    ProtocolWitness,
    MethodDescriptor,
    DispatchThunk,
    CurryThunk,
    VTableThunk,
    ObjCAttribute,
    NonObjCAttribute,
    DynamicAttribute,
    DirectMethodReferenceAttribute,
    MergedFunction,
}

impl NodeKind {
    /// Names that can label a declaration.
    pub(crate) fn is_decl_name(self) -> bool {
        matches!(
            self,
            NodeKind::Identifier
                | NodeKind::LocalDeclName
                | NodeKind::PrivateDeclName
                | NodeKind::RelatedEntityDeclName
                | NodeKind::PrefixOperator
                | NodeKind::PostfixOperator
                | NodeKind::InfixOperator
        )
    }

    pub(crate) fn is_any_generic(self) -> bool {
        matches!(
            self,
            NodeKind::Class
                | NodeKind::Structure
                | NodeKind::Enum
                | NodeKind::Protocol
                | NodeKind::TypeAlias
        )
    }

    /// Nodes that may enclose other declarations.
    pub(crate) fn is_context(self) -> bool {
        self.is_any_generic()
            || self.is_entity()
            || matches!(
                self,
                NodeKind::Module
                    | NodeKind::Extension
                    | NodeKind::BoundGenericClass
                    | NodeKind::BoundGenericStructure
                    | NodeKind::BoundGenericEnum
                    | NodeKind::BoundGenericProtocol
                    | NodeKind::BoundGenericTypeAlias
            )
    }

    /// Declarations that can carry a `Z`, thunk or descriptor suffix.
    pub(crate) fn is_entity(self) -> bool {
        matches!(
            self,
            NodeKind::Function
                | NodeKind::Variable
                | NodeKind::Subscript
                | NodeKind::Allocator
                | NodeKind::Constructor
                | NodeKind::Deallocator
                | NodeKind::Destructor
                | NodeKind::IVarDestroyer
                | NodeKind::IVarInitializer
                | NodeKind::Initializer
                | NodeKind::DefaultArgumentInitializer
                | NodeKind::Static
        ) || self.is_accessor()
    }

    pub(crate) fn is_accessor(self) -> bool {
        matches!(
            self,
            NodeKind::Getter
                | NodeKind::Setter
                | NodeKind::ModifyAccessor
                | NodeKind::ReadAccessor
                | NodeKind::WillSet
                | NodeKind::DidSet
                | NodeKind::GlobalGetter
                | NodeKind::InitAccessor
                | NodeKind::MaterializeForSet
                | NodeKind::UnsafeAddressor
                | NodeKind::UnsafeMutableAddressor
                | NodeKind::OwningAddressor
                | NodeKind::OwningMutableAddressor
                | NodeKind::NativeOwningAddressor
                | NodeKind::NativeOwningMutableAddressor
                | NodeKind::NativePinningAddressor
                | NodeKind::NativePinningMutableAddressor
        )
    }

    pub(crate) fn is_requirement(self) -> bool {
        matches!(
            self,
            NodeKind::DependentGenericConformanceRequirement
                | NodeKind::DependentGenericSameTypeRequirement
                | NodeKind::DependentGenericLayoutRequirement
        )
    }

    /// Attributes that prefix the entity at the top level.
    pub(crate) fn is_function_attr(self) -> bool {
        matches!(
            self,
            NodeKind::ObjCAttribute
                | NodeKind::NonObjCAttribute
                | NodeKind::DynamicAttribute
                | NodeKind::DirectMethodReferenceAttribute
                | NodeKind::MergedFunction
        )
    }

    pub(crate) fn is_function_type(self) -> bool {
        matches!(
            self,
            NodeKind::FunctionType
                | NodeKind::NoEscapeFunctionType
                | NodeKind::ObjCBlock
                | NodeKind::EscapingObjCBlock
                | NodeKind::CFunctionPointer
                | NodeKind::ThinFunctionType
                | NodeKind::AutoClosureType
                | NodeKind::EscapingAutoClosureType
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Payload {
    None,
    Text(Ident),
    Index(u64),
    Param { depth: u32, index: u32 },
}

#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) payload: Payload,
    pub(crate) children: SmallVec<[NodeId; 4]>,
}

/// Per-call node storage.
#[derive(Default, Debug)]
pub(crate) struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn alloc(&mut self, node: Node) -> NodeId {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "node count is bounded by the parser's node budget"
        )]
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    #[inline]
    pub(crate) fn kind(&self, id: NodeId) -> NodeKind {
        self.get(id).kind
    }

    #[inline]
    pub(crate) fn children(&self, id: NodeId) -> &[NodeId] {
        &self.get(id).children
    }

    #[inline]
    pub(crate) fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.get(id).children.get(index).copied()
    }

    pub(crate) fn text(&self, id: NodeId) -> Option<&Ident> {
        match &self.get(id).payload {
            Payload::Text(text) => Some(text),
            _ => None,
        }
    }

    pub(crate) fn index(&self, id: NodeId) -> Option<u64> {
        match self.get(id).payload {
            Payload::Index(index) => Some(index),
            _ => None,
        }
    }

    /// First child of the given kind.
    pub(crate) fn find_child(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&child| self.kind(child) == kind)
    }
}
