//! Library types shared by the unit tests.

use std::sync::Arc;

use tern_ir::{
    Context, DeclKind, DeclName, Declaration, NominalKind, NominalPath, Parameter, PrimitiveKind,
    TypeNode,
};
use tern_layout::{
    ChainedLookup, FieldLayout, LayoutResolver, LibraryLayouts, NominalLayout, StdlibLayouts,
    TargetConfig,
};

pub(crate) const MODULE: &str = "Shapes";

pub(crate) fn path(name: &str) -> NominalPath {
    NominalPath::top_level(MODULE, name)
}

pub(crate) fn prim(kind: PrimitiveKind) -> TypeNode {
    TypeNode::Primitive(kind)
}

pub(crate) fn value(name: &str, args: Vec<TypeNode>) -> TypeNode {
    TypeNode::nominal(path(name), NominalKind::Struct, args)
}

pub(crate) fn class(name: &str) -> TypeNode {
    TypeNode::nominal(path(name), NominalKind::Class, Vec::new())
}

fn fields(types: &[(&str, TypeNode)]) -> NominalLayout {
    NominalLayout::structure(
        types
            .iter()
            .map(|(name, ty)| FieldLayout::new(name, ty.clone()))
            .collect(),
    )
}

/// `Point` (two `Int32`), `Pair` (two `Int`), `Triple` (three `Int`),
/// `Holder` (one `Node`), `Box<T>`, `Node` (class) and `Grid<T>` (class).
pub(crate) fn resolver() -> LayoutResolver {
    let int = prim(PrimitiveKind::Int);
    let int32 = prim(PrimitiveKind::Int32);
    let library = LibraryLayouts::new();
    library.register(path("Point"), fields(&[("x", int32.clone()), ("y", int32)]));
    library.register(path("Pair"), fields(&[("a", int.clone()), ("b", int.clone())]));
    library.register(
        path("Triple"),
        fields(&[("a", int.clone()), ("b", int.clone()), ("c", int)]),
    );
    library.register(path("Holder"), fields(&[("node", class("Node"))]));
    library.register(
        path("Box"),
        fields(&[("value", TypeNode::generic_param(0, 0))]).with_generic_depths(vec![1]),
    );
    library.register(path("Node"), NominalLayout::class());
    library.register(path("Grid"), NominalLayout::class().with_generic_depths(vec![1]));

    let target = TargetConfig::host_64();
    let lookup = ChainedLookup::new()
        .then(Arc::new(library))
        .then(Arc::new(StdlibLayouts::new(&target)));
    LayoutResolver::new(target, Arc::new(lookup))
}

pub(crate) fn param(ty: TypeNode) -> Parameter {
    Parameter::new(None, ty)
}

/// Top-level function `name(params) -> result`.
pub(crate) fn function(name: &str, params: Vec<TypeNode>, result: TypeNode) -> Declaration {
    let mut decl = Declaration::new(DeclKind::Function, Context::module(MODULE));
    decl.name = Some(DeclName::plain(name));
    decl.params = params.into_iter().map(param).collect();
    decl.result = result;
    decl
}

/// Member of `owner` with no parameters, returning `()`.
pub(crate) fn member(owner: &str, owner_kind: NominalKind, kind: DeclKind) -> Declaration {
    Declaration::new(kind, Context::nominal(&path(owner), &[owner_kind]))
}
