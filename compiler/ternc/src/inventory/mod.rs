//! Module inventory: a library's declarations grouped by owning type.
//!
//! Emitters walk this instead of the flat symbol list. Modules and types
//! appear in the order their first symbol did, and every group keeps its
//! declarations in symbol order, so overloads stay in source order.

use rustc_hash::FxHashMap;
use serde::Serialize;
use tern_ir::{DeclKind, Declaration, Ident, NominalKind, NominalPath, TypeNode};

/// Declarations of one nominal type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TypeContents {
    pub path: NominalPath,
    /// `None` until a symbol says what kind of type this is.
    pub kind: Option<NominalKind>,
    pub constructors: Vec<Declaration>,
    pub destructors: Vec<Declaration>,
    pub methods: Vec<Declaration>,
    pub static_methods: Vec<Declaration>,
    pub properties: Vec<PropertyContents>,
    pub subscripts: Vec<Declaration>,
    /// Protocol-witness thunks of conformances of this type.
    pub witnesses: Vec<Declaration>,
    /// Witness tables and conformance descriptors.
    pub conformances: Vec<Declaration>,
    /// Metadata, descriptors and other runtime records.
    pub metadata: Vec<Declaration>,
}

impl TypeContents {
    fn new(path: NominalPath) -> Self {
        TypeContents {
            path,
            kind: None,
            constructors: Vec::new(),
            destructors: Vec::new(),
            methods: Vec::new(),
            static_methods: Vec::new(),
            properties: Vec::new(),
            subscripts: Vec::new(),
            witnesses: Vec::new(),
            conformances: Vec::new(),
            metadata: Vec::new(),
        }
    }

    pub fn property(&self, name: &str) -> Option<&PropertyContents> {
        self.properties.iter().find(|property| property.name.as_str() == name)
    }

    fn property_mut(&mut self, name: &Ident, is_static: bool) -> &mut PropertyContents {
        let position = self
            .properties
            .iter()
            .position(|property| property.name == *name && property.is_static == is_static);
        let index = position.unwrap_or_else(|| {
            self.properties.push(PropertyContents {
                name: name.clone(),
                is_static,
                accessors: Vec::new(),
            });
            self.properties.len() - 1
        });
        &mut self.properties[index]
    }
}

/// The accessors and storage symbols of one property.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PropertyContents {
    pub name: Ident,
    pub is_static: bool,
    pub accessors: Vec<Declaration>,
}

/// Declarations of one module.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModuleContents {
    pub module: Ident,
    pub functions: Vec<Declaration>,
    /// Global variables: storage, accessors and initializers.
    pub variables: Vec<Declaration>,
    /// Descriptors of the module itself.
    pub metadata: Vec<Declaration>,
    pub types: Vec<TypeContents>,
}

impl ModuleContents {
    pub fn type_contents(&self, path: &NominalPath) -> Option<&TypeContents> {
        self.types.iter().find(|contents| contents.path == *path)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Inventory {
    pub modules: Vec<ModuleContents>,
}

impl Inventory {
    /// Group `decls` by module and owning type.
    pub fn build<'a>(decls: impl IntoIterator<Item = &'a Declaration>) -> Self {
        let mut builder = Builder::default();
        for decl in decls {
            builder.add(decl);
        }
        tracing::debug!(modules = builder.inventory.modules.len(), "built inventory");
        builder.inventory
    }

    pub fn module(&self, name: &str) -> Option<&ModuleContents> {
        self.modules.iter().find(|module| module.module.as_str() == name)
    }

    /// Contents of the type at `path`, in whichever module owns it.
    pub fn type_contents(&self, path: &NominalPath) -> Option<&TypeContents> {
        self.module(path.module.as_str())?.type_contents(path)
    }
}

#[derive(Default)]
struct Builder {
    inventory: Inventory,
    modules: FxHashMap<Ident, usize>,
    types: FxHashMap<NominalPath, (usize, usize)>,
}

impl Builder {
    fn add(&mut self, decl: &Declaration) {
        let Some((path, kind)) = owner(decl) else {
            let module = self.module(&decl.context.module);
            if decl.kind == DeclKind::NominalType {
                module.metadata.push(decl.clone());
            } else if decl.is_callable() && decl.accessor.is_none() {
                module.functions.push(decl.clone());
            } else {
                module.variables.push(decl.clone());
            }
            return;
        };

        let contents = self.type_contents(path);
        if contents.kind.is_none() {
            contents.kind = kind;
        }
        let group = match member_group(decl) {
            MemberGroup::Property(name) => {
                &mut contents.property_mut(name, decl.flags.is_static()).accessors
            }
            MemberGroup::Witness => &mut contents.witnesses,
            MemberGroup::Conformance => &mut contents.conformances,
            MemberGroup::Metadata => &mut contents.metadata,
            MemberGroup::Subscript => &mut contents.subscripts,
            MemberGroup::Constructor => &mut contents.constructors,
            MemberGroup::Destructor => &mut contents.destructors,
            MemberGroup::StaticMethod => &mut contents.static_methods,
            MemberGroup::Method => &mut contents.methods,
        };
        group.push(decl.clone());
    }

    fn module_index(&mut self, name: &Ident) -> usize {
        let modules = &mut self.inventory.modules;
        *self.modules.entry(name.clone()).or_insert_with(|| {
            modules.push(ModuleContents {
                module: name.clone(),
                functions: Vec::new(),
                variables: Vec::new(),
                metadata: Vec::new(),
                types: Vec::new(),
            });
            modules.len() - 1
        })
    }

    fn module(&mut self, name: &Ident) -> &mut ModuleContents {
        let index = self.module_index(name);
        &mut self.inventory.modules[index]
    }

    fn type_contents(&mut self, path: NominalPath) -> &mut TypeContents {
        let (module, index) = match self.types.get(&path) {
            Some(&position) => position,
            None => {
                let module = self.module_index(&path.module);
                let types = &mut self.inventory.modules[module].types;
                types.push(TypeContents::new(path.clone()));
                let position = (module, types.len() - 1);
                self.types.insert(path, position);
                position
            }
        };
        &mut self.inventory.modules[module].types[index]
    }
}

enum MemberGroup<'a> {
    Property(&'a Ident),
    Witness,
    Conformance,
    Metadata,
    Subscript,
    Constructor,
    Destructor,
    StaticMethod,
    Method,
}

fn member_group(decl: &Declaration) -> MemberGroup<'_> {
    if decl.kind == DeclKind::ProtocolWitness {
        return MemberGroup::Witness;
    }
    if decl.descriptor.is_some() || decl.kind == DeclKind::NominalType {
        return if decl.conformance.is_some() {
            MemberGroup::Conformance
        } else {
            MemberGroup::Metadata
        };
    }
    match decl.kind {
        DeclKind::Subscript => return MemberGroup::Subscript,
        DeclKind::Constructor => return MemberGroup::Constructor,
        DeclKind::Destructor => return MemberGroup::Destructor,
        _ => {}
    }
    if decl.constructor.is_some() {
        return MemberGroup::Constructor;
    }
    if decl.destructor.is_some() {
        return MemberGroup::Destructor;
    }
    let storage = decl.accessor.is_some()
        || matches!(
            decl.kind,
            DeclKind::Getter | DeclKind::Setter | DeclKind::Variable
        );
    match &decl.name {
        Some(name) if storage => MemberGroup::Property(&name.text),
        _ if decl.flags.is_static() => MemberGroup::StaticMethod,
        _ => MemberGroup::Method,
    }
}

/// The nominal type a declaration belongs to, with its kind when known.
///
/// Conformance symbols belong to the conforming type and type records to the
/// type they describe, wherever the symbol's own context points.
fn owner(decl: &Declaration) -> Option<(NominalPath, Option<NominalKind>)> {
    let described = decl
        .conformance
        .as_ref()
        .map(|conformance| &conformance.conforming)
        .or(decl.subject.as_ref());
    if let Some(TypeNode::Nominal(nominal)) = described {
        return Some((nominal.path.clone(), Some(nominal.kind)));
    }
    let path = decl.context.owner_path()?;
    Some((path, decl.context.owner_kind()))
}
