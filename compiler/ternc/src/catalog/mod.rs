//! JSON type catalog.
//!
//! Layouts of framework types the library uses but does not define, the
//! requirement lists of protocols it conforms to, and the include/exclude
//! patterns that pick which declarations get bound.
//!
//! ```json
//! {
//!   "types": [
//!     { "path": "Geometry.Point", "kind": "struct",
//!       "fields": [{ "name": "x", "type": "Sd" }, { "name": "y", "type": "Sd" }] },
//!     { "path": "Geometry.Handle", "kind": "opaque",
//!       "fact": { "size": 8, "alignment": 8, "trivial": true } },
//!     { "path": "Geometry.Canvas", "kind": "class" }
//!   ],
//!   "protocols": [
//!     { "path": "Geometry.Drawable",
//!       "requirements": [{ "kind": "Method", "name": "draw", "labels": ["on"],
//!                          "params": ["8Geometry6CanvasC"], "result": "Sb" }] }
//!   ],
//!   "include": ["Geometry.Point.*"],
//!   "exclude": ["Geometry.*"]
//! }
//! ```
//!
//! Field, payload and requirement types are bare type manglings (`Si`,
//! `SaySSG`, `8Geometry5PointV`); generic parameters of the type itself are
//! `x`, `q_` and so on, and `Self` of a protocol is `x`. Requirement types
//! are optional; without them, requirements that share a name and labels
//! are told apart by symbol order alone.

use rustc_hash::FxHashMap;
use serde::Deserialize;
use tern_demangle::{demangle_type, DemangleError};
use tern_ir::{Ident, NominalPath, ProtocolRequirement, ProtocolShape, RequirementKind, TypeNode};
use tern_layout::{EnumCase, FieldLayout, LayoutFact, LayoutLookup, NominalLayout};

use crate::filter::NameFilter;

/// Why a catalog could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("malformed catalog: {0}")]
    Json(#[from] serde_json::Error),

    #[error("`{path}` is not a qualified type path")]
    InvalidPath { path: String },

    #[error("`{path}` is listed twice")]
    Duplicate { path: String },

    #[error("type of `{path}.{member}` is malformed")]
    MemberType {
        path: String,
        member: String,
        #[source]
        source: DemangleError,
    },
}

// ── File format ──────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default)]
    types: Vec<TypeEntry>,
    #[serde(default)]
    protocols: Vec<ProtocolEntry>,
    #[serde(default)]
    include: Vec<String>,
    #[serde(default)]
    exclude: Vec<String>,
}

#[derive(Deserialize)]
struct TypeEntry {
    path: String,
    /// Generic parameters per depth, outermost first.
    #[serde(default)]
    generic_depths: Vec<u32>,
    #[serde(flatten)]
    shape: ShapeEntry,
}

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum ShapeEntry {
    Struct {
        #[serde(default)]
        fields: Vec<MemberEntry>,
    },
    Enum {
        #[serde(default)]
        cases: Vec<CaseEntry>,
    },
    Class,
    Opaque {
        fact: FactEntry,
    },
}

#[derive(Deserialize)]
struct MemberEntry {
    name: String,
    #[serde(rename = "type")]
    ty: String,
}

#[derive(Deserialize)]
struct CaseEntry {
    name: String,
    #[serde(default)]
    payload: Option<String>,
    #[serde(default)]
    indirect: bool,
}

#[derive(Deserialize)]
struct FactEntry {
    size: u64,
    alignment: u32,
    #[serde(default)]
    trivial: bool,
    #[serde(default)]
    reference_counted: bool,
    #[serde(default)]
    extra_inhabitants: bool,
    /// Size depends on runtime metadata.
    #[serde(default)]
    dynamic: bool,
}

#[derive(Deserialize)]
struct ProtocolEntry {
    path: String,
    #[serde(default)]
    class_bound: bool,
    #[serde(default)]
    requirements: Vec<RequirementEntry>,
}

#[derive(Deserialize)]
struct RequirementEntry {
    kind: RequirementKind,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    labels: Vec<Option<String>>,
    #[serde(default)]
    is_static: bool,
    /// Bare type manglings; `Self` is `x`.
    #[serde(default)]
    params: Option<Vec<String>>,
    #[serde(default)]
    result: Option<String>,
}

// ── Catalog ──────────────────────────────────────────────────────────

/// A loaded type catalog.
#[derive(Debug, Default)]
pub struct TypeCatalog {
    layouts: FxHashMap<NominalPath, NominalLayout>,
    protocols: FxHashMap<NominalPath, ProtocolShape>,
    filter: NameFilter,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a catalog and demangle every member type in it.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        let mut catalog = TypeCatalog {
            filter: NameFilter::new(&file.include, &file.exclude),
            ..Self::default()
        };

        for entry in file.types {
            let path = parse_path(&entry.path)?;
            let layout = nominal_layout(&entry.path, entry.shape)?
                .with_generic_depths(entry.generic_depths);
            if catalog.layouts.insert(path, layout).is_some() {
                return Err(CatalogError::Duplicate { path: entry.path });
            }
        }
        for entry in file.protocols {
            let path = parse_path(&entry.path)?;
            let requirements = entry
                .requirements
                .into_iter()
                .map(|requirement| protocol_requirement(&entry.path, requirement))
                .collect::<Result<_, _>>()?;
            let shape = ProtocolShape {
                path: path.clone(),
                class_bound: entry.class_bound,
                requirements,
            };
            if catalog.protocols.insert(path, shape).is_some() {
                return Err(CatalogError::Duplicate { path: entry.path });
            }
        }

        tracing::debug!(
            types = catalog.layouts.len(),
            protocols = catalog.protocols.len(),
            "loaded type catalog"
        );
        Ok(catalog)
    }

    /// Add or replace one layout.
    pub fn insert_layout(&mut self, path: NominalPath, layout: NominalLayout) {
        self.layouts.insert(path, layout);
    }

    pub fn insert_protocol(&mut self, shape: ProtocolShape) {
        self.protocols.insert(shape.path.clone(), shape);
    }

    pub fn set_filter(&mut self, filter: NameFilter) {
        self.filter = filter;
    }

    pub fn protocol(&self, path: &NominalPath) -> Option<&ProtocolShape> {
        self.protocols.get(path)
    }

    pub fn filter(&self) -> &NameFilter {
        &self.filter
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }
}

impl LayoutLookup for TypeCatalog {
    fn nominal_layout(&self, path: &NominalPath) -> Option<NominalLayout> {
        self.layouts.get(path).cloned()
    }
}

/// `Module.Outer.Inner` into a path; at least a module and one type name.
pub fn parse_path(text: &str) -> Result<NominalPath, CatalogError> {
    let invalid = || CatalogError::InvalidPath {
        path: text.to_owned(),
    };
    let mut parts = text.split('.');
    let module = parts.next().filter(|part| !part.is_empty()).ok_or_else(invalid)?;
    let names: Vec<Ident> = parts.map(Ident::new).collect();
    if names.is_empty() || names.iter().any(|name| name.as_str().is_empty()) {
        return Err(invalid());
    }
    Ok(NominalPath::new(Ident::new(module), names))
}

fn member_type(path: &str, member: &str, mangled: &str) -> Result<TypeNode, CatalogError> {
    demangle_type(mangled).map_err(|source| CatalogError::MemberType {
        path: path.to_owned(),
        member: member.to_owned(),
        source,
    })
}

fn protocol_requirement(
    path: &str,
    entry: RequirementEntry,
) -> Result<ProtocolRequirement, CatalogError> {
    let member = entry
        .name
        .clone()
        .unwrap_or_else(|| format!("{:?}", entry.kind));
    let param_types = entry
        .params
        .map(|params| {
            params
                .iter()
                .map(|mangled| member_type(path, &member, mangled))
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?;
    let result = entry
        .result
        .map(|mangled| member_type(path, &member, &mangled))
        .transpose()?;
    Ok(ProtocolRequirement {
        kind: entry.kind,
        name: entry.name.as_deref().map(Ident::new),
        labels: entry
            .labels
            .iter()
            .map(|label| label.as_deref().map(Ident::new))
            .collect(),
        is_static: entry.is_static,
        param_types,
        result,
    })
}

fn nominal_layout(path: &str, shape: ShapeEntry) -> Result<NominalLayout, CatalogError> {
    let member_type = |member: &str, mangled: &str| member_type(path, member, mangled);

    let layout = match shape {
        ShapeEntry::Struct { fields } => NominalLayout::structure(
            fields
                .iter()
                .map(|field| Ok(FieldLayout::new(&field.name, member_type(&field.name, &field.ty)?)))
                .collect::<Result<_, CatalogError>>()?,
        ),
        ShapeEntry::Enum { cases } => NominalLayout::enumeration(
            cases
                .iter()
                .map(|case| {
                    let mut built = match &case.payload {
                        Some(payload) => {
                            EnumCase::with_payload(&case.name, member_type(&case.name, payload)?)
                        }
                        None => EnumCase::empty(&case.name),
                    };
                    if case.indirect {
                        built = built.indirect();
                    }
                    Ok(built)
                })
                .collect::<Result<_, CatalogError>>()?,
        ),
        ShapeEntry::Class => NominalLayout::class(),
        ShapeEntry::Opaque { fact } => NominalLayout::opaque(LayoutFact {
            has_reference_counted_storage: fact.reference_counted,
            has_extra_inhabitants: fact.extra_inhabitants,
            is_fixed_size: !fact.dynamic,
            ..LayoutFact::fixed(fact.size, fact.alignment, fact.trivial)
        }),
    };
    Ok(layout)
}
