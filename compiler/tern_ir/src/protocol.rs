//! Protocol requirement lists.

use crate::{Ident, NominalPath, TypeNode};

/// Kind of entry a protocol requirement occupies in a witness table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RequirementKind {
    BaseProtocol,
    AssociatedType,
    AssociatedConformance,
    Method,
    Constructor,
    Getter,
    Setter,
    Modify,
    Read,
    SubscriptGetter,
    SubscriptSetter,
    SubscriptModify,
}

/// One requirement of a protocol.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProtocolRequirement {
    pub kind: RequirementKind,
    /// Member name; `None` for constructors and subscripts.
    pub name: Option<Ident>,
    /// Argument labels, `None` for unlabeled arguments.
    #[cfg_attr(feature = "serde", serde(default))]
    pub labels: Vec<Option<Ident>>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_static: bool,
    /// Parameter types in the protocol's generic context (`Self` is
    /// `τ_0_0`), a setter's new value first. `None` accepts any types.
    #[cfg_attr(feature = "serde", serde(default))]
    pub param_types: Option<Vec<TypeNode>>,
    /// Result type; `None` accepts any.
    #[cfg_attr(feature = "serde", serde(default))]
    pub result: Option<TypeNode>,
}

impl ProtocolRequirement {
    pub fn new(kind: RequirementKind, name: Option<&str>) -> Self {
        ProtocolRequirement {
            kind,
            name: name.map(Ident::new),
            labels: Vec::new(),
            is_static: false,
            param_types: None,
            result: None,
        }
    }

    #[must_use]
    pub fn with_labels(mut self, labels: &[Option<&str>]) -> Self {
        self.labels = labels.iter().map(|label| label.map(Ident::new)).collect();
        self
    }

    /// Pin the parameter and result types, telling apart requirements that
    /// overload one name by type.
    #[must_use]
    pub fn with_types(mut self, params: Vec<TypeNode>, result: TypeNode) -> Self {
        self.param_types = Some(params);
        self.result = Some(result);
        self
    }

    #[must_use]
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }
}

/// A protocol with its requirements in declaration order.
///
/// The order is the protocol's own, which fixes witness-table slot positions;
/// it is unrelated to the member order of any conforming type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProtocolShape {
    pub path: NominalPath,
    #[cfg_attr(feature = "serde", serde(default))]
    pub class_bound: bool,
    pub requirements: Vec<ProtocolRequirement>,
}
