//! Positional mapping of protocol witnesses to witness-table slots.
//!
//! A witness table starts with the conformance descriptor at slot 0,
//! followed by one entry per protocol requirement in the protocol's own
//! declaration order. Which member of the conforming type implements a
//! requirement is only known from the witness thunk symbols, so this module
//! matches those thunks against the protocol's requirement list.

use tern_ir::{
    AccessorKind, ClassificationError, DeclKind, Declaration, Ident, NominalPath,
    ProtocolRequirement, ProtocolShape, RequirementKind, TypeNode,
};

/// Slot of the conformance descriptor in every witness table.
pub const CONFORMANCE_DESCRIPTOR_SLOT: usize = 0;

/// One requirement and what implements it.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WitnessEntry {
    /// Position of the requirement in the protocol declaration.
    pub ordinal: usize,
    /// Position in the witness table (`ordinal + 1`).
    pub slot: usize,
    pub requirement: ProtocolRequirement,
    /// The witness thunk, if the symbol list contained one. Base protocols
    /// and associated types are filled in by the runtime and never have one.
    pub witness: Option<Declaration>,
}

/// Witness table layout of one conformance.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WitnessTableMap {
    pub protocol: NominalPath,
    /// Conforming type, taken from the first witness; `None` without witnesses.
    pub conforming: Option<TypeNode>,
    /// One entry per requirement, in ordinal order.
    pub entries: Vec<WitnessEntry>,
}

impl WitnessTableMap {
    pub fn entry(&self, ordinal: usize) -> Option<&WitnessEntry> {
        self.entries.get(ordinal)
    }

    /// Entry stored at witness-table `slot`.
    pub fn at_slot(&self, slot: usize) -> Option<&WitnessEntry> {
        slot.checked_sub(1).and_then(|ordinal| self.entries.get(ordinal))
    }

    /// Entries that have a witness thunk.
    pub fn implemented(&self) -> impl Iterator<Item = &WitnessEntry> {
        self.entries.iter().filter(|entry| entry.witness.is_some())
    }

    /// Number of slots including the conformance descriptor.
    pub fn table_len(&self) -> usize {
        self.entries.len() + 1
    }
}

/// Map the protocol-witness thunks in `witnesses` onto `shape`'s requirements.
///
/// Declarations that are not protocol witnesses are ignored. Every witness
/// must belong to a conformance to `shape`, all for the same conforming
/// type, and match exactly one requirement that has no witness yet.
/// Requirements that overload a name by type only tell their witnesses
/// apart when they carry [`ProtocolRequirement::param_types`].
pub fn map_witnesses(
    shape: &ProtocolShape,
    witnesses: &[Declaration],
) -> Result<WitnessTableMap, ClassificationError> {
    let mut map = WitnessTableMap {
        protocol: shape.path.clone(),
        conforming: None,
        entries: shape
            .requirements
            .iter()
            .enumerate()
            .map(|(ordinal, requirement)| WitnessEntry {
                ordinal,
                slot: ordinal + 1,
                requirement: requirement.clone(),
                witness: None,
            })
            .collect(),
    };

    for decl in witnesses.iter().filter(|decl| decl.kind == DeclKind::ProtocolWitness) {
        let foreign = || ClassificationError::ForeignWitness {
            witness: witness_name(decl),
            protocol: shape.path.clone(),
        };
        let Some(conformance) = decl.conformance.as_ref() else {
            return Err(foreign());
        };
        if conformance.protocol != shape.path {
            return Err(foreign());
        }
        let conforming = map
            .conforming
            .get_or_insert_with(|| conformance.conforming.clone());
        if *conforming != conformance.conforming {
            return Err(foreign());
        }

        let unmatched = || ClassificationError::UnmatchedWitness {
            witness: witness_name(decl),
            protocol: shape.path.clone(),
        };
        let kind = requirement_kind(decl).ok_or_else(unmatched)?;
        let mut candidates = map
            .entries
            .iter()
            .filter(|entry| matches(&entry.requirement, kind, decl))
            .map(|entry| entry.ordinal)
            .peekable();
        let first = *candidates.peek().ok_or_else(unmatched)?;
        let free = candidates.find(|&ordinal| map.entries[ordinal].witness.is_none());
        let Some(ordinal) = free else {
            return Err(ClassificationError::DuplicateWitness {
                ordinal: first,
                protocol: shape.path.clone(),
            });
        };
        tracing::trace!(
            protocol = %shape.path,
            witness = %witness_name(decl),
            ordinal,
            "mapped protocol witness"
        );
        map.entries[ordinal].witness = Some(decl.clone());
    }
    Ok(map)
}

/// Kind of requirement a witness thunk can implement.
///
/// Witness thunks keep the accessor and constructor details of the member
/// they wrap. Subscripts are the accessors without a name.
fn requirement_kind(decl: &Declaration) -> Option<RequirementKind> {
    let subscript = match decl.kind {
        DeclKind::Subscript => true,
        DeclKind::ProtocolWitness => decl.name.is_none(),
        _ => false,
    };
    let Some(accessor) = decl.accessor else {
        if decl.constructor.is_some() || decl.kind == DeclKind::Constructor {
            return Some(RequirementKind::Constructor);
        }
        return matches!(
            decl.kind,
            DeclKind::Function | DeclKind::Method | DeclKind::ProtocolWitness
        )
        .then_some(RequirementKind::Method);
    };
    let kind = match (accessor, subscript) {
        (AccessorKind::Getter | AccessorKind::GlobalGetter, false) => RequirementKind::Getter,
        (AccessorKind::Setter, false) => RequirementKind::Setter,
        (AccessorKind::Modify, false) => RequirementKind::Modify,
        (AccessorKind::Read, false) => RequirementKind::Read,
        (AccessorKind::Getter | AccessorKind::Read, true) => RequirementKind::SubscriptGetter,
        (AccessorKind::Setter, true) => RequirementKind::SubscriptSetter,
        (AccessorKind::Modify, true) => RequirementKind::SubscriptModify,
        _ => return None,
    };
    Some(kind)
}

fn matches(requirement: &ProtocolRequirement, kind: RequirementKind, decl: &Declaration) -> bool {
    if requirement.kind != kind
        || requirement.is_static != decl.flags.is_static()
        || !types_match(requirement, decl)
    {
        return false;
    }
    let name = decl.name.as_ref().map(|name| name.text.as_str());
    if requirement.name.as_ref().map(Ident::as_str) != name {
        return false;
    }
    match kind {
        RequirementKind::Method
        | RequirementKind::Constructor
        | RequirementKind::SubscriptGetter
        | RequirementKind::SubscriptModify => labels_match(&requirement.labels, &decl.params),
        // The new value comes first; the indices follow.
        RequirementKind::SubscriptSetter => {
            labels_match(&requirement.labels, decl.params.get(1..).unwrap_or_default())
        }
        _ => true,
    }
}

fn types_match(requirement: &ProtocolRequirement, decl: &Declaration) -> bool {
    if let Some(types) = &requirement.param_types {
        if types.len() != decl.params.len()
            || types.iter().zip(&decl.params).any(|(ty, param)| *ty != param.ty)
        {
            return false;
        }
    }
    match &requirement.result {
        Some(result) => *result == decl.result,
        None => true,
    }
}

fn labels_match(labels: &[Option<Ident>], params: &[tern_ir::Parameter]) -> bool {
    labels.len() == params.len()
        && labels
            .iter()
            .zip(params)
            .all(|(label, param)| *label == param.label)
}

fn witness_name(decl: &Declaration) -> String {
    if let Some(name) = &decl.name {
        return name.text.to_string();
    }
    match decl.accessor {
        Some(accessor) => format!("subscript {accessor:?}"),
        None if decl.constructor.is_some() || decl.kind == DeclKind::Constructor => {
            "init".to_owned()
        }
        None => format!("{:?}", decl.kind),
    }
}
