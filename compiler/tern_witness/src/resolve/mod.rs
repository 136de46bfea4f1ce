//! Witness requirements of a generic signature.
//!
//! Every generic parameter of a callee is passed as a type-metadata pointer,
//! and every conformance the callee relies on as a witness-table pointer. This
//! module decides which witness tables a signature needs and in what order.

mod same_type;

use tern_ir::{
    ClassificationError, GenericParamKey, GenericSignature, NominalPath, Requirement, TypeNode,
};

/// What the caller passes for one requirement.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WitnessKind {
    /// Witness table for `T: P`.
    WitnessTable,
    /// Witness table reached through an associated type (`T.Element: P`);
    /// the callee recovers the associated type's metadata from it.
    AssociatedTypeMetadata,
}

/// One witness-table argument.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WitnessRequirement {
    /// Index of the root generic parameter in the signature's parameter list.
    pub parameter_index: usize,
    pub protocol: NominalPath,
    pub kind: WitnessKind,
    /// The dependent member, for [`WitnessKind::AssociatedTypeMetadata`].
    pub associated_type: Option<TypeNode>,
}

/// Witness requirements of `signature`, in calling-convention order.
///
/// Parameters are taken in declaration order; within one parameter,
/// conformances follow the signature's declared requirement order. Base-class,
/// layout and same-type requirements add no argument, but same-type
/// requirements are checked for contradictions.
pub fn resolve(
    signature: &GenericSignature,
) -> Result<Vec<WitnessRequirement>, ClassificationError> {
    validate(signature)?;
    same_type::check(signature)?;

    let mut resolved = Vec::new();
    for (parameter_index, &param) in signature.params.iter().enumerate() {
        for requirement in &signature.requirements {
            let Requirement::Conformance { subject, protocol } = requirement else {
                continue;
            };
            let kind = match subject {
                TypeNode::GenericParam(key) if *key == param => WitnessKind::WitnessTable,
                TypeNode::DependentMember { .. } if subject.root_generic_param() == Some(param) => {
                    WitnessKind::AssociatedTypeMetadata
                }
                _ => continue,
            };
            resolved.push(WitnessRequirement {
                parameter_index,
                protocol: protocol.clone(),
                kind,
                associated_type: (kind == WitnessKind::AssociatedTypeMetadata)
                    .then(|| subject.clone()),
            });
        }
    }
    tracing::trace!(
        params = signature.params.len(),
        witnesses = resolved.len(),
        "resolved witness requirements"
    );
    Ok(resolved)
}

/// Every requirement must constrain a parameter of the signature (or a
/// member type of one), and mention no parameter from outside it.
fn validate(signature: &GenericSignature) -> Result<(), ClassificationError> {
    let known = |key: GenericParamKey| -> Result<(), ClassificationError> {
        if signature.position(key).is_some() {
            Ok(())
        } else {
            Err(ClassificationError::UnknownGenericParam { param: key })
        }
    };

    for requirement in &signature.requirements {
        let subject = requirement.subject();
        let Some(root) = subject.root_generic_param() else {
            return Err(ClassificationError::UnsupportedGenericShape {
                detail: format!("requirement on concrete type `{subject}`"),
            });
        };
        known(root)?;

        let mut unknown = None;
        let mut note = |key: GenericParamKey| {
            if unknown.is_none() && signature.position(key).is_none() {
                unknown = Some(key);
            }
        };
        match requirement {
            Requirement::SameType { target, .. } => target.visit_generic_params(&mut note),
            Requirement::BaseClass { class, .. } => class.visit_generic_params(&mut note),
            Requirement::Conformance { .. } | Requirement::Layout { .. } => {}
        }
        if let Some(param) = unknown {
            return Err(ClassificationError::UnknownGenericParam { param });
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap to panic on unexpected state")]
mod tests;
