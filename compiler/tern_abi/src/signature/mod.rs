//! Effective generic signature of a declaration.
//!
//! A mangled member only spells the generic parameters it introduces
//! itself. At the call boundary the callee also receives metadata for every
//! parameter of its enclosing generic context, so the signature used for
//! classification is assembled from three sources, in this order:
//!
//! 1. the owning type's parameters, from its [`NominalLayout`] (a protocol
//!    owner contributes `Self: P` at depth 0),
//! 2. the constraints of the extension the member is declared in,
//! 3. the declaration's own signature.
//!
//! [`NominalLayout`]: tern_layout::NominalLayout

use tern_ir::{
    ClassificationError, Declaration, GenericParamKey, GenericSignature, LayoutUnavailable,
    NominalKind, Requirement, TypeNode,
};
use tern_layout::LayoutResolver;
use tern_witness::WitnessRequirement;

/// Generic parameters and witness tables a call passes, in slot order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResolvedSignature {
    pub params: Vec<GenericParamKey>,
    pub requirements: Vec<WitnessRequirement>,
}

impl ResolvedSignature {
    pub fn is_empty(&self) -> bool {
        self.params.is_empty() && self.requirements.is_empty()
    }
}

/// The type that declares a member.
pub(crate) struct Owner {
    pub kind: NominalKind,
    /// The owner as seen from inside its own generic context: `Box<τ_0_0>`
    /// for `struct Box<T>`, `τ_0_0` for a protocol.
    pub ty: TypeNode,
    pub signature: GenericSignature,
}

/// Owner of `decl`, or `None` for top-level declarations.
pub(crate) fn owner(
    decl: &Declaration,
    resolver: &LayoutResolver,
) -> Result<Option<Owner>, ClassificationError> {
    let (Some(path), Some(kind)) = (decl.context.owner_path(), decl.context.owner_kind()) else {
        return Ok(None);
    };

    if kind == NominalKind::Protocol {
        let this = TypeNode::GenericParam(GenericParamKey::new(0, 0));
        let signature = GenericSignature {
            params: vec![GenericParamKey::new(0, 0)],
            requirements: vec![Requirement::Conformance {
                subject: this.clone(),
                protocol: path,
            }],
        };
        return Ok(Some(Owner {
            kind,
            ty: this,
            signature,
        }));
    }

    let Some(layout) = resolver.nominal_layout(&path) else {
        return Err(ClassificationError::unavailable(
            LayoutUnavailable { path },
            "generic context",
        ));
    };
    let params = layout.generic_params();
    let args = params.iter().map(|&key| TypeNode::GenericParam(key)).collect();
    Ok(Some(Owner {
        kind,
        ty: TypeNode::nominal(path, kind, args),
        signature: GenericSignature {
            params,
            requirements: Vec::new(),
        },
    }))
}

/// Signature whose parameters and requirements the call passes, in order.
pub fn effective_signature(
    decl: &Declaration,
    resolver: &LayoutResolver,
) -> Result<GenericSignature, ClassificationError> {
    let mut signature = owner(decl, resolver)?
        .map(|owner| owner.signature)
        .unwrap_or_default();
    if let Some(extension) = decl
        .context
        .extension
        .as_ref()
        .and_then(|extension| extension.signature.as_ref())
    {
        merge(&mut signature, extension);
    }
    merge(&mut signature, &decl.generic_signature);
    Ok(signature)
}

/// Effective signature of `decl` with its witness requirements resolved.
pub fn resolve_signature(
    decl: &Declaration,
    resolver: &LayoutResolver,
) -> Result<ResolvedSignature, ClassificationError> {
    let signature = effective_signature(decl, resolver)?;
    let requirements = tern_witness::resolve(&signature)?;
    Ok(ResolvedSignature {
        params: signature.params,
        requirements,
    })
}

/// Append `other` to `signature`, skipping parameters and requirements that
/// an outer context already introduced.
fn merge(signature: &mut GenericSignature, other: &GenericSignature) {
    for &param in &other.params {
        if !signature.params.contains(&param) {
            signature.params.push(param);
        }
    }
    for requirement in &other.requirements {
        if !signature.requirements.contains(requirement) {
            signature.requirements.push(requirement.clone());
        }
    }
}
