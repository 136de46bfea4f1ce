//! ABI classification of one declaration.
//!
//! Slot order is fixed by the platform:
//!
//! ```text
//! [self] params... metadata(G)... witness(W)... [error]
//! ```
//!
//! Each formal value becomes exactly one slot. A value travels in registers
//! only if its [`LayoutFact`] says it is direct-passable; everything else is
//! passed by address with an explicit [`Ownership`].

use tern_ir::{
    AccessorKind, ClassificationError, ConstructorKind, DeclKind, Declaration, NominalKind,
    ParamConvention, Parameter, TypeNode,
};
use tern_layout::{LayoutFact, LayoutOutcome, LayoutResolver};

use crate::signature::{self, Owner, ResolvedSignature};
use crate::{CallingConventionSlot, Ownership, SelfPassing};

/// Slots of one call, before they are packaged into a plan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassifiedSlots {
    pub parameter_slots: Vec<CallingConventionSlot>,
    /// `None` when the declaration returns `()`.
    pub return_slot: Option<CallingConventionSlot>,
    /// Owner whose metatype a static member or allocating constructor
    /// receives.
    pub owner_metatype: Option<TypeNode>,
}

/// Classify every argument position of a call to `decl`.
///
/// `signature` must be the declaration's resolved effective signature (see
/// [`resolve_signature`](crate::resolve_signature)). Any value whose layout
/// is unavailable fails the whole declaration.
pub fn classify(
    decl: &Declaration,
    resolver: &LayoutResolver,
    signature: &ResolvedSignature,
) -> Result<ClassifiedSlots, ClassificationError> {
    if !decl.is_callable() {
        return Err(ClassificationError::NotCallable { kind: decl.kind });
    }
    let classifier = Classifier { decl, resolver };

    let mut slots = Vec::with_capacity(
        decl.params.len() + signature.params.len() + signature.requirements.len() + 2,
    );
    let mut owner_metatype = None;
    if let Some(owner) = signature::owner(decl, resolver)? {
        if decl.has_receiver() {
            slots.push(classifier.receiver(owner)?);
        } else if decl.flags.is_static() || is_constructor(decl) {
            owner_metatype = Some(owner.ty);
        }
    }
    for (index, param) in decl.params.iter().enumerate() {
        slots.push(classifier.parameter(index, param)?);
    }
    slots.extend(
        (0..signature.params.len())
            .map(|generic_index| CallingConventionSlot::TypeMetadata { generic_index }),
    );
    slots.extend(
        (0..signature.requirements.len())
            .map(|requirement_index| CallingConventionSlot::WitnessTable { requirement_index }),
    );
    if decl.throws() {
        slots.push(CallingConventionSlot::ErrorOut);
    }
    let return_slot = classifier.result()?;

    tracing::debug!(
        name = decl.name_text(),
        kind = ?decl.kind,
        slots = slots.len(),
        indirect = slots.iter().filter(|slot| slot.is_indirect()).count(),
        "classified declaration"
    );
    Ok(ClassifiedSlots {
        parameter_slots: slots,
        return_slot,
        owner_metatype,
    })
}

pub(crate) fn is_constructor(decl: &Declaration) -> bool {
    decl.kind == DeclKind::Constructor || decl.constructor.is_some()
}

struct Classifier<'a> {
    decl: &'a Declaration,
    resolver: &'a LayoutResolver,
}

impl Classifier<'_> {
    fn fact(
        &self,
        ty: &TypeNode,
        role: impl FnOnce() -> String,
    ) -> Result<LayoutFact, ClassificationError> {
        match self.resolver.layout_of(ty)? {
            LayoutOutcome::Fact(fact) => Ok(fact),
            LayoutOutcome::Unavailable(missing) => {
                Err(ClassificationError::unavailable(missing, role()))
            }
        }
    }

    /// Instance members receive `self`. A class receiver is the object
    /// reference itself. Mutating members of value types get its address;
    /// destructors and initializing constructors consume it.
    fn receiver(&self, owner: Owner) -> Result<CallingConventionSlot, ClassificationError> {
        let fact = self.fact(&owner.ty, || "receiver".to_owned())?;
        let consumed = self.decl.kind == DeclKind::Destructor
            || self.decl.destructor.is_some()
            || self.decl.constructor == Some(ConstructorKind::Initializing);
        let ownership = if consumed {
            Ownership::Owned
        } else {
            Ownership::Borrowed
        };

        let passing = if owner.kind == NominalKind::Class {
            SelfPassing::Direct {
                word_count: fact.size_in_words,
                ownership,
            }
        } else {
            let mutating = self.decl.flags.is_mutating()
                || self.decl.accessor.is_some_and(AccessorKind::is_mutating_access);
            if fact.is_direct_passable && !mutating && !consumed {
                SelfPassing::Direct {
                    word_count: fact.size_in_words,
                    ownership,
                }
            } else {
                SelfPassing::Indirect {
                    ownership,
                    mutable: mutating,
                }
            }
        };
        Ok(CallingConventionSlot::SelfParameter {
            ty: owner.ty,
            passing,
        })
    }

    fn parameter(
        &self,
        index: usize,
        param: &Parameter,
    ) -> Result<CallingConventionSlot, ClassificationError> {
        let fact = self.fact(&param.ty, || format!("parameter {index}"))?;
        let ty = param.ty.clone();
        if param.is_inout() {
            return Ok(CallingConventionSlot::IndirectPointer {
                ty,
                ownership: Ownership::Borrowed,
                mutable: true,
            });
        }
        if fact.is_direct_passable {
            return Ok(CallingConventionSlot::DirectValue {
                ty,
                word_count: fact.size_in_words,
            });
        }
        Ok(CallingConventionSlot::IndirectPointer {
            ty,
            ownership: self.parameter_ownership(index, param),
            mutable: false,
        })
    }

    fn parameter_ownership(&self, index: usize, param: &Parameter) -> Ownership {
        match param.convention {
            ParamConvention::Owned => Ownership::Owned,
            ParamConvention::Shared | ParamConvention::InOut => Ownership::Borrowed,
            ParamConvention::Default => {
                // Setters take the new value first.
                let new_value =
                    index == 0 && self.decl.accessor.is_some_and(AccessorKind::takes_new_value);
                if new_value || is_constructor(self.decl) {
                    Ownership::Owned
                } else {
                    Ownership::Borrowed
                }
            }
        }
    }

    fn result(&self) -> Result<Option<CallingConventionSlot>, ClassificationError> {
        let ty = &self.decl.result;
        if ty.is_unit() {
            return Ok(None);
        }
        let fact = self.fact(ty, || "return value".to_owned())?;
        if fact.is_direct_passable {
            return Ok(Some(CallingConventionSlot::DirectValue {
                ty: ty.clone(),
                word_count: fact.size_in_words,
            }));
        }
        let ownership = if fact.has_reference_counted_storage || !fact.is_fixed_size {
            Ownership::ReturnedOwned
        } else {
            Ownership::Owned
        };
        Ok(Some(CallingConventionSlot::IndirectPointer {
            ty: ty.clone(),
            ownership,
            mutable: false,
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap to panic on unexpected state")]
mod tests;
