//! Binding plans: the hand-off to the emitter.
//!
//! A [`BindingPlan`] is everything an emitter needs to call one native entry
//! point: the declaration, the slot sequence, the return slot and whether
//! the call can throw. It is built on demand and owned by the caller.

mod order;

use tern_ir::{ClassificationError, Declaration, TypeNode};
use tern_layout::LayoutResolver;

use crate::classify::{classify, ClassifiedSlots};
use crate::signature::{resolve_signature, ResolvedSignature};
use crate::CallingConventionSlot;

/// How to call one native entry point.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BindingPlan {
    pub declaration: Declaration,
    /// Receiver, parameters, metadata, witness tables and the error slot, in
    /// call order.
    pub parameter_slots: Vec<CallingConventionSlot>,
    /// `None` for declarations returning `()`.
    pub return_slot: Option<CallingConventionSlot>,
    pub throws: bool,
    /// Type whose metatype a static member or constructor receives.
    pub owner_metatype: Option<TypeNode>,
}

impl BindingPlan {
    pub fn receiver(&self) -> Option<&CallingConventionSlot> {
        self.parameter_slots
            .first()
            .filter(|slot| matches!(slot, CallingConventionSlot::SelfParameter { .. }))
    }

    /// Slots of the formal parameters, in source order.
    pub fn formal_parameters(&self) -> impl Iterator<Item = &CallingConventionSlot> {
        self.parameter_slots.iter().filter(|slot| {
            matches!(
                slot,
                CallingConventionSlot::DirectValue { .. }
                    | CallingConventionSlot::IndirectPointer { .. }
            )
        })
    }

    pub fn metadata_count(&self) -> usize {
        self.parameter_slots
            .iter()
            .filter(|slot| matches!(slot, CallingConventionSlot::TypeMetadata { .. }))
            .count()
    }

    pub fn witness_count(&self) -> usize {
        self.parameter_slots
            .iter()
            .filter(|slot| matches!(slot, CallingConventionSlot::WitnessTable { .. }))
            .count()
    }
}

/// Runs the classification pipeline and packages its result.
pub struct BindingPlanBuilder<'a> {
    resolver: &'a LayoutResolver,
}

impl<'a> BindingPlanBuilder<'a> {
    pub fn new(resolver: &'a LayoutResolver) -> Self {
        BindingPlanBuilder { resolver }
    }

    /// Resolve, classify and build the plan for `decl`.
    pub fn plan(&self, decl: &Declaration) -> Result<BindingPlan, ClassificationError> {
        if !decl.is_callable() {
            return Err(ClassificationError::NotCallable { kind: decl.kind });
        }
        let signature = resolve_signature(decl, self.resolver)?;
        let slots = classify(decl, self.resolver, &signature)?;
        Self::build(decl, &signature, slots)
    }

    /// Package classified slots into a plan.
    ///
    /// Checks that the slots follow the calling-convention order for `decl`
    /// and `signature` and fails with [`ClassificationError::SlotOrder`]
    /// otherwise.
    pub fn build(
        decl: &Declaration,
        signature: &ResolvedSignature,
        slots: ClassifiedSlots,
    ) -> Result<BindingPlan, ClassificationError> {
        order::check(decl, signature, &slots.parameter_slots, slots.return_slot.as_ref())?;
        Ok(BindingPlan {
            declaration: decl.clone(),
            parameter_slots: slots.parameter_slots,
            return_slot: slots.return_slot,
            throws: decl.throws(),
            owner_metatype: slots.owner_metatype,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap to panic on unexpected state")]
mod tests;
