//! Slot-order check.
//!
//! `[self] params... metadata(G)... witness(W)... [error]`, with counts taken
//! from the declaration and its resolved signature.

use tern_ir::{ClassificationError, Declaration};

use crate::signature::ResolvedSignature;
use crate::CallingConventionSlot;

pub(super) fn check(
    decl: &Declaration,
    signature: &ResolvedSignature,
    slots: &[CallingConventionSlot],
    return_slot: Option<&CallingConventionSlot>,
) -> Result<(), ClassificationError> {
    let mut cursor = Cursor { slots, position: 0 };

    if decl.has_receiver() {
        cursor.take("the receiver", |slot| {
            matches!(slot, CallingConventionSlot::SelfParameter { .. })
        })?;
    }
    for param in &decl.params {
        cursor.take("a parameter", |slot| {
            !matches!(slot, CallingConventionSlot::SelfParameter { .. })
                && slot.ty() == Some(&param.ty)
        })?;
    }
    for generic_index in 0..signature.params.len() {
        cursor.take("type metadata", |slot| {
            *slot == CallingConventionSlot::TypeMetadata { generic_index }
        })?;
    }
    for requirement_index in 0..signature.requirements.len() {
        cursor.take("a witness table", |slot| {
            *slot == CallingConventionSlot::WitnessTable { requirement_index }
        })?;
    }
    if decl.throws() {
        cursor.take("the error slot", |slot| *slot == CallingConventionSlot::ErrorOut)?;
    }
    if let Some(extra) = slots.get(cursor.position) {
        return Err(ClassificationError::SlotOrder {
            position: cursor.position,
            detail: format!("{} after the last expected slot", describe(extra)),
        });
    }

    let return_ok = match return_slot {
        None => decl.result.is_unit(),
        Some(
            CallingConventionSlot::DirectValue { ty, .. }
            | CallingConventionSlot::IndirectPointer { ty, .. },
        ) => *ty == decl.result,
        Some(_) => false,
    };
    if !return_ok {
        return Err(ClassificationError::SlotOrder {
            position: slots.len(),
            detail: format!(
                "return slot {} does not carry `{}`",
                return_slot.map_or("(none)", describe),
                decl.result
            ),
        });
    }
    Ok(())
}

struct Cursor<'a> {
    slots: &'a [CallingConventionSlot],
    position: usize,
}

impl Cursor<'_> {
    fn take(
        &mut self,
        expected: &str,
        accept: impl FnOnce(&CallingConventionSlot) -> bool,
    ) -> Result<(), ClassificationError> {
        let found = match self.slots.get(self.position) {
            Some(slot) if accept(slot) => {
                self.position += 1;
                return Ok(());
            }
            Some(slot) => describe(slot),
            None => "the end of the slots",
        };
        Err(ClassificationError::SlotOrder {
            position: self.position,
            detail: format!("expected {expected}, found {found}"),
        })
    }
}

fn describe(slot: &CallingConventionSlot) -> &'static str {
    match slot {
        CallingConventionSlot::SelfParameter { .. } => "a receiver",
        CallingConventionSlot::DirectValue { .. } => "a direct value",
        CallingConventionSlot::IndirectPointer { .. } => "an indirect pointer",
        CallingConventionSlot::TypeMetadata { .. } => "type metadata",
        CallingConventionSlot::WitnessTable { .. } => "a witness table",
        CallingConventionSlot::ErrorOut => "an error slot",
    }
}
