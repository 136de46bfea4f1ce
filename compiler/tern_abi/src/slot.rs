//! Calling-convention slots.
//!
//! A slot is one physical argument position of a native call. Each slot
//! carries everything the emitter needs to marshal it: the type, whether it
//! travels by value or by address, and who owns the value afterwards.

use tern_ir::TypeNode;

/// Who is responsible for releasing a value passed by address.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Ownership {
    /// The caller keeps ownership; the callee only reads (or, for
    /// `mutable` slots, writes in place).
    Borrowed,
    /// Ownership moves across the call. For parameters the callee consumes
    /// the value; for returns the caller receives trivial storage.
    Owned,
    /// The callee produced a new reference-counted value. The caller must
    /// release it exactly once on every exit path.
    ReturnedOwned,
}

/// How the receiver of an instance member is passed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SelfPassing {
    /// By value in the context register. Class receivers always travel
    /// this way; `ownership` says whether the callee consumes the reference.
    Direct { word_count: u32, ownership: Ownership },
    /// By address.
    Indirect { ownership: Ownership, mutable: bool },
}

/// One argument position (or the return value) of a native call.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CallingConventionSlot {
    /// Receiver of an instance member.
    SelfParameter { ty: TypeNode, passing: SelfPassing },
    /// Trivial value in `word_count` registers.
    DirectValue { ty: TypeNode, word_count: u32 },
    /// Address of the value.
    IndirectPointer {
        ty: TypeNode,
        ownership: Ownership,
        mutable: bool,
    },
    /// Type metadata for the generic parameter at `generic_index` of the
    /// effective signature.
    TypeMetadata { generic_index: usize },
    /// Witness table for the requirement at `requirement_index`.
    WitnessTable { requirement_index: usize },
    /// Address the callee stores a thrown error into.
    ErrorOut,
}

impl CallingConventionSlot {
    /// Value type of the slot; `None` for metadata, witness and error slots.
    pub fn ty(&self) -> Option<&TypeNode> {
        match self {
            CallingConventionSlot::SelfParameter { ty, .. }
            | CallingConventionSlot::DirectValue { ty, .. }
            | CallingConventionSlot::IndirectPointer { ty, .. } => Some(ty),
            CallingConventionSlot::TypeMetadata { .. }
            | CallingConventionSlot::WitnessTable { .. }
            | CallingConventionSlot::ErrorOut => None,
        }
    }

    pub fn is_indirect(&self) -> bool {
        match self {
            CallingConventionSlot::IndirectPointer { .. } | CallingConventionSlot::ErrorOut => true,
            CallingConventionSlot::SelfParameter { passing, .. } => {
                matches!(passing, SelfPassing::Indirect { .. })
            }
            CallingConventionSlot::DirectValue { .. }
            | CallingConventionSlot::TypeMetadata { .. }
            | CallingConventionSlot::WitnessTable { .. } => false,
        }
    }

    /// Ownership of an indirect value slot or a receiver.
    pub fn ownership(&self) -> Option<Ownership> {
        match self {
            CallingConventionSlot::IndirectPointer { ownership, .. }
            | CallingConventionSlot::SelfParameter {
                passing:
                    SelfPassing::Indirect { ownership, .. } | SelfPassing::Direct { ownership, .. },
                ..
            } => Some(*ownership),
            _ => None,
        }
    }

    /// Returns `true` for slots that hold a formal value (receiver,
    /// parameter or return) rather than generic or error plumbing.
    pub fn is_value(&self) -> bool {
        self.ty().is_some()
    }
}
