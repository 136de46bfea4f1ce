//! Declaration flags.

use bitflags::bitflags;

bitflags! {
    /// Properties of a declaration recovered from its symbol.
    ///
    /// Some flags come straight from a suffix (`Z` is STATIC, `K` is
    /// THROWING); others are implied by the entity (setters on value types
    /// are MUTATING).
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct DeclFlags: u32 {
        /// Statically dispatched (direct method reference).
        const FINAL = 1 << 0;
        /// Type member with no receiver.
        const STATIC = 1 << 1;
        /// Receiver is modified in place.
        const MUTATING = 1 << 2;
        /// May throw; the callee writes the error register.
        const THROWING = 1 << 3;
        const ASYNC = 1 << 4;

        // === Entry-point variants (bits 8-15) ===

        /// Objective-C entry point thunk.
        const OBJC = 1 << 8;
        /// Native entry point of an `@objc` member.
        const NON_OBJC = 1 << 9;
        /// Dynamic dispatch entry point.
        const DYNAMIC = 1 << 10;
        /// Curry thunk that partially applies the receiver.
        const CURRIED = 1 << 11;
        /// Resilient dispatch thunk.
        const DISPATCH_THUNK = 1 << 12;
        /// Body shared by several identical functions.
        const MERGED = 1 << 13;
        /// Override thunk stored in a class vtable.
        const VTABLE_THUNK = 1 << 14;
    }
}

impl DeclFlags {
    #[inline]
    pub fn is_static(self) -> bool {
        self.contains(DeclFlags::STATIC)
    }

    #[inline]
    pub fn is_mutating(self) -> bool {
        self.contains(DeclFlags::MUTATING)
    }

    #[inline]
    pub fn throws(self) -> bool {
        self.contains(DeclFlags::THROWING)
    }
}
