//! Stack safety for the recursive walks in the binding pipeline.
//!
//! The demangler itself is an explicit-stack machine, but lowering its node
//! tree into declarations, instantiating nominal layouts, and checking for
//! inline layout cycles all recurse over trees whose depth is controlled by
//! untrusted input. Two guards cover that:
//!
//! - [`ensure_sufficient_stack`] grows the native stack on demand so deep but
//!   legitimate nesting never overflows.
//! - [`DepthBudget`] bounds the nesting itself, turning pathological input
//!   (a symbol that nests ten thousand tuples) into an error instead of an
//!   unbounded walk.
//!
//! # Platform Support
//!
//! - **Native targets**: Uses the `stacker` crate to grow the stack on demand.
//! - **WASM targets**: No-op passthrough (WASM has its own stack management).
//!
//! # Configuration
//!
//! - **Red zone**: 100KB - If less than this remains, we grow the stack
//! - **Growth size**: 1MB - Each growth allocates this much additional space

/// Minimum stack space to keep available (100KB red zone).
const RED_ZONE: usize = 100 * 1024;

/// Stack space to allocate when growing (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Default maximum nesting accepted by a [`DepthBudget`].
pub const DEFAULT_MAX_DEPTH: u32 = 1024;

/// Ensure sufficient stack space is available before executing `f`.
///
/// If the remaining stack is below the red zone threshold, this will
/// allocate additional stack space before calling `f`.
///
/// # Platform Behavior
///
/// - **Native**: Uses `stacker::maybe_grow` to dynamically grow the stack
/// - **WASM**: Simply calls `f()` directly (WASM manages its own stack)
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM version - just call directly (WASM has its own stack management).
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

/// Nesting limit was exceeded.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("nesting depth exceeds the limit of {limit}")]
pub struct DepthExceeded {
    pub limit: u32,
}

/// Counts nesting during a recursive walk.
///
/// Call [`DepthBudget::descend`] on the way into a child and run the child
/// inside the closure; the depth is restored when the closure returns, even
/// on the error path.
///
/// ```text
/// fn lower(&mut self, node: NodeId) -> Result<TypeNode, Error> {
///     self.depth.descend(|| { ... })?
/// }
/// ```
#[derive(Clone, Debug)]
pub struct DepthBudget {
    depth: u32,
    limit: u32,
}

impl DepthBudget {
    pub fn new(limit: u32) -> Self {
        Self { depth: 0, limit }
    }

    /// Current nesting depth.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Enter one level of nesting and run `f` with sufficient stack.
    ///
    /// Returns `Err(DepthExceeded)` without calling `f` when the limit would
    /// be crossed.
    pub fn descend<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> Result<R, DepthExceeded> {
        if self.depth >= self.limit {
            return Err(DepthExceeded { limit: self.limit });
        }
        self.depth += 1;
        let result = ensure_sufficient_stack(|| f(self));
        self.depth -= 1;
        Ok(result)
    }
}

impl Default for DepthBudget {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

#[cfg(test)]
mod tests;
