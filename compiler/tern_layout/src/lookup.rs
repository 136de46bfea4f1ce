//! Sources of nominal layouts.

use std::sync::Arc;

use dashmap::DashMap;
use tern_ir::NominalPath;

use crate::NominalLayout;

/// Supplies field layouts for nominal types the resolver cannot derive.
///
/// Implementations are queried at most once per path by a
/// [`LayoutResolver`](crate::LayoutResolver) and must be safe to call from
/// many threads.
pub trait LayoutLookup: Send + Sync {
    fn nominal_layout(&self, path: &NominalPath) -> Option<NominalLayout>;
}

impl<T: LayoutLookup + ?Sized> LayoutLookup for Arc<T> {
    fn nominal_layout(&self, path: &NominalPath) -> Option<NominalLayout> {
        (**self).nominal_layout(path)
    }
}

impl<T: LayoutLookup + ?Sized> LayoutLookup for &T {
    fn nominal_layout(&self, path: &NominalPath) -> Option<NominalLayout> {
        (**self).nominal_layout(path)
    }
}

/// Knows nothing. Every nominal type is unavailable.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoLayouts;

impl LayoutLookup for NoLayouts {
    fn nominal_layout(&self, _path: &NominalPath) -> Option<NominalLayout> {
        None
    }
}

/// Layouts of the library's own types, registered while symbols stream in.
#[derive(Debug, Default)]
pub struct LibraryLayouts {
    layouts: DashMap<NominalPath, NominalLayout>,
}

impl LibraryLayouts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the layout of `path`. A later registration replaces an earlier one.
    pub fn register(&self, path: NominalPath, layout: NominalLayout) {
        tracing::trace!(%path, "registered library layout");
        self.layouts.insert(path, layout);
    }

    pub fn contains(&self, path: &NominalPath) -> bool {
        self.layouts.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }
}

impl LayoutLookup for LibraryLayouts {
    fn nominal_layout(&self, path: &NominalPath) -> Option<NominalLayout> {
        self.layouts.get(path).map(|entry| entry.value().clone())
    }
}

/// Asks each lookup in turn; the first answer wins.
#[derive(Clone, Default)]
pub struct ChainedLookup {
    lookups: Vec<Arc<dyn LayoutLookup>>,
}

impl ChainedLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `lookup` after the ones already in the chain.
    #[must_use]
    pub fn then(mut self, lookup: Arc<dyn LayoutLookup>) -> Self {
        self.lookups.push(lookup);
        self
    }

    pub fn len(&self) -> usize {
        self.lookups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookups.is_empty()
    }
}

impl LayoutLookup for ChainedLookup {
    fn nominal_layout(&self, path: &NominalPath) -> Option<NominalLayout> {
        self.lookups
            .iter()
            .find_map(|lookup| lookup.nominal_layout(path))
    }
}

impl std::fmt::Debug for ChainedLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainedLookup")
            .field("lookups", &self.lookups.len())
            .finish()
    }
}
