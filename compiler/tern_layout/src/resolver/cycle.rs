//! Inline-containment cycle check.
//!
//! Walks every type stored inline in `ty` (tuple elements, optional
//! payloads, struct fields, direct enum payloads) with generic arguments
//! instantiated. Classes, opaque layouts and `indirect` cases store their
//! contents out of line and end the walk.
//!
//! A nominal type met again inside its own inline contents is a cycle when
//! the inner instantiation is at least as large as the outer one. Types
//! that only come from generic arguments are strictly smaller, so
//! `Wrapper<Wrapper<Int>>` passes while `S<T> { x: S<(T, T)> }` fails on
//! the first repetition instead of growing without bound.

use rustc_hash::FxHashSet;
use tern_ir::{ClassificationError, NominalKind, TypeNode};
use tern_stack::DepthBudget;

use super::{instantiate, LayoutResolver};
use crate::NominalShape;

pub(super) fn check(resolver: &LayoutResolver, ty: &TypeNode) -> Result<(), ClassificationError> {
    let mut walk = CycleWalk {
        resolver,
        on_stack: Vec::new(),
        done: FxHashSet::default(),
    };
    let mut budget = DepthBudget::new(resolver.max_depth);
    walk.visit(&mut budget, ty)
}

struct CycleWalk<'r> {
    resolver: &'r LayoutResolver,
    /// Nominal types whose inline contents are being walked, with their
    /// node counts.
    on_stack: Vec<(TypeNode, usize)>,
    /// Nominal types already shown to be acyclic.
    done: FxHashSet<TypeNode>,
}

impl CycleWalk<'_> {
    fn visit(&mut self, budget: &mut DepthBudget, ty: &TypeNode) -> Result<(), ClassificationError> {
        budget
            .descend(|budget| self.visit_inner(budget, ty))
            .map_err(|exceeded| ClassificationError::NestingTooDeep {
                limit: exceeded.limit,
            })?
    }

    fn visit_inner(
        &mut self,
        budget: &mut DepthBudget,
        ty: &TypeNode,
    ) -> Result<(), ClassificationError> {
        match ty {
            TypeNode::Tuple(elements) => {
                for element in elements {
                    self.visit(budget, &element.ty)?;
                }
                Ok(())
            }
            TypeNode::Optional(wrapped) => self.visit(budget, wrapped),
            TypeNode::Nominal(nominal) => {
                if matches!(nominal.kind, NominalKind::Class | NominalKind::Protocol)
                    || self.done.contains(ty)
                    || self.resolver.is_cached(ty)
                {
                    return Ok(());
                }
                let size = ty.node_count();
                let repeats = self.on_stack.iter().any(|(outer, outer_size)| {
                    matches!(outer, TypeNode::Nominal(outer) if outer.path == nominal.path)
                        && size >= *outer_size
                });
                if repeats {
                    tracing::debug!(path = %nominal.path, "inline layout cycle");
                    return Err(ClassificationError::RecursiveLayout {
                        path: nominal.path.clone(),
                    });
                }
                let Some(layout) = self.resolver.nominal_layout(&nominal.path) else {
                    return Ok(());
                };
                if nominal.args.len() != layout.generic_param_count() {
                    return Ok(());
                }

                self.on_stack.push((ty.clone(), size));
                let inline: Vec<&TypeNode> = match &layout.shape {
                    NominalShape::Opaque(_) | NominalShape::Class => Vec::new(),
                    NominalShape::Struct { fields } => fields.iter().map(|field| &field.ty).collect(),
                    NominalShape::Enum { cases } => cases
                        .iter()
                        .filter(|case| !case.indirect)
                        .filter_map(|case| case.payload.as_ref())
                        .collect(),
                };
                let result = inline.into_iter().try_for_each(|member| {
                    let member = instantiate(&layout, &nominal.args, member);
                    self.visit(budget, &member)
                });
                self.on_stack.pop();
                result?;
                self.done.insert(ty.clone());
                Ok(())
            }
            TypeNode::Primitive(_)
            | TypeNode::Function(_)
            | TypeNode::Metatype(_)
            | TypeNode::ExistentialMetatype(_)
            | TypeNode::Existential(_)
            | TypeNode::GenericParam(_)
            | TypeNode::DependentMember { .. } => Ok(()),
        }
    }
}
