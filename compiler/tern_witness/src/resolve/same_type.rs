//! Same-type constraint checking.
//!
//! Union-find over the abstract types of a signature (parameters and their
//! member types). Each class may be bound to at most one concrete type.

use rustc_hash::FxHashMap;
use tern_ir::{ClassificationError, GenericSignature, Requirement, TypeNode};

pub(super) fn check(signature: &GenericSignature) -> Result<(), ClassificationError> {
    let mut classes = SameTypeClasses::default();
    for requirement in &signature.requirements {
        if let Requirement::SameType { subject, target } = requirement {
            classes.add(subject, target)?;
        }
    }
    Ok(())
}

#[derive(Default)]
struct SameTypeClasses {
    index: FxHashMap<TypeNode, usize>,
    parent: Vec<usize>,
    binding: Vec<Option<TypeNode>>,
}

impl SameTypeClasses {
    fn add(&mut self, subject: &TypeNode, target: &TypeNode) -> Result<(), ClassificationError> {
        let left = self.node(subject);
        if target.root_generic_param().is_some() {
            let right = self.node(target);
            self.union(left, right, subject)
        } else {
            let root = self.find(left);
            self.bind(root, target, subject)
        }
    }

    fn node(&mut self, ty: &TypeNode) -> usize {
        if let Some(&id) = self.index.get(ty) {
            return id;
        }
        let id = self.parent.len();
        self.parent.push(id);
        self.binding.push(None);
        self.index.insert(ty.clone(), id);
        id
    }

    fn find(&mut self, mut id: usize) -> usize {
        while self.parent[id] != id {
            self.parent[id] = self.parent[self.parent[id]];
            id = self.parent[id];
        }
        id
    }

    fn bind(
        &mut self,
        root: usize,
        concrete: &TypeNode,
        subject: &TypeNode,
    ) -> Result<(), ClassificationError> {
        match &self.binding[root] {
            None => {
                self.binding[root] = Some(concrete.clone());
                Ok(())
            }
            Some(existing) if existing == concrete => Ok(()),
            Some(existing) => Err(conflict(subject, existing, concrete)),
        }
    }

    fn union(
        &mut self,
        left: usize,
        right: usize,
        subject: &TypeNode,
    ) -> Result<(), ClassificationError> {
        let left = self.find(left);
        let right = self.find(right);
        if left == right {
            return Ok(());
        }
        if let (Some(first), Some(second)) = (&self.binding[left], &self.binding[right]) {
            if first != second {
                return Err(conflict(subject, first, second));
            }
        }
        self.parent[right] = left;
        if self.binding[left].is_none() {
            self.binding[left] = self.binding[right].take();
        }
        Ok(())
    }
}

fn conflict(subject: &TypeNode, first: &TypeNode, second: &TypeNode) -> ClassificationError {
    ClassificationError::ConflictingSameType {
        subject: subject.to_string(),
        first: first.to_string(),
        second: second.to_string(),
    }
}
