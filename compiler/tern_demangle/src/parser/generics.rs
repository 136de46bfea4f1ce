//! Generic parameters, signatures, requirements and associated types.

use smallvec::SmallVec;
use tern_ir::Ident;

use super::{PResult, Parser};
use crate::error::DemangleErrorKind;
use crate::node::{Node, NodeId, NodeKind, Payload};

/// What a requirement constrains.
#[derive(Copy, Clone)]
enum Constrained {
    Param,
    Assoc,
    CompoundAssoc,
    Substitution,
}

/// What kind of constraint a requirement states.
#[derive(Copy, Clone)]
enum Constraint {
    Protocol,
    BaseClass,
    SameType,
    Layout,
}

impl Parser<'_> {
    pub(super) fn dependent_generic_param(&mut self, depth: u32, index: u32) -> PResult<NodeId> {
        self.alloc(Node {
            kind: NodeKind::DependentGenericParamType,
            payload: Payload::Param { depth, index },
            children: SmallVec::new(),
        })
    }

    /// `q`/`R` operand: `d<depth><index>`, `z`, or `<index>` at depth 0.
    pub(super) fn generic_param_index(&mut self) -> PResult<NodeId> {
        if self.cursor.next_if(b'd') {
            let depth = self.index_u32()?.checked_add(1);
            let depth = depth.ok_or_else(|| self.error(DemangleErrorKind::NumberOverflow))?;
            let index = self.index_u32()?;
            return self.dependent_generic_param(depth, index);
        }
        if self.cursor.next_if(b'z') {
            return self.dependent_generic_param(0, 0);
        }
        if self.cursor.next_if(b's') {
            return Err(self.error(DemangleErrorKind::Unsupported("constrained existential self")));
        }
        let index = self.index_u32()?.checked_add(1);
        let index = index.ok_or_else(|| self.error(DemangleErrorKind::NumberOverflow))?;
        self.dependent_generic_param(0, index)
    }

    /// `r<counts>l` or `l`: parameter counts per depth, then the
    /// requirements already on the stack.
    pub(super) fn generic_signature(&mut self, has_counts: bool) -> PResult<NodeId> {
        let mut children: SmallVec<[NodeId; 4]> = SmallVec::new();
        if has_counts {
            while !self.cursor.next_if(b'l') {
                let count = if self.cursor.next_if(b'z') {
                    0
                } else {
                    self.index()?
                        .checked_add(1)
                        .ok_or_else(|| self.error(DemangleErrorKind::NumberOverflow))?
                };
                children.push(self.create_index(NodeKind::DependentGenericParamCount, count)?);
            }
        } else {
            children.push(self.create_index(NodeKind::DependentGenericParamCount, 1)?);
        }
        let counts = children.len();
        while let Some(requirement) = self.pop_if(NodeKind::is_requirement) {
            children.push(requirement);
        }
        children[counts..].reverse();
        self.create_with(NodeKind::DependentGenericSignature, &children)
    }

    /// `R<c>`: one requirement of a generic signature.
    pub(super) fn generic_requirement(&mut self) -> PResult<NodeId> {
        let (constraint, constrained) = match self.next_char()? {
            b'c' => (Constraint::BaseClass, Constrained::Assoc),
            b'C' => (Constraint::BaseClass, Constrained::CompoundAssoc),
            b'b' => (Constraint::BaseClass, Constrained::Param),
            b'B' => (Constraint::BaseClass, Constrained::Substitution),
            b't' => (Constraint::SameType, Constrained::Assoc),
            b'T' => (Constraint::SameType, Constrained::CompoundAssoc),
            b's' => (Constraint::SameType, Constrained::Param),
            b'S' => (Constraint::SameType, Constrained::Substitution),
            b'm' => (Constraint::Layout, Constrained::Assoc),
            b'M' => (Constraint::Layout, Constrained::CompoundAssoc),
            b'l' => (Constraint::Layout, Constrained::Param),
            b'L' => (Constraint::Layout, Constrained::Substitution),
            b'p' => (Constraint::Protocol, Constrained::Assoc),
            b'P' => (Constraint::Protocol, Constrained::CompoundAssoc),
            b'Q' => (Constraint::Protocol, Constrained::Substitution),
            b'v' | b'h' | b'i' | b'I' => {
                return Err(self.error(DemangleErrorKind::Unsupported("pack requirement")))
            }
            _ => {
                self.cursor.push_back();
                (Constraint::Protocol, Constrained::Param)
            }
        };

        let subject = match constrained {
            Constrained::Param => {
                let param = self.generic_param_index()?;
                self.create_type(param)?
            }
            Constrained::Assoc => {
                let param = self.generic_param_index()?;
                let ty = self.associated_type_simple(Some(param))?;
                self.add_substitution(ty);
                ty
            }
            Constrained::CompoundAssoc => {
                let param = self.generic_param_index()?;
                let ty = self.associated_type_compound(Some(param))?;
                self.add_substitution(ty);
                ty
            }
            Constrained::Substitution => self.pop_type()?,
        };

        match constraint {
            Constraint::Protocol => {
                let protocol = self.pop_protocol()?;
                self.create_with(
                    NodeKind::DependentGenericConformanceRequirement,
                    &[subject, protocol],
                )
            }
            Constraint::BaseClass => {
                let class = self.pop_type()?;
                self.create_with(NodeKind::DependentGenericConformanceRequirement, &[subject, class])
            }
            Constraint::SameType => {
                let target = self.pop_type()?;
                self.create_with(NodeKind::DependentGenericSameTypeRequirement, &[subject, target])
            }
            Constraint::Layout => self.layout_requirement(subject),
        }
    }

    fn layout_requirement(&mut self, subject: NodeId) -> PResult<NodeId> {
        let c = self.next_char()?;
        let (size, alignment) = match c {
            b'U' | b'R' | b'N' | b'C' | b'D' | b'T' => (None, None),
            b'E' | b'M' => (Some(self.index()?), Some(self.index()?)),
            b'e' | b'm' => (Some(self.index()?), None),
            other => return Err(self.unexpected(other)),
        };
        let name = self.create_text(NodeKind::Identifier, Ident::from(char::from(c).to_string()))?;
        let mut children: SmallVec<[NodeId; 4]> = SmallVec::new();
        children.push(subject);
        children.push(name);
        if let Some(size) = size {
            children.push(self.create_index(NodeKind::Number, size)?);
        }
        if let Some(alignment) = alignment {
            children.push(self.create_index(NodeKind::Number, alignment)?);
        }
        self.create_with(NodeKind::DependentGenericLayoutRequirement, &children)
    }

    /// `Q<c>`: archetypes and associated-type paths.
    pub(super) fn archetype(&mut self) -> PResult<NodeId> {
        let ty = match self.next_char()? {
            b'a' => {
                let name = self.pop_kind(NodeKind::Identifier);
                let name = self.require(name, "associated type name")?;
                let base = self.pop_type_child()?;
                let assoc = self.create_with(NodeKind::AssociatedTypeRef, &[base, name])?;
                self.create_type(assoc)?
            }
            b'x' => self.associated_type_simple(None)?,
            b'X' => self.associated_type_compound(None)?,
            b'y' => {
                let param = self.generic_param_index()?;
                self.associated_type_simple(Some(param))?
            }
            b'Y' => {
                let param = self.generic_param_index()?;
                self.associated_type_compound(Some(param))?
            }
            b'z' => {
                let param = self.dependent_generic_param(0, 0)?;
                self.associated_type_simple(Some(param))?
            }
            b'Z' => {
                let param = self.dependent_generic_param(0, 0)?;
                self.associated_type_compound(Some(param))?
            }
            b'O' | b'o' | b'r' | b'R' | b'u' | b'U' | b'P' | b'p' => {
                return Err(self.error(DemangleErrorKind::Unsupported("opaque type")))
            }
            other => return Err(self.unexpected(other)),
        };
        self.add_substitution(ty);
        Ok(ty)
    }

    /// Pop `identifier [protocol]` naming one associated type.
    fn pop_assoc_type_name(&mut self) -> PResult<NodeId> {
        let protocol = self.pop_kind(NodeKind::Type);
        if let Some(protocol) = protocol {
            let is_protocol = self
                .arena
                .child(protocol, 0)
                .is_some_and(|child| self.arena.kind(child) == NodeKind::Protocol);
            if !is_protocol {
                return Err(self.error(DemangleErrorKind::MissingOperand("protocol")));
            }
        }
        let name = self.pop_kind(NodeKind::Identifier);
        let name = self.require(name, "associated type name")?;
        let text = self.arena.text(name).cloned().unwrap_or_else(|| Ident::new(""));
        self.alloc(Node {
            kind: NodeKind::DependentAssociatedTypeRef,
            payload: Payload::Text(text),
            children: protocol.into_iter().collect(),
        })
    }

    fn assoc_base(&mut self, base: Option<NodeId>) -> PResult<NodeId> {
        match base {
            Some(param) => self.create_type(param),
            None => self.pop_type(),
        }
    }

    /// `base.Name`
    fn associated_type_simple(&mut self, base: Option<NodeId>) -> PResult<NodeId> {
        let name = self.pop_assoc_type_name()?;
        let base = self.assoc_base(base)?;
        let member = self.create_with(NodeKind::DependentMemberType, &[base, name])?;
        self.create_type(member)
    }

    /// `base.A.B...`, names pushed outermost first with a marker after the first.
    fn associated_type_compound(&mut self, base: Option<NodeId>) -> PResult<NodeId> {
        let mut names: SmallVec<[NodeId; 4]> = SmallVec::new();
        loop {
            let first = self.pop_kind(NodeKind::FirstElementMarker).is_some();
            names.push(self.pop_assoc_type_name()?);
            if first {
                break;
            }
        }
        let mut ty = self.assoc_base(base)?;
        while let Some(name) = names.pop() {
            let member = self.create_with(NodeKind::DependentMemberType, &[ty, name])?;
            ty = self.create_type(member)?;
        }
        Ok(ty)
    }
}
