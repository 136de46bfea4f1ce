//! Suffixes that turn a type or entity into a runtime artifact: metadata
//! (`M`), witness tables (`W`) and thunks or attributes (`T`).

use super::{PResult, Parser};
use crate::error::DemangleErrorKind;
use crate::node::{NodeId, NodeKind};

impl Parser<'_> {
    fn with_popped_type(&mut self, kind: NodeKind) -> PResult<NodeId> {
        let ty = self.pop_type()?;
        self.create_with(kind, &[ty])
    }

    fn with_popped_conformance(&mut self, kind: NodeKind) -> PResult<NodeId> {
        let conformance = self.pop_protocol_conformance()?;
        self.create_with(kind, &[conformance])
    }

    fn pop_entity(&mut self) -> PResult<NodeId> {
        let entity = self.pop_if(NodeKind::is_entity);
        self.require(entity, "entity")
    }

    /// `M<c>`: type metadata and descriptors.
    pub(super) fn metatype_suffix(&mut self) -> PResult<NodeId> {
        match self.next_char()? {
            b'a' => self.with_popped_type(NodeKind::TypeMetadataAccessFunction),
            b'B' => self.with_popped_type(NodeKind::ReflectionBuiltinDescriptor),
            b'F' => self.with_popped_type(NodeKind::ReflectionFieldDescriptor),
            b'c' => self.with_popped_conformance(NodeKind::ProtocolConformanceDescriptor),
            b'f' => self.with_popped_type(NodeKind::FullTypeMetadata),
            b'i' => self.with_popped_type(NodeKind::TypeMetadataInstantiationFunction),
            b'I' => self.with_popped_type(NodeKind::TypeMetadataInstantiationCache),
            b'l' => self.with_popped_type(NodeKind::TypeMetadataSingletonInitializationCache),
            b'L' => self.with_popped_type(NodeKind::TypeMetadataLazyCache),
            b'm' => self.with_popped_type(NodeKind::Metaclass),
            b'n' => self.with_popped_type(NodeKind::NominalTypeDescriptor),
            b'o' => self.with_popped_type(NodeKind::ClassMetadataBaseOffset),
            b'p' => {
                let protocol = self.pop_protocol()?;
                self.create_with(NodeKind::ProtocolDescriptor, &[protocol])
            }
            b'P' => self.with_popped_type(NodeKind::GenericTypeMetadataPattern),
            b'r' => self.with_popped_type(NodeKind::TypeMetadataCompletionFunction),
            b'u' => self.with_popped_type(NodeKind::MethodLookupFunction),
            b'V' => {
                let entity = self.pop_entity()?;
                self.create_with(NodeKind::PropertyDescriptor, &[entity])
            }
            b'X' => self.context_descriptor(),
            b'A' | b'b' | b'C' | b'D' | b'g' | b'h' | b'j' | b'J' | b'k' | b'K' | b'q' | b'Q'
            | b's' | b'S' | b't' | b'U' | b'z' => {
                Err(self.error(DemangleErrorKind::Unsupported("metadata kind")))
            }
            other => Err(self.unexpected(other)),
        }
    }

    /// `MX<c>`: context descriptors. Only modules are supported.
    fn context_descriptor(&mut self) -> PResult<NodeId> {
        match self.next_char()? {
            b'M' => {
                let module = self.pop_module()?;
                let module = self.require(module, "module")?;
                self.create_with(NodeKind::ModuleDescriptor, &[module])
            }
            b'A' | b'E' | b'X' | b'Y' => {
                Err(self.error(DemangleErrorKind::Unsupported("context descriptor")))
            }
            other => Err(self.unexpected(other)),
        }
    }

    /// `W<c>`: witness tables and field offsets.
    pub(super) fn witness(&mut self) -> PResult<NodeId> {
        match self.next_char()? {
            b'V' => self.with_popped_type(NodeKind::ValueWitnessTable),
            b'v' => {
                let direct = match self.next_char()? {
                    b'd' => 0,
                    b'i' => 1,
                    other => return Err(self.unexpected(other)),
                };
                let directness = self.create_index(NodeKind::Directness, direct)?;
                let entity = self.pop_entity()?;
                self.create_with(NodeKind::FieldOffset, &[directness, entity])
            }
            b'P' => self.with_popped_conformance(NodeKind::ProtocolWitnessTable),
            b'p' => self.with_popped_conformance(NodeKind::ProtocolWitnessTablePattern),
            b'G' => self.with_popped_conformance(NodeKind::GenericProtocolWitnessTable),
            b'I' => self.with_popped_conformance(
                NodeKind::GenericProtocolWitnessTableInstantiationFunction,
            ),
            b'r' => self.with_popped_conformance(NodeKind::ResilientProtocolWitnessTable),
            b'a' => self.with_popped_conformance(NodeKind::ProtocolWitnessTableAccessor),
            b'l' => {
                let conformance = self.pop_protocol_conformance()?;
                let ty = self.pop_type()?;
                self.create_with(NodeKind::LazyProtocolWitnessTableAccessor, &[ty, conformance])
            }
            b'L' => {
                let conformance = self.pop_protocol_conformance()?;
                let ty = self.pop_type()?;
                self.create_with(
                    NodeKind::LazyProtocolWitnessTableCacheVariable,
                    &[ty, conformance],
                )
            }
            b't' => {
                let name = self.pop_decl_name()?;
                let conformance = self.pop_protocol_conformance()?;
                self.create_with(NodeKind::AssociatedTypeMetadataAccessor, &[conformance, name])
            }
            b'C' | b'S' | b'T' | b'b' | b'B' | b'O' | b'o' | b'Z' | b'z' => {
                Err(self.error(DemangleErrorKind::Unsupported("witness kind")))
            }
            other => Err(self.unexpected(other)),
        }
    }

    /// `T<c>`: thunks, descriptors and function attributes.
    pub(super) fn thunk(&mut self) -> PResult<NodeId> {
        match self.next_char()? {
            b'c' => {
                let entity = self.pop_entity()?;
                self.create_with(NodeKind::CurryThunk, &[entity])
            }
            b'j' => {
                let entity = self.pop_entity()?;
                self.create_with(NodeKind::DispatchThunk, &[entity])
            }
            b'q' => {
                let entity = self.pop_entity()?;
                self.create_with(NodeKind::MethodDescriptor, &[entity])
            }
            b'L' => {
                let protocol = self.pop_protocol()?;
                self.create_with(NodeKind::ProtocolRequirementsBaseDescriptor, &[protocol])
            }
            b'b' => {
                let requirement = self.pop_protocol()?;
                let protocol = self.pop_type()?;
                self.create_with(NodeKind::BaseConformanceDescriptor, &[protocol, requirement])
            }
            b'o' => self.create(NodeKind::ObjCAttribute),
            b'O' => self.create(NodeKind::NonObjCAttribute),
            b'D' => self.create(NodeKind::DynamicAttribute),
            b'd' => self.create(NodeKind::DirectMethodReferenceAttribute),
            b'm' => self.create(NodeKind::MergedFunction),
            b'V' => {
                let base = self.pop_entity()?;
                let derived = self.pop_entity()?;
                self.create_with(NodeKind::VTableThunk, &[derived, base])
            }
            b'W' => {
                let entity = self.pop_entity()?;
                let conformance = self.pop_protocol_conformance()?;
                self.create_with(NodeKind::ProtocolWitness, &[conformance, entity])
            }
            b'a' | b'A' | b'X' | b'x' | b'I' | b'S' | b'R' | b'r' | b'y' | b'f' | b'G' | b'g'
            | b'i' | b'p' | b'P' | b'H' | b'h' | b'k' | b'K' | b'u' | b'v' | b'w' | b'z' | b'Z' => {
                Err(self.error(DemangleErrorKind::Unsupported("thunk kind")))
            }
            other => Err(self.unexpected(other)),
        }
    }
}
