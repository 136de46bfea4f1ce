//! Declarations: functions, constructors, storage and accessors, plus the
//! extension contexts they live in.

use smallvec::SmallVec;

use super::{PResult, Parser};
use crate::error::DemangleErrorKind;
use crate::node::{NodeId, NodeKind};

impl Parser<'_> {
    /// `F`: a function or method with its own name.
    pub(super) fn plain_function(&mut self) -> PResult<NodeId> {
        let signature = self.pop_kind(NodeKind::DependentGenericSignature);
        let mut ty = self.pop_function_type(NodeKind::FunctionType)?;
        let labels = self.pop_function_param_labels(ty)?;
        if let Some(signature) = signature {
            let generic = self.create_with(NodeKind::DependentGenericType, &[signature, ty])?;
            ty = self.create_type(generic)?;
        }
        let name = self.pop_decl_name()?;
        let context = self.pop_context()?;
        match labels {
            Some(labels) => self.create_with(NodeKind::Function, &[context, name, labels, ty]),
            None => self.create_with(NodeKind::Function, &[context, name, ty]),
        }
    }

    /// `f<c>`: constructors, destructors and other unnamed function entities.
    pub(super) fn function_entity(&mut self) -> PResult<NodeId> {
        let c = self.next_char()?;
        let kind = match c {
            b'D' => NodeKind::Deallocator,
            b'd' => NodeKind::Destructor,
            b'E' => NodeKind::IVarDestroyer,
            b'e' => NodeKind::IVarInitializer,
            b'i' => NodeKind::Initializer,
            b'C' => NodeKind::Allocator,
            b'c' => NodeKind::Constructor,
            b'A' => NodeKind::DefaultArgumentInitializer,
            b'U' | b'u' => return Err(self.error(DemangleErrorKind::Unsupported("closure"))),
            b'P' | b'W' | b'p' | b'a' => {
                return Err(self.error(DemangleErrorKind::Unsupported("function entity")))
            }
            other => return Err(self.unexpected(other)),
        };

        match kind {
            NodeKind::Allocator | NodeKind::Constructor => {
                let private_name = self.pop_kind(NodeKind::PrivateDeclName);
                let ty = self.pop_type()?;
                let labels = self.pop_function_param_labels(ty)?;
                let context = self.pop_context()?;
                let mut children: SmallVec<[NodeId; 4]> = SmallVec::new();
                children.push(context);
                children.extend(labels);
                children.push(ty);
                children.extend(private_name);
                self.create_with(kind, &children)
            }
            NodeKind::DefaultArgumentInitializer => {
                let index = self.index()?;
                let number = self.create_index(NodeKind::Number, index)?;
                let context = self.pop_context()?;
                self.create_with(kind, &[context, number])
            }
            _ => {
                let context = self.pop_context()?;
                self.create_with(kind, &[context])
            }
        }
    }

    /// Pop `type [labels] name context` into an entity node of `kind`.
    fn entity(&mut self, kind: NodeKind) -> PResult<NodeId> {
        let ty = self.pop_type()?;
        let labels = self.pop_function_param_labels(ty)?;
        let name = self.pop_decl_name()?;
        let context = self.pop_context()?;
        match labels {
            Some(labels) => self.create_with(kind, &[context, name, labels, ty]),
            None => self.create_with(kind, &[context, name, ty]),
        }
    }

    /// `v<accessor>`: a stored or computed variable.
    pub(super) fn variable(&mut self) -> PResult<NodeId> {
        let variable = self.entity(NodeKind::Variable)?;
        self.accessor(variable)
    }

    /// `i<accessor>`: a subscript.
    pub(super) fn subscript(&mut self) -> PResult<NodeId> {
        let private_name = self.pop_kind(NodeKind::PrivateDeclName);
        let ty = self.pop_type()?;
        let labels = self.pop_function_param_labels(ty)?;
        let context = self.pop_context()?;
        let mut children: SmallVec<[NodeId; 4]> = SmallVec::new();
        children.push(context);
        children.extend(labels);
        children.push(ty);
        children.extend(private_name);
        let subscript = self.create_with(NodeKind::Subscript, &children)?;
        self.accessor(subscript)
    }

    /// Wrap a storage declaration in the accessor named by the next character.
    fn accessor(&mut self, storage: NodeId) -> PResult<NodeId> {
        let kind = match self.next_char()? {
            b'm' => NodeKind::MaterializeForSet,
            b's' => NodeKind::Setter,
            b'g' => NodeKind::Getter,
            b'G' => NodeKind::GlobalGetter,
            b'w' => NodeKind::WillSet,
            b'W' => NodeKind::DidSet,
            b'r' => NodeKind::ReadAccessor,
            b'M' => NodeKind::ModifyAccessor,
            b'i' => NodeKind::InitAccessor,
            b'a' => match self.next_char()? {
                b'O' => NodeKind::OwningMutableAddressor,
                b'o' => NodeKind::NativeOwningMutableAddressor,
                b'p' => NodeKind::NativePinningMutableAddressor,
                b'u' => NodeKind::UnsafeMutableAddressor,
                other => return Err(self.unexpected(other)),
            },
            b'l' => match self.next_char()? {
                b'O' => NodeKind::OwningAddressor,
                b'o' => NodeKind::NativeOwningAddressor,
                b'p' => NodeKind::NativePinningAddressor,
                b'u' => NodeKind::UnsafeAddressor,
                other => return Err(self.unexpected(other)),
            },
            b'p' => return Ok(storage),
            other => return Err(self.unexpected(other)),
        };
        self.create_with(kind, &[storage])
    }

    /// `E`: an extension of a nominal type declared in some module.
    pub(super) fn extension_context(&mut self) -> PResult<NodeId> {
        let signature = self.pop_kind(NodeKind::DependentGenericSignature);
        let module = self.pop_module()?;
        let module = self.require(module, "extension module")?;
        let extended = self.pop_any_generic()?;
        match signature {
            Some(signature) => {
                self.create_with(NodeKind::Extension, &[module, extended, signature])
            }
            None => self.create_with(NodeKind::Extension, &[module, extended]),
        }
    }
}
