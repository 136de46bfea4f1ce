//! Explicit-stack operator machine.
//!
//! The mangling is postfix: operands come first, then the operator character
//! that combines them. The parser keeps a node stack; every operator either
//! pushes a fresh node or pops its operands and pushes the combined node. No
//! Rust recursion happens while parsing, so nesting depth in the input cannot
//! overflow the native stack here.
//!
//! # Substitutions
//!
//! Identifiers, nominal types, bound generics and associated types are
//! appended to `substitutions` as they are produced. `A` operators push
//! earlier entries back onto the stack. The table (and the word table used by
//! identifier compression) belongs to this `Parser` value, which is created
//! for one symbol and dropped afterwards.
//!
//! # Layout
//!
//! - `identifier` - identifiers, word substitutions, punycode, operators
//! - `types` - standard substitutions, builtins, tuples, function types
//! - `entities` - functions, variables, subscripts, accessors, contexts
//! - `generics` - generic parameters, signatures, requirements
//! - `metadata` - metadata, witness and thunk suffixes

mod entities;
mod generics;
mod identifier;
mod metadata;
mod types;

use smallvec::SmallVec;
use tern_ir::Ident;

use crate::cursor::Cursor;
use crate::error::{DemangleError, DemangleErrorKind};
use crate::node::{Node, NodeArena, NodeId, NodeKind, Payload};
use crate::DemangleConfig;

pub(crate) type PResult<T> = Result<T, DemangleError>;

/// Maximum number of words remembered for identifier compression.
const MAX_WORDS: usize = 26;

pub(crate) struct Parser<'a> {
    cursor: Cursor<'a>,
    pub(crate) arena: NodeArena,
    stack: Vec<NodeId>,
    substitutions: Vec<NodeId>,
    words: SmallVec<[&'a str; MAX_WORDS]>,
    config: &'a DemangleConfig,
}

impl<'a> Parser<'a> {
    /// Parser over `input`, starting after `start` bytes of prefix.
    pub(crate) fn new(input: &'a str, start: usize, config: &'a DemangleConfig) -> Self {
        Parser {
            cursor: Cursor::new(input.as_bytes(), start),
            arena: NodeArena::default(),
            stack: Vec::with_capacity(16),
            substitutions: Vec::with_capacity(16),
            words: SmallVec::new(),
            config,
        }
    }

    /// Parse a complete symbol into a `Global` node.
    pub(crate) fn parse_symbol(&mut self) -> PResult<NodeId> {
        self.parse_and_push()?;

        let mut children: Vec<NodeId> = Vec::new();
        while let Some(attr) = self.pop_if(NodeKind::is_function_attr) {
            children.push(attr);
        }
        let stack = std::mem::take(&mut self.stack);
        for node in stack {
            if self.arena.kind(node) == NodeKind::Type {
                let inner = self.only_child(node, "type payload")?;
                children.push(inner);
            } else {
                children.push(node);
            }
        }
        if children.is_empty() {
            return Err(self.error(DemangleErrorKind::MissingOperand("entity")));
        }
        self.create_with(NodeKind::Global, &children)
    }

    /// Parse a bare type production into its `Type` node.
    pub(crate) fn parse_type(&mut self) -> PResult<NodeId> {
        self.parse_and_push()?;
        match self.stack.as_slice() {
            [single] if self.arena.kind(*single) == NodeKind::Type => Ok(*single),
            [] => Err(self.error(DemangleErrorKind::MissingOperand("type"))),
            other => Err(self.error(DemangleErrorKind::TrailingNodes(other.len()))),
        }
    }

    fn parse_and_push(&mut self) -> PResult<()> {
        while !self.cursor.is_eof() {
            let node = self.operator()?;
            self.push(node);
        }
        tracing::trace!(
            nodes = self.arena.len(),
            substitutions = self.substitutions.len(),
            "parsed symbol"
        );
        Ok(())
    }

    /// Demangle one operator and return the node it produces.
    fn operator(&mut self) -> PResult<NodeId> {
        let c = self.next_char()?;
        match c {
            b'A' => self.multi_substitutions(),
            b'B' => self.builtin_type(),
            b'C' => self.any_generic_type(NodeKind::Class),
            b'D' => self.type_mangling(),
            b'E' => self.extension_context(),
            b'F' => self.plain_function(),
            b'G' => self.bound_generic_type(),
            b'K' => self.create(NodeKind::ThrowsAnnotation),
            b'L' => self.local_identifier(),
            b'M' => self.metatype_suffix(),
            b'N' => {
                let ty = self.pop_type()?;
                self.create_with(NodeKind::TypeMetadata, &[ty])
            }
            b'O' => self.any_generic_type(NodeKind::Enum),
            b'P' => self.any_generic_type(NodeKind::Protocol),
            b'Q' => self.archetype(),
            b'R' => self.generic_requirement(),
            b'S' => self.standard_substitution(),
            b'T' => self.thunk(),
            b'V' => self.any_generic_type(NodeKind::Structure),
            b'W' => self.witness(),
            b'X' => self.special_type(),
            b'Y' => self.type_annotation(),
            b'Z' => {
                let entity = self.pop_if(NodeKind::is_entity);
                let entity = self.require(entity, "entity")?;
                self.create_with(NodeKind::Static, &[entity])
            }
            b'a' => self.any_generic_type(NodeKind::TypeAlias),
            b'c' => self.pop_function_type(NodeKind::FunctionType),
            b'd' => self.create(NodeKind::VariadicMarker),
            b'f' => self.function_entity(),
            b'h' => self.wrap_type(NodeKind::Shared),
            b'i' => self.subscript(),
            b'l' => self.generic_signature(false),
            b'm' => {
                let ty = self.pop_type()?;
                let meta = self.create_with(NodeKind::Metatype, &[ty])?;
                self.create_type(meta)
            }
            b'n' => self.wrap_type(NodeKind::Owned),
            b'o' => self.operator_identifier(),
            b'p' => self.protocol_list_type(),
            b'q' => {
                let param = self.generic_param_index()?;
                self.create_type(param)
            }
            b'r' => self.generic_signature(true),
            b's' => self.create_text(NodeKind::Module, Ident::new(tern_ir::STDLIB_MODULE)),
            b't' => self.pop_tuple(),
            b'u' => self.generic_type(),
            b'v' => self.variable(),
            b'x' => {
                let param = self.dependent_generic_param(0, 0)?;
                self.create_type(param)
            }
            b'y' => self.create(NodeKind::EmptyList),
            b'z' => self.wrap_type(NodeKind::InOut),
            b'_' => self.create(NodeKind::FirstElementMarker),
            b'.' => {
                self.cursor.push_back();
                let rest = self.cursor.rest();
                let text = std::str::from_utf8(rest)
                    .map_err(|_| self.error(DemangleErrorKind::InvalidUtf8))?;
                self.create_text(NodeKind::Suffix, Ident::new(text))
            }
            b'0'..=b'9' => {
                self.cursor.push_back();
                self.identifier()
            }
            other => Err(self.unexpected(other)),
        }
    }

    // ── Errors ──────────────────────────────────────────────────

    pub(crate) fn error(&self, kind: DemangleErrorKind) -> DemangleError {
        DemangleError::new(self.cursor.pos(), self.cursor.consumed(), kind)
    }

    /// Error for the byte just consumed.
    fn unexpected(&self, byte: u8) -> DemangleError {
        let pos = self.cursor.pos().saturating_sub(1);
        let consumed = self.cursor.consumed();
        DemangleError::new(
            pos,
            &consumed[..pos.min(consumed.len())],
            DemangleErrorKind::UnexpectedChar(char::from(byte)),
        )
    }

    fn require(&self, node: Option<NodeId>, what: &'static str) -> PResult<NodeId> {
        node.ok_or_else(|| self.error(DemangleErrorKind::MissingOperand(what)))
    }

    // ── Input ───────────────────────────────────────────────────

    fn next_char(&mut self) -> PResult<u8> {
        self.cursor
            .next()
            .ok_or_else(|| self.error(DemangleErrorKind::UnexpectedEnd))
    }

    /// Parse a decimal number, `None` if no digit follows.
    fn natural(&mut self) -> PResult<Option<u64>> {
        let digits = self.cursor.digits();
        if digits.is_empty() {
            return Ok(None);
        }
        let mut value: u64 = 0;
        for &digit in digits {
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(u64::from(digit - b'0')))
                .ok_or_else(|| self.error(DemangleErrorKind::NumberOverflow))?;
        }
        Ok(Some(value))
    }

    /// Parse `_` (0) or `<n>_` (n + 1).
    fn index(&mut self) -> PResult<u64> {
        if self.cursor.next_if(b'_') {
            return Ok(0);
        }
        if let Some(n) = self.natural()? {
            if self.cursor.next_if(b'_') {
                return n
                    .checked_add(1)
                    .ok_or_else(|| self.error(DemangleErrorKind::NumberOverflow));
            }
        }
        match self.cursor.peek() {
            Some(byte) => Err(self.error(DemangleErrorKind::UnexpectedChar(char::from(byte)))),
            None => Err(self.error(DemangleErrorKind::UnexpectedEnd)),
        }
    }

    fn index_u32(&mut self) -> PResult<u32> {
        let index = self.index()?;
        u32::try_from(index).map_err(|_| self.error(DemangleErrorKind::NumberOverflow))
    }

    // ── Node construction ───────────────────────────────────────

    fn alloc(&mut self, node: Node) -> PResult<NodeId> {
        if self.arena.len() >= self.config.max_nodes {
            return Err(self.error(DemangleErrorKind::TooLarge(self.config.max_nodes)));
        }
        Ok(self.arena.alloc(node))
    }

    fn create(&mut self, kind: NodeKind) -> PResult<NodeId> {
        self.alloc(Node {
            kind,
            payload: Payload::None,
            children: SmallVec::new(),
        })
    }

    fn create_with(&mut self, kind: NodeKind, children: &[NodeId]) -> PResult<NodeId> {
        self.alloc(Node {
            kind,
            payload: Payload::None,
            children: SmallVec::from_slice(children),
        })
    }

    fn create_text(&mut self, kind: NodeKind, text: Ident) -> PResult<NodeId> {
        self.alloc(Node {
            kind,
            payload: Payload::Text(text),
            children: SmallVec::new(),
        })
    }

    fn create_index(&mut self, kind: NodeKind, index: u64) -> PResult<NodeId> {
        self.alloc(Node {
            kind,
            payload: Payload::Index(index),
            children: SmallVec::new(),
        })
    }

    fn create_type(&mut self, child: NodeId) -> PResult<NodeId> {
        self.create_with(NodeKind::Type, &[child])
    }

    /// Copy of `node` with a different kind.
    fn change_kind(&mut self, node: NodeId, kind: NodeKind) -> PResult<NodeId> {
        let mut copy = self.arena.get(node).clone();
        copy.kind = kind;
        self.alloc(copy)
    }

    fn only_child(&self, node: NodeId, what: &'static str) -> PResult<NodeId> {
        match self.arena.children(node) {
            [child] => Ok(*child),
            _ => Err(self.error(DemangleErrorKind::MissingOperand(what))),
        }
    }

    // ── Stack ───────────────────────────────────────────────────

    fn push(&mut self, node: NodeId) {
        self.stack.push(node);
    }

    fn pop(&mut self) -> Option<NodeId> {
        self.stack.pop()
    }

    /// Pop the top node only if it has `kind`.
    fn pop_kind(&mut self, kind: NodeKind) -> Option<NodeId> {
        self.pop_if(|k| k == kind)
    }

    /// Pop the top node only if its kind satisfies `pred`.
    fn pop_if(&mut self, pred: impl Fn(NodeKind) -> bool) -> Option<NodeId> {
        let &top = self.stack.last()?;
        if pred(self.arena.kind(top)) {
            self.stack.pop()
        } else {
            None
        }
    }

    fn pop_type(&mut self) -> PResult<NodeId> {
        let ty = self.pop_kind(NodeKind::Type);
        self.require(ty, "type")
    }

    /// Pop a `Type` and return the node it wraps.
    fn pop_type_child(&mut self) -> PResult<NodeId> {
        let ty = self.pop_type()?;
        self.only_child(ty, "type payload")
    }

    /// Pop a `Type` wrapping a nominal declaration and return the declaration.
    fn pop_any_generic(&mut self) -> PResult<NodeId> {
        let child = self.pop_type_child()?;
        if self.arena.kind(child).is_any_generic() {
            Ok(child)
        } else {
            Err(self.error(DemangleErrorKind::MissingOperand("nominal type")))
        }
    }

    fn wrap_type(&mut self, kind: NodeKind) -> PResult<NodeId> {
        let inner = self.pop_type_child()?;
        let wrapped = self.create_with(kind, &[inner])?;
        self.create_type(wrapped)
    }

    fn add_substitution(&mut self, node: NodeId) {
        self.substitutions.push(node);
    }

    fn substitution(&self, index: usize) -> PResult<NodeId> {
        self.substitutions
            .get(index)
            .copied()
            .ok_or_else(|| self.error(DemangleErrorKind::InvalidSubstitution(index)))
    }

    fn check_repeat(&self, count: u64) -> PResult<()> {
        if count > u64::from(self.config.max_repeat) {
            return Err(self.error(DemangleErrorKind::RepeatCount(count)));
        }
        Ok(())
    }

    /// `A`: one or more back-references into the substitution table.
    fn multi_substitutions(&mut self) -> PResult<NodeId> {
        let mut repeat: Option<u64> = None;
        loop {
            let c = self.next_char()?;
            match c {
                b'a'..=b'z' => {
                    let node = self.repeat_substitution(repeat, usize::from(c - b'a'))?;
                    self.push(node);
                    repeat = None;
                }
                b'A'..=b'Z' => {
                    return self.repeat_substitution(repeat, usize::from(c - b'A'));
                }
                b'_' => {
                    let base = repeat.map_or(Some(26), |n| n.checked_add(27));
                    let index = base
                        .and_then(|i| usize::try_from(i).ok())
                        .ok_or_else(|| self.error(DemangleErrorKind::NumberOverflow))?;
                    return self.substitution(index);
                }
                b'0'..=b'9' => {
                    self.cursor.push_back();
                    repeat = self.natural()?;
                }
                other => return Err(self.unexpected(other)),
            }
        }
    }

    /// Push `count - 1` copies of a substitution and return the last one.
    fn repeat_substitution(&mut self, count: Option<u64>, index: usize) -> PResult<NodeId> {
        let node = self.substitution(index)?;
        if let Some(count) = count {
            self.check_repeat(count)?;
            for _ in 1..count {
                self.push(node);
            }
        }
        Ok(node)
    }

    // ── Contexts and conformances ───────────────────────────────

    /// Pop a module, turning a bare identifier into one.
    fn pop_module(&mut self) -> PResult<Option<NodeId>> {
        if let Some(ident) = self.pop_kind(NodeKind::Identifier) {
            return self.change_kind(ident, NodeKind::Module).map(Some);
        }
        Ok(self.pop_kind(NodeKind::Module))
    }

    fn pop_context(&mut self) -> PResult<NodeId> {
        if let Some(module) = self.pop_module()? {
            return Ok(module);
        }
        if let Some(ty) = self.pop_kind(NodeKind::Type) {
            let child = self.only_child(ty, "context type")?;
            if !self.arena.kind(child).is_context() {
                return Err(self.error(DemangleErrorKind::MissingOperand("context")));
            }
            return Ok(child);
        }
        let context = self.pop_if(NodeKind::is_context);
        self.require(context, "context")
    }

    fn pop_decl_name(&mut self) -> PResult<NodeId> {
        let name = self.pop_if(NodeKind::is_decl_name);
        self.require(name, "declaration name")
    }

    /// Pop a protocol, either as a `Type` or as name plus context.
    fn pop_protocol(&mut self) -> PResult<NodeId> {
        if let Some(ty) = self.pop_kind(NodeKind::Type) {
            let child = self.only_child(ty, "protocol")?;
            if self.arena.kind(child) != NodeKind::Protocol {
                return Err(self.error(DemangleErrorKind::MissingOperand("protocol")));
            }
            return Ok(ty);
        }
        let name = self.pop_decl_name()?;
        let context = self.pop_context()?;
        let proto = self.create_with(NodeKind::Protocol, &[context, name])?;
        self.create_type(proto)
    }

    /// Pop `type protocol module` into a `ProtocolConformance` node.
    fn pop_protocol_conformance(&mut self) -> PResult<NodeId> {
        let signature = self.pop_kind(NodeKind::DependentGenericSignature);
        let module = self.pop_module()?;
        let module = self.require(module, "conformance module")?;
        let protocol = self.pop_protocol()?;
        let mut ty = self.pop_type()?;
        if let Some(signature) = signature {
            let generic = self.create_with(NodeKind::DependentGenericType, &[signature, ty])?;
            ty = self.create_type(generic)?;
        }
        self.create_with(NodeKind::ProtocolConformance, &[ty, protocol, module])
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
