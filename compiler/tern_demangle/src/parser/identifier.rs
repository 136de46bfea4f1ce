//! Identifiers, word substitutions, punycode and operator names.

use tern_ir::Ident;

use super::{PResult, Parser, MAX_WORDS};
use crate::error::DemangleErrorKind;
use crate::node::{NodeId, NodeKind};
use crate::punycode;

/// Operator characters indexed by `letter - 'a'`. Blanks are invalid.
const OPERATOR_CHARS: &[u8; 26] = b"& @/= >    <*!|+?%-~   ^ .";

impl<'a> Parser<'a> {
    /// `<len><text>`, `0<words...>` or `00<len>[_]<punycode>`.
    pub(super) fn identifier(&mut self) -> PResult<NodeId> {
        let mut has_word_substs = false;
        let mut is_punycode = false;
        if self.cursor.next_if(b'0') {
            if self.cursor.next_if(b'0') {
                is_punycode = true;
            } else {
                has_word_substs = true;
            }
        }

        let mut text = String::new();
        loop {
            while has_word_substs && self.cursor.peek().is_some_and(|b| b.is_ascii_alphabetic()) {
                let c = self.next_char()?;
                let word_index = if c.is_ascii_lowercase() {
                    usize::from(c - b'a')
                } else {
                    has_word_substs = false;
                    usize::from(c - b'A')
                };
                let word = self
                    .words
                    .get(word_index)
                    .ok_or_else(|| self.error(DemangleErrorKind::InvalidWord(word_index)))?;
                text.push_str(word);
            }
            if self.cursor.next_if(b'0') {
                break;
            }

            let len = match self.natural()? {
                Some(len) if len > 0 => len,
                _ => return Err(self.error(DemangleErrorKind::MissingOperand("identifier length"))),
            };
            if is_punycode {
                self.cursor.next_if(b'_');
            }
            let len = usize::try_from(len).map_err(|_| self.error(DemangleErrorKind::NumberOverflow))?;
            let slice = self
                .cursor
                .take(len)
                .ok_or_else(|| self.error(DemangleErrorKind::UnexpectedEnd))?;

            if is_punycode {
                let decoded =
                    punycode::decode(slice).map_err(|_| self.error(DemangleErrorKind::Punycode))?;
                text.push_str(&decoded);
            } else {
                let slice = std::str::from_utf8(slice)
                    .map_err(|_| self.error(DemangleErrorKind::InvalidUtf8))?;
                text.push_str(slice);
                self.record_words(slice);
            }

            if !has_word_substs {
                break;
            }
        }

        if text.is_empty() {
            return Err(self.error(DemangleErrorKind::MissingOperand("identifier")));
        }
        let ident = self.create_text(NodeKind::Identifier, Ident::from(text))?;
        self.add_substitution(ident);
        Ok(ident)
    }

    /// Remember the words of a literal identifier slice for later `0` identifiers.
    fn record_words(&mut self, slice: &'a str) {
        let bytes = slice.as_bytes();
        let mut word_start: Option<usize> = None;
        for idx in 0..=bytes.len() {
            let c = bytes.get(idx).copied().unwrap_or(0);
            if let Some(start) = word_start {
                let prev = bytes[idx - 1];
                if is_word_end(c, prev) {
                    if idx - start >= 2 && self.words.len() < MAX_WORDS {
                        if let Some(word) = slice.get(start..idx) {
                            self.words.push(word);
                        }
                    }
                    word_start = None;
                }
            }
            if word_start.is_none() && is_word_start(c) {
                word_start = Some(idx);
            }
        }
    }

    /// `<ident> o <fixity>`: decode an operator spelled with letters.
    pub(super) fn operator_identifier(&mut self) -> PResult<NodeId> {
        let ident = self.pop_kind(NodeKind::Identifier);
        let ident = self.require(ident, "operator name")?;
        let spelled = self
            .arena
            .text(ident)
            .cloned()
            .ok_or_else(|| self.error(DemangleErrorKind::MissingOperand("operator name")))?;

        let mut op = String::with_capacity(spelled.as_str().len());
        for c in spelled.as_str().chars() {
            if !c.is_ascii() {
                op.push(c);
                continue;
            }
            let mapped = u8::try_from(c)
                .ok()
                .filter(u8::is_ascii_lowercase)
                .map(|b| OPERATOR_CHARS[usize::from(b - b'a')])
                .filter(|&b| b != b' ');
            match mapped {
                Some(b) => op.push(char::from(b)),
                None => return Err(self.error(DemangleErrorKind::UnexpectedChar(c))),
            }
        }

        let kind = match self.next_char()? {
            b'i' => NodeKind::InfixOperator,
            b'p' => NodeKind::PrefixOperator,
            b'P' => NodeKind::PostfixOperator,
            other => return Err(self.unexpected(other)),
        };
        self.create_text(kind, Ident::from(op))
    }

    /// `L`: private, local and related-entity declaration names.
    pub(super) fn local_identifier(&mut self) -> PResult<NodeId> {
        if self.cursor.next_if(b'L') {
            let discriminator = self.pop_kind(NodeKind::Identifier);
            let discriminator = self.require(discriminator, "private discriminator")?;
            let name = self.pop_decl_name()?;
            return self.create_with(NodeKind::PrivateDeclName, &[discriminator, name]);
        }
        if self.cursor.next_if(b'l') {
            let discriminator = self.pop_kind(NodeKind::Identifier);
            let discriminator = self.require(discriminator, "private discriminator")?;
            return self.create_with(NodeKind::PrivateDeclName, &[discriminator]);
        }
        if let Some(c) = self
            .cursor
            .peek()
            .filter(|c| matches!(c, b'a'..=b'j' | b'A'..=b'J'))
        {
            self.cursor.next();
            let kind = self.create_text(NodeKind::Identifier, Ident::from(char::from(c).to_string()))?;
            let name = self.pop();
            let name = self.require(name, "related entity name")?;
            return self.create_with(NodeKind::RelatedEntityDeclName, &[kind, name]);
        }
        let index = self.index()?;
        let discriminator = self.create_index(NodeKind::Number, index)?;
        let name = self.pop_decl_name()?;
        self.create_with(NodeKind::LocalDeclName, &[discriminator, name])
    }
}

fn is_word_start(c: u8) -> bool {
    !c.is_ascii_digit() && c != b'_' && c != 0
}

fn is_word_end(c: u8, prev: u8) -> bool {
    c == b'_' || c == 0 || (!prev.is_ascii_uppercase() && c.is_ascii_uppercase())
}
