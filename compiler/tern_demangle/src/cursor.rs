//! Byte cursor over a mangled symbol.
//!
//! Positions are absolute offsets into the whole symbol (prefix included), so
//! error offsets point at the offending byte of the original input.

#[derive(Clone, Copy, Debug)]
pub(crate) struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(bytes: &'a [u8], start: usize) -> Self {
        Cursor { bytes, pos: start }
    }

    #[inline]
    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub(crate) fn is_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    #[inline]
    pub(crate) fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    #[inline]
    pub(crate) fn next(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    /// Consume `byte` if it is next.
    #[inline]
    pub(crate) fn next_if(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Un-consume the byte just read.
    #[inline]
    pub(crate) fn push_back(&mut self) {
        debug_assert!(self.pos > 0);
        self.pos -= 1;
    }

    /// Consume exactly `len` bytes.
    pub(crate) fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(len)?;
        let slice = self.bytes.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }

    /// Consume a run of ASCII digits (possibly empty).
    pub(crate) fn digits(&mut self) -> &'a [u8] {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        &self.bytes[start..self.pos]
    }

    /// Consume everything that is left.
    pub(crate) fn rest(&mut self) -> &'a [u8] {
        let start = self.pos.min(self.bytes.len());
        self.pos = self.bytes.len();
        &self.bytes[start..]
    }

    /// Everything consumed so far, prefix included.
    pub(crate) fn consumed(&self) -> &'a [u8] {
        &self.bytes[..self.pos.min(self.bytes.len())]
    }
}
