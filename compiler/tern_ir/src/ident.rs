//! Shared identifier text.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// An identifier as it appears in a demangled symbol.
///
/// Cloning is a reference-count bump. Equality, ordering and hashing are by
/// text, so identifiers produced by independent parses compare equal.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Ident(Arc<str>);

impl Ident {
    pub fn new(text: &str) -> Self {
        Ident(Arc::from(text))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the identifier contains characters outside ASCII.
    ///
    /// Hosts that cannot spell such names must rename them.
    pub fn is_non_ascii(&self) -> bool {
        !self.0.is_ascii()
    }
}

impl fmt::Debug for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Ident {
    fn from(text: &str) -> Self {
        Ident::new(text)
    }
}

impl From<String> for Ident {
    fn from(text: String) -> Self {
        Ident(Arc::from(text))
    }
}

impl Borrow<str> for Ident {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Ident {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Ident {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}
