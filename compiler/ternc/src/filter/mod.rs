//! Include/exclude name patterns.
//!
//! Patterns match qualified declaration names such as `Shapes.Circle.area`.
//! `*` matches any run of characters, including dots; every other character
//! matches itself. A pattern covers the whole name; use `*Circle*` to match
//! anywhere inside it. A name is kept unless an exclude pattern matches it, and
//! an include pattern always keeps it.

use tern_ir::Declaration;

/// One `*`-wildcard pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamePattern {
    source: String,
    parts: Vec<String>,
}

impl NamePattern {
    pub fn new(pattern: &str) -> Self {
        NamePattern {
            source: pattern.to_owned(),
            parts: pattern.split('*').map(str::to_owned).collect(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, name: &str) -> bool {
        let Some((first, rest)) = self.parts.split_first() else {
            return name.is_empty();
        };
        let Some(mut remaining) = name.strip_prefix(first.as_str()) else {
            return false;
        };
        let Some((last, middle)) = rest.split_last() else {
            // No wildcard at all.
            return remaining.is_empty();
        };
        for part in middle {
            match remaining.find(part.as_str()) {
                Some(at) => remaining = &remaining[at + part.len()..],
                None => return false,
            }
        }
        remaining.len() >= last.len() && remaining.ends_with(last.as_str())
    }
}

/// Include and exclude pattern lists.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NameFilter {
    includes: Vec<NamePattern>,
    excludes: Vec<NamePattern>,
}

impl NameFilter {
    pub fn new<I, E>(includes: I, excludes: E) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        NameFilter {
            includes: includes
                .into_iter()
                .map(|p| NamePattern::new(p.as_ref()))
                .collect(),
            excludes: excludes
                .into_iter()
                .map(|p| NamePattern::new(p.as_ref()))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.includes.is_empty() && self.excludes.is_empty()
    }

    pub fn allows(&self, name: &str) -> bool {
        self.includes.iter().any(|pattern| pattern.matches(name))
            || !self.excludes.iter().any(|pattern| pattern.matches(name))
    }

    pub fn allows_decl(&self, decl: &Declaration) -> bool {
        self.is_empty() || self.allows(&qualified_name(decl))
    }
}

/// `Module.Owner.Inner.member`, or `Module.Owner` for unnamed members.
pub fn qualified_name(decl: &Declaration) -> String {
    let mut name = decl.context.module.to_string();
    for segment in &decl.context.path {
        name.push('.');
        name.push_str(segment.name.as_str());
    }
    if let Some(member) = &decl.name {
        name.push('.');
        name.push_str(member.text.as_str());
    }
    name
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap to panic on unexpected state")]
mod tests;
