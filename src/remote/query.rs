//! Structured Drive search queries
//!
//! Drive's `q` parameter is a small query language with single-quoted
//! string literals. Values are never interpolated raw: every literal goes
//! through [`quote`], which escapes `\` and `'`.

use std::fmt;

/// One condition of a Drive search query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// `'<id>' in parents`
    InParent(String),
    /// `name contains '<text>'` (Drive matches this as a name prefix)
    NameContains(String),
    /// `mimeType = '<type>'`
    MimeTypeIs(String),
    /// `trashed = false`
    NotTrashed,
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::InParent(id) => write!(f, "{} in parents", quote(id)),
            Clause::NameContains(text) => write!(f, "name contains {}", quote(text)),
            Clause::MimeTypeIs(mime) => write!(f, "mimeType = {}", quote(mime)),
            Clause::NotTrashed => f.write_str("trashed = false"),
        }
    }
}

/// A conjunction of [`Clause`]s
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriveQuery {
    clauses: Vec<Clause>,
}

impl DriveQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_parent(mut self, folder_id: impl Into<String>) -> Self {
        self.clauses.push(Clause::InParent(folder_id.into()));
        self
    }

    pub fn name_contains(mut self, text: impl Into<String>) -> Self {
        self.clauses.push(Clause::NameContains(text.into()));
        self
    }

    pub fn mime_type(mut self, mime: impl Into<String>) -> Self {
        self.clauses.push(Clause::MimeTypeIs(mime.into()));
        self
    }

    pub fn not_trashed(mut self) -> Self {
        self.clauses.push(Clause::NotTrashed);
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }
}

impl fmt::Display for DriveQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(" and ")?;
            }
            write!(f, "{}", clause)?;
        }
        Ok(())
    }
}

/// Render `value` as a Drive string literal
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        if c == '\\' || c == '\'' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
    out
}
