//! Small helpers for PDF object syntax.

use std::fmt;

/// Escape a literal string body: backslash and both parentheses.
pub fn escape_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '(' | ')') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// `(text)` with escaping applied.
pub fn literal(text: &str) -> String {
    format!("({})", escape_string(text))
}

/// `n 0 R`
pub fn reference(id: u32) -> String {
    format!("{id} 0 R")
}

/// Format a length in points with two decimals.
pub fn points(value: f64) -> String {
    format!("{value:.2}")
}

/// Dictionary with insertion-ordered keys.
///
/// Values are already-serialized PDF tokens; keys are written with a leading
/// slash.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dictionary {
    entries: Vec<(&'static str, String)>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    #[inline]
    pub fn with_opt(self, key: &'static str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.with(key, value),
            None => self,
        }
    }

    /// Insert or replace `key`, keeping its original position on replace.
    pub fn set(&mut self, key: &'static str, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }
}

impl fmt::Display for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<<")?;
        for (key, value) in &self.entries {
            write!(f, " /{key} {value}")?;
        }
        f.write_str(" >>")
    }
}
