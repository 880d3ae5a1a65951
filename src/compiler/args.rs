//! Declarative command-line argument construction.
//!
//! The same compiler binary is invoked with different flag sets for
//! "render to memory", "render to file" and "report version". Those
//! differences stay declarative here, testable without any process
//! plumbing: an ordered list of items, a configurable flag prefix, and
//! conditional inclusion. Every item renders to its own argv element
//! (no shell is involved), so paths with spaces need no quoting.

use std::path::Path;

/// One entry in the argument list, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ArgItem {
    /// Bare flag: `{prefix}{name}`
    Flag(String),
    /// Flag followed by its value: `{prefix}{name}` `value`
    FlagValue(String, String),
    /// Flag followed by a file path: `{prefix}{name}` `path`
    FlagFile(String, String),
    /// Raw positional value, passed through untouched.
    Raw(String),
}

/// Ordered, prefix-aware argument list builder.
#[derive(Debug, Clone)]
pub struct ArgList {
    prefix: String,
    items: Vec<ArgItem>,
}

impl ArgList {
    /// Create an argument list with the given flag prefix (`-`, `--`, ...).
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            items: Vec::new(),
        }
    }

    /// Append a bare flag.
    pub fn flag(mut self, name: impl Into<String>) -> Self {
        self.items.push(ArgItem::Flag(name.into()));
        self
    }

    /// Append a bare flag only when `cond` holds.
    pub fn flag_if(self, cond: bool, name: impl Into<String>) -> Self {
        if cond { self.flag(name) } else { self }
    }

    /// Append a flag with a value.
    pub fn flag_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.items
            .push(ArgItem::FlagValue(name.into(), value.into()));
        self
    }

    /// Append a flag with a file path value.
    pub fn flag_file(mut self, name: impl Into<String>, path: &Path) -> Self {
        self.items
            .push(ArgItem::FlagFile(name.into(), path.display().to_string()));
        self
    }

    /// Append a raw positional value.
    pub fn raw(mut self, value: impl Into<String>) -> Self {
        self.items.push(ArgItem::Raw(value.into()));
        self
    }

    /// Append a positional file path.
    pub fn file(mut self, path: &Path) -> Self {
        self.items.push(ArgItem::Raw(path.display().to_string()));
        self
    }

    /// Render to the final argument vector, in declaration order.
    pub fn build(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.items.len() * 2);
        for item in &self.items {
            match item {
                ArgItem::Flag(name) => out.push(format!("{}{}", self.prefix, name)),
                ArgItem::FlagValue(name, value) => {
                    out.push(format!("{}{}", self.prefix, name));
                    out.push(value.clone());
                }
                ArgItem::FlagFile(name, path) => {
                    out.push(format!("{}{}", self.prefix, name));
                    out.push(path.clone());
                }
                ArgItem::Raw(value) => out.push(value.clone()),
            }
        }
        out
    }
}
