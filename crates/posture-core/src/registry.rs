use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use anyhow::{bail, Result};
use chrono::{DateTime, Local};

use crate::config::Config;
use crate::document::{Document, DocumentKind};
use crate::error::PostureError;
use crate::validators::Validator;

/// What an operation consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// The primary path is a scan file; no compliance document is loaded.
    ScanOnly,
    /// The primary path is a compliance document.
    Document,
    /// A compliance document plus a mandatory scan file.
    DocumentWithScan,
}

/// Inputs handed to a handler after dispatch checks have passed.
#[derive(Debug, Clone, Copy)]
pub enum Input<'a> {
    Scan { path: &'a Path },
    Document { document: &'a Document },
    Merge { document: &'a Document, scan: &'a Path },
}

impl<'a> Input<'a> {
    pub fn document(&self) -> Result<&'a Document> {
        match *self {
            Input::Document { document } | Input::Merge { document, .. } => Ok(document),
            Input::Scan { .. } => bail!("operation expects a compliance document"),
        }
    }

    pub fn scan_path(&self) -> Result<&'a Path> {
        match *self {
            Input::Scan { path } => Ok(path),
            Input::Merge { scan, .. } => Ok(scan),
            Input::Document { .. } => bail!("operation expects a scan file"),
        }
    }
}

/// Everything a handler may touch besides its inputs.
pub struct Context<'a> {
    pub config: &'a Config,
    pub out: &'a mut dyn Write,
    /// Timestamp for generated file names and `last-modified` stamps.
    pub now: DateTime<Local>,
}

pub type Handler = fn(&mut Context<'_>, Input<'_>) -> Result<()>;

/// An operation's capability pair plus the declarations dispatch checks.
#[derive(Clone, Copy)]
pub struct Binding {
    pub about: &'static str,
    pub input: InputKind,
    /// Document kinds the handler understands; empty means any.
    pub accepts: &'static [DocumentKind],
    pub handler: Handler,
    /// `None` means always applicable.
    pub validator: Option<Validator>,
}

impl Binding {
    pub fn new(input: InputKind, handler: Handler) -> Self {
        Self {
            about: "",
            input,
            accepts: &[],
            handler,
            validator: None,
        }
    }

    pub fn about(mut self, about: &'static str) -> Self {
        self.about = about;
        self
    }

    pub fn accepts(mut self, kinds: &'static [DocumentKind]) -> Self {
        self.accepts = kinds;
        self
    }

    pub fn validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Declared kinds first, then the structural validator.
    pub fn applies_to(&self, document: &Document) -> bool {
        let kind_ok = self.accepts.is_empty() || self.accepts.contains(&document.kind());
        kind_ok && self.validator.is_none_or(|v| v(document.tree()))
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("about", &self.about)
            .field("input", &self.input)
            .field("accepts", &self.accepts)
            .field("validated", &self.validator.is_some())
            .finish()
    }
}

/// Operation name to binding. Built once at start-up and read-only afterwards.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    bindings: BTreeMap<String, Binding>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a binding. An existing binding under the same name is replaced
    /// and returned.
    pub fn register(&mut self, name: impl Into<String>, binding: Binding) -> Option<Binding> {
        let name = name.into();
        let previous = self.bindings.insert(name.clone(), binding);
        if previous.is_some() {
            tracing::debug!("operation '{name}' rebound");
        }
        previous
    }

    pub fn resolve(&self, name: &str) -> crate::error::Result<&Binding> {
        self.bindings.get(name).ok_or_else(|| {
            PostureError::usage(format!(
                "unknown operation '{name}'. Valid operations: {}",
                self.names().join(", ")
            ))
        })
    }

    /// Registered names, sorted, each exactly once.
    pub fn names(&self) -> Vec<&str> {
        self.bindings.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Binding)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
