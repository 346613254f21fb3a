use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::config::Config;
use crate::document::{Document, DocumentKind};
use crate::error::{PostureError, Result};
use crate::loader;
use crate::registry::{Context, Input, InputKind, Registry};

/// Where the dispatcher obtains compliance documents.
pub trait DocumentSource {
    fn load(&self, path: &Path) -> Result<Document>;
}

/// Reads documents from the filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSource;

impl DocumentSource for FsSource {
    fn load(&self, path: &Path) -> Result<Document> {
        loader::load(path)
    }
}

/// One invocation: an operation name plus its inputs.
#[derive(Debug, Clone)]
pub struct Request {
    pub operation: String,
    pub primary: PathBuf,
    pub scan: Option<PathBuf>,
}

impl Request {
    pub fn new(operation: impl Into<String>, primary: impl Into<PathBuf>) -> Self {
        Self {
            operation: operation.into(),
            primary: primary.into(),
            scan: None,
        }
    }

    pub fn with_scan(mut self, scan: impl Into<PathBuf>) -> Self {
        self.scan = Some(scan.into());
        self
    }
}

/// How a dispatched request ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// The loaded document does not carry what the operation needs.
    NotApplicable {
        operation: String,
        kind: DocumentKind,
    },
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Completed => write!(f, "completed"),
            Outcome::NotApplicable { operation, kind } => write!(
                f,
                "command '{operation}' is not applicable to this {} document",
                kind.label()
            ),
        }
    }
}

/// Decided before any file is touched.
enum Plan<'a> {
    ScanOnly,
    Document,
    Merge(&'a Path),
}

/// Routes a request to its handler after the load and applicability checks.
pub struct Dispatcher {
    registry: Registry,
    config: Config,
    source: Box<dyn DocumentSource>,
    verbose: bool,
}

impl Dispatcher {
    pub fn new(registry: Registry, config: Config) -> Self {
        Self {
            registry,
            config,
            source: Box::new(FsSource),
            verbose: false,
        }
    }

    /// When set, handler faults are left for the caller to report in full.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_source(mut self, source: impl DocumentSource + 'static) -> Self {
        self.source = Box::new(source);
        self
    }

    pub fn run(&self, request: &Request, out: &mut dyn Write) -> Result<Outcome> {
        let binding = self.registry.resolve(&request.operation)?;

        let plan = match (binding.input, request.scan.as_deref()) {
            (InputKind::ScanOnly, _) => Plan::ScanOnly,
            (InputKind::Document, _) => Plan::Document,
            (InputKind::DocumentWithScan, Some(scan)) => Plan::Merge(scan),
            (InputKind::DocumentWithScan, None) => {
                return Err(PostureError::usage(format!(
                    "command '{}' requires a scan file (--scan <path>)",
                    request.operation
                )));
            }
        };

        let mut ctx = Context {
            config: &self.config,
            out,
            now: Local::now(),
        };

        let document = match plan {
            Plan::ScanOnly => None,
            Plan::Document | Plan::Merge(_) => Some(self.source.load(&request.primary)?),
        };

        let input = match (&plan, document.as_ref()) {
            (Plan::ScanOnly, _) => Input::Scan {
                path: &request.primary,
            },
            (Plan::Document, Some(document)) => Input::Document { document },
            (Plan::Merge(scan), Some(document)) => Input::Merge {
                document,
                scan: *scan,
            },
            (_, None) => {
                return Err(PostureError::validation("no document loaded"));
            }
        };

        if let Ok(document) = input.document() {
            if !binding.applies_to(document) {
                tracing::info!(
                    "command '{}' not applicable to {} document",
                    request.operation,
                    document.kind().label()
                );
                return Ok(Outcome::NotApplicable {
                    operation: request.operation.clone(),
                    kind: document.kind(),
                });
            }
        }

        tracing::debug!(operation = %request.operation, "running handler");
        match (binding.handler)(&mut ctx, input) {
            Ok(()) => Ok(Outcome::Completed),
            Err(e) => Err(self.fault(&request.operation, e)),
        }
    }

    /// Input errors raised from inside a handler keep their category;
    /// everything else becomes a handler fault.
    fn fault(&self, operation: &str, source: anyhow::Error) -> PostureError {
        let source = match source.downcast::<PostureError>() {
            Ok(e) => return e,
            Err(source) => source,
        };
        if !self.verbose {
            tracing::error!("error running '{operation}': {source:#}");
        }
        PostureError::Handler {
            operation: operation.to_string(),
            source,
        }
    }
}
