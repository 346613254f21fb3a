pub mod config;
pub mod dispatch;
pub mod document;
pub mod error;
pub mod graph;
pub mod ledger;
pub mod loader;
pub mod registry;
pub mod scan;
pub mod summary;
pub mod trends;
pub mod validators;

pub use config::Config;
pub use dispatch::{Dispatcher, DocumentSource, FsSource, Outcome, Request};
pub use document::{Document, DocumentKind};
pub use error::{PostureError, Result};
pub use graph::ComponentGraph;
pub use ledger::{ActionItem, ItemStatus, MergeOutcome};
pub use registry::{Binding, Context, Handler, Input, InputKind, Registry};
pub use scan::{Finding, ScanReport, Severity};
pub use summary::{PoamStatus, ScanSummary};
pub use trends::TrendSeries;
