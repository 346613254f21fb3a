use std::path::Path;

use serde_json::Value;

use crate::document::Document;
use crate::error::{PostureError, Result};

/// Load a compliance document from disk and classify it.
///
/// Fails with `NotFound` when the path does not resolve, `Format` when the
/// content is not JSON, and `Validation` when the tree carries no recognized
/// marker (or more than one).
pub fn load(path: &Path) -> Result<Document> {
    let document = read_and_classify(path);
    match &document {
        Ok(doc) => tracing::info!(
            "loaded OSCAL {} from {}",
            doc.kind().label(),
            path.display()
        ),
        Err(e) => tracing::error!("error loading file {}: {e}", path.display()),
    }
    document
}

fn read_and_classify(path: &Path) -> Result<Document> {
    if !path.exists() {
        return Err(PostureError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path).map_err(|e| PostureError::Format {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let tree: Value = serde_json::from_str(&content).map_err(|e| PostureError::Format {
        path: path.to_path_buf(),
        message: format!("invalid JSON: {e}"),
    })?;
    Document::from_tree(tree)
}
