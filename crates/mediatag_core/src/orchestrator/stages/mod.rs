//! Concrete analysis stages.

mod face;
mod speech;

pub use face::FaceStage;
pub use speech::SpeechStage;

use std::path::Path;

use super::errors::{StageError, StageResult};

/// Fail unless `path` is an existing file.
fn require_file(what: &str, path: &Path) -> StageResult<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(StageError::file_not_found(format!(
            "{} ({})",
            path.display(),
            what
        )))
    }
}
