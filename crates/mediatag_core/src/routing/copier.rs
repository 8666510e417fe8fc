//! Buffered file copy with batch-wide byte progress.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use super::errors::{RoutingError, RoutingResult};

pub const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Cumulative copy progress across every file in a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct CopyProgress {
    pub file_name: String,
    pub copied_bytes: u64,
    pub total_bytes: u64,
}

impl CopyProgress {
    pub fn percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 100.0;
        }
        (self.copied_bytes as f64 / self.total_bytes as f64 * 100.0).min(100.0)
    }
}

/// Copies files one after another, tracking bytes against a fixed total.
pub struct BatchCopier<F: FnMut(&CopyProgress)> {
    total_bytes: u64,
    copied_bytes: u64,
    on_progress: F,
}

impl<F: FnMut(&CopyProgress)> BatchCopier<F> {
    pub fn new(total_bytes: u64, on_progress: F) -> Self {
        Self {
            total_bytes,
            copied_bytes: 0,
            on_progress,
        }
    }

    pub fn copied_bytes(&self) -> u64 {
        self.copied_bytes
    }

    /// Copy `src` to `dest`, creating parent directories.
    ///
    /// A partially written destination is removed on failure.
    pub fn copy(&mut self, src: &Path, dest: &Path) -> RoutingResult<u64> {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                RoutingError::io(format!("creating {}", parent.display()), e)
            })?;
        }

        let result = self.copy_inner(src, dest);
        if result.is_err() {
            let _ = std::fs::remove_file(dest);
        }
        result
    }

    fn copy_inner(&mut self, src: &Path, dest: &Path) -> RoutingResult<u64> {
        let file_name = dest
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mut reader = File::open(src)
            .map_err(|e| RoutingError::io(format!("opening {}", src.display()), e))?;
        let mut writer = File::create(dest)
            .map_err(|e| RoutingError::io(format!("creating {}", dest.display()), e))?;

        let mut buf = vec![0u8; COPY_BUFFER_SIZE];
        let mut written = 0u64;
        loop {
            let n = reader
                .read(&mut buf)
                .map_err(|e| RoutingError::io(format!("reading {}", src.display()), e))?;
            if n == 0 {
                break;
            }
            writer
                .write_all(&buf[..n])
                .map_err(|e| RoutingError::io(format!("writing {}", dest.display()), e))?;
            written += n as u64;
            self.copied_bytes += n as u64;
            (self.on_progress)(&CopyProgress {
                file_name: file_name.clone(),
                copied_bytes: self.copied_bytes,
                total_bytes: self.total_bytes,
            });
        }
        writer
            .sync_all()
            .map_err(|e| RoutingError::io(format!("flushing {}", dest.display()), e))?;
        Ok(written)
    }
}
