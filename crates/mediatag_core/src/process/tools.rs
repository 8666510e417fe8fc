//! Locating external executables.

use std::path::{Path, PathBuf};

use super::errors::{ProcessError, ProcessResult};

/// Directories searched before `PATH`.
pub const DEFAULT_SEARCH_DIRS: &[&str] = &["/opt/homebrew/bin", "/usr/local/bin", "/usr/bin"];

/// Whether `path` is a regular file the current user may execute.
pub fn is_executable(path: &Path) -> bool {
    let Ok(meta) = std::fs::metadata(path) else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

/// Resolve an executable.
///
/// Order: `configured` (if set, it must exist), then each of
/// `search_dirs`, then every entry of `PATH`.
pub fn find_executable(
    name: &str,
    configured: Option<&Path>,
    search_dirs: &[PathBuf],
) -> ProcessResult<PathBuf> {
    if let Some(path) = configured {
        if is_executable(path) {
            return Ok(path.to_path_buf());
        }
        return Err(ProcessError::tool_not_found(name, vec![path.to_path_buf()]));
    }

    let path_dirs: Vec<PathBuf> = std::env::var_os("PATH")
        .map(|p| std::env::split_paths(&p).collect())
        .unwrap_or_default();

    let mut searched = Vec::new();
    for dir in search_dirs.iter().chain(path_dirs.iter()) {
        let candidate = dir.join(name);
        if is_executable(&candidate) {
            tracing::debug!("Found {} at {}", name, candidate.display());
            return Ok(candidate);
        }
        searched.push(dir.clone());
    }

    Err(ProcessError::tool_not_found(name, searched))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::tempdir;

    fn make_tool(dir: &Path, name: &str, mode: u32) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode)).unwrap();
        path
    }

    #[test]
    fn search_dirs_take_priority() {
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        make_tool(second.path(), "mt-fake-tool", 0o755);
        let expected = make_tool(first.path(), "mt-fake-tool", 0o755);

        let found = find_executable(
            "mt-fake-tool",
            None,
            &[first.path().to_path_buf(), second.path().to_path_buf()],
        )
        .unwrap();
        assert_eq!(found, expected);
    }

    #[test]
    fn skips_non_executable_files() {
        let dir = tempdir().unwrap();
        make_tool(dir.path(), "mt-not-exec", 0o644);
        let err = find_executable("mt-not-exec", None, &[dir.path().to_path_buf()]).unwrap_err();
        assert!(matches!(err, ProcessError::ToolNotFound { .. }));
    }

    #[test]
    fn configured_path_must_exist() {
        let dir = tempdir().unwrap();
        let tool = make_tool(dir.path(), "ffmpeg", 0o755);
        assert_eq!(find_executable("ffmpeg", Some(&tool), &[]).unwrap(), tool);

        let missing = dir.path().join("missing");
        assert!(find_executable("ffmpeg", Some(&missing), &[]).is_err());
    }
}
