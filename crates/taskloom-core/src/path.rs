use std::path::{Path, PathBuf};

/// Resolve a tool-supplied path to one relative to the sandboxed workspace.
///
/// Per spec §4.A: absolute `/app/…`-style paths (the FM is told its sandbox
/// root is `/app`) are reinterpreted as `./basename(path)`, since the actual
/// workspace directory lives elsewhere on disk. Already-relative paths pass
/// through unchanged.
pub fn to_workspace_relative(path: &str) -> PathBuf {
    if path.starts_with('/') {
        let basename = Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string());
        PathBuf::from(basename)
    } else {
        PathBuf::from(path)
    }
}

/// Join a workspace-relative, tool-supplied path onto the workspace root.
pub fn resolve_in_workspace(workspace: &Path, path: &str) -> PathBuf {
    workspace.join(to_workspace_relative(path))
}
