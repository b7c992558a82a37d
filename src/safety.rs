use std::path::{Path, PathBuf};
use thiserror::Error;

/// Keeps tool-driven edits inside a workspace root and out of directories
/// that must never be rewritten (VCS metadata, build output, vendored code).
#[derive(Debug, Clone)]
pub struct WorkspaceGuard {
    /// Absolute path to workspace root
    workspace_root: PathBuf,
    /// Canonical paths to forbidden directories
    forbidden_paths: Vec<PathBuf>,
}

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("Path is outside workspace: {} (workspace: {})", .path.display(), .workspace.display())]
    OutsideWorkspace { path: PathBuf, workspace: PathBuf },

    #[error("Path is in forbidden directory: {} (forbidden: {})", .path.display(), .forbidden.display())]
    ForbiddenPath { path: PathBuf, forbidden: PathBuf },

    #[error("Failed to resolve path {}: {source}", .path.display())]
    Canonicalize {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SafetyError {
    /// True when the path could not be resolved because it does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            SafetyError::Canonicalize { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}

fn canonicalize(path: &Path) -> Result<PathBuf, SafetyError> {
    path.canonicalize()
        .map_err(|source| SafetyError::Canonicalize {
            path: path.to_path_buf(),
            source,
        })
}

impl WorkspaceGuard {
    /// Create a guard rooted at `workspace_root`.
    ///
    /// `.git` under the root is always forbidden. `forbidden` entries are
    /// resolved against the root; entries that do not exist yet are skipped.
    pub fn new<P: AsRef<Path>>(
        workspace_root: impl AsRef<Path>,
        forbidden: &[P],
    ) -> Result<Self, SafetyError> {
        let workspace_root = canonicalize(workspace_root.as_ref())?;

        let forbidden_paths = std::iter::once(Path::new(".git"))
            .chain(forbidden.iter().map(|dir| dir.as_ref()))
            .filter_map(|dir| workspace_root.join(dir).canonicalize().ok())
            .collect();

        Ok(Self {
            workspace_root,
            forbidden_paths,
        })
    }

    /// Check if a path is safe to edit.
    ///
    /// Relative paths resolve against the workspace root. Returns the
    /// canonicalized absolute path if safe.
    pub fn validate_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, SafetyError> {
        let path = path.as_ref();

        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        };

        // Resolves symlinks and `..` components before the boundary check
        let canonical = canonicalize(&absolute)?;

        self.check_canonical(&canonical)?;

        Ok(canonical)
    }

    fn check_canonical(&self, canonical: &Path) -> Result<(), SafetyError> {
        if !canonical.starts_with(&self.workspace_root) {
            return Err(SafetyError::OutsideWorkspace {
                path: canonical.to_path_buf(),
                workspace: self.workspace_root.clone(),
            });
        }

        for forbidden in &self.forbidden_paths {
            if canonical.starts_with(forbidden) {
                return Err(SafetyError::ForbiddenPath {
                    path: canonical.to_path_buf(),
                    forbidden: forbidden.clone(),
                });
            }
        }

        Ok(())
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const NONE: &[&str] = &[];

    #[test]
    fn test_validate_path_inside_workspace() {
        let temp_dir = tempfile::tempdir().unwrap();
        let workspace = temp_dir.path();
        let guard = WorkspaceGuard::new(workspace, NONE).unwrap();

        let file = workspace.join("src/app.py");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, b"").unwrap();

        assert!(guard.validate_path(&file).is_ok());
    }

    #[test]
    fn test_validate_path_outside_workspace() {
        let temp_dir = tempfile::tempdir().unwrap();
        let workspace = temp_dir.path().join("workspace");
        fs::create_dir_all(&workspace).unwrap();
        let guard = WorkspaceGuard::new(&workspace, NONE).unwrap();

        let outside = temp_dir.path().join("outside.py");
        fs::write(&outside, b"").unwrap();

        let result = guard.validate_path(&outside);
        assert!(matches!(result, Err(SafetyError::OutsideWorkspace { .. })));
    }

    #[test]
    fn test_git_directory_is_always_forbidden() {
        let temp_dir = tempfile::tempdir().unwrap();
        let workspace = temp_dir.path();
        fs::create_dir_all(workspace.join(".git")).unwrap();
        fs::write(workspace.join(".git/config"), b"").unwrap();

        let guard = WorkspaceGuard::new(workspace, NONE).unwrap();
        let result = guard.validate_path(".git/config");
        assert!(matches!(result, Err(SafetyError::ForbiddenPath { .. })));
    }

    #[test]
    fn test_configured_forbidden_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let workspace = temp_dir.path();
        let file = workspace.join("target/debug/out.txt");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, b"").unwrap();

        let guard = WorkspaceGuard::new(workspace, &["target", "does-not-exist"]).unwrap();
        let result = guard.validate_path(&file);
        assert!(matches!(result, Err(SafetyError::ForbiddenPath { .. })));
    }

    #[test]
    fn test_missing_file_reports_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();
        let guard = WorkspaceGuard::new(temp_dir.path(), NONE).unwrap();

        let err = guard.validate_path("nope.txt").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    #[cfg(unix)]
    fn test_validate_symlink_escape() {
        use std::os::unix::fs::symlink;

        let temp_dir = tempfile::tempdir().unwrap();
        let workspace = temp_dir.path().join("workspace");
        fs::create_dir_all(&workspace).unwrap();

        let outside = temp_dir.path().join("outside.py");
        fs::write(&outside, b"").unwrap();

        let link = workspace.join("escape.py");
        symlink(&outside, &link).unwrap();

        let guard = WorkspaceGuard::new(&workspace, NONE).unwrap();
        let result = guard.validate_path(&link);

        assert!(matches!(result, Err(SafetyError::OutsideWorkspace { .. })));
    }
}
