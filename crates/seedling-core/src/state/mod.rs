//! Stage state store: the persisted artifacts that make a run resumable.
//!
//! Two artifacts are cached between runs:
//!
//! ```text
//! filelist.txt            raw plan text, human-editable before confirmation
//! shared_dependencies.md  shared-dependency memo
//! ```
//!
//! Both live in the output directory unless the memo directory is
//! overridden. The store has no locking: one orchestrator per directory.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// A well-known persisted artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    /// The raw file-list plan.
    FileList,
    /// The shared-dependency memo.
    SharedDependencies,
}

impl Artifact {
    pub const ALL: [Artifact; 2] = [Artifact::FileList, Artifact::SharedDependencies];

    /// On-disk file name.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::FileList => "filelist.txt",
            Self::SharedDependencies => "shared_dependencies.md",
        }
    }
}

impl std::fmt::Display for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Errors from reading or writing stage artifacts.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Named-blob store scoped to a directory.
#[derive(Debug, Clone)]
pub struct StageStore {
    root: PathBuf,
    memo_dir: PathBuf,
}

impl StageStore {
    /// Store with every artifact under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            memo_dir: root.clone(),
            root,
        }
    }

    /// Keep the shared-dependency memo in `dir` instead of the root.
    pub fn with_memo_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.memo_dir = dir.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of an artifact.
    pub fn path(&self, artifact: Artifact) -> PathBuf {
        let dir = match artifact {
            Artifact::FileList => &self.root,
            Artifact::SharedDependencies => &self.memo_dir,
        };
        dir.join(artifact.file_name())
    }

    pub fn has(&self, artifact: Artifact) -> bool {
        self.path(artifact).is_file()
    }

    pub fn load(&self, artifact: Artifact) -> Result<String, StateError> {
        let path = self.path(artifact);
        std::fs::read_to_string(&path).map_err(|source| StateError::Read { path, source })
    }

    /// Load an artifact, or `None` when it has not been persisted.
    pub fn load_optional(&self, artifact: Artifact) -> Result<Option<String>, StateError> {
        if self.has(artifact) {
            self.load(artifact).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Persist an artifact, creating missing directories.
    pub fn save(&self, artifact: Artifact, text: &str) -> Result<(), StateError> {
        let path = self.path(artifact);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StateError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&path, text).map_err(|source| StateError::Write { path, source })?;
        tracing::debug!(artifact = %artifact, "saved stage artifact");
        Ok(())
    }
}
