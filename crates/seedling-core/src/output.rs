//! Output directory helpers: writing generated files and pre-run cleanup.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Default output directory name.
pub const DEFAULT_OUTPUT_DIR: &str = "generated";

/// Extensions that cleanup never deletes. These are assets the operator
/// drops into the output directory by hand, not generated source.
pub const EXTENSIONS_TO_SKIP: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".bmp", ".svg", ".ico", ".tif", ".tiff",
];

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to clean {}: {source}", .path.display())]
    Clean {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// What happened to one generated path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written(PathBuf),
    /// The path ended in a separator: a directory the model listed as if
    /// it were a file. The directory is created, nothing is written.
    SkippedDirectory(PathBuf),
}

/// Whether `path` is a directory placeholder rather than a file.
pub fn is_directory_placeholder(path: &str) -> bool {
    path.ends_with('/') || path.ends_with('\\')
}

/// Write `content` to `out_dir/rel_path`, creating parent directories.
pub fn write_generated_file(
    out_dir: &Path,
    rel_path: &str,
    content: &str,
) -> Result<WriteOutcome, OutputError> {
    let full = out_dir.join(rel_path);

    if is_directory_placeholder(rel_path) {
        create_dir(&full)?;
        tracing::debug!(path = rel_path, "skipping directory placeholder");
        return Ok(WriteOutcome::SkippedDirectory(full));
    }

    if let Some(parent) = full.parent() {
        create_dir(parent)?;
    }
    std::fs::write(&full, content).map_err(|source| OutputError::Write {
        path: full.clone(),
        source,
    })?;
    tracing::debug!(path = rel_path, bytes = content.len(), "wrote generated file");
    Ok(WriteOutcome::Written(full))
}

fn create_dir(path: &Path) -> Result<(), OutputError> {
    std::fs::create_dir_all(path).map_err(|source| OutputError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

/// Summary of a cleanup pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub removed: usize,
    pub kept: usize,
}

/// Remove every file under `dir` except skip-listed extensions and the
/// paths in `keep`. Directories are left in place. Symlinks are removed
/// without being followed. A missing `dir` is created.
///
/// `keep` entries are compared after canonicalization, so `out/x` and
/// `./out/x` name the same file.
pub fn clean_dir(dir: &Path, keep: &[PathBuf]) -> Result<CleanReport, OutputError> {
    let mut report = CleanReport::default();
    if !dir.exists() {
        create_dir(dir)?;
        return Ok(report);
    }
    let root = std::fs::canonicalize(dir).map_err(|source| OutputError::Clean {
        path: dir.to_path_buf(),
        source,
    })?;
    // Missing keep paths cannot match anything.
    let keep: Vec<PathBuf> = keep
        .iter()
        .filter_map(|p| std::fs::canonicalize(p).ok())
        .collect();
    clean_recursive(&root, &keep, &mut report)?;
    tracing::info!(
        dir = %dir.display(),
        removed = report.removed,
        kept = report.kept,
        "cleaned output directory"
    );
    Ok(report)
}

fn clean_recursive(dir: &Path, keep: &[PathBuf], report: &mut CleanReport) -> Result<(), OutputError> {
    let clean_err = |source| OutputError::Clean {
        path: dir.to_path_buf(),
        source,
    };

    for entry in std::fs::read_dir(dir).map_err(clean_err)? {
        let entry = entry.map_err(clean_err)?;
        let path = entry.path();
        // `file_type` does not follow symlinks: a link to a directory is
        // removed like a file, never descended into.
        let file_type = entry.file_type().map_err(|source| OutputError::Clean {
            path: path.clone(),
            source,
        })?;
        if file_type.is_dir() {
            clean_recursive(&path, keep, report)?;
        } else if is_skipped_extension(&path) || keep.iter().any(|k| k == &path) {
            report.kept += 1;
        } else {
            std::fs::remove_file(&path).map_err(|source| OutputError::Clean {
                path: path.clone(),
                source,
            })?;
            report.removed += 1;
        }
    }
    Ok(())
}

fn is_skipped_extension(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => {
            let dotted = format!(".{}", ext.to_ascii_lowercase());
            EXTENSIONS_TO_SKIP.contains(&dotted.as_str())
        }
        None => false,
    }
}
