//! Resolve the project intent from a command-line argument.
//!
//! The argument is either the intent itself or a path to a document holding
//! it. Only arguments ending in a recognized document extension are read
//! from disk; everything else is taken literally.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Extensions that mark the argument as a document path.
pub const DOCUMENT_EXTENSIONS: &[&str] = &[".md", ".markdown", ".txt"];

/// Document read when no prompt argument is given.
pub const DEFAULT_PROMPT_FILE: &str = "prompt.md";

#[derive(Debug, Error)]
pub enum IntentError {
    #[error("failed to read prompt document {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("prompt document {} is empty", .0.display())]
    EmptyDocument(PathBuf),

    #[error("no prompt given and prompt.md not found in {}", .0.display())]
    Missing(PathBuf),
}

/// Whether `arg` names a prompt document rather than literal text.
pub fn looks_like_document(arg: &str) -> bool {
    let lower = arg.trim().to_ascii_lowercase();
    DOCUMENT_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Resolve the intent text.
///
/// `arg = None` falls back to [`DEFAULT_PROMPT_FILE`] in `cwd`. Relative
/// document paths are resolved against `cwd`.
pub fn resolve_intent(arg: Option<&str>, cwd: &Path) -> Result<String, IntentError> {
    let arg = match arg {
        Some(a) => a,
        None => {
            let default = cwd.join(DEFAULT_PROMPT_FILE);
            if !default.is_file() {
                return Err(IntentError::Missing(cwd.to_path_buf()));
            }
            return read_document(&default);
        }
    };

    if looks_like_document(arg) {
        read_document(&cwd.join(arg.trim()))
    } else {
        Ok(arg.to_string())
    }
}

fn read_document(path: &Path) -> Result<String, IntentError> {
    let text = std::fs::read_to_string(path).map_err(|source| IntentError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if text.trim().is_empty() {
        return Err(IntentError::EmptyDocument(path.to_path_buf()));
    }
    tracing::debug!(path = %path.display(), chars = text.len(), "loaded prompt document");
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_detection() {
        assert!(looks_like_document("prompt.md"));
        assert!(looks_like_document("specs/App.MD"));
        assert!(looks_like_document("notes.txt"));
        assert!(!looks_like_document("a todo app in react"));
        assert!(!looks_like_document("build something like README.md.bak"));
    }

    #[test]
    fn literal_text_is_returned_as_is() {
        let tmp = tempfile::TempDir::new().unwrap();
        let intent = resolve_intent(Some("a counter app"), tmp.path()).unwrap();
        assert_eq!(intent, "a counter app");
    }

    #[test]
    fn document_is_read_relative_to_cwd() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("idea.md"), "# Chess\nA chess game").unwrap();
        let intent = resolve_intent(Some("idea.md"), tmp.path()).unwrap();
        assert_eq!(intent, "# Chess\nA chess game");
    }

    #[test]
    fn missing_document_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = resolve_intent(Some("nope.md"), tmp.path()).unwrap_err();
        assert!(matches!(err, IntentError::Read { .. }));
    }

    #[test]
    fn empty_document_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("blank.md"), "  \n").unwrap();
        let err = resolve_intent(Some("blank.md"), tmp.path()).unwrap_err();
        assert!(matches!(err, IntentError::EmptyDocument(_)));
    }

    #[test]
    fn falls_back_to_default_prompt_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join(DEFAULT_PROMPT_FILE), "a snake game").unwrap();
        assert_eq!(resolve_intent(None, tmp.path()).unwrap(), "a snake game");
    }

    #[test]
    fn no_argument_and_no_default_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = resolve_intent(None, tmp.path()).unwrap_err();
        assert!(matches!(err, IntentError::Missing(_)));
        assert!(err.to_string().contains(DEFAULT_PROMPT_FILE));
    }
}
