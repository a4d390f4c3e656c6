//! Coherent-mode context: the current contents of already-written planned
//! files, concatenated for inclusion in later prompts.

use std::path::PathBuf;

use crate::plan::FilePlan;

/// Reads planned files relative to a root directory.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    root: PathBuf,
}

impl ContextAssembler {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Concatenate `path\ncontent\n\n` for every planned path that exists,
    /// in plan order. Missing or unreadable paths are skipped; the result is
    /// empty when nothing has been written yet.
    pub fn assemble(&self, plan: &FilePlan) -> String {
        let mut out = String::new();
        for path in plan.iter() {
            let full = self.root.join(path);
            if !full.is_file() {
                continue;
            }
            match std::fs::read_to_string(&full) {
                Ok(content) => {
                    out.push_str(path);
                    out.push('\n');
                    out.push_str(&content);
                    out.push_str("\n\n");
                }
                Err(e) => {
                    tracing::warn!(path = %full.display(), error = %e, "skipping unreadable context file");
                }
            }
        }
        out
    }
}
