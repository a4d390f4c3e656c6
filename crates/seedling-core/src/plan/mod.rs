//! The file plan: which files a run will generate, in order.

pub mod parser;

pub use parser::{PlanParseError, check_relative_path, parse_file_list};

/// A validated file plan.
///
/// Keeps the raw text next to the parsed paths: the raw form is what gets
/// persisted, shown to the operator, and echoed back to the model in later
/// prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePlan {
    raw: String,
    paths: Vec<String>,
}

impl FilePlan {
    /// Parse and validate raw plan text.
    pub fn parse(raw: impl Into<String>) -> Result<Self, PlanParseError> {
        let raw = raw.into();
        let paths = parse_file_list(&raw)?;
        Ok(Self { raw, paths })
    }

    /// The plan text exactly as the model (or operator) wrote it.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Planned paths in plan order.
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
