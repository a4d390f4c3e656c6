//! Core generation pipeline for seedling.
//!
//! A run turns a project intent into a source tree in three model-backed
//! stages: file-list planning, shared-dependency extraction, and per-file
//! code synthesis. Stage artifacts are persisted so an interrupted or
//! rejected run can be resumed.
//!
//! ```text
//! Orchestrator
//!     |
//!     +--> StageStore (filelist.txt, shared_dependencies.md)
//!     |
//!     +--> prompts --> Completion --> sanitize --> output::write_generated_file
//!                ^
//!                +-- ContextAssembler (coherent mode only)
//! ```

pub mod context;
pub mod intent;
pub mod llm;
pub mod output;
pub mod pipeline;
pub mod plan;
pub mod prompts;
pub mod sanitize;
pub mod state;

pub use llm::{Completion, CompletionClient, LlmError, Message, RetryPolicy, Role};
pub use pipeline::{
    AutoConfirm, Confirm, DependencyPolicy, GenerateOptions, Orchestrator, PipelineError,
    RunOutcome, Stage,
};
pub use plan::{FilePlan, PlanParseError};
pub use sanitize::sanitize;
pub use state::{Artifact, StageStore};
