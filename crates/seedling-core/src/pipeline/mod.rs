//! Pipeline orchestrator: runs one generation pass over an output directory.
//!
//! Stage graph for a single run:
//!
//! ```text
//! Start -> PlanningFiles -> AwaitConfirmation -+-> Aborted
//!                                              +-> SingleFile -----------> Done
//!                                              +-> PlanningDependencies -> Generating -> Done
//! ```
//!
//! Calls to the model are strictly sequential. A failure part way through
//! `Generating` stops the loop; files written before it stay on disk.

pub mod confirm;

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::context::ContextAssembler;
use crate::llm::{Completion, Conversation, LlmError};
use crate::output::{self, OutputError, WriteOutcome};
use crate::plan::{self, FilePlan, PlanParseError};
use crate::prompts::{self, FilePromptInput};
use crate::sanitize::sanitize;
use crate::state::{Artifact, StageStore, StateError};

pub use confirm::{AutoConfirm, Confirm, PromptConfirm, is_affirmative};

/// Stages of a run, in the order they can be entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    PlanningFiles,
    AwaitConfirmation,
    Aborted,
    PlanningDependencies,
    SingleFile,
    Generating,
    Done,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Start => "start",
            Self::PlanningFiles => "planning_files",
            Self::AwaitConfirmation => "await_confirmation",
            Self::Aborted => "aborted",
            Self::PlanningDependencies => "planning_dependencies",
            Self::SingleFile => "single_file",
            Self::Generating => "generating",
            Self::Done => "done",
        };
        f.write_str(s)
    }
}

/// Whether a full run recomputes the shared-dependency memo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DependencyPolicy {
    /// Ask the model for a fresh memo on every full run.
    #[default]
    Recompute,
    /// Use the persisted memo when one exists; compute only when absent.
    Reuse,
}

/// Per-run options.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Where generated files and the plan artifact live.
    pub output_dir: PathBuf,
    /// Regenerate only this path, leaving everything else untouched.
    pub single_file: Option<String>,
    /// Feed the contents of already-written planned files into each
    /// per-file prompt.
    pub coherent: bool,
    pub dependency_policy: DependencyPolicy,
    /// Keep `shared_dependencies.md` here instead of the output directory.
    pub memo_dir: Option<PathBuf>,
}

impl GenerateOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            single_file: None,
            coherent: false,
            dependency_policy: DependencyPolicy::default(),
            memo_dir: None,
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The operator declined the plan. Nothing was generated.
    Aborted { plan_path: PathBuf },
    /// One requested file was regenerated.
    SingleFile { path: String, outcome: WriteOutcome },
    /// Every planned file was processed.
    Completed {
        written: Vec<String>,
        skipped: Vec<String>,
    },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("completion request failed during {stage}: {source}")]
    Completion {
        stage: Stage,
        #[source]
        source: LlmError,
    },

    #[error("failed to parse file list at {}: {source}\n--- raw plan ---\n{raw}", .path.display())]
    Plan {
        path: PathBuf,
        raw: String,
        #[source]
        source: PlanParseError,
    },

    #[error("refusing to generate {path:?}: {source}")]
    InvalidTarget {
        path: String,
        #[source]
        source: PlanParseError,
    },

    #[error(transparent)]
    State(#[from] StateError),

    #[error("failed to write {path}: {source}")]
    Output {
        path: String,
        #[source]
        source: OutputError,
    },

    #[error("failed to clean output directory: {0}")]
    Cleanup(#[source] OutputError),

    #[error("failed to read operator confirmation: {0}")]
    Confirm(#[source] std::io::Error),
}

/// Drives the stages of a run against one output directory.
pub struct Orchestrator {
    client: Arc<dyn Completion>,
    store: StageStore,
    assembler: ContextAssembler,
    options: GenerateOptions,
}

impl Orchestrator {
    pub fn new(client: Arc<dyn Completion>, options: GenerateOptions) -> Self {
        let mut store = StageStore::new(&options.output_dir);
        if let Some(dir) = &options.memo_dir {
            store = store.with_memo_dir(dir);
        }
        let assembler = ContextAssembler::new(&options.output_dir);
        Self {
            client,
            store,
            assembler,
            options,
        }
    }

    pub fn store(&self) -> &StageStore {
        &self.store
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    /// Run the pipeline for `intent`.
    pub async fn run(
        &self,
        intent: &str,
        confirm: &mut dyn Confirm,
    ) -> Result<RunOutcome, PipelineError> {
        enter(Stage::Start);
        tracing::info!(
            output_dir = %self.options.output_dir.display(),
            coherent = self.options.coherent,
            single_file = self.options.single_file.as_deref().unwrap_or("-"),
            "starting run"
        );

        // A requested single file gets the same path check as planned ones,
        // before any request is spent.
        if let Some(path) = &self.options.single_file {
            plan::check_relative_path(path).map_err(|source| PipelineError::InvalidTarget {
                path: path.clone(),
                source,
            })?;
        }

        // 1. Plan: reuse the persisted artifact or ask the model for one.
        enter(Stage::PlanningFiles);
        let raw_plan = self.load_or_request_plan(intent).await?;
        let plan_path = self.store.path(Artifact::FileList);

        // 2. Operator gate.
        enter(Stage::AwaitConfirmation);
        let approved = confirm
            .confirm(&raw_plan, &plan_path)
            .map_err(PipelineError::Confirm)?;
        if !approved {
            enter(Stage::Aborted);
            tracing::info!(plan = %plan_path.display(), "plan rejected, nothing generated");
            return Ok(RunOutcome::Aborted { plan_path });
        }

        // 3. Strict parse; a bad plan stays on disk for hand editing.
        let plan = match FilePlan::parse(raw_plan.as_str()) {
            Ok(plan) => plan,
            Err(source) => {
                tracing::error!(
                    plan = %plan_path.display(),
                    error = %source,
                    raw = %raw_plan,
                    "file list is not a valid list of paths"
                );
                return Err(PipelineError::Plan {
                    path: plan_path,
                    raw: raw_plan,
                    source,
                });
            }
        };
        tracing::info!(files = plan.len(), "file list accepted");

        let persisted_memo = self.store.load_optional(Artifact::SharedDependencies)?;

        // 4a. Single file: no cleanup, memo as found on disk.
        if let Some(path) = &self.options.single_file {
            enter(Stage::SingleFile);
            if !plan.contains(path) {
                tracing::warn!(path = %path, "requested file is not in the plan");
            }
            let outcome = self
                .generate_file(intent, &plan, persisted_memo.as_deref(), path)
                .await?;
            enter(Stage::Done);
            return Ok(RunOutcome::SingleFile {
                path: path.clone(),
                outcome,
            });
        }

        // 4b. Full regeneration.
        let keep: Vec<PathBuf> = Artifact::ALL.iter().map(|a| self.store.path(*a)).collect();
        output::clean_dir(&self.options.output_dir, &keep).map_err(PipelineError::Cleanup)?;

        enter(Stage::PlanningDependencies);
        let memo = self.resolve_memo(intent, &plan, persisted_memo).await?;

        enter(Stage::Generating);
        let mut written = Vec::new();
        let mut skipped = Vec::new();
        for (index, path) in plan.iter().enumerate() {
            tracing::info!(path, index = index + 1, total = plan.len(), "generating file");
            match self.generate_file(intent, &plan, Some(&memo), path).await? {
                WriteOutcome::Written(_) => written.push(path.to_string()),
                WriteOutcome::SkippedDirectory(_) => skipped.push(path.to_string()),
            }
        }

        enter(Stage::Done);
        tracing::info!(written = written.len(), skipped = skipped.len(), "run complete");
        Ok(RunOutcome::Completed { written, skipped })
    }

    async fn load_or_request_plan(&self, intent: &str) -> Result<String, PipelineError> {
        if self.store.has(Artifact::FileList) {
            tracing::info!(
                path = %self.store.path(Artifact::FileList).display(),
                "reusing persisted file list"
            );
            return Ok(self.store.load(Artifact::FileList)?);
        }

        let conversation = prompts::plan_prompt(intent).into_conversation();
        let raw = self.complete(Stage::PlanningFiles, &conversation).await?;
        self.store.save(Artifact::FileList, &raw)?;
        Ok(raw)
    }

    async fn resolve_memo(
        &self,
        intent: &str,
        plan: &FilePlan,
        persisted: Option<String>,
    ) -> Result<String, PipelineError> {
        if self.options.dependency_policy == DependencyPolicy::Reuse {
            if let Some(memo) = persisted {
                tracing::info!("reusing persisted shared dependencies");
                return Ok(memo);
            }
        }

        let conversation = prompts::dependency_prompt(intent, plan.raw()).into_conversation();
        let memo = self
            .complete(Stage::PlanningDependencies, &conversation)
            .await?;
        self.store.save(Artifact::SharedDependencies, &memo)?;
        tracing::info!(memo = %memo.trim(), "shared dependencies");
        Ok(memo)
    }

    async fn generate_file(
        &self,
        intent: &str,
        plan: &FilePlan,
        memo: Option<&str>,
        path: &str,
    ) -> Result<WriteOutcome, PipelineError> {
        let write = |content: &str| {
            output::write_generated_file(&self.options.output_dir, path, content).map_err(
                |source| PipelineError::Output {
                    path: path.to_string(),
                    source,
                },
            )
        };

        // Placeholders never produce a file, so skip the model call too.
        if output::is_directory_placeholder(path) {
            return write("");
        }

        let context = self
            .options
            .coherent
            .then(|| self.assembler.assemble(plan));
        let input = FilePromptInput {
            intent,
            file_list: plan.raw(),
            shared_dependencies: memo,
            filename: path,
            context: context.as_deref(),
        };
        let conversation = prompts::file_prompt(&input).into_conversation();
        let reply = self.complete(Stage::Generating, &conversation).await?;
        write(&sanitize(&reply))
    }

    async fn complete(
        &self,
        stage: Stage,
        conversation: &Conversation,
    ) -> Result<String, PipelineError> {
        self.client
            .complete(conversation)
            .await
            .map_err(|source| PipelineError::Completion { stage, source })
    }
}

fn enter(stage: Stage) {
    tracing::debug!(stage = %stage, "entering stage");
}
