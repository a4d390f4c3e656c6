//! `seedling generate`: resolve intent and config, then run the pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use seedling_core::intent::resolve_intent;
use seedling_core::output::{DEFAULT_OUTPUT_DIR, WriteOutcome};
use seedling_core::pipeline::{
    AutoConfirm, DependencyPolicy, GenerateOptions, Orchestrator, PromptConfirm, RunOutcome,
};
use seedling_core::CompletionClient;

use crate::config::{CliOverrides, SeedlingConfig};

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Project intent, or a path to a .md/.markdown/.txt file holding it
    /// (defaults to ./prompt.md)
    pub prompt: Option<String>,
    /// Output directory
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    pub dir: PathBuf,
    /// Regenerate only this planned file
    #[arg(long)]
    pub file: Option<String>,
    /// Include already-written files in each per-file prompt
    #[arg(long)]
    pub coherent: bool,
    /// Skip the plan confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
    /// Model name (overrides SEEDLING_MODEL and the config file)
    #[arg(long)]
    pub model: Option<String>,
    /// Completion token limit per request
    #[arg(long)]
    pub max_tokens: Option<u32>,
    /// Reuse a persisted shared_dependencies.md instead of asking again
    #[arg(long)]
    pub reuse_deps: bool,
    /// Directory for shared_dependencies.md (defaults to the output directory)
    #[arg(long)]
    pub memo_dir: Option<PathBuf>,
}

impl GenerateArgs {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
        }
    }

    pub fn options(&self) -> GenerateOptions {
        let mut options = GenerateOptions::new(&self.dir);
        options.single_file = self.file.clone();
        options.coherent = self.coherent;
        options.dependency_policy = if self.reuse_deps {
            DependencyPolicy::Reuse
        } else {
            DependencyPolicy::Recompute
        };
        options.memo_dir = self.memo_dir.clone();
        options
    }
}

/// Execute `seedling generate`.
pub async fn run_generate(args: GenerateArgs) -> Result<()> {
    let config = SeedlingConfig::resolve(&args.overrides())?;

    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let intent = resolve_intent(args.prompt.as_deref(), &cwd)?;
    println!("{}", intent.trim());
    println!();
    tracing::info!(
        model = %config.client.params.model,
        max_tokens = config.client.params.max_tokens,
        intent_chars = intent.chars().count(),
        "resolved intent"
    );

    let client = CompletionClient::from_config(config.client)
        .context("failed to build completion client")?;
    let orchestrator = Orchestrator::new(Arc::new(client), args.options());

    let outcome = if args.yes {
        orchestrator.run(&intent, &mut AutoConfirm).await?
    } else {
        let stdin = std::io::stdin();
        let mut confirm = PromptConfirm::new(stdin.lock(), std::io::stdout());
        orchestrator.run(&intent, &mut confirm).await?
    };

    print!("{}", summary(&outcome, &args.dir));
    Ok(())
}

/// Operator-facing summary of a finished run.
pub fn summary(outcome: &RunOutcome, dir: &Path) -> String {
    let mut out = String::new();
    match outcome {
        RunOutcome::Aborted { .. } => {}
        RunOutcome::SingleFile { path, outcome } => match outcome {
            WriteOutcome::Written(full) => {
                out.push_str(&format!("Regenerated {path} -> {}\n", full.display()));
            }
            WriteOutcome::SkippedDirectory(full) => {
                out.push_str(&format!(
                    "{path} is a directory; created {}\n",
                    full.display()
                ));
            }
        },
        RunOutcome::Completed { written, skipped } => {
            out.push_str(&format!(
                "Generated {} file(s) in {}\n",
                written.len(),
                dir.display()
            ));
            for path in written {
                out.push_str(&format!("  {path}\n"));
            }
            if !skipped.is_empty() {
                out.push_str(&format!("Skipped {} directory entries:\n", skipped.len()));
                for path in skipped {
                    out.push_str(&format!("  {path}\n"));
                }
            }
        }
    }
    out
}
