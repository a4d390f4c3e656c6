//! Operator confirmation of the file plan before generation starts.

use std::io::{BufRead, Write};
use std::path::Path;

/// Asks the operator whether a plan may be generated.
pub trait Confirm {
    /// Show `plan_text` and return whether generation should proceed.
    /// `plan_path` is where the operator can edit the plan on rejection.
    fn confirm(&mut self, plan_text: &str, plan_path: &Path) -> std::io::Result<bool>;
}

/// Whether an operator answer counts as "yes".
pub fn is_affirmative(answer: &str) -> bool {
    answer.trim_start().to_lowercase().starts_with('y')
}

/// Approves every plan without asking. Used for `--yes` and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoConfirm;

impl Confirm for AutoConfirm {
    fn confirm(&mut self, plan_text: &str, _plan_path: &Path) -> std::io::Result<bool> {
        tracing::info!(plan = %plan_text.trim(), "plan auto-approved");
        Ok(true)
    }
}

/// Interactive confirmation over any reader/writer pair (stdin/stdout in
/// the CLI).
#[derive(Debug)]
pub struct PromptConfirm<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptConfirm<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Confirm for PromptConfirm<R, W> {
    fn confirm(&mut self, plan_text: &str, plan_path: &Path) -> std::io::Result<bool> {
        writeln!(self.output, "The model wants to make these files:")?;
        writeln!(self.output, "{}", plan_text.trim_end())?;
        write!(self.output, "Let it start? [y/N] ")?;
        self.output.flush()?;

        let mut answer = String::new();
        self.input.read_line(&mut answer)?;

        let approved = is_affirmative(&answer);
        if !approved {
            writeln!(
                self.output,
                "List of files has been saved to: {}. Edit this file manually to fine tune the files that will be created.",
                plan_path.display()
            )?;
        }
        Ok(approved)
    }
}
