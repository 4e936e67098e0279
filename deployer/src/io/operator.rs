//! Operator interaction: yes/no confirmations and free-text answers.
//!
//! The pipeline only talks to the [`Operator`] trait so it can run headless
//! with scripted answers.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use tracing::debug;

pub trait Operator {
    /// Ask a yes/no question.
    fn ask_yes_no(&mut self, question: &str) -> Result<bool>;

    /// Ask for free text; a blank answer yields `default`.
    fn ask_text(&mut self, question: &str, default: &str) -> Result<String>;
}

/// Line-based prompts: questions go to `output`, answers come from `input`.
pub struct TerminalOperator<R, W> {
    input: R,
    output: W,
}

impl TerminalOperator<io::StdinLock<'static>, io::Stderr> {
    /// Prompt on stderr, read answers from stdin.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> TerminalOperator<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Read one answer line. `None` means the input is closed.
    fn read_answer(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let n = self
            .input
            .read_line(&mut line)
            .context("read operator input")?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn show(&mut self, prompt: &str) -> Result<()> {
        write!(self.output, "{prompt}").context("write prompt")?;
        self.output.flush().context("flush prompt")
    }
}

impl<R: BufRead, W: Write> Operator for TerminalOperator<R, W> {
    fn ask_yes_no(&mut self, question: &str) -> Result<bool> {
        self.show(&format!("{question} [Y/n]: "))?;
        let answer = match self.read_answer()? {
            Some(answer) => parse_yes_no(&answer),
            // Closed input counts as cancelling the prompt.
            None => {
                writeln!(self.output).context("write prompt")?;
                false
            }
        };
        debug!(question, answer, "operator confirmation");
        Ok(answer)
    }

    fn ask_text(&mut self, question: &str, default: &str) -> Result<String> {
        self.show(&format!("{question} ({default}): "))?;
        let answer = match self.read_answer()? {
            Some(answer) if !answer.is_empty() => answer,
            _ => default.to_string(),
        };
        debug!(question, answer = %answer, "operator text answer");
        Ok(answer)
    }
}

/// Empty means yes; otherwise anything starting with `y` is yes.
fn parse_yes_no(answer: &str) -> bool {
    let answer = answer.trim().to_lowercase();
    answer.is_empty() || answer.starts_with('y')
}
