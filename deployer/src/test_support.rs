//! Test-only executor and operator doubles.

use std::collections::VecDeque;

use anyhow::{Result, anyhow};

use crate::core::command::CommandSpec;
use crate::core::types::ExecResult;
use crate::io::executor::CommandExecutor;
use crate::io::operator::Operator;

#[derive(Debug, Clone)]
enum Behavior {
    Exit { code: i32, output: Vec<u8> },
    Missing,
}

/// Executor that records every command and succeeds unless told otherwise.
///
/// Rules match on the start of the command's display form, e.g. `"git push"`
/// or `"twine upload --repository testpypi"`. The first matching rule wins.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    rules: Vec<(String, Behavior)>,
    invoked: Vec<CommandSpec>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exit with `code` and no output for commands starting with `prefix`.
    pub fn fail_on(self, prefix: &str, code: i32) -> Self {
        self.fail_with_output(prefix, code, Vec::new())
    }

    pub fn fail_with_output(mut self, prefix: &str, code: i32, output: Vec<u8>) -> Self {
        self.rules
            .push((prefix.to_string(), Behavior::Exit { code, output }));
        self
    }

    /// Behave as if the program could not be spawned.
    pub fn missing(mut self, prefix: &str) -> Self {
        self.rules.push((prefix.to_string(), Behavior::Missing));
        self
    }

    pub fn invoked(&self) -> &[CommandSpec] {
        &self.invoked
    }

    pub fn invoked_display(&self) -> Vec<String> {
        self.invoked.iter().map(CommandSpec::display).collect()
    }

    /// True if any invoked command starts with `prefix`.
    pub fn ran(&self, prefix: &str) -> bool {
        self.invoked
            .iter()
            .any(|command| command.display().starts_with(prefix))
    }
}

impl CommandExecutor for ScriptedExecutor {
    fn exec(&mut self, command: &CommandSpec) -> Result<ExecResult> {
        self.invoked.push(command.clone());
        let display = command.display();
        let rule = self
            .rules
            .iter()
            .find(|(prefix, _)| display.starts_with(prefix.as_str()));
        match rule {
            None => Ok(ExecResult::success()),
            Some((_, Behavior::Exit { code, output })) => {
                Ok(ExecResult::failure(*code, output.clone()))
            }
            Some((_, Behavior::Missing)) => Err(anyhow!(
                "spawn {}: No such file or directory",
                command.program
            )),
        }
    }
}

/// Scripted operator answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
    Text(String),
}

/// Operator that replays queued answers and records the questions asked.
#[derive(Debug, Default)]
pub struct ScriptedOperator {
    answers: VecDeque<Answer>,
    asked: Vec<String>,
}

impl ScriptedOperator {
    pub fn new(answers: Vec<Answer>) -> Self {
        Self {
            answers: answers.into(),
            asked: Vec::new(),
        }
    }

    pub fn asked(&self) -> &[String] {
        &self.asked
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    fn next(&mut self, question: &str) -> Result<Answer> {
        self.asked.push(question.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted answer for {question:?}"))
    }
}

impl Operator for ScriptedOperator {
    fn ask_yes_no(&mut self, question: &str) -> Result<bool> {
        match self.next(question)? {
            Answer::Yes => Ok(true),
            Answer::No => Ok(false),
            Answer::Text(text) => Err(anyhow!("expected yes/no for {question:?}, got {text:?}")),
        }
    }

    fn ask_text(&mut self, question: &str, _default: &str) -> Result<String> {
        match self.next(question)? {
            Answer::Text(text) => Ok(text),
            other => Err(anyhow!("expected text for {question:?}, got {other:?}")),
        }
    }
}

/// Scratch project directory with an optional `pyproject.toml`.
pub struct TestProject {
    dir: tempfile::TempDir,
}

impl TestProject {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn with_name(name: &str) -> Result<Self> {
        let project = Self::new()?;
        std::fs::write(
            project.path().join("pyproject.toml"),
            format!("[project]\nname = \"{name}\"\nversion = \"0.1.0\"\n"),
        )?;
        Ok(project)
    }

    pub fn path(&self) -> &std::path::Path {
        self.dir.path()
    }
}
