//! Mock implementations for testing
//!
//! Provides a [`ProcessRunner`] that never spawns anything, answering from
//! scripted responses instead.

#![allow(dead_code)]

use async_trait::async_trait;
use springboard_lifecycle::{CommandSpec, LifecycleError, ProcessOutput, ProcessRunner, Result};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Scripted process runner
///
/// Responses are looked up by `"<program> <args...>"`, then by
/// `"<program> <first arg>"`, then by `"<program>"`. A successful
/// `git clone` creates its target directory with a descriptor file, the way
/// a real clone would.
pub struct MockProcessRunner {
    /// Pre-configured command responses
    responses: Arc<Mutex<HashMap<String, ProcessOutput>>>,
    /// Programs reported as missing from PATH
    missing: Arc<Mutex<HashSet<String>>>,
    /// Recorded command invocations
    invocations: Arc<Mutex<Vec<CommandSpec>>>,
    /// Default response for unknown commands
    default_response: ProcessOutput,
}

impl Default for MockProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProcessRunner {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            missing: Arc::new(Mutex::new(HashSet::new())),
            invocations: Arc::new(Mutex::new(Vec::new())),
            default_response: ProcessOutput::default(),
        }
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Set a mock response for a command key
    pub fn mock_command(&self, key: &str, output: ProcessOutput) {
        self.responses
            .lock()
            .unwrap()
            .insert(key.to_string(), output);
    }

    /// Mock a successful command
    pub fn mock_success(&self, key: &str, stdout: &str) {
        self.mock_command(
            key,
            ProcessOutput {
                exit_code: 0,
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        );
    }

    /// Mock a failed command
    pub fn mock_failure(&self, key: &str, stderr: &str, exit_code: i32) {
        self.mock_command(
            key,
            ProcessOutput {
                exit_code,
                stdout: String::new(),
                stderr: stderr.to_string(),
            },
        );
    }

    /// Report a program as not installed
    pub fn mock_missing(&self, program: &str) {
        self.missing.lock().unwrap().insert(program.to_string());
    }

    /// Get all recorded invocations
    pub fn get_invocations(&self) -> Vec<CommandSpec> {
        self.invocations.lock().unwrap().clone()
    }

    /// Count invocations whose program and first argument match
    pub fn invocation_count(&self, program: &str, subcommand: &str) -> usize {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .filter(|i| {
                i.program == program && i.args.first().map(String::as_str) == Some(subcommand)
            })
            .count()
    }

    pub fn was_invoked(&self, program: &str) -> bool {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .any(|i| i.program == program)
    }

    fn lookup(&self, spec: &CommandSpec) -> ProcessOutput {
        let responses = self.responses.lock().unwrap();
        let full = spec.to_string();
        let first = match spec.args.first() {
            Some(arg) => format!("{} {}", spec.program, arg),
            None => spec.program.clone(),
        };
        responses
            .get(&full)
            .or_else(|| responses.get(&first))
            .or_else(|| responses.get(&spec.program))
            .cloned()
            .unwrap_or_else(|| self.default_response.clone())
    }
}

#[async_trait]
impl ProcessRunner for MockProcessRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<ProcessOutput> {
        self.invocations.lock().unwrap().push(spec.clone());

        if self.missing.lock().unwrap().contains(&spec.program) {
            return Err(LifecycleError::tool_not_found(&spec.program));
        }

        let output = self.lookup(spec);
        if output.success()
            && spec.program == "git"
            && spec.args.first().map(String::as_str) == Some("clone")
        {
            if let Some(target) = spec.args.last() {
                std::fs::create_dir_all(target).unwrap();
                std::fs::write(format!("{}/extension.json", target), "{}").unwrap();
            }
        }
        Ok(output)
    }
}
