/*!
 * External Command Invocation
 * Runs the bluetooth utility and captures its output
 */

use async_trait::async_trait;
use std::io;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Failed to run `{command}`: {source}")]
    Spawn { command: String, source: io::Error },

    #[error("`{command}` exited with {}: {}", exit_status(.code), .stderr.trim())]
    Exit {
        command: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
}

fn exit_status(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".to_string(),
    }
}

pub type CommandResult = Result<CommandOutput, CommandError>;

/// Runs one external command to completion.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> CommandResult;
}

/// Spawns the program directly, without a shell in between.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, program: &str, args: &[String]) -> CommandResult {
        let command = command_line(program, args);
        debug!("Running: {}", command);

        let output = match Command::new(program).args(args).output().await {
            Ok(output) => output,
            Err(source) => return Err(CommandError::Spawn { command, source }),
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if output.status.success() {
            Ok(CommandOutput { stdout, stderr })
        } else {
            Err(CommandError::Exit {
                command,
                code: output.status.code(),
                stdout,
                stderr,
            })
        }
    }
}

pub fn command_line(program: &str, args: &[String]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}
