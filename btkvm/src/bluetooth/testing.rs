//! Test doubles for the bluetooth utility and the log output.

use async_trait::async_trait;
use std::io;
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

use super::command::{command_line, CommandError, CommandOutput, CommandResult, CommandRunner};

type Responder = Box<dyn Fn(&[String]) -> CommandResult + Send + Sync>;

/// Records every command line and answers with `respond(args)`.
pub struct FakeRunner {
    respond: Responder,
    calls: Mutex<Vec<(Instant, String)>>,
}

impl FakeRunner {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(&[String]) -> CommandResult + Send + Sync + 'static,
    {
        Self {
            respond: Box::new(respond),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(_, call)| call.clone()).collect()
    }

    pub fn timed_calls(&self) -> Vec<(Instant, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, program: &str, args: &[String]) -> CommandResult {
        self.calls
            .lock()
            .unwrap()
            .push((Instant::now(), command_line(program, args)));
        tokio::task::yield_now().await;
        (self.respond)(args)
    }
}

pub fn ok(stdout: &str) -> CommandResult {
    Ok(CommandOutput {
        stdout: stdout.to_string(),
        stderr: String::new(),
    })
}

pub fn fail(stderr: &str) -> CommandResult {
    Err(CommandError::Exit {
        command: "blueutil".to_string(),
        code: Some(1),
        stdout: String::new(),
        stderr: stderr.to_string(),
    })
}

/// Collects formatted `tracing` output for the current thread.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .without_time()
            .with_max_level(tracing::Level::DEBUG)
            .finish();

        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
