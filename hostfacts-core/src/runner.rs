use std::io::Read;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Result of running one external command
///
/// A missing binary, a launch failure, a signal kill and a timeout all
/// collapse to `executed == false`. Only a normal exit carries a code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    pub executed: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutcome {
    pub fn not_executed() -> Self {
        Self::default()
    }

    pub fn completed(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            executed: true,
            exit_code: Some(exit_code),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Ran and exited with status 0
    pub fn success(&self) -> bool {
        self.executed && self.exit_code == Some(0)
    }
}

/// Executes external commands on behalf of the collectors
pub trait CommandRunner {
    /// Run `program` with `args`. Never fails: problems show up in the outcome.
    fn run(&self, program: &str, args: &[&str]) -> CommandOutcome;
}

/// Runs real subprocesses with a wall-clock limit
pub struct SystemCommandRunner {
    timeout: Duration,
}

impl SystemCommandRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for SystemCommandRunner {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_COMMAND_TIMEOUT)
    }
}

impl CommandRunner for SystemCommandRunner {
    fn run(&self, program: &str, args: &[&str]) -> CommandOutcome {
        let mut child = match Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                debug!(program, error = %e, "command could not be started");
                return CommandOutcome::not_executed();
            }
        };

        // Drain both pipes concurrently so a chatty child cannot block on a full pipe
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    warn!(program, timeout = ?self.timeout, "command timed out, killing it");
                    let _ = child.kill();
                    let _ = child.wait();
                    return CommandOutcome::not_executed();
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    warn!(program, error = %e, "failed waiting on command");
                    let _ = child.kill();
                    return CommandOutcome::not_executed();
                }
            }
        };

        let Some(code) = status.code() else {
            debug!(program, "command terminated by signal");
            return CommandOutcome::not_executed();
        };

        // A background process can inherit the pipes and keep them open past the child's exit
        let (Some(stdout), Some(stderr)) = (collect(stdout, deadline), collect(stderr, deadline)) else {
            warn!(program, timeout = ?self.timeout, "command output still open at deadline, abandoning it");
            return CommandOutcome::not_executed();
        };

        debug!(program, ?args, exit_code = code, "command finished");
        CommandOutcome::completed(code, stdout, stderr)
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
    });
    rx
}

/// Output of a drained pipe, or `None` if it is not closed by `deadline`
fn collect(pipe: Option<Receiver<String>>, deadline: Instant) -> Option<String> {
    let Some(rx) = pipe else {
        return Some(String::new());
    };
    let remaining = deadline.saturating_duration_since(Instant::now());
    rx.recv_timeout(remaining).ok()
}

/// Check whether `binary` resolves on PATH
pub fn binary_present(runner: &dyn CommandRunner, binary: &str) -> bool {
    runner.run("which", &[binary]).success()
}

#[cfg(test)]
pub(crate) use fake::FakeRunner;

#[cfg(test)]
mod fake {
    use super::{CommandOutcome, CommandRunner};
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Scripted runner: answers from a table keyed by the full command line
    #[derive(Default)]
    pub(crate) struct FakeRunner {
        scripted: HashMap<String, CommandOutcome>,
        calls: RefCell<Vec<String>>,
    }

    impl FakeRunner {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn on(mut self, command_line: &str, outcome: CommandOutcome) -> Self {
            self.scripted.insert(command_line.to_string(), outcome);
            self
        }

        /// Script `which <binary>` to succeed
        pub(crate) fn with_binary(self, binary: &str) -> Self {
            let line = format!("which {}", binary);
            let path = format!("/usr/sbin/{}\n", binary);
            self.on(&line, CommandOutcome::completed(0, path, ""))
        }

        pub(crate) fn called(&self, command_line: &str) -> bool {
            self.calls.borrow().iter().any(|c| c == command_line)
        }
    }

    impl CommandRunner for FakeRunner {
        fn run(&self, program: &str, args: &[&str]) -> CommandOutcome {
            let mut line = program.to_string();
            for arg in args {
                line.push(' ');
                line.push_str(arg);
            }
            self.calls.borrow_mut().push(line.clone());
            self.scripted.get(&line).cloned().unwrap_or_default()
        }
    }
}
