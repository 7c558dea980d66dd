use std::borrow::Cow;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::EstimatorConfig;
use crate::error::{HarnessError, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(10);
/// How long to wait for pipe output once a timed-out trial has been killed.
const DRAIN_GRACE: Duration = Duration::from_millis(200);

/// Raw result of one estimator execution. Content is never interpreted here.
#[derive(Debug, Clone, Default)]
pub struct TrialOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// `None` when the trial was killed on timeout or never reported a status.
    pub status: Option<ExitStatus>,
    pub timed_out: bool,
    pub elapsed: Duration,
}

impl TrialOutput {
    pub fn stdout_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    pub fn stderr_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }
}

/// Something that can execute one trial of the estimator.
pub trait TrialRunner {
    fn run(&mut self, trace: &Path, parameter: f64) -> Result<TrialOutput>;
}

/// Runs the estimator as a child process, one blocking call per trial.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    estimator: EstimatorConfig,
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new(estimator: EstimatorConfig, timeout: Option<Duration>) -> Self {
        Self { estimator, timeout }
    }

    pub fn command(&self, trace: &Path, parameter: f64) -> Command {
        let est = &self.estimator;
        let mut cmd = Command::new(&est.program);
        cmd.args(&est.extra_args)
            .arg(&est.trace_flag)
            .arg(trace)
            .arg(&est.parameter_flag)
            .arg(parameter.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        // Own process group, so a timeout also reaches anything the estimator forked.
        #[cfg(unix)]
        std::os::unix::process::CommandExt::process_group(&mut cmd, 0);
        cmd
    }
}

impl TrialRunner for ProcessRunner {
    fn run(&mut self, trace: &Path, parameter: f64) -> Result<TrialOutput> {
        let started = Instant::now();
        let mut child = self
            .command(trace, parameter)
            .spawn()
            .map_err(|source| HarnessError::ProcessLaunch {
                program: self.estimator.program.clone(),
                source,
            })?;

        // Drain both pipes concurrently so the child never blocks on a full buffer.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match self.timeout {
            None => Some(child.wait()?),
            Some(limit) => wait_with_deadline(&mut child, limit)?,
        };
        let timed_out = status.is_none();
        if timed_out {
            warn!(parameter, timeout = ?self.timeout, "estimator trial timed out, killed");
        }

        // A stray grandchild can still hold the pipes open after a kill.
        let grace = timed_out.then_some(DRAIN_GRACE);
        let output = TrialOutput {
            stdout: collect(stdout, grace),
            stderr: collect(stderr, grace),
            status,
            timed_out,
            elapsed: started.elapsed(),
        };
        debug!(
            parameter,
            status = ?output.status,
            stdout_bytes = output.stdout.len(),
            elapsed_ms = output.elapsed.as_millis() as u64,
            "estimator trial finished"
        );
        Ok(output)
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<Receiver<Vec<u8>>> {
    pipe.map(|mut pipe| {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = Vec::new();
            // A read error leaves whatever arrived so far.
            let _ = pipe.read_to_end(&mut buf);
            let _ = tx.send(buf);
        });
        rx
    })
}

/// Block for the drained bytes, or give up after `grace` and leave the reader detached.
fn collect(rx: Option<Receiver<Vec<u8>>>, grace: Option<Duration>) -> Vec<u8> {
    rx.and_then(|rx| match grace {
        None => rx.recv().ok(),
        Some(limit) => rx.recv_timeout(limit).ok(),
    })
    .unwrap_or_default()
}

/// Wait for the child up to `limit`; kill and reap it when the limit passes.
fn wait_with_deadline(child: &mut Child, limit: Duration) -> Result<Option<ExitStatus>> {
    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            kill_trial(child);
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(unix)]
fn kill_trial(child: &mut Child) {
    // The child leads its own group, so its pid is the group id.
    let pgid = child.id() as libc::pid_t;
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } != 0 {
        let _ = child.kill();
    }
}

#[cfg(not(unix))]
fn kill_trial(child: &mut Child) {
    let _ = child.kill();
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn shell(script: &str) -> EstimatorConfig {
        EstimatorConfig {
            program: PathBuf::from("/bin/sh"),
            trace_flag: "-f".into(),
            parameter_flag: "-gamma".into(),
            extra_args: vec!["-c".into(), script.into(), "hh".into()],
        }
    }

    #[test]
    fn passes_trace_and_parameter_as_arguments() {
        let mut runner = ProcessRunner::new(shell(r#"printf '%s|%s|%s|%s' "$1" "$2" "$3" "$4""#), None);
        let out = runner.run(Path::new("trace.dmp"), 1.2).unwrap();
        assert_eq!(out.stdout_text(), "-f|trace.dmp|-gamma|1.2");
        assert!(out.status.unwrap().success());
        assert!(!out.timed_out);
    }

    #[test]
    fn nonzero_exit_is_passed_through() {
        let mut runner = ProcessRunner::new(shell("echo oops >&2; exit 3"), None);
        let out = runner.run(Path::new("t"), 1.0).unwrap();
        assert_eq!(out.status.unwrap().code(), Some(3));
        assert!(out.stdout.is_empty());
        assert_eq!(out.stderr_text().trim(), "oops");
    }

    #[test]
    fn timeout_kills_the_trial() {
        let mut runner = ProcessRunner::new(shell("exec sleep 5"), Some(Duration::from_millis(100)));
        let out = runner.run(Path::new("t"), 1.0).unwrap();
        assert!(out.timed_out);
        assert!(out.status.is_none());
        assert!(out.elapsed < Duration::from_secs(4));
    }

    #[test]
    fn timeout_reaches_forked_children() {
        // No `exec`: the shell forks `sleep`, which inherits the output pipes.
        let mut runner = ProcessRunner::new(shell("sleep 3; echo done"), Some(Duration::from_millis(100)));
        let out = runner.run(Path::new("t"), 1.0).unwrap();
        assert!(out.timed_out);
        assert!(out.stdout.is_empty());
        assert!(out.elapsed < Duration::from_secs(2), "took {:?}", out.elapsed);
    }

    #[test]
    fn missing_binary_is_a_launch_failure() {
        let est = EstimatorConfig {
            program: PathBuf::from("/definitely/not/here/hh"),
            ..shell("")
        };
        let err = ProcessRunner::new(est, None).run(Path::new("t"), 1.0).unwrap_err();
        assert!(matches!(err, HarnessError::ProcessLaunch { .. }));
    }
}
