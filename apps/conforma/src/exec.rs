//! Child process execution for compilers and analysis tools.
//!
//! Output is captured from both pipes on reader threads (so a chatty child
//! cannot block on a full pipe) and merged as stdout followed by stderr. The
//! child is polled until it exits or the deadline passes, in which case it is
//! killed and `ValidationError::Timeout` is returned.
//!
//! On Unix the child leads its own process group. Descendants that outlive it
//! while holding the pipes open are killed once the deadline passes, and the
//! output read up to that point is returned.

use crate::error::ValidationError;
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const CHUNK: usize = 8192;

#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub exit_code: i32,
    /// stdout followed by stderr.
    pub output: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Which pipe a chunk came from.
#[derive(Clone, Copy)]
enum Pipe {
    Out,
    Err,
}

/// Run `program` with `args`, waiting at most `timeout`.
pub fn run(program: &str, args: &[String], timeout: Duration) -> Result<ProcessOutput, ValidationError> {
    run_with_env(program, args, &[], timeout)
}

/// Like `run`, with extra environment variables for the child.
pub fn run_with_env(
    program: &str,
    args: &[String],
    env: &[(&str, &str)],
    timeout: Duration,
) -> Result<ProcessOutput, ValidationError> {
    debug!(program, ?args, "spawning");
    let mut cmd = Command::new(program);
    cmd.args(args)
        .envs(env.iter().copied())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }
    let mut child = cmd.spawn().map_err(|source| ValidationError::Spawn {
        program: program.to_string(),
        source,
    })?;

    let (tx, rx) = mpsc::channel();
    if let Some(s) = child.stdout.take() {
        let tx = tx.clone();
        thread::spawn(move || pump(s, Pipe::Out, tx));
    }
    if let Some(s) = child.stderr.take() {
        let tx = tx.clone();
        thread::spawn(move || pump(s, Pipe::Err, tx));
    }
    drop(tx);

    // A deadline too far out to represent means no deadline
    let deadline = Instant::now().checked_add(timeout);
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    warn!(program, seconds = timeout.as_secs(), "killing timed out process");
                    kill_tree(&mut child);
                    let _ = child.wait();
                    return Err(ValidationError::Timeout {
                        program: program.to_string(),
                        seconds: timeout.as_secs(),
                    });
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                kill_tree(&mut child);
                return Err(ValidationError::System(format!(
                    "waiting for '{}' failed: {}",
                    program, e
                )));
            }
        }
    };

    let (stdout, stderr, complete) = collect(&rx, deadline);
    if !complete {
        warn!(program, "pipes still held open past the deadline; killing leftover processes");
        kill_group(&child);
    }
    let mut output = String::from_utf8_lossy(&stdout).into_owned();
    output.push_str(&String::from_utf8_lossy(&stderr));
    let exit_code = exit_code(&status);
    debug!(program, exit_code, bytes = output.len(), "process finished");
    Ok(ProcessOutput { exit_code, output })
}

fn pump<R: Read>(mut r: R, pipe: Pipe, tx: mpsc::Sender<(Pipe, Vec<u8>)>) {
    let mut buf = [0u8; CHUNK];
    loop {
        match r.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if tx.send((pipe, buf[..n].to_vec())).is_err() {
                    break;
                }
            }
        }
    }
}

/// Gather chunks until both readers hit EOF or the deadline passes. The flag
/// is false when the deadline cut collection short.
fn collect(rx: &Receiver<(Pipe, Vec<u8>)>, deadline: Option<Instant>) -> (Vec<u8>, Vec<u8>, bool) {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let complete = loop {
        let next = match deadline {
            Some(d) => rx.recv_timeout(d.saturating_duration_since(Instant::now())),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match next {
            Ok((Pipe::Out, chunk)) => stdout.extend_from_slice(&chunk),
            Ok((Pipe::Err, chunk)) => stderr.extend_from_slice(&chunk),
            Err(RecvTimeoutError::Disconnected) => break true,
            Err(RecvTimeoutError::Timeout) => break false,
        }
    };
    // Keep whatever the readers already queued
    while let Ok((pipe, chunk)) = rx.try_recv() {
        match pipe {
            Pipe::Out => stdout.extend_from_slice(&chunk),
            Pipe::Err => stderr.extend_from_slice(&chunk),
        }
    }
    (stdout, stderr, complete)
}

fn kill_tree(child: &mut Child) {
    kill_group(child);
    let _ = child.kill();
}

#[cfg(unix)]
fn kill_group(child: &Child) {
    // The child was spawned with process_group(0), so its pid is the group id
    let pgid = child.id() as libc::pid_t;
    unsafe {
        libc::kill(-pgid, libc::SIGKILL);
    }
}

#[cfg(not(unix))]
fn kill_group(_child: &Child) {}

#[cfg(unix)]
fn exit_code(status: &ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    normalize_wait_status(status.into_raw())
}

#[cfg(not(unix))]
fn exit_code(status: &ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

/// Convert a raw POSIX wait status into a plain exit code.
///
/// Normal exit yields the low byte passed to `exit`; termination or stop by a
/// signal yields `128 + signal`, the shell convention.
pub fn normalize_wait_status(raw: i32) -> i32 {
    let term_sig = raw & 0x7f;
    match term_sig {
        0 => (raw >> 8) & 0xff,
        0x7f => 128 + ((raw >> 8) & 0xff),
        sig => 128 + sig,
    }
}
