use crate::error::InvocationError;
use crate::timeout::{clamp_timeout, TimeBudget};
use std::fs;
use std::io::{self, Read};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;
use vyoma_config::RunConfig;

/// Fully derived scanner command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ScanCommand {
    pub fn from_config(config: &RunConfig) -> Self {
        let (program, prefix) = match config.scanner_command.split_first() {
            Some((program, prefix)) => (program.clone(), prefix.to_vec()),
            // validate_run_config rejects an empty command; keep the default shape anyway
            None => ("vyoma".to_string(), Vec::new()),
        };

        let mut args = prefix;
        args.extend(scanner_args(config));
        Self { program, args }
    }

    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// `-u <url> --<mode> --format <fmt> -o <dir> [--verbose]`
pub fn scanner_args(config: &RunConfig) -> Vec<String> {
    let mut args = vec![
        "-u".to_string(),
        config.target_url.clone(),
        config.scan_mode.flag(),
        "--format".to_string(),
        config.report_format.to_string(),
        "-o".to_string(),
        config.output_dir.display().to_string(),
    ];

    if config.verbose {
        args.push("--verbose".to_string());
    }

    args
}

/// Outcome of one scanner run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResult {
    /// `-1` when the process was ended by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
    pub elapsed: Duration,
}

impl InvocationResult {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == 0
    }

    /// Turn a timeout or non-zero exit into an error.
    pub fn check(self, timeout: Duration) -> Result<Self, InvocationError> {
        if self.timed_out {
            return Err(InvocationError::TimedOut { timeout });
        }
        if self.exit_code != 0 {
            return Err(InvocationError::NonZeroExit {
                code: self.exit_code,
                stderr: self.stderr,
            });
        }
        Ok(self)
    }
}

/// Seam between invocation logic and process spawning.
pub trait ScannerRunner {
    fn run(&self, command: &ScanCommand, timeout: Duration) -> io::Result<InvocationResult>;
}

/// Runs the scanner as a child process, polling until it exits or the
/// budget runs out.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    pub poll_interval: Duration,
    /// How long to wait for stdout/stderr readers after the child is gone.
    pub drain_grace: Duration,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            drain_grace: Duration::from_secs(2),
        }
    }
}

impl ScannerRunner for ProcessRunner {
    fn run(&self, command: &ScanCommand, timeout: Duration) -> io::Result<InvocationResult> {
        let budget = TimeBudget::new(timeout);

        let mut process = Command::new(&command.program);
        process
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // Own group, so helpers the scanner starts can be killed with it.
            process.process_group(0);
        }

        let mut child = process.spawn()?;
        let _active = ActiveScanner::register(child.id());

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let mut timed_out = false;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break Some(status);
            }
            match clamp_timeout(&budget, self.poll_interval) {
                Some(wait) => thread::sleep(wait),
                None => {
                    timed_out = true;
                    tracing::warn!(
                        pid = child.id(),
                        "Scanner exceeded {:?}, terminating",
                        timeout
                    );
                    terminate(&mut child);
                    break child.wait().ok();
                }
            }
        };

        Ok(InvocationResult {
            exit_code: status.and_then(|s| s.code()).unwrap_or(-1),
            stdout: collect(&stdout, self.drain_grace),
            stderr: collect(&stderr, self.drain_grace),
            timed_out,
            elapsed: budget.elapsed(),
        })
    }
}

/// Launch the scanner for `config`. Only launch problems are errors here; a
/// finished run is returned as-is and judged by the caller.
pub fn invoke(
    config: &RunConfig,
    runner: &dyn ScannerRunner,
) -> Result<InvocationResult, InvocationError> {
    fs::create_dir_all(&config.output_dir).map_err(|source| InvocationError::OutputDir {
        path: config.output_dir.clone(),
        source,
    })?;

    let command = ScanCommand::from_config(config);
    tracing::info!("Running security scan with command: {}", command.display());

    let result = runner
        .run(&command, config.timeout())
        .map_err(|source| InvocationError::Spawn {
            program: command.program.clone(),
            source,
        })?;

    tracing::info!(
        exit_code = result.exit_code,
        timed_out = result.timed_out,
        elapsed_ms = result.elapsed.as_millis() as u64,
        "Scanner finished"
    );
    if !result.stderr.trim().is_empty() {
        tracing::debug!("Scanner stderr:\n{}", result.stderr);
    }

    Ok(result)
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    if let Some(mut pipe) = pipe {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
        });
    }
    rx
}

fn collect(rx: &Receiver<String>, grace: Duration) -> String {
    // A grandchild that escaped the kill can hold the pipe open forever.
    rx.recv_timeout(grace).unwrap_or_default()
}

fn terminate(child: &mut Child) {
    kill_group(child.id());
    let _ = child.kill();
}

static ACTIVE_SCANNER_PID: AtomicU32 = AtomicU32::new(0);

/// Records the running scanner so an interrupt handler can reach it.
struct ActiveScanner;

impl ActiveScanner {
    fn register(pid: u32) -> Self {
        ACTIVE_SCANNER_PID.store(pid, Ordering::SeqCst);
        ActiveScanner
    }
}

impl Drop for ActiveScanner {
    fn drop(&mut self) {
        ACTIVE_SCANNER_PID.store(0, Ordering::SeqCst);
    }
}

/// Kill the scanner process group of the run in progress, if any.
pub fn terminate_active_scanner() -> bool {
    let pid = ACTIVE_SCANNER_PID.swap(0, Ordering::SeqCst);
    if pid == 0 {
        return false;
    }
    kill_group(pid);
    true
}

#[cfg(unix)]
fn kill_group(pgid: u32) {
    // The scanner is its own group leader, so pid == pgid.
    let group = format!("-{}", pgid);
    let status = Command::new("kill")
        .args(["-s", "KILL", "--", &group])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    if status.is_err() {
        // No kill binary on PATH; use the shell builtin.
        let _ = Command::new("sh")
            .args(["-c", &format!("kill -9 {}", group)])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
    }
}

#[cfg(not(unix))]
fn kill_group(_pgid: u32) {}
