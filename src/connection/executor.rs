//! Query executor 추상화
//!
//! The JMX protocol itself is spoken by an external executor. [`QueryExecutor`]
//! is the seam: one request in, the executor's JSON text out, with a hard
//! deadline. [`ProcessExecutor`] runs the packaged executor as a child process.

use async_trait::async_trait;
use serde::Deserialize;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, instrument, warn};

use crate::error::{QueryError, QueryResult};

/// Default runtime used to launch the executor
pub const DEFAULT_RUNTIME_PATH: &str = "java";

/// Default executor artifact
pub const DEFAULT_JAR_PATH: &str = "JMXQuery.jar";

/// One executor round trip
#[derive(Clone, Copy)]
pub struct ExecutorRequest<'a> {
    /// JMX service URL
    pub endpoint_uri: &'a str,
    pub username: Option<&'a str>,
    pub password: Option<&'a str>,
    /// Encoded `;`-terminated query batch
    pub batch: &'a str,
}

impl fmt::Debug for ExecutorRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutorRequest")
            .field("endpoint_uri", &self.endpoint_uri)
            .field("username", &self.username)
            .field("password", &self.password.map(|_| "***"))
            .field("batch", &self.batch)
            .finish()
    }
}

/// External query service
///
/// Implementations must stop the underlying work when `timeout` expires and
/// report [`QueryError::Timeout`]; no partial output may be returned.
#[async_trait]
pub trait QueryExecutor: Send + Sync + fmt::Debug {
    /// Run one request and return the executor's JSON output
    async fn execute(&self, request: &ExecutorRequest<'_>, timeout: Duration)
        -> QueryResult<String>;
}

/// Child process executor
///
/// Invokes `<runtime> <launch args> -url <uri> [-u <user> -p <pass>] -q <batch> -json`.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    runtime_path: PathBuf,
    launch_args: Vec<OsString>,
}

impl Default for ProcessExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_RUNTIME_PATH)
    }
}

impl ProcessExecutor {
    /// Executor launched by `runtime_path -jar JMXQuery.jar`
    pub fn new(runtime_path: impl Into<PathBuf>) -> Self {
        Self {
            runtime_path: runtime_path.into(),
            launch_args: jar_args(Path::new(DEFAULT_JAR_PATH)),
        }
    }

    /// Use a different executor jar
    pub fn with_jar(mut self, jar_path: impl AsRef<Path>) -> Self {
        self.launch_args = jar_args(jar_path.as_ref());
        self
    }

    /// Replace the arguments placed between the runtime and `-url`
    ///
    /// Useful when the executor is not a jar, e.g. a wrapper script.
    pub fn with_launch_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.launch_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn runtime_path(&self) -> &Path {
        &self.runtime_path
    }

    /// Full argument list for one request
    pub fn arguments(&self, request: &ExecutorRequest<'_>) -> Vec<OsString> {
        let mut args = self.launch_args.clone();

        args.push("-url".into());
        args.push(request.endpoint_uri.into());

        if let Some(username) = request.username {
            args.push("-u".into());
            args.push(username.into());
            args.push("-p".into());
            args.push(request.password.unwrap_or_default().into());
        }

        args.push("-q".into());
        args.push(request.batch.into());
        args.push("-json".into());

        args
    }

    fn spawn(&self, request: &ExecutorRequest<'_>) -> QueryResult<Child> {
        let mut command = Command::new(&self.runtime_path);
        command
            .args(self.arguments(request))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own process group, so wrapper scripts take their children down with them
        #[cfg(unix)]
        command.process_group(0);

        command
            .spawn()
            .map_err(|source| QueryError::Launch {
                program: self.runtime_path.display().to_string(),
                source,
            })
    }
}

fn jar_args(jar_path: &Path) -> Vec<OsString> {
    vec!["-jar".into(), jar_path.as_os_str().to_os_string()]
}

/// Captured executor output
struct Output {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

/// Waits for the executor and drains both pipes.
///
/// Once the executor exits, whatever it left running in its process group is
/// killed, so an orphan holding a pipe open cannot stall the read.
async fn collect_output(child: &mut Child) -> std::io::Result<Output> {
    let pid = child.id();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let exited = async {
        let status = child.wait().await?;
        kill_group(pid);
        Ok::<_, std::io::Error>(status)
    };

    let (status, stdout, stderr) = tokio::try_join!(exited, read_all(stdout), read_all(stderr))?;

    Ok(Output {
        status,
        stdout,
        stderr,
    })
}

async fn read_all<R: AsyncRead + Unpin>(pipe: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

/// SIGKILL the executor's process group
#[cfg(unix)]
fn kill_group(pid: Option<u32>) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pid) = pid.and_then(|pid| i32::try_from(pid).ok()) else {
        return;
    };

    match killpg(Pid::from_raw(pid), Signal::SIGKILL) {
        // Group already empty
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => warn!(pid, error = %e, "Failed to kill executor process group"),
    }
}

#[cfg(not(unix))]
fn kill_group(_pid: Option<u32>) {}

/// Error envelope printed by the executor in `-json` mode
#[derive(Deserialize)]
struct ErrorEnvelope {
    error: String,
}

fn failure(output: &Output) -> QueryError {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    let kind = serde_json::from_str::<ErrorEnvelope>(stdout.trim())
        .ok()
        .map(|envelope| envelope.error);

    // stdout first: the envelope lives there, stderr may only be JVM noise
    let mut diagnostic = String::new();
    for stream in [&stdout, &stderr] {
        if stream.trim().is_empty() {
            continue;
        }
        if !diagnostic.is_empty() && !diagnostic.ends_with('\n') {
            diagnostic.push('\n');
        }
        diagnostic.push_str(stream);
    }

    QueryError::ExecutorFailure {
        status: output.status.code(),
        kind,
        diagnostic,
    }
}

#[async_trait]
impl QueryExecutor for ProcessExecutor {
    #[instrument(skip(self, request), fields(runtime = %self.runtime_path.display(), endpoint = %request.endpoint_uri))]
    async fn execute(
        &self,
        request: &ExecutorRequest<'_>,
        timeout: Duration,
    ) -> QueryResult<String> {
        let mut child = self.spawn(request)?;
        let pid = child.id();
        debug!(pid, "Executor started");

        let outcome = tokio::time::timeout(timeout, collect_output(&mut child)).await;
        let output = match outcome {
            Ok(result) => result.map_err(|e| QueryError::ExecutorFailure {
                status: None,
                kind: None,
                diagnostic: format!("Failed to read executor output: {}", e),
            })?,
            Err(_) => {
                warn!(pid, ?timeout, "Executor timed out, killing");
                kill_group(pid);
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "Failed to kill executor");
                }
                return Err(QueryError::Timeout(timeout));
            }
        };

        if !output.status.success() {
            let err = failure(&output);
            warn!(status = ?output.status.code(), error = %err, "Executor failed");
            return Err(err);
        }

        if !output.stderr.is_empty() {
            debug!(
                stderr = %String::from_utf8_lossy(&output.stderr),
                "Executor wrote diagnostics"
            );
        }

        String::from_utf8(output.stdout)
            .map_err(|e| QueryError::ParseError(format!("Executor output is not UTF-8: {}", e)))
    }
}
