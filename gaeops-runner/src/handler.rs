use chrono::{DateTime, Utc};
use gaeops_core::ProcessHandlerError;
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, BufReader, Read};
use std::process::{Child, ExitStatus};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Instant;
use tracing::{debug, info};

/// Consumes a spawned gcloud process and decides whether it succeeded.
pub trait ProcessHandler<P> {
    fn handle_process(&self, process: P) -> Result<(), ProcessHandlerError>;
}

impl<P, H> ProcessHandler<P> for Arc<H>
where
    H: ProcessHandler<P> + ?Sized,
{
    fn handle_process(&self, process: P) -> Result<(), ProcessHandlerError> {
        (**self).handle_process(process)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Receives process output one line at a time. Called from two threads.
pub trait LineListener: Send + Sync {
    fn on_line(&self, stream: OutputStream, line: &str);
}

impl<F> LineListener for F
where
    F: Fn(OutputStream, &str) + Send + Sync,
{
    fn on_line(&self, stream: OutputStream, line: &str) {
        self(stream, line)
    }
}

/// Forwards every line to the `gcloud` tracing target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLineListener;

impl LineListener for TracingLineListener {
    fn on_line(&self, stream: OutputStream, line: &str) {
        info!(target: "gcloud", stream = ?stream, "{}", line);
    }
}

fn pump_lines<R: Read>(
    reader: R,
    stream: OutputStream,
    listener: &dyn LineListener,
) -> io::Result<()> {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        listener.on_line(stream, line.trim_end_matches(['\n', '\r']));
    }
}

/// Drains stdout and stderr concurrently, then waits for the exit status.
fn consume(mut child: Child, listener: &dyn LineListener) -> Result<ExitStatus, ProcessHandlerError> {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    thread::scope(|scope| -> io::Result<()> {
        let stderr_pump =
            stderr.map(|err| scope.spawn(move || pump_lines(err, OutputStream::Stderr, listener)));
        if let Some(out) = stdout {
            pump_lines(out, OutputStream::Stdout, listener)?;
        }
        if let Some(handle) = stderr_pump {
            handle
                .join()
                .map_err(|_| io::Error::new(io::ErrorKind::Other, "stderr reader panicked"))??;
        }
        Ok(())
    })?;

    let status = child.wait()?;
    debug!(exit_code = ?status.code(), "gcloud process exited");
    Ok(status)
}

fn check_exit(status: ExitStatus) -> Result<(), ProcessHandlerError> {
    if status.success() {
        Ok(())
    } else {
        Err(ProcessHandlerError::NonZeroExit {
            code: status.code(),
        })
    }
}

/// Streams output lines to a listener and fails on a non-zero exit.
pub struct StreamingProcessHandler {
    listener: Box<dyn LineListener>,
}

impl StreamingProcessHandler {
    pub fn new() -> Self {
        Self::with_listener(TracingLineListener)
    }

    pub fn with_listener<L: LineListener + 'static>(listener: L) -> Self {
        Self {
            listener: Box::new(listener),
        }
    }
}

impl Default for StreamingProcessHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessHandler<Child> for StreamingProcessHandler {
    fn handle_process(&self, process: Child) -> Result<(), ProcessHandlerError> {
        let status = consume(process, self.listener.as_ref())?;
        check_exit(status)
    }
}

/// Output of one finished gcloud process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Default)]
struct CaptureBuffers {
    stdout: Mutex<String>,
    stderr: Mutex<String>,
}

impl LineListener for CaptureBuffers {
    fn on_line(&self, stream: OutputStream, line: &str) {
        let buffer = match stream {
            OutputStream::Stdout => &self.stdout,
            OutputStream::Stderr => &self.stderr,
        };
        let mut buffer = buffer.lock().unwrap_or_else(PoisonError::into_inner);
        buffer.push_str(line);
        buffer.push('\n');
    }
}

/// Collects the full output of the process for the caller to inspect.
///
/// The capture of the last handled process is kept even when it exited with
/// a failure status, so stderr is available for error reporting.
#[derive(Debug, Default)]
pub struct CapturingProcessHandler {
    output: Mutex<Option<CapturedOutput>>,
}

impl CapturingProcessHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take_output(&self) -> Option<CapturedOutput> {
        self.output
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl ProcessHandler<Child> for CapturingProcessHandler {
    fn handle_process(&self, process: Child) -> Result<(), ProcessHandlerError> {
        let started_at = Utc::now();
        let start_instant = Instant::now();

        let buffers = CaptureBuffers::default();
        let status = consume(process, &buffers)?;

        let captured = CapturedOutput {
            stdout: buffers.stdout.into_inner().unwrap_or_else(PoisonError::into_inner),
            stderr: buffers.stderr.into_inner().unwrap_or_else(PoisonError::into_inner),
            exit_code: status.code(),
            duration_ms: start_instant.elapsed().as_millis() as u64,
            started_at,
            completed_at: Utc::now(),
        };
        *self.output.lock().unwrap_or_else(PoisonError::into_inner) = Some(captured);

        check_exit(status)
    }
}
