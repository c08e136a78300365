use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use collector_logging::{collector_debug, collector_error, collector_info, collector_warn};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::protocol::{classify_stderr_line, classify_stdout_line};
use crate::resolve::resolve_script;
use crate::{
    JobId, JobRequest, LineDecoder, ProcessTerminator, RunnerConfig, RunnerError, RunnerEvent,
    RunnerState, RunningJob, StatusEvent, SystemTerminator,
};

/// How long output readers may keep draining once the worker itself has exited.
/// A grandchild that inherited the pipes must not hold the runner out of `Idle`.
const READER_DRAIN_GRACE: Duration = Duration::from_secs(2);

const NO_ACTIVE_JOB_NOTICE: &str = "no active job to stop";

#[derive(Debug)]
enum Slot {
    Idle,
    Running(RunningJob),
    Stopping(RunningJob),
}

impl Slot {
    fn job(&self) -> Option<&RunningJob> {
        match self {
            Slot::Idle => None,
            Slot::Running(job) | Slot::Stopping(job) => Some(job),
        }
    }

    fn job_id(&self) -> Option<JobId> {
        self.job().map(|job| job.job_id)
    }

    fn state(&self) -> RunnerState {
        match self {
            Slot::Idle => RunnerState::Idle,
            Slot::Running(_) => RunnerState::Running,
            Slot::Stopping(_) => RunnerState::Stopping,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum OutputStream {
    Stdout,
    Stderr,
}

struct Shared {
    config: RunnerConfig,
    decoder: LineDecoder,
    terminator: Arc<dyn ProcessTerminator>,
    slot: Mutex<Slot>,
    event_tx: mpsc::Sender<RunnerEvent>,
    next_job_id: AtomicU64,
}

impl Shared {
    fn lock_slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, job_id: Option<JobId>, status: StatusEvent) {
        let _ = self.event_tx.send(RunnerEvent { job_id, status });
    }

    fn build_command(&self, script: &Path, request: &JobRequest) -> Command {
        let config = &self.config;
        let interpreter = config.interpreter.trim();
        let mut command = if interpreter.is_empty() {
            std::process::Command::new(script)
        } else {
            let mut command = std::process::Command::new(interpreter);
            command.arg(script);
            command
        };
        command
            .arg(request.joined_keywords())
            .arg(request.output_path().trim())
            .envs(&config.environment)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &config.working_dir {
            command.current_dir(dir);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // Own process group, so the whole tree can be signalled at once.
            command.process_group(0);
        }
        Command::from(command)
    }

    /// Exit path for a spawned worker: release the slot (if still ours) and
    /// publish the terminal event while holding the lock, so a concurrent
    /// `start` sees either the old job or a fully idle runner.
    fn finish(&self, job_id: JobId, code: Option<i32>) {
        let mut slot = self.lock_slot();
        if slot.job_id() == Some(job_id) {
            *slot = Slot::Idle;
        } else {
            collector_debug!("Job {} exited after its slot was released", job_id);
        }
        collector_info!("Job {} exited with code {:?}", job_id, code);
        self.emit(Some(job_id), StatusEvent::ProcessExited { code });
    }
}

/// Single-flight owner of the worker process.
///
/// Public operations never wait for the worker: `start` returns once the
/// process is spawned and `stop` once the kill request is issued. Everything
/// after that arrives as [`RunnerEvent`]s via [`JobRunner::try_recv`] or
/// [`JobRunner::recv_timeout`].
pub struct JobRunner {
    shared: Arc<Shared>,
    runtime: Option<Runtime>,
    event_rx: mpsc::Receiver<RunnerEvent>,
}

impl JobRunner {
    pub fn new(config: RunnerConfig) -> Result<Self, RunnerError> {
        Self::with_terminator(config, Arc::new(SystemTerminator))
    }

    pub fn with_terminator(
        config: RunnerConfig,
        terminator: Arc<dyn ProcessTerminator>,
    ) -> Result<Self, RunnerError> {
        let decoder = LineDecoder::for_label(config.output_encoding.as_deref())
            .map_err(|err| RunnerError::Setup(err.to_string()))?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("collector-runner")
            .enable_all()
            .build()
            .map_err(|err| RunnerError::Setup(err.to_string()))?;
        let (event_tx, event_rx) = mpsc::channel();

        collector_debug!("Job runner ready (output encoding {})", decoder.encoding_name());

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                decoder,
                terminator,
                slot: Mutex::new(Slot::Idle),
                event_tx,
                next_job_id: AtomicU64::new(1),
            }),
            runtime: Some(runtime),
            event_rx,
        })
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.shared.config
    }

    pub fn state(&self) -> RunnerState {
        self.shared.lock_slot().state()
    }

    pub fn current_job(&self) -> Option<RunningJob> {
        self.shared.lock_slot().job().cloned()
    }

    pub fn try_recv(&self) -> Option<RunnerEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<RunnerEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Launch the worker for `request`.
    ///
    /// Rejections (`AlreadyRunning`, `InvalidRequest`) emit nothing. A missing
    /// script emits one `Failed`; a spawn error emits `Failed` then
    /// `ProcessExited { code: None }`. The runner is `Idle` after every error.
    pub fn start(&self, request: &JobRequest) -> Result<JobId, RunnerError> {
        let runtime = self
            .runtime
            .as_ref()
            .ok_or_else(|| RunnerError::Setup("runtime already stopped".into()))?;

        let mut slot = self.shared.lock_slot();
        if let Some(active) = slot.job() {
            collector_warn!(
                "Rejected start: job {} is {:?}",
                active.job_id,
                slot.state()
            );
            return Err(RunnerError::AlreadyRunning);
        }
        request.validate()?;

        let (primary, fallbacks) = self.shared.config.script_candidates();
        let script = match resolve_script(&primary, &fallbacks) {
            Ok(script) => script,
            Err(err) => {
                let err = RunnerError::from(err);
                collector_error!("{}", err);
                self.shared.emit(
                    None,
                    StatusEvent::Failed {
                        reason: err.to_string(),
                    },
                );
                return Err(err);
            }
        };

        let job_id = self.shared.next_job_id.fetch_add(1, Ordering::Relaxed);
        let mut command = self.shared.build_command(&script.path, request);
        let spawned = {
            let _guard = runtime.enter();
            command.spawn()
        };
        let child = match spawned {
            Ok(child) => child,
            Err(err) => {
                let err = RunnerError::SpawnFailure(err.to_string());
                collector_error!("Job {}: {}", job_id, err);
                self.shared.emit(
                    Some(job_id),
                    StatusEvent::Failed {
                        reason: err.to_string(),
                    },
                );
                self.shared
                    .emit(Some(job_id), StatusEvent::ProcessExited { code: None });
                return Err(err);
            }
        };

        let job = RunningJob {
            job_id,
            pid: child.id(),
            started_at: Utc::now(),
            script,
        };
        collector_info!(
            "Job {} started: pid={:?} script={:?} ({}) keywords={:?}",
            job_id,
            job.pid,
            job.script.path,
            job.script.source,
            request.joined_keywords()
        );
        *slot = Slot::Running(job);
        runtime.spawn(observe(self.shared.clone(), job_id, child));
        Ok(job_id)
    }

    /// Request whole-tree termination of the running worker.
    ///
    /// Returns once the request is issued; `ProcessExited` follows when the
    /// exit is observed. A rejected kill request is reported as `Failed` and
    /// the runner returns to `Idle` regardless.
    pub fn stop(&self) -> Result<(), RunnerError> {
        let mut slot = self.shared.lock_slot();
        let job = match &*slot {
            Slot::Idle => {
                collector_info!("Stop requested with no active job");
                self.shared.emit(
                    None,
                    StatusEvent::Progress {
                        text: NO_ACTIVE_JOB_NOTICE.to_string(),
                    },
                );
                return Err(RunnerError::NoActiveJob);
            }
            Slot::Stopping(job) => {
                collector_debug!("Job {} is already stopping", job.job_id);
                return Ok(());
            }
            Slot::Running(job) => job.clone(),
        };
        *slot = Slot::Stopping(job.clone());

        let Some(pid) = job.pid else {
            collector_debug!("Job {} has no pid; exit already pending", job.job_id);
            return Ok(());
        };
        collector_info!("Terminating job {} process tree (pid {})", job.job_id, pid);
        if let Err(err) = self.shared.terminator.terminate_tree(pid) {
            let err = RunnerError::TerminationFailure(err.to_string());
            collector_error!("Job {}: {}", job.job_id, err);
            *slot = Slot::Idle;
            self.shared.emit(
                Some(job.job_id),
                StatusEvent::Failed {
                    reason: err.to_string(),
                },
            );
        }
        Ok(())
    }

    /// Host teardown: kill any tracked worker tree now and forget it. Idempotent.
    pub fn shutdown(&self) {
        let mut slot = self.shared.lock_slot();
        let job = match std::mem::replace(&mut *slot, Slot::Idle) {
            Slot::Idle => return,
            Slot::Running(job) | Slot::Stopping(job) => job,
        };
        collector_info!("Shutdown: terminating job {}", job.job_id);
        if let Some(pid) = job.pid {
            if let Err(err) = self.shared.terminator.terminate_tree(pid) {
                collector_warn!("Shutdown could not terminate pid {}: {}", pid, err);
            }
        }
    }
}

impl Drop for JobRunner {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

async fn observe(shared: Arc<Shared>, job_id: JobId, mut child: Child) {
    let stdout_reader = child
        .stdout
        .take()
        .map(|stdout| spawn_reader(shared.clone(), job_id, stdout, OutputStream::Stdout));
    let stderr_reader = child
        .stderr
        .take()
        .map(|stderr| spawn_reader(shared.clone(), job_id, stderr, OutputStream::Stderr));

    let code = match child.wait().await {
        Ok(status) => status.code(),
        Err(err) => {
            collector_error!("Job {}: waiting for worker failed: {}", job_id, err);
            None
        }
    };

    // One grace window shared by both streams.
    let deadline = Instant::now() + READER_DRAIN_GRACE;
    for reader in [stdout_reader, stderr_reader].into_iter().flatten() {
        drain_reader(job_id, reader, deadline).await;
    }
    shared.finish(job_id, code);
}

fn spawn_reader<R>(
    shared: Arc<Shared>,
    job_id: JobId,
    stream: R,
    source: OutputStream,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move { pump_lines(&shared, job_id, stream, source).await })
}

async fn pump_lines<R>(shared: &Shared, job_id: JobId, stream: R, source: OutputStream)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = shared.decoder.decode(&buf);
                match source {
                    OutputStream::Stdout => {
                        collector_debug!("Job {} stdout: {}", job_id, line.trim_end());
                        for status in classify_stdout_line(&line) {
                            shared.emit(Some(job_id), status);
                        }
                    }
                    OutputStream::Stderr => {
                        collector_warn!("Job {} stderr: {}", job_id, line.trim_end());
                        shared.emit(Some(job_id), classify_stderr_line(&line));
                    }
                }
            }
            Err(err) => {
                collector_warn!("Job {}: reading {:?} failed: {}", job_id, source, err);
                break;
            }
        }
    }
}

async fn drain_reader(job_id: JobId, mut reader: JoinHandle<()>, deadline: Instant) {
    if tokio::time::timeout_at(deadline, &mut reader)
        .await
        .is_err()
    {
        collector_warn!(
            "Job {}: output pipe still open {:?} after exit; abandoning reader",
            job_id,
            READER_DRAIN_GRACE
        );
        reader.abort();
        let _ = reader.await;
    }
}
