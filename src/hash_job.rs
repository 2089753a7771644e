use crate::block_hasher::{HashOutcome, HashProgress};
use crate::error::{HashJobError, Result};
use crate::hash_file::{HashFile, OutputBase};
use crate::{compute_file_hash_with_options, get_hash_type_from_str, HashType, CHUNK_SIZE};
use crossbeam::channel::{after, bounded, select, unbounded, Receiver, Sender};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Events of one job: zero or more `Progress`, then exactly one `Finished`.
#[derive(Clone, Debug, PartialEq)]
pub enum HashEvent {
    Progress(HashProgress),
    Finished(HashJobResult),
}

#[derive(Clone, Debug, PartialEq)]
pub struct HashJobResult {
    pub file_path: PathBuf,
    pub hash_type: HashType,
    pub outcome: HashOutcome,
    pub elapsed: Duration,
}

#[derive(Clone, Debug, Default)]
pub struct HashJobOptions {
    pub hash_type: Option<HashType>,
    pub chunk_size: Option<usize>,
    pub notification_block_size: Option<u64>,
    pub timeout: Option<Duration>,
    pub output_base: Option<OutputBase>,
}

struct HashJobRequest {
    file_path: PathBuf,
    hash_type: HashType,
    cancellation_token: CancellationToken,
}

#[derive(Default)]
struct JobState {
    running: Option<CancellationToken>,
    last_result: Option<HashJobResult>,
}

fn lock_state(state: &Mutex<JobState>) -> MutexGuard<'_, JobState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Cancels whatever job is running on the controller it came from.
#[derive(Clone)]
pub struct HashJobCanceller {
    state: Arc<Mutex<JobState>>,
}

impl HashJobCanceller {
    pub fn cancel(&self) {
        if let Some(cancellation_token) = &lock_state(&self.state).running {
            if !cancellation_token.is_cancelled() {
                info!("Cancelling hash job.");
                cancellation_token.cancel();
            }
        }
    }
}

/// Runs hash jobs one at a time on a dedicated worker thread.
///
/// `start` and `cancel` never wait for file I/O. A `start` while a job is
/// in flight is rejected with `HashJobError::AlreadyRunning`. Dropping the
/// controller cancels the running job and joins the worker.
pub struct HashJobController {
    hash_type: HashType,
    output_base: OutputBase,
    state: Arc<Mutex<JobState>>,
    shutdown_token: CancellationToken,
    request_sender: Option<Sender<HashJobRequest>>,
    event_receiver: Receiver<HashEvent>,
    worker: Option<JoinHandle<()>>,
}

impl HashJobController {
    pub fn new(options: HashJobOptions) -> Self {
        let state = Arc::new(Mutex::new(JobState::default()));
        let (request_sender, request_receiver) = unbounded();
        let (event_sender, event_receiver) = unbounded();
        let worker = HashJobWorker {
            state: state.clone(),
            event_sender,
            chunk_size: options.chunk_size.unwrap_or(CHUNK_SIZE),
            notification_block_size: options.notification_block_size,
            timeout: options.timeout,
        };

        HashJobController {
            hash_type: options.hash_type.unwrap_or_default(),
            output_base: options.output_base.unwrap_or_default(),
            state,
            shutdown_token: CancellationToken::new(),
            request_sender: Some(request_sender),
            event_receiver,
            worker: Some(std::thread::spawn(move || worker.run(request_receiver))),
        }
    }

    pub fn hash_type(&self) -> HashType {
        self.hash_type
    }

    /// Selects the algorithm of the next job. The running job, if any, keeps
    /// the algorithm it started with.
    pub fn set_algorithm(&mut self, selector: &str) -> Result<()> {
        match get_hash_type_from_str(selector) {
            Ok(hash_type) => {
                debug!(%hash_type, "Algorithm selected.");
                self.hash_type = hash_type;
                Ok(())
            }
            Err(error) => {
                warn!("{}", error);
                Err(error)
            }
        }
    }

    pub fn event_receiver(&self) -> Receiver<HashEvent> {
        self.event_receiver.clone()
    }

    pub fn canceller(&self) -> HashJobCanceller {
        HashJobCanceller {
            state: self.state.clone(),
        }
    }

    pub fn is_running(&self) -> bool {
        lock_state(&self.state).running.is_some()
    }

    /// The last job that ended with a digest.
    pub fn last_result(&self) -> Option<HashJobResult> {
        lock_state(&self.state).last_result.clone()
    }

    pub fn start<P: AsRef<Path>>(&self, file_path: P) -> Result<()> {
        let file_path = file_path.as_ref();
        if file_path.as_os_str().is_empty() {
            return Err(HashJobError::FileAccess {
                path: file_path.display().to_string(),
                reason: "invalid file path".into(),
            });
        }

        let mut state = lock_state(&self.state);
        if state.running.is_some() {
            warn!(file = %file_path.display(), "Rejected hash job, another one is running.");
            return Err(HashJobError::AlreadyRunning);
        }

        let request_sender = self
            .request_sender
            .as_ref()
            .ok_or(HashJobError::Disconnected)?;
        let cancellation_token = self.shutdown_token.child_token();
        request_sender
            .send(HashJobRequest {
                file_path: file_path.to_path_buf(),
                hash_type: self.hash_type,
                cancellation_token: cancellation_token.clone(),
            })
            .map_err(|_| HashJobError::Disconnected)?;
        state.running = Some(cancellation_token);
        Ok(())
    }

    pub fn cancel(&self) {
        self.canceller().cancel();
    }

    /// Saves the last digest under the configured output base.
    pub fn save_result(&self) -> Result<PathBuf> {
        let base_path = self.output_base.resolve()?;
        self.save_result_to(&base_path)
    }

    pub fn save_result_to(&self, base_path: &Path) -> Result<PathBuf> {
        let result = self
            .last_result()
            .ok_or_else(|| HashJobError::SaveFailure("no hash to save".into()))?;
        let saved_path = HashFile::new(&result)?.save(base_path)?;
        info!(path = %saved_path.display(), "Hash saved.");
        Ok(saved_path)
    }
}

impl Drop for HashJobController {
    fn drop(&mut self) {
        self.shutdown_token.cancel();
        drop(self.request_sender.take());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Hash job worker panicked.");
            }
        }
    }
}

struct HashJobWorker {
    state: Arc<Mutex<JobState>>,
    event_sender: Sender<HashEvent>,
    chunk_size: usize,
    notification_block_size: Option<u64>,
    timeout: Option<Duration>,
}

impl HashJobWorker {
    fn run(self, request_receiver: Receiver<HashJobRequest>) {
        for request in request_receiver.iter() {
            self.process(request);
        }

        debug!("Hash job worker stopped.");
    }

    fn process(&self, request: HashJobRequest) {
        let _running_guard = RunningGuard { state: &self.state };
        info!(
            file = %request.file_path.display(),
            hash_type = %request.hash_type,
            "Hash job started."
        );
        let start = Instant::now();
        let watchdog = self
            .timeout
            .map(|timeout| spawn_watchdog(request.cancellation_token.clone(), timeout));
        let outcome = compute_file_hash_with_options(
            &request.file_path,
            request.hash_type,
            &request.cancellation_token,
            Some(self.event_sender.clone()),
            self.chunk_size,
            self.notification_block_size,
        );
        if let Some((done_sender, watchdog)) = watchdog {
            drop(done_sender);
            let _ = watchdog.join();
        }

        let result = HashJobResult {
            file_path: request.file_path,
            hash_type: request.hash_type,
            outcome,
            elapsed: start.elapsed(),
        };
        match &result.outcome {
            HashOutcome::Success(digest) => info!(%digest, "Hash job completed."),
            HashOutcome::Cancelled => info!("Hash job cancelled."),
            HashOutcome::Failed(error) => warn!("Hash job failed: {}", error),
        }

        // Cleared before the terminal event so a caller reacting to it can
        // start the next job right away.
        {
            let mut state = lock_state(&self.state);
            state.running = None;
            if result.outcome.digest().is_some() {
                state.last_result = Some(result.clone());
            }
        }

        let _ = self.event_sender.send(HashEvent::Finished(result));
    }
}

/// Clears the running job if the worker unwinds mid-job, so later starts
/// see `Disconnected` instead of `AlreadyRunning`.
struct RunningGuard<'a> {
    state: &'a Mutex<JobState>,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        // On a normal return the running job was already cleared, and a new
        // one may have been registered since.
        if std::thread::panicking() {
            lock_state(self.state).running = None;
        }
    }
}

/// Cancels `cancellation_token` once `timeout` elapses, unless the returned
/// sender is dropped first.
fn spawn_watchdog(
    cancellation_token: CancellationToken,
    timeout: Duration,
) -> (Sender<()>, JoinHandle<()>) {
    let (done_sender, done_receiver) = bounded::<()>(0);
    let watchdog = std::thread::spawn(move || {
        select! {
            recv(done_receiver) -> _ => (),
            recv(after(timeout)) -> _ => {
                warn!("Hash job timed out after {:?}.", timeout);
                cancellation_token.cancel();
            },
        }
    });

    (done_sender, watchdog)
}
