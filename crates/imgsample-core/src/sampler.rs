//! Asynchronous, fire-and-maybe-deliver wrapper around the pipeline.
//!
//! [`ImageSampler::submit`] returns immediately. The pipeline runs on Tokio's
//! blocking pool; when it finishes, the completion task spawned at submission
//! hands the result to whichever listener is attached at that moment. That
//! task runs on a runtime worker, which is the submitting thread only on a
//! current-thread runtime. A host that goes away simply clears its listener:
//! the work still completes and the file is still written, but nobody is
//! called.
//!
//! Every pipeline failure is logged and collapsed to "no output". A run that
//! exceeds `limits.decode_timeout_ms` also reports no output, leaves no file
//! behind, and keeps the sampler busy until its worker has actually stopped.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::config::Config;
use crate::error::{PipelineError, PipelineResult, SamplerError};
use crate::pipeline::Processor;
use crate::types::{ImageRequest, OutputFile};

/// Receives the sampled file. Called at most once per submission, and only
/// on success.
pub trait ImageSampledListener: Send + Sync {
    fn on_image_sampled(&self, output: &OutputFile);
}

impl<F> ImageSampledListener for F
where
    F: Fn(&OutputFile) + Send + Sync,
{
    fn on_image_sampled(&self, output: &OutputFile) {
        self(output)
    }
}

type ListenerSlot = Arc<Mutex<Option<Arc<dyn ImageSampledListener>>>>;

/// Awaitable outcome of one submission.
///
/// Dropping the handle does not cancel the work.
pub struct SampleHandle {
    inner: JoinHandle<Option<OutputFile>>,
}

impl SampleHandle {
    /// Wait for the submission to finish, regardless of listener state.
    pub async fn join(self) -> Option<OutputFile> {
        match self.inner.await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!("Sampling task ended abnormally: {}", e);
                None
            }
        }
    }

    /// Whether the submission has finished (delivery included).
    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }
}

/// Single-flight sampler: at most one request runs per instance.
pub struct ImageSampler {
    processor: Arc<Processor>,
    timeout: Duration,
    listener: ListenerSlot,
    running: Arc<AtomicBool>,
}

impl ImageSampler {
    /// Create a sampler from the output and limit sections of `config`.
    pub fn new(config: &Config) -> Self {
        Self {
            processor: Arc::new(Processor::new(config)),
            timeout: Duration::from_millis(config.limits.decode_timeout_ms),
            listener: Arc::new(Mutex::new(None)),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Attach the listener that receives the next delivery.
    pub fn set_listener(&self, listener: Arc<dyn ImageSampledListener>) {
        *lock_slot(&self.listener) = Some(listener);
    }

    /// Detach the listener. An in-flight result is then dropped silently.
    pub fn clear_listener(&self) {
        *lock_slot(&self.listener) = None;
    }

    /// Whether a request is currently in flight.
    ///
    /// Turns false only after delivery to the listener has happened, or after
    /// an abandoned worker has finished and been cleaned up.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Build a request and submit it.
    pub fn sample(
        &self,
        source_path: impl Into<PathBuf>,
        output_directory: impl Into<PathBuf>,
        target_dimension: u32,
    ) -> Result<SampleHandle, SamplerError> {
        let request = ImageRequest::new(source_path, output_directory, target_dimension)?;
        self.submit(request)
    }

    /// Start processing `request` off the calling task.
    ///
    /// Must be called from within a Tokio runtime. Fails with
    /// [`SamplerError::Busy`] while a previous request is still running.
    pub fn submit(&self, request: ImageRequest) -> Result<SampleHandle, SamplerError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| SamplerError::Runtime(e.to_string()))?;

        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SamplerError::Busy);
        }

        let processor = Arc::clone(&self.processor);
        let listener = Arc::clone(&self.listener);
        let running = RunningGuard(Arc::clone(&self.running));
        let timeout = self.timeout;

        let inner = runtime.spawn(async move {
            let output = run_bounded(processor, request, timeout, running).await?;
            deliver(&listener, &output.file);
            // `output.running` drops here, after delivery
            Some(output.file)
        });

        Ok(SampleHandle { inner })
    }
}

/// Clears the running flag when dropped, including on panic or timeout hand-off.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A finished run that still owns the sampler's running flag.
struct Completed {
    file: OutputFile,
    running: RunningGuard,
}

/// Run the pipeline on the blocking pool, bounded by `timeout`.
///
/// On timeout the worker is flagged as abandoned and handed to a reaper task
/// together with the running flag: the sampler stays busy until the worker
/// really finishes, and anything it managed to write is removed.
async fn run_bounded(
    processor: Arc<Processor>,
    request: ImageRequest,
    timeout: Duration,
    running: RunningGuard,
) -> Option<Completed> {
    let source = request.source_path().to_path_buf();
    let abandoned = Arc::new(AtomicBool::new(false));
    let worker_abandoned = Arc::clone(&abandoned);
    let mut work =
        tokio::task::spawn_blocking(move || processor.run_unless(&request, &worker_abandoned));

    match tokio::time::timeout(timeout, &mut work).await {
        Ok(Ok(Ok(file))) => Some(Completed { file, running }),
        Ok(Ok(Err(e))) => {
            tracing::warn!("{}", e);
            None
        }
        Ok(Err(e)) => {
            tracing::warn!("Sampling worker for {:?} failed: {}", source, e);
            None
        }
        Err(_) => {
            abandoned.store(true, Ordering::Release);
            let err = PipelineError::Timeout {
                path: source,
                stage: "sample".to_string(),
                timeout_ms: timeout.as_millis() as u64,
            };
            tracing::warn!("{}", err);
            tokio::spawn(reap_abandoned(work, running));
            None
        }
    }
}

/// Wait out an abandoned worker, then release the sampler.
async fn reap_abandoned(work: JoinHandle<PipelineResult<OutputFile>>, running: RunningGuard) {
    // The worker may have passed its last abandon check before the flag was set
    if let Ok(Ok(file)) = work.await {
        match std::fs::remove_file(&file.path) {
            Ok(()) => tracing::debug!("Removed output of abandoned run {:?}", file.path),
            Err(e) => tracing::warn!("Could not remove abandoned output {:?}: {}", file.path, e),
        }
    }
    drop(running);
}

/// Hand `output` to the attached listener, if any.
///
/// The listener is cloned out under the lock and invoked after it is
/// released, so a concurrent `clear_listener` never blocks on a callback.
fn deliver(slot: &ListenerSlot, output: &OutputFile) {
    let listener = lock_slot(slot).clone();
    match listener {
        Some(listener) => listener.on_image_sampled(output),
        None => tracing::debug!("No listener attached; dropping {:?}", output.path),
    }
}

fn lock_slot(slot: &ListenerSlot) -> MutexGuard<'_, Option<Arc<dyn ImageSampledListener>>> {
    // The slot holds no invariant a panicking holder could break
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
