// ABOUTME: Ingestion pipeline that turns user-selected image files into API-ready data URIs
// ABOUTME: Races a parallel encode task against a deadline, falls back to sequential encoding

use async_trait::async_trait;
use log;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::compress::{CompressionConfig, Compressor};
use crate::constants::{images, timeouts};
use crate::error::{PartlensError, Result};
use crate::media::{EncodedImage, SourceFile};
use crate::settle::Settlement;

/// Input handed to the parallel encode task.
#[derive(Debug, Clone)]
pub struct WorkerRequest {
    pub files: Vec<SourceFile>,
}

/// Messages the parallel encode task sends back to the pipeline.
#[derive(Debug, Clone)]
pub enum WorkerMessage {
    Progress { current: usize, total: usize },
    Done { images: Vec<EncodedImage> },
    Error { message: String },
}

/// The parallel encoding strategy. Implementations communicate only through
/// `sender`; returning without sending `Done` counts as a failure.
#[async_trait]
pub trait EncodeWorker: Send + Sync {
    async fn run(&self, request: WorkerRequest, sender: mpsc::UnboundedSender<WorkerMessage>);
}

/// Default worker: reads each file asynchronously and base64-encodes it.
#[derive(Debug, Default, Clone, Copy)]
pub struct TaskEncodeWorker;

#[async_trait]
impl EncodeWorker for TaskEncodeWorker {
    async fn run(&self, request: WorkerRequest, sender: mpsc::UnboundedSender<WorkerMessage>) {
        let total = request.files.len();
        let mut staged: Vec<EncodedImage> = request
            .files
            .iter()
            .enumerate()
            .map(|(index, file)| EncodedImage::pending(index, file))
            .collect();

        for (index, (image, file)) in staged.iter_mut().zip(&request.files).enumerate() {
            let bytes = match file.read().await {
                Ok(bytes) => bytes,
                Err(e) => {
                    let _ = sender.send(WorkerMessage::Error {
                        message: format!("Failed to read {}: {}", file.name, e),
                    });
                    return;
                }
            };

            image.attach(&bytes);

            let progress = WorkerMessage::Progress {
                current: index + 1,
                total,
            };
            if sender.send(progress).is_err() {
                // Pipeline stopped listening
                return;
            }
        }

        let _ = sender.send(WorkerMessage::Done { images: staged });
    }
}

/// Limits checked before a batch is accepted.
#[derive(Debug, Clone)]
pub struct IngestLimits {
    pub max_files: usize,
    pub max_file_bytes: u64,
    pub allowed_types: Vec<String>,
}

impl Default for IngestLimits {
    fn default() -> Self {
        Self {
            max_files: images::MAX_FILES,
            max_file_bytes: images::MAX_FILE_BYTES,
            allowed_types: images::ALLOWED_TYPES.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl IngestLimits {
    pub fn validate(&self, files: &[SourceFile]) -> Result<()> {
        if files.len() > self.max_files {
            return Err(PartlensError::Validation(format!(
                "At most {} images are allowed",
                self.max_files
            )));
        }

        for file in files {
            if !self.allowed_types.iter().any(|t| t == &file.mime_type) {
                return Err(PartlensError::Validation(format!(
                    "File type not allowed: {} ({})",
                    file.mime_type, file.name
                )));
            }
            if file.byte_size > self.max_file_bytes {
                return Err(PartlensError::Validation(format!(
                    "File too large: {}",
                    file.name
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// How long the parallel task may run before the fallback takes over
    pub worker_timeout: Duration,
    /// `None` skips compression and returns the raw encodings
    pub compression: Option<CompressionConfig>,
    pub limits: IngestLimits,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            worker_timeout: timeouts::WORKER_TIMEOUT,
            compression: Some(CompressionConfig::default()),
            limits: IngestLimits::default(),
        }
    }
}

/// Forwards progress to the caller, dropping anything that is not a strict
/// increase so a fallback restart never makes the count go backwards.
pub struct ProgressReporter<F> {
    callback: F,
    total: usize,
    reported: usize,
}

impl<F: FnMut(usize, usize)> ProgressReporter<F> {
    pub fn new(total: usize, callback: F) -> Self {
        Self {
            callback,
            total,
            reported: 0,
        }
    }

    pub fn report(&mut self, current: usize) {
        let current = current.min(self.total);
        if current > self.reported {
            self.reported = current;
            (self.callback)(current, self.total);
        }
    }

    pub fn completed(&self) -> usize {
        self.reported
    }
}

#[derive(Debug, Clone, PartialEq)]
enum FallbackReason {
    WorkerError(String),
    WorkerExited,
    MalformedOutput(String),
    DeadlineElapsed(Duration),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::WorkerError(message) => write!(f, "worker error: {message}"),
            FallbackReason::WorkerExited => write!(f, "worker exited without a result"),
            FallbackReason::MalformedOutput(detail) => write!(f, "malformed worker output: {detail}"),
            FallbackReason::DeadlineElapsed(after) => {
                write!(f, "worker missed its {}ms deadline", after.as_millis())
            }
        }
    }
}

/// Which strategy produces the job's result.
#[derive(Debug)]
enum Resolution {
    Worker(Vec<EncodedImage>),
    Fallback(FallbackReason),
}

pub struct IngestionPipeline {
    config: IngestConfig,
    worker: Arc<dyn EncodeWorker>,
}

impl Default for IngestionPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl IngestionPipeline {
    pub fn new() -> Self {
        Self::with_config(IngestConfig::default())
    }

    pub fn with_config(config: IngestConfig) -> Self {
        Self {
            config,
            worker: Arc::new(TaskEncodeWorker),
        }
    }

    /// Replace the parallel strategy.
    pub fn with_worker(mut self, worker: impl EncodeWorker + 'static) -> Self {
        self.worker = Arc::new(worker);
        self
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Encode and compress `files`, in input order.
    ///
    /// `on_progress(current, total)` is called with strictly increasing
    /// `current` values and ends at `(total, total)`.
    pub async fn process<F>(&self, files: &[SourceFile], on_progress: F) -> Result<Vec<EncodedImage>>
    where
        F: FnMut(usize, usize),
    {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        self.config.limits.validate(files)?;

        let mut reporter = ProgressReporter::new(files.len(), on_progress);
        let encoded = self.encode(files, &mut reporter).await?;

        Ok(match &self.config.compression {
            Some(config) => compress_all(&Compressor::with_config(config.clone()), encoded).await,
            None => encoded,
        })
    }

    async fn encode<F>(
        &self,
        files: &[SourceFile],
        reporter: &mut ProgressReporter<F>,
    ) -> Result<Vec<EncodedImage>>
    where
        F: FnMut(usize, usize),
    {
        let total = files.len();
        let (sender, mut receiver) = mpsc::unbounded_channel();

        let worker = Arc::clone(&self.worker);
        let request = WorkerRequest {
            files: files.to_vec(),
        };
        let handle = tokio::spawn(async move { worker.run(request, sender).await });

        let job = Settlement::new();
        let deadline = tokio::time::sleep(self.config.worker_timeout);
        tokio::pin!(deadline);

        loop {
            let contender = tokio::select! {
                message = receiver.recv() => match message {
                    Some(WorkerMessage::Progress { current, .. }) => {
                        reporter.report(current);
                        continue;
                    }
                    Some(WorkerMessage::Done { images }) => match check_worker_output(images, total) {
                        Ok(images) => Resolution::Worker(images),
                        Err(reason) => Resolution::Fallback(reason),
                    },
                    Some(WorkerMessage::Error { message }) => {
                        Resolution::Fallback(FallbackReason::WorkerError(message))
                    }
                    None => Resolution::Fallback(FallbackReason::WorkerExited),
                },
                _ = &mut deadline => {
                    Resolution::Fallback(FallbackReason::DeadlineElapsed(self.config.worker_timeout))
                }
            };

            if job.settle(contender).is_ok() {
                break;
            }
        }

        // The worker's result, if it ever arrives, is no longer wanted
        handle.abort();
        drop(receiver);

        let reason = match job.into_inner() {
            Some(Resolution::Worker(images)) => {
                log::debug!("Parallel task encoded {} images", images.len());
                // A worker need not report progress before finishing
                reporter.report(total);
                return Ok(images);
            }
            Some(Resolution::Fallback(reason)) => reason,
            None => FallbackReason::WorkerExited,
        };

        log::info!("Encoding images sequentially ({reason})");
        encode_sequentially(files, reporter)
    }
}

/// The fallback strategy: read and encode each file on the caller's task.
fn encode_sequentially<F>(
    files: &[SourceFile],
    reporter: &mut ProgressReporter<F>,
) -> Result<Vec<EncodedImage>>
where
    F: FnMut(usize, usize),
{
    files
        .iter()
        .enumerate()
        .map(|(index, file)| {
            let bytes = file.read_blocking().map_err(|e| {
                PartlensError::encoding(&file.name, format!("failed to read image: {e}"))
            })?;
            reporter.report(index + 1);
            Ok(EncodedImage::from_bytes(index, file, &bytes))
        })
        .collect()
}

/// Accept worker output only if it covers every index exactly once.
fn check_worker_output(
    mut images: Vec<EncodedImage>,
    total: usize,
) -> std::result::Result<Vec<EncodedImage>, FallbackReason> {
    if images.len() != total {
        return Err(FallbackReason::MalformedOutput(format!(
            "expected {} images, got {}",
            total,
            images.len()
        )));
    }

    images.sort_by_key(|image| image.index);

    for (expected, image) in images.iter().enumerate() {
        if image.index != expected || image.data_uri.is_none() {
            return Err(FallbackReason::MalformedOutput(format!(
                "missing or unencoded image at index {expected}"
            )));
        }
    }

    Ok(images)
}

/// Compress each image on the blocking pool; failures are logged and the
/// original passes through.
async fn compress_all(compressor: &Compressor, encoded: Vec<EncodedImage>) -> Vec<EncodedImage> {
    let mut compressed = Vec::with_capacity(encoded.len());

    for image in encoded {
        let image = Arc::new(image);
        let task_compressor = compressor.clone();
        let task_image = Arc::clone(&image);
        let result =
            tokio::task::spawn_blocking(move || task_compressor.compress(&task_image)).await;

        let next = match result {
            Ok(Ok(outcome)) => outcome.image,
            Ok(Err(e)) => {
                log::warn!("Sending {} uncompressed: {}", image.name, e);
                Arc::unwrap_or_clone(image)
            }
            Err(e) => {
                log::warn!(
                    "Sending {} uncompressed: compression task failed: {}",
                    image.name,
                    e
                );
                Arc::unwrap_or_clone(image)
            }
        };
        compressed.push(next);
    }

    compressed
}
