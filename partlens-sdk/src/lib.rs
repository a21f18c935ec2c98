// ABOUTME: Partlens SDK for identifying machine parts from photos and a short form
// ABOUTME: Includes image ingestion, byte-budget compression and chat-completion dispatch

pub mod builder;
pub mod compress;
pub mod constants;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod ingest;
pub mod media;
pub mod settle;

pub use builder::ChatClientConfig;
pub use compress::{CompressionConfig, CompressionOutcome, Compressor};
pub use dispatch::{ChatClient, DispatchResult};
pub use envelope::{
    ContentPart, ImageUrl, Message, MessageContent, ModelCapabilities, RequestEnvelope, Role,
    TokenLimitField,
};
pub use error::{ErrorKind, PartlensError, Result};
pub use ingest::{
    EncodeWorker, IngestConfig, IngestLimits, IngestionPipeline, ProgressReporter,
    TaskEncodeWorker, WorkerMessage, WorkerRequest,
};
pub use media::{EncodedImage, SourceFile};
pub use secrecy::SecretString;
