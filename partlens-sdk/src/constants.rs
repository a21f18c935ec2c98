// ABOUTME: Centralized constants for the partlens SDK
// ABOUTME: Contains timeouts, endpoint URLs, status codes, compression and input limits

/// Deadlines for the two bounded operations
pub mod timeouts {
    use std::time::Duration;

    /// Deadline for a single chat-completion call
    pub const API_CALL_TIMEOUT: Duration = Duration::from_secs(60);

    /// How long the parallel encode task may run before the fallback takes over
    pub const WORKER_TIMEOUT: Duration = Duration::from_secs(10);
}

pub mod urls {
    /// Default chat-completions endpoint
    pub const OPENAI_CHAT_COMPLETIONS: &str = "https://api.openai.com/v1/chat/completions";
}

/// Status codes reported for failures that have no HTTP status of their own
pub mod status {
    pub const TIMEOUT: u16 = 408;

    /// Sentinel for transport failures, outside any status a server sends us
    pub const TRANSPORT_FAILURE: u16 = 520;
}

/// Compression loop defaults
pub mod compression {
    pub const MAX_DIMENSION: u32 = 1280;
    pub const INITIAL_QUALITY: f32 = 0.8;
    pub const BYTE_BUDGET: usize = 1_500_000;
    pub const QUALITY_FLOOR: f32 = 0.4;
    pub const QUALITY_STEP: f32 = 0.1;
}

/// Limits on user-selected images
pub mod images {
    pub const MAX_FILES: usize = 10;
    pub const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;
    pub const ALLOWED_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];
}

/// Model families that reject `temperature` and take `max_completion_tokens`
pub const REASONING_MODEL_PREFIXES: &[&str] = &["gpt-5", "o1", "o3"];

pub const USER_AGENT: &str = concat!("partlens/", env!("CARGO_PKG_VERSION"));
