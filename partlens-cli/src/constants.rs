// ABOUTME: Centralized constants for the partlens CLI application
// ABOUTME: Contains request defaults, prompt texts, config locations and UI settings

/// Request defaults used when neither flags nor config set a value
pub mod defaults {
    pub const MODEL: &str = "gpt-5";
    pub const TEMPERATURE: f64 = 1.0;
    pub const MAX_TOKENS: u32 = 2048;

    pub const MIN_TEMPERATURE: f64 = 0.0;
    pub const MAX_TEMPERATURE: f64 = 2.0;
}

/// Default prompt texts, overridable from the config file
pub mod prompts {
    pub const PERSONA: &str = "You are an expert in parts for offset and flexographic printing \
machines (Ryobi, Heidelberg, Komori and similar). Identify the part, explain its function, list \
technical specifications, likely part numbers, compatible models and variants. Suggest \
international suppliers with searchable terms, never invented URLs. When information is missing, \
ask clear and objective questions. Prefer concise answers organised in sections and lists. Reply \
in the language the user writes in.";

    pub const ANALYSIS: &str = "Analyse the information below and the images. Provide: (1) part \
identification; (2) function; (3) specifications and materials; (4) likely part numbers; (5) \
compatibility with machine models; (6) supplier suggestions and search terms; (7) follow-up \
questions to confirm the identification. Do not invent links; offer specific search terms \
instead.";

    /// Heading placed between the analysis prompt and the field list
    pub const PROVIDED_INFORMATION: &str = "**Provided information:**";
}

/// Environment variables read by the CLI
pub mod env {
    pub const API_KEY: &str = "OPENAI_API_KEY";
}

/// Config file names and directories
pub mod config {
    pub const PROJECT_FILE: &str = "partlens.toml";
    pub const APP_DIR: &str = "partlens";
    pub const FILE_NAME: &str = "config.toml";
}

/// UI and formatting constants
pub mod ui {
    /// Progress bar tick interval for smooth animation
    pub const PROGRESS_BAR_TICK_MS: u64 = 80;

    /// Prompt shown for follow-up questions in interactive mode
    pub const FOLLOW_UP_PROMPT: &str = "Follow-up (empty to finish)";
}
