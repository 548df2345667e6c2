use thiserror::Error;

#[derive(Error, Debug)]
pub enum TattlerError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Settings parsing failed: {0}")]
    SettingsParse(#[from] toml::de::Error),

    // Network errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Reddit API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Querying feed /r/{feed} failed: {source}")]
    FeedQuery {
        feed: String,
        #[source]
        source: Box<TattlerError>,
    },

    #[error("Every monitored feed failed to load")]
    AllFeedsFailed,

    // Parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Storage errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    // Scheduler errors
    #[error("Scheduler error: {0}")]
    Scheduler(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type TattlerResult<T> = Result<T, TattlerError>;
