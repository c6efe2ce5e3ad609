use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum EurostatError {
    #[error("invalid dataset code: {0}")]
    InvalidDatasetCode(String),

    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("failed to read catalog file at {0}")]
    CatalogRead(String),

    #[error("failed to parse catalog file: {0}")]
    CatalogParse(String),

    #[error("missing storage connection string (set AZURE_STORAGE_CONNECTION_STRING)")]
    MissingCredential,

    #[error("invalid storage connection string: {0}")]
    InvalidConnectionString(String),

    #[error("Eurostat request failed: {0}")]
    EurostatHttp(String),

    #[error("Eurostat returned status {status}: {message}")]
    EurostatStatus { status: u16, message: String },

    #[error("Eurostat returned a non-JSON body: {0}")]
    EurostatBody(String),

    #[error("malformed JSON-stat response: {0}")]
    MalformedResponse(String),

    #[error("unrecognised time period label: {0}")]
    InvalidPeriod(String),

    #[error("spreadsheet generation failed: {0}")]
    Spreadsheet(String),

    #[error("storage upload to {path} failed: {message}")]
    Storage { path: String, message: String },

    #[error("storage setup failed: {0}")]
    StorageSetup(String),

    #[error("merged table failed: {0}")]
    Merge(String),
}

/// Taxonomy bucket an error belongs to, used as a log field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Setup,
    Fetch,
    Decode,
    Sink,
    Merge,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Setup => "setup",
            Phase::Fetch => "fetch",
            Phase::Decode => "decode",
            Phase::Sink => "sink",
            Phase::Merge => "merge",
        }
    }
}

impl EurostatError {
    pub fn phase(&self) -> Phase {
        match self {
            EurostatError::InvalidDatasetCode(_)
            | EurostatError::InvalidCatalog(_)
            | EurostatError::CatalogRead(_)
            | EurostatError::CatalogParse(_)
            | EurostatError::MissingCredential
            | EurostatError::InvalidConnectionString(_)
            | EurostatError::StorageSetup(_) => Phase::Setup,
            EurostatError::EurostatHttp(_)
            | EurostatError::EurostatStatus { .. }
            | EurostatError::EurostatBody(_) => Phase::Fetch,
            EurostatError::MalformedResponse(_) | EurostatError::InvalidPeriod(_) => Phase::Decode,
            EurostatError::Spreadsheet(_) | EurostatError::Storage { .. } => Phase::Sink,
            EurostatError::Merge(_) => Phase::Merge,
        }
    }
}
