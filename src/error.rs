//! Application error types using thiserror
//!
//! Error hierarchy:
//! - VersionError / ConstraintError: parse anomalies, logged and skipped by callers
//! - DocumentError: malformed upstream documents
//! - RegistryError: transport failures against an upstream source
//! - FetchError: a whole fetch batch failed
//! - ProjectError: catalog entries that violate the data contract
//! - ConfigError / IoError: configuration and file system failures

use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Fetch batch failures
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// HTTP client construction failures
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Invalid catalog entries
    #[error(transparent)]
    Project(#[from] ProjectError),

    /// Configuration related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// IO related errors
    #[error(transparent)]
    Io(#[from] IoError),
}

/// A version string that none of the grammars accept
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{value}' is not a valid {grammar} version string")]
pub struct VersionError {
    pub value: String,
    pub grammar: &'static str,
}

/// A constraint expression that could not be parsed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unparseable constraint '{constraint}': {message}")]
pub struct ConstraintError {
    pub constraint: String,
    pub message: String,
}

/// Errors raised while reading upstream XML or JSON documents
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The XML could not be tokenized
    #[error("malformed XML: {0}")]
    Xml(String),

    /// The XML is well formed but lacks a node the reader needs
    #[error("missing <{element}> element")]
    MissingElement { element: &'static str },
}

/// Errors related to upstream source communication
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Resource not found upstream
    #[error("'{resource}' not found at {source_name}")]
    NotFound {
        resource: String,
        source_name: String,
    },

    /// Non-success HTTP status after retries
    #[error("{source_name} answered HTTP {status} for '{resource}'")]
    Http {
        resource: String,
        source_name: String,
        status: u16,
    },

    /// Network request failed
    #[error("failed to fetch '{resource}' from {source_name}: {message}")]
    Network {
        resource: String,
        source_name: String,
        message: String,
    },

    /// Rate limit still in effect after all retries
    #[error("rate limit exceeded for {source_name} (retry after {retry_after_secs}s)")]
    RateLimited {
        source_name: String,
        retry_after_secs: u64,
    },

    /// Timeout
    #[error("timeout while fetching '{resource}' from {source_name}")]
    Timeout {
        resource: String,
        source_name: String,
    },

    /// Response body could not be read or decoded
    #[error("invalid response from {source_name} for '{resource}': {message}")]
    InvalidResponse {
        resource: String,
        source_name: String,
        message: String,
    },

    /// Failed to build the HTTP client
    #[error("failed to create HTTP client: {0}")]
    Client(String),
}

/// A fetch batch aborted; partial results are discarded
#[derive(Error, Debug)]
pub enum FetchError {
    /// A per-project request failed terminally
    #[error("failed to fetch project information for \"{id}\": {source}")]
    Batch {
        id: String,
        #[source]
        source: RegistryError,
    },

    /// A listing page failed terminally
    #[error("failed to fetch page {page}: {source}")]
    Page {
        page: u32,
        #[source]
        source: RegistryError,
    },

    /// The catalog listing itself could not be read
    #[error("failed to read project catalog: {0}")]
    Catalog(String),
}

/// Errors raised when building catalog entries
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProjectError {
    /// Project type outside module, theme and profile
    #[error("project '{id}' has unsupported type '{project_type}'")]
    InvalidType { id: String, project_type: String },
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error
    #[error("failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A setting holds an unusable value
    #[error("invalid value for '{key}': {message}")]
    InvalidValue { key: &'static str, message: String },

    /// Listing filter rejected at construction
    #[error("invalid listing filter: {message}")]
    InvalidListingFilter { message: String },

    /// Options that need each other or exclude each other
    #[error("conflicting options: {message}")]
    ConflictingOptions { message: String },
}

/// Errors related to IO operations
#[derive(Error, Debug)]
pub enum IoError {
    /// Failed to write an output file
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write to standard output
    #[error("failed to write output: {0}")]
    Stdout(#[source] std::io::Error),
}

impl VersionError {
    /// Creates a new VersionError for the given grammar name
    pub fn new(value: impl Into<String>, grammar: &'static str) -> Self {
        VersionError {
            value: value.into(),
            grammar,
        }
    }
}

impl ConstraintError {
    /// Creates a new ConstraintError
    pub fn new(constraint: impl Into<String>, message: impl Into<String>) -> Self {
        ConstraintError {
            constraint: constraint.into(),
            message: message.into(),
        }
    }
}

impl RegistryError {
    /// Creates a new NotFound error
    pub fn not_found(resource: impl Into<String>, source_name: impl Into<String>) -> Self {
        RegistryError::NotFound {
            resource: resource.into(),
            source_name: source_name.into(),
        }
    }

    /// Creates a new Network error
    pub fn network(
        resource: impl Into<String>,
        source_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RegistryError::Network {
            resource: resource.into(),
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Creates a new Timeout error
    pub fn timeout(resource: impl Into<String>, source_name: impl Into<String>) -> Self {
        RegistryError::Timeout {
            resource: resource.into(),
            source_name: source_name.into(),
        }
    }

    /// Creates a new InvalidResponse error
    pub fn invalid_response(
        resource: impl Into<String>,
        source_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RegistryError::InvalidResponse {
            resource: resource.into(),
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Whether another attempt may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            RegistryError::Network { .. }
            | RegistryError::Timeout { .. }
            | RegistryError::RateLimited { .. } => true,
            RegistryError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl FetchError {
    /// Wraps a per-project failure with the failing identifier
    pub fn batch(id: impl Into<String>, source: RegistryError) -> Self {
        FetchError::Batch {
            id: id.into(),
            source,
        }
    }
}
