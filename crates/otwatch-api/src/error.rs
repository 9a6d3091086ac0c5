use thiserror::Error;

/// Top-level error type for the `otwatch-api` crate.
///
/// The TUI maps these into inline banners; only [`Error::Api`] carries a
/// server-authored message, everything else is synthesized client-side.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP transport error (connection refused, DNS failure, timeout).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Non-2xx response. `message` is the server-provided `detail` or
    /// `message` field when present, otherwise `HTTP {status}: {reason}`.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// A fixture-mode request referenced a record that does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
}

impl Error {
    /// Whether this failure came from the network rather than the server.
    /// Network failures trigger fixture fallback for workflow calls.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// The message shown in the PCAP page's error banner.
    pub fn banner_message(&self) -> String {
        self.to_string()
    }
}
