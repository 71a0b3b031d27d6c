use thiserror::Error;

/// Errors returned by the `PageSpeed` Insights client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network, timeout, or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A `200 OK` response body could not be deserialized into the expected shape.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid API URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}
