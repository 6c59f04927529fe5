//! Error taxonomy for the translation subsystem.
//!
//! None of these errors ever reach the end user: the cache layer and the fetch
//! client convert them into "no data" at their origin and log them for operators.

use std::fmt;

/// Failures that can occur while loading, persisting or fetching dictionaries.
#[derive(Debug)]
pub enum TranslationError {
    /// Transport failure while reaching the backend (connect, timeout, non-success status).
    Network {
        /// Request URL.
        url: String,
        /// Human-readable reason reported by the transport.
        reason: String,
    },
    /// Payload could not be decoded into a dictionary.
    Decode {
        /// Where the payload came from (URL or storage key).
        origin: String,
        /// Underlying JSON error, when the payload was not valid JSON.
        source: Option<serde_json::Error>,
        /// Extra context when the JSON was valid but not a dictionary.
        detail: String,
    },
    /// Local persistence failure (I/O, quota, disabled storage).
    Storage {
        /// Storage key or file involved.
        key: String,
        /// Human-readable reason.
        reason: String,
    },
}

impl TranslationError {
    /// What: Build a `Network` error from any displayable transport error.
    #[must_use]
    pub fn network(url: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// What: Build a `Decode` error wrapping a JSON parse failure.
    #[must_use]
    pub fn decode(origin: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            origin: origin.into(),
            detail: source.to_string(),
            source: Some(source),
        }
    }

    /// What: Build a `Decode` error for well-formed JSON with the wrong shape.
    #[must_use]
    pub fn shape(origin: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Decode {
            origin: origin.into(),
            source: None,
            detail: detail.into(),
        }
    }

    /// What: Build a `Storage` error from any displayable persistence error.
    #[must_use]
    pub fn storage(key: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Storage {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    /// Short machine-friendly label, used as a structured log field.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network",
            Self::Decode { .. } => "decode",
            Self::Storage { .. } => "storage",
        }
    }
}

impl fmt::Display for TranslationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network { url, reason } => write!(f, "request to {url} failed: {reason}"),
            Self::Decode { origin, detail, .. } => {
                write!(f, "invalid dictionary payload from {origin}: {detail}")
            }
            Self::Storage { key, reason } => write!(f, "storage error on '{key}': {reason}"),
        }
    }
}

impl std::error::Error for TranslationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode {
                source: Some(err), ..
            } => Some(err),
            Self::Network { .. } | Self::Decode { .. } | Self::Storage { .. } => None,
        }
    }
}
