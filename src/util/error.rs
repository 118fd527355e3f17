//! Error types for legacy FBX decoding.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for decode and conversion operations.
///
/// Every variant is terminal for the file being converted. Retrying against
/// the same bytes reproduces the same failure.
#[derive(Error, Debug)]
pub enum Error {
    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Version field outside the legacy range; use a modern loader instead
    #[error("Unsupported FBX version {0} (legacy decoder handles 5000-6999)")]
    UnsupportedVersion(u32),

    /// Malformed or truncated binary structure
    #[error("Corrupt FBX container: {0}")]
    CorruptContainer(String),

    /// A property could not be decoded
    #[error("Cannot decode property of '{node}' at offset {offset}: {reason}")]
    PropertyDecode {
        node: String,
        offset: usize,
        reason: String,
    },

    /// File is well formed but carries no mesh
    #[error("No mesh geometry found")]
    NoGeometryFound,

    /// Recognized but unhandled mapping/reference combination
    #[error("Unsupported layout for {layer}: {mapping} + {reference}")]
    UnsupportedAttributeLayout {
        layer: String,
        mapping: String,
        reference: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a corrupt container error.
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::CorruptContainer(msg.into())
    }

    /// Create a property decode error scoped to a node.
    pub fn property(node: impl Into<String>, offset: usize, reason: impl Into<String>) -> Self {
        Self::PropertyDecode {
            node: node.into(),
            offset,
            reason: reason.into(),
        }
    }

    /// True when the caller should hand the file to a modern loader.
    pub fn is_unsupported_version(&self) -> bool {
        matches!(self, Self::UnsupportedVersion(_))
    }
}

/// Result type alias for decode operations.
pub type Result<T> = std::result::Result<T, Error>;
