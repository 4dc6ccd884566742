//! Error Types
//!
//! The single error enum used across the crate. Import and codec entry
//! points return [`Result<T>`]; malformed subsections inside a document are
//! skipped with a `log::warn!` instead of surfacing here (see the importer
//! module docs for the skip-vs-error boundary).

use thiserror::Error;

/// The main error type for the skelmesh crate.
#[derive(Error, Debug)]
pub enum SkelError {
    // ========================================================================
    // I/O & Parsing Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// XML parsing error from the COLLADA document reader.
    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// The document is structurally unusable (missing root element,
    /// no usable payload at all).
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    // ========================================================================
    // Structural Invariant Violations
    // ========================================================================
    /// Mismatched counts or dangling references inside an otherwise
    /// well-formed document (e.g. an inverse-bind-matrix array whose length
    /// disagrees with the joint name list).
    #[error("Invalid resource: {0}")]
    InvalidResource(String),

    /// The combination of triangle-list input semantics does not map to any
    /// known vertex layout.
    #[error("Unsupported vertex layout: {0}")]
    UnsupportedVertexLayout(String),

    // ========================================================================
    // Binary Codec Errors
    // ========================================================================
    /// The binary stream does not decode with the expected field layout.
    #[error("Binary decode error: {0}")]
    BinaryDecode(String),

    // ========================================================================
    // Animation API Misuse
    // ========================================================================
    /// An [`AnimSetting`](crate::animation::AnimSetting) selected a clip
    /// index the resource does not have.
    #[error("Animation clip index {index} out of bounds (clip count {count})")]
    ClipIndexOutOfBounds { index: usize, count: usize },

    /// A pose sample with zero keyframes was encountered while binding a
    /// clip. Such a clip cannot be played.
    #[error("Pose sample for skeleton node {node} has no keyframes")]
    EmptyPoseSample { node: usize },
}

/// Alias for `Result<T, SkelError>`.
pub type Result<T> = std::result::Result<T, SkelError>;
