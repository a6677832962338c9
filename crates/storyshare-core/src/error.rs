// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Storyshare.

use thiserror::Error;

/// Top-level error type for all Storyshare operations.
#[derive(Debug, Error)]
pub enum StoryshareError {
    // -- Input --
    #[error("No base64 data provided")]
    MissingInput,

    #[error("invalid base64 image data: {0}")]
    Decode(String),

    // -- Staging --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    // -- Dispatch --
    #[error("{0} is not installed")]
    NotInstalled(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Platform bridge --
    #[error("platform bridge error: {0}")]
    Bridge(String),

    #[error("feature not available on this platform")]
    PlatformUnavailable,
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, StoryshareError>;
