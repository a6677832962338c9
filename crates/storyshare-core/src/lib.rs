// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Storyshare: core types, destination profiles and error definitions shared
// across all crates.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod types;

pub use config::ShareConfig;
pub use error::StoryshareError;
pub use types::*;
