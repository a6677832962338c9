// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for native capabilities.
//
// The share flow needs exactly two things from the OS: somewhere private to
// stage files, and a way to hand one of those files to a named app with a
// scoped read grant (an intent on Android, the pasteboard or the "Open in"
// menu on iOS). Dispatch itself is never reimplemented here.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use storyshare_core::error::Result;
use storyshare_core::types::{IosHandoff, UriPlacement};

/// Unified bridge that groups all native capabilities.
pub trait PlatformBridge: NativeStorage + NativeShare + Send + Sync {
    /// Human-readable platform name (e.g. "Android").
    fn platform_name(&self) -> &str;
}

/// App-private storage locations.
pub trait NativeStorage {
    /// The app's private cache directory (`Context.getCacheDir()` on Android).
    fn cache_dir(&self) -> Result<PathBuf>;
}

/// Hand a staged file to one specific external application.
pub trait NativeShare {
    /// Try to launch `request.target_package` with the file attached.
    ///
    /// Implementations must check that the target resolves *before* granting
    /// read access, so an app that is not installed never receives a grant.
    /// Returns `Ok(LaunchOutcome::NotFound)` for a missing app; `Err` is
    /// reserved for the platform call itself failing.
    fn share_file_with_app(&self, request: &AppShareRequest) -> Result<LaunchOutcome>;
}

/// A fully resolved share request for a single candidate package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppShareRequest {
    /// Staged file inside the app cache.
    pub file: PathBuf,
    /// Intent action.
    pub action: String,
    pub mime_type: String,
    pub target_package: String,
    pub uri_placement: UriPlacement,
    /// String extras, already resolved from the profile templates.
    pub extras: Vec<(String, String)>,
    /// How to reach the target on iOS. Android ignores it.
    pub ios: Option<IosHandoff>,
}

impl AppShareRequest {
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Value of an extra by key.
    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extras
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// What happened when a single candidate was tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// The target resolved, was granted read access and was started.
    Launched,
    /// No activity in the target package handles the request.
    NotFound,
}

// Shared handles forward to the inner bridge, so a host can keep an
// `Arc<MemoryBridge>` for assertions while the plugin owns a clone.
impl<T: PlatformBridge + ?Sized> PlatformBridge for Arc<T> {
    fn platform_name(&self) -> &str {
        (**self).platform_name()
    }
}

impl<T: NativeStorage + ?Sized> NativeStorage for Arc<T> {
    fn cache_dir(&self) -> Result<PathBuf> {
        (**self).cache_dir()
    }
}

impl<T: NativeShare + ?Sized> NativeShare for Arc<T> {
    fn share_file_with_app(&self, request: &AppShareRequest) -> Result<LaunchOutcome> {
        (**self).share_file_with_app(request)
    }
}
