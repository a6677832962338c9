// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Storyshare plugin: stage a base64 snapshot in the app cache, then hand it
// to Instagram Stories or WhatsApp through the platform bridge. The `android`
// and `ios` modules export the native entry points.

pub mod call;
pub mod dispatcher;
pub mod host;
pub mod plugin;
pub mod stager;

#[cfg(target_os = "android")]
pub mod android;

#[cfg(target_os = "ios")]
pub mod ios;

pub use call::{PluginCall, PluginResult};
pub use dispatcher::{DispatchReport, ShareDispatcher};
pub use host::PluginHost;
pub use plugin::{ShareOutcome, StoriesPlugin};
pub use stager::{ImageStager, StagedImage};

/// Install the global `tracing` subscriber (env filter, default `info`).
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}
