// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Storyshare: native platform bridge abstractions.
//!
//! This module defines the capability traits the share flow needs from the
//! host OS (a private cache directory, and "send this file to that app with a
//! temporary read grant") plus the per-target implementations.
//!
//! The Android bridge needs the hosting `Activity`, so it is built by the JNI
//! entry point with [`android::AndroidBridge::new`]. Every other target gets
//! its bridge from [`platform_bridge`].

pub mod memory;
pub mod traits;

#[cfg(target_os = "android")]
pub mod android;

#[cfg(target_os = "ios")]
pub mod ios;

#[cfg(not(any(target_os = "android", target_os = "ios")))]
pub mod stub;

/// Retrieves the bridge implementation for the target operating system.
#[cfg(not(target_os = "android"))]
pub fn platform_bridge() -> Box<dyn traits::PlatformBridge> {
    #[cfg(target_os = "ios")]
    {
        // iOS: pasteboard and UIKit through objc2.
        Box::new(ios::IosBridge::new())
    }
    #[cfg(not(target_os = "ios"))]
    {
        // DESKTOP/CI: no share targets to hand files to.
        Box::new(stub::StubBridge)
    }
}
