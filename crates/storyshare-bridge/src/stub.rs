// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub bridge for desktop/CI builds where native mobile APIs are unavailable.
//
// Every trait method returns `PlatformUnavailable`; the real implementations
// live in the `android` and `ios` modules.

use std::path::PathBuf;

use storyshare_core::error::{Result, StoryshareError};

use crate::traits::*;

/// No-op bridge returned on platforms without a share target.
pub struct StubBridge;

impl PlatformBridge for StubBridge {
    fn platform_name(&self) -> &str {
        "Desktop (stub)"
    }
}

impl NativeStorage for StubBridge {
    fn cache_dir(&self) -> Result<PathBuf> {
        tracing::warn!("NativeStorage::cache_dir called on stub bridge");
        Err(StoryshareError::PlatformUnavailable)
    }
}

impl NativeShare for StubBridge {
    fn share_file_with_app(&self, request: &AppShareRequest) -> Result<LaunchOutcome> {
        tracing::warn!(
            package = %request.target_package,
            "NativeShare::share_file_with_app called on stub bridge"
        );
        Err(StoryshareError::PlatformUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storyshare_core::types::UriPlacement;

    #[test]
    fn everything_is_unavailable() {
        let bridge = StubBridge;
        assert!(matches!(
            bridge.cache_dir(),
            Err(StoryshareError::PlatformUnavailable)
        ));

        let request = AppShareRequest {
            file: PathBuf::from("/tmp/story_share.png"),
            action: "android.intent.action.SEND".into(),
            mime_type: "image/png".into(),
            target_package: "com.whatsapp".into(),
            uri_placement: UriPlacement::Data,
            extras: Vec::new(),
            ios: None,
        };
        assert!(matches!(
            bridge.share_file_with_app(&request),
            Err(StoryshareError::PlatformUnavailable)
        ));
    }
}
