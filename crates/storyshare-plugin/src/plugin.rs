// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The plugin facade: `shareToStory` and `shareToWhatsApp`.
//
// Each call stages the snapshot under a fixed per-destination name and then
// dispatches it. Stage and dispatch for one destination are serialised so a
// second tap cannot replace the file while the first share is being built.

use std::sync::{Mutex, MutexGuard};

use storyshare_bridge::traits::PlatformBridge;
use storyshare_core::config::ShareConfig;
use storyshare_core::error::{Result, StoryshareError};
use storyshare_core::types::{Destination, DestinationTable, ShareParams};
use tracing::{info, warn};

use crate::call::{PluginCall, PluginResult};
use crate::dispatcher::ShareDispatcher;
use crate::stager::{ImageStager, StagedImage};

/// Successful hand-off: the external app was launched, nothing more is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareOutcome {
    pub destination: Destination,
    pub package: String,
    pub staged: StagedImage,
    pub table_version: u32,
}

/// Entry point for the host UI layer.
pub struct StoriesPlugin {
    bridge: Box<dyn PlatformBridge>,
    config: ShareConfig,
    table: DestinationTable,
    story_lock: Mutex<()>,
    whatsapp_lock: Mutex<()>,
}

impl StoriesPlugin {
    pub fn new(bridge: Box<dyn PlatformBridge>, config: ShareConfig) -> Result<Self> {
        config.validate()?;
        let table = config.destination_table();
        info!(
            platform = bridge.platform_name(),
            table_version = table.version,
            "storyshare plugin ready"
        );
        Ok(Self {
            bridge,
            config,
            table,
            story_lock: Mutex::new(()),
            whatsapp_lock: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &ShareConfig {
        &self.config
    }

    /// `shareToStory(base64, attributionLink?)`.
    pub fn share_to_story(
        &self,
        base64: Option<&str>,
        attribution_link: Option<&str>,
    ) -> Result<ShareOutcome> {
        let mut params = ShareParams::new();
        if let Some(link) = attribution_link {
            params.insert("attribution_link", link);
        }
        self.share(Destination::InstagramStory, base64, &params)
    }

    /// `shareToWhatsApp(base64)`.
    pub fn share_to_whatsapp(&self, base64: Option<&str>) -> Result<ShareOutcome> {
        self.share(Destination::WhatsApp, base64, &ShareParams::new())
    }

    /// Stage `base64` and dispatch it to `destination`.
    pub fn share(
        &self,
        destination: Destination,
        base64: Option<&str>,
        params: &ShareParams,
    ) -> Result<ShareOutcome> {
        let payload = match base64 {
            Some(p) if !p.trim().is_empty() => p,
            _ => return Err(StoryshareError::MissingInput),
        };

        let _guard = self.lock(destination);

        let stager = ImageStager::new(self.bridge.cache_dir()?, &self.config.cache_subdir);
        let staged = stager.stage(payload, destination.staged_filename())?;

        let profile = self.table.profile(destination);
        let extras = profile.resolve_extras(
            params,
            self.config.app_id.as_deref(),
            &self.config.share_caption,
        );
        let report = ShareDispatcher::new(&*self.bridge).dispatch(&staged, profile, &extras)?;

        Ok(ShareOutcome {
            destination,
            package: report.package,
            staged,
            table_version: self.table.version,
        })
    }

    /// Route a web-layer call and turn the outcome into a resolve/reject.
    pub fn handle(&self, call: &PluginCall) -> PluginResult {
        let destination = match call.method.as_str() {
            "shareToStory" => Destination::InstagramStory,
            "shareToWhatsApp" => Destination::WhatsApp,
            other => {
                warn!(method = other, "unknown plugin method");
                return PluginResult::unimplemented(other);
            }
        };

        let params = call_params(call);
        match self.share(destination, call.get_string("base64"), &params) {
            Ok(outcome) => PluginResult::resolved(Some(outcome.package)),
            Err(e) => {
                warn!(method = %call.method, error = %e, "share rejected");
                PluginResult::rejected(&e)
            }
        }
    }

    fn lock(&self, destination: Destination) -> MutexGuard<'_, ()> {
        let lock = match destination {
            Destination::InstagramStory => &self.story_lock,
            Destination::WhatsApp => &self.whatsapp_lock,
        };
        lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Every string argument except the payload, keyed in snake_case
/// (`attributionLink` -> `attribution_link`).
fn call_params(call: &PluginCall) -> ShareParams {
    let mut params = ShareParams::new();
    for (key, value) in &call.data {
        if key == "base64" {
            continue;
        }
        if let Some(value) = value.as_str() {
            params.insert(snake_case(key), value);
        }
    }
    params
}

fn snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            if !out.is_empty() {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use serde_json::json;
    use std::sync::Arc;
    use storyshare_bridge::memory::MemoryBridge;
    use storyshare_bridge::stub::StubBridge;
    use storyshare_core::types::{EXTRA_STREAM, EXTRA_TEXT, StoryStrategy, UriPlacement};

    const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn data_url() -> String {
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(PNG_SIGNATURE)
        )
    }

    fn plugin_with(
        cache: &std::path::Path,
        installed: &[&str],
        config: ShareConfig,
    ) -> (StoriesPlugin, Arc<MemoryBridge>) {
        let bridge = Arc::new(MemoryBridge::new(cache).with_installed(installed.iter().copied()));
        let plugin = StoriesPlugin::new(Box::new(bridge.clone()), config).unwrap();
        (plugin, bridge)
    }

    #[test]
    fn whatsapp_example_flow() {
        let cache = tempfile::tempdir().unwrap();
        let (plugin, bridge) = plugin_with(cache.path(), &["com.whatsapp"], ShareConfig::default());

        let outcome = plugin.share_to_whatsapp(Some(&data_url())).expect("share");

        assert_eq!(outcome.package, "com.whatsapp");
        assert_eq!(outcome.staged.path, cache.path().join("images").join("whatsapp_share.png"));
        assert_eq!(std::fs::read(&outcome.staged.path).unwrap(), PNG_SIGNATURE);

        let launched = bridge.launches().pop().unwrap();
        assert_eq!(launched.mime_type, "image/png");
        assert_eq!(launched.action, "android.intent.action.SEND");
        assert_eq!(
            launched.uri_placement,
            UriPlacement::Extra {
                key: EXTRA_STREAM.into()
            }
        );
        assert_eq!(
            launched.extra(EXTRA_TEXT),
            Some("Check out this snapshot from Geogram!")
        );
    }

    #[test]
    fn story_uses_background_strategy_by_default() {
        let cache = tempfile::tempdir().unwrap();
        let (plugin, bridge) =
            plugin_with(cache.path(), &["com.instagram.android"], ShareConfig::default());

        let outcome = plugin
            .share_to_story(Some(&data_url()), Some("https://geogram.app/invite"))
            .unwrap();

        assert_eq!(outcome.destination, Destination::InstagramStory);
        assert!(outcome.staged.path.ends_with("story_share.png"));
        let launched = bridge.launches().pop().unwrap();
        assert_eq!(launched.target_package, "com.instagram.android");
        assert_eq!(launched.uri_placement, UriPlacement::Data);
        assert_eq!(launched.extra("content_url"), Some("https://geogram.app/invite"));
    }

    #[test]
    fn sticker_strategy_sends_configured_app_id() {
        let cache = tempfile::tempdir().unwrap();
        let config = ShareConfig {
            app_id: Some("962534345263628".into()),
            story_strategy: StoryStrategy::Sticker,
            ..ShareConfig::default()
        };
        let (plugin, bridge) = plugin_with(cache.path(), &["com.instagram.android"], config);

        plugin.share_to_story(Some(&data_url()), None).unwrap();

        let launched = bridge.launches().pop().unwrap();
        assert_eq!(launched.extra("source_application"), Some("962534345263628"));
        assert_eq!(launched.extra("content_url"), None);
        assert!(matches!(launched.uri_placement, UriPlacement::Extra { .. }));
    }

    #[test]
    fn missing_payload_fails_before_any_io() {
        let cache = tempfile::tempdir().unwrap();
        let (plugin, bridge) = plugin_with(cache.path(), &["com.whatsapp"], ShareConfig::default());

        for payload in [None, Some(""), Some("   ")] {
            assert!(matches!(
                plugin.share_to_whatsapp(payload),
                Err(StoryshareError::MissingInput)
            ));
            assert!(matches!(
                plugin.share_to_story(payload, Some("https://geogram.app")),
                Err(StoryshareError::MissingInput)
            ));
        }
        assert!(!cache.path().join("images").exists());
        assert!(bridge.events().is_empty());
    }

    #[test]
    fn malformed_payload_is_not_dispatched() {
        let cache = tempfile::tempdir().unwrap();
        let (plugin, bridge) = plugin_with(cache.path(), &["com.whatsapp"], ShareConfig::default());

        let err = plugin.share_to_whatsapp(Some("data:image/png;base64,@@@@")).unwrap_err();
        assert!(matches!(err, StoryshareError::Decode(_)));
        assert!(!cache.path().join("images").join("whatsapp_share.png").exists());
        assert!(bridge.events().is_empty());
    }

    #[test]
    fn not_installed_is_reported_after_staging() {
        let cache = tempfile::tempdir().unwrap();
        let (plugin, bridge) = plugin_with(cache.path(), &[], ShareConfig::default());

        let err = plugin.share_to_story(Some(&data_url()), None).unwrap_err();
        assert_eq!(err.to_string(), "Instagram is not installed");
        assert!(bridge.grants().is_empty());
    }

    #[test]
    fn custom_cache_subdir() {
        let cache = tempfile::tempdir().unwrap();
        let config = ShareConfig {
            cache_subdir: "shares".into(),
            ..ShareConfig::default()
        };
        let (plugin, _bridge) = plugin_with(cache.path(), &["com.whatsapp"], config);

        let outcome = plugin.share_to_whatsapp(Some(&data_url())).unwrap();
        assert_eq!(outcome.staged.path, cache.path().join("shares").join("whatsapp_share.png"));
    }

    #[test]
    fn handle_routes_and_forwards_params() {
        let cache = tempfile::tempdir().unwrap();
        let config = ShareConfig {
            story_strategy: StoryStrategy::Sticker,
            ..ShareConfig::default()
        };
        let (plugin, bridge) = plugin_with(cache.path(), &["com.instagram.android"], config);

        let data = json!({
            "base64": data_url(),
            "attributionLink": "https://geogram.app",
            "topBackgroundColor": "#101010",
        });
        let call = PluginCall::new("shareToStory", data.as_object().unwrap().clone());

        let result = plugin.handle(&call);
        assert_eq!(result, PluginResult::resolved(Some("com.instagram.android".into())));

        let launched = bridge.launches().pop().unwrap();
        assert_eq!(launched.extra("top_background_color"), Some("#101010"));
        assert_eq!(launched.extra("bottom_background_color"), Some("#FF00E3"));
        assert_eq!(launched.extra("content_url"), Some("https://geogram.app"));
    }

    #[test]
    fn handle_rejects_with_codes() {
        let cache = tempfile::tempdir().unwrap();
        let (plugin, _bridge) = plugin_with(cache.path(), &[], ShareConfig::default());

        let missing = plugin.handle(&PluginCall::new("shareToWhatsApp", Default::default()));
        assert!(matches!(
            missing,
            PluginResult::Rejected { ref code, ref message, .. }
                if code == "MISSING_INPUT" && message == "No base64 data provided"
        ));

        let call = PluginCall::from_json("shareToWhatsApp", &json!({ "base64": data_url() }).to_string()).unwrap();
        assert!(matches!(
            plugin.handle(&call),
            PluginResult::Rejected { ref code, .. } if code == "NOT_INSTALLED"
        ));

        let unknown = plugin.handle(&PluginCall::new("shareToTikTok", Default::default()));
        assert!(matches!(
            unknown,
            PluginResult::Rejected { ref code, .. } if code == "UNIMPLEMENTED"
        ));
    }

    #[test]
    fn stub_bridge_rejects_as_unavailable() {
        let plugin = StoriesPlugin::new(Box::new(StubBridge), ShareConfig::default()).unwrap();
        assert!(matches!(
            plugin.share_to_whatsapp(Some(&data_url())),
            Err(StoryshareError::PlatformUnavailable)
        ));
    }

    #[test]
    fn invalid_config_is_refused() {
        for subdir in ["a/b", " images", "images\n"] {
            let config = ShareConfig {
                cache_subdir: subdir.into(),
                ..ShareConfig::default()
            };
            assert!(
                StoriesPlugin::new(Box::new(StubBridge), config).is_err(),
                "{subdir:?} accepted"
            );
        }
    }

    #[test]
    fn snake_case_keys() {
        assert_eq!(snake_case("attributionLink"), "attribution_link");
        assert_eq!(snake_case("topBackgroundColor"), "top_background_color");
        assert_eq!(snake_case("caption"), "caption");
    }
}
