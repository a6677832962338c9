// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The state behind the native entry points (JNI on Android, C on iOS).
//
// Every entry point funnels through `PluginHost`, which owns the configured
// plugin and converts both errors and panics into a `PluginResult`. A panic
// must never unwind across the FFI boundary into the host process.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::RwLock;

use storyshare_bridge::traits::PlatformBridge;
use storyshare_core::config::ShareConfig;
use storyshare_core::error::{Result, StoryshareError};
use tracing::{error, info};

use crate::call::{PluginCall, PluginResult};
use crate::plugin::StoriesPlugin;

/// Holds the plugin between `configure` and `invoke` calls.
pub struct PluginHost {
    plugin: RwLock<Option<StoriesPlugin>>,
}

impl PluginHost {
    pub const fn new() -> Self {
        Self {
            plugin: RwLock::new(None),
        }
    }

    /// Parse `config_json` (blank means defaults), build the bridge and
    /// install a fresh plugin, replacing any previous one.
    pub fn configure<F>(&self, config_json: &str, make_bridge: F) -> PluginResult
    where
        F: FnOnce(&ShareConfig) -> Result<Box<dyn PlatformBridge>>,
    {
        guarded("configure", || {
            let config = if config_json.trim().is_empty() {
                ShareConfig::default()
            } else {
                ShareConfig::from_json_str(config_json)?
            };
            let bridge = make_bridge(&config)?;
            let plugin = StoriesPlugin::new(bridge, config)?;

            let mut slot = self.plugin.write().unwrap_or_else(|p| p.into_inner());
            *slot = Some(plugin);
            info!("storyshare configured");
            Ok(PluginResult::resolved(None))
        })
    }

    /// Route one plugin call to the installed plugin.
    pub fn invoke(&self, method: &str, args_json: &str) -> PluginResult {
        guarded(method, || {
            let call = PluginCall::from_json(method, args_json)?;
            let slot = self.plugin.read().unwrap_or_else(|p| p.into_inner());
            match slot.as_ref() {
                Some(plugin) => Ok(plugin.handle(&call)),
                None => Err(StoryshareError::Config(
                    "configure() must be called before invoke()".into(),
                )),
            }
        })
    }

    pub fn is_configured(&self) -> bool {
        self.plugin
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .is_some()
    }
}

impl Default for PluginHost {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `f`, turning an `Err` into a rejection and a panic into a
/// `BRIDGE_ERROR` rejection.
pub fn guarded<F>(label: &str, f: F) -> PluginResult
where
    F: FnOnce() -> Result<PluginResult>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => PluginResult::rejected(&e),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_owned())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_owned());
            error!(call = label, panic = %message, "native call panicked");
            PluginResult::rejected(&StoryshareError::Bridge(format!(
                "{label} panicked: {message}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::Arc;
    use storyshare_bridge::memory::MemoryBridge;
    use storyshare_bridge::traits::{AppShareRequest, LaunchOutcome, NativeShare, NativeStorage};

    /// A bridge whose OS calls blow up, as an uninitialised JNI context does.
    struct PanickingBridge;

    impl PlatformBridge for PanickingBridge {
        fn platform_name(&self) -> &str {
            "Panicking"
        }
    }

    impl NativeStorage for PanickingBridge {
        fn cache_dir(&self) -> Result<PathBuf> {
            panic!("android context was not initialized")
        }
    }

    impl NativeShare for PanickingBridge {
        fn share_file_with_app(&self, _request: &AppShareRequest) -> Result<LaunchOutcome> {
            panic!("unreachable in these tests")
        }
    }

    fn whatsapp_args() -> String {
        let payload = base64::engine::general_purpose::STANDARD.encode(b"\x89PNG\r\n\x1a\n");
        json!({ "base64": payload }).to_string()
    }

    fn rejection_code(result: &PluginResult) -> &str {
        match result {
            PluginResult::Rejected { code, .. } => code.as_str(),
            other => panic!("expected a rejection, got {other:?}"),
        }
    }

    #[test]
    fn bridge_panic_becomes_a_rejection() {
        let host = PluginHost::new();
        let configured = host.configure("", |_| Ok(Box::new(PanickingBridge)));
        assert!(configured.is_resolved());

        let result = host.invoke("shareToWhatsApp", &whatsapp_args());
        assert_eq!(rejection_code(&result), "BRIDGE_ERROR");
        match &result {
            PluginResult::Rejected { message, .. } => {
                assert!(message.contains("android context was not initialized"))
            }
            _ => unreachable!(),
        }

        // The destination lock was poisoned by the panic; it must recover.
        let again = host.invoke("shareToWhatsApp", &whatsapp_args());
        assert_eq!(rejection_code(&again), "BRIDGE_ERROR");
    }

    #[test]
    fn panicking_bridge_factory_is_rejected_not_installed() {
        let host = PluginHost::new();
        let result = host.configure("", |_| panic!("no Activity"));
        assert_eq!(rejection_code(&result), "BRIDGE_ERROR");
        assert!(!host.is_configured());
    }

    #[test]
    fn invoke_before_configure_is_rejected() {
        let host = PluginHost::new();
        let result = host.invoke("shareToWhatsApp", &whatsapp_args());
        assert_eq!(rejection_code(&result), "CONFIG_ERROR");
    }

    #[test]
    fn configure_then_share() {
        let cache = tempfile::tempdir().unwrap();
        let bridge = Arc::new(MemoryBridge::new(cache.path()).with_installed(["com.whatsapp"]));
        let host = PluginHost::new();

        let factory_bridge = bridge.clone();
        let configured = host.configure(r#"{ "share_caption": "Look!" }"#, move |config| {
            assert_eq!(config.share_caption, "Look!");
            Ok(Box::new(factory_bridge))
        });
        assert!(configured.is_resolved());

        let result = host.invoke("shareToWhatsApp", &whatsapp_args());
        assert_eq!(result, PluginResult::resolved(Some("com.whatsapp".into())));
        assert_eq!(bridge.launches()[0].extra("android.intent.extra.TEXT"), Some("Look!"));
    }

    #[test]
    fn invalid_config_keeps_previous_plugin() {
        let cache = tempfile::tempdir().unwrap();
        let bridge = Arc::new(MemoryBridge::new(cache.path()).with_installed(["com.whatsapp"]));
        let host = PluginHost::new();
        let first = bridge.clone();
        assert!(host.configure("", move |_| Ok(Box::new(first))).is_resolved());

        let result = host.configure(r#"{ "cache_subdir": " images" }"#, |_| {
            Ok(Box::new(MemoryBridge::new("/nonexistent")))
        });
        assert_eq!(rejection_code(&result), "CONFIG_ERROR");
        assert!(host.invoke("shareToWhatsApp", &whatsapp_args()).is_resolved());
    }

    #[test]
    fn malformed_args_are_rejected() {
        let host = PluginHost::new();
        let result = host.invoke("shareToWhatsApp", "[1, 2]");
        assert_eq!(rejection_code(&result), "CONFIG_ERROR");
    }
}
