// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JNI entry points for the Java shim `com.geogram.app.StoryShareNative`.
//
// The shim forwards the web-view plugin call as a method name plus JSON
// arguments and resolves or rejects the JS promise from the returned JSON:
//
//     static native String configure(Activity activity, String configJson);
//     static native String invoke(String method, String argsJson);
//
// `configure` must run again whenever the Activity is recreated; the bridge
// holds a global reference to the Activity it was given.

use jni::JNIEnv;
use jni::objects::{JClass, JObject, JString};
use jni::sys::jstring;
use storyshare_bridge::android::AndroidBridge;
use storyshare_core::error::StoryshareError;
use tracing::error;

use crate::call::PluginResult;
use crate::host::PluginHost;

static HOST: PluginHost = PluginHost::new();

fn read_string(env: &mut JNIEnv, value: &JString, name: &str) -> Result<String, StoryshareError> {
    if value.is_null() {
        return Ok(String::new());
    }
    env.get_string(value)
        .map(Into::into)
        .map_err(|e| StoryshareError::Bridge(format!("failed to read {name}: {e}")))
}

fn to_jstring(env: &mut JNIEnv, result: &PluginResult) -> jstring {
    match env.new_string(result.to_json()) {
        Ok(s) => s.into_raw(),
        Err(e) => {
            error!("Failed to create result string: {e}");
            std::ptr::null_mut()
        }
    }
}

/// Install the plugin for `activity` with the given JSON configuration
/// (`""` for defaults).
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_geogram_app_StoryShareNative_configure(
    mut env: JNIEnv,
    _class: JClass,
    activity: JObject,
    config_json: JString,
) -> jstring {
    crate::init_logging();

    let json = match read_string(&mut env, &config_json, "configJson") {
        Ok(json) => json,
        Err(e) => return to_jstring(&mut env, &PluginResult::rejected(&e)),
    };
    let result = HOST.configure(&json, |config| {
        let authority = config.file_provider_authority.clone();
        let bridge = AndroidBridge::new(&mut env, &activity, authority)?;
        Ok(Box::new(bridge))
    });
    to_jstring(&mut env, &result)
}

/// Route one plugin call (`shareToStory`, `shareToWhatsApp`).
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_geogram_app_StoryShareNative_invoke(
    mut env: JNIEnv,
    _class: JClass,
    method: JString,
    args_json: JString,
) -> jstring {
    let args = read_string(&mut env, &method, "method")
        .and_then(|method| Ok((method, read_string(&mut env, &args_json, "argsJson")?)));
    let result = match args {
        Ok((method, args)) => HOST.invoke(&method, &args),
        Err(e) => PluginResult::rejected(&e),
    };
    to_jstring(&mut env, &result)
}
