// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Android platform bridge via JNI.
//
// Requires the Android NDK and targets `aarch64-linux-android` or
// `armv7-linux-androideabi`. Each trait method invokes the corresponding
// Android API through JNI calls into the ART runtime.
//
// ## Architecture notes
//
// Sharing is a single synchronous sequence: wrap the staged file in a
// `content://` URI through `androidx.core.content.FileProvider`, build an
// intent scoped to one package, ask the `PackageManager` whether anything in
// that package resolves it, and only then grant read access and start it.
//
// The bridge is built from the hosting `Activity` handed over by the Java
// shim, so it keeps its own `JavaVM` and a global reference to that Activity.
// Nothing here depends on NDK glue having initialised a process-wide context.
//
// On Android 11+ `resolveActivity` only sees packages declared in the host
// manifest's `<queries>` block; `com.instagram.android`, `com.whatsapp` and
// `com.whatsapp.w4b` must be listed there. The FileProvider `<paths>` must
// expose the `images` cache subfolder.

#![cfg(target_os = "android")]

use std::path::PathBuf;

use jni::objects::{GlobalRef, JObject, JString, JValue};
use jni::{JNIEnv, JavaVM};

use storyshare_core::error::{Result, StoryshareError};
use storyshare_core::types::UriPlacement;

use crate::traits::*;

/// `Intent.FLAG_GRANT_READ_URI_PERMISSION`.
const FLAG_GRANT_READ_URI_PERMISSION: i32 = 0x0000_0001;

/// Request code passed to `startActivityForResult`. The result is never
/// collected; Instagram only opens the story composer when launched for a
/// result.
pub const REQUEST_SHARE: i32 = 0x5353_0001; // "SS" + 1

/// Convenience: map any `jni::errors::Error` into `StoryshareError::Bridge`.
fn jni_err(context: &str, e: jni::errors::Error) -> StoryshareError {
    StoryshareError::Bridge(format!("{context}: {e}"))
}

fn jstring<'a>(env: &mut JNIEnv<'a>, value: &str) -> Result<JString<'a>> {
    env.new_string(value)
        .map_err(|e| jni_err("new_string", e))
}

// ---------------------------------------------------------------------------
// Bridge struct
// ---------------------------------------------------------------------------

/// Android implementation of the Storyshare platform bridge.
pub struct AndroidBridge {
    vm: JavaVM,
    /// The hosting Activity; used as the `Context` for every call.
    activity: GlobalRef,
    authority: Option<String>,
}

impl AndroidBridge {
    /// Create a bridge bound to `activity`.
    ///
    /// `authority` overrides the FileProvider authority; `None` uses
    /// `<packageName>.fileprovider`.
    pub fn new(
        env: &mut JNIEnv<'_>,
        activity: &JObject<'_>,
        authority: Option<String>,
    ) -> Result<Self> {
        if activity.is_null() {
            return Err(StoryshareError::Bridge("hosting Activity is null".into()));
        }
        let vm = env.get_java_vm().map_err(|e| jni_err("get_java_vm", e))?;
        let activity = env
            .new_global_ref(activity)
            .map_err(|e| jni_err("new_global_ref(activity)", e))?;
        Ok(Self {
            vm,
            activity,
            authority,
        })
    }

    /// Run `f` with a [`JNIEnv`] attached to the current thread and the
    /// hosting Activity. Pending Java exceptions are cleared on error so the
    /// VM stays usable for the next call.
    fn with_activity<F, R>(&self, f: F) -> Result<R>
    where
        F: for<'a> FnOnce(&mut JNIEnv<'a>, &JObject<'a>) -> Result<R>,
    {
        let mut env = self
            .vm
            .attach_current_thread()
            .map_err(|e| jni_err("attach_current_thread", e))?;

        let result = f(&mut env, self.activity.as_obj());
        if result.is_err() && env.exception_check().unwrap_or(false) {
            let _ = env.exception_describe();
            let _ = env.exception_clear();
        }
        result
    }

    /// The FileProvider authority: the override, or `<packageName>.fileprovider`.
    fn authority(&self, env: &mut JNIEnv<'_>, activity: &JObject<'_>) -> Result<String> {
        if let Some(authority) = &self.authority {
            return Ok(authority.clone());
        }
        let j_pkg: JObject = env
            .call_method(activity, "getPackageName", "()Ljava/lang/String;", &[])
            .map_err(|e| jni_err("getPackageName", e))?
            .l()
            .map_err(|e| jni_err("getPackageName->l", e))?;

        let pkg: String = env
            .get_string(&JString::from(j_pkg))
            .map_err(|e| jni_err("get_string(packageName)", e))?
            .into();

        Ok(format!("{pkg}.fileprovider"))
    }
}

impl PlatformBridge for AndroidBridge {
    fn platform_name(&self) -> &str {
        "Android"
    }
}

// ---------------------------------------------------------------------------
// NativeStorage: Context.getCacheDir()
// ---------------------------------------------------------------------------

impl NativeStorage for AndroidBridge {
    fn cache_dir(&self) -> Result<PathBuf> {
        self.with_activity(|env, activity| {
            let cache_dir: JObject = env
                .call_method(activity, "getCacheDir", "()Ljava/io/File;", &[])
                .map_err(|e| jni_err("getCacheDir", e))?
                .l()
                .map_err(|e| jni_err("getCacheDir->l", e))?;

            let j_path: JObject = env
                .call_method(&cache_dir, "getAbsolutePath", "()Ljava/lang/String;", &[])
                .map_err(|e| jni_err("getAbsolutePath", e))?
                .l()
                .map_err(|e| jni_err("getAbsolutePath->l", e))?;

            let path: String = env
                .get_string(&JString::from(j_path))
                .map_err(|e| jni_err("get_string(cacheDir)", e))?
                .into();

            Ok(PathBuf::from(path))
        })
    }
}

// ---------------------------------------------------------------------------
// NativeShare: FileProvider + targeted Intent
// ---------------------------------------------------------------------------

impl NativeShare for AndroidBridge {
    fn share_file_with_app(&self, request: &AppShareRequest) -> Result<LaunchOutcome> {
        self.with_activity(|env, activity| {
            let package = request.target_package.as_str();

            tracing::info!(
                package,
                action = %request.action,
                mime = %request.mime_type,
                "Android: preparing share intent"
            );

            // -- Build content:// URI via FileProvider --------------------------
            let path = request.file.to_string_lossy();
            let j_path = jstring(env, &path)?;
            let file_obj: JObject = env
                .new_object(
                    "java/io/File",
                    "(Ljava/lang/String;)V",
                    &[JValue::Object(&j_path)],
                )
                .map_err(|e| jni_err("new File(path)", e))?;

            let authority = self.authority(env, activity)?;
            let j_authority = jstring(env, &authority)?;

            let content_uri: JObject = env
                .call_static_method(
                    "androidx/core/content/FileProvider",
                    "getUriForFile",
                    "(Landroid/content/Context;Ljava/lang/String;Ljava/io/File;)Landroid/net/Uri;",
                    &[
                        JValue::Object(activity),
                        JValue::Object(&j_authority),
                        JValue::Object(&file_obj),
                    ],
                )
                .map_err(|e| jni_err("FileProvider.getUriForFile", e))?
                .l()
                .map_err(|e| jni_err("getUriForFile->l", e))?;

            // -- Build the intent -------------------------------------------------
            let j_action = jstring(env, &request.action)?;
            let intent: JObject = env
                .new_object(
                    "android/content/Intent",
                    "(Ljava/lang/String;)V",
                    &[JValue::Object(&j_action)],
                )
                .map_err(|e| jni_err("new Intent", e))?;

            let j_package = jstring(env, package)?;
            env.call_method(
                &intent,
                "setPackage",
                "(Ljava/lang/String;)Landroid/content/Intent;",
                &[JValue::Object(&j_package)],
            )
            .map_err(|e| jni_err("setPackage", e))?;

            let j_mime = jstring(env, &request.mime_type)?;
            match &request.uri_placement {
                UriPlacement::Data => {
                    env.call_method(
                        &intent,
                        "setDataAndType",
                        "(Landroid/net/Uri;Ljava/lang/String;)Landroid/content/Intent;",
                        &[JValue::Object(&content_uri), JValue::Object(&j_mime)],
                    )
                    .map_err(|e| jni_err("setDataAndType", e))?;
                }
                UriPlacement::Extra { key } => {
                    env.call_method(
                        &intent,
                        "setType",
                        "(Ljava/lang/String;)Landroid/content/Intent;",
                        &[JValue::Object(&j_mime)],
                    )
                    .map_err(|e| jni_err("setType", e))?;

                    let j_key = jstring(env, key)?;
                    env.call_method(
                        &intent,
                        "putExtra",
                        "(Ljava/lang/String;Landroid/os/Parcelable;)Landroid/content/Intent;",
                        &[JValue::Object(&j_key), JValue::Object(&content_uri)],
                    )
                    .map_err(|e| jni_err("putExtra(uri)", e))?;
                }
            }

            for (key, value) in &request.extras {
                let j_key = jstring(env, key)?;
                let j_value = jstring(env, value)?;
                env.call_method(
                    &intent,
                    "putExtra",
                    "(Ljava/lang/String;Ljava/lang/String;)Landroid/content/Intent;",
                    &[JValue::Object(&j_key), JValue::Object(&j_value)],
                )
                .map_err(|e| jni_err("putExtra(string)", e))?;
            }

            // -- Is anything in the package able to handle it? --------------------
            let package_manager: JObject = env
                .call_method(
                    activity,
                    "getPackageManager",
                    "()Landroid/content/pm/PackageManager;",
                    &[],
                )
                .map_err(|e| jni_err("getPackageManager", e))?
                .l()
                .map_err(|e| jni_err("getPackageManager->l", e))?;

            let resolved: JObject = env
                .call_method(
                    &package_manager,
                    "resolveActivity",
                    "(Landroid/content/Intent;I)Landroid/content/pm/ResolveInfo;",
                    &[JValue::Object(&intent), JValue::Int(0)],
                )
                .map_err(|e| jni_err("resolveActivity", e))?
                .l()
                .map_err(|e| jni_err("resolveActivity->l", e))?;

            if resolved.is_null() {
                tracing::debug!(package, "Android: no activity resolves share intent");
                return Ok(LaunchOutcome::NotFound);
            }

            // -- Grant read access, scoped to the target package ------------------
            env.call_method(
                &intent,
                "addFlags",
                "(I)Landroid/content/Intent;",
                &[JValue::Int(FLAG_GRANT_READ_URI_PERMISSION)],
            )
            .map_err(|e| jni_err("addFlags", e))?;

            // Extras are not covered by the intent flag, so grant explicitly.
            env.call_method(
                activity,
                "grantUriPermission",
                "(Ljava/lang/String;Landroid/net/Uri;I)V",
                &[
                    JValue::Object(&j_package),
                    JValue::Object(&content_uri),
                    JValue::Int(FLAG_GRANT_READ_URI_PERMISSION),
                ],
            )
            .map_err(|e| jni_err("grantUriPermission", e))?;

            // -- Launch -----------------------------------------------------------
            env.call_method(
                activity,
                "startActivityForResult",
                "(Landroid/content/Intent;I)V",
                &[JValue::Object(&intent), JValue::Int(REQUEST_SHARE)],
            )
            .map_err(|e| jni_err("startActivityForResult(share)", e))?;

            tracing::info!(package, "Android: share intent dispatched");
            Ok(LaunchOutcome::Launched)
        })
    }
}
