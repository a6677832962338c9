// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// C entry points for the Swift shim on iOS.
//
// The shim calls these on the main queue, forwarding the plugin call as a
// method name plus JSON arguments, and resolves or rejects the JS promise
// from the returned JSON:
//
//     char *storyshare_configure(const char *config_json);
//     char *storyshare_invoke(const char *method, const char *args_json);
//     void  storyshare_free_string(char *s);
//
// Every returned string must be released with `storyshare_free_string`.

use std::ffi::{CStr, CString, c_char};

use storyshare_bridge::platform_bridge;
use storyshare_core::error::StoryshareError;
use tracing::error;

use crate::call::PluginResult;
use crate::host::PluginHost;

static HOST: PluginHost = PluginHost::new();

/// # Safety
///
/// `ptr` must be null or a valid NUL-terminated string.
unsafe fn read_str(ptr: *const c_char, name: &str) -> Result<String, StoryshareError> {
    if ptr.is_null() {
        return Ok(String::new());
    }
    // SAFETY: the caller guarantees a valid NUL-terminated string.
    let raw = unsafe { CStr::from_ptr(ptr) };
    raw.to_str()
        .map(str::to_owned)
        .map_err(|e| StoryshareError::Bridge(format!("{name} is not UTF-8: {e}")))
}

fn to_c_string(result: &PluginResult) -> *mut c_char {
    match CString::new(result.to_json()) {
        Ok(s) => s.into_raw(),
        Err(e) => {
            error!("Failed to create result string: {e}");
            std::ptr::null_mut()
        }
    }
}

/// Install the plugin with the given JSON configuration (null or `""` for
/// defaults).
///
/// # Safety
///
/// `config_json` must be null or a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn storyshare_configure(config_json: *const c_char) -> *mut c_char {
    crate::init_logging();

    // SAFETY: forwarded from this function's contract.
    let result = match unsafe { read_str(config_json, "config_json") } {
        Ok(json) => HOST.configure(&json, |_| Ok(platform_bridge())),
        Err(e) => PluginResult::rejected(&e),
    };
    to_c_string(&result)
}

/// Route one plugin call (`shareToStory`, `shareToWhatsApp`).
///
/// # Safety
///
/// Both arguments must be null or valid NUL-terminated strings.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn storyshare_invoke(
    method: *const c_char,
    args_json: *const c_char,
) -> *mut c_char {
    // SAFETY: forwarded from this function's contract.
    let args = unsafe { read_str(method, "method") }
        .and_then(|method| Ok((method, unsafe { read_str(args_json, "args_json") }?)));
    let result = match args {
        Ok((method, args)) => HOST.invoke(&method, &args),
        Err(e) => PluginResult::rejected(&e),
    };
    to_c_string(&result)
}

/// Release a string returned by `storyshare_configure` or `storyshare_invoke`.
///
/// # Safety
///
/// `s` must be null or a pointer previously returned by one of those
/// functions, and must not be used afterwards.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn storyshare_free_string(s: *mut c_char) {
    if !s.is_null() {
        // SAFETY: `s` came from `CString::into_raw` in `to_c_string`.
        drop(unsafe { CString::from_raw(s) });
    }
}
