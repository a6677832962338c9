// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// iOS platform bridge via objc2.
//
// Requires compilation with the iOS SDK (Xcode). iOS has no intents, so each
// destination profile carries an `IosHandoff` describing what the target app
// reads instead:
//
// - `Pasteboard`: the PNG and the resolved extras go on the general
//   pasteboard with an expiry, then the app's URL scheme is opened
//   (Instagram Stories).
// - `OpenIn`: the staged file is offered through
//   `UIDocumentInteractionController`'s "Open in" menu (WhatsApp).
//
// Candidate packages mean nothing here; every candidate maps to the same URL
// scheme, and `canOpenURL:` decides whether the target is installed. The host
// `Info.plist` must list `instagram-stories` and `whatsapp` under
// `LSApplicationQueriesSchemes`.
//
// All UIKit interactions require the main thread; calls made off-main return
// `StoryshareError::Bridge`.

#![cfg(target_os = "ios")]

use std::cell::RefCell;
use std::path::PathBuf;

use objc2::rc::Retained;
use objc2::runtime::AnyObject;
use objc2::{MainThreadMarker, msg_send};
use objc2_core_foundation::CGRect;
use objc2_foundation::{NSArray, NSData, NSDictionary, NSString, NSURL, NSTemporaryDirectory};
use objc2_ui_kit::{UIApplication, UIPasteboardOptionExpirationDate, UIViewController};

use storyshare_core::error::{Result, StoryshareError};
use storyshare_core::types::IosHandoff;

use crate::traits::*;

thread_local! {
    // UIDocumentInteractionController is not retained by the menu it
    // presents; keep the latest one alive on the main thread.
    static DOCUMENT_CONTROLLER: RefCell<Option<Retained<AnyObject>>> = const { RefCell::new(None) };
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Assert that we are on the main thread and return the marker.
fn require_main_thread() -> Result<MainThreadMarker> {
    MainThreadMarker::new()
        .ok_or_else(|| StoryshareError::Bridge("must be called from the main thread".into()))
}

/// Obtain the root `UIViewController` from the key window.
fn root_view_controller(mtm: MainThreadMarker) -> Result<Retained<UIViewController>> {
    let app = UIApplication::sharedApplication(mtm);

    // SAFETY: msg_send! to well-known UIApplication selectors (keyWindow,
    // rootViewController). The MainThreadMarker proves main-thread execution.
    let root: Option<Retained<UIViewController>> = unsafe {
        let window: Option<Retained<AnyObject>> = msg_send![&app, keyWindow];
        window.and_then(|w| msg_send![&w, rootViewController])
    };

    root.ok_or_else(|| StoryshareError::Bridge("no root view controller available".into()))
}

fn ns_url(url: &str) -> Result<Retained<NSURL>> {
    NSURL::URLWithString(&NSString::from_str(url))
        .ok_or_else(|| StoryshareError::Config(format!("invalid iOS URL {url:?}")))
}

/// `-[UIApplication canOpenURL:]`, i.e. "is the target app installed".
fn can_open(app: &UIApplication, url: &NSURL) -> bool {
    // SAFETY: canOpenURL: is a documented UIApplication method taking an NSURL.
    unsafe { msg_send![app, canOpenURL: url] }
}

/// Upcast any retained Objective-C object to `AnyObject`.
fn as_any<T>(object: Retained<T>) -> Retained<AnyObject>
where
    T: objc2::Message,
{
    // SAFETY: every Objective-C object is an AnyObject; same pointer, same
    // retain count.
    unsafe { Retained::cast_unchecked(object) }
}

// ---------------------------------------------------------------------------
// Bridge struct
// ---------------------------------------------------------------------------

/// iOS implementation of the Storyshare platform bridge.
pub struct IosBridge;

impl IosBridge {
    /// Create a new iOS bridge instance.
    pub fn new() -> Self {
        Self
    }

    /// Put the image and items on the general pasteboard, then open `url`.
    fn share_via_pasteboard(
        &self,
        mtm: MainThreadMarker,
        request: &AppShareRequest,
        url: &str,
        image_key: &str,
        expiry_secs: u64,
        items: Vec<(String, String)>,
    ) -> Result<LaunchOutcome> {
        let app = UIApplication::sharedApplication(mtm);
        let url = ns_url(url)?;
        if !can_open(&app, &url) {
            tracing::debug!(url = %url_string(&url), "iOS: URL scheme not openable");
            return Ok(LaunchOutcome::NotFound);
        }

        let bytes = std::fs::read(&request.file)?;

        let mut keys: Vec<Retained<NSString>> = vec![NSString::from_str(image_key)];
        let mut values: Vec<Retained<AnyObject>> = vec![as_any(NSData::with_bytes(&bytes))];
        for (key, value) in &items {
            keys.push(NSString::from_str(key));
            values.push(as_any(NSString::from_str(value)));
        }
        let key_refs: Vec<&NSString> = keys.iter().map(|k| &**k).collect();
        let value_refs: Vec<&AnyObject> = values.iter().map(|v| &**v).collect();
        let item = NSDictionary::from_slices(&key_refs, &value_refs);
        let pasteboard_items = NSArray::from_retained_slice(&[as_any(item)]);

        // SAFETY: dateWithTimeIntervalSinceNow: is an NSDate class method
        // returning an autoreleased NSDate.
        let expiry: Retained<AnyObject> = unsafe {
            msg_send![objc2::class!(NSDate), dateWithTimeIntervalSinceNow: expiry_secs as f64]
        };
        // SAFETY: UIPasteboardOptionExpirationDate is a constant NSString
        // linked from UIKit, valid for the process lifetime.
        let option_key: &NSString = unsafe { UIPasteboardOptionExpirationDate };
        let options = NSDictionary::from_slices(&[option_key], &[&*expiry]);

        // SAFETY: generalPasteboard and setItems:options: are documented
        // UIPasteboard methods; the items array holds NSDictionary values.
        unsafe {
            let pasteboard: Retained<AnyObject> =
                msg_send![objc2::class!(UIPasteboard), generalPasteboard];
            let _: () = msg_send![&pasteboard, setItems: &*pasteboard_items, options: &*options];
        }

        tracing::info!(
            package = %request.target_package,
            items = items.len() + 1,
            expiry_secs,
            "iOS: pasteboard populated, opening URL scheme"
        );

        // SAFETY: openURL:options:completionHandler: is a documented
        // UIApplication method. A nil completion handler is allowed.
        unsafe {
            app.openURL_options_completionHandler(&url, &NSDictionary::new(), None);
        }
        Ok(LaunchOutcome::Launched)
    }

    /// Offer the staged file in the "Open in" menu, gated on `url`.
    fn share_via_open_in(
        &self,
        mtm: MainThreadMarker,
        request: &AppShareRequest,
        url: &str,
        uti: &str,
    ) -> Result<LaunchOutcome> {
        let app = UIApplication::sharedApplication(mtm);
        let url = ns_url(url)?;
        if !can_open(&app, &url) {
            tracing::debug!(url = %url_string(&url), "iOS: URL scheme not openable");
            return Ok(LaunchOutcome::NotFound);
        }

        let path = request.file.to_string_lossy();
        let file_url = NSURL::fileURLWithPath(&NSString::from_str(&path));
        let ns_uti = NSString::from_str(uti);
        let root_vc = root_view_controller(mtm)?;

        // SAFETY: UIDocumentInteractionController alloc+init through its
        // documented class constructor, then UIView geometry getters and
        // presentOpenInMenuFromRect:inView:animated:. Main thread is proven
        // by the MainThreadMarker.
        let presented: bool = unsafe {
            let controller: Option<Retained<AnyObject>> = msg_send![
                objc2::class!(UIDocumentInteractionController),
                interactionControllerWithURL: &*file_url
            ];
            let Some(controller) = controller else {
                return Err(StoryshareError::Bridge(
                    "UIDocumentInteractionController could not be created".into(),
                ));
            };
            let _: () = msg_send![&controller, setUTI: &*ns_uti];

            let view: Retained<AnyObject> = msg_send![&root_vc, view];
            let bounds: CGRect = msg_send![&view, bounds];
            let presented: bool = msg_send![
                &controller,
                presentOpenInMenuFromRect: bounds,
                inView: &*view,
                animated: true
            ];
            DOCUMENT_CONTROLLER.with(|slot| *slot.borrow_mut() = Some(controller));
            presented
        };

        if !presented {
            return Err(StoryshareError::Bridge(
                "could not present the document interaction menu".into(),
            ));
        }
        tracing::info!(package = %request.target_package, uti, "iOS: \"Open in\" menu presented");
        Ok(LaunchOutcome::Launched)
    }
}

impl Default for IosBridge {
    fn default() -> Self {
        Self::new()
    }
}

fn url_string(url: &NSURL) -> String {
    url.absoluteString()
        .map(|s| s.to_string())
        .unwrap_or_default()
}

impl PlatformBridge for IosBridge {
    fn platform_name(&self) -> &str {
        "iOS"
    }
}

// ---------------------------------------------------------------------------
// NativeStorage: NSTemporaryDirectory()
// ---------------------------------------------------------------------------

impl NativeStorage for IosBridge {
    fn cache_dir(&self) -> Result<PathBuf> {
        let dir = NSTemporaryDirectory().to_string();
        if dir.is_empty() {
            return Err(StoryshareError::Bridge(
                "NSTemporaryDirectory returned an empty path".into(),
            ));
        }
        Ok(PathBuf::from(dir))
    }
}

// ---------------------------------------------------------------------------
// NativeShare: pasteboard or "Open in", per destination
// ---------------------------------------------------------------------------

impl NativeShare for IosBridge {
    fn share_file_with_app(&self, request: &AppShareRequest) -> Result<LaunchOutcome> {
        let mtm = require_main_thread()?;

        let Some(handoff) = &request.ios else {
            return Err(StoryshareError::Config(format!(
                "{}: no iOS hand-off configured",
                request.target_package
            )));
        };

        match handoff {
            IosHandoff::Pasteboard {
                url,
                image_key,
                expiry_secs,
                ..
            } => {
                let items = handoff.pasteboard_items(&request.extras);
                self.share_via_pasteboard(mtm, request, url, image_key, *expiry_secs, items)
            }
            IosHandoff::OpenIn { url, uti } => self.share_via_open_in(mtm, request, url, uti),
        }
    }
}
