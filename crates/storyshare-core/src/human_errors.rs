// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable rejection messages.
//
// Every failure reaches the web layer as a short message plus a stable code
// the UI can branch on (e.g. fall back to the generic share sheet when the
// code is NOT_INSTALLED).

use crate::error::StoryshareError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Storage hiccup or bridge glitch; trying again may work.
    Transient,
    /// User must do something (install the app, pick another image).
    ActionRequired,
    /// A programming or configuration problem; retrying won't help.
    Permanent,
}

/// A rejection payload: stable code, plain message, actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Machine-readable code (`NOT_INSTALLED`, `DECODE_ERROR`, ...).
    pub code: &'static str,
    /// Short summary, suitable as the promise rejection message.
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    /// Whether tapping share again has a chance of succeeding.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `StoryshareError` into a `HumanError`.
pub fn humanize_error(err: &StoryshareError) -> HumanError {
    match err {
        StoryshareError::MissingInput => HumanError {
            code: "MISSING_INPUT",
            message: err.to_string(),
            suggestion: "Take the snapshot again, then share it.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        StoryshareError::Decode(_) => HumanError {
            code: "DECODE_ERROR",
            message: "Invalid base64 image data".into(),
            suggestion: "The snapshot could not be read. Take it again and retry.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        StoryshareError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    code: "IO_ERROR",
                    message: "The app can't write to its cache folder.".into(),
                    suggestion: "Clear the app cache from system settings, then try again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    code: "IO_ERROR",
                    message: format!("Error saving image: {io_err}"),
                    suggestion: "Try again. If this keeps happening, your device's storage may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        StoryshareError::NotInstalled(app) => HumanError {
            code: "NOT_INSTALLED",
            message: err.to_string(),
            suggestion: format!("Install {app}, or share the image another way."),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        StoryshareError::Config(detail) => HumanError {
            code: "CONFIG_ERROR",
            message: "Sharing is misconfigured.".into(),
            suggestion: format!("Please report this. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        StoryshareError::Serialization(_) => HumanError {
            code: "CONFIG_ERROR",
            message: "The share request was malformed.".into(),
            suggestion: "Please report this.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        StoryshareError::Bridge(detail) => HumanError {
            code: "BRIDGE_ERROR",
            message: format!("Error sharing: {detail}"),
            suggestion: "Try again. Some devices block sharing to other apps.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        StoryshareError::PlatformUnavailable => HumanError {
            code: "UNAVAILABLE",
            message: "Sharing to other apps isn't available on this device.".into(),
            suggestion: "Use the regular share button instead.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_installed_keeps_platform_wording() {
        let human = humanize_error(&StoryshareError::NotInstalled("WhatsApp".into()));
        assert_eq!(human.code, "NOT_INSTALLED");
        assert_eq!(human.message, "WhatsApp is not installed");
        assert_eq!(human.severity, Severity::ActionRequired);
    }

    #[test]
    fn missing_input_message() {
        let human = humanize_error(&StoryshareError::MissingInput);
        assert_eq!(human.message, "No base64 data provided");
        assert!(!human.retriable);
    }

    #[test]
    fn disk_full_is_transient() {
        let err = StoryshareError::Io(std::io::Error::other("no space left on device"));
        let human = humanize_error(&err);
        assert_eq!(human.code, "IO_ERROR");
        assert!(human.retriable);
        assert!(human.message.contains("no space left"));
    }

    #[test]
    fn permission_denied_needs_user() {
        let err = StoryshareError::Io(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        assert_eq!(humanize_error(&err).severity, Severity::ActionRequired);
    }

    #[test]
    fn decode_is_permanent() {
        let human = humanize_error(&StoryshareError::Decode("bad byte".into()));
        assert_eq!(human.severity, Severity::Permanent);
        assert_eq!(human.code, "DECODE_ERROR");
    }
}
