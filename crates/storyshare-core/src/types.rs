// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Destination profiles: the per-app table of intent action, candidate
// packages, MIME type and extras. Everything a third-party app expects from
// us lives here as data so that empirical fixes never touch dispatch logic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoryshareError};

pub const ACTION_ADD_TO_STORY: &str = "com.instagram.share.ADD_TO_STORY";
pub const ACTION_SEND: &str = "android.intent.action.SEND";
pub const EXTRA_STREAM: &str = "android.intent.extra.STREAM";
pub const EXTRA_TEXT: &str = "android.intent.extra.TEXT";

pub const INSTAGRAM_PACKAGE: &str = "com.instagram.android";
pub const WHATSAPP_PACKAGE: &str = "com.whatsapp";
pub const WHATSAPP_BUSINESS_PACKAGE: &str = "com.whatsapp.w4b";

pub const INSTAGRAM_STORIES_URL: &str = "instagram-stories://share";
pub const WHATSAPP_URL: &str = "whatsapp://app";

/// Lifetime of the pasteboard items handed to Instagram.
pub const PASTEBOARD_EXPIRY_SECS: u64 = 300;

/// Bumped whenever a built-in profile changes.
pub const BUILTIN_TABLE_VERSION: u32 = 5;

/// Where a staged image is headed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    InstagramStory,
    #[serde(rename = "whatsapp")]
    WhatsApp,
}

impl Destination {
    /// Name used in user-facing messages ("Instagram is not installed").
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::InstagramStory => "Instagram",
            Self::WhatsApp => "WhatsApp",
        }
    }

    /// Fixed cache filename; each call overwrites the previous snapshot.
    pub fn staged_filename(&self) -> &'static str {
        match self {
            Self::InstagramStory => "story_share.png",
            Self::WhatsApp => "whatsapp_share.png",
        }
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// How the content URI is attached to the share request.
///
/// Instagram accepts the image either as the intent data (rendered as the
/// story background) or as an interactive sticker extra. The two must never
/// be combined, which this enum makes unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UriPlacement {
    /// `setDataAndType(uri, mime)`.
    Data,
    /// `setType(mime)` plus `putExtra(key, uri)`.
    Extra { key: String },
}

/// Where the value of a string extra comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "from", rename_all = "snake_case")]
pub enum ExtraSource {
    /// Passed through verbatim.
    Literal { value: String },
    /// Supplied by the caller for this share, with an optional fallback.
    Param {
        name: String,
        #[serde(default)]
        default: Option<String>,
    },
    /// The configured source-application id.
    AppId,
    /// The configured share caption.
    Caption,
}

/// One `putExtra(key, value)` entry of a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraTemplate {
    pub key: String,
    pub source: ExtraSource,
}

impl ExtraTemplate {
    pub fn literal(key: &str, value: &str) -> Self {
        Self {
            key: key.into(),
            source: ExtraSource::Literal {
                value: value.into(),
            },
        }
    }

    pub fn param(key: &str, name: &str, default: Option<&str>) -> Self {
        Self {
            key: key.into(),
            source: ExtraSource::Param {
                name: name.into(),
                default: default.map(Into::into),
            },
        }
    }

    pub fn app_id(key: &str) -> Self {
        Self {
            key: key.into(),
            source: ExtraSource::AppId,
        }
    }

    pub fn caption(key: &str) -> Self {
        Self {
            key: key.into(),
            source: ExtraSource::Caption,
        }
    }
}

/// Caller-supplied values for `ExtraSource::Param` (e.g. `attribution_link`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareParams(BTreeMap<String, String>);

impl ShareParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert. Empty values are dropped.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        if !value.is_empty() {
            self.0.insert(name.into(), value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The two Instagram story variants seen in the field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryStrategy {
    /// Image as intent data; opens the story editor with a full-bleed background.
    #[default]
    Background,
    /// Image as an interactive sticker over a two-colour gradient.
    Sticker,
}

/// How a destination is reached on iOS, which has no intents or packages.
///
/// The image and the resolved extras of the profile are mapped onto
/// whatever the target app reads on that platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IosHandoff {
    /// Put the image and extras on the general pasteboard, then open `url`.
    Pasteboard {
        url: String,
        /// Pasteboard type that carries the PNG bytes.
        image_key: String,
        /// Extra key -> pasteboard type. Extras without an entry stay behind.
        #[serde(default)]
        item_keys: BTreeMap<String, String>,
        #[serde(default = "default_pasteboard_expiry")]
        expiry_secs: u64,
    },
    /// Present the system "Open in" menu for the staged file, provided
    /// `url` can be opened (i.e. the app is installed).
    OpenIn { url: String, uti: String },
}

fn default_pasteboard_expiry() -> u64 {
    PASTEBOARD_EXPIRY_SECS
}

impl IosHandoff {
    fn instagram(image_key: &str, item_keys: &[(&str, &str)]) -> Self {
        Self::Pasteboard {
            url: INSTAGRAM_STORIES_URL.into(),
            image_key: image_key.into(),
            item_keys: item_keys
                .iter()
                .map(|(extra, item)| ((*extra).to_owned(), (*item).to_owned()))
                .collect(),
            expiry_secs: PASTEBOARD_EXPIRY_SECS,
        }
    }

    /// The URL whose openability decides whether the target is installed.
    pub fn url(&self) -> &str {
        match self {
            Self::Pasteboard { url, .. } | Self::OpenIn { url, .. } => url,
        }
    }

    /// Translate resolved extras into pasteboard string items, in extras order.
    pub fn pasteboard_items(&self, extras: &[(String, String)]) -> Vec<(String, String)> {
        match self {
            Self::Pasteboard { item_keys, .. } => extras
                .iter()
                .filter_map(|(key, value)| {
                    item_keys.get(key).map(|item| (item.clone(), value.clone()))
                })
                .collect(),
            Self::OpenIn { .. } => Vec::new(),
        }
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.url().trim().is_empty() {
            return Err(StoryshareError::Config(format!("{name}: empty iOS URL")));
        }
        match self {
            Self::Pasteboard {
                image_key,
                item_keys,
                expiry_secs,
                ..
            } => {
                if image_key.trim().is_empty() {
                    return Err(StoryshareError::Config(format!(
                        "{name}: empty pasteboard image key"
                    )));
                }
                if item_keys.values().any(|k| k.trim().is_empty()) {
                    return Err(StoryshareError::Config(format!(
                        "{name}: blank pasteboard item key"
                    )));
                }
                if *expiry_secs == 0 {
                    return Err(StoryshareError::Config(format!(
                        "{name}: pasteboard expiry must be positive"
                    )));
                }
            }
            Self::OpenIn { uti, .. } => {
                if uti.trim().is_empty() {
                    return Err(StoryshareError::Config(format!("{name}: empty UTI")));
                }
            }
        }
        Ok(())
    }
}

/// Everything needed to build a share request for one destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationProfile {
    pub destination: Destination,
    pub action: String,
    /// Candidate packages, tried in order.
    pub packages: Vec<String>,
    pub mime_type: String,
    pub uri_placement: UriPlacement,
    #[serde(default)]
    pub extras: Vec<ExtraTemplate>,
    /// iOS route; `None` leaves the destination Android-only.
    #[serde(default)]
    pub ios: Option<IosHandoff>,
}

impl DestinationProfile {
    /// Instagram "Add to Story" profile for the given strategy.
    pub fn instagram_story(strategy: StoryStrategy) -> Self {
        match strategy {
            StoryStrategy::Background => Self {
                destination: Destination::InstagramStory,
                action: ACTION_ADD_TO_STORY.into(),
                packages: vec![INSTAGRAM_PACKAGE.into()],
                mime_type: "image/png".into(),
                uri_placement: UriPlacement::Data,
                extras: vec![
                    ExtraTemplate::app_id("source_application"),
                    ExtraTemplate::param("content_url", "attribution_link", None),
                    ExtraTemplate::param(
                        "com.instagram.sharedSticker.contentURL",
                        "attribution_link",
                        None,
                    ),
                ],
                ios: Some(IosHandoff::instagram(
                    "com.instagram.sharedSticker.backgroundImage",
                    &[
                        ("source_application", "com.instagram.sharedSticker.appID"),
                        ("content_url", "com.instagram.sharedSticker.contentURL"),
                    ],
                )),
            },
            StoryStrategy::Sticker => Self {
                destination: Destination::InstagramStory,
                action: ACTION_ADD_TO_STORY.into(),
                packages: vec![INSTAGRAM_PACKAGE.into()],
                mime_type: "image/png".into(),
                uri_placement: UriPlacement::Extra {
                    key: "interactive_asset_uri".into(),
                },
                extras: vec![
                    ExtraTemplate::app_id("source_application"),
                    ExtraTemplate::param(
                        "top_background_color",
                        "top_background_color",
                        Some("#33FF33"),
                    ),
                    ExtraTemplate::param(
                        "bottom_background_color",
                        "bottom_background_color",
                        Some("#FF00E3"),
                    ),
                    ExtraTemplate::param("content_url", "attribution_link", None),
                ],
                ios: Some(IosHandoff::instagram(
                    "com.instagram.sharedSticker.stickerImage",
                    &[
                        ("source_application", "com.instagram.sharedSticker.appID"),
                        (
                            "top_background_color",
                            "com.instagram.sharedSticker.backgroundTopColor",
                        ),
                        (
                            "bottom_background_color",
                            "com.instagram.sharedSticker.backgroundBottomColor",
                        ),
                        ("content_url", "com.instagram.sharedSticker.contentURL"),
                    ],
                )),
            },
        }
    }

    /// WhatsApp, falling back to WhatsApp Business.
    pub fn whatsapp() -> Self {
        Self {
            destination: Destination::WhatsApp,
            action: ACTION_SEND.into(),
            packages: vec![
                WHATSAPP_PACKAGE.into(),
                WHATSAPP_BUSINESS_PACKAGE.into(),
            ],
            mime_type: "image/png".into(),
            uri_placement: UriPlacement::Extra {
                key: EXTRA_STREAM.into(),
            },
            extras: vec![ExtraTemplate::caption(EXTRA_TEXT)],
            ios: Some(IosHandoff::OpenIn {
                url: WHATSAPP_URL.into(),
                uti: "public.png".into(),
            }),
        }
    }

    /// Resolve the extras templates into concrete key/value pairs.
    ///
    /// Entries whose source yields nothing (absent param without default,
    /// unset app id, empty caption) are omitted rather than sent empty.
    pub fn resolve_extras(
        &self,
        params: &ShareParams,
        app_id: Option<&str>,
        caption: &str,
    ) -> Vec<(String, String)> {
        self.extras
            .iter()
            .filter_map(|extra| {
                let value = match &extra.source {
                    ExtraSource::Literal { value } => Some(value.as_str()),
                    ExtraSource::Param { name, default } => {
                        params.get(name).or(default.as_deref())
                    }
                    ExtraSource::AppId => app_id,
                    ExtraSource::Caption => Some(caption),
                }?;
                (!value.is_empty()).then(|| (extra.key.clone(), value.to_owned()))
            })
            .collect()
    }

    /// Reject profiles that could never produce a valid share request.
    pub fn validate(&self) -> Result<()> {
        let name = self.destination.display_name();
        if self.action.trim().is_empty() {
            return Err(StoryshareError::Config(format!("{name}: empty intent action")));
        }
        if self.mime_type.trim().is_empty() {
            return Err(StoryshareError::Config(format!("{name}: empty MIME type")));
        }
        if self.packages.is_empty() {
            return Err(StoryshareError::Config(format!(
                "{name}: no candidate packages"
            )));
        }
        if self.packages.iter().any(|p| p.trim().is_empty()) {
            return Err(StoryshareError::Config(format!("{name}: blank package name")));
        }
        if let UriPlacement::Extra { key } = &self.uri_placement {
            if key.trim().is_empty() {
                return Err(StoryshareError::Config(format!(
                    "{name}: empty URI extra key"
                )));
            }
        }
        if self.extras.iter().any(|e| e.key.trim().is_empty()) {
            return Err(StoryshareError::Config(format!("{name}: blank extra key")));
        }
        if let Some(ios) = &self.ios {
            ios.validate(name)?;
        }
        Ok(())
    }
}

/// Versioned set of profiles, one per destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationTable {
    pub version: u32,
    pub story: DestinationProfile,
    pub whatsapp: DestinationProfile,
}

impl DestinationTable {
    pub fn builtin(strategy: StoryStrategy) -> Self {
        Self {
            version: BUILTIN_TABLE_VERSION,
            story: DestinationProfile::instagram_story(strategy),
            whatsapp: DestinationProfile::whatsapp(),
        }
    }

    pub fn profile(&self, destination: Destination) -> &DestinationProfile {
        match destination {
            Destination::InstagramStory => &self.story,
            Destination::WhatsApp => &self.whatsapp,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (slot, expected) in [
            (&self.story, Destination::InstagramStory),
            (&self.whatsapp, Destination::WhatsApp),
        ] {
            if slot.destination != expected {
                return Err(StoryshareError::Config(format!(
                    "{expected} slot holds a {} profile",
                    slot.destination
                )));
            }
            slot.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_profiles_are_valid() {
        DestinationTable::builtin(StoryStrategy::Background)
            .validate()
            .expect("background table");
        DestinationTable::builtin(StoryStrategy::Sticker)
            .validate()
            .expect("sticker table");
    }

    #[test]
    fn whatsapp_tries_consumer_app_first() {
        let profile = DestinationProfile::whatsapp();
        assert_eq!(profile.packages, vec!["com.whatsapp", "com.whatsapp.w4b"]);
        assert_eq!(profile.action, ACTION_SEND);
    }

    #[test]
    fn story_strategies_place_uri_differently() {
        let background = DestinationProfile::instagram_story(StoryStrategy::Background);
        let sticker = DestinationProfile::instagram_story(StoryStrategy::Sticker);
        assert_eq!(background.uri_placement, UriPlacement::Data);
        assert_eq!(
            sticker.uri_placement,
            UriPlacement::Extra {
                key: "interactive_asset_uri".into()
            }
        );
    }

    #[test]
    fn attribution_link_skipped_when_absent() {
        let profile = DestinationProfile::instagram_story(StoryStrategy::Background);
        let extras = profile.resolve_extras(&ShareParams::new(), None, "");
        assert!(extras.is_empty());

        let extras = profile.resolve_extras(&ShareParams::new(), Some("962534345263628"), "");
        assert_eq!(
            extras,
            vec![("source_application".to_owned(), "962534345263628".to_owned())]
        );

        let params = ShareParams::new().with("attribution_link", "https://geogram.app");
        let extras = profile.resolve_extras(&params, None, "");
        assert_eq!(
            extras,
            vec![
                ("content_url".to_owned(), "https://geogram.app".to_owned()),
                (
                    "com.instagram.sharedSticker.contentURL".to_owned(),
                    "https://geogram.app".to_owned()
                ),
            ]
        );
    }

    #[test]
    fn sticker_colours_fall_back_to_defaults() {
        let profile = DestinationProfile::instagram_story(StoryStrategy::Sticker);
        let params = ShareParams::new().with("top_background_color", "#000000");
        let extras = profile.resolve_extras(&params, Some("962534345263628"), "");

        assert!(extras.contains(&("source_application".into(), "962534345263628".into())));
        assert!(extras.contains(&("top_background_color".into(), "#000000".into())));
        assert!(extras.contains(&("bottom_background_color".into(), "#FF00E3".into())));
        assert!(!extras.iter().any(|(k, _)| k == "content_url"));
    }

    #[test]
    fn unset_app_id_drops_source_application() {
        let profile = DestinationProfile::instagram_story(StoryStrategy::Sticker);
        let extras = profile.resolve_extras(&ShareParams::new(), None, "");
        assert!(!extras.iter().any(|(k, _)| k == "source_application"));
    }

    #[test]
    fn empty_param_values_are_ignored() {
        let params = ShareParams::new().with("attribution_link", "");
        assert!(params.is_empty());
    }

    #[test]
    fn validate_rejects_empty_candidates() {
        let mut profile = DestinationProfile::whatsapp();
        profile.packages.clear();
        match profile.validate() {
            Err(StoryshareError::Config(msg)) => assert!(msg.contains("no candidate")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_swapped_slots() {
        let mut table = DestinationTable::builtin(StoryStrategy::Background);
        std::mem::swap(&mut table.story, &mut table.whatsapp);
        assert!(table.validate().is_err());
    }

    #[test]
    fn ios_pasteboard_items_follow_resolved_extras() {
        let profile = DestinationProfile::instagram_story(StoryStrategy::Background);
        let params = ShareParams::new().with("attribution_link", "https://geogram.app");
        let extras = profile.resolve_extras(&params, Some("962534345263628"), "");
        let ios = profile.ios.as_ref().expect("instagram has an iOS route");

        assert_eq!(ios.url(), INSTAGRAM_STORIES_URL);
        assert_eq!(
            ios.pasteboard_items(&extras),
            vec![
                (
                    "com.instagram.sharedSticker.appID".to_owned(),
                    "962534345263628".to_owned()
                ),
                (
                    "com.instagram.sharedSticker.contentURL".to_owned(),
                    "https://geogram.app".to_owned()
                ),
            ]
        );
        match ios {
            IosHandoff::Pasteboard {
                image_key,
                expiry_secs,
                ..
            } => {
                assert_eq!(image_key, "com.instagram.sharedSticker.backgroundImage");
                assert_eq!(*expiry_secs, 300);
            }
            other => panic!("unexpected handoff: {other:?}"),
        }
    }

    #[test]
    fn ios_sticker_route_carries_colours() {
        let profile = DestinationProfile::instagram_story(StoryStrategy::Sticker);
        let extras = profile.resolve_extras(&ShareParams::new(), None, "");
        let items = profile.ios.as_ref().unwrap().pasteboard_items(&extras);

        assert!(items.contains(&(
            "com.instagram.sharedSticker.backgroundBottomColor".into(),
            "#FF00E3".into()
        )));
        assert!(!items.iter().any(|(k, _)| k.ends_with("appID")));
    }

    #[test]
    fn whatsapp_on_ios_opens_document_menu() {
        let profile = DestinationProfile::whatsapp();
        let extras = profile.resolve_extras(&ShareParams::new(), None, "caption");
        let ios = profile.ios.as_ref().unwrap();

        assert_eq!(
            ios,
            &IosHandoff::OpenIn {
                url: WHATSAPP_URL.into(),
                uti: "public.png".into()
            }
        );
        assert!(ios.pasteboard_items(&extras).is_empty());
    }

    #[test]
    fn validate_rejects_zero_expiry() {
        let mut profile = DestinationProfile::instagram_story(StoryStrategy::Background);
        if let Some(IosHandoff::Pasteboard { expiry_secs, .. }) = &mut profile.ios {
            *expiry_secs = 0;
        }
        assert!(profile.validate().is_err());
    }

    #[test]
    fn ios_route_defaults_when_json_omits_expiry() {
        let ios: IosHandoff = serde_json::from_str(
            r#"{ "kind": "pasteboard", "url": "instagram-stories://share",
                 "image_key": "com.instagram.sharedSticker.backgroundImage" }"#,
        )
        .unwrap();
        assert!(matches!(
            ios,
            IosHandoff::Pasteboard { expiry_secs: 300, ref item_keys, .. } if item_keys.is_empty()
        ));
    }

    #[test]
    fn profile_json_shape() {
        let json = serde_json::to_value(DestinationProfile::whatsapp()).unwrap();
        assert_eq!(json["destination"], "whatsapp");
        assert_eq!(json["uri_placement"]["kind"], "extra");
        assert_eq!(json["uri_placement"]["key"], EXTRA_STREAM);
        assert_eq!(json["extras"][0]["source"]["from"], "caption");
    }
}
