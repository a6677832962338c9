// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plugin configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoryshareError};
use crate::types::{DestinationTable, StoryStrategy};

pub const DEFAULT_SHARE_CAPTION: &str = "Check out this snapshot from Geogram!";

/// Settings supplied by the host app at start-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    /// Subfolder of the app cache directory that holds staged images.
    pub cache_subdir: String,
    /// FileProvider authority. `None` means `<packageName>.fileprovider`.
    pub file_provider_authority: Option<String>,
    /// Source-application id handed to Instagram.
    pub app_id: Option<String>,
    /// Caption attached to WhatsApp shares.
    pub share_caption: String,
    /// Built-in Instagram variant used when `destinations` is not given.
    pub story_strategy: StoryStrategy,
    /// Full override of the destination table.
    pub destinations: Option<DestinationTable>,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            cache_subdir: "images".into(),
            file_provider_authority: None,
            app_id: None,
            share_caption: DEFAULT_SHARE_CAPTION.into(),
            story_strategy: StoryStrategy::default(),
            destinations: None,
        }
    }
}

impl ShareConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// The effective destination table.
    pub fn destination_table(&self) -> DestinationTable {
        self.destinations
            .clone()
            .unwrap_or_else(|| DestinationTable::builtin(self.story_strategy))
    }

    pub fn validate(&self) -> Result<()> {
        // Staged files are joined under this exact name, and the FileProvider
        // `<paths>` entry has to match it byte for byte.
        let subdir = self.cache_subdir.as_str();
        if subdir.is_empty()
            || subdir != subdir.trim()
            || subdir == "."
            || subdir == ".."
            || subdir.contains(['/', '\\'])
        {
            return Err(StoryshareError::Config(format!(
                "cache_subdir must be a single folder name, got {:?}",
                self.cache_subdir
            )));
        }
        if matches!(&self.file_provider_authority, Some(a) if a.trim().is_empty()) {
            return Err(StoryshareError::Config(
                "file_provider_authority must not be blank".into(),
            ));
        }
        if let Some(table) = &self.destinations {
            table.validate()?;
        }
        Ok(())
    }
}
