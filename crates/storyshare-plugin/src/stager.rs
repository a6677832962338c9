// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image staging: decode a base64 snapshot and persist it under the app's
// private cache directory so it can be exposed through a content URI.

use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use storyshare_core::error::{Result, StoryshareError};
use tracing::{debug, instrument};
use uuid::Uuid;

/// Standard alphabet, padding optional. Web views emit both forms.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A snapshot written to disk and ready to be shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedImage {
    pub path: PathBuf,
    pub len: u64,
    /// Lowercase hex SHA-256 of the written bytes.
    pub sha256: String,
    pub staged_at: DateTime<Utc>,
}

/// Writes decoded snapshots into `<cache_dir>/<subdir>`.
#[derive(Debug, Clone)]
pub struct ImageStager {
    dir: PathBuf,
}

impl ImageStager {
    pub fn new(cache_dir: impl AsRef<Path>, subdir: &str) -> Self {
        Self {
            dir: cache_dir.as_ref().join(subdir),
        }
    }

    /// The folder staged images are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Decode `payload` and write it to `filename`, replacing any earlier file.
    #[instrument(skip_all, fields(filename = %filename, payload_len = payload.len()))]
    pub fn stage(&self, payload: &str, filename: &str) -> Result<StagedImage> {
        let bytes = decode_payload(payload)?;
        self.write(&bytes, filename)
    }

    /// Persist `bytes` as `filename`.
    ///
    /// The bytes go to a uniquely named sibling first and are renamed into
    /// place only after a successful flush and fsync, so the target path never
    /// holds a half-written image.
    pub fn write(&self, bytes: &[u8], filename: &str) -> Result<StagedImage> {
        check_filename(filename)?;
        fs::create_dir_all(&self.dir)?;

        let target = self.dir.join(filename);
        let partial = self
            .dir
            .join(format!(".{filename}.{}.part", Uuid::new_v4().simple()));

        if let Err(e) = write_synced(&partial, bytes).and_then(|()| fs::rename(&partial, &target)) {
            let _ = fs::remove_file(&partial);
            return Err(e.into());
        }

        let len = fs::metadata(&target)?.len();
        if len != bytes.len() as u64 {
            return Err(StoryshareError::Io(io::Error::other(format!(
                "staged {} bytes but {} reports {len}",
                bytes.len(),
                target.display()
            ))));
        }

        let staged = StagedImage {
            path: target,
            len,
            sha256: hash_bytes(bytes),
            staged_at: Utc::now(),
        };
        debug!(path = %staged.path.display(), bytes = len, sha256 = %staged.sha256, "image staged");
        Ok(staged)
    }
}

/// Drop a leading `data:<mime>;base64,` marker, if any.
///
/// Only text before the first comma that starts with `data:` counts as a
/// marker; any other comma is left in place and fails decoding.
pub fn strip_data_url_prefix(payload: &str) -> &str {
    match payload.split_once(',') {
        Some((head, body)) if head.trim_start().starts_with("data:") => body,
        _ => payload,
    }
}

/// Decode a possibly data-URL-prefixed, possibly line-wrapped base64 string.
pub fn decode_payload(payload: &str) -> Result<Vec<u8>> {
    let compact: String = strip_data_url_prefix(payload)
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    if compact.is_empty() {
        return Err(StoryshareError::MissingInput);
    }
    LENIENT_BASE64
        .decode(compact.as_bytes())
        .map_err(|e| StoryshareError::Decode(e.to_string()))
}

/// Lowercase hex SHA-256 of `data`.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn check_filename(filename: &str) -> Result<()> {
    if filename.is_empty() || Path::new(filename).file_name() != Some(OsStr::new(filename)) {
        return Err(StoryshareError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{filename:?} is not a plain file name"),
        )));
    }
    Ok(())
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.flush()?;
    file.sync_all()
}
