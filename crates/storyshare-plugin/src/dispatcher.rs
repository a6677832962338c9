// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Share dispatch: walk a profile's candidate packages in order and hand the
// staged image to the first one that is installed.

use std::io;

use storyshare_bridge::traits::{AppShareRequest, LaunchOutcome, NativeShare};
use storyshare_core::error::{Result, StoryshareError};
use storyshare_core::types::DestinationProfile;
use tracing::{debug, info, instrument, warn};

use crate::stager::StagedImage;

/// Which candidate took the share, and how many were tried to get there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub package: String,
    pub attempts: usize,
}

/// Sends staged images through a [`NativeShare`] capability.
pub struct ShareDispatcher<'a, B: NativeShare + ?Sized> {
    bridge: &'a B,
}

impl<'a, B: NativeShare + ?Sized> ShareDispatcher<'a, B> {
    pub fn new(bridge: &'a B) -> Self {
        Self { bridge }
    }

    /// Try every candidate package of `profile` until one launches.
    ///
    /// Fails with `NotInstalled` naming the destination when none resolves.
    /// A bridge error on any candidate aborts the walk.
    #[instrument(skip_all, fields(destination = %profile.destination, path = %staged.path.display()))]
    pub fn dispatch(
        &self,
        staged: &StagedImage,
        profile: &DestinationProfile,
        extras: &[(String, String)],
    ) -> Result<DispatchReport> {
        if !staged.path.is_file() {
            return Err(StoryshareError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("staged image {} disappeared", staged.path.display()),
            )));
        }

        for (index, package) in profile.packages.iter().enumerate() {
            let request = AppShareRequest {
                file: staged.path.clone(),
                action: profile.action.clone(),
                mime_type: profile.mime_type.clone(),
                target_package: package.clone(),
                uri_placement: profile.uri_placement.clone(),
                extras: extras.to_vec(),
                ios: profile.ios.clone(),
            };

            match self.bridge.share_file_with_app(&request)? {
                LaunchOutcome::Launched => {
                    info!(package = %package, attempt = index + 1, "share handed off");
                    return Ok(DispatchReport {
                        package: package.clone(),
                        attempts: index + 1,
                    });
                }
                LaunchOutcome::NotFound => {
                    debug!(package = %package, "candidate not installed, trying next");
                }
            }
        }

        warn!(
            candidates = ?profile.packages,
            "no candidate package could take the share"
        );
        Err(StoryshareError::NotInstalled(
            profile.destination.display_name().to_owned(),
        ))
    }
}
