// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-process bridge with a configurable set of "installed" packages.
//
// Records every resolve, grant and launch so host apps (and our own tests)
// can assert on what would have been sent to the OS.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use storyshare_core::error::{Result, StoryshareError};

use crate::traits::*;

/// One observable interaction with the simulated OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeEvent {
    Resolved { package: String, found: bool },
    Granted { package: String, file: PathBuf },
    Launched(AppShareRequest),
}

/// Bridge backed by memory instead of a real OS.
pub struct MemoryBridge {
    cache_dir: PathBuf,
    installed: Mutex<HashSet<String>>,
    events: Mutex<Vec<BridgeEvent>>,
    launch_failure: Mutex<Option<String>>,
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryBridge {
    /// A bridge whose cache directory is `cache_dir` and with nothing installed.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            installed: Mutex::new(HashSet::new()),
            events: Mutex::new(Vec::new()),
            launch_failure: Mutex::new(None),
        }
    }

    pub fn with_installed<I, S>(self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        locked(&self.installed).extend(packages.into_iter().map(Into::into));
        self
    }

    pub fn install(&self, package: &str) {
        locked(&self.installed).insert(package.to_owned());
    }

    pub fn uninstall(&self, package: &str) {
        locked(&self.installed).remove(package);
    }

    /// Make the next launches fail as if `startActivity` had thrown.
    pub fn fail_launches(&self, message: &str) {
        *locked(&self.launch_failure) = Some(message.to_owned());
    }

    pub fn events(&self) -> Vec<BridgeEvent> {
        locked(&self.events).clone()
    }

    /// Packages that were granted read access, in order.
    pub fn grants(&self) -> Vec<String> {
        locked(&self.events)
            .iter()
            .filter_map(|e| match e {
                BridgeEvent::Granted { package, .. } => Some(package.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn launches(&self) -> Vec<AppShareRequest> {
        locked(&self.events)
            .iter()
            .filter_map(|e| match e {
                BridgeEvent::Launched(request) => Some(request.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: BridgeEvent) {
        locked(&self.events).push(event);
    }
}

impl PlatformBridge for MemoryBridge {
    fn platform_name(&self) -> &str {
        "Memory"
    }
}

impl NativeStorage for MemoryBridge {
    fn cache_dir(&self) -> Result<PathBuf> {
        Ok(self.cache_dir.clone())
    }
}

impl NativeShare for MemoryBridge {
    fn share_file_with_app(&self, request: &AppShareRequest) -> Result<LaunchOutcome> {
        // FileProvider refuses files outside its configured roots.
        if !request.file.starts_with(&self.cache_dir) {
            return Err(StoryshareError::Bridge(format!(
                "{} is outside the shared cache directory",
                request.file.display()
            )));
        }
        if !request.file.is_file() {
            return Err(StoryshareError::Bridge(format!(
                "staged file {} does not exist",
                request.file.display()
            )));
        }

        let found = locked(&self.installed).contains(&request.target_package);
        self.record(BridgeEvent::Resolved {
            package: request.target_package.clone(),
            found,
        });
        if !found {
            return Ok(LaunchOutcome::NotFound);
        }

        self.record(BridgeEvent::Granted {
            package: request.target_package.clone(),
            file: request.file.clone(),
        });

        if let Some(message) = locked(&self.launch_failure).clone() {
            return Err(StoryshareError::Bridge(message));
        }

        self.record(BridgeEvent::Launched(request.clone()));
        Ok(LaunchOutcome::Launched)
    }
}
