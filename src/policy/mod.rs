//! Version conditional policy resolution.
//!
//! Android changes the effective value of many manifest attributes depending on the API level.
//! Some of those changes are pinned to the target SDK the application declares, and some to the
//! API level of the device the application is actually installed on. This module decides, for a
//! given trigger and supported SDK range, which behaviour (or behaviours) apply.

mod outcome;

pub use self::outcome::PolicyOutcome;

use crate::{error::Kind, sdk_number::SdkNumber};
use anyhow::Result;
use serde::Serialize;
use std::fmt;

/// Supported SDK range of the analyzed application.
///
/// Validated on construction: `min ≤ target ≤ max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SdkRange {
    min: u32,
    target: u32,
    max: u32,
}

impl SdkRange {
    /// Creates a new SDK range. The target defaults to the minimal SDK version.
    pub fn new(min: u32, target: Option<u32>, max: u32) -> Result<Self> {
        let target = target.unwrap_or(min);

        if min > max {
            return Err(Kind::SdkRange {
                message: format!(
                    "the minimal SDK version ({}) is greater than the maximal one ({})",
                    min, max
                ),
            }
            .into());
        }
        if target < min || target > max {
            return Err(Kind::SdkRange {
                message: format!(
                    "the target SDK version ({}) is outside of the supported range [{}, {}]",
                    target, min, max
                ),
            }
            .into());
        }

        Ok(Self { min, target, max })
    }

    /// Creates a range supporting a single API level.
    pub fn single(api: u32) -> Self {
        Self {
            min: api,
            target: api,
            max: api,
        }
    }

    /// Minimal SDK version the application can be installed on.
    pub fn min(&self) -> u32 {
        self.min
    }

    /// Target SDK version of the application.
    pub fn target(&self) -> u32 {
        self.target
    }

    /// Maximal SDK version the application can be installed on.
    pub fn max(&self) -> u32 {
        self.max
    }

    /// Range where every installable API level is considered reachable, whatever the target.
    ///
    /// Used for behaviours that only depend on device capabilities.
    pub fn device_range(&self) -> Self {
        Self {
            min: self.min,
            target: self.max,
            max: self.max,
        }
    }
}

impl fmt::Display for SdkRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "min {}, target {}, max {}",
            self.min, self.target, self.max
        )
    }
}

/// API level at which the platform behaviour of a manifest attribute changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PolicyTrigger(u32);

impl PolicyTrigger {
    /// Auto Backup to Google Drive is available from Android 6.
    pub const AUTO_BACKUP: Self = Self(23);
    /// Network security configuration files are honoured from Android 7.
    pub const NETWORK_SECURITY_CONFIG: Self = Self(24);
    /// User installed certificate authorities are no longer trusted by default from Android 7.
    pub const USER_TRUST_ANCHORS: Self = Self(24);
    /// Cleartext traffic is no longer permitted by default from Android 9.
    pub const CLEARTEXT_DEFAULT: Self = Self(28);
    /// End-to-end encrypted cloud backups are available from Android 9.
    pub const BACKUP_ENCRYPTION: Self = Self(28);
    /// ADB backups exclude the application data of non debuggable apps from Android 12.
    pub const ADB_BACKUP_RESTRICTION: Self = Self(31);
    /// `dataExtractionRules` replaces `fullBackupContent` from Android 12.
    pub const DATA_EXTRACTION_RULES: Self = Self(31);

    /// Creates a custom trigger.
    pub const fn new(api: u32) -> Self {
        Self(api)
    }

    /// API level of the trigger.
    pub fn level(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PolicyTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", SdkNumber::new(self.0))
    }
}

/// Which SDK version field pins a platform behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    /// The OS computes the behaviour once, from the target SDK the application declares.
    TargetPinned,
    /// The behaviour depends on the API level of the device the application runs on.
    InstallRangePinned,
}

impl Resolution {
    /// Resolves the trigger with producers of plain values.
    pub fn resolve<T, B, A>(
        self,
        trigger: PolicyTrigger,
        range: &SdkRange,
        below: B,
        above: A,
    ) -> PolicyOutcome<T>
    where
        B: FnOnce() -> T,
        A: FnOnce() -> T,
    {
        self.resolve_outcome(
            trigger,
            range,
            || PolicyOutcome::Single(below()),
            || PolicyOutcome::Single(above()),
        )
    }

    /// Resolves the trigger with producers of already resolved outcomes, for nested triggers.
    pub fn resolve_outcome<T, B, A>(
        self,
        trigger: PolicyTrigger,
        range: &SdkRange,
        below: B,
        above: A,
    ) -> PolicyOutcome<T>
    where
        B: FnOnce() -> PolicyOutcome<T>,
        A: FnOnce() -> PolicyOutcome<T>,
    {
        match self {
            Self::TargetPinned => by_target(trigger, range, below, above),
            Self::InstallRangePinned => by_install_range(trigger, range, below, above),
        }
    }
}

/// Target pinned resolution: only the target SDK matters, and only the selected producer runs.
pub fn by_target<T, B, A>(trigger: PolicyTrigger, range: &SdkRange, below: B, above: A) -> T
where
    B: FnOnce() -> T,
    A: FnOnce() -> T,
{
    if range.target() < trigger.level() {
        below()
    } else {
        above()
    }
}

/// Install range pinned resolution.
///
/// Both producers always run. An application targeting the trigger or higher can still be
/// installed below it when its minimal SDK version is lower, so both behaviours are returned.
pub fn by_install_range<T, B, A>(
    trigger: PolicyTrigger,
    range: &SdkRange,
    below: B,
    above: A,
) -> PolicyOutcome<T>
where
    B: FnOnce() -> PolicyOutcome<T>,
    A: FnOnce() -> PolicyOutcome<T>,
{
    let below = below();
    let above = above();

    if range.target() < trigger.level() {
        below
    } else if range.min() < trigger.level() {
        PolicyOutcome::split(trigger.level(), below, above)
    } else {
        above
    }
}
