//! Android SDK numbering scheme.

use semver::Version;
use std::fmt;

/// Highest API level this analyzer knows about.
///
/// Used as the default upper bound of the supported range when neither the configuration nor
/// the manifest declare one.
pub const LATEST_API_LEVEL: u32 = 36;

/// Android SDK (API level) number.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SdkNumber(u32);

/// As per: <https://developer.android.com/reference/android/os/Build.VERSION_CODES.html>
impl SdkNumber {
    /// Creates the SDK number for the given API level.
    pub fn new(api: u32) -> Self {
        Self(api)
    }

    /// Gets the SDK API version number.
    pub fn number(self) -> u32 {
        self.0
    }

    /// Gets the Android release version of this API level, if known.
    pub fn version(self) -> Option<Version> {
        let (major, minor, patch) = match self.0 {
            1 => (1, 0, 0),
            2 => (1, 1, 0),
            3 => (1, 5, 0),
            4 => (1, 6, 0),
            5 => (2, 0, 0),
            6 => (2, 0, 1),
            7 => (2, 1, 0),
            8 => (2, 2, 0),
            9 => (2, 3, 0),
            10 => (2, 3, 3),
            11 => (3, 0, 0),
            12 => (3, 1, 0),
            13 => (3, 2, 0),
            14 => (4, 0, 0),
            15 => (4, 0, 3),
            16 => (4, 1, 0),
            17 => (4, 2, 0),
            18 => (4, 3, 0),
            19 => (4, 4, 0),
            20 => (4, 4, 4),
            21 => (5, 0, 0),
            22 => (5, 1, 0),
            23 => (6, 0, 0),
            24 => (7, 0, 0),
            25 => (7, 1, 0),
            26 => (8, 0, 0),
            27 => (8, 1, 0),
            28 => (9, 0, 0),
            29 => (10, 0, 0),
            30 => (11, 0, 0),
            31 => (12, 0, 0),
            32 => (12, 1, 0),
            33 => (13, 0, 0),
            34 => (14, 0, 0),
            35 => (15, 0, 0),
            36 => (16, 0, 0),
            _ => return None,
        };
        Some(Version::new(major, minor, patch))
    }
}

impl From<u32> for SdkNumber {
    fn from(api: u32) -> Self {
        Self::new(api)
    }
}

impl fmt::Display for SdkNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version() {
            Some(v) if v.patch == 0 && v.minor == 0 => {
                write!(f, "Android {} (API {})", v.major, self.0)
            }
            Some(v) if v.patch == 0 => write!(f, "Android {}.{} (API {})", v.major, v.minor, self.0),
            Some(v) => write!(f, "Android {} (API {})", v, self.0),
            None => write!(f, "API {}", self.0),
        }
    }
}
