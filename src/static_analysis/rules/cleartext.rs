//! Cleartext traffic rule for the `usesCleartextTraffic` application attribute.

use crate::{
    policy::{by_target, PolicyOutcome, PolicyTrigger, Resolution, SdkRange},
    static_analysis::manifest::{Manifest, TriBool},
};
use serde::Serialize;
use std::fmt;

/// Effective cleartext traffic policy on a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cleartext {
    Permitted,
    Forbidden,
    /// The flag is ignored, the network security configuration decides.
    DeferredToNetworkSecurityConfig,
}

impl fmt::Display for Cleartext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Permitted => write!(f, "permitted"),
            Self::Forbidden => write!(f, "forbidden"),
            Self::DeferredToNetworkSecurityConfig => {
                write!(f, "deferred to the network security configuration")
            }
        }
    }
}

/// Gets the cleartext traffic policy over the supported range.
///
/// An unset `usesCleartextTraffic` permits cleartext for applications targeting Android 8.1 or
/// lower. The flag is ignored from Android 7 when a network security configuration is present,
/// which depends on the device the application runs on.
pub fn cleartext_traffic(manifest: &Manifest, range: &SdkRange) -> PolicyOutcome<Cleartext> {
    let application = manifest.application();
    let declared = || {
        PolicyOutcome::Single(match application.uses_cleartext_traffic {
            TriBool::True => Cleartext::Permitted,
            TriBool::False => Cleartext::Forbidden,
            TriBool::Unset => by_target(
                PolicyTrigger::CLEARTEXT_DEFAULT,
                range,
                || Cleartext::Permitted,
                || Cleartext::Forbidden,
            ),
        })
    };

    if application.network_security_config.is_some() {
        Resolution::InstallRangePinned.resolve_outcome(
            PolicyTrigger::NETWORK_SECURITY_CONFIG,
            range,
            declared,
            || PolicyOutcome::Single(Cleartext::DeferredToNetworkSecurityConfig),
        )
    } else {
        declared()
    }
}
