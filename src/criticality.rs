//! Presentation severity of the findings.

use crate::error::Kind;
use anyhow::Error;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

/// Criticality of a reported fact.
///
/// Only the reporting layer decides it: the rules return policy facts, and the console and
/// JSON reports map each fact to one of these levels.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Hash)]
pub enum Criticality {
    /// Informational fact.
    Info,
    /// Something worth a deeper manual check.
    Warning,
    /// Configuration that can be directly abused.
    Critical,
}

impl Default for Criticality {
    fn default() -> Self {
        Self::Info
    }
}

impl fmt::Display for Criticality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}

impl Serialize for Criticality {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

impl<'de> Deserialize<'de> for Criticality {
    fn deserialize<D>(de: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(de)?;
        Self::from_str(&value)
            .map_err(|_| de::Error::custom(format!("unexpected criticality: {:?}", value)))
    }
}

impl FromStr for Criticality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(Self::Critical),
            "warning" => Ok(Self::Warning),
            "info" => Ok(Self::Info),
            _ => Err(Kind::Parse {
                message: format!("unknown criticality `{}`", s),
            }
            .into()),
        }
    }
}
