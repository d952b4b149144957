//! Descriptive classification of a discovered image.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of firmware image found in a partition.
///
/// Purely descriptive; parsing never depends on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    /// First-stage bootloader
    Sbl,
    /// TrustZone secure OS
    Tz,
    /// Remote Power Manager firmware
    Rpm,
    /// Second-stage (application) bootloader
    Appsbl,
    Boot,
    Recovery,
    System,
    Userdata,
    #[default]
    Unknown,
}

impl ImageType {
    /// Lowercase label used in partition names and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageType::Sbl => "sbl",
            ImageType::Tz => "tz",
            ImageType::Rpm => "rpm",
            ImageType::Appsbl => "appsbl",
            ImageType::Boot => "boot",
            ImageType::Recovery => "recovery",
            ImageType::System => "system",
            ImageType::Userdata => "userdata",
            ImageType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
