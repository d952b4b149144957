//! Supported platform families.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Platform conventions an image can follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Qualcomm,
    Nvidia,
}

impl Platform {
    /// Auto-detection probe order.
    pub const PROBE_ORDER: [Platform; 2] = [Platform::Qualcomm, Platform::Nvidia];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Qualcomm => "qualcomm",
            Platform::Nvidia => "nvidia",
        }
    }

    /// Human-readable family name for messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Qualcomm => "Qualcomm gang image",
            Platform::Nvidia => "NVIDIA Tegra flash image",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "qualcomm" | "qcom" => Ok(Platform::Qualcomm),
            "nvidia" | "tegra" => Ok(Platform::Nvidia),
            other => Err(format!("Platform '{}' not yet implemented", other)),
        }
    }
}
