//! Registry behaviour settings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How `access_count` evolves after upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessCounting {
    /// The counter stays at its upload value of 1.
    #[default]
    Fixed,
    /// Every successful owner/category/size/record read bumps the counter.
    IncrementOnRead,
}

impl FromStr for AccessCounting {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().replace('-', "_").as_str() {
            "fixed" => Ok(AccessCounting::Fixed),
            "increment_on_read" => Ok(AccessCounting::IncrementOnRead),
            other => Err(format!(
                "unknown access counting mode '{other}' (expected 'fixed' or 'increment_on_read')"
            )),
        }
    }
}

impl fmt::Display for AccessCounting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            AccessCounting::Fixed => "fixed",
            AccessCounting::IncrementOnRead => "increment_on_read",
        };
        f.write_str(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub access_counting: AccessCounting,
}

impl RegistryConfig {
    pub fn with_access_counting(mut self, access_counting: AccessCounting) -> Self {
        self.access_counting = access_counting;
        self
    }
}
