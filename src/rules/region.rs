use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Jurisdiction code used to tag and filter law passages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Region {
    /// Utah.
    #[serde(rename = "US-UT")]
    UsUtah,
    /// Florida.
    #[serde(rename = "US-FL")]
    UsFlorida,
    /// California.
    #[serde(rename = "US-CA")]
    UsCalifornia,
    /// European Union / EEA.
    #[serde(rename = "EU")]
    Eu,
    /// United States (federal).
    #[serde(rename = "US")]
    Us,
}

impl Region {
    /// All known regions.
    pub const ALL: [Region; 5] = [
        Region::UsUtah,
        Region::UsFlorida,
        Region::UsCalifornia,
        Region::Eu,
        Region::Us,
    ];

    /// Wire code as stored in passage metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::UsUtah => "US-UT",
            Region::UsFlorida => "US-FL",
            Region::UsCalifornia => "US-CA",
            Region::Eu => "EU",
            Region::Us => "US",
        }
    }

    /// Returns `true` if `code` is this region's wire code.
    pub fn matches_code(&self, code: &str) -> bool {
        self.as_str() == code
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown region code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown region code: {code}")]
pub struct RegionParseError {
    /// The rejected input.
    pub code: String,
}

impl FromStr for Region {
    type Err = RegionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        Region::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(code))
            .ok_or_else(|| RegionParseError {
                code: s.to_string(),
            })
    }
}
