use crate::core::FormatError;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::fmt;

lazy_static! {
    static ref DOTTED_VERSION: Regex = Regex::new(r"^[vV]?(\d+)\.(\d+)(\.(\d+))?(.*)").unwrap();
    static ref PACKED_VERSION: Regex = Regex::new(r"^(\d{2})(\d)(\d)").unwrap();
}

/// Version of the PMTM library that wrote a file, as declared on its
/// `PMTM Version` line. Missing trailing components are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FormatVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl FormatVersion {
    /// Pause counts first written to timer lines.
    pub const V0_2_3: FormatVersion = FormatVersion::new(0, 2, 3);
    /// Last version allowed to omit the end of file marker.
    pub const V0_2_6: FormatVersion = FormatVersion::new(0, 2, 6);
    /// Canonical rank tokens.
    pub const V2_0_0: FormatVersion = FormatVersion::new(2, 0, 0);
    /// Last version without a machine vendor column.
    pub const V2_1_1: FormatVersion = FormatVersion::new(2, 1, 1);
    pub const V2_2_1: FormatVersion = FormatVersion::new(2, 2, 1);
    pub const V2_3_0: FormatVersion = FormatVersion::new(2, 3, 0);

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    pub fn parse(text: &str) -> Result<Self, FormatError> {
        let invalid = || FormatError::InvalidVersion(text.to_string());
        let parts = text
            .trim()
            .split('.')
            .map(|part| part.trim().parse::<u32>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;

        if parts.is_empty() || parts.len() > 3 {
            return Err(invalid());
        }

        Ok(Self::new(
            parts[0],
            parts.get(1).copied().unwrap_or(0),
            parts.get(2).copied().unwrap_or(0),
        ))
    }

    /// Processor lines written by these versions are garbled.
    pub fn has_broken_processor_line(&self) -> bool {
        *self == Self::V2_2_1 || *self == Self::V2_3_0
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// A free-form product version split into the four columns the store keeps.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VersionParts {
    pub major: i64,
    pub minor: i64,
    pub build: i64,
    pub code: String,
}

impl VersionParts {
    /// Decompose strings such as `v1.6.1`, `11.1`, `4.1.2-46` or the packed
    /// `1011` form. Anything else decomposes to `0.0.0` with an empty code.
    pub fn decompose(version: &str) -> Self {
        if let Some(caps) = DOTTED_VERSION.captures(version) {
            let number = |idx: usize| {
                caps.get(idx)
                    .and_then(|m| m.as_str().parse::<i64>().ok())
                    .unwrap_or(0)
            };
            return Self {
                major: number(1),
                minor: number(2),
                build: number(4),
                code: caps.get(5).map(|m| m.as_str().trim().to_string()).unwrap_or_default(),
            };
        }

        if let Some(caps) = PACKED_VERSION.captures(version) {
            let number = |idx: usize| caps[idx].parse::<i64>().unwrap_or(0);
            return Self {
                major: number(1),
                minor: number(2),
                build: number(3),
                code: String::new(),
            };
        }

        Self::default()
    }
}
