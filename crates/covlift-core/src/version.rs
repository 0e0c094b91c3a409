//! Appliance version strings.
//!
//! Versions are dotted numeric strings (`5.9`, `5.9.0.21`). Comparison is
//! component-wise numeric, with a shorter version ordering below a longer
//! one sharing its prefix (`5.9 < 5.9.0.1`). The build selector relies on
//! strict `<` to stop scanning once a job's builds fall below the target.

use std::fmt;
use std::str::FromStr;

use crate::error::HarvestError;

/// A parsed appliance version.
///
/// The inner components are private so every value is guaranteed to have
/// come through [`FromStr`] validation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApplianceVersion {
    components: Vec<u64>,
}

impl ApplianceVersion {
    /// Major version (first component).
    pub fn major(&self) -> u64 {
        self.components[0]
    }

    /// Minor version (second component, 0 when absent).
    pub fn minor(&self) -> u64 {
        self.components.get(1).copied().unwrap_or(0)
    }

    /// Whether the version carries an explicit `major.minor` prefix.
    pub fn has_minor(&self) -> bool {
        self.components.len() >= 2
    }
}

impl FromStr for ApplianceVersion {
    type Err = HarvestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(HarvestError::InvalidVersion { input: s.to_string() });
        }

        let components = trimmed
            .split('.')
            .map(|part| part.parse::<u64>())
            .collect::<Result<Vec<u64>, _>>()
            .map_err(|_| HarvestError::InvalidVersion { input: s.to_string() })?;

        Ok(ApplianceVersion { components })
    }
}

impl fmt::Display for ApplianceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .components
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(".");
        write!(f, "{}", rendered)
    }
}
