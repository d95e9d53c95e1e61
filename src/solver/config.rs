//! Solver configuration.

use serde::{Deserialize, Serialize};

/// Which phase the sparse label vectors measure.
///
/// The host's volume fraction `f` is the phase fraction. Under `Void` the
/// labels carry `1 - f`; under `Phase` they carry `f`. Seeding,
/// normalization and filtering all go through [`target`](Self::target).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FractionConvention {
    #[default]
    Void,
    Phase,
}

impl FractionConvention {
    /// Label total a cell with volume fraction `f` should carry.
    #[inline]
    pub fn target(self, f: f64) -> f64 {
        match self {
            FractionConvention::Void => 1.0 - f,
            FractionConvention::Phase => f,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub convention: FractionConvention,
}

impl SolverConfig {
    pub fn with_convention(convention: FractionConvention) -> Self {
        Self { convention }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets() {
        assert_eq!(FractionConvention::Void.target(0.25), 0.75);
        assert_eq!(FractionConvention::Phase.target(0.25), 0.25);
        assert_eq!(SolverConfig::default().convention, FractionConvention::Void);
    }
}
